//! The transform contract.
//!
//! - [`Transform`] - A single directional byte-stream conversion stage
//! - [`Direction`] - Forward (encode/encrypt) or inverse (decode/decrypt)
//! - [`Rational`] - Exact worst-case expansion factor

mod rational;

pub use rational::Rational;

use crate::error::Result;

/// Whether a transform encodes or decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Encoding or encryption.
    Forward,
    /// Decoding or decryption.
    Inverse,
}

impl Direction {
    /// Returns true for [`Direction::Forward`].
    pub const fn is_forward(self) -> bool {
        matches!(self, Direction::Forward)
    }

    /// Returns the opposite direction.
    pub const fn inverse(self) -> Self {
        match self {
            Direction::Forward => Direction::Inverse,
            Direction::Inverse => Direction::Forward,
        }
    }
}

/// A chunked byte-stream transformation: a cipher, an encoder or a decoder.
///
/// A transform declares a cost model (`chunk_size`, `extra_size`,
/// `expansion_factor`) from which callers size output regions, and processes
/// data through `init` → zero or more `update` → exactly one `finalize`.
///
/// # Cost model
///
/// For any input of at most `chunk_size()` bytes, a single `update` or
/// `finalize` call writes at most
/// `ceil(chunk_size * expansion_factor) + extra_size` bytes. Pipelines hand
/// out regions at least that large (see [`crate::buffer_capacity`]).
///
/// # Contract
///
/// - `update` consumes `input` completely, writes into the front of `output`
///   and returns the number of bytes written.
/// - `finalize` writes trailing bytes (padding, encoder tail) and ends the
///   session; a new session starts with `init`.
/// - Failures are reported as [`crate::TransformError::Backend`] carrying
///   `name()` and the failing routine.
///
/// # Example
///
/// ```
/// use chunkform::{Direction, Rational, Result, Transform};
///
/// struct Invert;
///
/// impl Transform for Invert {
///     fn direction(&self) -> Direction { Direction::Forward }
///     fn name(&self) -> &str { "invert" }
///     fn chunk_size(&self) -> usize { 4096 }
///     fn extra_size(&self) -> usize { 0 }
///     fn expansion_factor(&self) -> Rational { Rational::ONE }
///     fn init(&mut self) -> Result<()> { Ok(()) }
///
///     fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
///         for (o, i) in output.iter_mut().zip(input) {
///             *o = !i;
///         }
///         Ok(input.len())
///     }
///
///     fn finalize(&mut self, _output: &mut [u8]) -> Result<usize> { Ok(0) }
/// }
/// ```
pub trait Transform: Send {
    /// Returns the direction of this stage.
    fn direction(&self) -> Direction;

    /// Returns a diagnostic name, used in error messages.
    fn name(&self) -> &str;

    /// Returns the largest input accepted per `update` call.
    fn chunk_size(&self) -> usize;

    /// Returns fixed output overhead added after proportional expansion.
    fn extra_size(&self) -> usize;

    /// Returns the worst-case output/input byte ratio.
    fn expansion_factor(&self) -> Rational;

    /// (Re)initializes internal state for a new session.
    fn init(&mut self) -> Result<()>;

    /// Processes `input` into the front of `output`, returning bytes written.
    fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize>;

    /// Writes trailing bytes into the front of `output`, returning bytes written.
    fn finalize(&mut self, output: &mut [u8]) -> Result<usize>;
}

/// A type-erased transform.
pub type BoxedTransform = Box<dyn Transform>;

impl<T: Transform + ?Sized> Transform for Box<T> {
    fn direction(&self) -> Direction {
        (**self).direction()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn chunk_size(&self) -> usize {
        (**self).chunk_size()
    }

    fn extra_size(&self) -> usize {
        (**self).extra_size()
    }

    fn expansion_factor(&self) -> Rational {
        (**self).expansion_factor()
    }

    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        (**self).update(input, output)
    }

    fn finalize(&mut self, output: &mut [u8]) -> Result<usize> {
        (**self).finalize(output)
    }
}
