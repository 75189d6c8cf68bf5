//! Pipelines drive transforms through a session.
//!
//! - [`Pipeline`] - What stream adapters drive: `init`, `update`, `finalize`
//! - [`Single`] - One standalone transform with its own output buffer
//! - [`Chain`] - Two or more same-direction transforms sharing ping-pong regions
//!
//! Outputs borrow the pipeline's own regions and stay valid until the next
//! call that takes `&mut self`.

mod chain;
mod single;

pub use chain::Chain;
pub use single::Single;

use bytes::{Bytes, BytesMut};

use crate::error::{Result, Routine, TransformError};
use crate::transform::Direction;

/// A session-driven byte pipeline.
///
/// A session is `init` → zero or more `update` → exactly one `finalize`.
/// Any error is fatal: the pipeline refuses further calls and must be
/// discarded.
pub trait Pipeline {
    /// Returns a diagnostic name.
    fn name(&self) -> &str;

    /// Returns the direction shared by every stage.
    fn direction(&self) -> Direction;

    /// Returns the largest input accepted per `update` call.
    fn chunk_size(&self) -> usize;

    /// Starts the session, initializing every stage.
    fn init(&mut self) -> Result<()>;

    /// Runs one chunk of at most `chunk_size()` bytes through the pipeline.
    fn update(&mut self, input: &[u8]) -> Result<&[u8]>;

    /// Ends the session and returns the trailing bytes.
    fn finalize(&mut self) -> Result<&[u8]>;

    /// Runs a whole session over `data`, chunked at `chunk_size()`.
    ///
    /// Returns error if the pipeline reports a zero chunk size.
    ///
    /// # Example
    ///
    /// ```
    /// use chunkform::{Identity, Pipeline, Single};
    ///
    /// let mut pipeline = Single::new(Identity::forward())?;
    /// assert_eq!(&pipeline.transform_bytes(b"hello")?[..], b"hello");
    /// # Ok::<(), chunkform::TransformError>(())
    /// ```
    fn transform_bytes(&mut self, data: &[u8]) -> Result<Bytes> {
        let chunk_size = check_chunk_size(self.chunk_size())?;
        let mut out = BytesMut::with_capacity(data.len());

        self.init()?;
        for chunk in data.chunks(chunk_size) {
            out.extend_from_slice(self.update(chunk)?);
        }
        out.extend_from_slice(self.finalize()?);

        Ok(out.freeze())
    }
}

impl<P: Pipeline + ?Sized> Pipeline for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn direction(&self) -> Direction {
        (**self).direction()
    }

    fn chunk_size(&self) -> usize {
        (**self).chunk_size()
    }

    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn update(&mut self, input: &[u8]) -> Result<&[u8]> {
        (**self).update(input)
    }

    fn finalize(&mut self) -> Result<&[u8]> {
        (**self).finalize()
    }
}

/// Lifecycle of one pipeline session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Session {
    Idle,
    Active,
    Finished,
    Poisoned,
}

impl Session {
    /// Moves to `Active`; a finished or failed pipeline cannot restart.
    pub(crate) fn start(&mut self) -> Result<()> {
        match self {
            Session::Finished => Err(TransformError::Session {
                message: "pipeline cannot be reused after finalize",
            }),
            Session::Poisoned => Err(TransformError::Session {
                message: "pipeline failed and must be discarded",
            }),
            Session::Idle | Session::Active => {
                *self = Session::Active;
                Ok(())
            }
        }
    }

    pub(crate) fn ensure_active(&self) -> Result<()> {
        let message = match self {
            Session::Active => return Ok(()),
            Session::Idle => "init must be called before update or finalize",
            Session::Finished => "pipeline already finalized",
            Session::Poisoned => "pipeline failed and must be discarded",
        };
        Err(TransformError::Session { message })
    }

    /// Poisons the session if `result` is an error.
    pub(crate) fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            *self = Session::Poisoned;
        }
        result
    }

    pub(crate) fn finish(&mut self) {
        *self = Session::Finished;
    }
}

/// Rejects a byte count larger than the region the stage was handed.
pub(crate) fn check_written(
    name: &str,
    routine: Routine,
    written: usize,
    capacity: usize,
) -> Result<usize> {
    if written > capacity {
        return Err(TransformError::CapacityExceeded {
            name: name.to_owned(),
            routine,
            written,
            capacity,
        });
    }
    Ok(written)
}

/// Rejects a zero chunk size before a session is driven chunk by chunk.
pub(crate) fn check_chunk_size(chunk_size: usize) -> Result<usize> {
    if chunk_size == 0 {
        return Err(TransformError::InvalidConfig {
            message: "pipeline chunk size must be non-zero",
        });
    }
    Ok(chunk_size)
}

pub(crate) fn check_chunk(input: &[u8], chunk_size: usize) -> Result<()> {
    if input.len() > chunk_size {
        return Err(TransformError::ChunkTooLarge {
            actual: input.len(),
            max: chunk_size,
        });
    }
    Ok(())
}
