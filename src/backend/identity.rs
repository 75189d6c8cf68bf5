//! Passthrough transform.

use crate::config::ChunkConfig;
use crate::error::Result;
use crate::transform::{Direction, Rational, Transform};

/// Copies input to output unchanged.
///
/// Useful as a chain stage placeholder and for testing adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    direction: Direction,
    config: ChunkConfig,
}

impl Identity {
    /// Creates a passthrough stage with the default chunk size.
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            config: ChunkConfig::default(),
        }
    }

    /// A forward passthrough.
    pub fn forward() -> Self {
        Self::new(Direction::Forward)
    }

    /// An inverse passthrough.
    pub fn inverse() -> Self {
        Self::new(Direction::Inverse)
    }

    /// Sets the chunk size from `config`.
    pub fn with_config(mut self, config: ChunkConfig) -> Self {
        self.config = config;
        self
    }
}

impl Transform for Identity {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn name(&self) -> &str {
        "identity"
    }

    fn chunk_size(&self) -> usize {
        self.config.chunk_size()
    }

    fn extra_size(&self) -> usize {
        0
    }

    fn expansion_factor(&self) -> Rational {
        Rational::ONE
    }

    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        output[..input.len()].copy_from_slice(input);
        Ok(input.len())
    }

    fn finalize(&mut self, _output: &mut [u8]) -> Result<usize> {
        Ok(0)
    }
}
