//! Configuration for transform backends.
//!
//! - [`ChunkConfig`] - Chunk size and encoding options
//! - [`LineWrapConfig`] - Line wrapping for textual encoders

use crate::error::TransformError;

/// Default chunk size (4 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024;

/// Largest chunk size accepted by [`ChunkConfig::new`] (16 MiB).
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Line length used when wrapping encoded output (PEM).
pub const PEM_LINE_LENGTH: usize = 64;

/// Configuration for a transform backend.
///
/// The chunk size is the largest input a backend accepts per `update`
/// call; it drives buffer sizing for every pipeline the backend joins.
///
/// # Example
///
/// ```
/// use chunkform::{ChunkConfig, LineWrapConfig};
///
/// let config = ChunkConfig::new(8192)?.with_line_wrap(LineWrapConfig::enabled());
/// assert_eq!(config.chunk_size(), 8192);
/// # Ok::<(), chunkform::TransformError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkConfig {
    chunk_size: usize,
    line_wrap: LineWrapConfig,
}

impl ChunkConfig {
    /// Creates a new configuration.
    ///
    /// Returns error if the chunk size is zero or above [`MAX_CHUNK_SIZE`].
    pub fn new(chunk_size: usize) -> Result<Self, TransformError> {
        if chunk_size == 0 {
            return Err(TransformError::InvalidConfig {
                message: "chunk size must be non-zero",
            });
        }

        if chunk_size > MAX_CHUNK_SIZE {
            return Err(TransformError::InvalidConfig {
                message: "chunk size exceeds the 16 MiB limit",
            });
        }

        Ok(Self {
            chunk_size,
            line_wrap: LineWrapConfig::default(),
        })
    }

    /// Sets the chunk size.
    ///
    /// Note: This does not validate the configuration. Use
    /// [`ChunkConfig::validate`] to check it.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Sets the line wrapping configuration.
    pub fn with_line_wrap(mut self, config: LineWrapConfig) -> Self {
        self.line_wrap = config;
        self
    }

    /// Returns the chunk size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the line wrapping configuration.
    pub fn line_wrap(&self) -> &LineWrapConfig {
        &self.line_wrap
    }

    /// Validates the current configuration.
    pub fn validate(&self) -> Result<(), TransformError> {
        Self::new(self.chunk_size).map(|_| ())
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            line_wrap: LineWrapConfig::default(),
        }
    }
}

/// Configuration for wrapping encoded text into fixed-length lines.
///
/// When enabled, encoders insert a newline every [`PEM_LINE_LENGTH`]
/// characters and terminate a partial last line. Disabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LineWrapConfig {
    /// Whether to wrap encoded output.
    pub enabled: bool,
}

impl LineWrapConfig {
    /// Creates a new line wrapping configuration.
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Enables wrapping.
    pub const fn enabled() -> Self {
        Self { enabled: true }
    }

    /// Disables wrapping.
    pub const fn disabled() -> Self {
        Self { enabled: false }
    }
}
