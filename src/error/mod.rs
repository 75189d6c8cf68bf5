//! Error types for chunkform.

use std::fmt;

/// The transform routine that was running when a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Routine {
    /// Session (re)initialization.
    Init,
    /// Processing one chunk of input.
    Update,
    /// Emitting trailing bytes and ending the session.
    Finalize,
}

impl fmt::Display for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Routine::Init => "init",
            Routine::Update => "update",
            Routine::Finalize => "finalize",
        })
    }
}

/// Errors that can occur while building or driving a transform pipeline.
///
/// Every variant is fatal to the session that produced it: a pipeline that
/// returned an error must be discarded.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The chain could not be built from the given transforms.
    #[error("invalid chain: {message}")]
    InvalidChain {
        /// Description of what was invalid.
        message: &'static str,
    },

    /// Invalid configuration parameter.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },

    /// A transform backend reported a failure.
    #[error("{name}: {routine} failed: {cause}")]
    Backend {
        /// The transform's declared name.
        name: String,
        /// The routine that failed.
        routine: Routine,
        /// Human-readable cause reported by the backend.
        cause: String,
    },

    /// A transform reported writing more bytes than its output region holds.
    #[error("{name}: {routine} reported {written} bytes written into a {capacity}-byte region")]
    CapacityExceeded {
        /// The transform's declared name.
        name: String,
        /// The routine that misreported.
        routine: Routine,
        /// Bytes the transform claimed to have written.
        written: usize,
        /// Size of the region it was given.
        capacity: usize,
    },

    /// An `update` input was larger than the pipeline's chunk size.
    #[error("chunk too large: {actual} bytes (max {max})")]
    ChunkTooLarge {
        /// The input length.
        actual: usize,
        /// The pipeline's declared chunk size.
        max: usize,
    },

    /// The pipeline was driven out of order (e.g. used after finalize).
    #[error("session error: {message}")]
    Session {
        /// Description of the misuse.
        message: &'static str,
    },

    /// An I/O error occurred on the sink or source of a stream adapter.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransformError {
    /// Builds a [`TransformError::Backend`] for the named transform.
    pub fn backend(name: impl Into<String>, routine: Routine, cause: impl fmt::Display) -> Self {
        TransformError::Backend {
            name: name.into(),
            routine,
            cause: cause.to_string(),
        }
    }
}

impl From<TransformError> for std::io::Error {
    fn from(e: TransformError) -> Self {
        match e {
            TransformError::Io(e) => e,
            other => std::io::Error::other(other),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = TransformError> = std::result::Result<T, E>;
