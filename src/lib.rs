//! chunkform
//!
//! Streaming chunked transforms for Rust.
//!
//! `chunkform` applies byte-stream transformations (stream and block ciphers, textual
//! encodings such as Base64) incrementally, in bounded memory, composed into
//! ordered chains. It is a small primitive for:
//!
//! - encrypt-then-armor pipelines
//! - decoding large encoded payloads without buffering them whole
//! - wrapping any [`std::io::Write`] or [`std::io::Read`] in a codec
//!
//! The crate intentionally:
//! - does NOT provide authenticated encryption
//! - does NOT manage concurrency
//! - does NOT open files or sockets
//!
//! Every [`Transform`] declares a cost model from which output regions are
//! sized exactly; a [`Chain`] runs its stages through two ping-pong regions
//! so memory stays bounded regardless of chain length.
//!
//! # Sync
//!
//! ```
//! use std::io::Write;
//! use chunkform::{Base64Encoder, BoxedTransform, ChaCha20Transform, Chain, TransformWriter};
//!
//! let stages: Vec<BoxedTransform> = vec![
//!     Box::new(ChaCha20Transform::encryptor(&[1u8; 32], &[2u8; 12])),
//!     Box::new(Base64Encoder::new()),
//! ];
//!
//! let mut writer = TransformWriter::new(Vec::new(), Chain::new(stages)?)?;
//! writer.write_all(b"attack at dawn")?;
//! let armored = writer.finish()?;
//! assert_eq!(armored.len(), 20);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Async (feature = "async-io")
//!
//! ```ignore
//! use futures_util::StreamExt;
//! use chunkform::{transform_async, Base64Decoder, Single};
//! use futures_io::AsyncRead;
//!
//! async fn demo<R: AsyncRead + Unpin>(reader: R) -> Result<(), chunkform::TransformError> {
//!     let mut stream = transform_async(reader, Single::new(Base64Decoder::new())?)?;
//!
//!     while let Some(bytes) = stream.next().await {
//!         println!("decoded {} bytes", bytes?.len());
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod error;
mod pipeline;
mod stream;
mod transform;

mod buffer; // capacity sizing, ping-pong regions, staging pool

#[cfg(feature = "async-io")]
mod async_stream;

//
// Public surface
//

pub use backend::Identity;
pub use buffer::{buffer_capacity, transform_capacity};
pub use config::{ChunkConfig, DEFAULT_CHUNK_SIZE, LineWrapConfig, MAX_CHUNK_SIZE, PEM_LINE_LENGTH};
pub use error::{Result, Routine, TransformError};
pub use pipeline::{Chain, Pipeline, Single};
pub use stream::{TransformReader, TransformWriter};
pub use transform::{BoxedTransform, Direction, Rational, Transform};

#[cfg(feature = "base64")]
pub use backend::{Base64Decoder, Base64Encoder};

#[cfg(feature = "chacha20")]
pub use backend::{ChaCha20Transform, KEY_SIZE, NONCE_SIZE};

#[cfg(feature = "aes-cbc")]
pub use backend::{AES_BLOCK_SIZE, AesCbcTransform, PaddingMode};

#[cfg(feature = "async-io")]
pub use async_stream::{TransformStream, transform_async};
