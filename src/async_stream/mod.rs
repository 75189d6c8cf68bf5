//! Async streaming support for pipelines.
//!
//! This module drives a [`crate::Pipeline`] from a `futures-io::AsyncRead`
//! source, making it runtime-agnostic and compatible with tokio, async-std,
//! smol, and other async runtimes.
//!
//! - [`transform_async`] - Creates an async stream of transformed bytes
//!
//! This module requires the `async-io` feature to be enabled.

mod stream;

pub use stream::{TransformStream, transform_async};
