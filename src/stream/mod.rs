//! Stream adapters driving a [`crate::Pipeline`] chunk by chunk.
//!
//! - [`TransformWriter`] - Push sink: bytes written to it are transformed
//!   into an inner [`std::io::Write`]
//! - [`TransformReader`] - Pull source: bytes read from it are transformed
//!   from an inner [`std::io::Read`]

mod reader;
mod writer;

pub use reader::TransformReader;
pub use writer::TransformWriter;
