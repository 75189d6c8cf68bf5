//! Async stream adapter for pipelines.
//!
//! # Example
//!
//! ```ignore
//! use futures_util::StreamExt;
//! use chunkform::{transform_async, Base64Encoder, Single};
//! use futures_io::AsyncRead;
//!
//! async fn demo<R: AsyncRead + Unpin>(reader: R) -> Result<(), chunkform::TransformError> {
//!     let mut stream = transform_async(reader, Single::new(Base64Encoder::new())?)?;
//!
//!     while let Some(bytes) = stream.next().await {
//!         let bytes = bytes?;
//!         println!("{} encoded bytes", bytes.len());
//!     }
//!     Ok(())
//! }
//! ```

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures_core::Stream;
use futures_io::AsyncRead;
use pin_project_lite::pin_project;
use tracing::{debug, trace};

use crate::buffer::Buffer;
use crate::error::{Result, TransformError};
use crate::pipeline::{Pipeline, check_chunk_size};

pin_project! {
    /// A stream that yields transformed bytes from an async reader.
    ///
    /// Every read of up to `chunk_size` bytes runs one `update`; non-empty
    /// outputs are yielded as they appear. At end of input the pipeline is
    /// finalized and its trailing bytes are yielded last.
    pub struct TransformStream<R, P> {
        #[pin]
        reader: R,
        pipeline: P,
        staging: Buffer,
        finished: bool,
    }
}

impl<R, P: Pipeline> TransformStream<R, P> {
    /// Opens a session over `reader`, initializing the pipeline.
    ///
    /// Returns error if the pipeline reports a zero chunk size or fails to
    /// initialize.
    pub fn new(reader: R, mut pipeline: P) -> Result<Self> {
        let chunk_size = check_chunk_size(pipeline.chunk_size())?;
        pipeline.init()?;
        let staging = Buffer::take(chunk_size);
        debug!(pipeline = pipeline.name(), chunk_size = pipeline.chunk_size(), "async stream opened");

        Ok(Self {
            reader,
            pipeline,
            staging,
            finished: false,
        })
    }

    /// Returns a reference to the pipeline.
    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }
}

impl<R: AsyncRead, P: Pipeline> Stream for TransformStream<R, P> {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.finished {
            return Poll::Ready(None);
        }

        loop {
            this.staging.clear();
            let read = ready!(this.reader.as_mut().poll_read(cx, this.staging.unfilled_mut()));

            let n = match read {
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    *this.finished = true;
                    return Poll::Ready(Some(Err(TransformError::Io(e))));
                }
            };

            if n == 0 {
                // End of stream - finalize and yield the trailer if any
                *this.finished = true;
                debug!(pipeline = this.pipeline.name(), "async stream reached end of input");
                return match this.pipeline.finalize() {
                    Ok([]) => Poll::Ready(None),
                    Ok(output) => Poll::Ready(Some(Ok(Bytes::copy_from_slice(output)))),
                    Err(e) => Poll::Ready(Some(Err(e))),
                };
            }

            this.staging.advance(n);
            match this.pipeline.update(this.staging.filled()) {
                Ok([]) => continue,
                Ok(output) => {
                    trace!(consumed = n, produced = output.len(), "poll");
                    return Poll::Ready(Some(Ok(Bytes::copy_from_slice(output))));
                }
                Err(e) => {
                    *this.finished = true;
                    return Poll::Ready(Some(Err(e)));
                }
            }
        }
    }
}

/// Creates a stream of transformed bytes from an async reader.
///
/// Uses `futures_io::AsyncRead` for runtime-agnostic async I/O.
///
/// # Runtime Compatibility
///
/// For tokio users, you can use `tokio_util::compat` to convert
/// `tokio::io::AsyncRead` to `futures_io::AsyncRead`:
///
/// ```ignore
/// use tokio_util::compat::TokioAsyncReadCompatExt;
/// use chunkform::{transform_async, Identity, Single};
///
/// let tokio_reader = tokio::fs::File::open("file").await?;
/// let stream = transform_async(tokio_reader.compat(), Single::new(Identity::forward())?)?;
/// ```
///
/// Returns error if the pipeline reports a zero chunk size or fails to
/// initialize.
pub fn transform_async<R: AsyncRead, P: Pipeline>(
    reader: R,
    pipeline: P,
) -> Result<TransformStream<R, P>> {
    TransformStream::new(reader, pipeline)
}
