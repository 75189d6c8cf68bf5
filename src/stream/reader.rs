//! Pull-style stream adapter.

use std::io::{self, Read};

use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use crate::buffer::Buffer;
use crate::error::{Result, TransformError};
use crate::pipeline::{Pipeline, check_chunk_size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Reading,
    Finished,
    Failed,
}

/// A reader that transforms bytes pulled from an inner source.
///
/// Each refill reads up to the pipeline's chunk size from the source and
/// runs one `update`; at end of input the pipeline is finalized once and
/// its trailing bytes are served last.
///
/// # Example
///
/// ```
/// use std::io::Read;
/// use chunkform::{Base64Decoder, Single, TransformReader};
///
/// let source: &[u8] = b"aGVsbG8g\nd29ybGQ=\n";
/// let mut reader = TransformReader::new(source, Single::new(Base64Decoder::new())?)?;
///
/// let mut decoded = String::new();
/// reader.read_to_string(&mut decoded)?;
/// assert_eq!(decoded, "hello world");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct TransformReader<R: Read, P: Pipeline> {
    inner: R,
    pipeline: P,
    staging: Buffer,
    pending: BytesMut,
    state: State,
}

impl<R: Read, P: Pipeline> TransformReader<R, P> {
    /// Opens a session over `inner`, initializing the pipeline.
    ///
    /// Returns error if the pipeline reports a zero chunk size or fails to
    /// initialize.
    pub fn new(inner: R, mut pipeline: P) -> Result<Self> {
        let chunk_size = check_chunk_size(pipeline.chunk_size())?;
        pipeline.init()?;
        let staging = Buffer::take(chunk_size);
        debug!(pipeline = pipeline.name(), chunk_size = pipeline.chunk_size(), "reader opened");

        Ok(Self {
            inner,
            pipeline,
            staging,
            pending: BytesMut::new(),
            state: State::Reading,
        })
    }

    /// Returns a reference to the source.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Returns a reference to the pipeline.
    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Consumes the reader, returning the source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads once from the source and transforms what arrived.
    fn refill(&mut self) -> Result<()> {
        let n = loop {
            match self.inner.read(self.staging.unfilled_mut()) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };

        if n == 0 {
            let output = self.pipeline.finalize()?;
            self.pending.extend_from_slice(output);
            self.state = State::Finished;
            debug!(pipeline = self.pipeline.name(), "reader reached end of input");
            return Ok(());
        }

        self.staging.advance(n);
        let output = self.pipeline.update(self.staging.filled())?;
        trace!(consumed = n, produced = output.len(), "refill");
        self.pending.extend_from_slice(output);
        self.staging.clear();
        Ok(())
    }
}

impl<R: Read, P: Pipeline> Read for TransformReader<R, P> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            if !self.pending.is_empty() {
                let n = buf.len().min(self.pending.len());
                buf[..n].copy_from_slice(&self.pending[..n]);
                self.pending.advance(n);
                return Ok(n);
            }

            match self.state {
                State::Finished => return Ok(0),
                State::Failed => {
                    return Err(TransformError::Session {
                        message: "reader failed and must be discarded",
                    }
                    .into());
                }
                State::Reading => {
                    if let Err(e) = self.refill() {
                        self.state = State::Failed;
                        return Err(e.into());
                    }
                }
            }
        }
    }
}
