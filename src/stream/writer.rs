//! Push-style stream adapter.

use std::io::{self, Write};

use tracing::{debug, trace};

use crate::buffer::Buffer;
use crate::error::{Result, TransformError};
use crate::pipeline::{Pipeline, check_chunk_size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Closed,
}

/// A writer that transforms everything written to it into an inner sink.
///
/// Bytes accumulate in a staging region of the pipeline's chunk size; each
/// time it fills, one `update` runs and its output is written to the sink.
/// [`TransformWriter::close`] (or [`TransformWriter::finish`]) processes the
/// rest, writes the pipeline's trailing bytes and flushes.
///
/// Dropping an open writer closes it and ignores any error, like
/// [`std::io::BufWriter`]. Call `close` or `finish` to observe failures.
///
/// # Example
///
/// ```
/// use std::io::Write;
/// use chunkform::{Base64Encoder, Single, TransformWriter};
///
/// let mut writer = TransformWriter::new(Vec::new(), Single::new(Base64Encoder::new())?)?;
/// writer.write_all(b"hello ")?;
/// writer.write_all(b"world")?;
///
/// let encoded = writer.finish()?;
/// assert_eq!(encoded, b"aGVsbG8gd29ybGQ=");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct TransformWriter<W: Write, P: Pipeline> {
    inner: Option<W>,
    pipeline: P,
    staging: Buffer,
    state: State,
}

impl<W: Write, P: Pipeline> TransformWriter<W, P> {
    /// Opens a session over `inner`, initializing the pipeline.
    ///
    /// Returns error if the pipeline reports a zero chunk size or fails to
    /// initialize.
    pub fn new(inner: W, mut pipeline: P) -> Result<Self> {
        let chunk_size = check_chunk_size(pipeline.chunk_size())?;
        pipeline.init()?;
        let staging = Buffer::take(chunk_size);
        debug!(pipeline = pipeline.name(), chunk_size = pipeline.chunk_size(), "writer opened");

        Ok(Self {
            inner: Some(inner),
            pipeline,
            staging,
            state: State::Open,
        })
    }

    /// Returns a reference to the sink.
    pub fn get_ref(&self) -> Option<&W> {
        self.inner.as_ref()
    }

    /// Returns a reference to the pipeline.
    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Returns true once the writer has been closed or has failed.
    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    /// Processes staged bytes, finalizes the pipeline and flushes the sink.
    ///
    /// The writer is unusable afterwards, whether or not this succeeds.
    /// Closing an already closed writer does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.state == State::Closed {
            return Ok(());
        }

        let result = self.finalize();
        self.state = State::Closed;
        debug!(pipeline = self.pipeline.name(), ok = result.is_ok(), "writer closed");
        result
    }

    /// Closes the writer and returns the sink.
    pub fn finish(mut self) -> Result<W> {
        self.close()?;
        self.inner.take().ok_or(TransformError::Session {
            message: "writer sink already released",
        })
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            State::Open => Ok(()),
            State::Closed => Err(TransformError::Session {
                message: "writer is closed",
            }),
        }
    }

    fn accept(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            let n = self.staging.fill(buf);
            buf = &buf[n..];

            if self.staging.is_full() {
                self.process()?;
            }
        }
        Ok(())
    }

    /// Runs one `update` over the staged bytes and writes the result.
    fn process(&mut self) -> Result<()> {
        if self.staging.is_empty() {
            return Ok(());
        }

        let output = self.pipeline.update(self.staging.filled())?;
        trace!(consumed = self.staging.len(), produced = output.len(), "process");
        sink(&mut self.inner)?.write_all(output)?;
        self.staging.clear();
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.process()?;

        let output = self.pipeline.finalize()?;
        let sink = sink(&mut self.inner)?;
        sink.write_all(output)?;
        sink.flush()?;
        Ok(())
    }

    /// Marks the writer closed if `result` failed.
    fn guard<T>(&mut self, result: Result<T>) -> io::Result<T> {
        if result.is_err() {
            self.state = State::Closed;
        }
        result.map_err(io::Error::from)
    }
}

fn sink<W>(inner: &mut Option<W>) -> Result<&mut W> {
    inner.as_mut().ok_or(TransformError::Session {
        message: "writer sink already released",
    })
}

impl<W: Write, P: Pipeline> Write for TransformWriter<W, P> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.ensure_open().and_then(|()| self.accept(buf));
        self.guard(result)?;
        Ok(buf.len())
    }

    /// Processes staged bytes, then flushes the sink.
    fn flush(&mut self) -> io::Result<()> {
        let result = self.ensure_open().and_then(|()| {
            self.process()?;
            sink(&mut self.inner)?.flush()?;
            Ok(())
        });
        self.guard(result)
    }
}

impl<W: Write, P: Pipeline> Drop for TransformWriter<W, P> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
