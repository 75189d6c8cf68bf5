//! A standalone transform driven as a pipeline.

use tracing::{debug, trace};

use super::{Pipeline, Session, check_chunk, check_written};
use crate::buffer::transform_capacity;
use crate::error::{Result, Routine};
use crate::transform::{Direction, Transform};

/// One transform with an output buffer sized from its cost model.
///
/// # Example
///
/// ```
/// use chunkform::{Base64Encoder, Pipeline, Single};
///
/// let mut encoder = Single::new(Base64Encoder::new())?;
/// encoder.init()?;
///
/// let mut out = encoder.update(b"hello")?.to_vec();
/// out.extend_from_slice(encoder.finalize()?);
/// assert_eq!(out, b"aGVsbG8=");
/// # Ok::<(), chunkform::TransformError>(())
/// ```
#[derive(Debug)]
pub struct Single<T> {
    transform: T,
    output: Box<[u8]>,
    session: Session,
}

impl<T: Transform> Single<T> {
    /// Wraps `transform`, allocating its output buffer.
    ///
    /// Returns error if the cost model overflows buffer sizing.
    pub fn new(transform: T) -> Result<Self> {
        let capacity = transform_capacity(&transform)?;
        debug!(
            transform = transform.name(),
            chunk_size = transform.chunk_size(),
            capacity,
            "single pipeline created"
        );

        Ok(Self {
            transform,
            output: vec![0u8; capacity].into_boxed_slice(),
            session: Session::Idle,
        })
    }

    /// Returns the size of the output buffer.
    pub fn capacity(&self) -> usize {
        self.output.len()
    }

    /// Returns the wrapped transform.
    pub fn get_ref(&self) -> &T {
        &self.transform
    }

    /// Consumes the pipeline, returning the wrapped transform.
    pub fn into_inner(self) -> T {
        self.transform
    }
}

impl<T: Transform> Pipeline for Single<T> {
    fn name(&self) -> &str {
        self.transform.name()
    }

    fn direction(&self) -> Direction {
        self.transform.direction()
    }

    fn chunk_size(&self) -> usize {
        self.transform.chunk_size()
    }

    fn init(&mut self) -> Result<()> {
        self.session.start()?;
        let result = self.transform.init();
        self.session.guard(result)?;

        debug!(transform = self.transform.name(), "session started");
        Ok(())
    }

    fn update(&mut self, input: &[u8]) -> Result<&[u8]> {
        self.session.ensure_active()?;
        if input.is_empty() {
            return Ok(&[]);
        }

        let capacity = self.output.len();
        let result = check_chunk(input, self.transform.chunk_size())
            .and_then(|()| self.transform.update(input, &mut self.output))
            .and_then(|written| {
                check_written(self.transform.name(), Routine::Update, written, capacity)
            });
        let written = self.session.guard(result)?;

        trace!(transform = self.transform.name(), consumed = input.len(), written, "update");
        Ok(&self.output[..written])
    }

    fn finalize(&mut self) -> Result<&[u8]> {
        self.session.ensure_active()?;

        let capacity = self.output.len();
        let result = self
            .transform
            .finalize(&mut self.output)
            .and_then(|written| {
                check_written(self.transform.name(), Routine::Finalize, written, capacity)
            });
        let written = self.session.guard(result)?;
        self.session.finish();

        trace!(transform = self.transform.name(), written, "finalize");
        Ok(&self.output[..written])
    }
}
