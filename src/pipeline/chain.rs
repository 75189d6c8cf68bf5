//! Ordered composition of same-direction transforms.

use std::fmt;

use tracing::{debug, trace};

use super::{Pipeline, Session, check_chunk, check_written};
use crate::buffer::{BufferPair, PingPongBuffer, View, chain_capacity};
use crate::error::{Result, Routine, TransformError};
use crate::transform::{BoxedTransform, Direction};

/// Two or more transforms executed as one pipeline.
///
/// All stages share two ping-pong regions and one finalize scratch region,
/// each `capacity()` bytes, so memory is bounded regardless of chain length
/// and no bytes are copied between stages.
///
/// # Example
///
/// ```
/// use chunkform::{Base64Decoder, Base64Encoder, BoxedTransform, Chain, Pipeline};
///
/// let encode: Vec<BoxedTransform> =
///     vec![Box::new(Base64Encoder::new()), Box::new(Base64Encoder::new())];
/// let decode: Vec<BoxedTransform> =
///     vec![Box::new(Base64Decoder::new()), Box::new(Base64Decoder::new())];
///
/// let twice = Chain::new(encode)?.transform_bytes(b"hi")?;
/// assert_eq!(&twice[..], b"YUdrPQ==");
///
/// let plain = Chain::new(decode)?.transform_bytes(&twice)?;
/// assert_eq!(&plain[..], b"hi");
/// # Ok::<(), chunkform::TransformError>(())
/// ```
pub struct Chain {
    stages: Vec<BoxedTransform>,
    buffer: PingPongBuffer,
    capacity: usize,
    session: Session,
}

impl Chain {
    /// Builds a chain, validating that there are at least two stages and
    /// that they all share one direction.
    pub fn new(stages: Vec<BoxedTransform>) -> Result<Self> {
        if stages.len() < 2 {
            return Err(TransformError::InvalidChain {
                message: "at least two transforms are required to be chained",
            });
        }

        let direction = stages[0].direction();
        if stages.iter().any(|stage| stage.direction() != direction) {
            return Err(TransformError::InvalidChain {
                message: "all transforms must share the same direction",
            });
        }

        let capacity = chain_capacity(&stages)?;
        let buffer = PingPongBuffer::new(
            BufferPair::uniform(capacity),
            vec![0u8; capacity].into_boxed_slice(),
        );

        debug!(
            stages = ?stages.iter().map(|stage| stage.name()).collect::<Vec<_>>(),
            ?direction,
            capacity,
            "chain created"
        );

        Ok(Self {
            stages,
            buffer,
            capacity,
            session: Session::Idle,
        })
    }

    /// Returns the number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false; a chain holds at least two stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the shared region size.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the stage names, front to back.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|stage| stage.name())
    }

    fn run_update(&mut self, input: &[u8]) -> Result<View> {
        let last = self.stages.len() - 1;
        self.buffer.reset();

        for (index, stage) in self.stages.iter_mut().enumerate() {
            let (stage_input, output) = self.buffer.io(input);
            let consumed = stage_input.len();
            let capacity = output.len();

            let written = stage.update(stage_input, output)?;
            check_written(stage.name(), Routine::Update, written, capacity)?;
            trace!(stage = stage.name(), consumed, written, "update");

            self.buffer.narrow_output(written);
            if index != last {
                self.buffer.swap();
            }
        }

        Ok(self.buffer.output_view())
    }

    /// Runs the finalize cascade inside the scratch regions.
    ///
    /// The first stage only finalizes. Every later stage updates over the
    /// previous combined output, then finalizes directly after those bytes
    /// in the same region, and the two spans are merged.
    fn run_finalize(&mut self) -> Result<View> {
        let scratch = self.buffer.scratch_region();
        let whole = self.buffer.pair_region();

        let [first, rest @ ..] = self.stages.as_mut_slice() else {
            return Err(TransformError::InvalidChain {
                message: "at least two transforms are required to be chained",
            });
        };
        let mut buffer = self.buffer.set_temporary_output(scratch, whole);

        let (_, output) = buffer.io(&[]);
        let capacity = output.len();
        let written = first.finalize(output)?;
        check_written(first.name(), Routine::Finalize, written, capacity)?;
        trace!(stage = first.name(), written, "finalize");
        buffer.narrow_output(written);

        for stage in rest {
            buffer.swap();

            let (input, output) = buffer.io(&[]);
            let consumed = input.len();
            let capacity = output.len();
            let updated = stage.update(input, output)?;
            check_written(stage.name(), Routine::Update, updated, capacity)?;
            buffer.narrow_output(updated);
            buffer.output_to_remainder();

            let (_, output) = buffer.io(&[]);
            let capacity = output.len();
            let finalized = stage.finalize(output)?;
            check_written(stage.name(), Routine::Finalize, finalized, capacity)?;
            buffer.narrow_output(finalized);
            buffer.extend_output_to_origin();

            trace!(stage = stage.name(), consumed, updated, finalized, "finalize");
        }

        Ok(buffer.output_view())
    }
}

impl Pipeline for Chain {
    fn name(&self) -> &str {
        "chain"
    }

    fn direction(&self) -> Direction {
        self.stages[0].direction()
    }

    /// The front stage's chunk size; later stages consume its output.
    fn chunk_size(&self) -> usize {
        self.stages[0].chunk_size()
    }

    fn init(&mut self) -> Result<()> {
        self.session.start()?;
        let result = self.stages.iter_mut().try_for_each(|stage| stage.init());
        self.session.guard(result)?;

        debug!(stages = self.stages.len(), "chain session started");
        Ok(())
    }

    fn update(&mut self, input: &[u8]) -> Result<&[u8]> {
        self.session.ensure_active()?;
        if input.is_empty() {
            return Ok(&[]);
        }

        let result = check_chunk(input, self.chunk_size()).and_then(|()| self.run_update(input));
        let view = self.session.guard(result)?;
        Ok(self.buffer.slice(view))
    }

    fn finalize(&mut self) -> Result<&[u8]> {
        self.session.ensure_active()?;

        let result = self.run_finalize();
        let view = self.session.guard(result)?;
        self.session.finish();

        Ok(self.buffer.slice(view))
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("stages", &self.names().collect::<Vec<_>>())
            .field("capacity", &self.capacity)
            .field("session", &self.session)
            .finish()
    }
}
