//! Buffer capacity derivation from transform cost models.

use crate::error::{Result, TransformError};
use crate::transform::{Rational, Transform};

const CAPACITY_OVERFLOW: TransformError = TransformError::InvalidConfig {
    message: "buffer capacity overflows usize",
};

/// Computes the smallest safe single-shot output buffer for a cost model.
///
/// The result is `next_power_of_two(ceil(chunk_size * factor) + extra_size)`.
/// Rounding to a power of two keeps allocation sizes stable across sessions
/// that swap transforms with slightly different cost models.
///
/// # Example
///
/// ```
/// use chunkform::{Rational, buffer_capacity};
///
/// // Base64 over 4 KiB chunks: ceil(4096 * 4/3) = 5462 -> 8192
/// assert_eq!(buffer_capacity(4096, 0, Rational::new(4, 3))?, 8192);
///
/// // Block cipher with a padding block: 4096 + 32 -> 8192
/// assert_eq!(buffer_capacity(4096, 32, Rational::ONE)?, 8192);
/// # Ok::<(), chunkform::TransformError>(())
/// ```
pub fn buffer_capacity(chunk_size: usize, extra_size: usize, factor: Rational) -> Result<usize> {
    factor
        .ceil_mul(chunk_size)
        .and_then(|expanded| expanded.checked_add(extra_size))
        .and_then(usize::checked_next_power_of_two)
        .ok_or(CAPACITY_OVERFLOW)
}

/// Computes [`buffer_capacity`] from a transform's declared cost model.
pub fn transform_capacity<T: Transform + ?Sized>(transform: &T) -> Result<usize> {
    buffer_capacity(
        transform.chunk_size(),
        transform.extra_size(),
        transform.expansion_factor(),
    )
}

/// Computes the shared region size for a chain of transforms.
///
/// Every stage's own requirement (`max(chunk_size, capacity)`) is covered,
/// and so is the worst case of feeding the first stage's chunk size through
/// each stage's cost model in order, since later stages consume expanded
/// output rather than chunk-sized input.
pub(crate) fn chain_capacity<T: Transform>(stages: &[T]) -> Result<usize> {
    let mut capacity = 0usize;
    let mut carried = stages.first().map_or(0, |stage| stage.chunk_size());

    for stage in stages {
        capacity = capacity
            .max(stage.chunk_size())
            .max(transform_capacity(stage)?);

        carried = stage
            .expansion_factor()
            .ceil_mul(carried)
            .and_then(|expanded| expanded.checked_add(stage.extra_size()))
            .ok_or(CAPACITY_OVERFLOW)?;
        capacity = capacity.max(carried);
    }

    capacity.checked_next_power_of_two().ok_or(CAPACITY_OVERFLOW)
}

/// One contiguous allocation split into an input half and an output half.
#[derive(Debug)]
pub(crate) struct BufferPair {
    storage: Box<[u8]>,
    split: usize,
}

impl BufferPair {
    /// Allocates `input_size + output_size` zeroed bytes.
    pub(crate) fn new(input_size: usize, output_size: usize) -> Self {
        Self {
            storage: vec![0u8; input_size + output_size].into_boxed_slice(),
            split: input_size,
        }
    }

    /// Allocates two halves of `size` bytes each.
    pub(crate) fn uniform(size: usize) -> Self {
        Self::new(size, size)
    }

    /// Returns the size of the input half.
    pub(crate) fn input_len(&self) -> usize {
        self.split
    }

    /// Returns the size of both halves together.
    pub(crate) fn len(&self) -> usize {
        self.storage.len()
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.storage
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage
    }
}
