//! Thread-local pool of staging regions for stream adapters.

use std::cell::RefCell;

/// Largest allocation returned to the pool (1 MiB).
pub const MAX_POOLED_CAPACITY: usize = 1024 * 1024;

/// Maximum number of buffers to keep per thread.
pub const MAX_POOL_SIZE: usize = 4;

/// A fixed-size staging region with a fill cursor.
///
/// Allocations are rounded up to a power of two and recycled through a
/// thread-local pool, so sessions that reopen adapters with the same
/// transforms reuse memory.
#[derive(Debug)]
pub struct Buffer {
    data: Vec<u8>,
    cursor: usize,
}

impl Buffer {
    /// Takes a region of exactly `len` bytes from the pool or allocates one.
    pub fn take(len: usize) -> Self {
        let pooled = THREAD_BUFFER_POOL.with(|pool| {
            let mut pool = pool.borrow_mut();
            let index = pool.iter().position(|data| data.capacity() >= len)?;
            Some(pool.swap_remove(index))
        });

        let mut data =
            pooled.unwrap_or_else(|| Vec::with_capacity(len.checked_next_power_of_two().unwrap_or(len)));
        data.resize(len, 0);

        Self { data, cursor: 0 }
    }

    /// Returns the staged bytes.
    pub fn filled(&self) -> &[u8] {
        &self.data[..self.cursor]
    }

    /// Returns the unused tail of the region.
    pub fn unfilled_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.cursor..]
    }

    /// Marks `n` more bytes of the tail as staged.
    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.cursor + n <= self.data.len());
        self.cursor += n;
    }

    /// Copies as much of `src` as fits, returning the number of bytes taken.
    pub fn fill(&mut self, src: &[u8]) -> usize {
        let n = src.len().min(self.data.len() - self.cursor);
        self.data[self.cursor..self.cursor + n].copy_from_slice(&src[..n]);
        self.cursor += n;
        n
    }

    /// Returns the number of staged bytes.
    pub fn len(&self) -> usize {
        self.cursor
    }

    /// Returns true if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Returns true if the region holds no more room.
    pub fn is_full(&self) -> bool {
        self.cursor == self.data.len()
    }

    /// Resets the cursor without deallocating.
    pub fn clear(&mut self) {
        self.cursor = 0;
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        // Staged plaintext must not leak into the next session.
        self.data.fill(0);

        if self.data.capacity() <= MAX_POOLED_CAPACITY {
            self.data.clear();
            THREAD_BUFFER_POOL.with(|pool| {
                let mut pool = pool.borrow_mut();
                if pool.len() < MAX_POOL_SIZE {
                    pool.push(std::mem::take(&mut self.data));
                }
            });
        }
    }
}

// Thread-local buffer pool
thread_local! {
    static THREAD_BUFFER_POOL: RefCell<Vec<Vec<u8>>> = const { RefCell::new(Vec::new()) };
}
