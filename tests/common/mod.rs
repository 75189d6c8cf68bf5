// Test-only transforms shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chunkform::{BoxedTransform, Direction, Rational, Result, Routine, Transform, TransformError};

// ============================================================================
// identity-expand-4/3
// ============================================================================

/// Emits every 3-byte group followed by the XOR of its bytes.
///
/// A final partial group of 1 or 2 bytes is emitted the same way at
/// finalize, so the output is exactly `ceil(n * 4/3)` bytes.
pub struct Expand43Encoder {
    chunk_size: usize,
    carry: Vec<u8>,
}

impl Expand43Encoder {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            carry: Vec::with_capacity(3),
        }
    }

    pub fn boxed(chunk_size: usize) -> BoxedTransform {
        Box::new(Self::new(chunk_size))
    }
}

fn emit_group(group: &[u8], output: &mut [u8]) -> usize {
    output[..group.len()].copy_from_slice(group);
    output[group.len()] = group.iter().fold(0, |acc, b| acc ^ b);
    group.len() + 1
}

impl Transform for Expand43Encoder {
    fn direction(&self) -> Direction {
        Direction::Forward
    }
    fn name(&self) -> &str {
        "expand-4/3"
    }
    fn chunk_size(&self) -> usize {
        self.chunk_size
    }
    fn extra_size(&self) -> usize {
        3
    }
    fn expansion_factor(&self) -> Rational {
        Rational::new(4, 3)
    }
    fn init(&mut self) -> Result<()> {
        self.carry.clear();
        Ok(())
    }

    fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let mut written = 0;
        for &byte in input {
            self.carry.push(byte);
            if self.carry.len() == 3 {
                written += emit_group(&self.carry, &mut output[written..]);
                self.carry.clear();
            }
        }
        Ok(written)
    }

    fn finalize(&mut self, output: &mut [u8]) -> Result<usize> {
        if self.carry.is_empty() {
            return Ok(0);
        }
        let written = emit_group(&self.carry, output);
        self.carry.clear();
        Ok(written)
    }
}

/// Inverse of [`Expand43Encoder`], verifying every check byte.
pub struct Expand43Decoder {
    chunk_size: usize,
    carry: Vec<u8>,
}

impl Expand43Decoder {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            carry: Vec::with_capacity(4),
        }
    }

    pub fn boxed(chunk_size: usize) -> BoxedTransform {
        Box::new(Self::new(chunk_size))
    }

    fn take_group(&mut self, routine: Routine, output: &mut [u8]) -> Result<usize> {
        let (check, data) = self
            .carry
            .split_last()
            .ok_or_else(|| TransformError::backend("expand-4/3", routine, "empty group"))?;
        if data.iter().fold(0, |acc, b| acc ^ b) != *check {
            return Err(TransformError::backend("expand-4/3", routine, "check byte mismatch"));
        }
        output[..data.len()].copy_from_slice(data);
        let written = data.len();
        self.carry.clear();
        Ok(written)
    }
}

impl Transform for Expand43Decoder {
    fn direction(&self) -> Direction {
        Direction::Inverse
    }
    fn name(&self) -> &str {
        "expand-4/3"
    }
    fn chunk_size(&self) -> usize {
        self.chunk_size
    }
    fn extra_size(&self) -> usize {
        3
    }
    fn expansion_factor(&self) -> Rational {
        Rational::new(3, 4)
    }
    fn init(&mut self) -> Result<()> {
        self.carry.clear();
        Ok(())
    }

    fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let mut written = 0;
        for &byte in input {
            self.carry.push(byte);
            if self.carry.len() == 4 {
                written += self.take_group(Routine::Update, &mut output[written..])?;
            }
        }
        Ok(written)
    }

    fn finalize(&mut self, output: &mut [u8]) -> Result<usize> {
        match self.carry.len() {
            0 => Ok(0),
            1 => Err(TransformError::backend(
                "expand-4/3",
                Routine::Finalize,
                "truncated group",
            )),
            _ => self.take_group(Routine::Finalize, output),
        }
    }
}

// ============================================================================
// Trailer
// ============================================================================

/// Passes bytes through and appends `tag` at finalize.
pub struct Trailer {
    tag: &'static [u8],
}

impl Trailer {
    pub fn boxed(tag: &'static [u8]) -> BoxedTransform {
        Box::new(Self { tag })
    }
}

impl Transform for Trailer {
    fn direction(&self) -> Direction {
        Direction::Forward
    }
    fn name(&self) -> &str {
        "trailer"
    }
    fn chunk_size(&self) -> usize {
        64
    }
    fn extra_size(&self) -> usize {
        self.tag.len()
    }
    fn expansion_factor(&self) -> Rational {
        Rational::ONE
    }
    fn init(&mut self) -> Result<()> {
        Ok(())
    }
    fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        output[..input.len()].copy_from_slice(input);
        Ok(input.len())
    }
    fn finalize(&mut self, output: &mut [u8]) -> Result<usize> {
        output[..self.tag.len()].copy_from_slice(self.tag);
        Ok(self.tag.len())
    }
}

/// Inverse of [`Trailer`]: holds back the last `tag.len()` bytes and
/// verifies them at finalize.
pub struct TrailerStrip {
    tag: &'static [u8],
    held: Vec<u8>,
}

impl TrailerStrip {
    pub fn boxed(tag: &'static [u8]) -> BoxedTransform {
        Box::new(Self {
            tag,
            held: Vec::new(),
        })
    }
}

impl Transform for TrailerStrip {
    fn direction(&self) -> Direction {
        Direction::Inverse
    }
    fn name(&self) -> &str {
        "trailer-strip"
    }
    fn chunk_size(&self) -> usize {
        64
    }
    fn extra_size(&self) -> usize {
        self.tag.len()
    }
    fn expansion_factor(&self) -> Rational {
        Rational::ONE
    }
    fn init(&mut self) -> Result<()> {
        self.held.clear();
        Ok(())
    }
    fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        self.held.extend_from_slice(input);
        let ready = self.held.len().saturating_sub(self.tag.len());
        output[..ready].copy_from_slice(&self.held[..ready]);
        self.held.drain(..ready);
        Ok(ready)
    }
    fn finalize(&mut self, _output: &mut [u8]) -> Result<usize> {
        if self.held != self.tag {
            return Err(TransformError::backend(
                "trailer-strip",
                Routine::Finalize,
                "missing trailer",
            ));
        }
        Ok(0)
    }
}

// ============================================================================
// Counting
// ============================================================================

/// Wraps a transform and counts its `update` calls.
pub struct Counting {
    inner: BoxedTransform,
    updates: Arc<AtomicUsize>,
}

impl Counting {
    pub fn wrap(inner: BoxedTransform) -> (BoxedTransform, Arc<AtomicUsize>) {
        let updates = Arc::new(AtomicUsize::new(0));
        let counting = Self {
            inner,
            updates: Arc::clone(&updates),
        };
        (Box::new(counting), updates)
    }
}

impl Transform for Counting {
    fn direction(&self) -> Direction {
        self.inner.direction()
    }
    fn name(&self) -> &str {
        self.inner.name()
    }
    fn chunk_size(&self) -> usize {
        self.inner.chunk_size()
    }
    fn extra_size(&self) -> usize {
        self.inner.extra_size()
    }
    fn expansion_factor(&self) -> Rational {
        self.inner.expansion_factor()
    }
    fn init(&mut self) -> Result<()> {
        self.inner.init()
    }
    fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(input, output)
    }
    fn finalize(&mut self, output: &mut [u8]) -> Result<usize> {
        self.inner.finalize(output)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Runs `update` then `finalize` on a lone transform with generous buffers.
pub fn update_then_finalize(stage: &mut dyn Transform, input: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; 4 * input.len() + 256];
    let mut out = Vec::new();

    let n = stage.update(input, &mut buf).unwrap();
    out.extend_from_slice(&buf[..n]);
    let n = stage.finalize(&mut buf).unwrap();
    out.extend_from_slice(&buf[..n]);
    out
}

/// Deterministic pseudo-random bytes.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 13) as u8).collect()
}
