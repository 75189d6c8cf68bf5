//! Two-region double buffering for chained stages.
//!
//! Regions are `(arena, start, end)` views into owned arenas instead of raw
//! slices, so the input of one stage and the output of the next can be
//! borrowed at once and every access stays bounds-checked.

use std::ops::{Deref, DerefMut, Range};

use super::sizing::BufferPair;

/// Which owned allocation a view points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Arena {
    /// The steady-state input/output pair.
    Pair,
    /// The finalize-only scratch region.
    Scratch,
}

/// A byte range inside one arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct View {
    arena: Arena,
    start: usize,
    end: usize,
}

impl View {
    pub(crate) const fn new(arena: Arena, start: usize, end: usize) -> Self {
        Self { arena, start, end }
    }

    pub(crate) fn len(&self) -> usize {
        self.end - self.start
    }

    fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

#[derive(Debug, Clone, Copy)]
enum Input {
    /// Nothing to read.
    Empty,
    /// The caller-provided slice passed to [`PingPongBuffer::io`].
    External,
    /// The previous stage's output.
    View(View),
}

/// A state machine alternating the live output target between two regions.
///
/// In the *unswapped* state stages write into the unswapped region; in the
/// *swapped* state into the swapped one. [`PingPongBuffer::swap`] turns the
/// current output (narrowed to what was written) into the next input, so a
/// chain of any length needs only two regions.
#[derive(Debug)]
pub(crate) struct PingPongBuffer {
    pair: BufferPair,
    scratch: Box<[u8]>,
    swapped_out: View,
    unswapped_out: View,
    swapped: bool,
    input: Input,
    output: View,
}

impl PingPongBuffer {
    /// Binds the swapped state to the pair's input half and the unswapped
    /// state to its output half. `scratch` is only reachable through
    /// [`PingPongBuffer::scratch_region`].
    pub(crate) fn new(pair: BufferPair, scratch: Box<[u8]>) -> Self {
        let swapped_out = View::new(Arena::Pair, 0, pair.input_len());
        let unswapped_out = View::new(Arena::Pair, pair.input_len(), pair.len());

        Self {
            pair,
            scratch,
            swapped_out,
            unswapped_out,
            swapped: false,
            input: Input::Empty,
            output: unswapped_out,
        }
    }

    /// The whole scratch arena.
    pub(crate) fn scratch_region(&self) -> View {
        View::new(Arena::Scratch, 0, self.scratch.len())
    }

    /// The whole pair arena, both halves.
    pub(crate) fn pair_region(&self) -> View {
        View::new(Arena::Pair, 0, self.pair.len())
    }

    /// Starts a pass reading from the caller's input.
    pub(crate) fn reset(&mut self) {
        self.restart(Input::External);
    }

    fn restart(&mut self, input: Input) {
        self.input = input;
        self.output = self.unswapped_out;
        self.swapped = false;
    }

    /// Toggles the state; the current output becomes the next input.
    pub(crate) fn swap(&mut self) {
        self.input = Input::View(self.output);
        self.swapped = !self.swapped;
        self.output = self.original_output();
    }

    /// The full region bound to the current state.
    pub(crate) fn original_output(&self) -> View {
        if self.swapped {
            self.swapped_out
        } else {
            self.unswapped_out
        }
    }

    /// The current output view.
    pub(crate) fn output_view(&self) -> View {
        self.output
    }

    /// Narrows the current output to its first `len` bytes.
    pub(crate) fn narrow_output(&mut self, len: usize) {
        debug_assert!(len <= self.output.len());
        self.output.end = self.output.start + len;
    }

    /// Moves the output to the unused rest of the current region.
    pub(crate) fn output_to_remainder(&mut self) {
        let original = self.original_output();
        self.output = View::new(original.arena, self.output.end, original.end);
    }

    /// Widens the output back to the start of the current region, joining
    /// everything written since it was last bound.
    pub(crate) fn extend_output_to_origin(&mut self) {
        self.output.start = self.original_output().start;
    }

    /// Installs alternate regions until the returned guard is dropped.
    ///
    /// The guard restores the previous regions and clears the state.
    pub(crate) fn set_temporary_output(
        &mut self,
        swapped_out: View,
        unswapped_out: View,
    ) -> TemporaryOutput<'_> {
        let saved = (self.swapped_out, self.unswapped_out);
        self.set_output(swapped_out, unswapped_out);

        TemporaryOutput {
            buffer: self,
            saved,
        }
    }

    fn set_output(&mut self, swapped_out: View, unswapped_out: View) {
        self.swapped_out = swapped_out;
        self.unswapped_out = unswapped_out;
        self.restart(Input::Empty);
    }

    /// Borrows the current input and output at the same time.
    ///
    /// `external` is returned as the input right after [`PingPongBuffer::reset`].
    pub(crate) fn io<'a>(&'a mut self, external: &'a [u8]) -> (&'a [u8], &'a mut [u8]) {
        let output = self.output;
        let empty: &[u8] = &[];

        match self.input {
            Input::Empty => (empty, self.region_mut(output)),
            Input::External => (external, self.region_mut(output)),
            Input::View(input) => self.split(input, output),
        }
    }

    /// Reads the bytes behind a view.
    pub(crate) fn slice(&self, view: View) -> &[u8] {
        match view.arena {
            Arena::Pair => &self.pair.as_slice()[view.range()],
            Arena::Scratch => &self.scratch[view.range()],
        }
    }

    fn region_mut(&mut self, view: View) -> &mut [u8] {
        match view.arena {
            Arena::Pair => &mut self.pair.as_mut_slice()[view.range()],
            Arena::Scratch => &mut self.scratch[view.range()],
        }
    }

    fn split(&mut self, input: View, output: View) -> (&[u8], &mut [u8]) {
        match (input.arena, output.arena) {
            (Arena::Pair, Arena::Scratch) => (
                &self.pair.as_slice()[input.range()],
                &mut self.scratch[output.range()],
            ),
            (Arena::Scratch, Arena::Pair) => (
                &self.scratch[input.range()],
                &mut self.pair.as_mut_slice()[output.range()],
            ),
            (Arena::Pair, Arena::Pair) => {
                split_disjoint(self.pair.as_mut_slice(), input.range(), output.range())
            }
            (Arena::Scratch, Arena::Scratch) => {
                split_disjoint(&mut self.scratch, input.range(), output.range())
            }
        }
    }
}

/// Splits one arena into a shared input range and a mutable output range.
///
/// # Panics
///
/// Panics if the ranges overlap.
fn split_disjoint(
    storage: &mut [u8],
    input: Range<usize>,
    output: Range<usize>,
) -> (&[u8], &mut [u8]) {
    if input.end <= output.start {
        let (head, tail) = storage.split_at_mut(output.start);
        (&head[input], &mut tail[..output.end - output.start])
    } else {
        assert!(output.end <= input.start, "ping-pong regions overlap");
        let (head, tail) = storage.split_at_mut(input.start);
        (&tail[..input.end - input.start], &mut head[output])
    }
}

/// Scoped alternate regions installed by [`PingPongBuffer::set_temporary_output`].
pub(crate) struct TemporaryOutput<'a> {
    buffer: &'a mut PingPongBuffer,
    saved: (View, View),
}

impl Deref for TemporaryOutput<'_> {
    type Target = PingPongBuffer;

    fn deref(&self) -> &Self::Target {
        self.buffer
    }
}

impl DerefMut for TemporaryOutput<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.buffer
    }
}

impl Drop for TemporaryOutput<'_> {
    fn drop(&mut self) {
        let (swapped_out, unswapped_out) = self.saved;
        self.buffer.set_output(swapped_out, unswapped_out);
    }
}
