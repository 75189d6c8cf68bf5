//! Buffer management for pipelines and stream adapters.
//!
//! - [`buffer_capacity`] - Safe output capacity for a cost model
//! - [`transform_capacity`] - The same, read from a [`crate::Transform`]
//!
//! The ping-pong state machine and the staging pool are implementation
//! details and not part of the public API.

mod ping_pong;
mod pool;
mod sizing;

pub use sizing::{buffer_capacity, transform_capacity};

pub(crate) use ping_pong::{PingPongBuffer, View};
pub(crate) use pool::Buffer;
pub(crate) use sizing::{BufferPair, chain_capacity};
