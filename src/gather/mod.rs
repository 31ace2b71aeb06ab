//! Gather Module
//!
//! Assembles the byte-range handles produced while answering a retrieval
//! request into one composite read handle.
//!
//! ## Flow
//! ```text
//!   traversal ──add(h)──▶ HandleGatherer ──data_handle()──▶ MultiHandle
//!                          (merge on add)   (final merge +    (read once)
//!                                            compress)
//! ```

mod gatherer;
mod multi;
mod part;

use std::io::Write;

use crate::error::Result;

pub use gatherer::HandleGatherer;
pub use multi::MultiHandle;
pub use part::PartHandle;

/// A readable byte-range handle that can absorb its neighbours
pub trait DataHandle {
    /// Absorb `other` if it continues this handle. Returns true if absorbed.
    fn merge(&mut self, other: &Self) -> bool;

    /// Tidy internal ranges before reading. `sorted` allows reordering.
    fn compress(&mut self, _sorted: bool) {}

    /// Total number of bytes this handle will produce
    fn estimated_length(&self) -> u64;

    /// Copy the handle's bytes to `out`, returning the number copied
    fn copy_to(&self, out: &mut dyn Write) -> Result<u64>;
}
