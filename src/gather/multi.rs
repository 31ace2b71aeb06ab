//! Composite read handle

use std::io::Write;

use super::DataHandle;
use crate::error::Result;

/// Ordered handles answering one request. Read once, then gone.
#[derive(Debug)]
pub struct MultiHandle<H> {
    handles: Vec<H>,
}

impl<H: DataHandle> MultiHandle<H> {
    pub fn new(handles: Vec<H>) -> Self {
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn handles(&self) -> &[H] {
        &self.handles
    }

    pub fn estimated_length(&self) -> u64 {
        self.handles.iter().map(DataHandle::estimated_length).sum()
    }

    pub fn into_handles(self) -> Vec<H> {
        self.handles
    }

    /// Write every handle's bytes to `out` in order
    pub fn save_into(self, out: &mut dyn Write) -> Result<u64> {
        let mut total = 0;
        for handle in &self.handles {
            total += handle.copy_to(out)?;
        }
        tracing::debug!(handles = self.handles.len(), bytes = total, "Composite handle read");
        Ok(total)
    }
}
