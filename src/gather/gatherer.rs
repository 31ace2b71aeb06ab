//! Handle Gatherer
//!
//! Collects handles for one request and merges them as they arrive.
//!
//! - Sorted: a new handle may merge with any handle collected so far, on
//!   either side of it.
//! - Unsorted: a new handle may only merge into the most recent one.
//!
//! `data_handle` consumes the gatherer, so a finalized gatherer cannot be
//! added to. Build a new one for the next request.

use std::fmt;

use super::{DataHandle, MultiHandle};

pub struct HandleGatherer<H> {
    sorted: bool,
    handles: Vec<H>,
}

impl<H: DataHandle> HandleGatherer<H> {
    pub fn new(sorted: bool) -> Self {
        Self {
            sorted,
            handles: Vec::new(),
        }
    }

    pub fn sorted() -> Self {
        Self::new(true)
    }

    pub fn unsorted() -> Self {
        Self::new(false)
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Add a handle, merging it into an existing one when possible
    pub fn add(&mut self, handle: H) {
        if self.sorted {
            self.add_sorted(handle);
            return;
        }

        let merged = self
            .handles
            .last_mut()
            .map(|h| h.merge(&handle))
            .unwrap_or(false);
        if !merged {
            self.handles.push(handle);
        }
    }

    /// Merge after or before any collected handle, keeping its slot
    fn add_sorted(&mut self, mut handle: H) {
        for existing in &mut self.handles {
            if existing.merge(&handle) {
                return;
            }
            if handle.merge(existing) {
                *existing = handle;
                return;
            }
        }
        self.handles.push(handle);
    }

    /// Finalize into the composite handle.
    ///
    /// Runs one more merge pass over neighbouring handles (catching merges
    /// unsorted mode missed), compresses each handle, and hands them over.
    pub fn data_handle(self) -> MultiHandle<H> {
        let sorted = self.sorted;
        let mut handles: Vec<H> = Vec::with_capacity(self.handles.len());

        for handle in self.handles {
            let merged = handles
                .last_mut()
                .map(|last| last.merge(&handle))
                .unwrap_or(false);
            if !merged {
                handles.push(handle);
            }
        }

        for handle in &mut handles {
            handle.compress(sorted);
        }

        tracing::debug!(handles = handles.len(), sorted, "Gathered composite handle");
        MultiHandle::new(handles)
    }
}

impl<H> fmt::Display for HandleGatherer<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.handles.len() {
            1 => write!(f, "1 handle"),
            n => write!(f, "{} handles", n),
        }
    }
}
