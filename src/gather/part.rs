//! Part handle
//!
//! Ordered byte ranges of a single file.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{FieldError, Result};

use super::DataHandle;

/// Byte ranges `(offset, length)` within one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartHandle {
    path: PathBuf,
    ranges: Vec<(u64, u64)>,
}

impl PartHandle {
    /// Single range `[offset, offset + length)`
    pub fn new(path: impl Into<PathBuf>, offset: u64, length: u64) -> Self {
        Self {
            path: path.into(),
            ranges: vec![(offset, length)],
        }
    }

    pub fn with_ranges(path: impl Into<PathBuf>, ranges: Vec<(u64, u64)>) -> Self {
        Self {
            path: path.into(),
            ranges,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ranges(&self) -> &[(u64, u64)] {
        &self.ranges
    }

    /// End of the last range, `None` when empty or past `u64::MAX`
    fn end(&self) -> Option<u64> {
        self.ranges
            .last()
            .and_then(|&(offset, length)| offset.checked_add(length))
    }
}

impl DataHandle for PartHandle {
    fn merge(&mut self, other: &Self) -> bool {
        if self.path != other.path {
            return false;
        }
        match (self.end(), other.ranges.first()) {
            (Some(end), Some(&(offset, _))) if end == offset => {
                self.ranges.extend_from_slice(&other.ranges);
                true
            }
            (None, _) if self.ranges.is_empty() => {
                self.ranges.extend_from_slice(&other.ranges);
                true
            }
            _ => false,
        }
    }

    fn compress(&mut self, sorted: bool) {
        if sorted {
            self.ranges.sort_unstable();
        }

        let mut compressed: Vec<(u64, u64)> = Vec::with_capacity(self.ranges.len());
        for &(offset, length) in &self.ranges {
            if length == 0 {
                continue;
            }
            match compressed.last_mut() {
                Some(last) if last.0.checked_add(last.1) == Some(offset) => last.1 += length,
                _ => compressed.push((offset, length)),
            }
        }
        self.ranges = compressed;
    }

    fn estimated_length(&self) -> u64 {
        self.ranges.iter().map(|(_, length)| length).sum()
    }

    fn copy_to(&self, out: &mut dyn Write) -> Result<u64> {
        let mut file = File::open(&self.path).map_err(|e| FieldError::io(&self.path, e))?;
        let mut total = 0;

        for &(offset, length) in &self.ranges {
            file.seek(SeekFrom::Start(offset))
                .map_err(|e| FieldError::io(&self.path, e))?;
            let copied = io::copy(&mut (&mut file).take(length), out)
                .map_err(|e| FieldError::io(&self.path, e))?;
            if copied < length {
                return Err(FieldError::io(
                    &self.path,
                    io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("range {}+{} is past end of file", offset, length),
                    ),
                ));
            }
            total += copied;
        }

        Ok(total)
    }
}
