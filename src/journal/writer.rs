//! Journal Writer
//!
//! Every append opens the file, writes exactly one rounded record with a
//! single write and closes it again. No descriptor outlives an operation.
//!
//! A record cut short by an earlier crash is truncated away before the next
//! append, so new records always start on a record boundary.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::{JournalSettings, JournalSyncStrategy};
use crate::error::{FieldError, Result};

use super::record::{JournalRecord, RecordHeader, HEADER_SIZE};

/// Appends records to an existing journal file
pub struct JournalWriter {
    path: PathBuf,
    settings: JournalSettings,
}

impl JournalWriter {
    pub fn new(path: &Path, settings: &JournalSettings) -> Self {
        Self {
            path: path.to_path_buf(),
            settings: settings.clone(),
        }
    }

    /// Append one record, returning its size on disk.
    ///
    /// The journal must already exist; appending never creates it.
    pub fn append(&self, record: &JournalRecord) -> Result<usize> {
        self.settings.validate()?;

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| FieldError::io(&self.path, e))?;

        let (complete, len) = self.complete_length(&mut file)?;
        if complete < len {
            tracing::warn!(
                path = %self.path.display(),
                offset = complete,
                bytes = len - complete,
                "Truncating partial record before append"
            );
            file.set_len(complete)
                .map_err(|e| FieldError::io(&self.path, e))?;
        }

        self.write_to(&mut file, record)
    }

    /// Write one record to an already open file positioned at the end
    pub(crate) fn write_to(&self, file: &mut File, record: &JournalRecord) -> Result<usize> {
        let bytes = record.encode(self.settings.write_version, self.settings.round_size)?;

        file.write_all(&bytes)
            .map_err(|e| FieldError::io(&self.path, e))?;

        if self.settings.sync_strategy == JournalSyncStrategy::EveryWrite {
            file.sync_data().map_err(|e| FieldError::io(&self.path, e))?;
        }

        Ok(bytes.len())
    }

    /// End of the last complete record, and the file length.
    ///
    /// Walks record headers only. A size that cannot belong to any record is
    /// corruption, not a torn tail, and is refused.
    fn complete_length(&self, file: &mut File) -> Result<(u64, u64)> {
        let len = file
            .metadata()
            .map_err(|e| FieldError::io(&self.path, e))?
            .len();
        let round_size = self.settings.round_size as u64;
        let header_size = HEADER_SIZE as u64;

        let mut position = 0u64;
        let mut header = [0u8; HEADER_SIZE];
        while len - position >= header_size {
            file.seek(SeekFrom::Start(position))
                .map_err(|e| FieldError::io(&self.path, e))?;
            file.read_exact(&mut header)
                .map_err(|e| FieldError::io(&self.path, e))?;

            let size = u64::from(RecordHeader::decode(&header).size);
            if size < header_size || size % round_size != 0 {
                return Err(FieldError::Format {
                    path: self.path.clone(),
                    offset: position,
                    message: format!("inconsistent record size {}", size),
                });
            }
            if size > len - position {
                break;
            }
            position += size;
        }

        Ok((position, len))
    }
}
