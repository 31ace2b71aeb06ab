//! Journal Reader
//!
//! Reads records sequentially. A trailing record cut short by a crash
//! mid-append ends the log; any other inconsistency is fatal.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::config::JournalSettings;
use crate::error::{FieldError, Result};

use super::record::{
    JournalRecord, RecordHeader, RecordTag, CHECKSUM_VERSION, HEADER_SIZE, MAX_RECORD_SIZE,
};

/// Reads records from a journal file
pub struct JournalReader {
    path: PathBuf,
    file: BufReader<File>,
    settings: JournalSettings,
    /// End of the last complete record
    position: u64,
    torn_tail: bool,
}

impl JournalReader {
    /// Open a journal file for reading
    pub fn open(path: &Path, settings: &JournalSettings) -> Result<Self> {
        settings.validate()?;
        let file = File::open(path).map_err(|e| FieldError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: BufReader::new(file),
            settings: settings.clone(),
            position: 0,
            torn_tail: false,
        })
    }

    /// Read the next record, `None` at end of log
    pub fn next_record(&mut self) -> Result<Option<JournalRecord>> {
        if self.torn_tail {
            return Ok(None);
        }

        let mut header = [0u8; HEADER_SIZE];
        let n = self.read_full(&mut header)?;
        if n == 0 {
            return Ok(None);
        }
        if n < HEADER_SIZE {
            return Ok(self.torn(n));
        }

        let header = RecordHeader::decode(&header);

        if !self.settings.supports(header.version) {
            return Err(FieldError::UnsupportedVersion {
                path: self.path.clone(),
                version: header.version,
                supported: self.settings.supported_versions.clone(),
            });
        }

        let tag = RecordTag::try_from(header.tag).map_err(|tag| FieldError::UnknownTag {
            path: self.path.clone(),
            offset: self.position,
            tag,
        })?;

        let size = header.size as usize;
        let payload_len = header.payload_len as usize;
        if size % self.settings.round_size != 0
            || size < HEADER_SIZE + payload_len
            || size > MAX_RECORD_SIZE
        {
            return Err(self.corrupt(format!(
                "inconsistent record size {} (payload {}, rounding {})",
                size, payload_len, self.settings.round_size
            )));
        }

        let mut body = vec![0u8; size - HEADER_SIZE];
        let n = self.read_full(&mut body)?;
        if n < body.len() {
            return Ok(self.torn(HEADER_SIZE + n));
        }

        let payload = &body[..payload_len];
        if header.version >= CHECKSUM_VERSION && crc32fast::hash(payload) != header.crc {
            return Err(self.corrupt(format!("{:?} record checksum mismatch", tag)));
        }

        let record = JournalRecord::decode_payload(tag, payload)
            .map_err(|e| self.corrupt(format!("undecodable {:?} payload: {}", tag, e)))?;

        self.position += size as u64;
        Ok(Some(record))
    }

    /// Read every remaining record
    pub fn read_all(&mut self) -> Result<Vec<JournalRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record()? {
            records.push(record);
        }
        Ok(records)
    }

    /// Offset just past the last complete record
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether reading stopped at a partially written record
    pub fn torn_tail(&self) -> bool {
        self.torn_tail
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn torn(&mut self, bytes: usize) -> Option<JournalRecord> {
        tracing::warn!(
            path = %self.path.display(),
            offset = self.position,
            bytes,
            "Partial record at end of journal, treating as end of log"
        );
        self.torn_tail = true;
        None
    }

    fn corrupt(&self, message: String) -> FieldError {
        FieldError::Format {
            path: self.path.clone(),
            offset: self.position,
            message,
        }
    }

    /// Fill `buf` as far as the file allows, returning the bytes read
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(FieldError::io(&self.path, e)),
            }
        }
        Ok(filled)
    }
}
