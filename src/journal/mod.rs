//! Journal Module
//!
//! Append-only table of contents for one physical database directory. It
//! records the lifecycle of index segments; replaying it yields the live
//! segment list.
//!
//! ## Responsibilities
//! - Identify the database (INIT, written once)
//! - Record index segments being added (INDEX) and retracted (CLEAR)
//! - Record full wipes (WIPE)
//! - Replay history into the live segment list, newest first
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Record 1                                                     │
//! │ ┌─────┬─────┬─────────┬──────────┬────────────┬─────────┐    │
//! │ │Tag 1│Rsv 1│Version 2│ Size (4) │PayloadLen 4│ CRC (4) │    │
//! │ └─────┴─────┴─────────┴──────────┴────────────┴─────────┘    │
//! │ Payload (bincode) │ zero padding up to Size                  │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Record 2 ...                                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//! `Size` includes the header and is a multiple of the rounding block.
//! Single writer only: concurrent appenders to one journal are unsupported.

mod reader;
mod record;
mod replay;
mod segment;
mod writer;

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::config::{Config, JournalSettings};
use crate::error::{FieldError, Result};
use crate::key::Key;

pub use reader::JournalReader;
pub use record::{JournalRecord, RecordHeader, RecordTag, HEADER_SIZE, MAX_RECORD_SIZE};
pub use replay::Replay;
pub use segment::{IndexSegment, SegmentId};
pub use writer::JournalWriter;

/// Journal file name inside a database directory
pub const TOC_FILENAME: &str = "toc";

/// Copy of the schema kept alongside each database
pub const SCHEMA_FILENAME: &str = "schema";

/// Journal of one database directory
#[derive(Debug, Clone)]
pub struct Journal {
    directory: PathBuf,
    path: PathBuf,
    settings: JournalSettings,
    schema_path: Option<PathBuf>,
}

impl Journal {
    pub fn new(directory: impl Into<PathBuf>, config: &Config) -> Self {
        let directory = directory.into();
        Self {
            path: directory.join(TOC_FILENAME),
            directory,
            settings: config.journal.clone(),
            schema_path: config.schema_path.clone(),
        }
    }

    /// True if `path` looks like a database directory
    pub fn can_handle(path: &Path) -> bool {
        path.is_dir() && path.join(TOC_FILENAME).exists()
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Write Path
    // =========================================================================

    /// Initialise the database with its key.
    ///
    /// Idempotent: if the journal already starts with an INIT record its key
    /// must equal `key`, and nothing is written.
    pub fn write_init(&self, key: &Key) -> Result<()> {
        fs::create_dir_all(&self.directory).map_err(|e| FieldError::io(&self.directory, e))?;

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| FieldError::io(&self.path, e))?;

        let mut reader = JournalReader::open(&self.path, &self.settings)?;
        match reader.next_record()? {
            Some(JournalRecord::Init { key: found }) => {
                if found != *key {
                    return Err(FieldError::KeyMismatch {
                        path: self.path.clone(),
                        expected: key.clone(),
                        found,
                    });
                }
                tracing::debug!(path = %self.path.display(), key = %key, "Journal already initialised");
                Ok(())
            }
            Some(other) => Err(FieldError::Format {
                path: self.path.clone(),
                offset: 0,
                message: format!("first record is {:?}, expected Init", other.tag()),
            }),
            None => {
                if reader.torn_tail() {
                    tracing::warn!(path = %self.path.display(), "Truncating partial INIT record");
                    file.set_len(reader.position())
                        .map_err(|e| FieldError::io(&self.path, e))?;
                }
                self.copy_schema()?;

                let writer = JournalWriter::new(&self.path, &self.settings);
                writer.write_to(&mut file, &JournalRecord::Init { key: key.clone() })?;
                tracing::info!(path = %self.path.display(), key = %key, "TOC_INIT");
                Ok(())
            }
        }
    }

    /// Record a new index segment
    pub fn write_index(&self, path: &str, offset: u64, metadata: &[u8]) -> Result<()> {
        self.writer().append(&JournalRecord::Index {
            path: path.to_string(),
            offset,
            metadata: metadata.to_vec(),
        })?;
        tracing::info!(path, offset, "TOC_INDEX");
        Ok(())
    }

    /// Retract a previously recorded index segment
    pub fn write_clear(&self, path: &str, offset: u64) -> Result<()> {
        self.writer().append(&JournalRecord::Clear {
            path: path.to_string(),
            offset,
        })?;
        tracing::info!(path, offset, "TOC_CLEAR");
        Ok(())
    }

    /// Retract every index segment recorded so far
    pub fn write_wipe(&self) -> Result<()> {
        self.writer().append(&JournalRecord::Wipe)?;
        tracing::info!(path = %self.path.display(), "TOC_WIPE");
        Ok(())
    }

    // =========================================================================
    // Read Path
    // =========================================================================

    /// Key from the first INIT record
    pub fn database_key(&self) -> Result<Key> {
        let mut reader = JournalReader::open(&self.path, &self.settings)?;
        while let Some(record) = reader.next_record()? {
            if let JournalRecord::Init { key } = record {
                return Ok(key);
            }
        }
        Err(FieldError::MissingInit {
            path: self.path.clone(),
        })
    }

    /// All records in file order
    pub fn records(&self) -> Result<Vec<JournalRecord>> {
        JournalReader::open(&self.path, &self.settings)?.read_all()
    }

    /// Replay the journal. A missing journal replays as empty.
    pub fn replay(&self) -> Result<Replay> {
        if !self.exists() {
            return Ok(Replay::default());
        }
        let reader = JournalReader::open(&self.path, &self.settings)?;
        replay::replay(&self.directory, reader)
    }

    /// Live index segments, most recently written first
    pub fn reconstruct(&self) -> Result<Vec<IndexSegment>> {
        Ok(self.replay()?.segments)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn writer(&self) -> JournalWriter {
        JournalWriter::new(&self.path, &self.settings)
    }

    /// Copy the configured schema next to the journal (temp file + rename)
    fn copy_schema(&self) -> Result<()> {
        let Some(source) = &self.schema_path else {
            return Ok(());
        };

        let target = self.directory.join(SCHEMA_FILENAME);
        let tmp = self
            .directory
            .join(format!("{}.{}.tmp", SCHEMA_FILENAME, std::process::id()));

        tracing::info!(from = %source.display(), to = %target.display(), "Copy schema");
        fs::copy(source, &tmp).map_err(|e| FieldError::io(source, e))?;
        fs::rename(&tmp, &target).map_err(|e| FieldError::io(&target, e))?;
        Ok(())
    }
}
