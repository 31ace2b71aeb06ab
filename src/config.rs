//! Configuration for fieldstore
//!
//! Centralized configuration with sensible defaults. Replaces any
//! process-wide registry: components receive the values they need from here.

use std::path::{Path, PathBuf};

use crate::error::{FieldError, Result};
use crate::journal::HEADER_SIZE;
use crate::key::Key;

/// Default rounding block for journal records (bytes)
pub const DEFAULT_ROUND_SIZE: usize = 1024;

/// Journal format version written by default
pub const LATEST_JOURNAL_VERSION: u16 = 2;

/// Main configuration for a fieldstore installation
#[derive(Debug, Clone, Default)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Schema Configuration
    // -------------------------------------------------------------------------
    /// Schema file, copied verbatim into each new database directory
    pub schema_path: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // Journal Configuration
    // -------------------------------------------------------------------------
    pub journal: JournalSettings,

    // -------------------------------------------------------------------------
    // Root Configuration
    // -------------------------------------------------------------------------
    /// Root directories searched for databases, per access mode
    pub roots: RootSet,
}

/// Journal format and durability settings
#[derive(Debug, Clone)]
pub struct JournalSettings {
    /// Every record is padded up to a multiple of this many bytes
    pub round_size: usize,

    /// Version stamped on newly written records
    pub write_version: u16,

    /// Versions accepted when reading
    pub supported_versions: Vec<u16>,

    /// Whether appends are synced to disk
    pub sync_strategy: JournalSyncStrategy,
}

/// Journal sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalSyncStrategy {
    /// fsync after every record (safest, slowest)
    EveryWrite,

    /// Leave flushing to the operating system
    OsBuffered,
}

impl Default for JournalSettings {
    fn default() -> Self {
        Self {
            round_size: DEFAULT_ROUND_SIZE,
            write_version: LATEST_JOURNAL_VERSION,
            supported_versions: vec![1, 2],
            sync_strategy: JournalSyncStrategy::EveryWrite,
        }
    }
}

impl JournalSettings {
    pub fn supports(&self, version: u16) -> bool {
        self.supported_versions.contains(&version)
    }

    /// Check the settings are usable for reading and writing records
    pub fn validate(&self) -> Result<()> {
        if self.round_size < HEADER_SIZE {
            return Err(FieldError::Config(format!(
                "Journal round size {} is smaller than the record header ({} bytes)",
                self.round_size, HEADER_SIZE
            )));
        }
        if !self.supports(self.write_version) {
            return Err(FieldError::Config(format!(
                "Journal write version {} is not in the supported list {:?}",
                self.write_version, self.supported_versions
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Roots
// =============================================================================

/// How a caller intends to use the databases it is locating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    Read,
    Write,
    Visit,
}

/// Supplies the root directories to search for a key.
///
/// Which roots apply to which keys is an installation policy; implementors
/// decide it, the locator only consumes the result.
pub trait RootProvider: Send + Sync {
    fn roots(&self, key: &Key, mode: AccessMode) -> Vec<PathBuf>;
}

/// Static root lists, one per access mode
#[derive(Debug, Clone, Default)]
pub struct RootSet {
    pub read: Vec<PathBuf>,
    pub write: Vec<PathBuf>,
    pub visit: Vec<PathBuf>,
}

impl RootSet {
    /// Same roots for every access mode
    pub fn uniform(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        let roots: Vec<PathBuf> = roots.into_iter().map(Into::into).collect();
        Self {
            read: roots.clone(),
            write: roots.clone(),
            visit: roots,
        }
    }
}

impl RootProvider for RootSet {
    fn roots(&self, _key: &Key, mode: AccessMode) -> Vec<PathBuf> {
        match mode {
            AccessMode::Read => self.read.clone(),
            AccessMode::Write => self.write.clone(),
            AccessMode::Visit => self.visit.clone(),
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the schema file copied into new databases
    pub fn schema_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.schema_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the journal record rounding block (in bytes)
    pub fn round_size(mut self, size: usize) -> Self {
        self.config.journal.round_size = size;
        self
    }

    /// Set the version stamped on written records
    pub fn write_version(mut self, version: u16) -> Self {
        self.config.journal.write_version = version;
        self
    }

    /// Set the versions accepted when reading
    pub fn supported_versions(mut self, versions: Vec<u16>) -> Self {
        self.config.journal.supported_versions = versions;
        self
    }

    /// Set the journal sync strategy
    pub fn sync_strategy(mut self, strategy: JournalSyncStrategy) -> Self {
        self.config.journal.sync_strategy = strategy;
        self
    }

    /// Set the per-mode root directories
    pub fn roots(mut self, roots: RootSet) -> Self {
        self.config.roots = roots;
        self
    }

    /// Use the same root directories for every access mode
    pub fn root_dirs(mut self, roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.config.roots = RootSet::uniform(roots);
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.journal.validate()?;
        Ok(self.config)
    }
}
