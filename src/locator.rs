//! Database Locator
//!
//! Resolves a request key to the database directories holding it.
//!
//! ## Steps
//! 1. Ask the schema for the concrete first-level keys consistent with the request
//! 2. List `<name>:<index>` subdirectories of every root
//! 3. Keep subdirectories whose name matches a first-level key's values
//! 4. Confirm each candidate by comparing its journal INIT key with the request
//!
//! A candidate whose journal cannot be read is logged and skipped; it never
//! aborts the scan.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;

use crate::config::{AccessMode, Config, RootProvider};
use crate::error::{FieldError, Result};
use crate::journal::Journal;
use crate::key::Key;
use crate::schema::Schema;

/// Placeholder for unconstrained first-level attributes
const MISSING: &str = ".*";

pub struct DatabaseLocator {
    schema: Arc<Schema>,
    config: Config,
    roots: Arc<dyn RootProvider>,
}

impl DatabaseLocator {
    /// Locator searching the roots configured in `config`
    pub fn new(schema: Arc<Schema>, config: Config) -> Self {
        let roots = Arc::new(config.roots.clone());
        Self {
            schema,
            config,
            roots,
        }
    }

    /// Use a different source of root directories
    pub fn with_root_provider(mut self, roots: Arc<dyn RootProvider>) -> Self {
        self.roots = roots;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Databases for `key` under every readable root
    pub fn all_locations(&self, key: &Key) -> Vec<PathBuf> {
        self.locations(key, AccessMode::Read)
    }

    /// Databases for `key` under writable roots
    pub fn writable_locations(&self, key: &Key) -> Vec<PathBuf> {
        self.locations(key, AccessMode::Write)
    }

    /// Databases for `key` under visitable roots
    pub fn visitable_locations(&self, key: &Key) -> Vec<PathBuf> {
        self.locations(key, AccessMode::Visit)
    }

    fn locations(&self, key: &Key, mode: AccessMode) -> Vec<PathBuf> {
        let dirs = self.roots.roots(key, mode);
        self.databases(key, &dirs)
    }

    /// Database directories under `dirs` whose INIT key equals `key`
    pub fn databases(&self, key: &Key, dirs: &[PathBuf]) -> Vec<PathBuf> {
        let keys = self.schema.match_first_level_with(key, Some(MISSING));
        tracing::debug!(
            key = %key,
            candidates = ?keys.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "Matched DB keys"
        );

        let patterns: Vec<Regex> = keys
            .iter()
            .filter_map(|k| match self.directory_regex(k) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::error!(key = %k, error = %e, "Cannot build directory pattern");
                    None
                }
            })
            .collect();

        let mut result = Vec::new();
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for root in dirs {
            let subdirs = list_databases(root);
            tracing::debug!(root = %root.display(), subdirs = subdirs.len(), "Scanning root");

            for re in &patterns {
                for subdir in &subdirs {
                    if seen.contains(subdir) {
                        continue;
                    }

                    let Some(name) = subdir.file_name().and_then(|n| n.to_str()) else {
                        continue;
                    };
                    if !re.is_match(name) {
                        continue;
                    }

                    match self.confirm(subdir, key) {
                        Ok(true) => result.push(subdir.clone()),
                        Ok(false) => {}
                        Err(e) => {
                            tracing::error!(
                                path = %subdir.display(),
                                error = %e,
                                "Error loading database, skipping"
                            );
                        }
                    }
                    seen.insert(subdir.clone());
                }
            }
        }

        result
    }

    /// Anchored regex over a first-level key's canonical values
    fn directory_regex(&self, key: &Key) -> Result<Regex> {
        let types = self.schema.types();
        let parts: Vec<String> = key
            .iter()
            .map(|(name, value)| {
                if value == MISSING {
                    MISSING.to_string()
                } else {
                    regex::escape(&types.canonical(name, value))
                }
            })
            .collect();

        let pattern = format!("^{}$", parts.join(":"));
        Regex::new(&pattern).map_err(|e| FieldError::Config(format!("{}: {}", pattern, e)))
    }

    fn confirm(&self, directory: &Path, key: &Key) -> Result<bool> {
        let found = Journal::new(directory, &self.config).database_key()?;
        Ok(found == *key)
    }
}

/// Immediate subdirectories named `<name>:<index>`, sorted by name
fn list_databases(root: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(root = %root.display(), error = %e, "Cannot list root, skipping");
            return Vec::new();
        }
    };

    let mut subdirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.contains(':'))
                .unwrap_or(false)
        })
        .collect();

    subdirs.sort();
    subdirs
}
