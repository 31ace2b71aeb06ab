//! Schema Module
//!
//! Declarative description of how key attributes partition data, level by
//! level. The first level decides the physical database directory; deeper
//! levels are used when assembling full field locations.
//!
//! ## Example
//! ```text
//! [ class, expver, stream=oper/dcda
//!     [ date, time
//!         [ param, step ] ] ]
//! ```
//!
//! A schema is parsed once and is immutable afterwards, so it can be shared
//! across threads behind an `Arc` without locking.

mod parser;
mod predicate;
mod rule;

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{FieldError, Result};
use crate::key::Key;
use crate::types::TypeRegistry;

pub use parser::RulesParser;
pub use predicate::{Matcher, Predicate};
pub use rule::Rule;

/// Ordered forest of rules
#[derive(Debug, Clone, Default)]
pub struct Schema {
    rules: Vec<Rule>,
    types: TypeRegistry,
}

impl Schema {
    /// Parse schema text with the default (identity) keyword types
    pub fn parse(text: &str) -> Result<Self> {
        let rules = RulesParser::new(text).parse()?;
        tracing::debug!(rules = rules.len(), "Parsed schema");
        Ok(Self {
            rules,
            types: TypeRegistry::default(),
        })
    }

    /// Load and parse a schema file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| FieldError::io(path, e))?;
        let schema = Self::parse(&text)?;
        tracing::info!(path = %path.display(), rules = schema.rules.len(), "Loaded schema");
        Ok(schema)
    }

    /// Replace the keyword types used to canonicalise values
    pub fn with_types(mut self, types: TypeRegistry) -> Self {
        self.types = types;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Concrete first-level keys consistent with `key`.
    ///
    /// Attributes absent from `key` act as wildcards; unconstrained
    /// always-predicates are omitted from the result keys.
    pub fn match_first_level(&self, key: &Key) -> BTreeSet<Key> {
        self.match_first_level_with(key, None)
    }

    /// As `match_first_level`, but unconstrained always-predicates take the
    /// `missing` placeholder so every result key covers the whole level.
    pub fn match_first_level_with(&self, key: &Key, missing: Option<&str>) -> BTreeSet<Key> {
        let mut result = BTreeSet::new();
        for rule in &self.rules {
            rule.match_first_level(key, &self.types, missing, &mut result);
        }
        result
    }

    /// Per-level keys along the first rule path that fully matches `key`
    pub fn match_full(&self, key: &Key) -> Option<Vec<Key>> {
        self.rules
            .iter()
            .find_map(|rule| rule.match_full(key, &self.types))
    }

    pub fn matches(&self, key: &Key) -> bool {
        self.match_full(key).is_some()
    }
}

impl FromStr for Schema {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}
