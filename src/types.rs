//! Keyword types
//!
//! Each attribute may have a type that turns a raw value into its canonical
//! string. Schema matching and directory name construction compare canonical
//! strings only.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Canonicaliser for one kind of attribute value
pub trait KeywordType: fmt::Debug + Send + Sync {
    fn to_canonical(&self, raw: &str) -> String;
}

/// Identity: values are already canonical
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultType;

impl KeywordType for DefaultType {
    fn to_canonical(&self, raw: &str) -> String {
        raw.to_string()
    }
}

/// Forecast steps and step ranges.
///
/// `006` → `6`, `12-12` → `12`, `0-6` stays a range. Anything that is not
/// an integer step is left untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct StepType;

impl StepType {
    fn normalise(part: &str) -> Option<String> {
        let n: u64 = part.trim().parse().ok()?;
        Some(n.to_string())
    }
}

impl KeywordType for StepType {
    fn to_canonical(&self, raw: &str) -> String {
        match raw.split_once('-') {
            Some((from, to)) => match (Self::normalise(from), Self::normalise(to)) {
                (Some(from), Some(to)) if from == to => to,
                (Some(from), Some(to)) => format!("{}-{}", from, to),
                _ => raw.to_string(),
            },
            None => Self::normalise(raw).unwrap_or_else(|| raw.to_string()),
        }
    }
}

/// Maps attribute names to their types, falling back to `DefaultType`
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<dyn KeywordType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type for an attribute, replacing any previous one
    pub fn register(&mut self, keyword: impl Into<String>, ty: Arc<dyn KeywordType>) {
        self.types.insert(keyword.into(), ty);
    }

    /// Builder-style `register`
    pub fn with(mut self, keyword: impl Into<String>, ty: impl KeywordType + 'static) -> Self {
        self.register(keyword, Arc::new(ty));
        self
    }

    pub fn lookup(&self, keyword: &str) -> &dyn KeywordType {
        match self.types.get(keyword) {
            Some(ty) => ty.as_ref(),
            None => &DefaultType,
        }
    }

    pub fn canonical(&self, keyword: &str, raw: &str) -> String {
        self.lookup(keyword).to_canonical(raw)
    }
}
