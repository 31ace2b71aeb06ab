//! Predicates
//!
//! A single-attribute match test. The policy is fixed at parse time by the
//! number of distinct literal values: none → always, one → exact,
//! several → any-of.

use std::collections::BTreeSet;
use std::fmt;

use crate::key::Key;
use crate::types::KeywordType;

/// Match policy of a predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Wildcard: any value matches
    Always,

    /// Exactly one value matches
    Value(String),

    /// Any of a set of values matches
    Any(BTreeSet<String>),
}

impl Matcher {
    /// Pick the policy from the literal values supplied
    pub fn from_values(values: BTreeSet<String>) -> Self {
        match values.len() {
            0 => Matcher::Always,
            1 => match values.into_iter().next() {
                Some(v) => Matcher::Value(v),
                None => Matcher::Always,
            },
            _ => Matcher::Any(values),
        }
    }

    /// Literal values, in sorted order (empty for `Always`)
    pub fn values(&self) -> Vec<&str> {
        match self {
            Matcher::Always => Vec::new(),
            Matcher::Value(v) => vec![v.as_str()],
            Matcher::Any(set) => set.iter().map(String::as_str).collect(),
        }
    }

    /// Test an already-canonical value, canonicalising literals with `ty`
    pub fn matches(&self, value: &str, ty: &dyn KeywordType) -> bool {
        match self {
            Matcher::Always => true,
            Matcher::Value(v) => ty.to_canonical(v) == value,
            Matcher::Any(set) => set.iter().any(|v| ty.to_canonical(v) == value),
        }
    }
}

/// Attribute name plus match policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    keyword: String,
    matcher: Matcher,
}

impl Predicate {
    pub fn new(keyword: impl Into<String>, matcher: Matcher) -> Self {
        Self {
            keyword: keyword.into(),
            matcher,
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Test a raw value for this predicate's attribute
    pub fn matches_value(&self, raw: &str, ty: &dyn KeywordType) -> bool {
        self.matcher.matches(&ty.to_canonical(raw), ty)
    }

    /// Test a key. An absent attribute never matches.
    pub fn matches(&self, key: &Key, ty: &dyn KeywordType) -> bool {
        key.get(&self.keyword)
            .map(|v| self.matches_value(v, ty))
            .unwrap_or(false)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword)?;
        let values = self.matcher.values();
        if !values.is_empty() {
            write!(f, "={}", values.join("/"))?;
        }
        Ok(())
    }
}
