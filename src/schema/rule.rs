//! Rules
//!
//! A rule is one schema level: a conjunction of predicates, followed by
//! alternative child rules describing the next level.

use std::collections::BTreeSet;
use std::fmt;

use crate::key::Key;
use crate::types::TypeRegistry;

use super::predicate::{Matcher, Predicate};

/// Conjunction of predicates plus alternative children (immutable once parsed)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rule {
    predicates: Vec<Predicate>,
    rules: Vec<Rule>,
}

impl Rule {
    pub fn new(predicates: Vec<Predicate>, rules: Vec<Rule>) -> Self {
        Self { predicates, rules }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Child rules (alternatives at the next level)
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_leaf(&self) -> bool {
        self.rules.is_empty()
    }

    /// All of this rule's own predicates match `key` (absent attributes fail)
    pub fn matches(&self, key: &Key, types: &TypeRegistry) -> bool {
        self.predicates
            .iter()
            .all(|p| p.matches(key, types.lookup(p.keyword())))
    }

    /// Expand this rule's predicates into concrete first-level keys.
    ///
    /// Attributes present in `key` must match and contribute their canonical
    /// value. Absent attributes are wildcards: literal predicates expand to
    /// each of their values, always-predicates contribute `missing` when
    /// given and are omitted otherwise.
    pub fn match_first_level(
        &self,
        key: &Key,
        types: &TypeRegistry,
        missing: Option<&str>,
        result: &mut BTreeSet<Key>,
    ) {
        let mut tmp = Key::new();
        self.expand_first_level(key, types, missing, 0, &mut tmp, result);
    }

    fn expand_first_level(
        &self,
        key: &Key,
        types: &TypeRegistry,
        missing: Option<&str>,
        cur: usize,
        tmp: &mut Key,
        result: &mut BTreeSet<Key>,
    ) {
        let Some(predicate) = self.predicates.get(cur) else {
            result.insert(tmp.clone());
            return;
        };

        let keyword = predicate.keyword();
        let ty = types.lookup(keyword);

        match key.get(keyword) {
            Some(raw) => {
                if !predicate.matches_value(raw, ty) {
                    return;
                }
                tmp.set(keyword, ty.to_canonical(raw));
                self.expand_first_level(key, types, missing, cur + 1, tmp, result);
                tmp.remove(keyword);
            }
            None => match predicate.matcher() {
                Matcher::Always => match missing {
                    Some(placeholder) => {
                        tmp.set(keyword, placeholder);
                        self.expand_first_level(key, types, missing, cur + 1, tmp, result);
                        tmp.remove(keyword);
                    }
                    None => self.expand_first_level(key, types, missing, cur + 1, tmp, result),
                },
                matcher => {
                    for value in matcher.values() {
                        tmp.set(keyword, ty.to_canonical(value));
                        self.expand_first_level(key, types, missing, cur + 1, tmp, result);
                        tmp.remove(keyword);
                    }
                }
            },
        }
    }

    /// Full-depth match: the keys of each level along the first matching path
    pub fn match_full(&self, key: &Key, types: &TypeRegistry) -> Option<Vec<Key>> {
        if !self.matches(key, types) {
            return None;
        }

        let level: Key = self
            .predicates
            .iter()
            .filter_map(|p| {
                key.get(p.keyword())
                    .map(|v| (p.keyword(), types.canonical(p.keyword(), v)))
            })
            .collect();

        if self.is_leaf() {
            return Some(vec![level]);
        }

        self.rules.iter().find_map(|child| {
            child.match_full(key, types).map(|mut rest| {
                rest.insert(0, level.clone());
                rest
            })
        })
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, p) in self.predicates.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", p)?;
        }
        for rule in &self.rules {
            write!(f, "{}", rule)?;
        }
        write!(f, "]")
    }
}
