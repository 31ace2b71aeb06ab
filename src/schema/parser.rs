//! Schema text parser
//!
//! Recursive descent with one character of lookahead.
//!
//! ```text
//! rule      := '[' ']' | '[' predList ruleList? ']' | '[' ruleList ']'
//! ruleList  := rule+
//! predList  := predicate (',' predicate)*
//! predicate := ident ['=' value ('/' value)*]
//! ```
//!
//! Whitespace separates tokens and `#` starts a comment running to the end
//! of the line. Predicates may be followed by nested rules (the next level)
//! but never the other way round.

use std::collections::BTreeSet;

use crate::error::{FieldError, Result};

use super::predicate::{Matcher, Predicate};
use super::rule::Rule;

pub struct RulesParser {
    chars: Vec<char>,
    pos: usize,
}

impl RulesParser {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    /// Parse the whole input into top-level rules
    pub fn parse(mut self) -> Result<Vec<Rule>> {
        let mut result = Vec::new();
        while self.peek() == Some('[') {
            result.push(self.parse_rule()?);
        }
        match self.peek() {
            None => Ok(result),
            Some(c) => Err(self.error(format!("remaining char '{}'", c))),
        }
    }

    // =========================================================================
    // Grammar
    // =========================================================================

    fn parse_rule(&mut self) -> Result<Rule> {
        self.consume('[')?;

        let mut predicates = Vec::new();
        let mut rules = Vec::new();

        if self.peek() == Some(']') {
            self.consume(']')?;
            return Ok(Rule::new(predicates, rules));
        }

        if self.peek() != Some('[') {
            predicates.push(self.parse_predicate()?);
            while self.peek() == Some(',') {
                self.consume(',')?;
                predicates.push(self.parse_predicate()?);
            }
        }

        while self.peek() == Some('[') {
            rules.push(self.parse_rule()?);
        }

        match self.peek() {
            Some(']') => {
                self.consume(']')?;
                Ok(Rule::new(predicates, rules))
            }
            Some(c) if !rules.is_empty() => Err(self.error(format!(
                "unexpected '{}' after nested rules, predicates must come first",
                c
            ))),
            Some(c) => Err(self.error(format!("expected ',', '[' or ']', got '{}'", c))),
            None => Err(self.error("unexpected end of input, expected ']'")),
        }
    }

    fn parse_predicate(&mut self) -> Result<Predicate> {
        let keyword = self.parse_ident()?;
        let mut values = BTreeSet::new();

        if !matches!(self.peek(), Some(',') | Some('[') | Some(']')) {
            self.consume('=')?;
            values.insert(self.parse_ident()?);
            while self.peek() == Some('/') {
                self.consume('/')?;
                values.insert(self.parse_ident()?);
            }
        }

        Ok(Predicate::new(keyword, Matcher::from_values(values)))
    }

    fn parse_ident(&mut self) -> Result<String> {
        let start = self.peek();
        let mut s = String::new();
        while let Some(&c) = self.chars.get(self.pos) {
            if Self::is_delimiter(c) {
                break;
            }
            s.push(c);
            self.pos += 1;
        }

        if s.is_empty() {
            return Err(match start {
                Some(c) => self.error(format!("expected identifier, got '{}'", c)),
                None => self.error("unexpected end of input, expected identifier"),
            });
        }
        Ok(s)
    }

    // =========================================================================
    // Tokenizer
    // =========================================================================

    fn is_delimiter(c: char) -> bool {
        matches!(c, '/' | '=' | ',' | '[' | ']' | '#') || c.is_whitespace()
    }

    /// Next significant character, skipping whitespace and comments
    fn peek(&mut self) -> Option<char> {
        loop {
            let c = *self.chars.get(self.pos)?;
            if c.is_whitespace() {
                self.pos += 1;
            } else if c == '#' {
                while let Some(&c) = self.chars.get(self.pos) {
                    self.pos += 1;
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                return Some(c);
            }
        }
    }

    fn consume(&mut self, expected: char) -> Result<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{}', got '{}'", expected, c))),
            None => Err(self.error(format!(
                "unexpected end of input, expected '{}'",
                expected
            ))),
        }
    }

    fn error(&self, message: impl Into<String>) -> FieldError {
        FieldError::Parse {
            position: self.pos,
            message: message.into(),
        }
    }
}
