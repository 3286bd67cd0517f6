//! URL matching
//!
//! Patterns are regexes compiled case-insensitively, so a plain substring
//! such as `google` works as-is. Compilation happens once when the rule is
//! loaded; matching afterwards cannot fail.

use crate::error::{RuleError, RuleResult};
use regex::{Regex, RegexBuilder};

/// A compiled, case-insensitive URL pattern.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    source: String,
    regex: Regex,
}

impl UrlPattern {
    pub fn new(pattern: &str) -> RuleResult<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| RuleError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }
}

pub fn matches(url: &str, pattern: &UrlPattern) -> bool {
    pattern.is_match(url)
}

/// True if any pattern matches, stopping at the first hit.
pub fn matches_any(url: &str, patterns: &[UrlPattern]) -> bool {
    patterns.iter().any(|pattern| pattern.is_match(url))
}

/// Ordered `(pattern, value)` pairs evaluated first-match-wins.
#[derive(Debug, Clone)]
pub struct RuleTable<T> {
    entries: Vec<(UrlPattern, T)>,
}

impl<T> Default for RuleTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> RuleTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry after all existing ones.
    pub fn push(&mut self, pattern: &str, value: T) -> RuleResult<()> {
        self.entries.push((UrlPattern::new(pattern)?, value));
        Ok(())
    }

    pub fn first_match(&self, url: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(pattern, _)| pattern.is_match(url))
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> FromIterator<(UrlPattern, T)> for RuleTable<T> {
    fn from_iter<I: IntoIterator<Item = (UrlPattern, T)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
