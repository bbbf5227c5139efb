//! Path patterns
//!
//! A pattern is a dot-separated path template with LIKE wildcards, e.g.
//! `carbon.agents.%`. Graphite indexes store some entries with their segments
//! reversed, so every pattern can also produce its mirrored form.

use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};
use crate::validation::{validate_pattern, ValidationError};

/// A validated path pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern(String);

impl Pattern {
    pub fn new(pattern: impl Into<String>) -> std::result::Result<Self, ValidationError> {
        let pattern = pattern.into();
        validate_pattern(&pattern)?;
        Ok(Self(pattern))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The same pattern with its path segments in reverse order
    pub fn reversed(&self) -> Pattern {
        // Reversal only moves segments around, so the result stays valid
        Pattern(reverse_path(&self.0))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reverse the dot-separated segments of a path: `a.b.c` becomes `c.b.a`
pub fn reverse_path(path: &str) -> String {
    path.rsplit('.').collect::<Vec<_>>().join(".")
}

/// Non-empty, ordered list of patterns read from one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn new(patterns: Vec<Pattern>) -> Result<Self> {
        if patterns.is_empty() {
            return Err(Error::EmptyPatternList);
        }
        Ok(Self { patterns })
    }

    /// Parse newline-delimited patterns
    ///
    /// Lines are trimmed of spaces and blank lines are skipped. The first
    /// invalid line fails the whole list.
    pub fn parse(text: &str) -> Result<Self> {
        let mut patterns = Vec::new();
        for line in text.lines() {
            let line = line.trim_matches(' ');
            if line.is_empty() {
                continue;
            }
            patterns.push(Pattern::new(line)?);
        }
        Self::new(patterns)
    }

    /// Load patterns from a file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::PatternFileRead {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&text)
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Every pattern followed by its reversed form
    pub fn with_reverse(&self) -> Vec<Pattern> {
        self.patterns
            .iter()
            .flat_map(|p| [p.clone(), p.reversed()])
            .collect()
    }

    /// Patterns to match against the index, augmented with reversed forms on request
    pub fn select(&self, reverse: bool) -> Vec<Pattern> {
        if reverse {
            self.with_reverse()
        } else {
            self.patterns.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_path() {
        assert_eq!(reverse_path("a.b.c"), "c.b.a");
        assert_eq!(reverse_path("a"), "a");
        assert_eq!(reverse_path("a.b.%"), "%.b.a");
        assert_eq!(reverse_path(""), "");
    }

    #[test]
    fn test_reverse_twice_is_identity() {
        for path in ["a.b.c", "x", "carbon.agents.host-1.cpu", "a..b", ".a.", "%.b.?"] {
            assert_eq!(reverse_path(&reverse_path(path)), path);
        }
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let set = PatternSet::parse("a.b.*\n\n  c.*  \n   \n").unwrap();
        let patterns: Vec<&str> = set.patterns().iter().map(|p| p.as_str()).collect();
        assert_eq!(patterns, vec!["a.b.*", "c.*"]);
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(PatternSet::parse("\n  \n"), Err(Error::EmptyPatternList)));
    }

    #[test]
    fn test_parse_rejects_bad_line() {
        let err = PatternSet::parse("a.b.*\nc.(d)\n").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { ref pattern, .. } if pattern == "c.(d)"));

        let err = PatternSet::parse("a.b\n%\n").unwrap_err();
        assert!(matches!(err, Error::AmbiguousPattern { .. }));
    }

    #[test]
    fn test_with_reverse_interleaves() {
        let set = PatternSet::parse("a.b.*\nc.d").unwrap();
        let all: Vec<String> = set.with_reverse().iter().map(|p| p.to_string()).collect();
        assert_eq!(all, vec!["a.b.*", "*.b.a", "c.d", "d.c"]);
        assert_eq!(set.select(false).len(), 2);
        assert_eq!(set.select(true).len(), 4);
    }
}
