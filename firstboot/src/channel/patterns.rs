//! Ordered prompt alternatives.

use regex::bytes::Regex;

use crate::error::{ConfigurationError, Result};

/// Where a prompt matched inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptMatch {
    /// Position of the winning pattern in the set.
    pub index: usize,

    /// Byte offset where the match starts.
    pub start: usize,

    /// Byte offset just past the match.
    pub end: usize,
}

/// An ordered list of prompt regexes.
///
/// Patterns are tried in list order and the first one that matches
/// anywhere in the searched bytes wins, even if a later pattern would
/// match earlier in the text. This lets a caller say "either the success
/// prompt or the device's yes/no question" and branch on the index.
#[derive(Debug, Clone)]
pub struct PromptSet {
    patterns: Vec<Regex>,
}

impl PromptSet {
    /// Compile a prompt set from pattern strings.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(ConfigurationError::InvalidPattern)?;

        if patterns.is_empty() {
            return Err(ConfigurationError::Invalid {
                message: "prompt set needs at least one pattern".to_string(),
            }
            .into());
        }

        Ok(Self { patterns })
    }

    /// Compile a set holding a single pattern.
    pub fn single(pattern: &str) -> Result<Self> {
        Self::new([pattern])
    }

    /// Find the first pattern (in list order) that matches `haystack`.
    pub fn find(&self, haystack: &[u8]) -> Option<PromptMatch> {
        self.patterns.iter().enumerate().find_map(|(index, re)| {
            re.find(haystack).map(|m| PromptMatch {
                index,
                start: m.start(),
                end: m.end(),
            })
        })
    }

    /// Whether any pattern matches.
    pub fn is_match(&self, haystack: &[u8]) -> bool {
        self.patterns.iter().any(|re| re.is_match(haystack))
    }

    /// Pattern sources, for diagnostics.
    pub fn sources(&self) -> Vec<String> {
        self.patterns.iter().map(|re| re.as_str().to_string()).collect()
    }

    /// Number of alternatives.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Always false for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_order_wins_over_text_order() {
        let set = PromptSet::new([r"\(config\)#", r"replace them\?"]).unwrap();
        let found = set
            .find(b"Do you really want to replace them? [yes/no]: R1(config)#")
            .unwrap();
        assert_eq!(found.index, 0);
    }

    #[test]
    fn test_second_alternative() {
        let set = PromptSet::new([r"\(config\)#", r"replace them\?"]).unwrap();
        let found = set
            .find(b"% Do you really want to replace them? [yes/no]: ")
            .unwrap();
        assert_eq!(found.index, 1);
        assert_eq!(found.end - found.start, "replace them?".len());
    }

    #[test]
    fn test_matches_across_lines() {
        let set = PromptSet::single(r"Router>").unwrap();
        assert!(set.is_match(b"banner line\r\n\r\nRouter>"));
    }

    #[test]
    fn test_invalid_pattern_is_configuration_error() {
        let err = PromptSet::single(r"(unclosed").unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Configuration(ConfigurationError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_empty_set_rejected() {
        assert!(PromptSet::new(Vec::<String>::new()).is_err());
    }
}
