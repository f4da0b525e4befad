//! Command and prompt templates with `{name}` placeholders.
//!
//! A placeholder is `{` followed by a lowercase letter, then lowercase
//! letters, digits or `_`, then `}`. Any other brace is literal text, so
//! regex quantifiers such as `{2}` pass through untouched.

use std::borrow::Cow;
use std::fmt;

use crate::error::{ConfigurationError, Result};

/// Source of placeholder values.
pub trait Scope {
    /// Value bound to `name`, if any.
    fn var(&self, name: &str) -> Option<&str>;

    /// Device name used in missing-field errors.
    fn device_name(&self) -> &str;
}

/// A string with `{name}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template(Cow<'static, str>);

impl Template {
    pub fn new(source: impl Into<Cow<'static, str>>) -> Self {
        Self(source.into())
    }

    /// The unrendered text.
    pub fn source(&self) -> &str {
        &self.0
    }

    /// Placeholder names in order of appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut rest = self.0.as_ref();
        while let Some((_, name, tail)) = next_placeholder(rest) {
            names.push(name);
            rest = tail;
        }
        names
    }

    /// Substitute placeholders literally.
    pub fn render(&self, scope: &dyn Scope) -> Result<String> {
        self.render_with(scope, |v| v.to_string())
    }

    /// Substitute placeholders with regex-escaped values, for prompts.
    pub fn render_pattern(&self, scope: &dyn Scope) -> Result<String> {
        self.render_with(scope, regex::escape)
    }

    fn render_with(&self, scope: &dyn Scope, encode: impl Fn(&str) -> String) -> Result<String> {
        let mut out = String::with_capacity(self.0.len());
        let mut rest = self.0.as_ref();
        while let Some((before, name, tail)) = next_placeholder(rest) {
            out.push_str(before);
            let value = scope.var(name).ok_or_else(|| ConfigurationError::MissingField {
                device: scope.device_name().to_string(),
                field: name.to_string(),
            })?;
            out.push_str(&encode(value));
            rest = tail;
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// Split off the text before the next placeholder, its name, and the rest.
fn next_placeholder(s: &str) -> Option<(&str, &str, &str)> {
    let mut from = 0;
    while let Some(open) = s[from..].find('{').map(|i| i + from) {
        let body = &s[open + 1..];
        if let Some(close) = body.find('}') {
            let name = &body[..close];
            if is_name(name) {
                return Some((&s[..open], name, &body[close + 1..]));
            }
        }
        from = open + 1;
    }
    None
}

fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl From<&'static str> for Template {
    fn from(s: &'static str) -> Self {
        Self(Cow::Borrowed(s))
    }
}

impl From<String> for Template {
    fn from(s: String) -> Self {
        Self(Cow::Owned(s))
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
