//! Symbols already declared in the target code.
//!
//! A source scanner supplies these so generators can skip handlers and types
//! that already exist. They never influence derivation itself.

use std::collections::BTreeSet;

/// Handler function names and type names that already exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingSymbols {
    handlers: BTreeSet<String>,
    types: BTreeSet<String>,
}

impl ExistingSymbols {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add declared handler function names.
    pub fn with_handlers<I, S>(mut self, handlers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.handlers.extend(handlers.into_iter().map(Into::into));
        self
    }

    /// Add declared type names.
    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains(name)
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty() && self.types.is_empty()
    }
}

/// Parse a symbol list: one name per line, blank lines and `#` comments ignored.
pub fn parse_symbol_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
