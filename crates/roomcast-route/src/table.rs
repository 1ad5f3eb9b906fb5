//! The route table and path resolution.

use std::collections::HashMap;

use regex::{Captures, Regex};

use crate::{RouteDescriptor, RouteEntry, RouteError};

/// Prefix that marks a path as a pattern route.
const PATTERN_PREFIX: char = '^';

/// Prefix that marks a field value as a capture-group placeholder.
const PLACEHOLDER_PREFIX: char = '$';

/// A pattern route, compiled once at registration.
#[derive(Debug)]
struct PatternRoute {
    source: String,
    regex: Regex,
    fields: RouteDescriptor,
}

/// Maps application paths to [`RouteDescriptor`]s.
///
/// Resolution rules:
///
/// 1. An exact literal match wins outright.
/// 2. Otherwise every pattern is tried in registration order. Each one
///    that matches merges its fields into the result, so a later match
///    overwrites an earlier one field by field.
/// 3. Nothing matching yields an empty descriptor.
#[derive(Debug, Default)]
pub struct RouteTable {
    literals: HashMap<String, RouteDescriptor>,
    patterns: Vec<PatternRoute>,
}

impl RouteTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from configuration entries, in order.
    pub fn from_entries<I>(entries: I) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = RouteEntry>,
    {
        let mut table = Self::new();
        for entry in entries {
            table.insert(entry.path, entry.fields)?;
        }
        Ok(table)
    }

    /// Registers a route.
    ///
    /// Paths starting with `^` are compiled as regular expressions. Re-
    /// registering a path replaces its fields; a pattern keeps its
    /// original position in the match order.
    ///
    /// # Errors
    /// Returns [`RouteError::InvalidPattern`] if a pattern does not
    /// compile.
    pub fn insert(
        &mut self,
        path: impl Into<String>,
        fields: RouteDescriptor,
    ) -> Result<(), RouteError> {
        let path = path.into();
        if !path.starts_with(PATTERN_PREFIX) {
            self.literals.insert(path, fields);
            return Ok(());
        }

        if let Some(existing) = self.patterns.iter_mut().find(|p| p.source == path) {
            existing.fields = fields;
            return Ok(());
        }

        let regex = Regex::new(&path).map_err(|source| RouteError::InvalidPattern {
            pattern: path.clone(),
            source,
        })?;
        self.patterns.push(PatternRoute {
            source: path,
            regex,
            fields,
        });
        Ok(())
    }

    /// Resolves `path` to its descriptor. Never fails; check
    /// [`RouteDescriptor::is_empty`] or the field you need.
    pub fn resolve(&self, path: &str) -> RouteDescriptor {
        if let Some(found) = self.literals.get(path) {
            return found.clone();
        }

        let mut resolved = RouteDescriptor::new();
        for pattern in &self.patterns {
            let Some(caps) = pattern.regex.captures(path) else {
                continue;
            };
            for (name, value) in pattern.fields.iter() {
                match substitute(value, &caps) {
                    Some(v) => resolved.insert(name, v),
                    None => tracing::debug!(
                        pattern = %pattern.source,
                        field = name,
                        value,
                        "skipping non-numeric placeholder"
                    ),
                }
            }
        }
        resolved
    }

    /// Number of registered routes, literal and pattern.
    pub fn len(&self) -> usize {
        self.literals.len() + self.patterns.len()
    }

    /// Returns `true` if no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Expands a field value against a match.
///
/// `$d` (second character a digit) becomes capture group `d`, or `""` if
/// that group does not exist or did not take part in the match. Any
/// other `$`-prefixed value yields `None`. Everything else is copied.
fn substitute(value: &str, caps: &Captures<'_>) -> Option<String> {
    let Some(rest) = value.strip_prefix(PLACEHOLDER_PREFIX) else {
        return Some(value.to_string());
    };
    let group = rest.chars().next()?.to_digit(10)? as usize;
    Some(
        caps.get(group)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
    )
}
