//! Route descriptors and their configuration form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field names with a meaning to the view renderer.
pub mod field {
    /// Template that renders the view.
    pub const TEMPLATE: &str = "template";
    /// Store table to read records from.
    pub const TABLE: &str = "table";
    /// Key of a single record in `table`.
    pub const KEY: &str = "key";
    /// Client-side controllers that accompany the view.
    pub const CONTROLLERS: &str = "controllers";
}

/// The resolved content mapping for one application path.
///
/// A flat set of string fields. The well-known ones are listed in
/// [`field`]; anything else is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteDescriptor {
    fields: BTreeMap<String, String>,
}

impl RouteDescriptor {
    /// Creates an empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a field, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Returns the value of field `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// The template (content id) this route renders.
    pub fn template(&self) -> Option<&str> {
        self.get(field::TEMPLATE)
    }

    /// Table records are loaded from.
    pub fn table(&self) -> Option<&str> {
        self.get(field::TABLE)
    }

    /// Key of the single record to load from the table.
    pub fn key(&self) -> Option<&str> {
        self.get(field::KEY)
    }

    /// Client-side controllers shipped with the view.
    pub fn controllers(&self) -> Option<&str> {
        self.get(field::CONTROLLERS)
    }

    /// Returns `true` if no field is set, which is what an unmatched
    /// path resolves to.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over all fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for RouteDescriptor
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// One route as written in configuration: a path plus its fields.
///
/// ```json
/// { "path": "^/user/(\\d+)$", "template": "user", "table": "users", "key": "$1" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// A literal path, or a pattern if it starts with `^`.
    pub path: String,
    /// Every other key of the entry.
    #[serde(flatten)]
    pub fields: RouteDescriptor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_read_well_known_fields() {
        let d = RouteDescriptor::new()
            .with("template", "user")
            .with("table", "users")
            .with("key", "7")
            .with("controllers", "profile")
            .with("title", "Profile");

        assert_eq!(d.template(), Some("user"));
        assert_eq!(d.table(), Some("users"));
        assert_eq!(d.key(), Some("7"));
        assert_eq!(d.controllers(), Some("profile"));
        assert_eq!(d.get("title"), Some("Profile"));
        assert!(!d.is_empty());
    }

    #[test]
    fn test_new_descriptor_is_empty() {
        let d = RouteDescriptor::new();
        assert!(d.is_empty());
        assert_eq!(d.template(), None);
    }

    #[test]
    fn test_entry_flattens_fields_from_json() {
        let entry: RouteEntry = serde_json::from_str(
            r#"{"path": "/home", "template": "home", "controllers": "nav"}"#,
        )
        .unwrap();

        assert_eq!(entry.path, "/home");
        assert_eq!(entry.fields.template(), Some("home"));
        assert_eq!(entry.fields.controllers(), Some("nav"));
        assert_eq!(entry.fields.get("path"), None);
    }
}
