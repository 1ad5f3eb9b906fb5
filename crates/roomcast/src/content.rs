//! Collaborators that supply content for rendered views.
//!
//! roomcast does not own a database or a template engine. It reads
//! records through a [`Store`] and turns them into markup through a
//! [`Renderer`]; both are supplied by the hosting application.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use serde_json::Value;

/// Errors reported by a [`Store`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No record under `key` in `table`.
    #[error("no record {key:?} in table {table:?}")]
    NotFound {
        /// Table that was searched.
        table: String,
        /// Key that was not found.
        key: String,
    },

    /// The backend failed.
    #[error("store failure: {0}")]
    Backend(String),
}

/// A uniform get/put/delete/list interface over tables of JSON records.
pub trait Store: Send + Sync + 'static {
    /// Fetches one record.
    fn get(&self, table: &str, key: &str) -> Result<Value, StoreError>;

    /// Fetches every record in `table`. An unknown table is empty.
    fn list_all(&self, table: &str) -> Result<Vec<Value>, StoreError>;

    /// Inserts or replaces a record.
    fn put(&self, table: &str, key: &str, record: Value) -> Result<(), StoreError>;

    /// Removes a record. Removing a missing record is not an error.
    fn delete(&self, table: &str, key: &str) -> Result<(), StoreError>;
}

/// An in-process [`Store`]. Tables list their records in key order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, BTreeMap<String, Value>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("memory store lock poisoned".to_string())
}

impl Store for MemoryStore {
    fn get(&self, table: &str, key: &str) -> Result<Value, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        tables
            .get(table)
            .and_then(|records| records.get(key))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                key: key.to_string(),
            })
    }

    fn list_all(&self, table: &str) -> Result<Vec<Value>, StoreError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables
            .get(table)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    fn put(&self, table: &str, key: &str, record: Value) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), record);
        Ok(())
    }

    fn delete(&self, table: &str, key: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        if let Some(records) = tables.get_mut(table) {
            records.remove(key);
        }
        Ok(())
    }
}

/// Errors reported by a [`Renderer`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The renderer has no template by that name.
    #[error("unknown template {0:?}")]
    UnknownTemplate(String),

    /// Rendering started but failed.
    #[error("render failed: {0}")]
    Failed(String),
}

/// Turns a template id plus data into markup.
///
/// Any `Fn(&str, &Value) -> Result<String, RenderError>` closure is a
/// renderer.
pub trait Renderer: Send + Sync + 'static {
    /// Renders `template` with `data` (a JSON array of records).
    fn render(&self, template: &str, data: &Value) -> Result<String, RenderError>;
}

impl<F> Renderer for F
where
    F: Fn(&str, &Value) -> Result<String, RenderError> + Send + Sync + 'static,
{
    fn render(&self, template: &str, data: &Value) -> Result<String, RenderError> {
        self(template, data)
    }
}

/// Renders the data itself as compact JSON, whatever the template.
/// Useful when the client does its own templating.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, _template: &str, data: &Value) -> Result<String, RenderError> {
        serde_json::to_string(data).map_err(|e| RenderError::Failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_memory_store_put_get_delete() {
        let store = MemoryStore::new();
        store.put("users", "7", json!({"name": "ana"})).unwrap();

        assert_eq!(store.get("users", "7").unwrap(), json!({"name": "ana"}));

        store.delete("users", "7").unwrap();
        assert_eq!(
            store.get("users", "7"),
            Err(StoreError::NotFound {
                table: "users".into(),
                key: "7".into(),
            })
        );
        // Deleting again, or from an unknown table, is fine.
        store.delete("users", "7").unwrap();
        store.delete("nope", "1").unwrap();
    }

    #[test]
    fn test_memory_store_list_all_in_key_order() {
        let store = MemoryStore::new();
        store.put("posts", "b", json!(2)).unwrap();
        store.put("posts", "a", json!(1)).unwrap();
        store.put("other", "z", json!(0)).unwrap();

        assert_eq!(store.list_all("posts").unwrap(), vec![json!(1), json!(2)]);
        assert!(store.list_all("missing").unwrap().is_empty());
    }

    #[test]
    fn test_json_renderer_ignores_template() {
        let out = JsonRenderer.render("anything", &json!([{"a": 1}])).unwrap();
        assert_eq!(out, r#"[{"a":1}]"#);
    }

    #[test]
    fn test_closure_is_a_renderer() {
        let renderer = |template: &str, data: &Value| -> Result<String, RenderError> {
            match template {
                "count" => Ok(format!("{} items", data.as_array().map_or(0, Vec::len))),
                other => Err(RenderError::UnknownTemplate(other.to_string())),
            }
        };

        assert_eq!(renderer.render("count", &json!([1, 2])).unwrap(), "2 items");
        assert_eq!(
            renderer.render("nope", &json!([])),
            Err(RenderError::UnknownTemplate("nope".into()))
        );
    }
}
