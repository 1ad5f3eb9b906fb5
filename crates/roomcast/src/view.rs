//! Rendering the view a `request` event asks for.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Hub;

/// The payload of a `response` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewResponse {
    /// Template id the path resolved to.
    pub view: String,
    /// Rendered markup.
    pub template: String,
    /// Client-side controllers for the view, or `""`.
    pub controllers: String,
}

/// Resolves `path`, loads its records, and renders it.
///
/// Returns `None` when the path resolves to no template or rendering
/// fails; the requester then gets no response at all. Store failures are
/// not fatal: the view renders with whatever records could be read.
pub fn render_view(hub: &Hub, path: &str) -> Option<ViewResponse> {
    let route = hub.routes.resolve(path);
    let Some(template) = route.template() else {
        tracing::debug!(%path, "no template for path");
        return None;
    };

    let mut records = Vec::new();
    if let Some(table) = route.table() {
        match route.key() {
            Some(key) => match hub.store.get(table, key) {
                Ok(record) => records.push(record),
                Err(e) => tracing::debug!(%path, %table, %key, error = %e, "record not loaded"),
            },
            None => match hub.store.list_all(table) {
                Ok(all) => records = all,
                Err(e) => tracing::debug!(%path, %table, error = %e, "table not loaded"),
            },
        }
    }

    let markup = match hub.renderer.render(template, &Value::Array(records)) {
        Ok(markup) => markup,
        Err(e) => {
            tracing::warn!(%path, %template, error = %e, "render failed");
            return None;
        }
    };

    Some(ViewResponse {
        view: template.to_string(),
        template: markup,
        controllers: route.controllers().unwrap_or_default().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use roomcast_route::RouteEntry;
    use serde_json::json;

    use super::*;
    use crate::{MemoryStore, RenderError, RoomcastServer, Store};

    fn hub() -> Hub {
        let routes: Vec<RouteEntry> = serde_json::from_value(json!([
            { "path": "/", "template": "index", "table": "posts", "controllers": "feed" },
            { "path": "^/post/(\\d+)$", "template": "post", "table": "posts", "key": "$1" },
            { "path": "/about", "template": "about" },
            { "path": "/broken", "template": "missing" },
            { "path": "/notemplate", "table": "posts" }
        ]))
        .unwrap();

        let store = MemoryStore::new();
        store.put("posts", "1", json!({"title": "one"})).unwrap();
        store.put("posts", "2", json!({"title": "two"})).unwrap();

        RoomcastServer::builder()
            .routes(routes)
            .store(store)
            .renderer(|template: &str, data: &Value| -> Result<String, RenderError> {
                match template {
                    "missing" => Err(RenderError::UnknownTemplate(template.to_string())),
                    _ => Ok(format!("{template}:{data}")),
                }
            })
            .into_hub()
            .unwrap()
    }

    #[test]
    fn test_table_without_key_lists_all_records() {
        let view = render_view(&hub(), "/").unwrap();
        assert_eq!(view.view, "index");
        assert_eq!(view.template, r#"index:[{"title":"one"},{"title":"two"}]"#);
        assert_eq!(view.controllers, "feed");
    }

    #[test]
    fn test_table_with_key_loads_one_record() {
        let view = render_view(&hub(), "/post/2").unwrap();
        assert_eq!(view.view, "post");
        assert_eq!(view.template, r#"post:[{"title":"two"}]"#);
        assert_eq!(view.controllers, "");
    }

    #[test]
    fn test_missing_record_renders_empty_collection() {
        let view = render_view(&hub(), "/post/99").unwrap();
        assert_eq!(view.template, "post:[]");
    }

    #[test]
    fn test_no_table_renders_empty_collection() {
        let view = render_view(&hub(), "/about").unwrap();
        assert_eq!(view.template, "about:[]");
    }

    #[test]
    fn test_route_miss_or_no_template_renders_nothing() {
        assert_eq!(render_view(&hub(), "/nowhere"), None);
        assert_eq!(render_view(&hub(), "/notemplate"), None);
    }

    #[test]
    fn test_render_failure_renders_nothing() {
        assert_eq!(render_view(&hub(), "/broken"), None);
    }
}
