//! Route tables built from JSON configuration.

use roomcast_route::{RouteEntry, RouteTable};

const ROUTES: &str = r#"[
    { "path": "/", "template": "index", "table": "posts", "controllers": "feed" },
    { "path": "^/post/(\\d+)$", "template": "post", "table": "posts", "key": "$1" },
    { "path": "^/post/", "controllers": "comments" }
]"#;

fn routes() -> RouteTable {
    let entries: Vec<RouteEntry> = serde_json::from_str(ROUTES).unwrap();
    RouteTable::from_entries(entries).unwrap()
}

#[test]
fn test_literal_route_from_config() {
    let index = routes().resolve("/");
    assert_eq!(index.template(), Some("index"));
    assert_eq!(index.table(), Some("posts"));
    assert_eq!(index.key(), None);
    assert_eq!(index.controllers(), Some("feed"));
}

#[test]
fn test_pattern_routes_merge_from_config() {
    let post = routes().resolve("/post/17");
    assert_eq!(post.template(), Some("post"));
    assert_eq!(post.table(), Some("posts"));
    assert_eq!(post.key(), Some("17"));
    assert_eq!(post.controllers(), Some("comments"));
}

#[test]
fn test_partial_pattern_match_only_merges_matching_routes() {
    let listing = routes().resolve("/post/latest");
    assert_eq!(listing.template(), None);
    assert_eq!(listing.controllers(), Some("comments"));
}

#[test]
fn test_invalid_pattern_in_config_fails_to_build() {
    let entries: Vec<RouteEntry> =
        serde_json::from_str(r#"[{ "path": "^(", "template": "x" }]"#).unwrap();
    assert!(RouteTable::from_entries(entries).is_err());
}
