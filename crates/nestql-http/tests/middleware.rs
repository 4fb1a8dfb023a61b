//! Router tests for the query-parsing middleware.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use axum::{
    Json, Router,
    body::Body,
    http::{Request, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use nestql_http::{
    ParsedQuery, QueryParam, query_parser_middleware, query_parser_middleware_with_param,
};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Handler echoing the parsed query (or null) back as JSON.
async fn echo(ParsedQuery(parsed): ParsedQuery) -> Json<Value> {
    Json(json!({ "parsed": parsed }))
}

/// Builds a router with the default middleware installed.
fn app() -> Router {
    Router::new()
        .route("/search", get(echo))
        .layer(from_fn(query_parser_middleware))
}

/// Sends a GET and returns the status and JSON response body.
async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn attaches_compiled_document() {
    let (status, body) = get_json(app(), "/search?query=field:value").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"parsed": {"match": {"field": "value"}}}));
}

#[tokio::test]
async fn nested_query_through_the_middleware() {
    let (status, body) = get_json(app(), "/search?query=authors%3Eauthors.show%3Afalse").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"parsed": {"nested": {
            "path": "authors",
            "query": {"match": {"authors.show": "false"}},
        }}})
    );
}

#[tokio::test]
async fn malformed_query_attaches_null_marker() {
    let (status, body) = get_json(app(), "/search?query=%28field%3Avalue").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"parsed": null}));
}

#[tokio::test]
async fn missing_parameter_yields_null() {
    let (status, body) = get_json(app(), "/search").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"parsed": null}));
}

#[tokio::test]
async fn empty_parameter_yields_null() {
    let (_, body) = get_json(app(), "/search?query=").await;
    assert_eq!(body, json!({"parsed": null}));
}

#[tokio::test]
async fn handler_without_middleware_sees_null() {
    let bare = Router::new().route("/search", get(echo));
    let (_, body) = get_json(bare, "/search?query=field:value").await;
    assert_eq!(body, json!({"parsed": null}));
}

#[tokio::test]
async fn custom_parameter_name() {
    let custom = Router::new().route("/search", get(echo)).layer(from_fn_with_state(
        QueryParam("q".into()),
        query_parser_middleware_with_param,
    ));
    let (_, body) = get_json(custom, "/search?q=keyword").await;
    assert_eq!(body, json!({"parsed": {"query_string": {"query": "keyword"}}}));
}

#[tokio::test]
async fn custom_parameter_ignores_the_default_name() {
    let custom = Router::new().route("/search", get(echo)).layer(from_fn_with_state(
        QueryParam("q".into()),
        query_parser_middleware_with_param,
    ));
    let (_, body) = get_json(custom, "/search?query=keyword").await;
    assert_eq!(body, json!({"parsed": null}));
}
