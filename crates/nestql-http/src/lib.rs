//! HTTP middleware for the nestql query language.
//!
//! Parses a `query` request parameter ahead of the handler and attaches the
//! compiled Query-DSL document to request extensions. Parse failures are not
//! HTTP errors: the handler observes a null marker and decides for itself.
//!
//! # Example
//!
//! ```
//! use axum::{Router, middleware::from_fn, routing::get};
//! use nestql_http::{ParsedQuery, query_parser_middleware};
//!
//! async fn handler(ParsedQuery(parsed): ParsedQuery) -> String {
//!     format!("{parsed:?}")
//! }
//!
//! let app: Router = Router::new()
//!     .route("/search", get(handler))
//!     .layer(from_fn(query_parser_middleware));
//! ```

#![warn(missing_docs)]

use std::{collections::HashMap, convert::Infallible};

use axum::{
    extract::{FromRequestParts, Query, Request, State},
    http::{Uri, request::Parts},
    middleware::Next,
    response::Response,
};
use serde_json::Value;

/// Default name of the request parameter carrying the query expression.
pub const DEFAULT_QUERY_PARAM: &str = "query";

/// The compiled query attached to a request.
///
/// `None` means the parameter was absent, empty, or failed to parse. As an
/// extractor this defaults to `None` when the middleware is not installed,
/// so handlers never reject.
#[derive(Debug, Clone, Default)]
pub struct ParsedQuery(pub Option<Value>);

impl<S> FromRequestParts<S> for ParsedQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_default())
    }
}

/// Name of the request parameter to read, used as middleware state.
#[derive(Debug, Clone)]
pub struct QueryParam(pub String);

impl Default for QueryParam {
    fn default() -> Self {
        Self(DEFAULT_QUERY_PARAM.to_string())
    }
}

/// Middleware reading the default `query` parameter.
///
/// Install with `axum::middleware::from_fn(query_parser_middleware)`.
pub async fn query_parser_middleware(mut request: Request, next: Next) -> Response {
    attach(DEFAULT_QUERY_PARAM, &mut request);
    next.run(request).await
}

/// Middleware reading a custom parameter name.
///
/// Install with
/// `axum::middleware::from_fn_with_state(QueryParam("q".into()), query_parser_middleware_with_param)`.
pub async fn query_parser_middleware_with_param(
    State(QueryParam(param)): State<QueryParam>,
    mut request: Request,
    next: Next,
) -> Response {
    attach(&param, &mut request);
    next.run(request).await
}

/// Compiles the named parameter and attaches the outcome to the request.
///
/// Absent or empty parameters attach nothing; the extractor's default covers
/// that case.
fn attach(param: &str, request: &mut Request) {
    let Some(expression) = query_param(request.uri(), param) else {
        return;
    };
    if expression.is_empty() {
        return;
    }

    let parsed = match nestql_query::parse(&expression) {
        Ok(document) => ParsedQuery(Some(document)),
        Err(err) => {
            tracing::debug!(%err, "query parameter failed to parse");
            ParsedQuery(None)
        }
    };
    request.extensions_mut().insert(parsed);
}

/// Reads one query parameter from a request URI.
fn query_param(uri: &Uri, name: &str) -> Option<String> {
    let Query(mut params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
    params.remove(name)
}
