//! Semantic lowering.
//!
//! Translates the normalised AST into Query-DSL JSON: matches, boolean
//! composition, nested scopes with automatic path prefixing, ranges,
//! existence checks, grouped-field distribution, and `query_string` clauses
//! carrying directive options.

use serde_json::{Map, Value, json};

use crate::{
    ast::{BinOp, EXISTS_FIELD, Expr},
    directives::Directives,
};

/// Lowers a normalised expression into a Query-DSL document.
///
/// The result is the body a caller places under the top-level `{"query": …}`
/// key. Unrecognised expressions are logged at warning level and passed
/// through verbatim rather than failing.
pub fn lower(expr: &Expr, directives: &Directives) -> Value {
    match expr {
        Expr::Match { field, value } if field == EXISTS_FIELD => {
            obj("exists", obj("field", Value::String(value.clone())))
        }

        Expr::Match { field, value } => obj("match", obj(field, Value::String(value.clone()))),

        Expr::Not(inner) => obj(
            "bool",
            obj("must_not", Value::Array(vec![lower(inner, directives)])),
        ),

        Expr::Nested { path, query } => {
            let inner = prefix_fields(lower(query, directives), path);
            obj("nested", json!({"path": path, "query": inner}))
        }

        Expr::Keyword(text) => query_string(text, directives),

        Expr::Grouped { field, group } => lower(&distribute(field, group), directives),

        Expr::Binop { op, left, right } => {
            let clauses = Value::Array(vec![lower(left, directives), lower(right, directives)]);
            let mut body = Map::new();
            match op {
                BinOp::And | BinOp::Tilde => {
                    body.insert("must".to_string(), clauses);
                }
                BinOp::Or => {
                    body.insert("should".to_string(), clauses);
                    body.insert("minimum_should_match".to_string(), json!(1));
                }
            }
            obj("bool", Value::Object(body))
        }

        Expr::Range { field, bounds } => obj("range", obj(field, bounds.to_json())),

        Expr::Opaque(node) => {
            tracing::warn!(node = ?node, "unrecognised query expression, passing through");
            node.to_json()
        }
    }
}

/// Builds a single-entry JSON object.
fn obj(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

/// Synthesises a `query_string` clause for bare keyword text.
fn query_string(text: &str, directives: &Directives) -> Value {
    let mut body = Map::new();
    body.insert("query".to_string(), Value::String(text.to_string()));
    directives.apply_to(&mut body);
    obj("query_string", Value::Object(body))
}

/// Rewrites every field name inside a nested scope to start with `path.`.
///
/// Descends into `match`, `range`, and `exists` entries and the clause
/// arrays of `bool`; an inner `nested` scope governs itself and is left
/// alone, as are non-clause `bool` keys like `minimum_should_match`.
/// Already-prefixed fields are not prefixed twice.
fn prefix_fields(doc: Value, path: &str) -> Value {
    let Value::Object(entries) = doc else {
        return doc;
    };

    let rewritten = entries
        .into_iter()
        .map(|(key, value)| {
            let value = match key.as_str() {
                "match" | "range" => rekey_fields(value, path),
                "exists" => rewrite_exists(value, path),
                "bool" => rewrite_bool(value, path),
                _ => value,
            };
            (key, value)
        })
        .collect();

    Value::Object(rewritten)
}

/// Prefixes every key of a `match` or `range` body.
fn rekey_fields(body: Value, path: &str) -> Value {
    let Value::Object(entries) = body else {
        return body;
    };

    Value::Object(
        entries
            .into_iter()
            .map(|(field, value)| (prefixed(field, path), value))
            .collect(),
    )
}

/// Prefixes the `field` entry of an `exists` body.
fn rewrite_exists(body: Value, path: &str) -> Value {
    let Value::Object(mut entries) = body else {
        return body;
    };

    if let Some(Value::String(field)) = entries.get("field").cloned() {
        entries.insert("field".to_string(), Value::String(prefixed(field, path)));
    }

    Value::Object(entries)
}

/// Recurses into the clause arrays of a `bool` body.
fn rewrite_bool(body: Value, path: &str) -> Value {
    let Value::Object(entries) = body else {
        return body;
    };

    let rewritten = entries
        .into_iter()
        .map(|(key, value)| {
            let value = match key.as_str() {
                "must" | "should" | "must_not" | "filter" => match value {
                    Value::Array(clauses) => Value::Array(
                        clauses
                            .into_iter()
                            .map(|clause| prefix_fields(clause, path))
                            .collect(),
                    ),
                    other => prefix_fields(other, path),
                },
                _ => value,
            };
            (key, value)
        })
        .collect();

    Value::Object(rewritten)
}

/// Prefixes one field name with `path.` unless it already starts with it.
fn prefixed(field: String, path: &str) -> String {
    let already = field.starts_with(path) && field[path.len()..].starts_with('.');
    if already {
        field
    } else {
        format!("{path}.{field}")
    }
}

/// Rewrites a group body so every scalar leaf becomes a match on `field`.
///
/// Operators are preserved; anything already field-scoped (matches, ranges,
/// nested scopes) is left untouched.
fn distribute(field: &str, group: &Expr) -> Expr {
    match group {
        Expr::Keyword(value) => Expr::Match {
            field: field.to_string(),
            value: value.clone(),
        },
        Expr::Not(inner) => Expr::Not(Box::new(distribute(field, inner))),
        Expr::Binop { op, left, right } => Expr::Binop {
            op: *op,
            left: Box::new(distribute(field, left)),
            right: Box::new(distribute(field, right)),
        },
        other => other.clone(),
    }
}
