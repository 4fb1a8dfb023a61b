//! Query language compiler for the Elasticsearch/OpenSearch Query DSL.
//!
//! This crate parses a compact, human-writable search expression and emits
//! the semantically equivalent Query-DSL JSON:
//!
//! - **Keywords**: `strindberg` - bare terms, lowered to `query_string`
//! - **Matches**: `field:value` - field-scoped equality
//! - **Boolean composition**: `AND`, `OR`, `NOT` with conventional
//!   precedence, plus `~` (the nested-context conjunction, equivalent to
//!   `AND`) and `( … )` grouping
//! - **Nested scopes**: `authors>(surname:X ~ NOT type:editor)` - every
//!   inner field is automatically prefixed with the nested path
//! - **Ranges**: `date:[2022-01-13 TO now]` (inclusive) or
//!   `count:{1 TO 10}` (exclusive)
//! - **Existence**: `_exists_:price`
//! - **Grouped values**: `texttype:(a OR b)` distributes the field over the
//!   group
//! - **Directives**: `@default_field=title hello` tunes how bare keywords
//!   are lowered
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//!
//! let doc = nestql_query::parse("field:value").unwrap();
//! assert_eq!(doc, json!({"match": {"field": "value"}}));
//! ```
//!
//! The returned document is the body a caller places under the top-level
//! `{"query": …}` key when posting to a `_search` endpoint.

#![warn(missing_docs)]

mod ast;
mod directives;
mod error;
mod lexer;
mod lower;
mod normalise;
mod parser;
mod raw;

pub use ast::{BinOp, EXISTS_FIELD, Expr, RangeBounds};
pub use directives::Directives;
pub use error::InvalidQuery;
pub use lower::lower;
pub use normalise::normalise;
pub use parser::parse_raw;
pub use raw::RawNode;

use serde_json::{Map, Value};

/// Compiles a query string into a Query-DSL document.
///
/// Empty (or whitespace-only) input compiles to `{}`. The call is pure and
/// safe to make concurrently from any number of threads.
///
/// # Errors
///
/// Returns [`InvalidQuery`] when the input does not conform to the query
/// grammar.
pub fn parse(input: &str) -> Result<Value, InvalidQuery> {
    let RawNode::Map(mut root) = parse_raw(input)? else {
        return Ok(Value::Object(Map::new()));
    };

    let directives = Directives::from_node(root.remove("directives"));

    Ok(match root.remove("expr") {
        Some(expr) => lower(&normalise(expr), &directives),
        None => Value::Object(Map::new()),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_input_compiles_to_empty_object() {
        assert_eq!(parse("").unwrap(), json!({}));
        assert_eq!(parse("   ").unwrap(), json!({}));
    }

    #[test]
    fn directives_without_expression_compile_to_empty_object() {
        assert_eq!(parse("@default_field=title").unwrap(), json!({}));
    }

    #[test]
    fn pipeline_end_to_end() {
        assert_eq!(
            parse("field:value AND other:thing").unwrap(),
            json!({"bool": {"must": [
                {"match": {"field": "value"}},
                {"match": {"other": "thing"}},
            ]}})
        );
    }
}
