//! Raw parse tree values.
//!
//! The parser produces a loosely shaped tree of strings, sequences, and
//! string-keyed mappings. The normaliser rewrites this into the typed
//! [`Expr`](crate::Expr) AST; anything it does not recognise is carried
//! through so the lowerer can pass it on verbatim.

use std::collections::BTreeMap;

use serde_json::Value;

/// A node in the raw parse tree.
///
/// Mapping keys are production labels: `directives`, `expr`, `left`, `rest`,
/// `first`, `path`, `query`, `field`, `range`, `group`, `gte`, `lte`, `gt`,
/// `lt`, `key`, `value`. Strings carry lexeme text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawNode {
    /// Lexeme text.
    Str(String),
    /// An ordered sequence of nodes.
    Seq(Vec<RawNode>),
    /// A mapping from production labels to nodes.
    Map(BTreeMap<String, RawNode>),
}

impl RawNode {
    /// Creates a string node.
    pub fn str(text: impl Into<String>) -> Self {
        Self::Str(text.into())
    }

    /// Returns the lexeme text if this is a string node.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(text) => Some(text),
            _ => None,
        }
    }

    /// Converts the node into JSON without interpretation.
    ///
    /// Used by the lowerer to pass unrecognised shapes through verbatim.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Str(text) => Value::String(text.clone()),
            Self::Seq(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Builds a map node from label/node pairs.
pub(crate) fn map_node<const N: usize>(entries: [(&str, RawNode); N]) -> RawNode {
    RawNode::Map(
        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    )
}
