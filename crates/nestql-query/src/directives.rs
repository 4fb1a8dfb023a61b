//! Leading `@key=value` directives.
//!
//! Directives tune how bare keywords are lowered to `query_string` clauses.
//! They are collected in order and flattened last-write-wins; only a closed
//! set of keys has any effect, and unrecognised keys are silently ignored.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::raw::RawNode;

/// Directive keys copied verbatim into the `query_string` body.
const PASSTHROUGH_OPTIONS: &[&str] = &[
    "default_field",
    "default_operator",
    "analyzer",
    "quote_analyzer",
    "allow_leading_wildcard",
    "auto_generate_synonyms_phrase_query",
];

/// The flattened directive map of one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    /// Key/value entries; later writes of the same key win.
    entries: BTreeMap<String, String>,
}

impl Directives {
    /// Flattens ordered `(key, value)` pairs; later entries override
    /// earlier ones.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            entries: pairs.into_iter().collect(),
        }
    }

    /// Extracts directives from the parser's raw `directives` sequence.
    pub(crate) fn from_node(node: Option<RawNode>) -> Self {
        let Some(RawNode::Seq(items)) = node else {
            return Self::default();
        };

        let pairs = items.into_iter().filter_map(|item| {
            let RawNode::Map(entry) = item else {
                return None;
            };
            let key = entry.get("key")?.as_str()?.to_string();
            let value = entry.get("value")?.as_str()?.to_string();
            Some((key, value))
        });

        Self::from_pairs(pairs)
    }

    /// Applies the recognised options to a `query_string` body.
    ///
    /// `fields` is split on commas, trimmed, and emitted as a list only when
    /// at least one non-empty name remains.
    pub(crate) fn apply_to(&self, body: &mut Map<String, Value>) {
        for key in PASSTHROUGH_OPTIONS {
            if let Some(value) = self.entries.get(*key) {
                body.insert((*key).to_string(), Value::String(value.clone()));
            }
        }

        if let Some(csv) = self.entries.get("fields") {
            let fields: Vec<Value> = csv
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| Value::String(name.to_string()))
                .collect();
            if !fields.is_empty() {
                body.insert("fields".to_string(), Value::Array(fields));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    /// Applies directives to an empty body and returns it as JSON.
    fn applied(pairs: &[(&str, &str)]) -> Value {
        let directives = Directives::from_pairs(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        let mut body = Map::new();
        directives.apply_to(&mut body);
        Value::Object(body)
    }

    #[test]
    fn passthrough_options_copy_verbatim() {
        assert_eq!(
            applied(&[
                ("default_field", "title"),
                ("default_operator", "AND"),
                ("allow_leading_wildcard", "false"),
            ]),
            json!({
                "default_field": "title",
                "default_operator": "AND",
                "allow_leading_wildcard": "false",
            })
        );
    }

    #[test]
    fn unknown_keys_are_ignored() {
        assert_eq!(applied(&[("boost", "2"), ("frobnicate", "x")]), json!({}));
    }

    #[test]
    fn later_pairs_override_earlier_ones() {
        let directives = Directives::from_pairs([
            ("default_field".to_string(), "title".to_string()),
            ("default_field".to_string(), "body".to_string()),
        ]);
        let mut body = Map::new();
        directives.apply_to(&mut body);
        assert_eq!(body["default_field"], json!("body"));
    }

    #[test]
    fn fields_splits_trims_and_drops_empties() {
        assert_eq!(
            applied(&[("fields", "title, name.last,,body ")]),
            json!({"fields": ["title", "name.last", "body"]})
        );
    }

    #[test]
    fn fields_with_no_usable_names_is_omitted() {
        assert_eq!(applied(&[("fields", " , ,")]), json!({}));
    }

    #[test]
    fn from_node_reads_key_value_maps() {
        let node = RawNode::Seq(vec![crate::raw::map_node([
            ("key", RawNode::str("analyzer")),
            ("value", RawNode::str("standard")),
        ])]);
        let directives = Directives::from_node(Some(node));
        let mut body = Map::new();
        directives.apply_to(&mut body);
        assert_eq!(body["analyzer"], json!("standard"));
    }
}
