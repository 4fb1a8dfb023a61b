//! AST normaliser.
//!
//! Rewrites the raw parse tree into the typed [`Expr`] AST, outside-in:
//! degenerate `{left, rest: []}` wrappers disappear, operator chains fold
//! left-associatively into binary nodes, keyword runs collapse to a single
//! space-joined string, and nested/grouped/range shapes recurse. Shapes the
//! rewriter does not recognise become [`Expr::Opaque`] so the lowerer can
//! stay permissive about them.

use std::collections::BTreeMap;

use crate::{
    ast::{BinOp, Expr, RangeBounds},
    raw::RawNode,
};

/// Normalises a raw parse tree into the typed AST.
///
/// Total: every raw tree maps to some expression, falling back to
/// [`Expr::Opaque`] rather than failing.
pub fn normalise(raw: RawNode) -> Expr {
    match raw {
        RawNode::Str(text) => Expr::Keyword(text),
        RawNode::Seq(items) => normalise_seq(items),
        RawNode::Map(entries) => normalise_map(entries),
    }
}

/// Normalises a sequence node.
fn normalise_seq(items: Vec<RawNode>) -> Expr {
    match items.as_slice() {
        [RawNode::Str(field), RawNode::Str(sep), RawNode::Str(value)] if sep == ":" => {
            return Expr::Match {
                field: field.clone(),
                value: value.clone(),
            };
        }

        [RawNode::Str(marker), operand] if marker == "NOT" => {
            return Expr::Not(Box::new(normalise(operand.clone())));
        }

        [RawNode::Str(path), RawNode::Str(sep), target] if sep == ">" => {
            return Expr::Nested {
                path: path.clone(),
                query: Box::new(normalise(target.clone())),
            };
        }

        [left, RawNode::Str(op), right] => {
            if let Some(op) = BinOp::from_token(op) {
                return Expr::Binop {
                    op,
                    left: Box::new(normalise(left.clone())),
                    right: Box::new(normalise(right.clone())),
                };
            }
        }

        _ => {}
    }

    if !items.is_empty() && items.iter().all(|item| item.as_str().is_some()) {
        let words: Vec<&str> = items.iter().filter_map(RawNode::as_str).collect();
        return Expr::Keyword(words.join(" "));
    }

    Expr::Opaque(RawNode::Seq(items))
}

/// Normalises a mapping node by its key signature.
fn normalise_map(mut entries: BTreeMap<String, RawNode>) -> Expr {
    let keys: Vec<String> = entries.keys().cloned().collect();
    let keys: Vec<&str> = keys.iter().map(String::as_str).collect();

    match keys.as_slice() {
        ["left"] => {
            let Some(left) = entries.remove("left") else {
                return Expr::Opaque(RawNode::Map(entries));
            };
            normalise(left)
        }

        ["left", "rest"] => fold_chain(entries),

        ["first", "rest"] => join_keywords(entries),

        ["path", "query"] => {
            let (Some(path), Some(query)) = (entries.remove("path"), entries.remove("query"))
            else {
                return Expr::Opaque(RawNode::Map(entries));
            };
            match path.as_str() {
                Some(path) => Expr::Nested {
                    path: path.to_string(),
                    query: Box::new(normalise(query)),
                },
                None => {
                    entries.insert("path".to_string(), path);
                    entries.insert("query".to_string(), query);
                    Expr::Opaque(RawNode::Map(entries))
                }
            }
        }

        ["field", "group"] => {
            let (Some(field), Some(group)) = (entries.remove("field"), entries.remove("group"))
            else {
                return Expr::Opaque(RawNode::Map(entries));
            };
            match field.as_str() {
                Some(field) => Expr::Grouped {
                    field: field.to_string(),
                    group: Box::new(normalise(group)),
                },
                None => {
                    entries.insert("field".to_string(), field);
                    entries.insert("group".to_string(), group);
                    Expr::Opaque(RawNode::Map(entries))
                }
            }
        }

        ["field", "range"] => normalise_range(entries),

        _ => Expr::Opaque(RawNode::Map(entries)),
    }
}

/// Left-folds a `{left, rest}` operator chain into binary nodes.
///
/// An empty `rest` is the degenerate wrapper and unwraps to `left`.
fn fold_chain(mut entries: BTreeMap<String, RawNode>) -> Expr {
    let original = entries.clone();

    let (Some(left), Some(RawNode::Seq(rest))) = (entries.remove("left"), entries.remove("rest"))
    else {
        return Expr::Opaque(RawNode::Map(original));
    };

    let mut acc = normalise(left);
    for item in rest {
        let RawNode::Seq(pair) = item else {
            return Expr::Opaque(RawNode::Map(original));
        };
        let [op, operand]: [RawNode; 2] = match pair.try_into() {
            Ok(pair) => pair,
            Err(_) => return Expr::Opaque(RawNode::Map(original)),
        };
        let Some(op) = op.as_str().and_then(BinOp::from_token) else {
            return Expr::Opaque(RawNode::Map(original));
        };
        acc = Expr::Binop {
            op,
            left: Box::new(acc),
            right: Box::new(normalise(operand)),
        };
    }

    acc
}

/// Collapses a `{first, rest}` keyword run to one space-joined keyword.
fn join_keywords(mut entries: BTreeMap<String, RawNode>) -> Expr {
    let original = entries.clone();

    let (Some(first), Some(RawNode::Seq(rest))) = (entries.remove("first"), entries.remove("rest"))
    else {
        return Expr::Opaque(RawNode::Map(original));
    };

    let mut words = Vec::with_capacity(rest.len() + 1);
    match first.as_str() {
        Some(word) => words.push(word.to_string()),
        None => return Expr::Opaque(RawNode::Map(original)),
    }
    for item in &rest {
        match item.as_str() {
            Some(word) => words.push(word.to_string()),
            None => return Expr::Opaque(RawNode::Map(original)),
        }
    }

    Expr::Keyword(words.join(" "))
}

/// Normalises a `{field, range}` mapping, carrying the bounds verbatim.
fn normalise_range(entries: BTreeMap<String, RawNode>) -> Expr {
    let parsed = (|| {
        let field = entries.get("field")?.as_str()?.to_string();
        let RawNode::Map(body) = entries.get("range")? else {
            return None;
        };

        let mut bounds = RangeBounds::default();
        for (key, value) in body {
            let text = value.as_str()?.to_string();
            match key.as_str() {
                "gte" => bounds.gte = Some(text),
                "lte" => bounds.lte = Some(text),
                "gt" => bounds.gt = Some(text),
                "lt" => bounds.lt = Some(text),
                _ => return None,
            }
        }
        if bounds.is_empty() {
            return None;
        }

        Some(Expr::Range { field, bounds })
    })();

    parsed.unwrap_or(Expr::Opaque(RawNode::Map(entries)))
}

#[cfg(test)]
mod tests {
    use crate::raw::map_node;

    use super::*;

    /// Shorthand for a string node.
    fn s(text: &str) -> RawNode {
        RawNode::str(text)
    }

    /// Shorthand for a keyword expression.
    fn kw(text: &str) -> Expr {
        Expr::Keyword(text.into())
    }

    #[test]
    fn string_becomes_keyword() {
        assert_eq!(normalise(s("hello")), kw("hello"));
    }

    #[test]
    fn match_triple() {
        assert_eq!(
            normalise(RawNode::Seq(vec![s("field"), s(":"), s("value")])),
            Expr::Match {
                field: "field".into(),
                value: "value".into()
            }
        );
    }

    #[test]
    fn not_sequence() {
        assert_eq!(
            normalise(RawNode::Seq(vec![s("NOT"), s("x")])),
            Expr::Not(Box::new(kw("x")))
        );
    }

    #[test]
    fn nested_triple_sequence() {
        let node = RawNode::Seq(vec![
            s("authors"),
            s(">"),
            RawNode::Seq(vec![s("surname"), s(":"), s("X")]),
        ]);
        assert_eq!(
            normalise(node),
            Expr::Nested {
                path: "authors".into(),
                query: Box::new(Expr::Match {
                    field: "surname".into(),
                    value: "X".into()
                }),
            }
        );
    }

    #[test]
    fn all_string_sequence_joins() {
        assert_eq!(
            normalise(RawNode::Seq(vec![s("hello"), s("brave"), s("world")])),
            kw("hello brave world")
        );
    }

    #[test]
    fn left_only_wrapper_unwraps() {
        assert_eq!(normalise(map_node([("left", s("x"))])), kw("x"));
    }

    #[test]
    fn empty_rest_wrapper_unwraps() {
        let node = map_node([("left", s("x")), ("rest", RawNode::Seq(vec![]))]);
        assert_eq!(normalise(node), kw("x"));
    }

    #[test]
    fn nested_empty_wrappers_unwrap_recursively() {
        let node = map_node([
            (
                "left",
                map_node([("left", s("x")), ("rest", RawNode::Seq(vec![]))]),
            ),
            ("rest", RawNode::Seq(vec![])),
        ]);
        assert_eq!(normalise(node), kw("x"));
    }

    #[test]
    fn chain_folds_left_associatively() {
        let node = map_node([
            ("left", s("a")),
            (
                "rest",
                RawNode::Seq(vec![
                    RawNode::Seq(vec![s("OR"), s("b")]),
                    RawNode::Seq(vec![s("OR"), s("c")]),
                ]),
            ),
        ]);
        assert_eq!(
            normalise(node),
            Expr::Binop {
                op: BinOp::Or,
                left: Box::new(Expr::Binop {
                    op: BinOp::Or,
                    left: Box::new(kw("a")),
                    right: Box::new(kw("b")),
                }),
                right: Box::new(kw("c")),
            }
        );
    }

    #[test]
    fn keyword_run_joins_with_single_spaces() {
        let node = map_node([
            ("first", s("hello")),
            ("rest", RawNode::Seq(vec![s("brave"), s("world")])),
        ]);
        assert_eq!(normalise(node), kw("hello brave world"));
    }

    #[test]
    fn singleton_keyword_run_collapses() {
        let node = map_node([("first", s("hello")), ("rest", RawNode::Seq(vec![]))]);
        assert_eq!(normalise(node), kw("hello"));
    }

    #[test]
    fn nested_map_recurses_into_query() {
        let node = map_node([
            ("path", s("authors")),
            (
                "query",
                map_node([("left", RawNode::Seq(vec![s("a"), s(":"), s("b")]))]),
            ),
        ]);
        assert_eq!(
            normalise(node),
            Expr::Nested {
                path: "authors".into(),
                query: Box::new(Expr::Match {
                    field: "a".into(),
                    value: "b".into()
                }),
            }
        );
    }

    #[test]
    fn grouped_map_recurses_into_group() {
        let node = map_node([("field", s("texttype")), ("group", s("dikt"))]);
        assert_eq!(
            normalise(node),
            Expr::Grouped {
                field: "texttype".into(),
                group: Box::new(kw("dikt")),
            }
        );
    }

    #[test]
    fn range_map_carries_bounds_verbatim() {
        let node = map_node([
            ("field", s("date")),
            ("range", map_node([("gte", s("2022-01-13")), ("lte", s("now"))])),
        ]);
        assert_eq!(
            normalise(node),
            Expr::Range {
                field: "date".into(),
                bounds: RangeBounds::inclusive("2022-01-13", "now"),
            }
        );
    }

    #[test]
    fn unknown_map_shape_is_opaque() {
        let node = map_node([("mystery", s("x"))]);
        assert_eq!(normalise(node.clone()), Expr::Opaque(node));
    }

    #[test]
    fn range_with_unknown_bound_key_is_opaque() {
        let node = map_node([
            ("field", s("date")),
            ("range", map_node([("approx", s("now"))])),
        ]);
        assert!(matches!(normalise(node), Expr::Opaque(_)));
    }

    #[test]
    fn chain_with_unknown_operator_is_opaque() {
        let node = map_node([
            ("left", s("a")),
            (
                "rest",
                RawNode::Seq(vec![RawNode::Seq(vec![s("XOR"), s("b")])]),
            ),
        ]);
        assert!(matches!(normalise(node), Expr::Opaque(_)));
    }
}
