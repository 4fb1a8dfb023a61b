//! Query parser.
//!
//! Parses a token stream into a raw parse tree using recursive descent.
//!
//! # Grammar
//!
//! ```text
//! start        → directive* expr EOF
//! expr         → or_expr
//! or_expr      → and_expr ("OR" and_expr)*
//! and_expr     → tilde_expr ("AND" tilde_expr)*
//! tilde_expr   → not_expr ("~" not_expr)*
//! not_expr     → "NOT" not_expr | primary
//! primary      → "(" expr ")" | nested_query | basic_match | keywords
//! nested_query → FIELD ">" ("(" expr ")" | basic_match)
//! basic_match  → FIELD ":" ("(" expr ")" | range | VALUE)
//! range        → "[" WORD "TO" WORD "]" | "{" WORD "TO" WORD "}"
//! ```
//!
//! # Precedence (lowest to highest)
//!
//! `OR` < `AND` < `~` < `NOT` < primary; all binary operators associate to
//! the left. Operator chains come out as `{left, rest}` mappings and keyword
//! runs as `{first, rest}`; the normaliser folds both into the typed AST.

use std::collections::BTreeMap;

use crate::{
    error::{EXPECTING_ONE_OF, InvalidQuery, ParseError},
    lexer::{Token, tokenize},
    raw::{RawNode, map_node},
};

/// Recursive descent parser over a token stream.
struct Parser {
    /// Token stream to parse.
    tokens: Vec<Token>,
    /// Current position in the token stream.
    position: usize,
}

impl Parser {
    /// Creates a new parser from a token stream.
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parses the whole stream into the root raw-tree mapping.
    ///
    /// The root carries a `directives` entry when leading directives are
    /// present and an `expr` entry unless the input is empty.
    fn parse(mut self) -> Result<RawNode, ParseError> {
        let mut root = BTreeMap::new();

        let directives = self.parse_directives();
        if !directives.is_empty() {
            root.insert("directives".to_string(), RawNode::Seq(directives));
        }

        if self.peek().is_some() {
            let expr = self.parse_or_expr()?;
            match self.peek() {
                None => {}
                Some(Token::Directive(..)) => {
                    return Err(ParseError::new(
                        "directives must appear before the query expression",
                        Some(self.position),
                    ));
                }
                Some(token) => {
                    return Err(ParseError::new(
                        format!("unexpected token after query: {token:?}"),
                        Some(self.position),
                    ));
                }
            }
            root.insert("expr".to_string(), expr);
        }

        Ok(RawNode::Map(root))
    }

    /// Collects leading `@key=value` directives as `{key, value}` mappings.
    fn parse_directives(&mut self) -> Vec<RawNode> {
        let mut directives = Vec::new();

        while let Some(Token::Directive(key, value)) = self.peek() {
            directives.push(map_node([
                ("key", RawNode::str(key.clone())),
                ("value", RawNode::str(value.clone())),
            ]));
            self.advance();
        }

        directives
    }

    /// Parses: or_expr → and_expr ("OR" and_expr)*
    fn parse_or_expr(&mut self) -> Result<RawNode, ParseError> {
        let left = self.parse_and_expr()?;
        let mut rest = Vec::new();

        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            rest.push(operator_pair("OR", self.parse_and_expr()?));
        }

        Ok(chain(left, rest))
    }

    /// Parses: and_expr → tilde_expr ("AND" tilde_expr)*
    fn parse_and_expr(&mut self) -> Result<RawNode, ParseError> {
        let left = self.parse_tilde_expr()?;
        let mut rest = Vec::new();

        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            rest.push(operator_pair("AND", self.parse_tilde_expr()?));
        }

        Ok(chain(left, rest))
    }

    /// Parses: tilde_expr → not_expr ("~" not_expr)*
    fn parse_tilde_expr(&mut self) -> Result<RawNode, ParseError> {
        let left = self.parse_not_expr()?;
        let mut rest = Vec::new();

        while matches!(self.peek(), Some(Token::Tilde)) {
            self.advance();
            rest.push(operator_pair("~", self.parse_not_expr()?));
        }

        Ok(chain(left, rest))
    }

    /// Parses: not_expr → "NOT" not_expr | primary
    fn parse_not_expr(&mut self) -> Result<RawNode, ParseError> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.advance();
            let inner = self.parse_not_expr()?;
            return Ok(RawNode::Seq(vec![RawNode::str("NOT"), inner]));
        }

        self.parse_primary()
    }

    /// Parses a primary expression.
    ///
    /// Parentheses are transparent: the inner expression is returned without
    /// a wrapper node.
    fn parse_primary(&mut self) -> Result<RawNode, ParseError> {
        match self.peek().cloned() {
            Some(Token::LParen) => {
                self.advance();
                let inner = self.parse_or_expr()?;
                self.expect_rparen()?;
                Ok(inner)
            }

            Some(Token::FieldPrefix(field)) => {
                self.advance();
                self.parse_field_suffix(field)
            }

            Some(Token::Word(word)) => {
                self.advance();
                if matches!(self.peek(), Some(Token::Gt)) {
                    self.advance();
                    self.parse_nested_target(word)
                } else {
                    Ok(self.parse_keyword_sequence(word))
                }
            }

            other => Err(self.no_viable_primary(other.as_ref())),
        }
    }

    /// Parses what follows `field:`: a grouped expression, a range, or a
    /// plain value.
    fn parse_field_suffix(&mut self, field: String) -> Result<RawNode, ParseError> {
        match self.peek().cloned() {
            Some(Token::LParen) => {
                self.advance();
                let group = self.parse_or_expr()?;
                self.expect_rparen()?;
                Ok(map_node([
                    ("field", RawNode::Str(field)),
                    ("group", group),
                ]))
            }

            Some(Token::LBracket) => self.parse_range(field, RangeStyle::Inclusive),
            Some(Token::LBrace) => self.parse_range(field, RangeStyle::Exclusive),

            Some(Token::Word(value)) => {
                self.advance();
                Ok(RawNode::Seq(vec![
                    RawNode::Str(field),
                    RawNode::str(":"),
                    RawNode::Str(value),
                ]))
            }

            _ => Err(ParseError::new(
                format!("expected a value after '{field}:'"),
                Some(self.position),
            )),
        }
    }

    /// Parses a `[lower TO upper]` or `{lower TO upper}` range body.
    ///
    /// Bounds are carried verbatim; date math is the engine's concern.
    fn parse_range(&mut self, field: String, style: RangeStyle) -> Result<RawNode, ParseError> {
        self.advance(); // consume the opening bracket

        let lower = self.expect_range_bound()?;
        self.expect_to()?;
        let upper = self.expect_range_bound()?;

        let close = match style {
            RangeStyle::Inclusive => Token::RBracket,
            RangeStyle::Exclusive => Token::RBrace,
        };
        if self.peek() != Some(&close) {
            return Err(ParseError::new(
                format!("expected '{}' to end the range", style.closing()),
                Some(self.position),
            ));
        }
        self.advance();

        let (lower_key, upper_key) = style.bound_keys();
        Ok(map_node([
            ("field", RawNode::Str(field)),
            (
                "range",
                map_node([(lower_key, RawNode::Str(lower)), (upper_key, RawNode::Str(upper))]),
            ),
        ]))
    }

    /// Parses the target of `path>`: a parenthesised expression or a single
    /// field match.
    fn parse_nested_target(&mut self, path: String) -> Result<RawNode, ParseError> {
        let query = match self.peek().cloned() {
            Some(Token::LParen) => {
                self.advance();
                let inner = self.parse_or_expr()?;
                self.expect_rparen()?;
                inner
            }
            Some(Token::FieldPrefix(field)) => {
                self.advance();
                self.parse_field_suffix(field)?
            }
            _ => {
                return Err(ParseError::new(
                    format!("expected '(' or a field match after '{path}>'"),
                    Some(self.position),
                ));
            }
        };

        Ok(map_node([("path", RawNode::Str(path)), ("query", query)]))
    }

    /// Collects a run of bare keywords as `{first, rest}`.
    ///
    /// Operator tokens, field prefixes, and structural tokens end the run;
    /// the reserved words never appear here because the lexer classifies
    /// them as operators.
    fn parse_keyword_sequence(&mut self, first: String) -> RawNode {
        let mut rest = Vec::new();

        while let Some(Token::Word(word)) = self.peek() {
            rest.push(RawNode::str(word.clone()));
            self.advance();
        }

        map_node([("first", RawNode::Str(first)), ("rest", RawNode::Seq(rest))])
    }

    /// Builds the diagnostic for a token that cannot start a primary.
    fn no_viable_primary(&self, token: Option<&Token>) -> ParseError {
        match token {
            None => ParseError::new("unexpected end of query", None),
            Some(token) => ParseError::new(
                format!(
                    "{EXPECTING_ONE_OF}: a field match, a nested query, '(', NOT, or a keyword; got {token:?}"
                ),
                Some(self.position),
            ),
        }
    }

    /// Consumes a closing parenthesis or fails.
    fn expect_rparen(&mut self) -> Result<(), ParseError> {
        if matches!(self.peek(), Some(Token::RParen)) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::new(
                "expected closing parenthesis",
                Some(self.position),
            ))
        }
    }

    /// Consumes a range bound word or fails.
    fn expect_range_bound(&mut self) -> Result<String, ParseError> {
        match self.peek().cloned() {
            Some(Token::Word(word)) => {
                self.advance();
                Ok(word)
            }
            _ => Err(ParseError::new(
                "expected a range bound",
                Some(self.position),
            )),
        }
    }

    /// Consumes the `TO` separator inside a range or fails.
    fn expect_to(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            Some(Token::Word(word)) if word == "TO" => {
                self.advance();
                Ok(())
            }
            _ => Err(ParseError::new(
                "expected TO between range bounds",
                Some(self.position),
            )),
        }
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }
}

/// Bracket style of a range expression.
#[derive(Clone, Copy)]
enum RangeStyle {
    /// `[a TO b]`, lowering to `gte`/`lte`.
    Inclusive,
    /// `{a TO b}`, lowering to `gt`/`lt`.
    Exclusive,
}

impl RangeStyle {
    /// Raw-tree labels for the two bounds.
    fn bound_keys(self) -> (&'static str, &'static str) {
        match self {
            Self::Inclusive => ("gte", "lte"),
            Self::Exclusive => ("gt", "lt"),
        }
    }

    /// The closing bracket character, for diagnostics.
    fn closing(self) -> char {
        match self {
            Self::Inclusive => ']',
            Self::Exclusive => '}',
        }
    }
}

/// Wraps an operator chain level as `{left, rest}`.
fn chain(left: RawNode, rest: Vec<RawNode>) -> RawNode {
    map_node([("left", left), ("rest", RawNode::Seq(rest))])
}

/// Builds one `[operator, operand]` pair of an operator chain.
fn operator_pair(operator: &str, operand: RawNode) -> RawNode {
    RawNode::Seq(vec![RawNode::str(operator), operand])
}

/// Parses a query string into the raw parse tree.
///
/// The returned mapping carries optional `directives` and `expr` entries;
/// both are absent for empty input.
pub fn parse_raw(input: &str) -> Result<RawNode, InvalidQuery> {
    let tokens = tokenize(input)
        .map_err(|err| InvalidQuery::new(input, ParseError::from(err).to_string()))?;
    Parser::new(tokens)
        .parse()
        .map_err(|err| InvalidQuery::new(input, err.to_string()))
}
