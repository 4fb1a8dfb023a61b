//! Query tokenizer.
//!
//! Converts a query string into a stream of tokens for the parser. Values
//! may contain any character except whitespace and the structural set
//! `( ) [ ] { } : > +`; a word immediately followed by `:` becomes a field
//! prefix, and the reserved words `AND`, `OR`, `NOT` and a standalone `~`
//! become operator tokens.

use std::{iter::Peekable, str::Chars};

use crate::error::LexError;

/// A token in the query language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// A bare word: keyword, value, or range bound.
    Word(String),

    /// A field name immediately followed by `:` (the colon is consumed).
    FieldPrefix(String),

    /// A leading `@key=value` directive.
    Directive(String, String),

    /// The `AND` operator.
    And,

    /// The `OR` operator.
    Or,

    /// The `NOT` operator.
    Not,

    /// The `~` operator (nested-context conjunction).
    Tilde,

    /// `>`, separating a nested path from its target.
    Gt,

    /// A colon that does not terminate a field name.
    Colon,

    /// Left parenthesis.
    LParen,

    /// Right parenthesis.
    RParen,

    /// `[`, opening an inclusive range.
    LBracket,

    /// `]`, closing an inclusive range.
    RBracket,

    /// `{`, opening an exclusive range.
    LBrace,

    /// `}`, closing an exclusive range.
    RBrace,
}

/// Tokenizes a query string.
struct Lexer<'a> {
    /// Character iterator with one-character lookahead.
    chars: Peekable<Chars<'a>>,
    /// Current byte position in the input.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    /// Tokenizes the entire input, returning all tokens or an error.
    fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        Ok(tokens)
    }

    /// Returns the next token, or None at end of input.
    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_whitespace();

        let Some(&ch) = self.chars.peek() else {
            return Ok(None);
        };

        let token = match ch {
            '(' => self.single(Token::LParen),
            ')' => self.single(Token::RParen),
            '[' => self.single(Token::LBracket),
            ']' => self.single(Token::RBracket),
            '{' => self.single(Token::LBrace),
            '}' => self.single(Token::RBrace),
            '>' => self.single(Token::Gt),
            ':' => self.single(Token::Colon),
            '+' => {
                return Err(LexError::new(
                    "the '+' operator is not supported; use '~' inside nested queries",
                    self.position,
                ));
            }
            '@' => self.read_directive_or_word(),
            _ => self.read_word(),
        };

        Ok(Some(token))
    }

    /// Consumes one character and returns the given token.
    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    /// Reads a word, emitting a field prefix if it ends in `:`.
    fn read_word(&mut self) -> Token {
        let mut word = String::new();

        while let Some(&ch) = self.chars.peek() {
            if is_boundary(ch) {
                break;
            }
            if ch == ':' {
                self.advance();
                return Token::FieldPrefix(word);
            }
            word.push(ch);
            self.advance();
        }

        classify(word)
    }

    /// Reads a token starting with `@`.
    ///
    /// A well-formed `@key=value` run becomes a directive; anything else is
    /// an ordinary word.
    fn read_directive_or_word(&mut self) -> Token {
        let mut text = String::new();

        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                break;
            }
            text.push(ch);
            self.advance();
        }

        match split_directive(&text) {
            Some((key, value)) => Token::Directive(key, value),
            None => Token::Word(text),
        }
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Advances to the next character.
    fn advance(&mut self) {
        if let Some(ch) = self.chars.next() {
            self.position += ch.len_utf8();
        }
    }
}

/// Returns true for characters that terminate a word.
///
/// `:` is handled separately because it consumes into a field prefix.
fn is_boundary(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')' | '[' | ']' | '{' | '}' | '>' | '+')
}

/// Maps reserved words and the standalone tilde to operator tokens.
fn classify(word: String) -> Token {
    match word.as_str() {
        "AND" => Token::And,
        "OR" => Token::Or,
        "NOT" => Token::Not,
        "~" => Token::Tilde,
        _ => Token::Word(word),
    }
}

/// Splits a `@key=value` run into its parts, validating the key.
///
/// Keys match `[A-Za-z_][A-Za-z0-9_.]+`: at least two characters, the same
/// shape as a field name.
fn split_directive(text: &str) -> Option<(String, String)> {
    let rest = text.strip_prefix('@')?;
    let (key, value) = rest.split_once('=')?;
    if value.is_empty() {
        return None;
    }

    let mut chars = key.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    let tail = chars.as_str();
    if tail.is_empty() {
        return None;
    }
    if !tail
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '.')
    {
        return None;
    }

    Some((key.to_string(), value.to_string()))
}

/// Tokenizes a query string.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(input).tokenize()
}
