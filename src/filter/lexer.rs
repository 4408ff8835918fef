//! Filter tokenizer.
//!
//! [`tokenize`] returns a lazy [`Lexer`] iterator over the tokens of a filter
//! string. Each token is tagged with the character offset it starts at, so the
//! parser can report positions for grammar errors as well.
//!
//! A word starting with `urn:` is a schema-qualified attribute path. The URN
//! run is split at its last colon: the prefix becomes a [`TokenKind::SchemaUri`]
//! and lexing resumes with the attribute name after the colon.

use crate::error::{LexError, LexErrorKind, Position};
use serde_json::Number;
use std::fmt;

/// Operator keywords, matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    And,
    Or,
    Not,
    Pr,
    Eq,
    Ne,
    Co,
    Sw,
    Ew,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Self> {
        let keyword = match word.to_ascii_lowercase().as_str() {
            "and" => Keyword::And,
            "or" => Keyword::Or,
            "not" => Keyword::Not,
            "pr" => Keyword::Pr,
            "eq" => Keyword::Eq,
            "ne" => Keyword::Ne,
            "co" => Keyword::Co,
            "sw" => Keyword::Sw,
            "ew" => Keyword::Ew,
            "gt" => Keyword::Gt,
            "ge" => Keyword::Ge,
            "lt" => Keyword::Lt,
            "le" => Keyword::Le,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::And => "and",
            Keyword::Or => "or",
            Keyword::Not => "not",
            Keyword::Pr => "pr",
            Keyword::Eq => "eq",
            Keyword::Ne => "ne",
            Keyword::Co => "co",
            Keyword::Sw => "sw",
            Keyword::Ew => "ew",
            Keyword::Gt => "gt",
            Keyword::Ge => "ge",
            Keyword::Lt => "lt",
            Keyword::Le => "le",
        }
    }
}

/// Kind and payload of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Attribute or sub-attribute name
    Ident(String),
    /// Schema URI prefix of a qualified attribute path (without the final colon)
    SchemaUri(String),
    Keyword(Keyword),
    String(String),
    Number(Number),
    True,
    False,
    Null,
    Dot,
    LBracket,
    RBracket,
    LParen,
    RParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "identifier '{}'", name),
            TokenKind::SchemaUri(uri) => write!(f, "schema URI '{}'", uri),
            TokenKind::Keyword(keyword) => write!(f, "'{}'", keyword.as_str()),
            TokenKind::String(value) => write!(f, "string \"{}\"", value),
            TokenKind::Number(value) => write!(f, "number {}", value),
            TokenKind::True => write!(f, "'true'"),
            TokenKind::False => write!(f, "'false'"),
            TokenKind::Null => write!(f, "'null'"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
        }
    }
}

/// A lexical unit with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

/// Tokenize a filter string.
///
/// The returned iterator is lazy and owns everything it needs; calling
/// `tokenize` again on the same input starts over. Iteration stops after the
/// first error.
pub fn tokenize(input: &str) -> Lexer {
    Lexer::new(input)
}

/// Lazy token iterator over a filter string.
#[derive(Debug, Clone)]
pub struct Lexer {
    chars: Vec<char>,
    index: usize,
    failed: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            index: 0,
            failed: false,
        }
    }

    /// Position just past the last character: where end-of-input errors point.
    pub fn end_position(&self) -> Position {
        Position(self.chars.len())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.index += 1;
        }
    }

    fn error(&mut self, position: usize, reason: LexErrorKind) -> LexError {
        self.failed = true;
        LexError {
            position: Position(position),
            reason,
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_whitespace();
        let start = self.index;
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let kind = match c {
            '.' => self.punct(TokenKind::Dot),
            '[' => self.punct(TokenKind::LBracket),
            ']' => self.punct(TokenKind::RBracket),
            '(' => self.punct(TokenKind::LParen),
            ')' => self.punct(TokenKind::RParen),
            '"' => self.string()?,
            '-' if self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) => self.number()?,
            c if c.is_ascii_digit() => self.number()?,
            _ if self.starts_urn() => self.schema_uri(),
            c if is_ident_start(c) => self.word(),
            other => return Err(self.error(start, LexErrorKind::UnexpectedCharacter(other))),
        };

        Ok(Some(Token {
            kind,
            position: Position(start),
        }))
    }

    fn punct(&mut self, kind: TokenKind) -> TokenKind {
        self.index += 1;
        kind
    }

    fn string(&mut self) -> Result<TokenKind, LexError> {
        let open = self.index;
        self.index += 1;
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error(open, LexErrorKind::UnterminatedString)),
                Some('"') => {
                    self.index += 1;
                    return Ok(TokenKind::String(value));
                }
                Some('\\') => {
                    let escape_at = self.index;
                    match self.peek_at(1) {
                        Some(escaped @ ('"' | '\\')) => {
                            value.push(escaped);
                            self.index += 2;
                        }
                        Some(other) => {
                            return Err(self.error(escape_at, LexErrorKind::InvalidEscape(other)));
                        }
                        None => return Err(self.error(open, LexErrorKind::UnterminatedString)),
                    }
                }
                Some(other) => {
                    value.push(other);
                    self.index += 1;
                }
            }
        }
    }

    fn number(&mut self) -> Result<TokenKind, LexError> {
        let start = self.index;
        if self.peek() == Some('-') {
            self.index += 1;
        }
        self.digits();

        let mut fractional = false;
        if self.peek() == Some('.') {
            fractional = true;
            self.index += 1;
            if self.digits() == 0 {
                return Err(self.invalid_number(start));
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            fractional = true;
            self.index += 1;
            if matches!(self.peek(), Some('+' | '-')) {
                self.index += 1;
            }
            if self.digits() == 0 {
                return Err(self.invalid_number(start));
            }
        }
        if self.peek().is_some_and(is_ident_continue) {
            return Err(self.invalid_number(start));
        }

        let text: String = self.chars[start..self.index].iter().collect();
        let number = if fractional {
            text.parse::<f64>().ok().and_then(Number::from_f64)
        } else {
            text.parse::<i64>()
                .map(Number::from)
                .ok()
                .or_else(|| text.parse::<u64>().map(Number::from).ok())
                .or_else(|| text.parse::<f64>().ok().and_then(Number::from_f64))
        };
        match number {
            Some(number) => Ok(TokenKind::Number(number)),
            None => Err(self.error(start, LexErrorKind::InvalidNumber(text))),
        }
    }

    fn digits(&mut self) -> usize {
        let start = self.index;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.index += 1;
        }
        self.index - start
    }

    fn invalid_number(&mut self, start: usize) -> LexError {
        while self.peek().is_some_and(|c| is_ident_continue(c) || c == '.') {
            self.index += 1;
        }
        let text: String = self.chars[start..self.index].iter().collect();
        self.error(start, LexErrorKind::InvalidNumber(text))
    }

    fn starts_urn(&self) -> bool {
        let prefix: String = self.chars.iter().skip(self.index).take(4).collect();
        prefix.eq_ignore_ascii_case("urn:")
    }

    fn schema_uri(&mut self) -> TokenKind {
        let start = self.index;
        let mut end = start;
        let mut last_colon = start;
        while let Some(&c) = self.chars.get(end) {
            if !(is_ident_continue(c) || c == '.' || c == ':') {
                break;
            }
            if c == ':' {
                last_colon = end;
            }
            end += 1;
        }
        let uri: String = self.chars[start..last_colon].iter().collect();
        self.index = last_colon + 1;
        TokenKind::SchemaUri(uri)
    }

    fn word(&mut self) -> TokenKind {
        let start = self.index;
        while self.peek().is_some_and(is_ident_continue) {
            self.index += 1;
        }
        let word: String = self.chars[start..self.index].iter().collect();

        match word.to_ascii_lowercase().as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => match Keyword::from_word(&word) {
                Some(keyword) => TokenKind::Keyword(keyword),
                None => TokenKind::Ident(word),
            },
        }
    }
}

impl Iterator for Lexer {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.next_token().transpose()
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '$')
}
