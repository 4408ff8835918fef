//! Recursive-descent filter parser.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! or-expr   := and-expr ("or" and-expr)*
//! and-expr  := not-expr ("and" not-expr)*
//! not-expr  := "not" primary | primary
//! primary   := "(" or-expr ")"
//!            | attr-path "pr"
//!            | attr-path compare-op literal
//!            | attr-path "[" or-expr "]"
//! attr-path := [URI ":"] identifier ("." identifier)?
//! ```
//!
//! `and`/`or` chains are left-associative. Whether a value filter targets a
//! multi-valued complex attribute is a schema question left to the resolver.

use super::ast::{AttrPath, CompareOp, Filter, Literal};
use super::lexer::{Keyword, Lexer, Token, TokenKind};
use crate::config::FilterConfig;
use crate::error::{FilterResult, ParseError, Position};

/// Parse a filter string with default limits.
pub fn parse(input: &str) -> FilterResult<Filter> {
    parse_with_config(input, &FilterConfig::default())
}

/// Parse a filter string, enforcing the configured length and depth limits.
pub fn parse_with_config(input: &str, config: &FilterConfig) -> FilterResult<Filter> {
    let length = input.chars().count();
    if length > config.max_length {
        return Err(ParseError {
            position: Position(config.max_length),
            expected: format!("filter of at most {} characters", config.max_length),
            found: format!("{} characters", length),
        }
        .into());
    }

    let lexer = Lexer::new(input);
    let end = lexer.end_position();
    let tokens = lexer.collect::<Result<Vec<_>, _>>()?;
    Ok(parse_tokens(tokens, end, config)?)
}

/// Parse an already tokenized filter.
///
/// `end` is the position reported when input runs out.
pub fn parse_tokens(
    tokens: Vec<Token>,
    end: Position,
    config: &FilterConfig,
) -> Result<Filter, ParseError> {
    let mut parser = Parser::new(tokens, end, config.max_depth);
    let filter = parser.parse_or_expr()?;
    parser.expect_end("'and', 'or' or end of input")?;
    Ok(filter)
}

/// Parse a standalone attribute path such as `name.givenName`.
pub fn parse_attr_path(input: &str) -> FilterResult<AttrPath> {
    let lexer = Lexer::new(input);
    let end = lexer.end_position();
    let tokens = lexer.collect::<Result<Vec<_>, _>>()?;

    let mut parser = Parser::new(tokens, end, 0);
    let path = parser.parse_attr_path()?;
    parser.expect_end("end of attribute path")?;
    Ok(path)
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
    end: Position,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>, end: Position, max_depth: usize) -> Self {
        Self {
            tokens,
            index: 0,
            end,
            depth: 0,
            max_depth,
        }
    }

    fn parse_or_expr(&mut self) -> Result<Filter, ParseError> {
        let mut left = self.parse_and_expr()?;
        while self.eat_keyword(Keyword::Or) {
            let right = self.parse_and_expr()?;
            left = Filter::or(left, right);
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Filter, ParseError> {
        let mut left = self.parse_not_expr()?;
        while self.eat_keyword(Keyword::And) {
            let right = self.parse_not_expr()?;
            left = Filter::and(left, right);
        }
        Ok(left)
    }

    fn parse_not_expr(&mut self) -> Result<Filter, ParseError> {
        if self.eat_keyword(Keyword::Not) {
            self.enter()?;
            let inner = self.parse_primary()?;
            self.leave();
            return Ok(Filter::not(inner));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Filter, ParseError> {
        if self.eat(&TokenKind::LParen) {
            self.enter()?;
            let inner = self.parse_or_expr()?;
            self.expect(&TokenKind::RParen)?;
            self.leave();
            return Ok(Filter::paren(inner));
        }

        let path = self.parse_attr_path()?;

        if self.eat_keyword(Keyword::Pr) {
            return Ok(Filter::Presence(path));
        }

        if self.eat(&TokenKind::LBracket) {
            self.enter()?;
            let inner = self.parse_or_expr()?;
            self.expect(&TokenKind::RBracket)?;
            self.leave();
            return Ok(Filter::value_path(path, inner));
        }

        let op = self.parse_compare_op()?;
        let value = self.parse_literal()?;
        Ok(Filter::Compare(path, op, value))
    }

    fn parse_attr_path(&mut self) -> Result<AttrPath, ParseError> {
        let uri = match self.current_kind() {
            Some(TokenKind::SchemaUri(uri)) => {
                let uri = uri.clone();
                self.advance();
                Some(uri)
            }
            _ => None,
        };

        let expected = if uri.is_some() {
            "attribute name after schema URI"
        } else {
            "attribute path or '('"
        };
        let name = self.expect_ident(expected)?;

        let sub_attribute = if self.eat(&TokenKind::Dot) {
            Some(self.expect_ident("sub-attribute name")?)
        } else {
            None
        };

        Ok(AttrPath {
            uri,
            name,
            sub_attribute,
        })
    }

    fn parse_compare_op(&mut self) -> Result<CompareOp, ParseError> {
        let op = match self.current_kind() {
            Some(TokenKind::Keyword(keyword)) => match keyword {
                Keyword::Eq => Some(CompareOp::Eq),
                Keyword::Ne => Some(CompareOp::Ne),
                Keyword::Co => Some(CompareOp::Co),
                Keyword::Sw => Some(CompareOp::Sw),
                Keyword::Ew => Some(CompareOp::Ew),
                Keyword::Gt => Some(CompareOp::Gt),
                Keyword::Ge => Some(CompareOp::Ge),
                Keyword::Lt => Some(CompareOp::Lt),
                Keyword::Le => Some(CompareOp::Le),
                _ => None,
            },
            _ => None,
        };

        match op {
            Some(op) => {
                self.advance();
                Ok(op)
            }
            None => Err(self.error("'pr', '[' or comparison operator")),
        }
    }

    fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        let literal = match self.current_kind() {
            Some(TokenKind::String(value)) => Literal::String(value.clone()),
            Some(TokenKind::Number(value)) => Literal::Number(value.clone()),
            Some(TokenKind::True) => Literal::Bool(true),
            Some(TokenKind::False) => Literal::Bool(false),
            Some(TokenKind::Null) => Literal::Null,
            _ => return Err(self.error("literal value")),
        };
        self.advance();
        Ok(literal)
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn current_kind(&self) -> Option<&TokenKind> {
        self.current().map(|token| &token.kind)
    }

    fn advance(&mut self) {
        self.index += 1;
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.current_kind() == Some(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        self.eat(&TokenKind::Keyword(keyword))
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error(&kind.to_string()))
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<String, ParseError> {
        match self.current_kind() {
            Some(TokenKind::Ident(name)) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error(expected)),
        }
    }

    fn expect_end(&self, expected: &str) -> Result<(), ParseError> {
        match self.current() {
            None => Ok(()),
            Some(_) => Err(self.error(expected)),
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError {
                position: self.position(),
                expected: format!("nesting depth of at most {}", self.max_depth),
                found: "deeper nesting".to_string(),
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn position(&self) -> Position {
        self.current().map_or(self.end, |token| token.position)
    }

    fn error(&self, expected: &str) -> ParseError {
        let found = match self.current() {
            Some(token) => token.kind.to_string(),
            None => "end of input".to_string(),
        };
        ParseError {
            position: self.position(),
            expected: expected.to_string(),
            found,
        }
    }
}
