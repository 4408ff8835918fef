//! SCIM filter language.
//!
//! Turns filter query strings (RFC 7644 §3.4.2.2) into a [`Filter`] AST and
//! back. Parsing is purely syntactic: attribute paths are bound to schemas
//! later, by [`crate::schema::resolver`] and [`crate::predicate::compile`].
//!
//! # Examples
//!
//! ```rust
//! use scim_core::filter::{self, Filter};
//!
//! let filter = filter::parse(r#"userName sw "j" and not (title pr)"#).unwrap();
//! assert!(matches!(filter, Filter::And(..)));
//! assert_eq!(filter.to_string(), r#"userName sw "j" and not (title pr)"#);
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod render;


pub use ast::{AttrPath, CompareOp, Filter, Literal};
pub use lexer::{Keyword, Lexer, Token, TokenKind, tokenize};
pub use parser::{parse, parse_attr_path, parse_tokens, parse_with_config};
