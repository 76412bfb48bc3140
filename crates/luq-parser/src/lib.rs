//! Parsing and AST for Lucene-style search queries.
//!
//! This crate turns a raw query string into a validated expression tree:
//!
//! - **Terms**: `jakarta` - words that should appear
//! - **Phrases**: `"jakarta apache"` - exact sequences
//! - **Fields**: `title:guide` - search a specific field
//! - **Fuzzy/proximity**: `roam~0.8`, `"jakarta apache"~10`
//! - **Ranges**: `mod_date:[20020101 TO 20030101]`, `{Aida TO Carmen}`
//! - **Boosting**: `jakarta^4` - adjust term importance
//! - **Boolean composition**: `AND`, `OR`, `NOT`, `+required`,
//!   `-prohibited`, grouping with parentheses
//!
//! Parsing is pure and deterministic: the caller gets either a complete
//! AST or a single error carrying the byte offset of the failure. No
//! search execution or scoring happens here; the AST is handed to a
//! downstream query executor.
//!
//! # Example
//!
//! ```
//! use luq_parser::{Expr, parse};
//!
//! let expr = parse("title:(dog OR cat)^2 -deprecated").unwrap();
//! assert!(matches!(expr, Expr::Or(..)));
//! ```
//!
//! The implicit join between adjacent terms defaults to OR, as in
//! classical Lucene; configure it with
//! [`ParseOptions::with_default_operator`].

#![warn(missing_docs)]

mod ast;
mod error;
mod lexer;
mod options;
mod parser;

pub use ast::{Bound, Expr, Modifier, RangeSearch, Term, TermBody};
pub use error::{ErrorKind, ParseError};
pub use lexer::{Token, TokenKind, escape, tokenize};
pub use options::{DEFAULT_MAX_NESTING_DEPTH, DefaultOperator, ParseOptions};
pub use parser::{parse, parse_with_options};
