// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexing and parsing of Ruby source text.
//!
//! **DDD Context:** Source Analysis
//!
//! This module contains the source buffer, the lexer and the parser.
//!
//! # Lexical Analysis
//!
//! The [`Lexer`] reads a [`SourceBuffer`] line by line and produces
//! [`Token`]s on demand. Each token carries its source location via
//! [`Span`]. The lexer is modal: the parser tells it which identifiers are
//! local variables and where loop conditions start, through the hooks on
//! [`Lexer`] and the shared [`ParserContext`].
//!
//! ```
//! use rbsyntax_core::source_analysis::{TokenKind, lex};
//!
//! let tokens = lex(b"x + 1").unwrap();
//! assert_eq!(tokens.len(), 3);
//! assert_eq!(*tokens[1].kind(), TokenKind::Plus);
//! ```
//!
//! # Parsing
//!
//! [`parse`] turns source bytes into a [`Program`](crate::ast::Program).
//! Statements and keywords are parsed by recursive descent; operator
//! precedence uses Pratt parsing (see the [`parser`] module for the table).
//!
//! # Error Handling
//!
//! Lexical and grammar errors abort the parse. Semantic errors (duplicate
//! parameters, numbered parameter misuse, dynamic constant assignment and
//! so on) are recorded and the parse continues so that all of them are
//! reported, but the result is still a [`ParseError`].

mod context;
mod diagnostic;
mod encoding;
mod error;
mod escape;
mod keywords;
mod lex_state;
mod lexer;
mod numeric;
pub mod parser;
mod source;
mod span;
mod terminator;
mod token;

#[cfg(test)]
mod lexer_property_tests;

pub use context::ParserContext;
pub use diagnostic::{Diagnostic, DiagnosticCategory, Severity};
pub use encoding::{Encoding, MagicComments, ShareableConstantValue};
pub use error::{
    LexError, LexErrorKind, ParseError, SemanticErrorKind, SyntaxError, SyntaxErrorKind,
};
pub use keywords::Keyword;
pub use lex_state::{BitStack, LexState};
pub use lexer::{Lexer, lex};
pub use numeric::{NumericLiteral, NumericValue, Rational};
pub use parser::{ParseOutput, parse, parse_reader};
pub use source::{BytesSource, Checkpoint, LineSource, ReaderSource, SourceBuffer};
pub use span::{Location, Span};
pub use token::{StringFragment, Token, TokenKind};
