// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Ruby syntax front end.
//!
//! This crate turns Ruby source text into a syntax tree:
//! - Lexical analysis (a modal, parser-driven tokenizer)
//! - Parsing (AST construction by recursive descent)
//! - Scope tracking during the parse (locals, numbered and anonymous
//!   parameters, pattern bindings)
//!
//! It stops at the tree. There is no evaluation, compilation or
//! pretty-printing.
//!
//! ```
//! use rbsyntax_core::{ParseOptions, parse};
//! use rbsyntax_core::ast::NodeKind;
//!
//! let output = parse(b"x = 1\nx -1", &ParseOptions::default()).unwrap();
//! // `x` is a local, so `x -1` is a subtraction rather than `x(-1)`.
//! assert!(matches!(&output.program.statements[1].kind, NodeKind::Call { name, .. } if name == "-"));
//! ```

pub mod ast;
pub mod config;
pub mod semantic_analysis;
pub mod source_analysis;

pub use config::ParseOptions;
pub use source_analysis::{ParseError, ParseOutput, parse, parse_reader};

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::ast::{Node, NodeKind, Params, Program};
    pub use crate::config::ParseOptions;
    pub use crate::source_analysis::{
        Diagnostic, DiagnosticCategory, ParseError, ParseOutput, Span, parse, parse_reader,
    };
}
