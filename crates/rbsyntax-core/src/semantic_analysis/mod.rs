// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Semantic analysis performed while parsing.
//!
//! This module holds the checks that need more than the grammar:
//! - Local variable scopes, numbered parameters and anonymous parameter
//!   forwarding (via the `scope` module)
//! - Pattern variable binding in `case`/`in`, `=>` and `in` patterns
//!
//! Both run during parsing. Scope answers feed back into the lexer, and
//! every error found is recorded in the
//! [`ParserContext`](crate::source_analysis::ParserContext) instead of
//! stopping the parse.

pub mod pattern_bindings;
pub mod scope;

pub use pattern_bindings::{PatternBinding, extract_pattern_bindings};
pub use scope::{Anonymous, Binding, BindingKind, ClosedScope, ScopeKind, ScopeTracker};
