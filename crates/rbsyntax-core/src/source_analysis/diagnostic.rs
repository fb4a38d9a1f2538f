// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Non-fatal diagnostics.
//!
//! Warnings are collected on the [`ParserContext`](super::ParserContext)
//! while lexing and parsing and returned alongside the result. They never
//! change whether a parse succeeds.

use std::fmt;

use ecow::EcoString;

use super::Span;

/// The category of a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// A `+`, `-`, `*`, `&`, `**`, `/` or `::` read as a prefix operator
    /// after a command name (`foo -1`).
    AmbiguousOperator,
    /// A local variable assigned but never read.
    UnusedVariable,
    /// A hash literal or hash pattern repeats a literal key.
    DuplicateKey,
    /// A `when` or `in` clause repeats a literal.
    DuplicateWhen,
    /// A closing `end` is not aligned with its opening keyword.
    IndentMismatch,
    /// Parentheses around a single argument with a space before them.
    RedundantParens,
    /// A block parameter shadows an outer local variable.
    ShadowingOuterLocal,
    /// A bare carriage return outside a literal.
    CarriageReturn,
    /// A magic comment was misplaced or had an invalid value.
    MagicComment,
    /// A literal assigned inside a condition (`if x = 1`).
    AssignmentInCondition,
    /// A range operator at the end of a line.
    EndOfLineRange,
    /// A float literal too large to represent.
    FloatOutOfRange,
}

impl DiagnosticCategory {
    /// Returns a short kebab-case name for the category.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AmbiguousOperator => "ambiguous-operator",
            Self::UnusedVariable => "unused-variable",
            Self::DuplicateKey => "duplicate-key",
            Self::DuplicateWhen => "duplicate-when",
            Self::IndentMismatch => "indent-mismatch",
            Self::RedundantParens => "redundant-parens",
            Self::ShadowingOuterLocal => "shadowing-outer-local",
            Self::CarriageReturn => "carriage-return",
            Self::MagicComment => "magic-comment",
            Self::AssignmentInCondition => "assignment-in-condition",
            Self::EndOfLineRange => "end-of-line-range",
            Self::FloatOutOfRange => "float-out-of-range",
        }
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// An error that fails the parse.
    Error,
    /// A warning attached to the result.
    Warning,
}

/// A diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: Severity,
    /// The message.
    pub message: EcoString,
    /// The source location.
    pub span: Span,
    /// Optional hint for how to fix the issue.
    pub hint: Option<EcoString>,
    /// The warning category, if any.
    pub category: Option<DiagnosticCategory>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    #[must_use]
    pub fn error(message: impl Into<EcoString>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span,
            hint: None,
            category: None,
        }
    }

    /// Creates a new warning diagnostic.
    #[must_use]
    pub fn warning(message: impl Into<EcoString>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            span,
            hint: None,
            category: None,
        }
    }

    /// Attaches a category.
    #[must_use]
    pub fn with_category(mut self, category: DiagnosticCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Attaches a hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<EcoString>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {level}: {}", self.span.start_location(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::Location;

    #[test]
    fn builder_sets_category_and_hint() {
        let diag = Diagnostic::warning("unused", Span::default())
            .with_category(DiagnosticCategory::UnusedVariable)
            .with_hint("prefix with _");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.category, Some(DiagnosticCategory::UnusedVariable));
        assert_eq!(diag.hint.as_deref(), Some("prefix with _"));
    }

    #[test]
    fn display_includes_location() {
        let at = Location::new(4, 2, 3);
        let diag = Diagnostic::warning("ambiguous first argument", Span::point(at));
        assert_eq!(diag.to_string(), "2:3: warning: ambiguous first argument");
    }
}
