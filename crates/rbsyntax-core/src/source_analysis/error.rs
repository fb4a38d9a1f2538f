// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Error types for the front end.
//!
//! Lexical and grammar errors are fatal and abort the parse. Semantic errors
//! found while parsing are recorded and parsing continues, but the result is
//! still a failure. All of them end up as [`SyntaxError`]s inside a
//! [`ParseError`], which integrates with [`miette`] for rendering.

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use std::fmt::Write as _;

use ecow::EcoString;
use miette::{Diagnostic as MietteDiagnostic, NamedSource};
use thiserror::Error;

use super::{Diagnostic, Span};

/// A lexical error.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
#[error("{kind}")]
#[diagnostic()]
pub struct LexError {
    /// The kind of lexical error.
    pub kind: LexErrorKind,
    /// The source location of the error.
    #[label("here")]
    pub span: Span,
}

impl LexError {
    /// Creates a new lexical error.
    #[must_use]
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of lexical error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    /// A string, symbol or word list reached end of input.
    #[error("unterminated string meets end of file")]
    UnterminatedString,

    /// A regexp reached end of input.
    #[error("unterminated regexp meets end of file")]
    UnterminatedRegexp,

    /// A heredoc body reached end of input without its terminator.
    #[error("can't find string \"{0}\" anywhere before EOF")]
    UnterminatedHeredoc(EcoString),

    /// A quoted heredoc identifier was not closed on its line.
    #[error("unterminated here document identifier")]
    UnterminatedHeredocIdentifier,

    /// An `=begin` document reached end of input.
    #[error("embedded document meets end of file")]
    UnterminatedEmbeddedDocument,

    /// A backslash escape that cannot be decoded.
    #[error("invalid escape character syntax")]
    InvalidEscape,

    /// A malformed `\u` escape.
    #[error("invalid Unicode escape")]
    InvalidUnicodeEscape,

    /// A `\u` escape outside the Unicode range.
    #[error("invalid Unicode codepoint")]
    InvalidCodepoint,

    /// Several codepoints in a character literal.
    #[error("invalid character literal")]
    InvalidCharacterLiteral,

    /// A bad name after `$`.
    #[error("'{0}' is not allowed as a global variable name")]
    InvalidGlobalVariable(EcoString),

    /// A bad name after `@`.
    #[error("'{0}' is not allowed as an instance variable name")]
    InvalidInstanceVariable(EcoString),

    /// A bad name after `@@`.
    #[error("'{0}' is not allowed as a class variable name")]
    InvalidClassVariable(EcoString),

    /// A character directly following a numeric literal.
    #[error("trailing '{0}' in number")]
    TrailingCharInNumber(char),

    /// A radix prefix with no digits (`0x`).
    #[error("numeric literal without digits")]
    NumericWithoutDigits,

    /// An invalid digit in an octal literal.
    #[error("Invalid octal digit")]
    InvalidOctalDigit,

    /// A fraction or exponent without digits after it.
    #[error("unexpected fraction part after numeric literal")]
    InvalidFraction,

    /// A float written without its leading zero (`.5`).
    #[error("no .<digit> floating literal anymore; put 0 before dot")]
    LeadingDotFloat,

    /// A `%` literal with an unknown type letter.
    #[error("unknown type of %string")]
    UnknownPercentLiteral,

    /// A `%` literal with no delimiter.
    #[error("unterminated quoted string meets end of file")]
    UnterminatedPercentLiteral,

    /// An unknown regexp option letter.
    #[error("unknown regexp option - {0}")]
    UnknownRegexpOption(EcoString),

    /// A byte sequence invalid in the source encoding.
    #[error("invalid multibyte char ({0})")]
    InvalidMultibyteChar(EcoString),

    /// A character that cannot start any token.
    #[error("Invalid char '{0}' in expression")]
    InvalidCharacter(EcoString),

    /// A `# encoding:` comment naming an unknown encoding.
    #[error("unknown encoding name: {0}")]
    UnknownEncoding(EcoString),

    /// Reading the source failed.
    #[error("I/O error reading source: {0}")]
    Io(EcoString),
}

/// Semantic errors detected during parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticErrorKind {
    /// Constant assignment inside a method body.
    #[error("dynamic constant assignment")]
    DynamicConstantAssignment,

    /// Assignment to `self`, `nil`, `true`, `false`, `__FILE__`, `__LINE__`
    /// or `__ENCODING__`.
    #[error("Can't assign to {0}")]
    AssignToKeyword(EcoString),

    /// Assignment to `_1`..`_9` or `it` where it is a parameter.
    #[error("Can't assign to numbered parameter {0}")]
    AssignToNumberedParameter(EcoString),

    /// The same variable bound twice in one pattern.
    #[error("duplicated variable name")]
    DuplicatePatternVariable(EcoString),

    /// The same key twice in one hash pattern.
    #[error("duplicated key name")]
    DuplicatePatternKey(EcoString),

    /// A numbered parameter in a block with an ordinary parameter list.
    #[error("ordinary parameter is defined")]
    OrdinaryParameterDefined,

    /// A numbered parameter in a block nested inside one already using them.
    #[error("numbered parameter is already used in outer block")]
    NumberedParameterInOuterBlock,

    /// A numbered parameter in a block enclosing one already using them.
    #[error("numbered parameter is already used in inner block")]
    NumberedParameterInInnerBlock,

    /// `...`, `*`, `**` or `&` forwarding without a matching parameter.
    #[error("unexpected {0}")]
    UndeclaredForwarding(&'static str),

    /// A parameter name repeated in one list.
    #[error("duplicated argument name")]
    DuplicateArgument(EcoString),

    /// A constant, instance, class or global variable as a parameter.
    #[error("formal argument cannot be {0}")]
    InvalidFormalArgument(&'static str),

    /// `class` inside a method body.
    #[error("class definition in method body")]
    ClassInMethod,

    /// `module` inside a method body.
    #[error("module definition in method body")]
    ModuleInMethod,

    /// `BEGIN` outside the top level.
    #[error("BEGIN is permitted only at toplevel")]
    BeginNotAtTopLevel,

    /// `alias $a $1`.
    #[error("can't make alias for the number variables")]
    AliasNthRef,

    /// Binding a variable inside one branch of an alternative pattern.
    #[error("illegal variable in alternative pattern ({0})")]
    IllegalVariableInAlternative(EcoString),

    /// `^name` where `name` is not a local.
    #[error("{0}: no such local variable")]
    UnknownPinnedLocal(EcoString),

    /// Both `&blk` and a literal block on one call.
    #[error("both block arg and actual block given")]
    BothBlockArgAndBlock,

    /// A `return` or control keyword where a value is required.
    #[error("void value expression")]
    VoidValue,

    /// `def name=(v) = expr`.
    #[error("setter method cannot be defined in an endless method definition")]
    EndlessSetter,
}

/// The kind of a [`SyntaxError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    /// A lexical error.
    #[error(transparent)]
    Lex(#[from] LexErrorKind),

    /// A token the grammar does not accept here.
    #[error("{}", describe_unexpected(.found, .expected))]
    Unexpected {
        /// Description of the token found.
        found: EcoString,
        /// Descriptions of acceptable tokens, possibly empty.
        expected: Vec<&'static str>,
    },

    /// The nesting limit was exceeded.
    #[error("nesting too deep (limit {limit})")]
    NestingTooDeep {
        /// The configured limit.
        limit: usize,
    },

    /// A semantic error.
    #[error(transparent)]
    Semantic(#[from] SemanticErrorKind),
}

fn describe_unexpected(found: &EcoString, expected: &[&'static str]) -> String {
    let mut message = format!("unexpected {found}");
    if !expected.is_empty() {
        let _ = write!(message, ", expecting {}", expected.join(" or "));
    }
    message
}

/// A located error with the text of the offending line.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
#[error("{}", render(.source_name, .span, .kind, .line_text))]
#[diagnostic()]
pub struct SyntaxError {
    /// What went wrong.
    pub kind: SyntaxErrorKind,
    /// Where.
    #[label("{kind}")]
    pub span: Span,
    /// The source name from [`ParseOptions`](crate::ParseOptions).
    pub source_name: String,
    /// The offending line, without its newline.
    pub line_text: String,
}

impl SyntaxError {
    /// Returns the 1-based line of the error.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.span.start_location().line
    }

    /// Returns the 0-based byte column of the error.
    #[must_use]
    pub fn column(&self) -> u32 {
        self.span.start_location().column
    }

    /// Returns the error message without location or context.
    #[must_use]
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

fn render(source_name: &str, span: &Span, kind: &SyntaxErrorKind, line_text: &str) -> String {
    let at = span.start_location();
    let mut out = format!("{source_name}:{}:{}: {kind}", at.line, at.column);
    if !line_text.is_empty() {
        let column = (at.column as usize).min(line_text.len());
        let indent: String = line_text
            .bytes()
            .take(column)
            .map(|b| if b == b'\t' { '\t' } else { ' ' })
            .collect();
        let _ = write!(out, "\n{line_text}\n{indent}^");
    }
    out
}

/// A failed parse.
///
/// Holds either the single fatal error that aborted the parse or every
/// semantic error recorded, plus the warnings collected up to that point.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("{}", summarize(.errors))]
#[diagnostic()]
pub struct ParseError {
    /// The errors, in source order.
    #[related]
    pub errors: Vec<SyntaxError>,
    /// Warnings collected before the failure.
    pub warnings: Vec<Diagnostic>,
    /// The source text read so far, for rendering.
    #[source_code]
    pub source_code: NamedSource<String>,
}

impl ParseError {
    /// Returns the first error.
    #[must_use]
    pub fn first(&self) -> Option<&SyntaxError> {
        self.errors.first()
    }

    /// Returns true if any error has the given kind.
    #[must_use]
    pub fn has_kind(&self, predicate: impl Fn(&SyntaxErrorKind) -> bool) -> bool {
        self.errors.iter().any(|e| predicate(&e.kind))
    }
}

fn summarize(errors: &[SyntaxError]) -> String {
    match errors {
        [] => "parse failed".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first}\n(and {} more errors)", rest.len()),
    }
}
