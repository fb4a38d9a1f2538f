// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser for Ruby source text.
//!
//! The parser pulls tokens from the [`Lexer`] one at a time and builds a
//! [`Program`]. It is not a separate pass over a finished token stream:
//! several lexer decisions depend on what the parser knows, and the parser
//! reports them back as it goes.
//!
//! - After every identifier it checks whether the name is a local variable
//!   and, if so, switches the lexer to `END|LABEL` so that `x -1` reads as
//!   a subtraction.
//! - Around `while`/`until`/`for` conditions it pushes the lexer's condition
//!   stack so a `do` there ends the condition instead of opening a block.
//! - Around command arguments it pushes the command-argument stack so a
//!   `do` binds to the outermost command.
//! - Around patterns and parameter lists it sets the keyword-argument and
//!   parameter-definition flags, which change how newlines and `...` lex.
//!
//! # Error Handling
//!
//! Grammar and lexical errors are fatal: the parser stops at the first one.
//! Semantic errors (a duplicated parameter, `class` inside `def`, misused
//! numbered parameters, ...) are recorded in the [`ParserContext`], an
//! [`Invalid`](crate::ast::NodeKind::Invalid) node takes the construct's
//! place, and parsing continues so all of them are reported together.
//!
//! # Operator Precedence (Pratt Parsing)
//!
//! Statements and keywords are parsed by recursive descent. Binary operator
//! precedence is handled using Pratt parsing: each operator has a binding
//! power and the table below lives in one place, [`binary_binding_power`].
//!
//! | Level | Operators | Associativity |
//! |-------|-----------|---------------|
//! | 10 | `? :` | Right |
//! | 20 | `..` `...` | None |
//! | 30 | `\|\|` | Left |
//! | 40 | `&&` | Left |
//! | 50 | `<=>` `==` `===` `!=` `=~` `!~` | None |
//! | 60 | `<` `<=` `>` `>=` | Left |
//! | 70 | `\|` `^` | Left |
//! | 80 | `&` | Left |
//! | 90 | `<<` `>>` | Left |
//! | 100 | `+` `-` | Left |
//! | 110 | `*` `/` `%` | Left |
//! | 120 | unary `-` | Prefix |
//! | 130 | `**` | Right |
//! | 140 | `!` `~` unary `+` | Prefix |
//!
//! Below the table sit assignment (right-associative, parsed at the operand
//! that becomes its target), `defined?`, `not`, and the `and`/`or` keywords.
//!
//! # Usage
//!
//! ```
//! use rbsyntax_core::ParseOptions;
//! use rbsyntax_core::source_analysis::parse;
//!
//! let output = parse(b"x = 3 + 4", &ParseOptions::default()).unwrap();
//! assert_eq!(output.program.statements.len(), 1);
//! ```

use std::io::BufRead;

use ecow::EcoString;
use miette::NamedSource;
use tracing::{debug, debug_span};

use crate::ast::{Node, NodeKind, Program};
use crate::config::ParseOptions;
use crate::semantic_analysis::{ScopeKind, ScopeTracker};

use super::{
    Diagnostic, DiagnosticCategory, Encoding, Keyword, LexError, LexState, Lexer,
    MagicComments, ParseError, ParserContext, SemanticErrorKind, SourceBuffer, Span,
    SyntaxError, SyntaxErrorKind, Token, TokenKind,
};

// Submodules with additional impl blocks for Parser
mod calls;
mod control;
mod declarations;
mod expressions;
mod literals;
mod patterns;
mod primary;
mod statements;

// Property-based tests
#[cfg(test)]
mod property_tests;

#[cfg(test)]
mod tests;

// ============================================================================
// Pratt Parsing for Binary Operator Precedence
// ============================================================================

/// Binding power for binary operators (Pratt parsing).
///
/// Higher values bind tighter. Left and right binding powers differ
/// for associativity:
/// - Left-associative: `left_bp == right_bp - 1` (e.g., `+`, `-`)
/// - Right-associative: `left_bp == right_bp + 1` (e.g., `**`)
#[derive(Debug, Clone, Copy)]
pub(super) struct BindingPower {
    /// Left binding power (how tightly this operator binds to its left operand).
    pub(super) left: u8,
    /// Right binding power (how tightly this operator binds to its right operand).
    pub(super) right: u8,
    /// Chaining two operators of this level is an error (`a == b == c`).
    pub(super) non_assoc: bool,
}

impl BindingPower {
    /// Creates a left-associative binding power.
    const fn left_assoc(precedence: u8) -> Self {
        Self {
            left: precedence,
            right: precedence + 1,
            non_assoc: false,
        }
    }

    /// Creates a right-associative binding power.
    const fn right_assoc(precedence: u8) -> Self {
        Self {
            left: precedence + 1,
            right: precedence,
            non_assoc: false,
        }
    }

    /// Creates a non-associative binding power.
    const fn non_assoc(precedence: u8) -> Self {
        Self {
            left: precedence,
            right: precedence + 1,
            non_assoc: true,
        }
    }
}

/// Binding power of the ternary `?:`.
pub(super) const TERNARY_BP: BindingPower = BindingPower::right_assoc(10);
/// Binding power of `..` and `...`.
pub(super) const RANGE_BP: BindingPower = BindingPower::non_assoc(20);
/// Binding power of `**`.
pub(super) const POW_BP: BindingPower = BindingPower::right_assoc(130);
/// Right binding power of unary minus.
pub(super) const UNARY_MINUS_BP: u8 = 120;
/// Right binding power of `!`, `~` and unary plus.
pub(super) const UNARY_NOT_BP: u8 = 140;

/// Gets the binding power for a binary operator token.
///
/// Returns `None` for tokens that do not continue an expression.
///
/// # Precedence Levels (from lowest to highest)
///
/// | Level | Operators | Associativity |
/// |-------|-----------|---------------|
/// | 30  | `\|\|`              | Left |
/// | 40  | `&&`                | Left |
/// | 50  | `<=>` `==` `===` `!=` `=~` `!~` | None |
/// | 60  | `<` `<=` `>` `>=`   | Left |
/// | 70  | `\|` `^`            | Left |
/// | 80  | `&`                 | Left |
/// | 90  | `<<` `>>`           | Left |
/// | 100 | `+` `-`             | Left |
/// | 110 | `*` `/` `%`         | Left |
/// | 130 | `**`                | Right |
pub(super) fn binary_binding_power(kind: &TokenKind) -> Option<BindingPower> {
    match kind {
        TokenKind::OrOr => Some(BindingPower::left_assoc(30)),
        TokenKind::AndAnd => Some(BindingPower::left_assoc(40)),

        TokenKind::Cmp
        | TokenKind::EqEq
        | TokenKind::EqEqEq
        | TokenKind::NotEq
        | TokenKind::Match
        | TokenKind::NotMatch => Some(BindingPower::non_assoc(50)),

        TokenKind::Lt | TokenKind::Le | TokenKind::Gt | TokenKind::Ge => {
            Some(BindingPower::left_assoc(60))
        }

        TokenKind::Pipe | TokenKind::Caret => Some(BindingPower::left_assoc(70)),
        TokenKind::Amper => Some(BindingPower::left_assoc(80)),
        TokenKind::LShift | TokenKind::RShift => Some(BindingPower::left_assoc(90)),
        TokenKind::Plus | TokenKind::Minus => Some(BindingPower::left_assoc(100)),
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => {
            Some(BindingPower::left_assoc(110))
        }
        TokenKind::Pow => Some(POW_BP),

        _ => None,
    }
}

// ============================================================================
// Public API
// ============================================================================

/// A successful parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    /// The syntax tree.
    pub program: Program,
    /// Warnings, in the order they were found.
    pub warnings: Vec<Diagnostic>,
    /// The magic comment settings at the end of the source.
    pub magic_comments: MagicComments,
    /// The source encoding.
    pub encoding: Encoding,
}

/// Parses in-memory source bytes.
///
/// # Errors
///
/// Returns a [`ParseError`] holding the fatal error that stopped the parse,
/// or every semantic error found.
///
/// # Examples
///
/// ```
/// use rbsyntax_core::ParseOptions;
/// use rbsyntax_core::ast::NodeKind;
/// use rbsyntax_core::source_analysis::parse;
///
/// let output = parse(b"puts 'hi'", &ParseOptions::default()).unwrap();
/// assert!(matches!(&output.program.statements[0].kind, NodeKind::Call { name, .. } if name == "puts"));
///
/// let err = parse(b"def f(a, a) end", &ParseOptions::default()).unwrap_err();
/// assert_eq!(err.first().unwrap().message(), "duplicated argument name");
/// ```
pub fn parse(source: &[u8], options: &ParseOptions) -> Result<ParseOutput, ParseError> {
    run(
        SourceBuffer::from_bytes(source, options.starting_line),
        options,
    )
}

/// Parses source read line by line from a blocking reader.
///
/// Produces the same result as [`parse`] over the same bytes.
///
/// # Errors
///
/// As [`parse`]; a read failure is reported as a lexical error.
pub fn parse_reader<R: BufRead>(
    reader: R,
    options: &ParseOptions,
) -> Result<ParseOutput, ParseError> {
    run(
        SourceBuffer::from_reader(reader, options.starting_line),
        options,
    )
}

fn run(source: SourceBuffer<'_>, options: &ParseOptions) -> Result<ParseOutput, ParseError> {
    let _span = debug_span!("parse", source = %options.source_name).entered();
    let mut parser = Parser::new(source, options.clone());
    let result = parser.parse_program();
    parser.finish(result)
}

// ============================================================================
// Parser State
// ============================================================================

/// A fatal error: the parse stops here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Fatal {
    pub(super) kind: SyntaxErrorKind,
    pub(super) span: Span,
}

impl From<LexError> for Fatal {
    fn from(err: LexError) -> Self {
        Self {
            kind: SyntaxErrorKind::Lex(err.kind),
            span: err.span,
        }
    }
}

/// Result type of every parsing method.
pub(super) type PResult<T> = Result<T, Fatal>;

/// The parser state.
pub(super) struct Parser<'src> {
    /// The token source.
    lexer: Lexer<'src>,
    /// State shared with the lexer: options, magic comments, diagnostics.
    pub(super) ctx: ParserContext,
    /// The current (lookahead) token.
    token: Token,
    /// Span of the most recently consumed token.
    prev_span: Span,
    /// Local variable scopes.
    pub(super) scopes: ScopeTracker,
    /// Current expression nesting depth (guards against stack overflow).
    nesting_depth: usize,
    max_nesting_depth: usize,
    /// How many command argument lists enclose the current position within
    /// the innermost statement list.
    pub(super) command_depth: usize,
    /// Number of statement lists enclosing the current position; 1 for the
    /// program's own statements.
    pub(super) statement_depth: usize,
    /// Span of the last identifier parsed as an argument-less call, which may
    /// still turn out to be an assignment target.
    pub(super) vcall_span: Option<Span>,
}

impl<'src> Parser<'src> {
    fn new(source: SourceBuffer<'src>, options: ParseOptions) -> Self {
        let max_nesting_depth = options.max_nesting_depth;
        Self {
            lexer: Lexer::new(source),
            ctx: ParserContext::new(options),
            token: Token::new(TokenKind::Eof, Span::default()),
            prev_span: Span::default(),
            scopes: ScopeTracker::new(),
            nesting_depth: 0,
            max_nesting_depth,
            command_depth: 0,
            statement_depth: 0,
            vcall_span: None,
        }
    }

    // ========================================================================
    // Program Parsing
    // ========================================================================

    fn parse_program(&mut self) -> PResult<Program> {
        self.advance()?;
        let start = self.span();
        let statements = self.parse_statement_list()?;
        if !self.current_kind().is_eof() {
            return self.unexpected(&["end-of-input"]);
        }
        let span = statements
            .first()
            .map_or(start, |first| first.span.merge(self.prev_span));
        let closed = self.scopes.finish();
        self.report_unused(&closed.unused);
        Ok(Program::new(statements, span))
    }

    fn finish(mut self, result: PResult<Program>) -> Result<ParseOutput, ParseError> {
        let (warnings, mut semantic) = self.ctx.take_results();
        semantic.sort_by_key(|(_, span)| span.start());
        let errors: Vec<SyntaxError> = match &result {
            Err(fatal) => vec![self.syntax_error(fatal.kind.clone(), fatal.span)],
            Ok(_) => semantic
                .into_iter()
                .map(|(kind, span)| self.syntax_error(SyntaxErrorKind::Semantic(kind), span))
                .collect(),
        };
        match result {
            Ok(program) if errors.is_empty() => {
                debug!(statements = program.statements.len(), "parse succeeded");
                Ok(ParseOutput {
                    program,
                    warnings,
                    magic_comments: self.ctx.magic_comments(),
                    encoding: self.ctx.encoding(),
                })
            }
            _ => {
                debug!(errors = errors.len(), "parse failed");
                let text = String::from_utf8_lossy(self.lexer.source().text()).into_owned();
                Err(ParseError {
                    errors,
                    warnings,
                    source_code: NamedSource::new(self.ctx.options().source_name.clone(), text),
                })
            }
        }
    }

    fn syntax_error(&self, kind: SyntaxErrorKind, span: Span) -> SyntaxError {
        let line_text = self
            .lexer
            .source()
            .line_text(span.start_location().line)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();
        SyntaxError {
            kind,
            span,
            source_name: self.ctx.options().source_name.clone(),
            line_text,
        }
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    /// Returns the current token kind.
    pub(super) fn current_kind(&self) -> &TokenKind {
        self.token.kind()
    }

    /// Returns the span of the current token.
    pub(super) fn span(&self) -> Span {
        self.token.span()
    }

    /// Returns the span of the last consumed token.
    pub(super) fn prev_span(&self) -> Span {
        self.prev_span
    }

    /// Returns true if whitespace precedes the current token.
    pub(super) fn space_before(&self) -> bool {
        self.token.space_before()
    }

    /// Advances to the next token and returns the previous one.
    ///
    /// An identifier that names a visible local switches the lexer to
    /// `END|LABEL` before anything after it is read.
    pub(super) fn advance(&mut self) -> PResult<Token> {
        let next = self.lexer.next_token(&mut self.ctx)?;
        let prev = std::mem::replace(&mut self.token, next);
        self.prev_span = prev.span();
        if let TokenKind::Identifier(name) = self.token.kind() {
            if self.lexer.ident_may_be_local() && self.scopes.is_local(name) {
                self.lexer.set_state(LexState::END | LexState::LABEL);
            }
        }
        Ok(prev)
    }

    /// Checks if the current token has the same variant as `kind`.
    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    /// Checks if the current token is the given keyword.
    pub(super) fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current_kind().keyword() == Some(keyword)
    }

    /// Consumes the current token if it matches the given kind.
    pub(super) fn match_token(&mut self, kind: &TokenKind) -> PResult<bool> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consumes the current token if it is the given keyword.
    pub(super) fn match_keyword(&mut self, keyword: Keyword) -> PResult<bool> {
        if self.check_keyword(keyword) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Expects the current token to match the given kind, advancing if it does.
    pub(super) fn expect(&mut self, kind: &TokenKind, what: &'static str) -> PResult<Token> {
        if self.check(kind) {
            self.advance()
        } else {
            self.unexpected(&[what])
        }
    }

    /// Expects the given keyword.
    pub(super) fn expect_keyword(&mut self, keyword: Keyword) -> PResult<Token> {
        if self.check_keyword(keyword) {
            self.advance()
        } else {
            self.unexpected(&[keyword_expectation(keyword)])
        }
    }

    /// Skips newline tokens.
    pub(super) fn skip_newlines(&mut self) -> PResult<()> {
        while self.check(&TokenKind::Newline) {
            self.advance()?;
        }
        Ok(())
    }

    /// Skips newlines and semicolons.
    pub(super) fn skip_terms(&mut self) -> PResult<()> {
        while matches!(self.current_kind(), TokenKind::Newline | TokenKind::Semicolon) {
            self.advance()?;
        }
        Ok(())
    }

    /// Gives the lexer hooks to grammar rules.
    pub(super) fn lexer_mut(&mut self) -> &mut Lexer<'src> {
        &mut self.lexer
    }

    // ========================================================================
    // Error Handling
    // ========================================================================

    /// Fails at the current token.
    pub(super) fn unexpected<T>(&self, expected: &[&'static str]) -> PResult<T> {
        Err(Fatal {
            kind: SyntaxErrorKind::Unexpected {
                found: describe(self.current_kind()),
                expected: expected.to_vec(),
            },
            span: self.span(),
        })
    }

    /// Fails at `span` with an unexpected-token message naming `found`.
    pub(super) fn unexpected_at<T>(&self, found: impl Into<EcoString>, span: Span) -> PResult<T> {
        Err(Fatal {
            kind: SyntaxErrorKind::Unexpected {
                found: found.into(),
                expected: Vec::new(),
            },
            span,
        })
    }

    /// Records a semantic error and returns the placeholder node.
    pub(super) fn semantic_error(&mut self, kind: SemanticErrorKind, span: Span) -> Node {
        self.ctx.semantic_error(kind, span);
        Node::new(NodeKind::Invalid, span)
    }

    /// Records a warning.
    pub(super) fn warn(
        &mut self,
        category: DiagnosticCategory,
        message: impl Into<EcoString>,
        span: Span,
    ) {
        self.ctx.warn(category, message, span);
    }

    /// Increments the nesting depth, failing once it exceeds the configured
    /// limit. Call [`Parser::leave_nesting`] on every exit path when this
    /// returns `Ok(())`.
    pub(super) fn enter_nesting(&mut self) -> PResult<()> {
        self.nesting_depth += 1;
        if self.nesting_depth > self.max_nesting_depth {
            self.nesting_depth -= 1;
            debug!(limit = self.max_nesting_depth, span = %self.span(), "nesting limit reached");
            return Err(Fatal {
                kind: SyntaxErrorKind::NestingTooDeep {
                    limit: self.max_nesting_depth,
                },
                span: self.span(),
            });
        }
        Ok(())
    }

    /// Decrements the nesting depth (pair with [`Parser::enter_nesting`]).
    pub(super) fn leave_nesting(&mut self) {
        debug_assert!(
            self.nesting_depth > 0,
            "leave_nesting called without matching enter_nesting"
        );
        self.nesting_depth = self.nesting_depth.saturating_sub(1);
    }

    // ========================================================================
    // Scopes
    // ========================================================================

    /// Enters a scope.
    pub(super) fn push_scope(&mut self, kind: ScopeKind) {
        self.scopes.push(kind);
    }

    /// Leaves a scope, warning about unused locals. Returns the highest
    /// numbered parameter it used.
    pub(super) fn pop_scope(&mut self) -> u8 {
        let closed = self.scopes.pop();
        self.report_unused(&closed.unused);
        closed.numbered_params
    }

    fn report_unused(&mut self, unused: &[(EcoString, Span)]) {
        for (name, span) in unused {
            self.warn(
                DiagnosticCategory::UnusedVariable,
                format!("assigned but unused variable - {name}"),
                *span,
            );
        }
    }

    /// Declares a parameter, reporting duplicates and shadowing.
    pub(super) fn declare_param(&mut self, name: &EcoString, span: Span) {
        match self.scopes.declare_param(name, span) {
            Ok(true) => self.warn(
                DiagnosticCategory::ShadowingOuterLocal,
                format!("shadowing outer local variable - {name}"),
                span,
            ),
            Ok(false) => {}
            Err(kind) => {
                self.ctx.semantic_error(kind, span);
            }
        }
    }

    // ========================================================================
    // Layout Warnings
    // ========================================================================

    /// Warns when `end` is not aligned with the line that opened it.
    ///
    /// Only applies when both tokens start their lines and sit on different
    /// lines, and only when indentation warnings are enabled.
    pub(super) fn check_end_alignment(&mut self, open: Span, keyword: Keyword, close: Span) {
        if !self.ctx.warn_indent() {
            return;
        }
        let open_at = open.start_location();
        let close_at = close.start_location();
        if open_at.line == close_at.line {
            return;
        }
        let (Some(open_indent), Some(close_indent)) =
            (self.leading_indent(open), self.leading_indent(close))
        else {
            return;
        };
        if open_indent != close_indent {
            self.warn(
                DiagnosticCategory::IndentMismatch,
                format!(
                    "mismatched indentations at 'end' with '{keyword}' at {}",
                    open_at.line
                ),
                close,
            );
        }
    }

    /// Returns the indentation width of the token's line if only whitespace
    /// precedes the token on it.
    fn leading_indent(&self, span: Span) -> Option<usize> {
        let at = span.start_location();
        let line = self.lexer.source().line_text(at.line)?;
        let before = line.get(..at.column as usize)?;
        let mut width = 0;
        for &b in before {
            match b {
                b' ' => width += 1,
                b'\t' => width = (width / 8 + 1) * 8,
                _ => return None,
            }
        }
        Some(width)
    }

    /// Returns the source text covered by `span`.
    pub(super) fn source_text(&self, span: Span) -> String {
        self.lexer
            .source()
            .text()
            .get(span.as_range())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default()
    }
}

/// Describes a token for an "unexpected" message.
pub(super) fn describe(kind: &TokenKind) -> EcoString {
    match kind.operator_method_name() {
        Some(op) if !matches!(kind, TokenKind::UPlus | TokenKind::UMinus) => {
            ecow::eco_format!("'{op}'")
        }
        _ => ecow::eco_format!("{kind}"),
    }
}

/// Describes a keyword for an "expecting" list.
fn keyword_expectation(keyword: Keyword) -> &'static str {
    match keyword {
        Keyword::End => "'end'",
        Keyword::Then => "'then'",
        Keyword::In => "'in'",
        Keyword::When => "'when'",
        _ => "keyword",
    }
}
