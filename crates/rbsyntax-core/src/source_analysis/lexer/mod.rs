// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis.
//!
//! **DDD Context:** Source Analysis
//!
//! The lexer is a mode-driven state machine. How a character is read depends
//! on a [`LexState`] recording what kind of token came before it, and on two
//! [`BitStack`]s that decide which form of `do` a keyword is. The parser
//! steers part of that state (it knows which names are local variables and
//! where a loop condition starts), so tokens are produced one at a time
//! through [`Lexer::next_token`] instead of all at once.
//!
//! # Example
//!
//! ```
//! use rbsyntax_core::source_analysis::{TokenKind, lex};
//!
//! let tokens = lex(b"puts 1").unwrap();
//! assert!(matches!(tokens[0].kind(), TokenKind::Identifier(name) if name == "puts"));
//! assert!(matches!(tokens[1].kind(), TokenKind::Numeric(_)));
//! ```

mod heredoc;
mod identifiers;
mod numbers;
mod operators;
mod strings;

use tracing::trace;

use crate::config::ParseOptions;

use super::encoding::{MagicComment, MagicSetting, find_coding_declaration, parse_magic_comment};
use super::terminator::{FrameMode, TerminatorStack};
use super::{
    BitStack, DiagnosticCategory, LexError, LexErrorKind, LexState, ParserContext, SourceBuffer,
    Token, TokenKind,
};

/// A tokenizer over a [`SourceBuffer`].
///
/// The lexer keeps the mode bits and nesting counters that decide how
/// ambiguous characters are read. The parser adjusts them through the
/// `set_*`, `cond_*` and `cmdarg_*` methods before requesting the next token.
pub struct Lexer<'src> {
    /// The input.
    src: SourceBuffer<'src>,
    /// Current mode.
    state: LexState,
    /// Mode at the start of the token being read.
    last_state: LexState,
    /// True inside a `while`/`until`/`for` condition.
    cond: BitStack,
    /// True inside a command call's arguments.
    cmdarg: BitStack,
    /// Open string-like literals.
    literals: TerminatorStack,
    /// Depth of `(`, `[` and `{`.
    paren_nest: i32,
    /// Depth of `{` since the innermost interpolation.
    brace_nest: i32,
    /// Value of `paren_nest` when the innermost `->` was read.
    lambda_base: Option<i32>,
    /// Outer `lambda_base` values for nested lambdas.
    lambda_saved: Vec<Option<i32>>,
    /// The next token begins a statement.
    command_start: bool,
    /// `command_start` as it was when the current token began.
    cmd_state: bool,
    /// Whitespace preceded the current token.
    space_seen: bool,
    /// Newlines after a label end the expression (`in` patterns, `def`
    /// parameters without parentheses).
    in_kwarg: bool,
    /// Reading method parameters.
    in_argdef: bool,
    /// The last identifier may refer to a local variable.
    ident_may_be_local: bool,
    /// The first line was a `#!` line.
    shebang: bool,
    /// End of input has been reached.
    finished: bool,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("state", &self.state)
            .field("paren_nest", &self.paren_nest)
            .field("literals", &self.literals.depth())
            .finish_non_exhaustive()
    }
}

impl<'src> Lexer<'src> {
    /// Creates a lexer over a source buffer.
    #[must_use]
    pub fn new(src: SourceBuffer<'src>) -> Self {
        Self {
            src,
            state: LexState::BEG,
            last_state: LexState::BEG,
            cond: BitStack::default(),
            cmdarg: BitStack::default(),
            literals: TerminatorStack::default(),
            paren_nest: 0,
            brace_nest: 0,
            lambda_base: None,
            lambda_saved: Vec::new(),
            command_start: true,
            cmd_state: false,
            space_seen: false,
            in_kwarg: false,
            in_argdef: false,
            ident_may_be_local: false,
            shebang: false,
            finished: false,
        }
    }

    /// Creates a lexer over in-memory bytes starting at line 1.
    #[must_use]
    pub fn from_bytes(bytes: &'src [u8]) -> Self {
        Self::new(SourceBuffer::from_bytes(bytes, 1))
    }

    /// Produces the next token.
    ///
    /// After [`TokenKind::Eof`] every further call returns `Eof` again.
    ///
    /// # Errors
    ///
    /// Returns a [`LexError`] for malformed input. Lexical errors are fatal;
    /// the lexer should not be used after one.
    pub fn next_token(&mut self, ctx: &mut ParserContext) -> Result<Token, LexError> {
        self.ident_may_be_local = false;
        let token = self.scan(ctx)?;
        if !matches!(token.kind(), TokenKind::Newline | TokenKind::Eof) {
            ctx.mark_token_seen();
        }
        trace!(kind = ?token.kind(), span = %token.span(), state = ?self.state, "token");
        Ok(token)
    }

    // ========================================================================
    // Parser hooks
    // ========================================================================

    /// Returns the current mode.
    #[must_use]
    pub fn state(&self) -> LexState {
        self.state
    }

    /// Replaces the current mode.
    pub fn set_state(&mut self, state: LexState) {
        self.state = state;
    }

    /// Marks the next token as the start of a statement.
    pub fn set_command_start(&mut self, command_start: bool) {
        self.command_start = command_start;
    }

    /// Enters or leaves a loop condition.
    pub fn cond_push(&mut self, bit: bool) {
        self.cond.push(bit);
    }

    /// Leaves the innermost condition scope.
    pub fn cond_pop(&mut self) {
        self.cond.pop();
    }

    /// Enters or leaves a command's arguments.
    pub fn cmdarg_push(&mut self, bit: bool) {
        self.cmdarg.push(bit);
    }

    /// Leaves the innermost command-argument scope.
    pub fn cmdarg_pop(&mut self) {
        self.cmdarg.pop();
    }

    /// Sets the keyword-argument flag, returning the previous value.
    pub fn set_in_kwarg(&mut self, in_kwarg: bool) -> bool {
        std::mem::replace(&mut self.in_kwarg, in_kwarg)
    }

    /// Sets the parameter-list flag, returning the previous value.
    pub fn set_in_argdef(&mut self, in_argdef: bool) -> bool {
        std::mem::replace(&mut self.in_argdef, in_argdef)
    }

    /// Returns true if the identifier just produced was read where a local
    /// variable reference is possible.
    ///
    /// The parser answers by switching the mode to `END|LABEL` when the name
    /// is a known local, so `x -1` subtracts.
    #[must_use]
    pub fn ident_may_be_local(&self) -> bool {
        self.ident_may_be_local
    }

    /// Returns the source buffer.
    #[must_use]
    pub fn source(&self) -> &SourceBuffer<'src> {
        &self.src
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    fn scan(&mut self, ctx: &mut ParserContext) -> Result<Token, LexError> {
        if self.finished {
            return Ok(self.token(TokenKind::Eof));
        }
        if let Some(frame) = self.literals.top() {
            match frame.mode {
                FrameMode::Body => return self.literal_token(ctx),
                FrameMode::PendingVariable => {
                    let token = self.scan_code(ctx)?;
                    if let Some(frame) = self.literals.top_mut() {
                        frame.mode = FrameMode::Body;
                    }
                    return Ok(token);
                }
                FrameMode::Interpolating { .. } => {}
            }
        }
        self.scan_code(ctx)
    }

    /// Reads a token outside literal bodies.
    fn scan_code(&mut self, ctx: &mut ParserContext) -> Result<Token, LexError> {
        self.space_seen = false;
        self.cmd_state = self.command_start;
        self.command_start = false;
        loop {
            self.last_state = self.state;
            let Some(c) = self.start_token() else {
                return self.end_of_input();
            };
            match c {
                0 | 0x04 | 0x1a => return self.end_of_input(),
                b'\r' => {
                    ctx.warn_carriage_return(self.src.current_span());
                    self.space_seen = true;
                }
                b' ' | b'\t' | 0x0b | 0x0c => self.space_seen = true,
                b'#' => {
                    self.comment(ctx)?;
                    if self.newline() {
                        return Ok(self.token(TokenKind::Newline));
                    }
                }
                b'\n' => {
                    if self.newline() {
                        return Ok(self.token(TokenKind::Newline));
                    }
                }
                b'=' if self.src.was_bol() && self.word_follows(b"begin") => {
                    self.embedded_document()?;
                }
                b'_' if self.src.was_bol() && self.at_end_marker() => {
                    return self.end_of_input();
                }
                b'\\' => {
                    let next = self.src.advance();
                    if next != Some(b'\n') {
                        self.src.unget(next);
                        return Err(self.error(LexErrorKind::InvalidCharacter("\\".into())));
                    }
                    self.space_seen = true;
                }
                _ => return self.operator_or_word(ctx, c),
            }
        }
    }

    /// Decides whether a newline ends the statement.
    ///
    /// Returns `false` if it is insignificant and lexing should continue.
    fn newline(&mut self) -> bool {
        let state = self.state;
        let ignorable = state.is_in(
            LexState::BEG
                | LexState::CLASS
                | LexState::FNAME
                | LexState::DOT,
        ) && !state.is_in(LexState::LABELED);
        if ignorable || (state.has_all(LexState::ARG | LexState::LABELED) && !self.in_kwarg) {
            return false;
        }
        // A following line starting with `.meth` or `&.meth` continues the
        // expression.
        let checkpoint = self.src.checkpoint();
        loop {
            match self.src.advance() {
                Some(b' ' | b'\t' | b'\r' | 0x0b | 0x0c) => self.space_seen = true,
                Some(b'#') => {
                    self.src.unget(Some(b'#'));
                    return false;
                }
                Some(c @ (b'&' | b'.')) => {
                    if self.src.peek_is(0, b'.') == (c == b'&') {
                        self.src.unget(Some(c));
                        return false;
                    }
                    break;
                }
                _ => break,
            }
        }
        self.src.restore(checkpoint);
        self.command_start = true;
        self.state = LexState::BEG;
        true
    }

    fn end_of_input(&mut self) -> Result<Token, LexError> {
        if let Some(err) = self.src.take_io_error() {
            return Err(self.error(LexErrorKind::Io(err.to_string().into())));
        }
        self.finished = true;
        Ok(self.token(TokenKind::Eof))
    }

    // ========================================================================
    // Comments
    // ========================================================================

    /// Skips a comment (the `#` has been consumed), applying magic comments.
    fn comment(&mut self, ctx: &mut ParserContext) -> Result<(), LexError> {
        let line = self.src.current_line();
        let rest = self.src.rest_of_line();
        let hash_at = line.len() - rest.len() - 1;
        let comment_only = line[..hash_at].iter().all(|b| matches!(b, b' ' | b'\t'));
        let text = rest.strip_suffix(b"\n").unwrap_or(rest).to_vec();
        let line_index = self.src.line_index();
        self.src.goto_eol();
        let span = self.src.current_span();

        if line_index == Some(0) && hash_at == 0 && text.starts_with(b"!") {
            self.shebang = true;
            return Ok(());
        }
        let at_top = !ctx.token_seen()
            && (line_index == Some(0) || (line_index == Some(1) && self.shebang));

        let settings = parse_magic_comment(&text);
        if settings.is_empty() {
            if at_top {
                if let Some(name) = find_coding_declaration(&text) {
                    self.switch_encoding(ctx, &name)?;
                }
            }
            return Ok(());
        }
        for setting in &settings {
            match setting {
                MagicComment::Setting(MagicSetting::Encoding(name)) => {
                    if at_top {
                        self.switch_encoding(ctx, name)?;
                    }
                }
                _ if comment_only => ctx.apply_magic_comment(setting, span),
                _ => ctx.warn(
                    DiagnosticCategory::MagicComment,
                    "magic comment is ignored unless in comment-only line",
                    span,
                ),
            }
        }
        Ok(())
    }

    fn switch_encoding(&self, ctx: &mut ParserContext, name: &str) -> Result<(), LexError> {
        if ctx.set_encoding(name) {
            Ok(())
        } else {
            Err(self.error(LexErrorKind::UnknownEncoding(name.into())))
        }
    }

    /// Returns true if the rest of the line is `word` followed by whitespace
    /// or the end of the line.
    fn word_follows(&self, word: &[u8]) -> bool {
        let rest = self.src.rest_of_line();
        rest.starts_with(word)
            && rest
                .get(word.len())
                .is_none_or(|&b| is_space(b))
    }

    /// Skips an `=begin` ... `=end` block.
    fn embedded_document(&mut self) -> Result<(), LexError> {
        let opening = self.src.current_span();
        loop {
            self.src.goto_eol();
            if !self.src.refill_line() {
                return Err(LexError::new(
                    LexErrorKind::UnterminatedEmbeddedDocument,
                    opening,
                ));
            }
            if self.src.peek_is(0, b'=') {
                self.src.skip(1);
                if self.word_follows(b"end") {
                    break;
                }
            }
        }
        self.src.goto_eol();
        Ok(())
    }

    /// Returns true if the line is `__END__` (the first `_` has been read).
    fn at_end_marker(&self) -> bool {
        let rest = self.src.rest_of_line();
        let rest = rest.strip_suffix(b"\n").unwrap_or(rest);
        rest == b"_END__"
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Reads the first byte of a token and marks the token start before it.
    fn start_token(&mut self) -> Option<u8> {
        let c = self.src.advance();
        self.src.unget(c);
        self.src.mark_token_start();
        if c.is_some() {
            self.src.advance();
        }
        c
    }

    fn token(&self, kind: TokenKind) -> Token {
        Token::with_space(kind, self.src.current_span(), self.space_seen)
    }

    fn error(&self, kind: LexErrorKind) -> LexError {
        LexError::new(kind, self.src.current_span())
    }

    fn is_beg(&self) -> bool {
        self.state.is_beginning_of_expression()
    }

    fn is_arg(&self) -> bool {
        self.state.is_argument_position()
    }

    fn is_end(&self) -> bool {
        self.state.is_end_of_expression()
    }

    fn is_after_operator(&self) -> bool {
        self.state.is_after_operator()
    }

    /// An argument position after whitespace, with `next` not a space:
    /// `foo -1`, `foo *a`.
    fn is_space_arg(&self, next: Option<u8>) -> bool {
        self.is_arg() && self.space_seen && !next.is_some_and(is_space)
    }

    fn is_label_possible(&self) -> bool {
        (self.state.is_in(LexState::LABEL | LexState::ENDFN) && !self.cmd_state) || self.is_arg()
    }

    /// Returns true if a lambda's parameters just closed and its body opens.
    fn lambda_beginning(&self) -> bool {
        self.lambda_base == Some(self.paren_nest)
    }

    /// Restores the outer lambda's parameter depth once a body opens.
    fn enter_lambda_body(&mut self) {
        self.lambda_base = self.lambda_saved.pop().flatten();
    }

    /// The mode after a binary operator.
    fn operator_state(&self) -> LexState {
        if self.is_after_operator() {
            LexState::ARG
        } else {
            LexState::BEG
        }
    }

    /// Warns when an operator written like a prefix is read as binary
    /// (`x -1` where `x` is a local).
    fn warn_balanced(
        &self,
        ctx: &mut ParserContext,
        kind: TokenKind,
        op: &str,
        looks_like: &str,
        next: Option<u8>,
    ) -> TokenKind {
        let after_name = self.last_state.is_in(
            LexState::CLASS
                | LexState::DOT
                | LexState::FNAME
                | LexState::ENDFN,
        );
        if !after_name && self.space_seen && !next.is_some_and(is_space) {
            ctx.warn(
                DiagnosticCategory::AmbiguousOperator,
                format!(
                    "'{op}' after local variable or literal is interpreted as binary operator \
                     even though it seems like {looks_like}"
                ),
                self.src.current_span(),
            );
        }
        kind
    }

    /// Warns that a prefix operator after a command name starts its first
    /// argument.
    fn warn_ambiguous_argument(&self, ctx: &mut ParserContext, op: &str) -> bool {
        ctx.warn(
            DiagnosticCategory::AmbiguousOperator,
            format!(
                "ambiguous first argument; put parentheses or a space even after '{op}' operator"
            ),
            self.src.current_span(),
        );
        true
    }

    /// Appends one character starting with `first` (already consumed) to
    /// `out`, validating multibyte sequences against the source encoding.
    fn push_char(
        &mut self,
        ctx: &ParserContext,
        first: u8,
        out: &mut Vec<u8>,
    ) -> Result<(), LexError> {
        out.push(first);
        if first.is_ascii() {
            return Ok(());
        }
        let mut head = [first, 0, 0, 0];
        let rest = self.src.rest_of_line();
        let n = rest.len().min(3);
        head[1..=n].copy_from_slice(&rest[..n]);
        let encoding = ctx.encoding();
        let Some(len) = encoding.char_len(&head[..=n]) else {
            return Err(self.error(LexErrorKind::InvalidMultibyteChar(
                encoding.name().into(),
            )));
        };
        for _ in 1..len {
            if let Some(b) = self.src.advance() {
                out.push(b);
            }
        }
        Ok(())
    }
}

/// Whitespace bytes, including vertical tab and form feed.
const fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Tokenizes a complete source, excluding the final [`TokenKind::Eof`].
///
/// Newline significance normally depends on feedback from the parser (which
/// names are local variables, where a loop condition starts); this function
/// lexes without it, which is enough for tooling that only needs a token
/// stream.
///
/// # Errors
///
/// Returns the first lexical error.
pub fn lex(source: &[u8]) -> Result<Vec<Token>, LexError> {
    let mut ctx = ParserContext::new(ParseOptions::default());
    let mut lexer = Lexer::from_bytes(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token(&mut ctx)?;
        if token.kind().is_eof() {
            return Ok(tokens);
        }
        tokens.push(token);
    }
}

#[cfg(test)]
mod tests;
