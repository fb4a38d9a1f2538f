// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Quoted literals: strings, symbols, regexps, command strings, word lists
//! and character literals.
//!
//! A literal is opened by pushing a [`Frame`] on the terminator stack. While
//! the top frame is in body mode, each call produces one content fragment,
//! an interpolation opener, a word separator or the closing token.

use super::{Lexer, is_space};
use crate::source_analysis::encoding::Encoding;
use crate::source_analysis::escape::{EscapeFlags, read_escape, read_unicode_escape};
use crate::source_analysis::terminator::{Delimiter, Frame, FrameMode, LiteralFlags};
use crate::source_analysis::token::StringFragment;
use crate::source_analysis::{
    DiagnosticCategory, LexError, LexErrorKind, LexState, ParserContext, Token, TokenKind,
};

/// Regexp metacharacters whose escapes must survive into the pattern even
/// when they are also the literal's terminator.
const SIMPLE_REGEXP_META: &[u8] = b"$*+.?^|)]}>";

/// Regexp option letters.
const REGEXP_OPTIONS: &[u8] = b"imxonesu";

/// Result of reading inside a literal.
pub(super) enum Step {
    /// The literal stays open.
    Open(Token),
    /// The literal was closed by this token.
    Closed(Token),
}

pub(super) fn content(bytes: Vec<u8>, line_start: bool) -> TokenKind {
    TokenKind::StringContent(StringFragment { bytes, line_start })
}

fn closing_pair(open: u8) -> Option<u8> {
    match open {
        b'(' => Some(b')'),
        b'[' => Some(b']'),
        b'{' => Some(b'}'),
        b'<' => Some(b'>'),
        _ => None,
    }
}

impl Lexer<'_> {
    /// Reads the next token inside the innermost open literal.
    pub(super) fn literal_token(&mut self, ctx: &mut ParserContext) -> Result<Token, LexError> {
        let Some(mut frame) = self.literals.pop() else {
            return self.scan_code(ctx);
        };
        self.space_seen = false;
        let step = match &mut frame.delimiter {
            Delimiter::Heredoc(heredoc) => {
                self.heredoc_token(ctx, frame.flags, heredoc, &mut frame.mode)?
            }
            Delimiter::Quoted { .. } => self.quoted_token(ctx, &mut frame)?,
        };
        match step {
            Step::Open(token) => {
                self.literals.push(frame);
                Ok(token)
            }
            Step::Closed(token) => Ok(token),
        }
    }

    fn quoted_token(&mut self, ctx: &ParserContext, frame: &mut Frame) -> Result<Step, LexError> {
        let (term, paren, mut nest) = match frame.delimiter {
            Delimiter::Quoted { term, paren, nest } => (term, paren, nest),
            Delimiter::Heredoc(_) => return Err(self.error(LexErrorKind::UnterminatedString)),
        };
        let flags = frame.flags;

        let mut c = self.start_token();
        if flags.words {
            let mut skipped = false;
            while c.is_some_and(is_space) {
                skipped = true;
                c = self.src.advance();
            }
            if skipped {
                self.src.unget(c);
                if frame.in_word {
                    frame.in_word = false;
                    return Ok(Step::Open(self.token(TokenKind::WordSeparator)));
                }
                c = self.start_token();
            }
        }
        let Some(first) = c else {
            return Err(self.unterminated(flags));
        };
        if first == term && nest == 0 {
            return self.close_quoted(flags).map(Step::Closed);
        }

        let mut buf = Vec::new();
        if flags.expand && first == b'#' {
            if let Some(kind) = self.interpolation_start(&mut frame.mode) {
                if flags.words {
                    frame.in_word = true;
                }
                return Ok(Step::Open(self.token(kind)));
            }
            buf.push(b'#');
        } else {
            self.src.unget(c);
        }
        self.scan_quoted(ctx, flags, term, paren, &mut nest, &mut buf)?;
        frame.delimiter = Delimiter::Quoted { term, paren, nest };
        if flags.words {
            frame.in_word = true;
        }
        Ok(Step::Open(self.token(content(buf, false))))
    }

    fn unterminated(&self, flags: LiteralFlags) -> LexError {
        if flags.regexp {
            self.error(LexErrorKind::UnterminatedRegexp)
        } else {
            self.error(LexErrorKind::UnterminatedString)
        }
    }

    fn close_quoted(&mut self, flags: LiteralFlags) -> Result<Token, LexError> {
        if flags.regexp {
            let mut options = String::new();
            let mut unknown = String::new();
            while let Some(b) = self.src.peek(0) {
                if !b.is_ascii_alphabetic() {
                    break;
                }
                self.src.skip(1);
                if REGEXP_OPTIONS.contains(&b) {
                    options.push(char::from(b));
                } else {
                    unknown.push(char::from(b));
                }
            }
            if !unknown.is_empty() {
                return Err(self.error(LexErrorKind::UnknownRegexpOption(unknown.into())));
            }
            self.state = LexState::END;
            return Ok(self.token(TokenKind::RegexpEnd(options.into())));
        }
        if flags.label && self.src.peek_is(0, b':') && !self.src.peek_is(1, b':') {
            self.src.skip(1);
            self.state = LexState::ARG | LexState::LABELED;
            return Ok(self.token(TokenKind::LabelEnd));
        }
        self.state = LexState::END;
        Ok(self.token(TokenKind::StringEnd))
    }

    /// Starts an interpolation after `#` (already consumed) if one follows.
    pub(super) fn interpolation_start(&mut self, mode: &mut FrameMode) -> Option<TokenKind> {
        match self.src.peek(0) {
            Some(b'{') => {
                self.src.skip(1);
                *mode = FrameMode::Interpolating {
                    brace_nest: self.brace_nest,
                };
                self.brace_nest = 0;
                self.cond.push(false);
                self.cmdarg.push(false);
                self.state = LexState::BEG;
                self.command_start = true;
                Some(TokenKind::StringDBeg)
            }
            Some(b'$') => {
                let valid = match self.src.peek(1) {
                    Some(b'-') => self.src.peek(2).is_some_and(starts_name),
                    Some(b) => {
                        b"~*$?!@/\\;,.=:<>\"&`'+0".contains(&b)
                            || b.is_ascii_digit()
                            || starts_name(b)
                    }
                    None => false,
                };
                valid.then(|| {
                    *mode = FrameMode::PendingVariable;
                    TokenKind::StringDVar
                })
            }
            Some(b'@') => {
                let after = if self.src.peek_is(1, b'@') {
                    self.src.peek(2)
                } else {
                    self.src.peek(1)
                };
                after.is_some_and(starts_name).then(|| {
                    *mode = FrameMode::PendingVariable;
                    TokenKind::StringDVar
                })
            }
            _ => None,
        }
    }

    /// Scans literal content up to the terminator, an interpolation, or
    /// (in word lists) whitespace.
    fn scan_quoted(
        &mut self,
        ctx: &ParserContext,
        flags: LiteralFlags,
        term: u8,
        paren: Option<u8>,
        nest: &mut u32,
        buf: &mut Vec<u8>,
    ) -> Result<(), LexError> {
        loop {
            let Some(c) = self.src.advance() else {
                return Err(self.unterminated(flags));
            };
            if paren == Some(c) {
                *nest += 1;
            } else if c == term {
                if *nest == 0 {
                    self.src.unget(Some(c));
                    return Ok(());
                }
                *nest -= 1;
            } else if flags.expand
                && c == b'#'
                && matches!(self.src.peek(0), Some(b'{' | b'$' | b'@'))
            {
                self.src.unget(Some(c));
                return Ok(());
            } else if c == b'\\' {
                self.scan_backslash(ctx, flags, term, paren, buf)?;
                continue;
            } else if !c.is_ascii() {
                self.push_char(ctx, c, buf)?;
                continue;
            } else if flags.words && is_space(c) {
                self.src.unget(Some(c));
                return Ok(());
            }
            buf.push(c);
        }
    }

    /// Handles a backslash (already consumed) inside a quoted literal.
    fn scan_backslash(
        &mut self,
        ctx: &ParserContext,
        flags: LiteralFlags,
        term: u8,
        paren: Option<u8>,
        buf: &mut Vec<u8>,
    ) -> Result<(), LexError> {
        let Some(c) = self.src.advance() else {
            return Err(self.unterminated(flags));
        };
        match c {
            b'\n' => {
                if flags.words {
                    buf.push(b'\n');
                } else if !flags.expand {
                    buf.extend_from_slice(b"\\\n");
                }
            }
            b'\\' => {
                if flags.regexp {
                    buf.push(b'\\');
                }
                buf.push(b'\\');
            }
            b'u' if flags.expand => {
                if flags.regexp {
                    // Validate, but keep the escape for the regexp engine.
                    let start = self.src.location().offset as usize;
                    let mut scratch = Vec::new();
                    read_unicode_escape(&mut self.src, &mut scratch, true)
                        .map_err(|kind| self.error(kind))?;
                    let end = self.src.location().offset as usize;
                    buf.extend_from_slice(b"\\u");
                    buf.extend_from_slice(self.src.text().get(start..end).unwrap_or_default());
                } else {
                    read_unicode_escape(&mut self.src, buf, true)
                        .map_err(|kind| self.error(kind))?;
                }
            }
            _ if !c.is_ascii() => {
                if !flags.expand {
                    buf.push(b'\\');
                }
                self.push_char(ctx, c, buf)?;
            }
            _ if flags.regexp => {
                if matches!(c, b'c' | b'C' | b'M') {
                    self.src.unget(Some(c));
                    let byte = read_escape(&mut self.src, EscapeFlags::default())
                        .map_err(|kind| self.error(kind))?;
                    buf.extend_from_slice(format!("\\x{byte:02X}").as_bytes());
                } else if c == term && !SIMPLE_REGEXP_META.contains(&c) {
                    buf.push(c);
                } else {
                    buf.push(b'\\');
                    buf.push(c);
                }
            }
            _ if flags.expand => {
                self.src.unget(Some(c));
                let byte = read_escape(&mut self.src, EscapeFlags::default())
                    .map_err(|kind| self.error(kind))?;
                buf.push(byte);
            }
            _ if flags.words && is_space(c) => buf.push(c),
            _ if c == term || paren == Some(c) => buf.push(c),
            _ => {
                buf.push(b'\\');
                buf.push(c);
            }
        }
        Ok(())
    }

    /// Reads a `?` (already consumed): a character literal or the ternary
    /// operator.
    pub(super) fn question(&mut self, ctx: &mut ParserContext) -> Result<Token, LexError> {
        if self.is_end() {
            self.state = LexState::VALUE;
            return Ok(self.token(TokenKind::Question));
        }
        let Some(c) = self.src.advance() else {
            return Err(self.error(LexErrorKind::InvalidCharacterLiteral));
        };
        if is_space(c) {
            self.src.unget(Some(c));
            self.state = LexState::VALUE;
            return Ok(self.token(TokenKind::Question));
        }
        if (c.is_ascii_alphanumeric() || c == b'_')
            && self.src.peek(0).is_some_and(Encoding::is_ident_byte)
        {
            if self.space_seen {
                let word_end = self
                    .src
                    .rest_of_line()
                    .iter()
                    .position(|&b| !Encoding::is_ident_byte(b))
                    .unwrap_or(self.src.rest_of_line().len());
                let word = String::from_utf8_lossy(&self.src.rest_of_line()[..word_end]);
                ctx.warn(
                    DiagnosticCategory::AmbiguousOperator,
                    format!(
                        "'?' just followed by '{}{word}' is interpreted as a conditional \
                         operator, put a space after '?'",
                        char::from(c)
                    ),
                    self.src.current_span(),
                );
            }
            self.src.unget(Some(c));
            self.state = LexState::VALUE;
            return Ok(self.token(TokenKind::Question));
        }

        let mut bytes = Vec::new();
        if c == b'\\' {
            match self.src.peek(0) {
                Some(b'u') => {
                    self.src.skip(1);
                    read_unicode_escape(&mut self.src, &mut bytes, false)
                        .map_err(|kind| self.error(kind))?;
                }
                Some(b) if !b.is_ascii() => {
                    self.src.skip(1);
                    self.push_char(ctx, b, &mut bytes)?;
                }
                _ => {
                    let byte = read_escape(&mut self.src, EscapeFlags::default())
                        .map_err(|kind| self.error(kind))?;
                    bytes.push(byte);
                }
            }
        } else {
            self.push_char(ctx, c, &mut bytes)?;
        }
        self.state = LexState::END;
        Ok(self.token(TokenKind::Char(bytes)))
    }

    /// Reads a `%` (already consumed): a percent literal or the modulo
    /// operator.
    pub(super) fn percent(&mut self, ctx: &mut ParserContext) -> Result<Token, LexError> {
        if self.is_beg() {
            let c = self.src.advance();
            return self.percent_literal(c);
        }
        let next = self.src.peek(0);
        if next == Some(b'=') {
            self.src.skip(1);
            self.state = LexState::BEG;
            return Ok(self.token(TokenKind::OpAssign("%".into())));
        }
        if self.is_space_arg(next) || (self.state.is_in(LexState::FITEM) && next == Some(b's')) {
            let c = self.src.advance();
            return self.percent_literal(c);
        }
        self.state = self.operator_state();
        let kind = self.warn_balanced(ctx, TokenKind::Percent, "%", "string literal", next);
        Ok(self.token(kind))
    }

    /// Opens a percent literal; `c` is the byte after `%`.
    fn percent_literal(&mut self, c: Option<u8>) -> Result<Token, LexError> {
        let Some(c) = c else {
            return Err(self.error(LexErrorKind::UnterminatedPercentLiteral));
        };
        let (kind_char, open) = if c.is_ascii_alphanumeric() {
            match self.src.advance() {
                None => return Err(self.error(LexErrorKind::UnterminatedPercentLiteral)),
                Some(open) if open.is_ascii_alphanumeric() || !open.is_ascii() => {
                    return Err(self.error(LexErrorKind::UnknownPercentLiteral));
                }
                Some(open) => (c, open),
            }
        } else if c.is_ascii() {
            (b'Q', c)
        } else {
            return Err(self.error(LexErrorKind::UnknownPercentLiteral));
        };
        let (term, paren) = match closing_pair(open) {
            Some(close) => (close, Some(open)),
            None => (open, None),
        };
        let (flags, kind) = match kind_char {
            b'Q' => (LiteralFlags::DOUBLE_QUOTED, TokenKind::StringBegin),
            b'q' => (LiteralFlags::SINGLE_QUOTED, TokenKind::StringBegin),
            b'W' => (LiteralFlags::EXPANDED_WORDS, TokenKind::WordsBegin),
            b'w' => (LiteralFlags::WORDS, TokenKind::QWordsBegin),
            b'I' => (LiteralFlags::EXPANDED_WORDS, TokenKind::SymbolsBegin),
            b'i' => (LiteralFlags::WORDS, TokenKind::QSymbolsBegin),
            b'x' => (LiteralFlags::DOUBLE_QUOTED, TokenKind::XStringBegin),
            b'r' => (LiteralFlags::REGEXP, TokenKind::RegexpBegin),
            b's' => {
                self.state = LexState::FNAME | LexState::FITEM;
                (LiteralFlags::SINGLE_QUOTED_SYMBOL, TokenKind::SymbolBegin)
            }
            _ => return Err(self.error(LexErrorKind::UnknownPercentLiteral)),
        };
        self.literals.push(Frame::quoted(flags, term, paren));
        Ok(self.token(kind))
    }
}

/// Returns true if `b` may start an identifier.
fn starts_name(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphabetic() || !b.is_ascii()
}
