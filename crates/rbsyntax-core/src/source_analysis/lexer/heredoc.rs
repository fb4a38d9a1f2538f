// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Here documents.
//!
//! The body of a heredoc starts on the line after its introducer, but the
//! rest of the introducer's line is tokenized after the body. The lexer
//! saves a checkpoint after `<<ID`, reads body lines from the following
//! lines, and resumes at the checkpoint once the terminator is found.
//! Because the source hands out lines sequentially, the line after the
//! terminator is the next one fetched when the opening line runs out, and
//! several heredocs opened on one line are read one after another.

use tracing::debug;

use super::Lexer;
use super::identifiers::name;
use super::strings::{Step, content};
use crate::source_analysis::encoding::Encoding;
use crate::source_analysis::escape::{EscapeFlags, read_escape, read_unicode_escape};
use crate::source_analysis::terminator::{
    Frame, FrameMode, Heredoc, HeredocIndent, LiteralFlags,
};
use crate::source_analysis::{LexError, LexErrorKind, LexState, ParserContext, Token, TokenKind};

impl Lexer<'_> {
    /// Tries to read a heredoc introducer after `<<` (already consumed).
    ///
    /// Returns `None`, with the cursor restored, if no identifier follows.
    pub(super) fn heredoc_start(&mut self, ctx: &ParserContext) -> Result<Option<Token>, LexError> {
        let mut c = self.src.advance();
        let indent = match c {
            Some(b'-') => HeredocIndent::Dash,
            Some(b'~') => HeredocIndent::Squiggly,
            _ => HeredocIndent::None,
        };
        if indent != HeredocIndent::None {
            c = self.src.advance();
        }
        let mut identifier = Vec::new();
        let (flags, kind) = match c {
            Some(quote @ (b'\'' | b'"' | b'`')) => {
                loop {
                    match self.src.advance() {
                        Some(b) if b == quote => break,
                        None | Some(b'\n' | b'\r') => {
                            return Err(self.error(LexErrorKind::UnterminatedHeredocIdentifier));
                        }
                        Some(b) => identifier.push(b),
                    }
                }
                match quote {
                    b'\'' => (LiteralFlags::SINGLE_QUOTED, TokenKind::StringBegin),
                    b'"' => (LiteralFlags::DOUBLE_QUOTED, TokenKind::StringBegin),
                    _ => (LiteralFlags::DOUBLE_QUOTED, TokenKind::XStringBegin),
                }
            }
            Some(b) if Encoding::is_ident_byte(b) => {
                self.push_char(ctx, b, &mut identifier)?;
                self.read_ident_tail(ctx, &mut identifier)?;
                (LiteralFlags::DOUBLE_QUOTED, TokenKind::StringBegin)
            }
            _ => {
                self.src.unget(c);
                if indent != HeredocIndent::None {
                    self.src.unget(Some(b'-'));
                }
                return Ok(None);
            }
        };
        let token = self.token(kind);
        debug!(identifier = %name(&identifier), ?indent, span = %token.span(), "heredoc opened");
        let heredoc = Heredoc::new(identifier, indent, self.src.checkpoint(), token.span());
        self.src.goto_eol();
        self.literals.push(Frame::heredoc(flags, heredoc));
        Ok(Some(token))
    }

    /// Reads the next token of a heredoc body.
    pub(super) fn heredoc_token(
        &mut self,
        ctx: &ParserContext,
        flags: LiteralFlags,
        heredoc: &mut Heredoc,
        mode: &mut FrameMode,
    ) -> Result<Step, LexError> {
        loop {
            let mut line_start = heredoc.line_start;
            if heredoc.need_line {
                if !self.src.refill_line() {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedHeredoc(name(&heredoc.identifier)),
                        heredoc.opening,
                    ));
                }
                self.src.mark_token_start();
                if !heredoc.continuation && self.at_terminator(heredoc) {
                    self.src.goto_eol();
                    let dedent = match heredoc.indent {
                        HeredocIndent::Squiggly => Some(heredoc.min_indent.unwrap_or(0)),
                        HeredocIndent::None | HeredocIndent::Dash => None,
                    };
                    let token = self.token(TokenKind::HeredocEnd { dedent });
                    debug!(identifier = %name(&heredoc.identifier), ?dedent, "heredoc closed");
                    self.src.resume_at(heredoc.resume);
                    self.state = LexState::END;
                    return Ok(Step::Closed(token));
                }
                line_start = !heredoc.continuation;
                if line_start {
                    heredoc.record_line_indent(self.src.rest_of_line());
                }
                heredoc.need_line = false;
                heredoc.continuation = false;
            } else {
                self.src.mark_token_start();
            }

            if !flags.expand {
                let bytes = self.src.rest_of_line().to_vec();
                self.src.goto_eol();
                heredoc.need_line = true;
                heredoc.line_start = true;
                return Ok(Step::Open(self.token(content(bytes, line_start))));
            }

            let mut buf = Vec::new();
            if self.src.peek_is(0, b'#') {
                self.src.skip(1);
                if let Some(kind) = self.interpolation_start(mode) {
                    heredoc.line_start = false;
                    return Ok(Step::Open(self.token(kind)));
                }
                buf.push(b'#');
            }
            self.scan_heredoc_line(ctx, heredoc, &mut buf)?;
            heredoc.line_start = heredoc.need_line && !heredoc.continuation;
            if !buf.is_empty() {
                return Ok(Step::Open(self.token(content(buf, line_start))));
            }
        }
    }

    /// Returns true if the current line (cursor at its start) closes the
    /// heredoc.
    fn at_terminator(&self, heredoc: &Heredoc) -> bool {
        let line = self.src.rest_of_line();
        let line = line.strip_suffix(b"\n").unwrap_or(line);
        let line = if heredoc.indent == HeredocIndent::None {
            line
        } else {
            line.trim_ascii_start()
        };
        line == heredoc.identifier.as_slice()
    }

    /// Scans interpolating body content up to the end of the line or an
    /// interpolation.
    fn scan_heredoc_line(
        &mut self,
        ctx: &ParserContext,
        heredoc: &mut Heredoc,
        buf: &mut Vec<u8>,
    ) -> Result<(), LexError> {
        loop {
            if self.src.at_eol() {
                heredoc.need_line = true;
                return Ok(());
            }
            let Some(c) = self.src.advance() else {
                heredoc.need_line = true;
                return Ok(());
            };
            match c {
                b'\n' => {
                    buf.push(c);
                    heredoc.need_line = true;
                    return Ok(());
                }
                b'#' if matches!(self.src.peek(0), Some(b'{' | b'$' | b'@')) => {
                    self.src.unget(Some(c));
                    return Ok(());
                }
                b'\\' => match self.src.peek(0) {
                    Some(b'\n') => {
                        self.src.skip(1);
                        heredoc.need_line = true;
                        heredoc.continuation = true;
                        return Ok(());
                    }
                    Some(b'\\') => {
                        self.src.skip(1);
                        buf.push(b'\\');
                    }
                    Some(b'u') => {
                        self.src.skip(1);
                        read_unicode_escape(&mut self.src, buf, true)
                            .map_err(|kind| self.error(kind))?;
                    }
                    Some(b) if !b.is_ascii() => {
                        self.src.skip(1);
                        self.push_char(ctx, b, buf)?;
                    }
                    Some(_) => {
                        let byte = read_escape(&mut self.src, EscapeFlags::default())
                            .map_err(|kind| self.error(kind))?;
                        buf.push(byte);
                    }
                    None => buf.push(b'\\'),
                },
                _ if !c.is_ascii() => self.push_char(ctx, c, buf)?,
                _ => buf.push(c),
            }
        }
    }
}
