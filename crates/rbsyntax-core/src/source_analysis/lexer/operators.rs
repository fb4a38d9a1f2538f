// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Punctuation and operators.
//!
//! Most of these characters mean different things depending on the mode:
//! `*` is multiplication after an operand but a splat where an expression
//! begins, `[` indexes after an operand but opens an array elsewhere.

use super::{Lexer, is_space};
use crate::source_analysis::encoding::Encoding;
use crate::source_analysis::terminator::{Frame, FrameMode, LiteralFlags};
use crate::source_analysis::{
    DiagnosticCategory, LexError, LexErrorKind, LexState, ParserContext, Token, TokenKind,
};

impl Lexer<'_> {
    /// Reads the token starting with `c` (already consumed).
    pub(super) fn operator_or_word(
        &mut self,
        ctx: &mut ParserContext,
        c: u8,
    ) -> Result<Token, LexError> {
        let kind = match c {
            b'*' => self.star(ctx),
            b'!' => self.bang(),
            b'=' => self.equals(),
            b'<' => return self.less_than(ctx),
            b'>' => self.greater_than(),
            b'"' => self.open_quoted(LiteralFlags::DOUBLE_QUOTED, b'"'),
            b'\'' => self.open_quoted(LiteralFlags::SINGLE_QUOTED, b'\''),
            b'`' => self.backtick(),
            b'?' => return self.question(ctx),
            b'&' => self.ampersand(ctx),
            b'|' => self.pipe(),
            b'+' => return self.plus(ctx),
            b'-' => self.minus(ctx),
            b'.' => self.dot(ctx)?,
            b'0'..=b'9' => return self.number(ctx, c),
            b')' => {
                self.close_paren();
                self.state = LexState::ENDFN;
                TokenKind::RParen
            }
            b']' => {
                self.close_paren();
                self.state = LexState::END;
                TokenKind::RBracket
            }
            b'}' => self.close_brace(),
            b':' => self.colon(ctx),
            b'/' => self.slash(ctx),
            b'^' => {
                if self.src.peek_is(0, b'=') {
                    self.src.skip(1);
                    self.state = LexState::BEG;
                    TokenKind::OpAssign("^".into())
                } else {
                    self.state = self.operator_state();
                    TokenKind::Caret
                }
            }
            b';' => {
                self.state = LexState::BEG;
                self.command_start = true;
                TokenKind::Semicolon
            }
            b',' => {
                self.state = LexState::BEG | LexState::LABEL;
                TokenKind::Comma
            }
            b'~' => {
                if self.is_after_operator() {
                    if self.src.peek_is(0, b'@') {
                        self.src.skip(1);
                    }
                    self.state = LexState::ARG;
                } else {
                    self.state = LexState::BEG;
                }
                TokenKind::Tilde
            }
            b'(' => self.open_paren(),
            b'[' => self.open_bracket(),
            b'{' => self.open_brace(),
            b'%' => return self.percent(ctx),
            b'$' => return self.global_variable(ctx),
            b'@' => return self.instance_variable(ctx),
            _ if Encoding::is_ident_byte(c) => return self.identifier(ctx, c),
            _ => {
                let shown = if c.is_ascii_graphic() {
                    char::from(c).to_string()
                } else {
                    format!("\\x{c:02X}")
                };
                return Err(self.error(LexErrorKind::InvalidCharacter(shown.into())));
            }
        };
        Ok(self.token(kind))
    }

    fn star(&mut self, ctx: &mut ParserContext) -> TokenKind {
        let double = self.src.peek_is(0, b'*');
        if double {
            self.src.skip(1);
        }
        let op = if double { "**" } else { "*" };
        if self.src.peek_is(0, b'=') {
            self.src.skip(1);
            self.state = LexState::BEG;
            return TokenKind::OpAssign(op.into());
        }
        let next = self.src.peek(0);
        let (prefix, binary) = if double {
            (TokenKind::DoubleSplat, TokenKind::Pow)
        } else {
            (TokenKind::Splat, TokenKind::Star)
        };
        let kind = if self.is_space_arg(next) {
            ctx.warn(
                DiagnosticCategory::AmbiguousOperator,
                format!("'{op}' interpreted as argument prefix"),
                self.src.current_span(),
            );
            prefix
        } else if self.is_beg() {
            prefix
        } else {
            self.warn_balanced(ctx, binary, op, "argument prefix", next)
        };
        self.state = self.operator_state();
        kind
    }

    fn bang(&mut self) -> TokenKind {
        let next = self.src.peek(0);
        if self.is_after_operator() {
            self.state = LexState::ARG;
            if next == Some(b'@') {
                self.src.skip(1);
                return TokenKind::Bang;
            }
        } else {
            self.state = LexState::BEG;
        }
        match next {
            Some(b'=') => {
                self.src.skip(1);
                TokenKind::NotEq
            }
            Some(b'~') => {
                self.src.skip(1);
                TokenKind::NotMatch
            }
            _ => TokenKind::Bang,
        }
    }

    fn equals(&mut self) -> TokenKind {
        self.state = self.operator_state();
        match self.src.peek(0) {
            Some(b'=') => {
                self.src.skip(1);
                if self.src.peek_is(0, b'=') {
                    self.src.skip(1);
                    TokenKind::EqEqEq
                } else {
                    TokenKind::EqEq
                }
            }
            Some(b'~') => {
                self.src.skip(1);
                TokenKind::Match
            }
            Some(b'>') => {
                self.src.skip(1);
                TokenKind::Assoc
            }
            _ => TokenKind::Assign,
        }
    }

    fn less_than(&mut self, ctx: &mut ParserContext) -> Result<Token, LexError> {
        if self.src.peek_is(0, b'<')
            && !self.state.is_in(LexState::DOT | LexState::CLASS)
            && !self.is_end()
            && (!self.is_arg() || self.state.is_in(LexState::LABELED) || self.space_seen)
        {
            self.src.skip(1);
            if let Some(token) = self.heredoc_start(ctx)? {
                return Ok(token);
            }
            self.src.unget(Some(b'<'));
        }
        if self.is_after_operator() {
            self.state = LexState::ARG;
        } else {
            if self.state.is_in(LexState::CLASS) {
                self.command_start = true;
            }
            self.state = LexState::BEG;
        }
        let kind = match self.src.peek(0) {
            Some(b'=') => {
                self.src.skip(1);
                if self.src.peek_is(0, b'>') {
                    self.src.skip(1);
                    TokenKind::Cmp
                } else {
                    TokenKind::Le
                }
            }
            Some(b'<') => {
                self.src.skip(1);
                if self.src.peek_is(0, b'=') {
                    self.src.skip(1);
                    self.state = LexState::BEG;
                    TokenKind::OpAssign("<<".into())
                } else {
                    let next = self.src.peek(0);
                    self.warn_balanced(ctx, TokenKind::LShift, "<<", "here document", next)
                }
            }
            _ => TokenKind::Lt,
        };
        Ok(self.token(kind))
    }

    fn greater_than(&mut self) -> TokenKind {
        self.state = self.operator_state();
        match self.src.peek(0) {
            Some(b'=') => {
                self.src.skip(1);
                TokenKind::Ge
            }
            Some(b'>') => {
                self.src.skip(1);
                if self.src.peek_is(0, b'=') {
                    self.src.skip(1);
                    self.state = LexState::BEG;
                    TokenKind::OpAssign(">>".into())
                } else {
                    TokenKind::RShift
                }
            }
            _ => TokenKind::Gt,
        }
    }

    fn open_quoted(&mut self, flags: LiteralFlags, term: u8) -> TokenKind {
        let flags = if self.is_label_possible() {
            flags.with_label()
        } else {
            flags
        };
        self.literals.push(Frame::quoted(flags, term, None));
        TokenKind::StringBegin
    }

    fn backtick(&mut self) -> TokenKind {
        if self.state.is_in(LexState::FNAME) {
            self.state = LexState::ENDFN;
            return TokenKind::Backtick;
        }
        if self.state.is_in(LexState::DOT) {
            self.state = if self.cmd_state {
                LexState::CMDARG
            } else {
                LexState::ARG
            };
            return TokenKind::Backtick;
        }
        self.literals
            .push(Frame::quoted(LiteralFlags::DOUBLE_QUOTED, b'`', None));
        TokenKind::XStringBegin
    }

    fn ampersand(&mut self, ctx: &mut ParserContext) -> TokenKind {
        match self.src.peek(0) {
            Some(b'&') => {
                self.src.skip(1);
                self.state = LexState::BEG;
                if self.src.peek_is(0, b'=') {
                    self.src.skip(1);
                    return TokenKind::OpAssign("&&".into());
                }
                return TokenKind::AndAnd;
            }
            Some(b'=') => {
                self.src.skip(1);
                self.state = LexState::BEG;
                return TokenKind::OpAssign("&".into());
            }
            Some(b'.') => {
                self.src.skip(1);
                self.state = LexState::DOT;
                return TokenKind::AndDot;
            }
            _ => {}
        }
        let next = self.src.peek(0);
        let kind = if self.is_space_arg(next) {
            // `foo &:sym` is idiomatic; only warn for other operands.
            let symbol_follows = next == Some(b':')
                && self
                    .src
                    .peek(1)
                    .is_some_and(|b| b == b'"' || b == b'\'' || Encoding::is_ident_byte(b));
            if !symbol_follows {
                ctx.warn(
                    DiagnosticCategory::AmbiguousOperator,
                    "'&' interpreted as argument prefix",
                    self.src.current_span(),
                );
            }
            TokenKind::BlockPass
        } else if self.is_beg() {
            TokenKind::BlockPass
        } else {
            self.warn_balanced(ctx, TokenKind::Amper, "&", "argument prefix", next)
        };
        self.state = self.operator_state();
        kind
    }

    fn pipe(&mut self) -> TokenKind {
        if self.src.peek_is(0, b'|') {
            self.src.skip(1);
            self.state = LexState::BEG;
            if self.src.peek_is(0, b'=') {
                self.src.skip(1);
                return TokenKind::OpAssign("||".into());
            }
            if self.last_state.is_in(LexState::BEG) {
                // `{ || ... }`: empty block parameters, read as two pipes.
                self.src.unget(Some(b'|'));
                return TokenKind::Pipe;
            }
            return TokenKind::OrOr;
        }
        if self.src.peek_is(0, b'=') {
            self.src.skip(1);
            self.state = LexState::BEG;
            return TokenKind::OpAssign("|".into());
        }
        self.state = if self.is_after_operator() {
            LexState::ARG
        } else {
            LexState::BEG | LexState::LABEL
        };
        TokenKind::Pipe
    }

    fn plus(&mut self, ctx: &mut ParserContext) -> Result<Token, LexError> {
        let next = self.src.peek(0);
        let kind = if self.is_after_operator() {
            self.state = LexState::ARG;
            if next == Some(b'@') {
                self.src.skip(1);
                TokenKind::UPlus
            } else {
                TokenKind::Plus
            }
        } else if next == Some(b'=') {
            self.src.skip(1);
            self.state = LexState::BEG;
            TokenKind::OpAssign("+".into())
        } else if self.is_beg()
            || (self.is_space_arg(next) && self.warn_ambiguous_argument(ctx, "+"))
        {
            self.state = LexState::BEG;
            if next.is_some_and(|b| b.is_ascii_digit()) {
                return self.number(ctx, b'+');
            }
            TokenKind::UPlus
        } else {
            self.state = LexState::BEG;
            self.warn_balanced(ctx, TokenKind::Plus, "+", "unary operator", next)
        };
        Ok(self.token(kind))
    }

    fn minus(&mut self, ctx: &mut ParserContext) -> TokenKind {
        let next = self.src.peek(0);
        if self.is_after_operator() {
            self.state = LexState::ARG;
            if next == Some(b'@') {
                self.src.skip(1);
                return TokenKind::UMinus;
            }
            return TokenKind::Minus;
        }
        match next {
            Some(b'=') => {
                self.src.skip(1);
                self.state = LexState::BEG;
                return TokenKind::OpAssign("-".into());
            }
            Some(b'>') => {
                self.src.skip(1);
                self.state = LexState::ENDFN;
                self.lambda_saved.push(self.lambda_base);
                self.lambda_base = Some(self.paren_nest);
                return TokenKind::Arrow;
            }
            _ => {}
        }
        let prefix =
            self.is_beg() || (self.is_space_arg(next) && self.warn_ambiguous_argument(ctx, "-"));
        self.state = LexState::BEG;
        if prefix {
            if next.is_some_and(|b| b.is_ascii_digit()) {
                return TokenKind::UMinusNum;
            }
            return TokenKind::UMinus;
        }
        self.warn_balanced(ctx, TokenKind::Minus, "-", "unary operator", next)
    }

    fn dot(&mut self, ctx: &mut ParserContext) -> Result<TokenKind, LexError> {
        let beg = self.is_beg();
        self.state = LexState::BEG;
        if self.src.peek_is(0, b'.') {
            self.src.skip(1);
            if self.src.peek_is(0, b'.') {
                self.src.skip(1);
                if self.in_argdef {
                    self.state = LexState::ENDARG;
                    return Ok(TokenKind::BeginlessDotDotDot);
                }
                if self.paren_nest == 0 && self.looking_at_eol() {
                    ctx.warn(
                        DiagnosticCategory::EndOfLineRange,
                        "... at EOL, should be parenthesized?",
                        self.src.current_span(),
                    );
                } else if self
                    .lambda_base
                    .is_some_and(|base| base + 1 == self.paren_nest)
                    && self.last_state.is_in(LexState::LABEL)
                {
                    return Ok(TokenKind::DotDotDot);
                }
                return Ok(if beg {
                    TokenKind::BeginlessDotDotDot
                } else {
                    TokenKind::DotDotDot
                });
            }
            return Ok(if beg {
                TokenKind::BeginlessDotDot
            } else {
                TokenKind::DotDot
            });
        }
        if self.src.peek(0).is_some_and(|b| b.is_ascii_digit()) {
            let column = self.src.location().column as usize;
            let before = column
                .checked_sub(2)
                .and_then(|i| self.src.current_line().get(i).copied());
            let kind = if before.is_some_and(|b| b.is_ascii_digit()) {
                LexErrorKind::InvalidFraction
            } else {
                LexErrorKind::LeadingDotFloat
            };
            return Err(self.error(kind));
        }
        self.state = LexState::DOT;
        Ok(TokenKind::Dot)
    }

    /// Returns true if only whitespace or a comment remains on the line.
    fn looking_at_eol(&self) -> bool {
        for &b in self.src.rest_of_line() {
            if b == b'\n' || b == b'#' {
                return true;
            }
            if !is_space(b) {
                return false;
            }
        }
        true
    }

    fn close_paren(&mut self) {
        self.cond.pop();
        self.cmdarg.pop();
        self.paren_nest -= 1;
    }

    fn close_brace(&mut self) -> TokenKind {
        if self.brace_nest == 0 {
            if let Some(frame) = self.literals.top_mut() {
                if let FrameMode::Interpolating { brace_nest } = frame.mode {
                    frame.mode = FrameMode::Body;
                    self.brace_nest = brace_nest;
                    self.cond.pop();
                    self.cmdarg.pop();
                    return TokenKind::StringDEnd;
                }
            }
        }
        self.brace_nest -= 1;
        self.close_paren();
        self.state = LexState::END;
        TokenKind::RBrace
    }

    fn open_paren(&mut self) -> TokenKind {
        let kind = if self.is_beg() {
            TokenKind::LParenBeg
        } else if !self.space_seen {
            TokenKind::LParen
        } else if self.is_arg() || self.state.has_all(LexState::END | LexState::LABEL) {
            TokenKind::LParenArg
        } else {
            TokenKind::LParen
        };
        self.open_nesting();
        self.state = LexState::BEG | LexState::LABEL;
        kind
    }

    fn open_nesting(&mut self) {
        self.paren_nest += 1;
        self.cond.push(false);
        self.cmdarg.push(false);
    }

    fn open_bracket(&mut self) -> TokenKind {
        if self.is_after_operator() {
            if self.src.peek_is(0, b']') {
                self.src.skip(1);
                self.state = LexState::ARG;
                if self.src.peek_is(0, b'=') {
                    self.src.skip(1);
                    return TokenKind::Aset;
                }
                return TokenKind::Aref;
            }
            self.open_nesting();
            self.state = LexState::ARG | LexState::LABEL;
            return TokenKind::LBracket;
        }
        let kind = if self.is_beg()
            || (self.is_arg() && (self.space_seen || self.state.is_in(LexState::LABELED)))
        {
            TokenKind::LBracketArray
        } else {
            TokenKind::LBracket
        };
        self.open_nesting();
        self.state = LexState::BEG | LexState::LABEL;
        kind
    }

    fn open_brace(&mut self) -> TokenKind {
        self.brace_nest += 1;
        let kind = if self.lambda_beginning() {
            self.enter_lambda_body();
            TokenKind::LambdaBegin
        } else if self.state.is_in(LexState::LABELED) {
            TokenKind::LBraceHash
        } else if self
            .state
            .is_in(LexState::ARG_ANY | LexState::END | LexState::ENDFN)
        {
            TokenKind::LBraceBlock
        } else if self.state.is_in(LexState::ENDARG) {
            TokenKind::LBraceArg
        } else {
            TokenKind::LBraceHash
        };
        self.open_nesting();
        if kind == TokenKind::LBraceHash {
            self.state = LexState::BEG | LexState::LABEL;
        } else {
            self.command_start = true;
            self.state = LexState::BEG;
        }
        kind
    }

    fn colon(&mut self, ctx: &mut ParserContext) -> TokenKind {
        let next = self.src.peek(0);
        if next == Some(b':') {
            self.src.skip(1);
            if self.is_beg() || self.state.is_in(LexState::CLASS) || self.is_space_arg(None) {
                self.state = LexState::BEG;
                return TokenKind::ColonColonPrefix;
            }
            self.state = LexState::DOT;
            return TokenKind::ColonColon;
        }
        if self.is_end() || next.is_some_and(is_space) || next == Some(b'#') {
            self.state = LexState::BEG;
            return self.warn_balanced(ctx, TokenKind::Colon, ":", "symbol literal", next);
        }
        match next {
            Some(b'"') => {
                self.src.skip(1);
                self.literals
                    .push(Frame::quoted(LiteralFlags::DOUBLE_QUOTED_SYMBOL, b'"', None));
            }
            Some(b'\'') => {
                self.src.skip(1);
                self.literals
                    .push(Frame::quoted(LiteralFlags::SINGLE_QUOTED_SYMBOL, b'\'', None));
            }
            _ => {}
        }
        self.state = LexState::FNAME;
        TokenKind::SymbolBegin
    }

    fn slash(&mut self, ctx: &mut ParserContext) -> TokenKind {
        if self.is_beg() {
            self.literals
                .push(Frame::quoted(LiteralFlags::REGEXP, b'/', None));
            return TokenKind::RegexpBegin;
        }
        if self.src.peek_is(0, b'=') {
            self.src.skip(1);
            self.state = LexState::BEG;
            return TokenKind::OpAssign("/".into());
        }
        let next = self.src.peek(0);
        if self.is_space_arg(next) {
            self.warn_ambiguous_argument(ctx, "/");
            self.literals
                .push(Frame::quoted(LiteralFlags::REGEXP, b'/', None));
            return TokenKind::RegexpBegin;
        }
        self.state = self.operator_state();
        self.warn_balanced(ctx, TokenKind::Slash, "/", "regexp literal", next)
    }
}
