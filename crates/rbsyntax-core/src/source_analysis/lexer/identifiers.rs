// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Identifiers, keywords, labels and sigiled variables.

use ecow::EcoString;

use super::Lexer;
use crate::source_analysis::encoding::Encoding;
use crate::source_analysis::keywords::{self, Keyword};
use crate::source_analysis::{LexError, LexErrorKind, LexState, ParserContext, Token, TokenKind};

/// Punctuation that names a special global (`$~`, `$;`, ...).
const SPECIAL_GLOBALS: &[u8] = b"~*$?!@/\\;,.=:<>\"";

/// Words a numeric literal may run straight into (`1if x`).
pub(super) const SUFFIX_KEYWORDS: &[&[u8]] = &[
    b"if", b"unless", b"while", b"until", b"and", b"or", b"then", b"do", b"else", b"elsif",
    b"end", b"ensure", b"in", b"rescue", b"when",
];

/// Builds a name from source bytes, replacing invalid UTF-8 (binary
/// sources only).
pub(super) fn name(bytes: &[u8]) -> EcoString {
    EcoString::from(String::from_utf8_lossy(bytes).as_ref())
}

/// Returns true if the name starts with an uppercase letter.
fn is_constant_name(word: &[u8]) -> bool {
    match word.first() {
        Some(b) if b.is_ascii() => b.is_ascii_uppercase(),
        Some(_) => std::str::from_utf8(word)
            .ok()
            .and_then(|s| s.chars().next())
            .is_some_and(char::is_uppercase),
        None => false,
    }
}

/// What follows an identifier's word characters.
enum Suffix {
    None,
    /// `?` or `!`
    Predicate,
    /// `=` in a method-name position (`def x=`)
    Setter,
}

impl Lexer<'_> {
    /// Reads further identifier characters into `out`.
    pub(super) fn read_ident_tail(
        &mut self,
        ctx: &ParserContext,
        out: &mut Vec<u8>,
    ) -> Result<(), LexError> {
        while let Some(b) = self.src.peek(0) {
            if !Encoding::is_ident_byte(b) {
                break;
            }
            self.src.skip(1);
            self.push_char(ctx, b, out)?;
        }
        Ok(())
    }

    /// Reads an identifier, constant, label or keyword starting with `first`.
    pub(super) fn identifier(
        &mut self,
        ctx: &mut ParserContext,
        first: u8,
    ) -> Result<Token, LexError> {
        let mut word = Vec::new();
        self.push_char(ctx, first, &mut word)?;
        self.read_ident_tail(ctx, &mut word)?;

        let mut suffix = Suffix::None;
        match self.src.peek(0) {
            Some(c @ (b'!' | b'?'))
                if !self.src.peek_is(1, b'=') || self.src.peek_is(2, b'=') =>
            {
                self.src.skip(1);
                word.push(c);
                suffix = Suffix::Predicate;
            }
            Some(b'=')
                if self.state.is_in(LexState::FNAME)
                    && !matches!(self.src.peek(1), Some(b'~' | b'>'))
                    && (!self.src.peek_is(1, b'=') || self.src.peek_is(2, b'>')) =>
            {
                self.src.skip(1);
                word.push(b'=');
                suffix = Suffix::Setter;
            }
            _ => {}
        }

        if self.is_label_possible() && self.src.peek_is(0, b':') && !self.src.peek_is(1, b':') {
            self.src.skip(1);
            self.state = LexState::ARG | LexState::LABELED;
            return Ok(self.token(TokenKind::Label(name(&word))));
        }

        if word.is_ascii() && !self.state.is_in(LexState::DOT) {
            if let Some(entry) = keywords::lookup(&word) {
                let keyword = self.keyword(entry);
                return Ok(self.token(TokenKind::Keyword(keyword)));
            }
        }

        let last_state = self.last_state;
        self.state = if self
            .state
            .is_in(LexState::BEG_ANY | LexState::ARG_ANY | LexState::DOT)
        {
            if self.cmd_state {
                LexState::CMDARG
            } else {
                LexState::ARG
            }
        } else if self.state.is_exactly(LexState::FNAME) {
            LexState::ENDFN
        } else {
            LexState::END
        };

        let kind = match suffix {
            Suffix::Predicate => TokenKind::MethodName(name(&word)),
            Suffix::Setter => TokenKind::Identifier(name(&word)),
            Suffix::None if is_constant_name(&word) => TokenKind::Constant(name(&word)),
            Suffix::None => {
                self.ident_may_be_local =
                    !last_state.is_in(LexState::DOT | LexState::FNAME);
                TokenKind::Identifier(name(&word))
            }
        };
        Ok(self.token(kind))
    }

    /// Chooses the keyword token for a reserved word and updates the mode.
    fn keyword(&mut self, entry: keywords::KeywordEntry) -> Keyword {
        let state = self.state;
        if state.is_in(LexState::FNAME) {
            // `def end`, `alias if unless`: method names, but still keywords
            // to the parser.
            self.state = LexState::ENDFN;
            return entry.keyword;
        }
        self.state = entry.state;
        if self.state.is_in(LexState::BEG) {
            self.command_start = true;
        }
        if entry.keyword == Keyword::Do {
            if self.lambda_beginning() {
                self.enter_lambda_body();
                return Keyword::DoLambda;
            }
            if self.cond.top() {
                return Keyword::DoCond;
            }
            if self.cmdarg.top() && !state.is_in(LexState::CMDARG) {
                return Keyword::DoBlock;
            }
            return Keyword::Do;
        }
        if state.is_in(LexState::BEG | LexState::LABELED | LexState::CLASS) {
            return entry.keyword;
        }
        if entry.has_modifier() {
            self.state = LexState::BEG | LexState::LABEL;
        }
        entry.modifier
    }

    /// Reads a global variable or regexp back-reference (the `$` has been
    /// consumed).
    pub(super) fn global_variable(&mut self, ctx: &ParserContext) -> Result<Token, LexError> {
        let last_state = self.last_state;
        self.state = LexState::END;
        let mut word = vec![b'$'];
        let c = self.src.advance();
        match c {
            Some(b'_') => {
                word.push(b'_');
                self.read_ident_tail(ctx, &mut word)?;
            }
            Some(p) if SPECIAL_GLOBALS.contains(&p) => word.push(p),
            Some(b'-') => {
                word.push(b'-');
                match self.src.advance() {
                    Some(b) if Encoding::is_ident_byte(b) => self.push_char(ctx, b, &mut word)?,
                    other => {
                        self.src.unget(other);
                        return Err(self.error(LexErrorKind::InvalidGlobalVariable("$-".into())));
                    }
                }
            }
            Some(r @ (b'&' | b'`' | b'\'' | b'+')) => {
                if last_state.is_in(LexState::FNAME) {
                    word.push(r);
                } else {
                    return Ok(self.token(TokenKind::BackRef(r)));
                }
            }
            Some(d @ b'1'..=b'9') => {
                word.push(d);
                while let Some(digit) = self.src.peek(0) {
                    if !digit.is_ascii_digit() {
                        break;
                    }
                    self.src.skip(1);
                    word.push(digit);
                }
                if !last_state.is_in(LexState::FNAME) {
                    // Out-of-range references are always nil.
                    let n = std::str::from_utf8(&word[1..])
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0);
                    return Ok(self.token(TokenKind::NthRef(n)));
                }
            }
            Some(b'0') => {
                word.push(b'0');
                if self.src.peek(0).is_some_and(Encoding::is_ident_byte) {
                    self.read_ident_tail(ctx, &mut word)?;
                    return Err(self.error(LexErrorKind::InvalidGlobalVariable(name(&word))));
                }
            }
            Some(b) if Encoding::is_ident_byte(b) => {
                self.push_char(ctx, b, &mut word)?;
                self.read_ident_tail(ctx, &mut word)?;
            }
            other => {
                self.src.unget(other);
                let shown = match other {
                    Some(b) if b.is_ascii_graphic() => format!("${}", char::from(b)),
                    _ => "$".to_string(),
                };
                return Err(self.error(LexErrorKind::InvalidGlobalVariable(shown.into())));
            }
        }
        Ok(self.token(TokenKind::GlobalVariable(name(&word))))
    }

    /// Reads an instance or class variable (the first `@` has been consumed).
    pub(super) fn instance_variable(&mut self, ctx: &ParserContext) -> Result<Token, LexError> {
        let mut word = vec![b'@'];
        let mut c = self.src.advance();
        let class_var = c == Some(b'@');
        if class_var {
            word.push(b'@');
            c = self.src.advance();
        }
        self.state = if self.last_state.is_in(LexState::FNAME) {
            LexState::ENDFN
        } else {
            LexState::END
        };
        let invalid = |word: &[u8]| {
            if class_var {
                LexErrorKind::InvalidClassVariable(name(word))
            } else {
                LexErrorKind::InvalidInstanceVariable(name(word))
            }
        };
        match c {
            Some(d) if d.is_ascii_digit() => {
                word.push(d);
                Err(self.error(invalid(&word)))
            }
            Some(b) if Encoding::is_ident_byte(b) => {
                self.push_char(ctx, b, &mut word)?;
                self.read_ident_tail(ctx, &mut word)?;
                let kind = if class_var {
                    TokenKind::ClassVariable(name(&word))
                } else {
                    TokenKind::InstanceVariable(name(&word))
                };
                Ok(self.token(kind))
            }
            other => {
                self.src.unget(other);
                Err(self.error(invalid(&word)))
            }
        }
    }
}
