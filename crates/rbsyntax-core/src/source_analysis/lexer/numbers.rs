// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Numeric literals.
//!
//! Integers may carry a radix prefix (`0x`, `0b`, `0o`, `0d`, or a bare
//! leading `0` for octal) and single underscores between digits. Any number
//! may end in `r` (rational) and then `i` (imaginary); floats with an
//! exponent cannot be rational.

use num_bigint::BigInt;
use num_traits::Zero;

use super::Lexer;
use super::identifiers::SUFFIX_KEYWORDS;
use crate::source_analysis::encoding::Encoding;
use crate::source_analysis::numeric::{NumericLiteral, NumericValue, Rational};
use crate::source_analysis::{
    DiagnosticCategory, LexError, LexErrorKind, LexState, ParserContext, Token, TokenKind,
};

impl Lexer<'_> {
    /// Reads a number whose first byte (a digit, or `+` before a digit) has
    /// been consumed.
    pub(super) fn number(&mut self, ctx: &mut ParserContext, first: u8) -> Result<Token, LexError> {
        self.state = LexState::END;
        let first = if first == b'+' {
            match self.src.advance() {
                Some(d) => d,
                None => return Err(self.error(LexErrorKind::NumericWithoutDigits)),
            }
        } else {
            first
        };
        if first == b'0' {
            let next = self.src.advance();
            match next {
                Some(b'x' | b'X') => return self.radix_number(16),
                Some(b'b' | b'B') => return self.radix_number(2),
                Some(b'd' | b'D') => return self.radix_number(10),
                Some(b'o' | b'O') => {
                    if !self.src.peek(0).is_some_and(|b| b.is_ascii_digit()) {
                        return Err(self.error(LexErrorKind::NumericWithoutDigits));
                    }
                    return self.octal_number();
                }
                Some(b'_' | b'0'..=b'7') => {
                    self.src.unget(next);
                    return self.octal_number();
                }
                Some(b'8' | b'9') => return Err(self.error(LexErrorKind::InvalidOctalDigit)),
                Some(b'.' | b'e' | b'E') => self.src.unget(next),
                _ => {
                    self.src.unget(next);
                    return self.integer(BigInt::zero());
                }
            }
        }
        self.decimal(ctx, first)
    }

    /// Reads the digits after `0x`, `0b` or `0d`.
    fn radix_number(&mut self, radix: u32) -> Result<Token, LexError> {
        if !self.src.peek(0).is_some_and(|b| char::from(b).is_digit(radix)) {
            return Err(self.error(LexErrorKind::NumericWithoutDigits));
        }
        let digits = self.digits(|b| char::from(b).is_digit(radix))?;
        self.integer(parse_integer(&digits, radix))
    }

    /// Reads octal digits after `0`, `0_` or `0o`.
    fn octal_number(&mut self) -> Result<Token, LexError> {
        let digits = self.digits(|b| b.is_ascii_digit())?;
        if digits.iter().any(|&b| b > b'7') {
            return Err(self.error(LexErrorKind::InvalidOctalDigit));
        }
        if digits.is_empty() {
            return self.integer(BigInt::zero());
        }
        self.integer(parse_integer(&digits, 8))
    }

    /// Reads a digit run allowing single underscores between digits.
    fn digits(&mut self, is_digit: impl Fn(u8) -> bool) -> Result<Vec<u8>, LexError> {
        let mut digits = Vec::new();
        let mut underscore = false;
        while let Some(b) = self.src.peek(0) {
            if b == b'_' {
                if underscore {
                    break;
                }
                underscore = true;
            } else if is_digit(b) {
                underscore = false;
                digits.push(b);
            } else {
                break;
            }
            self.src.skip(1);
        }
        if underscore {
            return Err(self.error(LexErrorKind::TrailingCharInNumber('_')));
        }
        Ok(digits)
    }

    /// Reads a decimal integer or float.
    fn decimal(&mut self, ctx: &mut ParserContext, first: u8) -> Result<Token, LexError> {
        let mut text = String::from(char::from(first));
        let mut seen_point = false;
        let mut seen_exponent = false;
        let mut pending: Option<u8> = None;
        loop {
            let c = self.src.advance();
            match c {
                Some(d @ b'0'..=b'9') => {
                    pending = None;
                    text.push(char::from(d));
                }
                Some(b'.') => {
                    if let Some(p) = pending {
                        self.src.unget(c);
                        return Err(self.error(LexErrorKind::TrailingCharInNumber(char::from(p))));
                    }
                    if seen_point
                        || seen_exponent
                        || !self.src.peek(0).is_some_and(|b| b.is_ascii_digit())
                    {
                        self.src.unget(c);
                        break;
                    }
                    seen_point = true;
                    text.push('.');
                }
                Some(b'e' | b'E') => {
                    if let Some(p) = pending {
                        self.src.unget(c);
                        return Err(self.error(LexErrorKind::TrailingCharInNumber(char::from(p))));
                    }
                    let next = self.src.peek(0);
                    if seen_exponent
                        || !next.is_some_and(|b| b == b'+' || b == b'-' || b.is_ascii_digit())
                    {
                        self.src.unget(c);
                        break;
                    }
                    seen_exponent = true;
                    text.push('e');
                    if let Some(sign @ (b'+' | b'-')) = next {
                        self.src.skip(1);
                        text.push(char::from(sign));
                        pending = Some(sign);
                    }
                }
                Some(b'_') => {
                    if pending.is_some() {
                        self.src.unget(c);
                        break;
                    }
                    pending = Some(b'_');
                }
                _ => {
                    self.src.unget(c);
                    break;
                }
            }
        }
        if let Some(p) = pending {
            return Err(self.error(LexErrorKind::TrailingCharInNumber(char::from(p))));
        }

        if !seen_point && !seen_exponent {
            return self.integer(parse_integer(text.as_bytes(), 10));
        }
        let (rational, imaginary) = self.number_suffix(!seen_exponent);
        let value = if rational {
            let Some(r) = Rational::from_decimal(&text) else {
                return Err(self.error(LexErrorKind::InvalidFraction));
            };
            NumericValue::Rational(r)
        } else {
            let value: f64 = text.parse().unwrap_or(f64::INFINITY);
            if value.is_infinite() {
                ctx.warn(
                    DiagnosticCategory::FloatOutOfRange,
                    format!("Float {text} out of range"),
                    self.src.current_span(),
                );
            }
            NumericValue::Float(value)
        };
        self.finish_number(NumericLiteral { value, imaginary })
    }

    fn integer(&mut self, value: BigInt) -> Result<Token, LexError> {
        let (rational, imaginary) = self.number_suffix(true);
        let value = if rational {
            NumericValue::Rational(Rational::from_integer(value))
        } else {
            NumericValue::Integer(value)
        };
        self.finish_number(NumericLiteral { value, imaginary })
    }

    /// Reads an `r`, `i` or `ri` suffix. A suffix followed by more word
    /// characters is not a suffix (`1if`).
    fn number_suffix(&mut self, allow_rational: bool) -> (bool, bool) {
        let start = self.src.checkpoint();
        let mut rational = false;
        let mut imaginary = false;
        loop {
            match self.src.peek(0) {
                Some(b'r') if allow_rational && !rational && !imaginary => {
                    rational = true;
                    self.src.skip(1);
                }
                Some(b'i') if !imaginary => {
                    imaginary = true;
                    self.src.skip(1);
                }
                Some(b) if b != b'_' && !b.is_ascii_digit() && Encoding::is_ident_byte(b) => {
                    self.src.restore(start);
                    return (false, false);
                }
                _ => return (rational, imaginary),
            }
        }
    }

    /// Rejects a number running into word characters, unless they form a
    /// keyword (`1if x`).
    fn finish_number(&mut self, literal: NumericLiteral) -> Result<Token, LexError> {
        let rest = self.src.rest_of_line();
        if let Some(&next) = rest.first() {
            if Encoding::is_ident_byte(next) {
                let len = rest
                    .iter()
                    .position(|&b| !Encoding::is_ident_byte(b))
                    .unwrap_or(rest.len());
                if !SUFFIX_KEYWORDS.contains(&&rest[..len]) {
                    return Err(self.error(LexErrorKind::TrailingCharInNumber(char::from(next))));
                }
            }
        }
        Ok(self.token(TokenKind::Numeric(literal)))
    }
}

fn parse_integer(digits: &[u8], radix: u32) -> BigInt {
    BigInt::parse_bytes(digits, radix).unwrap_or_default()
}
