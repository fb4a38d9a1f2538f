// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Backslash escape decoding.
//!
//! Called by the lexer after it has consumed a backslash inside an
//! interpolating literal or a character literal. The cursor is left just
//! past the escape.

use super::LexErrorKind;
use super::SourceBuffer;

/// Modifiers already applied to the escape being decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EscapeFlags {
    /// Inside `\M-`.
    pub meta: bool,
    /// Inside `\C-` or `\c`.
    pub control: bool,
}

/// Decodes one escape sequence (the backslash has been consumed) to a byte.
///
/// `\u` is not handled here; see [`read_unicode_escape`].
///
/// # Errors
///
/// Returns [`LexErrorKind::InvalidEscape`] for malformed `\x`, `\M-`, `\C-`
/// and `\c` sequences or end of input.
pub fn read_escape(src: &mut SourceBuffer<'_>, flags: EscapeFlags) -> Result<u8, LexErrorKind> {
    let Some(c) = src.advance() else {
        return Err(LexErrorKind::InvalidEscape);
    };
    let byte = match c {
        b'n' => b'\n',
        b't' => b'\t',
        b'r' => b'\r',
        b'f' => 0x0c,
        b'v' => 0x0b,
        b'a' => 0x07,
        b'e' => 0x1b,
        b'b' => 0x08,
        b's' => b' ',
        b'0'..=b'7' => {
            let mut value = u32::from(c - b'0');
            for _ in 0..2 {
                match src.peek(0) {
                    Some(d @ b'0'..=b'7') => {
                        value = value * 8 + u32::from(d - b'0');
                        src.skip(1);
                    }
                    _ => break,
                }
            }
            (value & 0xff) as u8
        }
        b'x' => {
            let (value, digits) = scan_hex(src, 2);
            if digits == 0 {
                return Err(LexErrorKind::InvalidEscape);
            }
            (value & 0xff) as u8
        }
        b'M' => {
            if flags.meta || src.advance() != Some(b'-') {
                return Err(LexErrorKind::InvalidEscape);
            }
            let inner = next_modified(src, EscapeFlags { meta: true, ..flags })?;
            inner | 0x80
        }
        b'C' => {
            if src.advance() != Some(b'-') {
                return Err(LexErrorKind::InvalidEscape);
            }
            read_control(src, flags)?
        }
        b'c' => read_control(src, flags)?,
        other => other,
    };
    Ok(byte)
}

fn read_control(src: &mut SourceBuffer<'_>, flags: EscapeFlags) -> Result<u8, LexErrorKind> {
    if flags.control {
        return Err(LexErrorKind::InvalidEscape);
    }
    if src.peek_is(0, b'?') {
        src.skip(1);
        return Ok(0x7f);
    }
    let inner = next_modified(
        src,
        EscapeFlags {
            control: true,
            ..flags
        },
    )?;
    Ok(inner & 0x9f)
}

/// Reads the character a `\M-` or `\C-` applies to, which may itself be an
/// escape.
fn next_modified(src: &mut SourceBuffer<'_>, flags: EscapeFlags) -> Result<u8, LexErrorKind> {
    match src.advance() {
        Some(b'\\') => {
            if src.peek_is(0, b'u') {
                return Err(LexErrorKind::InvalidEscape);
            }
            read_escape(src, flags)
        }
        Some(c) if c.is_ascii() => Ok(c),
        _ => Err(LexErrorKind::InvalidEscape),
    }
}

/// Reads up to `max` hex digits.
fn scan_hex(src: &mut SourceBuffer<'_>, max: usize) -> (u32, usize) {
    let mut value = 0u32;
    let mut digits = 0;
    while digits < max {
        let Some(d) = src.peek(0).and_then(|b| char::from(b).to_digit(16)) else {
            break;
        };
        value = value * 16 + d;
        digits += 1;
        src.skip(1);
    }
    (value, digits)
}

/// Decodes a `\u` escape (the `\u` has been consumed), appending UTF-8.
///
/// Accepts `\uXXXX` and `\u{X ...}`. With `allow_multiple`, the braced form
/// may hold several space-separated codepoints.
///
/// # Errors
///
/// Returns [`LexErrorKind::InvalidUnicodeEscape`] for malformed sequences and
/// [`LexErrorKind::InvalidCodepoint`] for values that are not Unicode scalar
/// values.
pub fn read_unicode_escape(
    src: &mut SourceBuffer<'_>,
    out: &mut Vec<u8>,
    allow_multiple: bool,
) -> Result<(), LexErrorKind> {
    if !src.peek_is(0, b'{') {
        let (value, digits) = scan_hex(src, 4);
        if digits < 4 {
            return Err(LexErrorKind::InvalidUnicodeEscape);
        }
        return push_codepoint(out, value);
    }
    src.skip(1);
    let mut count = 0;
    loop {
        while matches!(src.peek(0), Some(b' ' | b'\t')) {
            src.skip(1);
        }
        if src.peek_is(0, b'}') {
            src.skip(1);
            return Ok(());
        }
        if count > 0 && !allow_multiple {
            return Err(LexErrorKind::InvalidCharacterLiteral);
        }
        let (value, digits) = scan_hex(src, 7);
        if digits == 0 {
            return Err(LexErrorKind::InvalidUnicodeEscape);
        }
        if digits > 6 {
            return Err(LexErrorKind::InvalidCodepoint);
        }
        push_codepoint(out, value)?;
        count += 1;
        if !matches!(src.peek(0), Some(b' ' | b'\t' | b'}')) {
            return Err(LexErrorKind::InvalidUnicodeEscape);
        }
    }
}

fn push_codepoint(out: &mut Vec<u8>, value: u32) -> Result<(), LexErrorKind> {
    let c = char::from_u32(value).ok_or(LexErrorKind::InvalidCodepoint)?;
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape(input: &[u8]) -> Result<u8, LexErrorKind> {
        let mut src = SourceBuffer::from_bytes(input, 1);
        read_escape(&mut src, EscapeFlags::default())
    }

    fn unicode(input: &[u8], multiple: bool) -> Result<Vec<u8>, LexErrorKind> {
        let mut src = SourceBuffer::from_bytes(input, 1);
        src.refill_line();
        let mut out = Vec::new();
        read_unicode_escape(&mut src, &mut out, multiple).map(|()| out)
    }

    #[test]
    fn simple_escapes() {
        assert_eq!(escape(b"n"), Ok(b'\n'));
        assert_eq!(escape(b"e"), Ok(0x1b));
        assert_eq!(escape(b"s"), Ok(b' '));
        assert_eq!(escape(b"q"), Ok(b'q'));
    }

    #[test]
    fn octal_and_hex() {
        assert_eq!(escape(b"101"), Ok(b'A'));
        assert_eq!(escape(b"0"), Ok(0));
        assert_eq!(escape(b"x41"), Ok(b'A'));
        assert_eq!(escape(b"x4z"), Ok(4));
        assert_eq!(escape(b"xz"), Err(LexErrorKind::InvalidEscape));
    }

    #[test]
    fn control_and_meta() {
        assert_eq!(escape(b"ca"), Ok(0x01));
        assert_eq!(escape(b"C-a"), Ok(0x01));
        assert_eq!(escape(b"c?"), Ok(0x7f));
        assert_eq!(escape(b"M-a"), Ok(b'a' | 0x80));
        assert_eq!(escape(b"M-\\C-a"), Ok(0x81));
        assert_eq!(escape(b"M-\\M-a"), Err(LexErrorKind::InvalidEscape));
        assert_eq!(escape(b"Cx"), Err(LexErrorKind::InvalidEscape));
    }

    #[test]
    fn eof_is_invalid() {
        assert_eq!(escape(b""), Err(LexErrorKind::InvalidEscape));
    }

    #[test]
    fn unicode_forms() {
        assert_eq!(unicode(b"00e9", false), Ok("é".as_bytes().to_vec()));
        assert_eq!(unicode(b"{1F600}", false), Ok("😀".as_bytes().to_vec()));
        assert_eq!(unicode(b"{41 42}", true), Ok(b"AB".to_vec()));
        assert_eq!(unicode(b"{}", true), Ok(Vec::new()));
    }

    #[test]
    fn unicode_errors() {
        assert_eq!(unicode(b"12", false), Err(LexErrorKind::InvalidUnicodeEscape));
        assert_eq!(unicode(b"{D800}", true), Err(LexErrorKind::InvalidCodepoint));
        assert_eq!(unicode(b"{110000}", true), Err(LexErrorKind::InvalidCodepoint));
        assert_eq!(unicode(b"{41", true), Err(LexErrorKind::InvalidUnicodeEscape));
        assert_eq!(
            unicode(b"{41 42}", false),
            Err(LexErrorKind::InvalidCharacterLiteral)
        );
    }
}
