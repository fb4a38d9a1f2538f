// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Source encodings and magic comments.
//!
//! The lexer only needs two things from an encoding: whether a byte can
//! start or continue an identifier, and how many bytes the character at the
//! cursor occupies. Magic comments (`# encoding: ...`,
//! `# frozen_string_literal: true`, ...) are recognized here and applied to
//! the [`ParserContext`](super::ParserContext) by the lexer.

use std::fmt;

/// A supported source encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// UTF-8, the default.
    #[default]
    Utf8,
    /// Raw bytes (`ASCII-8BIT`, `BINARY`).
    Binary,
    /// 7-bit ASCII.
    UsAscii,
}

impl Encoding {
    /// Looks an encoding up by name, case-insensitively.
    ///
    /// Returns `None` for unknown names.
    #[must_use]
    pub fn find(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "utf-8" | "utf8" | "utf-8-mac" | "utf8-mac" | "cp65001" => Some(Self::Utf8),
            "ascii-8bit" | "binary" => Some(Self::Binary),
            "us-ascii" | "ascii" | "ansi_x3.4-1968" | "646" => Some(Self::UsAscii),
            _ => None,
        }
    }

    /// Returns the canonical name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Binary => "ASCII-8BIT",
            Self::UsAscii => "US-ASCII",
        }
    }

    /// Returns the byte length of the character starting at `bytes[0]`.
    ///
    /// Returns `None` if the bytes do not form a valid character.
    #[must_use]
    pub fn char_len(self, bytes: &[u8]) -> Option<usize> {
        let first = *bytes.first()?;
        if first.is_ascii() {
            return Some(1);
        }
        match self {
            Self::Binary => Some(1),
            Self::UsAscii => None,
            Self::Utf8 => {
                let len = match first {
                    0xC2..=0xDF => 2,
                    0xE0..=0xEF => 3,
                    0xF0..=0xF4 => 4,
                    _ => return None,
                };
                let candidate = bytes.get(..len)?;
                std::str::from_utf8(candidate).ok().map(str::len)
            }
        }
    }

    /// Returns true if `byte` may appear in an identifier.
    ///
    /// Every non-ASCII byte counts; multibyte validity is checked separately
    /// with [`char_len`](Self::char_len).
    #[must_use]
    pub const fn is_ident_byte(byte: u8) -> bool {
        byte.is_ascii_alphanumeric() || byte == b'_' || !byte.is_ascii()
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The `shareable_constant_value` magic comment setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShareableConstantValue {
    /// Constants are not made shareable.
    #[default]
    None,
    /// Literal constant values are deeply frozen.
    Literal,
    /// Values are made shareable by copying.
    ExperimentalCopy,
    /// All values are made shareable.
    ExperimentalEverything,
}

impl ShareableConstantValue {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "literal" => Some(Self::Literal),
            "experimental_copy" => Some(Self::ExperimentalCopy),
            "experimental_everything" => Some(Self::ExperimentalEverything),
            _ => None,
        }
    }
}

/// A recognized magic comment key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagicKey {
    /// `encoding` / `coding`.
    Encoding,
    /// `frozen_string_literal`.
    FrozenStringLiteral,
    /// `shareable_constant_value`.
    ShareableConstantValue,
    /// `warn_indent`.
    WarnIndent,
}

impl MagicKey {
    /// Normalizes a key: case-insensitive, `-` and `_` equivalent.
    fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .map(|c| if c == '-' { '_' } else { c.to_ascii_lowercase() })
            .collect();
        match normalized.as_str() {
            "encoding" | "coding" => Some(Self::Encoding),
            "frozen_string_literal" => Some(Self::FrozenStringLiteral),
            "shareable_constant_value" => Some(Self::ShareableConstantValue),
            "warn_indent" => Some(Self::WarnIndent),
            _ => None,
        }
    }

    /// Returns the canonical key name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Encoding => "encoding",
            Self::FrozenStringLiteral => "frozen_string_literal",
            Self::ShareableConstantValue => "shareable_constant_value",
            Self::WarnIndent => "warn_indent",
        }
    }
}

/// A decoded magic comment setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MagicSetting {
    /// Switch the source encoding.
    Encoding(String),
    /// Freeze plain string literals.
    FrozenStringLiteral(bool),
    /// Constant shareability.
    ShareableConstantValue(ShareableConstantValue),
    /// Toggle indentation warnings.
    WarnIndent(bool),
}

/// The outcome of reading one `key: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MagicComment {
    /// A recognized key with a valid value.
    Setting(MagicSetting),
    /// A recognized key with a value it does not accept.
    InvalidValue {
        /// The key.
        key: MagicKey,
        /// The rejected value.
        value: String,
    },
}

/// The magic comment settings in effect after lexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MagicComments {
    /// `frozen_string_literal`, if set.
    pub frozen_string_literal: Option<bool>,
    /// `shareable_constant_value`.
    pub shareable_constant_value: ShareableConstantValue,
    /// `warn_indent`, if set.
    pub warn_indent: Option<bool>,
}

/// Parses the text of a comment (without the leading `#`) as magic comments.
///
/// Both the plain `key: value` form and the emacs `-*- key: value; ... -*-`
/// form are accepted. Unknown keys are skipped.
#[must_use]
pub fn parse_magic_comment(comment: &[u8]) -> Vec<MagicComment> {
    let Ok(text) = std::str::from_utf8(comment) else {
        return Vec::new();
    };
    let text = text.trim();
    let body = match (text.find("-*-"), text.rfind("-*-")) {
        (Some(open), Some(close)) if close > open => &text[open + 3..close],
        _ => text,
    };
    let emacs = body.len() != text.len();
    let mut found = Vec::new();
    let pairs: Vec<&str> = if emacs {
        body.split(';').collect()
    } else {
        vec![body]
    };
    for pair in pairs {
        let Some((key, value)) = pair.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if !emacs && (key.contains(char::is_whitespace) || value.contains(char::is_whitespace)) {
            continue;
        }
        let Some(key) = MagicKey::from_name(key) else {
            continue;
        };
        found.push(decode_value(key, value));
    }
    found
}

fn decode_value(key: MagicKey, value: &str) -> MagicComment {
    let setting = match key {
        MagicKey::Encoding => Some(MagicSetting::Encoding(value.to_string())),
        MagicKey::FrozenStringLiteral => parse_bool(value).map(MagicSetting::FrozenStringLiteral),
        MagicKey::WarnIndent => parse_bool(value).map(MagicSetting::WarnIndent),
        MagicKey::ShareableConstantValue => {
            ShareableConstantValue::parse(value).map(MagicSetting::ShareableConstantValue)
        }
    };
    setting.map_or_else(
        || MagicComment::InvalidValue {
            key,
            value: value.to_string(),
        },
        MagicComment::Setting,
    )
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Finds a `coding[:=] NAME` declaration anywhere in a comment, as editors
/// write it (`# vim: set fileencoding=utf-8 :`).
#[must_use]
pub fn find_coding_declaration(comment: &[u8]) -> Option<String> {
    let lower = comment.to_ascii_lowercase();
    let at = lower.windows(6).position(|w| w == b"coding")?;
    let rest = &comment[at + 6..];
    let rest = match rest.first() {
        Some(b':' | b'=') => &rest[1..],
        _ => return None,
    };
    let start = rest.iter().position(|b| !b.is_ascii_whitespace())?;
    let name: Vec<u8> = rest[start..]
        .iter()
        .copied()
        .take_while(|&b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        .collect();
    if name.is_empty() {
        return None;
    }
    String::from_utf8(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_encodings() {
        assert_eq!(Encoding::find("UTF-8"), Some(Encoding::Utf8));
        assert_eq!(Encoding::find("binary"), Some(Encoding::Binary));
        assert_eq!(Encoding::find("US-ASCII"), Some(Encoding::UsAscii));
        assert_eq!(Encoding::find("klingon"), None);
    }

    #[test]
    fn utf8_char_len() {
        assert_eq!(Encoding::Utf8.char_len("é".as_bytes()), Some(2));
        assert_eq!(Encoding::Utf8.char_len("日本".as_bytes()), Some(3));
        assert_eq!(Encoding::Utf8.char_len(b"\xFF"), None);
        assert_eq!(Encoding::Utf8.char_len(b"\xC3"), None);
        assert_eq!(Encoding::Binary.char_len(b"\xFF"), Some(1));
        assert_eq!(Encoding::UsAscii.char_len(b"\xC3\xA9"), None);
    }

    #[test]
    fn plain_magic_comment() {
        assert_eq!(
            parse_magic_comment(b" frozen_string_literal: true"),
            vec![MagicComment::Setting(MagicSetting::FrozenStringLiteral(true))]
        );
    }

    #[test]
    fn key_normalization() {
        assert_eq!(
            parse_magic_comment(b" Frozen-String-Literal: FALSE"),
            vec![MagicComment::Setting(MagicSetting::FrozenStringLiteral(false))]
        );
        assert_eq!(
            parse_magic_comment(b" shareable-constant-value: literal"),
            vec![MagicComment::Setting(
                MagicSetting::ShareableConstantValue(ShareableConstantValue::Literal)
            )]
        );
    }

    #[test]
    fn emacs_style_magic_comment() {
        let found = parse_magic_comment(b" -*- coding: utf-8; warn-indent: true -*-");
        assert_eq!(
            found,
            vec![
                MagicComment::Setting(MagicSetting::Encoding("utf-8".to_string())),
                MagicComment::Setting(MagicSetting::WarnIndent(true)),
            ]
        );
    }

    #[test]
    fn invalid_value_is_reported() {
        assert_eq!(
            parse_magic_comment(b" frozen_string_literal: maybe"),
            vec![MagicComment::InvalidValue {
                key: MagicKey::FrozenStringLiteral,
                value: "maybe".to_string(),
            }]
        );
    }

    #[test]
    fn prose_is_not_magic() {
        assert!(parse_magic_comment(b" note: frozen string literal: true").is_empty());
        assert!(parse_magic_comment(b" just a comment").is_empty());
    }

    #[test]
    fn coding_declaration_in_editor_line() {
        assert_eq!(
            find_coding_declaration(b" vim: set fileencoding=binary :"),
            Some("binary".to_string())
        );
        assert_eq!(find_coding_declaration(b" nothing here"), None);
    }
}
