// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Reserved words.
//!
//! Each reserved word has a primary token, an optional modifier token
//! (`if` vs trailing `if`), and the tokenizer mode it leaves behind. The
//! choice between the two tokens is made from the mode in effect when the
//! word is read; see [`Lexer`](super::Lexer).

use std::fmt;

use super::LexState;

/// A reserved word token.
///
/// `do` has four forms depending on what it closes: a loop condition
/// ([`DoCond`](Self::DoCond)), a command call's arguments
/// ([`DoBlock`](Self::DoBlock)), a lambda's parameters
/// ([`DoLambda`](Self::DoLambda)), or a parenthesized call
/// ([`Do`](Self::Do)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// `__ENCODING__`
    Encoding,
    /// `__LINE__`
    Line,
    /// `__FILE__`
    File,
    /// `BEGIN`
    UpperBegin,
    /// `END`
    UpperEnd,
    /// `alias`
    Alias,
    /// `and`
    And,
    /// `begin`
    Begin,
    /// `break`
    Break,
    /// `case`
    Case,
    /// `class`
    Class,
    /// `def`
    Def,
    /// `defined?`
    Defined,
    /// `do` after a parenthesized call or in statement position.
    Do,
    /// `do` closing a `while`/`until`/`for` condition.
    DoCond,
    /// `do` opening the block of a command call.
    DoBlock,
    /// `do` opening a lambda body.
    DoLambda,
    /// `else`
    Else,
    /// `elsif`
    Elsif,
    /// `end`
    End,
    /// `ensure`
    Ensure,
    /// `false`
    False,
    /// `for`
    For,
    /// `if`
    If,
    /// Trailing `if`.
    IfModifier,
    /// `in`
    In,
    /// `module`
    Module,
    /// `next`
    Next,
    /// `nil`
    Nil,
    /// `not`
    Not,
    /// `or`
    Or,
    /// `redo`
    Redo,
    /// `rescue`
    Rescue,
    /// Trailing `rescue`.
    RescueModifier,
    /// `retry`
    Retry,
    /// `return`
    Return,
    /// `self`
    SelfValue,
    /// `super`
    Super,
    /// `then`
    Then,
    /// `true`
    True,
    /// `undef`
    Undef,
    /// `unless`
    Unless,
    /// Trailing `unless`.
    UnlessModifier,
    /// `until`
    Until,
    /// Trailing `until`.
    UntilModifier,
    /// `when`
    When,
    /// `while`
    While,
    /// Trailing `while`.
    WhileModifier,
    /// `yield`
    Yield,
}

impl Keyword {
    /// Returns the source spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Encoding => "__ENCODING__",
            Self::Line => "__LINE__",
            Self::File => "__FILE__",
            Self::UpperBegin => "BEGIN",
            Self::UpperEnd => "END",
            Self::Alias => "alias",
            Self::And => "and",
            Self::Begin => "begin",
            Self::Break => "break",
            Self::Case => "case",
            Self::Class => "class",
            Self::Def => "def",
            Self::Defined => "defined?",
            Self::Do | Self::DoCond | Self::DoBlock | Self::DoLambda => "do",
            Self::Else => "else",
            Self::Elsif => "elsif",
            Self::End => "end",
            Self::Ensure => "ensure",
            Self::False => "false",
            Self::For => "for",
            Self::If | Self::IfModifier => "if",
            Self::In => "in",
            Self::Module => "module",
            Self::Next => "next",
            Self::Nil => "nil",
            Self::Not => "not",
            Self::Or => "or",
            Self::Redo => "redo",
            Self::Rescue | Self::RescueModifier => "rescue",
            Self::Retry => "retry",
            Self::Return => "return",
            Self::SelfValue => "self",
            Self::Super => "super",
            Self::Then => "then",
            Self::True => "true",
            Self::Undef => "undef",
            Self::Unless | Self::UnlessModifier => "unless",
            Self::Until | Self::UntilModifier => "until",
            Self::When => "when",
            Self::While | Self::WhileModifier => "while",
            Self::Yield => "yield",
        }
    }

    /// Returns true if the keyword can begin a command argument
    /// (`puts nil`, `foo if x then y end`).
    #[must_use]
    pub const fn can_start_argument(self) -> bool {
        matches!(
            self,
            Self::Encoding
                | Self::Line
                | Self::File
                | Self::Begin
                | Self::Case
                | Self::Class
                | Self::Def
                | Self::Defined
                | Self::False
                | Self::For
                | Self::If
                | Self::Module
                | Self::Nil
                | Self::Not
                | Self::SelfValue
                | Self::Super
                | Self::True
                | Self::Unless
                | Self::Until
                | Self::While
                | Self::Yield
        )
    }

    /// Returns true for the trailing-modifier forms.
    #[must_use]
    pub const fn is_modifier(self) -> bool {
        matches!(
            self,
            Self::IfModifier
                | Self::UnlessModifier
                | Self::WhileModifier
                | Self::UntilModifier
                | Self::RescueModifier
        )
    }

    /// Returns true for the forms of `do`.
    #[must_use]
    pub const fn is_do(self) -> bool {
        matches!(
            self,
            Self::Do | Self::DoCond | Self::DoBlock | Self::DoLambda
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reserved word table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordEntry {
    /// The token produced in statement-start position.
    pub keyword: Keyword,
    /// The token produced after a complete expression. Equal to `keyword`
    /// for words without a modifier form.
    pub modifier: Keyword,
    /// The tokenizer mode after the word.
    pub state: LexState,
}

impl KeywordEntry {
    const fn new(keyword: Keyword, state: LexState) -> Self {
        Self {
            keyword,
            modifier: keyword,
            state,
        }
    }

    const fn with_modifier(keyword: Keyword, modifier: Keyword, state: LexState) -> Self {
        Self {
            keyword,
            modifier,
            state,
        }
    }

    /// Returns true if the word has a distinct modifier form.
    #[must_use]
    pub fn has_modifier(self) -> bool {
        self.keyword != self.modifier
    }
}

/// Looks a word up in the reserved word table.
#[must_use]
pub fn lookup(word: &[u8]) -> Option<KeywordEntry> {
    use Keyword as K;
    use LexState as S;

    let entry = match word {
        b"__ENCODING__" => KeywordEntry::new(K::Encoding, S::END),
        b"__LINE__" => KeywordEntry::new(K::Line, S::END),
        b"__FILE__" => KeywordEntry::new(K::File, S::END),
        b"BEGIN" => KeywordEntry::new(K::UpperBegin, S::END),
        b"END" => KeywordEntry::new(K::UpperEnd, S::END),
        b"alias" => KeywordEntry::new(K::Alias, S::FNAME.union(S::FITEM)),
        b"and" => KeywordEntry::new(K::And, S::VALUE),
        b"begin" => KeywordEntry::new(K::Begin, S::BEG),
        b"break" => KeywordEntry::new(K::Break, S::MID),
        b"case" => KeywordEntry::new(K::Case, S::VALUE),
        b"class" => KeywordEntry::new(K::Class, S::CLASS),
        b"def" => KeywordEntry::new(K::Def, S::FNAME),
        b"defined?" => KeywordEntry::new(K::Defined, S::ARG),
        b"do" => KeywordEntry::new(K::Do, S::BEG),
        b"else" => KeywordEntry::new(K::Else, S::BEG),
        b"elsif" => KeywordEntry::new(K::Elsif, S::VALUE),
        b"end" => KeywordEntry::new(K::End, S::END),
        b"ensure" => KeywordEntry::new(K::Ensure, S::BEG),
        b"false" => KeywordEntry::new(K::False, S::END),
        b"for" => KeywordEntry::new(K::For, S::VALUE),
        b"if" => KeywordEntry::with_modifier(K::If, K::IfModifier, S::VALUE),
        b"in" => KeywordEntry::new(K::In, S::VALUE),
        b"module" => KeywordEntry::new(K::Module, S::VALUE),
        b"next" => KeywordEntry::new(K::Next, S::MID),
        b"nil" => KeywordEntry::new(K::Nil, S::END),
        b"not" => KeywordEntry::new(K::Not, S::ARG),
        b"or" => KeywordEntry::new(K::Or, S::VALUE),
        b"redo" => KeywordEntry::new(K::Redo, S::END),
        b"rescue" => KeywordEntry::with_modifier(K::Rescue, K::RescueModifier, S::MID),
        b"retry" => KeywordEntry::new(K::Retry, S::END),
        b"return" => KeywordEntry::new(K::Return, S::MID),
        b"self" => KeywordEntry::new(K::SelfValue, S::END),
        b"super" => KeywordEntry::new(K::Super, S::ARG),
        b"then" => KeywordEntry::new(K::Then, S::BEG),
        b"true" => KeywordEntry::new(K::True, S::END),
        b"undef" => KeywordEntry::new(K::Undef, S::FNAME.union(S::FITEM)),
        b"unless" => KeywordEntry::with_modifier(K::Unless, K::UnlessModifier, S::VALUE),
        b"until" => KeywordEntry::with_modifier(K::Until, K::UntilModifier, S::VALUE),
        b"when" => KeywordEntry::new(K::When, S::VALUE),
        b"while" => KeywordEntry::with_modifier(K::While, K::WhileModifier, S::VALUE),
        b"yield" => KeywordEntry::new(K::Yield, S::ARG),
        _ => return None,
    };
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_reserved_words() {
        let entry = lookup(b"def").unwrap();
        assert_eq!(entry.keyword, Keyword::Def);
        assert!(entry.state.is_exactly(LexState::FNAME));
        assert!(!entry.has_modifier());
    }

    #[test]
    fn modifier_forms() {
        let entry = lookup(b"while").unwrap();
        assert_eq!(entry.modifier, Keyword::WhileModifier);
        assert!(entry.has_modifier());
        assert!(entry.modifier.is_modifier());
    }

    #[test]
    fn plain_identifiers_are_not_keywords() {
        assert!(lookup(b"define").is_none());
        assert!(lookup(b"If").is_none());
        assert!(lookup(b"").is_none());
    }

    #[test]
    fn do_forms_share_spelling() {
        for kw in [Keyword::Do, Keyword::DoCond, Keyword::DoBlock, Keyword::DoLambda] {
            assert!(kw.is_do());
            assert_eq!(kw.to_string(), "do");
        }
    }
}
