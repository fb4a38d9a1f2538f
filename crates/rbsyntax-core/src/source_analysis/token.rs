// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Token types for lexical analysis.
//!
//! Each token consists of a [`TokenKind`] (with its payload), a [`Span`], and
//! a flag recording whether whitespace preceded it. Several source spellings
//! map to more than one kind depending on lexer state: `[` is
//! [`TokenKind::LBracket`] after an operand but [`TokenKind::LBracketArray`]
//! where an expression begins, `{` has four kinds, `-` has three. The parser
//! relies on these distinctions rather than re-deriving them.

use std::fmt;

use ecow::EcoString;

use super::Span;
use super::keywords::Keyword;
use super::numeric::NumericLiteral;

/// A piece of literal string content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StringFragment {
    /// The decoded bytes.
    pub bytes: Vec<u8>,
    /// True if the fragment begins a physical line of a heredoc body.
    pub line_start: bool,
}

/// The kind of token, including its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // === Names ===
    /// A lowercase identifier: `foo`, `_1`
    Identifier(EcoString),
    /// A capitalized identifier: `Foo`
    Constant(EcoString),
    /// A method name ending in `!` or `?`: `empty?`
    MethodName(EcoString),
    /// A label: `key:` (the payload excludes the colon)
    Label(EcoString),
    /// `@name`
    InstanceVariable(EcoString),
    /// `@@name`
    ClassVariable(EcoString),
    /// `$name`, `$0`, `$_`, `$stdout`
    GlobalVariable(EcoString),
    /// `$1` .. `$N`
    NthRef(u32),
    /// `$&`, `` $` ``, `$'`, `$+`
    BackRef(u8),
    /// A reserved word.
    Keyword(Keyword),

    // === Literals ===
    /// A numeric literal.
    Numeric(NumericLiteral),
    /// A character literal: `?a`
    Char(Vec<u8>),

    // === String machinery ===
    /// Opens a string: `"`, `'`, `%q(`, `%Q(`, `%(`, or a heredoc.
    StringBegin,
    /// Opens a command string: `` ` ``, `%x(`, or a backtick heredoc.
    XStringBegin,
    /// Opens a regexp: `/`, `%r(`
    RegexpBegin,
    /// Opens a symbol: `:` before a name, `:"`, `:'`, `%s(`
    SymbolBegin,
    /// Opens an interpolating word list: `%W(`
    WordsBegin,
    /// Opens a plain word list: `%w(`
    QWordsBegin,
    /// Opens an interpolating symbol list: `%I(`
    SymbolsBegin,
    /// Opens a plain symbol list: `%i(`
    QSymbolsBegin,
    /// Literal content inside a string.
    StringContent(StringFragment),
    /// `#{` inside an interpolating literal.
    StringDBeg,
    /// `#` before `@var`, `@@var` or `$var` inside an interpolating literal.
    StringDVar,
    /// `}` closing an interpolation.
    StringDEnd,
    /// Whitespace between words of a word list.
    WordSeparator,
    /// Closes a string, symbol, command string or word list.
    StringEnd,
    /// Closes a regexp, with its option letters.
    RegexpEnd(EcoString),
    /// Closes a string used as a label: `"key":`
    LabelEnd,
    /// Closes a heredoc. `dedent` is the indentation width to remove from a
    /// squiggly heredoc's lines.
    HeredocEnd {
        /// Width removed from line-initial fragments, for `<<~` heredocs.
        dedent: Option<usize>,
    },

    // === Operators ===
    /// `+` (binary)
    Plus,
    /// `-` (binary)
    Minus,
    /// `*` (binary)
    Star,
    /// `**` (binary)
    Pow,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `&` (binary)
    Amper,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `!`
    Bang,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `<=>`
    Cmp,
    /// `==`
    EqEq,
    /// `===`
    EqEqEq,
    /// `!=`
    NotEq,
    /// `=~`
    Match,
    /// `!~`
    NotMatch,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `<<`
    LShift,
    /// `>>`
    RShift,
    /// Unary `+`, or `+@` as a method name.
    UPlus,
    /// Unary `-`, or `-@` as a method name.
    UMinus,
    /// Unary `-` directly before a numeric literal.
    UMinusNum,
    /// `*` in prefix position (splat).
    Splat,
    /// `**` in prefix position (double splat).
    DoubleSplat,
    /// `&` in prefix position (block pass).
    BlockPass,
    /// `=`
    Assign,
    /// `op=`; the payload is the operator (`+`, `||`, `<<`, ...).
    OpAssign(EcoString),
    /// `=>`
    Assoc,
    /// `->`
    Arrow,
    /// `?` (ternary)
    Question,
    /// `:` (ternary else, or a bare colon)
    Colon,
    /// `::` after an operand.
    ColonColon,
    /// `::` where an expression begins (top-level constant).
    ColonColonPrefix,
    /// `.`
    Dot,
    /// `&.`
    AndDot,
    /// `..`
    DotDot,
    /// `...`
    DotDotDot,
    /// `..` where an expression begins.
    BeginlessDotDot,
    /// `...` where an expression begins.
    BeginlessDotDotDot,
    /// `` ` `` as a method name.
    Backtick,
    /// `[]` as a method name.
    Aref,
    /// `[]=` as a method name.
    Aset,

    // === Delimiters ===
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// A significant newline.
    Newline,
    /// `(` directly after a method name (call arguments or parameters).
    LParen,
    /// `(` where an expression begins.
    LParenBeg,
    /// `(` after a command name and a space: `foo (1)`.
    LParenArg,
    /// `)`
    RParen,
    /// `[` after an operand (indexing).
    LBracket,
    /// `[` where an expression begins (array literal).
    LBracketArray,
    /// `]`
    RBracket,
    /// `{` opening a hash literal.
    LBraceHash,
    /// `{` opening a block after a method call.
    LBraceBlock,
    /// `{` opening a block after parenthesized command arguments.
    LBraceArg,
    /// `{` opening a lambda body.
    LambdaBegin,
    /// `}`
    RBrace,

    /// End of input (end of file, `__END__`, `^D`, `^Z`, NUL).
    Eof,
}

impl TokenKind {
    /// Returns `true` for tokens that can only begin an expression, never
    /// continue one.
    ///
    /// Used to decide whether an identifier is the name of a command call.
    #[must_use]
    pub fn can_start_argument(&self) -> bool {
        match self {
            Self::Identifier(_)
            | Self::Constant(_)
            | Self::MethodName(_)
            | Self::Label(_)
            | Self::InstanceVariable(_)
            | Self::ClassVariable(_)
            | Self::GlobalVariable(_)
            | Self::NthRef(_)
            | Self::BackRef(_)
            | Self::Numeric(_)
            | Self::Char(_)
            | Self::StringBegin
            | Self::XStringBegin
            | Self::RegexpBegin
            | Self::SymbolBegin
            | Self::WordsBegin
            | Self::QWordsBegin
            | Self::SymbolsBegin
            | Self::QSymbolsBegin
            | Self::UPlus
            | Self::UMinus
            | Self::UMinusNum
            | Self::Splat
            | Self::DoubleSplat
            | Self::BlockPass
            | Self::Bang
            | Self::Tilde
            | Self::Arrow
            | Self::ColonColonPrefix
            | Self::BeginlessDotDot
            | Self::BeginlessDotDotDot
            | Self::LParenArg
            | Self::LBracketArray
            | Self::LBraceHash => true,
            Self::Keyword(keyword) => keyword.can_start_argument(),
            _ => false,
        }
    }

    /// Returns `true` for tokens that end a statement.
    #[must_use]
    pub const fn is_terminator(&self) -> bool {
        matches!(self, Self::Newline | Self::Semicolon | Self::Eof)
    }

    /// Returns `true` if this is the end-of-file marker.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    /// Returns the keyword if this token is one.
    #[must_use]
    pub const fn keyword(&self) -> Option<Keyword> {
        match self {
            Self::Keyword(keyword) => Some(*keyword),
            _ => None,
        }
    }

    /// Returns the name carried by identifier-like tokens.
    #[must_use]
    pub fn name(&self) -> Option<&EcoString> {
        match self {
            Self::Identifier(s)
            | Self::Constant(s)
            | Self::MethodName(s)
            | Self::Label(s)
            | Self::InstanceVariable(s)
            | Self::ClassVariable(s)
            | Self::GlobalVariable(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the method name spelled by an operator token, if it is one
    /// that can be defined or called as a method.
    #[must_use]
    pub const fn operator_method_name(&self) -> Option<&'static str> {
        let name = match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star | Self::Splat => "*",
            Self::Pow | Self::DoubleSplat => "**",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Amper | Self::BlockPass => "&",
            Self::Pipe => "|",
            Self::Caret => "^",
            Self::Tilde => "~",
            Self::Bang => "!",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Cmp => "<=>",
            Self::EqEq => "==",
            Self::EqEqEq => "===",
            Self::NotEq => "!=",
            Self::Match => "=~",
            Self::NotMatch => "!~",
            Self::LShift => "<<",
            Self::RShift => ">>",
            Self::UPlus => "+@",
            Self::UMinus => "-@",
            Self::Backtick => "`",
            Self::Aref => "[]",
            Self::Aset => "[]=",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(op) = self.operator_method_name() {
            return match self {
                Self::UPlus => f.write_str("unary +"),
                Self::UMinus => f.write_str("unary -"),
                _ => f.write_str(op),
            };
        }
        match self {
            Self::Identifier(s) | Self::Constant(s) | Self::MethodName(s) => {
                write!(f, "'{s}'")
            }
            Self::Label(s) => write!(f, "label '{s}:'"),
            Self::InstanceVariable(s) | Self::ClassVariable(s) | Self::GlobalVariable(s) => {
                write!(f, "'{s}'")
            }
            Self::NthRef(n) => write!(f, "'${n}'"),
            Self::BackRef(c) => write!(f, "'${}'", char::from(*c)),
            Self::Keyword(k) => write!(f, "'{k}'"),
            Self::Numeric(n) => write!(f, "number {n}"),
            Self::Char(_) => f.write_str("character literal"),
            Self::StringBegin => f.write_str("string literal"),
            Self::XStringBegin => f.write_str("backtick literal"),
            Self::RegexpBegin => f.write_str("regexp literal"),
            Self::SymbolBegin => f.write_str("symbol literal"),
            Self::WordsBegin | Self::QWordsBegin => f.write_str("word list"),
            Self::SymbolsBegin | Self::QSymbolsBegin => f.write_str("symbol list"),
            Self::StringContent(_) => f.write_str("string content"),
            Self::StringDBeg => f.write_str("'#{'"),
            Self::StringDVar => f.write_str("'#'"),
            Self::StringDEnd => f.write_str("'}'"),
            Self::WordSeparator => f.write_str("word separator"),
            Self::StringEnd | Self::LabelEnd => f.write_str("string end"),
            Self::RegexpEnd(_) => f.write_str("regexp end"),
            Self::HeredocEnd { .. } => f.write_str("heredoc end"),
            Self::UMinusNum => f.write_str("unary -"),
            Self::Assign => f.write_str("'='"),
            Self::OpAssign(op) => write!(f, "'{op}='"),
            Self::Assoc => f.write_str("'=>'"),
            Self::Arrow => f.write_str("'->'"),
            Self::Question => f.write_str("'?'"),
            Self::Colon => f.write_str("':'"),
            Self::ColonColon | Self::ColonColonPrefix => f.write_str("'::'"),
            Self::Dot => f.write_str("'.'"),
            Self::AndDot => f.write_str("'&.'"),
            Self::DotDot | Self::BeginlessDotDot => f.write_str("'..'"),
            Self::DotDotDot | Self::BeginlessDotDotDot => f.write_str("'...'"),
            Self::AndAnd => f.write_str("'&&'"),
            Self::OrOr => f.write_str("'||'"),
            Self::Comma => f.write_str("','"),
            Self::Semicolon => f.write_str("';'"),
            Self::Newline => f.write_str("newline"),
            Self::LParen | Self::LParenBeg | Self::LParenArg => f.write_str("'('"),
            Self::RParen => f.write_str("')'"),
            Self::LBracket | Self::LBracketArray => f.write_str("'['"),
            Self::RBracket => f.write_str("']'"),
            Self::LBraceHash | Self::LBraceBlock | Self::LBraceArg | Self::LambdaBegin => {
                f.write_str("'{'")
            }
            Self::RBrace => f.write_str("'}'"),
            Self::Eof => f.write_str("end-of-input"),
            _ => f.write_str("operator"),
        }
    }
}

/// A token with its source location.
///
/// # Examples
///
/// ```
/// use rbsyntax_core::source_analysis::{Span, Token, TokenKind};
///
/// let token = Token::new(TokenKind::Identifier("foo".into()), Span::default());
/// assert!(matches!(token.kind(), TokenKind::Identifier(_)));
/// assert!(!token.space_before());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    kind: TokenKind,
    span: Span,
    space_before: bool,
}

impl Token {
    /// Creates a new token not preceded by whitespace.
    #[must_use]
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            space_before: false,
        }
    }

    /// Creates a token recording whether whitespace preceded it.
    #[must_use]
    pub fn with_space(kind: TokenKind, span: Span, space_before: bool) -> Self {
        Self {
            kind,
            span,
            space_before,
        }
    }

    /// Returns the kind of this token.
    #[must_use]
    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    /// Consumes the token, returning its kind.
    #[must_use]
    pub fn into_kind(self) -> TokenKind {
        self.kind
    }

    /// Returns the source span of this token.
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Returns true if whitespace preceded this token on its line.
    #[must_use]
    pub fn space_before(&self) -> bool {
        self.space_before
    }
}
