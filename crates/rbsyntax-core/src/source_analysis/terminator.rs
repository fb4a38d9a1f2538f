// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The stack of open string-like literals.
//!
//! Strings, symbols, regexps, word lists and heredocs may nest through
//! interpolation (`"a #{ "b #{c}" }"`), so the lexer keeps one [`Frame`] per
//! open literal. The top frame decides how the next token is read: while its
//! mode is [`FrameMode::Body`] the lexer scans literal content, while it is
//! [`FrameMode::Interpolating`] ordinary tokens are produced until the
//! matching `}`.

use super::Span;
use super::source::Checkpoint;

/// How the body of a literal is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LiteralFlags {
    /// Escapes are decoded and `#{}` interpolates.
    pub expand: bool,
    /// Regexp body: escapes are kept for the regexp engine.
    pub regexp: bool,
    /// Whitespace separates elements (`%w`, `%W`, `%i`, `%I`).
    pub words: bool,
    /// The literal is a symbol.
    pub symbol: bool,
    /// A closing quote directly followed by `:` ends a label.
    pub label: bool,
}

impl LiteralFlags {
    /// `'...'`, `%q`
    pub const SINGLE_QUOTED: Self = Self {
        expand: false,
        regexp: false,
        words: false,
        symbol: false,
        label: false,
    };
    /// `"..."`, `%Q`, `%`, `` `...` ``, `%x`
    pub const DOUBLE_QUOTED: Self = Self {
        expand: true,
        ..Self::SINGLE_QUOTED
    };
    /// `/.../`, `%r`
    pub const REGEXP: Self = Self {
        expand: true,
        regexp: true,
        ..Self::SINGLE_QUOTED
    };
    /// `%w`, `%i`
    pub const WORDS: Self = Self {
        words: true,
        ..Self::SINGLE_QUOTED
    };
    /// `%W`, `%I`
    pub const EXPANDED_WORDS: Self = Self {
        expand: true,
        words: true,
        ..Self::SINGLE_QUOTED
    };
    /// `:'...'`, `%s`
    pub const SINGLE_QUOTED_SYMBOL: Self = Self {
        symbol: true,
        ..Self::SINGLE_QUOTED
    };
    /// `:"..."`
    pub const DOUBLE_QUOTED_SYMBOL: Self = Self {
        expand: true,
        symbol: true,
        ..Self::SINGLE_QUOTED
    };

    /// Returns the flags with label termination enabled.
    #[must_use]
    pub const fn with_label(self) -> Self {
        Self {
            label: true,
            ..self
        }
    }
}

/// Which heredoc introducer was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeredocIndent {
    /// `<<ID`: the terminator must start the line.
    None,
    /// `<<-ID`: the terminator may be indented.
    Dash,
    /// `<<~ID`: the terminator may be indented and the body is dedented.
    Squiggly,
}

/// State of an open heredoc.
#[derive(Debug, Clone)]
pub struct Heredoc {
    /// The terminator word.
    pub identifier: Vec<u8>,
    /// Introducer style.
    pub indent: HeredocIndent,
    /// Where tokenizing resumes once the body is consumed.
    pub resume: Checkpoint,
    /// Span of the `<<ID` token.
    pub opening: Span,
    /// Smallest indentation over the body's non-blank lines (`<<~` only).
    pub min_indent: Option<usize>,
    /// The cursor sits at the end of a consumed body line.
    pub need_line: bool,
    /// The next line continues the previous one after `\` newline.
    pub continuation: bool,
    /// The next content fragment begins a physical line.
    pub line_start: bool,
}

impl Heredoc {
    /// Creates the state for a heredoc whose body starts on the next line.
    #[must_use]
    pub fn new(
        identifier: Vec<u8>,
        indent: HeredocIndent,
        resume: Checkpoint,
        opening: Span,
    ) -> Self {
        Self {
            identifier,
            indent,
            resume,
            opening,
            min_indent: None,
            need_line: true,
            continuation: false,
            line_start: true,
        }
    }

    /// Folds the indentation of a body line into the running minimum.
    ///
    /// Lines holding only spaces and tabs do not count.
    pub fn record_line_indent(&mut self, line: &[u8]) {
        if self.indent != HeredocIndent::Squiggly {
            return;
        }
        let mut width = 0;
        for &b in line {
            match b {
                b' ' => width += 1,
                b'\t' => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
                b'\n' => return,
                _ => {
                    self.min_indent = Some(self.min_indent.map_or(width, |m| m.min(width)));
                    return;
                }
            }
        }
    }
}

/// Tab stops used for heredoc indentation.
pub const TAB_WIDTH: usize = 8;

/// Removes up to `width` columns of leading whitespace from a heredoc line.
///
/// A tab that would cross `width` is kept.
#[must_use]
pub fn dedent(bytes: &[u8], width: usize) -> &[u8] {
    let mut column = 0;
    let mut cut = 0;
    for &b in bytes {
        if column >= width {
            break;
        }
        match b {
            b' ' => column += 1,
            b'\t' => {
                let next = (column / TAB_WIDTH + 1) * TAB_WIDTH;
                if next > width {
                    break;
                }
                column = next;
            }
            _ => break,
        }
        cut += 1;
    }
    &bytes[cut..]
}

/// The delimiting scheme of a literal.
#[derive(Debug, Clone)]
pub enum Delimiter {
    /// Closed by a terminator byte. Bracket pairs nest.
    Quoted {
        /// The closing byte.
        term: u8,
        /// The opening byte when it differs from `term` and nests.
        paren: Option<u8>,
        /// Current nesting depth of `paren`.
        nest: u32,
    },
    /// Closed by a line holding only the identifier.
    Heredoc(Box<Heredoc>),
}

/// What the lexer is doing with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    /// Reading literal content.
    Body,
    /// Inside `#{ }`; the saved brace depth is restored at the closing `}`.
    Interpolating {
        /// Brace depth outside the interpolation.
        brace_nest: i32,
    },
    /// After `#` of `#@ivar` or `#$gvar`; the next token is the variable.
    PendingVariable,
}

/// One open literal.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoding flags.
    pub flags: LiteralFlags,
    /// How the literal ends.
    pub delimiter: Delimiter,
    /// What the lexer is doing.
    pub mode: FrameMode,
    /// For word lists: content has been produced for the current element.
    pub in_word: bool,
}

impl Frame {
    /// Creates a frame for a quoted literal.
    #[must_use]
    pub fn quoted(flags: LiteralFlags, term: u8, paren: Option<u8>) -> Self {
        Self {
            flags,
            delimiter: Delimiter::Quoted {
                term,
                paren,
                nest: 0,
            },
            mode: FrameMode::Body,
            in_word: false,
        }
    }

    /// Creates a frame for a heredoc.
    #[must_use]
    pub fn heredoc(flags: LiteralFlags, heredoc: Heredoc) -> Self {
        Self {
            flags,
            delimiter: Delimiter::Heredoc(Box::new(heredoc)),
            mode: FrameMode::Body,
            in_word: false,
        }
    }
}

/// The stack of open literals.
#[derive(Debug, Clone, Default)]
pub struct TerminatorStack {
    frames: Vec<Frame>,
}

impl TerminatorStack {
    /// Opens a literal.
    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Closes the innermost literal.
    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Returns the innermost literal.
    #[must_use]
    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Returns the innermost literal mutably.
    pub fn top_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// Returns the number of open literals.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squiggly() -> Heredoc {
        let src = crate::source_analysis::SourceBuffer::from_bytes(b"", 1);
        Heredoc::new(
            b"EOS".to_vec(),
            HeredocIndent::Squiggly,
            src.checkpoint(),
            Span::default(),
        )
    }

    #[test]
    fn min_indent_ignores_blank_lines() {
        let mut h = squiggly();
        h.record_line_indent(b"    a\n");
        h.record_line_indent(b"  \n");
        h.record_line_indent(b"\n");
        h.record_line_indent(b"   b\n");
        assert_eq!(h.min_indent, Some(3));
    }

    #[test]
    fn tabs_advance_to_next_stop() {
        let mut h = squiggly();
        h.record_line_indent(b"  \tx\n");
        assert_eq!(h.min_indent, Some(8));
    }

    #[test]
    fn dedent_removes_columns() {
        assert_eq!(dedent(b"    abc\n", 2), b"  abc\n");
        assert_eq!(dedent(b"\tabc\n", 8), b"abc\n");
        assert_eq!(dedent(b"\tabc\n", 4), b"\tabc\n");
        assert_eq!(dedent(b"  \n", 4), b"\n");
        assert_eq!(dedent(b"abc", 4), b"abc");
    }

    #[test]
    fn stack_tracks_body_mode() {
        let mut stack = TerminatorStack::default();
        stack.push(Frame::quoted(LiteralFlags::DOUBLE_QUOTED, b'"', None));
        assert_eq!(stack.top().map(|f| f.mode), Some(FrameMode::Body));
        if let Some(top) = stack.top_mut() {
            top.mode = FrameMode::Interpolating { brace_nest: 0 };
        }
        assert_eq!(
            stack.top().map(|f| f.mode),
            Some(FrameMode::Interpolating { brace_nest: 0 })
        );
        assert_eq!(stack.depth(), 1);
    }
}
