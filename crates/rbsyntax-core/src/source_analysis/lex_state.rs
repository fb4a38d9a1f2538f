// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Tokenizer mode tracking.
//!
//! Ruby cannot be tokenized without knowing what the parser expects next:
//! `-1` after `foo ` is an argument, after `x ` (a local) it is a subtraction.
//! [`LexState`] records that expectation as a set of mode bits, and the two
//! [`BitStack`]s record whether a `do` keyword belongs to a loop condition or
//! to a command call's block.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A set of tokenizer mode bits.
///
/// Single bits are exposed as associated constants; unions such as
/// [`LexState::ARG_ANY`] are meaningful on their own.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LexState(u16);

impl LexState {
    /// Ignore newline, `+`/`-` are unary.
    pub const BEG: Self = Self(1 << 0);
    /// A complete expression has been seen; newline is significant.
    pub const END: Self = Self(1 << 1);
    /// Closing parenthesis of a `foo (...)` argument.
    pub const ENDARG: Self = Self(1 << 2);
    /// End of a method name or lambda arrow.
    pub const ENDFN: Self = Self(1 << 3);
    /// After a method name that may take arguments.
    pub const ARG: Self = Self(1 << 4);
    /// After a command name at the start of a statement.
    pub const CMDARG: Self = Self(1 << 5);
    /// After `return`, `break`, `next` and `rescue`.
    pub const MID: Self = Self(1 << 6);
    /// After `def`, `alias`, `undef` or a symbol colon: operators are names.
    pub const FNAME: Self = Self(1 << 7);
    /// After `.` or `::`: keywords are method names.
    pub const DOT: Self = Self(1 << 8);
    /// After `class`: `<<` is a singleton class opener.
    pub const CLASS: Self = Self(1 << 9);
    /// A label (`name:`) may follow.
    pub const LABEL: Self = Self(1 << 10);
    /// A label has just been read.
    pub const LABELED: Self = Self(1 << 11);
    /// An `alias`/`undef` item, where `%s()` is a symbol.
    pub const FITEM: Self = Self(1 << 12);

    /// No bits set.
    pub const NONE: Self = Self(0);
    /// Synonym for [`BEG`](Self::BEG) used where a value is expected.
    pub const VALUE: Self = Self::BEG;
    /// Any "expression begins here" state.
    pub const BEG_ANY: Self = Self(Self::BEG.0 | Self::MID.0 | Self::CLASS.0);
    /// Any argument state.
    pub const ARG_ANY: Self = Self(Self::ARG.0 | Self::CMDARG.0);
    /// Any "expression ended" state.
    pub const END_ANY: Self = Self(Self::END.0 | Self::ENDARG.0 | Self::ENDFN.0);

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Returns true if any bit of `mask` is set.
    #[must_use]
    pub const fn is_in(self, mask: Self) -> bool {
        self.0 & mask.0 != 0
    }

    /// Returns true if every bit of `mask` is set.
    #[must_use]
    pub const fn has_all(self, mask: Self) -> bool {
        self.0 & mask.0 == mask.0
    }

    /// Returns true if the state is exactly `mask`.
    #[must_use]
    pub const fn is_exactly(self, mask: Self) -> bool {
        self.0 == mask.0
    }

    /// Returns the union of two states.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    // ========================================================================
    // Named predicates
    // ========================================================================

    /// An expression may begin here.
    #[must_use]
    pub const fn is_beginning_of_expression(self) -> bool {
        self.is_in(Self::BEG_ANY) || self.has_all(Self::ARG.union(Self::LABELED))
    }

    /// The previous token was a method name that may take arguments.
    #[must_use]
    pub const fn is_argument_position(self) -> bool {
        self.is_in(Self::ARG_ANY)
    }

    /// The previous token completed an expression.
    #[must_use]
    pub const fn is_end_of_expression(self) -> bool {
        self.is_in(Self::END_ANY)
    }

    /// Operators are read as method names (`def +`, `:[]`, `a.-@`).
    #[must_use]
    pub const fn is_after_operator(self) -> bool {
        self.is_in(Self::FNAME.union(Self::DOT))
    }

    const NAMES: [(Self, &'static str); 13] = [
        (Self::BEG, "BEG"),
        (Self::END, "END"),
        (Self::ENDARG, "ENDARG"),
        (Self::ENDFN, "ENDFN"),
        (Self::ARG, "ARG"),
        (Self::CMDARG, "CMDARG"),
        (Self::MID, "MID"),
        (Self::FNAME, "FNAME"),
        (Self::DOT, "DOT"),
        (Self::CLASS, "CLASS"),
        (Self::LABEL, "LABEL"),
        (Self::LABELED, "LABELED"),
        (Self::FITEM, "FITEM"),
    ];
}

impl BitOr for LexState {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for LexState {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl fmt::Debug for LexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("NONE");
        }
        let mut first = true;
        for (bit, name) in Self::NAMES {
            if self.is_in(bit) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl fmt::Display for LexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A bounded stack of single bits.
///
/// Only the 64 most recent pushes are remembered; older entries fall off
/// the bottom and read as `false` once popped back into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitStack(u64);

impl BitStack {
    /// Pushes a bit.
    pub fn push(&mut self, bit: bool) {
        self.0 = (self.0 << 1) | u64::from(bit);
    }

    /// Pops the top bit.
    pub fn pop(&mut self) -> bool {
        let top = self.top();
        self.0 >>= 1;
        top
    }

    /// Returns the top bit without popping.
    #[must_use]
    pub const fn top(self) -> bool {
        self.0 & 1 == 1
    }
}
