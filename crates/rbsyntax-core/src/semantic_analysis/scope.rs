// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Local variable scopes.
//!
//! **DDD Context:** Semantic Analysis
//!
//! The parser keeps a [`ScopeTracker`] while it builds the tree. Whether a
//! name is a local variable changes how the following tokens are read
//! (`x -1` subtracts when `x` is a local and passes `-1` to a method
//! otherwise), so scopes cannot wait for a later pass.
//!
//! Scopes nest in two ways:
//! - A method, class body or the top level starts a fresh table. Outer
//!   locals are invisible inside it.
//! - A block or lambda sees every local of the scopes around it, up to the
//!   nearest fresh table.
//!
//! Blocks also track numbered parameters (`_1` .. `_9`), which are only
//! legal in a block without an ordinary parameter list and only at one
//! level of a block nest.

use std::collections::HashMap;

use ecow::EcoString;

use crate::ast::LocalKind;
use crate::source_analysis::{SemanticErrorKind, Span};

/// The kind of a scope level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The program's top level.
    TopLevel,
    /// A `def` body.
    Method,
    /// A `class`, `module` or `class <<` body.
    Class,
    /// A `{ }` or `do end` block.
    Block,
    /// A `->` lambda.
    Lambda,
}

impl ScopeKind {
    /// Returns true for scopes that see the locals around them.
    #[must_use]
    pub const fn is_block(self) -> bool {
        matches!(self, Self::Block | Self::Lambda)
    }
}

/// The kind of binding in a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// A variable introduced by assignment or a pattern.
    Local,
    /// A method, block or lambda parameter.
    Parameter,
}

/// A local variable binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// The variable name.
    pub name: EcoString,
    /// Where it was first declared.
    pub defined_at: Span,
    /// Local or parameter.
    pub kind: BindingKind,
    /// Whether any reference has read it.
    pub used: bool,
}

/// An anonymous parameter that calls may forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anonymous {
    /// `*`
    Rest,
    /// `**`
    KeywordRest,
    /// `&`
    Block,
    /// `...`
    All,
}

impl Anonymous {
    /// The spelling used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rest => "*",
            Self::KeywordRest => "**",
            Self::Block => "&",
            Self::All => "...",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Rest => 1,
            Self::KeywordRest => 2,
            Self::Block => 4,
            Self::All => 8,
        }
    }
}

#[derive(Debug, Clone)]
struct ScopeLevel {
    kind: ScopeKind,
    variables: Vec<Binding>,
    index: HashMap<EcoString, usize>,
    /// A `|...|` list was written, even an empty one.
    ordinary_params: bool,
    /// Highest numbered parameter used directly in this block.
    numbered_max: u8,
    /// A block nested in this one used numbered parameters.
    inner_numbered: bool,
    anonymous: u8,
}

impl ScopeLevel {
    fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            variables: Vec::new(),
            index: HashMap::new(),
            ordinary_params: false,
            numbered_max: 0,
            inner_numbered: false,
            anonymous: 0,
        }
    }

    fn get(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    fn insert(&mut self, name: EcoString, span: Span, kind: BindingKind) -> usize {
        let slot = self.variables.len();
        self.index.insert(name.clone(), slot);
        self.variables.push(Binding {
            name,
            defined_at: span,
            kind,
            used: false,
        });
        slot
    }
}

/// What a popped scope leaves behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosedScope {
    /// Locals that were assigned but never read.
    pub unused: Vec<(EcoString, Span)>,
    /// Highest numbered parameter the scope used, 0 if none.
    pub numbered_params: u8,
}

/// Tracks local variables across nested scopes.
#[derive(Debug, Clone)]
pub struct ScopeTracker {
    /// Stack of scope levels; the first is always the top level.
    levels: Vec<ScopeLevel>,
}

impl ScopeTracker {
    /// Creates a tracker positioned at the top level.
    #[must_use]
    pub fn new() -> Self {
        Self {
            levels: vec![ScopeLevel::new(ScopeKind::TopLevel)],
        }
    }

    /// Enters a new scope.
    pub fn push(&mut self, kind: ScopeKind) {
        self.levels.push(ScopeLevel::new(kind));
    }

    /// Leaves the innermost scope.
    ///
    /// Popping the top level is a no-op returning an empty summary; use
    /// [`ScopeTracker::finish`] for it.
    pub fn pop(&mut self) -> ClosedScope {
        if self.levels.len() <= 1 {
            return ClosedScope::default();
        }
        let Some(level) = self.levels.pop() else {
            return ClosedScope::default();
        };
        if level.kind.is_block() && (level.numbered_max > 0 || level.inner_numbered) {
            if let Some(parent) = self.levels.last_mut() {
                if parent.kind.is_block() {
                    parent.inner_numbered = true;
                }
            }
        }
        close(level)
    }

    /// Closes the top level.
    pub fn finish(&mut self) -> ClosedScope {
        self.levels.truncate(1);
        let level = std::mem::replace(&mut self.levels[0], ScopeLevel::new(ScopeKind::TopLevel));
        close(level)
    }

    /// Returns the kind of the innermost scope.
    #[must_use]
    pub fn current_kind(&self) -> ScopeKind {
        self.levels.last().map_or(ScopeKind::TopLevel, |l| l.kind)
    }

    /// Returns true inside a method body, including blocks within it.
    #[must_use]
    pub fn in_method(&self) -> bool {
        self.levels
            .iter()
            .rev()
            .find(|level| !level.kind.is_block())
            .is_some_and(|level| level.kind == ScopeKind::Method)
    }

    /// Returns true inside a block or lambda.
    #[must_use]
    pub fn in_block(&self) -> bool {
        self.current_kind().is_block()
    }

    // ========================================================================
    // Declaration and lookup
    // ========================================================================

    /// Declares a local in the innermost scope unless the name already
    /// resolves.
    pub fn declare_local(&mut self, name: &EcoString, span: Span) {
        if self.find(name).is_some() {
            return;
        }
        if let Some(level) = self.levels.last_mut() {
            level.insert(name.clone(), span, BindingKind::Local);
        }
    }

    /// Declares a parameter in the innermost scope.
    ///
    /// Returns `Ok(true)` when a block parameter hides a local of an
    /// enclosing scope.
    ///
    /// # Errors
    ///
    /// Returns [`SemanticErrorKind::DuplicateArgument`] when the name is
    /// already a parameter of this scope. Names starting with `_` may repeat.
    pub fn declare_param(
        &mut self,
        name: &EcoString,
        span: Span,
    ) -> Result<bool, SemanticErrorKind> {
        let depth = self.levels.len();
        let Some(level) = self.levels.last() else {
            return Ok(false);
        };
        if let Some(slot) = level.get(name) {
            if level.variables[slot].kind == BindingKind::Parameter && !name.starts_with('_') {
                return Err(SemanticErrorKind::DuplicateArgument(name.clone()));
            }
            return Ok(false);
        }
        let shadows = level.kind.is_block()
            && !name.starts_with('_')
            && self.find_from(name, depth.saturating_sub(1)).is_some();
        if let Some(level) = self.levels.last_mut() {
            level.insert(name.clone(), span, BindingKind::Parameter);
        }
        Ok(shadows)
    }

    /// Declares a block-local variable (`|a; b|`), hiding any outer local
    /// of the same name.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateArgument` if the block already has a parameter or
    /// local of that name.
    pub fn declare_block_local(
        &mut self,
        name: &EcoString,
        span: Span,
    ) -> Result<(), SemanticErrorKind> {
        let Some(level) = self.levels.last_mut() else {
            return Ok(());
        };
        if level.get(name).is_some() {
            return Err(SemanticErrorKind::DuplicateArgument(name.clone()));
        }
        level.insert(name.clone(), span, BindingKind::Local);
        Ok(())
    }

    /// Resolves a local variable reference.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<LocalKind> {
        let (index, slot) = self.find(name)?;
        let innermost = self.levels.len() - 1;
        let depth = innermost - index;
        if depth == 0 && !self.levels[index].kind.is_block() {
            Some(LocalKind::Local { slot })
        } else {
            Some(LocalKind::Dynamic { depth, slot })
        }
    }

    /// Returns true if `name` is a visible local variable.
    #[must_use]
    pub fn is_local(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Resolves a reference and marks the variable as read.
    pub fn use_local(&mut self, name: &str) -> Option<LocalKind> {
        let kind = self.resolve(name)?;
        if let Some((index, slot)) = self.find(name) {
            self.levels[index].variables[slot].used = true;
        }
        Some(kind)
    }

    /// Returns the bindings of the innermost scope.
    pub fn current_scope_vars(&self) -> impl Iterator<Item = &Binding> {
        self.levels.last().into_iter().flat_map(|l| l.variables.iter())
    }

    fn find(&self, name: &str) -> Option<(usize, usize)> {
        self.find_from(name, self.levels.len())
    }

    /// Searches the levels below `end`, stopping after the nearest scope
    /// that does not see its parent.
    fn find_from(&self, name: &str, end: usize) -> Option<(usize, usize)> {
        for index in (0..end).rev() {
            let level = &self.levels[index];
            if let Some(slot) = level.get(name) {
                return Some((index, slot));
            }
            if !level.kind.is_block() {
                return None;
            }
        }
        None
    }

    // ========================================================================
    // Numbered parameters
    // ========================================================================

    /// Records that the innermost block has a `|...|` list.
    pub fn set_ordinary_params(&mut self) {
        if let Some(level) = self.levels.last_mut() {
            level.ordinary_params = true;
        }
    }

    /// Records a use of numbered parameter `_n`.
    ///
    /// Returns `Ok(false)` outside a block, where `_n` is an ordinary name.
    ///
    /// # Errors
    ///
    /// Returns an error when the block has ordinary parameters, when an
    /// enclosing block already uses numbered parameters, or when a block
    /// nested inside this one already did.
    pub fn use_numbered_param(&mut self, n: u8) -> Result<bool, SemanticErrorKind> {
        let innermost = self.levels.len() - 1;
        let level = &self.levels[innermost];
        if !level.kind.is_block() {
            return Ok(false);
        }
        if level.ordinary_params {
            return Err(SemanticErrorKind::OrdinaryParameterDefined);
        }
        for outer in self.levels[..innermost].iter().rev() {
            if !outer.kind.is_block() {
                break;
            }
            if outer.numbered_max > 0 {
                return Err(SemanticErrorKind::NumberedParameterInOuterBlock);
            }
        }
        if level.inner_numbered {
            return Err(SemanticErrorKind::NumberedParameterInInnerBlock);
        }
        let level = &mut self.levels[innermost];
        level.numbered_max = level.numbered_max.max(n);
        Ok(true)
    }

    /// Returns the highest numbered parameter the innermost scope used.
    #[must_use]
    pub fn numbered_params(&self) -> u8 {
        self.levels.last().map_or(0, |l| l.numbered_max)
    }

    // ========================================================================
    // Anonymous parameters
    // ========================================================================

    /// Records an anonymous parameter of the innermost scope.
    pub fn declare_anonymous(&mut self, which: Anonymous) {
        if let Some(level) = self.levels.last_mut() {
            level.anonymous |= which.bit();
        }
    }

    /// Returns true if the enclosing method declared the anonymous
    /// parameter, so a call may forward it.
    #[must_use]
    pub fn anonymous_declared(&self, which: Anonymous) -> bool {
        self.levels
            .iter()
            .rev()
            .find(|level| !level.kind.is_block())
            .is_some_and(|level| {
                level.kind == ScopeKind::Method && level.anonymous & which.bit() != 0
            })
    }
}

impl Default for ScopeTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn close(level: ScopeLevel) -> ClosedScope {
    let unused = level
        .variables
        .into_iter()
        .filter(|b| b.kind == BindingKind::Local && !b.used && !b.name.starts_with('_'))
        .map(|b| (b.name, b.defined_at))
        .collect();
    ClosedScope {
        unused,
        numbered_params: level.numbered_max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_span() -> Span {
        Span::default()
    }

    fn name(s: &str) -> EcoString {
        EcoString::from(s)
    }

    #[test]
    fn new_tracker_starts_at_top_level() {
        let scopes = ScopeTracker::new();
        assert_eq!(scopes.current_kind(), ScopeKind::TopLevel);
        assert!(!scopes.in_method());
        assert!(!scopes.in_block());
    }

    #[test]
    fn declare_and_resolve_local() {
        let mut scopes = ScopeTracker::new();
        scopes.declare_local(&name("x"), test_span());
        scopes.declare_local(&name("y"), test_span());
        assert_eq!(scopes.resolve("x"), Some(LocalKind::Local { slot: 0 }));
        assert_eq!(scopes.resolve("y"), Some(LocalKind::Local { slot: 1 }));
        assert_eq!(scopes.resolve("z"), None);
    }

    #[test]
    fn redeclaring_keeps_slot() {
        let mut scopes = ScopeTracker::new();
        scopes.declare_local(&name("x"), test_span());
        scopes.declare_local(&name("x"), test_span());
        assert_eq!(scopes.current_scope_vars().count(), 1);
    }

    #[test]
    fn method_hides_outer_locals() {
        let mut scopes = ScopeTracker::new();
        scopes.declare_local(&name("x"), test_span());
        scopes.push(ScopeKind::Method);
        assert!(!scopes.is_local("x"));
        assert!(scopes.in_method());
        scopes.pop();
        assert!(scopes.is_local("x"));
    }

    #[test]
    fn block_sees_outer_locals_as_dynamic() {
        let mut scopes = ScopeTracker::new();
        scopes.declare_local(&name("x"), test_span());
        scopes.push(ScopeKind::Block);
        scopes.declare_local(&name("y"), test_span());
        assert_eq!(scopes.resolve("x"), Some(LocalKind::Dynamic { depth: 1, slot: 0 }));
        assert_eq!(scopes.resolve("y"), Some(LocalKind::Dynamic { depth: 0, slot: 0 }));
        scopes.pop();
        assert!(!scopes.is_local("y"));
    }

    #[test]
    fn block_assignment_to_outer_local_does_not_redeclare() {
        let mut scopes = ScopeTracker::new();
        scopes.declare_local(&name("x"), test_span());
        scopes.push(ScopeKind::Block);
        scopes.declare_local(&name("x"), test_span());
        assert_eq!(scopes.current_scope_vars().count(), 0);
    }

    #[test]
    fn duplicate_parameter() {
        let mut scopes = ScopeTracker::new();
        scopes.push(ScopeKind::Method);
        assert_eq!(scopes.declare_param(&name("a"), test_span()), Ok(false));
        assert_eq!(
            scopes.declare_param(&name("a"), test_span()),
            Err(SemanticErrorKind::DuplicateArgument(name("a")))
        );
        assert_eq!(scopes.declare_param(&name("_"), test_span()), Ok(false));
        assert_eq!(scopes.declare_param(&name("_"), test_span()), Ok(false));
    }

    #[test]
    fn block_parameter_shadowing_reported() {
        let mut scopes = ScopeTracker::new();
        scopes.declare_local(&name("a"), test_span());
        scopes.push(ScopeKind::Block);
        assert_eq!(scopes.declare_param(&name("a"), test_span()), Ok(true));
        assert_eq!(scopes.declare_param(&name("b"), test_span()), Ok(false));
    }

    #[test]
    fn block_locals_hide_outer_locals() {
        let mut tracker = ScopeTracker::new();
        tracker.declare_local(&name("x"), test_span());
        tracker.push(ScopeKind::Block);
        tracker.declare_param(&name("a"), test_span()).unwrap();
        tracker.declare_block_local(&name("x"), test_span()).unwrap();
        assert_eq!(
            tracker.resolve("x"),
            Some(LocalKind::Dynamic { depth: 0, slot: 1 })
        );
        assert!(matches!(
            tracker.declare_block_local(&name("a"), test_span()),
            Err(SemanticErrorKind::DuplicateArgument(_))
        ));
        let closed = tracker.pop();
        assert_eq!(closed.unused.len(), 1);
        assert_eq!(closed.unused[0].0, "x");
    }

    #[test]
    fn unused_locals_reported_on_pop() {
        let mut scopes = ScopeTracker::new();
        scopes.push(ScopeKind::Method);
        scopes.declare_param(&name("arg"), test_span()).ok();
        scopes.declare_local(&name("used"), test_span());
        scopes.declare_local(&name("unused"), test_span());
        scopes.declare_local(&name("_ignored"), test_span());
        scopes.use_local("used");
        let closed = scopes.pop();
        assert_eq!(closed.unused.len(), 1);
        assert_eq!(closed.unused[0].0, "unused");
    }

    #[test]
    fn numbered_params_in_block() {
        let mut scopes = ScopeTracker::new();
        assert_eq!(scopes.use_numbered_param(1), Ok(false));
        scopes.push(ScopeKind::Block);
        assert_eq!(scopes.use_numbered_param(2), Ok(true));
        assert_eq!(scopes.use_numbered_param(1), Ok(true));
        assert_eq!(scopes.numbered_params(), 2);
        assert_eq!(scopes.pop().numbered_params, 2);
    }

    #[test]
    fn numbered_param_with_ordinary_params() {
        let mut scopes = ScopeTracker::new();
        scopes.push(ScopeKind::Block);
        scopes.set_ordinary_params();
        assert_eq!(
            scopes.use_numbered_param(1),
            Err(SemanticErrorKind::OrdinaryParameterDefined)
        );
    }

    #[test]
    fn numbered_param_in_nested_blocks() {
        let mut scopes = ScopeTracker::new();
        scopes.push(ScopeKind::Block);
        assert_eq!(scopes.use_numbered_param(1), Ok(true));
        scopes.push(ScopeKind::Block);
        assert_eq!(
            scopes.use_numbered_param(1),
            Err(SemanticErrorKind::NumberedParameterInOuterBlock)
        );
    }

    #[test]
    fn numbered_param_after_inner_block() {
        let mut scopes = ScopeTracker::new();
        scopes.push(ScopeKind::Block);
        scopes.push(ScopeKind::Block);
        assert_eq!(scopes.use_numbered_param(1), Ok(true));
        scopes.pop();
        assert_eq!(
            scopes.use_numbered_param(1),
            Err(SemanticErrorKind::NumberedParameterInInnerBlock)
        );
    }

    #[test]
    fn numbered_param_conflict_across_three_blocks() {
        // a { b { c { _1 } }; _1 }
        let mut scopes = ScopeTracker::new();
        scopes.push(ScopeKind::Block);
        scopes.push(ScopeKind::Block);
        scopes.push(ScopeKind::Block);
        assert_eq!(scopes.use_numbered_param(1), Ok(true));
        scopes.pop();
        scopes.pop();
        assert_eq!(
            scopes.use_numbered_param(1),
            Err(SemanticErrorKind::NumberedParameterInInnerBlock)
        );
    }

    #[test]
    fn sibling_blocks_may_both_use_numbered_params() {
        let mut scopes = ScopeTracker::new();
        scopes.push(ScopeKind::Block);
        assert_eq!(scopes.use_numbered_param(1), Ok(true));
        scopes.pop();
        scopes.push(ScopeKind::Block);
        assert_eq!(scopes.use_numbered_param(1), Ok(true));
    }

    #[test]
    fn anonymous_parameters_found_from_blocks() {
        let mut scopes = ScopeTracker::new();
        assert!(!scopes.anonymous_declared(Anonymous::Rest));
        scopes.push(ScopeKind::Method);
        scopes.declare_anonymous(Anonymous::Rest);
        scopes.push(ScopeKind::Block);
        assert!(scopes.anonymous_declared(Anonymous::Rest));
        assert!(!scopes.anonymous_declared(Anonymous::All));
    }
}
