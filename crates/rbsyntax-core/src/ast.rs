// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Abstract Syntax Tree (AST) definitions.
//!
//! The AST represents the structure of a Ruby program after parsing. Every
//! node carries a [`Span`] for error reporting and tooling.
//!
//! # Shape
//!
//! - [`Program`] is the root: the top-level statements of one source.
//! - [`Node`] pairs a [`NodeKind`] with its span. Children are boxed or held
//!   in vectors; the tree is owned and immutable once built.
//! - [`Params`] is the shared parameter list of methods, blocks and lambdas.
//!
//! Several source forms are normalized while parsing:
//!
//! - `unless c; a; else; b; end` becomes `If { cond: c, then: b, else: a }`.
//! - `c ? a : b` becomes an `If`.
//! - `!x` and `not x` become calls of `!`; unary minus on a non-literal
//!   becomes a call of `-@`.
//! - `-2 ** 2` becomes `(2 ** 2).-@`.
//! - A character literal `?a` becomes a `Str`.
//! - Anonymous `...` forwarding appears as an anonymous rest, keyword rest
//!   and block parameter in the definition, and as the matching splat,
//!   double splat and block pass at each forwarding call.
//!
//! # Example
//!
//! ```ignore
//! // Source: x = 3 + 4
//! Program {
//!     statements: vec![Node {
//!         kind: NodeKind::Assign {
//!             target: Box::new(Node { kind: NodeKind::LocalVar { name: "x".into(), kind: LocalKind::Local { slot: 0 } }, .. }),
//!             value: Box::new(Node { kind: NodeKind::Call { receiver: Some(3), name: "+".into(), args: vec![4], .. }, .. }),
//!         },
//!         span: ...
//!     }],
//!     span: ...
//! }
//! ```

use ecow::EcoString;

use crate::source_analysis::{NumericLiteral, ShareableConstantValue, Span};

/// Root of a parsed source.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// The top-level statements, in order.
    pub statements: Vec<Node>,
    /// Source location spanning the whole program.
    pub span: Span,
}

impl Program {
    /// Creates a program from its statements.
    #[must_use]
    pub fn new(statements: Vec<Node>, span: Span) -> Self {
        Self { statements, span }
    }
}

/// Dismantles the tree with an explicit stack, so dropping a deeply
/// left-nested program (`x if y if y ...`) does not recurse per level.
impl Drop for Program {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.statements);
        while let Some(node) = pending.pop() {
            node.kind.detach_children(&mut pending);
        }
    }
}

/// An AST node: what it is and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// The node's variant and children.
    pub kind: NodeKind,
    /// Source location of the whole construct.
    pub span: Span,
}

impl Node {
    /// Creates a node.
    #[must_use]
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns the span of this node.
    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }

    /// Returns true for the placeholder left where a semantic error was
    /// recorded.
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        matches!(self.kind, NodeKind::Invalid)
    }

    /// Returns true for literals whose value is known without evaluation.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        match &self.kind {
            NodeKind::Nil
            | NodeKind::True
            | NodeKind::False
            | NodeKind::Number(_)
            | NodeKind::Str { .. }
            | NodeKind::Symbol(_)
            | NodeKind::Regexp { .. } => true,
            NodeKind::Array(items) => items.iter().all(Self::is_literal),
            NodeKind::Hash(pairs) => pairs.iter().all(|pair| match &pair.kind {
                NodeKind::Pair { key, value } => key.is_literal() && value.is_literal(),
                _ => false,
            }),
            NodeKind::Range { low, high, .. } => {
                low.as_deref().is_none_or(Self::is_literal)
                    && high.as_deref().is_none_or(Self::is_literal)
            }
            _ => false,
        }
    }

    /// Returns true for control transfers that have no value.
    #[must_use]
    pub const fn is_void(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Return(_)
                | NodeKind::Break(_)
                | NodeKind::Next(_)
                | NodeKind::Redo
                | NodeKind::Retry
        )
    }
}

/// How a local variable reference was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalKind {
    /// A local of the innermost method, class or top-level scope.
    Local {
        /// Slot index within that scope.
        slot: usize,
    },
    /// A local captured by or declared in a block.
    Dynamic {
        /// How many block scopes out the variable lives (0 = innermost).
        depth: usize,
        /// Slot index within that scope.
        slot: usize,
    },
}

/// Every kind of AST node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // ------------------------------------------------------------------
    // Literals
    // ------------------------------------------------------------------
    /// `nil`
    Nil,
    /// `true`
    True,
    /// `false`
    False,
    /// `self`
    SelfRef,
    /// `__FILE__`, already replaced by the source name.
    SourceFile(EcoString),
    /// `__LINE__`, already replaced by the line number.
    SourceLine(u32),
    /// `__ENCODING__`, already replaced by the encoding name.
    SourceEncoding(EcoString),
    /// A numeric literal.
    Number(NumericLiteral),
    /// A string with no interpolation.
    Str {
        /// The string's bytes after escape processing.
        value: Vec<u8>,
        /// Whether `frozen_string_literal` was in effect.
        frozen: bool,
    },
    /// A string with `#{}` or `#@var` parts. Parts are `Str` and `Embedded`
    /// nodes or variable nodes.
    InterpolatedStr(Vec<Node>),
    /// A backtick command string.
    XStr(Vec<Node>),
    /// `:name` or `:"name"`.
    Symbol(EcoString),
    /// `:"a#{b}"`.
    InterpolatedSymbol(Vec<Node>),
    /// A regular expression literal.
    Regexp {
        /// Content parts, as in `InterpolatedStr`.
        parts: Vec<Node>,
        /// The option letters after the closing delimiter.
        options: EcoString,
    },
    /// The statements of one `#{...}`.
    Embedded(Vec<Node>),
    /// `[a, *b]` or a word list.
    Array(Vec<Node>),
    /// `{k => v, **h}`: `Pair` and `DoubleSplat` nodes.
    Hash(Vec<Node>),
    /// Brace-less hash at the end of an argument list.
    KeywordHash(Vec<Node>),
    /// One `key => value` or `key: value` entry.
    Pair {
        /// The key; a `Symbol` for labels.
        key: Box<Node>,
        /// The value.
        value: Box<Node>,
    },
    /// `a..b`, `a...b`, `..b` or `a..`.
    Range {
        /// Lower bound, absent for beginless ranges.
        low: Option<Box<Node>>,
        /// Upper bound, absent for endless ranges.
        high: Option<Box<Node>>,
        /// `...` rather than `..`.
        exclusive: bool,
    },
    /// `->(x) { body }`.
    Lambda {
        /// The parameter list, if one was written.
        params: Option<Box<Params>>,
        /// The body statements.
        body: Box<Node>,
        /// Highest numbered parameter used, 0 if none.
        numbered_params: u8,
    },

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------
    /// A resolved local variable.
    LocalVar {
        /// The name.
        name: EcoString,
        /// Where it lives.
        kind: LocalKind,
    },
    /// `@name`
    InstanceVar(EcoString),
    /// `@@name`
    ClassVar(EcoString),
    /// `$name`
    GlobalVar(EcoString),
    /// `$1`
    NthRef(u32),
    /// `` $& ``, `` $` ``, `$'` or `$+`.
    BackRef(char),
    /// A constant looked up lexically.
    Const(EcoString),
    /// `Scope::Name` or `::Name`.
    ScopedConst {
        /// The scope; `None` for `::Name`.
        scope: Option<Box<Node>>,
        /// The constant name.
        name: EcoString,
    },

    // ------------------------------------------------------------------
    // Assignment
    // ------------------------------------------------------------------
    /// `target = value`.
    Assign {
        /// A variable, constant, `AttrTarget` or `IndexTarget`.
        target: Box<Node>,
        /// The assigned value.
        value: Box<Node>,
    },
    /// `target op= value` for variables and constants, including `||=`
    /// and `&&=`.
    OpAssign {
        /// The variable or constant.
        target: Box<Node>,
        /// The operator without `=`.
        op: EcoString,
        /// The right-hand side.
        value: Box<Node>,
    },
    /// `recv[args] op= value`.
    IndexOpAssign {
        /// The indexed receiver.
        receiver: Box<Node>,
        /// The index arguments.
        args: Vec<Node>,
        /// The operator without `=`.
        op: EcoString,
        /// The right-hand side.
        value: Box<Node>,
    },
    /// `recv.name op= value`.
    AttrOpAssign {
        /// The receiver.
        receiver: Box<Node>,
        /// The attribute name.
        name: EcoString,
        /// `&.` rather than `.`.
        safe_nav: bool,
        /// The operator without `=`.
        op: EcoString,
        /// The right-hand side.
        value: Box<Node>,
    },
    /// `a, b = value`.
    MultiAssign {
        /// A `MultiTarget`.
        targets: Box<Node>,
        /// The right-hand side; an `Array` when several values are given.
        value: Box<Node>,
    },
    /// The left-hand side of a multiple assignment or a destructuring
    /// parameter.
    MultiTarget {
        /// Targets before the splat.
        pre: Vec<Node>,
        /// The splat target; `Splat(None)` for a bare `*`.
        rest: Option<Box<Node>>,
        /// Targets after the splat.
        post: Vec<Node>,
    },
    /// `recv.name =` as an assignment target.
    AttrTarget {
        /// The receiver.
        receiver: Box<Node>,
        /// The attribute name, without `=`.
        name: EcoString,
        /// `&.` rather than `.`.
        safe_nav: bool,
    },
    /// `recv[args] =` as an assignment target.
    IndexTarget {
        /// The receiver.
        receiver: Box<Node>,
        /// The index arguments.
        args: Vec<Node>,
    },
    /// A constant assignment's value under `shareable_constant_value`.
    ShareableConstant {
        /// The setting in effect.
        mode: ShareableConstantValue,
        /// The assigned value.
        value: Box<Node>,
    },

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------
    /// A method call, with or without receiver. Operators are calls too.
    Call {
        /// The receiver; `None` for calls on `self`.
        receiver: Option<Box<Node>>,
        /// The method name.
        name: EcoString,
        /// The arguments.
        args: Vec<Node>,
        /// A literal block, if given.
        block: Option<Box<Node>>,
        /// `&.` rather than `.`.
        safe_nav: bool,
    },
    /// A `{ }` or `do end` block attached to a call.
    Block {
        /// The `|...|` parameters, if written.
        params: Option<Box<Params>>,
        /// The body.
        body: Box<Node>,
        /// Highest numbered parameter used, 0 if none.
        numbered_params: u8,
    },
    /// `&blk`, or an anonymous `&`.
    BlockPass(Option<Box<Node>>),
    /// `*args`, or an anonymous `*`.
    Splat(Option<Box<Node>>),
    /// `**opts`, or an anonymous `**`.
    DoubleSplat(Option<Box<Node>>),
    /// `super(args)` or `super args`.
    Super {
        /// The explicit arguments.
        args: Vec<Node>,
        /// A literal block, if given.
        block: Option<Box<Node>>,
    },
    /// Bare `super`, forwarding the current arguments.
    ZSuper {
        /// A literal block, if given.
        block: Option<Box<Node>>,
    },
    /// `yield args`.
    Yield(Vec<Node>),
    /// `defined?(expr)`.
    Defined(Box<Node>),
    /// `a && b` or `a and b`.
    And {
        /// Left operand.
        left: Box<Node>,
        /// Right operand.
        right: Box<Node>,
    },
    /// `a || b` or `a or b`.
    Or {
        /// Left operand.
        left: Box<Node>,
        /// Right operand.
        right: Box<Node>,
    },

    // ------------------------------------------------------------------
    // Control flow
    // ------------------------------------------------------------------
    /// `if`, `unless`, `elsif`, ternaries and their modifier forms.
    If {
        /// The condition.
        cond: Box<Node>,
        /// Evaluated when the condition is true.
        then_branch: Option<Box<Node>>,
        /// Evaluated when the condition is false.
        else_branch: Option<Box<Node>>,
    },
    /// `while` loops and modifiers.
    While {
        /// The loop condition.
        cond: Box<Node>,
        /// The loop body.
        body: Box<Node>,
        /// `begin ... end while c`: the body runs once before the test.
        do_while: bool,
    },
    /// `until` loops and modifiers.
    Until {
        /// The loop condition.
        cond: Box<Node>,
        /// The loop body.
        body: Box<Node>,
        /// `begin ... end until c`: the body runs once before the test.
        do_while: bool,
    },
    /// `for target in iter`.
    For {
        /// The loop variable or `MultiTarget`.
        target: Box<Node>,
        /// The iterated expression.
        iter: Box<Node>,
        /// The loop body.
        body: Box<Node>,
    },
    /// `case subject when ...`.
    Case {
        /// The subject, absent for `case` with no expression.
        subject: Option<Box<Node>>,
        /// The `When` clauses.
        whens: Vec<Node>,
        /// The `else` branch.
        else_branch: Option<Box<Node>>,
    },
    /// One `when a, b then body`.
    When {
        /// The tested values.
        conditions: Vec<Node>,
        /// The clause body.
        body: Option<Box<Node>>,
    },
    /// `case subject in ...`.
    CaseMatch {
        /// The matched value.
        subject: Box<Node>,
        /// The `InClause`s.
        clauses: Vec<Node>,
        /// The `else` branch.
        else_branch: Option<Box<Node>>,
    },
    /// One `in pattern if guard then body`.
    InClause {
        /// The pattern.
        pattern: Box<Node>,
        /// A `Guard`, if given.
        guard: Option<Box<Node>>,
        /// The clause body.
        body: Option<Box<Node>>,
    },
    /// `if cond` or `unless cond` after an `in` pattern.
    Guard {
        /// The guard condition.
        cond: Box<Node>,
        /// `unless` rather than `if`.
        negated: bool,
    },
    /// `value => pattern` (raises on mismatch) or `value in pattern`
    /// (returns a boolean).
    PatternTest {
        /// The tested value.
        value: Box<Node>,
        /// The pattern.
        pattern: Box<Node>,
        /// `=>` rather than `in`.
        raises: bool,
    },
    /// `break value`.
    Break(Option<Box<Node>>),
    /// `next value`.
    Next(Option<Box<Node>>),
    /// `return value`.
    Return(Option<Box<Node>>),
    /// `redo`
    Redo,
    /// `retry`
    Retry,
    /// A statement sequence.
    Statements(Vec<Node>),
    /// `( stmts )`; empty parentheses evaluate to nil.
    Parens(Vec<Node>),
    /// `begin ... end`.
    BeginBlock(Box<Node>),
    /// A body with `rescue`, `else` or `ensure` clauses.
    Body {
        /// The protected statements.
        statements: Box<Node>,
        /// The `RescueClause`s.
        rescues: Vec<Node>,
        /// Runs when nothing was raised.
        else_branch: Option<Box<Node>>,
        /// Always runs.
        ensure: Option<Box<Node>>,
    },
    /// `rescue A, B => e then body`.
    RescueClause {
        /// The exception classes; empty means `StandardError`.
        exceptions: Vec<Node>,
        /// Where the exception is stored.
        target: Option<Box<Node>>,
        /// The handler body.
        body: Option<Box<Node>>,
    },
    /// `expr rescue fallback`.
    RescueModifier {
        /// The protected expression.
        body: Box<Node>,
        /// The value when it raises.
        rescue: Box<Node>,
    },

    // ------------------------------------------------------------------
    // Definitions
    // ------------------------------------------------------------------
    /// `def name(params) body end` or `def self.name`.
    Def {
        /// The singleton receiver, if any.
        receiver: Option<Box<Node>>,
        /// The method name.
        name: EcoString,
        /// The parameter list.
        params: Box<Params>,
        /// The body.
        body: Option<Box<Node>>,
        /// `def name = expr`.
        endless: bool,
    },
    /// `class Path < Superclass`.
    Class {
        /// The constant path.
        path: Box<Node>,
        /// The superclass expression.
        superclass: Option<Box<Node>>,
        /// The body.
        body: Option<Box<Node>>,
    },
    /// `class << target`.
    SingletonClass {
        /// The object whose singleton class is opened.
        target: Box<Node>,
        /// The body.
        body: Option<Box<Node>>,
    },
    /// `module Path`.
    Module {
        /// The constant path.
        path: Box<Node>,
        /// The body.
        body: Option<Box<Node>>,
    },
    /// `alias new old` for methods; both names are `Symbol`s.
    Alias {
        /// The new name.
        new_name: Box<Node>,
        /// The existing name.
        old_name: Box<Node>,
    },
    /// `alias $new $old`.
    GlobalAlias {
        /// The new global.
        new_name: EcoString,
        /// The existing global.
        old_name: EcoString,
    },
    /// `undef a, b`; the names are `Symbol`s.
    Undef(Vec<Node>),
    /// `BEGIN { }`.
    PreExecution(Box<Node>),
    /// `END { }`.
    PostExecution(Box<Node>),
    /// A plain parameter name.
    Arg(EcoString),

    // ------------------------------------------------------------------
    // Patterns
    // ------------------------------------------------------------------
    /// `Const[a, *r, b]` or `[a, b]`.
    ArrayPattern {
        /// The constant before the brackets.
        constant: Option<Box<Node>>,
        /// Patterns before the splat.
        pre: Vec<Node>,
        /// A `SplatPattern`.
        rest: Option<Box<Node>>,
        /// Patterns after the splat.
        post: Vec<Node>,
    },
    /// `[*, x, *]`.
    FindPattern {
        /// The constant before the brackets.
        constant: Option<Box<Node>>,
        /// The leading `SplatPattern`.
        pre_rest: Box<Node>,
        /// The patterns searched for.
        middle: Vec<Node>,
        /// The trailing `SplatPattern`.
        post_rest: Box<Node>,
    },
    /// `Const(k: v, **rest)` or `{k: v}`.
    HashPattern {
        /// The constant before the parentheses.
        constant: Option<Box<Node>>,
        /// The `PatternPair`s.
        pairs: Vec<Node>,
        /// A `KeywordRestPattern` or `NoKeywordsPattern`.
        rest: Option<Box<Node>>,
    },
    /// `key: pattern` or `key:` (binding `key`).
    PatternPair {
        /// The key.
        key: EcoString,
        /// The value pattern; `None` binds a local named after the key.
        value: Option<Box<Node>>,
    },
    /// `*name` or `*` in an array or find pattern.
    SplatPattern(Option<EcoString>),
    /// `**name` or `**` in a hash pattern.
    KeywordRestPattern(Option<EcoString>),
    /// `**nil`.
    NoKeywordsPattern,
    /// `a | b | c`.
    AlternativePattern(Vec<Node>),
    /// `pattern => name`.
    CapturePattern {
        /// The pattern.
        pattern: Box<Node>,
        /// The bound local.
        name: EcoString,
    },
    /// A bare name that binds the matched value.
    MatchVar(EcoString),
    /// `^name`, `^@ivar`, `^$gvar`.
    PinnedVar(Box<Node>),
    /// `^(expr)`.
    PinnedExpr(Box<Node>),

    /// Placeholder for a construct that produced a semantic error.
    Invalid,
}

impl NodeKind {
    /// Moves every child node into `out`, leaving the kind without
    /// descendants.
    fn detach_children(self, out: &mut Vec<Node>) {
        match self {
            Self::InterpolatedStr(nodes)
            | Self::XStr(nodes)
            | Self::InterpolatedSymbol(nodes)
            | Self::Regexp { parts: nodes, .. }
            | Self::Embedded(nodes)
            | Self::Array(nodes)
            | Self::Hash(nodes)
            | Self::KeywordHash(nodes)
            | Self::Yield(nodes)
            | Self::Statements(nodes)
            | Self::Parens(nodes)
            | Self::Undef(nodes)
            | Self::AlternativePattern(nodes) => out.extend(nodes),
            Self::Pair { key: a, value: b }
            | Self::Assign {
                target: a,
                value: b,
            }
            | Self::OpAssign {
                target: a,
                value: b,
                ..
            }
            | Self::AttrOpAssign {
                receiver: a,
                value: b,
                ..
            }
            | Self::MultiAssign {
                targets: a,
                value: b,
            }
            | Self::And { left: a, right: b }
            | Self::Or { left: a, right: b }
            | Self::While {
                cond: a, body: b, ..
            }
            | Self::Until {
                cond: a, body: b, ..
            }
            | Self::PatternTest {
                value: a,
                pattern: b,
                ..
            }
            | Self::RescueModifier { body: a, rescue: b }
            | Self::Alias {
                new_name: a,
                old_name: b,
            } => out.extend([*a, *b]),
            Self::ShareableConstant { value: a, .. }
            | Self::AttrTarget { receiver: a, .. }
            | Self::Defined(a)
            | Self::Guard { cond: a, .. }
            | Self::BeginBlock(a)
            | Self::PreExecution(a)
            | Self::PostExecution(a)
            | Self::CapturePattern { pattern: a, .. }
            | Self::PinnedVar(a)
            | Self::PinnedExpr(a) => out.push(*a),
            Self::ScopedConst { scope: a, .. }
            | Self::BlockPass(a)
            | Self::Splat(a)
            | Self::DoubleSplat(a)
            | Self::ZSuper { block: a }
            | Self::Break(a)
            | Self::Next(a)
            | Self::Return(a)
            | Self::PatternPair { value: a, .. } => push_boxed(out, a),
            Self::Range { low, high, .. } => {
                push_boxed(out, low);
                push_boxed(out, high);
            }
            Self::Lambda { params, body, .. } | Self::Block { params, body, .. } => {
                out.push(*body);
                if let Some(params) = params {
                    (*params).detach_children(out);
                }
            }
            Self::IndexOpAssign {
                receiver,
                args,
                value,
                ..
            } => {
                out.extend([*receiver, *value]);
                out.extend(args);
            }
            Self::MultiTarget { pre, rest, post } => {
                out.extend(pre);
                out.extend(post);
                push_boxed(out, rest);
            }
            Self::IndexTarget { receiver, args } => {
                out.push(*receiver);
                out.extend(args);
            }
            Self::Call {
                receiver,
                args,
                block,
                ..
            } => {
                out.extend(args);
                push_boxed(out, receiver);
                push_boxed(out, block);
            }
            Self::Super { args, block } => {
                out.extend(args);
                push_boxed(out, block);
            }
            Self::If {
                cond,
                then_branch,
                else_branch,
            } => {
                out.push(*cond);
                push_boxed(out, then_branch);
                push_boxed(out, else_branch);
            }
            Self::For { target, iter, body } => out.extend([*target, *iter, *body]),
            Self::Case {
                subject,
                whens,
                else_branch,
            } => {
                out.extend(whens);
                push_boxed(out, subject);
                push_boxed(out, else_branch);
            }
            Self::ArrayPattern {
                constant,
                pre,
                rest,
                post,
            } => {
                out.extend(pre);
                out.extend(post);
                push_boxed(out, constant);
                push_boxed(out, rest);
            }
            Self::When { conditions, body } => {
                out.extend(conditions);
                push_boxed(out, body);
            }
            Self::CaseMatch {
                subject,
                clauses,
                else_branch,
            } => {
                out.push(*subject);
                out.extend(clauses);
                push_boxed(out, else_branch);
            }
            Self::InClause {
                pattern,
                guard,
                body,
            } => {
                out.push(*pattern);
                push_boxed(out, guard);
                push_boxed(out, body);
            }
            Self::Body {
                statements,
                rescues,
                else_branch,
                ensure,
            } => {
                out.push(*statements);
                out.extend(rescues);
                push_boxed(out, else_branch);
                push_boxed(out, ensure);
            }
            Self::RescueClause {
                exceptions,
                target,
                body,
            } => {
                out.extend(exceptions);
                push_boxed(out, target);
                push_boxed(out, body);
            }
            Self::Def {
                receiver,
                params,
                body,
                ..
            } => {
                push_boxed(out, receiver);
                push_boxed(out, body);
                (*params).detach_children(out);
            }
            Self::Class {
                path,
                superclass,
                body,
            } => {
                out.push(*path);
                push_boxed(out, superclass);
                push_boxed(out, body);
            }
            Self::SingletonClass { target: a, body }
            | Self::Module { path: a, body } => {
                out.push(*a);
                push_boxed(out, body);
            }
            Self::FindPattern {
                constant,
                pre_rest,
                middle,
                post_rest,
            } => {
                out.extend([*pre_rest, *post_rest]);
                out.extend(middle);
                push_boxed(out, constant);
            }
            Self::HashPattern {
                constant,
                pairs,
                rest,
            } => {
                out.extend(pairs);
                push_boxed(out, constant);
                push_boxed(out, rest);
            }
            _ => {}
        }
    }
}

fn push_boxed(out: &mut Vec<Node>, node: Option<Box<Node>>) {
    out.extend(node.map(|node| *node));
}

/// A parameter list of a method, block or lambda.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Params {
    /// Leading required parameters: `Arg` or `MultiTarget` nodes.
    pub required: Vec<Node>,
    /// `name = default` parameters.
    pub optional: Vec<OptionalParam>,
    /// `*name` or `*`.
    pub rest: Option<RestParam>,
    /// Required parameters after the rest parameter.
    pub post: Vec<Node>,
    /// `name:` and `name: default` parameters.
    pub keywords: Vec<KeywordParam>,
    /// `**name`, `**` or `**nil`.
    pub keyword_rest: Option<KeywordRestParam>,
    /// `&name` or `&`.
    pub block: Option<BlockParam>,
    /// The list was `(...)` or ended in `...`.
    pub forwarding: bool,
    /// A block list ending in a comma, `|a,|`, which splats like `|a, *|`.
    pub trailing_comma: bool,
    /// Block-local variables after `;`.
    pub block_locals: Vec<Node>,
    /// Source location of the list.
    pub span: Span,
}

impl Params {
    fn detach_children(self, out: &mut Vec<Node>) {
        out.extend(self.required);
        out.extend(self.post);
        out.extend(self.block_locals);
        out.extend(self.optional.into_iter().map(|param| param.default));
        out.extend(self.keywords.into_iter().filter_map(|param| param.default));
    }

    /// Returns true if no parameter of any kind is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
            && self.optional.is_empty()
            && self.rest.is_none()
            && self.post.is_empty()
            && self.keywords.is_empty()
            && self.keyword_rest.is_none()
            && self.block.is_none()
            && !self.forwarding
            && self.block_locals.is_empty()
    }
}

/// `name = default`.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionalParam {
    /// The parameter name.
    pub name: EcoString,
    /// The default value.
    pub default: Node,
    /// Source location.
    pub span: Span,
}

/// `*name` or `*`.
#[derive(Debug, Clone, PartialEq)]
pub struct RestParam {
    /// The name, absent when anonymous.
    pub name: Option<EcoString>,
    /// Source location.
    pub span: Span,
}

/// `name:` or `name: default`.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordParam {
    /// The keyword name.
    pub name: EcoString,
    /// The default; `None` makes the keyword required.
    pub default: Option<Node>,
    /// Source location.
    pub span: Span,
}

/// The keyword rest parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum KeywordRestParam {
    /// `**name`
    Named(EcoString, Span),
    /// `**`
    Anonymous(Span),
    /// `**nil`: no keywords accepted.
    NoKeywords(Span),
}

/// `&name` or `&`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockParam {
    /// The name, absent when anonymous.
    pub name: Option<EcoString>,
    /// Source location.
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: NodeKind) -> Node {
        Node::new(kind, Span::default())
    }

    #[test]
    fn literal_detection() {
        assert!(node(NodeKind::Nil).is_literal());
        assert!(node(NodeKind::Array(vec![node(NodeKind::True)])).is_literal());
        assert!(
            !node(NodeKind::Array(vec![node(NodeKind::InstanceVar("@a".into()))])).is_literal()
        );
        let range = NodeKind::Range {
            low: None,
            high: Some(Box::new(node(NodeKind::Symbol("a".into())))),
            exclusive: false,
        };
        assert!(node(range).is_literal());
    }

    #[test]
    fn void_detection() {
        assert!(node(NodeKind::Return(None)).is_void());
        assert!(node(NodeKind::Retry).is_void());
        assert!(!node(NodeKind::Nil).is_void());
    }

    #[test]
    fn empty_params() {
        let mut params = Params::default();
        assert!(params.is_empty());
        params.forwarding = true;
        assert!(!params.is_empty());
    }
}
