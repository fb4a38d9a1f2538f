// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Control structures.
//!
//! `if`/`unless`, loops, `case` in both its `when` and pattern-matching
//! forms, `begin` blocks, and the jump keywords. Every construct closed by
//! `end` is checked for indentation against the line that opened it.

use crate::ast::{Node, NodeKind};
use crate::semantic_analysis::extract_pattern_bindings;

use super::statements::non_empty;
use super::{DiagnosticCategory, Keyword, LexState, PResult, Parser, Span, TokenKind};

impl Parser<'_> {
    // ========================================================================
    // Conditionals
    // ========================================================================

    /// Parses `if`/`elsif`/`else`/`end`, or `unless`/`else`/`end` with the
    /// branches swapped.
    pub(super) fn parse_if(&mut self, negated: bool) -> PResult<Node> {
        let open = self.advance()?.span();
        let keyword = if negated { Keyword::Unless } else { Keyword::If };

        // (keyword span, condition, body) for `if` and each `elsif`.
        let mut arms: Vec<(Span, Node, Option<Box<Node>>)> = Vec::new();
        let mut arm_start = open;
        loop {
            let cond = self.parse_expr()?;
            let cond = self.condition(cond);
            self.parse_then()?;
            let body = non_empty(self.parse_statements_node()?);
            arms.push((arm_start, cond, body));
            if negated || !self.check_keyword(Keyword::Elsif) {
                break;
            }
            arm_start = self.advance()?.span();
        }

        let mut else_branch = if self.match_keyword(Keyword::Else)? {
            non_empty(self.parse_statements_node()?)
        } else {
            None
        };
        let close = self.expect_keyword(Keyword::End)?.span();
        self.check_end_alignment(open, keyword, close);

        // Fold the `elsif` chain from the innermost arm outwards.
        let mut node = None;
        while let Some((start, cond, body)) = arms.pop() {
            let (then_branch, otherwise) = if negated {
                (else_branch.take(), body)
            } else {
                (body, node.take().or_else(|| else_branch.take()))
            };
            node = Some(Box::new(Node::new(
                NodeKind::If {
                    cond: Box::new(cond),
                    then_branch,
                    else_branch: otherwise,
                },
                start.merge(close),
            )));
        }
        match node {
            Some(node) => Ok(*node),
            None => self.unexpected(&[]),
        }
    }

    /// Consumes `then`, or a terminator optionally followed by `then`.
    pub(super) fn parse_then(&mut self) -> PResult<()> {
        if self.match_keyword(Keyword::Then)? {
            return Ok(());
        }
        if !self.current_kind().is_terminator() {
            return self.unexpected(&["'then'", "';'", "'\\n'"]);
        }
        self.skip_terms()?;
        self.match_keyword(Keyword::Then)?;
        Ok(())
    }

    // ========================================================================
    // Loops
    // ========================================================================

    /// Parses `while cond do body end` or `until cond do body end`.
    pub(super) fn parse_while(&mut self, until: bool) -> PResult<Node> {
        let open = self.span();
        let cond = self.parse_loop_condition()?;
        let cond = Box::new(self.condition(cond));
        self.parse_loop_do()?;
        let body = Box::new(self.parse_statements_node()?);
        let close = self.expect_keyword(Keyword::End)?.span();
        let keyword = if until { Keyword::Until } else { Keyword::While };
        self.check_end_alignment(open, keyword, close);
        let span = open.merge(close);
        let kind = if until {
            NodeKind::Until {
                cond,
                body,
                do_while: false,
            }
        } else {
            NodeKind::While {
                cond,
                body,
                do_while: false,
            }
        };
        Ok(Node::new(kind, span))
    }

    /// Consumes the current keyword and parses the expression after it with
    /// the lexer's condition stack pushed, so `do` ends the condition.
    fn parse_loop_condition(&mut self) -> PResult<Node> {
        self.lexer_mut().cond_push(true);
        let cond = match self.advance() {
            Ok(_) => self.parse_expr(),
            Err(err) => Err(err),
        };
        self.lexer_mut().cond_pop();
        cond
    }

    fn parse_loop_do(&mut self) -> PResult<()> {
        if self.match_keyword(Keyword::DoCond)? {
            return Ok(());
        }
        if !self.current_kind().is_terminator() {
            return self.unexpected(&["'do'", "';'", "'\\n'"]);
        }
        self.skip_terms()
    }

    /// Parses `for targets in iterable do body end`.
    pub(super) fn parse_for(&mut self) -> PResult<Node> {
        let open = self.advance()?.span();
        let first = self.parse_mlhs_item()?;
        let target = if self.match_token(&TokenKind::Comma)? {
            self.parse_mlhs_list(vec![first])?
        } else {
            first
        };
        if !self.check_keyword(Keyword::In) {
            return self.unexpected(&["'in'"]);
        }
        let iter = self.parse_loop_condition()?;
        self.value_expr(&iter);
        self.parse_loop_do()?;
        let body = self.parse_statements_node()?;
        let close = self.expect_keyword(Keyword::End)?.span();
        self.check_end_alignment(open, Keyword::For, close);
        Ok(Node::new(
            NodeKind::For {
                target: Box::new(target),
                iter: Box::new(iter),
                body: Box::new(body),
            },
            open.merge(close),
        ))
    }

    // ========================================================================
    // Case
    // ========================================================================

    /// Parses `case` with `when` clauses or `in` patterns.
    pub(super) fn parse_case(&mut self) -> PResult<Node> {
        let open = self.advance()?.span();
        let no_subject =
            self.current_kind().is_terminator() || self.check_keyword(Keyword::When);
        let subject = if no_subject {
            None
        } else {
            let subject = self.parse_expr()?;
            self.value_expr(&subject);
            Some(subject)
        };
        self.skip_terms()?;
        match self.current_kind().keyword() {
            Some(Keyword::When) => self.parse_case_when(open, subject),
            Some(Keyword::In) => match subject {
                Some(subject) => self.parse_case_in(open, subject),
                None => self.unexpected(&["'when'"]),
            },
            _ => self.unexpected(&["'when'", "'in'"]),
        }
    }

    fn parse_case_when(&mut self, open: Span, subject: Option<Node>) -> PResult<Node> {
        let mut whens = Vec::new();
        let mut seen: Vec<NodeKind> = Vec::new();
        while self.check_keyword(Keyword::When) {
            let start = self.advance()?.span();
            let mut conditions = Vec::new();
            loop {
                let cond = self.parse_mrhs_item()?;
                if is_when_literal(&cond) {
                    if seen.contains(&cond.kind) {
                        self.warn(
                            DiagnosticCategory::DuplicateWhen,
                            "duplicated 'when' clause with the same literal",
                            cond.span,
                        );
                    } else {
                        seen.push(cond.kind.clone());
                    }
                }
                conditions.push(cond);
                if !self.match_token(&TokenKind::Comma)? {
                    break;
                }
                self.skip_newlines()?;
            }
            self.parse_then()?;
            let body = non_empty(self.parse_statements_node()?);
            whens.push(Node::new(
                NodeKind::When { conditions, body },
                start.merge(self.prev_span()),
            ));
        }
        let else_branch = self.parse_case_else()?;
        let close = self.expect_keyword(Keyword::End)?.span();
        self.check_end_alignment(open, Keyword::Case, close);
        Ok(Node::new(
            NodeKind::Case {
                subject: subject.map(Box::new),
                whens,
                else_branch,
            },
            open.merge(close),
        ))
    }

    fn parse_case_in(&mut self, open: Span, subject: Node) -> PResult<Node> {
        let mut clauses = Vec::new();
        let mut seen: Vec<NodeKind> = Vec::new();
        while self.check_keyword(Keyword::In) {
            let clause = self.parse_in_clause()?;
            if let NodeKind::InClause { pattern, .. } = &clause.kind {
                if is_when_literal(pattern) {
                    if seen.contains(&pattern.kind) {
                        self.warn(
                            DiagnosticCategory::DuplicateWhen,
                            "duplicated 'in' clause with the same literal",
                            pattern.span,
                        );
                    } else {
                        seen.push(pattern.kind.clone());
                    }
                }
            }
            clauses.push(clause);
        }
        let else_branch = self.parse_case_else()?;
        let close = self.expect_keyword(Keyword::End)?.span();
        self.check_end_alignment(open, Keyword::Case, close);
        Ok(Node::new(
            NodeKind::CaseMatch {
                subject: Box::new(subject),
                clauses,
                else_branch,
            },
            open.merge(close),
        ))
    }

    fn parse_case_else(&mut self) -> PResult<Option<Box<Node>>> {
        if self.match_keyword(Keyword::Else)? {
            Ok(Some(Box::new(self.parse_statements_node()?)))
        } else {
            Ok(None)
        }
    }

    /// Parses `in pattern [if|unless guard] then body`.
    fn parse_in_clause(&mut self) -> PResult<Node> {
        let start = self.span();
        let saved = self.enter_pattern_mode();
        let result = match self.advance() {
            Ok(_) => self.parse_pattern_and_guard(),
            Err(err) => Err(err),
        };
        self.lexer_mut().set_in_kwarg(saved);
        let (pattern, guard) = result?;
        self.check_pattern_bindings(&pattern);
        self.parse_then()?;
        let body = non_empty(self.parse_statements_node()?);
        Ok(Node::new(
            NodeKind::InClause {
                pattern: Box::new(pattern),
                guard: guard.map(Box::new),
                body,
            },
            start.merge(self.prev_span()),
        ))
    }

    fn parse_pattern_and_guard(&mut self) -> PResult<(Node, Option<Node>)> {
        let pattern = self.parse_top_pattern()?;
        let negated = match self.current_kind().keyword() {
            Some(Keyword::IfModifier) => false,
            Some(Keyword::UnlessModifier) => true,
            _ => return Ok((pattern, None)),
        };
        let start = self.advance()?.span();
        let cond = self.parse_expr()?;
        let cond = self.condition(cond);
        let span = start.merge(cond.span);
        Ok((
            pattern,
            Some(Node::new(
                NodeKind::Guard {
                    cond: Box::new(cond),
                    negated,
                },
                span,
            )),
        ))
    }

    /// Prepares the lexer for the pattern after `in` or `=>`, which is the
    /// current token. Returns the previous keyword-argument flag.
    pub(super) fn enter_pattern_mode(&mut self) -> bool {
        let lexer = self.lexer_mut();
        lexer.set_state(LexState::BEG | LexState::LABEL);
        lexer.set_command_start(false);
        lexer.set_in_kwarg(true)
    }

    /// Records duplicate or conflicting variable bindings in a pattern.
    pub(super) fn check_pattern_bindings(&mut self, pattern: &Node) {
        let (_, errors) = extract_pattern_bindings(pattern);
        for (kind, span) in errors {
            self.ctx.semantic_error(kind, span);
        }
    }

    // ========================================================================
    // Begin
    // ========================================================================

    /// Parses `begin body end`.
    pub(super) fn parse_begin(&mut self) -> PResult<Node> {
        let open = self.advance()?.span();
        let body = self.parse_body()?;
        let close = self.expect_keyword(Keyword::End)?.span();
        self.check_end_alignment(open, Keyword::Begin, close);
        Ok(Node::new(NodeKind::BeginBlock(Box::new(body)), open.merge(close)))
    }

    // ========================================================================
    // Jumps, yield and super
    // ========================================================================

    /// Parses `return`, `break` or `next` with an optional value.
    ///
    /// Several values, or a splat, return an array.
    pub(super) fn parse_jump(&mut self, keyword: Keyword) -> PResult<(Node, bool)> {
        let start = self.advance()?.span();
        let value = if self.starts_expression() {
            let args = self.parse_command_args()?;
            Some(Box::new(jump_value(args, start)))
        } else {
            None
        };
        let span = value.as_ref().map_or(start, |v| start.merge(v.span));
        let kind = match keyword {
            Keyword::Return => NodeKind::Return(value),
            Keyword::Break => NodeKind::Break(value),
            _ => NodeKind::Next(value),
        };
        Ok((Node::new(kind, span), true))
    }

    /// Parses `yield`, `yield(args)` or `yield args`.
    pub(super) fn parse_yield(&mut self, allow_command: bool) -> PResult<(Node, bool)> {
        let start = self.advance()?.span();
        if self.check(&TokenKind::LParen) && !self.space_before() {
            let args = self.parse_paren_args()?;
            return Ok((
                Node::new(NodeKind::Yield(args), start.merge(self.prev_span())),
                false,
            ));
        }
        if allow_command && self.starts_command_args() {
            let args = self.parse_command_args()?;
            let span = args.last().map_or(start, |last| start.merge(last.span));
            return Ok((Node::new(NodeKind::Yield(args), span), true));
        }
        Ok((Node::new(NodeKind::Yield(Vec::new()), start), false))
    }

    /// Parses `super`, which passes the method's own arguments, or
    /// `super(args)` / `super args`.
    pub(super) fn parse_super(&mut self, allow_command: bool) -> PResult<(Node, bool)> {
        let start = self.advance()?.span();
        if self.check(&TokenKind::LParen) && !self.space_before() {
            let args = self.parse_paren_args()?;
            return Ok((
                Node::new(
                    NodeKind::Super { args, block: None },
                    start.merge(self.prev_span()),
                ),
                false,
            ));
        }
        if allow_command && self.starts_command_args() {
            let args = self.parse_command_args()?;
            let span = args.last().map_or(start, |last| start.merge(last.span));
            let node = Node::new(NodeKind::Super { args, block: None }, span);
            return Ok((self.parse_command_block(node)?, true));
        }
        Ok((Node::new(NodeKind::ZSuper { block: None }, start), false))
    }
}

/// Combines jump arguments into the jump's value.
fn jump_value(mut args: Vec<Node>, at: Span) -> Node {
    if args.len() == 1 && !matches!(args[0].kind, NodeKind::Splat(_)) {
        if let Some(value) = args.pop() {
            return value;
        }
    }
    let span = match (args.first(), args.last()) {
        (Some(first), Some(last)) => first.span.merge(last.span),
        _ => at,
    };
    Node::new(NodeKind::Array(args), span)
}

/// Returns true for `when` conditions compared for duplicates.
fn is_when_literal(node: &Node) -> bool {
    matches!(
        node.kind,
        NodeKind::Number(_)
            | NodeKind::Str { .. }
            | NodeKind::Symbol(_)
            | NodeKind::Nil
            | NodeKind::True
            | NodeKind::False
    )
}
