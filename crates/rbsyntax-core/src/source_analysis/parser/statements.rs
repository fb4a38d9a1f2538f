// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Statement parsing.
//!
//! Statements are expressions separated by newlines or semicolons, plus the
//! forms that only appear in statement position:
//!
//! - Trailing modifiers (`x if c`, `x while c`, `x rescue y`)
//! - Multiple assignment (`a, (b, *c), d.e = 1, 2`)
//! - `alias`, `undef`, `BEGIN { }` and `END { }`
//! - Bodies with `rescue`/`else`/`ensure` clauses

use ecow::EcoString;

use crate::ast::{LocalKind, Node, NodeKind};

use super::{Keyword, PResult, Parser, SemanticErrorKind, Span, TokenKind};

/// Returns true for tokens that close a statement list.
pub(super) fn ends_statements(kind: &TokenKind) -> bool {
    match kind {
        TokenKind::Eof
        | TokenKind::RParen
        | TokenKind::RBrace
        | TokenKind::RBracket
        | TokenKind::StringDEnd => true,
        TokenKind::Keyword(keyword) => matches!(
            keyword,
            Keyword::End
                | Keyword::Else
                | Keyword::Elsif
                | Keyword::When
                | Keyword::In
                | Keyword::Rescue
                | Keyword::Ensure
                | Keyword::Then
        ),
        _ => false,
    }
}

/// Wraps a statement list in a node.
pub(super) fn statements_node(statements: Vec<Node>, at: Span) -> Node {
    let span = match (statements.first(), statements.last()) {
        (Some(first), Some(last)) => first.span.merge(last.span),
        _ => at,
    };
    Node::new(NodeKind::Statements(statements), span)
}

/// Drops an empty statement list.
pub(super) fn non_empty(body: Node) -> Option<Box<Node>> {
    match &body.kind {
        NodeKind::Statements(statements) if statements.is_empty() => None,
        _ => Some(Box::new(body)),
    }
}

/// Returns true for `_1` through `_9`.
pub(super) fn numbered_param_index(name: &str) -> Option<u8> {
    match name.as_bytes() {
        [b'_', digit @ b'1'..=b'9'] => Some(digit - b'0'),
        _ => None,
    }
}

impl Parser<'_> {
    // ========================================================================
    // Statement Lists
    // ========================================================================

    /// Parses statements until a token that closes the list.
    ///
    /// The caller checks that the closing token is the one it expects.
    pub(super) fn parse_statement_list(&mut self) -> PResult<Vec<Node>> {
        let saved_command_depth = std::mem::replace(&mut self.command_depth, 0);
        self.statement_depth += 1;
        let result = self.parse_statement_list_inner();
        self.statement_depth -= 1;
        self.command_depth = saved_command_depth;
        result
    }

    fn parse_statement_list_inner(&mut self) -> PResult<Vec<Node>> {
        let mut statements = Vec::new();
        self.skip_terms()?;
        while !ends_statements(self.current_kind()) {
            statements.push(self.parse_statement()?);
            if ends_statements(self.current_kind()) {
                break;
            }
            if !self.current_kind().is_terminator() {
                return self.unexpected(&[]);
            }
            self.skip_terms()?;
        }
        Ok(statements)
    }

    /// Parses a statement list as a single node.
    pub(super) fn parse_statements_node(&mut self) -> PResult<Node> {
        let at = self.span();
        let statements = self.parse_statement_list()?;
        Ok(statements_node(statements, at))
    }

    /// Parses one statement with its trailing modifiers.
    pub(super) fn parse_statement(&mut self) -> PResult<Node> {
        let mut node = match self.current_kind().keyword() {
            Some(Keyword::Alias) => self.parse_alias()?,
            Some(Keyword::Undef) => self.parse_undef()?,
            Some(Keyword::UpperBegin) => self.parse_pre_execution()?,
            Some(Keyword::UpperEnd) => self.parse_post_execution()?,
            _ => self.parse_expression_statement()?,
        };

        while let Some(keyword) = self.current_kind().keyword() {
            node = match keyword {
                Keyword::IfModifier | Keyword::UnlessModifier => {
                    self.advance()?;
                    let cond = self.parse_expr()?;
                    let cond = self.condition(cond);
                    let span = node.span.merge(cond.span);
                    let (then_branch, else_branch) = if keyword == Keyword::IfModifier {
                        (Some(Box::new(node)), None)
                    } else {
                        (None, Some(Box::new(node)))
                    };
                    Node::new(
                        NodeKind::If {
                            cond: Box::new(cond),
                            then_branch,
                            else_branch,
                        },
                        span,
                    )
                }
                Keyword::WhileModifier | Keyword::UntilModifier => {
                    self.advance()?;
                    let cond = self.parse_expr()?;
                    let cond = Box::new(self.condition(cond));
                    let span = node.span.merge(cond.span);
                    let do_while = matches!(node.kind, NodeKind::BeginBlock(_));
                    let body = Box::new(node);
                    let kind = if keyword == Keyword::WhileModifier {
                        NodeKind::While {
                            cond,
                            body,
                            do_while,
                        }
                    } else {
                        NodeKind::Until {
                            cond,
                            body,
                            do_while,
                        }
                    };
                    Node::new(kind, span)
                }
                Keyword::RescueModifier => {
                    self.advance()?;
                    let rescue = self.parse_expr()?;
                    let span = node.span.merge(rescue.span);
                    Node::new(
                        NodeKind::RescueModifier {
                            body: Box::new(node),
                            rescue: Box::new(rescue),
                        },
                        span,
                    )
                }
                _ => break,
            };
        }
        Ok(node)
    }

    // ========================================================================
    // Multiple Assignment
    // ========================================================================

    fn parse_expression_statement(&mut self) -> PResult<Node> {
        if self.check(&TokenKind::Splat) {
            let targets = self.parse_mlhs_list(Vec::new())?;
            return self.finish_targets(targets);
        }

        let node = self.parse_expr()?;
        let comma = self.check(&TokenKind::Comma);
        match node.kind {
            NodeKind::Assign { target, value } if comma => {
                self.extend_assignment_values(target, *value, node.span)
            }
            kind @ NodeKind::MultiTarget { .. } => {
                let targets = Node::new(kind, node.span);
                if comma {
                    self.advance()?;
                    let targets = self.parse_mlhs_list(vec![targets])?;
                    self.finish_targets(targets)
                } else {
                    self.finish_targets(targets)
                }
            }
            kind if comma => {
                let first = self.assignment_target(Node::new(kind, node.span))?;
                self.advance()?;
                let targets = self.parse_mlhs_list(vec![first])?;
                self.finish_targets(targets)
            }
            kind => Ok(Node::new(kind, node.span)),
        }
    }

    /// `a = 1, 2` assigns an array.
    fn extend_assignment_values(
        &mut self,
        target: Box<Node>,
        first: Node,
        start: Span,
    ) -> PResult<Node> {
        let values_start = first.span;
        let mut items = vec![first];
        while self.match_token(&TokenKind::Comma)? {
            items.push(self.parse_mrhs_item()?);
        }
        let end = self.prev_span();
        Ok(Node::new(
            NodeKind::Assign {
                target,
                value: Box::new(Node::new(NodeKind::Array(items), values_start.merge(end))),
            },
            start.merge(end),
        ))
    }

    /// Parses the remaining targets of a left-hand side.
    ///
    /// `pre` holds targets already read; the current token starts the next
    /// target, or is the `=`/`)` after a trailing comma.
    pub(super) fn parse_mlhs_list(&mut self, mut pre: Vec<Node>) -> PResult<Node> {
        let start = pre.first().map_or(self.span(), |first| first.span);
        let mut rest: Option<Box<Node>> = None;
        let mut post = Vec::new();
        while !matches!(
            self.current_kind(),
            TokenKind::Assign | TokenKind::RParen | TokenKind::Keyword(Keyword::In)
        ) {
            if self.check(&TokenKind::Splat) {
                let splat_span = self.advance()?.span();
                if rest.is_some() {
                    return self.unexpected_at("'*'", splat_span);
                }
                let target = if matches!(
                    self.current_kind(),
                    TokenKind::Comma
                        | TokenKind::Assign
                        | TokenKind::RParen
                        | TokenKind::Keyword(Keyword::In)
                ) {
                    None
                } else {
                    Some(Box::new(self.parse_mlhs_item()?))
                };
                let span = target
                    .as_ref()
                    .map_or(splat_span, |t| splat_span.merge(t.span));
                rest = Some(Box::new(Node::new(NodeKind::Splat(target), span)));
            } else {
                let item = self.parse_mlhs_item()?;
                if rest.is_some() {
                    post.push(item);
                } else {
                    pre.push(item);
                }
            }
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        Ok(Node::new(
            NodeKind::MultiTarget { pre, rest, post },
            start.merge(self.prev_span()),
        ))
    }

    /// Parses one target: a nested `( ... )` group or an assignable operand.
    pub(super) fn parse_mlhs_item(&mut self) -> PResult<Node> {
        if matches!(
            self.current_kind(),
            TokenKind::LParenBeg | TokenKind::LParen | TokenKind::LParenArg
        ) {
            let open = self.advance()?.span();
            self.enter_nesting()?;
            let result = self.parse_mlhs_group(open);
            self.leave_nesting();
            return result;
        }
        let node = self.parse_primary(false)?;
        self.assignment_target(node)
    }

    fn parse_mlhs_group(&mut self, open: Span) -> PResult<Node> {
        let group = if self.check(&TokenKind::Splat) {
            self.parse_mlhs_list(Vec::new())?
        } else {
            let first = self.parse_mlhs_item()?;
            if self.match_token(&TokenKind::Comma)? {
                self.parse_mlhs_list(vec![first])?
            } else {
                first
            }
        };
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(Node::new(group.kind, open.merge(self.prev_span())))
    }

    /// Finishes a left-hand side: a nested group inside parentheses stays a
    /// target list for the enclosing one.
    fn finish_targets(&mut self, targets: Node) -> PResult<Node> {
        if self.check(&TokenKind::RParen) {
            return Ok(targets);
        }
        self.finish_multiple_assignment(targets)
    }

    pub(super) fn finish_multiple_assignment(&mut self, targets: Node) -> PResult<Node> {
        if !self.check(&TokenKind::Assign) {
            return self.unexpected(&["'='"]);
        }
        self.advance()?;
        let value = self.parse_mrhs()?;
        let span = targets.span.merge(value.span);
        Ok(Node::new(
            NodeKind::MultiAssign {
                targets: Box::new(targets),
                value: Box::new(value),
            },
            span,
        ))
    }

    /// Parses the right-hand side of a multiple assignment.
    fn parse_mrhs(&mut self) -> PResult<Node> {
        let first = if self.check(&TokenKind::Splat) {
            self.parse_splat_argument()?
        } else {
            let value = self.parse_arg(true)?;
            self.value_expr(&value);
            value
        };
        if !self.check(&TokenKind::Comma) && !matches!(first.kind, NodeKind::Splat(_)) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.match_token(&TokenKind::Comma)? {
            items.push(self.parse_mrhs_item()?);
        }
        let span = items[0].span.merge(self.prev_span());
        Ok(Node::new(NodeKind::Array(items), span))
    }

    pub(super) fn parse_mrhs_item(&mut self) -> PResult<Node> {
        if self.check(&TokenKind::Splat) {
            return self.parse_splat_argument();
        }
        let value = self.parse_arg(false)?;
        self.value_expr(&value);
        Ok(value)
    }

    // ========================================================================
    // Assignment Targets
    // ========================================================================

    /// Converts a parsed operand into an assignment target, declaring new
    /// locals.
    ///
    /// The current token must still be the one after the target so that
    /// invalid targets are reported there.
    pub(super) fn assignment_target(&mut self, node: Node) -> PResult<Node> {
        let span = node.span;
        let is_vcall = self.vcall_span == Some(span);
        match node.kind {
            NodeKind::LocalVar { name, .. } => Ok(self.local_target(name, span)),
            NodeKind::Call {
                receiver: None,
                name,
                args,
                block: None,
                ..
            } if is_vcall && args.is_empty() => Ok(self.local_target(name, span)),
            NodeKind::Call {
                receiver: Some(receiver),
                name,
                args,
                block: None,
                ..
            } if name == "[]" => Ok(Node::new(NodeKind::IndexTarget { receiver, args }, span)),
            NodeKind::Call {
                receiver: Some(receiver),
                name,
                args,
                block: None,
                safe_nav,
            } if args.is_empty() && is_attribute_name(&name) => Ok(Node::new(
                NodeKind::AttrTarget {
                    receiver,
                    name,
                    safe_nav,
                },
                span,
            )),
            kind @ (NodeKind::Const(_) | NodeKind::ScopedConst { .. }) => {
                if self.scopes.in_method() {
                    let kind = SemanticErrorKind::DynamicConstantAssignment;
                    return Ok(self.semantic_error(kind, span));
                }
                Ok(Node::new(kind, span))
            }
            kind @ (NodeKind::InstanceVar(_)
            | NodeKind::ClassVar(_)
            | NodeKind::GlobalVar(_)
            | NodeKind::MultiTarget { .. }
            | NodeKind::Invalid) => Ok(Node::new(kind, span)),
            NodeKind::Nil => Ok(self.keyword_target("nil", span)),
            NodeKind::True => Ok(self.keyword_target("true", span)),
            NodeKind::False => Ok(self.keyword_target("false", span)),
            NodeKind::SelfRef => Ok(self.keyword_target("self", span)),
            NodeKind::SourceFile(_) => Ok(self.keyword_target("__FILE__", span)),
            NodeKind::SourceLine(_) => Ok(self.keyword_target("__LINE__", span)),
            NodeKind::SourceEncoding(_) => Ok(self.keyword_target("__ENCODING__", span)),
            _ => self.unexpected(&[]),
        }
    }

    fn local_target(&mut self, name: EcoString, span: Span) -> Node {
        if numbered_param_index(&name).is_some() {
            return self.semantic_error(SemanticErrorKind::AssignToNumberedParameter(name), span);
        }
        self.scopes.declare_local(&name, span);
        let kind = self
            .scopes
            .resolve(&name)
            .unwrap_or(LocalKind::Local { slot: 0 });
        Node::new(NodeKind::LocalVar { name, kind }, span)
    }

    fn keyword_target(&mut self, keyword: &str, span: Span) -> Node {
        self.semantic_error(SemanticErrorKind::AssignToKeyword(keyword.into()), span)
    }

    // ========================================================================
    // Bodies
    // ========================================================================

    /// Parses a body that may carry `rescue`, `else` and `ensure` clauses.
    ///
    /// Returns a plain statement list when there are no clauses.
    pub(super) fn parse_body(&mut self) -> PResult<Node> {
        let statements = self.parse_statements_node()?;
        if !matches!(
            self.current_kind().keyword(),
            Some(Keyword::Rescue | Keyword::Else | Keyword::Ensure)
        ) {
            return Ok(statements);
        }

        let start = statements.span;
        let mut rescues = Vec::new();
        while self.check_keyword(Keyword::Rescue) {
            rescues.push(self.parse_rescue_clause()?);
        }

        let else_branch = if self.check_keyword(Keyword::Else) {
            if rescues.is_empty() {
                return self.unexpected(&["'end'"]);
            }
            self.advance()?;
            non_empty(self.parse_statements_node()?)
        } else {
            None
        };

        let ensure = if self.match_keyword(Keyword::Ensure)? {
            Some(Box::new(self.parse_statements_node()?))
        } else {
            None
        };

        Ok(Node::new(
            NodeKind::Body {
                statements: Box::new(statements),
                rescues,
                else_branch,
                ensure,
            },
            start.merge(self.prev_span()),
        ))
    }

    fn parse_rescue_clause(&mut self) -> PResult<Node> {
        let start = self.advance()?.span();
        let mut exceptions = Vec::new();
        while !matches!(
            self.current_kind(),
            TokenKind::Assoc
                | TokenKind::Newline
                | TokenKind::Semicolon
                | TokenKind::Keyword(Keyword::Then)
        ) {
            exceptions.push(self.parse_mrhs_item()?);
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
            self.skip_newlines()?;
        }

        let target = if self.match_token(&TokenKind::Assoc)? {
            Some(Box::new(self.parse_mlhs_item()?))
        } else {
            None
        };

        if !self.match_keyword(Keyword::Then)? {
            if !self.current_kind().is_terminator() {
                return self.unexpected(&["'then'", "newline"]);
            }
            self.skip_terms()?;
            self.match_keyword(Keyword::Then)?;
        }

        let body = non_empty(self.parse_statements_node()?);
        Ok(Node::new(
            NodeKind::RescueClause {
                exceptions,
                target,
                body,
            },
            start.merge(self.prev_span()),
        ))
    }
}

/// Returns true if `name` can be assigned through `recv.name = value`.
fn is_attribute_name(name: &str) -> bool {
    name.chars()
        .next()
        .is_some_and(|c| c == '_' || c.is_alphabetic() || !c.is_ascii())
        && !name.ends_with(['?', '!'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_param_names() {
        assert_eq!(numbered_param_index("_1"), Some(1));
        assert_eq!(numbered_param_index("_9"), Some(9));
        assert_eq!(numbered_param_index("_0"), None);
        assert_eq!(numbered_param_index("_10"), None);
        assert_eq!(numbered_param_index("x"), None);
    }

    #[test]
    fn attribute_names() {
        assert!(is_attribute_name("name"));
        assert!(is_attribute_name("_x"));
        assert!(!is_attribute_name("+"));
        assert!(!is_attribute_name("empty?"));
    }

    #[test]
    fn statement_list_terminators() {
        assert!(ends_statements(&TokenKind::Eof));
        assert!(ends_statements(&TokenKind::Keyword(Keyword::End)));
        assert!(!ends_statements(&TokenKind::Keyword(Keyword::If)));
        assert!(!ends_statements(&TokenKind::Newline));
    }
}
