// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Expression parsing.
//!
//! Expressions are parsed in layers, loosest first:
//!
//! - `and` / `or` ([`Parser::parse_expr`])
//! - `not` and one-line pattern tests (`x => pat`, `x in pat`)
//! - operator expressions ([`Parser::parse_arg`]), using the Pratt table in
//!   the parent module, with ternaries and ranges
//! - prefix operators and `defined?`
//! - operands: a primary with its postfix chain, then assignment

use ecow::EcoString;

use crate::ast::{Node, NodeKind};

use crate::source_analysis::ShareableConstantValue;

use super::{
    BindingPower, DiagnosticCategory, Keyword, POW_BP, PResult, Parser, RANGE_BP,
    SemanticErrorKind, TERNARY_BP, Token, TokenKind, UNARY_MINUS_BP, UNARY_NOT_BP,
    binary_binding_power,
};

/// Builds a method call node.
pub(super) fn call(
    receiver: Option<Node>,
    name: impl Into<EcoString>,
    args: Vec<Node>,
) -> NodeKind {
    NodeKind::Call {
        receiver: receiver.map(Box::new),
        name: name.into(),
        args,
        block: None,
        safe_nav: false,
    }
}

impl Parser<'_> {
    // ========================================================================
    // Keyword Operators
    // ========================================================================

    /// Parses an expression: operator expressions joined by `and`/`or`.
    pub(super) fn parse_expr(&mut self) -> PResult<Node> {
        let mut left = self.parse_not_expr()?;
        loop {
            let is_and = match self.current_kind().keyword() {
                Some(Keyword::And) => true,
                Some(Keyword::Or) => false,
                _ => break,
            };
            self.advance()?;
            self.skip_newlines()?;
            let right = self.parse_not_expr()?;
            self.value_expr(&left);
            let span = left.span.merge(right.span);
            let (left_box, right_box) = (Box::new(left), Box::new(right));
            let kind = if is_and {
                NodeKind::And {
                    left: left_box,
                    right: right_box,
                }
            } else {
                NodeKind::Or {
                    left: left_box,
                    right: right_box,
                }
            };
            left = Node::new(kind, span);
        }
        Ok(left)
    }

    fn parse_not_expr(&mut self) -> PResult<Node> {
        if self.check_keyword(Keyword::Not) {
            let start = self.advance()?.span();
            let operand = stacker::maybe_grow(32 * 1024, 256 * 1024, || {
                self.enter_nesting()?;
                let operand = self.parse_not_expr();
                self.leave_nesting();
                operand
            })?;
            let span = start.merge(operand.span);
            return Ok(Node::new(call(Some(operand), "!", Vec::new()), span));
        }
        let node = self.parse_arg(true)?;
        match self.current_kind() {
            TokenKind::Assoc => self.parse_pattern_test(node, true),
            TokenKind::Keyword(Keyword::In) => self.parse_pattern_test(node, false),
            _ => Ok(node),
        }
    }

    // ========================================================================
    // Operator Expressions (Pratt)
    // ========================================================================

    /// Parses an operator expression.
    ///
    /// With `allow_command`, the leftmost operand may be a command call
    /// without parentheses (`x = foo 1, 2`).
    pub(super) fn parse_arg(&mut self, allow_command: bool) -> PResult<Node> {
        self.parse_arg_bp(0, allow_command)
    }

    /// Parses an operator expression whose operators bind at least as
    /// tightly as `min_bp`.
    ///
    /// Uses `stacker::maybe_grow` to extend the stack on the heap if
    /// remaining stack space falls below 32 KiB, and counts nesting so that
    /// pathological input fails with a nesting error instead.
    pub(super) fn parse_arg_bp(&mut self, min_bp: u8, allow_command: bool) -> PResult<Node> {
        // 32 KiB red zone, 256 KiB new segment.
        stacker::maybe_grow(32 * 1024, 256 * 1024, || {
            self.enter_nesting()?;
            let result = self
                .parse_prefix(allow_command)
                .and_then(|left| self.parse_infix(left, min_bp));
            self.leave_nesting();
            result
        })
    }

    fn parse_infix(&mut self, mut left: Node, min_bp: u8) -> PResult<Node> {
        let mut last_non_assoc: Option<u8> = None;
        loop {
            let bp = match self.current_kind() {
                TokenKind::Question => TERNARY_BP,
                TokenKind::DotDot | TokenKind::DotDotDot => RANGE_BP,
                kind => match binary_binding_power(kind) {
                    Some(bp) => bp,
                    None => break,
                },
            };
            if bp.left < min_bp {
                break;
            }
            if bp.non_assoc && last_non_assoc == Some(bp.left) {
                return self.unexpected(&[]);
            }
            last_non_assoc = bp.non_assoc.then_some(bp.left);

            left = match self.current_kind() {
                TokenKind::Question => self.parse_ternary(left)?,
                TokenKind::DotDot | TokenKind::DotDotDot => self.parse_range(left, bp)?,
                _ => self.parse_binary(left, bp)?,
            };
        }
        Ok(left)
    }

    fn parse_binary(&mut self, left: Node, bp: BindingPower) -> PResult<Node> {
        let op = self.advance()?;
        let right = self.parse_arg_bp(bp.right, false)?;
        self.value_expr(&left);
        self.value_expr(&right);
        let span = left.span.merge(right.span);
        let kind = match op.kind() {
            TokenKind::AndAnd => NodeKind::And {
                left: Box::new(left),
                right: Box::new(right),
            },
            TokenKind::OrOr => NodeKind::Or {
                left: Box::new(left),
                right: Box::new(right),
            },
            kind => {
                let name = kind.operator_method_name().unwrap_or("?");
                call(Some(left), name, vec![right])
            }
        };
        Ok(Node::new(kind, span))
    }

    fn parse_ternary(&mut self, cond: Node) -> PResult<Node> {
        self.advance()?;
        let cond = self.condition(cond);
        self.skip_newlines()?;
        let then_branch = self.parse_arg_bp(0, false)?;
        self.skip_newlines()?;
        self.expect(&TokenKind::Colon, "':'")?;
        self.skip_newlines()?;
        let else_branch = self.parse_arg_bp(TERNARY_BP.right, false)?;
        let span = cond.span.merge(else_branch.span);
        Ok(Node::new(
            NodeKind::If {
                cond: Box::new(cond),
                then_branch: Some(Box::new(then_branch)),
                else_branch: Some(Box::new(else_branch)),
            },
            span,
        ))
    }

    fn parse_range(&mut self, low: Node, bp: BindingPower) -> PResult<Node> {
        let op = self.advance()?;
        let exclusive = matches!(op.kind(), TokenKind::DotDotDot);
        self.value_expr(&low);
        let high = if self.starts_expression() {
            Some(Box::new(self.parse_arg_bp(bp.right, false)?))
        } else {
            None
        };
        let end = high.as_ref().map_or(op.span(), |h| h.span);
        let span = low.span.merge(end);
        Ok(Node::new(
            NodeKind::Range {
                low: Some(Box::new(low)),
                high,
                exclusive,
            },
            span,
        ))
    }

    /// Continues an operator expression whose leftmost operand is already
    /// parsed.
    pub(super) fn continue_arg(&mut self, operand: Node) -> PResult<Node> {
        let node = self.parse_postfix(operand)?;
        self.parse_infix(node, 0)
    }

    /// Returns true if the current token can begin an operand.
    pub(super) fn starts_expression(&self) -> bool {
        let kind = self.current_kind();
        kind.can_start_argument()
            || matches!(
                kind,
                TokenKind::LParen | TokenKind::LParenBeg
            )
    }

    // ========================================================================
    // Prefix Operators
    // ========================================================================

    fn parse_prefix(&mut self, allow_command: bool) -> PResult<Node> {
        let (name, bp) = match self.current_kind() {
            TokenKind::Bang => ("!", UNARY_NOT_BP),
            TokenKind::Tilde => ("~", UNARY_NOT_BP),
            TokenKind::UPlus => ("+@", UNARY_NOT_BP),
            TokenKind::UMinus => ("-@", UNARY_MINUS_BP),
            TokenKind::UMinusNum => return self.parse_negative_number(),
            TokenKind::BeginlessDotDot | TokenKind::BeginlessDotDotDot => {
                return self.parse_beginless_range();
            }
            TokenKind::Keyword(Keyword::Defined) => return self.parse_defined(),
            _ => return self.parse_operand(allow_command),
        };
        let start = self.advance()?.span();
        let operand = self.parse_arg_bp(bp, allow_command && name == "!")?;
        self.value_expr(&operand);
        let span = start.merge(operand.span);
        Ok(Node::new(call(Some(operand), name, Vec::new()), span))
    }

    /// `-2` is a negative literal, but `-2 ** 2` is `-(2 ** 2)`.
    pub(super) fn parse_negative_number(&mut self) -> PResult<Node> {
        let minus = self.advance()?.span();
        let TokenKind::Numeric(literal) = self.current_kind().clone() else {
            return self.unexpected(&["number"]);
        };
        let number_span = self.advance()?.span();
        if self.check(&TokenKind::Pow) {
            let number = Node::new(NodeKind::Number(literal), number_span);
            let power = self.parse_binary(number, POW_BP)?;
            let span = minus.merge(power.span);
            return Ok(Node::new(call(Some(power), "-@", Vec::new()), span));
        }
        let node = Node::new(NodeKind::Number(literal.negate()), minus.merge(number_span));
        self.parse_postfix(node)
    }

    fn parse_beginless_range(&mut self) -> PResult<Node> {
        let op = self.advance()?;
        self.finish_beginless_range(op)
    }

    /// Parses the upper bound of `..x` once the operator is consumed.
    pub(super) fn finish_beginless_range(&mut self, op: Token) -> PResult<Node> {
        let exclusive = matches!(op.kind(), TokenKind::BeginlessDotDotDot);
        let high = self.parse_arg_bp(RANGE_BP.right, false)?;
        self.value_expr(&high);
        let span = op.span().merge(high.span);
        Ok(Node::new(
            NodeKind::Range {
                low: None,
                high: Some(Box::new(high)),
                exclusive,
            },
            span,
        ))
    }

    fn parse_defined(&mut self) -> PResult<Node> {
        let start = self.advance()?.span();
        self.skip_newlines()?;
        if matches!(
            self.current_kind(),
            TokenKind::LParen | TokenKind::LParenArg | TokenKind::LParenBeg
        ) {
            self.advance()?;
            self.skip_newlines()?;
            let expr = self.parse_expr()?;
            self.skip_newlines()?;
            self.expect(&TokenKind::RParen, "')'")?;
            let node = Node::new(
                NodeKind::Defined(Box::new(expr)),
                start.merge(self.prev_span()),
            );
            return self.parse_postfix(node);
        }
        let operand = self.parse_arg_bp(0, false)?;
        let span = start.merge(operand.span);
        Ok(Node::new(NodeKind::Defined(Box::new(operand)), span))
    }

    // ========================================================================
    // Operands and Assignment
    // ========================================================================

    fn parse_operand(&mut self, allow_command: bool) -> PResult<Node> {
        let node = self.parse_primary(allow_command)?;
        match self.current_kind() {
            TokenKind::Assign => self.parse_assignment(node),
            TokenKind::OpAssign(_) => self.parse_op_assignment(node),
            _ => Ok(node),
        }
    }

    fn parse_assignment(&mut self, target: Node) -> PResult<Node> {
        if matches!(target.kind, NodeKind::MultiTarget { .. }) {
            return self.finish_multiple_assignment(target);
        }
        let target = self.assignment_target(target)?;
        self.advance()?;
        let mut value = self.parse_assignment_value()?;
        if matches!(target.kind, NodeKind::Const(_) | NodeKind::ScopedConst { .. }) {
            let mode = self.ctx.shareable_constant_value();
            if mode != ShareableConstantValue::None {
                let span = value.span;
                value = Node::new(
                    NodeKind::ShareableConstant {
                        mode,
                        value: Box::new(value),
                    },
                    span,
                );
            }
        }
        let span = target.span.merge(value.span);
        Ok(Node::new(
            NodeKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        ))
    }

    fn parse_op_assignment(&mut self, target: Node) -> PResult<Node> {
        let target = self.assignment_target(target)?;
        let TokenKind::OpAssign(op) = self.advance()?.into_kind() else {
            return self.unexpected(&[]);
        };
        if let NodeKind::LocalVar { name, .. } = &target.kind {
            self.scopes.use_local(name);
        }
        let value = Box::new(self.parse_assignment_value()?);
        let span = target.span.merge(value.span);
        let kind = match target.kind {
            NodeKind::IndexTarget { receiver, args } => NodeKind::IndexOpAssign {
                receiver,
                args,
                op,
                value,
            },
            NodeKind::AttrTarget {
                receiver,
                name,
                safe_nav,
            } => NodeKind::AttrOpAssign {
                receiver,
                name,
                safe_nav,
                op,
                value,
            },
            NodeKind::MultiTarget { .. } => {
                return self.unexpected_at(ecow::eco_format!("'{op}='"), span);
            }
            kind => NodeKind::OpAssign {
                target: Box::new(Node::new(kind, target.span)),
                op,
                value,
            },
        };
        Ok(Node::new(kind, span))
    }

    /// Parses the right-hand side of `=` or `op=`.
    fn parse_assignment_value(&mut self) -> PResult<Node> {
        if self.check(&TokenKind::Splat) {
            let first = self.parse_splat_argument()?;
            let mut items = vec![first];
            while self.match_token(&TokenKind::Comma)? {
                items.push(self.parse_mrhs_item()?);
            }
            let span = items[0].span.merge(self.prev_span());
            return Ok(Node::new(NodeKind::Array(items), span));
        }
        let value = self.parse_arg(true)?;
        self.value_expr(&value);
        if !self.check_keyword(Keyword::RescueModifier) {
            return Ok(value);
        }
        self.advance()?;
        let rescue = self.parse_arg(false)?;
        let span = value.span.merge(rescue.span);
        Ok(Node::new(
            NodeKind::RescueModifier {
                body: Box::new(value),
                rescue: Box::new(rescue),
            },
            span,
        ))
    }

    // ========================================================================
    // Value Checks
    // ========================================================================

    /// Records an error if `node` has no value (`x = return`).
    pub(super) fn value_expr(&mut self, node: &Node) {
        if node.is_void() {
            self.ctx.semantic_error(SemanticErrorKind::VoidValue, node.span);
        }
    }

    /// Checks a condition, warning about `if x = 1`.
    pub(super) fn condition(&mut self, cond: Node) -> Node {
        self.value_expr(&cond);
        if let NodeKind::Assign { value, .. } = &cond.kind {
            if value.is_literal() {
                self.warn(
                    DiagnosticCategory::AssignmentInCondition,
                    "found '= literal' in conditional, should be ==",
                    value.span,
                );
            }
        }
        cond
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{call_name, parse_err, parse_ok, single};
    use crate::ast::NodeKind;
    use crate::source_analysis::{NumericValue, SemanticErrorKind, SyntaxErrorKind};

    #[test]
    fn precedence_of_multiplication() {
        let node = single("1 + 2 * 3");
        let NodeKind::Call { name, args, .. } = &node.kind else {
            panic!("expected call, got {node:?}");
        };
        assert_eq!(name, "+");
        assert_eq!(call_name(&args[0]), Some("*"));
    }

    #[test]
    fn left_associative_subtraction() {
        let node = single("10 - 3 - 2");
        let NodeKind::Call {
            receiver, name, ..
        } = &node.kind
        else {
            panic!("expected call");
        };
        assert_eq!(name, "-");
        assert_eq!(call_name(receiver.as_deref().unwrap()), Some("-"));
    }

    #[test]
    fn right_associative_power() {
        let node = single("2 ** 3 ** 2");
        let NodeKind::Call { receiver, args, .. } = &node.kind else {
            panic!("expected call");
        };
        assert!(matches!(receiver.as_deref().unwrap().kind, NodeKind::Number(_)));
        assert_eq!(call_name(&args[0]), Some("**"));
    }

    #[test]
    fn negative_literal_power_binds_minus_last() {
        let node = single("-2 ** 2");
        let NodeKind::Call {
            receiver, name, ..
        } = &node.kind
        else {
            panic!("expected call");
        };
        assert_eq!(name, "-@");
        let power = receiver.as_deref().unwrap();
        assert_eq!(call_name(power), Some("**"));
        let NodeKind::Call { receiver, .. } = &power.kind else {
            unreachable!()
        };
        let NodeKind::Number(n) = &receiver.as_deref().unwrap().kind else {
            panic!("expected number");
        };
        assert_eq!(n.value, NumericValue::Integer(2.into()));
    }

    #[test]
    fn negative_literal() {
        let node = single("-2");
        let NodeKind::Number(n) = &node.kind else {
            panic!("expected number, got {node:?}");
        };
        assert_eq!(n.value, NumericValue::Integer((-2).into()));
    }

    #[test]
    fn logical_operators_build_nodes() {
        assert!(matches!(single("a && b").kind, NodeKind::And { .. }));
        assert!(matches!(single("a || b").kind, NodeKind::Or { .. }));
        assert!(matches!(single("a and b").kind, NodeKind::And { .. }));
        assert!(matches!(single("a or b").kind, NodeKind::Or { .. }));
    }

    #[test]
    fn not_becomes_bang_call() {
        assert_eq!(call_name(&single("not a")), Some("!"));
        assert_eq!(call_name(&single("!a")), Some("!"));
    }

    #[test]
    fn ternary_is_if() {
        let node = single("a ? 1 : 2");
        assert!(matches!(
            node.kind,
            NodeKind::If {
                then_branch: Some(_),
                else_branch: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn ranges() {
        assert!(matches!(
            single("1..2").kind,
            NodeKind::Range {
                low: Some(_),
                high: Some(_),
                exclusive: false
            }
        ));
        assert!(matches!(
            single("(1...)").kind,
            NodeKind::Parens(ref inner) if matches!(inner[0].kind, NodeKind::Range { high: None, exclusive: true, .. })
        ));
        assert!(matches!(
            single("..5").kind,
            NodeKind::Range { low: None, .. }
        ));
    }

    #[test]
    fn chained_comparison_is_an_error() {
        let err = parse_err("1 == 2 == 3");
        assert!(matches!(
            err.first().unwrap().kind,
            SyntaxErrorKind::Unexpected { .. }
        ));
    }

    #[test]
    fn assignment_is_right_associative() {
        let node = single("a = b = 1");
        let NodeKind::Assign { value, .. } = &node.kind else {
            panic!("expected assignment");
        };
        assert!(matches!(value.kind, NodeKind::Assign { .. }));
    }

    #[test]
    fn assignment_then_and_keyword() {
        let node = single("a = 1 and b");
        let NodeKind::And { left, .. } = &node.kind else {
            panic!("expected and, got {node:?}");
        };
        assert!(matches!(left.kind, NodeKind::Assign { .. }));
    }

    #[test]
    fn rescue_modifier_binds_to_assignment_value() {
        let node = single("a = raise rescue 1");
        let NodeKind::Assign { value, .. } = &node.kind else {
            panic!("expected assignment");
        };
        assert!(matches!(value.kind, NodeKind::RescueModifier { .. }));
    }

    #[test]
    fn op_assign_shapes() {
        let program = parse_ok("a = 1\na += 1\nx[1] ||= 2\nx.y &&= 3");
        assert!(matches!(program.statements[1].kind, NodeKind::OpAssign { ref op, .. } if op == "+"));
        assert!(matches!(program.statements[2].kind, NodeKind::IndexOpAssign { ref op, .. } if op == "||"));
        assert!(matches!(
            program.statements[3].kind,
            NodeKind::AttrOpAssign { ref name, ref op, .. } if name == "y" && op == "&&"
        ));
    }

    #[test]
    fn void_value_in_assignment() {
        let err = parse_err("def f; x = return; end");
        assert!(err.has_kind(|k| matches!(
            k,
            SyntaxErrorKind::Semantic(SemanticErrorKind::VoidValue)
        )));
    }

    #[test]
    fn assignment_in_condition_warns() {
        let output =
            crate::source_analysis::parse(b"a = nil\nif a = 1 then end", &Default::default())
                .unwrap();
        assert!(output.warnings.iter().any(|w| w.message.contains("should be ==")));
    }

    #[test]
    fn defined_forms() {
        assert!(matches!(single("defined?(a)").kind, NodeKind::Defined(_)));
        assert!(matches!(single("defined? @a").kind, NodeKind::Defined(_)));
    }
}
