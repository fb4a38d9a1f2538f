// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Method calls, argument lists, blocks and lambdas.
//!
//! # Block binding
//!
//! A `{ }` block binds to the innermost call on its left, a `do ... end`
//! block to the outermost command:
//!
//! ```text
//! foo bar { }         # block belongs to bar
//! foo bar do end      # block belongs to foo
//! ```
//!
//! The lexer does half of this work: inside command arguments it reads `do`
//! as [`Keyword::DoBlock`], and after a parenthesized command argument it
//! reads `{` as [`TokenKind::LBraceArg`]. The parser keeps the lexer's
//! command-argument stack in step and only lets the outermost command of a
//! statement take a `DoBlock`.

use ecow::EcoString;

use crate::ast::{Node, NodeKind, Params};
use crate::semantic_analysis::{Anonymous, ScopeKind};

use super::declarations::ParamClose;
use super::{DiagnosticCategory, Keyword, PResult, Parser, SemanticErrorKind, Span, TokenKind};

/// Which list an argument list is parsed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ArgList {
    /// `foo(...)`
    Paren,
    /// `foo a, b`
    Command,
    /// `recv[...]`
    Index,
    /// `[...]`
    Array,
}

impl ArgList {
    fn closes(self, kind: &TokenKind) -> bool {
        match self {
            Self::Paren => matches!(kind, TokenKind::RParen),
            Self::Index | Self::Array => matches!(kind, TokenKind::RBracket),
            Self::Command => false,
        }
    }

    const fn allows_block_pass(self) -> bool {
        matches!(self, Self::Paren | Self::Command | Self::Index)
    }
}

/// A method name with its receiver, before arguments are read.
pub(super) struct CallHead {
    pub(super) receiver: Option<Node>,
    pub(super) name: EcoString,
    pub(super) safe_nav: bool,
    /// From the receiver (or name) through the name.
    pub(super) span: Span,
}

impl CallHead {
    fn into_node(self, args: Vec<Node>, span: Span) -> Node {
        Node::new(
            NodeKind::Call {
                receiver: self.receiver.map(Box::new),
                name: self.name,
                args,
                block: None,
                safe_nav: self.safe_nav,
            },
            span,
        )
    }
}

/// Returns true for nodes a literal block can attach to.
fn takes_block(node: &Node) -> bool {
    matches!(
        node.kind,
        NodeKind::Call { block: None, .. }
            | NodeKind::Super { block: None, .. }
            | NodeKind::ZSuper { block: None }
    )
}

impl Parser<'_> {
    // ========================================================================
    // Postfix Chains
    // ========================================================================

    /// Parses calls, indexing and blocks following an operand.
    pub(super) fn parse_postfix(&mut self, node: Node) -> PResult<Node> {
        self.parse_postfix_chain(node, false)
    }

    /// Parses the postfix chain of a primary.
    ///
    /// With `allow_command`, a method call in the chain may take command
    /// arguments, which ends the chain.
    pub(super) fn parse_postfix_chain(
        &mut self,
        mut node: Node,
        allow_command: bool,
    ) -> PResult<Node> {
        loop {
            node = match self.current_kind() {
                TokenKind::Dot | TokenKind::AndDot => {
                    let (call, command) = self.parse_dot_call(node, allow_command)?;
                    if command {
                        return Ok(call);
                    }
                    call
                }
                TokenKind::ColonColon => {
                    let (call, command) = self.parse_scope_call(node, allow_command)?;
                    if command {
                        return Ok(call);
                    }
                    call
                }
                TokenKind::LBracket => self.parse_index(node)?,
                TokenKind::LBraceBlock if takes_block(&node) => {
                    let block = self.parse_brace_block()?;
                    self.attach_block(node, block)
                }
                TokenKind::Keyword(Keyword::Do) if takes_block(&node) => {
                    let block = self.parse_do_block()?;
                    self.attach_block(node, block)
                }
                TokenKind::Keyword(Keyword::DoBlock)
                    if self.command_depth == 0 && takes_block(&node) =>
                {
                    let block = self.parse_do_block()?;
                    self.attach_block(node, block)
                }
                _ => return Ok(node),
            };
        }
    }

    fn parse_dot_call(&mut self, receiver: Node, allow_command: bool) -> PResult<(Node, bool)> {
        let safe_nav = matches!(self.advance()?.kind(), TokenKind::AndDot);
        if self.check(&TokenKind::LParen) {
            // `recv.()` calls `call`.
            let args = self.parse_paren_args()?;
            let span = receiver.span.merge(self.prev_span());
            let head = CallHead {
                receiver: Some(receiver),
                name: "call".into(),
                safe_nav,
                span,
            };
            return Ok((head.into_node(args, span), false));
        }
        let name = self.parse_method_name()?;
        let span = receiver.span.merge(self.prev_span());
        self.finish_call(
            CallHead {
                receiver: Some(receiver),
                name,
                safe_nav,
                span,
            },
            allow_command,
        )
    }

    /// Parses what follows `::`: a scoped constant or a method call.
    fn parse_scope_call(&mut self, scope: Node, allow_command: bool) -> PResult<(Node, bool)> {
        self.advance()?;
        if let TokenKind::Constant(name) = self.current_kind() {
            let name = name.clone();
            let name_span = self.advance()?.span();
            let span = scope.span.merge(name_span);
            let paren_call = self.check(&TokenKind::LParen) && !self.space_before();
            let command_call = allow_command && self.space_before() && self.starts_command_args();
            if !paren_call && !command_call {
                return Ok((
                    Node::new(
                        NodeKind::ScopedConst {
                            scope: Some(Box::new(scope)),
                            name,
                        },
                        span,
                    ),
                    false,
                ));
            }
            let head = CallHead {
                receiver: Some(scope),
                name,
                safe_nav: false,
                span,
            };
            return self.finish_call(head, allow_command);
        }
        if self.check(&TokenKind::LParen) {
            let args = self.parse_paren_args()?;
            let span = scope.span.merge(self.prev_span());
            let head = CallHead {
                receiver: Some(scope),
                name: "call".into(),
                safe_nav: false,
                span,
            };
            return Ok((head.into_node(args, span), false));
        }
        let name = self.parse_method_name()?;
        let span = scope.span.merge(self.prev_span());
        self.finish_call(
            CallHead {
                receiver: Some(scope),
                name,
                safe_nav: false,
                span,
            },
            allow_command,
        )
    }

    /// Reads the method name after `.` or `::`.
    fn parse_method_name(&mut self) -> PResult<EcoString> {
        let name = match self.current_kind() {
            TokenKind::Identifier(name)
            | TokenKind::Constant(name)
            | TokenKind::MethodName(name) => name.clone(),
            kind => match kind.operator_method_name() {
                Some(op) => op.into(),
                None => return self.unexpected(&["method name"]),
            },
        };
        self.advance()?;
        Ok(name)
    }

    /// Reads the arguments, if any, of a call whose name was just consumed.
    ///
    /// Returns the call and whether it took command arguments.
    pub(super) fn finish_call(
        &mut self,
        head: CallHead,
        allow_command: bool,
    ) -> PResult<(Node, bool)> {
        if self.check(&TokenKind::LParen) && !self.space_before() {
            let args = self.parse_paren_args()?;
            let span = head.span.merge(self.prev_span());
            return Ok((head.into_node(args, span), false));
        }
        if allow_command && self.starts_command_args() {
            let args = self.parse_command_args()?;
            let end = args.last().map_or(head.span, |last| last.span);
            let span = head.span.merge(end);
            let call = head.into_node(args, span);
            return Ok((self.parse_command_block(call)?, true));
        }
        let span = head.span;
        Ok((head.into_node(Vec::new(), span), false))
    }

    /// Returns true if the current token begins command arguments.
    pub(super) fn starts_command_args(&self) -> bool {
        self.current_kind().can_start_argument()
    }

    fn parse_index(&mut self, receiver: Node) -> PResult<Node> {
        self.advance()?;
        self.enter_nesting()?;
        let args = self.parse_arg_list(ArgList::Index);
        self.leave_nesting();
        let args = args?;
        self.skip_newlines()?;
        self.expect(&TokenKind::RBracket, "']'")?;
        let span = receiver.span.merge(self.prev_span());
        let head = CallHead {
            receiver: Some(receiver),
            name: "[]".into(),
            safe_nav: false,
            span,
        };
        Ok(head.into_node(args, span))
    }

    // ========================================================================
    // Argument Lists
    // ========================================================================

    /// Parses `( args )`; the current token is the `(`.
    pub(super) fn parse_paren_args(&mut self) -> PResult<Vec<Node>> {
        self.advance()?;
        self.enter_nesting()?;
        let args = self.parse_arg_list(ArgList::Paren);
        self.leave_nesting();
        let args = args?;
        self.skip_newlines()?;
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(args)
    }

    /// Parses arguments without parentheses, keeping the lexer's
    /// command-argument stack in step so `do` binds to this command.
    pub(super) fn parse_command_args(&mut self) -> PResult<Vec<Node>> {
        let first = self.span();
        let grouped = matches!(self.current_kind(), TokenKind::LParenArg);
        let opened_nesting = matches!(
            self.current_kind(),
            TokenKind::LParen
                | TokenKind::LParenBeg
                | TokenKind::LParenArg
                | TokenKind::LBracket
                | TokenKind::LBracketArray
        );
        let lexer = self.lexer_mut();
        if opened_nesting {
            // The lexer already pushed for the bracket; slide this
            // command's entry underneath it.
            lexer.cmdarg_pop();
            lexer.cmdarg_push(true);
            lexer.cmdarg_push(false);
        } else {
            lexer.cmdarg_push(true);
        }

        self.command_depth += 1;
        let args = self.parse_arg_list(ArgList::Command);
        self.command_depth -= 1;

        let brace_block = self.check(&TokenKind::LBraceArg);
        let lexer = self.lexer_mut();
        if brace_block {
            lexer.cmdarg_pop();
            lexer.cmdarg_pop();
            lexer.cmdarg_push(false);
        } else {
            lexer.cmdarg_pop();
        }
        let args = args?;

        if grouped {
            if let [Node {
                kind: NodeKind::Parens(inner),
                span,
            }] = args.as_slice()
            {
                if inner.len() == 1 && span.start() == first.start() {
                    self.warn(
                        DiagnosticCategory::RedundantParens,
                        "(...) interpreted as grouped expression",
                        *span,
                    );
                }
            }
        }
        Ok(args)
    }

    /// Parses a comma-separated argument list.
    ///
    /// Brace-less `key => value` and `key: value` pairs are gathered into
    /// one trailing `KeywordHash`; a block pass comes last.
    pub(super) fn parse_arg_list(&mut self, list: ArgList) -> PResult<Vec<Node>> {
        let mut args = Vec::new();
        let mut pairs: Vec<Node> = Vec::new();
        let mut block_pass: Option<Node> = None;
        loop {
            if list != ArgList::Command {
                self.skip_newlines()?;
            }
            if list.closes(self.current_kind()) {
                break;
            }
            if block_pass.is_some() {
                return self.unexpected(&[]);
            }
            let first = args.is_empty() && pairs.is_empty();
            match self.current_kind() {
                TokenKind::BeginlessDotDotDot if list == ArgList::Paren => {
                    let op = self.advance()?;
                    if self.check(&TokenKind::RParen) {
                        self.forward_all(op.span(), &mut args, &mut pairs, &mut block_pass);
                        break;
                    }
                    let range = self.finish_beginless_range(op)?;
                    self.push_positional(&mut args, &pairs, range)?;
                }
                TokenKind::Splat => {
                    let splat = self.parse_splat_argument()?;
                    self.push_positional(&mut args, &pairs, splat)?;
                }
                TokenKind::DoubleSplat => pairs.push(self.parse_double_splat_argument()?),
                TokenKind::BlockPass if list.allows_block_pass() => {
                    block_pass = Some(self.parse_block_pass()?);
                }
                TokenKind::Label(_) => pairs.push(self.parse_label_pair()?),
                TokenKind::StringBegin => {
                    let (node, label) = self.parse_string_or_label()?;
                    if label {
                        pairs.push(self.finish_label_pair(node)?);
                    } else {
                        let value = self.continue_arg(node)?;
                        self.finish_argument(value, &mut args, &mut pairs)?;
                    }
                }
                _ => {
                    let allow_command = first && matches!(list, ArgList::Paren | ArgList::Command);
                    let value = self.parse_arg(allow_command)?;
                    self.finish_argument(value, &mut args, &mut pairs)?;
                }
            }
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }

        if !pairs.is_empty() {
            self.warn_duplicate_keys(&pairs);
            let span = pairs[0].span.merge(pairs[pairs.len() - 1].span);
            args.push(Node::new(NodeKind::KeywordHash(pairs), span));
        }
        if let Some(block_pass) = block_pass {
            args.push(block_pass);
        }
        Ok(args)
    }

    /// Files a parsed expression as a positional argument or, before `=>`,
    /// as the key of a pair.
    fn finish_argument(
        &mut self,
        value: Node,
        args: &mut Vec<Node>,
        pairs: &mut Vec<Node>,
    ) -> PResult<()> {
        if self.match_token(&TokenKind::Assoc)? {
            let pair_value = self.parse_arg(false)?;
            self.value_expr(&pair_value);
            let span = value.span.merge(pair_value.span);
            pairs.push(Node::new(
                NodeKind::Pair {
                    key: Box::new(value),
                    value: Box::new(pair_value),
                },
                span,
            ));
            return Ok(());
        }
        self.value_expr(&value);
        self.push_positional(args, pairs, value)
    }

    fn push_positional(
        &mut self,
        args: &mut Vec<Node>,
        pairs: &[Node],
        value: Node,
    ) -> PResult<()> {
        if !pairs.is_empty() {
            return self.unexpected_at("argument", value.span);
        }
        args.push(value);
        Ok(())
    }

    /// Expands a forwarding `...` argument into splat, double splat and
    /// block pass.
    fn forward_all(
        &mut self,
        span: Span,
        args: &mut Vec<Node>,
        pairs: &mut Vec<Node>,
        block_pass: &mut Option<Node>,
    ) {
        self.check_anonymous(Anonymous::All, span);
        args.push(Node::new(NodeKind::Splat(None), span));
        pairs.push(Node::new(NodeKind::DoubleSplat(None), span));
        *block_pass = Some(Node::new(NodeKind::BlockPass(None), span));
    }

    /// Records an error if an anonymous argument has no matching parameter.
    fn check_anonymous(&mut self, which: Anonymous, span: Span) {
        if !self.scopes.anonymous_declared(which) {
            self.ctx
                .semantic_error(SemanticErrorKind::UndeclaredForwarding(which.as_str()), span);
        }
    }

    /// Parses `*value` or an anonymous `*`.
    pub(super) fn parse_splat_argument(&mut self) -> PResult<Node> {
        let star = self.advance()?.span();
        if !self.starts_expression() {
            self.check_anonymous(Anonymous::Rest, star);
            return Ok(Node::new(NodeKind::Splat(None), star));
        }
        let value = self.parse_arg(false)?;
        self.value_expr(&value);
        let span = star.merge(value.span);
        Ok(Node::new(NodeKind::Splat(Some(Box::new(value))), span))
    }

    /// Parses `**value` or an anonymous `**`.
    pub(super) fn parse_double_splat_argument(&mut self) -> PResult<Node> {
        let stars = self.advance()?.span();
        if !self.starts_expression() {
            self.check_anonymous(Anonymous::KeywordRest, stars);
            return Ok(Node::new(NodeKind::DoubleSplat(None), stars));
        }
        let value = self.parse_arg(false)?;
        self.value_expr(&value);
        let span = stars.merge(value.span);
        Ok(Node::new(NodeKind::DoubleSplat(Some(Box::new(value))), span))
    }

    fn parse_block_pass(&mut self) -> PResult<Node> {
        let amper = self.advance()?.span();
        if !self.starts_expression() {
            self.check_anonymous(Anonymous::Block, amper);
            return Ok(Node::new(NodeKind::BlockPass(None), amper));
        }
        let value = self.parse_arg(false)?;
        self.value_expr(&value);
        let span = amper.merge(value.span);
        Ok(Node::new(NodeKind::BlockPass(Some(Box::new(value))), span))
    }

    /// Parses `key: value`, or `key:` whose value is the local or method of
    /// the same name.
    pub(super) fn parse_label_pair(&mut self) -> PResult<Node> {
        let token = self.advance()?;
        let span = token.span();
        let TokenKind::Label(name) = token.into_kind() else {
            return self.unexpected_at("label", span);
        };
        let key = Node::new(NodeKind::Symbol(name), span);
        self.finish_label_pair(key)
    }

    /// Reads the value after a label whose key is already built.
    pub(super) fn finish_label_pair(&mut self, key: Node) -> PResult<Node> {
        let value = if self.starts_expression() {
            let value = self.parse_arg(false)?;
            self.value_expr(&value);
            value
        } else {
            match &key.kind {
                NodeKind::Symbol(name) => self.omitted_value(name.clone(), key.span),
                _ => return self.unexpected(&["value"]),
            }
        };
        let span = key.span.merge(value.span);
        Ok(Node::new(
            NodeKind::Pair {
                key: Box::new(key),
                value: Box::new(value),
            },
            span,
        ))
    }

    /// The value of `{x:}`: the local `x`, the constant `X`, or a call.
    fn omitted_value(&mut self, name: EcoString, span: Span) -> Node {
        if name.starts_with(|c: char| c.is_ascii_uppercase()) {
            return Node::new(NodeKind::Const(name), span);
        }
        if let Some(kind) = self.scopes.use_local(&name) {
            return Node::new(NodeKind::LocalVar { name, kind }, span);
        }
        Node::new(super::expressions::call(None, name, Vec::new()), span)
    }

    /// Warns when a hash literal repeats a literal key.
    pub(super) fn warn_duplicate_keys(&mut self, pairs: &[Node]) {
        let keys: Vec<&Node> = pairs
            .iter()
            .filter_map(|pair| match &pair.kind {
                NodeKind::Pair { key, .. } if is_static_key(key) => Some(key.as_ref()),
                _ => None,
            })
            .collect();
        let mut warnings = Vec::new();
        for (i, key) in keys.iter().enumerate() {
            if let Some(later) = keys[i + 1..].iter().find(|other| other.kind == key.kind) {
                warnings.push((
                    format!(
                        "key {} is duplicated and overwritten on line {}",
                        self.describe_key(key),
                        later.span.start_location().line
                    ),
                    key.span,
                ));
            }
        }
        for (message, span) in warnings {
            self.warn(DiagnosticCategory::DuplicateKey, message, span);
        }
    }

    fn describe_key(&self, key: &Node) -> String {
        match &key.kind {
            NodeKind::Symbol(name) => format!(":{name}"),
            NodeKind::Str { value, .. } => format!("{:?}", String::from_utf8_lossy(value)),
            _ => self.source_text(key.span),
        }
    }

    /// Attaches a literal block to a call.
    fn attach_block(&mut self, node: Node, block: Node) -> Node {
        let span = node.span.merge(block.span);
        let has_block_pass = |args: &[Node]| {
            args.last()
                .is_some_and(|last| matches!(last.kind, NodeKind::BlockPass(_)))
        };
        let kind = match node.kind {
            NodeKind::Call {
                receiver,
                name,
                args,
                safe_nav,
                ..
            } => {
                if has_block_pass(&args) {
                    self.ctx
                        .semantic_error(SemanticErrorKind::BothBlockArgAndBlock, block.span);
                }
                NodeKind::Call {
                    receiver,
                    name,
                    args,
                    block: Some(Box::new(block)),
                    safe_nav,
                }
            }
            NodeKind::Super { args, .. } => {
                if has_block_pass(&args) {
                    self.ctx
                        .semantic_error(SemanticErrorKind::BothBlockArgAndBlock, block.span);
                }
                NodeKind::Super {
                    args,
                    block: Some(Box::new(block)),
                }
            }
            NodeKind::ZSuper { .. } => NodeKind::ZSuper {
                block: Some(Box::new(block)),
            },
            kind => kind,
        };
        Node::new(kind, span)
    }

    /// Attaches the block that follows a command's arguments, if any.
    pub(super) fn parse_command_block(&mut self, node: Node) -> PResult<Node> {
        if self.check(&TokenKind::LBraceArg) {
            let block = self.parse_brace_block()?;
            return Ok(self.attach_block(node, block));
        }
        if self.check_keyword(Keyword::DoBlock) && self.command_depth == 0 && takes_block(&node) {
            let block = self.parse_do_block()?;
            let node = self.attach_block(node, block);
            return self.parse_block_call_chain(node);
        }
        Ok(node)
    }

    /// Parses method calls chained after a command's `do ... end` block
    /// (`list.each_slice 2 do ... end.to_a`).
    ///
    /// Only `.`, `&.` and `::` calls may follow. Each may take parenthesized
    /// arguments and a block; a final call may take command arguments.
    fn parse_block_call_chain(&mut self, mut node: Node) -> PResult<Node> {
        loop {
            let (call, command) = match self.current_kind() {
                TokenKind::Dot | TokenKind::AndDot => self.parse_dot_call(node, true)?,
                TokenKind::ColonColon => self.parse_scope_call(node, true)?,
                _ => return Ok(node),
            };
            if command {
                return Ok(call);
            }
            node = match self.current_kind() {
                TokenKind::LBraceBlock | TokenKind::LBraceArg if takes_block(&call) => {
                    let block = self.parse_brace_block()?;
                    self.attach_block(call, block)
                }
                TokenKind::Keyword(Keyword::Do | Keyword::DoBlock)
                    if self.command_depth == 0 && takes_block(&call) =>
                {
                    let block = self.parse_do_block()?;
                    self.attach_block(call, block)
                }
                _ => call,
            };
        }
    }

    // ========================================================================
    // Blocks
    // ========================================================================

    /// Parses `{ |params| body }`.
    fn parse_brace_block(&mut self) -> PResult<Node> {
        let open = self.advance()?.span();
        self.push_scope(ScopeKind::Block);
        self.enter_nesting()?;
        let result = self.parse_block_contents(false);
        self.leave_nesting();
        let numbered_params = self.pop_scope();
        let (params, body) = result?;
        Ok(Node::new(
            NodeKind::Block {
                params,
                body: Box::new(body),
                numbered_params,
            },
            open.merge(self.prev_span()),
        ))
    }

    /// Parses `do |params| body end`.
    fn parse_do_block(&mut self) -> PResult<Node> {
        let open = self.advance()?.span();
        self.push_scope(ScopeKind::Block);
        self.enter_nesting()?;
        let result = self.parse_block_contents(true);
        self.leave_nesting();
        let numbered_params = self.pop_scope();
        let (params, body) = result?;
        self.check_end_alignment(open, Keyword::Do, self.prev_span());
        Ok(Node::new(
            NodeKind::Block {
                params,
                body: Box::new(body),
                numbered_params,
            },
            open.merge(self.prev_span()),
        ))
    }

    fn parse_block_contents(&mut self, do_end: bool) -> PResult<(Option<Box<Params>>, Node)> {
        let params = self.parse_block_params()?;
        let body = if do_end {
            let body = self.parse_body()?;
            self.expect_keyword(Keyword::End)?;
            body
        } else {
            let body = self.parse_statements_node()?;
            self.expect(&TokenKind::RBrace, "'}'")?;
            body
        };
        Ok((params, body))
    }

    /// Parses `|params; locals|` if present.
    fn parse_block_params(&mut self) -> PResult<Option<Box<Params>>> {
        if self.check(&TokenKind::OrOr) {
            let span = self.advance()?.span();
            self.scopes.set_ordinary_params();
            return Ok(Some(Box::new(Params {
                span,
                ..Params::default()
            })));
        }
        if !self.check(&TokenKind::Pipe) {
            return Ok(None);
        }
        let open = self.span();
        let saved = self.lexer_mut().set_in_argdef(true);
        self.advance()?;
        let params = self.parse_param_list(ParamClose::Pipe);
        self.lexer_mut().set_in_argdef(saved);
        let mut params = params?;
        if self.check(&TokenKind::Semicolon) {
            self.advance()?;
            params.block_locals = self.parse_block_locals()?;
        }
        if !self.check(&TokenKind::Pipe) {
            return self.unexpected(&["'|'"]);
        }
        self.lexer_mut().set_command_start(true);
        self.advance()?;
        self.scopes.set_ordinary_params();
        params.span = open.merge(self.prev_span());
        Ok(Some(Box::new(params)))
    }

    /// Parses the `a, b` after `;` in a block parameter list.
    pub(super) fn parse_block_locals(&mut self) -> PResult<Vec<Node>> {
        let mut locals = Vec::new();
        loop {
            let TokenKind::Identifier(name) = self.current_kind() else {
                return self.unexpected(&["local variable name"]);
            };
            let name = name.clone();
            let span = self.advance()?.span();
            if let Err(kind) = self.scopes.declare_block_local(&name, span) {
                self.ctx.semantic_error(kind, span);
            }
            locals.push(Node::new(NodeKind::Arg(name), span));
            if !self.match_token(&TokenKind::Comma)? {
                return Ok(locals);
            }
        }
    }

    // ========================================================================
    // Lambdas
    // ========================================================================

    /// Parses `->(params) { body }` or `-> do body end`.
    pub(super) fn parse_lambda(&mut self) -> PResult<Node> {
        let start = self.advance()?.span();
        self.push_scope(ScopeKind::Lambda);
        self.enter_nesting()?;
        let result = self.parse_lambda_contents();
        self.leave_nesting();
        let numbered_params = self.pop_scope();
        let (params, body) = result?;
        Ok(Node::new(
            NodeKind::Lambda {
                params,
                body: Box::new(body),
                numbered_params,
            },
            start.merge(self.prev_span()),
        ))
    }

    fn parse_lambda_contents(&mut self) -> PResult<(Option<Box<Params>>, Node)> {
        let params = match self.current_kind() {
            TokenKind::LParen | TokenKind::LParenBeg | TokenKind::LParenArg => {
                let open = self.span();
                let saved = self.lexer_mut().set_in_argdef(true);
                self.advance()?;
                let params = self.parse_param_list(ParamClose::LambdaParen);
                self.lexer_mut().set_in_argdef(saved);
                let mut params = params?;
                if self.check(&TokenKind::Semicolon) {
                    self.advance()?;
                    params.block_locals = self.parse_block_locals()?;
                }
                self.skip_newlines()?;
                self.expect(&TokenKind::RParen, "')'")?;
                params.span = open.merge(self.prev_span());
                self.scopes.set_ordinary_params();
                Some(Box::new(params))
            }
            TokenKind::LambdaBegin | TokenKind::Keyword(Keyword::DoLambda) => None,
            _ => {
                let params = self.parse_param_list(ParamClose::LambdaBody)?;
                self.scopes.set_ordinary_params();
                Some(Box::new(params))
            }
        };

        let body = match self.current_kind() {
            TokenKind::LambdaBegin => {
                self.advance()?;
                let body = self.parse_statements_node()?;
                self.expect(&TokenKind::RBrace, "'}'")?;
                body
            }
            TokenKind::Keyword(Keyword::DoLambda) => {
                let open = self.advance()?.span();
                let body = self.parse_body()?;
                let close = self.expect_keyword(Keyword::End)?.span();
                self.check_end_alignment(open, Keyword::Do, close);
                body
            }
            _ => return self.unexpected(&["'{'", "'do'"]),
        };
        Ok((params, body))
    }
}

/// Returns true for hash keys whose value is known while parsing.
fn is_static_key(key: &Node) -> bool {
    matches!(
        key.kind,
        NodeKind::Symbol(_)
            | NodeKind::Str { .. }
            | NodeKind::Number(_)
            | NodeKind::Nil
            | NodeKind::True
            | NodeKind::False
    )
}
