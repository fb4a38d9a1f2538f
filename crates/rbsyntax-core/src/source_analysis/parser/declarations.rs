// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Definitions and parameter lists.
//!
//! This module handles parsing of:
//! - Method definitions, including singleton (`def self.x`) and endless
//!   (`def x = expr`) forms
//! - The parameter lists shared by methods, blocks and lambdas
//! - `class`, `class << obj` and `module` bodies
//! - `alias`, `undef`, `BEGIN { }` and `END { }`
//!
//! # Parameter order
//!
//! ```text
//! required, optional = 1, *rest, post, key:, key: 1, **opts, &blk
//! ```
//!
//! A destructuring group `(a, *b)` counts as a required parameter. `...`
//! stands for `*`, `**` and `&` together and must come last.

use ecow::EcoString;

use crate::ast::{
    BlockParam, KeywordParam, KeywordRestParam, Node, NodeKind, OptionalParam, Params, RestParam,
};
use crate::semantic_analysis::{Anonymous, ScopeKind};

use super::statements::non_empty;
use super::{
    Keyword, LexState, PResult, Parser, SemanticErrorKind, Span, Token, TokenKind, describe,
};

/// Where a parameter list appears, which decides what closes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ParamClose {
    /// `def m(...)`
    MethodParen,
    /// `def m a, b` up to the end of the line
    Terminator,
    /// `{ |...| }`
    Pipe,
    /// `->(...)`
    LambdaParen,
    /// `-> a, b { }`
    LambdaBody,
}

impl ParamClose {
    fn closes(self, kind: &TokenKind) -> bool {
        match self {
            Self::MethodParen | Self::LambdaParen => {
                matches!(kind, TokenKind::RParen | TokenKind::Semicolon)
            }
            Self::Terminator => kind.is_terminator(),
            Self::Pipe => matches!(kind, TokenKind::Pipe | TokenKind::Semicolon),
            Self::LambdaBody => matches!(
                kind,
                TokenKind::LambdaBegin | TokenKind::Keyword(Keyword::DoLambda)
            ),
        }
    }

    const fn is_method(self) -> bool {
        matches!(self, Self::MethodParen | Self::Terminator)
    }

    const fn in_parens(self) -> bool {
        matches!(self, Self::MethodParen | Self::LambdaParen)
    }
}

const fn has_keywords(params: &Params) -> bool {
    !params.keywords.is_empty() || params.keyword_rest.is_some()
}

/// Returns the method name a token spells in a `def`, `alias` or `undef`.
fn method_name(kind: &TokenKind) -> Option<EcoString> {
    match kind {
        TokenKind::Identifier(name) | TokenKind::Constant(name) | TokenKind::MethodName(name) => {
            Some(name.clone())
        }
        TokenKind::Keyword(keyword) => Some(keyword.as_str().into()),
        kind => kind.operator_method_name().map(EcoString::from),
    }
}

/// Returns true for `name=` methods, which cannot be endless.
fn is_setter(name: &str) -> bool {
    name.ends_with('=') && name.starts_with(|c: char| c == '_' || c.is_alphabetic())
}

impl Parser<'_> {
    // ========================================================================
    // Parameter Lists
    // ========================================================================

    /// Parses parameters up to the token that closes `close`, which is left
    /// current.
    pub(super) fn parse_param_list(&mut self, close: ParamClose) -> PResult<Params> {
        let start = self.span();
        let mut params = Params::default();
        let mut consumed = false;
        loop {
            if close.in_parens() {
                self.skip_newlines()?;
            }
            if close.closes(self.current_kind()) {
                break;
            }
            self.parse_param(&mut params, close)?;
            consumed = true;
            if close.in_parens() {
                self.skip_newlines()?;
            }
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
            if close.in_parens() {
                self.skip_newlines()?;
            }
            if close == ParamClose::Pipe && self.check(&TokenKind::Pipe) {
                params.trailing_comma = true;
                break;
            }
            if close.closes(self.current_kind()) {
                return self.unexpected(&["parameter"]);
            }
        }
        params.span = if consumed {
            start.merge(self.prev_span())
        } else {
            Span::point(start.start_location())
        };
        Ok(params)
    }

    fn parse_param(&mut self, params: &mut Params, close: ParamClose) -> PResult<()> {
        if params.block.is_some() {
            return self.unexpected(&[]);
        }
        let invalid = match self.current_kind() {
            TokenKind::Identifier(_) => return self.parse_positional_param(params, close),
            TokenKind::LParen | TokenKind::LParenBeg | TokenKind::LParenArg => {
                if has_keywords(params) {
                    return self.unexpected(&[]);
                }
                let group = self.parse_destructuring_param()?;
                if params.optional.is_empty() && params.rest.is_none() {
                    params.required.push(group);
                } else {
                    params.post.push(group);
                }
                return Ok(());
            }
            TokenKind::Label(_) => return self.parse_keyword_param(params, close),
            TokenKind::Splat | TokenKind::Star => return self.parse_rest_param(params, close),
            TokenKind::DoubleSplat | TokenKind::Pow => {
                return self.parse_keyword_rest_param(params, close);
            }
            TokenKind::BlockPass | TokenKind::Amper => return self.parse_block_param(params, close),
            TokenKind::BeginlessDotDotDot | TokenKind::DotDotDot if close.is_method() => {
                return self.parse_forwarding_param(params);
            }
            TokenKind::Constant(_) => "a constant",
            TokenKind::InstanceVariable(_) => "an instance variable",
            TokenKind::GlobalVariable(_) => "a global variable",
            TokenKind::ClassVariable(_) => "a class variable",
            _ => return self.unexpected(&["parameter"]),
        };
        let span = self.advance()?.span();
        self.ctx
            .semantic_error(SemanticErrorKind::InvalidFormalArgument(invalid), span);
        Ok(())
    }

    fn parse_param_name(&mut self) -> PResult<(EcoString, Span)> {
        let token = self.advance()?;
        let span = token.span();
        match token.into_kind() {
            TokenKind::Identifier(name) => {
                self.declare_param(&name, span);
                Ok((name, span))
            }
            kind => self.unexpected_at(describe(&kind), span),
        }
    }

    /// Reads `name` after a sigil if one follows.
    fn parse_optional_param_name(&mut self) -> PResult<Option<(EcoString, Span)>> {
        if matches!(self.current_kind(), TokenKind::Identifier(_)) {
            Ok(Some(self.parse_param_name()?))
        } else {
            Ok(None)
        }
    }

    fn parse_positional_param(&mut self, params: &mut Params, close: ParamClose) -> PResult<()> {
        if has_keywords(params) {
            return self.unexpected(&[]);
        }
        let (name, span) = self.parse_param_name()?;
        if !self.check(&TokenKind::Assign) {
            let arg = Node::new(NodeKind::Arg(name), span);
            if params.optional.is_empty() && params.rest.is_none() {
                params.required.push(arg);
            } else {
                params.post.push(arg);
            }
            return Ok(());
        }
        if params.rest.is_some() || !params.post.is_empty() {
            return self.unexpected(&[]);
        }
        let saved = self.lexer_mut().set_in_argdef(false);
        let default = match self.advance() {
            Ok(_) => self.parse_param_default(close),
            Err(err) => Err(err),
        };
        self.lexer_mut().set_in_argdef(saved);
        let default = default?;
        params.optional.push(OptionalParam {
            name,
            span: span.merge(default.span),
            default,
        });
        Ok(())
    }

    /// Block defaults stop before `|`, so they are primaries.
    fn parse_param_default(&mut self, close: ParamClose) -> PResult<Node> {
        let value = if close == ParamClose::Pipe {
            self.parse_primary(false)?
        } else {
            self.parse_arg(false)?
        };
        self.value_expr(&value);
        Ok(value)
    }

    fn parse_keyword_param(&mut self, params: &mut Params, close: ParamClose) -> PResult<()> {
        if params.keyword_rest.is_some() {
            return self.unexpected(&[]);
        }
        let TokenKind::Label(name) = self.current_kind() else {
            return self.unexpected(&["label"]);
        };
        let name = name.clone();
        let span = self.span();
        self.declare_param(&name, span);
        let saved = self.lexer_mut().set_in_argdef(false);
        let default = match self.advance() {
            Ok(_) if self.starts_expression() => self.parse_param_default(close).map(Some),
            Ok(_) => Ok(None),
            Err(err) => Err(err),
        };
        self.lexer_mut().set_in_argdef(saved);
        let default = default?;
        let span = default.as_ref().map_or(span, |d| span.merge(d.span));
        params.keywords.push(KeywordParam {
            name,
            default,
            span,
        });
        Ok(())
    }

    fn parse_rest_param(&mut self, params: &mut Params, close: ParamClose) -> PResult<()> {
        if params.rest.is_some() || has_keywords(params) {
            return self.unexpected(&[]);
        }
        let star = self.advance()?.span();
        let rest = match self.parse_optional_param_name()? {
            Some((name, span)) => RestParam {
                name: Some(name),
                span: star.merge(span),
            },
            None => {
                if close.is_method() {
                    self.scopes.declare_anonymous(Anonymous::Rest);
                }
                RestParam {
                    name: None,
                    span: star,
                }
            }
        };
        params.rest = Some(rest);
        Ok(())
    }

    fn parse_keyword_rest_param(&mut self, params: &mut Params, close: ParamClose) -> PResult<()> {
        if params.keyword_rest.is_some() {
            return self.unexpected(&[]);
        }
        let stars = self.advance()?.span();
        let keyword_rest = if self.check_keyword(Keyword::Nil) {
            let span = stars.merge(self.advance()?.span());
            KeywordRestParam::NoKeywords(span)
        } else {
            match self.parse_optional_param_name()? {
                Some((name, span)) => KeywordRestParam::Named(name, stars.merge(span)),
                None => {
                    if close.is_method() {
                        self.scopes.declare_anonymous(Anonymous::KeywordRest);
                    }
                    KeywordRestParam::Anonymous(stars)
                }
            }
        };
        params.keyword_rest = Some(keyword_rest);
        Ok(())
    }

    fn parse_block_param(&mut self, params: &mut Params, close: ParamClose) -> PResult<()> {
        let amper = self.advance()?.span();
        let block = match self.parse_optional_param_name()? {
            Some((name, span)) => BlockParam {
                name: Some(name),
                span: amper.merge(span),
            },
            None => {
                if close.is_method() {
                    self.scopes.declare_anonymous(Anonymous::Block);
                }
                BlockParam {
                    name: None,
                    span: amper,
                }
            }
        };
        params.block = Some(block);
        Ok(())
    }

    /// `...` declares anonymous rest, keyword rest and block parameters.
    fn parse_forwarding_param(&mut self, params: &mut Params) -> PResult<()> {
        if params.rest.is_some() || has_keywords(params) {
            return self.unexpected(&[]);
        }
        let span = self.advance()?.span();
        params.forwarding = true;
        params.rest = Some(RestParam { name: None, span });
        params.keyword_rest = Some(KeywordRestParam::Anonymous(span));
        params.block = Some(BlockParam { name: None, span });
        for which in [
            Anonymous::Rest,
            Anonymous::KeywordRest,
            Anonymous::Block,
            Anonymous::All,
        ] {
            self.scopes.declare_anonymous(which);
        }
        Ok(())
    }

    /// Parses `(a, (b, *c), d)` in a parameter list.
    fn parse_destructuring_param(&mut self) -> PResult<Node> {
        let open = self.advance()?.span();
        self.enter_nesting()?;
        let result = self.parse_destructuring_items(open);
        self.leave_nesting();
        result
    }

    fn parse_destructuring_items(&mut self, open: Span) -> PResult<Node> {
        let mut pre = Vec::new();
        let mut rest: Option<Box<Node>> = None;
        let mut post = Vec::new();
        loop {
            let item = match self.current_kind() {
                TokenKind::Identifier(_) => {
                    let (name, span) = self.parse_param_name()?;
                    Node::new(NodeKind::Arg(name), span)
                }
                TokenKind::LParen | TokenKind::LParenBeg | TokenKind::LParenArg => {
                    self.parse_destructuring_param()?
                }
                TokenKind::Splat | TokenKind::Star if rest.is_none() => {
                    let star = self.advance()?.span();
                    let target = self
                        .parse_optional_param_name()?
                        .map(|(name, span)| Node::new(NodeKind::Arg(name), span));
                    let span = target.as_ref().map_or(star, |t| star.merge(t.span));
                    rest = Some(Box::new(Node::new(
                        NodeKind::Splat(target.map(Box::new)),
                        span,
                    )));
                    if !self.match_token(&TokenKind::Comma)? {
                        break;
                    }
                    continue;
                }
                _ => return self.unexpected(&["parameter"]),
            };
            if rest.is_some() {
                post.push(item);
            } else {
                pre.push(item);
            }
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(Node::new(
            NodeKind::MultiTarget { pre, rest, post },
            open.merge(self.prev_span()),
        ))
    }

    // ========================================================================
    // Method Definitions
    // ========================================================================

    /// Parses `def [receiver.]name params body end` or the endless form.
    pub(super) fn parse_def(&mut self) -> PResult<Node> {
        let open = self.advance()?.span();
        let saved_argdef = self.lexer_mut().set_in_argdef(true);
        let (receiver, name, name_span) = self.parse_def_name()?;

        self.push_scope(ScopeKind::Method);
        self.enter_nesting()?;
        let result = self.parse_def_rest(open, saved_argdef, &name, name_span);
        self.leave_nesting();
        self.pop_scope();
        let (params, body, endless) = result?;

        Ok(Node::new(
            NodeKind::Def {
                receiver: receiver.map(Box::new),
                name,
                params: Box::new(params),
                body,
                endless,
            },
            open.merge(self.prev_span()),
        ))
    }

    /// Reads the method name, which the lexer delivers in `FNAME` state,
    /// and the singleton receiver before a `.` if there is one.
    fn parse_def_name(&mut self) -> PResult<(Option<Node>, EcoString, Span)> {
        let token = self.advance()?;
        if !self.check(&TokenKind::Dot) {
            let span = token.span();
            return match method_name(token.kind()) {
                Some(name) => Ok((None, name, span)),
                None => self.unexpected_at(describe(token.kind()), span),
            };
        }
        let receiver = self.singleton_receiver(token)?;
        self.lexer_mut().set_state(LexState::FNAME);
        self.advance()?;
        let token = self.advance()?;
        let span = token.span();
        match method_name(token.kind()) {
            Some(name) => Ok((Some(receiver), name, span)),
            None => self.unexpected_at(describe(token.kind()), span),
        }
    }

    fn singleton_receiver(&mut self, token: Token) -> PResult<Node> {
        let span = token.span();
        let kind = match token.into_kind() {
            TokenKind::Keyword(Keyword::SelfValue) => NodeKind::SelfRef,
            TokenKind::Keyword(Keyword::Nil) => NodeKind::Nil,
            TokenKind::Keyword(Keyword::True) => NodeKind::True,
            TokenKind::Keyword(Keyword::False) => NodeKind::False,
            TokenKind::Identifier(name) => match self.scopes.use_local(&name) {
                Some(kind) => NodeKind::LocalVar { name, kind },
                None => super::expressions::call(None, name, Vec::new()),
            },
            TokenKind::Constant(name) => NodeKind::Const(name),
            TokenKind::InstanceVariable(name) => NodeKind::InstanceVar(name),
            TokenKind::ClassVariable(name) => NodeKind::ClassVar(name),
            TokenKind::GlobalVariable(name) => NodeKind::GlobalVar(name),
            kind => return self.unexpected_at(describe(&kind), span),
        };
        Ok(Node::new(kind, span))
    }

    fn parse_def_rest(
        &mut self,
        open: Span,
        saved_argdef: bool,
        name: &str,
        name_span: Span,
    ) -> PResult<(Params, Option<Box<Node>>, bool)> {
        let params = match self.current_kind() {
            TokenKind::LParen | TokenKind::LParenBeg | TokenKind::LParenArg => {
                let paren = self.advance()?.span();
                let params = self.parse_param_list(ParamClose::MethodParen);
                self.lexer_mut().set_in_argdef(saved_argdef);
                let mut params = params?;
                self.skip_newlines()?;
                if !self.check(&TokenKind::RParen) {
                    return self.unexpected(&["')'"]);
                }
                let lexer = self.lexer_mut();
                lexer.set_state(LexState::BEG);
                lexer.set_command_start(true);
                self.advance()?;
                params.span = paren.merge(self.prev_span());
                params
            }
            kind if kind.is_terminator() || matches!(kind, TokenKind::Assign) => {
                self.lexer_mut().set_in_argdef(saved_argdef);
                Params {
                    span: Span::point(self.span().start_location()),
                    ..Params::default()
                }
            }
            _ => {
                let saved_kwarg = self.lexer_mut().set_in_kwarg(true);
                let params = self.parse_param_list(ParamClose::Terminator);
                let lexer = self.lexer_mut();
                lexer.set_in_kwarg(saved_kwarg);
                lexer.set_in_argdef(saved_argdef);
                let params = params?;
                if !self.current_kind().is_terminator() {
                    return self.unexpected(&["';'", "'\\n'"]);
                }
                params
            }
        };

        if self.check(&TokenKind::Assign) {
            if is_setter(name) {
                self.ctx
                    .semantic_error(SemanticErrorKind::EndlessSetter, name_span);
            }
            self.advance()?;
            let body = self.parse_arg(true)?;
            self.value_expr(&body);
            let body = if self.check_keyword(Keyword::RescueModifier) {
                self.advance()?;
                let rescue = self.parse_arg(false)?;
                let span = body.span.merge(rescue.span);
                Node::new(
                    NodeKind::RescueModifier {
                        body: Box::new(body),
                        rescue: Box::new(rescue),
                    },
                    span,
                )
            } else {
                body
            };
            return Ok((params, Some(Box::new(body)), true));
        }

        let body = self.parse_body()?;
        let close = self.expect_keyword(Keyword::End)?.span();
        self.check_end_alignment(open, Keyword::Def, close);
        Ok((params, non_empty(body), false))
    }

    // ========================================================================
    // Classes and Modules
    // ========================================================================

    /// Parses `class Path [< Superclass] body end` or `class << obj body end`.
    pub(super) fn parse_class(&mut self) -> PResult<Node> {
        let open = self.advance()?.span();
        if self.check(&TokenKind::LShift) {
            return self.parse_singleton_class(open);
        }
        let in_method = self.scopes.in_method();
        let path = self.parse_cpath()?;
        let superclass = if self.check(&TokenKind::Lt) {
            let lexer = self.lexer_mut();
            lexer.set_state(LexState::BEG);
            lexer.set_command_start(true);
            self.advance()?;
            let superclass = self.parse_expr()?;
            self.value_expr(&superclass);
            Some(Box::new(superclass))
        } else {
            None
        };
        let body = self.parse_definition_body(ScopeKind::Class)?;
        let close = self.expect_keyword(Keyword::End)?.span();
        self.check_end_alignment(open, Keyword::Class, close);
        let span = open.merge(close);
        if in_method {
            self.ctx.semantic_error(SemanticErrorKind::ClassInMethod, open);
            return Ok(Node::new(NodeKind::Invalid, span));
        }
        Ok(Node::new(
            NodeKind::Class {
                path: Box::new(path),
                superclass,
                body,
            },
            span,
        ))
    }

    fn parse_singleton_class(&mut self, open: Span) -> PResult<Node> {
        self.advance()?;
        let target = self.parse_expr()?;
        self.value_expr(&target);
        let body = self.parse_definition_body(ScopeKind::Class)?;
        let close = self.expect_keyword(Keyword::End)?.span();
        self.check_end_alignment(open, Keyword::Class, close);
        Ok(Node::new(
            NodeKind::SingletonClass {
                target: Box::new(target),
                body,
            },
            open.merge(close),
        ))
    }

    /// Parses `module Path body end`.
    pub(super) fn parse_module(&mut self) -> PResult<Node> {
        let open = self.advance()?.span();
        let in_method = self.scopes.in_method();
        let path = self.parse_cpath()?;
        let body = self.parse_definition_body(ScopeKind::Class)?;
        let close = self.expect_keyword(Keyword::End)?.span();
        self.check_end_alignment(open, Keyword::Module, close);
        let span = open.merge(close);
        if in_method {
            self.ctx.semantic_error(SemanticErrorKind::ModuleInMethod, open);
            return Ok(Node::new(NodeKind::Invalid, span));
        }
        Ok(Node::new(
            NodeKind::Module {
                path: Box::new(path),
                body,
            },
            span,
        ))
    }

    fn parse_cpath(&mut self) -> PResult<Node> {
        let path = self.parse_primary(false)?;
        match path.kind {
            NodeKind::Const(_) | NodeKind::ScopedConst { .. } => Ok(path),
            _ => self.unexpected_at("class/module name", path.span),
        }
    }

    /// Parses the body of a class or module in its own local scope; the
    /// header must end with a terminator.
    fn parse_definition_body(&mut self, kind: ScopeKind) -> PResult<Option<Box<Node>>> {
        if !self.current_kind().is_terminator() {
            return self.unexpected(&["';'", "'\\n'"]);
        }
        self.push_scope(kind);
        let body = match self.enter_nesting() {
            Ok(()) => {
                let body = self.parse_body();
                self.leave_nesting();
                body
            }
            Err(err) => Err(err),
        };
        self.pop_scope();
        Ok(non_empty(body?))
    }

    // ========================================================================
    // Alias and Undef
    // ========================================================================

    /// Parses `alias new old` or `alias $new $old`.
    pub(super) fn parse_alias(&mut self) -> PResult<Node> {
        let open = self.advance()?.span();
        if matches!(self.current_kind(), TokenKind::GlobalVariable(_)) {
            return self.parse_global_alias(open);
        }
        let new_name = self.parse_fitem(Some(LexState::FNAME | LexState::FITEM))?;
        let old_name = self.parse_fitem(None)?;
        Ok(Node::new(
            NodeKind::Alias {
                new_name: Box::new(new_name),
                old_name: Box::new(old_name),
            },
            open.merge(self.prev_span()),
        ))
    }

    fn parse_global_alias(&mut self, open: Span) -> PResult<Node> {
        let token = self.advance()?;
        let new_span = token.span();
        let TokenKind::GlobalVariable(new_name) = token.into_kind() else {
            return self.unexpected_at("global variable", new_span);
        };
        let token = self.advance()?;
        let span = token.span();
        let old_name = match token.into_kind() {
            TokenKind::GlobalVariable(name) => name,
            TokenKind::BackRef(b) => ecow::eco_format!("${}", char::from(b)),
            TokenKind::NthRef(_) => {
                self.ctx.semantic_error(SemanticErrorKind::AliasNthRef, span);
                return Ok(Node::new(NodeKind::Invalid, open.merge(span)));
            }
            kind => return self.unexpected_at(describe(&kind), span),
        };
        Ok(Node::new(
            NodeKind::GlobalAlias { new_name, old_name },
            open.merge(span),
        ))
    }

    /// Parses `undef a, :b, c=`.
    pub(super) fn parse_undef(&mut self) -> PResult<Node> {
        let open = self.advance()?.span();
        let mut names = Vec::new();
        loop {
            names.push(self.parse_fitem(None)?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.lexer_mut().set_state(LexState::FNAME | LexState::FITEM);
            self.advance()?;
        }
        Ok(Node::new(NodeKind::Undef(names), open.merge(self.prev_span())))
    }

    /// Parses a method name or symbol as a `Symbol` node. `close_state` is
    /// applied before the token after the item is read.
    fn parse_fitem(&mut self, close_state: Option<LexState>) -> PResult<Node> {
        if self.check(&TokenKind::SymbolBegin) {
            return self.parse_symbol_then(close_state);
        }
        let Some(name) = method_name(self.current_kind()) else {
            return self.unexpected(&["method name"]);
        };
        if let Some(state) = close_state {
            self.lexer_mut().set_state(state);
        }
        let span = self.advance()?.span();
        Ok(Node::new(NodeKind::Symbol(name), span))
    }

    // ========================================================================
    // BEGIN and END
    // ========================================================================

    /// Parses `BEGIN { }`, which is only allowed at the top level.
    pub(super) fn parse_pre_execution(&mut self) -> PResult<Node> {
        let open = self.advance()?.span();
        let top_level =
            self.statement_depth == 1 && self.scopes.current_kind() == ScopeKind::TopLevel;
        let body = self.parse_execution_block()?;
        let span = open.merge(self.prev_span());
        if !top_level {
            self.ctx
                .semantic_error(SemanticErrorKind::BeginNotAtTopLevel, open);
            return Ok(Node::new(NodeKind::Invalid, span));
        }
        Ok(Node::new(NodeKind::PreExecution(Box::new(body)), span))
    }

    /// Parses `END { }`, whose body has its own block scope.
    pub(super) fn parse_post_execution(&mut self) -> PResult<Node> {
        let open = self.advance()?.span();
        self.push_scope(ScopeKind::Block);
        let body = self.parse_execution_block();
        self.pop_scope();
        let body = body?;
        Ok(Node::new(
            NodeKind::PostExecution(Box::new(body)),
            open.merge(self.prev_span()),
        ))
    }

    fn parse_execution_block(&mut self) -> PResult<Node> {
        if !matches!(
            self.current_kind(),
            TokenKind::LBraceBlock | TokenKind::LBraceHash | TokenKind::LBraceArg
        ) {
            return self.unexpected(&["'{'"]);
        }
        self.advance()?;
        self.enter_nesting()?;
        let body = self.parse_statements_node();
        self.leave_nesting();
        let body = body?;
        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(body)
    }
}
