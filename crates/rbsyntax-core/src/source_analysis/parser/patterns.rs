// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Pattern matching.
//!
//! Patterns appear after `in` in a `case` expression and on the right of
//! `expr => pattern` and `expr in pattern`. The grammar, loosely:
//!
//! ```text
//! top      := kwargs | args | find | pattern
//! pattern  := alt ('=>' name)*
//! alt      := basic ('|' basic)*
//! basic    := value | name | '^' pin | Const | Const '(' ... ')' | Const '[' ... ']'
//!           | '[' args | find ']' | '{' kwargs '}' | '(' pattern ')'
//! value    := primitive | primitive '..' primitive? | '..' primitive
//! ```
//!
//! A bare name binds the matched value to a local, which is declared as
//! soon as the name is read.

use ecow::EcoString;

use crate::ast::{Node, NodeKind};

use super::statements::numbered_param_index;
use super::{Keyword, PResult, Parser, SemanticErrorKind, Span, TokenKind};

/// The first item of a list whose shape is not yet known.
enum Lead {
    /// `key:` or `"key":`
    Key(EcoString, Span),
    /// `**rest`, `**` or `**nil`
    KeywordRest(Node),
    /// Anything else, including `*rest`.
    Element(Node),
}

fn is_splat(node: &Node) -> bool {
    matches!(node.kind, NodeKind::SplatPattern(_))
}

fn binds_local(key: &str) -> bool {
    key.starts_with(|c: char| c == '_' || c.is_lowercase())
        && key.chars().all(|c| c == '_' || c.is_alphanumeric())
}

impl Parser<'_> {
    /// Parses `value => pattern` or `value in pattern`. The operator is the
    /// current token.
    pub(super) fn parse_pattern_test(&mut self, value: Node, raises: bool) -> PResult<Node> {
        self.value_expr(&value);
        let saved = self.enter_pattern_mode();
        let result = match self.advance() {
            Ok(_) => self.parse_top_pattern(),
            Err(err) => Err(err),
        };
        self.lexer_mut().set_in_kwarg(saved);
        let pattern = result?;
        self.check_pattern_bindings(&pattern);
        let span = value.span.merge(pattern.span);
        Ok(Node::new(
            NodeKind::PatternTest {
                value: Box::new(value),
                pattern: Box::new(pattern),
                raises,
            },
            span,
        ))
    }

    /// Parses a pattern that may be an array or hash pattern without
    /// brackets: `in a, *rest` or `in name:, age:`.
    pub(super) fn parse_top_pattern(&mut self) -> PResult<Node> {
        let start = self.span();
        match self.parse_pattern_lead()? {
            lead @ (Lead::Key(..) | Lead::KeywordRest(_)) => {
                let (pairs, rest) = self.parse_hash_pattern_items(Some(lead), None)?;
                Ok(Node::new(
                    NodeKind::HashPattern {
                        constant: None,
                        pairs,
                        rest,
                    },
                    start.merge(self.prev_span()),
                ))
            }
            Lead::Element(first) => {
                if !self.check(&TokenKind::Comma) && !is_splat(&first) {
                    return Ok(first);
                }
                let (items, trailing_comma) = self.parse_array_pattern_items(first, None)?;
                let span = start.merge(self.prev_span());
                self.build_array_pattern(None, items, trailing_comma, span)
            }
        }
    }

    fn parse_pattern_lead(&mut self) -> PResult<Lead> {
        match self.current_kind() {
            TokenKind::Label(_) | TokenKind::DoubleSplat | TokenKind::Pow => {
                self.parse_hash_pattern_lead()
            }
            TokenKind::StringBegin => {
                let (node, label) = self.parse_string_or_label()?;
                if label {
                    let (key, span) = self.pattern_key(node)?;
                    return Ok(Lead::Key(key, span));
                }
                Ok(Lead::Element(self.parse_pattern_from(Some(node))?))
            }
            _ => Ok(Lead::Element(self.parse_array_pattern_item()?)),
        }
    }

    // ========================================================================
    // Pattern Expressions
    // ========================================================================

    /// Parses one pattern with its alternatives and captures.
    fn parse_pattern(&mut self) -> PResult<Node> {
        self.parse_pattern_from(None)
    }

    /// Like [`Self::parse_pattern`], continuing from an already parsed
    /// value when `first` is given.
    fn parse_pattern_from(&mut self, first: Option<Node>) -> PResult<Node> {
        // 32 KiB red zone, 256 KiB new segment.
        stacker::maybe_grow(32 * 1024, 256 * 1024, || {
            self.enter_nesting()?;
            let result = self.parse_pattern_capture(first);
            self.leave_nesting();
            result
        })
    }

    fn parse_pattern_capture(&mut self, first: Option<Node>) -> PResult<Node> {
        let mut pattern = self.parse_pattern_alternatives(first)?;
        while self.check(&TokenKind::Assoc) {
            self.advance()?;
            let (name, span) = self.parse_match_var_name()?;
            let span = pattern.span.merge(span);
            pattern = Node::new(
                NodeKind::CapturePattern {
                    pattern: Box::new(pattern),
                    name,
                },
                span,
            );
        }
        Ok(pattern)
    }

    fn parse_pattern_alternatives(&mut self, first: Option<Node>) -> PResult<Node> {
        let first = match first {
            Some(value) => self.finish_pattern_value(value)?,
            None => self.parse_pattern_primary()?,
        };
        if !self.check(&TokenKind::Pipe) {
            return Ok(first);
        }
        let mut alternatives = vec![first];
        while self.match_token(&TokenKind::Pipe)? {
            alternatives.push(self.parse_pattern_primary()?);
        }
        let span = match (alternatives.first(), alternatives.last()) {
            (Some(first), Some(last)) => first.span.merge(last.span),
            _ => self.prev_span(),
        };
        Ok(Node::new(NodeKind::AlternativePattern(alternatives), span))
    }

    fn parse_pattern_primary(&mut self) -> PResult<Node> {
        match self.current_kind() {
            TokenKind::Identifier(_) => {
                let (name, span) = self.parse_match_var_name()?;
                Ok(Node::new(NodeKind::MatchVar(name), span))
            }
            TokenKind::Caret => self.parse_pinned(),
            TokenKind::LBracket | TokenKind::LBracketArray => {
                let start = self.span();
                self.parse_bracket_pattern(None, start)
            }
            TokenKind::LBraceHash | TokenKind::LBraceBlock | TokenKind::LBraceArg => {
                self.parse_brace_pattern()
            }
            TokenKind::LParen | TokenKind::LParenBeg | TokenKind::LParenArg => {
                self.advance()?;
                self.skip_newlines()?;
                let inner = self.parse_pattern()?;
                self.skip_newlines()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Constant(_) | TokenKind::ColonColonPrefix => self.parse_constant_pattern(),
            _ => self.parse_pattern_value(),
        }
    }

    /// Reads a name that binds the matched value and declares it.
    fn parse_match_var_name(&mut self) -> PResult<(EcoString, Span)> {
        let TokenKind::Identifier(name) = self.current_kind() else {
            return self.unexpected(&["local variable name"]);
        };
        let name = name.clone();
        let span = self.advance()?.span();
        if numbered_param_index(&name).is_some() {
            self.ctx
                .semantic_error(SemanticErrorKind::AssignToNumberedParameter(name.clone()), span);
        }
        self.scopes.declare_local(&name, span);
        Ok((name, span))
    }

    /// Parses `^local`, `^@ivar`, `^$gvar`, `^@@cvar` or `^(expr)`.
    fn parse_pinned(&mut self) -> PResult<Node> {
        let caret = self.advance()?.span();
        let kind = match self.current_kind() {
            TokenKind::LParen | TokenKind::LParenBeg | TokenKind::LParenArg => {
                self.advance()?;
                self.skip_newlines()?;
                let expr = self.parse_expr()?;
                self.skip_newlines()?;
                self.expect(&TokenKind::RParen, "')'")?;
                return Ok(Node::new(
                    NodeKind::PinnedExpr(Box::new(expr)),
                    caret.merge(self.prev_span()),
                ));
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let span = self.advance()?.span();
                match self.scopes.use_local(&name) {
                    Some(kind) => NodeKind::LocalVar { name, kind },
                    None => {
                        return Ok(self.semantic_error(
                            SemanticErrorKind::UnknownPinnedLocal(name),
                            caret.merge(span),
                        ));
                    }
                }
            }
            TokenKind::InstanceVariable(name) => {
                let kind = NodeKind::InstanceVar(name.clone());
                self.advance()?;
                kind
            }
            TokenKind::ClassVariable(name) => {
                let kind = NodeKind::ClassVar(name.clone());
                self.advance()?;
                kind
            }
            TokenKind::GlobalVariable(name) => {
                let kind = NodeKind::GlobalVar(name.clone());
                self.advance()?;
                kind
            }
            _ => return self.unexpected(&["variable", "'('"]),
        };
        let span = self.prev_span();
        Ok(Node::new(
            NodeKind::PinnedVar(Box::new(Node::new(kind, span))),
            caret.merge(span),
        ))
    }

    // ========================================================================
    // Values
    // ========================================================================

    fn parse_pattern_value(&mut self) -> PResult<Node> {
        let exclusive = match self.current_kind() {
            TokenKind::BeginlessDotDot => false,
            TokenKind::BeginlessDotDotDot => true,
            _ => {
                let low = self.parse_pattern_primitive()?;
                return self.finish_pattern_value(low);
            }
        };
        let op = self.advance()?.span();
        let high = self.parse_pattern_primitive()?;
        let span = op.merge(high.span);
        Ok(Node::new(
            NodeKind::Range {
                low: None,
                high: Some(Box::new(high)),
                exclusive,
            },
            span,
        ))
    }

    /// Continues a value with `..` or `...` if one follows.
    fn finish_pattern_value(&mut self, low: Node) -> PResult<Node> {
        let exclusive = match self.current_kind() {
            TokenKind::DotDot => false,
            TokenKind::DotDotDot => true,
            _ => return Ok(low),
        };
        let op = self.advance()?.span();
        let high = if self.starts_pattern_primitive() {
            Some(Box::new(self.parse_pattern_primitive()?))
        } else {
            None
        };
        let span = low.span.merge(high.as_ref().map_or(op, |h| h.span));
        Ok(Node::new(
            NodeKind::Range {
                low: Some(Box::new(low)),
                high,
                exclusive,
            },
            span,
        ))
    }

    fn parse_pattern_primitive(&mut self) -> PResult<Node> {
        if !self.starts_pattern_primitive() {
            return self.unexpected(&["pattern"]);
        }
        if self.check(&TokenKind::UMinusNum) {
            return self.parse_negative_number();
        }
        self.parse_primary(false)
    }

    fn starts_pattern_primitive(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Numeric(_)
                | TokenKind::UMinusNum
                | TokenKind::Char(_)
                | TokenKind::StringBegin
                | TokenKind::XStringBegin
                | TokenKind::SymbolBegin
                | TokenKind::RegexpBegin
                | TokenKind::WordsBegin
                | TokenKind::QWordsBegin
                | TokenKind::SymbolsBegin
                | TokenKind::QSymbolsBegin
                | TokenKind::Arrow
                | TokenKind::Keyword(
                    Keyword::Nil
                        | Keyword::True
                        | Keyword::False
                        | Keyword::SelfValue
                        | Keyword::File
                        | Keyword::Line
                        | Keyword::Encoding
                )
        )
    }

    fn starts_pattern(&self) -> bool {
        self.starts_pattern_primitive()
            || matches!(
                self.current_kind(),
                TokenKind::Identifier(_)
                    | TokenKind::Constant(_)
                    | TokenKind::ColonColonPrefix
                    | TokenKind::Caret
                    | TokenKind::LBracket
                    | TokenKind::LBracketArray
                    | TokenKind::LBraceHash
                    | TokenKind::LParen
                    | TokenKind::LParenBeg
                    | TokenKind::Splat
                    | TokenKind::Star
                    | TokenKind::BeginlessDotDot
                    | TokenKind::BeginlessDotDotDot
            )
    }

    // ========================================================================
    // Constant Patterns
    // ========================================================================

    /// Parses `Const`, `Const(...)` or `Const[...]`.
    fn parse_constant_pattern(&mut self) -> PResult<Node> {
        let constant = self.parse_pattern_const()?;
        if self.space_before() {
            return Ok(constant);
        }
        let start = constant.span;
        match self.current_kind() {
            TokenKind::LParen | TokenKind::LParenBeg | TokenKind::LParenArg => {
                self.parse_paren_pattern(constant, start)
            }
            TokenKind::LBracket | TokenKind::LBracketArray => {
                self.parse_bracket_pattern(Some(constant), start)
            }
            _ => Ok(constant),
        }
    }

    fn parse_pattern_const(&mut self) -> PResult<Node> {
        let start = self.span();
        let mut node = if self.match_token(&TokenKind::ColonColonPrefix)? {
            let (name, span) = self.expect_constant()?;
            Node::new(NodeKind::ScopedConst { scope: None, name }, start.merge(span))
        } else {
            let (name, span) = self.expect_constant()?;
            Node::new(NodeKind::Const(name), span)
        };
        while self.match_token(&TokenKind::ColonColon)? {
            let (name, span) = self.expect_constant()?;
            node = Node::new(
                NodeKind::ScopedConst {
                    scope: Some(Box::new(node)),
                    name,
                },
                start.merge(span),
            );
        }
        Ok(node)
    }

    fn expect_constant(&mut self) -> PResult<(EcoString, Span)> {
        let TokenKind::Constant(name) = self.current_kind() else {
            return self.unexpected(&["constant"]);
        };
        let name = name.clone();
        let span = self.advance()?.span();
        Ok((name, span))
    }

    /// Parses `Const(...)`, which holds either array or hash patterns.
    fn parse_paren_pattern(&mut self, constant: Node, start: Span) -> PResult<Node> {
        self.advance()?;
        self.skip_newlines()?;
        if self.match_token(&TokenKind::RParen)? {
            return Ok(Node::new(
                NodeKind::ArrayPattern {
                    constant: Some(Box::new(constant)),
                    pre: Vec::new(),
                    rest: None,
                    post: Vec::new(),
                },
                start.merge(self.prev_span()),
            ));
        }
        let close = TokenKind::RParen;
        match self.parse_pattern_lead()? {
            lead @ (Lead::Key(..) | Lead::KeywordRest(_)) => {
                let (pairs, rest) = self.parse_hash_pattern_items(Some(lead), Some(&close))?;
                self.skip_newlines()?;
                self.expect(&close, "')'")?;
                Ok(Node::new(
                    NodeKind::HashPattern {
                        constant: Some(Box::new(constant)),
                        pairs,
                        rest,
                    },
                    start.merge(self.prev_span()),
                ))
            }
            Lead::Element(first) => {
                let (items, trailing_comma) = self.parse_array_pattern_items(first, Some(&close))?;
                self.skip_newlines()?;
                self.expect(&close, "')'")?;
                let span = start.merge(self.prev_span());
                self.build_array_pattern(Some(constant), items, trailing_comma, span)
            }
        }
    }

    // ========================================================================
    // Array and Find Patterns
    // ========================================================================

    fn parse_bracket_pattern(&mut self, constant: Option<Node>, start: Span) -> PResult<Node> {
        self.advance()?;
        self.skip_newlines()?;
        let close = TokenKind::RBracket;
        let (items, trailing_comma) = if self.check(&close) {
            (Vec::new(), false)
        } else {
            let first = self.parse_array_pattern_item()?;
            self.parse_array_pattern_items(first, Some(&close))?
        };
        self.skip_newlines()?;
        self.expect(&close, "']'")?;
        let span = start.merge(self.prev_span());
        self.build_array_pattern(constant, items, trailing_comma, span)
    }

    fn parse_array_pattern_item(&mut self) -> PResult<Node> {
        if !matches!(self.current_kind(), TokenKind::Splat | TokenKind::Star) {
            return self.parse_pattern();
        }
        let star = self.advance()?.span();
        if matches!(self.current_kind(), TokenKind::Identifier(_)) {
            let (name, span) = self.parse_match_var_name()?;
            return Ok(Node::new(NodeKind::SplatPattern(Some(name)), star.merge(span)));
        }
        Ok(Node::new(NodeKind::SplatPattern(None), star))
    }

    /// Parses the items after `first`. Without `close` the list ends at
    /// the first token that cannot start a pattern. Returns whether the
    /// list ended with a comma.
    fn parse_array_pattern_items(
        &mut self,
        first: Node,
        close: Option<&TokenKind>,
    ) -> PResult<(Vec<Node>, bool)> {
        let mut items = vec![first];
        loop {
            if close.is_some() {
                self.skip_newlines()?;
            }
            if !self.match_token(&TokenKind::Comma)? {
                return Ok((items, false));
            }
            let ends = match close {
                Some(kind) => {
                    self.skip_newlines()?;
                    self.check(kind)
                }
                None => !self.starts_pattern(),
            };
            if ends {
                return Ok((items, true));
            }
            items.push(self.parse_array_pattern_item()?);
        }
    }

    /// Sorts items into an array pattern or, with a splat at both ends, a
    /// find pattern. A trailing comma stands for an anonymous rest.
    fn build_array_pattern(
        &mut self,
        constant: Option<Node>,
        mut items: Vec<Node>,
        trailing_comma: bool,
        span: Span,
    ) -> PResult<Node> {
        let constant = constant.map(Box::new);
        let splats: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| is_splat(item))
            .map(|(i, _)| i)
            .collect();
        let kind = match splats.as_slice() {
            [] => {
                let rest = trailing_comma
                    .then(|| Box::new(Node::new(NodeKind::SplatPattern(None), self.prev_span())));
                NodeKind::ArrayPattern {
                    constant,
                    pre: items,
                    rest,
                    post: Vec::new(),
                }
            }
            [_] | [_, _] if trailing_comma => return self.unexpected_at("','", self.prev_span()),
            &[at] => {
                let post = items.split_off(at + 1);
                let rest = items.pop().map(Box::new);
                NodeKind::ArrayPattern {
                    constant,
                    pre: items,
                    rest,
                    post,
                }
            }
            &[0, last] if last == items.len() - 1 && items.len() > 2 => {
                let mut middle = items.split_off(1);
                let (Some(post_rest), Some(pre_rest)) = (middle.pop(), items.pop()) else {
                    return self.unexpected_at("'*'", span);
                };
                NodeKind::FindPattern {
                    constant,
                    pre_rest: Box::new(pre_rest),
                    middle,
                    post_rest: Box::new(post_rest),
                }
            }
            &[.., extra] => return self.unexpected_at("'*'", items[extra].span),
        };
        Ok(Node::new(kind, span))
    }

    // ========================================================================
    // Hash Patterns
    // ========================================================================

    fn parse_brace_pattern(&mut self) -> PResult<Node> {
        let start = self.advance()?.span();
        self.skip_newlines()?;
        let close = TokenKind::RBrace;
        let (pairs, rest) = if self.check(&close) {
            (Vec::new(), None)
        } else {
            self.parse_hash_pattern_items(None, Some(&close))?
        };
        self.skip_newlines()?;
        self.expect(&close, "'}'")?;
        Ok(Node::new(
            NodeKind::HashPattern {
                constant: None,
                pairs,
                rest,
            },
            start.merge(self.prev_span()),
        ))
    }

    fn parse_hash_pattern_lead(&mut self) -> PResult<Lead> {
        match self.current_kind() {
            TokenKind::Label(name) => {
                let name = name.clone();
                let span = self.advance()?.span();
                Ok(Lead::Key(name, span))
            }
            TokenKind::StringBegin => {
                let (node, label) = self.parse_string_or_label()?;
                if !label {
                    return self.unexpected_at("string literal", node.span);
                }
                let (key, span) = self.pattern_key(node)?;
                Ok(Lead::Key(key, span))
            }
            TokenKind::DoubleSplat | TokenKind::Pow => {
                let stars = self.advance()?.span();
                let kind = if self.check_keyword(Keyword::Nil) {
                    self.advance()?;
                    NodeKind::NoKeywordsPattern
                } else if matches!(self.current_kind(), TokenKind::Identifier(_)) {
                    let (name, _) = self.parse_match_var_name()?;
                    NodeKind::KeywordRestPattern(Some(name))
                } else {
                    NodeKind::KeywordRestPattern(None)
                };
                Ok(Lead::KeywordRest(Node::new(kind, stars.merge(self.prev_span()))))
            }
            _ => self.unexpected(&["label", "'**'"]),
        }
    }

    /// Extracts the key of a `"string":` label, which may not interpolate.
    fn pattern_key(&mut self, node: Node) -> PResult<(EcoString, Span)> {
        match node.kind {
            NodeKind::Symbol(key) => Ok((key, node.span)),
            _ => self.unexpected_at("symbol literal with interpolation", node.span),
        }
    }

    /// Parses `key: pattern` pairs and an optional trailing `**rest`.
    fn parse_hash_pattern_items(
        &mut self,
        mut lead: Option<Lead>,
        close: Option<&TokenKind>,
    ) -> PResult<(Vec<Node>, Option<Box<Node>>)> {
        let mut pairs = Vec::new();
        loop {
            let next = match lead.take() {
                Some(lead) => lead,
                None => self.parse_hash_pattern_lead()?,
            };
            match next {
                Lead::Key(key, span) => pairs.push(self.finish_pattern_pair(key, span)?),
                Lead::KeywordRest(rest) => return Ok((pairs, Some(Box::new(rest)))),
                Lead::Element(node) => return self.unexpected_at("pattern", node.span),
            }
            if close.is_some() {
                self.skip_newlines()?;
            }
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
            if close.is_some() {
                self.skip_newlines()?;
            }
            if !matches!(
                self.current_kind(),
                TokenKind::Label(_)
                    | TokenKind::StringBegin
                    | TokenKind::DoubleSplat
                    | TokenKind::Pow
            ) {
                break;
            }
        }
        Ok((pairs, None))
    }

    fn finish_pattern_pair(&mut self, key: EcoString, key_span: Span) -> PResult<Node> {
        let value = if self.pattern_value_omitted() {
            if binds_local(&key) {
                self.scopes.declare_local(&key, key_span);
            }
            None
        } else {
            Some(Box::new(self.parse_pattern()?))
        };
        let span = value.as_ref().map_or(key_span, |v| key_span.merge(v.span));
        Ok(Node::new(NodeKind::PatternPair { key, value }, span))
    }

    fn pattern_value_omitted(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Comma
                | TokenKind::RBrace
                | TokenKind::RParen
                | TokenKind::Newline
                | TokenKind::Semicolon
                | TokenKind::Eof
                | TokenKind::Keyword(
                    Keyword::Then | Keyword::IfModifier | Keyword::UnlessModifier
                )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{parse_err, parse_ok, single};
    use crate::ast::{Node, NodeKind};
    use crate::source_analysis::{SemanticErrorKind, SyntaxErrorKind};

    fn in_pattern(source: &str) -> Node {
        let NodeKind::CaseMatch { clauses, .. } = single(source).kind else {
            panic!("expected case/in: {source}");
        };
        let clause = clauses.into_iter().next().expect("one clause");
        let NodeKind::InClause { pattern, .. } = clause.kind else {
            panic!("expected in clause");
        };
        *pattern
    }

    fn semantic(source: &str, predicate: impl Fn(&SemanticErrorKind) -> bool) {
        let err = parse_err(source);
        assert!(
            err.has_kind(|k| matches!(k, SyntaxErrorKind::Semantic(kind) if predicate(kind))),
            "{source:?}: {err:?}"
        );
    }

    #[test]
    fn array_pattern_with_rest() {
        let pattern = in_pattern("case x\nin [a, *rest, b]\nend");
        let NodeKind::ArrayPattern { pre, rest, post, .. } = pattern.kind else {
            panic!("expected array pattern");
        };
        assert_eq!(pre.len(), 1);
        assert!(matches!(rest.map(|r| r.kind), Some(NodeKind::SplatPattern(Some(ref n))) if n == "rest"));
        assert_eq!(post.len(), 1);
    }

    #[test]
    fn find_pattern() {
        let pattern = in_pattern("case x\nin [*, 1, 2, *post]\nend");
        assert!(matches!(
            pattern.kind,
            NodeKind::FindPattern { ref middle, .. } if middle.len() == 2
        ));
        parse_err("case x\nin [*a, *b]\nend");
    }

    #[test]
    fn braceless_top_level_patterns() {
        assert!(matches!(
            in_pattern("case x\nin a, b\nend").kind,
            NodeKind::ArrayPattern { ref pre, rest: None, .. } if pre.len() == 2
        ));
        assert!(matches!(
            in_pattern("case x\nin a, then nil\nend").kind,
            NodeKind::ArrayPattern { rest: Some(_), .. }
        ));
        assert!(matches!(
            in_pattern("case x\nin name:, age: Integer\nend").kind,
            NodeKind::HashPattern { ref pairs, .. } if pairs.len() == 2
        ));
    }

    #[test]
    fn hash_pattern_with_rest() {
        let pattern = in_pattern("case x\nin {name: String => n, **others}\nend");
        let NodeKind::HashPattern { pairs, rest, .. } = pattern.kind else {
            panic!("expected hash pattern");
        };
        assert!(matches!(
            pairs[0].kind,
            NodeKind::PatternPair { value: Some(ref v), .. } if matches!(v.kind, NodeKind::CapturePattern { .. })
        ));
        assert!(matches!(rest.map(|r| r.kind), Some(NodeKind::KeywordRestPattern(Some(_)))));
        assert!(matches!(
            in_pattern("case x\nin {a: 1, **nil}\nend").kind,
            NodeKind::HashPattern { rest: Some(ref r), .. } if matches!(r.kind, NodeKind::NoKeywordsPattern)
        ));
        assert!(matches!(
            in_pattern("case x\nin {}\nend").kind,
            NodeKind::HashPattern { ref pairs, rest: None, .. } if pairs.is_empty()
        ));
    }

    #[test]
    fn string_keys() {
        assert!(matches!(
            in_pattern("case x\nin {\"name\": n}\nend").kind,
            NodeKind::HashPattern { ref pairs, .. }
                if matches!(pairs[0].kind, NodeKind::PatternPair { ref key, .. } if key == "name")
        ));
    }

    #[test]
    fn constant_patterns() {
        assert!(matches!(
            in_pattern("case p\nin Point(x:, y:)\nend").kind,
            NodeKind::HashPattern { constant: Some(_), .. }
        ));
        assert!(matches!(
            in_pattern("case p\nin Point[1, 2]\nend").kind,
            NodeKind::ArrayPattern { constant: Some(_), ref pre, .. } if pre.len() == 2
        ));
        assert!(matches!(
            in_pattern("case p\nin Geo::Point\nend").kind,
            NodeKind::ScopedConst { .. }
        ));
    }

    #[test]
    fn alternatives_and_captures() {
        assert!(matches!(
            in_pattern("case x\nin 1 | 2 | 3\nend").kind,
            NodeKind::AlternativePattern(ref alts) if alts.len() == 3
        ));
        assert!(matches!(
            in_pattern("case x\nin Integer | Float => n\nend").kind,
            NodeKind::CapturePattern { ref name, .. } if name == "n"
        ));
        semantic("case x\nin a | 1\nend", |k| {
            matches!(k, SemanticErrorKind::IllegalVariableInAlternative(_))
        });
        parse_ok("case x\nin _ | 1\nend");
    }

    #[test]
    fn ranges() {
        assert!(matches!(
            in_pattern("case x\nin 1..5\nend").kind,
            NodeKind::Range { low: Some(_), high: Some(_), exclusive: false }
        ));
        assert!(matches!(
            in_pattern("case x\nin ...5\nend").kind,
            NodeKind::Range { low: None, high: Some(_), exclusive: true }
        ));
        assert!(matches!(
            in_pattern("case x\nin 1.. then nil\nend").kind,
            NodeKind::Range { high: None, .. }
        ));
        assert!(matches!(
            in_pattern("case x\nin -1\nend").kind,
            NodeKind::Number(_)
        ));
    }

    #[test]
    fn pinned_values() {
        let program = parse_ok("v = 1\ncase x\nin ^v\nend");
        let NodeKind::CaseMatch { clauses, .. } = &program.statements[1].kind else {
            panic!("expected case/in");
        };
        assert!(matches!(
            clauses[0].kind,
            NodeKind::InClause { ref pattern, .. } if matches!(pattern.kind, NodeKind::PinnedVar(_))
        ));
        assert!(matches!(
            in_pattern("case x\nin ^(1 + 2)\nend").kind,
            NodeKind::PinnedExpr(_)
        ));
        assert!(matches!(in_pattern("case x\nin ^@a\nend").kind, NodeKind::PinnedVar(_)));
        semantic("case x\nin ^nope\nend", |k| {
            matches!(k, SemanticErrorKind::UnknownPinnedLocal(_))
        });
    }

    #[test]
    fn duplicate_keys_are_errors() {
        semantic("case x\nin {a: 1, a: 2}\nend", |k| {
            matches!(k, SemanticErrorKind::DuplicatePatternKey(_))
        });
    }

    #[test]
    fn bound_names_become_locals() {
        let program = parse_ok("case v\nin [a]\n  a -1\nend");
        let NodeKind::CaseMatch { clauses, .. } = &program.statements[0].kind else {
            panic!("expected case/in");
        };
        let NodeKind::InClause { body: Some(body), .. } = &clauses[0].kind else {
            panic!("expected body");
        };
        let NodeKind::Statements(statements) = &body.kind else {
            panic!("expected statements");
        };
        assert!(matches!(statements[0].kind, NodeKind::Call { ref name, .. } if name == "-"));
    }

    #[test]
    fn standalone_pattern_tests() {
        assert!(matches!(
            single("x in Integer").kind,
            NodeKind::PatternTest { raises: false, .. }
        ));
        let program = parse_ok("h => {k:}\nk -1");
        assert!(matches!(
            program.statements[0].kind,
            NodeKind::PatternTest { raises: true, .. }
        ));
        assert!(matches!(
            program.statements[1].kind,
            NodeKind::Call { ref name, .. } if name == "-"
        ));
    }
}
