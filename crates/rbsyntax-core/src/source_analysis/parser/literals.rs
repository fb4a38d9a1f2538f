// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Quoted literal parsing.
//!
//! The lexer hands a literal over as an opening token, a run of content
//! fragments, interpolations and word separators, and a closing token. This
//! module folds that run back into nodes:
//!
//! - strings (with adjacent-literal concatenation) and heredocs
//! - command strings, regexps and symbols, including `:"..."` and `%s()`
//! - `%w %W %i %I` word lists
//! - string labels (`"key": value`)
//!
//! Squiggly heredocs are dedented here, once the closing token reports the
//! body's common indentation. Only fragments that start a physical line are
//! touched.

use ecow::EcoString;

use crate::ast::{Node, NodeKind};
use crate::source_analysis::terminator::dedent;

use super::{LexState, PResult, Parser, Span, TokenKind};

/// One piece of a literal body.
enum Part {
    Text {
        bytes: Vec<u8>,
        line_start: bool,
        span: Span,
    },
    Node(Node),
}

/// How a literal body ended.
enum Close {
    /// `StringEnd`, or a regexp's closing delimiter with its options.
    Plain(Option<EcoString>),
    /// A heredoc terminator line.
    Heredoc(Option<usize>),
    /// A string used as a hash label.
    Label,
}

/// The word a list element turns into.
#[derive(Clone, Copy, PartialEq, Eq)]
enum WordKind {
    String,
    Symbol,
}

/// Converts literal bytes into a name.
pub(super) fn bytes_to_name(bytes: &[u8]) -> EcoString {
    EcoString::from(String::from_utf8_lossy(bytes).as_ref())
}

impl Parser<'_> {
    // ========================================================================
    // Strings
    // ========================================================================

    /// Parses a string, command string or heredoc literal, joining adjacent
    /// plain string literals.
    pub(super) fn parse_string(&mut self) -> PResult<Node> {
        let (node, label) = self.parse_string_or_label()?;
        if label {
            return self.unexpected_at("label", node.span);
        }
        Ok(node)
    }

    /// Parses a string that may turn out to be a `"key":` label.
    ///
    /// Returns the node (a symbol for labels) and whether it was a label.
    pub(super) fn parse_string_or_label(&mut self) -> PResult<(Node, bool)> {
        let opening = self.advance()?;
        let command = matches!(opening.kind(), TokenKind::XStringBegin);
        let (parts, close) = self.parse_literal_body()?;
        let end = self.prev_span();

        match close {
            Close::Label => Ok((self.symbol_node(parts, opening.span().merge(end)), true)),
            Close::Heredoc(indent) => {
                let parts = match indent {
                    Some(width) => dedent_parts(parts, width),
                    None => parts,
                };
                let span = opening.span();
                let node = if command {
                    Node::new(NodeKind::XStr(part_nodes(parts)), span)
                } else {
                    self.string_node(parts, span)
                };
                Ok((node, false))
            }
            Close::Plain(_) => {
                let span = opening.span().merge(end);
                if command {
                    return Ok((Node::new(NodeKind::XStr(part_nodes(parts)), span), false));
                }
                let mut node = self.string_node(parts, span);
                while self.check(&TokenKind::StringBegin) {
                    let next = self.parse_string()?;
                    node = concat_strings(node, next);
                }
                Ok((node, false))
            }
        }
    }

    /// Builds a `Str` or `InterpolatedStr` from literal parts.
    fn string_node(&self, parts: Vec<Part>, span: Span) -> Node {
        let parts = merge_text(parts);
        if parts.iter().all(|part| matches!(part, Part::Text { .. })) {
            let value = parts
                .into_iter()
                .flat_map(|part| match part {
                    Part::Text { bytes, .. } => bytes,
                    Part::Node(_) => Vec::new(),
                })
                .collect();
            return Node::new(
                NodeKind::Str {
                    value,
                    frozen: self.ctx.frozen_string_literal(),
                },
                span,
            );
        }
        Node::new(NodeKind::InterpolatedStr(part_nodes(parts)), span)
    }

    /// Reads literal content up to the closing token, which is consumed.
    fn parse_literal_body(&mut self) -> PResult<(Vec<Part>, Close)> {
        self.parse_literal_body_then(None)
    }

    /// As [`Parser::parse_literal_body`], switching the lexer to
    /// `close_state` before the token after the literal is read.
    fn parse_literal_body_then(
        &mut self,
        close_state: Option<LexState>,
    ) -> PResult<(Vec<Part>, Close)> {
        let mut parts = Vec::new();
        loop {
            if let Some(state) = close_state {
                if matches!(self.current_kind(), TokenKind::StringEnd) {
                    self.lexer_mut().set_state(state);
                }
            }
            match self.current_kind() {
                TokenKind::StringContent(_) => {
                    let token = self.advance()?;
                    let span = token.span();
                    if let TokenKind::StringContent(fragment) = token.into_kind() {
                        parts.push(Part::Text {
                            bytes: fragment.bytes,
                            line_start: fragment.line_start,
                            span,
                        });
                    }
                }
                TokenKind::StringDBeg => parts.push(Part::Node(self.parse_interpolation()?)),
                TokenKind::StringDVar => {
                    parts.push(Part::Node(self.parse_interpolated_variable()?));
                }
                TokenKind::StringEnd => {
                    self.advance()?;
                    return Ok((parts, Close::Plain(None)));
                }
                TokenKind::RegexpEnd(_) => {
                    let options = match self.advance()?.into_kind() {
                        TokenKind::RegexpEnd(options) => Some(options),
                        _ => None,
                    };
                    return Ok((parts, Close::Plain(options)));
                }
                TokenKind::HeredocEnd { dedent } => {
                    let dedent = *dedent;
                    self.advance()?;
                    return Ok((parts, Close::Heredoc(dedent)));
                }
                TokenKind::LabelEnd => {
                    self.advance()?;
                    return Ok((parts, Close::Label));
                }
                _ => return self.unexpected(&["string content"]),
            }
        }
    }

    /// Parses `#{ statements }`.
    fn parse_interpolation(&mut self) -> PResult<Node> {
        let start = self.advance()?.span();
        self.enter_nesting()?;
        let statements = self.parse_statement_list();
        self.leave_nesting();
        let statements = statements?;
        self.expect(&TokenKind::StringDEnd, "'}'")?;
        Ok(Node::new(
            NodeKind::Embedded(statements),
            start.merge(self.prev_span()),
        ))
    }

    /// Parses `#@ivar`, `#@@cvar` or `#$gvar`.
    fn parse_interpolated_variable(&mut self) -> PResult<Node> {
        self.advance()?;
        let token = self.advance()?;
        let span = token.span();
        let kind = match token.into_kind() {
            TokenKind::InstanceVariable(name) => NodeKind::InstanceVar(name),
            TokenKind::ClassVariable(name) => NodeKind::ClassVar(name),
            TokenKind::GlobalVariable(name) => NodeKind::GlobalVar(name),
            TokenKind::NthRef(n) => NodeKind::NthRef(n),
            TokenKind::BackRef(b) => NodeKind::BackRef(char::from(b)),
            kind => return self.unexpected_at(super::describe(&kind), span),
        };
        Ok(Node::new(kind, span))
    }

    // ========================================================================
    // Regexps and Symbols
    // ========================================================================

    /// Parses `/.../opts` or `%r{...}opts`.
    pub(super) fn parse_regexp(&mut self) -> PResult<Node> {
        let start = self.advance()?.span();
        let (parts, close) = self.parse_literal_body()?;
        let options = match close {
            Close::Plain(Some(options)) => options,
            _ => EcoString::new(),
        };
        let parts = part_nodes(merge_text(parts));
        Ok(Node::new(
            NodeKind::Regexp { parts, options },
            start.merge(self.prev_span()),
        ))
    }

    /// Parses `:name`, `:"..."` or `%s(...)`.
    pub(super) fn parse_symbol(&mut self) -> PResult<Node> {
        self.parse_symbol_then(None)
    }

    /// Parses a symbol, switching the lexer to `close_state` before the
    /// token after it is read.
    pub(super) fn parse_symbol_then(&mut self, close_state: Option<LexState>) -> PResult<Node> {
        let start = self.advance()?.span();
        if matches!(
            self.current_kind(),
            TokenKind::StringContent(_)
                | TokenKind::StringDBeg
                | TokenKind::StringDVar
                | TokenKind::StringEnd
        ) {
            let (parts, _) = self.parse_literal_body_then(close_state)?;
            return Ok(self.symbol_node(parts, start.merge(self.prev_span())));
        }
        if let Some(state) = close_state {
            self.lexer_mut().set_state(state);
        }
        let token = self.advance()?;
        let span = start.merge(token.span());
        let name = match symbol_name(token.kind()) {
            Some(name) => name,
            None => return self.unexpected_at(super::describe(token.kind()), token.span()),
        };
        Ok(Node::new(NodeKind::Symbol(name), span))
    }

    /// Builds a `Symbol` or `InterpolatedSymbol`.
    fn symbol_node(&self, parts: Vec<Part>, span: Span) -> Node {
        let parts = merge_text(parts);
        match parts.as_slice() {
            [] => Node::new(NodeKind::Symbol(EcoString::new()), span),
            [Part::Text { bytes, .. }] => Node::new(NodeKind::Symbol(bytes_to_name(bytes)), span),
            _ => Node::new(NodeKind::InterpolatedSymbol(part_nodes(parts)), span),
        }
    }

    // ========================================================================
    // Word Lists
    // ========================================================================

    /// Parses `%w()`, `%W()`, `%i()` or `%I()` into an array.
    pub(super) fn parse_word_list(&mut self) -> PResult<Node> {
        let opening = self.advance()?;
        let kind = match opening.kind() {
            TokenKind::SymbolsBegin | TokenKind::QSymbolsBegin => WordKind::Symbol,
            _ => WordKind::String,
        };
        let mut items = Vec::new();
        let mut word = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::WordSeparator => {
                    self.advance()?;
                    self.finish_word(&mut word, kind, &mut items);
                }
                TokenKind::StringEnd => {
                    self.advance()?;
                    self.finish_word(&mut word, kind, &mut items);
                    break;
                }
                TokenKind::StringContent(_) => {
                    let token = self.advance()?;
                    let span = token.span();
                    if let TokenKind::StringContent(fragment) = token.into_kind() {
                        word.push(Part::Text {
                            bytes: fragment.bytes,
                            line_start: false,
                            span,
                        });
                    }
                }
                TokenKind::StringDBeg => word.push(Part::Node(self.parse_interpolation()?)),
                TokenKind::StringDVar => word.push(Part::Node(self.parse_interpolated_variable()?)),
                _ => return self.unexpected(&["string content"]),
            }
        }
        Ok(Node::new(
            NodeKind::Array(items),
            opening.span().merge(self.prev_span()),
        ))
    }

    fn finish_word(&self, word: &mut Vec<Part>, kind: WordKind, items: &mut Vec<Node>) {
        let parts = std::mem::take(word);
        let Some(span) = parts_span(&parts) else {
            return;
        };
        let node = match kind {
            WordKind::String => self.string_node(parts, span),
            WordKind::Symbol => self.symbol_node(parts, span),
        };
        items.push(node);
    }
}

/// Returns the name a `:` symbol takes from the token after it.
pub(super) fn symbol_name(kind: &TokenKind) -> Option<EcoString> {
    match kind {
        TokenKind::Identifier(name)
        | TokenKind::Constant(name)
        | TokenKind::MethodName(name)
        | TokenKind::InstanceVariable(name)
        | TokenKind::ClassVariable(name)
        | TokenKind::GlobalVariable(name) => Some(name.clone()),
        TokenKind::NthRef(n) => Some(ecow::eco_format!("${n}")),
        TokenKind::BackRef(b) => Some(ecow::eco_format!("${}", char::from(*b))),
        TokenKind::Keyword(keyword) => Some(keyword.as_str().into()),
        kind => kind.operator_method_name().map(EcoString::from),
    }
}

/// Joins neighbouring text parts.
fn merge_text(parts: Vec<Part>) -> Vec<Part> {
    let mut merged: Vec<Part> = Vec::with_capacity(parts.len());
    for part in parts {
        if let Part::Text {
            bytes, span: next, ..
        } = &part
        {
            if let Some(Part::Text {
                bytes: last, span, ..
            }) = merged.last_mut()
            {
                last.extend_from_slice(bytes);
                *span = span.merge(*next);
                continue;
            }
        }
        merged.push(part);
    }
    merged
}

/// Removes the common indentation from text parts that start a line.
fn dedent_parts(parts: Vec<Part>, width: usize) -> Vec<Part> {
    parts
        .into_iter()
        .map(|part| match part {
            Part::Text {
                bytes,
                line_start: true,
                span,
            } => Part::Text {
                bytes: dedent(&bytes, width).to_vec(),
                line_start: true,
                span,
            },
            other => other,
        })
        .collect()
}

/// Converts parts into child nodes of an interpolated literal.
fn part_nodes(parts: Vec<Part>) -> Vec<Node> {
    merge_text(parts)
        .into_iter()
        .filter_map(|part| match part {
            Part::Text { bytes, .. } if bytes.is_empty() => None,
            Part::Text { bytes, span, .. } => Some(Node::new(
                NodeKind::Str {
                    value: bytes,
                    frozen: false,
                },
                span,
            )),
            Part::Node(node) => Some(node),
        })
        .collect()
}

fn parts_span(parts: &[Part]) -> Option<Span> {
    let span_of = |part: &Part| match part {
        Part::Text { span, .. } => *span,
        Part::Node(node) => node.span,
    };
    Some(span_of(parts.first()?).merge(span_of(parts.last()?)))
}

/// `"a" "b"`: adjacent literals form one string.
fn concat_strings(left: Node, right: Node) -> Node {
    let span = left.span.merge(right.span);
    let kind = match (left.kind, right.kind) {
        (
            NodeKind::Str {
                value: mut first,
                frozen,
            },
            NodeKind::Str { value: second, .. },
        ) => {
            first.extend_from_slice(&second);
            NodeKind::Str {
                value: first,
                frozen,
            }
        }
        (left, right) => {
            let mut parts = string_parts(left, span);
            parts.extend(string_parts(right, span));
            NodeKind::InterpolatedStr(parts)
        }
    };
    Node::new(kind, span)
}

fn string_parts(kind: NodeKind, span: Span) -> Vec<Node> {
    match kind {
        NodeKind::InterpolatedStr(parts) => parts,
        NodeKind::Str { value, .. } => vec![Node::new(
            NodeKind::Str {
                value,
                frozen: false,
            },
            span,
        )],
        other => vec![Node::new(other, span)],
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{parse_ok, single};
    use crate::ast::NodeKind;

    fn str_value(node: &crate::ast::Node) -> &[u8] {
        match &node.kind {
            NodeKind::Str { value, .. } => value,
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn plain_and_escaped_strings() {
        assert_eq!(str_value(&single("'a\\nb'")), b"a\\nb");
        assert_eq!(str_value(&single("\"a\\nb\"")), b"a\nb");
    }

    #[test]
    fn adjacent_strings_concatenate() {
        assert_eq!(str_value(&single("\"a\" 'b'")), b"ab");
    }

    #[test]
    fn interpolation_parts() {
        let node = single("\"a#{1}b#@x\"");
        let NodeKind::InterpolatedStr(parts) = &node.kind else {
            panic!("expected interpolation, got {node:?}");
        };
        assert_eq!(parts.len(), 4);
        assert!(matches!(parts[1].kind, NodeKind::Embedded(ref s) if s.len() == 1));
        assert!(matches!(parts[3].kind, NodeKind::InstanceVar(ref n) if n == "@x"));
    }

    #[test]
    fn squiggly_heredoc_dedents() {
        let program = parse_ok("x = <<~END\n  a\n    b\n  END\n");
        let NodeKind::Assign { value, .. } = &program.statements[0].kind else {
            panic!("expected assignment");
        };
        assert_eq!(str_value(value), b"a\n  b\n");
    }

    #[test]
    fn dash_heredoc_keeps_indentation() {
        let program = parse_ok("x = <<-END\n  a\n  END\n");
        let NodeKind::Assign { value, .. } = &program.statements[0].kind else {
            panic!("expected assignment");
        };
        assert_eq!(str_value(value), b"  a\n");
    }

    #[test]
    fn symbols() {
        assert!(matches!(single(":foo").kind, NodeKind::Symbol(ref s) if s == "foo"));
        assert!(matches!(single(":foo=").kind, NodeKind::Symbol(ref s) if s == "foo="));
        assert!(matches!(single(":+").kind, NodeKind::Symbol(ref s) if s == "+"));
        assert!(matches!(single(":[]=").kind, NodeKind::Symbol(ref s) if s == "[]="));
        assert!(matches!(single(":\"a b\"").kind, NodeKind::Symbol(ref s) if s == "a b"));
        assert!(matches!(single(":\"a#{1}\"").kind, NodeKind::InterpolatedSymbol(_)));
        assert!(matches!(single("%s(x)").kind, NodeKind::Symbol(ref s) if s == "x"));
    }

    #[test]
    fn regexp_options() {
        let node = single("/a#{1}b/im");
        let NodeKind::Regexp { parts, options } = &node.kind else {
            panic!("expected regexp, got {node:?}");
        };
        assert_eq!(options, "im");
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn word_lists() {
        let NodeKind::Array(items) = single("%w[a b  c]").kind else {
            panic!("expected array");
        };
        assert_eq!(items.len(), 3);
        let NodeKind::Array(items) = single("%i(x y)").kind else {
            panic!("expected array");
        };
        assert!(matches!(items[1].kind, NodeKind::Symbol(ref s) if s == "y"));
        let NodeKind::Array(items) = single("%W(a#{1} b)").kind else {
            panic!("expected array");
        };
        assert!(matches!(items[0].kind, NodeKind::InterpolatedStr(_)));
    }

    #[test]
    fn character_literal_is_string() {
        assert_eq!(str_value(&single("?a")), b"a");
    }

    #[test]
    fn frozen_string_literal_comment() {
        let program = parse_ok("# frozen_string_literal: true\n'a'");
        assert!(matches!(
            program.statements[0].kind,
            NodeKind::Str { frozen: true, .. }
        ));
    }
}
