// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Primary expressions.
//!
//! A primary is the smallest operand: a literal, a variable, a method name
//! with its arguments, a keyword construct (`if`, `def`, `case`, ...), or a
//! bracketed form. Its postfix chain of calls, indexing and blocks is parsed
//! in the `calls` module.

use ecow::EcoString;

use crate::ast::{Node, NodeKind};

use super::calls::{ArgList, CallHead};
use super::statements::numbered_param_index;
use super::{Keyword, LexState, PResult, Parser, Span, TokenKind, describe};

impl Parser<'_> {
    /// Parses a primary and its postfix chain.
    ///
    /// With `allow_command`, a method call may take arguments without
    /// parentheses; such a command call ends the primary.
    pub(super) fn parse_primary(&mut self, allow_command: bool) -> PResult<Node> {
        let (node, command) = self.parse_atom(allow_command)?;
        if command {
            return Ok(node);
        }
        self.parse_postfix_chain(node, allow_command)
    }

    fn parse_atom(&mut self, allow_command: bool) -> PResult<(Node, bool)> {
        let node = match self.current_kind() {
            TokenKind::Keyword(keyword) => {
                let keyword = *keyword;
                return self.parse_keyword_atom(keyword, allow_command);
            }
            TokenKind::StringBegin | TokenKind::XStringBegin => self.parse_string()?,
            TokenKind::RegexpBegin => self.parse_regexp()?,
            TokenKind::SymbolBegin => self.parse_symbol()?,
            TokenKind::WordsBegin
            | TokenKind::QWordsBegin
            | TokenKind::SymbolsBegin
            | TokenKind::QSymbolsBegin => self.parse_word_list()?,
            TokenKind::LParen | TokenKind::LParenBeg | TokenKind::LParenArg => self.parse_parens()?,
            TokenKind::LBracketArray | TokenKind::LBracket => self.parse_array()?,
            TokenKind::LBraceHash => self.parse_hash()?,
            TokenKind::Arrow => self.parse_lambda()?,
            TokenKind::ColonColonPrefix => {
                let start = self.advance()?.span();
                let TokenKind::Constant(name) = self.current_kind() else {
                    return self.unexpected(&["constant"]);
                };
                let name = name.clone();
                let span = start.merge(self.advance()?.span());
                Node::new(NodeKind::ScopedConst { scope: None, name }, span)
            }
            _ => {
                let token = self.advance()?;
                let span = token.span();
                let kind = match token.into_kind() {
                    TokenKind::Numeric(literal) => NodeKind::Number(literal),
                    TokenKind::Char(bytes) => NodeKind::Str {
                        value: bytes,
                        frozen: self.ctx.frozen_string_literal(),
                    },
                    TokenKind::Identifier(name) => {
                        return self.parse_identifier(name, span, allow_command);
                    }
                    TokenKind::Constant(name) => {
                        return self.parse_constant(name, span, allow_command);
                    }
                    TokenKind::MethodName(name) => {
                        let head = CallHead {
                            receiver: None,
                            name,
                            safe_nav: false,
                            span,
                        };
                        return self.finish_call(head, allow_command);
                    }
                    TokenKind::InstanceVariable(name) => NodeKind::InstanceVar(name),
                    TokenKind::ClassVariable(name) => NodeKind::ClassVar(name),
                    TokenKind::GlobalVariable(name) => NodeKind::GlobalVar(name),
                    TokenKind::NthRef(n) => NodeKind::NthRef(n),
                    TokenKind::BackRef(b) => NodeKind::BackRef(char::from(b)),
                    kind => return self.unexpected_at(describe(&kind), span),
                };
                Node::new(kind, span)
            }
        };
        Ok((node, false))
    }

    /// An identifier is a local variable, a numbered block parameter, or a
    /// method call.
    fn parse_identifier(
        &mut self,
        name: EcoString,
        span: Span,
        allow_command: bool,
    ) -> PResult<(Node, bool)> {
        let paren_call = self.check(&TokenKind::LParen) && !self.space_before();
        if !paren_call {
            if let Some(n) = numbered_param_index(&name) {
                match self.scopes.use_numbered_param(n) {
                    Ok(true) => {
                        if !self.scopes.current_scope_vars().any(|b| b.name == name) {
                            // Implicit parameters are never duplicates.
                            let _ = self.scopes.declare_param(&name, span);
                        }
                    }
                    Ok(false) => {}
                    Err(kind) => return Ok((self.semantic_error(kind, span), false)),
                }
            }
            if let Some(kind) = self.scopes.use_local(&name) {
                return Ok((Node::new(NodeKind::LocalVar { name, kind }, span), false));
            }
        }
        let head = CallHead {
            receiver: None,
            name,
            safe_nav: false,
            span,
        };
        let (node, command) = self.finish_call(head, allow_command)?;
        if !command && node.span == span {
            self.vcall_span = Some(span);
        }
        Ok((node, command))
    }

    /// A constant, or a method named like one when arguments or a block
    /// follow (`Integer("1")`, `Foo 1`, `Foo { }`).
    fn parse_constant(
        &mut self,
        name: EcoString,
        span: Span,
        allow_command: bool,
    ) -> PResult<(Node, bool)> {
        let paren_call = self.check(&TokenKind::LParen) && !self.space_before();
        let command_call = allow_command && self.space_before() && self.starts_command_args();
        let block_call = self.check(&TokenKind::LBraceBlock);
        if !paren_call && !command_call && !block_call {
            return Ok((Node::new(NodeKind::Const(name), span), false));
        }
        let head = CallHead {
            receiver: None,
            name,
            safe_nav: false,
            span,
        };
        self.finish_call(head, allow_command)
    }

    // ========================================================================
    // Keyword Constructs
    // ========================================================================

    fn parse_keyword_atom(
        &mut self,
        keyword: Keyword,
        allow_command: bool,
    ) -> PResult<(Node, bool)> {
        let node = match keyword {
            Keyword::Nil
            | Keyword::True
            | Keyword::False
            | Keyword::SelfValue
            | Keyword::File
            | Keyword::Line
            | Keyword::Encoding => {
                let span = self.advance()?.span();
                let kind = match keyword {
                    Keyword::Nil => NodeKind::Nil,
                    Keyword::True => NodeKind::True,
                    Keyword::False => NodeKind::False,
                    Keyword::SelfValue => NodeKind::SelfRef,
                    Keyword::File => {
                        NodeKind::SourceFile(self.ctx.options().source_name.as_str().into())
                    }
                    Keyword::Line => NodeKind::SourceLine(span.start_location().line),
                    _ => NodeKind::SourceEncoding(self.ctx.encoding().name().into()),
                };
                Node::new(kind, span)
            }
            Keyword::If => self.parse_if(false)?,
            Keyword::Unless => self.parse_if(true)?,
            Keyword::While => self.parse_while(false)?,
            Keyword::Until => self.parse_while(true)?,
            Keyword::For => self.parse_for()?,
            Keyword::Case => self.parse_case()?,
            Keyword::Begin => self.parse_begin()?,
            Keyword::Def => self.parse_def()?,
            Keyword::Class => self.parse_class()?,
            Keyword::Module => self.parse_module()?,
            Keyword::Return | Keyword::Break | Keyword::Next => return self.parse_jump(keyword),
            Keyword::Redo | Keyword::Retry => {
                let span = self.advance()?.span();
                let kind = if keyword == Keyword::Redo {
                    NodeKind::Redo
                } else {
                    NodeKind::Retry
                };
                Node::new(kind, span)
            }
            Keyword::Yield => return self.parse_yield(allow_command),
            Keyword::Super => return self.parse_super(allow_command),
            Keyword::Not => {
                let start = self.advance()?.span();
                let operand = self.parse_arg(false)?;
                self.value_expr(&operand);
                let span = start.merge(operand.span);
                Node::new(super::expressions::call(Some(operand), "!", Vec::new()), span)
            }
            _ => return self.unexpected(&[]),
        };
        Ok((node, false))
    }

    // ========================================================================
    // Brackets
    // ========================================================================

    /// Parses `( statements )`.
    ///
    /// A lone target list inside is handed back as a `MultiTarget` for the
    /// enclosing assignment.
    fn parse_parens(&mut self) -> PResult<Node> {
        let grouped_argument = self.check(&TokenKind::LParenArg);
        let open = self.advance()?.span();
        self.enter_nesting()?;
        let statements = self.parse_statement_list();
        self.leave_nesting();
        let mut statements = statements?;
        if grouped_argument {
            // `foo (1) { }` gives the block to foo.
            self.lexer_mut().set_state(LexState::ENDARG);
        }
        self.expect(&TokenKind::RParen, "')'")?;
        let span = open.merge(self.prev_span());

        if statements.len() == 1 && matches!(statements[0].kind, NodeKind::MultiTarget { .. }) {
            if !matches!(
                self.current_kind(),
                TokenKind::Assign | TokenKind::Comma | TokenKind::RParen
            ) {
                return self.unexpected(&["'='"]);
            }
            if let Some(target) = statements.pop() {
                return Ok(Node::new(target.kind, span));
            }
        }
        Ok(Node::new(NodeKind::Parens(statements), span))
    }

    /// Parses `[ items ]`.
    fn parse_array(&mut self) -> PResult<Node> {
        let open = self.advance()?.span();
        self.enter_nesting()?;
        let items = self.parse_arg_list(ArgList::Array);
        self.leave_nesting();
        let items = items?;
        self.skip_newlines()?;
        self.expect(&TokenKind::RBracket, "']'")?;
        Ok(Node::new(NodeKind::Array(items), open.merge(self.prev_span())))
    }

    /// Parses `{ key => value, label: value, **splat }`.
    fn parse_hash(&mut self) -> PResult<Node> {
        let open = self.advance()?.span();
        self.enter_nesting()?;
        let pairs = self.parse_hash_entries();
        self.leave_nesting();
        let pairs = pairs?;
        self.expect(&TokenKind::RBrace, "'}'")?;
        self.warn_duplicate_keys(&pairs);
        Ok(Node::new(NodeKind::Hash(pairs), open.merge(self.prev_span())))
    }

    fn parse_hash_entries(&mut self) -> PResult<Vec<Node>> {
        let mut pairs = Vec::new();
        loop {
            self.skip_newlines()?;
            if self.check(&TokenKind::RBrace) {
                break;
            }
            let pair = match self.current_kind() {
                TokenKind::Label(_) => self.parse_label_pair()?,
                TokenKind::DoubleSplat => self.parse_double_splat_argument()?,
                TokenKind::StringBegin => {
                    let (node, label) = self.parse_string_or_label()?;
                    if label {
                        self.finish_label_pair(node)?
                    } else {
                        let key = self.continue_arg(node)?;
                        self.finish_assoc(key)?
                    }
                }
                _ => {
                    let key = self.parse_arg(false)?;
                    self.finish_assoc(key)?
                }
            };
            pairs.push(pair);
            self.skip_newlines()?;
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        self.skip_newlines()?;
        Ok(pairs)
    }

    fn finish_assoc(&mut self, key: Node) -> PResult<Node> {
        self.value_expr(&key);
        self.expect(&TokenKind::Assoc, "'=>'")?;
        let value = self.parse_arg(false)?;
        self.value_expr(&value);
        let span = key.span.merge(value.span);
        Ok(Node::new(
            NodeKind::Pair {
                key: Box::new(key),
                value: Box::new(value),
            },
            span,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{call_name, parse_err, parse_ok, single, warnings_of};
    use crate::ParseOptions;
    use crate::ast::{LocalKind, NodeKind};
    use crate::source_analysis::parse;

    #[test]
    fn local_variable_versus_method_call() {
        let program = parse_ok("x = 1\nx\ny");
        assert!(matches!(
            program.statements[1].kind,
            NodeKind::LocalVar {
                kind: LocalKind::Local { slot: 0 },
                ..
            }
        ));
        assert_eq!(call_name(&program.statements[2]), Some("y"));
    }

    #[test]
    fn minus_after_local_is_binary() {
        let program = parse_ok("foo = 1\nfoo -1");
        assert_eq!(call_name(&program.statements[1]), Some("-"));
    }

    #[test]
    fn minus_after_method_is_argument() {
        let node = single("foo -1");
        let NodeKind::Call { name, args, .. } = &node.kind else {
            panic!("expected call");
        };
        assert_eq!(name, "foo");
        assert!(matches!(args[0].kind, NodeKind::Number(_)));
    }

    #[test]
    fn pseudo_variables() {
        let output = parse(
            b"[__FILE__, __LINE__, __ENCODING__, self, nil]",
            &ParseOptions::new("lib/a.rb"),
        )
        .unwrap();
        let NodeKind::Array(items) = &output.program.statements[0].kind else {
            panic!("expected array");
        };
        assert!(matches!(items[0].kind, NodeKind::SourceFile(ref f) if f == "lib/a.rb"));
        assert!(matches!(items[1].kind, NodeKind::SourceLine(1)));
        assert!(matches!(items[2].kind, NodeKind::SourceEncoding(ref e) if e == "UTF-8"));
        assert!(matches!(items[3].kind, NodeKind::SelfRef));
        assert!(matches!(items[4].kind, NodeKind::Nil));
    }

    #[test]
    fn variables_and_references() {
        assert!(matches!(single("@a").kind, NodeKind::InstanceVar(ref n) if n == "@a"));
        assert!(matches!(single("@@a").kind, NodeKind::ClassVar(ref n) if n == "@@a"));
        assert!(matches!(single("$a").kind, NodeKind::GlobalVar(ref n) if n == "$a"));
        assert!(matches!(single("$1").kind, NodeKind::NthRef(1)));
        assert!(matches!(single("$&").kind, NodeKind::BackRef('&')));
        assert!(matches!(
            single("::Foo").kind,
            NodeKind::ScopedConst { scope: None, .. }
        ));
    }

    #[test]
    fn constant_called_as_method() {
        assert_eq!(call_name(&single("Integer(\"1\")")), Some("Integer"));
        assert!(matches!(single("Foo").kind, NodeKind::Const(_)));
    }

    #[test]
    fn arrays_and_hashes() {
        assert!(matches!(single("[1, *a, 2]").kind, NodeKind::Array(ref items) if items.len() == 3));
        assert!(matches!(single("[1, a: 2]").kind, NodeKind::Array(ref items)
            if matches!(items[1].kind, NodeKind::KeywordHash(_))));
        assert!(matches!(single("{a: 1, 'b' => 2, **c}").kind, NodeKind::Hash(ref pairs) if pairs.len() == 3));
        assert!(matches!(single("{\n  \"a\": 1,\n}").kind, NodeKind::Hash(ref pairs) if pairs.len() == 1));
        assert!(matches!(single("{}").kind, NodeKind::Hash(ref pairs) if pairs.is_empty()));
    }

    #[test]
    fn parenthesized_statements() {
        assert!(matches!(single("(1; 2)").kind, NodeKind::Parens(ref s) if s.len() == 2));
        assert!(matches!(single("()").kind, NodeKind::Parens(ref s) if s.is_empty()));
    }

    #[test]
    fn nested_target_lists() {
        let node = single("((a, b), c) = 1");
        let NodeKind::MultiAssign { targets, .. } = &node.kind else {
            panic!("expected multiple assignment, got {:?}", node.kind);
        };
        let NodeKind::MultiTarget { pre, .. } = &targets.kind else {
            panic!("expected targets");
        };
        assert_eq!(pre.len(), 2);
        assert!(matches!(pre[0].kind, NodeKind::MultiTarget { .. }));
    }

    #[test]
    fn stray_target_list_is_an_error() {
        parse_err("(a, b)\n");
    }

    #[test]
    fn unused_assignment_warns() {
        assert!(
            warnings_of("def f\n  x = 1\nend")
                .iter()
                .any(|w| w == "assigned but unused variable - x")
        );
        assert!(warnings_of("_x = 1").is_empty());
        assert!(warnings_of("x = 1\np x").is_empty());
    }
}
