// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

use num_bigint::BigInt;

use super::*;
use crate::source_analysis::keywords::Keyword;
use crate::source_analysis::numeric::{NumericLiteral, NumericValue, Rational};
use crate::source_analysis::token::StringFragment;

/// Helper to lex a string and return the token kinds.
fn lex_kinds(source: &str) -> Vec<TokenKind> {
    lex(source.as_bytes())
        .expect("source should lex")
        .into_iter()
        .map(Token::into_kind)
        .collect()
}

/// Helper to lex a string that must fail.
fn lex_error(source: &str) -> LexErrorKind {
    lex(source.as_bytes()).expect_err("source should not lex").kind
}

/// Lexes to the end, returning the kinds and the context with its warnings.
fn lex_with_context(source: &str) -> (Vec<TokenKind>, ParserContext) {
    let mut ctx = ParserContext::new(ParseOptions::default());
    let mut lexer = Lexer::from_bytes(source.as_bytes());
    let mut kinds = Vec::new();
    loop {
        let token = lexer.next_token(&mut ctx).expect("source should lex");
        if token.kind().is_eof() {
            return (kinds, ctx);
        }
        kinds.push(token.into_kind());
    }
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Identifier(name.into())
}

fn int(n: i64) -> TokenKind {
    TokenKind::Numeric(NumericLiteral {
        value: NumericValue::Integer(BigInt::from(n)),
        imaginary: false,
    })
}

fn text(s: &str) -> TokenKind {
    TokenKind::StringContent(StringFragment {
        bytes: s.as_bytes().to_vec(),
        line_start: false,
    })
}

fn line(s: &str) -> TokenKind {
    TokenKind::StringContent(StringFragment {
        bytes: s.as_bytes().to_vec(),
        line_start: true,
    })
}

fn has_warning(ctx: &ParserContext, category: DiagnosticCategory) -> bool {
    ctx.warnings()
        .iter()
        .any(|w| w.category == Some(category))
}

// ========================================================================
// Operators and argument positions
// ========================================================================

#[test]
fn lex_command_with_negative_number_argument() {
    let (kinds, ctx) = lex_with_context("foo -1");
    assert_eq!(kinds, vec![ident("foo"), TokenKind::UMinusNum, int(1)]);
    assert!(has_warning(&ctx, DiagnosticCategory::AmbiguousOperator));
}

#[test]
fn lex_spaced_minus_is_binary() {
    let (kinds, ctx) = lex_with_context("foo - 1");
    assert_eq!(kinds, vec![ident("foo"), TokenKind::Minus, int(1)]);
    assert!(ctx.warnings().is_empty());
}

#[test]
fn lex_bracket_after_operand_indexes() {
    assert_eq!(
        lex_kinds("a[1]"),
        vec![ident("a"), TokenKind::LBracket, int(1), TokenKind::RBracket]
    );
    assert_eq!(
        lex_kinds("foo [1]"),
        vec![ident("foo"), TokenKind::LBracketArray, int(1), TokenKind::RBracket]
    );
}

#[test]
fn lex_ternary() {
    assert_eq!(
        lex_kinds("a ? b : c"),
        vec![
            ident("a"),
            TokenKind::Question,
            ident("b"),
            TokenKind::Colon,
            ident("c"),
        ]
    );
}

#[test]
fn lex_safe_navigation() {
    assert_eq!(
        lex_kinds("foo.bar&.baz"),
        vec![
            ident("foo"),
            TokenKind::Dot,
            ident("bar"),
            TokenKind::AndDot,
            ident("baz"),
        ]
    );
}

#[test]
fn lex_modulo_is_not_a_literal() {
    assert_eq!(
        lex_kinds("a % b"),
        vec![ident("a"), TokenKind::Percent, ident("b")]
    );
}

#[test]
fn lex_range_between_numbers() {
    assert_eq!(
        lex_kinds("1...2"),
        vec![int(1), TokenKind::DotDotDot, int(2)]
    );
}

#[test]
fn lex_newline_after_operator_is_ignored() {
    assert_eq!(lex_kinds("1 +\n2"), vec![int(1), TokenKind::Plus, int(2)]);
}

#[test]
fn lex_leading_dot_continues_expression() {
    assert_eq!(
        lex_kinds("foo\n  .bar\n"),
        vec![ident("foo"), TokenKind::Dot, ident("bar"), TokenKind::Newline]
    );
}

#[test]
fn lex_lambda_literal() {
    assert_eq!(
        lex_kinds("->(x) { x }"),
        vec![
            TokenKind::Arrow,
            TokenKind::LParen,
            ident("x"),
            TokenKind::RParen,
            TokenKind::LambdaBegin,
            ident("x"),
            TokenKind::RBrace,
        ]
    );
}

// ========================================================================
// Identifiers and keywords
// ========================================================================

#[test]
fn lex_modifier_if_after_expression() {
    assert_eq!(
        lex_kinds("x if y"),
        vec![ident("x"), TokenKind::Keyword(Keyword::IfModifier), ident("y")]
    );
}

#[test]
fn lex_statement_if() {
    assert_eq!(
        lex_kinds("if x then y end"),
        vec![
            TokenKind::Keyword(Keyword::If),
            ident("x"),
            TokenKind::Keyword(Keyword::Then),
            ident("y"),
            TokenKind::Keyword(Keyword::End),
        ]
    );
}

#[test]
fn lex_do_after_command() {
    assert_eq!(
        lex_kinds("foo do end"),
        vec![
            ident("foo"),
            TokenKind::Keyword(Keyword::Do),
            TokenKind::Keyword(Keyword::End),
        ]
    );
}

#[test]
fn lex_setter_method_name() {
    assert_eq!(
        lex_kinds("def foo=(v)"),
        vec![
            TokenKind::Keyword(Keyword::Def),
            ident("foo="),
            TokenKind::LParen,
            ident("v"),
            TokenKind::RParen,
        ]
    );
}

#[test]
fn lex_predicate_and_constant() {
    assert_eq!(
        lex_kinds("Foo.empty?"),
        vec![
            TokenKind::Constant("Foo".into()),
            TokenKind::Dot,
            TokenKind::MethodName("empty?".into()),
        ]
    );
}

#[test]
fn lex_hash_with_labels() {
    assert_eq!(
        lex_kinds("{a: 1, \"b\": 2}"),
        vec![
            TokenKind::LBraceHash,
            TokenKind::Label("a".into()),
            int(1),
            TokenKind::Comma,
            TokenKind::StringBegin,
            text("b"),
            TokenKind::LabelEnd,
            int(2),
            TokenKind::RBrace,
        ]
    );
}

#[test]
fn lex_sigiled_variables() {
    assert_eq!(
        lex_kinds("$stdout; $1; $&; @foo; @@bar"),
        vec![
            TokenKind::GlobalVariable("$stdout".into()),
            TokenKind::Semicolon,
            TokenKind::NthRef(1),
            TokenKind::Semicolon,
            TokenKind::BackRef(b'&'),
            TokenKind::Semicolon,
            TokenKind::InstanceVariable("@foo".into()),
            TokenKind::Semicolon,
            TokenKind::ClassVariable("@@bar".into()),
        ]
    );
}

#[test]
fn lex_instance_variable_starting_with_digit() {
    assert_eq!(
        lex_error("@1"),
        LexErrorKind::InvalidInstanceVariable("@1".into())
    );
}

#[test]
fn lex_symbols() {
    assert_eq!(
        lex_kinds(":foo"),
        vec![TokenKind::SymbolBegin, ident("foo")]
    );
    assert_eq!(
        lex_kinds(":\"a b\""),
        vec![TokenKind::SymbolBegin, text("a b"), TokenKind::StringEnd]
    );
}

// ========================================================================
// Numbers
// ========================================================================

#[test]
fn lex_integer_forms() {
    assert_eq!(lex_kinds("0x1f"), vec![int(31)]);
    assert_eq!(lex_kinds("0b101"), vec![int(5)]);
    assert_eq!(lex_kinds("0o17"), vec![int(15)]);
    assert_eq!(lex_kinds("017"), vec![int(15)]);
    assert_eq!(lex_kinds("1_000"), vec![int(1000)]);
}

#[test]
fn lex_float_rational_and_imaginary() {
    assert_eq!(
        lex_kinds("1e3"),
        vec![TokenKind::Numeric(NumericLiteral {
            value: NumericValue::Float(1000.0),
            imaginary: false,
        })]
    );
    let half = Rational::from_decimal("1.5").expect("valid decimal");
    assert_eq!(
        lex_kinds("1.5r"),
        vec![TokenKind::Numeric(NumericLiteral {
            value: NumericValue::Rational(half),
            imaginary: false,
        })]
    );
    assert_eq!(
        lex_kinds("2i"),
        vec![TokenKind::Numeric(NumericLiteral {
            value: NumericValue::Integer(BigInt::from(2)),
            imaginary: true,
        })]
    );
}

#[test]
fn lex_number_followed_by_keyword() {
    assert_eq!(
        lex_kinds("1if x"),
        vec![int(1), TokenKind::Keyword(Keyword::IfModifier), ident("x")]
    );
}

#[test]
fn lex_malformed_numbers() {
    assert_eq!(lex_error("1__2"), LexErrorKind::TrailingCharInNumber('_'));
    assert_eq!(lex_error("0x"), LexErrorKind::NumericWithoutDigits);
    assert_eq!(lex_error("08"), LexErrorKind::InvalidOctalDigit);
    assert_eq!(lex_error("1e"), LexErrorKind::TrailingCharInNumber('e'));
    assert_eq!(lex_error(".5"), LexErrorKind::LeadingDotFloat);
}

// ========================================================================
// Strings
// ========================================================================

#[test]
fn lex_interpolated_string() {
    assert_eq!(
        lex_kinds("\"a#{b}c\""),
        vec![
            TokenKind::StringBegin,
            text("a"),
            TokenKind::StringDBeg,
            ident("b"),
            TokenKind::StringDEnd,
            text("c"),
            TokenKind::StringEnd,
        ]
    );
}

#[test]
fn lex_single_quoted_escape() {
    assert_eq!(
        lex_kinds("'a\\'b'"),
        vec![TokenKind::StringBegin, text("a'b"), TokenKind::StringEnd]
    );
}

#[test]
fn lex_word_list() {
    assert_eq!(
        lex_kinds("%w[a b]"),
        vec![
            TokenKind::QWordsBegin,
            text("a"),
            TokenKind::WordSeparator,
            text("b"),
            TokenKind::StringEnd,
        ]
    );
}

#[test]
fn lex_regexp_with_escaped_terminator() {
    assert_eq!(
        lex_kinds("/a\\/b/i"),
        vec![
            TokenKind::RegexpBegin,
            text("a/b"),
            TokenKind::RegexpEnd("i".into()),
        ]
    );
}

#[test]
fn lex_character_literals() {
    assert_eq!(lex_kinds("?a"), vec![TokenKind::Char(b"a".to_vec())]);
    assert_eq!(lex_kinds("?\\n"), vec![TokenKind::Char(b"\n".to_vec())]);
}

#[test]
fn lex_unterminated_string() {
    assert_eq!(lex_error("\"abc"), LexErrorKind::UnterminatedString);
}

// ========================================================================
// Heredocs
// ========================================================================

#[test]
fn lex_squiggly_heredoc() {
    assert_eq!(
        lex_kinds("x = <<~EOS\n  a\n    b\nEOS\ny\n"),
        vec![
            ident("x"),
            TokenKind::Assign,
            TokenKind::StringBegin,
            line("  a\n"),
            line("    b\n"),
            TokenKind::HeredocEnd { dedent: Some(2) },
            TokenKind::Newline,
            ident("y"),
            TokenKind::Newline,
        ]
    );
}

#[test]
fn lex_two_heredocs_on_one_line() {
    assert_eq!(
        lex_kinds("foo(<<A, <<B)\na\nA\nb\nB\n"),
        vec![
            ident("foo"),
            TokenKind::LParen,
            TokenKind::StringBegin,
            line("a\n"),
            TokenKind::HeredocEnd { dedent: None },
            TokenKind::Comma,
            TokenKind::StringBegin,
            line("b\n"),
            TokenKind::HeredocEnd { dedent: None },
            TokenKind::RParen,
            TokenKind::Newline,
        ]
    );
}

#[test]
fn lex_unterminated_heredoc() {
    assert_eq!(
        lex_error("<<EOS\nabc\n"),
        LexErrorKind::UnterminatedHeredoc("EOS".into())
    );
}

// ========================================================================
// Comments and special lines
// ========================================================================

#[test]
fn lex_embedded_document_is_skipped() {
    assert_eq!(
        lex_kinds("=begin\nx\n=end\ny\n"),
        vec![ident("y"), TokenKind::Newline]
    );
}

#[test]
fn lex_stops_at_end_marker() {
    assert_eq!(
        lex_kinds("a\n__END__\nb\n"),
        vec![ident("a"), TokenKind::Newline]
    );
}

#[test]
fn lex_carriage_return_warns() {
    let (kinds, ctx) = lex_with_context("a\rb");
    assert_eq!(kinds, vec![ident("a"), ident("b")]);
    assert!(has_warning(&ctx, DiagnosticCategory::CarriageReturn));
}

#[test]
fn lex_frozen_string_literal_comment() {
    let (_, ctx) = lex_with_context("# frozen_string_literal: true\nx\n");
    assert!(ctx.frozen_string_literal());
}

#[test]
fn lex_magic_comment_after_code_is_ignored() {
    let (_, ctx) = lex_with_context("x = 1 # frozen_string_literal: true\n");
    assert!(!ctx.frozen_string_literal());
    assert!(has_warning(&ctx, DiagnosticCategory::MagicComment));
}

#[test]
fn lex_unknown_source_encoding() {
    assert_eq!(
        lex_error("# encoding: nope\n"),
        LexErrorKind::UnknownEncoding("nope".into())
    );
}

#[test]
fn lex_eof_repeats() {
    let mut ctx = ParserContext::new(ParseOptions::default());
    let mut lexer = Lexer::from_bytes(b"");
    assert!(lexer.next_token(&mut ctx).unwrap().kind().is_eof());
    assert!(lexer.next_token(&mut ctx).unwrap().kind().is_eof());
}

/// Returns the lexer state after reading `count` tokens of `source`.
fn state_after(source: &str, count: usize) -> LexState {
    let mut ctx = ParserContext::new(ParseOptions::default());
    let mut lexer = Lexer::from_bytes(source.as_bytes());
    for _ in 0..count {
        lexer.next_token(&mut ctx).expect("source should lex");
    }
    lexer.state()
}

#[test]
fn lex_state_after_token() {
    // (source, tokens to read, state after the last one)
    let cases = [
        ("def", 1, LexState::FNAME),
        ("def foo", 2, LexState::ENDFN),
        ("foo.", 2, LexState::DOT),
        ("foo&.", 2, LexState::DOT),
        ("class", 1, LexState::CLASS),
        ("foo", 1, LexState::CMDARG),
        ("foo.bar", 3, LexState::ARG),
        ("1 + foo", 3, LexState::ARG),
        ("foo(", 2, LexState::BEG | LexState::LABEL),
        ("x if", 2, LexState::BEG | LexState::LABEL),
        ("if", 1, LexState::BEG),
        ("42", 1, LexState::END),
        ("a + b", 2, LexState::BEG),
        ("foo(a:", 3, LexState::ARG | LexState::LABELED),
    ];
    for (source, count, expected) in cases {
        assert_eq!(state_after(source, count), expected, "{source:?}");
    }
}

#[test]
fn lex_identifier_may_be_local_except_after_dot() {
    let mut ctx = ParserContext::new(ParseOptions::default());
    let mut lexer = Lexer::from_bytes(b"x.y");
    lexer.next_token(&mut ctx).expect("x");
    assert!(lexer.ident_may_be_local());
    lexer.next_token(&mut ctx).expect(".");
    lexer.next_token(&mut ctx).expect("y");
    assert!(!lexer.ident_may_be_local());
}
