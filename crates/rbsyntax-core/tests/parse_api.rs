// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests of the public parsing API.
//!
//! These drive `parse` and `parse_reader` the way a driver would: source
//! bytes and [`ParseOptions`] in, a tree or a located error out.

use proptest::prelude::*;
use rbsyntax_core::ast::{Node, NodeKind, Program};
use rbsyntax_core::source_analysis::{
    DiagnosticCategory, Encoding, LexErrorKind, SemanticErrorKind, ShareableConstantValue,
    SyntaxErrorKind,
};
use rbsyntax_core::{ParseError, ParseOptions, ParseOutput, parse, parse_reader};

// ============================================================================
// Helpers
// ============================================================================

fn parse_ok(source: &str) -> ParseOutput {
    parse(source.as_bytes(), &ParseOptions::default())
        .unwrap_or_else(|err| panic!("{source:?} failed to parse:\n{err}"))
}

fn parse_err(source: &str) -> ParseError {
    match parse(source.as_bytes(), &ParseOptions::default()) {
        Ok(output) => panic!("{source:?} parsed: {:?}", output.program),
        Err(err) => err,
    }
}

fn statements(source: &str) -> Vec<Node> {
    let mut output = parse_ok(source);
    std::mem::take(&mut output.program.statements)
}

fn call_parts(node: &Node) -> (&str, Option<&Node>, &[Node]) {
    match &node.kind {
        NodeKind::Call {
            name,
            receiver,
            args,
            ..
        } => (name.as_str(), receiver.as_deref(), args.as_slice()),
        other => panic!("expected a call, got {other:?}"),
    }
}

/// Renders a tree with every location zeroed, so trees that differ only in
/// line, column or offset compare equal.
fn shape(program: &Program) -> String {
    let text = format!("{:?}", program.statements);
    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_str();
    while let Some(at) = ["offset: ", "line: ", "column: "]
        .iter()
        .filter_map(|key| rest.find(key).map(|i| (i, key.len())))
        .min()
    {
        let (index, key_len) = at;
        out.push_str(&rest[..index + key_len]);
        rest = rest[index + key_len..].trim_start_matches(|c: char| c.is_ascii_digit());
        out.push('0');
    }
    out.push_str(rest);
    out
}

fn number_text(node: &Node) -> String {
    match &node.kind {
        NodeKind::Number(literal) => literal.to_string(),
        other => panic!("expected a number, got {other:?}"),
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn options_deserialize_with_defaults() {
    let options: ParseOptions =
        serde_json::from_str(r#"{"source_name": "lib/job.rb", "starting_line": 20}"#)
            .expect("valid options");
    assert_eq!(options.max_nesting_depth, ParseOptions::default().max_nesting_depth);
    assert!(options.warnings);

    let output = parse(b"__FILE__\n__LINE__", &options).expect("parses");
    assert!(matches!(
        output.program.statements[0].kind,
        NodeKind::SourceFile(ref name) if name == "lib/job.rb"
    ));
    assert!(matches!(output.program.statements[1].kind, NodeKind::SourceLine(21)));
}

#[test]
fn options_control_frozen_strings() {
    let options: ParseOptions =
        serde_json::from_str(r#"{"frozen_string_literal": true}"#).expect("valid options");
    let output = parse(b"'a'", &options).expect("parses");
    assert!(matches!(
        output.program.statements[0].kind,
        NodeKind::Str { frozen: true, .. }
    ));

    // The magic comment wins over the option.
    let output = parse(b"# frozen_string_literal: false\n'a'", &options).expect("parses");
    assert!(matches!(
        output.program.statements[0].kind,
        NodeKind::Str { frozen: false, .. }
    ));
}

#[test]
fn nesting_too_deep_is_an_error_not_a_crash() {
    let options = ParseOptions::default().with_max_nesting_depth(64);
    let source = format!("x = {}1{}", "(".repeat(5_000), ")".repeat(5_000));
    let err = parse(source.as_bytes(), &options).expect_err("too deep");
    assert!(err.has_kind(|k| matches!(k, SyntaxErrorKind::NestingTooDeep { limit: 64 })));

    let blocks = format!("{}x{}", "foo { ".repeat(500), " }".repeat(500));
    let err = parse(blocks.as_bytes(), &options).expect_err("too deep");
    assert!(err.has_kind(|k| matches!(k, SyntaxErrorKind::NestingTooDeep { .. })));
}

#[test]
fn repeated_not_hits_the_nesting_limit() {
    let source = format!("{}x", "not ".repeat(5_000));
    let err = parse(source.as_bytes(), &ParseOptions::default()).expect_err("too deep");
    assert!(err.has_kind(|k| matches!(k, SyntaxErrorKind::NestingTooDeep { .. })));

    let options = ParseOptions::default().with_max_nesting_depth(64);
    assert!(parse(b"not not not x", &options).is_ok());
}

#[test]
fn long_modifier_chain_parses_and_drops() {
    let source = format!("x = 1\nx{}", " if x".repeat(100_000));
    let output = parse_ok(&source);
    assert_eq!(output.program.statements.len(), 2);
    drop(output);

    let source = format!("a{}", " + a".repeat(100_000));
    let output = parse_ok(&source);
    assert_eq!(output.program.statements.len(), 1);
}

// ============================================================================
// Operator disambiguation
// ============================================================================

#[test]
fn unary_argument_or_binary_operator() {
    // (source, index of the statement to inspect, expected method name)
    let cases = [
        ("foo -1", 0, "foo"),
        ("foo +1", 0, "foo"),
        ("foo - 1", 0, "-"),
        ("foo = 1\nfoo -1", 1, "-"),
        ("foo = 1\nfoo +1", 1, "+"),
        ("x = 1; foo = ->(n){n}; foo -1", 2, "-"),
    ];
    for (source, index, expected) in cases {
        let program = statements(source);
        let (name, receiver, args) = call_parts(&program[index]);
        assert_eq!(name, expected, "{source:?}");
        assert_eq!(args.len(), 1, "{source:?}");
        if expected == "foo" {
            assert!(receiver.is_none(), "{source:?}");
        } else {
            assert!(matches!(
                receiver.map(|r| &r.kind),
                Some(NodeKind::LocalVar { name, .. } | NodeKind::Call { name, .. }) if name == "foo"
            ));
        }
    }
}

#[test]
fn local_callable_is_subtracted_from() {
    let program = statements("x = 1; foo = ->(n){n}; foo -1");
    let (_, receiver, args) = call_parts(&program[2]);
    assert!(matches!(
        receiver.map(|r| &r.kind),
        Some(NodeKind::LocalVar { name, .. }) if name == "foo"
    ));
    assert_eq!(number_text(&args[0]), "1");
}

#[test]
fn ambiguous_argument_warns() {
    let output = parse_ok("foo -1");
    assert!(
        output
            .warnings
            .iter()
            .any(|w| w.category == Some(DiagnosticCategory::AmbiguousOperator))
    );
    assert!(
        !parse_ok("foo = 1\nfoo -1")
            .warnings
            .iter()
            .any(|w| w.category == Some(DiagnosticCategory::AmbiguousOperator))
    );
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn numeric_literals() {
    let cases = [
        ("0x1A", "26"),
        ("1_000", "1000"),
        ("1.5e2", "150.0"),
        ("1r", "(1/1)"),
        ("1.5r", "(3/2)"),
        ("0b101", "5"),
        ("0o17", "15"),
        ("2i", "2i"),
    ];
    for (source, expected) in cases {
        let program = statements(source);
        assert_eq!(number_text(&program[0]), expected, "{source:?}");
    }
}

#[test]
fn negative_base_binds_looser_than_power() {
    let program = statements("-2**2");
    let (name, receiver, args) = call_parts(&program[0]);
    assert_eq!(name, "-@");
    assert!(args.is_empty());
    let power = receiver.expect("receiver");
    let (name, base, args) = call_parts(power);
    assert_eq!(name, "**");
    assert_eq!(number_text(base.expect("base")), "2");
    assert_eq!(number_text(&args[0]), "2");

    let program = statements("-2.abs");
    let (name, receiver, _) = call_parts(&program[0]);
    assert_eq!(name, "abs");
    assert_eq!(number_text(receiver.expect("receiver")), "-2");
}

#[test]
fn squiggly_heredoc_removes_common_indent() {
    let program = statements("x = <<~END\n  a\n    b\n  END\n");
    let NodeKind::Assign { value, .. } = &program[0].kind else {
        panic!("expected assignment");
    };
    assert!(matches!(
        value.kind,
        NodeKind::Str { ref value, .. } if value == b"a\n  b\n"
    ));
}

#[test]
fn heredoc_body_follows_the_opening_line() {
    let program = statements("foo(<<~A, 2)\n  body\nA\nbar");
    assert_eq!(program.len(), 2);
    let (name, _, args) = call_parts(&program[0]);
    assert_eq!(name, "foo");
    assert_eq!(args.len(), 2);
    assert!(matches!(args[0].kind, NodeKind::Str { ref value, .. } if value == b"body\n"));
}

// ============================================================================
// Scopes and patterns
// ============================================================================

#[test]
fn numbered_parameters_conflict_only_when_nested() {
    let err = parse_err("a { _1; b { _1 } }");
    assert!(err.has_kind(|k| matches!(
        k,
        SyntaxErrorKind::Semantic(
            SemanticErrorKind::NumberedParameterInOuterBlock
                | SemanticErrorKind::NumberedParameterInInnerBlock
        )
    )));
    parse_ok("a { _1 }\nb { _1 }");

    let err = parse_err("a { b { c { _1 } }; _1 }");
    assert!(err.has_kind(|k| matches!(
        k,
        SyntaxErrorKind::Semantic(SemanticErrorKind::NumberedParameterInInnerBlock)
    )));
    parse_ok("a { b { c { _1 } }; x = 1 }");
}

#[test]
fn duplicate_pattern_binding() {
    let err = parse_err("case x; in [a, a]; end");
    assert!(err.has_kind(|k| matches!(
        k,
        SyntaxErrorKind::Semantic(SemanticErrorKind::DuplicatePatternVariable(name)) if name == "a"
    )));
    parse_ok("case x; in [a, b]; end");
    parse_ok("case x; in [_, _]; end");
}

#[test]
fn semantic_errors_do_not_stop_the_parse() {
    let err = parse_err("def a\n  X = 1\nend\nself = 2\ncase v; in [b, b]; end\n");
    assert_eq!(err.errors.len(), 3, "{err}");
    let lines: Vec<u32> = err.errors.iter().map(|e| e.line()).collect();
    assert_eq!(lines, vec![2, 4, 5]);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn unterminated_heredoc_reports_opening_line() {
    let err = parse_err("x = 1\ny = <<~EOS\n  body\n  more\n\n");
    assert_eq!(err.errors.len(), 1);
    let first = err.first().expect("one error");
    assert_eq!(first.line(), 2);
    assert!(matches!(
        first.kind,
        SyntaxErrorKind::Lex(LexErrorKind::UnterminatedHeredoc(ref name)) if name == "EOS"
    ));
}

#[test]
fn error_renders_with_caret() {
    let options = ParseOptions::new("broken.rb");
    let err = parse(b"a = 1\nb = [1, )\n", &options).expect_err("fails");
    let rendered = err.to_string();
    let mut lines = rendered.lines();
    assert!(lines.next().is_some_and(|l| l.starts_with("broken.rb:2:")), "{rendered}");
    assert_eq!(lines.next(), Some("b = [1, )"));
    assert_eq!(lines.next().map(str::trim_end), Some("        ^"));
}

#[test]
fn errors_are_miette_diagnostics() {
    let err = parse_err("def m(a, a); end");
    let diagnostic: &dyn miette::Diagnostic = &err;
    assert!(diagnostic.source_code().is_some());
    assert_eq!(diagnostic.related().map(Iterator::count), Some(1));
}

// ============================================================================
// Sources
// ============================================================================

const PROGRAM: &str = r"require 'set'
class Counter
  def initialize
    @counts = Hash.new(0)
  end

  def add(word)
    @counts[word] += 1
  end
end
c = Counter.new
%w[a b a].each { |w| c.add(w) }
p c
";

#[test]
fn reader_and_bytes_agree() {
    let options = ParseOptions::new("counter.rb");
    let from_bytes = parse(PROGRAM.as_bytes(), &options).expect("parses");
    let from_reader = parse_reader(PROGRAM.as_bytes(), &options).expect("parses");
    assert_eq!(from_bytes, from_reader);
}

#[test]
fn crlf_and_lf_give_the_same_tree() {
    let lf = parse_ok(PROGRAM);
    let crlf = parse_ok(&PROGRAM.replace('\n', "\r\n"));
    assert_eq!(shape(&lf.program), shape(&crlf.program));
}

#[test]
fn blank_lines_and_trailing_spaces_do_not_change_the_tree() {
    let tight = parse_ok(PROGRAM);
    let loose_source: String = PROGRAM
        .lines()
        .map(|line| format!("{line}   \n\n"))
        .collect();
    let loose = parse_ok(&loose_source);
    assert_eq!(shape(&tight.program), shape(&loose.program));
}

#[test]
fn parses_run_independently_on_threads() {
    let expected = parse_ok(PROGRAM);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| parse(PROGRAM.as_bytes(), &ParseOptions::default())))
            .collect();
        for handle in handles {
            let output = handle.join().expect("thread").expect("parses");
            assert_eq!(output, expected);
        }
    });
}

// ============================================================================
// Magic comments
// ============================================================================

#[test]
fn frozen_string_literal_spellings() {
    for header in [
        "# frozen_string_literal: true",
        "# Frozen-String-Literal: TRUE",
        "# FROZEN_string-literal: true",
        "# -*- mode: ruby; frozen-string-literal: true -*-",
    ] {
        let output = parse_ok(&format!("{header}\n'a'"));
        assert_eq!(output.magic_comments.frozen_string_literal, Some(true), "{header}");
        assert!(
            matches!(output.program.statements[0].kind, NodeKind::Str { frozen: true, .. }),
            "{header}"
        );
    }
}

#[test]
fn magic_comment_after_code_is_ignored() {
    let output = parse_ok("x = 'a' # frozen_string_literal: true\n'b'");
    assert_eq!(output.magic_comments.frozen_string_literal, None);
    assert!(matches!(
        output.program.statements[1].kind,
        NodeKind::Str { frozen: false, .. }
    ));
    assert!(
        output
            .warnings
            .iter()
            .any(|w| w.category == Some(DiagnosticCategory::MagicComment))
    );
}

#[test]
fn shareable_constant_value_wraps_constant_assignments() {
    let output = parse_ok("# shareable_constant_value: literal\nLIMITS = [1, 2]\nx = [3]");
    assert_eq!(
        output.magic_comments.shareable_constant_value,
        ShareableConstantValue::Literal
    );
    let NodeKind::Assign { value, .. } = &output.program.statements[0].kind else {
        panic!("expected assignment");
    };
    assert!(matches!(
        value.kind,
        NodeKind::ShareableConstant {
            mode: ShareableConstantValue::Literal,
            ..
        }
    ));
    let NodeKind::Assign { value, .. } = &output.program.statements[1].kind else {
        panic!("expected assignment");
    };
    assert!(matches!(value.kind, NodeKind::Array(_)));
}

#[test]
fn encoding_comment_selects_encoding() {
    assert_eq!(parse_ok("# encoding: binary\nx = 1").encoding, Encoding::Binary);
    assert_eq!(parse_ok("#!/usr/bin/env ruby\n# coding: us-ascii\nx").encoding, Encoding::UsAscii);
    assert_eq!(parse_ok("x = 1").encoding, Encoding::Utf8);
}

#[test]
fn warn_indent_comment_enables_indentation_warnings() {
    let source = "if a\n  b\n  end\n";
    assert!(parse_ok(source).warnings.is_empty());
    let output = parse_ok(&format!("# warn_indent: true\n{source}"));
    assert!(
        output
            .warnings
            .iter()
            .any(|w| w.category == Some(DiagnosticCategory::IndentMismatch))
    );
}

// ============================================================================
// Literal round trip
// ============================================================================

fn literal() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u64..1_000_000).prop_map(|n| n.to_string()),
        (1u32..100_000).prop_map(|n| format!("0x{n:x}")),
        (1u32..1000, 0u32..1000).prop_map(|(a, b)| format!("{a}_{b:03}")),
        (0u32..1000, 0u32..1000).prop_map(|(a, b)| format!("{a}.{b}")),
        (1u32..100, 0i32..10).prop_map(|(a, e)| format!("{a}.5e{e}")),
        "[a-z ]{0,12}".prop_map(|s| format!("'{s}'")),
        "[a-z ]{0,12}".prop_map(|s| format!("\"{s}\"")),
    ]
}

proptest! {
    /// Cutting each literal's text out of a program by its span and parsing
    /// it alone gives the same literal value.
    #[test]
    fn literal_spans_round_trip(
        literals in prop::collection::vec(literal(), 1..8),
        separators in prop::collection::vec(prop::sample::select(vec!["\n", " ;", ";\n\n", "  \n"]), 8),
    ) {
        let mut source = String::new();
        for (i, literal) in literals.iter().enumerate() {
            source.push_str(literal);
            source.push_str(separators[i % separators.len()]);
        }
        let output = parse(source.as_bytes(), &ParseOptions::default())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(output.program.statements.len(), literals.len());
        for statement in &output.program.statements {
            let text = &source[statement.span.as_range()];
            let alone = parse(text.as_bytes(), &ParseOptions::default())
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(alone.program.statements.len(), 1);
            prop_assert_eq!(&alone.program.statements[0].kind, &statement.kind);
        }
    }
}
