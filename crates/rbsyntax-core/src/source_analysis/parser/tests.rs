// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for the parser's unit tests, and tests of whole programs
//! that cut across the grammar modules.

use crate::ast::{Node, NodeKind, Program};
use crate::config::ParseOptions;
use crate::source_analysis::{DiagnosticCategory, ParseError, SyntaxErrorKind};

use super::{ParseOutput, parse, parse_reader};

// ============================================================================
// Helpers
// ============================================================================

/// Parses `source` with default options, panicking on failure.
pub(super) fn parse_ok(source: &str) -> Program {
    match parse(source.as_bytes(), &ParseOptions::default()) {
        Ok(output) => output.program,
        Err(err) => panic!("{source:?} failed to parse: {err:?}"),
    }
}

/// Parses `source`, panicking if it succeeds.
pub(super) fn parse_err(source: &str) -> ParseError {
    match parse(source.as_bytes(), &ParseOptions::default()) {
        Ok(output) => panic!("{source:?} parsed: {:?}", output.program),
        Err(err) => err,
    }
}

/// Parses a program of exactly one statement and returns it.
pub(super) fn single(source: &str) -> Node {
    let mut program = parse_ok(source);
    assert_eq!(program.statements.len(), 1, "{source:?}: {program:?}");
    program.statements.remove(0)
}

/// Returns the method name if `node` is a call.
pub(super) fn call_name(node: &Node) -> Option<&str> {
    match &node.kind {
        NodeKind::Call { name, .. } => Some(name.as_str()),
        _ => None,
    }
}

/// Returns the messages of the warnings for `source`.
pub(super) fn warnings_of(source: &str) -> Vec<String> {
    match parse(source.as_bytes(), &ParseOptions::default()) {
        Ok(output) => output.warnings.iter().map(|w| w.message.to_string()).collect(),
        Err(err) => panic!("{source:?} failed to parse: {err:?}"),
    }
}

/// Parses with indentation warnings enabled.
pub(super) fn parse_with_warn_indent(source: &str) -> ParseOutput {
    let options = ParseOptions::default().with_warn_indent(true);
    match parse(source.as_bytes(), &options) {
        Ok(output) => output,
        Err(err) => panic!("{source:?} failed to parse: {err:?}"),
    }
}

// ============================================================================
// Programs
// ============================================================================

#[test]
fn empty_program() {
    assert!(parse_ok("").statements.is_empty());
    assert!(parse_ok("\n\n  # only a comment\n").statements.is_empty());
}

#[test]
fn statements_split_on_newlines_and_semicolons() {
    assert_eq!(parse_ok("a\nb; c;;\n\nd").statements.len(), 4);
}

#[test]
fn line_continuations() {
    assert_eq!(parse_ok("a = 1 +\n  2").statements.len(), 1);
    assert_eq!(parse_ok("a = 1 \\\n  + 2").statements.len(), 1);
    assert_eq!(parse_ok("foo\n  .bar\n  .baz").statements.len(), 1);
}

#[test]
fn end_marker_stops_the_program() {
    assert_eq!(parse_ok("a\n__END__\nthis is ) not code").statements.len(), 1);
}

#[test]
fn crlf_line_endings() {
    assert_eq!(parse_ok("a = 1\r\nb = a\r\n").statements.len(), 2);
}

#[test]
fn multiple_assignment() {
    let node = single("a, b = 1, 2");
    let NodeKind::MultiAssign { targets, value } = node.kind else {
        panic!("expected multiple assignment");
    };
    assert!(matches!(targets.kind, NodeKind::MultiTarget { ref pre, .. } if pre.len() == 2));
    assert!(matches!(value.kind, NodeKind::Array(ref items) if items.len() == 2));

    assert!(matches!(
        single("a, *b = list").kind,
        NodeKind::MultiAssign { ref targets, .. }
            if matches!(targets.kind, NodeKind::MultiTarget { rest: Some(_), .. })
    ));
    assert!(matches!(
        single("(a, b), c = x").kind,
        NodeKind::MultiAssign { .. }
    ));
}

#[test]
fn swap_declares_both_targets() {
    let program = parse_ok("a, b = 1, 2\na -1\nb -1");
    for statement in &program.statements[1..] {
        assert_eq!(call_name(statement), Some("-"));
    }
}

#[test]
fn ambiguous_first_argument_warns() {
    let output = match parse(b"foo -1", &ParseOptions::default()) {
        Ok(output) => output,
        Err(err) => panic!("{err:?}"),
    };
    assert!(
        output
            .warnings
            .iter()
            .any(|w| w.category == Some(DiagnosticCategory::AmbiguousOperator))
    );
    assert_eq!(call_name(&output.program.statements[0]), Some("foo"));
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn starting_line_and_source_name() {
    let options = ParseOptions::new("lib/app.rb").with_starting_line(10);
    let output = match parse(b"__FILE__\n__LINE__", &options) {
        Ok(output) => output,
        Err(err) => panic!("{err:?}"),
    };
    assert!(matches!(
        output.program.statements[0].kind,
        NodeKind::SourceFile(ref name) if name == "lib/app.rb"
    ));
    assert!(matches!(output.program.statements[1].kind, NodeKind::SourceLine(11)));
}

#[test]
fn warnings_can_be_disabled() {
    let options = ParseOptions::default().with_warnings(false);
    let output = match parse(b"def m\n  x = 1\nend\nfoo -1", &options) {
        Ok(output) => output,
        Err(err) => panic!("{err:?}"),
    };
    assert!(output.warnings.is_empty());
}

#[test]
fn nesting_limit() {
    let options = ParseOptions::default().with_max_nesting_depth(16);
    let source = format!("{}1{}", "(".repeat(40), ")".repeat(40));
    let Err(err) = parse(source.as_bytes(), &options) else {
        panic!("expected nesting error");
    };
    assert!(err.has_kind(|k| matches!(k, SyntaxErrorKind::NestingTooDeep { limit: 16 })));

    let shallow = format!("{}1{}", "(".repeat(2), ")".repeat(2));
    assert!(parse(shallow.as_bytes(), &options).is_ok());
}

#[test]
fn deep_nesting_does_not_overflow_the_stack() {
    let options = ParseOptions::default().with_max_nesting_depth(100_000);
    let source = format!("{}1{}", "[".repeat(2_000), "]".repeat(2_000));
    assert!(parse(source.as_bytes(), &options).is_ok());
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn error_reports_line_and_source_name() {
    let options = ParseOptions::new("demo.rb");
    let Err(err) = parse(b"x = 1\ny = )\n", &options) else {
        panic!("expected an error");
    };
    let first = err.first().expect("one error");
    assert_eq!(first.line(), 2);
    assert!(err.to_string().starts_with("demo.rb:2:"), "{err}");
    assert!(first.message().starts_with("unexpected"), "{}", first.message());
}

#[test]
fn semantic_errors_are_all_reported() {
    let err = parse_err("def a(x, x); end\ndef b\n  class C; end\nend");
    assert_eq!(err.errors.len(), 2);
}

#[test]
fn unterminated_constructs() {
    parse_err("def m");
    parse_err("if a\n  b");
    parse_err("[1, 2");
    parse_err("\"abc");
    parse_err("x = <<~EOS\n  body\n");
}

// ============================================================================
// Sources
// ============================================================================

#[test]
fn reader_matches_bytes() {
    let source = "x = <<~EOS\n  one #{1 + 2}\n  two\nEOS\ndef m(a) = a * 2\nputs m(x.size)\n";
    let options = ParseOptions::default();
    let from_bytes = parse(source.as_bytes(), &options);
    let from_reader = parse_reader(source.as_bytes(), &options);
    match (from_bytes, from_reader) {
        (Ok(a), Ok(b)) => assert_eq!(a, b),
        (a, b) => panic!("results differ: {a:?} vs {b:?}"),
    }
}

#[test]
fn realistic_program() {
    let source = r#"
# frozen_string_literal: true

module Shapes
  class Circle < Shape
    attr_reader :radius

    def initialize(radius:)
      @radius = radius
    end

    def area = Math::PI * radius ** 2

    def describe(format = :short, *extra, **opts, &blk)
      case format
      in :short then "circle r=#{radius}"
      in :long | :full
        extra.map { |e| e.to_s }.join(", ")
      else
        raise ArgumentError, "unknown format: #{format}"
      end
    rescue ArgumentError => e
      warn e.message
    ensure
      blk&.call(self)
    end
  end
end

Shapes::Circle.new(radius: 2).describe(:long, 1, 2) do |out|
  puts out unless out.empty?
end
"#;
    let program = parse_ok(source);
    assert_eq!(program.statements.len(), 2);
    assert!(matches!(program.statements[0].kind, NodeKind::Module { .. }));
    assert!(matches!(
        program.statements[1].kind,
        NodeKind::Call { block: Some(_), .. }
    ));
}

// ============================================================================
// Lexer feedback
// ============================================================================

/// Returns the lexer state once the parser has read the first token.
fn state_at_first_token(source: &str, locals: &[&str]) -> super::LexState {
    let options = ParseOptions::default();
    let buffer = super::SourceBuffer::from_bytes(source.as_bytes(), options.starting_line);
    let mut parser = super::Parser::new(buffer, options);
    for name in locals {
        parser
            .scopes
            .declare_local(&(*name).into(), crate::source_analysis::Span::default());
    }
    parser.advance().expect("first token");
    parser.lexer.state()
}

#[test]
fn known_local_switches_lexer_to_end_label() {
    use super::LexState;

    assert_eq!(state_at_first_token("x", &["x"]), LexState::END | LexState::LABEL);
    assert_eq!(state_at_first_token("x", &[]), LexState::CMDARG);
    assert_eq!(state_at_first_token("y", &["x"]), LexState::CMDARG);
}
