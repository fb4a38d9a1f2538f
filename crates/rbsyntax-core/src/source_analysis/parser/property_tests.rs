// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the parser.
//!
//! These tests use `proptest` to verify parser invariants over generated inputs:
//!
//! 1. **Parser never panics** on arbitrary text, arbitrary bytes, or mutated
//!    near-valid programs
//! 2. **Parser is deterministic**: same input, same result
//! 3. **Error spans within input**: every error and warning span ends
//!    inside the source
//! 4. **Blank lines between statements are insignificant**
//! 5. **Reader and byte sources agree**
//!
//! **DDD Context:** Source Analysis

use proptest::prelude::*;

use crate::config::ParseOptions;

use super::{parse, parse_reader};

// ============================================================================
// Generators
// ============================================================================

/// Statements that parse on their own.
const FRAGMENTS: &[&str] = &[
    "42",
    "-3.5e2",
    "0x1f",
    "1r",
    "2i",
    "\"hello #{name}\"",
    "'single'",
    ":sym",
    "%w[a b c]",
    "/ab+c/i",
    "x = 1",
    "a, b = b, a",
    "x += 2",
    "foo(1, *rest, key: 2, &blk)",
    "foo 1, 2",
    "obj&.bar",
    "[1, 2, 3].map { |n| n * 2 }",
    "list.each do |a, (b, c)| p a end",
    "->(x) { x + 1 }",
    "{ a: 1, 'b' => 2 }",
    "if a then b elsif c then d else e end",
    "x = y unless z",
    "while i < 10 do i += 1 end",
    "case x\nwhen 1, 2 then :low\nelse :high\nend",
    "case v\nin [Integer => a, *] then a\nin {k:} then k\nend",
    "begin\n  risky\nrescue Error => e\n  retry\nensure\n  done\nend",
    "def m(a, b = 1, *c, d:, e: 2, **f, &g) end",
    "def self.build(...) = new(...)",
    "class A < B; def c; @c ||= 1; end; end",
    "module M; CONST = 1; end",
    "alias new_name old_name",
    "BEGIN { setup }",
    "defined?(foo)",
    "a ? b : c",
    "1..10",
    "x = <<~EOS\n  text\nEOS",
];

fn fragment() -> impl Strategy<Value = String> {
    prop::sample::select(FRAGMENTS).prop_map(std::string::ToString::to_string)
}

/// A program of several fragments joined by newlines.
fn program() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(fragment(), 1..6)
}

/// A fragment cut at a random point.
fn truncated() -> impl Strategy<Value = String> {
    fragment().prop_flat_map(|s| {
        let len = s.len();
        (0..=len).prop_map(move |cut| {
            let cut = (0..=cut).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0);
            s[..cut].to_string()
        })
    })
}

/// A fragment with one byte replaced by a delimiter or operator.
fn mutated() -> impl Strategy<Value = String> {
    const NOISE: &[u8] = b"()[]{}|,;:=*&^.\"'`#\n\\%$@?<>-";
    (fragment(), any::<prop::sample::Index>(), prop::sample::select(NOISE)).prop_map(
        |(s, index, noise)| {
            let mut bytes = s.into_bytes();
            let at = index.index(bytes.len());
            bytes[at] = noise;
            String::from_utf8_lossy(&bytes).into_owned()
        },
    )
}

fn near_valid() -> impl Strategy<Value = String> {
    prop_oneof![
        fragment(),
        truncated(),
        mutated(),
        program().prop_map(|lines| lines.join("\n")),
    ]
}

/// Default is 256 cases; override with `PROPTEST_CASES`.
fn proptest_config() -> ProptestConfig {
    let default = ProptestConfig::default();
    ProptestConfig {
        cases: default.cases.max(256),
        ..default
    }
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    #![proptest_config(proptest_config())]

    /// Property 1: the parser never panics on arbitrary text.
    #[test]
    fn parser_never_panics(input in "\\PC{0,300}") {
        let _ = parse(input.as_bytes(), &ParseOptions::default());
    }

    /// Property 1b: the parser never panics on arbitrary bytes.
    #[test]
    fn parser_never_panics_on_bytes(input in prop::collection::vec(any::<u8>(), 0..300)) {
        let _ = parse(&input, &ParseOptions::default());
    }

    /// Property 1c: the parser never panics on near-valid programs.
    #[test]
    fn parser_never_panics_near_valid(input in near_valid()) {
        let _ = parse(input.as_bytes(), &ParseOptions::default());
    }

    /// Property 2: parsing is deterministic.
    #[test]
    fn parser_is_deterministic(input in near_valid()) {
        let options = ParseOptions::default();
        let first = parse(input.as_bytes(), &options);
        let second = parse(input.as_bytes(), &options);
        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(a), Err(b)) => prop_assert_eq!(a.errors, b.errors),
            (a, b) => prop_assert!(false, "results differ for {:?}: {:?} vs {:?}", input, a, b),
        }
    }

    /// Property 3: error and warning spans end within the input.
    #[test]
    fn spans_within_input(input in near_valid()) {
        let len = u32::try_from(input.len()).unwrap_or(u32::MAX);
        match parse(input.as_bytes(), &ParseOptions::default()) {
            Ok(output) => {
                for warning in &output.warnings {
                    prop_assert!(warning.span.end() <= len, "{:?}: {:?}", input, warning);
                }
            }
            Err(err) => {
                for error in &err.errors {
                    prop_assert!(error.span.start() <= error.span.end());
                    prop_assert!(error.span.end() <= len, "{:?}: {:?}", input, error);
                }
            }
        }
    }

    /// Property 4: blank lines between statements do not change the tree
    /// shape.
    #[test]
    fn blank_lines_are_insignificant(lines in program()) {
        let options = ParseOptions::default();
        let tight = parse(lines.join("\n").as_bytes(), &options);
        let loose = parse(lines.join("\n\n\n").as_bytes(), &options);
        match (tight, loose) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.program.statements.len(), b.program.statements.len());
                let kinds = |p: &crate::ast::Program| {
                    p.statements.iter().map(|s| std::mem::discriminant(&s.kind)).collect::<Vec<_>>()
                };
                prop_assert_eq!(kinds(&a.program), kinds(&b.program));
            }
            (Err(_), Err(_)) => {}
            (a, b) => prop_assert!(false, "results differ for {:?}: {:?} vs {:?}", lines, a, b),
        }
    }

    /// Property 5: a reader over the same bytes gives the same result.
    #[test]
    fn reader_agrees_with_bytes(input in near_valid()) {
        let options = ParseOptions::default();
        let from_bytes = parse(input.as_bytes(), &options);
        let from_reader = parse_reader(input.as_bytes(), &options);
        match (from_bytes, from_reader) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(a), Err(b)) => prop_assert_eq!(a.errors, b.errors),
            (a, b) => prop_assert!(false, "results differ for {:?}: {:?} vs {:?}", input, a, b),
        }
    }
}
