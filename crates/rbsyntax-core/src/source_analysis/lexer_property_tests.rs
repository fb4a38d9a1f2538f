// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the lexer.
//!
//! These tests use `proptest` to verify lexer invariants over generated inputs:
//!
//! 1. **Lexer never panics** on arbitrary text or arbitrary bytes
//! 2. **Token spans within input**: every span satisfies `start <= end <= len`
//! 3. **Lexer is deterministic**: same input, same tokens and spans
//! 4. **Valid fragments produce no errors**
//! 5. **Interpolation is balanced**: every `#{` is matched by its `}`
//!
//! Heredoc bodies are read ahead of the rest of their opening line, so spans
//! are not monotonic and no ordering property is asserted.
//!
//! **DDD Context:** Source Analysis

use proptest::prelude::*;

use super::lexer::lex;
use super::token::TokenKind;

// ============================================================================
// Generators
// ============================================================================

/// Known-valid single-token fragments that should lex without errors.
const VALID_SINGLE_TOKENS: &[&str] = &[
    "42",
    "3.14",
    "0x1F",
    "1_000",
    "2r",
    "3i",
    "\"hello\"",
    "'world'",
    "true",
    "nil",
    "self",
    "x",
    "Foo",
    "empty?",
    "@ivar",
    "@@cvar",
    "$gvar",
    "$1",
    ":sym",
    "?a",
    "+",
    "**",
    "<=>",
    "&&",
    "=>",
    "->",
    "::",
    "..",
];

/// Multi-token valid expressions that should lex cleanly.
const VALID_EXPRESSIONS: &[&str] = &[
    "x + 1",
    "foo(1, 2)",
    "a[0] = b",
    "puts \"a#{b}c\"",
    "x = y if z",
    "[1, 2].map { |v| v * 2 }",
    "{a: 1, 'b' => 2}",
    "def foo(a, b = 1, *c, d:, **e, &f) end",
    "->(x) { x }",
    "%w[a b c]",
    "/ab+c/i =~ s",
    "x = <<~EOS\n  body\nEOS\n",
    "case x\nwhen 1 then :one\nend",
    "a&.b ||= c",
];

fn valid_single_token() -> impl Strategy<Value = String> {
    prop::sample::select(VALID_SINGLE_TOKENS).prop_map(std::string::ToString::to_string)
}

fn valid_expression() -> impl Strategy<Value = String> {
    prop::sample::select(VALID_EXPRESSIONS).prop_map(std::string::ToString::to_string)
}

// ============================================================================
// Property tests
// ============================================================================

/// Default is 256 cases; override via `PROPTEST_CASES` env var for nightly runs.
fn proptest_config() -> ProptestConfig {
    let default = ProptestConfig::default();
    ProptestConfig {
        cases: default.cases.max(256),
        ..default
    }
}

proptest! {
    #![proptest_config(proptest_config())]

    /// Property 1: Lexer never panics on arbitrary string input.
    #[test]
    fn lexer_never_panics(input in "\\PC{0,300}") {
        let _tokens = lex(input.as_bytes());
    }

    /// Property 1b: Lexer never panics on arbitrary bytes.
    #[test]
    fn lexer_never_panics_on_bytes(input in prop::collection::vec(any::<u8>(), 0..300)) {
        let _tokens = lex(&input);
    }

    /// Property 2: All token spans are within input bounds.
    #[test]
    fn token_spans_within_input(input in "\\PC{0,300}") {
        let input_len = u32::try_from(input.len()).unwrap_or(u32::MAX);
        if let Ok(tokens) = lex(input.as_bytes()) {
            for token in &tokens {
                let span = token.span();
                prop_assert!(
                    span.start() <= span.end() && span.end() <= input_len,
                    "Token {:?} span {:?} out of bounds for input {:?}",
                    token.kind(),
                    span,
                    input,
                );
            }
        }
    }

    /// Property 3: Lexer is deterministic.
    #[test]
    fn lexer_deterministic(input in "\\PC{0,200}") {
        let first = lex(input.as_bytes());
        let second = lex(input.as_bytes());
        prop_assert_eq!(first, second, "Different results for input {:?}", input);
    }

    /// Property 4: Known-valid single tokens lex cleanly.
    #[test]
    fn valid_tokens_no_errors(input in valid_single_token()) {
        let result = lex(input.as_bytes());
        prop_assert!(result.is_ok(), "Valid input {:?} failed: {:?}", input, result);
    }

    /// Property 4b: Known-valid expressions lex cleanly.
    #[test]
    fn valid_expressions_no_errors(input in valid_expression()) {
        let result = lex(input.as_bytes());
        prop_assert!(result.is_ok(), "Valid expression {:?} failed: {:?}", input, result);
    }

    /// Property 5: String interpolation tokens are balanced.
    #[test]
    fn string_interpolation_balanced(input in "\"[a-z ]{0,10}#\\{[a-z][a-z0-9]{0,4}\\}[a-z ]{0,10}\"") {
        let tokens = lex(input.as_bytes());
        prop_assert!(tokens.is_ok(), "Input {:?} failed to lex", input);
        let tokens = tokens.unwrap_or_default();
        let opens = tokens.iter().filter(|t| *t.kind() == TokenKind::StringDBeg).count();
        let closes = tokens.iter().filter(|t| *t.kind() == TokenKind::StringDEnd).count();
        prop_assert_eq!(opens, 1);
        prop_assert_eq!(closes, 1);
        prop_assert_eq!(tokens.last().map(|t| t.kind().clone()), Some(TokenKind::StringEnd));
    }
}
