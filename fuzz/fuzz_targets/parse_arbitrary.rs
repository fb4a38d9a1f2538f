// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for parser crash safety testing.
//!
//! This target feeds arbitrary byte sequences to the parser and asserts
//! that it never panics. Source text is bytes, so invalid UTF-8 is fed in
//! as well and must come back as an error, not a crash.
//!
//! # Success Criteria
//!
//! The parser passes fuzzing if:
//! - It never panics or overflows the stack on any input
//! - It returns the same result for a line reader as for the whole buffer
//!
//! # Corpus Seeding
//!
//! Seed `fuzz/corpus/parse_arbitrary/` with `.rb` files for realistic
//! starting points for mutation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rbsyntax_core::{ParseOptions, parse, parse_reader};

fuzz_target!(|data: &[u8]| {
    let options = ParseOptions::new("fuzz.rb");
    let from_bytes = parse(data, &options);
    let from_reader = parse_reader(data, &options);
    match (from_bytes, from_reader) {
        (Ok(a), Ok(b)) => assert_eq!(a, b),
        (Err(a), Err(b)) => assert_eq!(a.errors, b.errors),
        (a, b) => panic!("byte and reader parses disagree: {a:?} vs {b:?}"),
    }
});
