// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Example demonstrating the parser API.
//!
//! Shows how to parse source, read warnings, render errors, and see how
//! local variables change the meaning of the same text.

use rbsyntax_core::ast::NodeKind;
use rbsyntax_core::{ParseOptions, parse, parse_reader};

fn main() {
    println!("rbsyntax Parser Example\n");
    println!("=======================\n");

    // Example 1: A valid program
    println!("1. Valid Code");
    println!("   Source: puts [1, 2, 3].sum");
    match parse(b"puts [1, 2, 3].sum", &ParseOptions::default()) {
        Ok(output) => println!("   Statements: {}", output.program.statements.len()),
        Err(err) => println!("   Unexpected error: {err}"),
    }
    println!();

    // Example 2: Local variables steer the lexer
    println!("2. Locals versus Method Calls");
    for source in ["foo -1", "foo = 1\nfoo -1"] {
        let Ok(output) = parse(source.as_bytes(), &ParseOptions::default()) else {
            continue;
        };
        if let Some(last) = output.program.statements.last() {
            let reading = match &last.kind {
                NodeKind::Call { name, args, .. } if name == "-" && args.len() == 1 => {
                    "subtraction"
                }
                NodeKind::Call { .. } => "method call with argument -1",
                _ => "something else",
            };
            println!("   {source:?} reads as {reading}");
        }
        for warning in &output.warnings {
            println!("   warning: {}", warning.message);
        }
    }
    println!();

    // Example 3: Errors carry the file, line and a caret
    println!("3. Syntax Error");
    let options = ParseOptions::new("broken.rb");
    if let Err(err) = parse(b"def greet(name, name)\n  puts name\nend\n", &options) {
        println!("{err}");
    }
    println!();

    // Example 4: Reading from a stream
    println!("4. Streaming Source");
    let source = "x = <<~EOS\n  heredoc body\nEOS\nputs x\n";
    match parse_reader(source.as_bytes(), &ParseOptions::new("stream.rb")) {
        Ok(output) => println!("   Parsed {} statements", output.program.statements.len()),
        Err(err) => println!("{err}"),
    }
}
