// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Fixture corpus tests.
//!
//! Test cases are discovered from the `cases/` directory:
//! - every `cases/valid/*.rb` must parse, through both the byte and the
//!   reader entry points, with identical results
//! - every `cases/invalid/*.rb` must fail with at least one error that
//!   names the fixture and a line inside it

use std::fs;
use std::path::{Path, PathBuf};

use rbsyntax_core::{ParseOptions, parse, parse_reader};

fn cases(kind: &str) -> Vec<PathBuf> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("cases")
        .join(kind);
    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", dir.display()))
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "rb"))
        .collect();
    paths.sort();
    assert!(!paths.is_empty(), "no fixtures in {}", dir.display());
    paths
}

fn read_case(path: &Path) -> (ParseOptions, Vec<u8>) {
    let source =
        fs::read(path).unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (ParseOptions::new(name), source)
}

#[test]
fn valid_cases_parse() {
    for path in cases("valid") {
        let (options, source) = read_case(&path);
        let output = parse(&source, &options)
            .unwrap_or_else(|err| panic!("{} failed to parse:\n{err}", path.display()));
        assert!(
            !output.program.statements.is_empty(),
            "{} produced no statements",
            path.display()
        );

        let streamed = parse_reader(source.as_slice(), &options)
            .unwrap_or_else(|err| panic!("{} failed through a reader:\n{err}", path.display()));
        assert_eq!(output, streamed, "{}", path.display());
    }
}

#[test]
fn invalid_cases_fail_with_located_errors() {
    for path in cases("invalid") {
        let (options, source) = read_case(&path);
        let Err(err) = parse(&source, &options) else {
            panic!("{} parsed but should not have", path.display());
        };
        let lines = u32::try_from(source.split(|&b| b == b'\n').count()).unwrap_or(u32::MAX);
        for error in &err.errors {
            assert!(
                (1..=lines).contains(&error.line()),
                "{}: error on line {} of {lines}",
                path.display(),
                error.line()
            );
        }
        let rendered = err.to_string();
        assert!(
            rendered.starts_with(&options.source_name),
            "{}: {rendered}",
            path.display()
        );
    }
}
