// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Pattern binding extraction for semantic analysis.
//!
//! **DDD Context:** Semantic Analysis
//!
//! Collects the locals a `case`/`in` pattern binds and reports the binding
//! errors the grammar cannot express: a name bound twice, a hash key
//! repeated, and a name bound inside one branch of an alternative.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use ecow::EcoString;

use crate::ast::{Node, NodeKind};
use crate::source_analysis::{SemanticErrorKind, Span};

/// A local bound by a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternBinding {
    /// The variable name.
    pub name: EcoString,
    /// Where the pattern binds it.
    pub span: Span,
}

/// Extracts variable bindings from a pattern.
///
/// Returns every binding in source order together with the semantic
/// errors found. Names starting with `_` may be bound more than once and
/// inside alternatives.
///
/// # Examples
///
/// ```
/// # use rbsyntax_core::ast::{Node, NodeKind};
/// # use rbsyntax_core::semantic_analysis::extract_pattern_bindings;
/// # use rbsyntax_core::source_analysis::Span;
/// let pattern = Node::new(NodeKind::MatchVar("x".into()), Span::default());
/// let (bindings, errors) = extract_pattern_bindings(&pattern);
/// assert_eq!(bindings.len(), 1);
/// assert_eq!(bindings[0].name, "x");
/// assert!(errors.is_empty());
/// ```
pub fn extract_pattern_bindings(
    pattern: &Node,
) -> (Vec<PatternBinding>, Vec<(SemanticErrorKind, Span)>) {
    let mut collector = Collector::default();
    collector.walk(pattern);
    (collector.bindings, collector.errors)
}

#[derive(Default)]
struct Collector {
    bindings: Vec<PatternBinding>,
    seen: HashMap<EcoString, Span>,
    errors: Vec<(SemanticErrorKind, Span)>,
}

impl Collector {
    fn bind(&mut self, name: &EcoString, span: Span) {
        if !name.starts_with('_') {
            match self.seen.entry(name.clone()) {
                Entry::Occupied(_) => {
                    self.errors
                        .push((SemanticErrorKind::DuplicatePatternVariable(name.clone()), span));
                }
                Entry::Vacant(entry) => {
                    entry.insert(span);
                }
            }
        }
        self.bindings.push(PatternBinding {
            name: name.clone(),
            span,
        });
    }

    fn walk(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::MatchVar(name) => self.bind(name, node.span),
            NodeKind::CapturePattern { pattern, name } => {
                self.walk(pattern);
                self.bind(name, node.span);
            }
            NodeKind::SplatPattern(Some(name)) | NodeKind::KeywordRestPattern(Some(name)) => {
                self.bind(name, node.span);
            }
            NodeKind::ArrayPattern {
                constant: _,
                pre,
                rest,
                post,
            } => {
                pre.iter().for_each(|p| self.walk(p));
                if let Some(rest) = rest {
                    self.walk(rest);
                }
                post.iter().for_each(|p| self.walk(p));
            }
            NodeKind::FindPattern {
                pre_rest,
                middle,
                post_rest,
                ..
            } => {
                self.walk(pre_rest);
                middle.iter().for_each(|p| self.walk(p));
                self.walk(post_rest);
            }
            NodeKind::HashPattern { pairs, rest, .. } => {
                let mut keys: HashMap<&EcoString, Span> = HashMap::new();
                for pair in pairs {
                    if let NodeKind::PatternPair { key, value } = &pair.kind {
                        if keys.insert(key, pair.span).is_some() {
                            let kind = SemanticErrorKind::DuplicatePatternKey(key.clone());
                            self.errors.push((kind, pair.span));
                        }
                        match value {
                            Some(value) => self.walk(value),
                            None => self.bind(key, pair.span),
                        }
                    }
                }
                if let Some(rest) = rest {
                    self.walk(rest);
                }
            }
            NodeKind::AlternativePattern(alternatives) => {
                for alternative in alternatives {
                    let mut inner = Self::default();
                    inner.walk(alternative);
                    self.errors.append(&mut inner.errors);
                    for binding in inner.bindings {
                        if !binding.name.starts_with('_') {
                            self.errors.push((
                                SemanticErrorKind::IllegalVariableInAlternative(binding.name),
                                binding.span,
                            ));
                        }
                    }
                }
            }
            _ => {}
        }
    }
}
