// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Per-parse state shared by the lexer, parser and scope tracker.
//!
//! One [`ParserContext`] lives for exactly one parse. Nothing here is
//! global, so independent parses may run concurrently on separate threads.

use ecow::EcoString;
use tracing::debug;

use crate::config::ParseOptions;

use super::encoding::{
    Encoding, MagicComment, MagicComments, MagicKey, MagicSetting, ShareableConstantValue,
};
use super::{Diagnostic, DiagnosticCategory, SemanticErrorKind, Span};

/// Options, warnings, recorded semantic errors and magic comment settings
/// for one parse.
#[derive(Debug)]
pub struct ParserContext {
    options: ParseOptions,
    warnings: Vec<Diagnostic>,
    semantic_errors: Vec<(SemanticErrorKind, Span)>,
    magic: MagicComments,
    encoding: Encoding,
    /// Set once the first token has been produced; `encoding` magic
    /// comments are only honored before it.
    token_seen: bool,
    carriage_return_warned: bool,
}

impl ParserContext {
    /// Creates a context for one parse.
    ///
    /// Unknown external encoding names fall back to UTF-8.
    #[must_use]
    pub fn new(options: ParseOptions) -> Self {
        let encoding = options
            .encoding
            .as_deref()
            .and_then(Encoding::find)
            .unwrap_or_default();
        let magic = MagicComments {
            frozen_string_literal: options.frozen_string_literal,
            shareable_constant_value: ShareableConstantValue::None,
            warn_indent: None,
        };
        Self {
            options,
            warnings: Vec::new(),
            semantic_errors: Vec::new(),
            magic,
            encoding,
            token_seen: false,
            carriage_return_warned: false,
        }
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    // ========================================================================
    // Warnings and errors
    // ========================================================================

    /// Records a warning in the given category.
    pub fn warn(
        &mut self,
        category: DiagnosticCategory,
        message: impl Into<EcoString>,
        span: Span,
    ) {
        if self.options.warnings {
            self.warnings
                .push(Diagnostic::warning(message, span).with_category(category));
        }
    }

    /// Records a semantic error; parsing continues.
    pub fn semantic_error(&mut self, kind: SemanticErrorKind, span: Span) {
        debug!(%kind, %span, "semantic error recorded");
        self.semantic_errors.push((kind, span));
    }

    /// Returns the warnings collected so far.
    #[must_use]
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Returns the semantic errors recorded so far.
    #[must_use]
    pub fn semantic_errors(&self) -> &[(SemanticErrorKind, Span)] {
        &self.semantic_errors
    }

    /// Takes the warnings and errors out of the context.
    pub fn take_results(&mut self) -> (Vec<Diagnostic>, Vec<(SemanticErrorKind, Span)>) {
        (
            std::mem::take(&mut self.warnings),
            std::mem::take(&mut self.semantic_errors),
        )
    }

    /// Warns about a bare carriage return, once per parse.
    pub fn warn_carriage_return(&mut self, span: Span) {
        if !self.carriage_return_warned {
            self.carriage_return_warned = true;
            self.warn(
                DiagnosticCategory::CarriageReturn,
                "encountered \\r in middle of line, treated as a mere space",
                span,
            );
        }
    }

    // ========================================================================
    // Magic comments
    // ========================================================================

    /// Returns the active source encoding.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Returns true if plain string literals are frozen.
    #[must_use]
    pub fn frozen_string_literal(&self) -> bool {
        self.magic.frozen_string_literal.unwrap_or(false)
    }

    /// Returns the constant shareability in effect.
    #[must_use]
    pub fn shareable_constant_value(&self) -> ShareableConstantValue {
        self.magic.shareable_constant_value
    }

    /// Returns true if indentation warnings are enabled.
    #[must_use]
    pub fn warn_indent(&self) -> bool {
        self.magic.warn_indent.unwrap_or(self.options.warn_indent)
    }

    /// Returns the magic comment settings in effect.
    #[must_use]
    pub fn magic_comments(&self) -> MagicComments {
        self.magic
    }

    /// Notes that a token has been produced.
    pub fn mark_token_seen(&mut self) {
        self.token_seen = true;
    }

    /// Returns true once any token has been produced.
    #[must_use]
    pub fn token_seen(&self) -> bool {
        self.token_seen
    }

    /// Switches the source encoding.
    ///
    /// Returns `false` for unknown encoding names.
    pub fn set_encoding(&mut self, name: &str) -> bool {
        match Encoding::find(name) {
            Some(encoding) => {
                debug!(%encoding, "source encoding switched");
                self.encoding = encoding;
                true
            }
            None => false,
        }
    }

    /// Applies a non-encoding magic comment.
    ///
    /// `frozen_string_literal` is only honored before the first token;
    /// later occurrences are warned about and ignored.
    pub fn apply_magic_comment(&mut self, comment: &MagicComment, span: Span) {
        match comment {
            MagicComment::Setting(MagicSetting::Encoding(_)) => {}
            MagicComment::Setting(MagicSetting::FrozenStringLiteral(frozen)) => {
                if self.token_seen {
                    self.warn(
                        DiagnosticCategory::MagicComment,
                        "'frozen_string_literal' is ignored after any tokens",
                        span,
                    );
                } else {
                    debug!(frozen, "frozen_string_literal magic comment");
                    self.magic.frozen_string_literal = Some(*frozen);
                }
            }
            MagicComment::Setting(MagicSetting::ShareableConstantValue(value)) => {
                debug!(?value, "shareable_constant_value magic comment");
                self.magic.shareable_constant_value = *value;
            }
            MagicComment::Setting(MagicSetting::WarnIndent(enabled)) => {
                debug!(enabled, "warn_indent magic comment");
                self.magic.warn_indent = Some(*enabled);
            }
            MagicComment::InvalidValue { key, value } => {
                let message = match key {
                    MagicKey::Encoding => format!("invalid encoding name {value}"),
                    _ => format!("invalid value for {}: {value}", key.name()),
                };
                self.warn(DiagnosticCategory::MagicComment, message, span);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_seed_magic_defaults() {
        let ctx = ParserContext::new(ParseOptions::default().with_frozen_string_literal(true));
        assert!(ctx.frozen_string_literal());
        assert!(!ctx.warn_indent());
    }

    #[test]
    fn warn_indent_comment_overrides_option() {
        let mut ctx = ParserContext::new(ParseOptions::default().with_warn_indent(true));
        ctx.apply_magic_comment(
            &MagicComment::Setting(MagicSetting::WarnIndent(false)),
            Span::default(),
        );
        assert!(!ctx.warn_indent());
    }

    #[test]
    fn frozen_string_literal_after_tokens_is_ignored() {
        let mut ctx = ParserContext::new(ParseOptions::default());
        ctx.mark_token_seen();
        ctx.apply_magic_comment(
            &MagicComment::Setting(MagicSetting::FrozenStringLiteral(true)),
            Span::default(),
        );
        assert!(!ctx.frozen_string_literal());
        assert_eq!(ctx.warnings().len(), 1);
    }

    #[test]
    fn disabled_warnings_are_dropped() {
        let mut ctx = ParserContext::new(ParseOptions::default().with_warnings(false));
        ctx.warn(DiagnosticCategory::AmbiguousOperator, "x", Span::default());
        assert!(ctx.warnings().is_empty());
    }

    #[test]
    fn carriage_return_warns_once() {
        let mut ctx = ParserContext::new(ParseOptions::default());
        ctx.warn_carriage_return(Span::default());
        ctx.warn_carriage_return(Span::default());
        assert_eq!(ctx.warnings().len(), 1);
    }

    #[test]
    fn external_encoding_option() {
        let ctx = ParserContext::new(ParseOptions::default().with_encoding("binary"));
        assert_eq!(ctx.encoding(), Encoding::Binary);
        let ctx = ParserContext::new(ParseOptions::default().with_encoding("nope"));
        assert_eq!(ctx.encoding(), Encoding::Utf8);
    }
}
