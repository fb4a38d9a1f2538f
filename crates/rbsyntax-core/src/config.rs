// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Parse options.
//!
//! [`ParseOptions`] can be built in code with the `with_*` setters or
//! deserialized from a driver's configuration file; missing fields take
//! their defaults.
//!
//! ```
//! use rbsyntax_core::ParseOptions;
//!
//! let options = ParseOptions::new("app.rb")
//!     .with_starting_line(10)
//!     .with_frozen_string_literal(true);
//! assert_eq!(options.source_name, "app.rb");
//! assert_eq!(options.max_nesting_depth, 256);
//! ```

use serde::Deserialize;

/// Default limit on nested expressions.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 256;

/// Options controlling a single parse.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Name reported in diagnostics (`__FILE__` also evaluates to it).
    pub source_name: String,
    /// Line number of the first source line.
    pub starting_line: u32,
    /// Maximum depth of nested expressions before the parse fails.
    pub max_nesting_depth: usize,
    /// Default for the `frozen_string_literal` magic comment.
    pub frozen_string_literal: Option<bool>,
    /// Enables indentation-mismatch warnings. The `warn_indent` magic
    /// comment overrides it.
    pub warn_indent: bool,
    /// When false, warnings are discarded.
    pub warnings: bool,
    /// External encoding of the source. UTF-8 when absent.
    pub encoding: Option<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            source_name: "-".to_string(),
            starting_line: 1,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            frozen_string_literal: None,
            warn_indent: false,
            warnings: true,
            encoding: None,
        }
    }
}

impl ParseOptions {
    /// Creates default options with the given source name.
    #[must_use]
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            ..Self::default()
        }
    }

    /// Sets the line number of the first source line.
    #[must_use]
    pub fn with_starting_line(mut self, line: u32) -> Self {
        self.starting_line = line;
        self
    }

    /// Sets the nesting limit.
    #[must_use]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Sets the `frozen_string_literal` default.
    #[must_use]
    pub fn with_frozen_string_literal(mut self, frozen: bool) -> Self {
        self.frozen_string_literal = Some(frozen);
        self
    }

    /// Enables or disables indentation warnings.
    #[must_use]
    pub fn with_warn_indent(mut self, enabled: bool) -> Self {
        self.warn_indent = enabled;
        self
    }

    /// Enables or disables warning collection.
    #[must_use]
    pub fn with_warnings(mut self, enabled: bool) -> Self {
        self.warnings = enabled;
        self
    }

    /// Sets the external source encoding.
    #[must_use]
    pub fn with_encoding(mut self, name: impl Into<String>) -> Self {
        self.encoding = Some(name.into());
        self
    }
}
