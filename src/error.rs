// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Shared diagnostic types.
//!
//! Every stage of the pipeline eventually reports failures through
//! [`Diagnostic`], which carries a stable string [`ErrorCategory`], a
//! human-readable message and, where available, a source position and a
//! short excerpt -- never a bare exception.

use std::fmt;

use rowan::TextRange;
use serde::{Deserialize, Serialize};

/// Stable, string-stable failure categories.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    ParseError,
    UnsupportedSyntax,
    ResolveCycle,
    DupDecl,
    UnknownName,
    TypeConflict,
    InternalError,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ParseError => "PARSE_ERROR",
            Self::UnsupportedSyntax => "UNSUPPORTED_SYNTAX",
            Self::ResolveCycle => "RESOLVE_CYCLE",
            Self::DupDecl => "DUP_DECL",
            Self::UnknownName => "UNKNOWN_NAME",
            Self::TypeConflict => "TYPE_CONFLICT",
            Self::InternalError => "INTERNAL_ERROR",
        };
        f.write_str(s)
    }
}

/// A one-based line/column position, derived from a byte offset into the
/// original source text.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let mut line = 1;
        let mut last_newline = None;

        for (idx, ch) in source[..offset].char_indices() {
            if ch == '\n' {
                line += 1;
                last_newline = Some(idx);
            }
        }

        let line_start = last_newline.map(|idx| idx + 1).unwrap_or(0);
        let column = unicode_width::UnicodeWidthStr::width(&source[line_start..offset]) + 1;

        Self { line, column }
    }
}

/// A structured failure value, never an exception on the hot path.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{category}: {message}")]
pub struct Diagnostic {
    pub category: ErrorCategory,
    pub message: String,
    pub position: Option<Position>,
    pub excerpt: Option<String>,
}

impl Diagnostic {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            position: None,
            excerpt: None,
        }
    }

    /// Attaches a position and a short excerpt computed from `range` within
    /// the original `source` text.
    pub fn with_span(mut self, source: &str, range: TextRange) -> Self {
        let start: usize = range.start().into();
        let end: usize = range.end().into();
        self.position = Some(Position::from_offset(source, start));
        self.excerpt = source.get(start..end.min(source.len())).map(str::to_owned);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_counts_lines_and_columns() {
        let source = "line one\nline two\nline three";
        let pos = Position::from_offset(source, 9);
        assert_eq!(pos, Position { line: 2, column: 1 });

        let pos = Position::from_offset(source, 14);
        assert_eq!(pos, Position { line: 2, column: 6 });
    }

    #[test]
    fn category_display_is_stable() {
        assert_eq!(ErrorCategory::ResolveCycle.to_string(), "RESOLVE_CYCLE");
        assert_eq!(ErrorCategory::DupDecl.to_string(), "DUP_DECL");
    }
}
