// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements a syntax-level (lossless CST) representation of the input.

use num_traits::{FromPrimitive, ToPrimitive};

mod kind;
pub use kind::SyntaxKind;

/// Dummy type for our PL/SQL language definition, for use with rowan.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum PlSqlLang {}

impl rowan::Language for PlSqlLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        Self::Kind::from_u16(raw.0).unwrap()
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind.to_u16().unwrap())
    }
}

/// Typed [`SyntaxNode`] with our [`PlSqlLang`] language definition.
pub type SyntaxNode = rowan::SyntaxNode<PlSqlLang>;
/// Typed [`SyntaxToken`] with our [`PlSqlLang`] language definition.
pub type SyntaxToken = rowan::SyntaxToken<PlSqlLang>;
/// Typed [`SyntaxElement`] with our [`PlSqlLang`] language definition.
#[allow(unused)]
pub type SyntaxElement = rowan::SyntaxElement<PlSqlLang>;
