// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Typed AST nodes over the [`crate::syntax`] CST, rust-analyzer style.

mod block;
mod declare_section;
mod expressions;
mod function;
mod function_invocation;
mod package;
mod procedure;
mod query;

pub use block::*;
pub use declare_section::*;
pub use expressions::*;
pub use function::*;
pub use function_invocation::*;
pub use package::*;
pub use procedure::*;
pub use query::*;
pub use rowan::ast::AstNode;

use crate::syntax::{SyntaxKind, SyntaxToken};

macro_rules! typed_syntax {
    ($synty:ty, $astty:ty, $name:ident $(; { $( $additional:item )+ } )? ) => {
        #[derive(Debug, Clone, Eq, PartialEq, Hash)]
        pub struct $name {
            pub(crate) syntax: $synty,
        }

        impl $astty for $name {
            $( $( $additional )+ )?

            fn can_cast(kind: crate::syntax::SyntaxKind) -> bool {
                kind == crate::syntax::SyntaxKind::$name
            }

            fn cast(syntax: $synty) -> Option<Self> {
                if Self::can_cast(syntax.kind()) {
                    Some(Self { syntax })
                } else {
                    None
                }
            }

            fn syntax(&self) -> &$synty {
                &self.syntax
            }
        }
    };
}

macro_rules! typed_syntax_node {
    ($( $name:ident ),+ $(,)?) => {
        $(
            crate::ast::typed_syntax!(crate::syntax::SyntaxNode, crate::ast::AstNode, $name; {
                type Language = crate::syntax::PlSqlLang;
            });
        )+
    };
}

macro_rules! typed_syntax_token {
    ($( $name:ident ),+ $(,)?) => {
        $( crate::ast::typed_syntax!(crate::syntax::SyntaxToken, crate::ast::AstToken, $name); )+
    };
}

pub(crate) use {typed_syntax, typed_syntax_node, typed_syntax_token};

/// Interface for typed AST tokens, mirroring [`AstNode`] for leaf tokens.
pub trait AstToken {
    fn can_cast(kind: SyntaxKind) -> bool
    where
        Self: Sized;

    fn cast(token: SyntaxToken) -> Option<Self>
    where
        Self: Sized;

    fn syntax(&self) -> &SyntaxToken;

    fn text(&self) -> &str {
        self.syntax().text()
    }
}

typed_syntax_node!(Root);
typed_syntax_token!(Ident, QuotedLiteral, Integer, Number);

impl Root {
    pub fn function(&self) -> Option<Function> {
        self.syntax.children().find_map(Function::cast)
    }

    pub fn procedure(&self) -> Option<Procedure> {
        self.syntax.children().find_map(Procedure::cast)
    }

    pub fn package(&self) -> Option<Package> {
        self.syntax.children().find_map(Package::cast)
    }

    pub fn package_body(&self) -> Option<PackageBody> {
        self.syntax.children().find_map(PackageBody::cast)
    }

    pub fn block(&self) -> Option<Block> {
        self.syntax.children().find_map(Block::cast)
    }

    pub fn select_stmt(&self) -> Option<SelectStmt> {
        self.syntax.children().find_map(SelectStmt::cast)
    }
}

impl Ident {
    pub fn name(&self) -> String {
        self.syntax.text().to_string()
    }
}
