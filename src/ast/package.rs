// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Typed AST nodes for `CREATE PACKAGE` / `CREATE PACKAGE BODY` units.

use super::{typed_syntax_node, AstNode, DeclareSection, Function, Ident, Procedure};

typed_syntax_node!(Package, PackageBody);

impl Package {
    pub fn name(&self) -> Option<String> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find_map(Ident::cast)
            .map(|ident| ident.name())
    }

    pub fn declare_section(&self) -> Option<DeclareSection> {
        self.syntax.children().find_map(DeclareSection::cast)
    }
}

impl PackageBody {
    pub fn name(&self) -> Option<String> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find_map(Ident::cast)
            .map(|ident| ident.name())
    }

    pub fn declare_section(&self) -> Option<DeclareSection> {
        self.syntax.children().find_map(DeclareSection::cast)
    }

    pub fn functions(&self) -> Vec<Function> {
        self.syntax.children().filter_map(Function::cast).collect()
    }

    pub fn procedures(&self) -> Vec<Procedure> {
        self.syntax.children().filter_map(Procedure::cast).collect()
    }
}
