// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Typed AST nodes for `CREATE PROCEDURE` units.

use super::{typed_syntax_node, AstNode, Block, Ident, ParamList};

typed_syntax_node!(Procedure, ProcedureHeader);

impl Procedure {
    pub fn header(&self) -> Option<ProcedureHeader> {
        self.syntax.children().find_map(ProcedureHeader::cast)
    }

    pub fn body(&self) -> Option<Block> {
        self.syntax.children().find_map(Block::cast)
    }

    pub fn name(&self) -> Option<String> {
        self.header()?.name()
    }
}

impl ProcedureHeader {
    pub fn name(&self) -> Option<String> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find_map(Ident::cast)
            .map(|ident| ident.name())
    }

    pub fn param_list(&self) -> Option<ParamList> {
        self.syntax.children().find_map(ParamList::cast)
    }
}
