// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Typed AST nodes for declare sections: variable, type and cursor
//! declarations.

use super::{typed_syntax_node, AstNode, Expression, Ident};

typed_syntax_node!(
    DeclareSection,
    VariableDecl,
    VariableDeclList,
    TypeDecl,
    CursorDecl,
    TypeName,
    Param,
    ParamList,
);

impl DeclareSection {
    pub fn variable_decls(&self) -> Vec<VariableDecl> {
        self.syntax
            .descendants()
            .filter_map(VariableDecl::cast)
            .collect()
    }

    pub fn type_decls(&self) -> Vec<TypeDecl> {
        self.syntax.descendants().filter_map(TypeDecl::cast).collect()
    }

    pub fn cursor_decls(&self) -> Vec<CursorDecl> {
        self.syntax.descendants().filter_map(CursorDecl::cast).collect()
    }
}

impl VariableDecl {
    pub fn name(&self) -> Option<Ident> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find_map(Ident::cast)
    }

    pub fn type_name(&self) -> Option<TypeName> {
        self.syntax.children().find_map(TypeName::cast)
    }

    pub fn default_expr(&self) -> Option<Expression> {
        self.syntax.children().find_map(Expression::cast)
    }

    pub fn text(&self) -> String {
        self.syntax.text().to_string()
    }
}

impl TypeName {
    pub fn text(&self) -> String {
        self.syntax.text().to_string()
    }
}

impl TypeDecl {
    pub fn name(&self) -> Option<Ident> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find_map(Ident::cast)
    }

    /// The aliased type phrase after `IS`, e.g. `TABLE OF NUMBER` in
    /// `TYPE num_list_t IS TABLE OF NUMBER;`.
    pub fn type_name(&self) -> Option<TypeName> {
        self.syntax.children().find_map(TypeName::cast)
    }

    pub fn text(&self) -> String {
        self.syntax.text().to_string()
    }
}

impl CursorDecl {
    pub fn name(&self) -> Option<Ident> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find_map(Ident::cast)
    }

    pub fn query(&self) -> Option<super::SelectStmt> {
        self.syntax.children().find_map(super::SelectStmt::cast)
    }
}

impl ParamList {
    pub fn params(&self) -> Vec<Param> {
        self.syntax.children().filter_map(Param::cast).collect()
    }
}

impl Param {
    pub fn name(&self) -> Option<Ident> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find_map(Ident::cast)
    }

    pub fn type_name(&self) -> Option<TypeName> {
        self.syntax.children().find_map(TypeName::cast)
    }

    pub fn text(&self) -> String {
        self.syntax.text().to_string()
    }
}
