// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Typed AST nodes for `SELECT` statements embedded in PL/SQL blocks
//! (standalone `SELECT ... INTO`, cursor queries, and subqueries nested in
//! expressions).

use super::{typed_syntax_node, AstNode, Expression, Ident};

typed_syntax_node!(
    SelectStmt,
    SelectClause,
    ColumnExpr,
    ColumnExprList,
    IntoClause,
    FromClause,
    TableRef,
    JoinClause,
);

impl SelectStmt {
    pub fn select_clause(&self) -> Option<SelectClause> {
        self.syntax.children().find_map(SelectClause::cast)
    }

    pub fn into_clause(&self) -> Option<IntoClause> {
        self.syntax.children().find_map(IntoClause::cast)
    }

    pub fn from_clause(&self) -> Option<FromClause> {
        self.syntax.children().find_map(FromClause::cast)
    }

    pub fn where_clause(&self) -> Option<super::WhereClause> {
        self.syntax.children().find_map(super::WhereClause::cast)
    }

    /// `true` when the select list has exactly one column and no `FROM`
    /// or `INTO` clause reaches outside a single row -- used by the type
    /// analyzer to decide whether a nested `SELECT` bubbles up the scalar
    /// type of its single column.
    pub fn is_scalar_subquery(&self) -> bool {
        self.into_clause().is_none()
            && self
                .select_clause()
                .map(|clause| clause.columns().len() == 1)
                .unwrap_or(false)
    }
}

impl SelectClause {
    pub fn columns(&self) -> Vec<ColumnExpr> {
        self.syntax
            .children()
            .find_map(ColumnExprList::cast)
            .map(|list| list.columns())
            .unwrap_or_default()
    }
}

impl ColumnExprList {
    pub fn columns(&self) -> Vec<ColumnExpr> {
        self.syntax.children().filter_map(ColumnExpr::cast).collect()
    }
}

impl ColumnExpr {
    pub fn expr(&self) -> Option<Expression> {
        self.syntax.children().find_map(Expression::cast)
    }

    pub fn alias(&self) -> Option<Ident> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter_map(Ident::cast)
            .last()
    }

    pub fn text(&self) -> String {
        self.syntax.text().to_string()
    }
}

impl IntoClause {
    pub fn targets(&self) -> Vec<Ident> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter_map(Ident::cast)
            .collect()
    }
}

impl FromClause {
    pub fn tables(&self) -> Vec<TableRef> {
        self.syntax.children().filter_map(TableRef::cast).collect()
    }

    pub fn joins(&self) -> Vec<JoinClause> {
        self.syntax.children().filter_map(JoinClause::cast).collect()
    }
}

impl TableRef {
    pub fn name(&self) -> Option<Ident> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter_map(Ident::cast)
            .next()
    }

    pub fn alias(&self) -> Option<Ident> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter_map(Ident::cast)
            .last()
    }
}

impl JoinClause {
    pub fn table(&self) -> Option<TableRef> {
        self.syntax.children().find_map(TableRef::cast)
    }

    pub fn on_condition(&self) -> Option<Expression> {
        self.syntax.children().find_map(Expression::cast)
    }
}
