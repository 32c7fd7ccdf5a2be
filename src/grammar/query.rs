// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! `SELECT` statement grammar, used for standalone `SELECT ... INTO`,
//! cursor queries and scalar subqueries nested in expressions.

use crate::lexer::TokenKind;
use crate::parser::Parser;
use crate::syntax::SyntaxKind;

use super::expressions::parse_expr;
use super::function_invocation::parse_ident_group;

pub fn parse_select_stmt(p: &mut Parser) {
    p.start(SyntaxKind::SelectStmt);
    p.bump(TokenKind::SelectKw);
    parse_select_clause(p);
    if p.at(TokenKind::IntoKw) {
        parse_into_clause(p);
    }
    if p.at(TokenKind::FromKw) {
        parse_from_clause(p);
    }
    if p.at(TokenKind::WhereKw) {
        parse_where_clause(p);
    }
    p.finish();
}

fn parse_select_clause(p: &mut Parser) {
    p.start(SyntaxKind::SelectClause);
    p.start(SyntaxKind::ColumnExprList);
    parse_column_expr(p);
    while p.eat(TokenKind::Comma) {
        parse_column_expr(p);
    }
    p.finish();
    p.finish();
}

fn parse_column_expr(p: &mut Parser) {
    p.start(SyntaxKind::ColumnExpr);
    if p.at(TokenKind::Asterisk) {
        p.bump(TokenKind::Asterisk);
    } else {
        parse_expr(p);
        if p.at_one_of(&[TokenKind::Ident, TokenKind::QuotedIdent]) {
            p.bump_any();
        }
    }
    p.finish();
}

fn parse_into_clause(p: &mut Parser) {
    p.start(SyntaxKind::IntoClause);
    p.bump(TokenKind::IntoKw);
    p.expect(TokenKind::Ident);
    while p.eat(TokenKind::Comma) {
        p.expect(TokenKind::Ident);
    }
    p.finish();
}

fn parse_from_clause(p: &mut Parser) {
    p.start(SyntaxKind::FromClause);
    p.bump(TokenKind::FromKw);
    parse_table_ref(p);
    while p.eat(TokenKind::Comma) {
        parse_table_ref(p);
    }
    while p.at_one_of(&[
        TokenKind::JoinKw,
        TokenKind::LeftKw,
        TokenKind::RightKw,
        TokenKind::InnerKw,
    ]) {
        parse_join_clause(p);
    }
    p.finish();
}

fn parse_table_ref(p: &mut Parser) {
    p.start(SyntaxKind::TableRef);
    parse_ident_group(p);
    if p.at_one_of(&[TokenKind::Ident, TokenKind::QuotedIdent]) {
        p.bump_any();
    }
    p.finish();
}

fn parse_join_clause(p: &mut Parser) {
    p.start(SyntaxKind::JoinClause);
    p.eat_one_of(&[TokenKind::LeftKw, TokenKind::RightKw, TokenKind::InnerKw]);
    p.eat(TokenKind::OuterKw);
    p.expect(TokenKind::JoinKw);
    parse_table_ref(p);
    if p.eat(TokenKind::OnKw) {
        parse_expr(p);
    }
    p.finish();
}

fn parse_where_clause(p: &mut Parser) {
    p.start(SyntaxKind::WhereClause);
    p.bump(TokenKind::WhereKw);
    parse_expr(p);
    p.finish();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstNode, Root, SelectStmt};

    fn parse_select(input: &str) -> SelectStmt {
        let mut parser = Parser::new(input);
        parse_select_stmt(&mut parser);
        let parse = parser.build();
        let root = Root::cast(parse.tree()).unwrap();
        root.syntax.children().find_map(SelectStmt::cast).unwrap()
    }

    #[test]
    fn select_into_is_captured() {
        let select = parse_select("SELECT salary INTO v_salary FROM employees WHERE id = 1");
        assert_eq!(select.into_clause().unwrap().targets().len(), 1);
        assert_eq!(select.from_clause().unwrap().tables().len(), 1);
        assert!(select.where_clause().is_some());
    }

    #[test]
    fn single_column_select_without_into_is_scalar_subquery() {
        let select = parse_select("SELECT max(salary) FROM employees");
        assert!(select.is_scalar_subquery());
    }
}
