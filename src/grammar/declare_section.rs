// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Declare sections: variable, cursor and local type declarations, plus the
//! shared datatype grammar used by both declarations and parameter lists.

use crate::lexer::TokenKind;
use crate::parser::Parser;
use crate::syntax::SyntaxKind;

use super::expressions::parse_expr;
use super::query::parse_select_stmt;

pub fn parse_declare_section(p: &mut Parser) {
    p.start(SyntaxKind::DeclareSection);
    loop {
        match p.current() {
            TokenKind::CursorKw => parse_cursor_decl(p),
            TokenKind::TypeKw => parse_type_decl(p),
            TokenKind::Ident | TokenKind::QuotedIdent => parse_variable_decl(p),
            _ => break,
        }
    }
    p.finish();
}

fn parse_variable_decl(p: &mut Parser) {
    p.start(SyntaxKind::VariableDecl);
    p.bump_any();
    p.eat(TokenKind::ConstantKw);
    parse_type_name(p);
    if p.eat(TokenKind::Assign) || p.eat(TokenKind::DefaultKw) {
        parse_expr(p);
    }
    p.expect(TokenKind::Semicolon);
    p.finish();
}

fn parse_type_decl(p: &mut Parser) {
    p.start(SyntaxKind::TypeDecl);
    p.bump(TokenKind::TypeKw);
    p.bump_any();
    p.expect(TokenKind::IsKw);
    parse_type_name(p);
    p.expect(TokenKind::Semicolon);
    p.finish();
}

fn parse_cursor_decl(p: &mut Parser) {
    p.start(SyntaxKind::CursorDecl);
    p.bump(TokenKind::CursorKw);
    p.bump_any();
    p.expect(TokenKind::IsKw);
    parse_select_stmt(p);
    p.expect(TokenKind::Semicolon);
    p.finish();
}

pub fn parse_param_list(p: &mut Parser) {
    p.start(SyntaxKind::ParamList);
    p.expect(TokenKind::LParen);
    if !p.at(TokenKind::RParen) {
        parse_param(p);
        while p.eat(TokenKind::Comma) {
            parse_param(p);
        }
    }
    p.expect(TokenKind::RParen);
    p.finish();
}

fn parse_param(p: &mut Parser) {
    p.start(SyntaxKind::Param);
    p.bump_any();
    while p.at_one_of(&[TokenKind::InKw, TokenKind::OutKw, TokenKind::NocopyKw]) {
        p.bump_any();
    }
    parse_type_name(p);
    if p.eat(TokenKind::DefaultKw) || p.eat(TokenKind::Assign) {
        parse_expr(p);
    }
    p.finish();
}

/// Consumes a datatype phrase: a scalar built-in, `%TYPE`/`%ROWTYPE`
/// attribute reference, or a `TABLE OF`/`VARRAY`/`RECORD` composite -- kept
/// as raw token text, classified into an [`crate::types::InlineType`] later
/// by the analyzer rather than structurally decomposed here.
pub fn parse_type_name(p: &mut Parser) {
    p.start(SyntaxKind::TypeName);
    bump_type_phrase(p);
    p.finish();
}

fn bump_type_phrase(p: &mut Parser) {
    match p.current() {
        TokenKind::TableKw => {
            p.bump(TokenKind::TableKw);
            p.expect(TokenKind::OfKw);
            bump_type_phrase(p);
            if p.eat(TokenKind::IndexKw) {
                p.expect(TokenKind::ByKw);
                bump_type_phrase(p);
            }
        }
        TokenKind::VarrayKw => {
            p.bump(TokenKind::VarrayKw);
            if p.eat(TokenKind::LParen) {
                p.expect(TokenKind::Integer);
                p.expect(TokenKind::RParen);
            }
            p.expect(TokenKind::OfKw);
            bump_type_phrase(p);
        }
        TokenKind::RecordKw => {
            p.bump(TokenKind::RecordKw);
            if p.eat(TokenKind::LParen) {
                loop {
                    if p.at_one_of(&[TokenKind::Ident, TokenKind::QuotedIdent]) {
                        p.bump_any();
                    }
                    bump_type_phrase(p);
                    if !p.eat(TokenKind::Comma) {
                        break;
                    }
                }
                p.expect(TokenKind::RParen);
            }
        }
        _ => bump_scalar_type_phrase(p),
    }
}

fn bump_scalar_type_phrase(p: &mut Parser) {
    if p.at_one_of(&[TokenKind::Ident, TokenKind::QuotedIdent]) {
        p.bump_any();
        while p.at(TokenKind::Dot) {
            p.bump(TokenKind::Dot);
            p.bump_any();
        }
    } else {
        p.bump_any();
    }

    if p.eat(TokenKind::LParen) {
        loop {
            p.expect(TokenKind::Integer);
            if !p.eat(TokenKind::Comma) {
                break;
            }
        }
        p.expect(TokenKind::RParen);
    }

    if p.eat(TokenKind::WithKw) {
        p.expect(TokenKind::TimeKw);
        p.expect(TokenKind::ZoneKw);
    }

    p.eat_one_of(&[TokenKind::PercentType, TokenKind::PercentRowtype]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstNode, DeclareSection, Root};

    fn parse_decls(input: &str) -> DeclareSection {
        let mut parser = Parser::new(input);
        parse_declare_section(&mut parser);
        let parse = parser.build();
        let root = Root::cast(parse.tree()).unwrap();
        root.syntax.children().find_map(DeclareSection::cast).unwrap()
    }

    #[test]
    fn variable_decl_with_default_is_captured() {
        let decls = parse_decls("v_count PLS_INTEGER := 0;");
        let vars = decls.variable_decls();
        assert_eq!(vars.len(), 1);
        assert!(vars[0].default_expr().is_some());
    }

    #[test]
    fn table_of_varchar2_index_by_is_a_single_type_name() {
        let decls = parse_decls("t_names TABLE OF VARCHAR2(100) INDEX BY PLS_INTEGER;");
        let vars = decls.variable_decls();
        assert!(vars[0].type_name().unwrap().text().contains("INDEX"));
    }
}
