// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! `CREATE [OR REPLACE] PACKAGE` / `PACKAGE BODY` grammar.

use crate::lexer::TokenKind;
use crate::parser::Parser;
use crate::syntax::SyntaxKind;

use super::block::{is_declare_section_start, parse_statements_until};
use super::declare_section::parse_declare_section;
use super::function::parse_function;
use super::procedure::parse_procedure;

pub fn parse_package_or_body(p: &mut Parser) {
    if p.at(TokenKind::CreateKw) {
        super::create_prefix(p);
    }
    p.expect(TokenKind::PackageKw);
    if p.eat(TokenKind::BodyKw) {
        parse_package_body(p);
    } else {
        parse_package_spec(p);
    }
}

fn parse_package_spec(p: &mut Parser) {
    p.start(SyntaxKind::Package);
    p.expect(TokenKind::Ident);
    p.expect_one_of(&[TokenKind::IsKw, TokenKind::AsKw]);
    if is_declare_section_start(p) {
        parse_declare_section(p);
    }
    // Subprogram signatures in a package spec carry no body; they're
    // skipped rather than modeled, since every callable is fully parsed
    // from the package body instead.
    p.until(TokenKind::EndKw);
    p.expect(TokenKind::EndKw);
    p.eat_one_of(&[TokenKind::Ident, TokenKind::QuotedIdent]);
    p.expect(TokenKind::Semicolon);
    p.finish();
}

fn parse_package_body(p: &mut Parser) {
    p.start(SyntaxKind::PackageBody);
    p.expect(TokenKind::Ident);
    p.expect_one_of(&[TokenKind::IsKw, TokenKind::AsKw]);
    if is_declare_section_start(p) {
        parse_declare_section(p);
    }
    loop {
        match p.current() {
            TokenKind::FunctionKw => parse_function(p),
            TokenKind::ProcedureKw => parse_procedure(p),
            _ => break,
        }
    }
    if p.eat(TokenKind::BeginKw) {
        parse_statements_until(p, &[TokenKind::EndKw]);
    }
    p.expect(TokenKind::EndKw);
    p.eat_one_of(&[TokenKind::Ident, TokenKind::QuotedIdent]);
    p.expect(TokenKind::Semicolon);
    p.finish();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstNode, Root};

    #[test]
    fn package_body_with_two_members_parses() {
        const INPUT: &str = r#"
            CREATE OR REPLACE PACKAGE BODY payroll IS
                g_rate NUMBER := 0.1;

                FUNCTION calculate_bonus(p_salary NUMBER) RETURN NUMBER IS
                BEGIN
                    RETURN p_salary * g_rate;
                END calculate_bonus;

                PROCEDURE log_message(p_text VARCHAR2) IS
                BEGIN
                    NULL;
                END log_message;
            END payroll;
        "#;
        let mut parser = Parser::new(INPUT);
        parse_package_or_body(&mut parser);
        let parse = parser.build();
        assert!(parse.ok(), "unexpected parse errors: {:?}", parse.errors);
        let root = Root::cast(parse.tree()).unwrap();
        let body = root.package_body().unwrap();
        assert_eq!(body.name(), Some("payroll".to_owned()));
        assert_eq!(body.functions().len(), 1);
        assert_eq!(body.procedures().len(), 1);
    }
}
