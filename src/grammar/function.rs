// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! `CREATE [OR REPLACE] FUNCTION` grammar.

use crate::lexer::TokenKind;
use crate::parser::Parser;
use crate::syntax::SyntaxKind;

use super::block::parse_block;
use super::declare_section::{parse_param_list, parse_type_name};

pub fn parse_function(p: &mut Parser) {
    p.start(SyntaxKind::Function);
    if p.at(TokenKind::CreateKw) {
        super::create_prefix(p);
    }
    p.start(SyntaxKind::FunctionHeader);
    p.expect(TokenKind::FunctionKw);
    p.expect(TokenKind::Ident);
    if p.at(TokenKind::LParen) {
        parse_param_list(p);
    }
    p.expect(TokenKind::ReturnKw);
    parse_type_name(p);
    p.eat(TokenKind::DeterministicKw);
    p.finish();
    p.expect_one_of(&[TokenKind::IsKw, TokenKind::AsKw]);
    parse_block(p);
    p.finish();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstNode, Root};

    #[test]
    fn function_header_and_body_parse() {
        const INPUT: &str = r#"
            CREATE OR REPLACE FUNCTION calculate_bonus(p_salary NUMBER)
            RETURN NUMBER
            IS
            BEGIN
                RETURN p_salary * 0.1;
            END calculate_bonus;
        "#;
        let parse = super::super::parse_function_source(INPUT);
        assert!(parse.ok(), "unexpected parse errors: {:?}", parse.errors);
        let root = Root::cast(parse.tree()).unwrap();
        let function = root.function().unwrap();
        assert_eq!(function.name(), Some("calculate_bonus".to_owned()));
        assert_eq!(function.header().unwrap().param_list().unwrap().params().len(), 1);
    }
}
