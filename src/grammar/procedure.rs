// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! `CREATE [OR REPLACE] PROCEDURE` grammar.

use crate::lexer::TokenKind;
use crate::parser::Parser;
use crate::syntax::SyntaxKind;

use super::block::parse_block;
use super::declare_section::parse_param_list;

pub fn parse_procedure(p: &mut Parser) {
    p.start(SyntaxKind::Procedure);
    if p.at(TokenKind::CreateKw) {
        super::create_prefix(p);
    }
    p.start(SyntaxKind::ProcedureHeader);
    p.expect(TokenKind::ProcedureKw);
    p.expect(TokenKind::Ident);
    if p.at(TokenKind::LParen) {
        parse_param_list(p);
    }
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
    fn procedure_header_and_body_parse() {
        const INPUT: &str = r#"
            CREATE OR REPLACE PROCEDURE log_message(p_text VARCHAR2)
            IS
            BEGIN
                NULL;
            END log_message;
        "#;
        let mut parser = Parser::new(INPUT);
        parse_procedure(&mut parser);
        let parse = parser.build();
        assert!(parse.ok(), "unexpected parse errors: {:?}", parse.errors);
        let root = Root::cast(parse.tree()).unwrap();
        let procedure = root.procedure().unwrap();
        assert_eq!(procedure.name(), Some("log_message".to_owned()));
    }
}
