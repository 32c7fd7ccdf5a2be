// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Hand-written recursive-descent grammar rules driving [`crate::parser`] to
//! build the concrete syntax tree. Each submodule owns one corner of the
//! grammar and exposes `parse_*` entry points that leave the parser
//! positioned right after the construct they consumed.

pub mod block;
pub mod declare_section;
pub mod expressions;
pub mod function;
pub mod function_invocation;
pub mod package;
pub mod procedure;
pub mod query;

use crate::lexer::TokenKind;
use crate::parser::{Parse, ParseErrorType, Parser};

pub use function_invocation::parse_function_invocation;

/// Parses a standalone source unit, dispatching on its leading keywords.
/// Accepts a bare `BEGIN ... END;` anonymous block too, which the analyzer
/// treats as a top-level statement list with no header.
pub fn parse(input: &str) -> Parse {
    let mut parser = Parser::new(input);
    parse_unit(&mut parser);
    parser.build()
}

pub fn parse_function_source(input: &str) -> Parse {
    let mut parser = Parser::new(input);
    function::parse_function(&mut parser);
    parser.build()
}

pub fn parse_procedure_source(input: &str) -> Parse {
    let mut parser = Parser::new(input);
    procedure::parse_procedure(&mut parser);
    parser.build()
}

pub fn parse_package_source(input: &str) -> Parse {
    let mut parser = Parser::new(input);
    package::parse_package_or_body(&mut parser);
    parser.build()
}

fn parse_unit(p: &mut Parser) {
    match (p.current(), p.nth(1)) {
        (TokenKind::CreateKw, _) => parse_create_unit(p),
        (TokenKind::BeginKw, _) | (TokenKind::DeclareKw, _) => block::parse_block(p),
        (TokenKind::SelectKw, _) => {
            query::parse_select_stmt(p);
            p.eat(TokenKind::Semicolon);
        }
        (other, _) => {
            p.error(ParseErrorType::UnsupportedSyntax(format!("{other:?}")));
        }
    }
}

fn parse_create_unit(p: &mut Parser) {
    // CREATE [OR REPLACE] [EDITIONABLE] FUNCTION|PROCEDURE|PACKAGE [BODY] ...
    let mut i = 1;
    while matches!(
        p.nth(i),
        Some(TokenKind::OrKw) | Some(TokenKind::ReplaceKw) | Some(TokenKind::EditionableKw)
    ) {
        i += 1;
    }
    match p.nth(i) {
        Some(TokenKind::FunctionKw) => function::parse_function(p),
        Some(TokenKind::ProcedureKw) => procedure::parse_procedure(p),
        Some(TokenKind::PackageKw) => package::parse_package_or_body(p),
        _ => {
            p.error(ParseErrorType::UnsupportedSyntax(
                "expected FUNCTION, PROCEDURE or PACKAGE after CREATE".to_owned(),
            ));
        }
    }
}

/// Consumes the `CREATE [OR REPLACE] [EDITIONABLE]` prefix shared by every
/// kind of standalone unit.
fn bump_create_prefix(p: &mut Parser) {
    p.bump(TokenKind::CreateKw);
    if p.eat(TokenKind::OrKw) {
        p.expect(TokenKind::ReplaceKw);
    }
    p.eat(TokenKind::EditionableKw);
}

pub(crate) use bump_create_prefix as create_prefix;
