// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Parses the unified `IdentGroup [ArgumentList]` shape used for function
//! calls, collection element access and call/assignment targets alike.

use crate::lexer::TokenKind;
use crate::parser::Parser;
use crate::syntax::SyntaxKind;

use super::expressions::parse_expr;

/// A dotted chain of identifiers: `name`, `pkg.name`, `schema.pkg.name`.
pub fn parse_ident_group(p: &mut Parser) {
    p.start(SyntaxKind::IdentGroup);
    p.bump_any();
    while p.at(TokenKind::Dot) {
        p.bump(TokenKind::Dot);
        if p.at_one_of(&[TokenKind::Ident, TokenKind::QuotedIdent]) {
            p.bump_any();
        } else {
            p.expect(TokenKind::Ident);
        }
    }
    p.finish();
}

/// An [`IdentGroup`](crate::ast::IdentGroup) optionally followed by one
/// parenthesized argument list. The parser makes no attempt to decide
/// whether this is a function call, a collection element read or a
/// package-qualified bare name -- that's the analyzer's job.
pub fn parse_function_invocation(p: &mut Parser) {
    p.start(SyntaxKind::FunctionInvocation);
    parse_ident_group(p);
    if p.at(TokenKind::LParen) {
        parse_argument_list(p);
    }
    p.finish();
}

fn parse_argument_list(p: &mut Parser) {
    p.start(SyntaxKind::ArgumentList);
    p.bump(TokenKind::LParen);
    if !p.at(TokenKind::RParen) {
        parse_argument(p);
        while p.eat(TokenKind::Comma) {
            parse_argument(p);
        }
    }
    p.expect(TokenKind::RParen);
    p.finish();
}

fn parse_argument(p: &mut Parser) {
    p.start(SyntaxKind::Argument);
    parse_expr(p);
    p.finish();
}
