// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Pratt (operator-precedence) expression parsing.
//!
//! Grounded in:
//! * <https://matklad.github.io/2020/04/13/simple-but-powerful-pratt-parsing.html>
//! * <https://arzg.github.io/lang/10/>

use crate::lexer::TokenKind;
use crate::parser::{ParseErrorType, Parser};
use crate::syntax::SyntaxKind;

use super::function_invocation::parse_function_invocation;
use super::query::parse_select_stmt;

const PREFIX_BP: u8 = 13;

fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8)> {
    match kind {
        TokenKind::OrKw => Some((1, 2)),
        TokenKind::AndKw => Some((3, 4)),
        TokenKind::Eq
        | TokenKind::Neq
        | TokenKind::Le
        | TokenKind::Ge
        | TokenKind::Lt
        | TokenKind::Gt
        | TokenKind::LikeKw
        | TokenKind::BetweenKw => Some((5, 6)),
        TokenKind::Concat => Some((7, 8)),
        TokenKind::Plus | TokenKind::Minus => Some((9, 10)),
        TokenKind::Asterisk | TokenKind::Slash => Some((11, 12)),
        _ => None,
    }
}

/// Parses one expression, wrapping it in an `Expression` node.
pub fn parse_expr(p: &mut Parser) {
    expr_bp(p, 0);
}

fn expr_bp(p: &mut Parser, min_bp: u8) {
    let checkpoint = p.checkpoint();
    parse_primary(p);

    loop {
        let kind = p.current();

        if kind == TokenKind::BetweenKw {
            let (l_bp, _) = infix_binding_power(kind).expect("BetweenKw has a binding power");
            if l_bp < min_bp {
                break;
            }
            p.bump(TokenKind::BetweenKw);
            expr_bp(p, l_bp + 1);
            p.expect(TokenKind::AndKw);
            expr_bp(p, l_bp + 1);
            p.start_node_at(checkpoint, SyntaxKind::BetweenExpr);
            p.finish();
            // Every expression position expects an `Expression` node to cast
            // to, so the dedicated three-operand node is itself wrapped --
            // the same way `CaseExpr` is nested inside one below.
            p.start_node_at(checkpoint, SyntaxKind::Expression);
            p.finish();
            continue;
        }

        let Some((l_bp, r_bp)) = infix_binding_power(kind) else {
            break;
        };
        if l_bp < min_bp {
            break;
        }

        p.bump_any();
        expr_bp(p, r_bp);
        p.start_node_at(checkpoint, SyntaxKind::Expression);
        p.finish();
    }
}

fn parse_primary(p: &mut Parser) {
    match p.current() {
        TokenKind::Integer
        | TokenKind::Number
        | TokenKind::QuotedLiteral
        | TokenKind::TrueKw
        | TokenKind::FalseKw
        | TokenKind::NullKw => {
            p.start(SyntaxKind::Expression);
            p.bump_any();
            p.finish();
        }

        TokenKind::LParen => {
            p.start(SyntaxKind::Expression);
            p.bump(TokenKind::LParen);
            if p.at(TokenKind::SelectKw) {
                // Scalar subquery nested in an expression position, e.g.
                // `x + (SELECT 1 FROM dual)`.
                parse_select_stmt(p);
            } else {
                expr_bp(p, 0);
            }
            p.expect(TokenKind::RParen);
            p.finish();
        }

        TokenKind::Minus | TokenKind::NotKw => {
            p.start(SyntaxKind::Expression);
            p.bump_any();
            expr_bp(p, PREFIX_BP);
            p.finish();
        }

        TokenKind::CaseKw => parse_case_expr(p),

        TokenKind::Ident | TokenKind::QuotedIdent => {
            p.start(SyntaxKind::Expression);
            parse_function_invocation(p);
            p.finish();
        }

        other => {
            p.start(SyntaxKind::Expression);
            p.error(ParseErrorType::UnsupportedSyntax(format!(
                "expected an expression, found {other:?}"
            )));
            if !p.at(TokenKind::Eof) {
                p.bump_any();
            }
            p.finish();
        }
    }
}

fn parse_case_expr(p: &mut Parser) {
    p.start(SyntaxKind::Expression);
    p.start(SyntaxKind::CaseExpr);
    p.bump(TokenKind::CaseKw);

    if !p.at(TokenKind::WhenKw) {
        expr_bp(p, 0);
    }

    while p.at(TokenKind::WhenKw) {
        p.start(SyntaxKind::CaseWhenClause);
        p.bump(TokenKind::WhenKw);
        expr_bp(p, 0);
        p.expect(TokenKind::ThenKw);
        expr_bp(p, 0);
        p.finish();
    }

    if p.eat(TokenKind::ElseKw) {
        expr_bp(p, 0);
    }

    p.expect(TokenKind::EndKw);
    p.finish();
    p.finish();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstNode, Expression};
    use crate::syntax::SyntaxNode;

    fn parse_expr_tree(input: &str) -> SyntaxNode {
        let mut parser = Parser::new(input);
        parse_expr(&mut parser);
        parser.build().tree()
    }

    #[test]
    fn precedence_binds_multiplication_tighter_than_addition() {
        let tree = parse_expr_tree("1 + 2 * 3");
        let root_expr = tree.children().find_map(Expression::cast).unwrap();
        assert_eq!(root_expr.operator().unwrap().text(), "+");
        let operands = root_expr.operands();
        assert_eq!(operands.len(), 2);
        assert_eq!(operands[1].operator().unwrap().text(), "*");
    }

    #[test]
    fn between_expr_is_a_dedicated_node() {
        let tree = parse_expr_tree("n BETWEEN 1 AND 10");
        assert!(tree
            .descendants()
            .any(|node| node.kind() == SyntaxKind::BetweenExpr));
    }

    #[test]
    fn bare_function_call_has_no_argument_list() {
        let tree = parse_expr_tree("SYSDATE");
        let expr = tree.children().find_map(Expression::cast).unwrap();
        assert!(!expr.function_invocation().unwrap().has_argument_list());
    }
}
