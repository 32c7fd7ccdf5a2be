// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Statement grammar: the `DECLARE ... BEGIN ... EXCEPTION ... END` block
//! body shared by functions, procedures and nested blocks, and every
//! statement kind it can contain.

use crate::lexer::TokenKind;
use crate::parser::{ParseErrorType, Parser};
use crate::syntax::SyntaxKind;

use super::declare_section::parse_declare_section;
use super::expressions::parse_expr;
use super::function_invocation::{parse_function_invocation, parse_ident_group};
use super::query::parse_select_stmt;

/// Parses `[DECLARE] [decls] BEGIN stmts [EXCEPTION handlers] END [name];`.
/// Function/procedure bodies call this directly after their header (no
/// leading `DECLARE` keyword); nested blocks spell it out explicitly.
pub fn parse_block(p: &mut Parser) {
    p.start(SyntaxKind::Block);
    p.eat(TokenKind::DeclareKw);
    if is_declare_section_start(p) {
        parse_declare_section(p);
    }
    p.expect(TokenKind::BeginKw);
    parse_statements_until(p, &[TokenKind::ExceptionKw, TokenKind::EndKw]);
    if p.at(TokenKind::ExceptionKw) {
        parse_exception_section(p);
    }
    p.expect(TokenKind::EndKw);
    p.eat_one_of(&[TokenKind::Ident, TokenKind::QuotedIdent]);
    p.expect(TokenKind::Semicolon);
    p.finish();
}

pub(crate) fn is_declare_section_start(p: &Parser) -> bool {
    p.at_one_of(&[
        TokenKind::Ident,
        TokenKind::QuotedIdent,
        TokenKind::CursorKw,
        TokenKind::TypeKw,
    ])
}

pub(crate) fn parse_statements_until(p: &mut Parser, stop: &[TokenKind]) {
    while !p.at_one_of(stop) && !p.at(TokenKind::Eof) {
        parse_statement(p);
    }
}

fn parse_statement(p: &mut Parser) {
    p.start(SyntaxKind::BlockStatement);
    match p.current() {
        TokenKind::IfKw => parse_if_stmt(p),
        TokenKind::LoopKw => parse_loop_stmt(p),
        TokenKind::WhileKw => parse_while_loop_stmt(p),
        TokenKind::ForKw => {
            if is_cursor_for_loop(p) {
                parse_cursor_for_loop_stmt(p);
            } else {
                parse_for_loop_stmt(p);
            }
        }
        TokenKind::ReturnKw => parse_return_stmt(p),
        TokenKind::ExitKw => parse_exit_stmt(p),
        TokenKind::CaseKw => parse_case_stmt(p),
        TokenKind::NullKw => parse_null_stmt(p),
        TokenKind::RaiseKw => parse_raise_stmt(p),
        TokenKind::CommitKw => parse_commit_stmt(p),
        TokenKind::RollbackKw => parse_rollback_stmt(p),
        TokenKind::BeginKw | TokenKind::DeclareKw => parse_block(p),
        TokenKind::SelectKw => {
            parse_select_stmt(p);
            p.expect(TokenKind::Semicolon);
        }
        TokenKind::Ident | TokenKind::QuotedIdent => parse_assign_or_call_stmt(p),
        other => {
            p.error(ParseErrorType::ExpectedStatement(other));
            p.until(TokenKind::Semicolon);
            p.eat(TokenKind::Semicolon);
        }
    }
    p.finish();
}

/// Looks past an `IdentGroup` (and one balanced `(...)`, for element
/// access) to see whether a `:=` follows -- the only thing that
/// distinguishes an assignment target from a call statement's name.
fn is_assignment_ahead(p: &Parser) -> bool {
    let mut i = 1;
    loop {
        match p.nth(i) {
            Some(TokenKind::Dot) => i += 2,
            Some(TokenKind::LParen) => {
                let mut depth = 1;
                i += 1;
                while depth > 0 {
                    match p.nth(i) {
                        Some(TokenKind::LParen) => depth += 1,
                        Some(TokenKind::RParen) => depth -= 1,
                        None => break,
                        _ => {}
                    }
                    i += 1;
                }
                break;
            }
            _ => break,
        }
    }
    p.nth(i) == Some(TokenKind::Assign)
}

fn parse_assign_or_call_stmt(p: &mut Parser) {
    if is_assignment_ahead(p) {
        parse_assign_stmt(p);
    } else {
        parse_call_stmt(p);
    }
}

fn parse_assign_stmt(p: &mut Parser) {
    p.start(SyntaxKind::AssignStmt);
    parse_ident_group(p);
    if p.eat(TokenKind::LParen) {
        parse_expr(p);
        p.expect(TokenKind::RParen);
    }
    p.expect(TokenKind::Assign);
    parse_expr(p);
    p.expect(TokenKind::Semicolon);
    p.finish();
}

fn parse_call_stmt(p: &mut Parser) {
    p.start(SyntaxKind::CallStmt);
    parse_function_invocation(p);
    if p.eat(TokenKind::IntoKw) {
        p.expect(TokenKind::Ident);
    }
    p.expect(TokenKind::Semicolon);
    p.finish();
}

fn parse_if_stmt(p: &mut Parser) {
    p.start(SyntaxKind::IfStmt);
    p.bump(TokenKind::IfKw);
    parse_expr(p);
    p.expect(TokenKind::ThenKw);
    parse_statements_until(p, &[TokenKind::ElsifKw, TokenKind::ElseKw, TokenKind::EndKw]);
    while p.at(TokenKind::ElsifKw) {
        p.start(SyntaxKind::ElsifClause);
        p.bump(TokenKind::ElsifKw);
        parse_expr(p);
        p.expect(TokenKind::ThenKw);
        parse_statements_until(p, &[TokenKind::ElsifKw, TokenKind::ElseKw, TokenKind::EndKw]);
        p.finish();
    }
    if p.eat(TokenKind::ElseKw) {
        parse_statements_until(p, &[TokenKind::EndKw]);
    }
    p.expect(TokenKind::EndKw);
    p.expect(TokenKind::IfKw);
    p.expect(TokenKind::Semicolon);
    p.finish();
}

fn parse_loop_stmt(p: &mut Parser) {
    p.start(SyntaxKind::LoopStmt);
    p.bump(TokenKind::LoopKw);
    parse_statements_until(p, &[TokenKind::EndKw]);
    p.expect(TokenKind::EndKw);
    p.expect(TokenKind::LoopKw);
    p.expect(TokenKind::Semicolon);
    p.finish();
}

fn parse_while_loop_stmt(p: &mut Parser) {
    p.start(SyntaxKind::WhileLoopStmt);
    p.bump(TokenKind::WhileKw);
    parse_expr(p);
    p.expect(TokenKind::LoopKw);
    parse_statements_until(p, &[TokenKind::EndKw]);
    p.expect(TokenKind::EndKw);
    p.expect(TokenKind::LoopKw);
    p.expect(TokenKind::Semicolon);
    p.finish();
}

fn is_cursor_for_loop(p: &Parser) -> bool {
    match p.nth(3) {
        Some(TokenKind::LParen) | Some(TokenKind::SelectKw) => true,
        Some(TokenKind::Ident) | Some(TokenKind::QuotedIdent) => p.nth(4) == Some(TokenKind::LoopKw),
        _ => false,
    }
}

fn parse_cursor_for_loop_stmt(p: &mut Parser) {
    p.start(SyntaxKind::CursorForLoopStmt);
    p.bump(TokenKind::ForKw);
    p.bump_any();
    p.expect(TokenKind::InKw);
    if p.at(TokenKind::LParen) {
        p.bump(TokenKind::LParen);
        parse_select_stmt(p);
        p.expect(TokenKind::RParen);
    } else if p.at(TokenKind::SelectKw) {
        parse_select_stmt(p);
    } else {
        parse_ident_group(p);
    }
    p.expect(TokenKind::LoopKw);
    parse_statements_until(p, &[TokenKind::EndKw]);
    p.expect(TokenKind::EndKw);
    p.expect(TokenKind::LoopKw);
    p.expect(TokenKind::Semicolon);
    p.finish();
}

fn parse_for_loop_stmt(p: &mut Parser) {
    p.start(SyntaxKind::ForLoopStmt);
    p.bump(TokenKind::ForKw);
    p.bump_any();
    p.expect(TokenKind::InKw);
    p.eat(TokenKind::ReverseKw);
    parse_expr(p);
    p.expect(TokenKind::Dot);
    p.expect(TokenKind::Dot);
    parse_expr(p);
    p.expect(TokenKind::LoopKw);
    parse_statements_until(p, &[TokenKind::EndKw]);
    p.expect(TokenKind::EndKw);
    p.expect(TokenKind::LoopKw);
    p.expect(TokenKind::Semicolon);
    p.finish();
}

fn parse_return_stmt(p: &mut Parser) {
    p.start(SyntaxKind::ReturnStmt);
    p.bump(TokenKind::ReturnKw);
    if !p.at(TokenKind::Semicolon) {
        parse_expr(p);
    }
    p.expect(TokenKind::Semicolon);
    p.finish();
}

fn parse_exit_stmt(p: &mut Parser) {
    p.start(SyntaxKind::ExitStmt);
    p.bump(TokenKind::ExitKw);
    if p.eat(TokenKind::WhenKw) {
        parse_expr(p);
    }
    p.expect(TokenKind::Semicolon);
    p.finish();
}

fn parse_case_stmt(p: &mut Parser) {
    p.start(SyntaxKind::CaseStmt);
    p.bump(TokenKind::CaseKw);
    if !p.at(TokenKind::WhenKw) {
        parse_expr(p);
    }
    while p.at(TokenKind::WhenKw) {
        p.start(SyntaxKind::CaseWhenClause);
        p.bump(TokenKind::WhenKw);
        parse_expr(p);
        p.expect(TokenKind::ThenKw);
        parse_statements_until(p, &[TokenKind::WhenKw, TokenKind::ElseKw, TokenKind::EndKw]);
        p.finish();
    }
    if p.eat(TokenKind::ElseKw) {
        parse_statements_until(p, &[TokenKind::EndKw]);
    }
    p.expect(TokenKind::EndKw);
    p.expect(TokenKind::CaseKw);
    p.expect(TokenKind::Semicolon);
    p.finish();
}

fn parse_null_stmt(p: &mut Parser) {
    p.start(SyntaxKind::NullStmt);
    p.bump(TokenKind::NullKw);
    p.expect(TokenKind::Semicolon);
    p.finish();
}

fn parse_raise_stmt(p: &mut Parser) {
    p.start(SyntaxKind::RaiseStmt);
    p.bump(TokenKind::RaiseKw);
    if p.at_one_of(&[TokenKind::Ident, TokenKind::QuotedIdent]) {
        parse_ident_group(p);
    }
    p.expect(TokenKind::Semicolon);
    p.finish();
}

fn parse_commit_stmt(p: &mut Parser) {
    p.start(SyntaxKind::CommitStmt);
    p.bump(TokenKind::CommitKw);
    p.expect(TokenKind::Semicolon);
    p.finish();
}

fn parse_rollback_stmt(p: &mut Parser) {
    p.start(SyntaxKind::RollbackStmt);
    p.bump(TokenKind::RollbackKw);
    p.expect(TokenKind::Semicolon);
    p.finish();
}

fn parse_exception_section(p: &mut Parser) {
    p.start(SyntaxKind::ExceptionSection);
    p.bump(TokenKind::ExceptionKw);
    while p.at(TokenKind::WhenKw) {
        p.start(SyntaxKind::ExceptionHandler);
        p.bump(TokenKind::WhenKw);
        parse_ident_group(p);
        while p.eat(TokenKind::OrKw) {
            parse_ident_group(p);
        }
        p.expect(TokenKind::ThenKw);
        parse_statements_until(p, &[TokenKind::WhenKw, TokenKind::EndKw]);
        p.finish();
    }
    p.finish();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstNode, Block, Root};

    fn parse(input: &str) -> Block {
        let mut parser = Parser::new(input);
        parse_block(&mut parser);
        let parse = parser.build();
        assert!(parse.ok(), "unexpected parse errors: {:?}", parse.errors);
        let root = Root::cast(parse.tree()).unwrap();
        root.syntax.children().find_map(Block::cast).unwrap()
    }

    #[test]
    fn assignment_vs_call_are_disambiguated_by_lookahead() {
        let block = parse(
            r#"
            BEGIN
                v_total := 0;
                log_message('started');
            END;
            "#,
        );
        let stmts = block.statements();
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].assign_stmt().is_some());
        assert!(stmts[1].call_stmt().is_some());
    }

    #[test]
    fn package_qualified_assignment_target_is_recognized() {
        let block = parse(
            r#"
            BEGIN
                pkg_state.counter := pkg_state.counter + 1;
            END;
            "#,
        );
        let stmt = &block.statements()[0];
        let assign = stmt.assign_stmt().unwrap();
        assert_eq!(assign.target().unwrap().segments(), vec!["pkg_state", "counter"]);
    }

    #[test]
    fn if_elsif_else_chain_parses() {
        let block = parse(
            r#"
            BEGIN
                IF v_x > 0 THEN
                    NULL;
                ELSIF v_x < 0 THEN
                    NULL;
                ELSE
                    NULL;
                END IF;
            END;
            "#,
        );
        let stmt = &block.statements()[0];
        let if_stmt = stmt.if_stmt().unwrap();
        assert_eq!(if_stmt.elsif_clauses().len(), 1);
    }

    #[test]
    fn cursor_for_loop_over_named_cursor_is_recognized() {
        let block = parse(
            r#"
            BEGIN
                FOR r IN emp_cursor LOOP
                    NULL;
                END LOOP;
            END;
            "#,
        );
        let stmt = &block.statements()[0];
        let loop_stmt = stmt.cursor_for_loop_stmt().unwrap();
        assert!(loop_stmt.named_cursor().is_some());
    }

    #[test]
    fn return_statement_carries_its_value() {
        let block = parse(
            r#"
            BEGIN
                RETURN p_salary * 0.1;
            END;
            "#,
        );
        let stmt = &block.statements()[0];
        assert!(stmt.return_stmt().unwrap().value().is_some());
    }

    #[test]
    fn numeric_for_loop_range_parses() {
        let block = parse(
            r#"
            BEGIN
                FOR i IN 1..10 LOOP
                    NULL;
                END LOOP;
            END;
            "#,
        );
        let stmt = &block.statements()[0];
        assert!(stmt.for_loop_stmt().is_some());
    }
}
