// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Typed AST nodes for blocks and statements.

use super::{
    typed_syntax_node, AstNode, CaseWhenClause, DeclareSection, Expression, FunctionInvocation,
    Ident, IdentGroup,
};

typed_syntax_node!(
    Block,
    BlockStatement,
    AssignStmt,
    CallStmt,
    ReturnStmt,
    IfStmt,
    ElsifClause,
    LoopStmt,
    ForLoopStmt,
    WhileLoopStmt,
    CursorForLoopStmt,
    ExitStmt,
    CaseStmt,
    RaiseStmt,
    NullStmt,
    CommitStmt,
    RollbackStmt,
    ExceptionSection,
    ExceptionHandler,
);

impl Block {
    pub fn declare_section(&self) -> Option<DeclareSection> {
        self.syntax.children().find_map(DeclareSection::cast)
    }

    pub fn statements(&self) -> Vec<BlockStatement> {
        self.syntax.children().filter_map(BlockStatement::cast).collect()
    }

    pub fn exception_section(&self) -> Option<ExceptionSection> {
        self.syntax.children().find_map(ExceptionSection::cast)
    }
}

impl BlockStatement {
    pub fn assign_stmt(&self) -> Option<AssignStmt> {
        self.syntax.children().find_map(AssignStmt::cast)
    }

    pub fn call_stmt(&self) -> Option<CallStmt> {
        self.syntax.children().find_map(CallStmt::cast)
    }

    pub fn return_stmt(&self) -> Option<ReturnStmt> {
        self.syntax.children().find_map(ReturnStmt::cast)
    }

    pub fn if_stmt(&self) -> Option<IfStmt> {
        self.syntax.children().find_map(IfStmt::cast)
    }

    pub fn loop_stmt(&self) -> Option<LoopStmt> {
        self.syntax.children().find_map(LoopStmt::cast)
    }

    pub fn for_loop_stmt(&self) -> Option<ForLoopStmt> {
        self.syntax.children().find_map(ForLoopStmt::cast)
    }

    pub fn while_loop_stmt(&self) -> Option<WhileLoopStmt> {
        self.syntax.children().find_map(WhileLoopStmt::cast)
    }

    pub fn cursor_for_loop_stmt(&self) -> Option<CursorForLoopStmt> {
        self.syntax.children().find_map(CursorForLoopStmt::cast)
    }

    pub fn block(&self) -> Option<Block> {
        self.syntax.children().find_map(Block::cast)
    }

    pub fn nested_select(&self) -> Option<super::SelectStmt> {
        self.syntax.children().find_map(super::SelectStmt::cast)
    }

    pub fn exit_stmt(&self) -> Option<ExitStmt> {
        self.syntax.children().find_map(ExitStmt::cast)
    }

    pub fn case_stmt(&self) -> Option<CaseStmt> {
        self.syntax.children().find_map(CaseStmt::cast)
    }

    pub fn raise_stmt(&self) -> Option<RaiseStmt> {
        self.syntax.children().find_map(RaiseStmt::cast)
    }

    pub fn null_stmt(&self) -> Option<NullStmt> {
        self.syntax.children().find_map(NullStmt::cast)
    }

    pub fn commit_stmt(&self) -> Option<CommitStmt> {
        self.syntax.children().find_map(CommitStmt::cast)
    }

    pub fn rollback_stmt(&self) -> Option<RollbackStmt> {
        self.syntax.children().find_map(RollbackStmt::cast)
    }
}

/// Either a simple `v := expr;` or a dotted `pkg.var := expr;` /
/// `v(idx) := expr;` target -- the parser stores the target as an
/// [`IdentGroup`], matching the unified [`FunctionInvocation`] reuse for
/// collection-element writes.
impl AssignStmt {
    pub fn target(&self) -> Option<IdentGroup> {
        self.syntax.children().find_map(IdentGroup::cast)
    }

    /// Present when the target is `v(idx) := expr`, i.e. a collection
    /// element or map-key write.
    pub fn index_expr(&self) -> Option<Expression> {
        self.syntax.children().find_map(Expression::cast)
    }

    pub fn value(&self) -> Option<Expression> {
        self.syntax.children().filter_map(Expression::cast).last()
    }
}

impl ReturnStmt {
    pub fn value(&self) -> Option<Expression> {
        self.syntax.children().find_map(Expression::cast)
    }
}

impl CallStmt {
    pub fn invocation(&self) -> Option<FunctionInvocation> {
        self.syntax.children().find_map(FunctionInvocation::cast)
    }

    /// Present for `f(args) INTO v;` call forms.
    pub fn into_target(&self) -> Option<Ident> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter_map(Ident::cast)
            .last()
    }
}

impl IfStmt {
    pub fn condition(&self) -> Option<Expression> {
        self.syntax.children().find_map(Expression::cast)
    }

    /// Statements before the first `ELSIF`/`ELSE`/`END IF`. `ELSE`'s
    /// statements have no wrapping node of their own (unlike `ELSIF`'s), so
    /// they sit as flat `BlockStatement` children right alongside these --
    /// told apart only by position relative to the `ELSE` token.
    pub fn then_branch(&self) -> Vec<BlockStatement> {
        let cutoff = self.else_token_end();
        self.syntax
            .children()
            .filter_map(BlockStatement::cast)
            .filter(|s| cutoff.map_or(true, |end| s.syntax.text_range().start() < end))
            .collect()
    }

    pub fn elsif_clauses(&self) -> Vec<ElsifClause> {
        self.syntax.children().filter_map(ElsifClause::cast).collect()
    }

    /// Statements after a trailing `ELSE`, when present.
    pub fn else_branch(&self) -> Vec<BlockStatement> {
        let Some(end) = self.else_token_end() else { return Vec::new() };
        self.syntax
            .children()
            .filter_map(BlockStatement::cast)
            .filter(|s| s.syntax.text_range().start() >= end)
            .collect()
    }

    fn else_token_end(&self) -> Option<rowan::TextSize> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| t.text().eq_ignore_ascii_case("else"))
            .map(|t| t.text_range().end())
    }
}

impl ElsifClause {
    pub fn condition(&self) -> Option<Expression> {
        self.syntax.children().find_map(Expression::cast)
    }

    pub fn branch(&self) -> Vec<BlockStatement> {
        self.syntax.children().filter_map(BlockStatement::cast).collect()
    }
}

impl LoopStmt {
    pub fn body(&self) -> Vec<BlockStatement> {
        self.syntax.children().filter_map(BlockStatement::cast).collect()
    }
}

impl WhileLoopStmt {
    pub fn condition(&self) -> Option<Expression> {
        self.syntax.children().find_map(Expression::cast)
    }

    pub fn body(&self) -> Vec<BlockStatement> {
        self.syntax.children().filter_map(BlockStatement::cast).collect()
    }
}

impl ForLoopStmt {
    pub fn loop_var(&self) -> Option<Ident> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter_map(Ident::cast)
            .next()
    }

    pub fn range_start(&self) -> Option<Expression> {
        self.syntax.children().filter_map(Expression::cast).next()
    }

    pub fn range_end(&self) -> Option<Expression> {
        self.syntax.children().filter_map(Expression::cast).nth(1)
    }

    pub fn is_reverse(&self) -> bool {
        self.syntax.text().to_string().to_uppercase().contains("REVERSE")
    }

    pub fn body(&self) -> Vec<BlockStatement> {
        self.syntax.children().filter_map(BlockStatement::cast).collect()
    }
}

impl CursorForLoopStmt {
    pub fn loop_var(&self) -> Option<Ident> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter_map(Ident::cast)
            .next()
    }

    pub fn query(&self) -> Option<super::SelectStmt> {
        self.syntax.children().find_map(super::SelectStmt::cast)
    }

    /// Present instead of [`Self::query`] for `FOR r IN my_cursor LOOP`,
    /// where the loop iterates a cursor declared elsewhere rather than an
    /// inline `SELECT`.
    pub fn named_cursor(&self) -> Option<IdentGroup> {
        self.syntax.children().find_map(IdentGroup::cast)
    }

    pub fn body(&self) -> Vec<BlockStatement> {
        self.syntax.children().filter_map(BlockStatement::cast).collect()
    }
}

impl ExitStmt {
    pub fn condition(&self) -> Option<Expression> {
        self.syntax.children().find_map(Expression::cast)
    }
}

impl RaiseStmt {
    pub fn exception_name(&self) -> Option<IdentGroup> {
        self.syntax.children().find_map(IdentGroup::cast)
    }
}

impl CaseStmt {
    pub fn selector(&self) -> Option<Expression> {
        self.syntax.children().find_map(Expression::cast)
    }

    pub fn when_clauses(&self) -> Vec<CaseWhenClause> {
        self.syntax.children().filter_map(CaseWhenClause::cast).collect()
    }

    /// Statements after a trailing `ELSE`, i.e. the statements directly
    /// under `CaseStmt` that don't belong to any `CaseWhenClause`.
    pub fn else_branch(&self) -> Vec<BlockStatement> {
        self.syntax.children().filter_map(BlockStatement::cast).collect()
    }
}

impl CaseWhenClause {
    /// Statement-form body, used when this clause belongs to a [`CaseStmt`]
    /// rather than a `CASE` expression.
    pub fn body_statements(&self) -> Vec<BlockStatement> {
        self.syntax.children().filter_map(BlockStatement::cast).collect()
    }
}

impl ExceptionSection {
    pub fn handlers(&self) -> Vec<ExceptionHandler> {
        self.syntax.children().filter_map(ExceptionHandler::cast).collect()
    }
}

impl ExceptionHandler {
    pub fn exception_names(&self) -> Vec<IdentGroup> {
        self.syntax.children().filter_map(IdentGroup::cast).collect()
    }

    pub fn body(&self) -> Vec<BlockStatement> {
        self.syntax.children().filter_map(BlockStatement::cast).collect()
    }
}
