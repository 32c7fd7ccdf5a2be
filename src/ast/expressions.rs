// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Typed AST nodes for general SQL expressions.

use rowan::TextRange;

use super::{typed_syntax_node, AstNode, FunctionInvocation, Ident, Integer, Number, QuotedLiteral, SelectStmt};
use crate::syntax::{SyntaxKind, SyntaxToken};

typed_syntax_node!(Expression, BetweenExpr, CaseExpr, CaseWhenClause, WhereClause);

impl Expression {
    pub fn range(&self) -> TextRange {
        self.syntax.text_range()
    }

    /// The operator token directly under this node, if any -- arithmetic,
    /// comparison, logic or concatenation.
    pub fn operator(&self) -> Option<SyntaxToken> {
        self.syntax.children_with_tokens().filter_map(|it| it.into_token()).find(|t| {
            matches!(
                t.kind(),
                SyntaxKind::ArithmeticOp
                    | SyntaxKind::Asterisk
                    | SyntaxKind::Slash
                    | SyntaxKind::ComparisonOp
                    | SyntaxKind::LogicOp
                    | SyntaxKind::Concat
            )
        })
    }

    /// Sub-expressions directly nested under this one (the Pratt parser's
    /// operands).
    pub fn operands(&self) -> Vec<Expression> {
        self.syntax.children().filter_map(Expression::cast).collect()
    }

    pub fn function_invocation(&self) -> Option<FunctionInvocation> {
        self.syntax.children().find_map(FunctionInvocation::cast)
    }

    pub fn ident(&self) -> Option<Ident> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find_map(Ident::cast)
    }

    pub fn quoted_literal(&self) -> Option<QuotedLiteral> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find_map(QuotedLiteral::cast)
    }

    pub fn integer_literal(&self) -> Option<Integer> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find_map(Integer::cast)
    }

    pub fn number_literal(&self) -> Option<Number> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find_map(Number::cast)
    }

    pub fn text(&self) -> String {
        self.syntax.text().to_string()
    }

    /// A `SELECT` nested directly in this expression's parentheses, e.g.
    /// `(SELECT 1 FROM dual)` used as a scalar subquery operand.
    pub fn nested_select(&self) -> Option<SelectStmt> {
        self.syntax.children().find_map(SelectStmt::cast)
    }

    pub fn between_expr(&self) -> Option<BetweenExpr> {
        self.syntax.children().find_map(BetweenExpr::cast)
    }

    pub fn case_expr(&self) -> Option<CaseExpr> {
        self.syntax.children().find_map(CaseExpr::cast)
    }
}

impl CaseExpr {
    pub fn when_clauses(&self) -> Vec<CaseWhenClause> {
        self.syntax.children().filter_map(CaseWhenClause::cast).collect()
    }

    pub fn else_expr(&self) -> Option<Expression> {
        self.syntax.children().filter_map(Expression::cast).last()
    }
}

impl CaseWhenClause {
    pub fn condition(&self) -> Option<Expression> {
        self.syntax.children().filter_map(Expression::cast).next()
    }

    pub fn result(&self) -> Option<Expression> {
        self.syntax.children().filter_map(Expression::cast).nth(1)
    }
}

/// `operand BETWEEN low AND high`, parsed as a dedicated three-operand node
/// rather than forced into the binary `Expression`/`operator()` shape.
impl BetweenExpr {
    pub fn operand(&self) -> Option<Expression> {
        self.syntax.children().filter_map(Expression::cast).next()
    }

    pub fn low(&self) -> Option<Expression> {
        self.syntax.children().filter_map(Expression::cast).nth(1)
    }

    pub fn high(&self) -> Option<Expression> {
        self.syntax.children().filter_map(Expression::cast).nth(2)
    }
}

impl WhereClause {
    pub fn condition(&self) -> Option<Expression> {
        self.syntax.children().find_map(Expression::cast)
    }
}
