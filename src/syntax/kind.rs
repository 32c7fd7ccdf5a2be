// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Hand-maintained `SyntaxKind` -- there is no toolchain here to run a
//! `build.rs` codegen step against, so this enum and its `TokenKind`
//! mapping are written and kept in sync by hand instead of generated.
//!
//! See also:
//! * <https://blog.kiranshila.com/blog/easy_cst.md>
//! * <https://arzg.github.io/lang/10/>
//! * <https://github.com/rust-analyzer/rowan/blob/master/examples/s_expressions.rs>

use crate::lexer::TokenKind;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::ToPrimitive;

/// Every kind of syntax item the parser can produce, tokens and nodes alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, FromPrimitive, ToPrimitive)]
#[repr(u16)]
pub enum SyntaxKind {
    // -- tokens --
    LParen,
    RParen,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Dot,
    Comma,
    Semicolon,
    Colon,
    Assign,
    Concat,
    ComparisonOp,
    ArithmeticOp,
    LogicOp,
    Comment,
    Whitespace,
    Keyword,
    Ident,
    QuotedLiteral,
    Integer,
    Number,
    TypeAttribute,
    Datatype,

    // -- AST nodes --
    IdentGroup,
    TypeName,
    Param,
    ParamList,
    Function,
    FunctionHeader,
    Procedure,
    ProcedureHeader,
    Package,
    PackageBody,
    Block,
    BlockStatement,
    DeclareSection,
    VariableDecl,
    VariableDeclList,
    TypeDecl,
    CursorDecl,
    ExceptionHandler,
    ExceptionSection,
    FunctionInvocation,
    ArgumentList,
    Argument,
    SelectStmt,
    SelectClause,
    ColumnExpr,
    ColumnExprList,
    IntoClause,
    FromClause,
    TableRef,
    JoinClause,
    WhereClause,
    IfStmt,
    ElsifClause,
    LoopStmt,
    ForLoopStmt,
    WhileLoopStmt,
    CursorForLoopStmt,
    ExitStmt,
    CaseStmt,
    CaseWhenClause,
    AssignStmt,
    CallStmt,
    ReturnStmt,
    RaiseStmt,
    NullStmt,
    CommitStmt,
    RollbackStmt,
    Expression,
    BetweenExpr,
    CaseExpr,
    Text,
    Error,
    Root,
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        rowan::SyntaxKind(kind.to_u16().unwrap())
    }
}

impl From<TokenKind> for SyntaxKind {
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Whitespace => SyntaxKind::Whitespace,
            TokenKind::Comment => SyntaxKind::Comment,

            TokenKind::LParen => SyntaxKind::LParen,
            TokenKind::RParen => SyntaxKind::RParen,
            TokenKind::Plus => SyntaxKind::ArithmeticOp,
            TokenKind::Minus => SyntaxKind::ArithmeticOp,
            TokenKind::Asterisk => SyntaxKind::Asterisk,
            TokenKind::Slash => SyntaxKind::Slash,
            TokenKind::Dot => SyntaxKind::Dot,
            TokenKind::Comma => SyntaxKind::Comma,
            TokenKind::Semicolon => SyntaxKind::Semicolon,
            TokenKind::Colon => SyntaxKind::Colon,
            TokenKind::Assign => SyntaxKind::Assign,
            TokenKind::Concat => SyntaxKind::Concat,
            TokenKind::Eq | TokenKind::Neq | TokenKind::Le | TokenKind::Ge | TokenKind::Lt
            | TokenKind::Gt => SyntaxKind::ComparisonOp,

            TokenKind::Ident => SyntaxKind::Ident,
            TokenKind::QuotedIdent => SyntaxKind::Ident,
            TokenKind::QuotedLiteral => SyntaxKind::QuotedLiteral,
            TokenKind::Integer => SyntaxKind::Integer,
            TokenKind::Number => SyntaxKind::Number,
            TokenKind::PercentType | TokenKind::PercentRowtype => SyntaxKind::TypeAttribute,

            TokenKind::NumberKw
            | TokenKind::IntegerKw
            | TokenKind::IntKw
            | TokenKind::FloatKw
            | TokenKind::DecimalKw
            | TokenKind::PlsIntegerKw
            | TokenKind::BinaryIntegerKw
            | TokenKind::BooleanKw
            | TokenKind::Varchar2Kw
            | TokenKind::VarcharKw
            | TokenKind::CharKw
            | TokenKind::NcharKw
            | TokenKind::Nvarchar2Kw
            | TokenKind::DateKw
            | TokenKind::TimestampKw
            | TokenKind::ClobKw
            | TokenKind::NclobKw
            | TokenKind::BlobKw
            | TokenKind::BfileKw
            | TokenKind::XmltypeKw => SyntaxKind::Datatype,

            TokenKind::AndKw | TokenKind::OrKw | TokenKind::NotKw => SyntaxKind::LogicOp,
            TokenKind::LikeKw | TokenKind::BetweenKw => SyntaxKind::ComparisonOp,

            TokenKind::CreateKw
            | TokenKind::ReplaceKw
            | TokenKind::EditionableKw
            | TokenKind::FunctionKw
            | TokenKind::ProcedureKw
            | TokenKind::PackageKw
            | TokenKind::BodyKw
            | TokenKind::IsKw
            | TokenKind::AsKw
            | TokenKind::BeginKw
            | TokenKind::EndKw
            | TokenKind::ReturnKw
            | TokenKind::DeterministicKw
            | TokenKind::InKw
            | TokenKind::OutKw
            | TokenKind::NocopyKw
            | TokenKind::DefaultKw
            | TokenKind::ConstantKw
            | TokenKind::DeclareKw
            | TokenKind::CursorKw
            | TokenKind::TypeKw
            | TokenKind::TableKw
            | TokenKind::OfKw
            | TokenKind::VarrayKw
            | TokenKind::IndexKw
            | TokenKind::ByKw
            | TokenKind::RecordKw
            | TokenKind::ExceptionKw
            | TokenKind::IfKw
            | TokenKind::ThenKw
            | TokenKind::ElsifKw
            | TokenKind::ElseKw
            | TokenKind::LoopKw
            | TokenKind::WhileKw
            | TokenKind::ForKw
            | TokenKind::ReverseKw
            | TokenKind::ExitKw
            | TokenKind::WhenKw
            | TokenKind::CaseKw
            | TokenKind::NullKw
            | TokenKind::RaiseKw
            | TokenKind::CommitKw
            | TokenKind::RollbackKw
            | TokenKind::SelectKw
            | TokenKind::FromKw
            | TokenKind::WhereKw
            | TokenKind::IntoKw
            | TokenKind::JoinKw
            | TokenKind::LeftKw
            | TokenKind::RightKw
            | TokenKind::InnerKw
            | TokenKind::OuterKw
            | TokenKind::OnKw
            | TokenKind::TrueKw
            | TokenKind::FalseKw
            | TokenKind::WithKw
            | TokenKind::TimeKw
            | TokenKind::ZoneKw => SyntaxKind::Keyword,

            TokenKind::Error => SyntaxKind::Error,
            TokenKind::Eof => unreachable!("lexer never yields Eof"),
        }
    }
}
