// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>
// SPDX-FileContributor: Sebastian Ziebell <sebastian.ziebell@asquera.de>

//! Token definitions for the [`logos`] lexer.
//!
//! Only *syntactic* keywords get their own variant. Built-in functions and
//! pseudo-columns (`SYSDATE`, `NVL`, `ROUND`, ...) are lexed as plain
//! [`TokenKind::Ident`] and resolved later against the builtin registry by
//! name -- classification of a bare identifier is the scope engine's job,
//! never the lexer's.

use std::fmt;

/// Tokenizes the input according to Oracle PL/SQL lexical rules.
#[derive(logos::Logos, Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    #[regex(r"[ \t\n\r]+")]
    Whitespace,

    #[regex("--[^\n]*")]
    #[regex(r"/\*([^*]|\*[^/])*\*/")]
    Comment,

    #[token("create", ignore(case))]
    CreateKw,
    #[token("or", ignore(case))]
    OrKw,
    #[token("replace", ignore(case))]
    ReplaceKw,
    #[token("editionable", ignore(case))]
    EditionableKw,
    #[token("function", ignore(case))]
    FunctionKw,
    #[token("procedure", ignore(case))]
    ProcedureKw,
    #[token("package", ignore(case))]
    PackageKw,
    #[token("body", ignore(case))]
    BodyKw,
    #[token("is", ignore(case))]
    IsKw,
    #[token("as", ignore(case))]
    AsKw,
    #[token("begin", ignore(case))]
    BeginKw,
    #[token("end", ignore(case))]
    EndKw,
    #[token("return", ignore(case))]
    ReturnKw,
    #[token("deterministic", ignore(case))]
    DeterministicKw,

    #[token("in", ignore(case))]
    InKw,
    #[token("out", ignore(case))]
    OutKw,
    #[token("nocopy", ignore(case))]
    NocopyKw,
    #[token("default", ignore(case))]
    DefaultKw,
    #[token("constant", ignore(case))]
    ConstantKw,

    #[token("declare", ignore(case))]
    DeclareKw,
    #[token("cursor", ignore(case))]
    CursorKw,
    #[token("type", ignore(case))]
    TypeKw,
    #[token("table", ignore(case))]
    TableKw,
    #[token("of", ignore(case))]
    OfKw,
    #[token("varray", ignore(case))]
    VarrayKw,
    #[token("index", ignore(case))]
    IndexKw,
    #[token("by", ignore(case))]
    ByKw,
    #[token("record", ignore(case))]
    RecordKw,
    #[token("exception", ignore(case))]
    ExceptionKw,

    #[token("if", ignore(case))]
    IfKw,
    #[token("then", ignore(case))]
    ThenKw,
    #[token("elsif", ignore(case))]
    ElsifKw,
    #[token("else", ignore(case))]
    ElseKw,
    #[token("loop", ignore(case))]
    LoopKw,
    #[token("while", ignore(case))]
    WhileKw,
    #[token("for", ignore(case))]
    ForKw,
    #[token("reverse", ignore(case))]
    ReverseKw,
    #[token("exit", ignore(case))]
    ExitKw,
    #[token("when", ignore(case))]
    WhenKw,
    #[token("case", ignore(case))]
    CaseKw,
    #[token("null", ignore(case))]
    NullKw,
    #[token("raise", ignore(case))]
    RaiseKw,
    #[token("commit", ignore(case))]
    CommitKw,
    #[token("rollback", ignore(case))]
    RollbackKw,

    #[token("select", ignore(case))]
    SelectKw,
    #[token("from", ignore(case))]
    FromKw,
    #[token("where", ignore(case))]
    WhereKw,
    #[token("into", ignore(case))]
    IntoKw,
    #[token("join", ignore(case))]
    JoinKw,
    #[token("left", ignore(case))]
    LeftKw,
    #[token("right", ignore(case))]
    RightKw,
    #[token("inner", ignore(case))]
    InnerKw,
    #[token("outer", ignore(case))]
    OuterKw,
    #[token("on", ignore(case))]
    OnKw,

    #[token("and", ignore(case))]
    AndKw,
    #[token("not", ignore(case))]
    NotKw,
    #[regex(r"(?i)i?like")]
    LikeKw,
    #[token("between", ignore(case))]
    BetweenKw,

    #[token("true", ignore(case))]
    TrueKw,
    #[token("false", ignore(case))]
    FalseKw,

    #[token("number", ignore(case))]
    NumberKw,
    #[token("integer", ignore(case))]
    IntegerKw,
    #[token("int", ignore(case))]
    IntKw,
    #[token("float", ignore(case))]
    FloatKw,
    #[token("decimal", ignore(case))]
    DecimalKw,
    #[token("pls_integer", ignore(case))]
    PlsIntegerKw,
    #[token("binary_integer", ignore(case))]
    BinaryIntegerKw,
    #[token("boolean", ignore(case))]
    BooleanKw,
    #[token("varchar2", ignore(case))]
    Varchar2Kw,
    #[token("varchar", ignore(case))]
    VarcharKw,
    #[token("char", ignore(case))]
    CharKw,
    #[token("nchar", ignore(case))]
    NcharKw,
    #[token("nvarchar2", ignore(case))]
    Nvarchar2Kw,
    #[token("date", ignore(case))]
    DateKw,
    #[token("timestamp", ignore(case))]
    TimestampKw,
    #[token("with", ignore(case))]
    WithKw,
    #[token("time", ignore(case))]
    TimeKw,
    #[token("zone", ignore(case))]
    ZoneKw,
    #[token("clob", ignore(case))]
    ClobKw,
    #[token("nclob", ignore(case))]
    NclobKw,
    #[token("blob", ignore(case))]
    BlobKw,
    #[token("bfile", ignore(case))]
    BfileKw,
    #[token("xmltype", ignore(case))]
    XmltypeKw,

    #[regex(r"(?i)[a-z_][a-z0-9_$#]*", priority = 1)]
    Ident,
    #[regex(r#""(?:[^"]|"")+""#)]
    QuotedIdent,
    #[regex(r"'(?:[^']|'')*'")]
    QuotedLiteral,
    #[regex(r"\d+\.\d+", priority = 3)]
    Number,
    #[regex(r"\d+", priority = 2)]
    Integer,

    #[token("%type", ignore(case))]
    PercentType,
    #[token("%rowtype", ignore(case))]
    PercentRowtype,

    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(":=")]
    Assign,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Asterisk,
    #[token("/")]
    Slash,
    #[token("||")]
    Concat,
    #[token("=")]
    Eq,
    #[token("<>")]
    #[token("!=")]
    Neq,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    #[error]
    Error,

    /// Marker for end of input; never produced by the lexer directly.
    Eof,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn first_kind(input: &str) -> TokenKind {
        Lexer::new(input).next().unwrap().kind
    }

    #[test]
    fn lex_ident_vs_keyword() {
        assert_eq!(first_kind("hello"), TokenKind::Ident);
        assert_eq!(first_kind("BEGIN"), TokenKind::BeginKw);
        assert_eq!(first_kind("begin"), TokenKind::BeginKw);
    }

    #[test]
    fn builtin_function_names_lex_as_plain_idents() {
        for name in ["SYSDATE", "nvl", "Round", "to_char"] {
            assert_eq!(first_kind(name), TokenKind::Ident, "{name}");
        }
    }

    #[test]
    fn lex_percent_type_and_rowtype() {
        assert_eq!(first_kind("%TYPE"), TokenKind::PercentType);
        assert_eq!(first_kind("%rowtype"), TokenKind::PercentRowtype);
    }

    #[test]
    fn lex_quoted_literal_with_escaped_quote() {
        let mut lexer = Lexer::new("'it''s'");
        let token = lexer.next().unwrap();
        assert_eq!(token.kind, TokenKind::QuotedLiteral);
        assert_eq!(token.text, "'it''s'");
    }

    #[test]
    fn lex_number_vs_integer() {
        assert_eq!(first_kind("42"), TokenKind::Integer);
        assert_eq!(first_kind("4.2"), TokenKind::Number);
    }
}
