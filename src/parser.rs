// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! The event-based parser that drives [`crate::grammar`] to build a
//! [`rowan`] concrete syntax tree.
//!
//! Heavily inspired by:
//!  * <https://matklad.github.io/2020/04/13/simple-but-powerful-pratt-parsing.html>
//!  * <https://arzg.github.io/lang/10/>

use std::fmt;

use rowan::{Checkpoint, GreenNode, GreenNodeBuilder};

use crate::lexer::{Lexer, TokenKind};
use crate::syntax::{SyntaxKind, SyntaxNode};

/// A single recoverable parse failure; the parser keeps going afterwards so
/// a whole function body can be parsed even when one statement is broken.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ParseErrorType {
    #[error("expected {0:?}, found {1:?}")]
    ExpectedToken(TokenKind, TokenKind),
    #[error("expected one of {0:?}, found {1:?}")]
    ExpectedOneOfTokens(Vec<TokenKind>, TokenKind),
    #[error("expected a statement, found {0:?}")]
    ExpectedStatement(TokenKind),
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    #[error("unsupported syntax: {0}")]
    UnsupportedSyntax(String),
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("{error} at {range:?}")]
pub struct ParseError {
    pub error: ParseErrorType,
    pub range: rowan::TextRange,
}

impl fmt::Display for ParseErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Output of a completed parse: the lossless tree plus any recoverable
/// errors collected along the way.
pub struct Parse {
    green_node: GreenNode,
    pub errors: Vec<ParseError>,
}

impl Parse {
    pub fn tree(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green_node.clone())
    }

    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

struct Token<'a> {
    kind: TokenKind,
    text: &'a str,
}

pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<ParseError>,
    offset: usize,
    /// Byte offset of `tokens[cursor]`, kept so recoverable errors can be
    /// anchored to a source range.
    cursor: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let tokens = Lexer::new(input)
            .map(|t| Token {
                kind: t.kind,
                text: t.text,
            })
            .collect();

        let mut parser = Self {
            tokens,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
            offset: 0,
            cursor: 0,
        };
        parser.builder.start_node(SyntaxKind::Root.into());
        parser
    }

    /// The kind of the next non-trivia token, or [`TokenKind::Eof`] past the
    /// end of input.
    pub fn current(&self) -> TokenKind {
        self.nth(0).unwrap_or(TokenKind::Eof)
    }

    pub fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    pub fn at_one_of(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current())
    }

    /// Looks ahead `n` non-trivia tokens from the cursor (`nth(0) ==
    /// current()`).
    pub fn nth(&self, n: usize) -> Option<TokenKind> {
        self.tokens
            .iter()
            .skip(self.cursor)
            .filter(|t| !t.kind.is_trivia())
            .nth(n)
            .map(|t| t.kind)
    }

    fn bump_trivia(&mut self) {
        while let Some(token) = self.tokens.get(self.cursor) {
            if !token.kind.is_trivia() {
                break;
            }
            self.builder
                .token(SyntaxKind::from(token.kind).into(), token.text);
            self.offset += token.text.len();
            self.cursor += 1;
        }
    }

    /// Consumes the current token regardless of its kind.
    pub fn bump_any(&mut self) {
        self.bump_trivia();
        let Some(token) = self.tokens.get(self.cursor) else {
            return;
        };
        self.builder
            .token(SyntaxKind::from(token.kind).into(), token.text);
        self.offset += token.text.len();
        self.cursor += 1;
    }

    /// Consumes the current token, which must be `kind`.
    pub fn bump(&mut self, kind: TokenKind) {
        debug_assert_eq!(self.current(), kind);
        self.bump_any();
    }

    /// Consumes the current token if it matches `kind`.
    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump_any();
            true
        } else {
            false
        }
    }

    pub fn eat_one_of(&mut self, kinds: &[TokenKind]) -> bool {
        if self.at_one_of(kinds) {
            self.bump_any();
            true
        } else {
            false
        }
    }

    /// Consumes the current token, which must be `kind`; records a
    /// recoverable error and does not advance otherwise.
    pub fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            let found = self.current();
            self.error(ParseErrorType::ExpectedToken(kind, found));
            false
        }
    }

    pub fn expect_one_of(&mut self, kinds: &[TokenKind]) -> bool {
        if self.eat_one_of(kinds) {
            true
        } else {
            let found = self.current();
            self.error(ParseErrorType::ExpectedOneOfTokens(kinds.to_vec(), found));
            false
        }
    }

    /// Advances past tokens until `kind` is found or input runs out, used to
    /// recover from a malformed construct without losing surrounding text.
    pub fn until(&mut self, kind: TokenKind) {
        while !self.at(kind) && !self.at(TokenKind::Eof) {
            self.bump_any();
        }
    }

    pub fn error(&mut self, error: ParseErrorType) {
        self.bump_trivia();
        let start = self.offset as u32;
        self.errors.push(ParseError {
            error,
            range: rowan::TextRange::new(start.into(), start.into()),
        });
    }

    pub fn start(&mut self, kind: SyntaxKind) {
        self.bump_trivia();
        self.builder.start_node(kind.into());
    }

    pub fn finish(&mut self) {
        self.builder.finish_node();
    }

    pub fn checkpoint(&mut self) -> Checkpoint {
        self.bump_trivia();
        self.builder.checkpoint()
    }

    pub fn start_node_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        self.builder.start_node_at(checkpoint, kind.into());
    }

    pub fn build(mut self) -> Parse {
        self.bump_trivia();
        self.builder.finish_node();
        Parse {
            green_node: self.builder.finish(),
            errors: self.errors,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use expect_test::Expect;

    pub fn check(parse: Parse, expected_tree: Expect) {
        expected_tree.assert_eq(&format!("{:#?}", parse.tree()));
    }

    pub fn parse<F>(input: &str, f: F) -> Parse
    where
        F: Fn(&mut Parser),
    {
        let mut parser = Parser::new(input);
        f(&mut parser);
        parser.build()
    }

    #[test]
    fn empty_input_builds_empty_root() {
        let parser = Parser::new("");
        let parse = parser.build();
        assert!(parse.ok());
    }

    #[test]
    fn expect_records_recoverable_error() {
        let mut parser = Parser::new("foo");
        parser.expect(TokenKind::BeginKw);
        let parse = parser.build();
        assert_eq!(parse.errors.len(), 1);
    }
}
