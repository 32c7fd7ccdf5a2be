// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

mod token;

use logos::Logos;
use rowan::{TextRange, TextSize};
use std::ops::Range as StdRange;
pub use token::TokenKind;

#[derive(Debug)]
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(input),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let kind = self.inner.next()?;
        let text = self.inner.slice();

        let range = {
            let StdRange { start, end } = self.inner.span();
            let start = TextSize::try_from(start).unwrap();
            let end = TextSize::try_from(end).unwrap();

            TextRange::new(start, end)
        };

        Some(Self::Item { kind, text, range })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub range: TextRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexer_reports_ranges() {
        let mut lexer = Lexer::new("foo bar");
        let first = lexer.next().unwrap();
        assert_eq!(first.kind, TokenKind::Ident);
        assert_eq!(first.text, "foo");
        assert_eq!(first.range, TextRange::new(0.into(), 3.into()));

        let ws = lexer.next().unwrap();
        assert_eq!(ws.kind, TokenKind::Whitespace);

        let second = lexer.next().unwrap();
        assert_eq!(second.text, "bar");
        assert_eq!(second.range, TextRange::new(4.into(), 7.into()));
    }
}
