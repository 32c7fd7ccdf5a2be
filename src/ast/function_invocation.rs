// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! A single unified shape -- `IdentGroup` optionally followed by one
//! `ArgumentList` -- covers every place the grammar sees "a name, maybe
//! followed by parens": function calls, collection element/map-key access,
//! and call-statement/assignment targets. The parser never tries to tell
//! these apart; that disambiguation is entirely the analyzer's job, driven
//! by [`crate::scope::ScopeEngine::lookup`].

use super::{typed_syntax_node, AstNode, Expression, Ident};

typed_syntax_node!(IdentGroup, FunctionInvocation, ArgumentList, Argument);

impl IdentGroup {
    /// All dotted segments in source order, e.g. `pkg.var` -> `["pkg",
    /// "var"]`.
    pub fn segments(&self) -> Vec<String> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter_map(Ident::cast)
            .map(|ident| ident.name())
            .collect()
    }

    pub fn last_segment(&self) -> Option<String> {
        self.segments().into_iter().last()
    }

    pub fn is_qualified(&self) -> bool {
        self.segments().len() > 1
    }
}

impl FunctionInvocation {
    pub fn ident_group(&self) -> Option<IdentGroup> {
        self.syntax.children().find_map(IdentGroup::cast)
    }

    pub fn argument_list(&self) -> Option<ArgumentList> {
        self.syntax.children().find_map(ArgumentList::cast)
    }

    /// `true` when this node has a trailing `(...)`. Element access,
    /// collection constructors and zero-arg calls without parens (e.g. bare
    /// `SYSDATE`) diverge on exactly this bit, on top of the scope lookup.
    pub fn has_argument_list(&self) -> bool {
        self.argument_list().is_some()
    }
}

impl ArgumentList {
    pub fn arguments(&self) -> Vec<Argument> {
        self.syntax.children().filter_map(Argument::cast).collect()
    }
}

impl Argument {
    pub fn expr(&self) -> Option<Expression> {
        self.syntax.children().find_map(Expression::cast)
    }

    /// A bare literal/ident argument is parsed directly under `Argument`
    /// without an intervening `Expression` node; fall back to the argument's
    /// own text in that case.
    pub fn text(&self) -> String {
        self.syntax.text().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar;
    use crate::parser::Parser;

    fn parse_invocation(input: &str) -> FunctionInvocation {
        let mut parser = Parser::new(input);
        grammar::parse_function_invocation(&mut parser);
        let parse = parser.build();
        let root = super::super::Root::cast(parse.tree()).unwrap();
        root.syntax
            .descendants()
            .find_map(FunctionInvocation::cast)
            .unwrap()
    }

    #[test]
    fn bare_call_has_no_argument_list() {
        let invocation = parse_invocation("SYSDATE");
        assert!(!invocation.has_argument_list());
        assert_eq!(invocation.ident_group().unwrap().segments(), vec!["SYSDATE"]);
    }

    #[test]
    fn qualified_call_exposes_all_segments() {
        let invocation = parse_invocation("utilities.log('hi')");
        let group = invocation.ident_group().unwrap();
        assert_eq!(group.segments(), vec!["utilities", "log"]);
        assert!(group.is_qualified());
        assert_eq!(invocation.argument_list().unwrap().arguments().len(), 1);
    }
}
