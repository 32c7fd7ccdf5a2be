// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Typed AST nodes for `CREATE FUNCTION` units.

use super::{typed_syntax_node, AstNode, Block, Ident, ParamList, TypeName};

typed_syntax_node!(Function, FunctionHeader);

impl Function {
    pub fn header(&self) -> Option<FunctionHeader> {
        self.syntax.children().find_map(FunctionHeader::cast)
    }

    pub fn body(&self) -> Option<Block> {
        self.syntax.children().find_map(Block::cast)
    }

    pub fn name(&self) -> Option<String> {
        self.header()?.name()
    }
}

impl FunctionHeader {
    pub fn name(&self) -> Option<String> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find_map(Ident::cast)
            .map(|ident| ident.name())
    }

    pub fn param_list(&self) -> Option<ParamList> {
        self.syntax.children().find_map(ParamList::cast)
    }

    pub fn return_type(&self) -> Option<TypeName> {
        self.syntax.children().find_map(TypeName::cast)
    }

    pub fn is_deterministic(&self) -> bool {
        self.syntax.text().to_string().to_uppercase().contains("DETERMINISTIC")
    }
}

#[cfg(test)]
mod tests {
    use super::super::Root;
    use super::*;

    #[test]
    fn function_name_and_params_are_reachable() {
        const INPUT: &str = r#"
            CREATE OR REPLACE FUNCTION calculate_bonus(p_salary NUMBER)
            RETURN NUMBER
            IS
            BEGIN
                RETURN p_salary * 0.1;
            END calculate_bonus;
        "#;
        let parse = crate::grammar::parse_function_source(INPUT);
        let root = Root::cast(parse.tree()).unwrap();
        let function = root.function().unwrap();
        assert_eq!(function.name(), Some("calculate_bonus".to_owned()));
        let params = function.header().unwrap().param_list().unwrap().params();
        assert_eq!(params.len(), 1);
    }
}
