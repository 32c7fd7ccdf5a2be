// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! The Symbol/Scope Engine: hierarchical variable scopes,
//! query table-alias scopes, and the package-member predicate that the
//! emitter's name-resolution order depends on.
//!
//! The emitter must never classify an identifier as a variable except by a
//! successful [`ScopeEngine::lookup`] call.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ident::SqlIdent;
use crate::types::{InlineType, Type};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDescriptor {
    pub name: SqlIdent,
    pub source_type_text: String,
    pub target_type_text: String,
    pub is_constant: bool,
    pub default_expression: Option<String>,
    pub inline_type: Option<InlineType>,
    pub resolved_type: Type,
}

impl VariableDescriptor {
    pub fn new(name: SqlIdent, source_type_text: impl Into<String>, resolved_type: Type) -> Self {
        Self {
            name,
            source_type_text: source_type_text.into(),
            target_type_text: String::new(),
            is_constant: false,
            default_expression: None,
            inline_type: None,
            resolved_type,
        }
    }

    pub fn with_inline_type(mut self, inline_type: InlineType) -> Self {
        self.inline_type = Some(inline_type);
        self
    }

    pub fn with_target_type(mut self, target_type_text: impl Into<String>) -> Self {
        self.target_type_text = target_type_text.into();
        self
    }

    pub fn constant(mut self) -> Self {
        self.is_constant = true;
        self
    }
}

#[derive(Debug, Default)]
struct VarScopeFrame {
    label: String,
    variables: HashMap<String, VariableDescriptor>,
}

#[derive(Debug, Default)]
struct QueryScopeFrame {
    aliases: IndexMap<String, String>,
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ScopeError {
    #[error("duplicate declaration of {0} in the same scope")]
    DupDecl(String),
}

/// Hierarchical scope engine. Owned exclusively by one [`crate::session::Session`]
/// for the duration of one translation.
#[derive(Debug)]
pub struct ScopeEngine {
    var_frames: Vec<VarScopeFrame>,
    query_frames: Vec<QueryScopeFrame>,
    current_schema: String,
    current_package: Option<SqlIdent>,
}

impl ScopeEngine {
    pub fn new(current_schema: impl Into<String>) -> Self {
        Self {
            var_frames: Vec::new(),
            query_frames: Vec::new(),
            current_schema: current_schema.into(),
            current_package: None,
        }
    }

    pub fn current_schema(&self) -> &str {
        &self.current_schema
    }

    pub fn current_package(&self) -> Option<&SqlIdent> {
        self.current_package.as_ref()
    }

    pub fn set_current_package(&mut self, package: Option<SqlIdent>) {
        self.current_package = package;
    }

    pub fn is_in_package_member(&self) -> bool {
        self.current_package.is_some()
    }

    pub fn push_var_scope(&mut self, label: impl Into<String>) {
        self.var_frames.push(VarScopeFrame {
            label: label.into(),
            variables: HashMap::new(),
        });
    }

    /// Pops the innermost variable scope. Panics on underflow --
    /// scope-stack underflow is a programming bug, not a
    /// translation failure, and must never be swallowed.
    pub fn pop_var_scope(&mut self) {
        self.var_frames
            .pop()
            .expect("pop_var_scope called with no open variable scope");
    }

    pub fn declare(
        &mut self,
        name: SqlIdent,
        descriptor: VariableDescriptor,
    ) -> Result<(), ScopeError> {
        let frame = self
            .var_frames
            .last_mut()
            .expect("declare called with no open variable scope");
        let key = name.canonical();
        if frame.variables.contains_key(&key) {
            return Err(ScopeError::DupDecl(name.to_string()));
        }
        frame.variables.insert(key, descriptor);
        Ok(())
    }

    /// Innermost-first lookup across all open variable scopes. This is the
    /// *only* sanctioned path to classifying an identifier as a variable.
    pub fn lookup(&self, name: &SqlIdent) -> Option<&VariableDescriptor> {
        let key = name.canonical();
        self.var_frames
            .iter()
            .rev()
            .find_map(|frame| frame.variables.get(&key))
    }

    pub fn var_scope_depth(&self) -> usize {
        self.var_frames.len()
    }

    pub fn current_var_scope_label(&self) -> Option<&str> {
        self.var_frames.last().map(|f| f.label.as_str())
    }

    pub fn push_query_scope(&mut self) {
        self.query_frames.push(QueryScopeFrame::default());
    }

    pub fn pop_query_scope(&mut self) {
        self.query_frames
            .pop()
            .expect("pop_query_scope called with no open query scope");
    }

    pub fn register_table_alias(&mut self, alias: &SqlIdent, qualified_table: impl Into<String>) {
        let frame = self
            .query_frames
            .last_mut()
            .expect("register_table_alias called with no open query scope");
        frame.aliases.insert(alias.canonical(), qualified_table.into());
    }

    /// Innermost-first walk so a correlated subquery can still see an
    /// outer query's aliases.
    pub fn resolve_alias(&self, alias: &SqlIdent) -> Option<&str> {
        let key = alias.canonical();
        self.query_frames
            .iter()
            .rev()
            .find_map(|frame| frame.aliases.get(&key))
            .map(String::as_str)
    }

    pub fn query_scope_depth(&self) -> usize {
        self.query_frames.len()
    }

    /// Every qualified table name currently visible, innermost scope first
    /// and in from-clause registration order within a scope -- the search
    /// order an unqualified column reference must try.
    pub fn visible_tables(&self) -> Vec<&str> {
        self.query_frames
            .iter()
            .rev()
            .flat_map(|frame| frame.aliases.values())
            .map(String::as_str)
            .collect()
    }

    /// Scope balance: true once every push has a matching pop.
    pub fn is_balanced(&self) -> bool {
        self.var_frames.is_empty() && self.query_frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(name: &str) -> VariableDescriptor {
        VariableDescriptor::new(SqlIdent::from(name), "NUMBER", Type::numeric())
    }

    #[test]
    fn inner_scope_shadows_outer() {
        let mut scope = ScopeEngine::new("hr");
        scope.push_var_scope("outer");
        scope.declare(SqlIdent::from("v_x"), desc("v_x")).unwrap();
        scope.push_var_scope("inner");
        scope
            .declare(SqlIdent::from("v_x"), desc("v_x").with_target_type("text"))
            .unwrap();

        let found = scope.lookup(&SqlIdent::from("v_x")).unwrap();
        assert_eq!(found.target_type_text, "text");

        scope.pop_var_scope();
        let found = scope.lookup(&SqlIdent::from("v_x")).unwrap();
        assert_eq!(found.target_type_text, "");
        scope.pop_var_scope();
        assert!(scope.is_balanced());
    }

    #[test]
    fn duplicate_declaration_in_same_frame_errs() {
        let mut scope = ScopeEngine::new("hr");
        scope.push_var_scope("body");
        scope.declare(SqlIdent::from("v_x"), desc("v_x")).unwrap();
        let err = scope.declare(SqlIdent::from("V_X"), desc("v_x")).unwrap_err();
        assert!(matches!(err, ScopeError::DupDecl(_)));
    }

    #[test]
    fn unrelated_metadata_does_not_change_classification() {
        let mut scope = ScopeEngine::new("hr");
        scope.push_var_scope("body");
        scope.declare(SqlIdent::from("calculate_bonus"), desc("calculate_bonus")).unwrap();
        assert!(scope.lookup(&SqlIdent::from("calculate_bonus")).is_some());
        assert!(scope.lookup(&SqlIdent::from("other_fn")).is_none());
    }

    #[test]
    fn query_scope_sees_outer_alias_from_inner_frame() {
        let mut scope = ScopeEngine::new("hr");
        scope.push_query_scope();
        scope.register_table_alias(&SqlIdent::from("e"), "hr.employees");
        scope.push_query_scope();
        assert_eq!(scope.resolve_alias(&SqlIdent::from("e")), Some("hr.employees"));
        scope.pop_query_scope();
        scope.pop_query_scope();
    }

    #[test]
    fn visible_tables_lists_innermost_scope_first() {
        let mut scope = ScopeEngine::new("hr");
        scope.push_query_scope();
        scope.register_table_alias(&SqlIdent::from("e"), "hr.employees");
        scope.push_query_scope();
        scope.register_table_alias(&SqlIdent::from("d"), "hr.departments");
        assert_eq!(scope.visible_tables(), vec!["hr.departments", "hr.employees"]);
        scope.pop_query_scope();
        scope.pop_query_scope();
    }

    #[test]
    #[should_panic(expected = "no open variable scope")]
    fn popping_unbalanced_scope_panics() {
        let mut scope = ScopeEngine::new("hr");
        scope.pop_var_scope();
    }
}
