// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! The read-only Metadata Index and synonym resolution. Generalizes
//! `DboAnalyzeContext`/`DboTable`'s "tables with columns" shape to the full
//! lookup surface a translation run needs: columns, synonyms, and function
//! signatures.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tsify::Tsify;

use crate::error::{Diagnostic, ErrorCategory};
use crate::ident::SqlIdent;

/// Maximum synonym-resolution chain length before the engine reports a
/// cycle. Visited names are tracked so a loop is caught within this depth
/// budget rather than recursing forever.
const MAX_SYNONYM_DEPTH: usize = 10;

#[derive(Tsify, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct FunctionSignature {
    pub parameters: Vec<(String, String)>,
    pub return_type: Option<String>,
}

#[derive(Tsify, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct TableColumns {
    #[tsify(type = "Record<string, string>")]
    columns: HashMap<SqlIdent, String>,
}

impl TableColumns {
    pub fn new(columns: HashMap<SqlIdent, String>) -> Self {
        Self { columns }
    }

    pub fn ordered(&self) -> Vec<(&SqlIdent, &str)> {
        let mut out: Vec<_> = self.columns.iter().map(|(k, v)| (k, v.as_str())).collect();
        out.sort_by_key(|(name, _)| name.canonical());
        out
    }
}

/// Read-only, shareable-across-sessions lookup surface: immutable once
/// built, so it may be shared across concurrent translations safely.
#[derive(Tsify, Clone, Debug, Default, Serialize, Deserialize)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct MetadataIndex {
    #[tsify(type = "Record<string, Record<string, string>>")]
    tables: HashMap<SqlIdent, TableColumns>,
    #[tsify(type = "Record<string, string>")]
    synonyms: HashMap<SqlIdent, String>,
    #[tsify(type = "Record<string, FunctionSignature>")]
    functions: HashMap<SqlIdent, FunctionSignature>,
}

impl MetadataIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, qualified_table: impl Into<String>, columns: TableColumns) -> Self {
        self.tables.insert(SqlIdent::from(qualified_table.into()), columns);
        self
    }

    pub fn with_synonym(
        mut self,
        schema: &str,
        unqualified_name: impl Into<String>,
        resolved: impl Into<String>,
    ) -> Self {
        let key = SqlIdent::from(format!("{schema}.{}", unqualified_name.into()));
        self.synonyms.insert(key, resolved.into());
        self
    }

    pub fn with_function(
        mut self,
        schema: &str,
        name: impl Into<String>,
        signature: FunctionSignature,
    ) -> Self {
        let key = SqlIdent::from(format!("{schema}.{}", name.into()));
        self.functions.insert(key, signature);
        self
    }

    pub fn column_type(&self, qualified_table: &str, column: &SqlIdent) -> Option<&str> {
        let table = SqlIdent::from(qualified_table);
        self.tables.get(&table)?.columns.get(column).map(String::as_str)
    }

    pub fn table_columns(&self, qualified_table: &str) -> Option<&TableColumns> {
        self.tables.get(&SqlIdent::from(qualified_table))
    }

    pub fn function_signature(&self, schema: &str, name: &str) -> Option<&FunctionSignature> {
        let key = SqlIdent::from(format!("{schema}.{name}"));
        self.functions.get(&key)
    }

    /// Resolves a bare name in context schema `S` through the synonym chain.
    /// Returns `S2.name` fully qualified, or `Err(RESOLVE_CYCLE)` if the
    /// chain loops within the depth budget.
    pub fn resolve_synonym(&self, schema: &str, unqualified_name: &str) -> Result<String, Diagnostic> {
        let mut current_schema = schema.to_owned();
        let mut current_name = unqualified_name.to_owned();
        let mut visited = std::collections::HashSet::new();

        for _ in 0..MAX_SYNONYM_DEPTH {
            let key = SqlIdent::from(format!("{current_schema}.{current_name}"));
            if !visited.insert(key.canonical()) {
                return Err(Diagnostic::new(
                    ErrorCategory::ResolveCycle,
                    format!("synonym cycle resolving {schema}.{unqualified_name}"),
                ));
            }

            match self.synonyms.get(&key) {
                Some(resolved) => {
                    let (next_schema, next_name) = split_qualified(resolved);
                    current_schema = next_schema;
                    current_name = next_name;
                }
                None => return Ok(format!("{current_schema}.{current_name}")),
            }
        }

        Err(Diagnostic::new(
            ErrorCategory::ResolveCycle,
            format!("synonym resolution exceeded depth {MAX_SYNONYM_DEPTH} for {schema}.{unqualified_name}"),
        ))
    }
}

fn split_qualified(qualified: &str) -> (String, String) {
    match qualified.split_once('.') {
        Some((schema, name)) => (schema.to_owned(), name.to_owned()),
        None => (qualified.to_owned(), qualified.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_synonym_falls_back_to_schema_name() {
        let index = MetadataIndex::new();
        assert_eq!(
            index.resolve_synonym("hr", "employees").unwrap(),
            "hr.employees"
        );
    }

    #[test]
    fn resolve_synonym_follows_chain() {
        let index = MetadataIndex::new().with_synonym("hr", "emp", "hr2.employees");
        assert_eq!(index.resolve_synonym("hr", "emp").unwrap(), "hr2.employees");
    }

    #[test]
    fn resolve_synonym_is_idempotent() {
        let index = MetadataIndex::new().with_synonym("hr", "emp", "hr2.employees");
        let once = index.resolve_synonym("hr", "emp").unwrap();
        let (schema, name) = split_qualified(&once);
        let twice = index.resolve_synonym(&schema, &name).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn resolve_synonym_detects_cycle() {
        let index = MetadataIndex::new()
            .with_synonym("hr", "a", "hr.b")
            .with_synonym("hr", "b", "hr.a");
        let err = index.resolve_synonym("hr", "a").unwrap_err();
        assert_eq!(err.category, ErrorCategory::ResolveCycle);
    }

    #[test]
    fn table_columns_are_case_insensitive() {
        let columns = TableColumns::new(HashMap::from([
            (SqlIdent::from("EMPNO"), "NUMBER".to_owned()),
        ]));
        let index = MetadataIndex::new().with_table("hr.employees", columns);
        assert_eq!(
            index.column_type("hr.employees", &SqlIdent::from("empno")),
            Some("NUMBER")
        );
    }
}
