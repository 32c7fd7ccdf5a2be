// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Package Context Store and helper emission bookkeeping. `helpers_emitted`
//! is the sole source of truth guaranteeing helpers for a package are
//! emitted at most once per session.

use indexmap::IndexMap;

use crate::analyzer::describe_variable;
use crate::ast::DeclareSection;
use crate::ident::SqlIdent;
use crate::metadata::MetadataIndex;
use crate::scope::{ScopeEngine, VariableDescriptor};

/// Per-package state, created on first reference within a session and
/// reused for every subsequent member of the same package.
#[derive(Debug)]
pub struct PackageContext {
    pub schema: String,
    pub package_name: SqlIdent,
    /// Accumulates from both the package spec and body; order preserved so
    /// generated getter/setter/initializer emission is deterministic.
    pub variables: IndexMap<String, VariableDescriptor>,
    pub body_text: Option<String>,
    helpers_emitted: bool,
}

impl PackageContext {
    pub(crate) fn new(schema: impl Into<String>, package_name: SqlIdent) -> Self {
        Self {
            schema: schema.into(),
            package_name,
            variables: IndexMap::new(),
            body_text: None,
            helpers_emitted: false,
        }
    }

    pub fn register_variable(&mut self, name: SqlIdent, descriptor: VariableDescriptor) {
        self.variables.insert(name.canonical(), descriptor);
    }

    pub fn is_package_variable(&self, name: &SqlIdent) -> bool {
        self.variables.contains_key(&name.canonical())
    }

    pub fn lookup_variable(&self, name: &SqlIdent) -> Option<&VariableDescriptor> {
        self.variables.get(&name.canonical())
    }

    pub fn helpers_emitted(&self) -> bool {
        self.helpers_emitted
    }

    /// Target name prefix for members of this package (glossary:
    /// "`schema.packagename__membername`").
    pub fn member_prefix(&self) -> String {
        format!("{}.{}__", self.schema, self.package_name.canonical())
    }

    /// Registers every variable declared in a package spec or body.
    /// Called once for the spec's declare section and once
    /// for the body's; a body variable re-declaring a spec name simply
    /// overwrites it, matching Oracle's single package-variable namespace.
    /// `%TYPE` resolution against a local variable never applies at package
    /// scope, so an empty [`ScopeEngine`] is enough.
    pub fn register_from_declare_section(&mut self, declare: &DeclareSection, metadata: &MetadataIndex) {
        let empty_scope = ScopeEngine::new(self.schema.clone());
        let type_aliases = crate::analyzer::collect_type_aliases(declare);
        for var in declare.variable_decls() {
            let Some(name) = var.name() else { continue };
            let type_text = var.type_name().map(|t| t.text()).unwrap_or_default();
            let default_text = var.default_expr().map(|e| e.text());
            let descriptor = describe_variable(
                &name.name(),
                &type_text,
                default_text,
                metadata,
                &self.schema,
                &empty_scope,
                &type_aliases,
            );
            self.register_variable(SqlIdent::from(name.name()), descriptor);
        }
    }
}

/// Owns every [`PackageContext`] touched during one session.
#[derive(Debug, Default)]
pub struct PackageContextStore {
    packages: IndexMap<String, PackageContext>,
}

impl PackageContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(schema: &str, name: &SqlIdent) -> String {
        format!("{}.{}", schema.to_lowercase(), name.canonical())
    }

    pub fn get_or_create_package(&mut self, schema: &str, name: &SqlIdent) -> &mut PackageContext {
        let key = Self::key(schema, name);
        self.packages
            .entry(key)
            .or_insert_with(|| PackageContext::new(schema, name.clone()))
    }

    pub fn get_package(&self, schema: &str, name: &SqlIdent) -> Option<&PackageContext> {
        self.packages.get(&Self::key(schema, name))
    }

    /// Marks helper functions emitted for this package, if they have not
    /// already been. Returns `true` the first time this is called for a
    /// given package per session, `false` on every subsequent call -- this
    /// is the only place `helpers_emitted` is flipped, keeping it the
    /// single source of truth required by invariant 5.
    pub fn emit_helpers_if_needed(&mut self, schema: &str, name: &SqlIdent) -> bool {
        let ctx = self.get_or_create_package(schema, name);
        if ctx.helpers_emitted {
            false
        } else {
            ctx.helpers_emitted = true;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    #[test]
    fn helpers_are_emitted_exactly_once_per_package() {
        let mut store = PackageContextStore::new();
        let name = SqlIdent::from("utilities");

        assert!(store.emit_helpers_if_needed("hr", &name));
        assert!(!store.emit_helpers_if_needed("hr", &name));
        assert!(!store.emit_helpers_if_needed("hr", &name));
    }

    #[test]
    fn distinct_packages_each_get_their_own_emission() {
        let mut store = PackageContextStore::new();
        assert!(store.emit_helpers_if_needed("hr", &SqlIdent::from("pkg_a")));
        assert!(store.emit_helpers_if_needed("hr", &SqlIdent::from("pkg_b")));
    }

    #[test]
    fn package_context_persists_registered_variables() {
        let mut store = PackageContextStore::new();
        let name = SqlIdent::from("utilities");
        let ctx = store.get_or_create_package("hr", &name);
        ctx.register_variable(
            SqlIdent::from("g_counter"),
            VariableDescriptor::new(SqlIdent::from("g_counter"), "NUMBER", Type::numeric()),
        );

        let ctx = store.get_package("hr", &name).unwrap();
        assert!(ctx.is_package_variable(&SqlIdent::from("G_COUNTER")));
        assert_eq!(ctx.member_prefix(), "hr.utilities__");
    }

    #[test]
    fn register_from_declare_section_picks_up_every_variable() {
        use crate::ast::{AstNode, Root};
        use crate::metadata::MetadataIndex;

        const SPEC: &str = r#"
            CREATE OR REPLACE PACKAGE utilities IS
                g_rate NUMBER := 0.1;
                g_label VARCHAR2(10);
            END utilities;
        "#;
        let parse = crate::grammar::parse_package_source(SPEC);
        let root = Root::cast(parse.tree()).unwrap();
        let package = root.package().unwrap();
        let declare = package.declare_section().unwrap();

        let mut ctx = PackageContext::new("hr", SqlIdent::from("utilities"));
        ctx.register_from_declare_section(&declare, &MetadataIndex::new());

        let rate = ctx.lookup_variable(&SqlIdent::from("g_rate")).unwrap();
        assert_eq!(rate.resolved_type, Type::numeric());
        assert_eq!(rate.default_expression.as_deref(), Some("0.1"));
        assert!(ctx.is_package_variable(&SqlIdent::from("G_LABEL")));
    }
}
