// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! The per-translation Session: bundles the read-only
//! [`MetadataIndex`] with the mutable [`PackageContextStore`] so a whole
//! run of related units -- a package spec followed by its body, or a batch
//! of standalone functions -- shares the same package bookkeeping.
//!
//! A [`Session`] is owned by a single translator invocation and is not
//! `Sync`; running many translations concurrently means giving each its own
//! `Session` (or, for units that never reference the same package, its own
//! thread entirely). Everything below a `Session` -- the [`crate::scope::ScopeEngine`]
//! and [`crate::types::TypeCache`] used while translating one function or
//! procedure -- is created fresh per unit and never outlives that single
//! call: one session runs single-threaded, one unit at a time.

use crate::metadata::MetadataIndex;
use crate::package_context::PackageContextStore;

#[derive(Debug, Default)]
pub struct Session {
    metadata: MetadataIndex,
    packages: PackageContextStore,
}

impl Session {
    pub fn new(metadata: MetadataIndex) -> Self {
        Self { metadata, packages: PackageContextStore::new() }
    }

    pub fn metadata(&self) -> &MetadataIndex {
        &self.metadata
    }

    pub fn packages(&mut self) -> &mut PackageContextStore {
        &mut self.packages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::SqlIdent;

    #[test]
    fn session_reuses_the_same_package_context_across_calls() {
        let mut session = Session::new(MetadataIndex::new());
        let name = SqlIdent::from("utilities");
        session.packages().get_or_create_package("hr", &name).register_variable(
            SqlIdent::from("g_rate"),
            crate::scope::VariableDescriptor::new(SqlIdent::from("g_rate"), "NUMBER", crate::types::Type::numeric()),
        );

        let ctx = session.packages().get_package("hr", &name).unwrap();
        assert!(ctx.is_package_variable(&SqlIdent::from("g_rate")));
    }
}
