// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Package helper emission: the initializer, one getter and
//! one setter per package variable. Package state lives in session-local
//! configuration values (`set_config`/`current_setting`), keyed by
//! `schema.package.variable`, so every helper is a thin wrapper around the
//! same two builtins regardless of the variable's target type.

use crate::package_context::PackageContext;

use super::datatype::target_type_text;

fn config_key(ctx: &PackageContext, var_name: &str) -> String {
    format!("{}.{}.{}", ctx.schema, ctx.package_name.canonical(), var_name)
}

/// Emits `CREATE OR REPLACE FUNCTION` text for the package initializer plus
/// one getter/setter pair per variable. Called at most once per package per
/// session, gated by [`crate::package_context::PackageContextStore::emit_helpers_if_needed`].
pub fn emit_package_helpers(ctx: &PackageContext) -> String {
    let mut out = String::new();
    out.push_str(&emit_initializer(ctx));
    for (key, var) in ctx.variables.iter() {
        out.push_str(&emit_getter(ctx, key, var));
        out.push_str(&emit_setter(ctx, key, var));
    }
    out
}

fn emit_initializer(ctx: &PackageContext) -> String {
    let prefix = ctx.member_prefix();
    let mut body = String::new();
    for (key, var) in ctx.variables.iter() {
        let config_key = config_key(ctx, key);
        let default_sql = var.default_expression.clone().unwrap_or_else(|| "NULL".to_owned());
        body.push_str(&format!(
            "  IF current_setting('{config_key}', true) IS NULL THEN\n    PERFORM set_config('{config_key}', ({default_sql})::text, false);\n  END IF;\n",
        ));
    }
    format!(
        "CREATE OR REPLACE FUNCTION {prefix}package_initializer() RETURNS void AS $$\nBEGIN\n{body}END;\n$$ LANGUAGE plpgsql;\n\n",
    )
}

fn emit_getter(ctx: &PackageContext, key: &str, var: &crate::scope::VariableDescriptor) -> String {
    let prefix = ctx.member_prefix();
    let config_key = config_key(ctx, key);
    let target_type = target_type_text(&var.source_type_text);
    format!(
        "CREATE OR REPLACE FUNCTION {prefix}{key}() RETURNS {target_type} AS $$\nBEGIN\n  RETURN current_setting('{config_key}', true)::{target_type};\nEND;\n$$ LANGUAGE plpgsql;\n\n",
    )
}

fn emit_setter(ctx: &PackageContext, key: &str, var: &crate::scope::VariableDescriptor) -> String {
    let prefix = ctx.member_prefix();
    let config_key = config_key(ctx, key);
    let target_type = target_type_text(&var.source_type_text);
    format!(
        "CREATE OR REPLACE FUNCTION {prefix}set_{key}(p_value {target_type}) RETURNS void AS $$\nBEGIN\n  PERFORM set_config('{config_key}', p_value::text, false);\nEND;\n$$ LANGUAGE plpgsql;\n\n",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::SqlIdent;
    use crate::metadata::MetadataIndex;
    use crate::scope::ScopeEngine;

    fn sample_ctx() -> PackageContext {
        let mut ctx = PackageContext::new("hr", SqlIdent::from("payroll"));
        let scope = ScopeEngine::new("hr");
        let descriptor = crate::analyzer::describe_variable(
            "g_rate",
            "NUMBER",
            Some("0.1".to_owned()),
            &MetadataIndex::new(),
            "hr",
            &scope,
            &std::collections::HashMap::new(),
        );
        ctx.register_variable(SqlIdent::from("g_rate"), descriptor);
        ctx
    }

    #[test]
    fn initializer_guards_against_overwriting_mutated_state() {
        let ctx = sample_ctx();
        let sql = emit_initializer(&ctx);
        assert!(sql.contains("current_setting('hr.payroll.g_rate', true) IS NULL"));
        assert!(sql.contains("set_config('hr.payroll.g_rate', (0.1)::text, false)"));
    }

    #[test]
    fn getter_and_setter_round_trip_through_the_same_config_key() {
        let ctx = sample_ctx();
        let getter = emit_getter(&ctx, "g_rate", ctx.variables.get("g_rate").unwrap());
        let setter = emit_setter(&ctx, "g_rate", ctx.variables.get("g_rate").unwrap());
        assert!(getter.contains("hr.payroll__g_rate() RETURNS numeric"));
        assert!(setter.contains("hr.payroll__set_g_rate(p_value numeric)"));
        assert!(getter.contains("current_setting('hr.payroll.g_rate', true)::numeric"));
        assert!(setter.contains("set_config('hr.payroll.g_rate', p_value::text, false)"));
    }
}
