// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! The top-level pure entry point: `(source_text, schema, metadata_index,
//! package_cache) -> translated_text | translation_error`. The unit kind is
//! not a separate parameter here -- `CREATE FUNCTION` / `CREATE PROCEDURE` /
//! `CREATE PACKAGE` / `CREATE PACKAGE BODY` self-identify through their
//! leading keywords, which [`crate::grammar::parse`] already dispatches on,
//! so re-asking the caller to name the kind would just duplicate what
//! parsing already determines.

use rowan::ast::AstNode;
use serde::{Deserialize, Serialize};

use crate::analyzer;
use crate::ast::{Function, PackageBody, Procedure, Root};
use crate::emitter;
use crate::error::{Diagnostic, ErrorCategory};
use crate::parser::ParseError;
use crate::session::Session;

/// Everything [`translate`] can fail with: the first fatal [`Diagnostic`]
/// plus, when the failure was a parse error, every recoverable parse error
/// collected along the way -- parsing keeps going past one broken statement
/// so a whole unit's tree is still available for inspection.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("{primary}")]
pub struct TranslationError {
    pub primary: Diagnostic,
    pub parse_errors: Vec<Diagnostic>,
}

impl TranslationError {
    fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self { primary: Diagnostic::new(category, message), parse_errors: Vec::new() }
    }
}

impl From<Diagnostic> for TranslationError {
    fn from(primary: Diagnostic) -> Self {
        Self { primary, parse_errors: Vec::new() }
    }
}

pub type TranslationResult = Result<String, TranslationError>;

/// Non-functional metadata about a successful translation: lines-of-code,
/// outer-join usage. Never affects the emitted text; purely informational,
/// mirroring the shape of `DboFunctionMetaData`/`DboProcedureMetaData`/
/// `DboQueryMetaData`.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TranslationMetadata {
    pub lines_of_code: usize,
    /// Count of Oracle `(+)` outer-join markers found in the source. These
    /// are `UNSUPPORTED_SYNTAX` for the emitter proper, since rewriting
    /// them into ANSI `LEFT JOIN` requires restructuring the `FROM`/`WHERE`
    /// clauses; the count exists to flag the unit for manual follow-up.
    pub outer_join_count: usize,
}

pub struct TranslationOutcome {
    pub sql: String,
    pub metadata: TranslationMetadata,
}

fn first_parse_failure(source: &str, errors: &[ParseError]) -> Option<TranslationError> {
    let first = errors.first()?;
    let parse_errors = errors
        .iter()
        .map(|e| Diagnostic::new(ErrorCategory::ParseError, e.error.to_string()).with_span(source, e.range))
        .collect();
    let primary = Diagnostic::new(ErrorCategory::ParseError, first.error.to_string()).with_span(source, first.range);
    Some(TranslationError { primary, parse_errors })
}

/// Translates one `CREATE FUNCTION` / `CREATE PROCEDURE` / `CREATE PACKAGE`
/// / `CREATE PACKAGE BODY` source unit. `session` carries the
/// [`crate::metadata::MetadataIndex`] and the package context store that
/// must persist across related units within one run.
pub fn translate(session: &mut Session, schema: &str, source: &str) -> TranslationResult {
    let parse = crate::grammar::parse(source);
    if let Some(err) = first_parse_failure(source, &parse.errors) {
        return Err(err);
    }

    let root = Root::cast(parse.tree())
        .ok_or_else(|| TranslationError::new(ErrorCategory::InternalError, "parser produced no root node"))?;

    if let Some(function) = root.function() {
        return translate_function(session, schema, &function);
    }
    if let Some(procedure) = root.procedure() {
        return translate_procedure(session, schema, &procedure);
    }
    if let Some(package) = root.package() {
        return translate_package_spec(session, schema, &package);
    }
    if let Some(body) = root.package_body() {
        return translate_package_body(session, schema, &body);
    }

    Err(TranslationError::new(
        ErrorCategory::UnsupportedSyntax,
        "source is not a CREATE FUNCTION, PROCEDURE, PACKAGE or PACKAGE BODY unit",
    ))
}

/// Runs [`translate`] and additionally computes [`TranslationMetadata`] for
/// the source text. Kept separate from [`translate`] so the primary entry
/// point keeps a pure-function contract exactly: one source string in, one
/// translated string or error out, with no extra payload riding along.
pub fn translate_with_metadata(
    session: &mut Session,
    schema: &str,
    source: &str,
) -> Result<TranslationOutcome, TranslationError> {
    let sql = translate(session, schema, source)?;
    Ok(TranslationOutcome { sql, metadata: collect_metadata(source) })
}

fn collect_metadata(source: &str) -> TranslationMetadata {
    let lines_of_code = source.lines().filter(|l| !l.trim().is_empty()).count();
    let outer_join_count = source.matches("(+)").count();
    TranslationMetadata { lines_of_code, outer_join_count }
}

fn translate_function(session: &mut Session, schema: &str, function: &Function) -> TranslationResult {
    let types = analyzer::analyze_function(function, schema, session.metadata(), None)?;
    Ok(emitter::emit_function(function, schema, session.metadata(), None, Some(&types))?)
}

fn translate_procedure(session: &mut Session, schema: &str, procedure: &Procedure) -> TranslationResult {
    let types = analyzer::analyze_procedure(procedure, schema, session.metadata(), None)?;
    Ok(emitter::emit_procedure(procedure, schema, session.metadata(), None, Some(&types))?)
}

/// A package spec carries only declarations; it has
/// nothing executable to emit, so translating one registers its public
/// variables into the session's package context and returns an empty
/// result. A later `CREATE PACKAGE BODY` for the same name reuses this
/// context instead of starting from nothing.
fn translate_package_spec(session: &mut Session, schema: &str, package: &crate::ast::Package) -> TranslationResult {
    let name = package
        .name()
        .ok_or_else(|| TranslationError::new(ErrorCategory::InternalError, "package has no name"))?;
    let ident = crate::ident::SqlIdent::from(name);
    let metadata = session.metadata().clone();
    let ctx = session.packages().get_or_create_package(schema, &ident);
    if let Some(declare) = package.declare_section() {
        ctx.register_from_declare_section(&declare, &metadata);
    }
    Ok(String::new())
}

/// Translates every function and procedure in a package body, registering
/// body-only variables first, then emitting the package helpers exactly
/// once, then each member in source order.
fn translate_package_body(session: &mut Session, schema: &str, body: &PackageBody) -> TranslationResult {
    let name = body
        .name()
        .ok_or_else(|| TranslationError::new(ErrorCategory::InternalError, "package body has no name"))?;
    let ident = crate::ident::SqlIdent::from(name);
    let metadata = session.metadata().clone();

    {
        let ctx = session.packages().get_or_create_package(schema, &ident);
        if let Some(declare) = body.declare_section() {
            ctx.register_from_declare_section(&declare, &metadata);
        }
    }

    let mut out = String::new();
    if session.packages().emit_helpers_if_needed(schema, &ident) {
        let ctx = session.packages().get_package(schema, &ident).expect("just registered above");
        out.push_str(&emitter::emit_package_helpers(ctx));
    }

    for function in body.functions() {
        let ctx = session.packages().get_package(schema, &ident).expect("just registered above");
        let types = analyzer::analyze_function(&function, schema, &metadata, Some(ctx))?;
        let ctx = session.packages().get_package(schema, &ident).expect("just registered above");
        out.push_str(&emitter::emit_function(&function, schema, &metadata, Some(ctx), Some(&types))?);
        out.push('\n');
    }
    for procedure in body.procedures() {
        let ctx = session.packages().get_package(schema, &ident).expect("just registered above");
        let types = analyzer::analyze_procedure(&procedure, schema, &metadata, Some(ctx))?;
        let ctx = session.packages().get_package(schema, &ident).expect("just registered above");
        out.push_str(&emitter::emit_procedure(&procedure, schema, &metadata, Some(ctx), Some(&types))?);
        out.push('\n');
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataIndex;

    #[test]
    fn translates_a_standalone_function() {
        const INPUT: &str = r#"
            CREATE OR REPLACE FUNCTION calculate_bonus(p_salary NUMBER)
            RETURN NUMBER
            IS
            BEGIN
                RETURN p_salary * 0.1;
            END calculate_bonus;
        "#;
        let mut session = Session::new(MetadataIndex::new());
        let sql = translate(&mut session, "hr", INPUT).unwrap();
        assert!(sql.contains("CREATE OR REPLACE FUNCTION hr.calculate_bonus"));
    }

    #[test]
    fn parse_failure_reports_first_error_with_position() {
        const INPUT: &str = "CREATE OR REPLACE FUNCTION f RETURN NUMBER IS BEGIN";
        let mut session = Session::new(MetadataIndex::new());
        let err = translate(&mut session, "hr", INPUT).unwrap_err();
        assert_eq!(err.primary.category, ErrorCategory::ParseError);
        assert!(err.primary.position.is_some());
    }

    #[test]
    fn package_spec_then_body_share_registered_variables() {
        const SPEC: &str = r#"
            CREATE OR REPLACE PACKAGE utilities IS
                g_rate NUMBER := 0.1;
            END utilities;
        "#;
        const BODY: &str = r#"
            CREATE OR REPLACE PACKAGE BODY utilities IS
                FUNCTION get_rate RETURN NUMBER IS
                BEGIN
                    RETURN g_rate;
                END get_rate;
            END utilities;
        "#;
        let mut session = Session::new(MetadataIndex::new());
        translate(&mut session, "hr", SPEC).unwrap();
        let sql = translate(&mut session, "hr", BODY).unwrap();
        assert!(sql.contains("hr.utilities__package_initializer"));
        assert!(sql.contains("hr.utilities__get_rate"));
        assert!(sql.contains("hr.utilities__g_rate()"));
    }

    #[test]
    fn metadata_counts_outer_join_markers_and_nonblank_lines() {
        const INPUT: &str = "SELECT e.name\nFROM employees e, departments d\nWHERE e.dept_id(+) = d.id;\n";
        let metadata = collect_metadata(INPUT);
        assert_eq!(metadata.outer_join_count, 1);
        assert_eq!(metadata.lines_of_code, 3);
    }
}
