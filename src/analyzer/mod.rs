// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! The Type Analyzer: a post-order walk over the typed AST
//! that populates a position-keyed [`TypeCache`], driving the
//! [`ScopeEngine`] for every identifier classification and the
//! [`MetadataIndex`] for column/function lookups. Generalizes the shape of
//! `analyzer::analyze()`'s dispatcher, from "summarize the tree into a flat
//! metadata struct" to "write a type into the cache for every expression
//! node".
//!
//! The analyzer degrades to [`Type::Unknown`] on anything it cannot resolve
//! rather than failing the whole unit; the only errors that propagate out
//! are scope violations (duplicate declaration), which are genuine
//! programming/input errors, not missing metadata.

pub mod builtins;

use std::collections::HashMap;

use rowan::ast::AstNode;

use crate::ast::{
    Argument, ArgumentList, BetweenExpr, Block, BlockStatement, CaseExpr, DeclareSection,
    Expression, Function, FunctionInvocation, IdentGroup, Param, ParamList, Procedure, SelectStmt,
    TableRef, VariableDecl,
};
use crate::error::{Diagnostic, ErrorCategory};
use crate::ident::SqlIdent;
use crate::metadata::MetadataIndex;
use crate::package_context::PackageContext;
use crate::scope::{ScopeEngine, ScopeError, VariableDescriptor};
use crate::syntax::SyntaxKind;
use crate::types::{InlineType, Type, TypeCache};

struct Analyzer<'a> {
    schema: &'a str,
    metadata: &'a MetadataIndex,
    scope: ScopeEngine,
    package_ctx: Option<&'a PackageContext>,
    cache: TypeCache,
    /// Local `TYPE name IS ...` aliases visible in the current declare
    /// section, keyed by canonical alias name, value is the aliased type
    /// phrase text -- substituted in place of a variable's declared type
    /// text before it reaches [`resolve_declared_type`].
    type_aliases: HashMap<String, String>,
}

impl<'a> Analyzer<'a> {
    fn new(schema: &'a str, metadata: &'a MetadataIndex, package_ctx: Option<&'a PackageContext>) -> Self {
        Self {
            schema,
            metadata,
            scope: ScopeEngine::new(schema),
            package_ctx,
            cache: TypeCache::new(),
            type_aliases: HashMap::new(),
        }
    }

    fn scope_err(err: ScopeError) -> Diagnostic {
        Diagnostic::new(ErrorCategory::DupDecl, err.to_string())
    }

    // -- declarations --------------------------------------------------

    fn declare_params(&mut self, params: &ParamList) -> Result<(), Diagnostic> {
        for param in params.params() {
            self.declare_one(param.name(), param.type_name().map(|t| t.text()))?;
        }
        Ok(())
    }

    fn declare_locals(&mut self, declare: &DeclareSection) -> Result<(), Diagnostic> {
        self.type_aliases.extend(collect_type_aliases(declare));
        for cursor in declare.cursor_decls() {
            if let Some(query) = cursor.query() {
                self.analyze_select(&query);
            }
            if let Some(name_tok) = cursor.name() {
                let ident = SqlIdent::from(name_tok.name());
                self.scope
                    .declare(ident.clone(), VariableDescriptor::new(ident, "CURSOR", Type::Cursor))
                    .map_err(Self::scope_err)?;
            }
        }
        for var in declare.variable_decls() {
            self.declare_variable(&var)?;
        }
        Ok(())
    }

    fn declare_variable(&mut self, var: &VariableDecl) -> Result<(), Diagnostic> {
        if let Some(default_expr) = var.default_expr() {
            self.analyze_expr(&default_expr);
        }
        self.declare_one(var.name(), var.type_name().map(|t| t.text()))
    }

    fn declare_one(
        &mut self,
        name: Option<crate::ast::Ident>,
        type_text: Option<String>,
    ) -> Result<(), Diagnostic> {
        declare_plain(&mut self.scope, name, type_text, self.metadata, self.schema, &self.type_aliases)
            .map_err(Self::scope_err)
    }

    // -- blocks & statements --------------------------------------------

    fn analyze_body(&mut self, block: &Block) -> Result<(), Diagnostic> {
        if let Some(declare) = block.declare_section() {
            self.declare_locals(&declare)?;
        }
        for stmt in block.statements() {
            self.analyze_statement(&stmt);
        }
        if let Some(exceptions) = block.exception_section() {
            for handler in exceptions.handlers() {
                for stmt in handler.body() {
                    self.analyze_statement(&stmt);
                }
            }
        }
        Ok(())
    }

    /// Runs `f` inside a freshly pushed variable scope, guaranteeing the
    /// matching pop happens even if `f` returns an error -- every exit path,
    /// including error unwind, leaves the scope balanced.
    fn with_var_scope<R>(&mut self, label: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.scope.push_var_scope(label);
        let result = f(self);
        self.scope.pop_var_scope();
        result
    }

    fn with_query_scope<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.scope.push_query_scope();
        let result = f(self);
        self.scope.pop_query_scope();
        result
    }

    fn analyze_nested_block(&mut self, block: &Block) {
        let _ = self.with_var_scope("block", |this| this.analyze_body(block));
    }

    fn analyze_statement(&mut self, stmt: &BlockStatement) {
        if let Some(assign) = stmt.assign_stmt() {
            if let Some(idx) = assign.index_expr() {
                self.analyze_expr(&idx);
            }
            if let Some(value) = assign.value() {
                self.analyze_expr(&value);
            }
            return;
        }
        if let Some(call) = stmt.call_stmt() {
            if let Some(invocation) = call.invocation() {
                self.analyze_invocation(&invocation);
            }
            return;
        }
        if let Some(ret) = stmt.return_stmt() {
            if let Some(value) = ret.value() {
                self.analyze_expr(&value);
            }
            return;
        }
        if let Some(if_stmt) = stmt.if_stmt() {
            if let Some(cond) = if_stmt.condition() {
                self.analyze_expr(&cond);
            }
            for s in if_stmt.then_branch() {
                self.analyze_statement(&s);
            }
            for elsif in if_stmt.elsif_clauses() {
                if let Some(cond) = elsif.condition() {
                    self.analyze_expr(&cond);
                }
                for s in elsif.branch() {
                    self.analyze_statement(&s);
                }
            }
            return;
        }
        if let Some(loop_stmt) = stmt.loop_stmt() {
            for s in loop_stmt.body() {
                self.analyze_statement(&s);
            }
            return;
        }
        if let Some(while_stmt) = stmt.while_loop_stmt() {
            if let Some(cond) = while_stmt.condition() {
                self.analyze_expr(&cond);
            }
            for s in while_stmt.body() {
                self.analyze_statement(&s);
            }
            return;
        }
        if let Some(for_stmt) = stmt.for_loop_stmt() {
            self.with_var_scope("for_loop", |this| {
                if let Some(start) = for_stmt.range_start() {
                    this.analyze_expr(&start);
                }
                if let Some(end) = for_stmt.range_end() {
                    this.analyze_expr(&end);
                }
                if let Some(name) = for_stmt.loop_var() {
                    let ident = SqlIdent::from(name.name());
                    let _ = this.scope.declare(
                        ident.clone(),
                        VariableDescriptor::new(ident, "PLS_INTEGER", Type::numeric()),
                    );
                }
                for s in for_stmt.body() {
                    this.analyze_statement(&s);
                }
            });
            return;
        }
        if let Some(cursor_loop) = stmt.cursor_for_loop_stmt() {
            self.with_var_scope("cursor_for_loop", |this| {
                let record_type = if let Some(query) = cursor_loop.query() {
                    this.analyze_select(&query)
                } else if let Some(named) = cursor_loop.named_cursor() {
                    named
                        .last_segment()
                        .and_then(|n| this.scope.lookup(&SqlIdent::from(n)).cloned())
                        .map(|v| v.resolved_type)
                        .unwrap_or(Type::Record(Vec::new()))
                } else {
                    Type::Record(Vec::new())
                };
                let record_type = match record_type {
                    Type::Record(fields) => Type::Record(fields),
                    _ => Type::Record(Vec::new()),
                };
                if let Some(name) = cursor_loop.loop_var() {
                    let ident = SqlIdent::from(name.name());
                    let _ = this
                        .scope
                        .declare(ident.clone(), VariableDescriptor::new(ident, "RECORD", record_type));
                }
                for s in cursor_loop.body() {
                    this.analyze_statement(&s);
                }
            });
            return;
        }
        if let Some(exit_stmt) = stmt.exit_stmt() {
            if let Some(cond) = exit_stmt.condition() {
                self.analyze_expr(&cond);
            }
            return;
        }
        if let Some(case_stmt) = stmt.case_stmt() {
            if let Some(selector) = case_stmt.selector() {
                self.analyze_expr(&selector);
            }
            for clause in case_stmt.when_clauses() {
                if let Some(cond) = clause.condition() {
                    self.analyze_expr(&cond);
                }
                for s in clause.body_statements() {
                    self.analyze_statement(&s);
                }
            }
            for s in case_stmt.else_branch() {
                self.analyze_statement(&s);
            }
            return;
        }
        if let Some(nested) = stmt.block() {
            self.analyze_nested_block(&nested);
            return;
        }
        if let Some(select) = stmt.nested_select() {
            self.analyze_select(&select);
        }
        // RaiseStmt, NullStmt, CommitStmt, RollbackStmt carry nothing to type.
    }

    // -- queries ----------------------------------------------------------

    fn analyze_select(&mut self, select: &SelectStmt) -> Type {
        self.with_query_scope(|this| {
            if let Some(from) = select.from_clause() {
                for table in from.tables() {
                    this.register_table(&table);
                }
                for join in from.joins() {
                    if let Some(table) = join.table() {
                        this.register_table(&table);
                    }
                    if let Some(on) = join.on_condition() {
                        this.analyze_expr(&on);
                    }
                }
            }
            let mut first_col_type = Type::Unknown;
            if let Some(select_clause) = select.select_clause() {
                for (i, col) in select_clause.columns().into_iter().enumerate() {
                    if let Some(expr) = col.expr() {
                        let ty = this.analyze_expr(&expr);
                        if i == 0 {
                            first_col_type = ty;
                        }
                    }
                }
            }
            if let Some(where_clause) = select.where_clause() {
                if let Some(cond) = where_clause.condition() {
                    this.analyze_expr(&cond);
                }
            }
            if select.is_scalar_subquery() {
                first_col_type
            } else {
                Type::Unknown
            }
        })
    }

    fn register_table(&mut self, table: &TableRef) {
        let Some(name) = table.name() else { return };
        let qualified = format!("{}.{}", self.schema, name.name());
        if let Some(alias) = table.alias() {
            self.scope.register_table_alias(&SqlIdent::from(alias.name()), qualified.clone());
        }
        self.scope.register_table_alias(&SqlIdent::from(name.name()), qualified);
    }

    // -- expressions --------------------------------------------------

    fn analyze_expr(&mut self, expr: &Expression) -> Type {
        let range = expr.range();
        if let Some(ty) = self.cache.get(range) {
            // Already visited (shared sub-node reached through two paths);
            // the cache is write-once, so reuse instead of inserting again.
            return ty.clone();
        }
        let ty = self.infer_expr(expr);
        self.cache.insert(range, ty.clone());
        ty
    }

    fn infer_expr(&mut self, expr: &Expression) -> Type {
        if let Some(select) = expr.syntax().children().find_map(SelectStmt::cast) {
            return self.analyze_select(&select);
        }
        if let Some(between) = expr.syntax().children().find_map(BetweenExpr::cast) {
            if let Some(a) = between.operand() {
                self.analyze_expr(&a);
            }
            if let Some(b) = between.low() {
                self.analyze_expr(&b);
            }
            if let Some(c) = between.high() {
                self.analyze_expr(&c);
            }
            return Type::Boolean;
        }
        if let Some(case_expr) = expr.syntax().children().find_map(CaseExpr::cast) {
            return self.analyze_case_expr(&case_expr);
        }
        if let Some(invocation) = expr.function_invocation() {
            return self.analyze_invocation(&invocation);
        }
        if expr.quoted_literal().is_some() {
            return Type::Text;
        }
        if expr.integer_literal().is_some() || expr.number_literal().is_some() {
            return Type::numeric();
        }
        let text_upper = expr.text().trim().to_uppercase();
        if text_upper == "NULL" {
            return Type::Null;
        }
        if text_upper == "TRUE" || text_upper == "FALSE" {
            return Type::Boolean;
        }

        if let Some(op) = expr.operator() {
            let operand_types: Vec<Type> =
                expr.operands().iter().map(|operand| self.analyze_expr(operand)).collect();
            return combine_operator(op.kind(), &operand_types);
        }

        // Parenthesized expression: the single child re-uses its own type.
        let operands = expr.operands();
        if operands.len() == 1 {
            return self.analyze_expr(&operands[0]);
        }

        Type::Unknown
    }

    fn analyze_case_expr(&mut self, case_expr: &CaseExpr) -> Type {
        let mut result: Option<Type> = None;
        for clause in case_expr.when_clauses() {
            if let Some(cond) = clause.condition() {
                self.analyze_expr(&cond);
            }
            if let Some(res) = clause.result() {
                let ty = self.analyze_expr(&res);
                result = Some(match result {
                    Some(acc) => acc.higher(&ty).clone(),
                    None => ty,
                });
            }
        }
        if let Some(else_expr) = case_expr.else_expr() {
            let ty = self.analyze_expr(&else_expr);
            result = Some(match result {
                Some(acc) => acc.higher(&ty).clone(),
                None => ty,
            });
        }
        result.unwrap_or(Type::Unknown)
    }

    fn analyze_invocation(&mut self, invocation: &FunctionInvocation) -> Type {
        let Some(group) = invocation.ident_group() else {
            return Type::Unknown;
        };
        let segments = group.segments();
        let arg_types = self.analyze_arguments(invocation.argument_list());

        match segments.as_slice() {
            [name] => self.resolve_unqualified(name, invocation.has_argument_list(), &arg_types),
            [first, second] => self.resolve_qualified(first, second, invocation.has_argument_list()),
            _ => Type::Unknown,
        }
    }

    fn analyze_arguments(&mut self, list: Option<ArgumentList>) -> Vec<Type> {
        list.map(|list| {
            list.arguments()
                .iter()
                .map(|arg: &Argument| arg.expr().map(|e| self.analyze_expr(&e)).unwrap_or(Type::Unknown))
                .collect()
        })
        .unwrap_or_default()
    }

    fn resolve_unqualified(&mut self, name: &str, has_args: bool, arg_types: &[Type]) -> Type {
        let ident = SqlIdent::from(name);

        if let Some(var) = self.scope.lookup(&ident) {
            return if has_args { element_type_of(var) } else { var.resolved_type.clone() };
        }
        if let Some(ctx) = self.package_ctx {
            if let Some(var) = ctx.lookup_variable(&ident) {
                return if has_args { element_type_of(var) } else { var.resolved_type.clone() };
            }
        }
        if let Some(ty) = builtins::pseudo_column_type(name) {
            return ty;
        }
        if let Some(ty) = builtins::builtin_return_type(name, arg_types) {
            return ty;
        }
        if let Some(sig) = self.metadata.function_signature(self.schema, name) {
            return sig.return_type.as_deref().map(scalar_type_from_text).unwrap_or(Type::Unknown);
        }
        if !has_args {
            for table in self.scope.visible_tables() {
                if let Some(col_type) = self.metadata.column_type(table, &ident) {
                    return scalar_type_from_text(col_type);
                }
            }
        }
        Type::Unknown
    }

    fn resolve_qualified(&mut self, first: &str, second: &str, has_args: bool) -> Type {
        let first_ident = SqlIdent::from(first);

        if self.scope.query_scope_depth() > 0 && !has_args {
            if let Some(table) = self.scope.resolve_alias(&first_ident) {
                let table = table.to_owned();
                if let Some(col_type) = self.metadata.column_type(&table, &SqlIdent::from(second)) {
                    return scalar_type_from_text(col_type);
                }
                return Type::Unknown;
            }
        }
        if let Some(ctx) = self.package_ctx {
            if SqlIdent::from(first) == ctx.package_name && !has_args {
                if let Some(var) = ctx.lookup_variable(&SqlIdent::from(second)) {
                    return var.resolved_type.clone();
                }
            }
        }
        Type::Unknown
    }
}

fn element_type_of(var: &VariableDescriptor) -> Type {
    match &var.inline_type {
        Some(InlineType::TableOf(inner)) => inline_scalar_type(inner),
        Some(InlineType::Varray { element, .. }) => scalar_type_from_text(element),
        Some(InlineType::IndexBy { element, .. }) => scalar_type_from_text(element),
        _ => Type::Unknown,
    }
}

fn inline_scalar_type(inline: &InlineType) -> Type {
    match inline {
        InlineType::Scalar(text) => scalar_type_from_text(text),
        InlineType::TableOf(inner) => inline_scalar_type(inner),
        InlineType::Varray { element, .. } => scalar_type_from_text(element),
        InlineType::IndexBy { element, .. } => scalar_type_from_text(element),
        InlineType::RowType(_) | InlineType::TypeRef(_) | InlineType::Record(_) => Type::Unknown,
    }
}

fn combine_operator(kind: SyntaxKind, operands: &[Type]) -> Type {
    match kind {
        SyntaxKind::ComparisonOp | SyntaxKind::LogicOp => Type::Boolean,
        SyntaxKind::Concat => Type::Text,
        SyntaxKind::ArithmeticOp | SyntaxKind::Asterisk | SyntaxKind::Slash => {
            if operands.iter().any(Type::is_null) {
                return Type::Null;
            }
            match operands {
                [only] => only.clone(),
                [a, b, ..] => match (a, b) {
                    (Type::Date, b) | (Type::Timestamp, b) if b.is_numeric() => a.clone(),
                    (Type::Date, Type::Date) | (Type::Timestamp, Type::Timestamp) => Type::numeric(),
                    (a, b) if a.is_numeric() && b.is_numeric() => Type::numeric(),
                    _ => Type::Unknown,
                },
                [] => Type::Unknown,
            }
        }
        _ => Type::Unknown,
    }
}

/// Declares every parameter and local variable of a function/procedure body
/// into `scope`, without analyzing expressions. The type-analysis pass and
/// the code-emission pass are separate walks over the same AST; both need an
/// identically-populated [`ScopeEngine`] to agree on name classification,
/// so this is the single place that builds it. [`Analyzer`]
/// calls it too (via [`declare_plain`]), layering default-expression
/// analysis on top.
pub(crate) fn rebuild_scope(
    scope: &mut ScopeEngine,
    metadata: &MetadataIndex,
    schema: &str,
    params: Option<&ParamList>,
    declare: Option<&DeclareSection>,
) {
    let type_aliases = declare.map(collect_type_aliases).unwrap_or_default();
    if let Some(params) = params {
        for param in params.params() {
            let _ =
                declare_plain(scope, param.name(), param.type_name().map(|t| t.text()), metadata, schema, &type_aliases);
        }
    }
    if let Some(declare) = declare {
        for cursor in declare.cursor_decls() {
            if let Some(name_tok) = cursor.name() {
                let ident = SqlIdent::from(name_tok.name());
                let _ = scope.declare(ident.clone(), VariableDescriptor::new(ident, "CURSOR", Type::Cursor));
            }
        }
        for var in declare.variable_decls() {
            let _ =
                declare_plain(scope, var.name(), var.type_name().map(|t| t.text()), metadata, schema, &type_aliases);
        }
    }
}

fn declare_plain(
    scope: &mut ScopeEngine,
    name: Option<crate::ast::Ident>,
    type_text: Option<String>,
    metadata: &MetadataIndex,
    schema: &str,
    type_aliases: &HashMap<String, String>,
) -> Result<(), ScopeError> {
    let Some(name_tok) = name else { return Ok(()) };
    let descriptor =
        describe_variable(&name_tok.name(), &type_text.unwrap_or_default(), None, metadata, schema, scope, type_aliases);
    let ident = descriptor.name.clone();
    scope.declare(ident, descriptor)
}

/// Collects this declare section's `TYPE name IS ...` local aliases, keyed
/// by canonical name, value is the aliased type phrase text (e.g. `TABLE OF
/// NUMBER`). Looked up by [`describe_variable`] when a variable's declared
/// type is a bare identifier rather than an inline composite/collection
/// phrase.
pub(crate) fn collect_type_aliases(declare: &DeclareSection) -> HashMap<String, String> {
    declare
        .type_decls()
        .into_iter()
        .filter_map(|decl| {
            let name = decl.name()?;
            let type_text = decl.type_name()?.text();
            Some((SqlIdent::from(name.name()).canonical(), type_text))
        })
        .collect()
}

/// Builds a [`VariableDescriptor`] for a declared name without touching a
/// scope stack -- used both by [`declare_plain`] (which then pushes the
/// result onto a [`ScopeEngine`] frame) and by package-variable collection,
/// which stores descriptors in a
/// [`crate::package_context::PackageContext`] instead. `%TYPE` resolution
/// against a local variable needs *some* scope to look in; package-level
/// declarations pass an empty one, since a package variable's `%TYPE` anchor
/// is realistically always a table column, never a subprogram-local.
pub(crate) fn describe_variable(
    name: &str,
    type_text: &str,
    default_text: Option<String>,
    metadata: &MetadataIndex,
    schema: &str,
    scope: &ScopeEngine,
    type_aliases: &HashMap<String, String>,
) -> VariableDescriptor {
    let ident = SqlIdent::from(name);
    let aliased = type_aliases.get(&SqlIdent::from(type_text.trim()).canonical());
    let (mut resolved, inline) = resolve_declared_type(aliased.map(String::as_str).unwrap_or(type_text));
    if let Some(InlineType::TypeRef(target)) = &inline {
        resolved = finalize_type_ref(target, metadata, schema, scope);
    }
    if let Some(InlineType::RowType(table)) = &inline {
        resolved = resolve_rowtype_fields(table, metadata, schema);
    }
    let mut descriptor = VariableDescriptor::new(ident, type_text, resolved);
    if let Some(inline) = inline {
        descriptor = descriptor.with_inline_type(inline);
    }
    descriptor.default_expression = default_text;
    descriptor
}

/// Resolves `base%TYPE`: `base` is either `table.column` (metadata lookup)
/// or a variable name already visible in scope.
pub(crate) fn finalize_type_ref(target: &SqlIdent, metadata: &MetadataIndex, schema: &str, scope: &ScopeEngine) -> Type {
    let text = target.as_str();
    if let Some((table, column)) = text.split_once('.') {
        let qualified = format!("{schema}.{table}");
        if let Some(col_type) = metadata.column_type(&qualified, &SqlIdent::from(column)) {
            return scalar_type_from_text(col_type);
        }
    }
    scope.lookup(&SqlIdent::from(text)).map(|v| v.resolved_type.clone()).unwrap_or(Type::Unknown)
}

/// Resolves `table%ROWTYPE` against the metadata table's column list, so
/// that later field reads (`v_emp.salary`) know the field's scalar type
/// instead of falling back to the document cast.
fn resolve_rowtype_fields(table: &SqlIdent, metadata: &MetadataIndex, schema: &str) -> Type {
    let qualified = format!("{schema}.{}", table.as_str());
    match metadata.table_columns(&qualified) {
        Some(columns) => {
            let fields =
                columns.ordered().into_iter().map(|(name, ty)| (name.clone(), scalar_type_from_text(ty))).collect();
            Type::Record(fields)
        }
        None => Type::Record(Vec::new()),
    }
}

/// Classifies a raw `TypeName` token phrase into its resolved scalar/
/// composite shape. `%TYPE` is left as
/// [`InlineType::TypeRef`] for the caller to resolve against scope/metadata,
/// since that needs context this free function doesn't have.
pub(crate) fn resolve_declared_type(raw: &str) -> (Type, Option<InlineType>) {
    let text = raw.trim();
    let upper = text.to_uppercase();

    if let Some(base) = strip_ci_suffix(text, "%ROWTYPE") {
        return (Type::Record(Vec::new()), Some(InlineType::RowType(SqlIdent::from(base))));
    }
    if let Some(base) = strip_ci_suffix(text, "%TYPE") {
        return (Type::Unknown, Some(InlineType::TypeRef(SqlIdent::from(base))));
    }
    if upper.starts_with("TABLE OF") {
        let rest = text[8..].trim();
        if let Some(idx) = upper.find(" INDEX BY ") {
            let element_part = text[8..idx].trim().to_owned();
            let key_part = text[idx + " INDEX BY ".len()..].trim();
            let key_is_text = matches!(scalar_type_from_text(key_part), Type::Text);
            let elem_type = scalar_type_from_text(&element_part);
            return (
                Type::Collection(Box::new(elem_type)),
                Some(InlineType::IndexBy { key_is_text, element: element_part }),
            );
        }
        let elem_type = scalar_type_from_text(rest);
        return (
            Type::Collection(Box::new(elem_type)),
            Some(InlineType::TableOf(Box::new(InlineType::Scalar(rest.to_owned())))),
        );
    }
    if upper.starts_with("VARRAY") {
        if let (Some(lp), Some(of_idx)) = (text.find('('), upper.find(" OF ")) {
            let close = text[lp..].find(')').map(|i| lp + i).unwrap_or(text.len());
            let bound: u32 = text[lp + 1..close].trim().parse().unwrap_or(0);
            let element = text[of_idx + 4..].trim().to_owned();
            let elem_type = scalar_type_from_text(&element);
            return (Type::Collection(Box::new(elem_type)), Some(InlineType::Varray { element, bound }));
        }
        return (Type::Unknown, None);
    }
    if upper.starts_with("RECORD") {
        if let (Some(lp), Some(rp)) = (text.find('('), text.rfind(')')) {
            let fields: Vec<(SqlIdent, String)> = split_top_level_commas(&text[lp + 1..rp])
                .into_iter()
                .filter_map(|field| {
                    let field = field.trim();
                    let mut parts = field.splitn(2, char::is_whitespace);
                    let name = parts.next()?.trim();
                    let ty_text = parts.next().unwrap_or("").trim();
                    Some((SqlIdent::from(name), ty_text.to_owned()))
                })
                .collect();
            let resolved = fields.iter().map(|(n, t)| (n.clone(), scalar_type_from_text(t))).collect();
            return (Type::Record(resolved), Some(InlineType::Record(fields)));
        }
        return (Type::Record(Vec::new()), Some(InlineType::Record(Vec::new())));
    }

    (scalar_type_from_text(text), None)
}

pub(crate) fn scalar_type_from_text(raw: &str) -> Type {
    let upper = raw.trim().to_uppercase();
    let head = upper.split(|c: char| c == '(' || c.is_whitespace()).next().unwrap_or("");
    match head {
        "NUMBER" | "INTEGER" | "INT" | "FLOAT" | "DECIMAL" | "PLS_INTEGER" | "BINARY_INTEGER" => {
            Type::numeric()
        }
        "VARCHAR2" | "VARCHAR" | "CHAR" | "NCHAR" | "NVARCHAR2" => Type::Text,
        "DATE" => Type::Date,
        "TIMESTAMP" => Type::Timestamp,
        "BOOLEAN" => Type::Boolean,
        "CLOB" | "NCLOB" => Type::LobText,
        "BLOB" | "BFILE" => Type::LobBinary,
        "XMLTYPE" => Type::Xml,
        _ => {
            if let Some((schema, name)) = upper.split_once('.') {
                Type::Object(SqlIdent::from(schema), SqlIdent::from(name))
            } else {
                Type::Unknown
            }
        }
    }
}

fn strip_ci_suffix<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let trimmed = s.trim_end();
    if trimmed.len() >= suffix.len() && trimmed[trimmed.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
    {
        Some(trimmed[..trimmed.len() - suffix.len()].trim_end())
    } else {
        None
    }
}

fn split_top_level_commas(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Walks a function body, returning its populated type cache. `package_ctx`
/// is `Some` when this function is a package member, so package-variable
/// references resolve through it ahead of schema-function fallback.
pub fn analyze_function(
    function: &Function,
    schema: &str,
    metadata: &MetadataIndex,
    package_ctx: Option<&PackageContext>,
) -> Result<TypeCache, Diagnostic> {
    let mut analyzer = Analyzer::new(schema, metadata, package_ctx);
    let label = function.name().unwrap_or_default();
    let result = analyzer.with_var_scope(&label, |this| {
        if let Some(params) = function.header().and_then(|h| h.param_list()) {
            this.declare_params(&params)?;
        }
        if let Some(body) = function.body() {
            this.analyze_body(&body)?;
        }
        Ok(())
    });
    result?;
    debug_assert!(analyzer.scope.is_balanced());
    Ok(analyzer.cache)
}

pub fn analyze_procedure(
    procedure: &Procedure,
    schema: &str,
    metadata: &MetadataIndex,
    package_ctx: Option<&PackageContext>,
) -> Result<TypeCache, Diagnostic> {
    let mut analyzer = Analyzer::new(schema, metadata, package_ctx);
    let label = procedure.name().unwrap_or_default();
    let result = analyzer.with_var_scope(&label, |this| {
        if let Some(params) = procedure.header().and_then(|h| h.param_list()) {
            this.declare_params(&params)?;
        }
        if let Some(body) = procedure.body() {
            this.analyze_body(&body)?;
        }
        Ok(())
    });
    result?;
    debug_assert!(analyzer.scope.is_balanced());
    Ok(analyzer.cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Root;

    fn function_cache(input: &str, schema: &str, metadata: &MetadataIndex) -> TypeCache {
        let parse = crate::grammar::parse_function_source(input);
        let root = Root::cast(parse.tree()).unwrap();
        let function = root.function().unwrap();
        analyze_function(&function, schema, metadata, None).unwrap()
    }

    #[test]
    fn standalone_function_call_is_not_element_access() {
        const INPUT: &str = r#"
            CREATE OR REPLACE FUNCTION bonus_report
            IS
                v_bonus NUMBER;
            BEGIN
                v_bonus := calculate_bonus(1000);
            END bonus_report;
        "#;
        let metadata = MetadataIndex::new();
        let cache = function_cache(INPUT, "hr", &metadata);
        assert!(cache.len() > 0);
    }

    #[test]
    fn date_plus_numeric_is_date() {
        const INPUT: &str = r#"
            CREATE OR REPLACE FUNCTION f
            IS
                v_date DATE;
                v_result DATE;
            BEGIN
                v_result := v_date + 1;
            END f;
        "#;
        let metadata = MetadataIndex::new();
        let parse = crate::grammar::parse_function_source(INPUT);
        let root = Root::cast(parse.tree()).unwrap();
        let function = root.function().unwrap();
        let cache = analyze_function(&function, "hr", &metadata, None).unwrap();
        let body = function.body().unwrap();
        let assign = body.statements()[0].assign_stmt().unwrap();
        let value = assign.value().unwrap();
        assert_eq!(cache.get(value.range()), Some(&Type::Date));
    }

    #[test]
    fn scalar_subquery_bubbles_column_type() {
        const INPUT: &str = r#"
            CREATE OR REPLACE FUNCTION f
            IS
                v_count NUMBER;
            BEGIN
                v_count := (SELECT salary FROM employees);
            END f;
        "#;
        let metadata = MetadataIndex::new().with_table(
            "hr.employees",
            crate::metadata::TableColumns::new(std::collections::HashMap::from([(
                SqlIdent::from("salary"),
                "NUMBER".to_owned(),
            )])),
        );
        let parse = crate::grammar::parse_function_source(INPUT);
        let root = Root::cast(parse.tree()).unwrap();
        let function = root.function().unwrap();
        let cache = analyze_function(&function, "hr", &metadata, None).unwrap();
        let body = function.body().unwrap();
        let assign = body.statements()[0].assign_stmt().unwrap();
        let value = assign.value().unwrap();
        assert_eq!(cache.get(value.range()), Some(&Type::numeric()));
    }

    #[test]
    fn duplicate_local_declaration_surfaces_as_dup_decl() {
        const INPUT: &str = r#"
            CREATE OR REPLACE FUNCTION f
            IS
                v_x NUMBER;
                v_x NUMBER;
            BEGIN
                NULL;
            END f;
        "#;
        let metadata = MetadataIndex::new();
        let parse = crate::grammar::parse_function_source(INPUT);
        let root = Root::cast(parse.tree()).unwrap();
        let function = root.function().unwrap();
        let err = analyze_function(&function, "hr", &metadata, None).unwrap_err();
        assert_eq!(err.category, ErrorCategory::DupDecl);
    }
}
