// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2024 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! The Code Emitter: a second tree-walk over the same typed
//! AST the Type Analyzer already visited, this one producing PL/pgSQL text
//! instead of populating a type cache. It rebuilds an identical
//! [`ScopeEngine`] from scratch (via [`crate::analyzer::rebuild_scope`]) so
//! both passes agree on every identifier's classification without sharing
//! mutable state between them.

pub mod datatype;
pub mod package;

pub use package::emit_package_helpers;

use std::collections::HashMap;

use rowan::ast::AstNode;

use crate::analyzer::builtins;
use crate::analyzer::{rebuild_scope, resolve_declared_type, scalar_type_from_text};
use crate::ast::{
    AssignStmt, AstToken, Block, BlockStatement, CallStmt, CaseExpr, CaseStmt, CursorForLoopStmt,
    Expression, ForLoopStmt, Function, FunctionInvocation, IfStmt, Procedure, SelectStmt, TableRef,
};
use crate::error::{Diagnostic, ErrorCategory};
use crate::ident::SqlIdent;
use crate::metadata::MetadataIndex;
use crate::package_context::PackageContext;
use crate::scope::{ScopeEngine, VariableDescriptor};
use crate::syntax::SyntaxKind;
use crate::types::{InlineType, Type, TypeCache};

/// How a two-segment `first.second` reference resolves, shared by the read
/// path ([`Emitter::emit_qualified`]) and the write path
/// ([`Emitter::emit_assign_stmt`]).
enum TwoSegmentTarget {
    TableColumn,
    RecordField { cast: String, is_document: bool },
    PackageMember,
}

struct Emitter<'a> {
    schema: &'a str,
    metadata: &'a MetadataIndex,
    scope: ScopeEngine,
    package_ctx: Option<&'a PackageContext>,
    /// The type cache the analyzer already built for this same parsed tree,
    /// keyed by CST range -- consulted by `quick_type` before it falls back
    /// to its own best-effort inference. `None` for call sites that emit
    /// without a prior analysis pass (package helper emission).
    types: Option<&'a TypeCache>,
    /// Emitted `SELECT` text for every named cursor in scope, keyed by the
    /// cursor's canonical name -- resolved once when its `DECLARE` is
    /// visited, consumed by `FOR r IN my_cursor LOOP`.
    cursor_queries: HashMap<String, String>,
    indent: usize,
}

impl<'a> Emitter<'a> {
    fn new(
        schema: &'a str,
        metadata: &'a MetadataIndex,
        package_ctx: Option<&'a PackageContext>,
        types: Option<&'a TypeCache>,
    ) -> Self {
        Self {
            schema,
            metadata,
            scope: ScopeEngine::new(schema),
            package_ctx,
            types,
            cursor_queries: HashMap::new(),
            indent: 0,
        }
    }

    fn ln(&self, text: &str) -> String {
        format!("{}{text}\n", "  ".repeat(self.indent))
    }

    fn qualified_member_name(&self, name: &str) -> String {
        match self.package_ctx {
            Some(ctx) => format!("{}{}", ctx.member_prefix(), name.to_lowercase()),
            None => format!("{}.{}", self.schema, name.to_lowercase()),
        }
    }

    // -- declarations ---------------------------------------------------

    fn collect_cursor_queries(&mut self, declare: &crate::ast::DeclareSection) {
        for cursor in declare.cursor_decls() {
            let (Some(name), Some(query)) = (cursor.name(), cursor.query()) else { continue };
            let sql = self.emit_select(&query);
            self.cursor_queries.insert(SqlIdent::from(name.name()).canonical(), sql);
        }
    }

    fn emit_params(&self, params: Option<&crate::ast::ParamList>) -> String {
        params
            .map(|p| {
                p.params()
                    .iter()
                    .map(|param| {
                        let name = param.name().map(|n| n.name()).unwrap_or_default();
                        let type_text = param.type_name().map(|t| t.text()).unwrap_or_default();
                        format!("{name} {}", datatype::target_type_text(&type_text))
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default()
    }

    fn emit_declare_lines(&mut self, declare: &crate::ast::DeclareSection) -> String {
        let mut out = String::new();
        for var in declare.variable_decls() {
            let Some(name) = var.name() else { continue };
            let type_text = var.type_name().map(|t| t.text()).unwrap_or_default();
            let (_, inline) = resolve_declared_type(&type_text);
            let target_type = datatype::target_type_text(&type_text);
            let default = match var.default_expr() {
                Some(expr) => self.emit_expr(&expr),
                None if inline.is_some() => "'{}'::jsonb".to_owned(),
                None => String::new(),
            };
            if default.is_empty() {
                out.push_str(&format!("  {} {};\n", name.name(), target_type));
            } else {
                out.push_str(&format!("  {} {} := {};\n", name.name(), target_type, default));
            }
        }
        out
    }

    // -- statements -------------------------------------------------------

    fn emit_statement(&mut self, stmt: &BlockStatement) -> String {
        if let Some(assign) = stmt.assign_stmt() {
            return self.emit_assign_stmt(&assign);
        }
        if let Some(call) = stmt.call_stmt() {
            return self.emit_call_stmt(&call);
        }
        if let Some(ret) = stmt.return_stmt() {
            return match ret.value() {
                Some(v) => {
                    let text = self.emit_expr(&v);
                    self.ln(&format!("RETURN {text};"))
                }
                None => self.ln("RETURN;"),
            };
        }
        if let Some(if_stmt) = stmt.if_stmt() {
            return self.emit_if_stmt(&if_stmt);
        }
        if let Some(loop_stmt) = stmt.loop_stmt() {
            let mut out = self.ln("LOOP");
            self.indent += 1;
            for s in loop_stmt.body() {
                out.push_str(&self.emit_statement(&s));
            }
            self.indent -= 1;
            out.push_str(&self.ln("END LOOP;"));
            return out;
        }
        if let Some(while_stmt) = stmt.while_loop_stmt() {
            let cond = while_stmt.condition().map(|c| self.emit_expr(&c)).unwrap_or_else(|| "TRUE".to_owned());
            let mut out = self.ln(&format!("WHILE {cond} LOOP"));
            self.indent += 1;
            for s in while_stmt.body() {
                out.push_str(&self.emit_statement(&s));
            }
            self.indent -= 1;
            out.push_str(&self.ln("END LOOP;"));
            return out;
        }
        if let Some(for_stmt) = stmt.for_loop_stmt() {
            return self.emit_for_loop(&for_stmt);
        }
        if let Some(cursor_loop) = stmt.cursor_for_loop_stmt() {
            return self.emit_cursor_for_loop(&cursor_loop);
        }
        if let Some(exit_stmt) = stmt.exit_stmt() {
            return match exit_stmt.condition() {
                Some(cond) => {
                    let c = self.emit_expr(&cond);
                    self.ln(&format!("EXIT WHEN {c};"))
                }
                None => self.ln("EXIT;"),
            };
        }
        if let Some(case_stmt) = stmt.case_stmt() {
            return self.emit_case_stmt(&case_stmt);
        }
        if let Some(nested) = stmt.block() {
            return self.emit_nested_block(&nested);
        }
        if let Some(select) = stmt.nested_select() {
            let sql = self.emit_select(&select);
            return self.ln(&format!("{sql};"));
        }
        if stmt.raise_stmt().is_some() {
            let name = stmt
                .raise_stmt()
                .and_then(|r| r.exception_name())
                .map(|g| g.segments().join("."))
                .unwrap_or_default();
            return if name.is_empty() {
                self.ln("RAISE;")
            } else {
                self.ln(&format!("RAISE EXCEPTION '%', {};", name.to_uppercase()))
            };
        }
        if stmt.null_stmt().is_some() {
            return self.ln("NULL;");
        }
        if stmt.commit_stmt().is_some() {
            return self.ln("COMMIT;");
        }
        if stmt.rollback_stmt().is_some() {
            return self.ln("ROLLBACK;");
        }
        String::new()
    }

    fn emit_nested_block(&mut self, block: &Block) -> String {
        self.scope.push_var_scope("block");
        let declare = block.declare_section();
        if let Some(d) = &declare {
            rebuild_scope(&mut self.scope, self.metadata, self.schema, None, Some(d));
            self.collect_cursor_queries(d);
        }
        let mut out = String::new();
        if let Some(d) = &declare {
            out.push_str(&self.ln("DECLARE"));
            out.push_str(&self.emit_declare_lines(d));
        }
        out.push_str(&self.ln("BEGIN"));
        self.indent += 1;
        for s in block.statements() {
            out.push_str(&self.emit_statement(&s));
        }
        self.indent -= 1;
        out.push_str(&self.ln("END;"));
        self.scope.pop_var_scope();
        out
    }

    fn emit_if_stmt(&mut self, if_stmt: &IfStmt) -> String {
        let cond = if_stmt.condition().map(|c| self.emit_expr(&c)).unwrap_or_else(|| "TRUE".to_owned());
        let mut out = self.ln(&format!("IF {cond} THEN"));
        self.indent += 1;
        for s in if_stmt.then_branch() {
            out.push_str(&self.emit_statement(&s));
        }
        self.indent -= 1;
        for elsif in if_stmt.elsif_clauses() {
            let c = elsif.condition().map(|c| self.emit_expr(&c)).unwrap_or_else(|| "TRUE".to_owned());
            out.push_str(&self.ln(&format!("ELSIF {c} THEN")));
            self.indent += 1;
            for s in elsif.branch() {
                out.push_str(&self.emit_statement(&s));
            }
            self.indent -= 1;
        }
        let else_stmts = if_stmt.else_branch();
        if !else_stmts.is_empty() {
            out.push_str(&self.ln("ELSE"));
            self.indent += 1;
            for s in else_stmts {
                out.push_str(&self.emit_statement(&s));
            }
            self.indent -= 1;
        }
        out.push_str(&self.ln("END IF;"));
        out
    }

    fn emit_case_stmt(&mut self, case_stmt: &CaseStmt) -> String {
        let mut out = match case_stmt.selector() {
            Some(sel) => {
                let s = self.emit_expr(&sel);
                self.ln(&format!("CASE {s}"))
            }
            None => self.ln("CASE"),
        };
        self.indent += 1;
        for clause in case_stmt.when_clauses() {
            let cond = clause.condition().map(|c| self.emit_expr(&c)).unwrap_or_default();
            out.push_str(&self.ln(&format!("WHEN {cond} THEN")));
            self.indent += 1;
            for s in clause.body_statements() {
                out.push_str(&self.emit_statement(&s));
            }
            self.indent -= 1;
        }
        let else_stmts = case_stmt.else_branch();
        if !else_stmts.is_empty() {
            out.push_str(&self.ln("ELSE"));
            self.indent += 1;
            for s in else_stmts {
                out.push_str(&self.emit_statement(&s));
            }
            self.indent -= 1;
        }
        self.indent -= 1;
        out.push_str(&self.ln("END CASE;"));
        out
    }

    fn emit_for_loop(&mut self, for_stmt: &ForLoopStmt) -> String {
        let reverse = if for_stmt.is_reverse() { "REVERSE " } else { "" };
        let start = for_stmt.range_start().map(|e| self.emit_expr(&e)).unwrap_or_default();
        let end = for_stmt.range_end().map(|e| self.emit_expr(&e)).unwrap_or_default();
        let var_name = for_stmt.loop_var().map(|n| n.name()).unwrap_or_default();
        let mut out = self.ln(&format!("FOR {var_name} IN {reverse}{start}..{end} LOOP"));

        self.scope.push_var_scope("for_loop");
        let ident = SqlIdent::from(var_name.clone());
        let _ = self.scope.declare(ident.clone(), VariableDescriptor::new(ident, "PLS_INTEGER", Type::numeric()));
        self.indent += 1;
        for s in for_stmt.body() {
            out.push_str(&self.emit_statement(&s));
        }
        self.indent -= 1;
        self.scope.pop_var_scope();

        out.push_str(&self.ln("END LOOP;"));
        out
    }

    fn emit_cursor_for_loop(&mut self, cursor_loop: &CursorForLoopStmt) -> String {
        let var_name = cursor_loop.loop_var().map(|n| n.name()).unwrap_or_default();
        let query_sql = if let Some(query) = cursor_loop.query() {
            self.emit_select(&query)
        } else if let Some(named) = cursor_loop.named_cursor() {
            named
                .last_segment()
                .and_then(|n| self.cursor_queries.get(&SqlIdent::from(n).canonical()).cloned())
                .unwrap_or_default()
        } else {
            String::new()
        };
        let mut out = self.ln(&format!("FOR {var_name} IN {query_sql} LOOP"));

        // Cursor FOR loop records use Postgres's native RECORD type rather
        // than the jsonb document shape every other record-typed variable
        // gets -- `FOR r IN SELECT ... LOOP` is an idiom Postgres already
        // handles directly, so `r.col` reads plainly with no cast.
        self.scope.push_var_scope("cursor_for_loop");
        let ident = SqlIdent::from(var_name.clone());
        let _ = self
            .scope
            .declare(ident.clone(), VariableDescriptor::new(ident, "RECORD", Type::Record(Vec::new())));
        self.indent += 1;
        for s in cursor_loop.body() {
            out.push_str(&self.emit_statement(&s));
        }
        self.indent -= 1;
        self.scope.pop_var_scope();

        out.push_str(&self.ln("END LOOP;"));
        out
    }

    // -- assignment / call targets ----------------------------------------

    fn emit_assign_stmt(&mut self, assign: &AssignStmt) -> String {
        let Some(target) = assign.target() else { return String::new() };
        let segments = target.segments();
        let value_text = assign.value().map(|v| self.emit_expr(&v)).unwrap_or_else(|| "NULL".to_owned());

        match (segments.as_slice(), assign.index_expr()) {
            ([name], Some(idx_expr)) => {
                let ident = SqlIdent::from(name.as_str());
                match self.scope.lookup(&ident).cloned() {
                    Some(var) => {
                        let stmt_text = self.emit_collection_write(name, &var, &idx_expr, &value_text);
                        self.ln(&stmt_text)
                    }
                    None => self.ln(&format!("{name} := {value_text};")),
                }
            }
            ([name], None) => {
                let ident = SqlIdent::from(name.as_str());
                if self.scope.lookup(&ident).is_some() {
                    self.ln(&format!("{name} := {value_text};"))
                } else if let Some(ctx) = self.package_ctx {
                    if ctx.is_package_variable(&ident) {
                        let setter = format!("{}set_{}", ctx.member_prefix(), ident.canonical());
                        self.ln(&format!("PERFORM {setter}({value_text});"))
                    } else {
                        self.ln(&format!("{name} := {value_text};"))
                    }
                } else {
                    self.ln(&format!("{name} := {value_text};"))
                }
            }
            ([first, second], _) => match self.classify_two_segment(first, second) {
                TwoSegmentTarget::RecordField { is_document: true, .. } => {
                    let path = second.to_lowercase();
                    self.ln(&format!("{first} := jsonb_set({first}, '{{{path}}}', to_jsonb({value_text}));"))
                }
                TwoSegmentTarget::RecordField { is_document: false, .. } => {
                    self.ln(&format!("{first}.{} := {value_text};", second.to_lowercase()))
                }
                TwoSegmentTarget::TableColumn | TwoSegmentTarget::PackageMember => {
                    let setter = format!("{}.{}__set_{}", self.schema, first.to_lowercase(), second.to_lowercase());
                    self.ln(&format!("PERFORM {setter}({value_text});"))
                }
            },
            _ => self.ln("-- unsupported assignment target"),
        }
    }

    fn emit_collection_write(
        &mut self,
        name: &str,
        var: &VariableDescriptor,
        idx_expr: &Expression,
        value_text: &str,
    ) -> String {
        match &var.inline_type {
            Some(InlineType::IndexBy { key_is_text: true, .. }) => {
                let key = self.emit_expr(idx_expr);
                format!("{name} := jsonb_set({name}, ARRAY[({key})::text], to_jsonb({value_text}));")
            }
            Some(_) => {
                let shifted = self.shift_index(idx_expr);
                format!("{name} := jsonb_set({name}, ARRAY[({shifted})::text], to_jsonb({value_text}));")
            }
            None => {
                let idx = self.emit_expr(idx_expr);
                format!("{name} := jsonb_set({name}, ARRAY[({idx})::text], to_jsonb({value_text}));")
            }
        }
    }

    /// Oracle collections are 1-based; Postgres arrays (modeled here as
    /// jsonb arrays) are 0-based, so every array-shaped element access
    /// shifts the index down by one.
    fn shift_index(&mut self, idx_expr: &Expression) -> String {
        if let Some(int_lit) = idx_expr.integer_literal() {
            let n: i64 = int_lit.text().trim().parse().unwrap_or(0);
            (n - 1).to_string()
        } else {
            let rendered = self.emit_expr(idx_expr);
            format!("({rendered} - 1)")
        }
    }

    fn emit_call_stmt(&mut self, call: &CallStmt) -> String {
        let Some(invocation) = call.invocation() else { return self.ln("NULL;") };
        let Some(group) = invocation.ident_group() else { return self.ln("NULL;") };
        let segments = group.segments();
        let args = self.emit_arguments(invocation.argument_list());
        let args_sql = args.join(", ");

        let callee = match segments.as_slice() {
            [name] => format!("{}.{}", self.schema, name.to_lowercase()),
            [first, second] => format!("{}.{}__{}", self.schema, first.to_lowercase(), second.to_lowercase()),
            _ => return self.ln("-- unsupported call target"),
        };

        match call.into_target() {
            Some(into) => self.ln(&format!("SELECT {callee}({args_sql}) INTO {};", into.name())),
            None => self.ln(&format!("PERFORM {callee}({args_sql});")),
        }
    }

    // -- queries ------------------------------------------------------------

    fn emit_select(&mut self, select: &SelectStmt) -> String {
        self.scope.push_query_scope();
        if let Some(from) = select.from_clause() {
            for table in from.tables() {
                self.register_table(&table);
            }
            for join in from.joins() {
                if let Some(table) = join.table() {
                    self.register_table(&table);
                }
            }
        }

        let mut columns = Vec::new();
        if let Some(select_clause) = select.select_clause() {
            for col in select_clause.columns() {
                let expr_text = col.expr().map(|e| self.emit_expr(&e)).unwrap_or_else(|| col.text());
                columns.push(match col.alias() {
                    Some(alias) => format!("{expr_text} AS {}", alias.name()),
                    None => expr_text,
                });
            }
        }
        let mut sql = format!("SELECT {}", columns.join(", "));

        if let Some(into) = select.into_clause() {
            let targets: Vec<String> = into.targets().iter().map(|t| t.name()).collect();
            sql.push_str(&format!(" INTO {}", targets.join(", ")));
        }

        if let Some(from) = select.from_clause() {
            let tables: Vec<String> = from.tables().iter().map(|t| self.render_table_ref(t)).collect();
            sql.push_str(&format!(" FROM {}", tables.join(", ")));
            for join in from.joins() {
                if let Some(table) = join.table() {
                    let on = join.on_condition().map(|c| self.emit_expr(&c)).unwrap_or_default();
                    sql.push_str(&format!(" JOIN {} ON {on}", self.render_table_ref(&table)));
                }
            }
        }

        if let Some(where_clause) = select.where_clause() {
            if let Some(cond) = where_clause.condition() {
                let cond_text = self.emit_expr(&cond);
                sql.push_str(&format!(" WHERE {cond_text}"));
            }
        }

        self.scope.pop_query_scope();
        sql
    }

    fn register_table(&mut self, table: &TableRef) {
        let Some(name) = table.name() else { return };
        let qualified = format!("{}.{}", self.schema, name.name());
        if let Some(alias) = table.alias() {
            self.scope.register_table_alias(&SqlIdent::from(alias.name()), qualified.clone());
        }
        self.scope.register_table_alias(&SqlIdent::from(name.name()), qualified);
    }

    fn render_table_ref(&self, table: &TableRef) -> String {
        let name = table.name().map(|n| n.name()).unwrap_or_default();
        match table.alias() {
            Some(alias) if alias.name() != name => format!("{}.{} {}", self.schema, name, alias.name()),
            _ => format!("{}.{}", self.schema, name),
        }
    }

    // -- expressions --------------------------------------------------------

    fn emit_expr(&mut self, expr: &Expression) -> String {
        if let Some(select) = expr.nested_select() {
            return format!("({})", self.emit_select(&select));
        }
        if let Some(between) = expr.between_expr() {
            let operand = between.operand().map(|e| self.emit_expr(&e)).unwrap_or_default();
            let low = between.low().map(|e| self.emit_expr(&e)).unwrap_or_default();
            let high = between.high().map(|e| self.emit_expr(&e)).unwrap_or_default();
            return format!("({operand} BETWEEN {low} AND {high})");
        }
        if let Some(case_expr) = expr.case_expr() {
            return self.emit_case_expr(&case_expr);
        }
        if let Some(invocation) = expr.function_invocation() {
            return self.emit_invocation(&invocation);
        }
        if let Some(lit) = expr.quoted_literal() {
            return lit.text().to_owned();
        }
        if let Some(lit) = expr.integer_literal() {
            return lit.text().to_owned();
        }
        if let Some(lit) = expr.number_literal() {
            return lit.text().to_owned();
        }
        let text_upper = expr.text().trim().to_uppercase();
        if text_upper == "NULL" || text_upper == "TRUE" || text_upper == "FALSE" {
            return text_upper;
        }
        if expr.operator().is_some() {
            return self.emit_operator_expr(expr);
        }
        // Parenthesized expression: the single child carries the text.
        let operands = expr.operands();
        if operands.len() == 1 {
            return format!("({})", self.emit_expr(&operands[0]));
        }
        expr.text()
    }

    fn emit_operator_expr(&mut self, expr: &Expression) -> String {
        let op = expr.operator().expect("caller already checked operator().is_some()");
        let operands = expr.operands();
        if operands.len() == 1 {
            let operand_text = self.emit_expr(&operands[0]);
            return if op.text().eq_ignore_ascii_case("NOT") {
                format!("(NOT {operand_text})")
            } else {
                format!("(-{operand_text})")
            };
        }
        self.emit_binary(&op, &operands)
    }

    fn emit_binary(&mut self, op: &crate::syntax::SyntaxToken, operands: &[Expression]) -> String {
        let left = &operands[0];
        let right = &operands[1];
        let left_text = self.emit_expr(left);
        let right_text = self.emit_expr(right);

        match op.kind() {
            SyntaxKind::Concat => {
                let l = if self.is_text_like(left) { left_text } else { format!("({left_text})::text") };
                let r = if self.is_text_like(right) { right_text } else { format!("({right_text})::text") };
                format!("({l} || {r})")
            }
            SyntaxKind::ArithmeticOp | SyntaxKind::Asterisk | SyntaxKind::Slash => {
                let op_text = op.text();
                let left_ty = self.quick_type(left);
                let right_ty = self.quick_type(right);
                if op_text == "+" && left_ty.is_date_like() && right_ty.is_numeric() {
                    return format!("({left_text} + ({right_text} * interval '1 day'))");
                }
                if op_text == "+" && right_ty.is_date_like() && left_ty.is_numeric() {
                    return format!("({right_text} + ({left_text} * interval '1 day'))");
                }
                if op_text == "-" && left_ty.is_date_like() && right_ty.is_numeric() {
                    return format!("({left_text} - ({right_text} * interval '1 day'))");
                }
                if op_text == "-" && left_ty.is_date_like() && right_ty.is_date_like() {
                    return format!("EXTRACT(DAY FROM ({left_text} - {right_text}))");
                }
                format!("({left_text} {op_text} {right_text})")
            }
            SyntaxKind::ComparisonOp | SyntaxKind::LogicOp => {
                format!("({left_text} {} {right_text})", op.text().to_uppercase())
            }
            _ => format!("({left_text} {} {right_text})", op.text()),
        }
    }

    /// Operand type used to pick an operator rewrite (date-arithmetic vs.
    /// plain, text vs. cast concatenation). Consults the analyzer's type
    /// cache first -- this is the same parsed tree the analyzer already
    /// walked, so a CST-range lookup there is exact -- and only falls back
    /// to best-effort local inference when no cache is available (package
    /// helper emission, which has no prior analysis pass to draw on).
    fn quick_type(&self, expr: &Expression) -> Type {
        if let Some(types) = self.types {
            if let Some(ty) = types.get(expr.range()) {
                return ty.clone();
            }
        }
        if let Some(select) = expr.nested_select() {
            if select.is_scalar_subquery() {
                if let Some(col_expr) = select.select_clause().and_then(|c| c.columns().into_iter().next()).and_then(|c| c.expr()) {
                    return self.quick_type(&col_expr);
                }
            }
            return Type::Unknown;
        }
        if let Some(invocation) = expr.function_invocation() {
            if let Some(group) = invocation.ident_group() {
                match group.segments().as_slice() {
                    [name] if !invocation.has_argument_list() => {
                        if let Some(var) = self.scope.lookup(&SqlIdent::from(name.as_str())) {
                            return var.resolved_type.clone();
                        }
                        if let Some(ty) = builtins::pseudo_column_type(name) {
                            return ty;
                        }
                    }
                    [name] if name.eq_ignore_ascii_case("TRUNC") || name.eq_ignore_ascii_case("ROUND") => {
                        // Both are polymorphic: date in, date out; numeric in,
                        // numeric out.
                        if let Some(first_arg) = first_argument_expr(invocation) {
                            let arg_ty = self.quick_type(&first_arg);
                            return if arg_ty.is_date_like() { arg_ty } else { Type::numeric() };
                        }
                    }
                    [first, second] if !invocation.has_argument_list() => {
                        if let Some(table) = self.scope.resolve_alias(&SqlIdent::from(first.as_str())) {
                            if let Some(col_type) = self.metadata.column_type(table, &SqlIdent::from(second.as_str())) {
                                return scalar_type_from_text(col_type);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        if expr.integer_literal().is_some() || expr.number_literal().is_some() {
            return Type::numeric();
        }
        if expr.quoted_literal().is_some() {
            return Type::Text;
        }
        Type::Unknown
    }

    fn is_text_like(&self, expr: &Expression) -> bool {
        matches!(self.quick_type(expr), Type::Text)
    }

    fn emit_case_expr(&mut self, case_expr: &CaseExpr) -> String {
        let mut out = String::from("CASE");
        let unified = self.unify_case_branches(case_expr);
        for clause in case_expr.when_clauses() {
            let cond = clause.condition().map(|c| self.emit_expr(&c)).unwrap_or_default();
            let result = clause.result().map(|r| self.emit_branch(&r, &unified)).unwrap_or_else(|| "NULL".to_owned());
            out.push_str(&format!(" WHEN {cond} THEN {result}"));
        }
        if let Some(else_expr) = case_expr.else_expr() {
            let result = self.emit_branch(&else_expr, &unified);
            out.push_str(&format!(" ELSE {result}"));
        }
        out.push_str(" END");
        out
    }

    fn unify_case_branches(&mut self, case_expr: &CaseExpr) -> Type {
        let mut result: Option<Type> = None;
        for clause in case_expr.when_clauses() {
            if let Some(res) = clause.result() {
                let ty = self.quick_type(&res);
                result = Some(match result {
                    Some(acc) => acc.higher(&ty).clone(),
                    None => ty,
                });
            }
        }
        if let Some(else_expr) = case_expr.else_expr() {
            let ty = self.quick_type(&else_expr);
            result = Some(match result {
                Some(acc) => acc.higher(&ty).clone(),
                None => ty,
            });
        }
        result.unwrap_or(Type::Unknown)
    }

    fn emit_branch(&mut self, branch: &Expression, unified: &Type) -> String {
        let text = self.emit_expr(branch);
        let branch_ty = self.quick_type(branch);
        if &branch_ty != unified && !branch_ty.is_null() && !branch_ty.is_unknown() {
            format!("({text})::{}", datatype::scalar_cast_type(unified))
        } else {
            text
        }
    }

    // -- name resolution ------------------------------------------------

    fn emit_arguments(&mut self, list: Option<crate::ast::ArgumentList>) -> Vec<String> {
        list.map(|l| {
            l.arguments()
                .iter()
                .map(|a| a.expr().map(|e| self.emit_expr(&e)).unwrap_or_else(|| a.text()))
                .collect()
        })
        .unwrap_or_default()
    }

    fn emit_invocation(&mut self, invocation: &FunctionInvocation) -> String {
        let Some(group) = invocation.ident_group() else { return String::new() };
        let segments = group.segments();

        match segments.as_slice() {
            [name] => self.emit_unqualified(name, invocation),
            [first, second] => self.emit_qualified(first, second, invocation),
            _ => String::new(),
        }
    }

    fn emit_unqualified(&mut self, name: &str, invocation: &FunctionInvocation) -> String {
        let ident = SqlIdent::from(name);
        let has_args = invocation.has_argument_list();

        if let Some(var) = self.scope.lookup(&ident).cloned() {
            return if has_args {
                let idx_expr = first_argument_expr(invocation);
                match idx_expr {
                    Some(idx) => self.emit_collection_read(name, &var, &idx),
                    None => name.to_owned(),
                }
            } else {
                name.to_owned()
            };
        }
        if let Some(ctx) = self.package_ctx {
            if let Some(var) = ctx.lookup_variable(&ident).cloned() {
                let getter = format!("{}{}()", ctx.member_prefix(), ident.canonical());
                return if has_args {
                    match first_argument_expr(invocation) {
                        Some(idx) => self.emit_collection_read(&getter, &var, &idx),
                        None => getter,
                    }
                } else {
                    getter
                };
            }
        }
        if let Some(rewritten) = self.emit_builtin(name, invocation) {
            return rewritten;
        }
        let args = self.emit_arguments(invocation.argument_list());
        format!("{}.{}({})", self.schema, ident.canonical(), args.join(", "))
    }

    fn emit_collection_read(&mut self, doc: &str, var: &VariableDescriptor, idx_expr: &Expression) -> String {
        match &var.inline_type {
            Some(InlineType::IndexBy { key_is_text: true, element }) => {
                let key = self.emit_expr(idx_expr);
                let cast = datatype::scalar_cast_type(&scalar_type_from_text(element));
                format!("({doc} -> {key})::{cast}")
            }
            Some(inline) => {
                let shifted = self.shift_index(idx_expr);
                let element_text = element_source_text(inline);
                let cast = datatype::scalar_cast_type(&scalar_type_from_text(&element_text));
                format!("({doc} -> {shifted})::{cast}")
            }
            None => {
                let idx = self.emit_expr(idx_expr);
                format!("({doc} -> {idx})")
            }
        }
    }

    /// Rewrites pseudo-columns and builtin functions into their PostgreSQL
    /// equivalent. Returns `None` when `name` is neither, so
    /// the caller falls through to treating it as an external callable.
    fn emit_builtin(&mut self, name: &str, invocation: &FunctionInvocation) -> Option<String> {
        let upper = name.to_uppercase();
        if !builtins::is_builtin_name(name) {
            return None;
        }
        let args: Vec<Expression> = invocation
            .argument_list()
            .map(|l| l.arguments().into_iter().filter_map(|a| a.expr()).collect())
            .unwrap_or_default();

        Some(match upper.as_str() {
            "SYSDATE" | "SYSTIMESTAMP" => "clock_timestamp()".to_owned(),
            "UID" | "USER" => "current_user".to_owned(),
            "ROWID" => "NULL".to_owned(),
            "SESSIONTIMEZONE" => "current_setting('TIMEZONE')".to_owned(),
            "ROWNUM" => "NULL".to_owned(),
            "LEVEL" => "NULL".to_owned(),
            "NVL" if args.len() >= 2 => {
                format!("COALESCE({}, {})", self.emit_expr(&args[0]), self.emit_expr(&args[1]))
            }
            "NVL2" if args.len() >= 3 => {
                let cond = self.emit_expr(&args[0]);
                let when_not_null = self.emit_expr(&args[1]);
                let when_null = self.emit_expr(&args[2]);
                format!("(CASE WHEN {cond} IS NOT NULL THEN {when_not_null} ELSE {when_null} END)")
            }
            "DECODE" if args.len() >= 2 => self.emit_decode(&args),
            "ROUND" | "TRUNC" => self.emit_round_or_trunc(&upper, &args),
            _ => {
                let rendered: Vec<String> = args.iter().map(|a| self.emit_expr(a)).collect();
                format!("{}({})", upper.to_lowercase(), rendered.join(", "))
            }
        })
    }

    fn emit_decode(&mut self, args: &[Expression]) -> String {
        let selector = self.emit_expr(&args[0]);
        let mut out = format!("CASE {selector}");
        let mut i = 1;
        while i + 1 < args.len() {
            let when = self.emit_expr(&args[i]);
            let then = self.emit_expr(&args[i + 1]);
            out.push_str(&format!(" WHEN {when} THEN {then}"));
            i += 2;
        }
        if i < args.len() {
            let default = self.emit_expr(&args[i]);
            out.push_str(&format!(" ELSE {default}"));
        }
        out.push_str(" END");
        out
    }

    fn emit_round_or_trunc(&mut self, upper: &str, args: &[Expression]) -> String {
        let func = upper.to_lowercase();
        if args.is_empty() {
            return format!("{func}()");
        }
        let first_ty = self.quick_type(&args[0]);
        let first_text = self.emit_expr(&args[0]);
        if first_ty.is_date_like() {
            return format!("date_trunc('day', {first_text})");
        }
        let rendered: Vec<String> = args.iter().map(|a| self.emit_expr(a)).collect();
        format!("{func}({})", rendered.join(", "))
    }

    fn emit_qualified(&mut self, first: &str, second: &str, invocation: &FunctionInvocation) -> String {
        let has_args = invocation.has_argument_list();
        match self.classify_two_segment(first, second) {
            TwoSegmentTarget::TableColumn => format!("{first}.{second}"),
            TwoSegmentTarget::RecordField { cast, is_document } => {
                if is_document {
                    format!("({first} -> '{}')::{cast}", second.to_lowercase())
                } else {
                    format!("{first}.{}", second.to_lowercase())
                }
            }
            TwoSegmentTarget::PackageMember => {
                let target = format!("{}.{}__{}", self.schema, first.to_lowercase(), second.to_lowercase());
                if has_args {
                    let args = self.emit_arguments(invocation.argument_list());
                    format!("{target}({})", args.join(", "))
                } else {
                    format!("{target}()")
                }
            }
        }
    }

    fn classify_two_segment(&self, first: &str, second: &str) -> TwoSegmentTarget {
        let first_ident = SqlIdent::from(first);
        if self.scope.query_scope_depth() > 0 && self.scope.resolve_alias(&first_ident).is_some() {
            return TwoSegmentTarget::TableColumn;
        }
        if let Some(var) = self.scope.lookup(&first_ident) {
            if let Type::Record(fields) = &var.resolved_type {
                let second_ident = SqlIdent::from(second);
                let field_ty = fields.iter().find(|(n, _)| *n == second_ident).map(|(_, t)| t.clone()).unwrap_or(Type::Unknown);
                return TwoSegmentTarget::RecordField {
                    cast: datatype::scalar_cast_type(&field_ty),
                    is_document: var.inline_type.is_some(),
                };
            }
        }
        TwoSegmentTarget::PackageMember
    }
}

fn first_argument_expr(invocation: &FunctionInvocation) -> Option<Expression> {
    invocation.argument_list()?.arguments().into_iter().next()?.expr()
}

fn element_source_text(inline: &InlineType) -> String {
    match inline {
        InlineType::TableOf(inner) => element_source_text(inner),
        InlineType::Scalar(text) => text.clone(),
        InlineType::Varray { element, .. } => element.clone(),
        InlineType::IndexBy { element, .. } => element.clone(),
        InlineType::Record(_) | InlineType::RowType(_) | InlineType::TypeRef(_) => String::new(),
    }
}

/// Emits `CREATE OR REPLACE FUNCTION` text for one function unit.
/// `package_ctx` is `Some` when this function is a package member, so
/// its name is flattened through [`PackageContext::member_prefix`] and its
/// first statement initializes package state. `types` is the `TypeCache`
/// the analyzer built from analyzing this same unit, consulted by the
/// emitter instead of recomputing operand types from scratch.
pub fn emit_function(
    function: &Function,
    schema: &str,
    metadata: &MetadataIndex,
    package_ctx: Option<&PackageContext>,
    types: Option<&TypeCache>,
) -> Result<String, Diagnostic> {
    let mut emitter = Emitter::new(schema, metadata, package_ctx, types);
    let name = function
        .name()
        .ok_or_else(|| Diagnostic::new(ErrorCategory::InternalError, "function has no name"))?;
    let header = function.header();
    let params = header.as_ref().and_then(|h| h.param_list());
    let return_type_text = header.as_ref().and_then(|h| h.return_type()).map(|t| t.text()).unwrap_or_default();
    let return_type = datatype::target_type_text(&return_type_text);
    let body = function
        .body()
        .ok_or_else(|| Diagnostic::new(ErrorCategory::InternalError, "function has no body"))?;

    let target_name = emitter.qualified_member_name(&name);
    let params_sql = emitter.emit_params(params.as_ref());

    emitter.scope.push_var_scope(name.as_str());
    if let Some(ctx) = package_ctx {
        emitter.scope.set_current_package(Some(ctx.package_name.clone()));
    }
    rebuild_scope(&mut emitter.scope, metadata, schema, params.as_ref(), body.declare_section().as_ref());
    if let Some(declare) = body.declare_section() {
        emitter.collect_cursor_queries(&declare);
    }
    let declare_lines = body.declare_section().map(|d| emitter.emit_declare_lines(&d)).unwrap_or_default();

    emitter.indent = 1;
    let mut statements_sql = String::new();
    if let Some(ctx) = package_ctx {
        statements_sql.push_str(&emitter.ln(&format!("PERFORM {}package_initializer();", ctx.member_prefix())));
    }
    for stmt in body.statements() {
        statements_sql.push_str(&emitter.emit_statement(&stmt));
    }
    if let Some(exceptions) = body.exception_section() {
        statements_sql.push_str(&emitter.emit_exception_section(&exceptions));
    }
    emitter.scope.pop_var_scope();
    debug_assert!(emitter.scope.is_balanced());

    Ok(format!(
        "CREATE OR REPLACE FUNCTION {target_name}({params_sql}) RETURNS {return_type} AS $$\nDECLARE\n{declare_lines}BEGIN\n{statements_sql}END;\n$$ LANGUAGE plpgsql;\n",
    ))
}

/// Emits `CREATE OR REPLACE FUNCTION ... RETURNS void` text for one
/// procedure unit -- procedures are modeled as void-returning functions,
/// matching `CallStmt`'s uniform `PERFORM`/`SELECT ... INTO` treatment of
/// both functions and procedures at the call site.
pub fn emit_procedure(
    procedure: &Procedure,
    schema: &str,
    metadata: &MetadataIndex,
    package_ctx: Option<&PackageContext>,
    types: Option<&TypeCache>,
) -> Result<String, Diagnostic> {
    let mut emitter = Emitter::new(schema, metadata, package_ctx, types);
    let name = procedure
        .name()
        .ok_or_else(|| Diagnostic::new(ErrorCategory::InternalError, "procedure has no name"))?;
    let params = procedure.header().and_then(|h| h.param_list());
    let body = procedure
        .body()
        .ok_or_else(|| Diagnostic::new(ErrorCategory::InternalError, "procedure has no body"))?;

    let target_name = emitter.qualified_member_name(&name);
    let params_sql = emitter.emit_params(params.as_ref());

    emitter.scope.push_var_scope(name.as_str());
    if let Some(ctx) = package_ctx {
        emitter.scope.set_current_package(Some(ctx.package_name.clone()));
    }
    rebuild_scope(&mut emitter.scope, metadata, schema, params.as_ref(), body.declare_section().as_ref());
    if let Some(declare) = body.declare_section() {
        emitter.collect_cursor_queries(&declare);
    }
    let declare_lines = body.declare_section().map(|d| emitter.emit_declare_lines(&d)).unwrap_or_default();

    emitter.indent = 1;
    let mut statements_sql = String::new();
    if let Some(ctx) = package_ctx {
        statements_sql.push_str(&emitter.ln(&format!("PERFORM {}package_initializer();", ctx.member_prefix())));
    }
    for stmt in body.statements() {
        statements_sql.push_str(&emitter.emit_statement(&stmt));
    }
    if let Some(exceptions) = body.exception_section() {
        statements_sql.push_str(&emitter.emit_exception_section(&exceptions));
    }
    emitter.scope.pop_var_scope();
    debug_assert!(emitter.scope.is_balanced());

    Ok(format!(
        "CREATE OR REPLACE FUNCTION {target_name}({params_sql}) RETURNS void AS $$\nDECLARE\n{declare_lines}BEGIN\n{statements_sql}END;\n$$ LANGUAGE plpgsql;\n",
    ))
}

impl<'a> Emitter<'a> {
    fn emit_exception_section(&mut self, section: &crate::ast::ExceptionSection) -> String {
        let mut out = self.ln("EXCEPTION");
        self.indent += 1;
        for handler in section.handlers() {
            let names: Vec<String> =
                handler.exception_names().iter().map(|g| g.segments().join(".").to_uppercase()).collect();
            out.push_str(&self.ln(&format!("WHEN {} THEN", names.join(" OR "))));
            self.indent += 1;
            for s in handler.body() {
                out.push_str(&self.emit_statement(&s));
            }
            self.indent -= 1;
        }
        self.indent -= 1;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Root;

    fn function_sql(input: &str, schema: &str, metadata: &MetadataIndex) -> String {
        let parse = crate::grammar::parse_function_source(input);
        let root = Root::cast(parse.tree()).unwrap();
        let function = root.function().unwrap();
        emit_function(&function, schema, metadata, None, None).unwrap()
    }

    #[test]
    fn plain_assignment_and_return_emit_plpgsql() {
        const INPUT: &str = r#"
            CREATE OR REPLACE FUNCTION calculate_bonus(p_salary NUMBER)
            RETURN NUMBER
            IS
                v_bonus NUMBER;
            BEGIN
                v_bonus := p_salary * 0.1;
                RETURN v_bonus;
            END calculate_bonus;
        "#;
        let sql = function_sql(INPUT, "hr", &MetadataIndex::new());
        assert!(sql.contains("CREATE OR REPLACE FUNCTION hr.calculate_bonus(p_salary numeric) RETURNS numeric"));
        assert!(sql.contains("v_bonus := (p_salary * 0.1);"));
        assert!(sql.contains("RETURN v_bonus;"));
    }

    #[test]
    fn date_plus_numeric_becomes_interval_arithmetic() {
        const INPUT: &str = r#"
            CREATE OR REPLACE FUNCTION f
            IS
                v_date DATE;
                v_result DATE;
            BEGIN
                v_result := v_date + 1;
            END f;
        "#;
        let sql = function_sql(INPUT, "hr", &MetadataIndex::new());
        assert!(sql.contains("v_result := (v_date + (1 * interval '1 day'));"));
    }

    #[test]
    fn date_minus_date_extracts_day_difference() {
        const INPUT: &str = r#"
            CREATE OR REPLACE FUNCTION f
            IS
                v_a DATE;
                v_b DATE;
                v_days NUMBER;
            BEGIN
                v_days := v_a - v_b;
            END f;
        "#;
        let sql = function_sql(INPUT, "hr", &MetadataIndex::new());
        assert!(sql.contains("v_days := EXTRACT(DAY FROM (v_a - v_b));"));
    }

    #[test]
    fn collection_element_read_shifts_index_and_casts() {
        const INPUT: &str = r#"
            CREATE OR REPLACE FUNCTION f
            IS
                v_nums TABLE OF NUMBER;
                v_out NUMBER;
            BEGIN
                v_out := v_nums(2);
            END f;
        "#;
        let sql = function_sql(INPUT, "hr", &MetadataIndex::new());
        assert!(sql.contains("v_out := (v_nums -> 1)::numeric;"));
    }

    #[test]
    fn nvl_becomes_coalesce() {
        const INPUT: &str = r#"
            CREATE OR REPLACE FUNCTION f
            IS
                v_name VARCHAR2(20);
                v_out VARCHAR2(20);
            BEGIN
                v_out := NVL(v_name, 'unknown');
            END f;
        "#;
        let sql = function_sql(INPUT, "hr", &MetadataIndex::new());
        assert!(sql.contains("v_out := COALESCE(v_name, 'unknown');"));
    }

    #[test]
    fn package_member_call_is_flattened_and_wrapped_in_perform() {
        const INPUT: &str = r#"
            CREATE OR REPLACE FUNCTION f
            IS
            BEGIN
                utilities.log_message('started');
            END f;
        "#;
        let sql = function_sql(INPUT, "hr", &MetadataIndex::new());
        assert!(sql.contains("PERFORM hr.utilities__log_message('started');"));
    }

    #[test]
    fn call_with_into_becomes_select_into() {
        const INPUT: &str = r#"
            CREATE OR REPLACE FUNCTION f
            IS
                v_total NUMBER;
            BEGIN
                compute_total(1000) INTO v_total;
            END f;
        "#;
        let sql = function_sql(INPUT, "hr", &MetadataIndex::new());
        assert!(sql.contains("SELECT hr.compute_total(1000) INTO v_total;"));
    }

    #[test]
    fn if_elsif_else_chain_emits_all_three_branches() {
        const INPUT: &str = r#"
            CREATE OR REPLACE FUNCTION f
            IS
                v_x NUMBER;
            BEGIN
                IF v_x > 0 THEN
                    NULL;
                ELSIF v_x < 0 THEN
                    NULL;
                ELSE
                    NULL;
                END IF;
            END f;
        "#;
        let sql = function_sql(INPUT, "hr", &MetadataIndex::new());
        assert!(sql.contains("IF (v_x > 0) THEN"));
        assert!(sql.contains("ELSIF (v_x < 0) THEN"));
        assert!(sql.contains("ELSE"));
        assert!(sql.contains("END IF;"));
    }

    #[test]
    fn record_field_read_casts_to_the_field_scalar_type() {
        const INPUT: &str = r#"
            CREATE OR REPLACE FUNCTION f
            IS
                v_emp RECORD(empno NUMBER, ename VARCHAR2(20));
                v_out NUMBER;
            BEGIN
                v_out := v_emp.empno;
            END f;
        "#;
        let sql = function_sql(INPUT, "hr", &MetadataIndex::new());
        assert!(sql.contains("v_out := (v_emp -> 'empno')::numeric;"));
    }
}
