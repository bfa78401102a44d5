use std::sync::Arc;

use sqlplan_error::{PlanError, Result, type_mismatch};

use super::PlanContext;
use super::plan_from::{FromPlanner, check_not_joined, table_relation};
use crate::ast;
use crate::binder::bind_context::BindScopeRef;
use crate::binder::expr_binder::{ExpressionBinder, RecursionContext};
use crate::catalog::{Column, Table};
use crate::expr::Expression;
use crate::logical::logical_filter::LogicalFilter;
use crate::logical::logical_join::LogicalCrossJoin;
use crate::logical::logical_mutate::{AssignmentExpr, LogicalDelete, LogicalUpdate};
use crate::logical::logical_scan::LogicalScan;
use crate::logical::operator::{LogicalOperator, Node};
use crate::types::Relation;

/// Plans UPDATE and DELETE.
#[derive(Debug)]
pub struct MutatePlanner;

/// Rows targeted by an UPDATE or DELETE.
struct MutateTarget {
    table: Arc<Table>,
    /// Filtered scan of the target, joined with any FROM sources.
    plan: LogicalOperator,
    relation: Relation,
}

impl MutatePlanner {
    pub fn plan_update(
        &self,
        ctx: &mut PlanContext,
        current: BindScopeRef,
        update: &ast::UpdateStatement,
    ) -> Result<LogicalOperator> {
        let target = self.plan_target(
            ctx,
            current,
            &update.table,
            update.alias.as_deref(),
            &update.from,
            update.where_clause.as_ref(),
        )?;

        let assignments = bind_assignments(
            ctx,
            current,
            &target.table,
            &target.relation,
            &update.assignments,
        )?;

        Ok(LogicalOperator::Update(Node::new(
            LogicalUpdate {
                table: target.table.name.clone(),
                assignments,
            },
            vec![target.plan],
        )))
    }

    pub fn plan_delete(
        &self,
        ctx: &mut PlanContext,
        current: BindScopeRef,
        delete: &ast::DeleteStatement,
    ) -> Result<LogicalOperator> {
        let target = self.plan_target(
            ctx,
            current,
            &delete.table,
            delete.alias.as_deref(),
            &delete.from,
            delete.where_clause.as_ref(),
        )?;

        Ok(LogicalOperator::Delete(Node::new(
            LogicalDelete {
                table: target.table.name.clone(),
            },
            vec![target.plan],
        )))
    }

    fn plan_target(
        &self,
        ctx: &mut PlanContext,
        current: BindScopeRef,
        table: &str,
        alias: Option<&str>,
        from: &[ast::FromItem],
        where_clause: Option<&ast::Expr>,
    ) -> Result<MutateTarget> {
        let name = ctx.config.normalize_ident(table);
        let where_clause =
            where_clause.ok_or_else(|| PlanError::UpdateOrDeleteWithoutWhere {
                table: name.clone(),
            })?;

        let table = lookup_physical_table(ctx, &name)?;
        let alias = alias
            .map(|a| ctx.config.normalize_ident(a))
            .unwrap_or_else(|| name.clone());
        let target_relation = table_relation(&table, &alias);
        let scan = LogicalOperator::Scan(Node::new(
            LogicalScan {
                namespace: None,
                table: name,
                alias,
                relation: target_relation.clone(),
                filter: None,
            },
            Vec::new(),
        ));

        let (plan, relation) = if from.is_empty() {
            (scan, target_relation)
        } else {
            let (from_plan, from_relation) = FromPlanner.plan(ctx, current, from)?;
            check_not_joined(&target_relation, &from_relation)?;
            (
                LogicalOperator::CrossJoin(Node::new(LogicalCrossJoin, vec![scan, from_plan])),
                target_relation.join(&from_relation),
            )
        };

        let filter = ExpressionBinder::new(current, &relation).bind_predicate(
            ctx,
            where_clause,
            RecursionContext::PLAIN,
            "WHERE",
        )?;
        let plan = LogicalOperator::Filter(Node::new(LogicalFilter { filter }, vec![plan]));

        Ok(MutateTarget {
            table,
            plan,
            relation,
        })
    }
}

/// Look up a table in the catalog, ignoring CTEs.
pub fn lookup_physical_table(ctx: &PlanContext, name: &str) -> Result<Arc<Table>> {
    ctx.catalog
        .lookup_table(ctx.config.default_namespace.as_deref(), name)
        .ok_or_else(|| PlanError::UnknownTable {
            name: name.to_string(),
        })
}

/// Bind `SET column = value` assignments against `relation`.
pub fn bind_assignments(
    ctx: &mut PlanContext,
    current: BindScopeRef,
    table: &Table,
    relation: &Relation,
    assignments: &[ast::Assignment],
) -> Result<Vec<AssignmentExpr>> {
    let binder = ExpressionBinder::new(current, relation);
    let mut bound: Vec<AssignmentExpr> = Vec::with_capacity(assignments.len());

    for assignment in assignments {
        let name = ctx.config.normalize_ident(&assignment.column);
        let column = table.column(&name).ok_or_else(|| {
            table_relation(table, &table.name).column_not_found(None, &name)
        })?;
        if bound.iter().any(|a| a.column == name) {
            return Err(PlanError::Syntax(format!(
                "column \"{name}\" assigned more than once"
            )));
        }

        let value = binder.bind_expression(ctx, &assignment.value, RecursionContext::PLAIN)?;
        check_assignable(column, &value)?;
        bound.push(AssignmentExpr {
            column: name,
            value,
        });
    }

    Ok(bound)
}

/// Check that `value` can be stored in `column`.
pub fn check_assignable(column: &Column, value: &Expression) -> Result<()> {
    let datatype = value.datatype();
    if datatype.is_null() {
        if !column.nullable || column.primary_key {
            return Err(PlanError::NotNullableColumn {
                column: column.name.clone(),
            });
        }
        return Ok(());
    }
    if !datatype.is_compatible(&column.datatype) {
        return Err(type_mismatch!(
            "cannot assign {datatype} to column \"{}\" of type {}",
            column.name,
            column.datatype
        ));
    }
    Ok(())
}
