use sqlplan_error::{PlanError, Result};
use tracing::debug;

use super::plan_select::SelectPlanner;
use super::plan_setop::SetOpPlanner;
use super::{CteBinding, PlanContext};
use crate::ast;
use crate::binder::bind_context::BindScopeRef;
use crate::config::PlannerConfig;
use crate::logical::logical_setop::SetOpKind;
use crate::logical::operator::LogicalOperator;
use crate::logical::statement::{ColumnRename, CtePlan};
use crate::types::{Field, Relation};

#[derive(Debug)]
pub struct CtePlanner;

impl CtePlanner {
    /// Plan every CTE in a WITH clause.
    ///
    /// CTEs are planned in order, each in its own scope, and can reference
    /// the ones defined before them.
    pub fn plan(&self, ctx: &mut PlanContext, with: &ast::WithClause) -> Result<()> {
        for cte in &with.ctes {
            let name = ctx.config.normalize_ident(&cte.name);
            if ctx.cte_bindings.contains_key(&name) {
                return Err(PlanError::Syntax(format!(
                    "WITH query name \"{name}\" specified more than once"
                )));
            }
            let columns: Vec<String> = cte
                .columns
                .iter()
                .map(|c| ctx.config.normalize_ident(c))
                .collect();

            let scope = ctx.bind_context.new_orphan_scope();
            let recursive = with.recursive
                && self_references(&cte.query, &name, ctx.config).iter().sum::<usize>() > 0;

            let (plan, relation) = if recursive {
                self.plan_recursive(ctx, scope, &name, &columns, &cte.query)?
            } else {
                SelectPlanner.plan(ctx, scope, &cte.query)?
            };

            let (renames, relation) = rename_columns(&name, &columns, &relation)?;
            debug!(%name, recursive, columns = relation.len(), "planned cte");

            ctx.cte_bindings.insert(
                name.clone(),
                CteBinding {
                    relation: relation.clone(),
                    recursive: false,
                },
            );
            ctx.ctes.push(CtePlan {
                name,
                recursive,
                plan,
                renames,
                relation,
            });
        }
        Ok(())
    }

    /// Plan a recursive CTE.
    ///
    /// The first core is the base term. It's planned before the CTE becomes
    /// visible, then the remaining cores are planned with the CTE resolving
    /// to the base term's relation.
    fn plan_recursive(
        &self,
        ctx: &mut PlanContext,
        scope: BindScopeRef,
        name: &str,
        columns: &[String],
        query: &ast::SelectStatement,
    ) -> Result<(LogicalOperator, Relation)> {
        if query.cores.len() < 2 {
            return Err(PlanError::Syntax(format!(
                "recursive query \"{name}\" must be a UNION ALL of a base and a recursive term"
            )));
        }
        if query
            .compound_ops
            .iter()
            .any(|op| *op != ast::CompoundOperator::UnionAll)
        {
            return Err(PlanError::Syntax(format!(
                "recursive query \"{name}\" must only use UNION ALL"
            )));
        }
        if !query.order_by.is_empty() || query.limit.is_some() || query.offset.is_some() {
            return Err(PlanError::Unsupported(format!(
                "ORDER BY or LIMIT in recursive query \"{name}\""
            )));
        }

        let counts = self_references(query, name, ctx.config);
        let (last, rest) = counts
            .split_last()
            .ok_or_else(|| PlanError::Syntax(format!("recursive query \"{name}\" is empty")))?;
        if *last != 1 || rest.iter().any(|count| *count != 0) {
            return Err(PlanError::Syntax(format!(
                "recursive query \"{name}\" must reference itself exactly once, in its last term"
            )));
        }

        let (mut plan, base_relation) =
            SelectPlanner.plan_core(ctx, scope, &query.cores[0], &[], None, None)?;
        let relation = base_relation.requalify(None);

        let (_, cte_relation) = rename_columns(name, columns, &relation)?;
        ctx.cte_bindings.insert(
            name.to_string(),
            CteBinding {
                relation: cte_relation,
                recursive: true,
            },
        );

        for core in &query.cores[1..] {
            let (right, right_relation) =
                SelectPlanner.plan_core(ctx, scope, core, &[], None, None)?;
            plan = SetOpPlanner.combine(SetOpKind::UnionAll, plan, &relation, right, &right_relation)?;
        }

        ctx.cte_bindings.remove(name);

        Ok((plan, relation))
    }
}

/// Rename the output of a CTE's query, producing the relation visible to
/// scans of the CTE.
fn rename_columns(
    name: &str,
    columns: &[String],
    relation: &Relation,
) -> Result<(Vec<ColumnRename>, Relation)> {
    if !columns.is_empty() && columns.len() != relation.len() {
        return Err(PlanError::WrongArity {
            context: format!("column list of WITH query \"{name}\""),
            expected: relation.len(),
            got: columns.len(),
        });
    }

    let mut renames = Vec::with_capacity(relation.len());
    let mut fields = Vec::with_capacity(relation.len());
    for (idx, field) in relation.iter().enumerate() {
        let to = columns
            .get(idx)
            .cloned()
            .unwrap_or_else(|| field.output_name().to_string());
        let from = Field {
            relation: field.relation.clone().or_else(|| Some(name.to_string())),
            ..field.clone()
        };

        fields.push(Field {
            relation: Some(name.to_string()),
            name: to.clone(),
            ..field.clone()
        });
        renames.push(ColumnRename { from, to });
    }

    Ok((renames, Relation::new(fields)))
}

/// Number of references to table `name` in each core.
///
/// References inside subqueries, in FROM or in any expression, count towards
/// the core containing them. ORDER BY, LIMIT and OFFSET of the whole statement
/// count towards the last core.
fn self_references(query: &ast::SelectStatement, name: &str, config: &PlannerConfig) -> Vec<usize> {
    let mut counts: Vec<usize> = query
        .cores
        .iter()
        .map(|core| core_references(core, name, config))
        .collect();

    let trailing: usize = query
        .order_by
        .iter()
        .map(|term| &term.expr)
        .chain(query.limit.iter())
        .chain(query.offset.iter())
        .map(|expr| expr_references(expr, name, config))
        .sum();
    if let Some(last) = counts.last_mut() {
        *last += trailing;
    }

    counts
}

fn core_references(core: &ast::SelectCore, name: &str, config: &PlannerConfig) -> usize {
    let mut count = 0;
    for item in &core.from {
        count += source_references(&item.relation, name, config);
        for join in &item.joins {
            count += source_references(&join.relation, name, config);
            count += expr_references(&join.on, name, config);
        }
    }
    for column in &core.columns {
        if let ast::ResultColumn::Expr { expr, .. } = column {
            count += expr_references(expr, name, config);
        }
    }
    let exprs = core
        .where_clause
        .iter()
        .chain(core.group_by.iter())
        .chain(core.having.iter());
    for expr in exprs {
        count += expr_references(expr, name, config);
    }
    for (_, window) in &core.windows {
        count += window_references(window, name, config);
    }
    count
}

fn source_references(source: &ast::TableSource, name: &str, config: &PlannerConfig) -> usize {
    match source {
        ast::TableSource::Table {
            namespace: None,
            name: table,
            ..
        } if config.normalize_ident(table) == name => 1,
        ast::TableSource::Table { .. } => 0,
        ast::TableSource::Subquery { query, .. } => {
            self_references(query, name, config).iter().sum()
        }
    }
}

fn window_references(window: &ast::WindowDefinition, name: &str, config: &PlannerConfig) -> usize {
    window
        .partition_by
        .iter()
        .chain(window.order_by.iter().map(|term| &term.expr))
        .map(|expr| expr_references(expr, name, config))
        .sum()
}

fn expr_references(expr: &ast::Expr, name: &str, config: &PlannerConfig) -> usize {
    let count = |expr: &ast::Expr| expr_references(expr, name, config);
    let subquery = |query: &ast::SelectStatement| -> usize {
        self_references(query, name, config).iter().sum()
    };

    match expr {
        ast::Expr::Literal(_) | ast::Expr::Column { .. } | ast::Expr::Variable { .. } => 0,
        ast::Expr::FieldAccess { base, .. } => count(base),
        ast::Expr::Unary { expr, .. }
        | ast::Expr::Cast { expr, .. }
        | ast::Expr::Collate { expr, .. } => count(expr),
        ast::Expr::Arith { left, right, .. }
        | ast::Expr::Comparison { left, right, .. }
        | ast::Expr::Conjunction { left, right, .. } => count(left) + count(right),
        ast::Expr::Is { expr, right, .. } => count(expr) + count(right),
        ast::Expr::Like { expr, pattern, .. } => count(expr) + count(pattern),
        ast::Expr::Between {
            expr, low, high, ..
        } => count(expr) + count(low) + count(high),
        ast::Expr::InList { expr, list, .. } => count(expr) + list.iter().map(count).sum::<usize>(),
        ast::Expr::InSubquery { expr, subquery: query, .. } => count(expr) + subquery(query),
        ast::Expr::Exists { subquery: query, .. } => subquery(query),
        ast::Expr::Subquery(query) => subquery(query),
        ast::Expr::Function(call) => {
            let mut total: usize = call.args.iter().map(count).sum();
            if let Some(filter) = &call.filter {
                total += count(filter);
            }
            if let Some(ast::WindowRef::Inline(window)) = &call.over {
                total += window_references(window, name, config);
            }
            total
        }
        ast::Expr::Array(items) => items.iter().map(count).sum(),
        ast::Expr::ArrayAccess { array, index } => count(array) + count(index),
        ast::Expr::Case {
            operand,
            when_then,
            else_expr,
        } => {
            operand.as_deref().map_or(0, count)
                + when_then
                    .iter()
                    .map(|(when, then)| count(when) + count(then))
                    .sum::<usize>()
                + else_expr.as_deref().map_or(0, count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builder::*;

    fn counts(core: SelectCore) -> Vec<usize> {
        let query = SelectStatement::from(SelectCore::new().column(int(1)))
            .compound(ast::CompoundOperator::UnionAll, core);
        self_references(&query, "r", &PlannerConfig::default())
    }

    #[test]
    fn counts_from_and_joins() {
        assert_eq!(vec![0, 1], counts(SelectCore::new().column(col("n")).from(table("R"))));
        assert_eq!(
            vec![0, 2],
            counts(
                SelectCore::new()
                    .column(col("n"))
                    .from(table("r"))
                    .join(ast::JoinKind::Inner, table_as("r", "r2"), lit(true)),
            )
        );
    }

    #[test]
    fn counts_expression_subqueries() {
        let inner = || SelectCore::new().column(col("n")).from(table("r"));

        assert_eq!(
            vec![0, 2],
            counts(
                SelectCore::new()
                    .column(col("n"))
                    .from(table("r"))
                    .filter(col("n").in_subquery(inner())),
            )
        );
        assert_eq!(vec![0, 1], counts(SelectCore::new().column(subquery(inner()))));
        assert_eq!(
            vec![0, 1],
            counts(SelectCore::new().column(int(1)).filter(exists(inner())))
        );
        assert_eq!(
            vec![0, 1],
            counts(
                SelectCore::new()
                    .column(col("n"))
                    .from(table("users"))
                    .group_by(vec![col("n")])
                    .having(col("n").in_subquery(inner())),
            )
        );
    }

    #[test]
    fn other_tables_not_counted() {
        assert_eq!(
            vec![0, 0],
            counts(
                SelectCore::new()
                    .column(col("n"))
                    .from(table("users"))
                    .filter(exists(SelectCore::new().column(int(1)).from(table("posts")))),
            )
        );
    }
}
