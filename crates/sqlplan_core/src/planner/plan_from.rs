use sqlplan_error::{PlanError, Result};
use tracing::trace;

use super::PlanContext;
use super::plan_subquery::SubqueryPlanner;
use crate::ast;
use crate::binder::bind_context::BindScopeRef;
use crate::binder::expr_binder::{ExpressionBinder, RecursionContext};
use crate::catalog::Table;
use crate::logical::logical_join::{JoinType, LogicalCrossJoin, LogicalJoin};
use crate::logical::operator::{LogicalNode, LogicalOperator, Node};
use crate::logical::logical_scan::{LogicalCteScan, LogicalScan, LogicalSubqueryScan};
use crate::types::{Field, Relation};

#[derive(Debug)]
pub struct FromPlanner;

impl FromPlanner {
    /// Plan the FROM clause of a query.
    ///
    /// An empty FROM produces a single row with no columns. Multiple items are
    /// combined with cartesian products.
    pub fn plan(
        &self,
        ctx: &mut PlanContext,
        current: BindScopeRef,
        from: &[ast::FromItem],
    ) -> Result<(LogicalOperator, Relation)> {
        let mut items = from.iter();
        let Some(first) = items.next() else {
            return Ok((LogicalOperator::EMPTY, Relation::empty()));
        };

        let (mut plan, mut relation) = self.plan_item(ctx, current, first)?;
        for item in items {
            let (right, right_relation) = self.plan_item(ctx, current, item)?;
            check_not_joined(&relation, &right_relation)?;
            relation = relation.join(&right_relation);
            plan = LogicalOperator::CrossJoin(Node::new(LogicalCrossJoin, vec![plan, right]));
        }

        Ok((plan, relation))
    }

    fn plan_item(
        &self,
        ctx: &mut PlanContext,
        current: BindScopeRef,
        item: &ast::FromItem,
    ) -> Result<(LogicalOperator, Relation)> {
        let (mut plan, mut relation) = self.plan_source(ctx, current, &item.relation)?;

        for join in &item.joins {
            let (right, right_relation) = self.plan_source(ctx, current, &join.relation)?;
            check_not_joined(&relation, &right_relation)?;

            let joined = relation.join(&right_relation);
            let condition = ExpressionBinder::new(current, &joined).bind_predicate(
                ctx,
                &join.on,
                RecursionContext::PLAIN,
                "JOIN ON",
            )?;

            let join_type = match join.kind {
                ast::JoinKind::Inner => JoinType::Inner,
                ast::JoinKind::Left => JoinType::Left,
                ast::JoinKind::Right => JoinType::Right,
                ast::JoinKind::Full => JoinType::Full,
            };

            plan = LogicalOperator::Join(Node::new(
                LogicalJoin {
                    join_type,
                    condition,
                },
                vec![plan, right],
            ));
            // Outer joins change nullability.
            relation = plan.output_relation()?;
        }

        Ok((plan, relation))
    }

    pub fn plan_source(
        &self,
        ctx: &mut PlanContext,
        current: BindScopeRef,
        source: &ast::TableSource,
    ) -> Result<(LogicalOperator, Relation)> {
        match source {
            ast::TableSource::Table {
                namespace,
                name,
                alias,
            } => {
                let name = ctx.config.normalize_ident(name);
                let alias = alias
                    .as_deref()
                    .map(|a| ctx.config.normalize_ident(a))
                    .unwrap_or_else(|| name.clone());

                if namespace.is_none() {
                    if let Some(cte) = ctx.cte_bindings.get(&name) {
                        trace!(%name, %alias, recursive = cte.recursive, "resolved table to cte");
                        let relation = cte.relation.requalify(Some(&alias));
                        let scan = LogicalCteScan {
                            name,
                            alias,
                            recursive: cte.recursive,
                            relation: relation.clone(),
                        };
                        return Ok((LogicalOperator::CteScan(Node::new(scan, Vec::new())), relation));
                    }
                }

                let namespace = namespace.as_deref().map(|n| ctx.config.normalize_ident(n));
                let lookup_namespace = namespace
                    .as_deref()
                    .or(ctx.config.default_namespace.as_deref());
                let table = ctx
                    .catalog
                    .lookup_table(lookup_namespace, &name)
                    .ok_or_else(|| PlanError::UnknownTable { name: name.clone() })?;

                let relation = table_relation(&table, &alias);
                let scan = LogicalScan {
                    namespace,
                    table: name,
                    alias,
                    relation: relation.clone(),
                    filter: None,
                };
                Ok((LogicalOperator::Scan(Node::new(scan, Vec::new())), relation))
            }
            ast::TableSource::Subquery { query, alias } => {
                let alias = alias.as_deref().map(|a| ctx.config.normalize_ident(a)).ok_or_else(
                    || PlanError::Syntax("subquery in FROM must have an alias".to_string()),
                )?;

                let planned = SubqueryPlanner.plan_from(ctx, current, query)?;
                let relation = planned.relation.requalify(Some(&alias));
                let scan = LogicalSubqueryScan {
                    alias,
                    subplan: planned.id,
                    correlated: planned.correlated,
                    relation: relation.clone(),
                };
                Ok((
                    LogicalOperator::SubqueryScan(Node::new(scan, Vec::new())),
                    relation,
                ))
            }
        }
    }
}

/// Columns of a table qualified by `qualifier`.
pub fn table_relation(table: &Table, qualifier: &str) -> Relation {
    Relation::new(
        table
            .columns
            .iter()
            .map(|col| Field {
                nullable: col.nullable,
                ..Field::new(Some(qualifier.to_string()), col.name.clone(), col.datatype.clone())
            })
            .collect(),
    )
}

/// Error if any qualifier of `right` is already used by `left`.
///
/// The first colliding qualifier in `right`'s field order is reported.
pub fn check_not_joined(left: &Relation, right: &Relation) -> Result<()> {
    let collision = right
        .iter()
        .filter_map(|field| field.relation.as_deref())
        .find(|qualifier| left.has_qualifier(qualifier));
    match collision {
        Some(name) => Err(PlanError::TableAlreadyJoined {
            name: name.to_string(),
        }),
        None => Ok(()),
    }
}
