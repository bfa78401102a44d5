use sqlplan_error::{PlanError, Result, type_mismatch};

use super::PlanContext;
use super::plan_aggregate::AggregatePlanner;
use super::plan_from::FromPlanner;
use super::plan_setop::SetOpPlanner;
use super::plan_window::WindowPlanner;
use crate::ast;
use crate::binder::bind_context::BindScopeRef;
use crate::binder::expr_binder::{ExpressionBinder, RecursionContext};
use crate::expr::Expression;
use crate::expr::alias_expr::AliasExpr;
use crate::expr::column_expr::ColumnExpr;
use crate::expr::sort_expr::SortExpr;
use crate::logical::logical_distinct::LogicalDistinct;
use crate::logical::logical_filter::LogicalFilter;
use crate::logical::logical_limit::LogicalLimit;
use crate::logical::logical_order::LogicalOrder;
use crate::logical::logical_project::LogicalProject;
use crate::logical::operator::{LogicalOperator, Node};
use crate::types::{DataType, Field, Relation};

#[derive(Debug)]
pub struct SelectPlanner;

impl SelectPlanner {
    /// Plan a full SELECT statement.
    ///
    /// Returns the plan along with its output relation. Qualifiers of the
    /// output are left as they are. Callers decide how to requalify them.
    pub fn plan(
        &self,
        ctx: &mut PlanContext,
        current: BindScopeRef,
        select: &ast::SelectStatement,
    ) -> Result<(LogicalOperator, Relation)> {
        if select.cores.is_empty() {
            return Err(PlanError::Syntax("SELECT requires at least one core".to_string()));
        }
        if select.compound_ops.len() + 1 != select.cores.len() {
            return Err(PlanError::Syntax(format!(
                "expected {} compound operators, got {}",
                select.cores.len() - 1,
                select.compound_ops.len()
            )));
        }
        if select.offset.is_some() && select.limit.is_none() {
            return Err(PlanError::Syntax("OFFSET requires a LIMIT".to_string()));
        }

        if select.cores.len() > 1 {
            return SetOpPlanner.plan(ctx, current, select);
        }

        self.plan_core(
            ctx,
            current,
            &select.cores[0],
            &select.order_by,
            select.limit.as_ref(),
            select.offset.as_ref(),
        )
    }

    /// Plan a single SELECT core.
    ///
    /// ORDER BY and LIMIT are planned below the projection so they may
    /// reference columns that aren't part of the output.
    pub fn plan_core(
        &self,
        ctx: &mut PlanContext,
        current: BindScopeRef,
        core: &ast::SelectCore,
        order_by: &[ast::OrderingTerm],
        limit: Option<&ast::Expr>,
        offset: Option<&ast::Expr>,
    ) -> Result<(LogicalOperator, Relation)> {
        // Handle FROM
        let (mut plan, from_relation) = FromPlanner.plan(ctx, current, &core.from)?;
        let binder = ExpressionBinder::new(current, &from_relation);

        // Handle WHERE
        if let Some(filter) = &core.where_clause {
            let filter = binder.bind_predicate(ctx, filter, RecursionContext::PLAIN, "WHERE")?;
            plan = LogicalOperator::Filter(Node::new(LogicalFilter { filter }, vec![plan]));
        }

        // Handle select list
        let windows = WindowPlanner.bind_named_windows(ctx, &binder, &core.windows)?;
        let list_binder = binder.with_windows(&windows);
        let mut projections = Vec::with_capacity(core.columns.len());
        for column in &core.columns {
            self.bind_result_column(ctx, &list_binder, column, &mut projections)?;
        }
        let result_relation =
            Relation::new(projections.iter().map(|expr| expr.output_field()).collect());

        // Handle ORDER BY. Terms may reference output aliases.
        let order_relation = from_relation.join_unique(&result_relation);
        let order_binder = ExpressionBinder::new(current, &order_relation);
        let mut sort_exprs = order_by
            .iter()
            .map(|term| order_binder.bind_ordering_term(ctx, term, RecursionContext::AGGREGATES))
            .collect::<Result<Vec<_>>>()?;

        // Handle GROUP BY and HAVING
        let group_by = binder.bind_expressions(ctx, &core.group_by, RecursionContext::PLAIN)?;
        let mut having = core
            .having
            .as_ref()
            .map(|having| {
                binder.bind_predicate(ctx, having, RecursionContext::AGGREGATES, "HAVING")
            })
            .transpose()?;

        let aggregating = !group_by.is_empty()
            || having.is_some()
            || projections.iter().any(|expr| expr.contains_aggregate())
            || sort_exprs.iter().any(|sort| sort.expr.contains_aggregate());

        if aggregating {
            plan = AggregatePlanner.plan(
                ctx,
                group_by,
                &mut having,
                &mut projections,
                &mut sort_exprs,
                plan,
            )?;
            if let Some(filter) = having {
                plan = LogicalOperator::Filter(Node::new(LogicalFilter { filter }, vec![plan]));
            }
        }

        // Handle windows
        plan = WindowPlanner.plan(ctx, &mut projections, plan)?;

        // Handle ORDER BY
        if !sort_exprs.is_empty() {
            plan = LogicalOperator::Order(Node::new(
                LogicalOrder { exprs: sort_exprs },
                vec![plan],
            ));
        }

        // Handle LIMIT
        if let Some(limit) = limit {
            plan = plan_limit(ctx, current, limit, offset, plan)?;
        }

        // Handle projections
        let project = LogicalProject { projections };
        let relation = project.relation();
        plan = LogicalOperator::Project(Node::new(project, vec![plan]));

        if core.distinct {
            plan = LogicalOperator::Distinct(Node::new(LogicalDistinct, vec![plan]));
        }

        Ok((plan, relation))
    }

    fn bind_result_column(
        &self,
        ctx: &mut PlanContext,
        binder: &ExpressionBinder,
        column: &ast::ResultColumn,
        projections: &mut Vec<Expression>,
    ) -> Result<()> {
        match column {
            ast::ResultColumn::Wildcard { table: None } => {
                if binder.relation.is_empty() {
                    return Err(PlanError::Syntax(
                        "SELECT * requires a FROM clause".to_string(),
                    ));
                }
                projections.extend(binder.relation.iter().map(field_column));
            }
            ast::ResultColumn::Wildcard { table: Some(table) } => {
                let table = ctx.config.normalize_ident(table);
                let before = projections.len();
                projections.extend(binder.relation.fields_for(&table).map(field_column));
                if projections.len() == before {
                    return Err(PlanError::UnknownTable { name: table });
                }
            }
            ast::ResultColumn::Expr { expr, alias } => {
                let expr = binder.bind_expression(ctx, expr, RecursionContext::SELECT_LIST)?;
                let expr = match alias {
                    Some(alias) => Expression::Alias(AliasExpr {
                        expr: Box::new(expr),
                        alias: ctx.config.normalize_ident(alias),
                    }),
                    None => expr,
                };
                projections.push(expr);
            }
        }
        Ok(())
    }
}

fn field_column(field: &Field) -> Expression {
    Expression::Column(ColumnExpr {
        relation: field.relation.clone(),
        column: field.name.clone(),
        datatype: field.datatype.clone(),
        depth: 0,
    })
}

/// Wrap `plan` in a LIMIT.
///
/// LIMIT and OFFSET can't reference columns.
pub fn plan_limit(
    ctx: &mut PlanContext,
    current: BindScopeRef,
    limit: &ast::Expr,
    offset: Option<&ast::Expr>,
    plan: LogicalOperator,
) -> Result<LogicalOperator> {
    let empty = Relation::empty();
    let binder = ExpressionBinder::new(current, &empty);

    let mut bind_count = |expr: &ast::Expr, clause: &str| -> Result<Expression> {
        let expr = binder.bind_expression(ctx, expr, RecursionContext::PLAIN)?;
        let datatype = expr.datatype();
        if !datatype.is_compatible(&DataType::Int8) {
            return Err(type_mismatch!("{clause} must be int8, got {datatype}"));
        }
        Ok(expr)
    };

    let limit = bind_count(limit, "LIMIT")?;
    let offset = offset.map(|offset| bind_count(offset, "OFFSET")).transpose()?;

    Ok(LogicalOperator::Limit(Node::new(
        LogicalLimit { limit, offset },
        vec![plan],
    )))
}

/// Bind ORDER BY terms against the output of a query.
pub fn bind_order_by(
    ctx: &mut PlanContext,
    current: BindScopeRef,
    relation: &Relation,
    order_by: &[ast::OrderingTerm],
) -> Result<Vec<SortExpr>> {
    let binder = ExpressionBinder::new(current, relation);
    order_by
        .iter()
        .map(|term| binder.bind_ordering_term(ctx, term, RecursionContext::PLAIN))
        .collect()
}
