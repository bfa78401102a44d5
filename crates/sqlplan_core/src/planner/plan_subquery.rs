use sqlplan_error::Result;

use super::PlanContext;
use super::plan_select::SelectPlanner;
use crate::ast;
use crate::binder::bind_context::BindScopeRef;
use crate::expr::column_expr::ColumnExpr;
use crate::logical::subplan::SubplanId;
use crate::types::Relation;

/// A subquery planned into the subplan registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSubquery {
    pub id: SubplanId,
    /// Correlated columns with depths relative to the scope containing the
    /// subquery.
    pub correlated: Vec<ColumnExpr>,
    /// Output of the subquery, unqualified.
    pub relation: Relation,
}

#[derive(Debug)]
pub struct SubqueryPlanner;

impl SubqueryPlanner {
    /// Plan a subquery used in an expression.
    ///
    /// The subquery may reference columns from `outer`, the relation of the
    /// query containing it.
    pub fn plan(
        &self,
        ctx: &mut PlanContext,
        current: BindScopeRef,
        outer: &Relation,
        query: &ast::SelectStatement,
    ) -> Result<PlannedSubquery> {
        let scope = ctx.bind_context.new_child_scope(current, outer.clone());
        self.plan_in_scope(ctx, scope, query)
    }

    /// Plan a subquery used as a FROM item.
    ///
    /// Tables joined next to the subquery aren't visible to it, but outer
    /// queries still are.
    pub fn plan_from(
        &self,
        ctx: &mut PlanContext,
        current: BindScopeRef,
        query: &ast::SelectStatement,
    ) -> Result<PlannedSubquery> {
        let scope = ctx.bind_context.new_child_scope(current, Relation::empty());
        self.plan_in_scope(ctx, scope, query)
    }

    fn plan_in_scope(
        &self,
        ctx: &mut PlanContext,
        scope: BindScopeRef,
        query: &ast::SelectStatement,
    ) -> Result<PlannedSubquery> {
        let (plan, relation) = SelectPlanner.plan(ctx, scope, query)?;

        let correlated = ctx.bind_context.correlated_columns(scope)?.to_vec();
        let id = ctx.push_subplan(plan, correlated.clone());

        // Columns found one scope out are local to the containing scope.
        let correlated = correlated
            .into_iter()
            .map(|col| ColumnExpr {
                depth: col.depth.saturating_sub(1),
                ..col
            })
            .collect();

        Ok(PlannedSubquery {
            id,
            correlated,
            relation: relation.requalify(None),
        })
    }
}
