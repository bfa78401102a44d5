use sqlplan_error::{PlanError, Result};

use super::PlanContext;
use super::plan_select::{SelectPlanner, bind_order_by, plan_limit};
use crate::ast;
use crate::binder::bind_context::BindScopeRef;
use crate::logical::logical_order::LogicalOrder;
use crate::logical::logical_setop::{LogicalSetop, SetOpKind};
use crate::logical::operator::{LogicalOperator, Node};
use crate::types::Relation;

#[derive(Debug)]
pub struct SetOpPlanner;

impl SetOpPlanner {
    /// Plan a compound SELECT.
    ///
    /// Operators apply left to right. ORDER BY and LIMIT apply to the result
    /// of the last operator and can only reference output columns.
    pub fn plan(
        &self,
        ctx: &mut PlanContext,
        current: BindScopeRef,
        select: &ast::SelectStatement,
    ) -> Result<(LogicalOperator, Relation)> {
        let mut cores = select.cores.iter();
        let first = cores
            .next()
            .ok_or_else(|| PlanError::Syntax("compound SELECT without cores".to_string()))?;

        let (mut plan, first_relation) =
            SelectPlanner.plan_core(ctx, current, first, &[], None, None)?;
        let relation = first_relation.requalify(None);

        for (core, op) in cores.zip(&select.compound_ops) {
            let (right, right_relation) =
                SelectPlanner.plan_core(ctx, current, core, &[], None, None)?;
            plan = self.combine(set_op_kind(*op), plan, &relation, right, &right_relation)?;
        }

        if !select.order_by.is_empty() {
            let exprs = bind_order_by(ctx, current, &relation, &select.order_by)?;
            plan = LogicalOperator::Order(Node::new(LogicalOrder { exprs }, vec![plan]));
        }

        if let Some(limit) = &select.limit {
            plan = plan_limit(ctx, current, limit, select.offset.as_ref(), plan)?;
        }

        Ok((plan, relation))
    }

    /// Combine two inputs with a set operation, checking their shapes match.
    ///
    /// `relation` is the unqualified relation of the left-most input, which
    /// names the output.
    pub fn combine(
        &self,
        kind: SetOpKind,
        left: LogicalOperator,
        relation: &Relation,
        right: LogicalOperator,
        right_relation: &Relation,
    ) -> Result<LogicalOperator> {
        if relation.len() != right_relation.len() {
            return Err(PlanError::SetIncompatibleSchemas {
                reason: format!(
                    "{kind} inputs have {} and {} columns",
                    relation.len(),
                    right_relation.len()
                ),
            });
        }

        let mismatch = relation
            .iter()
            .zip(right_relation.iter())
            .enumerate()
            .find(|(_, (l, r))| !l.datatype.is_compatible(&r.datatype));
        if let Some((idx, (l, r))) = mismatch {
            return Err(PlanError::SetIncompatibleSchemas {
                reason: format!(
                    "column {} of {kind} has types {} and {}",
                    idx + 1,
                    l.datatype,
                    r.datatype
                ),
            });
        }

        Ok(LogicalOperator::SetOp(Node::new(
            LogicalSetop {
                kind,
                relation: relation.clone(),
            },
            vec![left, right],
        )))
    }
}

pub fn set_op_kind(op: ast::CompoundOperator) -> SetOpKind {
    match op {
        ast::CompoundOperator::Union => SetOpKind::Union,
        ast::CompoundOperator::UnionAll => SetOpKind::UnionAll,
        ast::CompoundOperator::Intersect => SetOpKind::Intersect,
        ast::CompoundOperator::Except => SetOpKind::Except,
    }
}
