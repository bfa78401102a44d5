//! Rewrites of planned statements.
//!
//! Rules never change the output relation of a plan.

pub mod filter_pushdown;

use filter_pushdown::FilterPushdownRule;
use sqlplan_error::Result;
use tracing::debug;

use crate::logical::operator::LogicalOperator;
use crate::logical::statement::CompiledStatement;

#[derive(Debug)]
pub struct Optimizer {}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer {
    pub fn new() -> Self {
        Optimizer {}
    }

    /// Run a statement through the optimizer.
    ///
    /// Every plan in the statement is optimized independently: the root, each
    /// subplan, and each CTE.
    pub fn optimize(&self, mut stmt: CompiledStatement) -> Result<CompiledStatement> {
        let span = tracing::debug_span!("optimize_statement");
        let _guard = span.enter();

        stmt.root = self.optimize_plan(stmt.root)?;
        for subplan in &mut stmt.subplans {
            subplan.plan = self.optimize_plan(subplan.plan.take())?;
        }
        for cte in &mut stmt.ctes {
            cte.plan = self.optimize_plan(cte.plan.take())?;
        }

        debug!(
            subplans = stmt.subplans.len(),
            ctes = stmt.ctes.len(),
            "optimized statement"
        );

        Ok(stmt)
    }

    /// Run a single plan through every rule.
    pub fn optimize_plan(&self, plan: LogicalOperator) -> Result<LogicalOperator> {
        let mut pushdown = FilterPushdownRule::default();
        pushdown.optimize(plan)
    }
}

pub trait OptimizeRule {
    /// Apply an optimization rule to the logical plan.
    fn optimize(&mut self, plan: LogicalOperator) -> Result<LogicalOperator>;
}
