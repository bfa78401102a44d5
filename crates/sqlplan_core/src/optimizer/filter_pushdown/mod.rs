//! Moves filter predicates toward the scans producing their columns.
//!
//! Conjuncts are routed by the qualifiers of the local columns they
//! reference. A conjunct that can't move further is materialized as a
//! `Filter` (or folded into a scan or join condition) at the point it
//! stopped.

pub mod extracted_filter;
pub mod split;

use extracted_filter::ExtractedFilter;
use split::split_conjunction;
use sqlplan_error::{Result, internal};
use tracing::trace;

use super::OptimizeRule;
use crate::expr::Expression;
use crate::logical::logical_filter::LogicalFilter;
use crate::logical::logical_join::{JoinType, LogicalCrossJoin, LogicalJoin};
use crate::logical::logical_order::LogicalOrder;
use crate::logical::logical_return::LogicalReturn;
use crate::logical::logical_scan::LogicalScan;
use crate::logical::operator::{LogicalNode, LogicalOperator, Node};

#[derive(Debug, Default)]
pub struct FilterPushdownRule {
    filters: Vec<ExtractedFilter>,
}

impl OptimizeRule for FilterPushdownRule {
    fn optimize(&mut self, plan: LogicalOperator) -> Result<LogicalOperator> {
        match plan {
            LogicalOperator::Filter(filter) => self.pushdown_filter(filter),
            LogicalOperator::Return(ret) => self.pushdown_return(ret),
            LogicalOperator::Order(order) => self.pushdown_order_by(order),
            LogicalOperator::Scan(scan) => self.pushdown_scan(scan),
            LogicalOperator::CrossJoin(join) => self.pushdown_cross_join(join),
            LogicalOperator::Join(join) => self.pushdown_join(join),
            other => self.stop_pushdown(other),
        }
    }
}

impl FilterPushdownRule {
    /// Adds an expression as a filter that we'll be pushing down.
    fn add_filter(&mut self, expr: Expression) {
        let mut split = Vec::new();
        split_conjunction(expr, &mut split);

        self.filters
            .extend(split.into_iter().map(ExtractedFilter::from_expr))
    }

    /// Wraps the plan in a filter node holding all remaining filters.
    fn materialize(&mut self, plan: LogicalOperator) -> LogicalOperator {
        match Expression::and_all(self.filters.drain(..).map(|ex| ex.filter)) {
            Some(filter) => {
                LogicalOperator::Filter(Node::new(LogicalFilter { filter }, vec![plan]))
            }
            None => plan,
        }
    }

    /// Stops the push down for this set of filters, and wraps the plan in a new
    /// filter node.
    ///
    /// This will go ahead and perform a separate pushdown to children of this
    /// plan.
    fn stop_pushdown(&mut self, mut plan: LogicalOperator) -> Result<LogicalOperator> {
        plan.modify_replace_children(&mut |child| {
            let mut pushdown = FilterPushdownRule::default();
            pushdown.optimize(child)
        })?;

        if !self.filters.is_empty() {
            trace!(
                operator = plan.name(),
                filters = self.filters.len(),
                "stopped filter pushdown"
            );
        }

        Ok(self.materialize(plan))
    }

    /// Pushes down through a filter node.
    ///
    /// This will extract the filter expressions from this node and append them
    /// to the rule's current filter list.
    fn pushdown_filter(&mut self, mut plan: Node<LogicalFilter>) -> Result<LogicalOperator> {
        let child = plan.take_one_child_exact()?;
        self.add_filter(plan.node.filter);
        self.optimize(child)
    }

    fn pushdown_return(&mut self, mut plan: Node<LogicalReturn>) -> Result<LogicalOperator> {
        let child = plan.take_one_child_exact()?;
        plan.children = vec![self.optimize(child)?];
        Ok(LogicalOperator::Return(plan))
    }

    fn pushdown_order_by(&mut self, mut plan: Node<LogicalOrder>) -> Result<LogicalOperator> {
        let child = plan.take_one_child_exact()?;
        plan.children = vec![self.optimize(child)?];
        Ok(LogicalOperator::Order(plan))
    }

    /// Folds all remaining filters into the scan's own filter.
    fn pushdown_scan(&mut self, mut plan: Node<LogicalScan>) -> Result<LogicalOperator> {
        if self.filters.is_empty() {
            return Ok(LogicalOperator::Scan(plan));
        }

        let mut conjuncts = Vec::new();
        if let Some(existing) = plan.node.filter.take() {
            split_conjunction(existing, &mut conjuncts);
        }
        conjuncts.extend(self.filters.drain(..).map(|ex| ex.filter));

        trace!(table = %plan.node.alias, filters = conjuncts.len(), "pushed filters into scan");
        plan.node.filter = Expression::and_all(conjuncts);

        Ok(LogicalOperator::Scan(plan))
    }

    fn pushdown_join(&mut self, mut plan: Node<LogicalJoin>) -> Result<LogicalOperator> {
        match plan.node.join_type {
            JoinType::Inner => {
                // Convert to cross join, push down on cross join.
                let children = std::mem::take(&mut plan.children);
                self.add_filter(plan.node.condition);
                self.pushdown_cross_join(Node::new(LogicalCrossJoin, children))
            }
            JoinType::Left => self.pushdown_outer_join(plan, 0),
            JoinType::Right => self.pushdown_outer_join(plan, 1),
            JoinType::Full => self.stop_pushdown(LogicalOperator::Join(plan)),
        }
    }

    /// Push down through a left or right join.
    ///
    /// Filters from above may only move into the preserved side. Conjuncts
    /// of the join condition may only move into the other side, where they
    /// remove rows before they're null-extended.
    fn pushdown_outer_join(
        &mut self,
        mut plan: Node<LogicalJoin>,
        preserved: usize,
    ) -> Result<LogicalOperator> {
        let nullable = 1 - preserved;
        let mut children = plan.take_two_children_exact()?;

        let preserved_relations = children[preserved].output_relation()?.qualifiers();
        let nullable_relations = children[nullable].output_relation()?.qualifiers();

        let mut preserved_pushdown = Self::default();
        let mut remaining = Vec::new();
        for filter in self.filters.drain(..) {
            if filter.is_bound_by(&preserved_relations) {
                trace!(filter = %filter.filter, join = %plan.node.join_type, "pushed filter to preserved side");
                preserved_pushdown.filters.push(filter);
            } else {
                remaining.push(filter);
            }
        }

        let mut nullable_pushdown = Self::default();
        let mut conditions = Vec::new();
        let mut split = Vec::new();
        split_conjunction(plan.node.condition, &mut split);
        for expr in split {
            let filter = ExtractedFilter::from_expr(expr);
            if filter.is_bound_by(&nullable_relations) {
                trace!(filter = %filter.filter, join = %plan.node.join_type, "pushed join condition to nullable side");
                nullable_pushdown.filters.push(filter);
            } else {
                conditions.push(filter.filter);
            }
        }

        children[preserved] = preserved_pushdown.optimize(children[preserved].take())?;
        children[nullable] = nullable_pushdown.optimize(children[nullable].take())?;

        plan.node.condition = Expression::and_all(conditions).unwrap_or(Expression::lit(true));
        plan.children = children.into();

        self.filters = remaining;
        Ok(self.materialize(LogicalOperator::Join(plan)))
    }

    /// Push down through a cross join.
    ///
    /// Filters referencing both sides become the condition of an inner join.
    fn pushdown_cross_join(&mut self, mut plan: Node<LogicalCrossJoin>) -> Result<LogicalOperator> {
        let mut left_pushdown = Self::default();
        let mut right_pushdown = Self::default();

        let [mut left, mut right] = plan.take_two_children_exact()?;

        let left_relations = left.output_relation()?.qualifiers();
        let right_relations = right.output_relation()?.qualifiers();
        if !left_relations.is_disjoint(&right_relations) {
            return Err(internal!(
                "join sides share a qualifier: {left_relations:?} and {right_relations:?}"
            ));
        }

        let mut join_exprs = Vec::new();

        // Figure out which expressions we can push further down vs which are
        // part of the join expression.
        for filter in self.filters.drain(..) {
            if filter.is_bound_by(&left_relations) {
                trace!(filter = %filter.filter, "pushed filter to left side of join");
                left_pushdown.filters.push(filter);
            } else if filter.is_bound_by(&right_relations) {
                trace!(filter = %filter.filter, "pushed filter to right side of join");
                right_pushdown.filters.push(filter);
            } else {
                join_exprs.push(filter.filter);
            }
        }

        // Do the left/right pushdowns first.
        left = left_pushdown.optimize(left)?;
        right = right_pushdown.optimize(right)?;

        match Expression::and_all(join_exprs) {
            Some(condition) => Ok(LogicalOperator::Join(Node::new(
                LogicalJoin {
                    join_type: JoinType::Inner,
                    condition,
                },
                vec![left, right],
            ))),
            None => Ok(LogicalOperator::CrossJoin(Node::new(
                LogicalCrossJoin,
                vec![left, right],
            ))),
        }
    }
}
