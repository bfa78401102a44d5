use serde::{Deserialize, Serialize};
use sqlplan_error::{Result, internal};

use super::logical_aggregate::LogicalAggregate;
use super::logical_distinct::LogicalDistinct;
use super::logical_empty::LogicalEmpty;
use super::logical_filter::LogicalFilter;
use super::logical_insert::LogicalInsert;
use super::logical_join::{LogicalCrossJoin, LogicalJoin};
use super::logical_limit::LogicalLimit;
use super::logical_mutate::{LogicalDelete, LogicalUpdate};
use super::logical_order::LogicalOrder;
use super::logical_project::LogicalProject;
use super::logical_return::LogicalReturn;
use super::logical_scan::{LogicalCteScan, LogicalScan, LogicalSubqueryScan};
use super::logical_setop::LogicalSetop;
use super::logical_values::LogicalValues;
use super::logical_window::LogicalWindow;
use super::subplan::SubplanId;
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::Expression;
use crate::types::Relation;

/// Common operations across all logical nodes in a plan.
///
/// For individual operators, this should be implemented on `Node<T>` and not
/// `T`.
///
/// This is implemented on `LogicalOperator` for convenience.
pub trait LogicalNode {
    /// Name of the operator.
    fn name(&self) -> &'static str;

    /// Output relation of this operator.
    ///
    /// Derived from the children where possible. Operators that introduce a
    /// new relation store it.
    fn output_relation(&self) -> Result<Relation>;

    fn for_each_expr<F>(&self, func: &mut F) -> Result<()>
    where
        F: FnMut(&Expression) -> Result<()>;

    fn for_each_expr_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>;
}

/// Wrapper around nodes in the logical plan holding the node's inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node<N> {
    /// Node specific logic.
    pub node: N,
    /// Inputs to this node.
    pub children: Vec<LogicalOperator>,
}

impl<N> Node<N> {
    pub fn new(node: N, children: Vec<LogicalOperator>) -> Self {
        Node { node, children }
    }

    pub fn into_inner(self) -> N {
        self.node
    }

    pub fn take_one_child_exact(&mut self) -> Result<LogicalOperator> {
        if self.children.len() != 1 {
            return Err(internal!(
                "Expected 1 child to operator, have {}",
                self.children.len()
            ));
        }
        self.children
            .pop()
            .ok_or_else(|| internal!("Expected 1 child to operator"))
    }

    pub fn take_two_children_exact(&mut self) -> Result<[LogicalOperator; 2]> {
        if self.children.len() != 2 {
            return Err(internal!(
                "Expected 2 children to operator, have {}",
                self.children.len()
            ));
        }
        let mut drain = self.children.drain(..);
        match (drain.next(), drain.next()) {
            (Some(first), Some(second)) => Ok([first, second]),
            _ => Err(internal!("Expected 2 children to operator")),
        }
    }

    pub fn get_one_child_exact(&self) -> Result<&LogicalOperator> {
        match self.children.as_slice() {
            [child] => Ok(child),
            other => Err(internal!(
                "Expected 1 child to operator, have {}",
                other.len()
            )),
        }
    }

    pub fn get_two_children_exact(&self) -> Result<[&LogicalOperator; 2]> {
        match self.children.as_slice() {
            [left, right] => Ok([left, right]),
            other => Err(internal!(
                "Expected 2 children to operator, have {}",
                other.len()
            )),
        }
    }

    /// Relation of the single child.
    pub fn child_relation(&self) -> Result<Relation> {
        self.get_one_child_exact()?.output_relation()
    }

    /// Concatenated relations of all children.
    pub fn children_relation(&self) -> Result<Relation> {
        self.children
            .iter()
            .try_fold(Relation::empty(), |rel, child| {
                Ok(rel.join(&child.output_relation()?))
            })
    }
}

impl<N: Explainable> Explainable for Node<N> {
    fn explain_entry(&self) -> ExplainEntry {
        self.node.explain_entry()
    }
}

impl<N> AsRef<N> for Node<N> {
    fn as_ref(&self) -> &N {
        &self.node
    }
}

impl<N> AsMut<N> for Node<N> {
    fn as_mut(&mut self) -> &mut N {
        &mut self.node
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOperator {
    Return(Node<LogicalReturn>),
    Project(Node<LogicalProject>),
    Filter(Node<LogicalFilter>),
    Scan(Node<LogicalScan>),
    CteScan(Node<LogicalCteScan>),
    SubqueryScan(Node<LogicalSubqueryScan>),
    Values(Node<LogicalValues>),
    Empty(Node<LogicalEmpty>),
    Join(Node<LogicalJoin>),
    CrossJoin(Node<LogicalCrossJoin>),
    Aggregate(Node<LogicalAggregate>),
    Window(Node<LogicalWindow>),
    Order(Node<LogicalOrder>),
    Limit(Node<LogicalLimit>),
    Distinct(Node<LogicalDistinct>),
    SetOp(Node<LogicalSetop>),
    Insert(Node<LogicalInsert>),
    Update(Node<LogicalUpdate>),
    Delete(Node<LogicalDelete>),
}

/// Dispatch an expression to the inner `Node<T>` of every variant.
macro_rules! dispatch {
    ($op:expr, $n:ident => $body:expr) => {
        match $op {
            LogicalOperator::Return($n) => $body,
            LogicalOperator::Project($n) => $body,
            LogicalOperator::Filter($n) => $body,
            LogicalOperator::Scan($n) => $body,
            LogicalOperator::CteScan($n) => $body,
            LogicalOperator::SubqueryScan($n) => $body,
            LogicalOperator::Values($n) => $body,
            LogicalOperator::Empty($n) => $body,
            LogicalOperator::Join($n) => $body,
            LogicalOperator::CrossJoin($n) => $body,
            LogicalOperator::Aggregate($n) => $body,
            LogicalOperator::Window($n) => $body,
            LogicalOperator::Order($n) => $body,
            LogicalOperator::Limit($n) => $body,
            LogicalOperator::Distinct($n) => $body,
            LogicalOperator::SetOp($n) => $body,
            LogicalOperator::Insert($n) => $body,
            LogicalOperator::Update($n) => $body,
            LogicalOperator::Delete($n) => $body,
        }
    };
}

impl LogicalOperator {
    pub const EMPTY: LogicalOperator = LogicalOperator::Empty(Node {
        node: LogicalEmpty,
        children: Vec::new(),
    });

    /// Replace self with an empty scan, returning the original operator.
    pub fn take(&mut self) -> Self {
        std::mem::replace(self, Self::EMPTY)
    }

    pub fn children(&self) -> &[LogicalOperator] {
        dispatch!(self, n => &n.children)
    }

    pub fn children_mut(&mut self) -> &mut Vec<LogicalOperator> {
        dispatch!(self, n => &mut n.children)
    }

    /// Replaces the children in the operator by running them through `modify`.
    ///
    /// Children will be left in an undetermined state if `modify` errors.
    pub fn modify_replace_children<F>(&mut self, modify: &mut F) -> Result<()>
    where
        F: FnMut(LogicalOperator) -> Result<LogicalOperator>,
    {
        let children = self.children_mut();
        let mut new_children = Vec::with_capacity(children.len());

        for child in children.drain(..) {
            new_children.push(modify(child)?);
        }

        *children = new_children;

        Ok(())
    }

    /// Subplans referenced directly by this operator, not including its
    /// children.
    pub fn referenced_subplans(&self) -> Vec<SubplanId> {
        let mut out = Vec::new();
        if let LogicalOperator::SubqueryScan(scan) = self {
            out.push(scan.node.subplan);
        }
        // Collecting can't fail.
        let _ = self.for_each_expr(&mut |expr| {
            expr.collect_subplans(&mut out);
            Ok(())
        });
        out
    }

    pub fn is_project(&self) -> bool {
        matches!(self, LogicalOperator::Project(_))
    }
}

impl LogicalNode for LogicalOperator {
    fn name(&self) -> &'static str {
        dispatch!(self, n => n.name())
    }

    fn output_relation(&self) -> Result<Relation> {
        dispatch!(self, n => n.output_relation())
    }

    fn for_each_expr<F>(&self, func: &mut F) -> Result<()>
    where
        F: FnMut(&Expression) -> Result<()>,
    {
        dispatch!(self, n => n.for_each_expr(func))
    }

    fn for_each_expr_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        dispatch!(self, n => n.for_each_expr_mut(func))
    }
}

impl Explainable for LogicalOperator {
    fn explain_entry(&self) -> ExplainEntry {
        dispatch!(self, n => n.explain_entry())
    }
}
