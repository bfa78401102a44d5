use serde::{Deserialize, Serialize};
use sqlplan_error::Result;

use super::operator::{LogicalNode, Node};
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::Expression;
use crate::expr::ref_expr::RefBinding;
use crate::types::Relation;

/// Computes aggregates, optionally grouped.
///
/// Both group keys and aggregates are bound to ids. Expressions above this
/// node reference them through reference expressions instead of repeating
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalAggregate {
    /// Deduplicated GROUP BY expressions in first-appearance order.
    pub group_by: Vec<RefBinding>,
    /// Deduplicated aggregate calls.
    pub aggregates: Vec<RefBinding>,
}

impl LogicalAggregate {
    pub fn relation(&self) -> Relation {
        Relation::new(
            self.group_by
                .iter()
                .chain(&self.aggregates)
                .map(|b| b.expr.output_field())
                .collect(),
        )
    }
}

impl Explainable for LogicalAggregate {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Aggregate")
            .with_annotations(&self.group_by)
            .with_detail_values(&self.aggregates, "; ")
    }
}

impl LogicalNode for Node<LogicalAggregate> {
    fn name(&self) -> &'static str {
        "Aggregate"
    }

    fn output_relation(&self) -> Result<Relation> {
        Ok(self.node.relation())
    }

    fn for_each_expr<F>(&self, func: &mut F) -> Result<()>
    where
        F: FnMut(&Expression) -> Result<()>,
    {
        for binding in self.node.group_by.iter().chain(&self.node.aggregates) {
            func(&binding.expr)?;
        }
        Ok(())
    }

    fn for_each_expr_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        for binding in self
            .node
            .group_by
            .iter_mut()
            .chain(self.node.aggregates.iter_mut())
        {
            func(&mut binding.expr)?;
        }
        Ok(())
    }
}
