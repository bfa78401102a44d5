use serde::{Deserialize, Serialize};
use sqlplan_error::Result;

use super::operator::{LogicalNode, Node};
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::Expression;
use crate::types::Relation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalFilter {
    pub filter: Expression,
}

impl Explainable for LogicalFilter {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Filter").with_detail(&self.filter)
    }
}

impl LogicalNode for Node<LogicalFilter> {
    fn name(&self) -> &'static str {
        "Filter"
    }

    fn output_relation(&self) -> Result<Relation> {
        self.child_relation()
    }

    fn for_each_expr<F>(&self, func: &mut F) -> Result<()>
    where
        F: FnMut(&Expression) -> Result<()>,
    {
        func(&self.node.filter)
    }

    fn for_each_expr_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        func(&mut self.node.filter)
    }
}
