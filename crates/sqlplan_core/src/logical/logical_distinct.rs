use serde::{Deserialize, Serialize};
use sqlplan_error::Result;

use super::operator::{LogicalNode, Node};
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::Expression;
use crate::types::Relation;

/// DISTINCTs all input rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalDistinct;

impl Explainable for LogicalDistinct {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Distinct")
    }
}

impl LogicalNode for Node<LogicalDistinct> {
    fn name(&self) -> &'static str {
        "Distinct"
    }

    fn output_relation(&self) -> Result<Relation> {
        self.child_relation()
    }

    fn for_each_expr<F>(&self, _func: &mut F) -> Result<()>
    where
        F: FnMut(&Expression) -> Result<()>,
    {
        Ok(())
    }

    fn for_each_expr_mut<F>(&mut self, _func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        Ok(())
    }
}
