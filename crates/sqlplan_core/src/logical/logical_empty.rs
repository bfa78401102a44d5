use serde::{Deserialize, Serialize};
use sqlplan_error::Result;

use super::operator::{LogicalNode, Node};
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::Expression;
use crate::types::Relation;

/// Produces a single row with no columns.
///
/// Source for SELECTs without a FROM clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalEmpty;

impl Explainable for LogicalEmpty {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Empty Scan")
    }
}

impl LogicalNode for Node<LogicalEmpty> {
    fn name(&self) -> &'static str {
        "Empty"
    }

    fn output_relation(&self) -> Result<Relation> {
        Ok(Relation::empty())
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
