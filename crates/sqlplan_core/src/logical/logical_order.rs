use serde::{Deserialize, Serialize};
use sqlplan_error::Result;

use super::operator::{LogicalNode, Node};
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::Expression;
use crate::expr::sort_expr::SortExpr;
use crate::types::Relation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalOrder {
    pub exprs: Vec<SortExpr>,
}

impl Explainable for LogicalOrder {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Sort").with_detail_values(&self.exprs, "; ")
    }
}

impl LogicalNode for Node<LogicalOrder> {
    fn name(&self) -> &'static str {
        "Order"
    }

    fn output_relation(&self) -> Result<Relation> {
        self.child_relation()
    }

    fn for_each_expr<F>(&self, func: &mut F) -> Result<()>
    where
        F: FnMut(&Expression) -> Result<()>,
    {
        for sort in &self.node.exprs {
            func(&sort.expr)?;
        }
        Ok(())
    }

    fn for_each_expr_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        for sort in &mut self.node.exprs {
            func(&mut sort.expr)?;
        }
        Ok(())
    }
}
