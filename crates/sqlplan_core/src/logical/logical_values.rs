use serde::{Deserialize, Serialize};
use sqlplan_error::Result;

use super::operator::{LogicalNode, Node};
use crate::explain::explainable::{DisplayJoin, ExplainEntry, Explainable};
use crate::expr::Expression;
use crate::types::Relation;

/// Literal rows, used as the source of an INSERT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalValues {
    pub rows: Vec<Vec<Expression>>,
    pub relation: Relation,
}

impl Explainable for LogicalValues {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Values").with_detail_values(
            self.rows
                .iter()
                .map(|row| format!("({})", DisplayJoin(row, ", "))),
            "; ",
        )
    }
}

impl LogicalNode for Node<LogicalValues> {
    fn name(&self) -> &'static str {
        "Values"
    }

    fn output_relation(&self) -> Result<Relation> {
        Ok(self.node.relation.clone())
    }

    fn for_each_expr<F>(&self, func: &mut F) -> Result<()>
    where
        F: FnMut(&Expression) -> Result<()>,
    {
        for expr in self.node.rows.iter().flatten() {
            func(expr)?;
        }
        Ok(())
    }

    fn for_each_expr_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        for expr in self.node.rows.iter_mut().flatten() {
            func(expr)?;
        }
        Ok(())
    }
}
