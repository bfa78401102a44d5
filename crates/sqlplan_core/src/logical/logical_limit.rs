use serde::{Deserialize, Serialize};
use sqlplan_error::Result;

use super::operator::{LogicalNode, Node};
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::Expression;
use crate::types::Relation;

/// LIMIT with an optional OFFSET. Both are `int8` expressions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalLimit {
    pub limit: Expression,
    pub offset: Option<Expression>,
}

impl Explainable for LogicalLimit {
    fn explain_entry(&self) -> ExplainEntry {
        let mut ent = ExplainEntry::new("Limit");
        if let Some(offset) = &self.offset {
            ent = ent.with_annotation(format!("offset={offset}"));
        }
        ent.with_detail(&self.limit)
    }
}

impl LogicalNode for Node<LogicalLimit> {
    fn name(&self) -> &'static str {
        "Limit"
    }

    fn output_relation(&self) -> Result<Relation> {
        self.child_relation()
    }

    fn for_each_expr<F>(&self, func: &mut F) -> Result<()>
    where
        F: FnMut(&Expression) -> Result<()>,
    {
        func(&self.node.limit)?;
        if let Some(offset) = &self.node.offset {
            func(offset)?;
        }
        Ok(())
    }

    fn for_each_expr_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        func(&mut self.node.limit)?;
        if let Some(offset) = &mut self.node.offset {
            func(offset)?;
        }
        Ok(())
    }
}
