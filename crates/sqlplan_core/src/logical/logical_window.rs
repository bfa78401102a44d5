use serde::{Deserialize, Serialize};
use sqlplan_error::Result;

use super::operator::{LogicalNode, Node};
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::Expression;
use crate::expr::ref_expr::RefBinding;
use crate::expr::window_expr::WindowSpec;
use crate::types::Relation;

/// Computes window functions sharing a single partitioning and ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalWindow {
    pub spec: WindowSpec,
    /// Window function calls bound to reference ids.
    pub functions: Vec<RefBinding>,
}

impl Explainable for LogicalWindow {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Window")
            .with_annotations(self.spec.annotations())
            .with_detail_values(&self.functions, "; ")
    }
}

impl LogicalNode for Node<LogicalWindow> {
    fn name(&self) -> &'static str {
        "Window"
    }

    fn output_relation(&self) -> Result<Relation> {
        let mut rel = self.child_relation()?;
        rel.fields
            .extend(self.node.functions.iter().map(|b| b.expr.output_field()));
        Ok(rel)
    }

    fn for_each_expr<F>(&self, func: &mut F) -> Result<()>
    where
        F: FnMut(&Expression) -> Result<()>,
    {
        for expr in &self.node.spec.partition_by {
            func(expr)?;
        }
        for sort in &self.node.spec.order_by {
            func(&sort.expr)?;
        }
        for binding in &self.node.functions {
            func(&binding.expr)?;
        }
        Ok(())
    }

    fn for_each_expr_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        for expr in &mut self.node.spec.partition_by {
            func(expr)?;
        }
        for sort in &mut self.node.spec.order_by {
            func(&mut sort.expr)?;
        }
        for binding in &mut self.node.functions {
            func(&mut binding.expr)?;
        }
        Ok(())
    }
}
