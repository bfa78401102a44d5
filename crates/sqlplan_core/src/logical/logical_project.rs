use serde::{Deserialize, Serialize};
use sqlplan_error::Result;

use super::operator::{LogicalNode, Node};
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::Expression;
use crate::types::Relation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalProject {
    pub projections: Vec<Expression>,
}

impl LogicalProject {
    pub fn relation(&self) -> Relation {
        Relation::new(self.projections.iter().map(|e| e.output_field()).collect())
    }
}

impl Explainable for LogicalProject {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Project").with_detail_values(&self.projections, "; ")
    }
}

impl LogicalNode for Node<LogicalProject> {
    fn name(&self) -> &'static str {
        "Project"
    }

    fn output_relation(&self) -> Result<Relation> {
        Ok(self.node.relation())
    }

    fn for_each_expr<F>(&self, func: &mut F) -> Result<()>
    where
        F: FnMut(&Expression) -> Result<()>,
    {
        for expr in &self.node.projections {
            func(expr)?;
        }
        Ok(())
    }

    fn for_each_expr_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        for expr in &mut self.node.projections {
            func(expr)?;
        }
        Ok(())
    }
}
