use serde::{Deserialize, Serialize};
use sqlplan_error::Result;

use super::operator::{LogicalNode, Node};
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::Expression;
use crate::types::{Field, Relation};

/// Root of a query, naming the columns returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalReturn {
    pub fields: Vec<Field>,
}

impl LogicalReturn {
    /// Build from the relation of the final query node. Unnamed columns get
    /// a placeholder name.
    pub fn from_relation(relation: &Relation) -> Self {
        let fields = relation
            .iter()
            .map(|field| Field {
                name: field.output_name().to_string(),
                ..field.clone()
            })
            .collect();
        LogicalReturn { fields }
    }
}

impl Explainable for LogicalReturn {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Return").with_detail_values(
            self.fields
                .iter()
                .map(|f| format!("{} [{}]", f.name, f.datatype)),
            ", ",
        )
    }
}

impl LogicalNode for Node<LogicalReturn> {
    fn name(&self) -> &'static str {
        "Return"
    }

    fn output_relation(&self) -> Result<Relation> {
        Ok(Relation::new(self.node.fields.clone()))
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
