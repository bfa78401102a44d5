use std::fmt;

use serde::{Deserialize, Serialize};
use sqlplan_error::Result;

use super::operator::{LogicalNode, Node};
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::Expression;
use crate::types::Relation;

/// `column = value` in an UPDATE or conflict DO UPDATE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentExpr {
    pub column: String,
    pub value: Expression,
}

impl fmt::Display for AssignmentExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.column, self.value)
    }
}

/// Updates rows of a table.
///
/// The child produces the rows to update, joined with any FROM sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalUpdate {
    pub table: String,
    pub assignments: Vec<AssignmentExpr>,
}

impl Explainable for LogicalUpdate {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Update")
            .with_annotation(&self.table)
            .with_detail_values(&self.assignments, "; ")
    }
}

impl LogicalNode for Node<LogicalUpdate> {
    fn name(&self) -> &'static str {
        "Update"
    }

    fn output_relation(&self) -> Result<Relation> {
        Ok(Relation::empty())
    }

    fn for_each_expr<F>(&self, func: &mut F) -> Result<()>
    where
        F: FnMut(&Expression) -> Result<()>,
    {
        for assignment in &self.node.assignments {
            func(&assignment.value)?;
        }
        Ok(())
    }

    fn for_each_expr_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        for assignment in &mut self.node.assignments {
            func(&mut assignment.value)?;
        }
        Ok(())
    }
}

/// Deletes the rows produced by the child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalDelete {
    pub table: String,
}

impl Explainable for LogicalDelete {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Delete").with_annotation(&self.table)
    }
}

impl LogicalNode for Node<LogicalDelete> {
    fn name(&self) -> &'static str {
        "Delete"
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
