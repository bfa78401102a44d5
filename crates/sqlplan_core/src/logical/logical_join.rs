use std::fmt;

use serde::{Deserialize, Serialize};
use sqlplan_error::Result;

use super::operator::{LogicalNode, Node};
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::Expression;
use crate::types::Relation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    /// Standard INNER join.
    Inner,
    /// Standard LEFT join.
    Left,
    /// Standard RIGHT join.
    Right,
    /// Standard full/outer join.
    Full,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner => write!(f, "inner"),
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Full => write!(f, "outer"),
        }
    }
}

/// Join with an arbitrary condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalJoin {
    pub join_type: JoinType,
    pub condition: Expression,
}

impl Explainable for LogicalJoin {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Join")
            .with_annotation(self.join_type)
            .with_detail(&self.condition)
    }
}

impl LogicalNode for Node<LogicalJoin> {
    fn name(&self) -> &'static str {
        "Join"
    }

    fn output_relation(&self) -> Result<Relation> {
        let [left, right] = self.get_two_children_exact()?;
        let mut left = left.output_relation()?;
        let mut right = right.output_relation()?;

        // Outer sides may produce nulls.
        if matches!(self.node.join_type, JoinType::Right | JoinType::Full) {
            left.fields.iter_mut().for_each(|f| f.nullable = true);
        }
        if matches!(self.node.join_type, JoinType::Left | JoinType::Full) {
            right.fields.iter_mut().for_each(|f| f.nullable = true);
        }

        Ok(left.join(&right))
    }

    fn for_each_expr<F>(&self, func: &mut F) -> Result<()>
    where
        F: FnMut(&Expression) -> Result<()>,
    {
        func(&self.node.condition)
    }

    fn for_each_expr_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        func(&mut self.node.condition)
    }
}

/// Cartesian product of two inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalCrossJoin;

impl Explainable for LogicalCrossJoin {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Cartesian Product")
    }
}

impl LogicalNode for Node<LogicalCrossJoin> {
    fn name(&self) -> &'static str {
        "CrossJoin"
    }

    fn output_relation(&self) -> Result<Relation> {
        self.children_relation()
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
