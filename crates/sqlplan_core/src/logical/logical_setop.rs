use std::fmt;

use serde::{Deserialize, Serialize};
use sqlplan_error::Result;

use super::operator::{LogicalNode, Node};
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::Expression;
use crate::types::Relation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetOpKind {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl fmt::Display for SetOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Union => write!(f, "union"),
            Self::UnionAll => write!(f, "union all"),
            Self::Intersect => write!(f, "intersect"),
            Self::Except => write!(f, "except"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalSetop {
    pub kind: SetOpKind,
    /// Output relation, named after the left input with qualifiers removed.
    pub relation: Relation,
}

impl Explainable for LogicalSetop {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Set").with_detail(self.kind)
    }
}

impl LogicalNode for Node<LogicalSetop> {
    fn name(&self) -> &'static str {
        "SetOp"
    }

    fn output_relation(&self) -> Result<Relation> {
        Ok(self.node.relation.clone())
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
