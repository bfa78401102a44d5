use std::fmt;

use serde::{Deserialize, Serialize};
use sqlplan_error::{Result, internal};

use super::operator::{LogicalNode, LogicalOperator};
use super::subplan::{Subplan, SubplanId};
use crate::types::{Field, Relation};

/// Renaming of a CTE output column through an explicit column list or the
/// CTE name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRename {
    /// Field as produced by the CTE's query.
    pub from: Field,
    pub to: String,
}

impl fmt::Display for ColumnRename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtePlan {
    pub name: String,
    pub recursive: bool,
    pub plan: LogicalOperator,
    pub renames: Vec<ColumnRename>,
    /// Relation visible to scans of this CTE, qualified by the CTE name.
    pub relation: Relation,
}

/// The output of planning a single statement.
///
/// Subplans and CTEs are stored flat and referenced by id/name from the plan
/// tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledStatement {
    pub root: LogicalOperator,
    /// CTEs in definition order.
    pub ctes: Vec<CtePlan>,
    /// Subplans indexed by their id.
    pub subplans: Vec<Subplan>,
}

impl CompiledStatement {
    pub fn subplan(&self, id: SubplanId) -> Result<&Subplan> {
        self.subplans
            .get(id.0)
            .ok_or_else(|| internal!("missing subplan {id}"))
    }

    pub fn cte(&self, name: &str) -> Option<&CtePlan> {
        self.ctes.iter().find(|cte| cte.name == name)
    }

    /// Output relation of the statement.
    pub fn relation(&self) -> Result<Relation> {
        self.root.output_relation()
    }
}

impl fmt::Display for CompiledStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::explain::format_statement(self))
    }
}
