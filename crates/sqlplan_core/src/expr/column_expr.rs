use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::DataType;

/// Reference to a column of some relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnExpr {
    /// Qualifier of the column. None when referencing an output alias.
    pub relation: Option<String>,
    pub column: String,
    pub datatype: DataType,
    /// Number of scopes outward the column was found in. Zero for local
    /// columns, greater than zero for correlated columns.
    pub depth: usize,
}

impl ColumnExpr {
    pub fn is_correlated(&self) -> bool {
        self.depth > 0
    }

    /// Same column, with the qualifier and name only.
    pub fn same_column(&self, other: &ColumnExpr) -> bool {
        self.relation == other.relation && self.column == other.column
    }
}

impl fmt::Display for ColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.relation {
            Some(rel) => write!(f, "{rel}.{}", self.column),
            None => write!(f, "{}", self.column),
        }
    }
}
