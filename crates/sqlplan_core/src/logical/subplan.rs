use std::fmt;

use serde::{Deserialize, Serialize};

use super::operator::LogicalOperator;
use crate::expr::column_expr::ColumnExpr;

/// Index of a subquery plan within a compiled statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubplanId(pub usize);

impl fmt::Display for SubplanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A planned subquery, referenced by id from subquery expressions and
/// subquery scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subplan {
    pub id: SubplanId,
    pub plan: LogicalOperator,
    /// Columns from enclosing scopes referenced anywhere within the subplan.
    pub correlated: Vec<ColumnExpr>,
}

impl Subplan {
    pub fn is_correlated(&self) -> bool {
        !self.correlated.is_empty()
    }
}
