use std::fmt;

use serde::{Deserialize, Serialize};

use super::column_expr::ColumnExpr;
use crate::logical::subplan::SubplanId;
use crate::types::DataType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubqueryKind {
    /// Returns a single value.
    Scalar,
    /// Returns whether the subquery produces any rows.
    Exists,
}

/// Reference to a planned subquery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubqueryExpr {
    pub kind: SubqueryKind,
    pub subplan: SubplanId,
    /// Outer columns referenced from within the subquery.
    ///
    /// Depth is relative to the scope containing this expression.
    pub correlated: Vec<ColumnExpr>,
    pub datatype: DataType,
    /// Name of the subquery's single output column.
    pub column_name: Option<String>,
}

impl SubqueryExpr {
    /// Columns this expression depends on in its own scope.
    pub fn local_columns(&self) -> impl Iterator<Item = &ColumnExpr> {
        self.correlated.iter().filter(|c| c.depth == 0)
    }
}

impl fmt::Display for SubqueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            SubqueryKind::Scalar => "scalar",
            SubqueryKind::Exists => "exists",
        };
        write!(
            f,
            "[subquery ({kind}) (subplan_id={}) {}]",
            self.subplan,
            CorrelationDisplay(&self.correlated)
        )
    }
}

/// Formats `(uncorrelated)` or `(correlated: a.b, c.d)`.
#[derive(Debug)]
pub struct CorrelationDisplay<'a>(pub &'a [ColumnExpr]);

impl fmt::Display for CorrelationDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(uncorrelated)");
        }
        write!(f, "(correlated: ")?;
        for (idx, col) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{col}")?;
        }
        write!(f, ")")
    }
}
