use std::fmt;

use serde::{Deserialize, Serialize};

use super::Expression;

/// `expr IN (a, b, ...)`.
///
/// An IN subquery holds a single scalar subquery expression in `list`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InExpr {
    pub expr: Box<Expression>,
    pub list: Vec<Expression>,
}

impl fmt::Display for InExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} IN (", self.expr)?;
        for (idx, item) in self.list.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{item}")?;
        }
        write!(f, ")")
    }
}
