use std::fmt;

use serde::{Deserialize, Serialize};

use super::Expression;

/// `left IS right` or `left IS DISTINCT FROM right`.
///
/// Negated forms are wrapped in a unary NOT.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IsExpr {
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub distinct: bool,
}

impl fmt::Display for IsExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.distinct {
            write!(f, "{} IS DISTINCT FROM {}", self.left, self.right)
        } else {
            write!(f, "{} IS {}", self.left, self.right)
        }
    }
}
