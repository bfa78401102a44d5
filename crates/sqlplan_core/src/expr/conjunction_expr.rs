use std::fmt;

use serde::{Deserialize, Serialize};

use super::Expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConjunctionOperator {
    And,
    Or,
}

impl fmt::Display for ConjunctionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConjunctionExpr {
    pub op: ConjunctionOperator,
    pub expressions: Vec<Expression>,
}

impl ConjunctionExpr {
    /// Combine two expressions, flattening nested conjunctions using the
    /// same operator.
    pub fn combine(op: ConjunctionOperator, left: Expression, right: Expression) -> Self {
        let mut expressions = Vec::with_capacity(2);
        for expr in [left, right] {
            match expr {
                Expression::Conjunction(inner) if inner.op == op => {
                    expressions.extend(inner.expressions)
                }
                other => expressions.push(other),
            }
        }
        ConjunctionExpr { op, expressions }
    }
}

impl fmt::Display for ConjunctionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, expr) in self.expressions.iter().enumerate() {
            if idx > 0 {
                write!(f, " {} ", self.op)?;
            }
            write!(f, "{expr}")?;
        }
        Ok(())
    }
}
