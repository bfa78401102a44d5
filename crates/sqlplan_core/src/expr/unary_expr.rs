use std::fmt;

use serde::{Deserialize, Serialize};

use super::Expression;
use crate::types::DataType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Negate,
    Positive,
    Not,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negate => write!(f, "-"),
            Self::Positive => write!(f, "+"),
            Self::Not => write!(f, "NOT "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnaryExpr {
    pub op: UnaryOperator,
    pub expr: Box<Expression>,
}

impl UnaryExpr {
    pub fn not(expr: Expression) -> Self {
        UnaryExpr {
            op: UnaryOperator::Not,
            expr: Box::new(expr),
        }
    }

    pub fn datatype(&self) -> DataType {
        match self.op {
            UnaryOperator::Not => DataType::Bool,
            _ => self.expr.datatype(),
        }
    }
}

impl fmt::Display for UnaryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.expr)
    }
}
