use std::fmt;

use serde::{Deserialize, Serialize};

use super::Expression;
use crate::types::DataType;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CastExpr {
    pub to: DataType,
    pub expr: Box<Expression>,
}

impl fmt::Display for CastExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.expr, self.to)
    }
}
