use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{DataType, ScalarValue};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LiteralExpr {
    pub literal: ScalarValue,
}

impl LiteralExpr {
    pub fn datatype(&self) -> DataType {
        self.literal.datatype()
    }
}

impl fmt::Display for LiteralExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.literal)
    }
}
