use std::fmt;

use serde::{Deserialize, Serialize};

use super::Expression;
use crate::types::DataType;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WhenThen {
    pub when: Expression,
    pub then: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseExpr {
    /// Value compared against each WHEN. Absent for searched CASE.
    pub operand: Option<Box<Expression>>,
    pub cases: Vec<WhenThen>,
    pub else_expr: Option<Box<Expression>>,
    pub datatype: DataType,
}

impl fmt::Display for CaseExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CASE")?;
        if let Some(operand) = &self.operand {
            write!(f, " [{operand}]")?;
        }
        for case in &self.cases {
            write!(f, " WHEN [{}] THEN [{}]", case.when, case.then)?;
        }
        if let Some(else_expr) = &self.else_expr {
            write!(f, " ELSE [{else_expr}]")?;
        }
        write!(f, " END")
    }
}
