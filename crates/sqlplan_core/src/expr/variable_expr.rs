use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::VariablePrefix;
use crate::types::DataType;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableExpr {
    pub prefix: VariablePrefix,
    pub name: String,
    /// Field of an object variable being accessed.
    pub field: Option<String>,
    pub datatype: DataType,
}

impl fmt::Display for VariableExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.name)?;
        if let Some(field) = &self.field {
            write!(f, ".{field}")?;
        }
        Ok(())
    }
}
