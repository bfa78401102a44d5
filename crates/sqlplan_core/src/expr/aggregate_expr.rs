use std::fmt;

use serde::{Deserialize, Serialize};

use super::Expression;
use crate::types::DataType;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregateExpr {
    pub function: String,
    pub inputs: Vec<Expression>,
    pub distinct: bool,
    /// Called as `function(*)`.
    pub star: bool,
    pub filter: Option<Box<Expression>>,
    pub datatype: DataType,
}

impl fmt::Display for AggregateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_call(
            f,
            &self.function,
            &self.inputs,
            self.distinct,
            self.star,
            self.filter.as_deref(),
        )
    }
}

/// Write `name([distinct ]args)` with an optional FILTER clause.
pub(crate) fn write_call(
    f: &mut fmt::Formatter<'_>,
    function: &str,
    inputs: &[Expression],
    distinct: bool,
    star: bool,
    filter: Option<&Expression>,
) -> fmt::Result {
    write!(f, "{function}(")?;
    if star {
        write!(f, "*")?;
    } else {
        for (idx, input) in inputs.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            } else if distinct {
                write!(f, "distinct ")?;
            }
            write!(f, "{input}")?;
        }
    }
    write!(f, ")")?;
    if let Some(filter) = filter {
        write!(f, " FILTER (WHERE {filter})")?;
    }
    Ok(())
}
