use std::fmt;

use serde::{Deserialize, Serialize};

use super::Expression;
use super::aggregate_expr::write_call;
use super::sort_expr::SortExpr;
use crate::types::DataType;

/// Partitioning and ordering of a window.
///
/// Functions sharing an equal spec are computed by the same window node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowSpec {
    pub partition_by: Vec<Expression>,
    pub order_by: Vec<SortExpr>,
}

impl WindowSpec {
    /// Write the `[partition_by=...] [order_by=...]` annotations.
    pub fn annotations(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !self.partition_by.is_empty() {
            let parts: Vec<_> = self.partition_by.iter().map(|e| e.to_string()).collect();
            out.push(format!("partition_by={}", parts.join(", ")));
        }
        if !self.order_by.is_empty() {
            let parts: Vec<_> = self.order_by.iter().map(|e| e.to_string()).collect();
            out.push(format!("order_by={}", parts.join(", ")));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowExpr {
    pub function: String,
    pub inputs: Vec<Expression>,
    /// Called as `function(*)`.
    pub star: bool,
    pub filter: Option<Box<Expression>>,
    pub spec: WindowSpec,
    pub datatype: DataType,
}

impl fmt::Display for WindowExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_call(
            f,
            &self.function,
            &self.inputs,
            false,
            self.star,
            self.filter.as_deref(),
        )
    }
}
