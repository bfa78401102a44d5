use std::fmt;

use serde::{Deserialize, Serialize};

use super::explainable::{ExplainEntry, Explainable};
use crate::logical::operator::LogicalOperator;

/// A tree of explain entries mirroring a plan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExplainNode {
    pub entry: ExplainEntry,
    pub children: Vec<ExplainNode>,
}

impl ExplainNode {
    pub fn walk_logical(plan: &LogicalOperator) -> Self {
        let mut children: Vec<_> = plan.children().iter().map(Self::walk_logical).collect();

        // Conflict clauses are displayed as a trailing child of the insert.
        if let LogicalOperator::Insert(insert) = plan {
            if let Some(conflict) = &insert.node.conflict {
                children.push(ExplainNode {
                    entry: conflict.explain_entry(),
                    children: Vec::new(),
                });
            }
        }

        ExplainNode {
            entry: plan.explain_entry(),
            children,
        }
    }

    /// Write this tree, one line per node.
    pub fn write_tree(&self, out: &mut String) {
        self.write_with_prefix(out, "", "");
    }

    fn write_with_prefix(&self, out: &mut String, line_prefix: &str, child_prefix: &str) {
        out.push_str(line_prefix);
        out.push_str(&self.entry.to_string());
        out.push('\n');

        let count = self.children.len();
        for (idx, child) in self.children.iter().enumerate() {
            let last = idx + 1 == count;
            let (connector, continuation) = if last { ("└─", "  ") } else { ("├─", "│ ") };
            child.write_with_prefix(
                out,
                &format!("{child_prefix}{connector}"),
                &format!("{child_prefix}{continuation}"),
            );
        }
    }
}

impl fmt::Display for ExplainNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_tree(&mut out);
        write!(f, "{out}")
    }
}
