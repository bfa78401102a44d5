use std::fmt;

use serde::{Deserialize, Serialize};
use sqlplan_error::Result;

use super::logical_mutate::AssignmentExpr;
use super::operator::{LogicalNode, Node};
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::Expression;
use crate::types::{Field, Relation};

/// The uniqueness guarantee an ON CONFLICT clause targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arbiter {
    PrimaryKey { table: String, columns: Vec<String> },
    /// Single column declared unique.
    Unique { table: String, column: String },
    /// Unique index or named unique constraint.
    Index { name: String },
}

impl fmt::Display for Arbiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrimaryKey { table, columns } => {
                for (idx, col) in columns.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{table}.{col}")?;
                }
                write!(f, " (primary key)")
            }
            Self::Unique { table, column } => write!(f, "{table}.{column} (unique)"),
            Self::Index { name } => write!(f, "{name} (index)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictAction {
    DoNothing,
    DoUpdate {
        assignments: Vec<AssignmentExpr>,
        /// Only update rows matching this predicate.
        filter: Option<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictResolution {
    /// Required for DO UPDATE.
    pub arbiter: Option<Arbiter>,
    pub action: ConflictAction,
}

impl Explainable for ConflictResolution {
    fn explain_entry(&self) -> ExplainEntry {
        let kind = match self.action {
            ConflictAction::DoNothing => "nothing",
            ConflictAction::DoUpdate { .. } => "update",
        };
        let mut ent = ExplainEntry::new("Conflict").with_annotation(kind);
        if let Some(arbiter) = &self.arbiter {
            ent = ent.with_annotation(format!("arbiter={arbiter}"));
        }
        if let ConflictAction::DoUpdate {
            assignments,
            filter,
        } = &self.action
        {
            let mut detail: Vec<_> = assignments.iter().map(|a| format!("[{a}]")).collect();
            if let Some(filter) = filter {
                detail.push(format!("where [{filter}]"));
            }
            ent = ent.with_detail_values(detail, " ");
        }
        ent
    }
}

/// Inserts rows produced by the child into a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalInsert {
    pub table: String,
    pub alias: String,
    /// All table columns in declaration order. The child produces one value
    /// per column.
    pub columns: Vec<Field>,
    pub conflict: Option<ConflictResolution>,
}

impl Explainable for LogicalInsert {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Insert")
            .with_annotation(&self.table)
            .with_annotation_if(self.alias != self.table, format!("alias={}", self.alias))
            .with_detail_values(
                self.columns
                    .iter()
                    .map(|c| format!("{} [{}]", c.name, c.datatype)),
                ", ",
            )
    }
}

impl LogicalNode for Node<LogicalInsert> {
    fn name(&self) -> &'static str {
        "Insert"
    }

    fn output_relation(&self) -> Result<Relation> {
        Ok(Relation::empty())
    }

    fn for_each_expr<F>(&self, func: &mut F) -> Result<()>
    where
        F: FnMut(&Expression) -> Result<()>,
    {
        if let Some(ConflictResolution {
            action:
                ConflictAction::DoUpdate {
                    assignments,
                    filter,
                },
            ..
        }) = &self.node.conflict
        {
            for assignment in assignments {
                func(&assignment.value)?;
            }
            if let Some(filter) = filter {
                func(filter)?;
            }
        }
        Ok(())
    }

    fn for_each_expr_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        if let Some(ConflictResolution {
            action:
                ConflictAction::DoUpdate {
                    assignments,
                    filter,
                },
            ..
        }) = &mut self.node.conflict
        {
            for assignment in assignments {
                func(&mut assignment.value)?;
            }
            if let Some(filter) = filter {
                func(filter)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arbiter_display() {
        let pk = Arbiter::PrimaryKey {
            table: "users".to_string(),
            columns: vec!["id".to_string()],
        };
        assert_eq!("users.id (primary key)", pk.to_string());

        let unique = Arbiter::Unique {
            table: "posts".to_string(),
            column: "content".to_string(),
        };
        assert_eq!("posts.content (unique)", unique.to_string());

        let idx = Arbiter::Index {
            name: "name_idx".to_string(),
        };
        assert_eq!("name_idx (index)", idx.to_string());
    }

    #[test]
    fn conflict_do_nothing_entry() {
        let conflict = ConflictResolution {
            arbiter: None,
            action: ConflictAction::DoNothing,
        };
        assert_eq!("Conflict [nothing]", conflict.explain_entry().to_string());
    }

    #[test]
    fn conflict_do_update_entry() {
        let conflict = ConflictResolution {
            arbiter: Some(Arbiter::Index {
                name: "name_idx".to_string(),
            }),
            action: ConflictAction::DoUpdate {
                assignments: vec![AssignmentExpr {
                    column: "name".to_string(),
                    value: Expression::lit("satoshi"),
                }],
                filter: Some(Expression::lit(true)),
            },
        };
        assert_eq!(
            "Conflict [update] [arbiter=name_idx (index)]: [name = 'satoshi'] where [true]",
            conflict.explain_entry().to_string()
        );
    }
}
