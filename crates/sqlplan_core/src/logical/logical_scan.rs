use serde::{Deserialize, Serialize};
use sqlplan_error::Result;

use super::operator::{LogicalNode, Node};
use super::subplan::SubplanId;
use crate::explain::explainable::{ExplainEntry, Explainable};
use crate::expr::Expression;
use crate::expr::column_expr::ColumnExpr;
use crate::expr::subquery_expr::CorrelationDisplay;
use crate::types::Relation;

/// Scan of a physical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalScan {
    pub namespace: Option<String>,
    pub table: String,
    /// Name the table is referenced by within the query.
    pub alias: String,
    /// Table columns qualified by the alias.
    pub relation: Relation,
    /// Predicate pushed into the scan by the optimizer.
    pub filter: Option<Expression>,
}

impl Explainable for LogicalScan {
    fn explain_entry(&self) -> ExplainEntry {
        let mut detail = format!("{} [physical]", self.table);
        if let Some(filter) = &self.filter {
            detail.push_str(&format!(" [filter={filter}]"));
        }
        ExplainEntry::new("Scan Table")
            .with_annotation_if(
                self.alias != self.table,
                format!("alias=\"{}\"", self.alias),
            )
            .with_detail(detail)
    }
}

impl LogicalNode for Node<LogicalScan> {
    fn name(&self) -> &'static str {
        "Scan"
    }

    fn output_relation(&self) -> Result<Relation> {
        Ok(self.node.relation.clone())
    }

    fn for_each_expr<F>(&self, func: &mut F) -> Result<()>
    where
        F: FnMut(&Expression) -> Result<()>,
    {
        if let Some(filter) = &self.node.filter {
            func(filter)?;
        }
        Ok(())
    }

    fn for_each_expr_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        if let Some(filter) = &mut self.node.filter {
            func(filter)?;
        }
        Ok(())
    }
}

/// Scan of a common table expression, including the self reference of a
/// recursive CTE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalCteScan {
    pub name: String,
    pub alias: String,
    pub recursive: bool,
    pub relation: Relation,
}

impl Explainable for LogicalCteScan {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Scan Table")
            .with_annotation_if(self.alias != self.name, format!("alias=\"{}\"", self.alias))
            .with_detail(format!("{} [cte]", self.name))
    }
}

impl LogicalNode for Node<LogicalCteScan> {
    fn name(&self) -> &'static str {
        "CteScan"
    }

    fn output_relation(&self) -> Result<Relation> {
        Ok(self.node.relation.clone())
    }

    fn for_each_expr<F>(&self, _func: &mut F) -> Result<()>
    where
        F: FnMut(&Expression) -> Result<()>,
    {
        Ok(())
    }

    fn for_each_expr_mut<F>(&mut self, _func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        Ok(())
    }
}

/// Scan of a subquery in a FROM clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalSubqueryScan {
    pub alias: String,
    pub subplan: SubplanId,
    /// Outer columns the subquery depends on.
    pub correlated: Vec<ColumnExpr>,
    /// Subquery output qualified by the alias.
    pub relation: Relation,
}

impl Explainable for LogicalSubqueryScan {
    fn explain_entry(&self) -> ExplainEntry {
        ExplainEntry::new("Scan Subquery")
            .with_annotation(format!("alias=\"{}\"", self.alias))
            .with_detail(format!(
                "[subplan_id={}] {}",
                self.subplan,
                CorrelationDisplay(&self.correlated)
            ))
    }
}

impl LogicalNode for Node<LogicalSubqueryScan> {
    fn name(&self) -> &'static str {
        "SubqueryScan"
    }

    fn output_relation(&self) -> Result<Relation> {
        Ok(self.node.relation.clone())
    }

    fn for_each_expr<F>(&self, _func: &mut F) -> Result<()>
    where
        F: FnMut(&Expression) -> Result<()>,
    {
        Ok(())
    }

    fn for_each_expr_mut<F>(&mut self, _func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        Ok(())
    }
}
