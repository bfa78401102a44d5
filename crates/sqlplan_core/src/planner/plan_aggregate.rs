use sqlplan_error::{PlanError, Result, internal};
use tracing::trace;

use super::PlanContext;
use crate::expr::Expression;
use crate::expr::ref_expr::RefBinding;
use crate::expr::sort_expr::SortExpr;
use crate::logical::logical_aggregate::LogicalAggregate;
use crate::logical::operator::{LogicalOperator, Node};

#[derive(Debug)]
pub struct AggregatePlanner;

impl AggregatePlanner {
    /// Plan an aggregate on top of `plan`.
    ///
    /// Group keys and aggregate calls are assigned reference ids, and every
    /// expression evaluated after the aggregate is rewritten to use those
    /// references. Ids are assigned to keys first, then to aggregates in
    /// HAVING, the select list and ORDER BY, in that order.
    pub fn plan(
        &self,
        ctx: &mut PlanContext,
        group_by: Vec<Expression>,
        having: &mut Option<Expression>,
        projections: &mut [Expression],
        sort_exprs: &mut [SortExpr],
        plan: LogicalOperator,
    ) -> Result<LogicalOperator> {
        let mut keys: Vec<RefBinding> = Vec::with_capacity(group_by.len());
        for expr in group_by {
            if expr.contains_subquery() {
                return Err(PlanError::illegal_aggregate(
                    "subqueries are not allowed in GROUP BY",
                ));
            }
            if keys.iter().any(|key| key.expr == expr) {
                continue;
            }
            keys.push(RefBinding {
                id: ctx.next_ref_id(),
                expr,
            });
        }

        let mut aggregates = Vec::new();
        let post_aggregate = having
            .iter()
            .chain(projections.iter())
            .chain(sort_exprs.iter().map(|sort| &sort.expr));
        for expr in post_aggregate {
            collect_aggregates(ctx, expr, &mut aggregates);
        }

        trace!(keys = keys.len(), aggregates = aggregates.len(), "planning aggregate");

        if let Some(having) = having {
            rewrite_expression(having, &keys, &aggregates)?;
        }
        for expr in projections.iter_mut() {
            rewrite_expression(expr, &keys, &aggregates)?;
        }
        for sort in sort_exprs.iter_mut() {
            rewrite_expression(&mut sort.expr, &keys, &aggregates)?;
        }

        Ok(LogicalOperator::Aggregate(Node::new(
            LogicalAggregate {
                group_by: keys,
                aggregates,
            },
            vec![plan],
        )))
    }
}

/// Collect aggregate calls in pre-order, skipping ones already collected.
fn collect_aggregates(ctx: &mut PlanContext, expr: &Expression, out: &mut Vec<RefBinding>) {
    if let Expression::Aggregate(_) = expr {
        if !out.iter().any(|binding| binding.expr == *expr) {
            out.push(RefBinding {
                id: ctx.next_ref_id(),
                expr: expr.clone(),
            });
        }
        return;
    }
    for child in expr.children() {
        collect_aggregates(ctx, child, out);
    }
}

/// Rewrite an expression evaluated above an aggregate.
///
/// Group keys and aggregates are replaced with references. Any remaining
/// column of the aggregated relation is an error.
fn rewrite_expression(
    expr: &mut Expression,
    keys: &[RefBinding],
    aggregates: &[RefBinding],
) -> Result<()> {
    if let Some(key) = keys.iter().find(|key| key.expr == *expr) {
        *expr = Expression::Reference(key.reference());
        return Ok(());
    }

    match expr {
        Expression::Aggregate(_) => {
            let binding = aggregates
                .iter()
                .find(|binding| binding.expr == *expr)
                .ok_or_else(|| internal!("missing aggregate binding for {expr}"))?;
            *expr = Expression::Reference(binding.reference());
            Ok(())
        }
        Expression::Column(col) if col.depth == 0 && col.relation.is_some() => {
            Err(PlanError::illegal_aggregate(format!(
                "column \"{col}\" must appear in the GROUP BY clause or be used in an aggregate function"
            )))
        }
        Expression::Subquery(sub) => {
            // The subplan reads correlated columns directly, so they have to
            // be group keys.
            for col in sub.local_columns() {
                let grouped = keys.iter().any(|key| match &key.expr {
                    Expression::Column(key_col) => key_col.same_column(col),
                    _ => false,
                });
                if !grouped {
                    return Err(PlanError::illegal_aggregate(format!(
                        "correlated column \"{col}\" must appear in the GROUP BY clause"
                    )));
                }
            }
            Ok(())
        }
        other => other.for_each_child_mut(&mut |child| rewrite_expression(child, keys, aggregates)),
    }
}

#[cfg(test)]
mod tests {
    use sqlplan_error::ErrorKind;

    use super::*;
    use crate::expr::aggregate_expr::AggregateExpr;
    use crate::expr::column_expr::ColumnExpr;
    use crate::expr::comparison_expr::ComparisonOperator;
    use crate::expr::ref_expr::RefId;
    use crate::types::DataType;

    fn col(name: &str) -> Expression {
        Expression::Column(ColumnExpr {
            relation: Some("users".to_string()),
            column: name.to_string(),
            datatype: DataType::Int8,
            depth: 0,
        })
    }

    fn sum(input: Expression) -> Expression {
        Expression::Aggregate(AggregateExpr {
            function: "sum".to_string(),
            inputs: vec![input],
            distinct: false,
            star: false,
            filter: None,
            datatype: DataType::sum_int_result(),
        })
    }

    #[test]
    fn rewrite_keys_and_aggregates() {
        let keys = vec![RefBinding {
            id: RefId(0),
            expr: col("name"),
        }];
        let aggregates = vec![RefBinding {
            id: RefId(1),
            expr: sum(col("age")),
        }];

        let mut expr = Expression::and(
            Expression::compare(
                ComparisonOperator::Eq,
                col("name"),
                Expression::lit("a"),
            ),
            Expression::compare(
                ComparisonOperator::Gt,
                sum(col("age")),
                Expression::lit(1i64),
            ),
        );
        rewrite_expression(&mut expr, &keys, &aggregates).unwrap();
        assert_eq!("{#ref(A)} = 'a' AND {#ref(B)} > 1", expr.to_string());
    }

    #[test]
    fn rewrite_ungrouped_column() {
        let keys = vec![RefBinding {
            id: RefId(0),
            expr: col("name"),
        }];
        let mut expr = col("age");
        let err = rewrite_expression(&mut expr, &keys, &[]).unwrap_err();
        assert_eq!(ErrorKind::IllegalAggregate, err.kind());
    }

    #[test]
    fn rewrite_alias_reference_allowed() {
        let mut expr = Expression::Column(ColumnExpr {
            relation: None,
            column: "pos_age".to_string(),
            datatype: DataType::Int8,
            depth: 0,
        });
        rewrite_expression(&mut expr, &[], &[]).unwrap();
        assert_eq!("pos_age", expr.to_string());
    }
}
