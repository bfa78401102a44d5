use crate::expr::Expression;
use crate::expr::conjunction_expr::{ConjunctionExpr, ConjunctionOperator};

/// Recursively split an expression on AND, putting the split expressions in
/// `out`.
pub fn split_conjunction(expr: Expression, out: &mut Vec<Expression>) {
    match expr {
        Expression::Conjunction(ConjunctionExpr {
            expressions,
            op: ConjunctionOperator::And,
        }) => {
            for expr in expressions {
                split_conjunction(expr, out);
            }
        }
        other => out.push(other),
    }
}
