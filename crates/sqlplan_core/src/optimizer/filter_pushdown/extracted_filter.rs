use hashbrown::HashSet;

use crate::expr::Expression;

/// Holds a filtering expression and all relations the expression references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFilter {
    /// The filter expression.
    pub filter: Expression,
    /// Qualifiers of the local columns this expression references.
    pub relations: HashSet<String>,
    /// Whether the expression references a local column without a
    /// qualifier. Such filters can't be routed to a join side.
    pub has_unqualified: bool,
}

impl ExtractedFilter {
    pub fn from_expr(expr: Expression) -> Self {
        let mut relations = HashSet::new();
        let mut has_unqualified = false;
        for col in expr.local_columns() {
            match &col.relation {
                Some(rel) => {
                    relations.insert(rel.clone());
                }
                None => has_unqualified = true,
            }
        }

        ExtractedFilter {
            filter: expr,
            relations,
            has_unqualified,
        }
    }

    /// Check if every referenced column comes from one of `qualifiers`.
    ///
    /// Filters referencing no local columns are never considered bound to a
    /// side.
    pub fn is_bound_by(&self, qualifiers: &HashSet<String>) -> bool {
        !self.has_unqualified
            && !self.relations.is_empty()
            && self.relations.iter().all(|rel| qualifiers.contains(rel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::column_expr::ColumnExpr;
    use crate::expr::comparison_expr::ComparisonOperator;
    use crate::types::DataType;

    fn col(relation: Option<&str>, name: &str, depth: usize) -> Expression {
        Expression::Column(ColumnExpr {
            relation: relation.map(|r| r.to_string()),
            column: name.to_string(),
            datatype: DataType::Int8,
            depth,
        })
    }

    fn quals(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn collects_local_relations() {
        let expr = Expression::compare(
            ComparisonOperator::Eq,
            col(Some("u"), "id", 0),
            col(Some("p"), "owner_id", 0),
        );
        let filter = ExtractedFilter::from_expr(expr);
        assert_eq!(quals(&["u", "p"]), filter.relations);
        assert!(filter.is_bound_by(&quals(&["u", "p", "x"])));
        assert!(!filter.is_bound_by(&quals(&["u"])));
    }

    #[test]
    fn correlated_columns_ignored() {
        let expr = Expression::compare(
            ComparisonOperator::Eq,
            col(Some("u"), "id", 0),
            col(Some("outer"), "id", 1),
        );
        let filter = ExtractedFilter::from_expr(expr);
        assert_eq!(quals(&["u"]), filter.relations);
    }

    #[test]
    fn constant_filter_not_bound() {
        let filter = ExtractedFilter::from_expr(Expression::lit(true));
        assert!(!filter.is_bound_by(&quals(&["u"])));
    }

    #[test]
    fn unqualified_not_bound() {
        let expr = Expression::compare(
            ComparisonOperator::Gt,
            col(None, "n", 0),
            Expression::lit(1i64),
        );
        let filter = ExtractedFilter::from_expr(expr);
        assert!(filter.has_unqualified);
        assert!(!filter.is_bound_by(&quals(&["u"])));
    }
}
