pub mod aggregate_expr;
pub mod alias_expr;
pub mod arith_expr;
pub mod array_expr;
pub mod case_expr;
pub mod cast_expr;
pub mod collate_expr;
pub mod column_expr;
pub mod comparison_expr;
pub mod conjunction_expr;
pub mod in_expr;
pub mod is_expr;
pub mod like_expr;
pub mod literal_expr;
pub mod ref_expr;
pub mod scalar_function_expr;
pub mod sort_expr;
pub mod subquery_expr;
pub mod unary_expr;
pub mod variable_expr;
pub mod window_expr;

use std::fmt;

use aggregate_expr::AggregateExpr;
use alias_expr::AliasExpr;
use arith_expr::ArithExpr;
use array_expr::{ArrayAccessExpr, ArrayExpr};
use case_expr::CaseExpr;
use cast_expr::CastExpr;
use collate_expr::CollateExpr;
use column_expr::ColumnExpr;
use comparison_expr::{ComparisonExpr, ComparisonOperator};
use conjunction_expr::{ConjunctionExpr, ConjunctionOperator};
use in_expr::InExpr;
use is_expr::IsExpr;
use like_expr::LikeExpr;
use literal_expr::LiteralExpr;
use ref_expr::ReferenceExpr;
use scalar_function_expr::ScalarFunctionExpr;
use serde::{Deserialize, Serialize};
use sqlplan_error::Result;
use subquery_expr::{SubqueryExpr, SubqueryKind};
use unary_expr::UnaryExpr;
use variable_expr::VariableExpr;
use window_expr::WindowExpr;

use crate::logical::subplan::SubplanId;
use crate::types::{DataType, Field, ScalarValue};

/// A bound expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expression {
    Literal(LiteralExpr),
    Column(ColumnExpr),
    Variable(VariableExpr),
    Unary(UnaryExpr),
    Arith(ArithExpr),
    Comparison(ComparisonExpr),
    Conjunction(ConjunctionExpr),
    Is(IsExpr),
    Like(LikeExpr),
    In(InExpr),
    Cast(CastExpr),
    Collate(CollateExpr),
    Case(CaseExpr),
    Array(ArrayExpr),
    ArrayAccess(ArrayAccessExpr),
    ScalarFunction(ScalarFunctionExpr),
    Aggregate(AggregateExpr),
    Window(WindowExpr),
    Subquery(SubqueryExpr),
    Reference(ReferenceExpr),
    Alias(AliasExpr),
}

impl Expression {
    pub fn datatype(&self) -> DataType {
        match self {
            Self::Literal(expr) => expr.datatype(),
            Self::Column(expr) => expr.datatype.clone(),
            Self::Variable(expr) => expr.datatype.clone(),
            Self::Unary(expr) => expr.datatype(),
            Self::Arith(expr) => expr.datatype.clone(),
            Self::Comparison(_)
            | Self::Conjunction(_)
            | Self::Is(_)
            | Self::Like(_)
            | Self::In(_) => DataType::Bool,
            Self::Cast(expr) => expr.to.clone(),
            Self::Collate(expr) => expr.expr.datatype(),
            Self::Case(expr) => expr.datatype.clone(),
            Self::Array(expr) => expr.datatype.clone(),
            Self::ArrayAccess(expr) => expr.datatype.clone(),
            Self::ScalarFunction(expr) => expr.datatype.clone(),
            Self::Aggregate(expr) => expr.datatype.clone(),
            Self::Window(expr) => expr.datatype.clone(),
            Self::Subquery(expr) => expr.datatype.clone(),
            Self::Reference(expr) => expr.datatype(),
            Self::Alias(expr) => expr.expr.datatype(),
        }
    }

    /// Direct children of this expression.
    ///
    /// Subqueries are leaves. Their plans live in the subplan registry.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Self::Literal(_)
            | Self::Column(_)
            | Self::Variable(_)
            | Self::Subquery(_)
            | Self::Reference(_) => Vec::new(),
            Self::Unary(expr) => vec![expr.expr.as_ref()],
            Self::Arith(expr) => vec![expr.left.as_ref(), expr.right.as_ref()],
            Self::Comparison(expr) => vec![expr.left.as_ref(), expr.right.as_ref()],
            Self::Conjunction(expr) => expr.expressions.iter().collect(),
            Self::Is(expr) => vec![expr.left.as_ref(), expr.right.as_ref()],
            Self::Like(expr) => vec![expr.expr.as_ref(), expr.pattern.as_ref()],
            Self::In(expr) => {
                let mut out = vec![expr.expr.as_ref()];
                out.extend(expr.list.iter());
                out
            }
            Self::Cast(expr) => vec![expr.expr.as_ref()],
            Self::Collate(expr) => vec![expr.expr.as_ref()],
            Self::Case(expr) => {
                let mut out = Vec::new();
                if let Some(operand) = &expr.operand {
                    out.push(operand.as_ref());
                }
                for case in &expr.cases {
                    out.push(&case.when);
                    out.push(&case.then);
                }
                if let Some(else_expr) = &expr.else_expr {
                    out.push(else_expr.as_ref());
                }
                out
            }
            Self::Array(expr) => expr.elements.iter().collect(),
            Self::ArrayAccess(expr) => vec![expr.array.as_ref(), expr.index.as_ref()],
            Self::ScalarFunction(expr) => expr.inputs.iter().collect(),
            Self::Aggregate(expr) => {
                let mut out: Vec<&Expression> = expr.inputs.iter().collect();
                if let Some(filter) = &expr.filter {
                    out.push(filter.as_ref());
                }
                out
            }
            Self::Window(expr) => {
                let mut out: Vec<&Expression> = expr.inputs.iter().collect();
                if let Some(filter) = &expr.filter {
                    out.push(filter.as_ref());
                }
                out.extend(expr.spec.partition_by.iter());
                out.extend(expr.spec.order_by.iter().map(|s| &s.expr));
                out
            }
            Self::Alias(expr) => vec![expr.expr.as_ref()],
        }
    }

    pub fn for_each_child<F>(&self, func: &mut F) -> Result<()>
    where
        F: FnMut(&Expression) -> Result<()>,
    {
        for child in self.children() {
            func(child)?;
        }
        Ok(())
    }

    pub fn for_each_child_mut<F>(&mut self, func: &mut F) -> Result<()>
    where
        F: FnMut(&mut Expression) -> Result<()>,
    {
        match self {
            Self::Literal(_)
            | Self::Column(_)
            | Self::Variable(_)
            | Self::Subquery(_)
            | Self::Reference(_) => (),
            Self::Unary(expr) => func(&mut expr.expr)?,
            Self::Arith(expr) => {
                func(&mut expr.left)?;
                func(&mut expr.right)?;
            }
            Self::Comparison(expr) => {
                func(&mut expr.left)?;
                func(&mut expr.right)?;
            }
            Self::Conjunction(expr) => {
                for child in &mut expr.expressions {
                    func(child)?;
                }
            }
            Self::Is(expr) => {
                func(&mut expr.left)?;
                func(&mut expr.right)?;
            }
            Self::Like(expr) => {
                func(&mut expr.expr)?;
                func(&mut expr.pattern)?;
            }
            Self::In(expr) => {
                func(&mut expr.expr)?;
                for child in &mut expr.list {
                    func(child)?;
                }
            }
            Self::Cast(expr) => func(&mut expr.expr)?,
            Self::Collate(expr) => func(&mut expr.expr)?,
            Self::Case(expr) => {
                if let Some(operand) = &mut expr.operand {
                    func(operand)?;
                }
                for case in &mut expr.cases {
                    func(&mut case.when)?;
                    func(&mut case.then)?;
                }
                if let Some(else_expr) = &mut expr.else_expr {
                    func(else_expr)?;
                }
            }
            Self::Array(expr) => {
                for child in &mut expr.elements {
                    func(child)?;
                }
            }
            Self::ArrayAccess(expr) => {
                func(&mut expr.array)?;
                func(&mut expr.index)?;
            }
            Self::ScalarFunction(expr) => {
                for child in &mut expr.inputs {
                    func(child)?;
                }
            }
            Self::Aggregate(expr) => {
                for child in &mut expr.inputs {
                    func(child)?;
                }
                if let Some(filter) = &mut expr.filter {
                    func(filter)?;
                }
            }
            Self::Window(expr) => {
                for child in &mut expr.inputs {
                    func(child)?;
                }
                if let Some(filter) = &mut expr.filter {
                    func(filter)?;
                }
                for child in &mut expr.spec.partition_by {
                    func(child)?;
                }
                for sort in &mut expr.spec.order_by {
                    func(&mut sort.expr)?;
                }
            }
            Self::Alias(expr) => func(&mut expr.expr)?,
        }
        Ok(())
    }

    /// Check if this expression or any descendant satisfies `pred`.
    pub fn any<F>(&self, pred: &mut F) -> bool
    where
        F: FnMut(&Expression) -> bool,
    {
        if pred(self) {
            return true;
        }
        self.children().into_iter().any(|child| child.any(pred))
    }

    pub fn contains_aggregate(&self) -> bool {
        self.any(&mut |e| matches!(e, Expression::Aggregate(_)))
    }

    pub fn contains_window(&self) -> bool {
        self.any(&mut |e| matches!(e, Expression::Window(_)))
    }

    pub fn contains_subquery(&self) -> bool {
        self.any(&mut |e| matches!(e, Expression::Subquery(_)))
    }

    /// Push the ids of subplans referenced by this expression, in pre-order.
    pub fn collect_subplans(&self, out: &mut Vec<SubplanId>) {
        if let Expression::Subquery(sub) = self {
            out.push(sub.subplan);
        }
        for child in self.children() {
            child.collect_subplans(out);
        }
    }

    /// Columns referenced by this expression that belong to the current
    /// scope, including columns a subquery correlates on.
    pub fn local_columns(&self) -> Vec<&ColumnExpr> {
        fn inner<'a>(expr: &'a Expression, out: &mut Vec<&'a ColumnExpr>) {
            match expr {
                Expression::Column(col) if col.depth == 0 => out.push(col),
                Expression::Subquery(sub) => out.extend(sub.local_columns()),
                other => {
                    for child in other.children() {
                        inner(child, out);
                    }
                }
            }
        }

        let mut out = Vec::new();
        inner(self, &mut out);
        out
    }

    /// Field describing this expression when used as an output column.
    pub fn output_field(&self) -> Field {
        let datatype = self.datatype();
        match self {
            Self::Column(col) => Field::new(col.relation.clone(), col.column.clone(), datatype),
            Self::Alias(alias) => Field::new(None, alias.alias.clone(), datatype),
            Self::ScalarFunction(func) => Field::new(None, func.function.clone(), datatype),
            Self::Aggregate(agg) => Field::new(None, agg.function.clone(), datatype),
            Self::Window(window) => Field::new(None, window.function.clone(), datatype),
            Self::Cast(cast) => Field {
                datatype,
                ..cast.expr.output_field()
            },
            Self::Collate(collate) => collate.expr.output_field(),
            Self::Subquery(sub) if sub.kind == SubqueryKind::Scalar => match &sub.column_name {
                Some(name) => Field::new(None, name.clone(), datatype),
                None => Field::anonymous(datatype),
            },
            Self::Reference(reference) => reference.field.clone(),
            _ => Field::anonymous(datatype),
        }
    }

    pub fn lit(value: impl Into<ScalarValue>) -> Self {
        Expression::Literal(LiteralExpr {
            literal: value.into(),
        })
    }

    pub fn compare(op: ComparisonOperator, left: Expression, right: Expression) -> Self {
        Expression::Comparison(ComparisonExpr {
            left: Box::new(left),
            right: Box::new(right),
            op,
        })
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::Conjunction(ConjunctionExpr::combine(
            ConjunctionOperator::And,
            left,
            right,
        ))
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Conjunction(ConjunctionExpr::combine(
            ConjunctionOperator::Or,
            left,
            right,
        ))
    }

    /// AND all expressions together.
    ///
    /// Returns None if the iterator is empty. A single expression is returned
    /// as is.
    pub fn and_all(exprs: impl IntoIterator<Item = Expression>) -> Option<Expression> {
        let mut exprs = exprs.into_iter();
        let first = exprs.next()?;
        Some(exprs.fold(first, Expression::and))
    }

    pub fn not(expr: Expression) -> Self {
        Expression::Unary(UnaryExpr::not(expr))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(expr) => expr.fmt(f),
            Self::Column(expr) => expr.fmt(f),
            Self::Variable(expr) => expr.fmt(f),
            Self::Unary(expr) => expr.fmt(f),
            Self::Arith(expr) => expr.fmt(f),
            Self::Comparison(expr) => expr.fmt(f),
            Self::Conjunction(expr) => expr.fmt(f),
            Self::Is(expr) => expr.fmt(f),
            Self::Like(expr) => expr.fmt(f),
            Self::In(expr) => expr.fmt(f),
            Self::Cast(expr) => expr.fmt(f),
            Self::Collate(expr) => expr.fmt(f),
            Self::Case(expr) => expr.fmt(f),
            Self::Array(expr) => expr.fmt(f),
            Self::ArrayAccess(expr) => expr.fmt(f),
            Self::ScalarFunction(expr) => expr.fmt(f),
            Self::Aggregate(expr) => expr.fmt(f),
            Self::Window(expr) => expr.fmt(f),
            Self::Subquery(expr) => expr.fmt(f),
            Self::Reference(expr) => expr.fmt(f),
            Self::Alias(expr) => expr.fmt(f),
        }
    }
}
