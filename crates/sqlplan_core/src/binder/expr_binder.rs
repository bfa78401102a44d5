use hashbrown::HashMap;
use sqlplan_error::{PlanError, Result, type_mismatch};

use super::bind_context::BindScopeRef;
use crate::ast;
use crate::expr::Expression;
use crate::expr::aggregate_expr::AggregateExpr;
use crate::expr::arith_expr::{ArithExpr, ArithOperator};
use crate::expr::array_expr::{ArrayAccessExpr, ArrayExpr};
use crate::expr::case_expr::{CaseExpr, WhenThen};
use crate::expr::cast_expr::CastExpr;
use crate::expr::collate_expr::{Collation, CollateExpr};
use crate::expr::comparison_expr::ComparisonOperator;
use crate::expr::conjunction_expr::{ConjunctionExpr, ConjunctionOperator};
use crate::expr::in_expr::InExpr;
use crate::expr::is_expr::IsExpr;
use crate::expr::like_expr::LikeExpr;
use crate::expr::literal_expr::LiteralExpr;
use crate::expr::scalar_function_expr::ScalarFunctionExpr;
use crate::expr::sort_expr::SortExpr;
use crate::expr::subquery_expr::{SubqueryExpr, SubqueryKind};
use crate::expr::unary_expr::{UnaryExpr, UnaryOperator};
use crate::expr::variable_expr::VariableExpr;
use crate::expr::window_expr::{WindowExpr, WindowSpec};
use crate::functions::{FunctionKind, find_function};
use crate::planner::PlanContext;
use crate::planner::plan_subquery::SubqueryPlanner;
use crate::types::{DataType, Relation, ScalarValue};

/// Controls which constructs are allowed at the current point of binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecursionContext {
    /// If window functions are allowed.
    pub allow_windows: bool,
    /// If aggregate functions are allowed.
    pub allow_aggregates: bool,
}

impl RecursionContext {
    /// Context for clauses that allow neither aggregates nor windows, e.g.
    /// WHERE.
    pub const PLAIN: Self = RecursionContext {
        allow_windows: false,
        allow_aggregates: false,
    };

    /// Context for clauses evaluated after aggregation, e.g. HAVING.
    pub const AGGREGATES: Self = RecursionContext {
        allow_windows: false,
        allow_aggregates: true,
    };

    /// Context for the select list.
    pub const SELECT_LIST: Self = RecursionContext {
        allow_windows: true,
        allow_aggregates: true,
    };
}

/// Binds parsed expressions against a relation.
///
/// Columns are resolved against `relation` first, then against the outer
/// relations of enclosing scopes.
#[derive(Debug, Clone, Copy)]
pub struct ExpressionBinder<'a> {
    pub current: BindScopeRef,
    pub relation: &'a Relation,
    /// Named windows from the WINDOW clause.
    pub windows: Option<&'a HashMap<String, WindowSpec>>,
}

impl<'a> ExpressionBinder<'a> {
    pub fn new(current: BindScopeRef, relation: &'a Relation) -> Self {
        ExpressionBinder {
            current,
            relation,
            windows: None,
        }
    }

    pub fn with_windows(mut self, windows: &'a HashMap<String, WindowSpec>) -> Self {
        self.windows = Some(windows);
        self
    }

    pub fn bind_expressions(
        &self,
        ctx: &mut PlanContext,
        exprs: &[ast::Expr],
        recur: RecursionContext,
    ) -> Result<Vec<Expression>> {
        exprs
            .iter()
            .map(|expr| self.bind_expression(ctx, expr, recur))
            .collect()
    }

    /// Bind an expression that must produce a boolean, e.g. a filter.
    pub fn bind_predicate(
        &self,
        ctx: &mut PlanContext,
        expr: &ast::Expr,
        recur: RecursionContext,
        clause: &str,
    ) -> Result<Expression> {
        let expr = self.bind_expression(ctx, expr, recur)?;
        let datatype = expr.datatype();
        if !datatype.is_compatible(&DataType::Bool) {
            return Err(type_mismatch!(
                "argument of {clause} must be bool, got {datatype}"
            ));
        }
        Ok(expr)
    }

    pub fn bind_expression(
        &self,
        ctx: &mut PlanContext,
        expr: &ast::Expr,
        recur: RecursionContext,
    ) -> Result<Expression> {
        match expr {
            ast::Expr::Literal(literal) => Ok(Expression::Literal(LiteralExpr {
                literal: literal.clone(),
            })),
            ast::Expr::Column { table, name } => {
                let table = table.as_deref().map(|t| ctx.config.normalize_ident(t));
                let name = ctx.config.normalize_ident(name);
                let col = ctx.bind_context.resolve_column(
                    self.current,
                    self.relation,
                    table.as_deref(),
                    &name,
                )?;
                Ok(Expression::Column(col))
            }
            ast::Expr::Variable { prefix, name } => self.bind_variable(ctx, *prefix, name),
            ast::Expr::FieldAccess { base, field } => match base.as_ref() {
                ast::Expr::Variable { prefix, name } => {
                    self.bind_object_field(ctx, *prefix, name, field)
                }
                _ => Err(PlanError::Unsupported(
                    "field access is only supported on object variables".to_string(),
                )),
            },
            ast::Expr::Unary { op, expr } => {
                let expr = self.bind_expression(ctx, expr, recur)?;
                let datatype = expr.datatype();
                let op = match op {
                    ast::UnaryOperator::Neg => UnaryOperator::Negate,
                    ast::UnaryOperator::Pos => UnaryOperator::Positive,
                    ast::UnaryOperator::Not => UnaryOperator::Not,
                };
                match op {
                    UnaryOperator::Not => expect_bool(&datatype, "NOT")?,
                    _ => expect_numeric(&datatype, &op.to_string())?,
                }
                Ok(Expression::Unary(UnaryExpr {
                    op,
                    expr: Box::new(expr),
                }))
            }
            ast::Expr::Arith { left, op, right } => {
                let left = self.bind_expression(ctx, left, recur)?;
                let right = self.bind_expression(ctx, right, recur)?;
                self.bind_arith(left, *op, right)
            }
            ast::Expr::Comparison { left, op, right } => {
                let left = self.bind_expression(ctx, left, recur)?;
                let right = self.bind_expression(ctx, right, recur)?;
                let op = comparison_op(*op);
                expect_compatible(&left.datatype(), &right.datatype(), &op.to_string())?;
                Ok(Expression::compare(op, left, right))
            }
            ast::Expr::Conjunction { left, op, right } => {
                let op = match op {
                    ast::ConjunctionOperator::And => ConjunctionOperator::And,
                    ast::ConjunctionOperator::Or => ConjunctionOperator::Or,
                };
                let left = self.bind_expression(ctx, left, recur)?;
                let right = self.bind_expression(ctx, right, recur)?;
                expect_bool(&left.datatype(), &op.to_string())?;
                expect_bool(&right.datatype(), &op.to_string())?;
                Ok(Expression::Conjunction(ConjunctionExpr::combine(
                    op, left, right,
                )))
            }
            ast::Expr::Is {
                expr,
                not,
                distinct,
                right,
            } => {
                let left = self.bind_expression(ctx, expr, recur)?;
                let right = self.bind_expression(ctx, right, recur)?;
                let left_type = left.datatype();
                if *distinct {
                    expect_compatible(&left_type, &right.datatype(), "IS DISTINCT FROM")?;
                } else {
                    match &right {
                        Expression::Literal(LiteralExpr {
                            literal: ScalarValue::Null,
                        }) => (),
                        Expression::Literal(LiteralExpr {
                            literal: ScalarValue::Bool(_),
                        }) => expect_bool(&left_type, "IS")?,
                        other => {
                            return Err(PlanError::Syntax(format!(
                                "IS expects NULL, TRUE or FALSE, got {other}"
                            )));
                        }
                    }
                }
                Ok(negate_if(
                    *not,
                    Expression::Is(IsExpr {
                        left: Box::new(left),
                        right: Box::new(right),
                        distinct: *distinct,
                    }),
                ))
            }
            ast::Expr::Like {
                expr,
                pattern,
                not,
                case_insensitive,
            } => {
                let expr = self.bind_expression(ctx, expr, recur)?;
                let pattern = self.bind_expression(ctx, pattern, recur)?;
                let op = if *case_insensitive { "ILIKE" } else { "LIKE" };
                expect_text(&expr.datatype(), op)?;
                expect_text(&pattern.datatype(), op)?;
                Ok(negate_if(
                    *not,
                    Expression::Like(LikeExpr {
                        expr: Box::new(expr),
                        pattern: Box::new(pattern),
                        case_insensitive: *case_insensitive,
                    }),
                ))
            }
            ast::Expr::Between {
                expr,
                low,
                high,
                not,
            } => {
                let expr = self.bind_expression(ctx, expr, recur)?;
                let low = self.bind_expression(ctx, low, recur)?;
                let high = self.bind_expression(ctx, high, recur)?;
                let datatype = expr.datatype();
                expect_compatible(&datatype, &low.datatype(), "BETWEEN")?;
                expect_compatible(&datatype, &high.datatype(), "BETWEEN")?;

                if *not {
                    Ok(Expression::or(
                        Expression::compare(ComparisonOperator::Lt, expr.clone(), low),
                        Expression::compare(ComparisonOperator::Gt, expr, high),
                    ))
                } else {
                    Ok(Expression::and(
                        Expression::compare(ComparisonOperator::GtEq, expr.clone(), low),
                        Expression::compare(ComparisonOperator::LtEq, expr, high),
                    ))
                }
            }
            ast::Expr::InList { expr, list, not } => {
                let expr = self.bind_expression(ctx, expr, recur)?;
                let datatype = expr.datatype();
                let list = self.bind_expressions(ctx, list, recur)?;
                for item in &list {
                    expect_compatible(&datatype, &item.datatype(), "IN")?;
                }
                Ok(negate_if(
                    *not,
                    Expression::In(InExpr {
                        expr: Box::new(expr),
                        list,
                    }),
                ))
            }
            ast::Expr::InSubquery {
                expr,
                subquery,
                not,
            } => {
                let expr = self.bind_expression(ctx, expr, recur)?;
                let subquery = self.bind_subquery(ctx, subquery, SubqueryKind::Scalar, "IN")?;
                expect_compatible(&expr.datatype(), &subquery.datatype(), "IN")?;
                Ok(negate_if(
                    *not,
                    Expression::In(InExpr {
                        expr: Box::new(expr),
                        list: vec![subquery],
                    }),
                ))
            }
            ast::Expr::Exists { subquery, not } => {
                let subquery = self.bind_subquery(ctx, subquery, SubqueryKind::Exists, "EXISTS")?;
                Ok(negate_if(*not, subquery))
            }
            ast::Expr::Subquery(subquery) => {
                self.bind_subquery(ctx, subquery, SubqueryKind::Scalar, "scalar subquery")
            }
            ast::Expr::Function(call) => self.bind_function(ctx, call, recur),
            ast::Expr::Array(elements) => {
                let elements = self.bind_expressions(ctx, elements, recur)?;
                let mut element_type = DataType::Null;
                for elem in &elements {
                    let datatype = elem.datatype();
                    if datatype.is_array() {
                        return Err(PlanError::Syntax(
                            "nested arrays are not supported".to_string(),
                        ));
                    }
                    expect_compatible(&element_type, &datatype, "ARRAY")?;
                    element_type = element_type.unify(&datatype);
                }
                Ok(Expression::Array(ArrayExpr {
                    elements,
                    datatype: DataType::array(element_type),
                }))
            }
            ast::Expr::ArrayAccess { array, index } => {
                let array = self.bind_expression(ctx, array, recur)?;
                let index = self.bind_expression(ctx, index, recur)?;
                let array_type = array.datatype();
                let datatype = match array_type.element_type() {
                    Some(element) => element.clone(),
                    None if array_type.is_null() => DataType::Null,
                    None => return Err(type_mismatch!("cannot index into {array_type}")),
                };
                let index_type = index.datatype();
                if !index_type.is_compatible(&DataType::Int8) {
                    return Err(type_mismatch!("array index must be int8, got {index_type}"));
                }
                Ok(Expression::ArrayAccess(ArrayAccessExpr {
                    array: Box::new(array),
                    index: Box::new(index),
                    datatype,
                }))
            }
            ast::Expr::Cast { expr, datatype } => {
                let expr = self.bind_expression(ctx, expr, recur)?;
                Ok(Expression::Cast(CastExpr {
                    to: datatype.resolve()?,
                    expr: Box::new(expr),
                }))
            }
            ast::Expr::Collate { expr, collation } => {
                let collation = match collation.to_lowercase().as_str() {
                    "nocase" => Collation::NoCase,
                    other => {
                        return Err(PlanError::Unsupported(format!("collation \"{other}\"")));
                    }
                };
                let expr = self.bind_expression(ctx, expr, recur)?;
                expect_text(&expr.datatype(), "COLLATE")?;
                Ok(Expression::Collate(CollateExpr {
                    expr: Box::new(expr),
                    collation,
                }))
            }
            ast::Expr::Case {
                operand,
                when_then,
                else_expr,
            } => self.bind_case(ctx, operand.as_deref(), when_then, else_expr.as_deref(), recur),
        }
    }

    fn bind_variable(
        &self,
        ctx: &mut PlanContext,
        prefix: ast::VariablePrefix,
        name: &str,
    ) -> Result<Expression> {
        let name = ctx.config.normalize_ident(name);
        let key = format!("{prefix}{name}");
        match ctx.catalog.lookup_variable(&key) {
            Some(datatype) => Ok(Expression::Variable(VariableExpr {
                prefix,
                name,
                field: None,
                datatype,
            })),
            None if ctx.catalog.lookup_object_fields(&key).is_some() => Err(type_mismatch!(
                "object {key} must be accessed through one of its fields"
            )),
            None => Err(PlanError::UnknownVariable { name: key }),
        }
    }

    fn bind_object_field(
        &self,
        ctx: &mut PlanContext,
        prefix: ast::VariablePrefix,
        name: &str,
        field: &str,
    ) -> Result<Expression> {
        let name = ctx.config.normalize_ident(name);
        let field = ctx.config.normalize_ident(field);
        let key = format!("{prefix}{name}");
        let fields = ctx
            .catalog
            .lookup_object_fields(&key)
            .ok_or_else(|| PlanError::UnknownVariable { name: key.clone() })?;
        let datatype = fields
            .get(&field)
            .cloned()
            .ok_or_else(|| PlanError::UnknownVariable {
                name: format!("{key}.{field}"),
            })?;

        Ok(Expression::Variable(VariableExpr {
            prefix,
            name,
            field: Some(field),
            datatype,
        }))
    }

    fn bind_arith(
        &self,
        left: Expression,
        op: ast::ArithOperator,
        right: Expression,
    ) -> Result<Expression> {
        let op = match op {
            ast::ArithOperator::Add => ArithOperator::Add,
            ast::ArithOperator::Sub => ArithOperator::Sub,
            ast::ArithOperator::Mul => ArithOperator::Mul,
            ast::ArithOperator::Div => ArithOperator::Div,
            ast::ArithOperator::Mod => ArithOperator::Mod,
            ast::ArithOperator::Concat => ArithOperator::Concat,
        };
        let left_type = left.datatype();
        let right_type = right.datatype();
        let name = op.to_string();

        if op == ArithOperator::Concat {
            expect_text(&left_type, &name)?;
            expect_text(&right_type, &name)?;
        } else {
            expect_numeric(&left_type, &name)?;
            expect_numeric(&right_type, &name)?;
        }
        expect_compatible(&left_type, &right_type, &name)?;

        Ok(Expression::Arith(ArithExpr {
            left: Box::new(left),
            op,
            right: Box::new(right),
            datatype: left_type.unify(&right_type),
        }))
    }

    fn bind_case(
        &self,
        ctx: &mut PlanContext,
        operand: Option<&ast::Expr>,
        when_then: &[(ast::Expr, ast::Expr)],
        else_expr: Option<&ast::Expr>,
        recur: RecursionContext,
    ) -> Result<Expression> {
        let operand = operand
            .map(|expr| self.bind_expression(ctx, expr, recur))
            .transpose()?;
        let operand_type = operand.as_ref().map(|expr| expr.datatype());

        let mut datatype = DataType::Null;
        let mut cases = Vec::with_capacity(when_then.len());
        for (when, then) in when_then {
            let when = self.bind_expression(ctx, when, recur)?;
            match &operand_type {
                Some(operand_type) => {
                    expect_compatible(operand_type, &when.datatype(), "CASE WHEN")?
                }
                None => expect_bool(&when.datatype(), "CASE WHEN")?,
            }

            let then = self.bind_expression(ctx, then, recur)?;
            let then_type = then.datatype();
            expect_compatible(&datatype, &then_type, "CASE THEN")?;
            datatype = datatype.unify(&then_type);

            cases.push(WhenThen { when, then });
        }

        let else_expr = match else_expr {
            Some(expr) => {
                let expr = self.bind_expression(ctx, expr, recur)?;
                let else_type = expr.datatype();
                expect_compatible(&datatype, &else_type, "CASE ELSE")?;
                datatype = datatype.unify(&else_type);
                Some(Box::new(expr))
            }
            None => None,
        };

        Ok(Expression::Case(CaseExpr {
            operand: operand.map(Box::new),
            cases,
            else_expr,
            datatype,
        }))
    }

    fn bind_subquery(
        &self,
        ctx: &mut PlanContext,
        query: &ast::SelectStatement,
        kind: SubqueryKind,
        context: &str,
    ) -> Result<Expression> {
        let planned = SubqueryPlanner.plan(ctx, self.current, self.relation, query)?;

        let (datatype, column_name) = match kind {
            SubqueryKind::Exists => (DataType::Bool, None),
            SubqueryKind::Scalar => {
                if planned.relation.len() != 1 {
                    return Err(PlanError::WrongArity {
                        context: context.to_string(),
                        expected: 1,
                        got: planned.relation.len(),
                    });
                }
                let field = &planned.relation.fields[0];
                let name = (!field.name.is_empty()).then(|| field.name.clone());
                (field.datatype.clone(), name)
            }
        };

        Ok(Expression::Subquery(SubqueryExpr {
            kind,
            subplan: planned.id,
            correlated: planned.correlated,
            datatype,
            column_name,
        }))
    }

    fn bind_function(
        &self,
        ctx: &mut PlanContext,
        call: &ast::FunctionCall,
        recur: RecursionContext,
    ) -> Result<Expression> {
        let name = call.name.to_lowercase();
        let function = find_function(&name).ok_or_else(|| PlanError::UnknownFunction {
            name: name.clone(),
        })?;

        let is_aggregate = function.kind == FunctionKind::Aggregate;
        if call.distinct && !is_aggregate {
            return Err(PlanError::Syntax(format!(
                "DISTINCT is only allowed for aggregate functions, not {name}"
            )));
        }
        if call.star && !is_aggregate {
            return Err(PlanError::Syntax(format!(
                "{name}(*) is only allowed for aggregate functions"
            )));
        }
        if call.filter.is_some() && !is_aggregate {
            return Err(PlanError::Syntax(format!(
                "FILTER is only allowed for aggregate functions, not {name}"
            )));
        }

        // Aggregates and windows can't be nested in each other.
        let args_recur = RecursionContext::PLAIN;
        let inputs = self.bind_expressions(ctx, &call.args, args_recur)?;
        let arg_types: Vec<DataType> = inputs.iter().map(|e| e.datatype()).collect();
        let datatype = function.return_type(&arg_types)?;

        let filter = call
            .filter
            .as_deref()
            .map(|filter| self.bind_predicate(ctx, filter, args_recur, "FILTER"))
            .transpose()?
            .map(Box::new);

        match (&call.over, function.kind) {
            (Some(_), FunctionKind::Scalar) => Err(PlanError::IllegalWindowFunction {
                reason: format!("{name} is not an aggregate or window function"),
            }),
            (Some(_), _) if !recur.allow_windows => Err(PlanError::IllegalWindowFunction {
                reason: format!("window function {name} is not allowed here"),
            }),
            (Some(_), _) if call.distinct => Err(PlanError::Unsupported(
                "DISTINCT in window functions".to_string(),
            )),
            (Some(over), _) => {
                let spec = match over {
                    ast::WindowRef::Named(window) => {
                        let window = ctx.config.normalize_ident(window);
                        self.windows
                            .and_then(|windows| windows.get(&window))
                            .cloned()
                            .ok_or_else(|| {
                                PlanError::Syntax(format!("window \"{window}\" does not exist"))
                            })?
                    }
                    ast::WindowRef::Inline(def) => self.bind_window_definition(ctx, def)?,
                };
                Ok(Expression::Window(WindowExpr {
                    function: name,
                    inputs,
                    star: call.star,
                    filter,
                    spec,
                    datatype,
                }))
            }
            (None, FunctionKind::Window) => Err(PlanError::IllegalWindowFunction {
                reason: format!("{name} requires an OVER clause"),
            }),
            (None, FunctionKind::Aggregate) => {
                if !recur.allow_aggregates {
                    return Err(PlanError::illegal_aggregate(format!(
                        "aggregate function {name} is not allowed here"
                    )));
                }
                Ok(Expression::Aggregate(AggregateExpr {
                    function: name,
                    inputs,
                    distinct: call.distinct,
                    star: call.star,
                    filter,
                    datatype,
                }))
            }
            (None, FunctionKind::Scalar) => Ok(Expression::ScalarFunction(ScalarFunctionExpr {
                function: name,
                inputs,
                datatype,
            })),
        }
    }

    /// Bind the PARTITION BY and ORDER BY of a window.
    pub fn bind_window_definition(
        &self,
        ctx: &mut PlanContext,
        def: &ast::WindowDefinition,
    ) -> Result<WindowSpec> {
        let partition_by =
            self.bind_expressions(ctx, &def.partition_by, RecursionContext::AGGREGATES)?;
        let order_by = def
            .order_by
            .iter()
            .map(|term| self.bind_ordering_term(ctx, term, RecursionContext::AGGREGATES))
            .collect::<Result<Vec<_>>>()?;
        Ok(WindowSpec {
            partition_by,
            order_by,
        })
    }

    pub fn bind_ordering_term(
        &self,
        ctx: &mut PlanContext,
        term: &ast::OrderingTerm,
        recur: RecursionContext,
    ) -> Result<SortExpr> {
        Ok(SortExpr {
            expr: self.bind_expression(ctx, &term.expr, recur)?,
            desc: term.desc,
            nulls_first: term.nulls_first.unwrap_or(false),
        })
    }
}

fn comparison_op(op: ast::ComparisonOperator) -> ComparisonOperator {
    match op {
        ast::ComparisonOperator::Eq => ComparisonOperator::Eq,
        ast::ComparisonOperator::NotEq => ComparisonOperator::NotEq,
        ast::ComparisonOperator::Lt => ComparisonOperator::Lt,
        ast::ComparisonOperator::LtEq => ComparisonOperator::LtEq,
        ast::ComparisonOperator::Gt => ComparisonOperator::Gt,
        ast::ComparisonOperator::GtEq => ComparisonOperator::GtEq,
    }
}

fn negate_if(not: bool, expr: Expression) -> Expression {
    if not { Expression::not(expr) } else { expr }
}

fn expect_bool(datatype: &DataType, op: &str) -> Result<()> {
    if datatype.is_compatible(&DataType::Bool) {
        return Ok(());
    }
    Err(type_mismatch!("{} expects bool, got {datatype}", op.trim()))
}

fn expect_text(datatype: &DataType, op: &str) -> Result<()> {
    if datatype.is_compatible(&DataType::Text) {
        return Ok(());
    }
    Err(type_mismatch!("{op} expects text, got {datatype}"))
}

fn expect_numeric(datatype: &DataType, op: &str) -> Result<()> {
    if datatype.is_null() || datatype.is_numeric() {
        return Ok(());
    }
    Err(type_mismatch!("{op} expects a numeric type, got {datatype}"))
}

fn expect_compatible(left: &DataType, right: &DataType, op: &str) -> Result<()> {
    if left.is_compatible(right) {
        return Ok(());
    }
    Err(type_mismatch!("cannot apply {op} to {left} and {right}"))
}
