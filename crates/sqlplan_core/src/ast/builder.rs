//! Helpers for building statements by hand.
//!
//! ```
//! use sqlplan_core::ast::builder::*;
//!
//! let stmt = select(
//!     SelectCore::new()
//!         .column(col("name"))
//!         .from(table("users"))
//!         .filter(col("age").gt(int(18))),
//! );
//! ```

use super::*;
use crate::types::{ScalarValue, TypeName};

pub use super::{CompoundOperator, JoinKind, SelectCore, SelectStatement, SqlStatement};

pub fn col(name: &str) -> Expr {
    Expr::Column {
        table: None,
        name: name.to_string(),
    }
}

/// Qualified column reference, `table.name`.
pub fn qcol(table: &str, name: &str) -> Expr {
    Expr::Column {
        table: Some(table.to_string()),
        name: name.to_string(),
    }
}

pub fn lit(value: impl Into<ScalarValue>) -> Expr {
    Expr::Literal(value.into())
}

pub fn int(value: i64) -> Expr {
    Expr::Literal(ScalarValue::Int8(value))
}

pub fn text(value: &str) -> Expr {
    Expr::Literal(ScalarValue::Text(value.to_string()))
}

pub fn null() -> Expr {
    Expr::Literal(ScalarValue::Null)
}

/// `$name`
pub fn var(name: &str) -> Expr {
    Expr::Variable {
        prefix: VariablePrefix::Dollar,
        name: name.to_string(),
    }
}

/// `@name`
pub fn ctx_var(name: &str) -> Expr {
    Expr::Variable {
        prefix: VariablePrefix::At,
        name: name.to_string(),
    }
}

pub fn array(elements: Vec<Expr>) -> Expr {
    Expr::Array(elements)
}

pub fn func(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function(FunctionCall {
        name: name.to_string(),
        args,
        distinct: false,
        star: false,
        filter: None,
        over: None,
    })
}

pub fn func_distinct(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function(FunctionCall {
        name: name.to_string(),
        args,
        distinct: true,
        star: false,
        filter: None,
        over: None,
    })
}

/// `name(*)`
pub fn func_star(name: &str) -> Expr {
    Expr::Function(FunctionCall {
        name: name.to_string(),
        args: Vec::new(),
        distinct: false,
        star: true,
        filter: None,
        over: None,
    })
}

pub fn exists(query: impl Into<SelectStatement>) -> Expr {
    Expr::Exists {
        subquery: Box::new(query.into()),
        not: false,
    }
}

pub fn not_exists(query: impl Into<SelectStatement>) -> Expr {
    Expr::Exists {
        subquery: Box::new(query.into()),
        not: true,
    }
}

pub fn subquery(query: impl Into<SelectStatement>) -> Expr {
    Expr::Subquery(Box::new(query.into()))
}

pub fn case(
    operand: Option<Expr>,
    when_then: Vec<(Expr, Expr)>,
    else_expr: Option<Expr>,
) -> Expr {
    Expr::Case {
        operand: operand.map(Box::new),
        when_then,
        else_expr: else_expr.map(Box::new),
    }
}

pub fn table(name: &str) -> TableSource {
    TableSource::Table {
        namespace: None,
        name: name.to_string(),
        alias: None,
    }
}

pub fn table_as(name: &str, alias: &str) -> TableSource {
    TableSource::Table {
        namespace: None,
        name: name.to_string(),
        alias: Some(alias.to_string()),
    }
}

pub fn subquery_as(query: impl Into<SelectStatement>, alias: &str) -> TableSource {
    TableSource::Subquery {
        query: Box::new(query.into()),
        alias: Some(alias.to_string()),
    }
}

pub fn asc(expr: Expr) -> OrderingTerm {
    OrderingTerm {
        expr,
        desc: false,
        nulls_first: None,
    }
}

pub fn desc(expr: Expr) -> OrderingTerm {
    OrderingTerm {
        expr,
        desc: true,
        nulls_first: None,
    }
}

pub fn assign(column: &str, value: Expr) -> Assignment {
    Assignment {
        column: column.to_string(),
        value,
    }
}

pub fn select(core: SelectCore) -> SqlStatement {
    SqlStatement {
        with: None,
        statement: Statement::Select(core.into()),
    }
}

pub fn insert(table: &str, columns: &[&str], rows: Vec<Vec<Expr>>) -> InsertStatement {
    InsertStatement {
        table: table.to_string(),
        alias: None,
        columns: columns.iter().map(|c| c.to_string()).collect(),
        source: InsertSource::Values(rows),
        on_conflict: None,
    }
}

pub fn insert_select(
    table: &str,
    columns: &[&str],
    query: impl Into<SelectStatement>,
) -> InsertStatement {
    InsertStatement {
        table: table.to_string(),
        alias: None,
        columns: columns.iter().map(|c| c.to_string()).collect(),
        source: InsertSource::Select(Box::new(query.into())),
        on_conflict: None,
    }
}

pub fn update(table: &str, assignments: Vec<Assignment>) -> UpdateStatement {
    UpdateStatement {
        table: table.to_string(),
        alias: None,
        assignments,
        from: Vec::new(),
        where_clause: None,
    }
}

pub fn delete(table: &str) -> DeleteStatement {
    DeleteStatement {
        table: table.to_string(),
        alias: None,
        from: Vec::new(),
        where_clause: None,
    }
}

pub fn with(recursive: bool, ctes: Vec<CommonTableExpr>) -> WithClause {
    WithClause { recursive, ctes }
}

pub fn cte(name: &str, columns: &[&str], query: impl Into<SelectStatement>) -> CommonTableExpr {
    CommonTableExpr {
        name: name.to_string(),
        columns: columns.iter().map(|c| c.to_string()).collect(),
        query: query.into(),
    }
}

pub fn window() -> WindowDefinition {
    WindowDefinition::default()
}

fn boxed(expr: Expr) -> Box<Expr> {
    Box::new(expr)
}

impl Expr {
    fn arith(self, op: ArithOperator, right: Expr) -> Expr {
        Expr::Arith {
            left: boxed(self),
            op,
            right: boxed(right),
        }
    }

    fn compare(self, op: ComparisonOperator, right: Expr) -> Expr {
        Expr::Comparison {
            left: boxed(self),
            op,
            right: boxed(right),
        }
    }

    pub fn plus(self, right: Expr) -> Expr {
        self.arith(ArithOperator::Add, right)
    }

    pub fn minus(self, right: Expr) -> Expr {
        self.arith(ArithOperator::Sub, right)
    }

    pub fn times(self, right: Expr) -> Expr {
        self.arith(ArithOperator::Mul, right)
    }

    pub fn divided_by(self, right: Expr) -> Expr {
        self.arith(ArithOperator::Div, right)
    }

    pub fn modulo(self, right: Expr) -> Expr {
        self.arith(ArithOperator::Mod, right)
    }

    pub fn concat(self, right: Expr) -> Expr {
        self.arith(ArithOperator::Concat, right)
    }

    pub fn equals(self, right: Expr) -> Expr {
        self.compare(ComparisonOperator::Eq, right)
    }

    pub fn not_equals(self, right: Expr) -> Expr {
        self.compare(ComparisonOperator::NotEq, right)
    }

    pub fn lt(self, right: Expr) -> Expr {
        self.compare(ComparisonOperator::Lt, right)
    }

    pub fn lt_eq(self, right: Expr) -> Expr {
        self.compare(ComparisonOperator::LtEq, right)
    }

    pub fn gt(self, right: Expr) -> Expr {
        self.compare(ComparisonOperator::Gt, right)
    }

    pub fn gt_eq(self, right: Expr) -> Expr {
        self.compare(ComparisonOperator::GtEq, right)
    }

    pub fn and(self, right: Expr) -> Expr {
        Expr::Conjunction {
            left: boxed(self),
            op: ConjunctionOperator::And,
            right: boxed(right),
        }
    }

    pub fn or(self, right: Expr) -> Expr {
        Expr::Conjunction {
            left: boxed(self),
            op: ConjunctionOperator::Or,
            right: boxed(right),
        }
    }

    pub fn negate(self) -> Expr {
        Expr::Unary {
            op: UnaryOperator::Neg,
            expr: boxed(self),
        }
    }

    pub fn logical_not(self) -> Expr {
        Expr::Unary {
            op: UnaryOperator::Not,
            expr: boxed(self),
        }
    }

    pub fn is(self, right: Expr) -> Expr {
        Expr::Is {
            expr: boxed(self),
            not: false,
            distinct: false,
            right: boxed(right),
        }
    }

    pub fn is_not(self, right: Expr) -> Expr {
        Expr::Is {
            expr: boxed(self),
            not: true,
            distinct: false,
            right: boxed(right),
        }
    }

    pub fn is_null(self) -> Expr {
        self.is(null())
    }

    pub fn is_not_null(self) -> Expr {
        self.is_not(null())
    }

    pub fn is_distinct_from(self, right: Expr) -> Expr {
        Expr::Is {
            expr: boxed(self),
            not: false,
            distinct: true,
            right: boxed(right),
        }
    }

    pub fn is_not_distinct_from(self, right: Expr) -> Expr {
        Expr::Is {
            expr: boxed(self),
            not: true,
            distinct: true,
            right: boxed(right),
        }
    }

    pub fn like(self, pattern: Expr) -> Expr {
        Expr::Like {
            expr: boxed(self),
            pattern: boxed(pattern),
            not: false,
            case_insensitive: false,
        }
    }

    pub fn not_like(self, pattern: Expr) -> Expr {
        Expr::Like {
            expr: boxed(self),
            pattern: boxed(pattern),
            not: true,
            case_insensitive: false,
        }
    }

    pub fn ilike(self, pattern: Expr) -> Expr {
        Expr::Like {
            expr: boxed(self),
            pattern: boxed(pattern),
            not: false,
            case_insensitive: true,
        }
    }

    pub fn between(self, low: Expr, high: Expr) -> Expr {
        Expr::Between {
            expr: boxed(self),
            low: boxed(low),
            high: boxed(high),
            not: false,
        }
    }

    pub fn not_between(self, low: Expr, high: Expr) -> Expr {
        Expr::Between {
            expr: boxed(self),
            low: boxed(low),
            high: boxed(high),
            not: true,
        }
    }

    pub fn in_list(self, list: Vec<Expr>) -> Expr {
        Expr::InList {
            expr: boxed(self),
            list,
            not: false,
        }
    }

    pub fn not_in_list(self, list: Vec<Expr>) -> Expr {
        Expr::InList {
            expr: boxed(self),
            list,
            not: true,
        }
    }

    pub fn in_subquery(self, query: impl Into<SelectStatement>) -> Expr {
        Expr::InSubquery {
            expr: boxed(self),
            subquery: Box::new(query.into()),
            not: false,
        }
    }

    pub fn not_in_subquery(self, query: impl Into<SelectStatement>) -> Expr {
        Expr::InSubquery {
            expr: boxed(self),
            subquery: Box::new(query.into()),
            not: true,
        }
    }

    pub fn cast(self, datatype: TypeName) -> Expr {
        Expr::Cast {
            expr: boxed(self),
            datatype,
        }
    }

    /// Cast to a type by name, e.g. `cast_to("int")`.
    pub fn cast_to(self, name: &str) -> Expr {
        self.cast(TypeName::new(name))
    }

    pub fn collate(self, collation: &str) -> Expr {
        Expr::Collate {
            expr: boxed(self),
            collation: collation.to_string(),
        }
    }

    pub fn index(self, index: Expr) -> Expr {
        Expr::ArrayAccess {
            array: boxed(self),
            index: boxed(index),
        }
    }

    /// `$obj.field`
    pub fn field(self, field: &str) -> Expr {
        Expr::FieldAccess {
            base: boxed(self),
            field: field.to_string(),
        }
    }

    /// Attach an inline window to a function call.
    ///
    /// Non-function expressions are returned unchanged.
    pub fn over(self, window: WindowDefinition) -> Expr {
        self.with_window(WindowRef::Inline(window))
    }

    /// Attach a named window to a function call.
    pub fn over_named(self, name: &str) -> Expr {
        self.with_window(WindowRef::Named(name.to_string()))
    }

    fn with_window(self, window: WindowRef) -> Expr {
        match self {
            Expr::Function(mut call) => {
                call.over = Some(window);
                Expr::Function(call)
            }
            other => other,
        }
    }

    /// Attach a FILTER clause to a function call.
    pub fn filter_where(self, filter: Expr) -> Expr {
        match self {
            Expr::Function(mut call) => {
                call.filter = Some(boxed(filter));
                Expr::Function(call)
            }
            other => other,
        }
    }
}

impl WindowDefinition {
    pub fn partition_by(mut self, expr: Expr) -> Self {
        self.partition_by.push(expr);
        self
    }

    pub fn order_by(mut self, term: OrderingTerm) -> Self {
        self.order_by.push(term);
        self
    }
}

impl OrderingTerm {
    pub fn nulls_first(mut self) -> Self {
        self.nulls_first = Some(true);
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls_first = Some(false);
        self
    }
}

impl SelectCore {
    pub fn new() -> Self {
        SelectCore::default()
    }

    pub fn column(mut self, expr: Expr) -> Self {
        self.columns.push(ResultColumn::Expr { expr, alias: None });
        self
    }

    pub fn column_as(mut self, expr: Expr, alias: &str) -> Self {
        self.columns.push(ResultColumn::Expr {
            expr,
            alias: Some(alias.to_string()),
        });
        self
    }

    pub fn wildcard(mut self) -> Self {
        self.columns.push(ResultColumn::Wildcard { table: None });
        self
    }

    pub fn qualified_wildcard(mut self, table: &str) -> Self {
        self.columns.push(ResultColumn::Wildcard {
            table: Some(table.to_string()),
        });
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Add a table source. Multiple sources form a cartesian product.
    pub fn from(mut self, relation: TableSource) -> Self {
        self.from.push(FromItem {
            relation,
            joins: Vec::new(),
        });
        self
    }

    /// Join onto the most recently added source.
    pub fn join(mut self, kind: JoinKind, relation: TableSource, on: Expr) -> Self {
        if let Some(item) = self.from.last_mut() {
            item.joins.push(Join { kind, relation, on });
        }
        self
    }

    pub fn filter(mut self, expr: Expr) -> Self {
        self.where_clause = Some(expr);
        self
    }

    pub fn group_by(mut self, exprs: Vec<Expr>) -> Self {
        self.group_by = exprs;
        self
    }

    pub fn having(mut self, expr: Expr) -> Self {
        self.having = Some(expr);
        self
    }

    pub fn window(mut self, name: &str, def: WindowDefinition) -> Self {
        self.windows.push((name.to_string(), def));
        self
    }
}

impl From<SelectCore> for SelectStatement {
    fn from(core: SelectCore) -> Self {
        SelectStatement {
            cores: vec![core],
            compound_ops: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }
}

impl SelectStatement {
    pub fn compound(mut self, op: CompoundOperator, core: SelectCore) -> Self {
        self.compound_ops.push(op);
        self.cores.push(core);
        self
    }

    pub fn order_by(mut self, term: OrderingTerm) -> Self {
        self.order_by.push(term);
        self
    }

    pub fn limit(mut self, expr: Expr) -> Self {
        self.limit = Some(expr);
        self
    }

    pub fn offset(mut self, expr: Expr) -> Self {
        self.offset = Some(expr);
        self
    }
}

impl InsertStatement {
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn on_conflict_do_nothing(mut self, columns: &[&str]) -> Self {
        self.on_conflict = Some(OnConflict {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            arbiter_where: None,
            action: ConflictAction::DoNothing,
        });
        self
    }

    pub fn on_conflict_do_update(
        mut self,
        columns: &[&str],
        assignments: Vec<Assignment>,
        where_clause: Option<Expr>,
    ) -> Self {
        self.on_conflict = Some(OnConflict {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            arbiter_where: None,
            action: ConflictAction::DoUpdate {
                assignments,
                where_clause,
            },
        });
        self
    }

    /// Set the index predicate of the conflict target.
    pub fn arbiter_where(mut self, expr: Expr) -> Self {
        if let Some(conflict) = self.on_conflict.as_mut() {
            conflict.arbiter_where = Some(expr);
        }
        self
    }
}

impl UpdateStatement {
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn from(mut self, relation: TableSource) -> Self {
        self.from.push(FromItem {
            relation,
            joins: Vec::new(),
        });
        self
    }

    pub fn join(mut self, kind: JoinKind, relation: TableSource, on: Expr) -> Self {
        if let Some(item) = self.from.last_mut() {
            item.joins.push(Join { kind, relation, on });
        }
        self
    }

    pub fn filter(mut self, expr: Expr) -> Self {
        self.where_clause = Some(expr);
        self
    }
}

impl DeleteStatement {
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn from(mut self, relation: TableSource) -> Self {
        self.from.push(FromItem {
            relation,
            joins: Vec::new(),
        });
        self
    }

    pub fn filter(mut self, expr: Expr) -> Self {
        self.where_clause = Some(expr);
        self
    }
}

impl From<SelectStatement> for SqlStatement {
    fn from(stmt: SelectStatement) -> Self {
        SqlStatement {
            with: None,
            statement: Statement::Select(stmt),
        }
    }
}

impl From<InsertStatement> for SqlStatement {
    fn from(stmt: InsertStatement) -> Self {
        SqlStatement {
            with: None,
            statement: Statement::Insert(stmt),
        }
    }
}

impl From<UpdateStatement> for SqlStatement {
    fn from(stmt: UpdateStatement) -> Self {
        SqlStatement {
            with: None,
            statement: Statement::Update(stmt),
        }
    }
}

impl From<DeleteStatement> for SqlStatement {
    fn from(stmt: DeleteStatement) -> Self {
        SqlStatement {
            with: None,
            statement: Statement::Delete(stmt),
        }
    }
}

impl SqlStatement {
    pub fn with_ctes(mut self, with: WithClause) -> Self {
        self.with = Some(with);
        self
    }
}
