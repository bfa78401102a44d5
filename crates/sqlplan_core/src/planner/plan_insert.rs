use hashbrown::HashSet;
use sqlplan_error::{PlanError, Result, type_mismatch};
use tracing::trace;

use super::PlanContext;
use super::plan_from::table_relation;
use super::plan_mutate::{bind_assignments, check_assignable, lookup_physical_table};
use super::plan_select::SelectPlanner;
use crate::ast;
use crate::binder::bind_context::BindScopeRef;
use crate::binder::expr_binder::{ExpressionBinder, RecursionContext};
use crate::catalog::{ConstraintKind, Table};
use crate::expr::Expression;
use crate::logical::logical_insert::{Arbiter, ConflictAction, ConflictResolution, LogicalInsert};
use crate::logical::logical_values::LogicalValues;
use crate::logical::operator::{LogicalOperator, Node};
use crate::types::{Field, Relation, ScalarValue};

/// Plans INSERT statements.
///
/// The child of the insert always produces one value per table column in
/// declaration order. Columns omitted from the column list are filled with
/// NULL.
#[derive(Debug)]
pub struct InsertPlanner;

impl InsertPlanner {
    pub fn plan(
        &self,
        ctx: &mut PlanContext,
        current: BindScopeRef,
        insert: &ast::InsertStatement,
    ) -> Result<LogicalOperator> {
        let name = ctx.config.normalize_ident(&insert.table);
        let table = lookup_physical_table(ctx, &name)?;
        let alias = insert
            .alias
            .as_ref()
            .map(|a| ctx.config.normalize_ident(a))
            .unwrap_or_else(|| name.clone());
        let target_relation = table_relation(&table, &alias);

        let targets = self.target_columns(ctx, &table, &target_relation, &insert.columns)?;
        trace!(table = %name, ?targets, "planning insert");

        let source = match &insert.source {
            ast::InsertSource::Values(rows) => self.plan_values(ctx, current, &table, &targets, rows)?,
            ast::InsertSource::Select(query) => {
                if targets.len() != table.columns.len() {
                    return Err(PlanError::Unsupported(
                        "INSERT ... SELECT with a partial column list".to_string(),
                    ));
                }
                let (plan, relation) = SelectPlanner.plan(ctx, current, query)?;
                check_select_shape(&table, &relation)?;
                plan
            }
        };

        let conflict = insert
            .on_conflict
            .as_ref()
            .map(|c| self.plan_conflict(ctx, current, &table, &target_relation, c))
            .transpose()?;

        let columns = table
            .columns
            .iter()
            .map(|c| Field {
                nullable: c.nullable,
                ..Field::new(None, c.name.clone(), c.datatype.clone())
            })
            .collect();

        Ok(LogicalOperator::Insert(Node::new(
            LogicalInsert {
                table: name,
                alias,
                columns,
                conflict,
            },
            vec![source],
        )))
    }

    /// Resolve the column list to positions in the table.
    fn target_columns(
        &self,
        ctx: &PlanContext,
        table: &Table,
        relation: &Relation,
        columns: &[String],
    ) -> Result<Vec<usize>> {
        if columns.is_empty() {
            return Ok((0..table.columns.len()).collect());
        }

        let mut targets = Vec::with_capacity(columns.len());
        for column in columns {
            let column = ctx.config.normalize_ident(column);
            let idx = table
                .columns
                .iter()
                .position(|c| c.name == column)
                .ok_or_else(|| relation.column_not_found(None, &column))?;
            if targets.contains(&idx) {
                return Err(PlanError::Syntax(format!(
                    "column \"{column}\" specified more than once"
                )));
            }
            targets.push(idx);
        }

        Ok(targets)
    }

    fn plan_values(
        &self,
        ctx: &mut PlanContext,
        current: BindScopeRef,
        table: &Table,
        targets: &[usize],
        rows: &[Vec<ast::Expr>],
    ) -> Result<LogicalOperator> {
        // Values can't reference columns.
        let empty = Relation::empty();
        let binder = ExpressionBinder::new(current, &empty);

        let mut bound_rows = Vec::with_capacity(rows.len());
        for row in rows {
            if row.len() != targets.len() {
                return Err(PlanError::WrongArity {
                    context: "INSERT VALUES".to_string(),
                    expected: targets.len(),
                    got: row.len(),
                });
            }

            let mut values: Vec<Option<Expression>> = vec![None; table.columns.len()];
            for (value, &idx) in row.iter().zip(targets) {
                let expr = binder.bind_expression(ctx, value, RecursionContext::PLAIN)?;
                check_assignable(&table.columns[idx], &expr)?;
                values[idx] = Some(expr);
            }

            let values = values
                .into_iter()
                .zip(&table.columns)
                .map(|(value, column)| match value {
                    Some(value) => Ok(value),
                    None => {
                        let null = Expression::lit(ScalarValue::Null);
                        check_assignable(column, &null)?;
                        Ok(null)
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            bound_rows.push(values);
        }

        let relation = Relation::new(
            table
                .columns
                .iter()
                .map(|c| Field::new(None, c.name.clone(), c.datatype.clone()))
                .collect(),
        );

        Ok(LogicalOperator::Values(Node::new(
            LogicalValues {
                rows: bound_rows,
                relation,
            },
            Vec::new(),
        )))
    }

    fn plan_conflict(
        &self,
        ctx: &mut PlanContext,
        current: BindScopeRef,
        table: &Table,
        target_relation: &Relation,
        on_conflict: &ast::OnConflict,
    ) -> Result<ConflictResolution> {
        if on_conflict.arbiter_where.is_some() {
            return Err(PlanError::Unsupported(
                "WHERE on an ON CONFLICT target".to_string(),
            ));
        }

        let arbiter = if on_conflict.columns.is_empty() {
            None
        } else {
            let columns: Vec<String> = on_conflict
                .columns
                .iter()
                .map(|c| ctx.config.normalize_ident(c))
                .collect();
            Some(resolve_arbiter(table, target_relation, &columns)?)
        };

        let action = match &on_conflict.action {
            ast::ConflictAction::DoNothing => ConflictAction::DoNothing,
            ast::ConflictAction::DoUpdate {
                assignments,
                where_clause,
            } => {
                if arbiter.is_none() {
                    return Err(PlanError::IllegalConflictArbiter {
                        reason: "ON CONFLICT DO UPDATE requires a conflict target".to_string(),
                    });
                }

                // Proposed rows are visible as "excluded".
                let excluded = table_relation(table, "excluded");
                let relation = target_relation.join(&excluded);

                let assignments = bind_assignments(ctx, current, table, &relation, assignments)?;
                let filter = where_clause
                    .as_ref()
                    .map(|expr| {
                        ExpressionBinder::new(current, &relation).bind_predicate(
                            ctx,
                            expr,
                            RecursionContext::PLAIN,
                            "ON CONFLICT WHERE",
                        )
                    })
                    .transpose()?;

                ConflictAction::DoUpdate {
                    assignments,
                    filter,
                }
            }
        };

        Ok(ConflictResolution { arbiter, action })
    }
}

/// Find the primary key, unique column, unique constraint or unique index
/// covering exactly `columns`.
fn resolve_arbiter(table: &Table, relation: &Relation, columns: &[String]) -> Result<Arbiter> {
    for column in columns {
        if table.column(column).is_none() {
            return Err(relation.column_not_found(None, column));
        }
    }

    let wanted: HashSet<&str> = columns.iter().map(|c| c.as_str()).collect();
    let same_set = |other: &[String]| {
        other.len() == wanted.len() && other.iter().all(|c| wanted.contains(c.as_str()))
    };

    let primary_key = table.primary_key();
    if primary_key.len() == wanted.len() && primary_key.iter().all(|c| wanted.contains(c)) {
        return Ok(Arbiter::PrimaryKey {
            table: table.name.clone(),
            columns: primary_key.iter().map(|c| c.to_string()).collect(),
        });
    }

    if let [column] = columns {
        let unique_column = table.column(column).is_some_and(|c| c.unique);
        let unique_constraint = table
            .constraints
            .values()
            .any(|k| k.kind == ConstraintKind::Unique && k.columns == [column.clone()]);
        if unique_column || unique_constraint {
            return Ok(Arbiter::Unique {
                table: table.name.clone(),
                column: column.clone(),
            });
        }
    }

    if let Some(index) = table
        .indexes
        .iter()
        .find(|idx| idx.is_unique() && same_set(&idx.columns))
    {
        return Ok(Arbiter::Index {
            name: index.name.clone(),
        });
    }

    if let Some((name, _)) = table
        .constraints
        .iter()
        .find(|(_, k)| k.kind == ConstraintKind::Unique && same_set(&k.columns))
    {
        return Ok(Arbiter::Index { name: name.clone() });
    }

    Err(PlanError::IllegalConflictArbiter {
        reason: format!(
            "no primary key, unique constraint or unique index on {}({})",
            table.name,
            columns.join(", ")
        ),
    })
}

/// Check an INSERT ... SELECT source produces one compatible value per
/// table column.
fn check_select_shape(table: &Table, relation: &Relation) -> Result<()> {
    if relation.len() != table.columns.len() {
        return Err(PlanError::WrongArity {
            context: "INSERT ... SELECT".to_string(),
            expected: table.columns.len(),
            got: relation.len(),
        });
    }

    for (field, column) in relation.iter().zip(&table.columns) {
        if !field.datatype.is_null() && !field.datatype.is_compatible(&column.datatype) {
            return Err(type_mismatch!(
                "cannot insert {} into column \"{}\" of type {}",
                field.datatype,
                column.name,
                column.datatype
            ));
        }
    }

    Ok(())
}
