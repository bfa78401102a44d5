//! Shared fixtures for integration tests.

#![allow(dead_code)]

use sqlplan_core::ast::builder::text;
use sqlplan_core::ast::{Expr, SqlStatement};
use sqlplan_core::catalog::{Column, Constraint, Index, IndexKind, MemoryCatalog, Table};
use sqlplan_core::config::PlannerConfig;
use sqlplan_core::logical::operator::LogicalNode;
use sqlplan_core::logical::statement::CompiledStatement;
use sqlplan_core::types::DataType;
use sqlplan_error::{ErrorKind, Result};

pub const UUID_A: &str = "123e4567-e89b-12d3-a456-426614174000";
pub const UUID_B: &str = "123e4567-e89b-12d3-a456-426614174001";

pub fn users() -> Table {
    Table::new(
        "users",
        vec![
            Column::new("id", DataType::Uuid).primary_key(),
            Column::new("name", DataType::Text),
            Column::new("age", DataType::Int8),
        ],
    )
    .with_index(Index::new("name_idx", IndexKind::UniqueBtree, &["name"]))
}

pub fn posts() -> Table {
    Table::new(
        "posts",
        vec![
            Column::new("id", DataType::Uuid).primary_key(),
            Column::new("owner_id", DataType::Uuid),
            Column::new("content", DataType::Text),
            Column::new("created_at", DataType::Int8),
        ],
    )
    .with_constraint("content_unique", Constraint::unique(&["content"]))
    .with_constraint(
        "owner_created_idx",
        Constraint::unique(&["owner_id", "created_at"]),
    )
}

/// Catalog with `users` and `posts`.
pub fn catalog() -> MemoryCatalog {
    MemoryCatalog::default()
        .with_table(users())
        .with_table(posts())
}

/// `'<uuid>'::uuid`
pub fn uuid(value: &str) -> Expr {
    text(value).cast_to("uuid")
}

/// Plan without running the optimizer.
pub fn plan(catalog: &MemoryCatalog, stmt: impl Into<SqlStatement>) -> Result<CompiledStatement> {
    plan_with_config(catalog, stmt, &PlannerConfig::default())
}

pub fn plan_with_config(
    catalog: &MemoryCatalog,
    stmt: impl Into<SqlStatement>,
    config: &PlannerConfig,
) -> Result<CompiledStatement> {
    logutil::init_test();
    sqlplan_core::plan(&stmt.into(), catalog, config)
}

/// Plan and optimize.
pub fn optimize(
    catalog: &MemoryCatalog,
    stmt: impl Into<SqlStatement>,
) -> Result<CompiledStatement> {
    logutil::init_test();
    sqlplan_core::plan_and_optimize(&stmt.into(), catalog, &PlannerConfig::default())
}

/// Assert the unoptimized plan dump matches `expected`.
pub fn assert_plan(catalog: &MemoryCatalog, stmt: impl Into<SqlStatement>, expected: &str) {
    let planned = plan(catalog, stmt).unwrap();
    let got = planned.to_string();
    assert_eq!(expected, got, "\nexpected:\n{expected}\ngot:\n{got}");

    // Deriving relations must work for every plan in the statement.
    planned.relation().unwrap();
    for cte in &planned.ctes {
        cte.plan.output_relation().unwrap();
    }
    for subplan in &planned.subplans {
        subplan.plan.output_relation().unwrap();
    }
    assert_eq!(expected, planned.to_string());
}

pub fn assert_plan_err(catalog: &MemoryCatalog, stmt: impl Into<SqlStatement>, kind: ErrorKind) {
    let err = plan(catalog, stmt).unwrap_err();
    assert_eq!(kind, err.kind(), "unexpected error: {err}");
}
