//! Logical planning for SQL statements.
//!
//! A parsed statement ([`ast::SqlStatement`]) is bound against a [`catalog::Catalog`]
//! and turned into a tree of [`logical::operator::LogicalOperator`]s. The
//! resulting [`logical::statement::CompiledStatement`] can optionally be run
//! through the [`optimizer::Optimizer`], and rendered with
//! [`explain::format_statement`].

pub mod ast;
pub mod binder;
pub mod catalog;
pub mod config;
pub mod explain;
pub mod expr;
pub mod functions;
pub mod logical;
pub mod optimizer;
pub mod planner;
pub mod types;

pub use planner::{plan, plan_and_optimize};
