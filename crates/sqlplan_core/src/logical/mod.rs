//! Logical plan operators.

pub mod logical_aggregate;
pub mod logical_distinct;
pub mod logical_empty;
pub mod logical_filter;
pub mod logical_insert;
pub mod logical_join;
pub mod logical_limit;
pub mod logical_mutate;
pub mod logical_order;
pub mod logical_project;
pub mod logical_return;
pub mod logical_scan;
pub mod logical_setop;
pub mod logical_values;
pub mod logical_window;
pub mod operator;
pub mod statement;
pub mod subplan;
