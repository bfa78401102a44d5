//! Name resolution and expression binding.
//!
//! [`bind_context::BindContext`] tracks the scopes of a statement and the
//! columns each scope correlates on. [`expr_binder::ExpressionBinder`] turns
//! parsed expressions into typed [`crate::expr::Expression`]s.

pub mod bind_context;
pub mod expr_binder;
