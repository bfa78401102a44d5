//! Errors produced while planning a statement.
//!
//! Every failure is a planning-time failure. Callers should match on
//! [`PlanError::kind`] rather than on rendered messages.

use serde::{Deserialize, Serialize};

/// Category of a planning error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    UnknownTable,
    ColumnNotFound,
    AmbiguousColumn,
    TableAlreadyJoined,
    UnknownFunction,
    UnknownVariable,
    IllegalAggregate,
    IllegalWindowFunction,
    SetIncompatibleSchemas,
    WrongArity,
    TypeMismatch,
    UpdateOrDeleteWithoutWhere,
    NotNullableColumn,
    IllegalConflictArbiter,
    Syntax,
    Unsupported,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("unknown table \"{name}\"")]
    UnknownTable { name: String },

    #[error(
        "column \"{column}\" not found{}",
        .suggestion.as_ref().map(|s| format!(", did you mean \"{s}\"?")).unwrap_or_default()
    )]
    ColumnNotFound {
        column: String,
        /// Closest visible column name, if one is similar enough.
        suggestion: Option<String>,
    },

    #[error("ambiguous column name \"{column}\"")]
    AmbiguousColumn { column: String },

    #[error("table \"{name}\" already joined")]
    TableAlreadyJoined { name: String },

    #[error("unknown function \"{name}\"")]
    UnknownFunction { name: String },

    #[error("unknown variable \"{name}\"")]
    UnknownVariable { name: String },

    #[error("illegal aggregate: {reason}")]
    IllegalAggregate { reason: String },

    #[error("illegal window function: {reason}")]
    IllegalWindowFunction { reason: String },

    #[error("incompatible set operation schemas: {reason}")]
    SetIncompatibleSchemas { reason: String },

    #[error("{context}: expected {expected} values, got {got}")]
    WrongArity {
        context: String,
        expected: usize,
        got: usize,
    },

    #[error("type mismatch: {reason}")]
    TypeMismatch { reason: String },

    #[error("UPDATE and DELETE on \"{table}\" require a WHERE clause")]
    UpdateOrDeleteWithoutWhere { table: String },

    #[error("column \"{column}\" is not nullable")]
    NotNullableColumn { column: String },

    #[error("illegal conflict arbiter: {reason}")]
    IllegalConflictArbiter { reason: String },

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl PlanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownTable { .. } => ErrorKind::UnknownTable,
            Self::ColumnNotFound { .. } => ErrorKind::ColumnNotFound,
            Self::AmbiguousColumn { .. } => ErrorKind::AmbiguousColumn,
            Self::TableAlreadyJoined { .. } => ErrorKind::TableAlreadyJoined,
            Self::UnknownFunction { .. } => ErrorKind::UnknownFunction,
            Self::UnknownVariable { .. } => ErrorKind::UnknownVariable,
            Self::IllegalAggregate { .. } => ErrorKind::IllegalAggregate,
            Self::IllegalWindowFunction { .. } => ErrorKind::IllegalWindowFunction,
            Self::SetIncompatibleSchemas { .. } => ErrorKind::SetIncompatibleSchemas,
            Self::WrongArity { .. } => ErrorKind::WrongArity,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::UpdateOrDeleteWithoutWhere { .. } => ErrorKind::UpdateOrDeleteWithoutWhere,
            Self::NotNullableColumn { .. } => ErrorKind::NotNullableColumn,
            Self::IllegalConflictArbiter { .. } => ErrorKind::IllegalConflictArbiter,
            Self::Syntax(_) => ErrorKind::Syntax,
            Self::Unsupported(_) => ErrorKind::Unsupported,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn illegal_aggregate(reason: impl Into<String>) -> Self {
        Self::IllegalAggregate {
            reason: reason.into(),
        }
    }

    pub fn type_mismatch(reason: impl Into<String>) -> Self {
        Self::TypeMismatch {
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = PlanError> = std::result::Result<T, E>;

/// Create an internal error using format arguments.
#[macro_export]
macro_rules! internal {
    ($($arg:tt)*) => {
        $crate::PlanError::Internal(std::format!($($arg)*))
    };
}

/// Create a type mismatch error using format arguments.
#[macro_export]
macro_rules! type_mismatch {
    ($($arg:tt)*) => {
        $crate::PlanError::TypeMismatch { reason: std::format!($($arg)*) }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_not_found_with_suggestion() {
        let err = PlanError::ColumnNotFound {
            column: "nme".to_string(),
            suggestion: Some("name".to_string()),
        };
        assert_eq!(
            "column \"nme\" not found, did you mean \"name\"?",
            err.to_string()
        );
        assert_eq!(ErrorKind::ColumnNotFound, err.kind());
    }

    #[test]
    fn column_not_found_without_suggestion() {
        let err = PlanError::ColumnNotFound {
            column: "wallet".to_string(),
            suggestion: None,
        };
        assert_eq!("column \"wallet\" not found", err.to_string());
    }

    #[test]
    fn macros_produce_expected_kinds() {
        let err = internal!("missing child {}", 1);
        assert_eq!(ErrorKind::Internal, err.kind());
        assert_eq!("internal: missing child 1", err.to_string());

        let err = type_mismatch!("{} != {}", "int8", "text");
        assert_eq!(ErrorKind::TypeMismatch, err.kind());
    }
}
