use std::fmt;

use sqlplan_error::{PlanError, Result, internal};
use tracing::trace;

use crate::expr::column_expr::ColumnExpr;
use crate::types::Relation;

/// Reference to a bind scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindScopeRef {
    pub scope_idx: usize,
}

impl fmt::Display for BindScopeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SCOPE_{}", self.scope_idx)
    }
}

#[derive(Debug, Default)]
struct BindScope {
    /// Scope of the enclosing query, if any.
    parent: Option<BindScopeRef>,
    /// Relation of the enclosing query visible to this scope for
    /// correlation.
    ///
    /// Empty for scopes that can't see the enclosing query's columns, e.g.
    /// subqueries in FROM.
    outer: Relation,
    /// Columns from enclosing scopes referenced from within this scope or
    /// any scope nested in it.
    correlated: Vec<ColumnExpr>,
}

/// Arena of scopes used while planning a single statement.
///
/// Each subquery is planned in its own child scope. Resolving a column that
/// isn't found locally walks outward through the enclosing scopes, recording
/// the column as correlated in every scope it crossed.
#[derive(Debug)]
pub struct BindContext {
    /// Initialized with a single scope (root).
    scopes: Vec<BindScope>,
}

impl Default for BindContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BindContext {
    pub fn new() -> Self {
        BindContext {
            scopes: vec![BindScope::default()],
        }
    }

    pub fn root_scope_ref(&self) -> BindScopeRef {
        BindScopeRef { scope_idx: 0 }
    }

    /// Creates a new scope that has no parents, and thus no visibility into any
    /// other scope.
    pub fn new_orphan_scope(&mut self) -> BindScopeRef {
        self.push_scope(BindScope::default())
    }

    /// Creates a new scope with `current` being the parent.
    ///
    /// `outer` is the relation of the enclosing query the new scope may
    /// correlate against.
    pub fn new_child_scope(&mut self, current: BindScopeRef, outer: Relation) -> BindScopeRef {
        let scope = self.push_scope(BindScope {
            parent: Some(current),
            outer,
            correlated: Vec::new(),
        });
        trace!(%scope, parent = %current, "pushed child scope");
        scope
    }

    fn push_scope(&mut self, scope: BindScope) -> BindScopeRef {
        let idx = self.scopes.len();
        self.scopes.push(scope);
        BindScopeRef { scope_idx: idx }
    }

    fn get_scope(&self, scope: BindScopeRef) -> Result<&BindScope> {
        self.scopes
            .get(scope.scope_idx)
            .ok_or_else(|| internal!("Missing bind scope: {scope}"))
    }

    fn get_scope_mut(&mut self, scope: BindScopeRef) -> Result<&mut BindScope> {
        self.scopes
            .get_mut(scope.scope_idx)
            .ok_or_else(|| internal!("Missing bind scope: {scope}"))
    }

    pub fn get_parent_ref(&self, scope: BindScopeRef) -> Result<Option<BindScopeRef>> {
        Ok(self.get_scope(scope)?.parent)
    }

    /// Correlated columns recorded for a scope.
    ///
    /// Depths are relative to that scope.
    pub fn correlated_columns(&self, scope: BindScopeRef) -> Result<&[ColumnExpr]> {
        Ok(&self.get_scope(scope)?.correlated)
    }

    /// Resolve a column reference.
    ///
    /// `relation` is the relation of the current query. Columns not found in
    /// it are searched for in the outer relations of enclosing scopes.
    pub fn resolve_column(
        &mut self,
        current: BindScopeRef,
        relation: &Relation,
        table: Option<&str>,
        name: &str,
    ) -> Result<ColumnExpr> {
        if let Some((_, field)) = relation.find(table, name)? {
            return Ok(ColumnExpr {
                relation: field.relation.clone(),
                column: field.name.clone(),
                datatype: field.datatype.clone(),
                depth: 0,
            });
        }

        // Scopes crossed so far, innermost first.
        let mut crossed = Vec::new();
        let mut next = Some(current);

        while let Some(scope_ref) = next {
            let scope = self.get_scope(scope_ref)?;
            crossed.push(scope_ref);

            if let Some((_, field)) = scope.outer.find(table, name)? {
                let depth = crossed.len();
                let column = ColumnExpr {
                    relation: field.relation.clone(),
                    column: field.name.clone(),
                    datatype: field.datatype.clone(),
                    depth,
                };
                for (idx, crossed_ref) in crossed.iter().enumerate() {
                    self.record_correlation(*crossed_ref, &column, depth - idx)?;
                }
                return Ok(column);
            }

            next = scope.parent;
        }

        Err(self.unresolved_column(current, relation, table, name)?)
    }

    fn record_correlation(
        &mut self,
        scope_ref: BindScopeRef,
        column: &ColumnExpr,
        depth: usize,
    ) -> Result<()> {
        let scope = self.get_scope_mut(scope_ref)?;
        if scope.correlated.iter().any(|c| c.same_column(column)) {
            return Ok(());
        }
        trace!(scope = %scope_ref, %column, depth, "recording correlated column");
        scope.correlated.push(ColumnExpr {
            depth,
            ..column.clone()
        });
        Ok(())
    }

    /// Error for a column that couldn't be found in any scope.
    ///
    /// A qualifier that doesn't name any visible relation is reported as an
    /// unknown table.
    fn unresolved_column(
        &self,
        current: BindScopeRef,
        relation: &Relation,
        table: Option<&str>,
        name: &str,
    ) -> Result<PlanError> {
        if let Some(table) = table {
            let mut visible = relation.has_qualifier(table);
            let mut next = Some(current);
            while let Some(scope_ref) = next {
                let scope = self.get_scope(scope_ref)?;
                visible |= scope.outer.has_qualifier(table);
                next = scope.parent;
            }
            if !visible {
                return Ok(PlanError::UnknownTable {
                    name: table.to_string(),
                });
            }
        }
        Ok(relation.column_not_found(table, name))
    }
}
