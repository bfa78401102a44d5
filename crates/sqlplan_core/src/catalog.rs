//! Schema information the planner resolves names against.

use std::sync::Arc;

use hashbrown::HashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::DataType;

/// Namespace used by [`MemoryCatalog`] when none is given.
pub const DEFAULT_NAMESPACE: &str = "main";

/// Source of tables, variables and object fields.
///
/// Lookups may be called many times while planning a single statement.
pub trait Catalog {
    fn lookup_table(&self, namespace: Option<&str>, name: &str) -> Option<Arc<Table>>;

    /// Type of a `$variable` or `@variable`.
    fn lookup_variable(&self, name: &str) -> Option<DataType>;

    /// Field types of an object variable, used for `$obj.field` access.
    fn lookup_object_fields(&self, name: &str) -> Option<IndexMap<String, DataType>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub datatype: DataType,
    pub nullable: bool,
    pub primary_key: bool,
    pub unique: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, datatype: DataType) -> Self {
        Column {
            name: name.into(),
            datatype,
            nullable: true,
            primary_key: false,
            unique: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexKind {
    Btree,
    UniqueBtree,
    Primary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub kind: IndexKind,
    pub columns: Vec<String>,
}

impl Index {
    pub fn new(name: impl Into<String>, kind: IndexKind, columns: &[&str]) -> Self {
        Index {
            name: name.into(),
            kind,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn is_unique(&self) -> bool {
        matches!(self.kind, IndexKind::UniqueBtree | IndexKind::Primary)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    Unique,
    Check,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub columns: Vec<String>,
}

impl Constraint {
    pub fn unique(columns: &[&str]) -> Self {
        Constraint {
            kind: ConstraintKind::Unique,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    /// Constraints keyed by name.
    pub constraints: IndexMap<String, Constraint>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Table {
            name: name.into(),
            columns,
            indexes: Vec::new(),
            constraints: IndexMap::new(),
        }
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn with_constraint(mut self, name: impl Into<String>, constraint: Constraint) -> Self {
        self.constraints.insert(name.into(), constraint);
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Names of the primary key columns, in table order.
    ///
    /// Falls back to a primary index if no column is marked.
    pub fn primary_key(&self) -> Vec<&str> {
        let cols: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect();
        if !cols.is_empty() {
            return cols;
        }

        self.indexes
            .iter()
            .find(|idx| idx.kind == IndexKind::Primary)
            .map(|idx| idx.columns.iter().map(|c| c.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Catalog backed by in-memory maps.
#[derive(Debug, Default, Clone)]
pub struct MemoryCatalog {
    namespaces: HashMap<String, HashMap<String, Arc<Table>>>,
    variables: HashMap<String, DataType>,
    objects: HashMap<String, IndexMap<String, DataType>>,
}

impl MemoryCatalog {
    pub fn with_table(self, table: Table) -> Self {
        self.with_namespaced_table(DEFAULT_NAMESPACE, table)
    }

    pub fn with_namespaced_table(mut self, namespace: &str, table: Table) -> Self {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(table.name.clone(), Arc::new(table));
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, datatype: DataType) -> Self {
        self.variables.insert(name.into(), datatype);
        self
    }

    pub fn with_object<'a>(
        mut self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (&'a str, DataType)>,
    ) -> Self {
        let fields = fields
            .into_iter()
            .map(|(name, datatype)| (name.to_string(), datatype))
            .collect();
        self.objects.insert(name.into(), fields);
        self
    }
}

impl Catalog for MemoryCatalog {
    fn lookup_table(&self, namespace: Option<&str>, name: &str) -> Option<Arc<Table>> {
        self.namespaces
            .get(namespace.unwrap_or(DEFAULT_NAMESPACE))?
            .get(name)
            .cloned()
    }

    fn lookup_variable(&self, name: &str) -> Option<DataType> {
        self.variables.get(name).cloned()
    }

    fn lookup_object_fields(&self, name: &str) -> Option<IndexMap<String, DataType>> {
        self.objects.get(name).cloned()
    }
}
