use std::fmt;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use sqlplan_error::{PlanError, Result};

use super::datatype::DataType;

/// Minimum similarity for a column to be suggested in an error.
const SUGGESTION_THRESHOLD: f64 = 0.7;

/// A single named and typed column of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Qualifier (table name or alias). None for computed and aliased
    /// columns.
    pub relation: Option<String>,
    /// Column name. Empty for anonymous expressions.
    pub name: String,
    pub datatype: DataType,
    pub nullable: bool,
}

impl Field {
    pub fn new(relation: Option<String>, name: impl Into<String>, datatype: DataType) -> Self {
        Field {
            relation,
            name: name.into(),
            datatype,
            nullable: true,
        }
    }

    pub fn anonymous(datatype: DataType) -> Self {
        Field::new(None, "", datatype)
    }

    pub fn with_relation(mut self, relation: Option<String>) -> Self {
        self.relation = relation;
        self
    }

    /// Name used for this field in a statement's output.
    pub fn output_name(&self) -> &str {
        if self.name.is_empty() {
            "?column?"
        } else {
            &self.name
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.relation {
            Some(rel) => write!(f, "{rel}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Ordered list of fields produced by a plan node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub fields: Vec<Field>,
}

impl Relation {
    pub const fn empty() -> Self {
        Relation { fields: Vec::new() }
    }

    pub fn new(fields: Vec<Field>) -> Self {
        Relation { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Concatenate two relations.
    pub fn join(&self, other: &Relation) -> Relation {
        let mut fields = self.fields.clone();
        fields.extend(other.fields.iter().cloned());
        Relation { fields }
    }

    /// Concatenate two relations, skipping fields from `other` whose
    /// qualifier and name already appear.
    pub fn join_unique(&self, other: &Relation) -> Relation {
        let mut fields = self.fields.clone();
        for field in &other.fields {
            let exists = fields
                .iter()
                .any(|f| f.relation == field.relation && f.name == field.name);
            if !exists {
                fields.push(field.clone());
            }
        }
        Relation { fields }
    }

    /// Replace every field's qualifier.
    pub fn requalify(&self, relation: Option<&str>) -> Relation {
        Relation {
            fields: self
                .fields
                .iter()
                .map(|f| f.clone().with_relation(relation.map(|r| r.to_string())))
                .collect(),
        }
    }

    /// Fields belonging to the given qualifier.
    pub fn fields_for<'a>(&'a self, relation: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields
            .iter()
            .filter(move |f| f.relation.as_deref() == Some(relation))
    }

    pub fn has_qualifier(&self, relation: &str) -> bool {
        self.fields_for(relation).next().is_some()
    }

    /// Distinct qualifiers of this relation.
    pub fn qualifiers(&self) -> HashSet<String> {
        self.fields.iter().filter_map(|f| f.relation.clone()).collect()
    }

    /// Find a field by optional qualifier and name.
    ///
    /// Returns `Ok(None)` if nothing matches. Errors if more than one field
    /// matches.
    pub fn find(&self, relation: Option<&str>, name: &str) -> Result<Option<(usize, &Field)>> {
        let mut found: Option<(usize, &Field)> = None;
        for (idx, field) in self.fields.iter().enumerate() {
            if field.name != name {
                continue;
            }
            if let Some(rel) = relation {
                if field.relation.as_deref() != Some(rel) {
                    continue;
                }
            }
            if found.is_some() {
                return Err(PlanError::AmbiguousColumn {
                    column: display_column(relation, name),
                });
            }
            found = Some((idx, field));
        }
        Ok(found)
    }

    /// Like [`Relation::find`], but errors if the column doesn't exist.
    pub fn search(&self, relation: Option<&str>, name: &str) -> Result<&Field> {
        match self.find(relation, name)? {
            Some((_, field)) => Ok(field),
            None => Err(self.column_not_found(relation, name)),
        }
    }

    /// Build a column-not-found error, suggesting the most similar visible
    /// column.
    pub fn column_not_found(&self, relation: Option<&str>, name: &str) -> PlanError {
        let target = display_column(relation, name);
        let suggestion = self
            .fields
            .iter()
            .filter(|f| !f.name.is_empty())
            .map(|f| {
                let candidate = if relation.is_some() {
                    f.to_string()
                } else {
                    f.name.clone()
                };
                let score = strsim::jaro(&target, &candidate);
                (candidate, score)
            })
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(candidate, _)| candidate);

        PlanError::ColumnNotFound {
            column: target,
            suggestion,
        }
    }

    /// Check that another relation has the same number of columns with
    /// compatible types.
    pub fn is_shape_compatible(&self, other: &Relation) -> bool {
        self.len() == other.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.datatype.is_compatible(&b.datatype))
    }
}

fn display_column(relation: Option<&str>, name: &str) -> String {
    match relation {
        Some(rel) => format!("{rel}.{name}"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Relation {
        Relation::new(vec![
            Field::new(Some("users".to_string()), "id", DataType::Uuid),
            Field::new(Some("users".to_string()), "name", DataType::Text),
            Field::new(Some("users".to_string()), "age", DataType::Int8),
        ])
    }

    #[test]
    fn search_qualified_and_unqualified() {
        let rel = users();
        assert_eq!(DataType::Text, rel.search(None, "name").unwrap().datatype);
        assert_eq!(DataType::Int8, rel.search(Some("users"), "age").unwrap().datatype);
        assert!(rel.search(Some("posts"), "age").is_err());
    }

    #[test]
    fn search_ambiguous() {
        let rel = users().join(&users().requalify(Some("u2")));
        let err = rel.search(None, "id").unwrap_err();
        assert_eq!(sqlplan_error::ErrorKind::AmbiguousColumn, err.kind());
        assert!(rel.search(Some("u2"), "id").is_ok());
    }

    #[test]
    fn search_suggests_similar() {
        let err = users().search(None, "nmae").unwrap_err();
        match err {
            PlanError::ColumnNotFound { suggestion, .. } => {
                assert_eq!(Some("name".to_string()), suggestion)
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = users().search(None, "wallet").unwrap_err();
        match err {
            PlanError::ColumnNotFound { suggestion, .. } => assert_eq!(None, suggestion),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn join_unique_skips_duplicates() {
        let out = Relation::new(vec![
            Field::new(Some("users".to_string()), "name", DataType::Text),
            Field::new(None, "total", DataType::Int8),
        ]);
        let joined = users().join_unique(&out);
        assert_eq!(4, joined.len());
        assert_eq!("total", joined.fields[3].name);
    }

    #[test]
    fn output_name_for_anonymous() {
        assert_eq!("?column?", Field::anonymous(DataType::Int8).output_name());
    }
}
