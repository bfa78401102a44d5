use std::fmt;

use serde::{Deserialize, Serialize};

/// A single line in a plan dump.
///
/// Rendered as `name [annotation] [annotation]: detail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainEntry {
    /// Name of the node.
    pub name: String,
    /// Bracketed annotations following the name.
    pub annotations: Vec<String>,
    /// Text following the colon, if any.
    pub detail: Option<String>,
}

impl ExplainEntry {
    pub fn new(name: impl Into<String>) -> Self {
        ExplainEntry {
            name: name.into(),
            annotations: Vec::new(),
            detail: None,
        }
    }

    pub fn with_annotation(mut self, annotation: impl fmt::Display) -> Self {
        self.annotations.push(annotation.to_string());
        self
    }

    pub fn with_annotation_if(self, cond: bool, annotation: impl fmt::Display) -> Self {
        if cond {
            self.with_annotation(annotation)
        } else {
            self
        }
    }

    pub fn with_annotations<S: fmt::Display>(
        mut self,
        annotations: impl IntoIterator<Item = S>,
    ) -> Self {
        self.annotations
            .extend(annotations.into_iter().map(|a| a.to_string()));
        self
    }

    pub fn with_detail(mut self, detail: impl fmt::Display) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    /// Set the detail to a list of values joined with `sep`.
    ///
    /// An empty list leaves the detail unset.
    pub fn with_detail_values<S: fmt::Display>(
        mut self,
        values: impl IntoIterator<Item = S>,
        sep: &str,
    ) -> Self {
        let values: Vec<_> = values.into_iter().map(|v| v.to_string()).collect();
        if !values.is_empty() {
            self.detail = Some(values.join(sep));
        }
        self
    }
}

impl fmt::Display for ExplainEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for annotation in &self.annotations {
            write!(f, " [{annotation}]")?;
        }
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

/// Trait for explaining a single node in a plan.
pub trait Explainable {
    fn explain_entry(&self) -> ExplainEntry;
}

/// Formats values separated by a delimiter.
#[derive(Debug)]
pub struct DisplayJoin<'a, T>(pub &'a [T], pub &'a str);

impl<T: fmt::Display> fmt::Display for DisplayJoin<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, item) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, "{}", self.1)?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}
