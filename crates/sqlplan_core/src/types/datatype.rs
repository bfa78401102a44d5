use std::fmt;

use serde::{Deserialize, Serialize};
use sqlplan_error::{PlanError, Result};

/// Largest precision a decimal may declare.
pub const MAX_DECIMAL_PRECISION: u16 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecimalTypeMeta {
    pub precision: u16,
    pub scale: u16,
}

impl DecimalTypeMeta {
    pub fn try_new(precision: u16, scale: u16) -> Result<Self> {
        if precision == 0 || precision > MAX_DECIMAL_PRECISION {
            return Err(PlanError::Syntax(format!(
                "decimal precision must be between 1 and {MAX_DECIMAL_PRECISION}, got {precision}"
            )));
        }
        if scale > precision {
            return Err(PlanError::Syntax(format!(
                "decimal scale {scale} cannot exceed precision {precision}"
            )));
        }
        Ok(DecimalTypeMeta { precision, scale })
    }
}

/// Type of a value flowing through a plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Type of an untyped NULL. Compatible with every other type.
    Null,
    Bool,
    Int8,
    Text,
    Uuid,
    Bytea,
    Decimal(DecimalTypeMeta),
    Array(Box<DataType>),
}

impl DataType {
    pub fn array(element: DataType) -> Self {
        DataType::Array(Box::new(element))
    }

    /// Decimal type used for the result of `sum` over integers.
    pub const fn sum_int_result() -> Self {
        DataType::Decimal(DecimalTypeMeta {
            precision: MAX_DECIMAL_PRECISION,
            scale: 0,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataType::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int8 | DataType::Decimal(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, DataType::Array(_))
    }

    pub fn element_type(&self) -> Option<&DataType> {
        match self {
            DataType::Array(inner) => Some(inner),
            _ => None,
        }
    }

    /// Type equality where NULL matches anything.
    ///
    /// Arrays compare their element types the same way.
    pub fn is_compatible(&self, other: &DataType) -> bool {
        match (self, other) {
            (DataType::Null, _) | (_, DataType::Null) => true,
            (DataType::Array(a), DataType::Array(b)) => a.is_compatible(b),
            (a, b) => a == b,
        }
    }

    /// Pick the non-null type out of two compatible types.
    pub fn unify(&self, other: &DataType) -> DataType {
        match self {
            DataType::Null => other.clone(),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool => write!(f, "bool"),
            Self::Int8 => write!(f, "int8"),
            Self::Text => write!(f, "text"),
            Self::Uuid => write!(f, "uuid"),
            Self::Bytea => write!(f, "bytea"),
            Self::Decimal(meta) => write!(f, "decimal({},{})", meta.precision, meta.scale),
            Self::Array(inner) => write!(f, "{inner}[]"),
        }
    }
}

/// Type as written in a statement, e.g. `integer[]` or `numeric(10, 2)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeName {
    pub name: String,
    pub metadata: Option<(u16, u16)>,
    /// Number of `[]` suffixes.
    pub array_dims: u8,
}

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        TypeName {
            name: name.into(),
            metadata: None,
            array_dims: 0,
        }
    }

    pub fn decimal(precision: u16, scale: u16) -> Self {
        TypeName {
            name: "decimal".to_string(),
            metadata: Some((precision, scale)),
            array_dims: 0,
        }
    }

    pub fn into_array(mut self) -> Self {
        self.array_dims += 1;
        self
    }

    /// Resolve aliases and validate the written type.
    pub fn resolve(&self) -> Result<DataType> {
        let name = self.name.to_lowercase();
        let base = match name.as_str() {
            "bool" | "boolean" => DataType::Bool,
            "int" | "int8" | "integer" | "bigint" => DataType::Int8,
            "text" | "string" => DataType::Text,
            "uuid" => DataType::Uuid,
            "bytea" | "blob" => DataType::Bytea,
            "decimal" | "numeric" => {
                let (precision, scale) = self.metadata.ok_or_else(|| {
                    PlanError::Syntax(format!("{name} requires a precision and scale"))
                })?;
                DataType::Decimal(DecimalTypeMeta::try_new(precision, scale)?)
            }
            other => return Err(PlanError::Syntax(format!("unknown type \"{other}\""))),
        };

        if self.metadata.is_some() && !matches!(base, DataType::Decimal(_)) {
            return Err(PlanError::Syntax(format!(
                "type {name} does not accept a precision"
            )));
        }

        match self.array_dims {
            0 => Ok(base),
            1 => Ok(DataType::array(base)),
            _ => Err(PlanError::Syntax(
                "nested array types are not supported".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_aliases() {
        assert_eq!(DataType::Int8, TypeName::new("integer").resolve().unwrap());
        assert_eq!(DataType::Int8, TypeName::new("INT").resolve().unwrap());
        assert_eq!(DataType::Bool, TypeName::new("boolean").resolve().unwrap());
        assert_eq!(DataType::Bytea, TypeName::new("blob").resolve().unwrap());
        assert_eq!(
            DataType::array(DataType::Text),
            TypeName::new("string").into_array().resolve().unwrap()
        );
    }

    #[test]
    fn decimal_bounds() {
        assert!(TypeName::decimal(10, 2).resolve().is_ok());
        assert!(TypeName::decimal(1000, 0).resolve().is_ok());
        assert!(TypeName::decimal(0, 0).resolve().is_err());
        assert!(TypeName::decimal(1001, 0).resolve().is_err());
        assert!(TypeName::decimal(4, 5).resolve().is_err());
        assert!(TypeName::new("numeric").resolve().is_err());
    }

    #[test]
    fn nested_arrays_rejected() {
        let name = TypeName::new("int8").into_array().into_array();
        assert!(name.resolve().is_err());
    }

    #[test]
    fn null_is_compatible() {
        assert!(DataType::Null.is_compatible(&DataType::Text));
        assert!(DataType::array(DataType::Null).is_compatible(&DataType::array(DataType::Int8)));
        assert!(!DataType::Int8.is_compatible(&DataType::Text));
        assert!(!DataType::Int8.is_compatible(&DataType::sum_int_result()));
    }

    #[test]
    fn display() {
        assert_eq!("decimal(1000,0)", DataType::sum_int_result().to_string());
        assert_eq!("uuid[]", DataType::array(DataType::Uuid).to_string());
    }
}
