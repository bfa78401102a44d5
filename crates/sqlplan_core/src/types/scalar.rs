use std::fmt;

use serde::{Deserialize, Serialize};
use sqlplan_error::{PlanError, Result};

use super::datatype::{DataType, DecimalTypeMeta, MAX_DECIMAL_PRECISION};

/// A literal value appearing in a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int8(i64),
    Text(String),
    Bytea(Vec<u8>),
    /// Decimal literal kept in its written form.
    Decimal { repr: String, meta: DecimalTypeMeta },
}

impl ScalarValue {
    /// Parse a decimal literal such as `12.50`.
    ///
    /// Precision and scale are taken from the digits as written.
    pub fn decimal_from_str(s: &str) -> Result<Self> {
        let (neg, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if (int_part.is_empty() && frac_part.is_empty())
            || !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(PlanError::Syntax(format!("invalid decimal literal \"{s}\"")));
        }

        let int_part = int_part.trim_start_matches('0');
        let scale = frac_part.len();
        let precision = (int_part.len() + scale).max(1);
        if precision > MAX_DECIMAL_PRECISION as usize {
            return Err(PlanError::Syntax(format!("decimal literal \"{s}\" is too large")));
        }

        let mut repr = String::new();
        if neg {
            repr.push('-');
        }
        repr.push_str(if int_part.is_empty() { "0" } else { int_part });
        if !frac_part.is_empty() {
            repr.push('.');
            repr.push_str(frac_part);
        }

        Ok(ScalarValue::Decimal {
            repr,
            meta: DecimalTypeMeta::try_new(precision as u16, scale as u16)?,
        })
    }

    pub fn datatype(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Bool(_) => DataType::Bool,
            Self::Int8(_) => DataType::Int8,
            Self::Text(_) => DataType::Text,
            Self::Bytea(_) => DataType::Bytea,
            Self::Decimal { meta, .. } => DataType::Decimal(*meta),
        }
    }

    pub fn try_as_bool(&self) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(PlanError::type_mismatch(format!(
                "expected bool, got {}",
                other.datatype()
            ))),
        }
    }

    pub fn try_as_str(&self) -> Result<&str> {
        match self {
            Self::Text(s) => Ok(s),
            other => Err(PlanError::type_mismatch(format!(
                "expected text, got {}",
                other.datatype()
            ))),
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int8(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => ScalarValue::Null,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Bytea(bytes) => {
                write!(f, "0x")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Self::Decimal { repr, .. } => write!(f, "{repr}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_literal_meta() {
        let v = ScalarValue::decimal_from_str("012.50").unwrap();
        assert_eq!(DataType::Decimal(DecimalTypeMeta { precision: 4, scale: 2 }), v.datatype());
        assert_eq!("12.50", v.to_string());

        let v = ScalarValue::decimal_from_str("-0.5").unwrap();
        assert_eq!("-0.5", v.to_string());

        assert!(ScalarValue::decimal_from_str("1.2.3").is_err());
        assert!(ScalarValue::decimal_from_str(".").is_err());
    }

    #[test]
    fn display() {
        assert_eq!("'it''s'", ScalarValue::from("it's").to_string());
        assert_eq!("NULL", ScalarValue::Null.to_string());
        assert_eq!("0x0aff", ScalarValue::Bytea(vec![10, 255]).to_string());
    }
}
