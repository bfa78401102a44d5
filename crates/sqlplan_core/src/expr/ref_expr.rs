use std::fmt;

use serde::{Deserialize, Serialize};

use super::Expression;
use crate::types::{DataType, Field};

/// Identifier of a group key, aggregate or window result.
///
/// Rendered as letters: `A`..`Z`, then `AA`, `AB`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RefId(pub u32);

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut n = self.0 as u64 + 1;
        let mut letters = Vec::new();
        while n > 0 {
            n -= 1;
            letters.push(char::from(b'A' + (n % 26) as u8));
            n /= 26;
        }
        let s: String = letters.into_iter().rev().collect();
        write!(f, "{s}")
    }
}

/// Reference to a value computed by an aggregate or window node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceExpr {
    pub id: RefId,
    /// Output field of the referenced expression.
    pub field: Field,
}

impl ReferenceExpr {
    pub fn datatype(&self) -> DataType {
        self.field.datatype.clone()
    }
}

impl fmt::Display for ReferenceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{#ref({})}}", self.id)
    }
}

/// An expression computed by an aggregate or window node, bound to the id
/// other nodes reference it by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RefBinding {
    pub id: RefId,
    pub expr: Expression,
}

impl RefBinding {
    /// Reference expression pointing at this binding.
    pub fn reference(&self) -> ReferenceExpr {
        ReferenceExpr {
            id: self.id,
            field: self.expr.output_field(),
        }
    }
}

impl fmt::Display for RefBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{#ref({}) = {}}}", self.id, self.expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_id_letters() {
        assert_eq!("A", RefId(0).to_string());
        assert_eq!("Z", RefId(25).to_string());
        assert_eq!("AA", RefId(26).to_string());
        assert_eq!("AZ", RefId(51).to_string());
        assert_eq!("BA", RefId(52).to_string());
        assert_eq!("ZZ", RefId(701).to_string());
        assert_eq!("AAA", RefId(702).to_string());
    }
}
