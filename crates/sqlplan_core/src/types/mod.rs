pub mod datatype;
pub mod relation;
pub mod scalar;

pub use datatype::{DataType, DecimalTypeMeta, TypeName};
pub use relation::{Field, Relation};
pub use scalar::ScalarValue;
