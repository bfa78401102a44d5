//! Built-in function definitions.
//!
//! Each definition validates argument types and computes the return type.
//! Nothing here evaluates functions.

use std::sync::LazyLock;

use hashbrown::HashMap;
use sqlplan_error::{PlanError, Result};

use crate::types::{DataType, DecimalTypeMeta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Scalar,
    Aggregate,
    /// Only valid with an OVER clause.
    Window,
}

pub struct FunctionDefinition {
    pub name: &'static str,
    pub kind: FunctionKind,
    validate: fn(&'static str, &[DataType]) -> Result<DataType>,
}

impl FunctionDefinition {
    const fn new(
        name: &'static str,
        kind: FunctionKind,
        validate: fn(&'static str, &[DataType]) -> Result<DataType>,
    ) -> Self {
        FunctionDefinition {
            name,
            kind,
            validate,
        }
    }

    /// Check the argument types and return the function's output type.
    pub fn return_type(&self, args: &[DataType]) -> Result<DataType> {
        (self.validate)(self.name, args)
    }

    pub fn is_aggregate(&self) -> bool {
        self.kind == FunctionKind::Aggregate
    }
}

impl std::fmt::Debug for FunctionDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionDefinition")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Look up a built-in function by lowercased name.
pub fn find_function(name: &str) -> Option<&'static FunctionDefinition> {
    BUILTIN_FUNCTIONS.get(name)
}

static BUILTIN_FUNCTIONS: LazyLock<HashMap<&'static str, FunctionDefinition>> =
    LazyLock::new(|| {
        use FunctionKind::*;

        let defs = [
            // Scalar
            FunctionDefinition::new("abs", Scalar, numeric_identity),
            FunctionDefinition::new("length", Scalar, text_to_int),
            FunctionDefinition::new("char_length", Scalar, text_to_int),
            FunctionDefinition::new("character_length", Scalar, text_to_int),
            FunctionDefinition::new("bit_length", Scalar, text_to_int),
            FunctionDefinition::new("octet_length", Scalar, text_to_int),
            FunctionDefinition::new("lower", Scalar, text_to_text),
            FunctionDefinition::new("upper", Scalar, text_to_text),
            FunctionDefinition::new("trim", Scalar, trim),
            FunctionDefinition::new("ltrim", Scalar, trim),
            FunctionDefinition::new("rtrim", Scalar, trim),
            FunctionDefinition::new("lpad", Scalar, pad),
            FunctionDefinition::new("rpad", Scalar, pad),
            FunctionDefinition::new("substring", Scalar, substring),
            FunctionDefinition::new("position", Scalar, position),
            FunctionDefinition::new("overlay", Scalar, overlay),
            FunctionDefinition::new("format", Scalar, format),
            FunctionDefinition::new("coalesce", Scalar, coalesce),
            FunctionDefinition::new("array_length", Scalar, array_length),
            FunctionDefinition::new("array_append", Scalar, array_append),
            FunctionDefinition::new("array_prepend", Scalar, array_prepend),
            FunctionDefinition::new("array_cat", Scalar, array_cat),
            FunctionDefinition::new("encode", Scalar, encode),
            FunctionDefinition::new("decode", Scalar, decode),
            FunctionDefinition::new("digest", Scalar, digest),
            FunctionDefinition::new("uuid_generate_v5", Scalar, uuid_generate_v5),
            FunctionDefinition::new("parse_unix_timestamp", Scalar, parse_unix_timestamp),
            FunctionDefinition::new("format_unix_timestamp", Scalar, format_unix_timestamp),
            FunctionDefinition::new("error", Scalar, message),
            FunctionDefinition::new("notice", Scalar, message),
            // Aggregate
            FunctionDefinition::new("count", Aggregate, count),
            FunctionDefinition::new("sum", Aggregate, sum),
            FunctionDefinition::new("avg", Aggregate, avg),
            FunctionDefinition::new("min", Aggregate, min_max),
            FunctionDefinition::new("max", Aggregate, min_max),
            FunctionDefinition::new("array_agg", Aggregate, array_agg),
            FunctionDefinition::new("bool_and", Aggregate, bool_agg),
            FunctionDefinition::new("bool_or", Aggregate, bool_agg),
            // Window
            FunctionDefinition::new("row_number", Window, ranking),
            FunctionDefinition::new("rank", Window, ranking),
            FunctionDefinition::new("dense_rank", Window, ranking),
        ];

        let mut map = HashMap::with_capacity(defs.len());
        for def in defs {
            if map.insert(def.name, def).is_some() {
                panic!("Duplicate function definition");
            }
        }
        map
    });

/// Scale used for `avg` results and unix timestamps.
const AVG_SCALE: u16 = 16;

fn arity(name: &str, args: &[DataType], min: usize, max: usize) -> Result<()> {
    if args.len() < min || args.len() > max {
        return Err(PlanError::WrongArity {
            context: format!("function {name}"),
            expected: if args.len() < min { min } else { max },
            got: args.len(),
        });
    }
    Ok(())
}

fn expect_type(name: &str, pos: usize, got: &DataType, want: &DataType) -> Result<()> {
    if !got.is_compatible(want) {
        return Err(PlanError::type_mismatch(format!(
            "argument {} of {name}: expected {want}, got {got}",
            pos + 1
        )));
    }
    Ok(())
}

fn expect_numeric(name: &str, pos: usize, got: &DataType) -> Result<()> {
    if !got.is_numeric() && !got.is_null() {
        return Err(PlanError::type_mismatch(format!(
            "argument {} of {name}: expected numeric, got {got}",
            pos + 1
        )));
    }
    Ok(())
}

fn expect_array(name: &str, pos: usize, got: &DataType) -> Result<()> {
    if !got.is_array() && !got.is_null() {
        return Err(PlanError::type_mismatch(format!(
            "argument {} of {name}: expected array, got {got}",
            pos + 1
        )));
    }
    Ok(())
}

fn numeric_identity(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 1, 1)?;
    expect_numeric(name, 0, &args[0])?;
    Ok(args[0].clone())
}

fn text_to_int(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 1, 1)?;
    expect_type(name, 0, &args[0], &DataType::Text)?;
    Ok(DataType::Int8)
}

fn text_to_text(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 1, 1)?;
    expect_type(name, 0, &args[0], &DataType::Text)?;
    Ok(DataType::Text)
}

fn trim(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 1, 2)?;
    for (pos, arg) in args.iter().enumerate() {
        expect_type(name, pos, arg, &DataType::Text)?;
    }
    Ok(DataType::Text)
}

fn pad(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 2, 3)?;
    expect_type(name, 0, &args[0], &DataType::Text)?;
    expect_type(name, 1, &args[1], &DataType::Int8)?;
    if let Some(fill) = args.get(2) {
        expect_type(name, 2, fill, &DataType::Text)?;
    }
    Ok(DataType::Text)
}

fn substring(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 2, 3)?;
    expect_type(name, 0, &args[0], &DataType::Text)?;
    for (pos, arg) in args.iter().enumerate().skip(1) {
        expect_type(name, pos, arg, &DataType::Int8)?;
    }
    Ok(DataType::Text)
}

fn position(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 2, 2)?;
    expect_type(name, 0, &args[0], &DataType::Text)?;
    expect_type(name, 1, &args[1], &DataType::Text)?;
    Ok(DataType::Int8)
}

fn overlay(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 3, 4)?;
    expect_type(name, 0, &args[0], &DataType::Text)?;
    expect_type(name, 1, &args[1], &DataType::Text)?;
    for (pos, arg) in args.iter().enumerate().skip(2) {
        expect_type(name, pos, arg, &DataType::Int8)?;
    }
    Ok(DataType::Text)
}

fn format(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 1, usize::MAX)?;
    expect_type(name, 0, &args[0], &DataType::Text)?;
    Ok(DataType::Text)
}

fn coalesce(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 1, usize::MAX)?;
    let mut out = DataType::Null;
    for (pos, arg) in args.iter().enumerate() {
        expect_type(name, pos, arg, &out)?;
        out = out.unify(arg);
    }
    Ok(out)
}

fn array_length(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 1, 1)?;
    expect_array(name, 0, &args[0])?;
    Ok(DataType::Int8)
}

fn array_append(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 2, 2)?;
    expect_array(name, 0, &args[0])?;
    if let Some(elem) = args[0].element_type() {
        expect_type(name, 1, &args[1], elem)?;
    }
    Ok(args[0].unify(&DataType::array(args[1].clone())))
}

fn array_prepend(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 2, 2)?;
    expect_array(name, 1, &args[1])?;
    if let Some(elem) = args[1].element_type() {
        expect_type(name, 0, &args[0], elem)?;
    }
    Ok(args[1].unify(&DataType::array(args[0].clone())))
}

fn array_cat(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 2, 2)?;
    expect_array(name, 0, &args[0])?;
    expect_array(name, 1, &args[1])?;
    expect_type(name, 1, &args[1], &args[0])?;
    Ok(args[0].unify(&args[1]))
}

fn encode(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 2, 2)?;
    expect_type(name, 0, &args[0], &DataType::Bytea)?;
    expect_type(name, 1, &args[1], &DataType::Text)?;
    Ok(DataType::Text)
}

fn decode(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 2, 2)?;
    expect_type(name, 0, &args[0], &DataType::Text)?;
    expect_type(name, 1, &args[1], &DataType::Text)?;
    Ok(DataType::Bytea)
}

fn digest(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 2, 2)?;
    if !matches!(args[0], DataType::Text | DataType::Bytea | DataType::Null) {
        return Err(PlanError::type_mismatch(format!(
            "argument 1 of {name}: expected text or bytea, got {}",
            args[0]
        )));
    }
    expect_type(name, 1, &args[1], &DataType::Text)?;
    Ok(DataType::Bytea)
}

fn uuid_generate_v5(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 2, 2)?;
    expect_type(name, 0, &args[0], &DataType::Uuid)?;
    expect_type(name, 1, &args[1], &DataType::Text)?;
    Ok(DataType::Uuid)
}

fn unix_timestamp_type() -> DataType {
    DataType::Decimal(DecimalTypeMeta {
        precision: 16,
        scale: 6,
    })
}

fn parse_unix_timestamp(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 2, 2)?;
    expect_type(name, 0, &args[0], &DataType::Text)?;
    expect_type(name, 1, &args[1], &DataType::Text)?;
    Ok(unix_timestamp_type())
}

fn format_unix_timestamp(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 2, 2)?;
    expect_type(name, 0, &args[0], &unix_timestamp_type())?;
    expect_type(name, 1, &args[1], &DataType::Text)?;
    Ok(DataType::Text)
}

fn message(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 1, 1)?;
    expect_type(name, 0, &args[0], &DataType::Text)?;
    Ok(DataType::Null)
}

fn count(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 0, 1)?;
    Ok(DataType::Int8)
}

fn sum(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 1, 1)?;
    expect_numeric(name, 0, &args[0])?;
    match &args[0] {
        DataType::Decimal(meta) => Ok(DataType::Decimal(DecimalTypeMeta {
            precision: crate::types::datatype::MAX_DECIMAL_PRECISION,
            scale: meta.scale,
        })),
        _ => Ok(DataType::sum_int_result()),
    }
}

fn avg(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 1, 1)?;
    expect_numeric(name, 0, &args[0])?;
    Ok(DataType::Decimal(DecimalTypeMeta {
        precision: crate::types::datatype::MAX_DECIMAL_PRECISION,
        scale: AVG_SCALE,
    }))
}

fn min_max(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 1, 1)?;
    if !args[0].is_numeric() && !args[0].is_compatible(&DataType::Text) {
        return Err(PlanError::type_mismatch(format!(
            "argument 1 of {name}: expected numeric or text, got {}",
            args[0]
        )));
    }
    Ok(args[0].clone())
}

fn array_agg(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 1, 1)?;
    if args[0].is_array() {
        return Err(PlanError::type_mismatch(format!(
            "{name} does not accept array arguments"
        )));
    }
    Ok(DataType::array(args[0].clone()))
}

fn bool_agg(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 1, 1)?;
    expect_type(name, 0, &args[0], &DataType::Bool)?;
    Ok(DataType::Bool)
}

fn ranking(name: &'static str, args: &[DataType]) -> Result<DataType> {
    arity(name, args, 0, 0)?;
    Ok(DataType::Int8)
}
