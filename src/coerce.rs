//! Conversion of literal property values into the type expected by a setter.
//!
//! Every value setter declares a [TypeTag] through its [Coercible] parameter type.
//! Primitive tags parse the literal with the lexical rules of the matching Rust type,
//! while [TypeTag::Text] hands the literal over untouched.

use std::fmt;
use thiserror::Error;

/// Target type of a value setter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
    /// Plain text: never parsed
    Text,
}

impl TypeTag {
    /// Primitive tags go through [coerce], text bypasses it.
    pub fn is_primitive(self) -> bool {
        !matches!(self, TypeTag::Text)
    }

    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Bool => "bool",
            TypeTag::Char => "char",
            TypeTag::I8 => "i8",
            TypeTag::I16 => "i16",
            TypeTag::I32 => "i32",
            TypeTag::I64 => "i64",
            TypeTag::I128 => "i128",
            TypeTag::Isize => "isize",
            TypeTag::U8 => "u8",
            TypeTag::U16 => "u16",
            TypeTag::U32 => "u32",
            TypeTag::U64 => "u64",
            TypeTag::U128 => "u128",
            TypeTag::Usize => "usize",
            TypeTag::F32 => "f32",
            TypeTag::F64 => "f64",
            TypeTag::Text => "String",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A literal after coercion, ready to be handed to a setter
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    Usize(usize),
    F32(f32),
    F64(f64),
    Text(String),
}

impl Value {
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Bool(_) => TypeTag::Bool,
            Value::Char(_) => TypeTag::Char,
            Value::I8(_) => TypeTag::I8,
            Value::I16(_) => TypeTag::I16,
            Value::I32(_) => TypeTag::I32,
            Value::I64(_) => TypeTag::I64,
            Value::I128(_) => TypeTag::I128,
            Value::Isize(_) => TypeTag::Isize,
            Value::U8(_) => TypeTag::U8,
            Value::U16(_) => TypeTag::U16,
            Value::U32(_) => TypeTag::U32,
            Value::U64(_) => TypeTag::U64,
            Value::U128(_) => TypeTag::U128,
            Value::Usize(_) => TypeTag::Usize,
            Value::F32(_) => TypeTag::F32,
            Value::F64(_) => TypeTag::F64,
            Value::Text(_) => TypeTag::Text,
        }
    }
}

/// The literal is not a valid lexical form for the requested type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot convert {literal:?} to {target}: {reason}")]
pub struct CoercionError {
    pub literal: String,
    pub target: TypeTag,
    pub reason: String,
}

fn parse<T>(literal: &str, target: TypeTag, wrap: fn(T) -> Value) -> Result<Value, CoercionError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    literal.parse::<T>().map(wrap).map_err(|e| CoercionError {
        literal: literal.to_string(),
        target,
        reason: e.to_string(),
    })
}

/// Float parsing saturates to infinity: overflow is rejected unless infinity or NaN was spelled out.
fn parse_float<T>(
    literal: &str,
    target: TypeTag,
    wrap: fn(T) -> Value,
    is_finite: fn(T) -> bool,
) -> Result<Value, CoercionError>
where
    T: std::str::FromStr + Copy,
    T::Err: fmt::Display,
{
    let value = literal.parse::<T>().map_err(|e| CoercionError {
        literal: literal.to_string(),
        target,
        reason: e.to_string(),
    })?;
    let unsigned = literal.trim_start_matches(['+', '-']).to_ascii_lowercase();
    let explicit = matches!(unsigned.as_str(), "inf" | "infinity" | "nan");
    if !is_finite(value) && !explicit {
        return Err(CoercionError {
            literal: literal.to_string(),
            target,
            reason: "number out of range".to_string(),
        });
    }
    Ok(wrap(value))
}

/// Convert a literal into the representation selected by the tag.
///
/// [TypeTag::Text] always succeeds and returns the literal unchanged.
pub fn coerce(literal: &str, target: TypeTag) -> Result<Value, CoercionError> {
    match target {
        TypeTag::Bool => parse(literal, target, Value::Bool),
        TypeTag::Char => parse(literal, target, Value::Char),
        TypeTag::I8 => parse(literal, target, Value::I8),
        TypeTag::I16 => parse(literal, target, Value::I16),
        TypeTag::I32 => parse(literal, target, Value::I32),
        TypeTag::I64 => parse(literal, target, Value::I64),
        TypeTag::I128 => parse(literal, target, Value::I128),
        TypeTag::Isize => parse(literal, target, Value::Isize),
        TypeTag::U8 => parse(literal, target, Value::U8),
        TypeTag::U16 => parse(literal, target, Value::U16),
        TypeTag::U32 => parse(literal, target, Value::U32),
        TypeTag::U64 => parse(literal, target, Value::U64),
        TypeTag::U128 => parse(literal, target, Value::U128),
        TypeTag::Usize => parse(literal, target, Value::Usize),
        TypeTag::F32 => parse_float(literal, target, Value::F32, f32::is_finite),
        TypeTag::F64 => parse_float(literal, target, Value::F64, f64::is_finite),
        TypeTag::Text => Ok(Value::Text(literal.to_string())),
    }
}

/// A setter parameter type that can be produced from a [Value]
pub trait Coercible: Sized + 'static {
    const TAG: TypeTag;

    /// Unbox the value, or give it back if it holds another type
    fn from_value(value: Value) -> Result<Self, Value>;
}

macro_rules! coercible {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
        impl Coercible for $ty {
            const TAG: TypeTag = TypeTag::$variant;

            fn from_value(value: Value) -> Result<Self, Value> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(other),
                }
            }
        }
        )*
    };
}

coercible! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    String => Text,
}
