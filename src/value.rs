use std::fmt;

use crate::query::Q;

/// SQL type used when binding a null.
///
/// MySQL only needs a type hint for nulls; non-null values carry their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SqlType {
    /// Variable-length character data. The default for untyped nulls.
    #[default]
    Varchar,
    Boolean,
    BigInt,
    UnsignedBigInt,
    Double,
    Blob,
}

impl SqlType {
    /// Parses the lowercase name used in configuration (`varchar`, `bigint`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "varchar" | "text" => Some(SqlType::Varchar),
            "boolean" | "bool" => Some(SqlType::Boolean),
            "bigint" | "int" | "integer" => Some(SqlType::BigInt),
            "unsigned" | "unsigned_bigint" => Some(SqlType::UnsignedBigInt),
            "double" | "float" => Some(SqlType::Double),
            "blob" | "binary" => Some(SqlType::Blob),
            _ => None,
        }
    }
}

/// A value bound to a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A null carrying the SQL type it is bound as
    Null(SqlType),
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    /// Appends this value to a query as the next positional argument.
    pub(crate) fn bind_to<'q>(self, q: Q<'q>) -> Q<'q> {
        match self {
            Value::Null(SqlType::Varchar) => q.bind(None::<String>),
            Value::Null(SqlType::Boolean) => q.bind(None::<bool>),
            Value::Null(SqlType::BigInt) => q.bind(None::<i64>),
            Value::Null(SqlType::UnsignedBigInt) => q.bind(None::<u64>),
            Value::Null(SqlType::Double) => q.bind(None::<f64>),
            Value::Null(SqlType::Blob) => q.bind(None::<Vec<u8>>),
            Value::Bool(v) => q.bind(v),
            Value::Int(v) => q.bind(v),
            Value::UInt(v) => q.bind(v),
            Value::Float(v) => q.bind(v),
            Value::Text(v) => q.bind(v),
            Value::Bytes(v) => q.bind(v),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null(_) => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "'{v}'"),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

/// Rust types with a fixed SQL type, used to type the null of an `Option`.
pub trait SqlTyped {
    const SQL_TYPE: SqlType;
}

macro_rules! impl_value_from {
    ($variant:ident, $sql_type:ident, $target:ty: $($t:ty),+) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(<$target>::from(v))
                }
            }

            impl SqlTyped for $t {
                const SQL_TYPE: SqlType = SqlType::$sql_type;
            }
        )+
    };
}

impl_value_from!(Int, BigInt, i64: i8, i16, i32, i64);
impl_value_from!(UInt, UnsignedBigInt, u64: u8, u16, u32, u64);
impl_value_from!(Float, Double, f64: f32, f64);
impl_value_from!(Bool, Boolean, bool: bool);
impl_value_from!(Text, Varchar, String: String, &str);
impl_value_from!(Bytes, Blob, Vec<u8>: Vec<u8>, &[u8]);

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl SqlTyped for &String {
    const SQL_TYPE: SqlType = SqlType::Varchar;
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value> + SqlTyped,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null(T::SQL_TYPE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_primitives() {
        assert_eq!(Value::from(2010), Value::Int(2010));
        assert_eq!(Value::from(7u8), Value::UInt(7));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("abc"), Value::Text("abc".into()));
        assert_eq!(Value::from(vec![1u8, 2]), Value::Bytes(vec![1, 2]));
        assert_eq!(Value::from(1.5f32), Value::Float(1.5));
    }

    #[test]
    fn test_none_is_typed_null() {
        assert_eq!(Value::from(None::<i32>), Value::Null(SqlType::BigInt));
        assert_eq!(Value::from(None::<String>), Value::Null(SqlType::Varchar));
        assert_eq!(Value::from(Some(3i64)), Value::Int(3));
        assert!(Value::from(None::<bool>).is_null());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(10).to_string(), "10");
        assert_eq!(Value::Text("x".into()).to_string(), "'x'");
        assert_eq!(Value::Null(SqlType::Varchar).to_string(), "null");
        assert_eq!(Value::Bytes(vec![0; 3]).to_string(), "<3 bytes>");
    }

    #[test]
    fn test_sql_type_from_name() {
        assert_eq!(SqlType::from_name("VARCHAR"), Some(SqlType::Varchar));
        assert_eq!(SqlType::from_name(" bigint "), Some(SqlType::BigInt));
        assert_eq!(SqlType::from_name("geometry"), None);
        assert_eq!(SqlType::default(), SqlType::Varchar);
    }
}
