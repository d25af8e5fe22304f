//! Runtime values for statement parameters and result rows.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type};

type BoxError = Box<dyn StdError + Sync + Send>;

/// A runtime SQL value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    /// INTEGER / SMALLINT
    I32(i32),
    /// BIGINT, OID
    I64(i64),
    /// REAL / DOUBLE PRECISION
    F64(f64),
    /// NUMERIC / DECIMAL
    Decimal(Decimal),
    /// TEXT, VARCHAR
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of the value, for ids read back from the store.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            Value::Decimal(d) if d.fract().is_zero() => d.to_i64(),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::I32(v) => Some(Decimal::from(*v)),
            Value::I64(v) => Some(Decimal::from(*v)),
            Value::Decimal(d) => Some(*d),
            Value::F64(v) => Decimal::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// A result row: column name to value, in select order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    /// Field lookup by output column name.
    ///
    /// `None` means the row has no such column; SQL NULL is `Some(&Value::Null)`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    /// Like [`Row::get`], with absence folded into `Value::Null`.
    pub fn get_or_null(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or(Value::Null)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.columns.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Column bytes left undecoded until the column type has been resolved.
struct RawColumn<'a>(&'a [u8]);

impl<'a> FromSql<'a> for RawColumn<'a> {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        Ok(RawColumn(raw))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// Convert a tokio_postgres row into a [`Row`], decoding by column type.
///
/// Booleans, integers (including OID), floats, NUMERIC and the character
/// types are supported, as are domains over any of them. Other types (dates,
/// timestamps, arrays, ...) are an error; cast them to `text` in the query.
pub fn pg_row_to_row(pg_row: &tokio_postgres::Row) -> Result<Row, BoxError> {
    let mut columns = Vec::with_capacity(pg_row.len());

    for (idx, column) in pg_row.columns().iter().enumerate() {
        let value = match pg_row.try_get::<_, Option<RawColumn>>(idx)? {
            Some(RawColumn(raw)) => decode_column(column.type_(), raw)
                .map_err(|e| format!("column {}: {}", column.name(), e))?,
            None => Value::Null,
        };

        columns.push((column.name().to_string(), value));
    }

    Ok(Row::new(columns))
}

/// Decode one non-null column value in binary format.
pub fn decode_column(ty: &Type, raw: &[u8]) -> Result<Value, BoxError> {
    if let Kind::Domain(base) = ty.kind() {
        return decode_column(base, raw);
    }

    let value = if *ty == Type::BOOL {
        Value::Bool(bool::from_sql(ty, raw)?)
    } else if *ty == Type::INT2 {
        Value::I32(i32::from(i16::from_sql(ty, raw)?))
    } else if *ty == Type::INT4 {
        Value::I32(i32::from_sql(ty, raw)?)
    } else if *ty == Type::INT8 {
        Value::I64(i64::from_sql(ty, raw)?)
    } else if *ty == Type::OID {
        Value::I64(i64::from(u32::from_sql(ty, raw)?))
    } else if *ty == Type::FLOAT4 {
        Value::F64(f64::from(f32::from_sql(ty, raw)?))
    } else if *ty == Type::FLOAT8 {
        Value::F64(f64::from_sql(ty, raw)?)
    } else if *ty == Type::NUMERIC {
        Value::Decimal(Decimal::from_sql(ty, raw)?)
    } else if matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    ) {
        Value::String(std::str::from_utf8(raw)?.to_string())
    } else {
        return Err(format!("unsupported column type {}", ty).into());
    };

    Ok(value)
}

/// Wrapper to bind a [`Value`] as a statement parameter.
///
/// Integers are widened or narrowed to the parameter type the server inferred,
/// and integers bound to NUMERIC parameters are sent as decimals.
#[derive(Debug)]
pub struct SqlParam<'a>(pub &'a Value);

impl ToSql for SqlParam<'_> {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, BoxError> {
        match self.0 {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::I32(v) => integer_to_sql(i64::from(*v), ty, out),
            Value::I64(v) => integer_to_sql(*v, ty, out),
            Value::F64(v) => float_to_sql(*v, ty, out),
            Value::Decimal(v) => v.to_sql(ty, out),
            Value::String(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::BOOL
                | Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::OID
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::NUMERIC
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
        )
    }

    tokio_postgres::types::to_sql_checked!();
}

fn integer_to_sql(v: i64, ty: &Type, out: &mut bytes::BytesMut) -> Result<IsNull, BoxError> {
    if *ty == Type::INT2 {
        i16::try_from(v)?.to_sql(ty, out)
    } else if *ty == Type::INT4 {
        i32::try_from(v)?.to_sql(ty, out)
    } else if *ty == Type::OID {
        u32::try_from(v)?.to_sql(ty, out)
    } else if *ty == Type::FLOAT8 {
        (v as f64).to_sql(ty, out)
    } else if *ty == Type::NUMERIC {
        Decimal::from(v).to_sql(ty, out)
    } else {
        v.to_sql(ty, out)
    }
}

fn float_to_sql(v: f64, ty: &Type, out: &mut bytes::BytesMut) -> Result<IsNull, BoxError> {
    if *ty == Type::FLOAT4 {
        (v as f32).to_sql(ty, out)
    } else if *ty == Type::NUMERIC {
        Decimal::try_from(v)?.to_sql(ty, out)
    } else {
        v.to_sql(ty, out)
    }
}

/// Borrow a slice of values as driver parameters.
pub fn as_params(values: &[Value]) -> Vec<SqlParam<'_>> {
    values.iter().map(SqlParam).collect()
}
