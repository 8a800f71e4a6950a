//! Loosely-typed parameter values.
//!
//! Client input arrives as JSON, so a bound parameter can be any JSON scalar.
//! [`SqlValue`] keeps the scalar as-is and picks the Postgres wire encoding
//! from the parameter type the server inferred for its placeholder.

use bytes::{BufMut, BytesMut};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use tokio_postgres::types::{IsNull, ToSql, Type};

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;

/// A single bound parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// SQL NULL; always bound, never inlined.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Arrays and objects, bound as `json`/`jsonb`.
    Json(Value),
}

impl SqlValue {
    /// Convert a JSON value without any coercion.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            Value::String(s) => Self::Text(s),
            other @ (Value::Array(_) | Value::Object(_)) => Self::Json(other),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<Value> for SqlValue {
    fn from(value: Value) -> Self {
        Self::from_json(value)
    }
}

impl From<&Value> for SqlValue {
    fn from(value: &Value) -> Self {
        Self::from_json(value.clone())
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Self::Null => Ok(IsNull::Yes),
            Self::Bool(b) if *ty == Type::BOOL => b.to_sql(ty, out),
            Self::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                Type::INT8 => i.to_sql(ty, out),
                Type::FLOAT4 => (*i as f32).to_sql(ty, out),
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                Type::NUMERIC => encode_numeric(&i.to_string(), out),
                _ => Err(mismatch(self, ty)),
            },
            Self::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                Type::FLOAT8 => f.to_sql(ty, out),
                Type::NUMERIC if f.is_finite() => encode_numeric(&f.to_string(), out),
                _ => Err(mismatch(self, ty)),
            },
            Self::Text(s) if *ty == Type::NUMERIC => encode_numeric(s, out),
            Self::Text(s) if <String as ToSql>::accepts(ty) => s.to_sql(ty, out),
            Self::Json(v) if matches!(*ty, Type::JSON | Type::JSONB) => v.to_sql(ty, out),
            _ => Err(mismatch(self, ty)),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::BOOL
                | Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::NUMERIC
                | Type::JSON
                | Type::JSONB
        ) || <String as ToSql>::accepts(ty)
    }

    tokio_postgres::types::to_sql_checked!();
}

fn mismatch(value: &SqlValue, ty: &Type) -> Box<dyn Error + Sync + Send> {
    format!("cannot bind {value:?} as Postgres type {ty}").into()
}

/// Encode a plain decimal string (`-12.50`) in the binary `numeric` format.
fn encode_numeric(text: &str, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    let trimmed = text.trim();
    let (sign, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (NUMERIC_NEG, rest),
        None => (NUMERIC_POS, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part)
    {
        return Err(format!("invalid numeric literal: {text:?}").into());
    }

    let int_part = int_part.trim_start_matches('0');
    let dscale = u16::try_from(frac_part.len())?;

    // Base-10000 groups, aligned on the decimal point.
    let mut digits: Vec<i16> = Vec::new();
    let lead = int_part.len() % 4;
    if lead > 0 {
        digits.push(int_part[..lead].parse()?);
    }
    for chunk in int_part.as_bytes()[lead..].chunks(4) {
        digits.push(std::str::from_utf8(chunk)?.parse()?);
    }
    let mut weight = i16::try_from(digits.len())? - 1;
    for chunk in frac_part.as_bytes().chunks(4) {
        let mut group: i16 = std::str::from_utf8(chunk)?.parse()?;
        for _ in chunk.len()..4 {
            group *= 10;
        }
        digits.push(group);
    }

    let leading_zeros = digits.iter().take_while(|&&d| d == 0).count();
    digits.drain(..leading_zeros);
    weight -= i16::try_from(leading_zeros)?;
    while digits.last() == Some(&0) {
        digits.pop();
    }

    let (weight, sign) = if digits.is_empty() {
        (0, NUMERIC_POS)
    } else {
        (weight, sign)
    };

    out.put_i16(i16::try_from(digits.len())?);
    out.put_i16(weight);
    out.put_u16(sign);
    out.put_u16(dscale);
    for d in digits {
        out.put_i16(d);
    }
    Ok(IsNull::No)
}
