//! Filter-to-WHERE compilation.
//!
//! A [`FilterSpec`] declares, per entity, which filter keys exist, the column
//! and operator each one maps to, and the cross-field rules that must hold.
//! [`compile_filter`] walks the declared keys in order, so the emitted clauses
//! and their placeholder numbers never depend on the client's key order.
//!
//! # Example
//!
//! ```ignore
//! use jobly_sql::{compile_filter, entities::COMPANY_FILTERS};
//! use serde_json::json;
//!
//! let raw = json!({"maxEmployees": 50, "name": "test"});
//! let f = compile_filter(raw.as_object().unwrap(), &COMPANY_FILTERS)?;
//!
//! assert_eq!(f.text(), "WHERE name ILIKE $1 AND num_employees <= $2");
//! # Ok::<(), jobly_sql::SqlError>(())
//! ```

mod rule;
mod spec;

pub use rule::{CrossFieldRule, RuleCheck};
pub use spec::FilterSpec;

use crate::config::CompileConfig;
use crate::error::{SqlError, SqlResult};
use crate::fragment::{Fragment, FragmentBuilder};
use crate::ident::Ident;
use crate::value::SqlValue;
use serde_json::{Map, Value};

/// Comparison operator of a filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// column = value
    Eq,
    /// Case-insensitive pattern match (PostgreSQL ILIKE)
    Ilike,
    /// column >= value
    Gte,
    /// column <= value
    Lte,
}

impl FilterOp {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ilike => "ILIKE",
            Self::Gte => ">=",
            Self::Lte => "<=",
        }
    }
}

/// How a raw filter value is read before binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterInput {
    /// Strings; numbers and booleans are stringified.
    Text,
    /// JSON integers or strings holding an integer.
    Integer,
    /// A capability flag. When truthy the clause compares the column against
    /// `bound`; when falsy no clause is emitted and no placeholder is used.
    Flag { bound: i64 },
}

impl FilterInput {
    fn expected(self) -> &'static str {
        match self {
            Self::Text => "a string",
            Self::Integer => "an integer",
            Self::Flag { .. } => "a boolean",
        }
    }

    /// Coerce a raw JSON value. `null` reads as "not supplied".
    pub fn coerce(self, key: &str, raw: &Value) -> SqlResult<Option<SqlValue>> {
        let value = match (self, raw) {
            (_, Value::Null) => return Ok(None),

            (Self::Text, Value::String(s)) => SqlValue::Text(s.clone()),
            (Self::Text, Value::Number(n)) => SqlValue::Text(n.to_string()),
            (Self::Text, Value::Bool(b)) => SqlValue::Text(b.to_string()),

            (Self::Integer, Value::Number(n)) if n.is_i64() => SqlValue::from_json(raw.clone()),
            (Self::Integer, Value::String(s)) => match s.trim().parse::<i64>() {
                Ok(i) => SqlValue::Int(i),
                Err(_) => return Err(SqlError::invalid_value(key, self.expected())),
            },

            (Self::Flag { .. }, Value::Bool(b)) => SqlValue::Bool(*b),
            (Self::Flag { .. }, Value::String(s)) if s.eq_ignore_ascii_case("true") => {
                SqlValue::Bool(true)
            }
            (Self::Flag { .. }, Value::String(s)) if s.eq_ignore_ascii_case("false") => {
                SqlValue::Bool(false)
            }

            _ => return Err(SqlError::invalid_value(key, self.expected())),
        };
        Ok(Some(value))
    }
}

/// Value rewrite applied after coercion.
pub type Transform = fn(SqlValue) -> SqlValue;

/// Wrap text in `%...%` for a substring match.
pub fn contains(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Text(s) => SqlValue::Text(format!("%{s}%")),
        other => other,
    }
}

/// Escape LIKE metacharacters so the text matches literally.
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// One recognized filter key.
#[derive(Debug, Clone, Copy)]
pub struct FilterKey {
    /// Key as it appears in the client's filter object.
    pub key: &'static str,
    /// Target column, rendered unquoted.
    pub column: &'static str,
    pub op: FilterOp,
    pub input: FilterInput,
    pub transform: Option<Transform>,
}

impl FilterKey {
    pub const fn new(key: &'static str, column: &'static str, op: FilterOp, input: FilterInput) -> Self {
        Self {
            key,
            column,
            op,
            input,
            transform: None,
        }
    }

    pub const fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Resolve the value to bind, or `None` if this key emits no clause.
    pub fn resolve(&self, raw: &Value, config: &CompileConfig) -> SqlResult<Option<SqlValue>> {
        let value = match (self.input.coerce(self.key, raw)?, self.input) {
            (None, _) => return Ok(None),
            (Some(SqlValue::Bool(true)), FilterInput::Flag { bound }) => SqlValue::Int(bound),
            (Some(_), FilterInput::Flag { .. }) => return Ok(None),
            (Some(SqlValue::Text(s)), _) if self.op == FilterOp::Ilike && config.escape_like_wildcards => {
                SqlValue::Text(escape_like(&s))
            }
            (Some(value), _) => value,
        };
        Ok(Some(match self.transform {
            Some(transform) => transform(value),
            None => value,
        }))
    }
}

/// Compile a raw filter object into a `WHERE` clause with default options.
///
/// Returns the empty fragment when no clause applies, so the caller can
/// append the text unconditionally.
pub fn compile_filter(raw: &Map<String, Value>, spec: &FilterSpec) -> SqlResult<Fragment> {
    compile_filter_with(raw, spec, &CompileConfig::default())
}

/// [`compile_filter`] with explicit options.
pub fn compile_filter_with(
    raw: &Map<String, Value>,
    spec: &FilterSpec,
    config: &CompileConfig,
) -> SqlResult<Fragment> {
    let result = build_where(raw, spec, config);
    match &result {
        Ok(fragment) => tracing::debug!(
            target: "jobly_sql::sql",
            entity = spec.entity,
            clauses = fragment.params().len(),
            sql = %config.loggable(fragment.text()),
            "compiled filter"
        ),
        Err(err) => tracing::debug!(
            target: "jobly_sql::sql",
            entity = spec.entity,
            error = %err,
            "rejected filter"
        ),
    }
    result
}

fn build_where(
    raw: &Map<String, Value>,
    spec: &FilterSpec,
    config: &CompileConfig,
) -> SqlResult<Fragment> {
    spec.check_rules(raw)?;
    spec.check_keys(raw)?;

    let mut sql = FragmentBuilder::new();
    for key in spec.keys {
        let Some(raw_value) = raw.get(key.key) else {
            continue;
        };
        let Some(value) = key.resolve(raw_value, config)? else {
            continue;
        };
        let column = Ident::bare(key.column)?;

        sql.push(if sql.is_empty() { "WHERE " } else { " AND " });
        sql.push_ident(&column)
            .push(" ")
            .push(key.op.as_sql())
            .push(" ")
            .push_bind(value);
    }
    Ok(sql.build())
}

#[cfg(test)]
mod tests;
