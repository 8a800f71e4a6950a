//! Filter specs, rename tables and statement presets for the jobly schema.
//!
//! ```sql
//! CREATE TABLE companies (
//!     handle        VARCHAR(25) PRIMARY KEY,
//!     name          TEXT UNIQUE NOT NULL,
//!     num_employees INTEGER CHECK (num_employees >= 0),
//!     description   TEXT NOT NULL,
//!     logo_url      TEXT
//! );
//!
//! CREATE TABLE jobs (
//!     id             SERIAL PRIMARY KEY,
//!     title          TEXT NOT NULL,
//!     salary         INTEGER CHECK (salary >= 0),
//!     equity         NUMERIC CHECK (equity <= 1.0),
//!     company_handle VARCHAR(25) NOT NULL REFERENCES companies ON DELETE CASCADE
//! );
//! ```

use crate::config::CompileConfig;
use crate::error::{SqlError, SqlResult};
use crate::filter::{
    CrossFieldRule, FilterInput, FilterKey, FilterOp, FilterSpec, compile_filter_with, contains,
};
use crate::fragment::Fragment;
use crate::query::Query;
use crate::update::{RenameTable, UpdateStatement};
use crate::value::SqlValue;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

static COMPANY_KEYS: [FilterKey; 3] = [
    FilterKey::new("name", "name", FilterOp::Ilike, FilterInput::Text).with_transform(contains),
    FilterKey::new("minEmployees", "num_employees", FilterOp::Gte, FilterInput::Integer),
    FilterKey::new("maxEmployees", "num_employees", FilterOp::Lte, FilterInput::Integer),
];

static COMPANY_RULES: [CrossFieldRule; 1] = [CrossFieldRule::not_greater(
    "minEmployees",
    "maxEmployees",
    "minEmployees cannot be greater than maxEmployees",
)];

static JOB_KEYS: [FilterKey; 3] = [
    FilterKey::new("title", "title", FilterOp::Ilike, FilterInput::Text).with_transform(contains),
    FilterKey::new("minSalary", "salary", FilterOp::Gte, FilterInput::Integer),
    // Only emitted when true; binds the bound, not the flag.
    FilterKey::new("hasEquity", "equity", FilterOp::Gte, FilterInput::Flag { bound: 0 }),
];

pub static COMPANY_FILTERS: FilterSpec =
    FilterSpec::new("company", &COMPANY_KEYS, &COMPANY_RULES);

pub static JOB_FILTERS: FilterSpec = FilterSpec::new("job", &JOB_KEYS, &[]);

pub const COMPANY_RENAMES: RenameTable<'static> =
    RenameTable::new(&[("numEmployees", "num_employees"), ("logoUrl", "logo_url")]);

pub const USER_RENAMES: RenameTable<'static> = RenameTable::new(&[
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("isAdmin", "is_admin"),
]);

pub const JOB_RENAMES: RenameTable<'static> = RenameTable::EMPTY;

pub const COMPANY_COLUMNS: &str =
    r#"handle, name, description, num_employees AS "numEmployees", logo_url AS "logoUrl""#;

pub const JOB_COLUMNS: &str = r#"id, title, salary, equity, company_handle AS "companyHandle""#;

pub const USER_COLUMNS: &str =
    r#"username, first_name AS "firstName", last_name AS "lastName", email, is_admin AS "isAdmin""#;

/// `UPDATE companies ... WHERE handle = $n`.
pub fn company_update() -> SqlResult<UpdateStatement<'static>> {
    Ok(UpdateStatement::new("companies")?
        .key("handle")?
        .renames(COMPANY_RENAMES)
        .returning(COMPANY_COLUMNS))
}

/// `UPDATE jobs ... WHERE id = $n`.
pub fn job_update() -> SqlResult<UpdateStatement<'static>> {
    Ok(UpdateStatement::new("jobs")?
        .renames(JOB_RENAMES)
        .returning(JOB_COLUMNS))
}

/// `UPDATE users ... WHERE username = $n`.
pub fn user_update() -> SqlResult<UpdateStatement<'static>> {
    Ok(UpdateStatement::new("users")?
        .key("username")?
        .renames(USER_RENAMES)
        .returning(USER_COLUMNS))
}

/// A closed, per-entity filter record.
///
/// Records serialize to the same camelCase keys their [`FilterSpec`]
/// declares and compile through the same path as raw filter objects.
pub trait EntityFilter: Serialize + DeserializeOwned {
    /// The filter declaration this record compiles against.
    fn spec() -> &'static FilterSpec;

    /// Read a raw filter object, rejecting unknown keys and coercing
    /// query-string style values (`"50"`, `"true"`).
    fn from_map(raw: &Map<String, Value>) -> SqlResult<Self> {
        let spec = Self::spec();
        let mut normalized = Map::new();
        for (name, raw_value) in raw {
            let Some(key) = spec.key(name) else {
                return Err(SqlError::unknown_key(spec.entity, name.as_str()));
            };
            if let Some(value) = key.input.coerce(name, raw_value)? {
                normalized.insert(name.clone(), to_json(&value)?);
            }
        }
        serde_json::from_value(Value::Object(normalized))
            .map_err(|e| SqlError::validation(format!("{} filter: {e}", spec.entity)))
    }

    /// Compile to a `WHERE` fragment with default options.
    fn to_fragment(&self) -> SqlResult<Fragment> {
        self.to_fragment_with(&CompileConfig::default())
    }

    fn to_fragment_with(&self, config: &CompileConfig) -> SqlResult<Fragment> {
        match serde_json::to_value(self) {
            Ok(Value::Object(raw)) => compile_filter_with(&raw, Self::spec(), config),
            Ok(other) => Err(SqlError::validation(format!(
                "{} filter serialized to {other}, expected an object",
                Self::spec().entity
            ))),
            Err(e) => Err(SqlError::validation(e.to_string())),
        }
    }
}

fn to_json(value: &SqlValue) -> SqlResult<Value> {
    serde_json::to_value(value).map_err(|e| SqlError::validation(e.to_string()))
}

/// Company search filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_employees: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_employees: Option<i64>,
}

impl EntityFilter for CompanyFilter {
    fn spec() -> &'static FilterSpec {
        &COMPANY_FILTERS
    }
}

/// Job search filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_salary: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_equity: Option<bool>,
}

impl EntityFilter for JobFilter {
    fn spec() -> &'static FilterSpec {
        &JOB_FILTERS
    }
}

/// `SELECT <company columns> FROM companies [WHERE ...] ORDER BY name`.
pub fn company_search(filter: &CompanyFilter) -> SqlResult<Query> {
    search("companies", COMPANY_COLUMNS, filter.to_fragment()?, Some("name"))
}

/// `SELECT <job columns> FROM jobs [WHERE ...]`.
pub fn job_search(filter: &JobFilter) -> SqlResult<Query> {
    search("jobs", JOB_COLUMNS, filter.to_fragment()?, None)
}

fn search(table: &str, columns: &str, filter: Fragment, order_by: Option<&str>) -> SqlResult<Query> {
    let mut query = Query::new(format!("SELECT {columns} FROM {table}")).with_fragment(filter)?;
    if let Some(col) = order_by {
        query = query.push(&format!(" ORDER BY {col}"));
    }
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_specs_are_well_formed() {
        COMPANY_FILTERS.validate().unwrap();
        JOB_FILTERS.validate().unwrap();
    }

    #[test]
    fn rename_tables_have_unique_keys() {
        for table in [COMPANY_RENAMES, USER_RENAMES, JOB_RENAMES] {
            assert_eq!(table.duplicate_key(), None);
        }
    }

    #[test]
    fn min_salary_targets_salary_column() {
        let key = JOB_FILTERS.key("minSalary").unwrap();
        assert_eq!(key.column, "salary");
    }

    #[test]
    fn presets_build() {
        assert!(company_update().is_ok());
        assert!(job_update().is_ok());
        assert!(user_update().is_ok());
    }
}
