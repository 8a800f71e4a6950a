//! A finished statement: fixed SQL prefix plus compiled fragments.
//!
//! # Example
//!
//! ```ignore
//! use jobly_sql::{Query, compile_filter, entities::JOB_FILTERS};
//!
//! let where_clause = compile_filter(&raw, &JOB_FILTERS)?;
//! let rows = Query::new("SELECT id, title FROM jobs")
//!     .with_fragment(where_clause)?
//!     .fetch_all(&client)
//!     .await?;
//! ```

use crate::client::GenericClient;
use crate::config::CompileConfig;
use crate::error::{SqlError, SqlResult};
use crate::fragment::{Fragment, for_each_placeholder, placeholder_indices};
use crate::value::SqlValue;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// SQL text with `$1..$n` placeholders and the values they bind.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    sql: String,
    params: Vec<SqlValue>,
    config: CompileConfig,
}

impl Query {
    /// Start from a fixed, trusted SQL prefix.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            config: CompileConfig::default(),
        }
    }

    /// Use `config` for the execution log event (SQL truncation).
    pub fn with_config(mut self, config: CompileConfig) -> Self {
        self.config = config;
        self
    }

    /// Bind a value for a placeholder the SQL already contains.
    pub fn bind(mut self, value: impl Into<SqlValue>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Append raw SQL (no parameters).
    pub fn push(mut self, sql: &str) -> Self {
        self.sql.push_str(sql);
        self
    }

    /// Append a fragment, separated by a single space.
    ///
    /// The fragment's placeholders are shifted past the values already bound,
    /// so `$1` in the fragment becomes `$k+1` after `k` earlier binds. An empty
    /// fragment leaves the query unchanged.
    pub fn with_fragment(mut self, fragment: Fragment) -> SqlResult<Self> {
        if fragment.is_empty() {
            if !fragment.params().is_empty() {
                return Err(SqlError::validation("fragment has params but no SQL text"));
            }
            return Ok(self);
        }
        let (text, params) = fragment.into_parts();
        self.sql.push(' ');
        self.sql.push_str(&shift_placeholders(&text, self.params.len()));
        self.params.extend(params);
        Ok(self)
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
    }

    /// Check that the placeholders are exactly `$1..=$n` for `n` bound values.
    pub fn validate(&self) -> SqlResult<()> {
        let found = placeholder_indices(&self.sql);
        let contiguous = found.iter().copied().eq(1..=self.params.len());
        if contiguous {
            Ok(())
        } else {
            Err(SqlError::validation(format!(
                "Query: placeholders {found:?} do not match {} params",
                self.params.len()
            )))
        }
    }

    /// Execute the query and return all rows.
    pub async fn fetch_all(&self, conn: &impl GenericClient) -> SqlResult<Vec<Row>> {
        self.validate()?;
        self.trace();
        let params = self.params_ref();
        conn.query(&self.sql, &params).await
    }

    /// Execute the query and return at most one row.
    pub async fn fetch_opt(&self, conn: &impl GenericClient) -> SqlResult<Option<Row>> {
        Ok(self.fetch_all(conn).await?.into_iter().next())
    }

    /// Execute the query and return the number of affected rows.
    pub async fn execute(&self, conn: &impl GenericClient) -> SqlResult<u64> {
        self.validate()?;
        self.trace();
        let params = self.params_ref();
        conn.execute(&self.sql, &params).await
    }

    fn trace(&self) {
        tracing::debug!(
            target: "jobly_sql::sql",
            param_count = self.params.len(),
            sql = %self.config.loggable(&self.sql),
            "executing query"
        );
    }
}

impl From<Fragment> for Query {
    fn from(fragment: Fragment) -> Self {
        let (sql, params) = fragment.into_parts();
        Self {
            sql,
            params,
            config: CompileConfig::default(),
        }
    }
}

/// Add `offset` to every `$n` placeholder outside quoted literals and identifiers.
fn shift_placeholders(sql: &str, offset: usize) -> String {
    if offset == 0 {
        return sql.to_string();
    }
    let mut out = String::with_capacity(sql.len() + 4);
    let mut copied = 0;
    for_each_placeholder(sql, |digits, n| {
        out.push_str(&sql[copied..digits.start]);
        out.push_str(&(n + offset).to_string());
        copied = digits.end;
    });
    out.push_str(&sql[copied..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_LOGGED_SQL;
    use crate::fragment::FragmentBuilder;
    use crate::ident::Ident;
    use crate::update::UpdateStatement;

    fn where_salary(min: i64) -> Fragment {
        let mut b = FragmentBuilder::new();
        b.push("WHERE salary >= ").push_bind(min);
        b.build()
    }

    #[test]
    fn prefix_plus_fragment() {
        let q = Query::new("SELECT id FROM jobs")
            .with_fragment(where_salary(10))
            .unwrap();
        assert_eq!(q.sql(), "SELECT id FROM jobs WHERE salary >= $1");
        assert_eq!(q.params(), &[SqlValue::Int(10)]);
        q.validate().unwrap();
    }

    #[test]
    fn empty_fragment_leaves_prefix_alone() {
        let q = Query::new("SELECT id FROM jobs")
            .with_fragment(Fragment::empty())
            .unwrap()
            .push(" ORDER BY id");
        assert_eq!(q.sql(), "SELECT id FROM jobs ORDER BY id");
        assert!(q.params().is_empty());
    }

    #[test]
    fn fragment_placeholders_shift_past_earlier_binds() {
        let q = Query::new("SELECT id FROM jobs WHERE company_handle = $1 AND id IN (SELECT id FROM jobs")
            .bind("c1")
            .with_fragment(where_salary(10))
            .unwrap()
            .push(")");
        assert_eq!(
            q.sql(),
            "SELECT id FROM jobs WHERE company_handle = $1 AND id IN (SELECT id FROM jobs WHERE salary >= $2)"
        );
        q.validate().unwrap();
    }

    #[test]
    fn shift_ignores_literals() {
        assert_eq!(shift_placeholders("a = $1 AND b = '$1'", 2), "a = $3 AND b = '$1'");
        assert_eq!(shift_placeholders("cost = $", 2), "cost = $");
    }

    #[test]
    fn shift_leaves_quoted_columns_alone() {
        let mut b = FragmentBuilder::new();
        b.push_ident(&Ident::quoted("a$1").unwrap()).push("=").push_bind(5);
        let q = Query::new("SELECT 1 WHERE x = $1")
            .bind(0)
            .with_fragment(b.build())
            .unwrap();
        assert_eq!(q.sql(), r#"SELECT 1 WHERE x = $1 "a$1"=$2"#);
        q.validate().unwrap();
    }

    #[test]
    fn quote_in_column_does_not_hide_placeholders() {
        let fields = match serde_json::json!({"o'x": 1}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        let stmt = UpdateStatement::new("jobs").unwrap().compile(&fields, 7).unwrap();
        assert_eq!(stmt.text(), r#"UPDATE jobs SET "o'x"=$1 WHERE id = $2"#);
        Query::from(stmt).validate().unwrap();
    }

    #[test]
    fn execution_log_uses_query_config() {
        let long = format!("SELECT {}", "x".repeat(300));
        let q = Query::new(long.as_str());
        assert_eq!(q.config.loggable(q.sql()).len(), DEFAULT_MAX_LOGGED_SQL + 3);

        let q = q.with_config(CompileConfig::new().no_truncate());
        assert_eq!(q.config.loggable(q.sql()), long);
    }

    #[test]
    fn validate_rejects_mismatched_params() {
        let q = Query::new("SELECT 1 WHERE a = $1 AND b = $3").bind(1).bind(2).bind(3);
        assert!(q.validate().is_err());
        let q = Query::new("SELECT 1 WHERE a = $1");
        assert!(q.validate().is_err());
    }
}
