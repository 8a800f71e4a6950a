//! Partial-update compilation.
//!
//! Turns a sparse "fields to change" object into a `"col"=$n, ...` assignment
//! list. Parameter order mirrors the object's key order exactly.

use crate::config::CompileConfig;
use crate::error::{SqlError, SqlResult};
use crate::fragment::{Fragment, FragmentBuilder};
use crate::ident::Ident;
use crate::value::SqlValue;
use serde_json::{Map, Value};

/// Logical field name -> physical column name.
///
/// Fields without an entry keep their own name as the column.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenameTable<'a> {
    entries: &'a [(&'a str, &'a str)],
}

impl<'a> RenameTable<'a> {
    /// A table that renames nothing.
    pub const EMPTY: RenameTable<'static> = RenameTable { entries: &[] };

    pub const fn new(entries: &'a [(&'a str, &'a str)]) -> Self {
        Self { entries }
    }

    /// Resolve the column for `field`.
    pub fn column_for<'f>(&self, field: &'f str) -> &'f str
    where
        'a: 'f,
    {
        self.entries
            .iter()
            .find(|(logical, _)| *logical == field)
            .map_or(field, |(_, column)| *column)
    }

    pub fn entries(&self) -> &'a [(&'a str, &'a str)] {
        self.entries
    }

    /// The first logical name declared more than once, if any.
    pub fn duplicate_key(&self) -> Option<&'a str> {
        self.entries
            .iter()
            .enumerate()
            .find(|(i, (key, _))| self.entries[..*i].iter().any(|(k, _)| k == key))
            .map(|(_, (key, _))| *key)
    }
}

/// Compile a JSON partial-update object into an assignment list.
///
/// `{"numEmployees": 10, "logoUrl": "x"}` with the company rename table gives
/// `"num_employees"=$1, "logo_url"=$2` bound to `[10, "x"]`.
pub fn compile_partial_update(
    fields: &Map<String, Value>,
    renames: &RenameTable<'_>,
) -> SqlResult<Fragment> {
    compile_partial_update_with(fields, renames, &CompileConfig::default())
}

/// [`compile_partial_update`] with explicit options.
pub fn compile_partial_update_with(
    fields: &Map<String, Value>,
    renames: &RenameTable<'_>,
    config: &CompileConfig,
) -> SqlResult<Fragment> {
    compile_assignments(fields.iter(), renames, config)
}

/// Compile any ordered sequence of `(field, value)` pairs into an assignment list.
pub fn compile_assignments<I, K, V>(
    fields: I,
    renames: &RenameTable<'_>,
    config: &CompileConfig,
) -> SqlResult<Fragment>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<SqlValue>,
{
    let mut sql = FragmentBuilder::new();
    for (field, value) in fields {
        if sql.param_count() > 0 {
            sql.push(", ");
        }
        let column = Ident::quoted(renames.column_for(field.as_ref()))?;
        sql.push_ident(&column).push("=").push_bind(value);
    }

    if sql.param_count() == 0 {
        tracing::debug!(target: "jobly_sql::sql", "rejected partial update with no fields");
        return Err(SqlError::EmptyInput);
    }

    let fragment = sql.build();
    tracing::debug!(
        target: "jobly_sql::sql",
        param_count = fragment.params().len(),
        sql = %config.loggable(fragment.text()),
        "compiled partial update"
    );
    Ok(fragment)
}

/// A complete `UPDATE ... SET ... WHERE key = $n RETURNING ...` statement.
///
/// The key value is bound after all assignments, at placeholder
/// `assignments + 1`.
///
/// # Example
/// ```ignore
/// let stmt = UpdateStatement::new("jobs")?.returning("id, title");
/// let q = stmt.compile(&fields, 7)?;
/// // UPDATE jobs SET "title"=$1 WHERE id = $2 RETURNING id, title
/// ```
#[derive(Debug, Clone)]
pub struct UpdateStatement<'a> {
    table: Ident,
    key: Ident,
    renames: RenameTable<'a>,
    returning: Option<String>,
}

impl<'a> UpdateStatement<'a> {
    /// Update rows of `table`, keyed by `id` unless [`UpdateStatement::key`] says otherwise.
    pub fn new(table: &str) -> SqlResult<Self> {
        Ok(Self {
            table: Ident::bare(table)?,
            key: Ident::Bare("id".to_string()),
            renames: RenameTable::EMPTY,
            returning: None,
        })
    }

    /// Set the column used to select the row to update.
    pub fn key(mut self, column: &str) -> SqlResult<Self> {
        self.key = Ident::bare(column)?;
        Ok(self)
    }

    /// Set the field rename table.
    pub fn renames(mut self, renames: RenameTable<'a>) -> Self {
        self.renames = renames;
        self
    }

    /// Set the RETURNING list. The text is trusted and emitted verbatim.
    pub fn returning(mut self, cols: &str) -> Self {
        self.returning = Some(cols.to_string());
        self
    }

    /// Compile the statement for `fields`, keyed by `key_value`.
    pub fn compile(
        &self,
        fields: &Map<String, Value>,
        key_value: impl Into<SqlValue>,
    ) -> SqlResult<Fragment> {
        let set = compile_partial_update(fields, &self.renames)?;
        let key_idx = set.next_placeholder();
        let (set_text, mut params) = set.into_parts();

        let mut text = format!(
            "UPDATE {} SET {set_text} WHERE {} = ${key_idx}",
            self.table, self.key
        );
        if let Some(cols) = &self.returning {
            text.push_str(" RETURNING ");
            text.push_str(cols);
        }
        params.push(key_value.into());
        Ok(Fragment::from_parts(text, params))
    }
}
