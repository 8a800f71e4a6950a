//! Column identifiers.
//!
//! Postgres cannot bind identifiers as parameters, so every column name that
//! reaches SQL text goes through [`Ident`]:
//!
//! - Bare identifiers are validated against `[A-Za-z_][A-Za-z0-9_$]*`, with an
//!   optional `table.` qualifier, and rendered as-is.
//! - Quoted identifiers allow any characters except NUL and render as
//!   `"name"` with embedded `"` doubled.
//!
//! # Example
//! ```ignore
//! use jobly_sql::Ident;
//!
//! assert_eq!(Ident::bare("num_employees")?.to_sql(), "num_employees");
//! assert_eq!(Ident::quoted("logo_url")?.to_sql(), r#""logo_url""#);
//! # Ok::<(), jobly_sql::SqlError>(())
//! ```

use crate::error::{SqlError, SqlResult};
use std::fmt;

/// A validated SQL column identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ident {
    /// Unquoted, possibly qualified: `num_employees`, `j.salary`.
    Bare(String),
    /// Double-quoted: `"first_name"`.
    Quoted(String),
}

impl Ident {
    /// Validate an unquoted identifier.
    pub fn bare(name: &str) -> SqlResult<Self> {
        if name.is_empty() {
            return Err(SqlError::validation("Identifier cannot be empty"));
        }
        for segment in name.split('.') {
            validate_segment(name, segment)?;
        }
        Ok(Self::Bare(name.to_string()))
    }

    /// Build a quoted identifier from an arbitrary column name.
    pub fn quoted(name: &str) -> SqlResult<Self> {
        if name.is_empty() {
            return Err(SqlError::validation("Empty quoted identifier"));
        }
        if name.contains('\0') {
            return Err(SqlError::validation(
                "Identifier cannot contain NUL character",
            ));
        }
        Ok(Self::Quoted(name.to_string()))
    }

    /// The identifier name without any quoting.
    pub fn name(&self) -> &str {
        match self {
            Self::Bare(s) | Self::Quoted(s) => s,
        }
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::with_capacity(self.name().len() + 2);
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        match self {
            Self::Bare(s) => out.push_str(s),
            Self::Quoted(s) => {
                out.push('"');
                for ch in s.chars() {
                    if ch == '"' {
                        out.push_str("\"\"");
                    } else {
                        out.push(ch);
                    }
                }
                out.push('"');
            }
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

fn validate_segment(ident: &str, segment: &str) -> SqlResult<()> {
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return Err(SqlError::validation(format!(
            "Empty identifier segment in '{ident}'"
        )));
    };
    if !(first == '_' || first.is_ascii_alphabetic()) {
        return Err(SqlError::validation(format!(
            "Invalid identifier start character '{first}' in '{ident}'"
        )));
    }
    if let Some(bad) = chars.find(|&c| !(c == '_' || c == '$' || c.is_ascii_alphanumeric())) {
        return Err(SqlError::validation(format!(
            "Invalid character '{bad}' in identifier '{ident}'"
        )));
    }
    Ok(())
}
