//! Parameterized SQL fragments.
//!
//! [`FragmentBuilder`] stores SQL pieces and parameters separately and only
//! numbers placeholders when the fragment is rendered, so a clause that is
//! never pushed can never leave a gap in `$1, $2, ...`.
//!
//! # Example
//!
//! ```ignore
//! use jobly_sql::FragmentBuilder;
//!
//! let mut b = FragmentBuilder::new();
//! b.push("title ILIKE ").push_bind("%dev%");
//! b.push(" AND salary >= ").push_bind(50_000);
//! let fragment = b.build();
//!
//! assert_eq!(fragment.text(), "title ILIKE $1 AND salary >= $2");
//! assert_eq!(fragment.params().len(), 2);
//! ```

use crate::ident::Ident;
use crate::value::SqlValue;
use serde::Serialize;
use std::fmt::Write;
use std::ops::Range;
use tokio_postgres::types::ToSql;

#[derive(Debug, Clone)]
enum Part {
    Raw(String),
    Param,
}

/// Builder that numbers placeholders at render time.
#[derive(Debug, Clone, Default)]
pub struct FragmentBuilder {
    parts: Vec<Part>,
    params: Vec<SqlValue>,
}

impl FragmentBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }
        match self.parts.last_mut() {
            Some(Part::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(Part::Raw(sql.to_string())),
        }
        self
    }

    /// Append a validated identifier.
    pub fn push_ident(&mut self, ident: &Ident) -> &mut Self {
        let mut rendered = String::new();
        ident.write_sql(&mut rendered);
        self.push(&rendered)
    }

    /// Append a placeholder and bind its value.
    pub fn push_bind(&mut self, value: impl Into<SqlValue>) -> &mut Self {
        self.parts.push(Part::Param);
        self.params.push(value.into());
        self
    }

    /// Number of values bound so far.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Render the SQL with `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        let mut idx: usize = 0;
        for part in &self.parts {
            match part {
                Part::Raw(s) => out.push_str(s),
                Part::Param => {
                    idx += 1;
                    let _ = write!(&mut out, "${idx}");
                }
            }
        }
        out
    }

    /// Freeze the builder into an immutable [`Fragment`].
    pub fn build(self) -> Fragment {
        Fragment {
            text: self.to_sql(),
            params: self.params,
        }
    }
}

/// SQL text plus its positionally-bound parameters.
///
/// Placeholder `$k` in [`Fragment::text`] binds `params()[k - 1]`, and the
/// placeholders are exactly `$1..=$n` with `n == params().len()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Fragment {
    text: String,
    params: Vec<SqlValue>,
}

impl Fragment {
    /// The empty fragment: no text, no params.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The placeholder index the next appended parameter should use.
    pub fn next_placeholder(&self) -> usize {
        self.params.len() + 1
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
    }

    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.text, self.params)
    }

    pub(crate) fn from_parts(text: String, params: Vec<SqlValue>) -> Self {
        Self { text, params }
    }
}

/// Extract the distinct `$n` placeholder indices in `sql`, in ascending order.
///
/// Placeholder-like text inside single-quoted literals and double-quoted
/// identifiers is ignored.
pub fn placeholder_indices(sql: &str) -> Vec<usize> {
    let mut found = Vec::new();
    for_each_placeholder(sql, |_, n| found.push(n));
    found.sort_unstable();
    found.dedup();
    found
}

/// Call `visit(digits, n)` for every `$n` outside quoted spans, where
/// `digits` is the byte range of the number after `$`.
///
/// A doubled quote (`''` or `""`) inside a span closes and reopens it, so the
/// scanner stays inside the span.
pub(crate) fn for_each_placeholder(sql: &str, mut visit: impl FnMut(Range<usize>, usize)) {
    let mut quote: Option<char> = None;
    let mut chars = sql.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '$') => {
                let start = i + 1;
                let mut end = start;
                while let Some((j, _)) = chars.next_if(|(_, d)| d.is_ascii_digit()) {
                    end = j + 1;
                }
                if let Ok(n) = sql[start..end].parse::<usize>() {
                    visit(start..end, n);
                }
            }
            (None, _) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_placeholders_in_order() {
        let mut b = FragmentBuilder::new();
        b.push("a = ").push_bind(1).push(" AND b = ").push_bind("x");
        let f = b.build();
        assert_eq!(f.text(), "a = $1 AND b = $2");
        assert_eq!(f.params(), &[SqlValue::Int(1), SqlValue::from("x")]);
        assert_eq!(f.next_placeholder(), 3);
    }

    #[test]
    fn empty_builder_renders_empty_fragment() {
        let f = FragmentBuilder::new().build();
        assert!(f.is_empty());
        assert_eq!(f, Fragment::empty());
        assert!(f.params_ref().is_empty());
    }

    #[test]
    fn push_ident_renders_quoted() {
        let mut b = FragmentBuilder::new();
        b.push_ident(&Ident::quoted("logo_url").unwrap()).push("=").push_bind(SqlValue::Null);
        assert_eq!(b.to_sql(), r#""logo_url"=$1"#);
    }

    #[test]
    fn placeholder_indices_skip_literals_and_dedup() {
        assert_eq!(placeholder_indices("a = $2 AND b = $1 OR c = $2"), vec![1, 2]);
        assert_eq!(placeholder_indices("a = '$9' AND b = $1"), vec![1]);
        assert!(placeholder_indices("no params").is_empty());
        assert_eq!(placeholder_indices("x = $10"), vec![10]);
    }

    #[test]
    fn placeholder_indices_skip_quoted_identifiers() {
        assert_eq!(placeholder_indices(r#""o'x"=$1 WHERE id = $2"#), vec![1, 2]);
        assert_eq!(placeholder_indices(r#""a$7"=$1"#), vec![1]);
        assert_eq!(placeholder_indices(r#""a""$3"=$1, "b"=$2"#), vec![1, 2]);
        assert_eq!(placeholder_indices("a = 'it''s $4' AND b = $1"), vec![1]);
    }
}
