//! Compilation options.
//!
//! [`CompileConfig`] controls LIKE escaping in filters and how much SQL text
//! reaches `tracing` events.

use crate::error::SqlResult;
use serde::Deserialize;

/// Default cap on SQL text written to log events.
pub const DEFAULT_MAX_LOGGED_SQL: usize = 200;

/// Options for fragment compilation.
///
/// The defaults reproduce plain `%value%` matching and log SQL truncated to
/// [`DEFAULT_MAX_LOGGED_SQL`] bytes.
///
/// Can be embedded in a service's TOML config:
///
/// ```toml
/// escape_like_wildcards = true
/// max_logged_sql = 500
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileConfig {
    /// Escape `%`, `_` and `\` in text matched with ILIKE so user input
    /// matches literally.
    pub escape_like_wildcards: bool,
    /// Truncate SQL in log events (in bytes). `None` means no truncation.
    pub max_logged_sql: Option<usize>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            escape_like_wildcards: false,
            max_logged_sql: Some(DEFAULT_MAX_LOGGED_SQL),
        }
    }
}

impl CompileConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> SqlResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Enable or disable LIKE wildcard escaping.
    pub fn with_escape_like_wildcards(mut self, enabled: bool) -> Self {
        self.escape_like_wildcards = enabled;
        self
    }

    /// Set the maximum SQL length written to log events.
    pub fn max_logged_sql(mut self, len: usize) -> Self {
        self.max_logged_sql = Some(len);
        self
    }

    /// Disable SQL truncation in log events.
    pub fn no_truncate(mut self) -> Self {
        self.max_logged_sql = None;
        self
    }

    /// Apply the configured truncation to `sql` for logging.
    pub(crate) fn loggable<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_logged_sql {
            Some(max) if sql.len() > max => {
                let mut end = max;
                while !sql.is_char_boundary(end) {
                    end -= 1;
                }
                format!("{}...", &sql[..end]).into()
            }
            _ => sql.into(),
        }
    }
}
