//! Error types for jobly-sql

use thiserror::Error;

/// Result type alias for fragment compilation
pub type SqlResult<T> = Result<T, SqlError>;

/// Errors produced while compiling or running parameterized fragments.
///
/// Every variant except [`SqlError::Query`] describes bad caller input. The web
/// layer maps those to a 400-class response; see [`SqlError::is_client_error`].
#[derive(Debug, Error)]
pub enum SqlError {
    /// Partial update called with no fields
    #[error("no data supplied for update")]
    EmptyInput,

    /// Filter object contains a key the entity does not recognize
    #[error("unknown {entity} filter: '{key}'")]
    UnknownFilterKey { entity: &'static str, key: String },

    /// A cross-field rule failed (e.g. min > max)
    #[error("{0}")]
    InvalidFilterCombination(String),

    /// A filter value could not be coerced to the type its key expects
    #[error("invalid value for filter '{key}': expected {expected}")]
    InvalidFilterValue { key: String, expected: &'static str },

    /// Identifier validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),
}

impl SqlError {
    /// Create an unknown filter key error
    pub fn unknown_key(entity: &'static str, key: impl Into<String>) -> Self {
        Self::UnknownFilterKey {
            entity,
            key: key.into(),
        }
    }

    /// Create an invalid filter value error
    pub fn invalid_value(key: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidFilterValue {
            key: key.into(),
            expected,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this error was caused by the caller's input.
    ///
    /// Input errors are never retryable.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Query(_) | Self::Config(_))
    }

    /// Check if this is an unknown filter key error
    pub fn is_unknown_key(&self) -> bool {
        matches!(self, Self::UnknownFilterKey { .. })
    }

    /// Check if this is a failed cross-field rule
    pub fn is_invalid_combination(&self) -> bool {
        matches!(self, Self::InvalidFilterCombination(_))
    }
}

impl From<toml::de::Error> for SqlError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
