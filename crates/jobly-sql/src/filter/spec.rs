use super::{CrossFieldRule, FilterKey};
use crate::error::{SqlError, SqlResult};
use crate::ident::Ident;
use serde_json::{Map, Value};

/// Static, per-entity filter declaration.
///
/// The order of `keys` is the clause emission order.
#[derive(Debug, Clone, Copy)]
pub struct FilterSpec {
    /// Entity name used in errors and log events.
    pub entity: &'static str,
    pub keys: &'static [FilterKey],
    pub rules: &'static [CrossFieldRule],
}

impl FilterSpec {
    pub const fn new(
        entity: &'static str,
        keys: &'static [FilterKey],
        rules: &'static [CrossFieldRule],
    ) -> Self {
        Self { entity, keys, rules }
    }

    /// Look up the descriptor for a filter key.
    pub fn key(&self, name: &str) -> Option<&'static FilterKey> {
        self.keys.iter().find(|k| k.key == name)
    }

    /// Reject the first key of `raw` (in its own order) that this spec does not declare.
    pub fn check_keys(&self, raw: &Map<String, Value>) -> SqlResult<()> {
        match raw.keys().find(|k| self.key(k).is_none()) {
            Some(unknown) => Err(SqlError::unknown_key(self.entity, unknown.as_str())),
            None => Ok(()),
        }
    }

    /// Run every cross-field rule against `raw`.
    pub fn check_rules(&self, raw: &Map<String, Value>) -> SqlResult<()> {
        self.rules.iter().try_for_each(|rule| rule.evaluate(raw))
    }

    /// Check the declaration itself: unique keys, valid columns, and rules
    /// that only reference declared keys.
    pub fn validate(&self) -> SqlResult<()> {
        for (i, key) in self.keys.iter().enumerate() {
            if self.keys[..i].iter().any(|k| k.key == key.key) {
                return Err(SqlError::validation(format!(
                    "{} filter '{}' declared twice",
                    self.entity, key.key
                )));
            }
            Ident::bare(key.column)?;
        }
        for (lower, upper) in self.rules.iter().filter_map(CrossFieldRule::operands) {
            if let Some(missing) = [lower, upper].into_iter().find(|k| self.key(k).is_none()) {
                return Err(SqlError::validation(format!(
                    "{} rule references undeclared filter '{missing}'",
                    self.entity
                )));
            }
        }
        Ok(())
    }
}
