use super::FilterInput;
use crate::error::{SqlError, SqlResult};
use serde_json::{Map, Value};

/// Predicate over the raw filter object.
pub type RulePredicate = fn(&Map<String, Value>) -> bool;

/// What a [`CrossFieldRule`] checks.
#[derive(Debug, Clone, Copy)]
pub enum RuleCheck {
    /// When both keys are present, the integer at `lower` must not exceed the
    /// integer at `upper`.
    NotGreater {
        lower: &'static str,
        upper: &'static str,
    },
    /// Arbitrary check, evaluated only when `applies_when` holds.
    Custom {
        applies_when: RulePredicate,
        check: RulePredicate,
    },
}

/// A validation spanning two or more filter keys, run before any clause is built.
#[derive(Debug, Clone, Copy)]
pub struct CrossFieldRule {
    pub check: RuleCheck,
    pub message: &'static str,
}

impl CrossFieldRule {
    pub const fn not_greater(lower: &'static str, upper: &'static str, message: &'static str) -> Self {
        Self {
            check: RuleCheck::NotGreater { lower, upper },
            message,
        }
    }

    pub const fn custom(applies_when: RulePredicate, check: RulePredicate, message: &'static str) -> Self {
        Self {
            check: RuleCheck::Custom {
                applies_when,
                check,
            },
            message,
        }
    }

    /// Whether this rule has anything to check in `raw`.
    pub fn applies_to(&self, raw: &Map<String, Value>) -> bool {
        match self.check {
            RuleCheck::NotGreater { lower, upper } => present(raw, lower) && present(raw, upper),
            RuleCheck::Custom { applies_when, .. } => applies_when(raw),
        }
    }

    /// Evaluate the rule; rules that do not apply always pass.
    pub fn evaluate(&self, raw: &Map<String, Value>) -> SqlResult<()> {
        if !self.applies_to(raw) {
            return Ok(());
        }
        let holds = match self.check {
            RuleCheck::NotGreater { lower, upper } => integer(raw, lower)? <= integer(raw, upper)?,
            RuleCheck::Custom { check, .. } => check(raw),
        };
        if holds {
            Ok(())
        } else {
            Err(SqlError::InvalidFilterCombination(self.message.to_string()))
        }
    }

    /// The filter keys a [`RuleCheck::NotGreater`] rule compares.
    pub fn operands(&self) -> Option<(&'static str, &'static str)> {
        match self.check {
            RuleCheck::NotGreater { lower, upper } => Some((lower, upper)),
            RuleCheck::Custom { .. } => None,
        }
    }
}

fn present(raw: &Map<String, Value>, key: &str) -> bool {
    raw.get(key).is_some_and(|v| !v.is_null())
}

fn integer(raw: &Map<String, Value>, key: &str) -> SqlResult<i64> {
    let value = raw.get(key).unwrap_or(&Value::Null);
    FilterInput::Integer
        .coerce(key, value)?
        .and_then(|v| v.as_i64())
        .ok_or_else(|| SqlError::invalid_value(key, "an integer"))
}
