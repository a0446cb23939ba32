//! # Validator Registry
//!
//! Maps a validator name to a setup function. A setup function does not
//! validate anything itself: it installs a check (or the translator) on the
//! field, which then runs during field validation.
//!
//! Built-ins: `required`, `numericformat`, `minlength`, `maxlength`, `min`,
//! `max`, `regexp`.

use crate::field::{FieldState, Translated};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use trellis_core::{ConfigError, NumberSymbols, ValidatorSpec};

/// Installs checks on a field: `(field, message, constraint, symbols)`.
pub type ValidatorFn = Arc<
    dyn Fn(&mut FieldState, &str, Option<&Value>, &NumberSymbols) -> Result<(), ConfigError>
        + Send
        + Sync,
>;

#[derive(Clone)]
pub struct ValidatorRegistry {
    validators: HashMap<String, ValidatorFn>,
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.validators.keys().collect();
        names.sort();
        f.debug_struct("ValidatorRegistry")
            .field("names", &names)
            .finish()
    }
}

impl ValidatorRegistry {
    pub fn empty() -> Self {
        Self {
            validators: HashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("required", required);
        registry.register("numericformat", numeric_format);
        registry.register("minlength", |field, message, constraint, _| {
            length_bound(field, "minlength", message, constraint, |len, bound| len >= bound)
        });
        registry.register("maxlength", |field, message, constraint, _| {
            length_bound(field, "maxlength", message, constraint, |len, bound| len <= bound)
        });
        registry.register("min", |field, message, constraint, _| {
            numeric_bound(field, "min", message, constraint, |value, bound| value >= bound)
        });
        registry.register("max", |field, message, constraint, _| {
            numeric_bound(field, "max", message, constraint, |value, bound| value <= bound)
        });
        registry.register("regexp", pattern);
        registry
    }

    /// Register (or replace) a validator under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, setup: F)
    where
        F: Fn(&mut FieldState, &str, Option<&Value>, &NumberSymbols) -> Result<(), ConfigError>
            + Send
            + Sync
            + 'static,
    {
        self.validators.insert(name.into(), Arc::new(setup));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }

    /// Install the validator described by `spec` on `field`.
    pub fn apply(
        &self,
        spec: &ValidatorSpec,
        field: &mut FieldState,
        symbols: &NumberSymbols,
    ) -> Result<(), ConfigError> {
        let setup = self
            .validators
            .get(&spec.name)
            .ok_or_else(|| ConfigError::UnknownValidator(spec.name.clone()))?;
        setup(field, &spec.message, spec.constraint.as_ref(), symbols)
    }
}

fn check_key(name: &str, constraint: Option<&Value>) -> String {
    match constraint {
        Some(value) => format!("{name}:{value}"),
        None => name.to_string(),
    }
}

fn invalid_constraint(name: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidConstraint {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn required(
    field: &mut FieldState,
    message: &str,
    _: Option<&Value>,
    _: &NumberSymbols,
) -> Result<(), ConfigError> {
    let message = message.to_string();
    field.set_required(move |raw| {
        if raw.trim().is_empty() {
            Err(message.clone())
        } else {
            Ok(())
        }
    });
    Ok(())
}

fn numeric_format(
    field: &mut FieldState,
    message: &str,
    constraint: Option<&Value>,
    symbols: &NumberSymbols,
) -> Result<(), ConfigError> {
    let integer_only = match constraint {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(other) => {
            return Err(invalid_constraint(
                "numericformat",
                format!("expected a boolean, found {other}"),
            ));
        }
    };
    let message = message.to_string();
    let symbols = symbols.clone();
    field.set_translator(move |raw| {
        parse_localized_number(raw, integer_only, &symbols)
            .map(Translated::Number)
            .map_err(|err| {
                tracing::debug!(%err, input = raw, "numeric translation failed");
                message.clone()
            })
    });
    Ok(())
}

fn length_bound(
    field: &mut FieldState,
    name: &str,
    message: &str,
    constraint: Option<&Value>,
    accept: fn(usize, usize) -> bool,
) -> Result<(), ConfigError> {
    let bound = constraint
        .and_then(|c| c.as_u64().or_else(|| c.as_str().and_then(|s| s.trim().parse().ok())))
        .ok_or_else(|| invalid_constraint(name, "expected a non-negative integer"))?;
    let bound = usize::try_from(bound).map_err(|e| invalid_constraint(name, e.to_string()))?;
    let message = message.to_string();
    field.add_check(check_key(name, constraint), move |raw, _| {
        if accept(raw.chars().count(), bound) {
            Ok(())
        } else {
            Err(message.clone())
        }
    });
    Ok(())
}

fn numeric_bound(
    field: &mut FieldState,
    name: &str,
    message: &str,
    constraint: Option<&Value>,
    accept: fn(f64, f64) -> bool,
) -> Result<(), ConfigError> {
    let bound = constraint
        .and_then(|c| c.as_f64().or_else(|| c.as_str().and_then(|s| s.trim().parse().ok())))
        .ok_or_else(|| invalid_constraint(name, "expected a number"))?;
    let message = message.to_string();
    field.add_check(check_key(name, constraint), move |_, translated| {
        // A value that is not a number cannot be compared and passes.
        match translated.as_number() {
            Some(value) if !accept(value, bound) => Err(message.clone()),
            _ => Ok(()),
        }
    });
    Ok(())
}

fn pattern(
    field: &mut FieldState,
    message: &str,
    constraint: Option<&Value>,
    _: &NumberSymbols,
) -> Result<(), ConfigError> {
    let source = constraint
        .and_then(Value::as_str)
        .ok_or_else(|| invalid_constraint("regexp", "expected a pattern string"))?;
    let regex = Regex::new(source).map_err(|e| invalid_constraint("regexp", e.to_string()))?;
    let message = message.to_string();
    field.add_check(check_key("regexp", constraint), move |raw, _| {
        if regex.is_match(raw) {
            Ok(())
        } else {
            Err(message.clone())
        }
    });
    Ok(())
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumberFormatError {
    #[error("invalid character '{0}' in number")]
    InvalidCharacter(char),
    #[error("a whole number was expected")]
    NotAnInteger,
    #[error("'{0}' is not a number")]
    Malformed(String),
}

/// Convert a localized numeral to a number: the minus symbol becomes `-`,
/// grouping separators are dropped, the decimal symbol becomes `.` (rejected
/// when `integer_only`), any other non-digit is an error.
pub fn parse_localized_number(
    input: &str,
    integer_only: bool,
    symbols: &NumberSymbols,
) -> Result<f64, NumberFormatError> {
    let mut canonical = String::with_capacity(input.len());
    for ch in input.trim().chars() {
        if ch == symbols.minus {
            canonical.push('-');
        } else if ch == symbols.grouping {
            continue;
        } else if ch == symbols.decimal {
            if integer_only {
                return Err(NumberFormatError::NotAnInteger);
            }
            canonical.push('.');
        } else if ch.is_ascii_digit() {
            canonical.push(ch);
        } else {
            return Err(NumberFormatError::InvalidCharacter(ch));
        }
    }
    canonical
        .parse::<f64>()
        .map_err(|_| NumberFormatError::Malformed(input.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(name: &str, message: &str, constraint: Option<Value>) -> ValidatorSpec {
        ValidatorSpec {
            name: name.to_string(),
            message: message.to_string(),
            constraint,
        }
    }

    #[test]
    fn test_parse_localized_number() {
        let us = NumberSymbols::default();
        assert_eq!(parse_localized_number("1,234.5", false, &us), Ok(1234.5));
        assert_eq!(parse_localized_number(" -42 ", true, &us), Ok(-42.0));
        assert_eq!(
            parse_localized_number("1.5", true, &us),
            Err(NumberFormatError::NotAnInteger)
        );
        assert_eq!(
            parse_localized_number("12a", false, &us),
            Err(NumberFormatError::InvalidCharacter('a'))
        );
        assert!(matches!(
            parse_localized_number("1-2", false, &us),
            Err(NumberFormatError::Malformed(_))
        ));

        let de = NumberSymbols {
            grouping: '.',
            decimal: ',',
            minus: '-',
        };
        assert_eq!(parse_localized_number("1.234.567,25", false, &de), Ok(1234567.25));
    }

    #[test]
    fn test_unknown_validator_is_config_error() {
        let registry = ValidatorRegistry::with_builtins();
        let mut field = FieldState::default();
        let err = registry
            .apply(&spec("luhn", "bad card", None), &mut field, &NumberSymbols::default())
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownValidator("luhn".to_string()));
    }

    #[test]
    fn test_bad_constraints_are_rejected() {
        let registry = ValidatorRegistry::with_builtins();
        let symbols = NumberSymbols::default();
        let mut field = FieldState::default();
        assert!(matches!(
            registry.apply(&spec("regexp", "x", Some(json!("("))), &mut field, &symbols),
            Err(ConfigError::InvalidConstraint { .. })
        ));
        assert!(matches!(
            registry.apply(&spec("minlength", "x", Some(json!("many"))), &mut field, &symbols),
            Err(ConfigError::InvalidConstraint { .. })
        ));
        assert!(field.check_count() == 0);
    }

    #[test]
    fn test_same_validator_registers_once() {
        let registry = ValidatorRegistry::with_builtins();
        let symbols = NumberSymbols::default();
        let mut field = FieldState::default();
        let min = spec("min", "too small", Some(json!(3)));
        registry.apply(&min, &mut field, &symbols).unwrap();
        registry.apply(&min, &mut field, &symbols).unwrap();
        registry
            .apply(&spec("max", "too big", Some(json!(9))), &mut field, &symbols)
            .unwrap();
        assert_eq!(field.check_count(), 2);
    }

    #[test]
    fn test_builtin_checks() {
        let registry = ValidatorRegistry::with_builtins();
        let symbols = NumberSymbols::default();
        let mut field = FieldState::default();
        registry
            .apply(&spec("numericformat", "not a number", Some(json!(true))), &mut field, &symbols)
            .unwrap();
        registry
            .apply(&spec("max", "too big", Some(json!(10))), &mut field, &symbols)
            .unwrap();
        registry
            .apply(&spec("regexp", "digits only", Some(json!("^[0-9,]+$"))), &mut field, &symbols)
            .unwrap();

        assert_eq!(field.evaluate("7"), Ok(()));
        assert_eq!(field.evaluate("1,000"), Err("too big".to_string()));
        assert_eq!(field.evaluate("7.5"), Err("not a number".to_string()));
    }
}
