//! # Initializers
//!
//! The declarative page configuration: a JSON object mapping an initializer
//! name to its invocations. Each invocation is an argument list; a value that is
//! not an array is a single-argument invocation.
//!
//! ```json
//! {
//!   "zone": [{"element": "cart", "show": "slidedown"}],
//!   "linkZone": [{"linkId": "refresh", "zoneId": "cart", "url": "/cart.refresh"}],
//!   "validate": {"qty": [["required", "Quantity is required"], ["min", "Too small", 1]]},
//!   "activate": "qty"
//! }
//! ```
//!
//! Parsing validates the whole set up front. An unknown name or malformed
//! argument list becomes a [`ConfigError`]; every other entry is still returned.

use crate::error::ConfigError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub element: String,
    #[serde(default)]
    pub show: Option<String>,
    #[serde(default)]
    pub update: Option<String>,
    /// Fixed parameters added to every request the zone makes.
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkZoneSpec {
    pub link_id: String,
    pub zone_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentSpec {
    pub element: String,
    #[serde(default)]
    pub show: Option<String>,
    #[serde(default)]
    pub hide: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentTriggerSpec {
    pub trigger_id: String,
    pub fragment_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectorSpec {
    pub element: String,
    pub url: String,
    /// Insert new rows after the anchor instead of before it.
    #[serde(default)]
    pub below: bool,
    #[serde(default)]
    pub show: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormLoopSpec {
    pub row_injector: String,
    #[serde(default)]
    pub add_row_triggers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveLinkSpec {
    pub link: String,
    pub fragment: String,
    pub url: String,
}

/// One `[name, message, constraint?]` entry of a `validate` spec.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorSpec {
    pub name: String,
    pub message: String,
    pub constraint: Option<Value>,
}

impl TryFrom<&Value> for ValidatorSpec {
    type Error = ConfigError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| ConfigError::InvalidArguments {
            name: "validate".to_string(),
            reason: reason.to_string(),
        };
        let items = value
            .as_array()
            .ok_or_else(|| invalid("validator spec must be an array"))?;
        let name = items
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("validator spec needs a name"))?;
        let message = items.get(1).and_then(Value::as_str).unwrap_or_default();
        Ok(Self {
            name: name.to_string(),
            message: message.to_string(),
            constraint: items.get(2).filter(|c| !c.is_null()).cloned(),
        })
    }
}

/// A single setup operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Initializer {
    Zone(ZoneSpec),
    LinkZone(LinkZoneSpec),
    UpdateZoneOnEvent {
        event: String,
        element: String,
        zone_id: String,
        url: String,
    },
    Validate(Vec<(String, Vec<ValidatorSpec>)>),
    FormFragment(FragmentSpec),
    LinkTriggerToFormFragment(FragmentTriggerSpec),
    FormInjector(InjectorSpec),
    AjaxFormLoop(FormLoopSpec),
    FormLoopRemoveLink(RemoveLinkSpec),
    CancelButton(String),
    Activate(String),
}

pub const INITIALIZER_NAMES: &[&str] = &[
    "zone",
    "linkZone",
    "updateZoneOnEvent",
    "validate",
    "formFragment",
    "linkTriggerToFormFragment",
    "formInjector",
    "ajaxFormLoop",
    "formLoopRemoveLink",
    "cancelButton",
    "activate",
];

impl Initializer {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Zone(_) => "zone",
            Self::LinkZone(_) => "linkZone",
            Self::UpdateZoneOnEvent { .. } => "updateZoneOnEvent",
            Self::Validate(_) => "validate",
            Self::FormFragment(_) => "formFragment",
            Self::LinkTriggerToFormFragment(_) => "linkTriggerToFormFragment",
            Self::FormInjector(_) => "formInjector",
            Self::AjaxFormLoop(_) => "ajaxFormLoop",
            Self::FormLoopRemoveLink(_) => "formLoopRemoveLink",
            Self::CancelButton(_) => "cancelButton",
            Self::Activate(_) => "activate",
        }
    }

    /// Parse a whole initializer spec. Entries are returned in spec order.
    pub fn parse_spec(spec: &Value) -> (Vec<Initializer>, Vec<ConfigError>) {
        let mut parsed = Vec::new();
        let mut errors = Vec::new();

        let Some(entries) = spec.as_object() else {
            errors.push(ConfigError::InvalidArguments {
                name: "init".to_string(),
                reason: "initializer spec must be a JSON object".to_string(),
            });
            return (parsed, errors);
        };

        for (name, invocations) in entries {
            if !INITIALIZER_NAMES.contains(&name.as_str()) {
                errors.push(ConfigError::UnknownInitializer(name.clone()));
                continue;
            }
            let invocations = match invocations {
                Value::Array(list) => list.clone(),
                single => vec![single.clone()],
            };
            for arguments in invocations {
                let arguments = match arguments {
                    Value::Array(list) => list,
                    single => vec![single],
                };
                match Self::from_arguments(name, &arguments) {
                    Ok(initializer) => parsed.push(initializer),
                    Err(err) => errors.push(err),
                }
            }
        }

        (parsed, errors)
    }

    pub fn from_arguments(name: &str, arguments: &[Value]) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidArguments {
            name: name.to_string(),
            reason,
        };
        let first = arguments
            .first()
            .ok_or_else(|| invalid("missing argument".to_string()))?;

        Ok(match name {
            "zone" => Self::Zone(from_object(name, first)?),
            "linkZone" => Self::LinkZone(from_object(name, first)?),
            "updateZoneOnEvent" => {
                let text = |index: usize| {
                    arguments
                        .get(index)
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or_else(|| invalid(format!("argument {} must be a string", index + 1)))
                };
                Self::UpdateZoneOnEvent {
                    event: text(0)?,
                    element: text(1)?,
                    zone_id: text(2)?,
                    url: text(3)?,
                }
            }
            "validate" => {
                let fields = first
                    .as_object()
                    .ok_or_else(|| invalid("expected an object keyed by field id".to_string()))?;
                let mut specs = Vec::with_capacity(fields.len());
                for (field, validators) in fields {
                    let validators = validators
                        .as_array()
                        .ok_or_else(|| invalid(format!("validators for '{field}' must be an array")))?;
                    let validators = validators
                        .iter()
                        .map(ValidatorSpec::try_from)
                        .collect::<Result<Vec<_>, _>>()?;
                    specs.push((field.clone(), validators));
                }
                Self::Validate(specs)
            }
            "formFragment" => Self::FormFragment(from_object(name, first)?),
            "linkTriggerToFormFragment" => Self::LinkTriggerToFormFragment(from_object(name, first)?),
            "formInjector" => Self::FormInjector(from_object(name, first)?),
            "ajaxFormLoop" => Self::AjaxFormLoop(from_object(name, first)?),
            "formLoopRemoveLink" => Self::FormLoopRemoveLink(from_object(name, first)?),
            "cancelButton" => Self::CancelButton(string_argument(name, first)?),
            "activate" => Self::Activate(string_argument(name, first)?),
            other => return Err(ConfigError::UnknownInitializer(other.to_string())),
        })
    }
}

fn from_object<T: DeserializeOwned>(name: &str, value: &Value) -> Result<T, ConfigError> {
    serde_json::from_value(value.clone()).map_err(|e| ConfigError::InvalidArguments {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

fn string_argument(name: &str, value: &Value) -> Result<String, ConfigError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ConfigError::InvalidArguments {
            name: name.to_string(),
            reason: "expected an element id".to_string(),
        })
}

/// Render a fixed zone parameter as request text.
pub fn parameter_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_mixed_spec() {
        let spec = json!({
            "zone": [{"element": "cart", "parameters": {"page": 2}}],
            "linkZone": {"linkId": "refresh", "zoneId": "cart", "url": "/cart.refresh"},
            "updateZoneOnEvent": [["change", "country", "cart", "/cart.country"]],
            "validate": {"qty": [["required", "Required"], ["min", "Too small", 1]]},
            "cancelButton": "cancel",
            "activate": ["qty"]
        });
        let (parsed, errors) = Initializer::parse_spec(&spec);
        assert!(errors.is_empty(), "{errors:?}");

        let names: Vec<&str> = parsed.iter().map(Initializer::name).collect();
        assert_eq!(
            names,
            vec!["zone", "linkZone", "updateZoneOnEvent", "validate", "cancelButton", "activate"]
        );

        match &parsed[3] {
            Initializer::Validate(fields) => {
                assert_eq!(fields[0].0, "qty");
                assert_eq!(fields[0].1[1].constraint, Some(json!(1)));
                assert_eq!(fields[0].1[0].constraint, None);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(parsed[5], Initializer::Activate("qty".to_string()));
    }

    #[test]
    fn test_unknown_name_is_reported_and_rest_survive() {
        let spec = json!({
            "sparkle": [{"element": "x"}],
            "activate": "qty",
            "zone": [{"noElement": true}]
        });
        let (parsed, errors) = Initializer::parse_spec(&spec);
        assert_eq!(parsed, vec![Initializer::Activate("qty".to_string())]);
        assert_eq!(errors[0], ConfigError::UnknownInitializer("sparkle".to_string()));
        assert!(matches!(
            &errors[1],
            ConfigError::InvalidArguments { name, .. } if name == "zone"
        ));
    }

    #[test]
    fn test_parameter_text() {
        assert_eq!(parameter_text(&json!("a")), "a");
        assert_eq!(parameter_text(&json!(3)), "3");
        assert_eq!(parameter_text(&json!(true)), "true");
    }
}
