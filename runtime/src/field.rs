//! # Field Controller
//!
//! One input's validation lifecycle. Validation runs the required check, then
//! the translator, then every registered check in order; the first failure
//! wins and the rest are skipped. Disabled fields and fields that are not
//! deeply visible always validate clean and are never decorated.

use crate::page::Page;
use std::sync::Arc;
use trellis_core::{Channel, Effect, ElementEffect, NodeId};

pub type RawCheck = Arc<dyn Fn(&str) -> Result<(), String> + Send + Sync>;
pub type Translator = Arc<dyn Fn(&str) -> Result<Translated, String> + Send + Sync>;
pub type Check = Arc<dyn Fn(&str, &Translated) -> Result<(), String> + Send + Sync>;

/// Field value after translation.
#[derive(Debug, Clone, PartialEq)]
pub enum Translated {
    Text(String),
    Number(f64),
}

impl Translated {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Default, Clone)]
pub struct FieldState {
    required: Option<RawCheck>,
    translator: Option<Translator>,
    checks: Channel<String, Check>,
    pub validation_error: bool,
    /// Most recent validation message shown for this field.
    pub message: Option<String>,
    popup_visible: bool,
}

impl std::fmt::Debug for FieldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldState")
            .field("required", &self.required.is_some())
            .field("translator", &self.translator.is_some())
            .field("checks", &self.checks.keys().collect::<Vec<_>>())
            .field("validation_error", &self.validation_error)
            .field("message", &self.message)
            .finish()
    }
}

impl FieldState {
    pub fn set_required(&mut self, check: impl Fn(&str) -> Result<(), String> + Send + Sync + 'static) {
        self.required = Some(Arc::new(check));
    }

    /// Install the translator. The last one installed is the one used.
    pub fn set_translator(
        &mut self,
        translator: impl Fn(&str) -> Result<Translated, String> + Send + Sync + 'static,
    ) {
        self.translator = Some(Arc::new(translator));
    }

    /// Add a check under `key`; a key that is already present is ignored.
    pub fn add_check(
        &mut self,
        key: impl Into<String>,
        check: impl Fn(&str, &Translated) -> Result<(), String> + Send + Sync + 'static,
    ) -> bool {
        self.checks.subscribe(key.into(), Arc::new(check))
    }

    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    /// Run required, translation and checks against `raw`, first failure wins.
    pub fn evaluate(&self, raw: &str) -> Result<(), String> {
        if let Some(required) = &self.required {
            required(raw)?;
        }
        if raw.trim().is_empty() {
            return Ok(());
        }
        let translated = match &self.translator {
            Some(translate) => translate(raw)?,
            None => Translated::Text(raw.to_string()),
        };
        for (_, check) in self.checks.iter() {
            check(raw, &translated)?;
        }
        Ok(())
    }
}

impl Page {
    /// Validate one field. Returns `true` when the field is in error.
    pub(crate) fn validate_field(&mut self, field: NodeId) -> bool {
        let Some(element) = self.document.element(field) else {
            return false;
        };
        if element.is_disabled() || !self.document.is_deep_visible(field) {
            return false;
        }
        let raw = element.value().to_string();

        let Some(state) = self.registry.get_mut::<FieldState>(field) else {
            return false;
        };
        state.validation_error = false;
        let outcome = state.evaluate(&raw);

        match outcome {
            Err(message) => {
                tracing::debug!(field = ?field, %message, "field failed validation");
                self.show_validation_message(field, message);
                true
            }
            Ok(()) => {
                self.remove_decorations(field);
                false
            }
        }
    }

    /// Mark the field and its form as errored and decorate the field.
    pub(crate) fn show_validation_message(&mut self, field: NodeId, message: String) {
        let form = self.document.form_of(field);
        if let Some(state) = self.registry.get_mut::<FieldState>(field) {
            state.validation_error = true;
            state.message = Some(message.clone());
            state.popup_visible = true;
        }
        if let Some(form_state) = form.and_then(|f| self.registry.get_mut::<crate::form::FormState>(f)) {
            form_state.validation_error = true;
        }

        let _ = self.document.add_class(field, "t-error");
        let id = self.document.id_of(field).map(str::to_string);
        if let Some(id) = id {
            if let Some(label) = self.document.by_id(&format!("{id}_label")) {
                let _ = self.document.add_class(label, "t-error");
            }
            if let Some(icon) = self.document.by_id(&format!("{id}_icon")) {
                if !self.document.is_visible(icon) {
                    self.animate(icon, ElementEffect::Show);
                }
            }
        }
        self.outbox.push(Effect::ShowErrorPopup { field, message });
    }

    /// Clear validation decorations; the popup is hidden only if it is showing.
    pub(crate) fn remove_decorations(&mut self, field: NodeId) {
        let _ = self.document.remove_class(field, "t-error");
        let id = self.document.id_of(field).map(str::to_string);
        if let Some(id) = id {
            if let Some(label) = self.document.by_id(&format!("{id}_label")) {
                let _ = self.document.remove_class(label, "t-error");
            }
            if let Some(icon) = self.document.by_id(&format!("{id}_icon")) {
                let _ = self.document.set_visible(icon, false);
            }
        }
        if let Some(state) = self.registry.get_mut::<FieldState>(field) {
            if state.popup_visible {
                state.popup_visible = false;
                self.outbox.push(Effect::HideErrorPopup { field });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_failure_skips_other_checks() {
        let mut field = FieldState::default();
        field.set_required(|raw| {
            if raw.trim().is_empty() {
                Err("required".to_string())
            } else {
                Ok(())
            }
        });
        field.add_check("never", |_, _| Err("unreachable".to_string()));
        assert_eq!(field.evaluate("   "), Err("required".to_string()));
        assert_eq!(field.evaluate("x"), Err("unreachable".to_string()));
    }

    #[test]
    fn test_blank_optional_field_passes() {
        let mut field = FieldState::default();
        field.set_translator(|_| Err("bad".to_string()));
        assert_eq!(field.evaluate(""), Ok(()));
        assert_eq!(field.evaluate("1"), Err("bad".to_string()));
    }

    #[test]
    fn test_last_translator_wins() {
        let mut field = FieldState::default();
        field.set_translator(|_| Err("first".to_string()));
        field.set_translator(|raw| Ok(Translated::Text(raw.to_uppercase())));
        field.add_check("upper", |_, t| match t {
            Translated::Text(s) if s == "ABC" => Ok(()),
            _ => Err("not translated".to_string()),
        });
        assert_eq!(field.evaluate("abc"), Ok(()));
    }
}
