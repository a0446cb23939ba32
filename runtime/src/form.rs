//! # Form Controller
//!
//! One form's submission lifecycle:
//!
//! ```text
//! Idle -> ValidatingFields -> ValidatingForm -> Preparing -> AjaxSubmit
//!                                                         -> NativeSubmit
//!      (any validation error)                            -> Blocked
//! ```
//!
//! Field validation always finishes before cross-field checks, which always
//! finish before preparation. A blocked submission clears the submitter marker.

use crate::page::Page;
use std::sync::Arc;
use trellis_core::{Channel, ConfigError, Document, Effect, NodeId, Position};

/// Cross-field check: inspects the form, `Err(message)` flags it as errored.
pub type FormCheck = Arc<dyn Fn(&Document, NodeId) -> Result<(), String> + Send + Sync>;

/// Preparation hook run just before the form is submitted.
pub type PrepareFn = Arc<dyn Fn(&mut Document, NodeId) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPhase {
    #[default]
    Idle,
    ValidatingFields,
    ValidatingForm,
    Preparing,
    AjaxSubmit,
    NativeSubmit,
    Blocked,
}

/// Where a submission ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    NativeSubmit,
    AjaxSubmit,
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareKey {
    Fragment(NodeId),
    Named(String),
}

#[derive(Clone)]
pub enum Preparation {
    /// Empty the fragment's hidden marker unless the fragment is deeply visible.
    ClearFragmentMarker(NodeId),
    Custom(PrepareFn),
}

/// Ajax submission routed to a zone instead of a native submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneSubmission {
    pub zone_id: String,
    pub url: String,
}

#[derive(Default, Clone)]
pub struct FormState {
    pub phase: FormPhase,
    pub skip_validation: bool,
    pub validation_error: bool,
    pub prevent_submission: bool,
    submit_marker: Option<NodeId>,
    pub(crate) fields: Channel<NodeId>,
    pub(crate) cross_field: Channel<String, FormCheck>,
    pub(crate) prepare: Channel<PrepareKey, Preparation>,
    pub(crate) process: Channel<ZoneSubmission>,
}

impl std::fmt::Debug for FormState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormState")
            .field("phase", &self.phase)
            .field("skip_validation", &self.skip_validation)
            .field("validation_error", &self.validation_error)
            .field("prevent_submission", &self.prevent_submission)
            .field("fields", &self.fields.len())
            .field("cross_field", &self.cross_field.len())
            .field("prepare", &self.prepare.len())
            .field("process", &self.process.len())
            .finish()
    }
}

impl FormState {
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

impl Page {
    /// The form's controller, created on first use.
    pub(crate) fn form_state(&mut self, form: NodeId) -> &mut FormState {
        self.registry.get_or_insert_with(form, FormState::default)
    }

    pub(crate) fn resolve_form(&self, id: &str) -> Result<NodeId, ConfigError> {
        let node = self.resolve(id)?;
        match self.document.tag(node) {
            Some("form") => Ok(node),
            _ => Err(ConfigError::NotInForm(id.to_string())),
        }
    }

    /// Native submit event entry point.
    pub fn submit(&mut self, form_id: &str) -> Result<SubmitOutcome, ConfigError> {
        let form = self.resolve_form(form_id)?;
        Ok(self.handle_submit(form))
    }

    /// Turn off client validation for the next submission of the form.
    pub fn skip_validation(&mut self, form_id: &str) -> Result<(), ConfigError> {
        let form = self.resolve_form(form_id)?;
        self.form_state(form).skip_validation = true;
        Ok(())
    }

    /// Record which control triggered the submission (`None` clears it).
    pub fn record_submitter(&mut self, form_id: &str, control: Option<&str>) -> Result<(), ConfigError> {
        let form = self.resolve_form(form_id)?;
        let control = control.map(|id| self.resolve(id)).transpose()?;
        self.set_submitting_element(form, control);
        Ok(())
    }

    /// Register a cross-field check, keyed so re-registration is a no-op.
    pub fn add_form_check(
        &mut self,
        form_id: &str,
        key: &str,
        check: impl Fn(&Document, NodeId) -> Result<(), String> + Send + Sync + 'static,
    ) -> Result<(), ConfigError> {
        let form = self.resolve_form(form_id)?;
        self.form_state(form)
            .cross_field
            .subscribe(key.to_string(), Arc::new(check));
        Ok(())
    }

    /// Register a preparation hook, keyed so re-registration is a no-op.
    pub fn add_prepare_hook(
        &mut self,
        form_id: &str,
        key: &str,
        hook: impl Fn(&mut Document, NodeId) + Send + Sync + 'static,
    ) -> Result<(), ConfigError> {
        let form = self.resolve_form(form_id)?;
        self.form_state(form).prepare.subscribe(
            PrepareKey::Named(key.to_string()),
            Preparation::Custom(Arc::new(hook)),
        );
        Ok(())
    }

    pub(crate) fn set_submitting_element(&mut self, form: NodeId, control: Option<NodeId>) {
        let value = control
            .and_then(|c| self.document.id_of(c))
            .unwrap_or_default()
            .to_string();
        let marker = self.submit_marker(form);
        let _ = self.document.set_value(marker, &value);
    }

    /// The hidden submitter field, created after the first hidden input on first use.
    fn submit_marker(&mut self, form: NodeId) -> NodeId {
        if let Some(marker) = self.form_state(form).submit_marker {
            return marker;
        }
        let name = self.config.submit_field.clone();
        let hidden: Vec<NodeId> = self
            .document
            .form_controls(form)
            .into_iter()
            .filter(|n| {
                self.document
                    .element(*n)
                    .is_some_and(|e| e.tag() == "input" && e.input_type() == "hidden")
            })
            .collect();

        let existing = hidden.iter().copied().find(|n| {
            self.document
                .element(*n)
                .and_then(|e| e.attr("name"))
                .is_some_and(|n| n == name)
        });
        let marker = match existing {
            Some(marker) => marker,
            None => {
                let marker = self.document.create_element(
                    "input",
                    vec![
                        ("type".to_string(), "hidden".to_string()),
                        ("name".to_string(), name),
                    ],
                );
                let placed = match hidden.first() {
                    Some(first) => self.document.insert_adjacent(*first, Position::After, marker),
                    None => self.document.append_child(form, marker),
                };
                if let Err(err) = placed {
                    self.diagnostics.error(err.to_string(), None);
                }
                marker
            }
        };
        self.form_state(form).submit_marker = Some(marker);
        marker
    }

    pub(crate) fn handle_submit(&mut self, form: NodeId) -> SubmitOutcome {
        let form_id = self.document.id_of(form).unwrap_or_default().to_string();
        let span = tracing::info_span!("FormSubmit", trellis.form = %form_id);
        let _enter = span.enter();

        let state = self.form_state(form);
        state.phase = FormPhase::Idle;
        state.validation_error = false;

        if state.skip_validation {
            state.skip_validation = false;
            tracing::debug!("validation skipped for this submission");
        } else {
            state.phase = FormPhase::ValidatingFields;
            let fields: Vec<NodeId> = state.fields.keys().copied().collect();
            for field in fields {
                self.validate_field(field);
            }

            if !self.form_state(form).validation_error {
                let state = self.form_state(form);
                state.phase = FormPhase::ValidatingForm;
                let checks = state.cross_field.snapshot();
                let mut failed = false;
                for (key, check) in checks {
                    if let Err(message) = check(&self.document, form) {
                        tracing::debug!(check = %key, %message, "cross-field check failed");
                        self.diagnostics.error(message, Some(key.as_str()));
                        failed = true;
                    }
                }
                if failed {
                    self.form_state(form).validation_error = true;
                }
            }

            if self.form_state(form).validation_error {
                self.form_state(form).phase = FormPhase::Blocked;
                self.set_submitting_element(form, None);
                tracing::debug!("submission blocked by validation errors");
                return SubmitOutcome::Blocked;
            }
        }

        let state = self.form_state(form);
        state.phase = FormPhase::Preparing;
        let preparations = state.prepare.snapshot();
        for (_, preparation) in preparations {
            match preparation {
                Preparation::ClearFragmentMarker(fragment) => self.prepare_fragment(fragment),
                Preparation::Custom(hook) => hook(&mut self.document, form),
            }
        }

        let state = self.form_state(form);
        if state.prevent_submission {
            state.phase = FormPhase::AjaxSubmit;
            let submissions = state.process.snapshot();
            for (submission, _) in submissions {
                self.submit_to_zone(form, &submission);
            }
            tracing::debug!("form submitted via ajax");
            SubmitOutcome::AjaxSubmit
        } else {
            state.phase = FormPhase::NativeSubmit;
            self.outbox.push(Effect::NativeSubmit { form });
            tracing::debug!("native submission allowed");
            SubmitOutcome::NativeSubmit
        }
    }
}
