//! # Bootstrap
//!
//! Page decoration and declarative initializer dispatch. Decoration runs once
//! on load and again after every partial update, so each registration it makes
//! is guarded per element.

use crate::action::{Action, Tracking};
use crate::field::FieldState;
use crate::page::Page;
use serde_json::Value;
use trellis_core::init::{FormLoopSpec, RemoveLinkSpec};
use trellis_core::{ConfigError, Effect, Initializer, ValidatorSpec};

impl Page {
    /// Decorate the document: hide `.t-invisible` elements and track focus and
    /// submit clicks on every control not tracked yet.
    pub(crate) fn dom_loaded(&mut self) {
        self.context.page_loaded = true;
        let root = self.document.root();

        for node in self.document.select_class(root, "t-invisible") {
            let _ = self.document.set_visible(node, false);
            let _ = self.document.remove_class(node, "t-invisible");
        }

        let mut tracked = 0;
        for node in self.document.select_tags(root, &["input", "select", "textarea"]) {
            let is_submit = self.document.element(node).is_some_and(|e| e.is_submit());
            let tracking = self.registry.get_or_insert_with(node, Tracking::default);
            if !tracking.focus {
                tracking.focus = true;
                tracked += 1;
            }
            if is_submit {
                tracking.submit_clicks = true;
            }
        }
        tracing::debug!(tracked, "page decorated");
    }

    /// Run an initializer spec. Configuration errors are reported and
    /// returned; every other entry still runs.
    pub fn init(&mut self, spec: &Value) -> Vec<ConfigError> {
        let (initializers, mut errors) = Initializer::parse_spec(spec);
        for err in &errors {
            self.report(err, Some("init"));
        }
        for initializer in initializers {
            let name = initializer.name();
            let mut failures = self.run_initializer(initializer);
            for err in &failures {
                self.report(err, Some(name));
            }
            errors.append(&mut failures);
        }
        errors
    }

    fn run_initializer(&mut self, initializer: Initializer) -> Vec<ConfigError> {
        let outcome = match initializer {
            Initializer::Zone(spec) => self.setup_zone(&spec),
            Initializer::LinkZone(spec) => {
                self.setup_zone_trigger("click", &spec.link_id, &spec.zone_id, &spec.url)
            }
            Initializer::UpdateZoneOnEvent {
                event,
                element,
                zone_id,
                url,
            } => self.setup_zone_trigger(&event, &element, &zone_id, &url),
            Initializer::Validate(fields) => {
                return fields
                    .iter()
                    .flat_map(|(field, validators)| self.setup_validation(field, validators))
                    .collect();
            }
            Initializer::FormFragment(spec) => self.setup_fragment(&spec),
            Initializer::LinkTriggerToFormFragment(spec) => self.setup_fragment_trigger(&spec),
            Initializer::FormInjector(spec) => self.setup_injector(&spec),
            Initializer::AjaxFormLoop(spec) => return self.setup_form_loop(&spec),
            Initializer::FormLoopRemoveLink(spec) => self.setup_remove_link(&spec),
            Initializer::CancelButton(id) => self.setup_cancel_button(&id),
            Initializer::Activate(id) => self.activate(&id),
        };
        outcome.err().into_iter().collect()
    }

    /// Install the named validators on a field, registering the field with its
    /// form on first use.
    fn setup_validation(&mut self, field_id: &str, validators: &[ValidatorSpec]) -> Vec<ConfigError> {
        let field = match self.resolve(field_id) {
            Ok(field) => field,
            Err(err) => return vec![err],
        };
        let Some(form) = self.document.form_of(field) else {
            return vec![ConfigError::NotInForm(field_id.to_string())];
        };
        self.form_state(form).fields.subscribe(field, ());

        let symbols = self.config.number_symbols.clone();
        let state = self.registry.get_or_insert_with(field, FieldState::default);
        validators
            .iter()
            .filter_map(|spec| self.validators.apply(spec, state, &symbols).err())
            .collect()
    }

    fn setup_form_loop(&mut self, spec: &FormLoopSpec) -> Vec<ConfigError> {
        spec.add_row_triggers
            .iter()
            .filter_map(|trigger| match self.resolve(trigger) {
                Ok(node) => {
                    self.add_action(
                        node,
                        "click",
                        Action::AddRow {
                            injector: spec.row_injector.clone(),
                        },
                    );
                    None
                }
                Err(err) => Some(err),
            })
            .collect()
    }

    fn setup_remove_link(&mut self, spec: &RemoveLinkSpec) -> Result<(), ConfigError> {
        let link = self.resolve(&spec.link)?;
        self.add_action(
            link,
            "click",
            Action::RemoveRow {
                container: spec.fragment.clone(),
                url: spec.url.clone(),
            },
        );
        Ok(())
    }

    fn setup_cancel_button(&mut self, id: &str) -> Result<(), ConfigError> {
        let button = self.resolve(id)?;
        if self.document.form_of(button).is_none() {
            return Err(ConfigError::NotInForm(id.to_string()));
        }
        self.add_action(button, "click", Action::CancelSubmit);
        Ok(())
    }

    /// Ask the host to focus the element.
    pub fn activate(&mut self, id: &str) -> Result<(), ConfigError> {
        let element = self.resolve(id)?;
        self.outbox.push(Effect::Focus { element });
        Ok(())
    }
}
