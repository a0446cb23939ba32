//! # Actions
//!
//! DOM event entry points. An element with an [`Action`] intercepts the event:
//! the action runs and the event stops there (no further bubbling, no default
//! behavior). Plain observers run without stopping anything.

use crate::field::FieldState;
use crate::form::FormState;
use crate::page::Page;
use trellis_core::{Channel, ConfigError, Effect, NodeId, Notification};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Refresh the zone named by the element's zone updater.
    ZoneUpdate { url: String },
    /// Skip validation, record the element as submitter and submit its form.
    CancelSubmit,
    /// Ask the row injector with this id for a new row.
    AddRow { injector: String },
    /// Request `url`, then remove the container with this id.
    RemoveRow { container: String, url: String },
}

/// Actions attached to one element, keyed by event name.
#[derive(Debug, Clone, Default)]
pub struct Actions {
    handlers: Channel<(String, Action)>,
}

impl Actions {
    pub fn for_event(&self, event: &str) -> Vec<Action> {
        self.handlers
            .keys()
            .filter(|(name, _)| name == event)
            .map(|(_, action)| action.clone())
            .collect()
    }
}

/// Click observers that do not intercept the click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickObserver {
    /// Sync a fragment's visibility with a checkbox or radio trigger.
    FragmentTrigger { trigger: NodeId, fragment: String },
}

#[derive(Debug, Clone, Default)]
pub struct ClickObservers {
    observers: Channel<ClickObserver>,
}

/// Per-element guards so page decoration registers each observer once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tracking {
    pub focus: bool,
    pub submit_clicks: bool,
}

impl Page {
    pub(crate) fn add_action(&mut self, element: NodeId, event: &str, action: Action) {
        self.registry
            .get_or_insert_with(element, Actions::default)
            .handlers
            .subscribe((event.to_string(), action), ());
    }

    pub(crate) fn add_click_observer(&mut self, element: NodeId, observer: ClickObserver) {
        self.registry
            .get_or_insert_with(element, ClickObservers::default)
            .observers
            .subscribe(observer, ());
    }

    /// A click on the element with `id`.
    pub fn click(&mut self, id: &str) -> Result<(), ConfigError> {
        let target = self.resolve(id)?;
        let Some(element) = self.document.element(target) else {
            return Ok(());
        };
        if element.is_disabled() {
            return Ok(());
        }

        if element.tag() == "input" {
            match element.input_type().as_str() {
                "checkbox" => {
                    let checked = !element.is_checked();
                    self.document.set_checked(target, checked)?;
                }
                "radio" => self.check_radio(target)?,
                _ => {}
            }
        }

        let mut path = vec![target];
        path.extend(self.document.ancestors(target));

        for node in path {
            if node == target && self.registry.get::<Tracking>(node).is_some_and(|t| t.submit_clicks) {
                if let Some(form) = self.document.form_of(node) {
                    self.set_submitting_element(form, Some(node));
                }
            }

            let observers: Vec<ClickObserver> = self
                .registry
                .get::<ClickObservers>(node)
                .map(|o| o.observers.keys().cloned().collect())
                .unwrap_or_default();
            for observer in observers {
                match observer {
                    ClickObserver::FragmentTrigger { trigger, fragment } => {
                        self.sync_fragment_trigger(trigger, &fragment)
                    }
                }
            }

            if self.run_actions(node, "click") {
                return Ok(());
            }
        }

        let is_submit = self.document.element(target).is_some_and(|e| e.is_submit());
        if is_submit {
            if let Some(form) = self.document.form_of(target) {
                self.perform_submit(form);
            }
        }
        Ok(())
    }

    /// The user changed a control's value.
    pub fn set_value(&mut self, id: &str, value: &str) -> Result<(), ConfigError> {
        let target = self.resolve(id)?;
        self.document.set_value(target, value)?;
        self.run_actions(target, "change");
        Ok(())
    }

    /// Set a checkbox or radio without clicking it.
    pub fn set_checked(&mut self, id: &str, checked: bool) -> Result<(), ConfigError> {
        let target = self.resolve(id)?;
        if checked && self.document.element(target).is_some_and(|e| e.input_type() == "radio") {
            return Ok(self.check_radio(target)?);
        }
        Ok(self.document.set_checked(target, checked)?)
    }

    /// Focus moved to the element with `id`. Leaving a field for another field
    /// of the same form validates the field being left.
    pub fn focus(&mut self, id: &str) -> Result<(), ConfigError> {
        let target = self.resolve(id)?;
        if !self.registry.get::<Tracking>(target).is_some_and(|t| t.focus) {
            return Ok(());
        }
        if self.context.current_focus == Some(target) {
            return Ok(());
        }

        self.outbox
            .push(Effect::Notify(Notification::FocusChanged { field: target }));
        if let Some(previous) = self.context.current_focus {
            let form = self.document.form_of(target);
            if form.is_some()
                && self.document.form_of(previous) == form
                && self.registry.contains::<FieldState>(previous)
            {
                self.validate_field(previous);
            }
        }
        self.context.current_focus = Some(target);
        Ok(())
    }

    /// Submit the form the way a script would: through the submission pipeline.
    pub(crate) fn perform_submit(&mut self, form: NodeId) {
        if self.registry.contains::<FormState>(form) {
            self.handle_submit(form);
        } else {
            self.outbox.push(Effect::NativeSubmit { form });
        }
    }

    fn check_radio(&mut self, radio: NodeId) -> Result<(), ConfigError> {
        let name = self
            .document
            .element(radio)
            .and_then(|e| e.attr("name"))
            .map(str::to_string);
        if let Some(name) = name {
            let scope = self.document.form_of(radio).unwrap_or(self.document.root());
            let group: Vec<NodeId> = self
                .document
                .select_tags(scope, &["input"])
                .into_iter()
                .filter(|n| {
                    self.document.element(*n).is_some_and(|e| {
                        e.input_type() == "radio" && e.attr("name") == Some(name.as_str())
                    })
                })
                .collect();
            for other in group {
                self.document.set_checked(other, false)?;
            }
        }
        self.document.set_checked(radio, true)?;
        Ok(())
    }

    /// Run the element's actions for `event`. Returns `true` if any ran.
    fn run_actions(&mut self, element: NodeId, event: &str) -> bool {
        let actions = self
            .registry
            .get::<Actions>(element)
            .map(|a| a.for_event(event))
            .unwrap_or_default();
        if actions.is_empty() {
            return false;
        }
        for action in actions {
            tracing::debug!(?action, event, "running action");
            match action {
                Action::ZoneUpdate { url } => self.trigger_zone_update(element, &url),
                Action::CancelSubmit => self.cancel_submit(element),
                Action::AddRow { injector } => match self.resolve(&injector) {
                    Ok(injector) => {
                        self.trigger_injector(injector);
                    }
                    Err(err) => self.report(&err, Some("ajaxFormLoop")),
                },
                Action::RemoveRow { container, url } => self.request_row_removal(&container, &url),
            }
        }
        true
    }

    fn cancel_submit(&mut self, button: NodeId) {
        let Some(form) = self.document.form_of(button) else {
            let id = self.document.id_of(button).unwrap_or_default().to_string();
            self.report(&ConfigError::NotInForm(id), Some("cancelButton"));
            return;
        };
        self.form_state(form).skip_validation = true;
        self.set_submitting_element(form, Some(button));
        self.perform_submit(form);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trellis_core::RuntimeConfig;

    const PAGE: &str = r#"<html><body>
        <form id="f"><input type="hidden" name="t:formdata" value="x">
        <input id="name" name="name"><input id="email" name="email">
        <input type="radio" id="r1" name="r" value="1" checked><input type="radio" id="r2" name="r" value="2">
        <input type="submit" id="save" value="Save"><input type="submit" id="cancel" value="Cancel">
        </form><input id="outside"></body></html>"#;

    fn page() -> Page {
        let mut page = Page::load(PAGE, RuntimeConfig::default());
        page.init(&json!({
            "validate": {"name": [["required", "Name is required"]]},
            "cancelButton": "cancel"
        }));
        page
    }

    #[test]
    fn test_radio_click_unchecks_siblings() {
        let mut page = page();
        page.click("r2").unwrap();
        let doc = page.document();
        assert!(doc.element(doc.by_id("r2").unwrap()).unwrap().is_checked());
        assert!(!doc.element(doc.by_id("r1").unwrap()).unwrap().is_checked());
    }

    #[test]
    fn test_submit_click_records_submitter_and_submits() {
        let mut page = page();
        page.set_value("name", "Ada").unwrap();
        page.click("save").unwrap();

        let form = page.document().by_id("f").unwrap();
        assert!(page.take_effects().contains(&Effect::NativeSubmit { form }));
        let controls = page.document().serialize_form(form);
        assert_eq!(controls[1], ("t:submit".to_string(), "save".to_string()));
    }

    #[test]
    fn test_cancel_button_skips_validation_once() {
        let mut page = page();
        page.click("cancel").unwrap();
        let form = page.document().by_id("f").unwrap();
        assert!(page.take_effects().contains(&Effect::NativeSubmit { form }));

        // The skip flag is one-shot: the next submit validates again.
        assert_eq!(page.submit("f").unwrap(), crate::form::SubmitOutcome::Blocked);
    }

    #[test]
    fn test_focus_change_validates_field_left_in_same_form() {
        let mut page = page();
        page.focus("name").unwrap();
        page.focus("outside").unwrap();
        assert!(!page.state::<FieldState>("name").unwrap().validation_error);

        page.focus("name").unwrap();
        page.focus("email").unwrap();
        assert!(page.state::<FieldState>("name").unwrap().validation_error);
        assert_eq!(page.context().current_focus, page.document().by_id("email"));
    }
}
