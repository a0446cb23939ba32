//! # Conditional Fragment
//!
//! A form subtree that is only submitted while it is visible. The fragment is
//! paired with a hidden marker field (`<fragment id>-hidden`); when the form is
//! prepared for submission and the fragment is not deeply visible, the marker
//! is emptied so the server treats the fragment as absent.

use crate::action::ClickObserver;
use crate::form::{PrepareKey, Preparation};
use crate::page::{FetchPurpose, Page};
use trellis_core::init::{FragmentSpec, FragmentTriggerSpec};
use trellis_core::{ConfigError, ElementEffect, NodeId, UpdateRequest};

#[derive(Debug, Clone, PartialEq)]
pub struct FragmentState {
    pub marker: Option<NodeId>,
    pub show: ElementEffect,
    pub hide: ElementEffect,
}

impl Page {
    pub(crate) fn setup_fragment(&mut self, spec: &FragmentSpec) -> Result<(), ConfigError> {
        let element = self.resolve(&spec.element)?;
        let marker = self.document.by_id(&format!("{}-hidden", spec.element));
        let form = marker
            .and_then(|m| self.document.form_of(m))
            .or_else(|| self.document.form_of(element))
            .ok_or_else(|| ConfigError::NotInForm(spec.element.clone()))?;

        let state = FragmentState {
            marker,
            show: spec
                .show
                .as_deref()
                .and_then(ElementEffect::named)
                .unwrap_or(ElementEffect::SlideDown),
            hide: spec
                .hide
                .as_deref()
                .and_then(ElementEffect::named)
                .unwrap_or(ElementEffect::SlideUp),
        };
        self.registry.insert(element, state);
        self.form_state(form).prepare.subscribe(
            PrepareKey::Fragment(element),
            Preparation::ClearFragmentMarker(element),
        );
        Ok(())
    }

    pub(crate) fn setup_fragment_trigger(&mut self, spec: &FragmentTriggerSpec) -> Result<(), ConfigError> {
        let trigger = self.resolve(&spec.trigger_id)?;
        let is_radio = self
            .document
            .element(trigger)
            .is_some_and(|e| e.tag() == "input" && e.input_type() == "radio");

        // Selecting a sibling radio unchecks this one without a click on it,
        // so radios listen to the whole form.
        let observed = if is_radio {
            self.document
                .form_of(trigger)
                .ok_or_else(|| ConfigError::NotInForm(spec.trigger_id.clone()))?
        } else {
            trigger
        };
        self.add_click_observer(
            observed,
            ClickObserver::FragmentTrigger {
                trigger,
                fragment: spec.fragment_id.clone(),
            },
        );
        Ok(())
    }

    pub(crate) fn sync_fragment_trigger(&mut self, trigger: NodeId, fragment_id: &str) {
        let checked = self.document.element(trigger).is_some_and(|e| e.is_checked());
        match self.fragment(fragment_id) {
            Ok(fragment) => self.fragment_set_visible(fragment, checked),
            Err(err) => self.report(&err, Some("linkTriggerToFormFragment")),
        }
    }

    fn fragment(&self, id: &str) -> Result<NodeId, ConfigError> {
        let node = self.resolve(id)?;
        if self.registry.contains::<FragmentState>(node) {
            Ok(node)
        } else {
            Err(ConfigError::InvalidArguments {
                name: "formFragment".to_string(),
                reason: format!("'{id}' is not a form fragment"),
            })
        }
    }

    /// Empty the marker of a fragment that will not be submitted.
    pub(crate) fn prepare_fragment(&mut self, fragment: NodeId) {
        if self.document.is_deep_visible(fragment) {
            return;
        }
        let marker = self.registry.get::<FragmentState>(fragment).and_then(|s| s.marker);
        if let Some(marker) = marker {
            tracing::debug!(?fragment, "fragment hidden, clearing its marker");
            let _ = self.document.set_value(marker, "");
        }
    }

    fn fragment_effects(&self, fragment: NodeId) -> Option<(ElementEffect, ElementEffect)> {
        self.registry
            .get::<FragmentState>(fragment)
            .map(|s| (s.show.clone(), s.hide.clone()))
    }

    fn fragment_set_visible(&mut self, fragment: NodeId, visible: bool) {
        if self.document.is_visible(fragment) == visible {
            return;
        }
        let Some((show, hide)) = self.fragment_effects(fragment) else {
            return;
        };
        self.animate(fragment, if visible { show } else { hide });
    }

    fn fragment_hide_and_remove(&mut self, fragment: NodeId) {
        if let Some((_, hide)) = self.fragment_effects(fragment) {
            self.animate(fragment, hide);
        }
        self.remove_element(fragment);
    }

    pub fn show_fragment(&mut self, id: &str) -> Result<(), ConfigError> {
        let fragment = self.fragment(id)?;
        self.fragment_set_visible(fragment, true);
        Ok(())
    }

    pub fn hide_fragment(&mut self, id: &str) -> Result<(), ConfigError> {
        let fragment = self.fragment(id)?;
        self.fragment_set_visible(fragment, false);
        Ok(())
    }

    pub fn set_fragment_visible(&mut self, id: &str, visible: bool) -> Result<(), ConfigError> {
        let fragment = self.fragment(id)?;
        self.fragment_set_visible(fragment, visible);
        Ok(())
    }

    pub fn toggle_fragment(&mut self, id: &str) -> Result<(), ConfigError> {
        let fragment = self.fragment(id)?;
        let visible = self.document.is_visible(fragment);
        self.fragment_set_visible(fragment, !visible);
        Ok(())
    }

    /// Hide the fragment, then take it out of the document.
    pub fn hide_and_remove_fragment(&mut self, id: &str) -> Result<(), ConfigError> {
        let fragment = self.fragment(id)?;
        self.fragment_hide_and_remove(fragment);
        Ok(())
    }

    pub(crate) fn request_row_removal(&mut self, container: &str, url: &str) {
        self.ajax_request(
            UpdateRequest::post(url),
            FetchPurpose::RemoveRow {
                container: container.to_string(),
            },
        );
    }

    /// The server acknowledged a row removal.
    pub(crate) fn remove_row(&mut self, container: &str) {
        let node = match self.resolve(container) {
            Ok(node) => node,
            Err(err) => {
                self.report(&err, Some("formLoopRemoveLink"));
                return;
            }
        };
        if self.registry.contains::<FragmentState>(node) {
            self.fragment_hide_and_remove(node);
        } else {
            self.animate(node, ElementEffect::Fade);
            self.remove_element(node);
        }
    }
}
