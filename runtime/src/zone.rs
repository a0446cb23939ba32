//! # Zone Controller
//!
//! A zone is a page region refreshed in place from an update payload. The zone
//! element carries a [`ZoneState`]; content goes into its first
//! `.t-zone-update` descendant when there is one, otherwise into the zone
//! element itself. A hidden zone is revealed with its show effect, a visible one
//! is highlighted with its update effect.
//!
//! Elements that trigger updates (links, selects, forms) carry a
//! [`ZoneUpdater`] naming the zone they refresh.

use crate::form::ZoneSubmission;
use crate::page::{FetchPurpose, Page, ReplyAction};
use trellis_core::init::{ZoneSpec, parameter_text};
use trellis_core::{
    ConfigError, Effect, ElementEffect, NodeId, Notification, Ticket, UpdatePayload, UpdateRequest,
};

const DEFAULT_END_COLOR: &str = "#ffffff";

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneState {
    pub update_element: NodeId,
    pub show: ElementEffect,
    pub update: ElementEffect,
    /// Background color the highlight fades back to.
    pub end_color: String,
    pub parameters: Vec<(String, String)>,
}

/// Marks an element as a zone trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneUpdater {
    pub zone_id: String,
}

fn background_color(style: &str) -> Option<String> {
    style.split(';').find_map(|decl| {
        let (prop, value) = decl.split_once(':')?;
        let value = value.trim();
        (prop.trim().eq_ignore_ascii_case("background-color") && !value.is_empty())
            .then(|| value.to_string())
    })
}

fn effect_or(name: Option<&str>, fallback: ElementEffect) -> ElementEffect {
    name.and_then(ElementEffect::named).unwrap_or(fallback)
}

impl Page {
    pub(crate) fn setup_zone(&mut self, spec: &ZoneSpec) -> Result<(), ConfigError> {
        let element = self.resolve(&spec.element)?;
        let update_element = self
            .document
            .select_class(element, "t-zone-update")
            .first()
            .copied()
            .unwrap_or(element);
        let end_color = self
            .document
            .element(element)
            .and_then(|e| e.attr("style"))
            .and_then(background_color)
            .unwrap_or_else(|| DEFAULT_END_COLOR.to_string());

        let state = ZoneState {
            update_element,
            show: effect_or(spec.show.as_deref(), ElementEffect::Show),
            update: effect_or(spec.update.as_deref(), ElementEffect::Highlight { color: None }),
            end_color,
            parameters: spec
                .parameters
                .iter()
                .map(|(k, v)| (k.clone(), parameter_text(v)))
                .collect(),
        };
        // One controller per zone element; a repeated initializer replaces it.
        self.registry.insert(element, state);
        Ok(())
    }

    /// Make `element_id` refresh `zone_id` when `event` fires (or, for a form,
    /// when it is submitted).
    pub(crate) fn setup_zone_trigger(
        &mut self,
        event: &str,
        element_id: &str,
        zone_id: &str,
        url: &str,
    ) -> Result<(), ConfigError> {
        let element = self.resolve(element_id)?;
        self.registry.insert(
            element,
            ZoneUpdater {
                zone_id: zone_id.to_string(),
            },
        );

        if self.document.tag(element) == Some("form") {
            let state = self.form_state(element);
            state.prevent_submission = true;
            state.process.subscribe(
                ZoneSubmission {
                    zone_id: zone_id.to_string(),
                    url: url.to_string(),
                },
                (),
            );
            return Ok(());
        }

        self.add_action(
            element,
            event,
            crate::action::Action::ZoneUpdate {
                url: url.to_string(),
            },
        );
        Ok(())
    }

    /// Point an existing zone trigger at a different zone.
    pub fn retarget_zone_updater(&mut self, element_id: &str, zone_id: &str) -> Result<(), ConfigError> {
        let element = self.resolve(element_id)?;
        match self.registry.get_mut::<ZoneUpdater>(element) {
            Some(updater) => {
                updater.zone_id = zone_id.to_string();
                Ok(())
            }
            None => Err(ConfigError::InvalidArguments {
                name: "zone".to_string(),
                reason: format!("'{element_id}' does not update a zone"),
            }),
        }
    }

    /// Resolve a zone id to its zone element, reporting what is missing.
    pub(crate) fn find_zone_manager_for_zone(&mut self, zone_id: &str) -> Option<NodeId> {
        let Some(element) = self.document.by_id(zone_id) else {
            self.report(&ConfigError::MissingZone(zone_id.to_string()), Some(zone_id));
            return None;
        };
        if !self.registry.contains::<ZoneState>(element) {
            self.report(&ConfigError::NoZoneManager(zone_id.to_string()), Some(zone_id));
            return None;
        }
        Some(element)
    }

    fn find_zone_manager(&mut self, trigger: NodeId) -> Option<NodeId> {
        let zone_id = self.registry.get::<ZoneUpdater>(trigger)?.zone_id.clone();
        self.find_zone_manager_for_zone(&zone_id)
    }

    /// Replace the zone's content, play show or highlight, and announce it.
    pub(crate) fn zone_show(&mut self, zone: NodeId, content: &str) {
        let Some(state) = self.registry.get::<ZoneState>(zone).cloned() else {
            return;
        };
        match self.document.set_inner_html(state.update_element, content) {
            Ok(removed) => {
                for node in removed {
                    self.forget_subtree(node);
                }
            }
            Err(err) => {
                self.diagnostics.error(err.to_string(), None);
                return;
            }
        }

        let effect = if self.document.is_visible(zone) {
            match state.update {
                ElementEffect::Highlight { .. } => ElementEffect::Highlight {
                    color: Some(state.end_color.clone()),
                },
                other => other,
            }
        } else {
            state.show
        };
        self.animate(zone, effect);
        self.outbox
            .push(Effect::Notify(Notification::ZoneUpdated { zone }));
    }

    /// Apply single-region content, then every entry of the multi-region map.
    /// Entries that do not resolve to a zone are reported and skipped.
    pub(crate) fn apply_reply_to_zone(&mut self, zone: NodeId, payload: &UpdatePayload) {
        let zone_id = self.document.id_of(zone).unwrap_or_default().to_string();
        let span = tracing::info_span!("ZoneUpdate", trellis.zone = %zone_id);
        let _enter = span.enter();

        if let Some(content) = payload.primary_content() {
            self.zone_show(zone, content);
        }
        for (id, content) in &payload.zones {
            if let Some(target) = self.find_zone_manager_for_zone(id) {
                self.zone_show(target, content);
            }
        }
        tracing::debug!(zones = payload.zones.len(), "zone update applied");
    }

    /// Fetch fresh content for `zone`, with the zone id and its fixed
    /// parameters merged in, then `extra` on top.
    pub(crate) fn update_from_url(
        &mut self,
        zone: NodeId,
        url: &str,
        extra: &[(String, String)],
    ) -> Option<Ticket> {
        let parameters = self.registry.get::<ZoneState>(zone)?.parameters.clone();
        let zone_id = self.document.id_of(zone).unwrap_or_default().to_string();

        let mut request = UpdateRequest::post(url);
        request.set(self.config.zone_parameter.clone(), zone_id);
        for (name, value) in parameters.iter().chain(extra) {
            request.set(name.clone(), value.clone());
        }
        Some(self.ajax_request(request, FetchPurpose::Zone(zone)))
    }

    /// Request an update of the zone with id `zone_id` from `url`.
    pub fn update_zone(
        &mut self,
        zone_id: &str,
        url: &str,
        extra: &[(&str, &str)],
    ) -> Result<Ticket, ConfigError> {
        let zone = self.resolve(zone_id)?;
        let extra: Vec<(String, String)> = extra
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.update_from_url(zone, url, &extra)
            .ok_or_else(|| ConfigError::NoZoneManager(zone_id.to_string()))
    }

    /// Apply an update payload to a zone as if it had just been fetched.
    pub fn process_reply(&mut self, zone_id: &str, payload: UpdatePayload) -> Result<(), ConfigError> {
        let zone = self.resolve(zone_id)?;
        if !self.registry.contains::<ZoneState>(zone) {
            return Err(ConfigError::NoZoneManager(zone_id.to_string()));
        }
        self.load_scripts_in_reply(payload, ReplyAction::ApplyZone(zone));
        Ok(())
    }

    /// A zone-trigger link or field was activated.
    pub(crate) fn trigger_zone_update(&mut self, trigger: NodeId, url: &str) {
        let Some(zone) = self.find_zone_manager(trigger) else {
            return;
        };
        let mut url = url.to_string();
        if let Some(element) = self.document.element(trigger) {
            if element.tag() == "select" && !element.value().is_empty() {
                url.push_str("&t:selectvalue=");
                url.push_str(element.value());
            }
        }
        self.update_from_url(zone, &url, &[]);
    }

    /// A zone-trigger form passed validation: post its controls to the zone.
    pub(crate) fn submit_to_zone(&mut self, form: NodeId, submission: &ZoneSubmission) {
        let Some(zone) = self.find_zone_manager(form) else {
            return;
        };
        let mut request = UpdateRequest::post(submission.url.clone());
        for (name, value) in self.document.serialize_form(form) {
            request.append(name, value);
        }
        request.set(self.config.zone_parameter.clone(), submission.zone_id.clone());
        self.ajax_request(request, FetchPurpose::Zone(zone));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use trellis_core::RuntimeConfig;

    const PAGE: &str = r#"<html><head></head><body>
        <div id="cart" style="background-color: #eeeeee"><h2>Cart</h2><div class="t-zone-update"><p>0 items</p></div></div>
        <div id="hidden-zone" style="display: none"></div>
        <a id="refresh" href="/cart">refresh</a>
        <select id="country"><option value="de" selected>DE</option></select>
        </body></html>"#;

    fn page() -> Page {
        let mut page = Page::load(PAGE, RuntimeConfig::default());
        page.init(&json!({
            "zone": [
                {"element": "cart", "parameters": {"page": 2}},
                {"element": "hidden-zone", "show": "slidedown"}
            ],
            "linkZone": [{"linkId": "refresh", "zoneId": "cart", "url": "/cart.refresh"}],
            "updateZoneOnEvent": [["change", "country", "cart", "/cart.country?x=1"]]
        }));
        page.take_effects();
        page
    }

    #[test]
    fn test_zone_setup_finds_update_element_and_color() {
        let page = page();
        let state = page.state::<ZoneState>("cart").unwrap();
        let update = page.document().element(state.update_element).unwrap();
        assert!(update.has_class("t-zone-update"));
        assert_eq!(state.end_color, "#eeeeee");
        assert_eq!(state.parameters, vec![("page".to_string(), "2".to_string())]);

        let hidden = page.state::<ZoneState>("hidden-zone").unwrap();
        assert_eq!(hidden.show, ElementEffect::SlideDown);
        assert_eq!(hidden.end_color, DEFAULT_END_COLOR);
    }

    #[test]
    fn test_link_click_requests_update_with_zone_parameters() {
        let mut page = page();
        page.click("refresh").unwrap();
        let effects = page.take_effects();
        let Some(Effect::Fetch { request, .. }) = effects.first() else {
            panic!("expected a fetch, got {effects:?}");
        };
        assert_eq!(request.url, "/cart.refresh");
        assert_eq!(request.parameter("t:zoneid"), Some("cart"));
        assert_eq!(request.parameter("page"), Some("2"));
    }

    #[test]
    fn test_select_change_appends_select_value() {
        let mut page = page();
        page.set_value("country", "de").unwrap();
        let effects = page.take_effects();
        let Some(Effect::Fetch { request, .. }) = effects.first() else {
            panic!("expected a fetch, got {effects:?}");
        };
        assert_eq!(request.url, "/cart.country?x=1&t:selectvalue=de");
    }

    #[test]
    fn test_show_reveals_hidden_zone_and_highlights_visible_one() {
        let mut page = page();
        let cart = page.document().by_id("cart").unwrap();
        let hidden = page.document().by_id("hidden-zone").unwrap();

        page.zone_show(cart, "<p>3 items</p>");
        page.zone_show(hidden, "<p>now visible</p>");

        assert_eq!(
            page.take_effects(),
            vec![
                Effect::Animate {
                    element: cart,
                    effect: ElementEffect::Highlight { color: Some("#eeeeee".to_string()) },
                },
                Effect::Notify(Notification::ZoneUpdated { zone: cart }),
                Effect::Animate { element: hidden, effect: ElementEffect::SlideDown },
                Effect::Notify(Notification::ZoneUpdated { zone: hidden }),
            ]
        );
        assert!(page.document().is_visible(hidden));
        assert!(page.document().inner_html(cart).contains("<h2>Cart</h2>"));
    }

    #[test]
    fn test_unknown_zone_trigger_target_is_reported() {
        let mut page = page();
        page.retarget_zone_updater("refresh", "nowhere").unwrap();
        page.click("refresh").unwrap();
        assert!(page.take_effects().is_empty());
        assert_eq!(
            page.diagnostics().errors().last().unwrap().message,
            ConfigError::MissingZone("nowhere".to_string()).to_string()
        );
    }
}
