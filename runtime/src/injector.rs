//! # Row Injector
//!
//! An anchor element that asks the server for a new row and inserts it next to
//! itself. The reply goes through the same asset handling as a zone update, and
//! page decoration runs afterwards, so the row's inputs are wired like any
//! other field.

use crate::page::{FetchPurpose, Page};
use trellis_core::init::InjectorSpec;
use trellis_core::{ConfigError, ElementEffect, NodeId, Position, Ticket, UpdatePayload, UpdateRequest};

#[derive(Debug, Clone, PartialEq)]
pub struct InjectorState {
    pub url: String,
    /// New rows go after the anchor instead of before it.
    pub below: bool,
    pub show: ElementEffect,
}

impl Page {
    pub(crate) fn setup_injector(&mut self, spec: &InjectorSpec) -> Result<(), ConfigError> {
        let element = self.resolve(&spec.element)?;
        let show = spec
            .show
            .as_deref()
            .and_then(ElementEffect::named)
            .unwrap_or(ElementEffect::Highlight { color: None });
        self.registry.insert(
            element,
            InjectorState {
                url: spec.url.clone(),
                below: spec.below,
                show,
            },
        );
        Ok(())
    }

    pub(crate) fn trigger_injector(&mut self, injector: NodeId) -> Option<Ticket> {
        let url = self.registry.get::<InjectorState>(injector)?.url.clone();
        Some(self.ajax_request(UpdateRequest::post(url), FetchPurpose::Injector(injector)))
    }

    /// Ask the injector with id `injector_id` for a new row.
    pub fn inject_row(&mut self, injector_id: &str) -> Result<Ticket, ConfigError> {
        let injector = self.resolve(injector_id)?;
        self.trigger_injector(injector).ok_or_else(|| ConfigError::InvalidArguments {
            name: "formInjector".to_string(),
            reason: format!("'{injector_id}' is not a row injector"),
        })
    }

    pub(crate) fn insert_row(&mut self, injector: NodeId, payload: &UpdatePayload) {
        let Some(state) = self.registry.get::<InjectorState>(injector).cloned() else {
            return;
        };
        let Some(anchor) = self.document.element(injector) else {
            return;
        };
        let tag = anchor.tag().to_string();
        let mut attrs = Vec::new();
        if let Some(class) = anchor.attr("class").filter(|c| !c.is_empty()) {
            attrs.push(("class".to_string(), class.to_string()));
        }
        if let Some(id) = &payload.element_id {
            attrs.push(("id".to_string(), id.clone()));
        }

        let row = self.document.create_element(&tag, attrs);
        let position = if state.below { Position::After } else { Position::Before };
        if let Err(err) = self.document.insert_adjacent(injector, position, row) {
            self.diagnostics.error(err.to_string(), Some("formInjector"));
            return;
        }
        let content = payload.primary_content().unwrap_or_default();
        if let Err(err) = self.document.set_inner_html(row, content) {
            self.diagnostics.error(err.to_string(), Some("formInjector"));
            return;
        }
        tracing::debug!(?row, element_id = ?payload.element_id, "row inserted");
        self.animate(row, state.show);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use trellis_core::{Effect, FetchReply, RuntimeConfig};

    const PAGE: &str = r##"<html><body><form id="items">
        <div class="row" id="row-1"><input id="qty-1" name="qty"></div>
        <div class="row t-forminjector" id="injector"></div>
        <a id="add" href="#">add</a>
        </form></body></html>"##;

    fn page(below: bool) -> Page {
        let mut page = Page::load(PAGE, RuntimeConfig::default());
        page.init(&json!({
            "formInjector": {"element": "injector", "url": "/items.inject", "below": below},
            "ajaxFormLoop": {"rowInjector": "injector", "addRowTriggers": ["add"]}
        }));
        page.take_effects();
        page
    }

    fn reply() -> FetchReply {
        FetchReply::ok(
            json!({
                "content": r#"<input id="qty-2" name="qty">"#,
                "elementId": "row-2",
                "inits": [{"validate": {"qty-2": [["required", "Quantity is required"]]}}]
            })
            .to_string(),
        )
    }

    #[test]
    fn test_add_row_trigger_inserts_before_anchor() {
        let mut page = page(false);
        page.click("add").unwrap();
        let effects = page.take_effects();
        let Some(Effect::Fetch { ticket, request }) = effects.first() else {
            panic!("expected a fetch, got {effects:?}");
        };
        assert_eq!(request.url, "/items.inject");

        page.complete_fetch(*ticket, Ok(reply()));
        let doc = page.document();
        let row = doc.by_id("row-2").unwrap();
        let injector = doc.by_id("injector").unwrap();
        let form = doc.by_id("items").unwrap();
        let children = doc.children(form);
        let at = |node| children.iter().position(|c| *c == node).unwrap();
        assert_eq!(at(row) + 1, at(injector));
        assert_eq!(doc.element(row).unwrap().attr("class"), Some("row t-forminjector"));
        assert_eq!(doc.inner_html(row), r#"<input id="qty-2" name="qty">"#);
        assert!(page.take_effects().contains(&Effect::Animate {
            element: row,
            effect: ElementEffect::Highlight { color: None },
        }));
    }

    #[test]
    fn test_inserted_row_fields_join_the_form() {
        let mut page = page(true);
        let ticket = page.inject_row("injector").unwrap();
        page.complete_fetch(ticket, Ok(reply()));

        let injector = page.document().by_id("injector").unwrap();
        let row = page.document().by_id("row-2").unwrap();
        let form = page.document().by_id("items").unwrap();
        let children = page.document().children(form);
        let at = |node| children.iter().position(|c| *c == node).unwrap();
        assert_eq!(at(injector) + 1, at(row));

        assert!(page.state::<crate::field::FieldState>("qty-2").is_some());
        assert_eq!(page.submit("items").unwrap(), crate::form::SubmitOutcome::Blocked);
    }

    #[test]
    fn test_unknown_injector() {
        let mut page = page(false);
        assert!(page.inject_row("row-1").is_err());
    }
}
