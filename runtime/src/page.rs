//! # Page
//!
//! The single-threaded event loop façade. A `Page` owns the document, the
//! per-element controller records and the page-wide context, and it never
//! performs I/O: DOM events come in through methods such as [`Page::click`],
//! work for the host goes out as [`Effect`]s drained with [`Page::take_effects`],
//! and completions come back through [`Page::complete_fetch`] and
//! [`Page::script_loaded`].
//!
//! Anything that has to wait (a fetch in flight, a batch of scripts loading) is
//! parked as a continuation under its [`Ticket`] and resumed only by the
//! matching completion, which keeps the ordering guarantees: assets load before
//! content is swapped, and content is swapped before inline code runs.

use crate::asset::AssetLoader;
use crate::form::{FormState, PrepareKey};
use crate::validator::ValidatorRegistry;
use std::collections::{HashMap, HashSet};
use trellis_core::{
    ConfigError, Diagnostics, Document, Effect, ElementEffect, FetchReply, NodeId, PageContext,
    Registry, RuntimeConfig, Ticket, TransportError, UpdatePayload, UpdateRequest,
};

/// Why a fetch was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FetchPurpose {
    Zone(NodeId),
    Injector(NodeId),
    RemoveRow { container: String },
}

/// What to do with a reply once its assets are loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReplyAction {
    ApplyZone(NodeId),
    InsertRow(NodeId),
}

#[derive(Debug, Clone)]
pub(crate) enum Continuation {
    Fetch(FetchPurpose),
    Assets {
        action: ReplyAction,
        payload: UpdatePayload,
    },
}

#[derive(Debug)]
pub struct Page {
    pub(crate) document: Document,
    pub(crate) registry: Registry,
    pub(crate) context: PageContext,
    pub(crate) config: RuntimeConfig,
    pub(crate) assets: AssetLoader,
    pub(crate) validators: ValidatorRegistry,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) outbox: Vec<Effect>,
    pub(crate) pending: HashMap<Ticket, Continuation>,
    next_ticket: u64,
}

impl Page {
    /// Parse `html` and run the initial page decoration.
    pub fn load(html: &str, config: RuntimeConfig) -> Self {
        Self::from_document(Document::parse(html), config)
    }

    /// Wrap an already parsed document and run the initial page decoration.
    /// The loaded-asset set is seeded here and only here.
    pub fn from_document(document: Document, config: RuntimeConfig) -> Self {
        let context = PageContext::new(&config.location);
        let mut page = Self {
            assets: AssetLoader::new(context.origin()),
            diagnostics: Diagnostics::new(config.debug),
            document,
            registry: Registry::new(),
            context,
            config,
            validators: ValidatorRegistry::with_builtins(),
            outbox: Vec::new(),
            pending: HashMap::new(),
            next_ticket: 1,
        };
        page.assets.seed(&page.document, &mut page.diagnostics);
        page.dom_loaded();
        page
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn context(&self) -> &PageContext {
        &self.context
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn validators_mut(&mut self) -> &mut ValidatorRegistry {
        &mut self.validators
    }

    pub fn assets(&self) -> &AssetLoader {
        &self.assets
    }

    /// Controller record of type `T` attached to the element with `id`.
    pub fn state<T: 'static>(&self, id: &str) -> Option<&T> {
        self.registry.get::<T>(self.document.by_id(id)?)
    }

    /// Drain everything the host has to perform.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.outbox)
    }

    /// Tickets still waiting for a completion.
    pub fn pending_tickets(&self) -> Vec<Ticket> {
        let mut tickets: Vec<Ticket> = self.pending.keys().copied().collect();
        tickets.sort();
        tickets
    }

    /// Mark script urls as covered by an already loaded bundle.
    pub fn register_virtual_scripts<S: AsRef<str>>(&mut self, urls: &[S]) {
        self.assets.register_virtual(urls, &mut self.diagnostics);
    }

    /// The window is going away: replies that arrive from now on are ignored.
    pub fn unload(&mut self) {
        self.context.window_unloaded = true;
    }

    pub(crate) fn next_ticket(&mut self) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    pub(crate) fn resolve(&self, id: &str) -> Result<NodeId, ConfigError> {
        self.document
            .by_id(id)
            .ok_or_else(|| ConfigError::UnresolvedElement(id.to_string()))
    }

    /// Report a configuration problem and carry on.
    pub(crate) fn report(&mut self, err: &ConfigError, context: Option<&str>) {
        self.diagnostics.error(err.to_string(), context);
    }

    /// Play an effect. The resulting visibility is applied right away.
    pub(crate) fn animate(&mut self, element: NodeId, effect: ElementEffect) {
        if let Some(visible) = effect.visibility_after() {
            let _ = self.document.set_visible(element, visible);
        }
        self.outbox.push(Effect::Animate { element, effect });
    }

    /// Detach a subtree and drop the controller records it carried.
    pub(crate) fn remove_element(&mut self, element: NodeId) {
        self.forget_subtree(element);
        self.document.remove(element);
    }

    pub(crate) fn forget_subtree(&mut self, root: NodeId) {
        let mut removed: HashSet<NodeId> = self.document.descendants(root).into_iter().collect();
        removed.insert(root);
        for node in &removed {
            self.registry.forget(*node);
        }
        // Surviving forms must not keep subscriptions for the removed nodes.
        for form in self.registry.nodes_with::<FormState>() {
            if let Some(state) = self.registry.get_mut::<FormState>(form) {
                state.fields.retain(|field| !removed.contains(field));
                state.prepare.retain(|key| match key {
                    PrepareKey::Fragment(fragment) => !removed.contains(fragment),
                    PrepareKey::Named(_) => true,
                });
            }
        }
        if let Some(focus) = self.context.current_focus {
            if focus == root || self.document.is_descendant_of(focus, root) {
                self.context.current_focus = None;
            }
        }
    }

    /// Issue a partial-update request; the reply resumes under `purpose`.
    pub(crate) fn ajax_request(&mut self, request: UpdateRequest, purpose: FetchPurpose) -> Ticket {
        let ticket = self.next_ticket();
        tracing::debug!(%ticket, url = %request.url, "issuing update request");
        self.pending.insert(ticket, Continuation::Fetch(purpose));
        self.outbox.push(Effect::Fetch { ticket, request });
        ticket
    }

    /// Deliver the outcome of a `Fetch` effect.
    pub fn complete_fetch(&mut self, ticket: Ticket, result: Result<FetchReply, TransportError>) {
        let purpose = match self.pending.remove(&ticket) {
            Some(Continuation::Fetch(purpose)) => purpose,
            Some(other) => {
                self.pending.insert(ticket, other);
                self.diagnostics
                    .warn(format!("ticket {ticket} is not a fetch"), None);
                return;
            }
            None => {
                self.diagnostics
                    .warn(format!("no request is waiting on ticket {ticket}"), None);
                return;
            }
        };

        // Replies that land after unload would mutate a page that is going away.
        if self.context.window_unloaded {
            tracing::debug!(%ticket, "reply ignored after unload");
            return;
        }

        let reply = match result {
            Ok(reply) if reply.is_success() => reply,
            Ok(reply) => {
                let message = reply
                    .header(&self.config.error_header)
                    .unwrap_or_default()
                    .to_string();
                self.ajax_failure(TransportError::Status {
                    status: reply.status,
                    message,
                });
                return;
            }
            Err(err) => {
                self.ajax_failure(err);
                return;
            }
        };

        if let FetchPurpose::RemoveRow { container } = &purpose {
            self.remove_row(container);
            return;
        }

        let payload = match UpdatePayload::from_json(&reply.body) {
            Ok(payload) => payload,
            Err(err) => {
                self.diagnostics
                    .error(format!("client exception: {err}"), None);
                return;
            }
        };

        match purpose {
            FetchPurpose::Zone(zone) => self.load_scripts_in_reply(payload, ReplyAction::ApplyZone(zone)),
            FetchPurpose::Injector(injector) => {
                self.load_scripts_in_reply(payload, ReplyAction::InsertRow(injector))
            }
            FetchPurpose::RemoveRow { .. } => {}
        }
    }

    /// Generic failure handler: surfaces the server's message, never retries.
    fn ajax_failure(&mut self, err: TransportError) {
        let message = match &err {
            TransportError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        };
        self.diagnostics.error(
            format!("communication with the server failed: {message}"),
            None,
        );
        self.diagnostics.debug(format!("ajax failure: {err}"), None);
    }

    /// Deliver a script load completion.
    pub fn script_loaded(&mut self, url: &str) {
        let completed = self.assets.script_loaded(url, &mut self.diagnostics);
        for ticket in completed {
            match self.pending.remove(&ticket) {
                Some(Continuation::Assets { action, payload }) => self.finish_reply(action, payload),
                Some(other) => {
                    self.pending.insert(ticket, other);
                }
                None => {}
            }
        }
    }

    /// Redirect, or load the reply's assets and then run `action`.
    pub(crate) fn load_scripts_in_reply(&mut self, payload: UpdatePayload, action: ReplyAction) {
        if let Some(url) = payload.redirect_url.clone() {
            tracing::debug!(%url, "reply redirects");
            self.outbox.push(Effect::Navigate { url });
            return;
        }

        self.assets.add_stylesheets(
            &mut self.document,
            &payload.stylesheets,
            &mut self.diagnostics,
            &mut self.outbox,
        );
        let ticket = self.next_ticket();
        let readiness = self.assets.add_scripts(
            &mut self.document,
            &payload.scripts,
            ticket,
            &mut self.diagnostics,
            &mut self.outbox,
        );
        match readiness {
            crate::asset::Readiness::Ready => self.finish_reply(action, payload),
            crate::asset::Readiness::Waiting(ticket) => {
                self.pending
                    .insert(ticket, Continuation::Assets { action, payload });
            }
        }
    }

    /// Apply the reply, run its inline code and initializers, then redecorate.
    fn finish_reply(&mut self, action: ReplyAction, payload: UpdatePayload) {
        match action {
            ReplyAction::ApplyZone(zone) => self.apply_reply_to_zone(zone, &payload),
            ReplyAction::InsertRow(injector) => self.insert_row(injector, &payload),
        }
        if let Some(script) = payload.script.clone() {
            self.outbox.push(Effect::Eval { script });
        }
        for spec in &payload.inits {
            self.init(spec);
        }
        self.dom_loaded();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::Notification;

    const PAGE: &str = r#"<html><head></head><body>
        <div id="zone"><p>old</p></div>
        </body></html>"#;

    fn page() -> Page {
        let mut page = Page::load(PAGE, RuntimeConfig::default());
        page.init(&serde_json::json!({"zone": [{"element": "zone"}]}));
        page.take_effects();
        page
    }

    #[test]
    fn test_unknown_ticket_is_reported() {
        let mut page = page();
        page.complete_fetch(Ticket(99), Ok(FetchReply::ok("{}")));
        assert_eq!(page.diagnostics().entries().len(), 1);
    }

    #[test]
    fn test_reply_after_unload_is_ignored() {
        let mut page = page();
        let ticket = page.update_zone("zone", "/refresh", &[]).unwrap();
        page.take_effects();
        page.unload();
        page.complete_fetch(ticket, Ok(FetchReply::ok(r#"{"content": "<p>new</p>"}"#)));

        assert!(page.take_effects().is_empty());
        let zone = page.document().by_id("zone").unwrap();
        assert_eq!(page.document().inner_html(zone), "<p>old</p>");
    }

    #[test]
    fn test_invalid_body_is_client_exception() {
        let mut page = page();
        let ticket = page.update_zone("zone", "/refresh", &[]).unwrap();
        page.complete_fetch(ticket, Ok(FetchReply::ok("<html>oops</html>")));
        assert!(page.diagnostics().errors().next().unwrap().message.starts_with("client exception"));
    }

    #[test]
    fn test_assets_resume_the_zone_update() {
        let mut page = page();
        let ticket = page.update_zone("zone", "/refresh", &[]).unwrap();
        page.take_effects();
        page.complete_fetch(
            ticket,
            Ok(FetchReply::ok(r#"{"content": "<p>new</p>", "scripts": ["/js/cart.js"], "script": "cart()"}"#)),
        );

        assert_eq!(
            page.take_effects(),
            vec![Effect::LoadScript { url: "http://localhost/js/cart.js".to_string() }]
        );
        let zone = page.document().by_id("zone").unwrap();
        assert_eq!(page.document().inner_html(zone), "<p>old</p>");

        page.script_loaded("http://localhost/js/cart.js");
        let effects = page.take_effects();
        assert_eq!(page.document().inner_html(zone), "<p>new</p>");
        assert!(effects.contains(&Effect::Notify(Notification::ZoneUpdated { zone })));
        assert_eq!(effects.last(), Some(&Effect::Eval { script: "cart()".to_string() }));
        assert!(page.pending_tickets().is_empty());
    }
}
