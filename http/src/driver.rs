use crate::transport::Transport;
use tracing::Instrument;
use trellis_core::{Effect, RuntimeConfig, TransportError};
use trellis_runtime::Page;

/// Services a [`Page`]: performs its fetches and asset loads through a
/// [`Transport`] and feeds the completions back until the page goes quiet.
pub struct Driver<T> {
    transport: T,
}

impl<T: Transport> Driver<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Load the document at `config.location` and build its page.
    pub async fn open(&self, config: RuntimeConfig) -> Result<Page, TransportError> {
        let html = self.transport.load_asset(&config.location).await?;
        tracing::info!(location = %config.location, bytes = html.len(), "page loaded");
        Ok(Page::load(&html, config))
    }

    /// Drain the page's effects until none is left for the transport. Effects
    /// only the host can perform (navigation, inline code, animations, popups,
    /// native submits, notifications) are returned in the order they were
    /// produced.
    pub async fn run(&self, page: &mut Page) -> Vec<Effect> {
        let mut host = Vec::new();
        loop {
            let effects = page.take_effects();
            if effects.is_empty() {
                break;
            }
            for effect in effects {
                match effect {
                    Effect::Fetch { ticket, request } => {
                        let request_id = uuid::Uuid::new_v4().to_string();
                        let span = tracing::info_span!(
                            "UpdateFetch",
                            trellis.http.method = %request.method,
                            trellis.http.url = %request.url,
                            trellis.http.request_id = %request_id,
                            trellis.ticket = %ticket
                        );
                        let result = self.transport.fetch(&request).instrument(span).await;
                        if let Err(err) = &result {
                            tracing::warn!(%ticket, error = %err, "update request failed");
                        }
                        page.complete_fetch(ticket, result);
                    }
                    Effect::LoadScript { url } => match self.transport.load_asset(&url).await {
                        Ok(_) => page.script_loaded(&url),
                        // The batch stays pending: content that depends on a
                        // missing script is never applied.
                        Err(err) => page
                            .diagnostics_mut()
                            .error(format!("script {url} failed to load: {err}"), Some(url.as_str())),
                    },
                    Effect::LoadStylesheet { href, .. } => {
                        if let Err(err) = self.transport.load_asset(&href).await {
                            page.diagnostics_mut()
                                .warn(format!("stylesheet {href} failed to load: {err}"), Some(href.as_str()));
                        }
                    }
                    other => host.push(other),
                }
            }
        }
        host
    }
}
