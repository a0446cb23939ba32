//! # Asset Loader
//!
//! Deduplicated loading of script and stylesheet assets for the lifetime of a
//! page. Script urls are resolved against the page origin and then skipped if
//! they are covered by a virtual (bundled) asset, already loaded, or already
//! present as a `script[src]` element. New scripts are appended to `head` in the
//! order given and a batch waits until every one of them has loaded.
//!
//! A url that is still in flight when another batch asks for it is not
//! requested again; the new batch simply waits for the same load.

use std::collections::BTreeSet;
use trellis_core::{
    ConfigError, Diagnostics, Document, Effect, NodeId, StylesheetLink, Ticket,
};

/// Whether a batch can continue right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Waiting(Ticket),
}

#[derive(Debug, Clone)]
struct Batch {
    ticket: Ticket,
    waiting: BTreeSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AssetLoader {
    origin: String,
    loaded: BTreeSet<String>,
    in_flight: BTreeSet<String>,
    virtual_scripts: BTreeSet<String>,
    batches: Vec<Batch>,
}

impl AssetLoader {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Rebuild a complete url. Absolute urls pass through; root-relative paths
    /// get the page origin; anything else cannot be resolved.
    pub fn resolve(&self, path: &str) -> Result<String, ConfigError> {
        let lower = path.to_ascii_lowercase();
        if lower.starts_with("http:") || lower.starts_with("https:") {
            return Ok(path.to_string());
        }
        if !path.starts_with('/') {
            return Err(ConfigError::RelativeUrl(path.to_string()));
        }
        Ok(format!("{}{}", self.origin, path))
    }

    fn resolve_or_keep(&self, path: &str, diagnostics: &mut Diagnostics) -> String {
        self.resolve(path).unwrap_or_else(|err| {
            diagnostics.error(err.to_string(), Some(path));
            path.to_string()
        })
    }

    /// Record every `script[src]` already in the document as loaded.
    pub fn seed(&mut self, document: &Document, diagnostics: &mut Diagnostics) {
        for script in document.select_tags(document.root(), &["script"]) {
            if let Some(src) = document.element(script).and_then(|e| e.attr("src")) {
                if !src.trim().is_empty() {
                    let url = self.resolve_or_keep(src, diagnostics);
                    self.loaded.insert(url);
                }
            }
        }
    }

    /// Mark urls as covered by an already loaded bundle.
    pub fn register_virtual<S: AsRef<str>>(&mut self, urls: &[S], diagnostics: &mut Diagnostics) {
        for url in urls {
            let complete = self.resolve_or_keep(url.as_ref(), diagnostics);
            self.virtual_scripts.insert(complete);
        }
    }

    pub fn is_loaded(&self, url: &str) -> bool {
        self.loaded.contains(url) && !self.in_flight.contains(url)
    }

    pub fn pending_batches(&self) -> usize {
        self.batches.len()
    }

    fn document_has(&self, document: &Document, tag: &str, attr: &str, url: &str) -> bool {
        document.select_tags(document.root(), &[tag]).into_iter().any(|node| {
            document
                .element(node)
                .and_then(|e| e.attr(attr))
                .filter(|existing| !existing.trim().is_empty())
                .is_some_and(|existing| {
                    existing == url || self.resolve(existing).is_ok_and(|full| full == url)
                })
        })
    }

    /// Append link elements for stylesheets not yet in the document. Not waited on.
    pub fn add_stylesheets(
        &mut self,
        document: &mut Document,
        stylesheets: &[StylesheetLink],
        diagnostics: &mut Diagnostics,
        outbox: &mut Vec<Effect>,
    ) {
        for stylesheet in stylesheets {
            let href = self.resolve_or_keep(&stylesheet.href, diagnostics);
            if self.document_has(document, "link", "href", &href) {
                continue;
            }
            let mut attrs = vec![
                ("type".to_string(), "text/css".to_string()),
                ("rel".to_string(), "stylesheet".to_string()),
                ("href".to_string(), href.clone()),
            ];
            if let Some(media) = &stylesheet.media {
                attrs.push(("media".to_string(), media.clone()));
            }
            self.append_to_head(document, "link", attrs, diagnostics);
            outbox.push(Effect::LoadStylesheet {
                href,
                media: stylesheet.media.clone(),
            });
        }
    }

    /// Append script elements as needed. `Ready` when nothing has to be waited
    /// for; otherwise `Waiting(ticket)` until [`AssetLoader::script_loaded`] has
    /// seen every url of the batch.
    pub fn add_scripts<S: AsRef<str>>(
        &mut self,
        document: &mut Document,
        scripts: &[S],
        ticket: Ticket,
        diagnostics: &mut Diagnostics,
        outbox: &mut Vec<Effect>,
    ) -> Readiness {
        let mut waiting = BTreeSet::new();

        for script in scripts {
            let url = self.resolve_or_keep(script.as_ref(), diagnostics);
            if self.virtual_scripts.contains(&url) {
                continue;
            }
            if self.in_flight.contains(&url) {
                waiting.insert(url);
                continue;
            }
            if self.loaded.contains(&url) || self.document_has(document, "script", "src", &url) {
                continue;
            }

            self.append_to_head(
                document,
                "script",
                vec![
                    ("src".to_string(), url.clone()),
                    ("type".to_string(), "text/javascript".to_string()),
                ],
                diagnostics,
            );
            self.loaded.insert(url.clone());
            self.in_flight.insert(url.clone());
            outbox.push(Effect::LoadScript { url: url.clone() });
            waiting.insert(url);
        }

        if waiting.is_empty() {
            return Readiness::Ready;
        }
        tracing::debug!(%ticket, scripts = waiting.len(), "waiting for scripts");
        self.batches.push(Batch { ticket, waiting });
        Readiness::Waiting(ticket)
    }

    /// A script finished loading. Returns the batches it completed, oldest first.
    pub fn script_loaded(&mut self, url: &str, diagnostics: &mut Diagnostics) -> Vec<Ticket> {
        let url = self.resolve_or_keep(url, diagnostics);
        if !self.in_flight.remove(&url) {
            diagnostics.debug(format!("ignoring load of '{url}', it was not requested"), Some(url.as_str()));
            return Vec::new();
        }
        let mut completed = Vec::new();
        self.batches.retain_mut(|batch| {
            batch.waiting.remove(&url);
            if batch.waiting.is_empty() {
                completed.push(batch.ticket);
                false
            } else {
                true
            }
        });
        completed
    }

    fn append_to_head(
        &self,
        document: &mut Document,
        tag: &str,
        attrs: Vec<(String, String)>,
        diagnostics: &mut Diagnostics,
    ) -> NodeId {
        let head = document.head();
        let node = document.create_element(tag, attrs);
        if let Err(err) = document.append_child(head, node) {
            diagnostics.error(err.to_string(), Some(tag));
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fixture() -> (AssetLoader, Document, Diagnostics) {
        let document = Document::parse(
            r#"<html><head><script src="/js/core.js"></script></head><body></body></html>"#,
        );
        let mut diagnostics = Diagnostics::new(true);
        let mut loader = AssetLoader::new("http://shop.test");
        loader.seed(&document, &mut diagnostics);
        (loader, document, diagnostics)
    }

    #[test]
    fn test_resolve() {
        let loader = AssetLoader::new("https://a.test");
        assert_eq!(loader.resolve("/x.js").unwrap(), "https://a.test/x.js");
        assert_eq!(loader.resolve("HTTP://b.test/y.js").unwrap(), "HTTP://b.test/y.js");
        assert_eq!(
            loader.resolve("x.js"),
            Err(ConfigError::RelativeUrl("x.js".to_string()))
        );
    }

    #[test]
    fn test_empty_batch_is_ready() {
        let (mut loader, mut document, mut diagnostics) = fixture();
        let mut outbox = Vec::new();
        let scripts = ["/js/core.js"];
        let readiness =
            loader.add_scripts(&mut document, &scripts, Ticket(1), &mut diagnostics, &mut outbox);
        assert_eq!(readiness, Readiness::Ready);
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_virtual_scripts_are_skipped() {
        let (mut loader, mut document, mut diagnostics) = fixture();
        loader.register_virtual(&["/js/a.js", "/js/b.js"], &mut diagnostics);
        let mut outbox = Vec::new();
        let readiness = loader.add_scripts(
            &mut document,
            &["/js/a.js", "http://shop.test/js/b.js"],
            Ticket(1),
            &mut diagnostics,
            &mut outbox,
        );
        assert_eq!(readiness, Readiness::Ready);
        assert_eq!(document.select_tags(document.root(), &["script"]).len(), 1);
    }

    #[test]
    fn test_batch_completes_after_every_script() {
        let (mut loader, mut document, mut diagnostics) = fixture();
        let mut outbox = Vec::new();
        let readiness = loader.add_scripts(
            &mut document,
            &["/js/a.js", "/js/b.js"],
            Ticket(7),
            &mut diagnostics,
            &mut outbox,
        );
        assert_eq!(readiness, Readiness::Waiting(Ticket(7)));
        assert_eq!(
            outbox,
            vec![
                Effect::LoadScript { url: "http://shop.test/js/a.js".into() },
                Effect::LoadScript { url: "http://shop.test/js/b.js".into() },
            ]
        );

        assert!(loader.script_loaded("/js/b.js", &mut diagnostics).is_empty());
        assert_eq!(loader.script_loaded("/js/a.js", &mut diagnostics), vec![Ticket(7)]);
        assert_eq!(loader.pending_batches(), 0);
        assert!(loader.is_loaded("http://shop.test/js/a.js"));
    }

    #[test]
    fn test_overlapping_batches_share_one_load() {
        let (mut loader, mut document, mut diagnostics) = fixture();
        let mut outbox = Vec::new();
        loader.add_scripts(&mut document, &["/js/a.js"], Ticket(1), &mut diagnostics, &mut outbox);
        let second =
            loader.add_scripts(&mut document, &["/js/a.js"], Ticket(2), &mut diagnostics, &mut outbox);

        assert_eq!(second, Readiness::Waiting(Ticket(2)));
        assert_eq!(outbox.len(), 1);
        assert_eq!(
            loader.script_loaded("http://shop.test/js/a.js", &mut diagnostics),
            vec![Ticket(1), Ticket(2)]
        );
        // A second notification for the same url changes nothing.
        assert!(loader.script_loaded("/js/a.js", &mut diagnostics).is_empty());
        assert_eq!(document.select_tags(document.root(), &["script"]).len(), 2);
    }

    #[test]
    fn test_stylesheets_are_deduplicated() {
        let (mut loader, mut document, mut diagnostics) = fixture();
        let mut outbox = Vec::new();
        let sheets = vec![
            StylesheetLink { href: "/css/a.css".into(), media: Some("print".into()) },
            StylesheetLink { href: "/css/a.css".into(), media: None },
        ];
        loader.add_stylesheets(&mut document, &sheets, &mut diagnostics, &mut outbox);
        assert_eq!(outbox.len(), 1);
        let link = document.select_tags(document.root(), &["link"])[0];
        assert_eq!(document.element(link).unwrap().attr("media"), Some("print"));
    }
}
