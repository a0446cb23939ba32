use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use trellis_core::{Effect, FetchReply, RuntimeConfig, TransportError, UpdateRequest};
use trellis_http::{Driver, Transport};
use trellis_runtime::Page;

const PAGE: &str = r#"<html><head></head><body>
    <div id="cart"><p>empty</p></div>
    <a id="refresh" href="/cart">refresh</a>
    </body></html>"#;

/// Serves canned bodies by url and records every call.
#[derive(Default)]
struct MockTransport {
    replies: HashMap<String, String>,
    assets: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl MockTransport {
    fn reply(mut self, url: &str, body: serde_json::Value) -> Self {
        self.replies.insert(url.to_string(), body.to_string());
        self
    }

    fn asset(mut self, url: &str, body: &str) -> Self {
        self.assets.insert(url.to_string(), body.to_string());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, request: &UpdateRequest) -> Result<FetchReply, TransportError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(format!("POST {}", request.url));
        }
        self.replies
            .get(&request.url)
            .map(FetchReply::ok)
            .ok_or_else(|| TransportError::Network(format!("no route to {}", request.url)))
    }

    async fn load_asset(&self, url: &str) -> Result<String, TransportError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(format!("GET {url}"));
        }
        self.assets
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::Network(format!("no asset at {url}")))
    }
}

fn page() -> Page {
    let mut page = Page::load(PAGE, RuntimeConfig::default());
    page.init(&json!({
        "zone": {"element": "cart"},
        "linkZone": {"linkId": "refresh", "zoneId": "cart", "url": "/cart.refresh"}
    }));
    page
}

#[tokio::test]
async fn test_click_refreshes_zone_after_scripts_load() {
    let transport = MockTransport::default()
        .reply(
            "/cart.refresh",
            json!({
                "content": "<p>2 items</p>",
                "scripts": ["/js/cart.js"],
                "stylesheets": [{"href": "/css/cart.css"}],
                "script": "cart.init()"
            }),
        )
        .asset("http://localhost/js/cart.js", "var cart = {};")
        .asset("http://localhost/css/cart.css", ".cart {}");
    let driver = Driver::new(transport);

    let mut page = page();
    page.click("refresh").unwrap();
    let host = driver.run(&mut page).await;

    let cart = page.document().by_id("cart").unwrap();
    assert_eq!(page.document().inner_html(cart), "<p>2 items</p>");
    assert_eq!(
        driver.transport().calls(),
        vec![
            "POST /cart.refresh".to_string(),
            "GET http://localhost/css/cart.css".to_string(),
            "GET http://localhost/js/cart.js".to_string(),
        ]
    );
    assert_eq!(host.last(), Some(&Effect::Eval { script: "cart.init()".to_string() }));
    assert!(page.pending_tickets().is_empty());
}

#[tokio::test]
async fn test_transport_failure_is_reported_not_raised() {
    let driver = Driver::new(MockTransport::default());
    let mut page = page();
    page.click("refresh").unwrap();

    let host = driver.run(&mut page).await;
    assert!(host.is_empty());
    let errors: Vec<_> = page.diagnostics().errors().collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.starts_with("communication with the server failed"));
}

#[tokio::test]
async fn test_failed_script_keeps_content_back() {
    let transport = MockTransport::default().reply(
        "/cart.refresh",
        json!({"content": "<p>2 items</p>", "scripts": ["/js/missing.js"]}),
    );
    let driver = Driver::new(transport);
    let mut page = page();
    page.click("refresh").unwrap();
    driver.run(&mut page).await;

    let cart = page.document().by_id("cart").unwrap();
    assert_eq!(page.document().inner_html(cart), "<p>empty</p>");
    assert_eq!(page.pending_tickets().len(), 1);
}

#[tokio::test]
async fn test_open_builds_page_from_location() {
    let transport = MockTransport::default().asset("http://localhost/", PAGE);
    let driver = Driver::new(transport);
    let page = driver.open(RuntimeConfig::default()).await.unwrap();
    assert!(page.document().by_id("cart").is_some());
    assert!(page.context().page_loaded);
}
