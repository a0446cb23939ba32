use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use trellis_core::{FetchReply, PageContext, TransportError, UpdateRequest};

/// Performs the network side of a page: partial-update requests and asset loads.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send an update request. A non-2xx reply is still `Ok`; the page decides
    /// what a failed status means.
    async fn fetch(&self, request: &UpdateRequest) -> Result<FetchReply, TransportError>;

    /// Load an asset (script, stylesheet, document) and return its body.
    async fn load_asset(&self, url: &str) -> Result<String, TransportError>;
}

/// [`Transport`] over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    origin: String,
}

impl ReqwestTransport {
    /// Root-relative urls are sent to the origin of `location`.
    pub fn new(location: &str) -> Self {
        Self::with_client(reqwest::Client::new(), location)
    }

    pub fn with_client(client: reqwest::Client, location: &str) -> Self {
        Self {
            client,
            origin: PageContext::new(location).origin().to_string(),
        }
    }

    fn absolute(&self, url: &str) -> String {
        let lower = url.to_ascii_lowercase();
        if lower.starts_with("http:") || lower.starts_with("https:") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.origin, url)
        } else {
            format!("{}/{}", self.origin, url)
        }
    }
}

fn network(err: reqwest::Error) -> TransportError {
    TransportError::Network(err.to_string())
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, request: &UpdateRequest) -> Result<FetchReply, TransportError> {
        let body = request.encode_body()?;
        let response = self
            .client
            .request(request.method.clone(), self.absolute(&request.url))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(network)?;
        Ok(FetchReply {
            status,
            headers,
            body,
        })
    }

    async fn load_asset(&self, url: &str) -> Result<String, TransportError> {
        let response = self
            .client
            .get(self.absolute(url))
            .send()
            .await
            .map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status,
                message: format!("loading {url}"),
            });
        }
        response.text().await.map_err(network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_urls() {
        let transport = ReqwestTransport::new("https://shop.test/cart?x=1");
        assert_eq!(transport.absolute("/cart.refresh"), "https://shop.test/cart.refresh");
        assert_eq!(transport.absolute("https://cdn.test/a.js"), "https://cdn.test/a.js");
        assert_eq!(transport.absolute("a.js"), "https://shop.test/a.js");
    }
}
