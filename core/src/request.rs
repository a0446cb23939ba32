use crate::error::TransportError;
use http::{HeaderMap, Method, StatusCode};
use serde::{Deserialize, Serialize};

/// Correlates an issued fetch (or asset batch) with its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ticket(pub u64);

impl std::fmt::Display for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A partial-update request: form-encoded parameters posted to a component-event URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub url: String,
    pub method: Method,
    pub parameters: Vec<(String, String)>,
}

impl UpdateRequest {
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::POST,
            parameters: Vec::new(),
        }
    }

    /// Set a parameter, overwriting every earlier value under the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.parameters.retain(|(k, _)| *k != name);
        self.parameters.push((name, value.into()));
    }

    /// Append a parameter, keeping earlier values (repeated form controls).
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.push((name.into(), value.into()));
    }

    /// Merge `extra`; later names win over earlier ones.
    pub fn merge<'a>(&mut self, extra: impl IntoIterator<Item = (&'a String, &'a String)>) {
        for (name, value) in extra {
            self.set(name.clone(), value.clone());
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn encode_body(&self) -> Result<String, TransportError> {
        Ok(serde_urlencoded::to_string(&self.parameters)?)
    }
}

/// What the transport brings back for a [`UpdateRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchReply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl FetchReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites_and_append_repeats() {
        let mut request = UpdateRequest::post("/page.zone");
        request.append("tag", "a");
        request.append("tag", "b");
        request.set("t:zoneid", "z1");
        request.set("t:zoneid", "z2");

        assert_eq!(request.parameter("t:zoneid"), Some("z2"));
        assert_eq!(request.parameters.len(), 3);
        assert_eq!(
            request.encode_body().unwrap(),
            "tag=a&tag=b&t%3Azoneid=z2"
        );
    }

    #[test]
    fn test_reply_header_lookup_is_case_insensitive() {
        let mut reply = FetchReply::ok("{}");
        reply.status = StatusCode::INTERNAL_SERVER_ERROR;
        reply
            .headers
            .insert("x-trellis-errormessage", "boom".parse().unwrap());
        assert!(!reply.is_success());
        assert_eq!(reply.header("X-Trellis-ErrorMessage"), Some("boom"));
    }
}
