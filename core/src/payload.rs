//! # Update Payload
//!
//! The JSON body of a partial-update reply. Every member is optional; an empty
//! object is a valid (no-op) update.

use crate::error::PayloadError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stylesheet reference declared by a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StylesheetLink {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePayload {
    /// When present, the page navigates here and nothing else is processed.
    #[serde(default, rename = "redirectURL", skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,

    /// Markup for the zone that issued the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Markup for other zones, keyed by zone element id, in reply order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub zones: IndexMap<String, String>,

    /// Inline code, handed to the host after content is applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scripts: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stylesheets: Vec<StylesheetLink>,

    /// Initializer specs to dispatch once the new markup is in place.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inits: Vec<Value>,

    /// Id assigned to an element created by a row injector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
}

impl UpdatePayload {
    pub fn from_json(body: &str) -> Result<Self, PayloadError> {
        let value: Value = serde_json::from_str(body)?;
        if !value.is_object() {
            return Err(PayloadError::NotAnObject);
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn is_redirect(&self) -> bool {
        self.redirect_url.is_some()
    }

    /// Single-region content, treating an empty string as absent.
    pub fn primary_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}
