use crate::dom::NodeId;
use http::Uri;

/// Page-wide lifecycle state, written by bootstrap and unload, read by every controller.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub page_loaded: bool,
    pub window_unloaded: bool,
    pub current_focus: Option<NodeId>,
    origin: String,
}

impl PageContext {
    pub fn new(location: &str) -> Self {
        Self {
            origin: origin_of(location),
            ..Self::default()
        }
    }

    /// `scheme://authority` of the page location, empty if it has none.
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

fn origin_of(location: &str) -> String {
    match location.parse::<Uri>() {
        Ok(uri) => match (uri.scheme_str(), uri.authority()) {
            (Some(scheme), Some(authority)) => format!("{scheme}://{authority}"),
            _ => String::new(),
        },
        Err(_) => String::new(),
    }
}
