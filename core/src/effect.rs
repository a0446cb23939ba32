//! # Effects
//!
//! Everything the runtime wants the outside world to do. The runtime appends
//! effects to its outbox; the host drains and performs them, feeding
//! completions (fetch replies, script loads) back in.

use crate::dom::NodeId;
use crate::request::{Ticket, UpdateRequest};

/// Visual transition played on an element. Timing is the host's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementEffect {
    Show,
    Highlight { color: Option<String> },
    SlideDown,
    SlideUp,
    Fade,
}

impl ElementEffect {
    /// Resolve an effect by its configuration name (case-insensitive).
    pub fn named(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "show" | "appear" => Some(Self::Show),
            "highlight" => Some(Self::Highlight { color: None }),
            "slidedown" => Some(Self::SlideDown),
            "slideup" => Some(Self::SlideUp),
            "fade" | "hide" => Some(Self::Fade),
            _ => None,
        }
    }

    /// Visibility of the element once the effect has played, `None` when unchanged.
    pub fn visibility_after(&self) -> Option<bool> {
        match self {
            Self::Show | Self::SlideDown => Some(true),
            Self::SlideUp | Self::Fade => Some(false),
            Self::Highlight { .. } => None,
        }
    }
}

/// Events published to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    ZoneUpdated { zone: NodeId },
    FocusChanged { field: NodeId },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch { ticket: Ticket, request: UpdateRequest },
    LoadScript { url: String },
    LoadStylesheet { href: String, media: Option<String> },
    Navigate { url: String },
    Eval { script: String },
    Animate { element: NodeId, effect: ElementEffect },
    ShowErrorPopup { field: NodeId, message: String },
    HideErrorPopup { field: NodeId },
    Focus { element: NodeId },
    NativeSubmit { form: NodeId },
    Notify(Notification),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_effects() {
        assert_eq!(ElementEffect::named("SlideDown"), Some(ElementEffect::SlideDown));
        assert_eq!(
            ElementEffect::named("highlight"),
            Some(ElementEffect::Highlight { color: None })
        );
        assert_eq!(ElementEffect::named("wobble"), None);
    }

    #[test]
    fn test_visibility_after() {
        assert_eq!(ElementEffect::Show.visibility_after(), Some(true));
        assert_eq!(ElementEffect::SlideUp.visibility_after(), Some(false));
        assert_eq!(
            ElementEffect::Highlight { color: Some("#fff".into()) }.visibility_after(),
            None
        );
    }
}
