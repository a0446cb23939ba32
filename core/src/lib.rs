//! # trellis-core
//!
//! The sans-IO data model shared by every Trellis crate: the arena document,
//! per-element extension records, keyed channels, the update payload and request
//! types, the effects a page asks its host to perform, configuration and errors.

pub mod channel;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod dom;
pub mod effect;
pub mod error;
pub mod init;
pub mod payload;
pub mod registry;
pub mod request;

pub use channel::Channel;
pub use config::{NumberSymbols, RuntimeConfig};
pub use context::PageContext;
pub use diagnostics::{Diagnostic, DiagnosticLevel, Diagnostics};
pub use dom::{Document, Element, NodeId, Position};
pub use effect::{Effect, ElementEffect, Notification};
pub use error::{ConfigError, DomError, PayloadError, TransportError};
pub use init::{Initializer, ValidatorSpec};
pub use payload::{StylesheetLink, UpdatePayload};
pub use registry::{Extensions, Registry};
pub use request::{FetchReply, Ticket, UpdateRequest};

pub mod prelude {
    pub use crate::config::RuntimeConfig;
    pub use crate::dom::{Document, NodeId};
    pub use crate::effect::{Effect, ElementEffect, Notification};
    pub use crate::error::{ConfigError, TransportError};
    pub use crate::payload::UpdatePayload;
    pub use crate::request::{FetchReply, Ticket, UpdateRequest};
}
