use crate::dom::NodeId;
use http::StatusCode;
use thiserror::Error;

/// Problems in page configuration: initializer specs, validator wiring and
/// zone resolution. These are reported and skipped, never fatal to the page.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown initializer '{0}'")]
    UnknownInitializer(String),
    #[error("invalid arguments for initializer '{name}': {reason}")]
    InvalidArguments { name: String, reason: String },
    #[error("unknown validator '{0}'")]
    UnknownValidator(String),
    #[error("validator '{name}' has an invalid constraint: {reason}")]
    InvalidConstraint { name: String, reason: String },
    #[error("unable to locate zone '{0}'")]
    MissingZone(String),
    #[error("element '{0}' is not a zone (no zone manager attached)")]
    NoZoneManager(String),
    #[error("no element with id '{0}'")]
    UnresolvedElement(String),
    #[error("element '{0}' is not inside a form")]
    NotInForm(String),
    #[error("url '{0}' is relative and cannot be resolved against the page origin")]
    RelativeUrl(String),
    #[error("configuration file could not be read: {0}")]
    Io(String),
    #[error("configuration file is invalid: {0}")]
    Toml(String),
}

/// Failures of an asynchronous request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("request parameters could not be encoded: {0}")]
    Encode(String),
}

/// A reply body that is not a valid update payload.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayloadError {
    #[error("reply body is not valid JSON: {0}")]
    Json(String),
    #[error("reply body is not a JSON object")]
    NotAnObject,
}

/// Structural misuse of the document arena.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
    #[error("node {0:?} is not attached to a parent")]
    Detached(NodeId),
    #[error("node {0:?} cannot be inserted into its own subtree")]
    HierarchyRequest(NodeId),
}

impl From<DomError> for ConfigError {
    fn from(err: DomError) -> Self {
        ConfigError::InvalidArguments {
            name: "dom".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Toml(err.to_string())
    }
}

impl From<serde_json::Error> for PayloadError {
    fn from(err: serde_json::Error) -> Self {
        PayloadError::Json(err.to_string())
    }
}

impl From<serde_urlencoded::ser::Error> for TransportError {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        TransportError::Encode(err.to_string())
    }
}
