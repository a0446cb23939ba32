//! # Trellis Runtime
//!
//! The client-side controllers of a partial-update page: asset loading, field
//! and form validation, zones, conditional fragments and row injection, all
//! driven through a sans-IO [`Page`].

pub mod action;
pub mod asset;
pub mod bootstrap;
pub mod field;
pub mod form;
pub mod fragment;
pub mod injector;
pub mod page;
pub mod validator;
pub mod zone;

pub mod prelude {
    pub use crate::field::{FieldState, Translated};
    pub use crate::form::{FormPhase, FormState, SubmitOutcome};
    pub use crate::page::Page;
    pub use crate::validator::ValidatorRegistry;
    pub use crate::zone::ZoneState;
}

pub use action::{Action, Tracking};
pub use asset::{AssetLoader, Readiness};
pub use field::{FieldState, Translated};
pub use form::{FormPhase, FormState, SubmitOutcome};
pub use fragment::FragmentState;
pub use injector::InjectorState;
pub use page::Page;
pub use validator::{NumberFormatError, ValidatorRegistry, parse_localized_number};
pub use zone::{ZoneState, ZoneUpdater};
