//! Trellis facade crate.
//!
//! Re-exports the core model, the page runtime and (with the default `http`
//! feature) the reqwest transport behind a single entry point.

pub use trellis_core as core;
#[cfg(feature = "http")]
pub use trellis_http as http;
pub use trellis_runtime as runtime;

pub use trellis_core::{ConfigError, Effect, RuntimeConfig, UpdatePayload};
#[cfg(feature = "http")]
pub use trellis_http::{Driver, ReqwestTransport, Transport};
pub use trellis_runtime::Page;

use tracing_subscriber::EnvFilter;

pub mod prelude {
    pub use trellis_core::prelude::*;
    #[cfg(feature = "http")]
    pub use trellis_http::prelude::*;
    pub use trellis_runtime::prelude::*;
}

/// Initialize a simple stdout tracing subscriber for development.
/// `RUST_LOG` overrides the default filter.
pub fn init_stdout_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,trellis_runtime=debug"));

    // A subscriber installed earlier (tests, embedding hosts) stays in place.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
