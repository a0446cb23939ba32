//! # Trellis HTTP
//!
//! Network side of a Trellis page. [`Driver`] takes the effects a
//! [`trellis_runtime::Page`] produces, performs the fetches and asset loads
//! through an async [`Transport`], and returns what is left for the host.

pub mod driver;
pub mod transport;

pub mod prelude {
    pub use crate::driver::Driver;
    pub use crate::transport::{ReqwestTransport, Transport};
}

pub use driver::Driver;
pub use transport::{ReqwestTransport, Transport};
