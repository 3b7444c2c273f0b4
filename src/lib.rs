//! retrace - an in-process HTTP test client with redirect tracing
//!
//! This crate drives HTTP-like requests against an application entry point
//! (a [`Kernel`]), follows redirect responses, and records the chain of
//! visited locations so tests can assert on both the final destination and
//! the intermediate hops.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod kernel;
pub mod logging;
pub mod redirect;
pub mod request;
pub mod response;

pub use client::TestClient;
pub use error::{Result, RetraceError};
pub use kernel::Kernel;
pub use redirect::{RedirectChain, RedirectDriver, ResponseTrace};
pub use request::RequestDescriptor;
pub use response::Response;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
