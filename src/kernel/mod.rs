//! Application entry points the driver dispatches against.
//!
//! A [`Kernel`] is any in-process (or live) application that can resolve a
//! [`RequestDescriptor`] into a [`Response`]. The driver never reaches into
//! the application beyond this interface.

use crate::error::Result;
use crate::request::RequestDescriptor;
use crate::response::Response;

pub mod live;

pub use live::LiveKernel;

/// Synchronous-in-effect dispatch: the returned future fully resolves one
/// request before the caller issues the next.
#[allow(async_fn_in_trait)]
pub trait Kernel {
    async fn dispatch(&self, request: RequestDescriptor) -> Result<Response>;
}

/// Listener invoked after a dispatched request has fully resolved.
///
/// Registered explicitly on the client instead of through a process-wide
/// callback registry; each hop of a redirect-following run fires every
/// listener once, in registration order.
pub type TerminateListener = Box<dyn Fn(&RequestDescriptor, &Response) + Send + Sync>;
