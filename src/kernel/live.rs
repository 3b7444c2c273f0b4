//! Live kernel dispatching over the network.

use reqwest::{Client, ClientBuilder};
use url::Url;

use crate::error::{Result, RetraceError};
use crate::kernel::Kernel;
use crate::request::RequestDescriptor;
use crate::response::Response;

/// A kernel backed by a real HTTP server.
///
/// Redirect policy is disabled on the underlying client so the driver, not
/// reqwest, decides whether and how to follow redirects. Descriptor targets
/// must be absolute URLs.
pub struct LiveKernel {
    client: Client,
}

impl LiveKernel {
    /// Create a live kernel with redirect handling turned off.
    pub fn new() -> Result<Self> {
        let client = ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(RetraceError::Http)?;
        Ok(Self { client })
    }

    /// Wrap a preconfigured client. The caller is responsible for keeping
    /// its redirect policy at `none`.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Kernel for LiveKernel {
    async fn dispatch(&self, request: RequestDescriptor) -> Result<Response> {
        let url = Url::parse(&request.target).map_err(|e| {
            RetraceError::InvalidUrl(format!("Invalid URL '{}': {}", request.target, e))
        })?;

        let mut builder = self.client.request(request.method.clone(), url);

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }

        // A live transport has no cookie encryption; both maps go out as a
        // plain Cookie header when credentials are enabled.
        let cookies = request.cookies_for_dispatch();
        if !cookies.is_empty() {
            let mut header_value = cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; ");
            if let Some(existing) = request.header("cookie") {
                header_value = format!("{}; {}", existing, header_value);
            }
            builder = builder.header("Cookie", header_value);
        }

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(RetraceError::Http)?;
        Response::from_reqwest(response).await
    }
}
