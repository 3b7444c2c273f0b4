//! Redirect-following request driver.
//!
//! Dispatches a request through a [`Kernel`], follows redirect responses
//! until a terminal response or the hop limit, and records every visited
//! location for later assertions.

use log::debug;
use reqwest::{Method, StatusCode};
use url::Url;

use crate::config::{DriverConfig, MethodRewrite};
use crate::error::{Result, RetraceError};
use crate::kernel::{Kernel, TerminateListener};
use crate::request::RequestDescriptor;
use crate::response::Response;

/// Ordered record of the locations visited during one driver run.
///
/// The first element is the initial target; each redirect appends the
/// location it pointed at. The last element is therefore the location of
/// the terminal non-redirect response.
#[derive(Debug, Clone, Default)]
pub struct RedirectChain {
    locations: Vec<String>,
}

impl RedirectChain {
    fn push(&mut self, location: String) {
        self.locations.push(location);
    }

    /// Every visited location, in request order.
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// The location of the terminal response.
    pub fn final_location(&self) -> Option<&str> {
        self.locations.last().map(String::as_str)
    }

    /// Locations between the initial target and the final destination.
    pub fn intermediates(&self) -> &[String] {
        if self.locations.len() < 3 {
            return &[];
        }
        &self.locations[1..self.locations.len() - 1]
    }

    /// Whether the run was redirected through the given location.
    pub fn passed_through(&self, location: &str) -> bool {
        self.intermediates().iter().any(|hop| hop == location)
    }

    /// Number of redirects followed.
    pub fn hops(&self) -> usize {
        self.locations.len().saturating_sub(1)
    }
}

/// A terminal response together with the chain that led to it.
#[derive(Debug)]
pub struct ResponseTrace {
    pub response: Response,
    pub chain: RedirectChain,
}

/// Drives requests through a kernel, following redirects.
pub struct RedirectDriver<'a, K: Kernel> {
    kernel: &'a K,
    config: DriverConfig,
    listeners: &'a [TerminateListener],
}

impl<'a, K: Kernel> RedirectDriver<'a, K> {
    pub fn new(kernel: &'a K, config: DriverConfig) -> Self {
        RedirectDriver {
            kernel,
            config,
            listeners: &[],
        }
    }

    /// Fire the given listeners after each dispatched request resolves.
    pub fn with_listeners(mut self, listeners: &'a [TerminateListener]) -> Self {
        self.listeners = listeners;
        self
    }

    /// Dispatch once without following redirects. The chain holds only the
    /// initial target.
    pub async fn dispatch_once(&self, request: RequestDescriptor) -> Result<ResponseTrace> {
        let mut chain = RedirectChain::default();
        chain.push(request.target.clone());
        let response = self.resolve(&request).await?;
        Ok(ResponseTrace { response, chain })
    }

    /// Dispatch the request and follow redirects until a non-redirect
    /// response, or fail with [`RetraceError::RedirectLoop`] once the hop
    /// limit is exceeded. Dispatch failures propagate unchanged.
    pub async fn follow(&self, request: RequestDescriptor) -> Result<ResponseTrace> {
        let mut request = request;
        let mut chain = RedirectChain::default();
        chain.push(request.target.clone());
        let mut hops = 0usize;

        loop {
            let response = self.resolve(&request).await?;

            if !response.is_redirect() {
                return Ok(ResponseTrace { response, chain });
            }
            if hops >= self.config.max_redirects {
                return Err(RetraceError::RedirectLoop(self.config.max_redirects));
            }

            let location = response.location().ok_or(RetraceError::MissingLocation)?;
            let next_target = resolve_location(&request.target, location)?;
            debug!(
                "redirect hop {}: {} -> {} ({})",
                hops + 1,
                request.target,
                next_target,
                response.status
            );

            chain.push(next_target.clone());
            request = self.next_request(request, next_target, response.status);
            hops += 1;
        }
    }

    async fn resolve(&self, request: &RequestDescriptor) -> Result<Response> {
        let response = self.kernel.dispatch(request.clone()).await?;
        for listener in self.listeners {
            listener(request, &response);
        }
        Ok(response)
    }

    /// Build the descriptor for the next hop: same headers and cookie
    /// policy, method rewritten per the configured policy, credentials
    /// stripped when leaving the origin.
    fn next_request(
        &self,
        previous: RequestDescriptor,
        target: String,
        status: StatusCode,
    ) -> RequestDescriptor {
        let mut next = previous;

        let (method, keep_body) = rewrite_method(next.method.clone(), status, self.config.method_rewrite);
        next.method = method;
        if !keep_body {
            next.body = None;
        }

        if !self.config.trust_cross_origin && !same_origin(&next.target, &target) {
            next.remove_header("authorization");
            next.remove_header("cookie");
            next.cookies.clear();
            next.unencrypted_cookies.clear();
            next.with_credentials = false;
        }

        next.target = target;
        next
    }
}

fn rewrite_method(method: Method, status: StatusCode, policy: MethodRewrite) -> (Method, bool) {
    if policy == MethodRewrite::Never {
        return (method, true);
    }
    match status.as_u16() {
        // 307/308 always replay the original request.
        307 | 308 => (method, true),
        301 | 302 | 303 => {
            if method == Method::GET || method == Method::HEAD {
                (method, true)
            } else {
                (Method::GET, false)
            }
        }
        _ => (method, true),
    }
}

/// Resolve a Location header against the current target. Absolute locations
/// win; relative ones are joined onto an absolute current target, or kept
/// verbatim for in-process path targets.
fn resolve_location(current: &str, location: &str) -> Result<String> {
    if Url::parse(location).is_ok() {
        return Ok(location.to_string());
    }
    if let Ok(base) = Url::parse(current) {
        let resolved = base.join(location).map_err(|e| {
            RetraceError::InvalidUrl(format!("Invalid Location '{}': {}", location, e))
        })?;
        return Ok(resolved.to_string());
    }
    Ok(location.to_string())
}

/// In-process path targets never change origin; absolute targets compare
/// their URL origins.
fn same_origin(current: &str, next: &str) -> bool {
    match (Url::parse(current), Url::parse(next)) {
        (Ok(a), Ok(b)) => a.origin() == b.origin(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_accessors() {
        let mut chain = RedirectChain::default();
        chain.push("/a".to_string());
        chain.push("/b".to_string());
        chain.push("/c".to_string());

        assert_eq!(chain.final_location(), Some("/c"));
        assert_eq!(chain.intermediates(), ["/b".to_string()]);
        assert!(chain.passed_through("/b"));
        assert!(!chain.passed_through("/c"));
        assert_eq!(chain.hops(), 2);
    }

    #[test]
    fn single_entry_chain_has_no_intermediates() {
        let mut chain = RedirectChain::default();
        chain.push("/a".to_string());

        assert_eq!(chain.final_location(), Some("/a"));
        assert!(chain.intermediates().is_empty());
        assert_eq!(chain.hops(), 0);
    }

    #[test]
    fn standard_rewrite_downgrades_post_on_302() {
        let (method, keep_body) =
            rewrite_method(Method::POST, StatusCode::FOUND, MethodRewrite::Standard);
        assert_eq!(method, Method::GET);
        assert!(!keep_body);
    }

    #[test]
    fn standard_rewrite_preserves_method_on_307() {
        let (method, keep_body) = rewrite_method(
            Method::POST,
            StatusCode::TEMPORARY_REDIRECT,
            MethodRewrite::Standard,
        );
        assert_eq!(method, Method::POST);
        assert!(keep_body);
    }

    #[test]
    fn never_rewrite_keeps_method_and_body() {
        let (method, keep_body) =
            rewrite_method(Method::POST, StatusCode::SEE_OTHER, MethodRewrite::Never);
        assert_eq!(method, Method::POST);
        assert!(keep_body);
    }

    #[test]
    fn location_resolution() {
        assert_eq!(
            resolve_location("http://a.test/start", "/final").expect("should resolve"),
            "http://a.test/final"
        );
        assert_eq!(
            resolve_location("http://a.test/start", "http://b.test/final")
                .expect("should resolve"),
            "http://b.test/final"
        );
        assert_eq!(
            resolve_location("/start", "/final").expect("should resolve"),
            "/final"
        );
    }

    #[test]
    fn origin_comparison() {
        assert!(same_origin("http://a.test/x", "http://a.test/y"));
        assert!(!same_origin("http://a.test/x", "http://b.test/y"));
        assert!(same_origin("/x", "/y"));
    }
}
