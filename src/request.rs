//! Request descriptors dispatched to a kernel

use std::collections::{HashMap, HashSet};

use reqwest::Method;

/// Middleware disabled for a request.
///
/// The kernel owns the middleware pipeline; the descriptor only carries which
/// pieces of it the caller asked to skip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MiddlewareFilter {
    /// Run the full pipeline.
    #[default]
    None,
    /// Skip every middleware.
    All,
    /// Skip the named middleware only.
    Named(HashSet<String>),
}

impl MiddlewareFilter {
    /// Whether the named middleware should be skipped under this filter.
    pub fn disables(&self, name: &str) -> bool {
        match self {
            MiddlewareFilter::None => false,
            MiddlewareFilter::All => true,
            MiddlewareFilter::Named(names) => names.contains(name),
        }
    }
}

/// A request to be dispatched through a [`Kernel`](crate::kernel::Kernel).
///
/// Header and cookie maps are keyed by name; merging is last-write-wins.
/// `cookies` holds values the kernel encrypts before attaching, while
/// `unencrypted_cookies` are attached verbatim.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Path for in-process kernels, or an absolute URL for live ones.
    pub target: String,
    pub headers: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
    pub unencrypted_cookies: HashMap<String, String>,
    pub body: Option<String>,
    /// Attach cookies/credentials when dispatching.
    pub with_credentials: bool,
    pub middleware_filter: MiddlewareFilter,
}

impl RequestDescriptor {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        RequestDescriptor {
            method,
            target: target.into(),
            headers: HashMap::new(),
            cookies: HashMap::new(),
            unencrypted_cookies: HashMap::new(),
            body: None,
            with_credentials: false,
            middleware_filter: MiddlewareFilter::None,
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Remove every header matching the name, case-insensitively.
    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
    }

    /// Cookies to attach, merged across both maps with unencrypted values
    /// winning on collision. Empty unless credentials are enabled.
    pub fn cookies_for_dispatch(&self) -> HashMap<String, String> {
        if !self.with_credentials {
            return HashMap::new();
        }
        let mut merged = self.cookies.clone();
        merged.extend(self.unencrypted_cookies.clone());
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut request = RequestDescriptor::new(Method::GET, "/");
        request
            .headers
            .insert("Authorization".to_string(), "Bearer abc".to_string());

        assert_eq!(request.header("authorization"), Some("Bearer abc"));
        request.remove_header("AUTHORIZATION");
        assert_eq!(request.header("Authorization"), None);
    }

    #[test]
    fn cookies_require_credentials() {
        let mut request = RequestDescriptor::new(Method::GET, "/");
        request.cookies.insert("foo".to_string(), "bar".to_string());
        assert!(request.cookies_for_dispatch().is_empty());

        request.with_credentials = true;
        assert_eq!(
            request.cookies_for_dispatch().get("foo").map(String::as_str),
            Some("bar")
        );
    }

    #[test]
    fn unencrypted_cookies_win_on_collision() {
        let mut request = RequestDescriptor::new(Method::GET, "/");
        request.with_credentials = true;
        request.cookies.insert("foo".to_string(), "bar".to_string());
        request
            .unencrypted_cookies
            .insert("foo".to_string(), "baz".to_string());

        assert_eq!(
            request.cookies_for_dispatch().get("foo").map(String::as_str),
            Some("baz")
        );
    }
}
