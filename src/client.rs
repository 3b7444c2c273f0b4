//! Request-building test client.
//!
//! `TestClient` owns the default request state (headers, cookies, auth,
//! middleware toggles) applied to every request it dispatches, and hands
//! the actual dispatching to the redirect driver.

use std::collections::{HashMap, HashSet};

use reqwest::Method;
use serde::Serialize;

use crate::auth::Auth;
use crate::config::{DriverConfig, MethodRewrite};
use crate::error::Result;
use crate::kernel::{Kernel, TerminateListener};
use crate::redirect::{RedirectDriver, ResponseTrace};
use crate::request::{MiddlewareFilter, RequestDescriptor};
use crate::response::Response;

pub struct TestClient<K: Kernel> {
    kernel: K,
    driver: DriverConfig,
    default_headers: HashMap<String, String>,
    default_cookies: HashMap<String, String>,
    unencrypted_cookies: HashMap<String, String>,
    encrypt_cookies: bool,
    with_credentials: bool,
    follow_redirects: bool,
    middleware_filter: MiddlewareFilter,
    terminate_listeners: Vec<TerminateListener>,
}

impl<K: Kernel> TestClient<K> {
    pub fn new(kernel: K) -> Self {
        TestClient {
            kernel,
            driver: DriverConfig::default(),
            default_headers: HashMap::new(),
            default_cookies: HashMap::new(),
            unencrypted_cookies: HashMap::new(),
            encrypt_cookies: true,
            with_credentials: false,
            follow_redirects: false,
            middleware_filter: MiddlewareFilter::None,
            terminate_listeners: Vec::new(),
        }
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Set the referer header for the next requests, as if navigating from
    /// the given URL.
    pub fn from(&mut self, url: &str) -> &mut Self {
        self.default_headers
            .insert("referer".to_string(), url.to_string());
        self
    }

    pub fn with_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.default_headers
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_headers(&mut self, headers: HashMap<String, String>) -> &mut Self {
        self.default_headers.extend(headers);
        self
    }

    /// Set a bearer token on the Authorization header.
    pub fn with_token(&mut self, token: &str) -> &mut Self {
        self.with_token_type(token, "Bearer")
    }

    /// Set the Authorization header with an explicit scheme.
    pub fn with_token_type(&mut self, token: &str, scheme: &str) -> &mut Self {
        self.default_headers
            .insert("Authorization".to_string(), Auth::token(scheme, token));
        self
    }

    /// Set basic credentials on the Authorization header.
    pub fn with_basic_auth(&mut self, username: &str, password: &str) -> &mut Self {
        self.default_headers
            .insert("Authorization".to_string(), Auth::basic(username, password));
        self
    }

    /// Remove any Authorization header.
    pub fn without_token(&mut self) -> &mut Self {
        self.default_headers
            .retain(|key, _| !key.eq_ignore_ascii_case("authorization"));
        self
    }

    pub fn with_cookie(&mut self, name: &str, value: &str) -> &mut Self {
        self.default_cookies
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Merge cookies into the defaults; later values overwrite earlier ones.
    pub fn with_cookies(&mut self, cookies: HashMap<String, String>) -> &mut Self {
        self.default_cookies.extend(cookies);
        self
    }

    pub fn with_unencrypted_cookie(&mut self, name: &str, value: &str) -> &mut Self {
        self.unencrypted_cookies
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_unencrypted_cookies(&mut self, cookies: HashMap<String, String>) -> &mut Self {
        self.unencrypted_cookies.extend(cookies);
        self
    }

    pub fn default_cookies(&self) -> &HashMap<String, String> {
        &self.default_cookies
    }

    pub fn unencrypted_cookies(&self) -> &HashMap<String, String> {
        &self.unencrypted_cookies
    }

    pub fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Attach default cookies verbatim instead of marking them for
    /// encryption by the kernel.
    pub fn disable_cookie_encryption(&mut self) -> &mut Self {
        self.encrypt_cookies = false;
        self
    }

    pub fn with_credentials(&mut self) -> &mut Self {
        self.with_credentials = true;
        self
    }

    pub fn without_credentials(&mut self) -> &mut Self {
        self.with_credentials = false;
        self
    }

    /// Cookies attached to a JSON request: nothing unless credentials are
    /// enabled, otherwise both cookie maps merged.
    pub fn cookies_for_json_request(&self) -> HashMap<String, String> {
        if !self.with_credentials {
            return HashMap::new();
        }
        let mut merged = self.default_cookies.clone();
        merged.extend(self.unencrypted_cookies.clone());
        merged
    }

    /// Skip the whole middleware pipeline.
    pub fn without_middleware(&mut self) -> &mut Self {
        self.middleware_filter = MiddlewareFilter::All;
        self
    }

    /// Skip a single named middleware.
    pub fn without_middleware_named(&mut self, name: &str) -> &mut Self {
        match &mut self.middleware_filter {
            MiddlewareFilter::Named(names) => {
                names.insert(name.to_string());
            }
            MiddlewareFilter::None => {
                let mut names = HashSet::new();
                names.insert(name.to_string());
                self.middleware_filter = MiddlewareFilter::Named(names);
            }
            MiddlewareFilter::All => {}
        }
        self
    }

    /// Restore the full middleware pipeline.
    pub fn with_middleware(&mut self) -> &mut Self {
        self.middleware_filter = MiddlewareFilter::None;
        self
    }

    /// Re-enable a single named middleware.
    pub fn with_middleware_named(&mut self, name: &str) -> &mut Self {
        if let MiddlewareFilter::Named(names) = &mut self.middleware_filter {
            names.remove(name);
            if names.is_empty() {
                self.middleware_filter = MiddlewareFilter::None;
            }
        }
        self
    }

    pub fn middleware_filter(&self) -> &MiddlewareFilter {
        &self.middleware_filter
    }

    /// Follow redirect responses instead of returning them.
    pub fn following_redirects(&mut self) -> &mut Self {
        self.follow_redirects = true;
        self
    }

    pub fn max_redirects(&mut self, limit: usize) -> &mut Self {
        self.driver.max_redirects = limit;
        self
    }

    pub fn method_rewrite(&mut self, policy: MethodRewrite) -> &mut Self {
        self.driver.method_rewrite = policy;
        self
    }

    /// Keep Authorization/cookies on redirects that leave the origin.
    pub fn trust_cross_origin(&mut self) -> &mut Self {
        self.driver.trust_cross_origin = true;
        self
    }

    /// Register a listener fired after each dispatched request resolves.
    pub fn on_terminate<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&RequestDescriptor, &Response) + Send + Sync + 'static,
    {
        self.terminate_listeners.push(Box::new(listener));
        self
    }

    pub async fn get(&self, target: &str) -> Result<ResponseTrace> {
        self.call(Method::GET, target, None).await
    }

    pub async fn head(&self, target: &str) -> Result<ResponseTrace> {
        self.call(Method::HEAD, target, None).await
    }

    pub async fn options(&self, target: &str) -> Result<ResponseTrace> {
        self.call(Method::OPTIONS, target, None).await
    }

    pub async fn post(&self, target: &str, body: impl Into<String>) -> Result<ResponseTrace> {
        self.call(Method::POST, target, Some(body.into())).await
    }

    pub async fn put(&self, target: &str, body: impl Into<String>) -> Result<ResponseTrace> {
        self.call(Method::PUT, target, Some(body.into())).await
    }

    pub async fn patch(&self, target: &str, body: impl Into<String>) -> Result<ResponseTrace> {
        self.call(Method::PATCH, target, Some(body.into())).await
    }

    pub async fn delete(&self, target: &str) -> Result<ResponseTrace> {
        self.call(Method::DELETE, target, None).await
    }

    pub async fn get_json(&self, target: &str) -> Result<ResponseTrace> {
        self.call_json(Method::GET, target, None).await
    }

    pub async fn post_json<T: Serialize>(&self, target: &str, body: &T) -> Result<ResponseTrace> {
        self.call_json(Method::POST, target, Some(serde_json::to_string(body)?))
            .await
    }

    pub async fn put_json<T: Serialize>(&self, target: &str, body: &T) -> Result<ResponseTrace> {
        self.call_json(Method::PUT, target, Some(serde_json::to_string(body)?))
            .await
    }

    pub async fn patch_json<T: Serialize>(&self, target: &str, body: &T) -> Result<ResponseTrace> {
        self.call_json(Method::PATCH, target, Some(serde_json::to_string(body)?))
            .await
    }

    pub async fn delete_json(&self, target: &str) -> Result<ResponseTrace> {
        self.call_json(Method::DELETE, target, None).await
    }

    /// Dispatch with the client's default state applied.
    pub async fn call(
        &self,
        method: Method,
        target: &str,
        body: Option<String>,
    ) -> Result<ResponseTrace> {
        let request = self.build_request(method, target, body);
        self.dispatch(request).await
    }

    async fn call_json(
        &self,
        method: Method,
        target: &str,
        body: Option<String>,
    ) -> Result<ResponseTrace> {
        let mut request = self.build_request(method, target, body);
        request
            .headers
            .entry("Accept".to_string())
            .or_insert_with(|| "application/json".to_string());
        if request.body.is_some() {
            request
                .headers
                .entry("Content-Type".to_string())
                .or_insert_with(|| "application/json".to_string());
        }
        // JSON requests only carry cookies when credentials are opted in.
        request.cookies = HashMap::new();
        request.unencrypted_cookies = self.cookies_for_json_request();
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: RequestDescriptor) -> Result<ResponseTrace> {
        let driver = RedirectDriver::new(&self.kernel, self.driver.clone())
            .with_listeners(&self.terminate_listeners);
        if self.follow_redirects {
            driver.follow(request).await
        } else {
            driver.dispatch_once(request).await
        }
    }

    fn build_request(
        &self,
        method: Method,
        target: &str,
        body: Option<String>,
    ) -> RequestDescriptor {
        let mut request = RequestDescriptor::new(method, target);
        request.headers = self.default_headers.clone();
        if self.encrypt_cookies {
            request.cookies = self.default_cookies.clone();
        } else {
            request.unencrypted_cookies = self.default_cookies.clone();
        }
        request
            .unencrypted_cookies
            .extend(self.unencrypted_cookies.clone());
        request.body = body;
        request.with_credentials = self.with_credentials;
        request.middleware_filter = self.middleware_filter.clone();
        request
    }
}
