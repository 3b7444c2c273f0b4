//! HTTP responses as seen by the driver

use std::collections::HashMap;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// A resolved response from a kernel dispatch.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Response {
            status,
            headers: HashMap::new(),
            body: String::new(),
        }
    }

    /// Build a 200 response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Response {
            status: StatusCode::OK,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Build a redirect response pointing at a location.
    pub fn redirect_to(location: impl Into<String>) -> Self {
        Self::redirect_with_status(StatusCode::FOUND, location)
    }

    /// Build a redirect with an explicit 3xx status.
    pub fn redirect_with_status(status: StatusCode, location: impl Into<String>) -> Self {
        let mut response = Response::new(status);
        response
            .headers
            .insert("Location".to_string(), location.into());
        response
    }

    /// Whether the status class is a redirection with a followable target.
    ///
    /// 304 Not Modified carries no Location and is not followed.
    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection() && self.status != StatusCode::NOT_MODIFIED
    }

    /// The Location header, if present.
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Convert a resolved reqwest response, draining its body.
    pub async fn from_reqwest(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.to_string(), value.to_string());
            }
        }
        let body = response.text().await?;
        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_predicate_covers_3xx_but_not_304() {
        assert!(Response::redirect_to("/next").is_redirect());
        assert!(Response::redirect_with_status(StatusCode::MOVED_PERMANENTLY, "/next").is_redirect());
        assert!(!Response::ok("done").is_redirect());
        assert!(!Response::new(StatusCode::NOT_MODIFIED).is_redirect());
    }

    #[test]
    fn location_lookup_is_case_insensitive() {
        let mut response = Response::new(StatusCode::FOUND);
        response
            .headers
            .insert("location".to_string(), "/elsewhere".to_string());
        assert_eq!(response.location(), Some("/elsewhere"));
    }

    #[test]
    fn json_body_deserializes() {
        let mut response = Response::ok(r#"{"name":"retrace"}"#);
        response
            .headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        let value: serde_json::Value = response.json().expect("body should parse");
        assert_eq!(value["name"], "retrace");
    }
}
