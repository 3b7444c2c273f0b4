//! Authorization header construction

use base64::Engine;

/// Authentication helper
pub struct Auth;

impl Auth {
    /// Create basic auth header value
    pub fn basic(username: &str, password: &str) -> String {
        let credentials = format!("{}:{}", username, password);
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());
        format!("Basic {}", encoded)
    }

    /// Create bearer token header value
    pub fn bearer(token: &str) -> String {
        format!("Bearer {}", token)
    }

    /// Create a header value with an arbitrary scheme, e.g. `Basic foobar`.
    pub fn token(scheme: &str, token: &str) -> String {
        format!("{} {}", scheme, token)
    }
}
