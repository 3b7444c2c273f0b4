//! Driver configuration for retrace

/// How the request method is rewritten when following a redirect.
///
/// `Standard` matches common client behavior: 301, 302 and 303 responses
/// turn a non-GET/HEAD request into a GET without a body, while 307 and 308
/// always replay the original method and body. `Never` replays the original
/// method and body on every hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodRewrite {
    Standard,
    Never,
}

/// Redirect driver configuration
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Maximum number of redirect hops before the driver gives up.
    pub max_redirects: usize,
    /// Method rewrite policy applied on each hop.
    pub method_rewrite: MethodRewrite,
    /// Keep Authorization/cookies when a redirect crosses origins.
    pub trust_cross_origin: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            max_redirects: 20,
            method_rewrite: MethodRewrite::Standard,
            trust_cross_origin: false,
        }
    }
}
