//! Logging initialization utilities.

use env_logger::Env;

/// Initialize logging with a default filter level. Safe to call from
/// multiple tests; repeated initialization is ignored.
pub fn init() {
    let env = Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env).try_init().ok();
}
