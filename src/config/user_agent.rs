//! Default User-Agent construction.

use std::sync::OnceLock;

/// The default User-Agent, built once from crate metadata and the host
/// platform.
pub fn default_user_agent() -> &'static str {
    static USER_AGENT: OnceLock<String> = OnceLock::new();
    USER_AGENT
        .get_or_init(|| {
            format!(
                "{}/{} ({}; {})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS,
                std::env::consts::ARCH,
            )
        })
        .as_str()
}
