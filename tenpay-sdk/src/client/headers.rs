//! Fixed request headers.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};

/// Product name reported in the `User-Agent` header.
pub const PRODUCT_NAME: &str = "TenPayV3-Rust";

const HTTP_LIBRARY: &str = "reqwest 0.12";

/// Build the four-part `User-Agent`: SDK, HTTP library, runtime and OS.
///
/// ```text
/// TenPayV3-Rust/0.1.0 (reqwest 0.12) Rust/1.85.0 (linux x86_64)
/// ```
///
/// The runtime part is the version of the compiler that built this crate.
pub fn user_agent() -> String {
    format!(
        "{PRODUCT_NAME}/{} ({HTTP_LIBRARY}) Rust/{} ({} {})",
        env!("CARGO_PKG_VERSION"),
        env!("TENPAY_RUSTC_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
    )
}

/// Headers attached to every request: two `Accept` values and the
/// `User-Agent`.
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.append(ACCEPT, HeaderValue::from_static("application/json"));
    headers.append(ACCEPT, HeaderValue::from_static("*/*"));
    if let Ok(value) = HeaderValue::from_str(&user_agent()) {
        headers.insert(USER_AGENT, value);
    }
    headers
}
