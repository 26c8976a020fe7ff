//! TOML file configuration structures.
//!
//! These structs directly map to the `tenpay.toml` file format.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub merchant: MerchantConfig,
    pub platform: Option<PlatformConfig>,
    #[serde(default)]
    pub client: ClientConfig,
}

/// Merchant credentials section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantConfig {
    /// Merchant id (`mchid`).
    pub mch_id: String,
    /// Serial number of the merchant API certificate.
    pub serial_no: String,
    /// Path to `apiclient_key.pem`, relative to the config file.
    pub private_key_path: PathBuf,
}

/// Platform key used to verify response signatures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Path to the platform public key PEM, relative to the config file.
    pub public_key_path: PathBuf,
}

/// HTTP client section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub require_valid_signature: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            require_valid_signature: false,
        }
    }
}

fn default_base_url() -> Url {
    tenpay_sdk::config::DEFAULT_BASE_URL
        .parse()
        .expect("valid default base url")
}

fn default_timeout_ms() -> u64 {
    tenpay_sdk::config::DEFAULT_TIMEOUT.as_millis() as u64
}
