//! Configuration module for tenpay-cli.
//!
//! Handles loading configuration from TOML files and CLI arguments, and
//! reads the key files the configuration points to.

pub mod file;

use crate::config::file::FileConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tenpay_sdk::config::{ClientConfig, MerchantConfig};
use tenpay_sdk::signature::{MerchantKey, PlatformKeyVerifier, PlatformPublicKey, SignatureError};
use thiserror::Error;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("invalid key in {path}: {source}")]
    KeyError {
        path: PathBuf,
        source: SignatureError,
    },
}

/// Loaded configuration result containing all parts.
#[derive(Debug)]
pub struct LoadedConfig {
    pub merchant: MerchantConfig,
    pub verifier: Option<PlatformKeyVerifier>,
    pub client: ClientConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    base_url_override: Option<Url>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, base_url_override: Option<Url>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            base_url_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Read and check the key files
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = read_file(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(base_url) = &self.base_url_override {
            file_config.client.base_url = base_url.clone();
        }

        validate(&file_config)?;

        let key_path = self.resolve_path(&file_config.merchant.private_key_path);
        let private_key = read_file(&key_path)?;
        // fail at startup rather than on the first request
        MerchantKey::from_pem(&private_key).map_err(|source| ConfigError::KeyError {
            path: key_path.clone(),
            source,
        })?;

        let verifier = match &file_config.platform {
            Some(platform) => {
                let path = self.resolve_path(&platform.public_key_path);
                let key = PlatformPublicKey::from_pem(&read_file(&path)?)
                    .map_err(|source| ConfigError::KeyError { path, source })?;
                Some(PlatformKeyVerifier::new(key))
            }
            None => None,
        };

        Ok(LoadedConfig {
            merchant: MerchantConfig::new(
                file_config.merchant.mch_id,
                file_config.merchant.serial_no,
                private_key,
            ),
            verifier,
            client: ClientConfig::default()
                .with_base_url(file_config.client.base_url)
                .with_timeout(Duration::from_millis(file_config.client.timeout_ms))
                .require_valid_signature(file_config.client.require_valid_signature),
        })
    }

    /// Resolve a path from the config file relative to the file's directory.
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.config_path.parent() {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.merchant.mch_id.trim().is_empty() {
        return Err(ConfigError::ValidationError("merchant.mch_id is empty".into()));
    }
    if config.merchant.serial_no.trim().is_empty() {
        return Err(ConfigError::ValidationError("merchant.serial_no is empty".into()));
    }
    if config.client.timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "client.timeout_ms must be positive".into(),
        ));
    }
    if config.client.require_valid_signature && config.platform.is_none() {
        return Err(ConfigError::ValidationError(
            "client.require_valid_signature needs a [platform] public key".into(),
        ));
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })
}
