//! Merchant credentials.

/// Source of the merchant identity and signing key.
///
/// Read once per API call, so implementations may hand out rotated values
/// between calls. The executor never mutates them.
pub trait CredentialProvider: Send + Sync {
    /// Merchant id (`mchid`).
    fn merchant_id(&self) -> String;
    /// Serial number of the merchant API certificate.
    fn serial_number(&self) -> String;
    /// PEM encoded PKCS#8 merchant private key.
    fn private_key(&self) -> String;
}

/// Static merchant configuration.
#[derive(Clone)]
pub struct MerchantConfig {
    /// Merchant id issued by WeChat Pay.
    pub merchant_id: String,
    /// Serial number of the merchant API certificate.
    pub serial_number: String,
    private_key: String,
}

impl MerchantConfig {
    /// Create a new MerchantConfig.
    pub fn new(
        merchant_id: impl Into<String>,
        serial_number: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            serial_number: serial_number.into(),
            private_key: private_key.into(),
        }
    }
}

impl std::fmt::Debug for MerchantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerchantConfig")
            .field("merchant_id", &self.merchant_id)
            .field("serial_number", &self.serial_number)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl CredentialProvider for MerchantConfig {
    fn merchant_id(&self) -> String {
        self.merchant_id.clone()
    }

    fn serial_number(&self) -> String {
        self.serial_number.clone()
    }

    fn private_key(&self) -> String {
        self.private_key.clone()
    }
}
