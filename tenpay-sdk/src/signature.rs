//! Signature algorithm and verification for the TenPay V3 API.
//!
//! Requests carry an `Authorization` header of the form:
//!
//! ```text
//! Authorization: WECHATPAY2-SHA256-RSA2048 mchid="..",nonce_str="..",timestamp="..",serial_no="..",signature=".."
//! ```
//!
//! Two signing schemes exist, both RSASSA-PKCS1-v1_5 with SHA-256 and a
//! base64 encoded signature:
//!
//! * **Request signing** (merchant private key):
//!   `"{METHOD}\n{path_and_query}\n{timestamp}\n{nonce}\n{body}\n"`
//!
//! * **Response verification** (platform public key):
//!   `"{timestamp}\n{nonce}\n{body}\n"`, carried in the
//!   `Wechatpay-Timestamp`, `Wechatpay-Nonce` and `Wechatpay-Signature`
//!   response headers.

use rand::Rng;
use rsa::RsaPublicKey;
use rsa::pkcs1::{DecodeRsaPublicKey, EncodeRsaPublicKey};
use rsa::pkcs8::DecodePublicKey;
use ring::signature::{RSA_PKCS1_2048_8192_SHA256, RSA_PKCS1_SHA256, RsaKeyPair, UnparsedPublicKey};

/// Authorization scheme name.
pub const AUTHORIZATION_SCHEMA: &str = "WECHATPAY2-SHA256-RSA2048";

/// Response header carrying the signing timestamp.
pub const TIMESTAMP_HEADER: &str = "Wechatpay-Timestamp";

/// Response header carrying the signing nonce.
pub const NONCE_HEADER: &str = "Wechatpay-Nonce";

/// Response header carrying the base64 signature.
pub const SIGNATURE_HEADER: &str = "Wechatpay-Signature";

/// Maximum allowed clock distance of a response timestamp (in seconds).
pub const MAX_SIGNATURE_AGE: i64 = 5 * 60;

const NONCE_LEN: usize = 32;

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid PEM encoding: {0}")]
    InvalidPem(#[from] pem::PemError),
    #[error("unexpected PEM label {found:?}, expected {expected}")]
    UnexpectedPemLabel {
        found: String,
        expected: &'static str,
    },
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("rejected key: {0}")]
    KeyRejected(#[from] ring::error::KeyRejected),
    #[error("invalid RSA public key: {0}")]
    InvalidPublicKey(String),
    #[error("signing failed")]
    SigningFailed,
    #[error("invalid signature")]
    SignatureMismatch,
    #[error("invalid timestamp")]
    InvalidTimestamp,
    #[error("signature expired")]
    Expired,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

const PKCS8_PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";
const PKCS1_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";
const SPKI_PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";
const PKCS1_PUBLIC_KEY_LABEL: &str = "RSA PUBLIC KEY";

/// The merchant RSA private key used for request signing.
#[derive(Debug)]
pub struct MerchantKey(RsaKeyPair);

impl MerchantKey {
    /// Parse a PEM encoded `PRIVATE KEY` (PKCS#8) or `RSA PRIVATE KEY`
    /// (PKCS#1).
    pub fn from_pem(pem: &str) -> Result<Self, SignatureError> {
        let block = pem::parse(pem)?;
        let key_pair = match block.tag() {
            PKCS8_PRIVATE_KEY_LABEL => RsaKeyPair::from_pkcs8(block.contents())?,
            PKCS1_PRIVATE_KEY_LABEL => RsaKeyPair::from_der(block.contents())?,
            other => {
                return Err(SignatureError::UnexpectedPemLabel {
                    found: other.to_owned(),
                    expected: PKCS8_PRIVATE_KEY_LABEL,
                });
            }
        };
        Ok(Self(key_pair))
    }

    /// Sign `message` and return the base64 encoded signature.
    pub fn sign(&self, message: &[u8]) -> Result<String, SignatureError> {
        let rng = ring::rand::SystemRandom::new();
        let mut signature = vec![0; self.0.public().modulus_len()];
        self.0
            .sign(&RSA_PKCS1_SHA256, &rng, message, &mut signature)
            .map_err(|_| SignatureError::SigningFailed)?;
        Ok(fast32::base64::RFC4648.encode(&signature))
    }
}

/// The WeChat Pay platform RSA public key used for response verification.
///
/// Held as PKCS#1 `RSAPublicKey` DER, the form `ring` verifies with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformPublicKey(Box<[u8]>);

impl PlatformPublicKey {
    /// Parse a PEM encoded `PUBLIC KEY` (SubjectPublicKeyInfo) or
    /// `RSA PUBLIC KEY` (PKCS#1). Anything else, including private keys and
    /// non-RSA keys, is rejected.
    pub fn from_pem(pem: &str) -> Result<Self, SignatureError> {
        let block = pem::parse(pem)?;
        let key = match block.tag() {
            SPKI_PUBLIC_KEY_LABEL => RsaPublicKey::from_public_key_der(block.contents())
                .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))?,
            PKCS1_PUBLIC_KEY_LABEL => RsaPublicKey::from_pkcs1_der(block.contents())
                .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))?,
            other => {
                return Err(SignatureError::UnexpectedPemLabel {
                    found: other.to_owned(),
                    expected: SPKI_PUBLIC_KEY_LABEL,
                });
            }
        };
        Self::from_rsa(&key)
    }

    fn from_rsa(key: &RsaPublicKey) -> Result<Self, SignatureError> {
        let der = key
            .to_pkcs1_der()
            .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))?;
        Ok(Self(der.as_bytes().into()))
    }

    /// Verify a base64 encoded signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &str) -> Result<(), SignatureError> {
        let signature = fast32::base64::RFC4648
            .decode_str(signature)
            .map_err(|_| SignatureError::InvalidBase64)?;
        UnparsedPublicKey::new(&RSA_PKCS1_2048_8192_SHA256, self.0.as_ref())
            .verify(message, &signature)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Request signing
// ---------------------------------------------------------------------------

/// Build the request signing message.
pub fn request_message(
    method: &str,
    path_and_query: &str,
    timestamp: i64,
    nonce: &str,
    body: &str,
) -> String {
    format!("{method}\n{path_and_query}\n{timestamp}\n{nonce}\n{body}\n")
}

/// Generate a random 32 character alphanumeric nonce.
pub fn generate_nonce() -> String {
    rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

/// Signs outgoing requests on behalf of one merchant.
#[derive(Debug)]
pub struct TenPaySigner {
    merchant_id: String,
    serial_number: String,
    key: MerchantKey,
}

impl TenPaySigner {
    /// Create a signer from the merchant id, certificate serial number and
    /// PEM encoded private key.
    pub fn new(
        merchant_id: impl Into<String>,
        serial_number: impl Into<String>,
        private_key_pem: &str,
    ) -> Result<Self, SignatureError> {
        Ok(Self {
            merchant_id: merchant_id.into(),
            serial_number: serial_number.into(),
            key: MerchantKey::from_pem(private_key_pem)?,
        })
    }

    /// Merchant id the signer is bound to.
    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    /// Compute the `Authorization` header value for a request, using the
    /// current time and a fresh nonce.
    pub fn authorization(
        &self,
        method: &str,
        path_and_query: &str,
        body: &str,
    ) -> Result<String, SignatureError> {
        let timestamp = time::OffsetDateTime::now_utc().unix_timestamp();
        self.authorization_with(method, path_and_query, body, timestamp, &generate_nonce())
    }

    /// Compute the `Authorization` header value with an explicit timestamp
    /// and nonce.
    pub fn authorization_with(
        &self,
        method: &str,
        path_and_query: &str,
        body: &str,
        timestamp: i64,
        nonce: &str,
    ) -> Result<String, SignatureError> {
        let message = request_message(method, path_and_query, timestamp, nonce, body);
        let signature = self.key.sign(message.as_bytes())?;
        Ok(format!(
            r#"{AUTHORIZATION_SCHEMA} mchid="{}",nonce_str="{nonce}",timestamp="{timestamp}",serial_no="{}",signature="{signature}""#,
            self.merchant_id, self.serial_number
        ))
    }
}

// ---------------------------------------------------------------------------
// Response verification
// ---------------------------------------------------------------------------

/// Build the response verification message.
pub fn response_message(timestamp: &str, nonce: &str, body: &str) -> String {
    format!("{timestamp}\n{nonce}\n{body}\n")
}

/// Check that a response timestamp is within [`MAX_SIGNATURE_AGE`] of now.
pub fn check_timestamp(timestamp: i64) -> Result<(), SignatureError> {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    if now.abs_diff(timestamp) > MAX_SIGNATURE_AGE as u64 {
        return Err(SignatureError::Expired);
    }
    Ok(())
}

/// Decides whether a success response carries a valid platform signature.
pub trait ResponseVerifier: Send + Sync {
    fn verify(&self, timestamp: &str, nonce: &str, signature: &str, body: &str) -> bool;
}

impl<F> ResponseVerifier for F
where
    F: Fn(&str, &str, &str, &str) -> bool + Send + Sync,
{
    fn verify(&self, timestamp: &str, nonce: &str, signature: &str, body: &str) -> bool {
        self(timestamp, nonce, signature, body)
    }
}

/// Verifies responses against a single platform public key.
#[derive(Debug, Clone)]
pub struct PlatformKeyVerifier {
    key: PlatformPublicKey,
}

impl PlatformKeyVerifier {
    pub fn new(key: PlatformPublicKey) -> Self {
        Self { key }
    }

    /// Verify the signature and timestamp freshness, reporting why a
    /// response was rejected.
    pub fn try_verify(
        &self,
        timestamp: &str,
        nonce: &str,
        signature: &str,
        body: &str,
    ) -> Result<(), SignatureError> {
        let parsed: i64 = timestamp
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp)?;
        self.key
            .verify(response_message(timestamp, nonce, body).as_bytes(), signature)?;
        check_timestamp(parsed)
    }
}

impl ResponseVerifier for PlatformKeyVerifier {
    fn verify(&self, timestamp: &str, nonce: &str, signature: &str, body: &str) -> bool {
        match self.try_verify(timestamp, nonce, signature, body) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "response signature rejected");
                false
            }
        }
    }
}
