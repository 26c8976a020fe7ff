//! HTTP client for the TenPay V3 API.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the shared types do not pull in `reqwest`.

mod basepay;
mod headers;
mod request;
mod signer;

pub use basepay::BasePayClient;
pub use headers::{PRODUCT_NAME, default_headers, user_agent};
pub use request::ApiRequest;
pub use reqwest::Method;
pub use signer::RequestSigner;

use crate::signature::SignatureError;

/// Errors produced by the SDK HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A body-bearing method was called without a payload.
    #[error("invalid argument: {0} request requires a payload")]
    MissingPayload(Method),

    /// Only GET, POST, PUT and PATCH are supported.
    #[error("invalid argument: unsupported request method {0}")]
    UnsupportedMethod(Method),

    /// Transport-level failure (DNS, TLS, connection reset, timeout, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A success response lacked one of the signature headers.
    #[error("missing response header: {0}")]
    MissingHeader(&'static str),

    /// A signature header was present but not valid UTF-8.
    #[error("invalid response header: {0}")]
    InvalidHeader(&'static str),

    /// A computed request header value contained invalid characters.
    #[error("invalid request header value: {0}")]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request payload could not be serialized.
    #[error("payload serialization error: {0}")]
    Serialize(serde_json::Error),

    /// The request could not be signed (e.g. unusable private key).
    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    /// The response signature did not verify and strict verification is on.
    #[error("response signature verification failed")]
    SignatureRejected,

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}
