//! Classification of V3 API HTTP status codes.

use serde::Serialize;

/// Structured classification of an HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ResultCode {
    pub http_status: u16,
    /// WeChat Pay error code usually returned with this status.
    pub error_code: &'static str,
    pub description: &'static str,
    pub success: bool,
}

impl ResultCode {
    /// Classify an HTTP status code.
    ///
    /// 200, 202 and 204 are the success codes of the V3 API; other 2xx codes
    /// are treated as success too. Everything else is a failure.
    pub fn classify(http_status: u16) -> Self {
        let (error_code, description, success) = match http_status {
            200 => ("SUCCESS", "request processed", true),
            202 => ("USERPAYING", "accepted, waiting for the user to confirm payment", true),
            204 => ("SUCCESS", "request processed, no content", true),
            301 => ("MOVED_PERMANENTLY", "resource moved permanently", false),
            400 => ("PARAM_ERROR", "invalid parameters or request format", false),
            401 => ("SIGN_ERROR", "request signature verification failed", false),
            403 => ("NO_AUTH", "merchant is not authorised for this operation", false),
            404 => ("RESOURCE_NOT_EXISTS", "requested resource does not exist", false),
            429 => ("FREQUENCY_LIMITED", "request rate limit exceeded", false),
            500 => ("SYSTEM_ERROR", "WeChat Pay system error", false),
            502 => ("BANK_ERROR", "bank system error", false),
            503 => ("SERVICE_UNAVAILABLE", "service temporarily unavailable", false),
            200..=299 => ("SUCCESS", "unrecognised success status", true),
            _ => ("UNKNOWN", "unrecognised status", false),
        };
        Self {
            http_status,
            error_code,
            description,
            success,
        }
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.http_status, self.error_code, self.description)
    }
}
