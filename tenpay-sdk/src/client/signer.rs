//! Request signing applied to outgoing `reqwest` requests.

use reqwest::Request;
use reqwest::header::{AUTHORIZATION, HeaderValue};

use super::ClientError;
use crate::signature::TenPaySigner;

/// Attaches authentication to a fully built request right before dispatch.
pub trait RequestSigner: Send + Sync {
    fn sign(&self, request: &mut Request) -> Result<(), ClientError>;
}

impl RequestSigner for TenPaySigner {
    /// Signs method, path with query, and body, and sets `Authorization`.
    fn sign(&self, request: &mut Request) -> Result<(), ClientError> {
        let url = request.url();
        let path = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_owned(),
        };
        let body = request
            .body()
            .and_then(|body| body.as_bytes())
            .map(String::from_utf8_lossy)
            .unwrap_or_default();

        let authorization = self.authorization(request.method().as_str(), &path, &body)?;
        request
            .headers_mut()
            .insert(AUTHORIZATION, HeaderValue::from_str(&authorization)?);
        Ok(())
    }
}
