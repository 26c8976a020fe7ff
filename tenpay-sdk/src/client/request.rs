//! The API request executor: one signed round trip per call.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::ClientError;
use super::headers::default_headers;
use super::signer::RequestSigner;
use crate::config::{ClientConfig, CredentialProvider};
use crate::objects::{ApiResponse, ResultCode};
use crate::signature::{
    NONCE_HEADER, ResponseVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER, TenPaySigner,
};

/// Executes signed calls against the V3 API.
///
/// Every call reads fresh credentials from the [`CredentialProvider`] and
/// builds a new signer from them. The underlying `reqwest::Client` (and its
/// connection pool) is shared between calls; nothing else is.
#[derive(Clone)]
pub struct ApiRequest {
    http: Client,
    config: ClientConfig,
    credentials: Arc<dyn CredentialProvider>,
    verifier: Arc<dyn ResponseVerifier>,
}

impl ApiRequest {
    pub fn new(
        config: ClientConfig,
        credentials: Arc<dyn CredentialProvider>,
        verifier: Arc<dyn ResponseVerifier>,
    ) -> Self {
        Self {
            http: Client::new(),
            config,
            credentials,
            verifier,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Merchant id currently reported by the credential provider.
    pub fn merchant_id(&self) -> String {
        self.credentials.merchant_id()
    }

    /// `GET` `url` with the default timeout.
    pub async fn get<T>(&self, url: &str) -> Result<ApiResponse<T>, ClientError>
    where
        T: DeserializeOwned + Default,
    {
        self.execute::<(), T>(url, None, None, Method::GET).await
    }

    /// `POST` `payload` to `url` with the default timeout.
    pub async fn post<P, T>(&self, url: &str, payload: &P) -> Result<ApiResponse<T>, ClientError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        self.execute(url, Some(payload), None, Method::POST).await
    }

    /// Perform one call.
    ///
    /// * `url` – absolute URL, or a path joined onto the configured base URL.
    /// * `payload` – required for POST, PUT and PATCH; never sent for GET.
    /// * `timeout` – overrides the configured default timeout.
    /// * `method` – GET, POST, PUT or PATCH.
    ///
    /// On a success status the body is parsed into `T` and the response
    /// signature headers are checked with the [`ResponseVerifier`]. On any
    /// other status the result holds `T::default()` and `signed` stays
    /// `None`. Argument errors are raised before anything is sent.
    pub async fn execute<P, T>(
        &self,
        url: &str,
        payload: Option<&P>,
        timeout: Option<Duration>,
        method: Method,
    ) -> Result<ApiResponse<T>, ClientError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        let body = match method {
            Method::GET => None,
            Method::POST | Method::PUT | Method::PATCH => {
                let payload = payload.ok_or_else(|| ClientError::MissingPayload(method.clone()))?;
                let value = serde_json::to_value(payload).map_err(ClientError::Serialize)?;
                if value.is_null() {
                    return Err(ClientError::MissingPayload(method));
                }
                Some(to_json_without_nulls(value)?)
            }
            _ => return Err(ClientError::UnsupportedMethod(method)),
        };
        let url = self.resolve_url(url)?;

        let signer = TenPaySigner::new(
            self.credentials.merchant_id(),
            self.credentials.serial_number(),
            &self.credentials.private_key(),
        )?;

        let mut builder = self
            .http
            .request(method.clone(), url.clone())
            .headers(default_headers())
            .timeout(timeout.unwrap_or(self.config.timeout));
        match body {
            None => tracing::debug!(%url, %method, "sending TenPay API request"),
            Some(json) => {
                tracing::debug!(%url, %method, body = %json, "sending TenPay API request");
                builder = builder.header(CONTENT_TYPE, "application/json").body(json);
            }
        }

        let mut request = builder.build()?;
        signer.sign(&mut request)?;
        let response = self.http.execute(request).await?;

        let result_code = ResultCode::classify(response.status().as_u16());
        if !result_code.success {
            tracing::debug!(%url, %result_code, "TenPay API call failed");
            return Ok(ApiResponse::unsuccessful(result_code));
        }

        let timestamp = header_value(response.headers(), TIMESTAMP_HEADER)?;
        let nonce = header_value(response.headers(), NONCE_HEADER)?;
        let signature = header_value(response.headers(), SIGNATURE_HEADER)?;
        let content = response.text().await?;

        let data: T = if content.trim().is_empty() {
            T::default()
        } else {
            serde_json::from_str(&content)?
        };

        let signed = self.verifier.verify(&timestamp, &nonce, &signature, &content);
        if !signed {
            tracing::warn!(%url, "TenPay response signature did not verify");
            if self.config.require_valid_signature {
                return Err(ClientError::SignatureRejected);
            }
        }

        Ok(ApiResponse {
            result_code,
            signed: Some(signed),
            data,
        })
    }

    fn resolve_url(&self, url: &str) -> Result<Url, ClientError> {
        match Url::parse(url) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(self.config.base_url.join(url)?),
            Err(e) => Err(e.into()),
        }
    }
}

/// First value of a required response header.
fn header_value(headers: &HeaderMap, name: &'static str) -> Result<String, ClientError> {
    let value = headers.get(name).ok_or(ClientError::MissingHeader(name))?;
    value
        .to_str()
        .map(str::to_owned)
        .map_err(|_| ClientError::InvalidHeader(name))
}

/// Render `value` as JSON, dropping object fields whose value is null.
fn to_json_without_nulls(mut value: serde_json::Value) -> Result<String, ClientError> {
    strip_nulls(&mut value);
    serde_json::to_string(&value).map_err(ClientError::Serialize)
}

fn strip_nulls(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}
