//! Client SDK for the WeChat Pay (TenPay) V3 API.
//!
//! * [`config`] – merchant credentials and client settings.
//! * [`signature`] – `WECHATPAY2-SHA256-RSA2048` request signing and
//!   response signature verification.
//! * [`objects`] – result codes, the [`ApiResponse`](objects::ApiResponse)
//!   container and request/response DTOs.
//! * `client` – the HTTP request executor, gated behind the `client` cargo
//!   feature so crates that only need the shared types do not pull in
//!   `reqwest`.

pub mod config;
pub mod objects;
pub mod signature;

#[cfg(feature = "client")]
pub mod client;
