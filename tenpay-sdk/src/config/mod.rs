//! Configuration types for the TenPay client.
//!
//! These are validated runtime values. Loading them from files or the
//! environment is left to the embedding application.

mod client;
mod merchant;

pub use client::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use merchant::{CredentialProvider, MerchantConfig};
