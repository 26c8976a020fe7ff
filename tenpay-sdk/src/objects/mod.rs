pub mod result_code;
pub mod transactions;

pub use result_code::ResultCode;

use serde::Serialize;

/// The outcome of one API call.
///
/// `data` is parsed from the response body when the status classifies as
/// success and is `T::default()` otherwise. `signed` is only set on the
/// success branch, after the body has been parsed.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub result_code: ResultCode,
    pub signed: Option<bool>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Response for a non-success status: no body, no signature check.
    pub fn unsuccessful(result_code: ResultCode) -> Self
    where
        T: Default,
    {
        Self {
            result_code,
            signed: None,
            data: T::default(),
        }
    }

    /// Whether the status code classified as success.
    pub fn is_success(&self) -> bool {
        self.result_code.success
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T> std::ops::Deref for ApiResponse<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}
