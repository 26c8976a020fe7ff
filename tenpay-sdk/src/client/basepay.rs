//! Typed calls for the basic payment (JSAPI) endpoints.

use super::{ApiRequest, ClientError};
use crate::objects::ApiResponse;
use crate::objects::transactions::{
    CloseOrderRequest, EmptyResponse, JsapiOrderRequest, PrepayResponse, TransactionResponse,
};

/// Typed HTTP client for the basic payment API.
#[derive(Clone)]
pub struct BasePayClient {
    api: ApiRequest,
}

impl BasePayClient {
    pub fn new(api: ApiRequest) -> Self {
        Self { api }
    }

    /// `POST /v3/pay/transactions/jsapi` – create a JSAPI prepay order.
    pub async fn jsapi(
        &self,
        order: &JsapiOrderRequest,
    ) -> Result<ApiResponse<PrepayResponse>, ClientError> {
        self.api.post("/v3/pay/transactions/jsapi", order).await
    }

    /// `GET /v3/pay/transactions/out-trade-no/{out_trade_no}` – query an
    /// order by the merchant order number.
    pub async fn query_by_out_trade_no(
        &self,
        out_trade_no: &str,
    ) -> Result<ApiResponse<TransactionResponse>, ClientError> {
        let url = format!(
            "/v3/pay/transactions/out-trade-no/{}?mchid={}",
            urlencoding::encode(out_trade_no),
            urlencoding::encode(&self.api.merchant_id())
        );
        self.api.get(&url).await
    }

    /// `POST /v3/pay/transactions/out-trade-no/{out_trade_no}/close` – close
    /// an unpaid order. Answers `204 No Content` on success.
    pub async fn close_order(
        &self,
        out_trade_no: &str,
    ) -> Result<ApiResponse<EmptyResponse>, ClientError> {
        let url = format!(
            "/v3/pay/transactions/out-trade-no/{}/close",
            urlencoding::encode(out_trade_no)
        );
        let body = CloseOrderRequest {
            mchid: self.api.merchant_id(),
        };
        self.api.post(&url, &body).await
    }
}
