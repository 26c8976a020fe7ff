use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tenpay_sdk::client::{ApiRequest, BasePayClient, ClientError, Method};
use tenpay_sdk::config::{ClientConfig, MerchantConfig};
use tenpay_sdk::objects::transactions::{JsapiOrderRequest, OrderAmount, Payer};
use tenpay_sdk::signature::{
    MerchantKey, PlatformKeyVerifier, PlatformPublicKey, ResponseVerifier, request_message,
    response_message,
};
use wiremock::matchers::{body_json, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MERCHANT_ID: &str = "1900000001";
const SERIAL_NO: &str = "5157F09EFDC096DE15EBE81A47057A7232F1B8E1";
const MERCHANT_KEY: &str = include_str!("fixtures/merchant_key.pem");
const MERCHANT_PUB: &str = include_str!("fixtures/merchant_pub.pem");
const PLATFORM_KEY: &str = include_str!("fixtures/platform_key.pem");
const PLATFORM_PUB: &str = include_str!("fixtures/platform_pub.pem");

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct PayResult {
    amount: i64,
    status: String,
    transaction_id: Option<String>,
}

type VerifierCalls = Arc<Mutex<Vec<[String; 4]>>>;

/// Verifier that records its arguments and answers `answer`.
fn recording_verifier(answer: bool) -> (Arc<dyn ResponseVerifier>, VerifierCalls) {
    let calls: VerifierCalls = Arc::default();
    let recorded = calls.clone();
    let verifier: Arc<dyn ResponseVerifier> =
        Arc::new(move |timestamp: &str, nonce: &str, signature: &str, body: &str| {
            recorded.lock().unwrap().push([
                timestamp.to_owned(),
                nonce.to_owned(),
                signature.to_owned(),
                body.to_owned(),
            ]);
            answer
        });
    (verifier, calls)
}

fn executor(server: &MockServer, config: ClientConfig, verifier: Arc<dyn ResponseVerifier>) -> ApiRequest {
    let config = config.with_base_url(server.uri().parse().unwrap());
    let credentials = MerchantConfig::new(MERCHANT_ID, SERIAL_NO, MERCHANT_KEY);
    ApiRequest::new(config, Arc::new(credentials), verifier)
}

fn signed_response(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .set_body_string(body)
        .insert_header("Wechatpay-Timestamp", "1700000000")
        .insert_header("Wechatpay-Nonce", "abc123")
        .insert_header("Wechatpay-Signature", "sig==")
}

fn authorization_field<'a>(header: &'a str, name: &str) -> &'a str {
    let start = header.find(&format!("{name}=\"")).unwrap() + name.len() + 2;
    let end = header[start..].find('"').unwrap() + start;
    &header[start..end]
}

#[tokio::test]
async fn post_success_parses_body_and_records_signature() {
    let server = MockServer::start().await;
    let body = r#"{"amount":100,"status":"SUCCESS"}"#;
    Mock::given(method("POST"))
        .and(path("/v3/pay"))
        .and(body_json(json!({"amount": 100})))
        .and(header_exists("authorization"))
        .respond_with(signed_response(200, body))
        .expect(1)
        .mount(&server)
        .await;

    let (verifier, calls) = recording_verifier(true);
    let api = executor(&server, ClientConfig::default(), verifier);
    let url = format!("{}/v3/pay", server.uri());

    let result = api
        .execute::<_, PayResult>(&url, Some(&json!({"amount": 100})), None, Method::POST)
        .await
        .unwrap();

    assert_eq!(result.amount, 100);
    assert_eq!(result.status, "SUCCESS");
    assert_eq!(result.transaction_id, None);
    assert!(result.result_code.success);
    assert_eq!(result.result_code.http_status, 200);
    assert_eq!(result.signed, Some(true));

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0],
        [
            "1700000000".to_owned(),
            "abc123".to_owned(),
            "sig==".to_owned(),
            body.to_owned()
        ]
    );
}

#[tokio::test]
async fn verifier_output_is_reported_as_is() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(signed_response(200, r#"{"amount":1}"#))
        .mount(&server)
        .await;

    let (verifier, _) = recording_verifier(false);
    let api = executor(&server, ClientConfig::default(), verifier);

    let result = api
        .post::<_, PayResult>("/v3/pay", &json!({"amount": 1}))
        .await
        .unwrap();
    assert_eq!(result.signed, Some(false));
    assert_eq!(result.amount, 1);
}

#[tokio::test]
async fn strict_mode_rejects_unverified_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(signed_response(200, r#"{"amount":1}"#))
        .mount(&server)
        .await;

    let (verifier, _) = recording_verifier(false);
    let api = executor(
        &server,
        ClientConfig::default().require_valid_signature(true),
        verifier,
    );

    let err = api
        .post::<_, PayResult>("/v3/pay", &json!({"amount": 1}))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::SignatureRejected));
}

#[tokio::test]
async fn non_success_status_yields_default_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/pay"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"code":"PARAM_ERROR","message":"bad amount"}"#),
        )
        .mount(&server)
        .await;

    let (verifier, calls) = recording_verifier(true);
    let api = executor(&server, ClientConfig::default(), verifier);

    let result = api
        .post::<_, PayResult>("/v3/pay", &json!({"amount": 100}))
        .await
        .unwrap();

    assert!(!result.result_code.success);
    assert_eq!(result.result_code.http_status, 400);
    assert_eq!(result.signed, None);
    assert_eq!(result.amount, 0);
    assert!(result.status.is_empty());
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn null_fields_are_omitted_from_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(signed_response(200, "{}"))
        .mount(&server)
        .await;

    let (verifier, _) = recording_verifier(true);
    let api = executor(&server, ClientConfig::default(), verifier);
    let payload = PayResult {
        amount: 100,
        status: "NEW".to_owned(),
        transaction_id: None,
    };

    api.post::<_, PayResult>("/v3/pay", &payload).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent, json!({"amount": 100, "status": "NEW"}));
    assert_eq!(
        requests[0].headers.get("content-type").unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn missing_nonce_header_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"amount":100,"status":"SUCCESS"}"#)
                .insert_header("Wechatpay-Timestamp", "1700000000")
                .insert_header("Wechatpay-Signature", "sig=="),
        )
        .mount(&server)
        .await;

    let (verifier, calls) = recording_verifier(true);
    let api = executor(&server, ClientConfig::default(), verifier);

    let err = api
        .post::<_, PayResult>("/v3/pay", &json!({"amount": 100}))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::MissingHeader("Wechatpay-Nonce")));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_success_body_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(signed_response(200, "{not json"))
        .mount(&server)
        .await;

    let (verifier, _) = recording_verifier(true);
    let api = executor(&server, ClientConfig::default(), verifier);

    let err = api.get::<PayResult>("/v3/pay").await.unwrap_err();
    assert!(matches!(err, ClientError::Json(_)));
}

#[tokio::test]
async fn invalid_arguments_send_nothing() {
    let server = MockServer::start().await;
    let (verifier, _) = recording_verifier(true);
    let api = executor(&server, ClientConfig::default(), verifier);

    for verb in [Method::POST, Method::PUT, Method::PATCH] {
        let err = api
            .execute::<(), PayResult>("/v3/pay", None, None, verb.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingPayload(_)));

        // null is not a payload, whatever type produced it
        let err = api
            .execute::<_, PayResult>("/v3/pay", Some(&Value::Null), None, verb.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingPayload(ref m) if *m == verb));

        let err = api
            .execute::<_, PayResult>("/v3/pay", Some(&None::<i32>), None, verb.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingPayload(ref m) if *m == verb));
    }
    for verb in [Method::DELETE, Method::HEAD, Method::OPTIONS] {
        let err = api
            .execute::<_, PayResult>("/v3/pay", Some(&json!({"amount": 1})), None, verb)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedMethod(_)));
    }

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn get_never_sends_a_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/pay/transactions/id/4200000001"))
        .respond_with(signed_response(200, r#"{"amount":5}"#))
        .expect(1)
        .mount(&server)
        .await;

    let (verifier, _) = recording_verifier(true);
    let api = executor(&server, ClientConfig::default(), verifier);

    let result = api
        .execute::<_, PayResult>(
            "/v3/pay/transactions/id/4200000001",
            Some(&json!({"ignored": true})),
            None,
            Method::GET,
        )
        .await
        .unwrap();
    assert_eq!(result.amount, 5);

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].body.is_empty());
    assert!(requests[0].headers.get("content-type").is_none());
}

#[tokio::test]
async fn put_success_sends_body_and_parses_response() {
    let server = MockServer::start().await;
    let body = r#"{"amount":7,"status":"UPDATED"}"#;
    Mock::given(method("PUT"))
        .and(path("/v3/pay/orders/A100"))
        .and(body_json(json!({"amount": 7})))
        .and(header_exists("authorization"))
        .respond_with(signed_response(200, body))
        .expect(1)
        .mount(&server)
        .await;

    let (verifier, calls) = recording_verifier(true);
    let api = executor(&server, ClientConfig::default(), verifier);
    let result = api
        .execute::<_, PayResult>(
            "/v3/pay/orders/A100",
            Some(&json!({"amount": 7, "attach": null})),
            None,
            Method::PUT,
        )
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!(result.signed, Some(true));
    assert_eq!(result.amount, 7);
    assert_eq!(result.status, "UPDATED");
    assert_eq!(calls.lock().unwrap()[0][3], body);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        requests[0].headers.get("content-type").unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn requests_carry_fixed_headers_and_valid_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(signed_response(200, "{}"))
        .mount(&server)
        .await;

    let (verifier, _) = recording_verifier(true);
    let api = executor(&server, ClientConfig::default(), verifier);
    api.execute::<_, PayResult>(
        "/v3/pay/orders?lang=en",
        Some(&json!({"amount": 3})),
        None,
        Method::PATCH,
    )
    .await
    .unwrap();

    let requests = server.received_requests().await.unwrap();
    let request = &requests[0];

    let accept: Vec<_> = request
        .headers
        .get_all("accept")
        .iter()
        .flat_map(|v| v.to_str().unwrap().split(',').map(|s| s.trim().to_owned()).collect::<Vec<_>>())
        .collect();
    assert!(accept.contains(&"application/json".to_owned()));
    assert!(accept.contains(&"*/*".to_owned()));
    let user_agent = request.headers.get("user-agent").unwrap().to_str().unwrap();
    assert!(user_agent.starts_with("TenPayV3-Rust/"));

    let authorization = request.headers.get("authorization").unwrap().to_str().unwrap();
    assert!(authorization.starts_with("WECHATPAY2-SHA256-RSA2048 "));
    assert_eq!(authorization_field(authorization, "mchid"), MERCHANT_ID);
    assert_eq!(authorization_field(authorization, "serial_no"), SERIAL_NO);

    let message = request_message(
        "PATCH",
        "/v3/pay/orders?lang=en",
        authorization_field(authorization, "timestamp").parse().unwrap(),
        authorization_field(authorization, "nonce_str"),
        &String::from_utf8(request.body.clone()).unwrap(),
    );
    PlatformPublicKey::from_pem(MERCHANT_PUB)
        .unwrap()
        .verify(message.as_bytes(), authorization_field(authorization, "signature"))
        .unwrap();
}

#[tokio::test]
async fn timeout_surfaces_as_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(signed_response(200, "{}").set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let (verifier, _) = recording_verifier(true);
    let api = executor(&server, ClientConfig::default(), verifier);

    let err = api
        .execute::<(), PayResult>("/v3/pay", None, Some(Duration::from_millis(50)), Method::GET)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Http(ref e) if e.is_timeout()));
}

#[tokio::test]
async fn platform_key_verifier_end_to_end() {
    let server = MockServer::start().await;
    let body = r#"{"prepay_id":"wx26112221580621e9b071c00d9e093b0000"}"#;
    let timestamp = time::OffsetDateTime::now_utc().unix_timestamp().to_string();
    let signature = MerchantKey::from_pem(PLATFORM_KEY)
        .unwrap()
        .sign(response_message(&timestamp, "n0nce", body).as_bytes())
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/v3/pay/transactions/jsapi"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("Wechatpay-Timestamp", timestamp.as_str())
                .insert_header("Wechatpay-Nonce", "n0nce")
                .insert_header("Wechatpay-Signature", signature.as_str()),
        )
        .mount(&server)
        .await;

    let verifier = PlatformKeyVerifier::new(PlatformPublicKey::from_pem(PLATFORM_PUB).unwrap());
    let api = executor(
        &server,
        ClientConfig::default().require_valid_signature(true),
        Arc::new(verifier),
    );
    let order = JsapiOrderRequest {
        appid: "wxd678efh567hg6787".to_owned(),
        mchid: MERCHANT_ID.to_owned(),
        description: "Image形象店-深圳腾大-QQ公仔".to_owned(),
        out_trade_no: "1217752501201407033233368018".to_owned(),
        time_expire: None,
        attach: None,
        notify_url: "https://www.weixin.qq.com/wxpay/pay.php".to_owned(),
        goods_tag: None,
        amount: OrderAmount {
            total: 100,
            currency: Some("CNY".to_owned()),
        },
        payer: Payer {
            openid: "oUpF8uMuAJO_M2pxb1Q9zNjWeS6o".to_owned(),
        },
    };

    let result = BasePayClient::new(api).jsapi(&order).await.unwrap();
    assert_eq!(result.signed, Some(true));
    assert_eq!(result.prepay_id, "wx26112221580621e9b071c00d9e093b0000");

    let requests = server.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(sent.get("time_expire").is_none());
    assert_eq!(sent["amount"], json!({"total": 100, "currency": "CNY"}));
}

#[tokio::test]
async fn query_and_close_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/pay/transactions/out-trade-no/ORDER-1"))
        .and(query_param("mchid", MERCHANT_ID))
        .respond_with(signed_response(
            200,
            r#"{"out_trade_no":"ORDER-1","trade_state":"NOTPAY","amount":{"total":100}}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v3/pay/transactions/out-trade-no/ORDER-1/close"))
        .and(body_json(json!({"mchid": MERCHANT_ID})))
        .respond_with(signed_response(204, ""))
        .expect(1)
        .mount(&server)
        .await;

    let (verifier, _) = recording_verifier(true);
    let client = BasePayClient::new(executor(&server, ClientConfig::default(), verifier));

    let order = client.query_by_out_trade_no("ORDER-1").await.unwrap();
    assert_eq!(order.trade_state, "NOTPAY");
    assert_eq!(order.amount.as_ref().unwrap().total, 100);
    assert_eq!(order.transaction_id, None);

    let closed = client.close_order("ORDER-1").await.unwrap();
    assert!(closed.is_success());
    assert_eq!(closed.result_code.http_status, 204);
    assert_eq!(closed.signed, Some(true));
}
