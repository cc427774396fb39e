use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tejelanas_gateway::backend::{ExternalApiClient, GatewayRequest};
use tejelanas_gateway::config::GatewayConfig;
use tejelanas_gateway::error::{AbortReason, ErrorKind, GatewayError};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_bytes, body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

fn client_for(server: &MockServer) -> ExternalApiClient {
    client_with(GatewayConfig::new(format!("{}/api/v1", server.uri()), TOKEN))
}

fn client_with(config: GatewayConfig) -> ExternalApiClient {
    ExternalApiClient::new(&config).expect("build client")
}

async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .len()
}

#[tokio::test]
async fn relative_path_never_reaches_the_network() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    let err = client.get("faq/").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn missing_token_is_a_config_error_for_any_input() {
    let server = MockServer::start().await;
    let config = GatewayConfig {
        base_url: Some(server.uri()),
        ..Default::default()
    };
    let client = client_with(config);

    for path in ["/faq/", "faq/", "/"] {
        assert_eq!(client.get(path).await, Err(GatewayError::Config));
    }
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn missing_base_url_is_a_config_error() {
    let client = client_with(GatewayConfig {
        api_token: Some(TOKEN.into()),
        ..Default::default()
    });
    assert_eq!(client.get("/faq/").await, Err(GatewayError::Config));
}

#[tokio::test]
async fn sends_bearer_and_accept_and_returns_parsed_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/faq/"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": [{ "id": 1, "titulo": "Q", "respuesta": "A" }] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let payload = client_for(&server).get("/faq/").await.unwrap();

    assert_eq!(payload.status, 200);
    assert_eq!(
        payload.body,
        json!({ "data": [{ "id": 1, "titulo": "Q", "respuesta": "A" }] })
    );
    assert!(
        payload
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json"))
    );
}

#[tokio::test]
async fn trailing_slash_on_base_is_collapsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/about-us/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with(GatewayConfig::new(format!("{}/api/v1/", server.uri()), TOKEN));
    let payload = client.get("/about-us/").await.unwrap();
    assert_eq!(payload.body, json!({ "ok": true }));
}

#[tokio::test]
async fn no_content_yields_null_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/faq/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let payload = client_for(&server).get("/faq/").await.unwrap();
    assert_eq!(payload.status, 204);
    assert_eq!(payload.body, Value::Null);
}

#[tokio::test]
async fn server_error_is_classified_without_upstream_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/faq/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).get("/faq/").await.unwrap_err();

    assert_eq!(
        err,
        GatewayError::UpstreamHttp {
            path: "/faq/".into(),
            status: 500
        }
    );
    assert!(!err.to_string().contains("boom"));
}

#[tokio::test]
async fn client_error_status_is_an_upstream_error_too() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/faq/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&server)
        .await;

    let err = client_for(&server).get("/faq/").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamHttpError);
    assert_eq!(err.upstream_status(), Some(404));
}

#[tokio::test]
async fn plain_text_is_wrapped_under_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/about-us/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("hello", "text/plain"))
        .mount(&server)
        .await;

    let payload = client_for(&server).get("/about-us/").await.unwrap();
    assert_eq!(payload.body, json!({ "data": "hello" }));
}

#[tokio::test]
async fn malformed_json_is_a_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/faq/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{not json", "application/json"))
        .mount(&server)
        .await;

    let err = client_for(&server).get("/faq/").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NetworkError);
}

#[tokio::test]
async fn slow_upstream_times_out_after_a_single_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/faq/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "late": true }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let start = Instant::now();
    let err = client
        .call(GatewayRequest::new("/faq/").with_timeout_ms(100))
        .await
        .unwrap_err();

    assert!(start.elapsed() < Duration::from_secs(1));
    match err {
        GatewayError::Timeout {
            path,
            timeout_ms,
            elapsed_ms,
            reason,
        } => {
            assert_eq!(path, "/faq/");
            assert_eq!(timeout_ms, 100);
            assert!(elapsed_ms >= 100);
            assert_eq!(reason, AbortReason::Deadline);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn configured_timeout_applies_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/faq/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = client_with(
        GatewayConfig::new(format!("{}/api/v1", server.uri()), TOKEN).with_timeout_ms(100),
    );
    let err = client.get("/faq/").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn caller_cancellation_aborts_the_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/faq/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let err = client
        .call_with_cancel(GatewayRequest::new("/faq/"), token)
        .await
        .unwrap_err();

    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(matches!(
        err,
        GatewayError::Timeout {
            reason: AbortReason::Cancelled,
            ..
        }
    ));
}

#[tokio::test]
async fn pre_cancelled_token_aborts_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    token.cancel();
    let err = client_for(&server)
        .call_with_cancel(GatewayRequest::new("/faq/"), token)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    // Port 1 is reserved and nothing listens on it in test environments.
    let client = client_with(GatewayConfig::new("http://127.0.0.1:1/api/v1", TOKEN));
    let err = client.get("/faq/").await.unwrap_err();
    assert_eq!(err, GatewayError::Network { path: "/faq/".into() });
}

#[tokio::test]
async fn json_body_is_serialized_with_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/contact/"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "nombre": "Ana" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let payload = client_for(&server)
        .call(
            GatewayRequest::new("/contact/")
                .with_method(reqwest::Method::POST)
                .with_json(json!({ "nombre": "Ana" })),
        )
        .await
        .unwrap();
    assert_eq!(payload.status, 201);
    assert_eq!(payload.body, json!({ "success": true }));
}

#[tokio::test]
async fn caller_authorization_is_ignored_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .call(GatewayRequest::new("/faq/").with_header("Authorization", "Bearer intruder"))
        .await
        .unwrap();
}

#[tokio::test]
async fn caller_authorization_wins_when_override_is_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer caller"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with(
        GatewayConfig::new(format!("{}/api/v1", server.uri()), TOKEN).with_authorization_override(true),
    );
    client
        .call(GatewayRequest::new("/faq/").with_header("Authorization", "Bearer caller"))
        .await
        .unwrap();
}

#[tokio::test]
async fn raw_bytes_are_sent_verbatim_without_content_type() {
    let server = MockServer::start().await;
    let raw = vec![0x00, 0xff, 0x10, b'{'];
    Mock::given(method("POST"))
        .and(path("/api/v1/upload/"))
        .and(body_bytes(raw.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .call(
            GatewayRequest::new("/upload/")
                .with_method(reqwest::Method::POST)
                .with_bytes(raw),
        )
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(!received[0].headers.contains_key("content-type"));
}

#[tokio::test]
async fn text_body_is_sent_verbatim_without_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/contact/"))
        .and(body_string("nombre=Ana&mensaje=Hola"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .call(
            GatewayRequest::new("/contact/")
                .with_method(reqwest::Method::POST)
                .with_text("nombre=Ana&mensaje=Hola"),
        )
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    assert!(!received[0].headers.contains_key("content-type"));
}
