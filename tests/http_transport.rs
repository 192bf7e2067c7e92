//! HttpTransport against a mock amoCRM server

use amocrm_sdk::api::{
    Account, ApiError, EntityReader, HttpTransport, Method, ResilienceConfig, RetryConfig, Transport,
    TransportError,
};
use amocrm_sdk::auth::PermanentTokenAuth;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(resilience: ResilienceConfig) -> HttpTransport {
    let auth = PermanentTokenAuth::new().with_token("acme", "secret").unwrap();
    HttpTransport::new(Arc::new(auth), resilience).unwrap()
}

fn account(server: &MockServer) -> Account {
    Account::new("acme").with_base_url(server.uri())
}

fn fast_retries(max_attempts: u32) -> ResilienceConfig {
    ResilienceConfig::builder()
        .retry_config(RetryConfig {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
            rate_limit_pause: Duration::from_millis(5),
            jitter: false,
            ..RetryConfig::default()
        })
        .rate_limited(false)
        .build()
}

#[tokio::test]
async fn test_get_sends_bearer_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/leads"))
        .and(header("authorization", "Bearer secret"))
        .and(query_param("filter[id][0]", "7"))
        .and(query_param("with", "contacts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"leads": [{"id": 7, "name": "Deal"}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = transport(ResilienceConfig::disabled())
        .request(
            &account(&server),
            "/api/v4/leads",
            Method::Get,
            json!({"filter": {"id": [7]}, "with": "contacts"}),
        )
        .await
        .unwrap();

    assert_eq!(response.unwrap()["_embedded"]["leads"][0]["id"], json!(7));
}

#[tokio::test]
async fn test_write_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/v4/contacts"))
        .and(body_json(json!([{"id": 1, "name": "Jane"}])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"contacts": [{"id": 1}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = transport(ResilienceConfig::disabled())
        .request(
            &account(&server),
            "/api/v4/contacts",
            Method::Patch,
            json!([{"id": 1, "name": "Jane"}]),
        )
        .await
        .unwrap();

    assert!(response.is_some());
}

#[tokio::test]
async fn test_no_content_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v4/catalogs/5/elements"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let response = transport(ResilienceConfig::disabled())
        .request(&account(&server), "/api/v4/catalogs/5/elements", Method::Delete, json!([1, 2]))
        .await
        .unwrap();

    assert!(response.is_none());
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v4/leads"))
        .respond_with(ResponseTemplate::new(400).set_body_string("{\"title\":\"Bad Request\"}"))
        .expect(1)
        .mount(&server)
        .await;

    let error = transport(fast_retries(3))
        .request(&account(&server), "/api/v4/leads", Method::Post, json!([{}]))
        .await
        .unwrap_err();

    match error {
        TransportError::Http { status, body, .. } => {
            assert_eq!(status, 400);
            assert!(body.contains("Bad Request"));
        }
        other => panic!("expected HTTP error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/account"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let response = transport(fast_retries(3))
        .request(&account(&server), "/api/v4/account", Method::Get, json!({}))
        .await
        .unwrap();

    assert_eq!(response, Some(json!({"id": 1})));
}

#[tokio::test]
async fn test_unknown_account_fails_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let other = Account::new("other").with_base_url(server.uri());
    let error = transport(ResilienceConfig::disabled())
        .request(&other, "/api/v4/leads", Method::Get, json!({}))
        .await
        .unwrap_err();

    assert!(matches!(error, TransportError::Auth(_)));
}

#[tokio::test]
async fn test_reader_rejects_mismatched_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/leads/10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 11,
            "_links": {"self": {"href": "https://acme.amocrm.ru/api/v4/leads/11"}}
        })))
        .mount(&server)
        .await;

    let reader = EntityReader::new(Arc::new(transport(ResilienceConfig::disabled())));
    let error = reader
        .fetch_record(
            &account(&server),
            amocrm_sdk::api::Resource::Leads,
            None,
            10,
            json!({}),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        ApiError::IdentityMismatch {
            requested: 10,
            returned: Some(11),
            ..
        }
    ));
}
