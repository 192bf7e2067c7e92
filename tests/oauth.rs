//! OAuth2 code exchange and refresh against a mock token endpoint

use amocrm_sdk::api::Account;
use amocrm_sdk::auth::{AuthError, AuthProvider, FileTokenStore, OAuth2Auth, OAuthCredentials, TokenStore};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials() -> OAuthCredentials {
    OAuthCredentials {
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        redirect_uri: "https://example.com/callback".to_string(),
    }
}

fn temp_store() -> FileTokenStore {
    FileTokenStore::new(std::env::temp_dir().join(format!("amocrm-oauth-{}", uuid::Uuid::new_v4())))
}

fn token_response(access: &str, refresh: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "token_type": "Bearer",
        "expires_in": 86400,
        "access_token": access,
        "refresh_token": refresh
    }))
}

#[tokio::test]
async fn test_authorize_persists_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/access_token"))
        .and(body_partial_json(json!({
            "grant_type": "authorization_code",
            "code": "one-time",
            "client_id": "client"
        })))
        .respond_with(token_response("access-1", "refresh-1"))
        .expect(1)
        .mount(&server)
        .await;

    let account = Account::new("acme").with_base_url(server.uri());
    let auth = OAuth2Auth::new(credentials(), temp_store());

    let tokens = auth.authorize(&account, "one-time").await.unwrap();
    assert_eq!(tokens.access_token, "access-1");
    assert!(tokens.received_at > 0);

    assert!(auth.store().has_tokens("acme.amocrm.ru").await.unwrap());
    assert_eq!(auth.access_token(&account).await.unwrap(), "access-1");
}

#[tokio::test]
async fn test_expired_tokens_are_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/access_token"))
        .and(body_partial_json(json!({
            "grant_type": "refresh_token",
            "refresh_token": "stale-refresh"
        })))
        .respond_with(token_response("fresh-access", "fresh-refresh"))
        .expect(1)
        .mount(&server)
        .await;

    let store = temp_store();
    store
        .save(
            &json!({
                "token_type": "Bearer",
                "access_token": "stale-access",
                "refresh_token": "stale-refresh",
                "expires_in": 86400,
                "received_at": 0
            }),
            "acme.amocrm.ru",
        )
        .await
        .unwrap();

    let account = Account::new("acme").with_base_url(server.uri());
    let auth = OAuth2Auth::new(credentials(), store);

    assert_eq!(auth.access_token(&account).await.unwrap(), "fresh-access");
    // Cached after the refresh; the mock expects a single token call
    assert_eq!(auth.access_token(&account).await.unwrap(), "fresh-access");

    let stored = auth.store().load("acme.amocrm.ru").await.unwrap();
    assert_eq!(stored["refresh_token"], json!("fresh-refresh"));
}

#[tokio::test]
async fn test_missing_tokens() {
    let account = Account::new("nobody");
    let auth = OAuth2Auth::new(credentials(), temp_store());

    let error = auth.access_token(&account).await.unwrap_err();
    assert!(matches!(error, AuthError::MissingTokens { .. }));
}

#[tokio::test]
async fn test_rejected_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/access_token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("{\"hint\":\"Authorization code has expired\"}"))
        .mount(&server)
        .await;

    let account = Account::new("acme").with_base_url(server.uri());
    let auth = OAuth2Auth::new(credentials(), temp_store());

    let error = auth.authorize(&account, "expired").await.unwrap_err();
    assert!(matches!(error, AuthError::Http { status: 400, .. }));
}
