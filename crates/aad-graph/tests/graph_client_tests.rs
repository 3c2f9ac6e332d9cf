//! GraphClient tests against a mock directory
//!
//! Tests for:
//! - Token acquisition and caching
//! - Lookup by principal name, object id and mail nickname
//! - Not-found mapping
//! - Pagination via odata.nextLink
//! - Retry on 429/5xx, Retry-After and token refresh on 401
//! - Token endpoint failures

use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_string_contains, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aad_config::DirectoryConfig;
use aad_graph::{DirectoryClient, GraphClient, GraphError};

const TENANT: &str = "contoso";
const ALICE_ID: &str = "00000000-0000-0000-0000-00000000000a";

fn config_for(server: &MockServer) -> DirectoryConfig {
    DirectoryConfig {
        tenant_id: TENANT.to_string(),
        client_id: "app-id".to_string(),
        client_secret: "app-secret".to_string(),
        graph_endpoint: server.uri(),
        authority_host: server.uri(),
        retry_attempts: 3,
        retry_delay_ms: 1,
        ..Default::default()
    }
}

fn alice() -> serde_json::Value {
    json!({
        "odata.type": "Microsoft.DirectoryServices.User",
        "objectId": ALICE_ID,
        "userPrincipalName": "alice@contoso.com",
        "accountEnabled": true,
        "displayName": "Alice",
        "mail": "alice@contoso.com",
        "mailNickname": "alice",
        "usageLocation": "GB",
        "onPremisesSamAccountName": "alice"
    })
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/{}/oauth2/v2.0/token", TENANT)))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=app-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "token_type": "Bearer",
            "expires_in": 3599
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_get_by_principal_name() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/contoso/users/alice%40contoso.com"))
        .and(query_param("api-version", "1.6"))
        .and(header("Authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .expect(2)
        .mount(&server)
        .await;

    let client = GraphClient::new(&config_for(&server)).unwrap();

    let user = client.get_by_principal_name("alice@contoso.com").await.unwrap();
    assert_eq!(user.object_id.as_deref(), Some(ALICE_ID));
    assert_eq!(user.onpremises_sam_account_name().as_deref(), Some("alice"));

    // Second call reuses the cached token
    client.get_by_principal_name("alice@contoso.com").await.unwrap();
}

#[tokio::test]
async fn test_principal_name_not_found() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/contoso/users/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "odata.error": {"code": "Request_ResourceNotFound"}
        })))
        .mount(&server)
        .await;

    let client = GraphClient::new(&config_for(&server)).unwrap();
    let err = client.get_by_principal_name("ghost@contoso.com").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_get_by_object_id_uses_filter() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/contoso/users"))
        .and(query_param("$filter", format!("objectId eq '{}'", ALICE_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [alice()] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphClient::new(&config_for(&server)).unwrap();
    let user = client.get_by_object_id(ALICE_ID).await.unwrap();
    assert_eq!(user.user_principal_name.as_deref(), Some("alice@contoso.com"));
}

#[tokio::test]
async fn test_object_id_empty_listing_is_not_found() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/contoso/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .mount(&server)
        .await;

    let client = GraphClient::new(&config_for(&server)).unwrap();
    let err = client
        .get_by_object_id("00000000-0000-0000-0000-0000000000ff")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_mail_nickname_exact_match_across_pages() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    // startswith() also returns "alicia"; only the exact nickname counts
    Mock::given(method("GET"))
        .and(path("/contoso/users"))
        .and(query_param("$filter", "startswith(mailNickname,'alice')"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"objectId": "other", "userPrincipalName": "alicia@contoso.com", "mailNickname": "alicia"}],
            "odata.nextLink": "directoryObjects/$/Microsoft.DirectoryServices.User?$skiptoken=page2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/contoso/directoryObjects/$/Microsoft.DirectoryServices.User"))
        .and(query_param("$skiptoken", "page2"))
        .and(query_param("api-version", "1.6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [alice()] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphClient::new(&config_for(&server)).unwrap();
    let user = client.get_by_mail_nickname("alice").await.unwrap();
    assert_eq!(user.object_id.as_deref(), Some(ALICE_ID));
}

#[tokio::test]
async fn test_retries_server_errors() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/contoso/users/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/contoso/users/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphClient::new(&config_for(&server)).unwrap();
    let user = client.get_by_principal_name("alice@contoso.com").await.unwrap();
    assert_eq!(user.display_name.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn test_gives_up_after_retry_attempts() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/contoso/users/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("down"))
        .expect(3)
        .mount(&server)
        .await;

    let client = GraphClient::new(&config_for(&server)).unwrap();
    let err = client.get_by_principal_name("alice@contoso.com").await.unwrap_err();
    assert!(err.is_retryable());
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_forbidden_is_not_retried() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/contoso/users/"))
        .respond_with(ResponseTemplate::new(403).set_body_string("insufficient privileges"))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphClient::new(&config_for(&server)).unwrap();
    let err = client.get_by_principal_name("alice@contoso.com").await.unwrap_err();
    assert!(err.to_string().contains("insufficient privileges"));
}

#[tokio::test]
async fn test_unauthorized_refreshes_token_once() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/contoso/users/"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/contoso/users/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphClient::new(&config_for(&server)).unwrap();
    client.get_by_principal_name("alice@contoso.com").await.unwrap();
}

#[tokio::test]
async fn test_guest_principal_name_is_path_encoded() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/contoso/users/bob_gmail.com%23EXT%23%40contoso.onmicrosoft.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objectId": "00000000-0000-0000-0000-00000000000b",
            "userPrincipalName": "bob_gmail.com#EXT#@contoso.onmicrosoft.com",
            "userType": "Guest"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphClient::new(&config_for(&server)).unwrap();
    let user = client
        .get_by_principal_name("bob_gmail.com#EXT#@contoso.onmicrosoft.com")
        .await
        .unwrap();
    assert_eq!(
        user.user_principal_name.as_deref(),
        Some("bob_gmail.com#EXT#@contoso.onmicrosoft.com")
    );

    let requests = server.received_requests().await.unwrap();
    let lookup = requests.iter().find(|r| r.method.as_str() == "GET").unwrap();
    assert!(lookup.url.path().contains("%23EXT%23"));
    assert_eq!(lookup.url.fragment(), None);
}

#[tokio::test]
async fn test_rate_limited_waits_for_retry_after() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/contoso/users/"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/contoso/users/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphClient::new(&config_for(&server)).unwrap();
    let started = Instant::now();
    client.get_by_principal_name("alice@contoso.com").await.unwrap();

    // retry_delay_ms is 1, so only Retry-After explains the wait
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_rate_limited_gives_up_with_retry_after() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/contoso/users/"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(3)
        .mount(&server)
        .await;

    let client = GraphClient::new(&config_for(&server)).unwrap();
    let err = client.get_by_principal_name("alice@contoso.com").await.unwrap_err();
    assert!(matches!(
        err,
        GraphError::RateLimited {
            retry_after: Some(wait)
        } if wait == Duration::ZERO
    ));
}

#[tokio::test]
async fn test_token_refresh_does_not_use_an_attempt() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/contoso/users/"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/contoso/users/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .expect(1)
        .mount(&server)
        .await;

    let config = DirectoryConfig {
        retry_attempts: 1,
        ..config_for(&server)
    };
    let client = GraphClient::new(&config).unwrap();
    let user = client.get_by_principal_name("alice@contoso.com").await.unwrap();
    assert_eq!(user.object_id.as_deref(), Some(ALICE_ID));
}

#[tokio::test]
async fn test_repeated_unauthorized_is_authentication_error() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/contoso/users/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .expect(2)
        .mount(&server)
        .await;

    let client = GraphClient::new(&config_for(&server)).unwrap();
    let err = client.get_by_principal_name("alice@contoso.com").await.unwrap_err();
    assert!(matches!(err, GraphError::Authentication(_)));
}

#[tokio::test]
async fn test_token_endpoint_server_error_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/{}/oauth2/v2.0/token", TENANT)))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/contoso/users/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphClient::new(&config_for(&server)).unwrap();
    let user = client.get_by_principal_name("alice@contoso.com").await.unwrap();
    assert_eq!(user.display_name.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn test_token_endpoint_throttling_exhausts_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/{}/oauth2/v2.0/token", TENANT)))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/contoso/users/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .expect(0)
        .mount(&server)
        .await;

    let client = GraphClient::new(&config_for(&server)).unwrap();
    let err = client.get_by_principal_name("alice@contoso.com").await.unwrap_err();
    assert!(matches!(err, GraphError::RateLimited { .. }));
}

#[tokio::test]
async fn test_token_failure_is_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/{}/oauth2/v2.0/token", TENANT)))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "AADSTS7000215: Invalid client secret provided.\r\nTrace ID: 0b1c\r\nCorrelation ID: 9f2e",
            "error_codes": [7000215]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GraphClient::new(&config_for(&server)).unwrap();
    let err = client.get_by_principal_name("alice@contoso.com").await.unwrap_err();
    assert!(matches!(err, GraphError::Authentication(_)));
    assert_eq!(
        err.to_string(),
        "Authentication failed: invalid_client: AADSTS7000215: Invalid client secret provided."
    );
}
