use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chargectl::api::client::ChargerApi;
use chargectl::auth::credentials::Credentials;
use chargectl::auth::manager::{spawn_periodic_refresh, CredentialManager};
use chargectl::auth::store::{FileTokenStore, TokenStore};
use chargectl::error::AppError;

const TOKEN_PATH: &str = "/v3/oauth2/token";

fn credentials() -> Credentials {
    Credentials {
        username: "user@example.com".into(),
        password: "hunter2".into(),
        client_id: "client-id".into(),
        client_secret: "client-secret".into(),
    }
}

fn manager_for(server_uri: &str, dir: &TempDir) -> (Arc<CredentialManager>, FileTokenStore) {
    let store = FileTokenStore::new(dir.path().join("tokens.json"));
    let api = ChargerApi::new(server_uri).unwrap();
    let manager = CredentialManager::new(api, credentials(), Arc::new(store.clone()));
    (Arc::new(manager), store)
}

async fn seed(store: &FileTokenStore, access: &str, refresh: Option<&str>) {
    store
        .save(&json!({"access_token": access, "refresh_token": refresh}))
        .await
        .unwrap();
}

fn token_response(access: &str, refresh: Option<&str>) -> ResponseTemplate {
    let mut body = json!({"access_token": access});
    if let Some(refresh) = refresh {
        body["refresh_token"] = json!(refresh);
    }
    ResponseTemplate::new(200).set_body_json(body)
}

#[tokio::test]
async fn stored_token_is_reused_without_network_calls() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = manager_for(&server.uri(), &dir);
    seed(&store, "T1", Some("R1")).await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("T9", None))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(manager.get_access_token().await.unwrap(), "T1");
    assert_eq!(manager.get_access_token().await.unwrap(), "T1");
}

#[tokio::test]
async fn missing_record_triggers_password_grant_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = manager_for(&server.uri(), &dir);

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("client_id=client-id"))
        .respond_with(token_response("T1", Some("R1")))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(manager.get_access_token().await.unwrap(), "T1");
    // Second call reuses the in-memory token; expect(1) above enforces it.
    assert_eq!(manager.get_access_token().await.unwrap(), "T1");

    let record = store.load().await.unwrap().unwrap();
    assert_eq!(record["access_token"], "T1");
    assert_eq!(record["refresh_token"], "R1");
}

#[tokio::test]
async fn record_without_access_token_reauthenticates() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = manager_for(&server.uri(), &dir);
    store
        .save(&json!({"refresh_token": "R1"}))
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=password"))
        .respond_with(token_response("T2", Some("R2")))
        .expect(1)
        .mount(&server)
        .await;

    assert!(!manager.load_tokens().await.unwrap());
    assert_eq!(manager.get_access_token().await.unwrap(), "T2");
}

#[tokio::test]
async fn non_mapping_record_reauthenticates() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = manager_for(&server.uri(), &dir);
    store.save(&json!(["not", "a", "mapping"])).await.unwrap();

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=password"))
        .respond_with(token_response("T2", Some("R2")))
        .expect(1)
        .mount(&server)
        .await;

    assert!(!manager.load_tokens().await.unwrap());
}

#[tokio::test]
async fn saved_tokens_survive_a_restart() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let (manager, _) = manager_for(&server.uri(), &dir);
    manager
        .save_tokens("A".into(), Some("R".into()))
        .await
        .unwrap();

    // A fresh manager over the same record simulates a process restart.
    let (restarted, store) = manager_for(&server.uri(), &dir);
    assert!(restarted.load_tokens().await.unwrap());
    assert_eq!(restarted.get_access_token().await.unwrap(), "A");

    let record = store.load().await.unwrap().unwrap();
    assert_eq!(record["refresh_token"], "R");
}

#[tokio::test]
async fn rejected_refresh_falls_back_to_password_grant() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = manager_for(&server.uri(), &dir);
    seed(&store, "T1", Some("R1")).await;
    assert!(manager.load_tokens().await.unwrap());

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=password"))
        .respond_with(token_response("T2", Some("R2")))
        .expect(1)
        .mount(&server)
        .await;

    assert!(manager.refresh_access_token().await.unwrap());
    assert_eq!(manager.get_access_token().await.unwrap(), "T2");
}

#[tokio::test]
async fn failed_fallback_keeps_prior_tokens() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = manager_for(&server.uri(), &dir);
    seed(&store, "T1", Some("R1")).await;
    assert!(manager.load_tokens().await.unwrap());

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=password"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    assert!(!manager.refresh_access_token().await.unwrap());
    assert_eq!(manager.get_access_token().await.unwrap(), "T1");

    let record = store.load().await.unwrap().unwrap();
    assert_eq!(record["access_token"], "T1");
    assert_eq!(record["refresh_token"], "R1");
}

#[tokio::test]
async fn transport_failure_reports_false_without_fallback() {
    // Nothing is listening on the discard port, so the refresh grant fails
    // at the transport layer instead of with an HTTP status.
    let dir = TempDir::new().unwrap();
    let (manager, store) = manager_for("http://127.0.0.1:9", &dir);
    seed(&store, "T1", Some("R1")).await;
    assert!(manager.load_tokens().await.unwrap());

    assert!(!manager.refresh_access_token().await.unwrap());
    assert_eq!(manager.get_access_token().await.unwrap(), "T1");
}

#[tokio::test]
async fn refresh_without_refresh_token_performs_full_login() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = manager_for(&server.uri(), &dir);
    seed(&store, "T1", None).await;
    assert!(manager.load_tokens().await.unwrap());

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=password"))
        .respond_with(token_response("T2", Some("R2")))
        .expect(1)
        .mount(&server)
        .await;

    assert!(manager.refresh_access_token().await.unwrap());
    assert_eq!(manager.get_access_token().await.unwrap(), "T2");
}

#[tokio::test]
async fn refresh_response_without_refresh_token_keeps_previous_one() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = manager_for(&server.uri(), &dir);
    seed(&store, "T1", Some("R1")).await;
    assert!(manager.load_tokens().await.unwrap());

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(token_response("T2", None))
        .expect(1)
        .mount(&server)
        .await;

    assert!(manager.refresh_access_token().await.unwrap());

    let record = store.load().await.unwrap().unwrap();
    assert_eq!(record["access_token"], "T2");
    assert_eq!(record["refresh_token"], "R1");
}

#[tokio::test]
async fn concurrent_refreshes_collapse_into_one_call() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = manager_for(&server.uri(), &dir);
    seed(&store, "T1", Some("R1")).await;
    assert!(manager.load_tokens().await.unwrap());

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=R1"))
        .respond_with(token_response("T2", Some("R2")))
        .expect(1)
        .mount(&server)
        .await;

    let (first, second) = tokio::join!(
        manager.refresh_after_unauthorized("T1"),
        manager.refresh_after_unauthorized("T1"),
    );
    assert!(first.unwrap());
    assert!(second.unwrap());
    assert_eq!(manager.get_access_token().await.unwrap(), "T2");
}

#[tokio::test]
async fn storage_fault_propagates_from_authenticate() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // Point the record path below a regular file so the save must fail.
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();
    let store = FileTokenStore::new(blocker.join("tokens.json"));
    let api = ChargerApi::new(&server.uri()).unwrap();
    let manager = CredentialManager::new(api, credentials(), Arc::new(store));

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("T1", Some("R1")))
        .expect(1)
        .mount(&server)
        .await;

    let err = manager.authenticate().await.unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));
}

#[tokio::test]
async fn periodic_task_refreshes_on_schedule() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (manager, store) = manager_for(&server.uri(), &dir);
    seed(&store, "T1", Some("R1")).await;
    assert!(manager.load_tokens().await.unwrap());

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(token_response("T2", Some("R2")))
        .expect(1..)
        .mount(&server)
        .await;

    let handle = spawn_periodic_refresh(Arc::clone(&manager), Duration::from_millis(25));
    tokio::time::sleep(Duration::from_millis(150)).await;
    handle.abort();

    assert_eq!(manager.get_access_token().await.unwrap(), "T2");
}
