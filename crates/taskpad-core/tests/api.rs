//! ApiClient and SessionStore against a mock backend.
//!
//! Each test starts a wiremock server playing the to-do API under `/api` and
//! drives the client over real HTTP. UI side effects are observed on the
//! `ChannelFeedback` receiver.

use std::sync::Arc;

use serde_json::json;
use taskpad_core::auth::{codec, KeyValueStore, MemoryStore, SessionStore, CREDENTIAL_KEY};
use taskpad_core::{ApiClient, ApiError, ChannelFeedback, Route, ToastLevel, UiEvent};
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: MockServer,
    storage: Arc<MemoryStore>,
    session: Arc<SessionStore>,
    api: ApiClient,
    events: UnboundedReceiver<UiEvent>,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let (storage, session, api, events) = client_at(&format!("{}/api", server.uri()));
    Harness {
        server,
        storage,
        session,
        api,
        events,
    }
}

type Client = (
    Arc<MemoryStore>,
    Arc<SessionStore>,
    ApiClient,
    UnboundedReceiver<UiEvent>,
);

fn client_at(base_url: &str) -> Client {
    let storage = Arc::new(MemoryStore::new());
    let session = Arc::new(SessionStore::new(storage.clone()));
    let (feedback, events) = ChannelFeedback::new();
    let api = ApiClient::new(base_url, None, session.clone(), Arc::new(feedback)).unwrap();
    (storage, session, api, events)
}

fn drain(events: &mut UnboundedReceiver<UiEvent>) -> Vec<UiEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn toasts(events: &[UiEvent]) -> Vec<(ToastLevel, String)> {
    events
        .iter()
        .filter_map(|e| match e {
            UiEvent::Toast { toast, .. } => Some((toast.level, toast.message.clone())),
            UiEvent::Navigate(_) => None,
        })
        .collect()
}

fn navigations(events: &[UiEvent]) -> Vec<Route> {
    events
        .iter()
        .filter_map(|e| match e {
            UiEvent::Navigate(route) => Some(*route),
            UiEvent::Toast { .. } => None,
        })
        .collect()
}

fn todo_json(id: i64, status: &str) -> serde_json::Value {
    json!({"id": id, "title": "Buy milk", "description": "2 litres", "status": status})
}

// ===== Login =====

#[tokio::test]
async fn login_stores_token_and_navigates_after_dismissal() {
    let Harness {
        server,
        storage,
        session,
        api,
        mut events,
    } = harness().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"username": "alice", "password": "secret"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"token": "abc123"})))
        .expect(1)
        .mount(&server)
        .await;

    let ui = async {
        match events.recv().await {
            Some(UiEvent::Toast { toast, dismissed }) => {
                assert_eq!(toast.level, ToastLevel::Success);
                // Live before the toast goes away, navigation only after
                assert_eq!(session.current_credential(), "abc123");
                assert!(events.try_recv().is_err());
                dismissed.send(()).unwrap();
            }
            other => panic!("expected success toast, got {:?}", other),
        }
    };

    let (logged_in, ()) = tokio::join!(api.login("alice", "secret"), ui);

    assert!(logged_in);
    assert_eq!(navigations(&drain(&mut events)), vec![Route::Home]);
    assert_eq!(*session.observe_credential().borrow(), "abc123");
    let stored = storage.get(CREDENTIAL_KEY).unwrap().unwrap();
    assert_eq!(codec::decode(&stored).unwrap(), "abc123");
}

#[tokio::test]
async fn login_with_wrong_password_leaves_session_alone() {
    let mut h = harness().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"statusCode": 401, "message": "Invalid credentials"})),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    assert!(!h.api.login("alice", "wrong").await);

    let events = drain(&mut h.events);
    assert_eq!(toasts(&events).len(), 1);
    assert_eq!(toasts(&events)[0].0, ToastLevel::Error);
    assert!(navigations(&events).is_empty());
    assert_eq!(h.session.current_credential(), "");
    assert_eq!(h.storage.get(CREDENTIAL_KEY).unwrap(), None);
}

#[tokio::test]
async fn failed_login_keeps_existing_credential() {
    let mut h = harness().await;
    h.session.set_credential("previous");

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    assert!(!h.api.login("alice", "wrong").await);
    assert_eq!(h.session.current_credential(), "previous");
    assert_eq!(toasts(&drain(&mut h.events))[0].0, ToastLevel::Error);
}

#[tokio::test]
async fn login_response_without_token_changes_nothing() {
    let mut h = harness().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": ""})))
        .mount(&h.server)
        .await;

    assert!(!h.api.login("alice", "secret").await);
    assert_eq!(h.session.current_credential(), "");
    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test]
async fn login_network_failure_is_reported() {
    // Nothing listens on port 1
    let (_storage, session, api, mut events) = client_at("http://127.0.0.1:1/api");

    assert!(!api.login("alice", "secret").await);
    assert_eq!(session.current_credential(), "");

    let events = drain(&mut events);
    assert_eq!(toasts(&events)[0].0, ToastLevel::Error);
    assert!(navigations(&events).is_empty());
}

// ===== Register =====

#[tokio::test]
async fn register_returns_response_body() {
    let mut h = harness().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_json(json!({"username": "bob", "password": "hunter2"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 5, "username": "bob"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let body = h.api.register("bob", "hunter2").await;

    assert_eq!(body, Some(json!({"id": 5, "username": "bob"})));
    assert!(drain(&mut h.events).is_empty());
    assert_eq!(h.session.current_credential(), "");
}

#[tokio::test]
async fn register_failure_shows_backend_message() {
    let mut h = harness().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"statusCode": 409, "message": "Username already exists"})),
        )
        .mount(&h.server)
        .await;

    assert_eq!(h.api.register("bob", "hunter2").await, None);
    assert_eq!(
        toasts(&drain(&mut h.events)),
        vec![(ToastLevel::Error, "Username already exists".to_string())]
    );
}

// ===== Authorized calls =====

#[tokio::test]
async fn list_todos_sends_current_credential() {
    let h = harness().await;

    Mock::given(method("GET"))
        .and(path("/api/todo"))
        .and(header("authorization", "Bearer abc123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([todo_json(1, "OPEN"), todo_json(2, "DONE")])),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    // Set after the client was built; the header must still carry it
    h.session.set_credential("abc123");
    let todos = h.api.list_todos().await.unwrap();

    assert_eq!(todos.len(), 2);
    assert_eq!(todos[1].id, 2);
    assert!(todos[1].is_done());
}

#[tokio::test]
async fn authorized_call_without_credential_still_fires() {
    let h = harness().await;

    Mock::given(method("GET"))
        .and(path("/api/todo"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthorized"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.api.list_todos().await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn create_todo_posts_title_and_description() {
    let mut h = harness().await;
    h.session.set_credential("abc123");

    Mock::given(method("POST"))
        .and(path("/api/todo"))
        .and(header("authorization", "Bearer abc123"))
        .and(body_json(json!({"title": "Buy milk", "description": "2 litres"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(todo_json(9, "OPEN")))
        .expect(1)
        .mount(&h.server)
        .await;

    let todo = h.api.create_todo("Buy milk", "2 litres").await.unwrap();

    assert_eq!(todo.id, 9);
    assert_eq!(todo.title, "Buy milk");
    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test]
async fn create_todo_failure_propagates() {
    let mut h = harness().await;

    Mock::given(method("POST"))
        .and(path("/api/todo"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database down"))
        .mount(&h.server)
        .await;

    let err = h.api.create_todo("x", "y").await.unwrap_err();
    assert!(matches!(err, ApiError::ServerError(ref msg) if msg == "database down"));
    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test]
async fn update_status_patches_and_notifies() {
    let mut h = harness().await;
    h.session.set_credential("abc123");

    Mock::given(method("PATCH"))
        .and(path("/api/todo/3"))
        .and(body_json(json!({"status": "DONE"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(todo_json(3, "DONE")))
        .expect(1)
        .mount(&h.server)
        .await;

    let todo = h.api.update_status("DONE", 3).await.unwrap();

    assert_eq!(todo.status, "DONE");
    assert_eq!(
        toasts(&drain(&mut h.events)),
        vec![(ToastLevel::Success, "Status updated".to_string())]
    );
}

#[tokio::test]
async fn update_status_failure_propagates_without_toast() {
    let mut h = harness().await;

    Mock::given(method("PATCH"))
        .and(path("/api/todo/3"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Todo not found"})))
        .mount(&h.server)
        .await;

    let err = h.api.update_status("DONE", 3).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(ref msg) if msg == "Todo not found"));
    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test]
async fn delete_confirmed_shows_toast() {
    let mut h = harness().await;
    h.session.set_credential("abc123");

    Mock::given(method("DELETE"))
        .and(path("/api/todo/42"))
        .and(header("authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&h.server)
        .await;

    assert!(h.api.delete_todo(42).await.unwrap());
    assert_eq!(
        toasts(&drain(&mut h.events)),
        vec![(ToastLevel::Success, "Todo deleted".to_string())]
    );
}

#[tokio::test]
async fn delete_unconfirmed_is_silent() {
    let mut h = harness().await;

    Mock::given(method("DELETE"))
        .and(path("/api/todo/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .mount(&h.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/todo/43"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&h.server)
        .await;

    assert!(!h.api.delete_todo(42).await.unwrap());
    assert!(!h.api.delete_todo(43).await.unwrap());
    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test]
async fn delete_error_status_propagates() {
    let mut h = harness().await;

    Mock::given(method("DELETE"))
        .and(path("/api/todo/42"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "Not your todo"})))
        .mount(&h.server)
        .await;

    let err = h.api.delete_todo(42).await.unwrap_err();
    assert!(matches!(err, ApiError::AccessDenied(_)));
    assert!(drain(&mut h.events).is_empty());
}

// ===== Session restore =====

#[tokio::test]
async fn restore_accepts_verified_token() {
    let mut h = harness().await;
    h.storage
        .set(CREDENTIAL_KEY, &codec::encode("persisted-token"))
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/verifyToken"))
        .and(body_json(json!({"token": "persisted-token"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true})))
        .expect(1)
        .mount(&h.server)
        .await;

    let mut rx = h.session.observe_credential();
    h.api.restore_session().await;

    assert_eq!(h.session.current_credential(), "persisted-token");
    assert_eq!(*rx.borrow_and_update(), "persisted-token");
    assert_eq!(
        h.storage.get(CREDENTIAL_KEY).unwrap(),
        Some(codec::encode("persisted-token"))
    );
    assert!(drain(&mut h.events).is_empty());
}

#[tokio::test]
async fn restore_drops_rejected_token() {
    let h = harness().await;
    h.storage.set(CREDENTIAL_KEY, &codec::encode("expired")).unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/verifyToken"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .expect(1)
        .mount(&h.server)
        .await;

    h.api.restore_session().await;

    assert_eq!(h.session.current_credential(), "");
    assert_eq!(h.storage.get(CREDENTIAL_KEY).unwrap(), None);
}

#[tokio::test]
async fn restore_drops_token_reported_invalid() {
    let h = harness().await;
    h.storage.set(CREDENTIAL_KEY, &codec::encode("revoked")).unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/verifyToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": false})))
        .mount(&h.server)
        .await;

    h.api.restore_session().await;

    assert_eq!(h.session.current_credential(), "");
    assert_eq!(h.storage.get(CREDENTIAL_KEY).unwrap(), None);
}

#[tokio::test]
async fn restore_discards_corrupt_entry_without_calling_server() {
    let mut h = harness().await;
    h.storage.set(CREDENTIAL_KEY, "***corrupt***").unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/verifyToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true})))
        .expect(0)
        .mount(&h.server)
        .await;

    h.api.restore_session().await;

    assert_eq!(h.session.current_credential(), "");
    assert_eq!(h.storage.get(CREDENTIAL_KEY).unwrap(), None);
    assert_eq!(toasts(&drain(&mut h.events))[0].0, ToastLevel::Info);
}

// ===== Logout =====

#[tokio::test]
async fn logout_clears_session_then_navigates_to_login() {
    let Harness {
        server: _server,
        storage,
        session,
        api,
        mut events,
    } = harness().await;
    session.set_credential("abc123");

    let ui = async {
        match events.recv().await {
            Some(UiEvent::Toast { toast, dismissed }) => {
                assert_eq!(toast.level, ToastLevel::Success);
                assert_eq!(session.current_credential(), "");
                drop(dismissed);
            }
            other => panic!("expected toast, got {:?}", other),
        }
    };

    tokio::join!(api.logout(), ui);

    assert_eq!(navigations(&drain(&mut events)), vec![Route::Login]);
    assert_eq!(storage.get(CREDENTIAL_KEY).unwrap(), None);
}
