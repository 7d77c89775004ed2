//! End-to-end tests: real reqwest transport against a mock backend.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use courtyard::Client;
use courtyard_application::{CredentialStore, SubscriberResult};
use courtyard_domain::{
    ClientSettings, CredentialScope, ErrorKind, MultipartField, QueryParams, RequestBody,
    SyncCycle, SESSION_EXPIRED_MESSAGE,
};
use courtyard_infrastructure::{
    FileCredentialStore, MemoryCredentialStore, ReqwestTransport, StaticPushPlatform,
    TokioFileSystem,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer) -> ClientSettings {
    ClientSettings {
        base_url: format!("{}/api", server.uri()),
        poll_interval_secs: 3600,
        ..ClientSettings::default()
    }
}

fn client_with(
    server: &MockServer,
    credentials: Arc<dyn CredentialStore>,
) -> Client<ReqwestTransport> {
    Client::new(
        settings(server),
        Arc::new(ReqwestTransport::new().unwrap()),
        credentials,
    )
    .unwrap()
}

async fn resident_client(server: &MockServer) -> Client<ReqwestTransport> {
    let client = client_with(server, Arc::new(MemoryCredentialStore::new()));
    client
        .executor()
        .store_credential(CredentialScope::Standard, "resident-tok")
        .await
        .unwrap();
    client
}

fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": data}))
}

fn notifications(count: usize) -> Value {
    Value::Array(
        (0..count)
            .map(|i| json!({"_id": format!("n{i}"), "title": "Water cut", "isRead": false}))
            .collect(),
    )
}

async fn mount_feed(server: &MockServer, listed: usize, announced: usize, unread: u64) {
    Mock::given(method("GET"))
        .and(path("/api/notifications"))
        .respond_with(ok(notifications(listed)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/notifications/announcements"))
        .respond_with(ok(notifications(announced)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/notifications/unread-count"))
        .respond_with(ok(json!({"count": unread})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn unread_count_carries_resident_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notifications/unread-count"))
        .and(header("authorization", "Bearer resident-tok"))
        .respond_with(ok(json!({"count": 4})))
        .expect(1)
        .mount(&server)
        .await;

    let client = resident_client(&server).await;
    assert_eq!(client.notifications().unread_count().await.unwrap(), 4);
}

#[tokio::test]
async fn admin_routes_carry_admin_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/residents"))
        .and(header("authorization", "Bearer admin-tok"))
        .respond_with(ok(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = resident_client(&server).await;
    client
        .executor()
        .store_credential(CredentialScope::Elevated, "admin-tok")
        .await
        .unwrap();

    let envelope = client
        .executor()
        .get("/admin/residents", QueryParams::new())
        .await
        .unwrap();
    assert!(envelope.success);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), None);
}

#[tokio::test]
async fn expired_session_is_purged_from_disk() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notifications/unread-count"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"success": false, "message": "jwt expired"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileCredentialStore::new(
        TokioFileSystem::new(),
        dir.path().join("credentials.json"),
    ));
    let client = client_with(&server, store.clone());
    client
        .executor()
        .store_credential(CredentialScope::Standard, "stale")
        .await
        .unwrap();

    let failure = client.notifications().unread_count().await.unwrap_err();
    assert_eq!(failure.kind, ErrorKind::Unauthorized);
    assert_eq!(failure.message, SESSION_EXPIRED_MESSAGE);
    assert_eq!(store.load(CredentialScope::Standard).await.unwrap(), None);

    // No credential left: the next call never reaches the server.
    let failure = client.notifications().unread_count().await.unwrap_err();
    assert_eq!(failure.kind, ErrorKind::Unauthenticated);
}

#[tokio::test]
async fn rejected_mark_read_surfaces_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/notifications/n9/read"))
        .respond_with(ResponseTemplate::new(404).set_body_json(
            json!({"success": false, "message": "Notification not found"}),
        ))
        .mount(&server)
        .await;

    let client = resident_client(&server).await;
    let failure = client.notifications().mark_read("n9").await.unwrap_err();

    assert_eq!(failure.kind, ErrorKind::ValidationFailed);
    assert_eq!(failure.message, "Notification not found");
}

#[tokio::test]
async fn multipart_upload_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/complaints"))
        .respond_with(ok(json!({"id": "c1"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = resident_client(&server).await;
    let body = RequestBody::Multipart(vec![
        MultipartField::text("title", "Leaking tap"),
        MultipartField::file("photo", "leak.png", vec![0x89, b'P', b'N', b'G']),
    ]);
    client.executor().post("/complaints", body).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    let raw = String::from_utf8_lossy(&requests[0].body);
    assert!(raw.contains("filename=\"leak.png\""));
    assert!(raw.contains("Leaking tap"));
}

#[tokio::test]
async fn sync_engine_reports_count_changes() {
    let server = MockServer::start().await;
    mount_feed(&server, 2, 1, 2).await;

    let client = resident_client(&server).await;
    let engine = client.sync_engine(None);
    let seen: Arc<Mutex<Vec<SyncCycle>>> = Arc::default();
    let sink = Arc::clone(&seen);

    engine
        .start_polling(Arc::new(move |cycle: &SyncCycle| -> SubscriberResult {
            sink.lock().unwrap().push(cycle.clone());
            Ok(())
        }))
        .await;

    {
        let cycles = seen.lock().unwrap();
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].has_changes);
        assert_eq!(cycles[0].unread_count, 2);
        assert_eq!(cycles[0].notifications.len(), 2);
    }

    assert!(!engine.sync_now().await.has_changes);

    server.reset().await;
    mount_feed(&server, 2, 1, 5).await;
    let cycle = engine.sync_now().await;
    assert!(cycle.has_changes);
    assert_eq!(engine.snapshot().unread, 5);
    assert_eq!(seen.lock().unwrap().len(), 3);

    engine.stop_polling();
}

#[tokio::test]
async fn sync_engine_keeps_last_good_slice() {
    let server = MockServer::start().await;
    mount_feed(&server, 3, 0, 1).await;

    let client = resident_client(&server).await;
    let engine = client.sync_engine(None);
    engine
        .start_polling(Arc::new(|_: &SyncCycle| -> SubscriberResult { Ok(()) }))
        .await;

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/api/notifications"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/notifications/announcements"))
        .respond_with(ok(notifications(0)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/notifications/unread-count"))
        .respond_with(ok(json!({"count": 1})))
        .mount(&server)
        .await;

    let cycle = engine.sync_now().await;
    assert_eq!(cycle.notifications.len(), 3);
    assert!(!cycle.has_changes);
    assert!(cycle.is_stale(courtyard_domain::Slice::Notifications));

    engine.stop_polling();
}

#[tokio::test]
async fn push_registration_submits_device_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/notifications/register-token"))
        .and(body_json(json!({"pushToken": "device-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = resident_client(&server).await;
    let engine = client.sync_engine(Some(Arc::new(StaticPushPlatform::granted("device-1"))));

    let token = engine.register_for_push_notifications().await.unwrap();
    assert_eq!(token.as_deref(), Some("device-1"));
}

#[tokio::test]
async fn denied_push_permission_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/notifications/register-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(0)
        .mount(&server)
        .await;

    let client = resident_client(&server).await;
    let engine = client.sync_engine(Some(Arc::new(StaticPushPlatform::denied())));

    assert_eq!(engine.register_for_push_notifications().await.unwrap(), None);
}
