//! Contract tests for `HttpConversationStore` against a mock of the
//! conversation-store REST surface.

use signbridge_core::{Message, Sender, SignbridgeError};
use signbridge_session::{ConversationStore, HttpConversationStore, Session};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_json(id: Uuid, ended: bool) -> serde_json::Value {
    let mut json = serde_json::json!({
        "sessionId": id,
        "startTime": "2026-08-06T10:15:00Z",
        "messages": [
            { "sender": "agent", "content": "Hello! I am here to help.",
              "timestamp": "2026-08-06T10:15:00Z" }
        ]
    });
    if ended {
        json["endTime"] = serde_json::json!("2026-08-06T10:20:00Z");
    }
    json
}

#[tokio::test]
async fn test_create_posts_seed_messages() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/api/conversations"))
        .and(body_partial_json(serde_json::json!({
            "sessionId": id,
            "messages": [{ "sender": "agent", "content": "Hello! I am here to help." }]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(session_json(id, false)))
        .expect(1)
        .mount(&server)
        .await;

    let store = HttpConversationStore::new(format!("{}/api", server.uri()));
    let seed = vec![Message::agent("Hello! I am here to help.")];
    store.create(id, &seed).await.unwrap();
}

#[tokio::test]
async fn test_create_conflict_when_id_exists() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/api/conversations"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "message": "a conversation with this session id already exists"
        })))
        .mount(&server)
        .await;

    let store = HttpConversationStore::new(format!("{}/api", server.uri()));
    let err = store.create(id, &[]).await.unwrap_err();
    assert!(matches!(err, SignbridgeError::Conflict(conflicting) if conflicting == id));
}

#[tokio::test]
async fn test_append_puts_sender_and_content() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("PUT"))
        .and(path(format!("/api/conversations/{id}")))
        .and(body_partial_json(serde_json::json!({
            "sender": "client",
            "content": "HELLO"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json(id, false)))
        .expect(1)
        .mount(&server)
        .await;

    let store = HttpConversationStore::new(format!("{}/api", server.uri()));
    store.append(id, Sender::Client, "HELLO").await.unwrap();
}

#[tokio::test]
async fn test_append_unknown_id_is_not_found() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("PUT"))
        .and(path(format!("/api/conversations/{id}")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = HttpConversationStore::new(format!("{}/api", server.uri()));
    let err = store.append(id, Sender::Client, "HELLO").await.unwrap_err();
    assert!(matches!(err, SignbridgeError::NotFound(missing) if missing == id));
}

#[tokio::test]
async fn test_end_patches_the_end_route() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path(format!("/api/conversations/{id}/end")))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json(id, true)))
        .expect(1)
        .mount(&server)
        .await;

    let store = HttpConversationStore::new(format!("{}/api", server.uri()));
    store.end(id).await.unwrap();
}

#[tokio::test]
async fn test_end_unknown_id_is_not_found() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path(format!("/api/conversations/{id}/end")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = HttpConversationStore::new(format!("{}/api", server.uri()));
    let err = store.end(id).await.unwrap_err();
    assert!(matches!(err, SignbridgeError::NotFound(_)));
}

#[tokio::test]
async fn test_get_decodes_the_wire_shape() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/api/conversations/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json(id, true)))
        .mount(&server)
        .await;

    let store = HttpConversationStore::new(format!("{}/api", server.uri()));
    let session: Session = store.get(id).await.unwrap();
    assert_eq!(session.session_id, id);
    assert!(session.end_time.is_some());
    assert_eq!(session.messages.len(), 1);
    assert_eq!(session.messages[0].sender, Sender::Agent);
}

#[tokio::test]
async fn test_list_decodes_all_conversations() {
    let server = MockServer::start().await;
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/api/conversations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([session_json(a, true), session_json(b, false)])),
        )
        .mount(&server)
        .await;

    let store = HttpConversationStore::new(format!("{}/api", server.uri()));
    let sessions = store.list().await.unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].session_id, a);
    assert!(sessions[1].end_time.is_none());
}

#[tokio::test]
async fn test_delete_maps_status_codes() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path(format!("/api/conversations/{id}")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = HttpConversationStore::new(format!("{}/api", server.uri()));
    store.delete(id).await.unwrap();

    let missing = Uuid::new_v4();
    Mock::given(method("DELETE"))
        .and(path(format!("/api/conversations/{missing}")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let err = store.delete(missing).await.unwrap_err();
    assert!(matches!(err, SignbridgeError::NotFound(_)));
}

#[tokio::test]
async fn test_server_error_is_a_store_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/conversations"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = HttpConversationStore::new(format!("{}/api", server.uri()));
    let err = store.list().await.unwrap_err();
    assert!(matches!(err, SignbridgeError::Store(_)));
}
