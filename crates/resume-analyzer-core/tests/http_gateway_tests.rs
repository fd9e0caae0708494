mod common;

use std::fs;

use common::BackendMockServer;
use resume_analyzer_core::{
    BackendGateway, ConversationController, GatewayError, HttpGateway, MemorySessionStore,
    SessionIdentity, SessionStore, TurnState, UploadCoordinator,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn chat_sends_session_and_message() {
    let mock = BackendMockServer::new().await;
    Mock::given(method("POST"))
        .and(path("/chat/"))
        .and(body_json(json!({ "session_id": "sess-1", "message": "What is my GPA?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "sess-1",
            "answer": "3.8"
        })))
        .expect(1)
        .mount(mock.server())
        .await;

    let mut store = MemorySessionStore::new();
    store.save("sess-1").unwrap();
    let token = SessionIdentity::new(Box::new(store)).get_session_id();
    let gateway = HttpGateway::new(&mock.uri());

    let answer = gateway.submit_chat(&token, "What is my GPA?").await.unwrap();
    assert_eq!(answer.answer, "3.8");
}

#[tokio::test]
async fn chat_failure_surfaces_server_detail() {
    let mock = BackendMockServer::new().await;
    mock.mock_chat_error(500, "network timeout").await;

    let gateway = HttpGateway::new(&mock.uri());
    let mut identity = SessionIdentity::in_memory();
    let mut chat = ConversationController::new();

    assert!(chat.submit("hello", &gateway, &identity.get_session_id()).await);

    let last = chat.turns().last().unwrap();
    assert_eq!(last.state, TurnState::Failed("network timeout".to_string()));
    assert!(!chat.is_busy());
}

#[tokio::test]
async fn chat_success_through_controller() {
    let mock = BackendMockServer::new().await;
    mock.mock_chat_answer("3.8").await;

    let gateway = HttpGateway::new(&mock.uri());
    let mut identity = SessionIdentity::in_memory();
    let mut chat = ConversationController::new();

    assert!(chat.submit("What is my GPA?", &gateway, &identity.get_session_id()).await);
    assert_eq!(chat.turns().len(), 2);
    assert_eq!(chat.turns()[1].text(), Some("3.8"));
}

#[tokio::test]
async fn upload_sends_multipart_form() {
    let mock = BackendMockServer::new().await;
    Mock::given(method("POST"))
        .and(path("/upload/"))
        .and(body_string_contains("name=\"session_id\""))
        .and(body_string_contains("filename=\"resume.pdf\""))
        .and(body_string_contains("filename=\"cover.txt\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "whatever",
            "files_saved": 2,
            "chunks_indexed": 7
        })))
        .expect(1)
        .mount(mock.server())
        .await;

    let dir = tempfile::tempdir().unwrap();
    let resume = dir.path().join("resume.pdf");
    let cover = dir.path().join("cover.txt");
    fs::write(&resume, "Jane Doe, GPA 3.8").unwrap();
    fs::write(&cover, "Dear hiring manager").unwrap();

    let gateway = HttpGateway::new(&mock.uri());
    let mut identity = SessionIdentity::in_memory();
    let mut upload = UploadCoordinator::new();
    upload.select_files([resume, cover]);

    assert!(upload.submit(&gateway, &identity.get_session_id()).await);
    assert!(upload.selected().is_empty());
    assert_eq!(upload.status(), Some("Uploaded 2 file(s), indexed 7 chunks."));

    let requests = mock.server().received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains(identity.get_session_id().as_str()));
}

#[tokio::test]
async fn upload_rejection_keeps_selection() {
    let mock = BackendMockServer::new().await;
    mock.mock_upload_error(415, "Unsupported type: .docx").await;

    let dir = tempfile::tempdir().unwrap();
    let doc = dir.path().join("resume.docx");
    fs::write(&doc, "binary-ish").unwrap();

    let gateway = HttpGateway::new(&mock.uri());
    let mut identity = SessionIdentity::in_memory();
    let mut upload = UploadCoordinator::new();
    upload.select_files([doc]);

    assert!(upload.submit(&gateway, &identity.get_session_id()).await);
    assert_eq!(upload.selected().len(), 1);
    assert_eq!(upload.status(), Some("Unsupported type: .docx"));
}

#[tokio::test]
async fn upload_counts_scenario() {
    let mock = BackendMockServer::new().await;
    mock.mock_upload_counts(1, 12).await;

    let dir = tempfile::tempdir().unwrap();
    let resume = dir.path().join("resume.pdf");
    fs::write(&resume, "resume").unwrap();

    let gateway = HttpGateway::new(&mock.uri());
    let mut identity = SessionIdentity::in_memory();
    let mut upload = UploadCoordinator::new();
    upload.select_files([resume]);

    upload.submit(&gateway, &identity.get_session_id()).await;
    let outcome = upload.last_outcome().unwrap();
    assert_eq!(outcome.files_saved, 1);
    assert_eq!(outcome.chunks_indexed, 12);
    assert!(upload.selected().is_empty());
}

#[tokio::test]
async fn unreadable_file_is_reported() {
    let mock = BackendMockServer::new().await;
    mock.mock_upload_counts(1, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let resume = dir.path().join("resume.pdf");
    fs::write(&resume, "resume").unwrap();

    let mut upload = UploadCoordinator::new();
    upload.select_files([resume.clone()]);
    fs::remove_file(&resume).unwrap();

    let gateway = HttpGateway::new(&mock.uri());
    let mut identity = SessionIdentity::in_memory();
    upload.submit(&gateway, &identity.get_session_id()).await;

    let status = upload.status().unwrap();
    assert!(status.starts_with("Could not read"), "{status}");
    assert_eq!(upload.selected().len(), 1);
}

#[tokio::test]
async fn malformed_success_body_is_a_decode_error() {
    let mock = BackendMockServer::new().await;
    Mock::given(method("POST"))
        .and(path("/chat/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(mock.server())
        .await;

    let gateway = HttpGateway::new(&mock.uri());
    let mut identity = SessionIdentity::in_memory();
    let err = gateway
        .submit_chat(&identity.get_session_id(), "hi")
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Decode(_)));
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let gateway = HttpGateway::new("http://127.0.0.1:1");
    let mut identity = SessionIdentity::in_memory();
    let err = gateway
        .submit_chat(&identity.get_session_id(), "hi")
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)));
    assert!(!err.user_message("fallback").is_empty());
}

#[tokio::test]
async fn health_probe() {
    let mock = BackendMockServer::new().await;
    mock.mock_health("ok").await;
    let gateway = HttpGateway::new(&mock.uri());
    assert!(gateway.health().await.is_ok());

    let degraded = BackendMockServer::new().await;
    degraded.mock_health("starting").await;
    let gateway = HttpGateway::new(&degraded.uri());
    assert!(gateway.health().await.is_err());
}
