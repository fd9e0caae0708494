use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock analyzer backend for exercising the HTTP gateway
pub struct BackendMockServer {
    server: MockServer,
}

impl BackendMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    pub async fn mock_chat_answer(&self, answer: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "session_id": "ignored",
                "answer": answer
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_chat_error(&self, status: u16, detail: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "detail": detail })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_upload_counts(&self, files_saved: u64, chunks_indexed: u64) {
        Mock::given(method("POST"))
            .and(path("/upload/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "session_id": "ignored",
                "files_saved": files_saved,
                "chunks_indexed": chunks_indexed
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_upload_error(&self, status: u16, detail: &str) {
        Mock::given(method("POST"))
            .and(path("/upload/"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "detail": detail })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_health(&self, status: &str) {
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": status })))
            .mount(&self.server)
            .await;
    }
}
