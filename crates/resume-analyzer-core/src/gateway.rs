//! Transport to the resume analyzer backend.
//!
//! Every call is a single request/response round trip: no streaming, no
//! retries, no client-side timeout.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SessionToken;
use crate::state::{ChatAnswer, UploadOutcome};
use crate::upload::FileHandle;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success status. `detail` is the server's reason, possibly empty.
    #[error("{detail}")]
    Server { status: u16, detail: String },
    #[error("Could not read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unexpected response from backend: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Text to show the user, or `fallback` when the error carries none
    pub fn user_message(&self, fallback: &str) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }
}

#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Upload and index a batch of documents under `session`
    async fn submit_files(
        &self,
        session: &SessionToken,
        files: &[FileHandle],
    ) -> Result<UploadOutcome, GatewayError>;

    /// Ask a question against the documents indexed for `session`
    async fn submit_chat(
        &self,
        session: &SessionToken,
        message: &str,
    ) -> Result<ChatAnswer, GatewayError>;

    /// Liveness probe
    async fn health(&self) -> Result<(), GatewayError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    session_id: &'a str,
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    answer: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    files_saved: u64,
    chunks_indexed: u64,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl BackendGateway for HttpGateway {
    async fn submit_files(
        &self,
        session: &SessionToken,
        files: &[FileHandle],
    ) -> Result<UploadOutcome, GatewayError> {
        let mut form = Form::new().text("session_id", session.as_str().to_string());

        for file in files {
            let bytes = tokio::fs::read(&file.path)
                .await
                .map_err(|source| GatewayError::File {
                    path: file.path.clone(),
                    source,
                })?;
            let part = Part::bytes(bytes)
                .file_name(file.name.clone())
                .mime_str(mime_for(&file.path))?;
            form = form.part("files", part);
        }

        tracing::debug!(session = %session, count = files.len(), "Uploading files");

        let response = self
            .client
            .post(self.url("/upload/"))
            .multipart(form)
            .send()
            .await?;

        let upload: UploadResponse = decode(response).await?;
        Ok(UploadOutcome {
            files_saved: upload.files_saved,
            chunks_indexed: upload.chunks_indexed,
        })
    }

    async fn submit_chat(
        &self,
        session: &SessionToken,
        message: &str,
    ) -> Result<ChatAnswer, GatewayError> {
        let request = ChatRequest {
            session_id: session.as_str(),
            message,
        };

        tracing::debug!(session = %session, "Sending chat message");

        let response = self
            .client
            .post(self.url("/chat/"))
            .json(&request)
            .send()
            .await?;

        let chat: ChatResponse = decode(response).await?;
        Ok(ChatAnswer { answer: chat.answer })
    }

    async fn health(&self) -> Result<(), GatewayError> {
        let response = self.client.get(self.url("/health")).send().await?;
        let health: HealthResponse = decode(response).await?;

        if health.status == "ok" {
            Ok(())
        } else {
            Err(GatewayError::Decode(format!("health status {:?}", health.status)))
        }
    }
}

async fn decode<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, GatewayError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "Backend request failed");
        return Err(GatewayError::Server {
            status: status.as_u16(),
            detail: error_detail(&body),
        });
    }

    serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Pull a readable reason out of an error body.
///
/// The backend reports errors as `{"detail": ...}` where detail is either a
/// string or a list of validation errors carrying a `msg` field.
fn error_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    match value.get("detail") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if messages.is_empty() {
                serde_json::Value::Array(items.clone()).to_string()
            } else {
                messages.join("; ")
            }
        }
        Some(serde_json::Value::Null) | None => body.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}
