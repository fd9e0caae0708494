//! Upload coordinator: file selection and batch submission.

use std::path::{Path, PathBuf};

use crate::gate::SingleFlight;
use crate::gateway::{BackendGateway, GatewayError};
use crate::session::SessionToken;
use crate::state::UploadOutcome;

/// Extensions the backend accepts. Only a hint for file pickers; the server
/// has the final say.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "txt"];

const UPLOAD_FAILED: &str = "Upload failed";

/// Whether a path matches the picker filter hint
pub fn matches_accept_hint(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| ACCEPTED_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// A local file chosen for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub path: PathBuf,
    pub name: String,
}

impl FileHandle {
    /// `None` unless `path` points at a regular file
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        if !path.is_file() {
            return None;
        }
        let name = path.file_name()?.to_string_lossy().into_owned();
        Some(Self { path, name })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Ready,
    Uploading,
}

/// Snapshot of one admitted upload
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub files: Vec<FileHandle>,
}

#[derive(Debug, Default)]
pub struct UploadCoordinator {
    selected: Vec<FileHandle>,
    in_flight: Option<Vec<FileHandle>>,
    gate: SingleFlight,
    status: Option<String>,
    status_is_error: bool,
    last_outcome: Option<UploadOutcome>,
}

impl UploadCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection wholesale. Anything that is not a regular file
    /// is dropped. Returns how many files were kept.
    pub fn select_files<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.selected = paths.into_iter().filter_map(FileHandle::from_path).collect();
        tracing::debug!(count = self.selected.len(), "File selection replaced");
        self.selected.len()
    }

    /// Admit an upload of the current selection.
    ///
    /// Returns `None` (and changes nothing) when the selection is empty or
    /// another upload is still running.
    pub fn begin_submit(&mut self) -> Option<UploadRequest> {
        if self.selected.is_empty() || !self.gate.try_enter() {
            return None;
        }
        self.status = None;
        self.status_is_error = false;
        self.in_flight = Some(self.selected.clone());
        Some(UploadRequest {
            files: self.selected.clone(),
        })
    }

    /// Record the result of the admitted upload and release the gate.
    pub fn complete(&mut self, result: Result<UploadOutcome, GatewayError>) {
        if !self.gate.is_busy() {
            tracing::debug!("Ignoring upload result with no upload in flight");
            return;
        }
        let submitted = self.in_flight.take();

        match result {
            Ok(outcome) => {
                tracing::info!(
                    files_saved = outcome.files_saved,
                    chunks_indexed = outcome.chunks_indexed,
                    "Upload complete"
                );
                self.status = Some(outcome.summary());
                self.status_is_error = false;
                self.last_outcome = Some(outcome);
                // A selection made while uploading is a new batch; keep it.
                if submitted.as_ref() == Some(&self.selected) {
                    self.selected.clear();
                }
            }
            Err(e) => {
                tracing::warn!("Upload failed: {e}");
                self.status = Some(e.user_message(UPLOAD_FAILED));
                self.status_is_error = true;
            }
        }

        self.gate.leave();
    }

    /// Admit, send, and complete in one go. Returns `false` if rejected.
    pub async fn submit(&mut self, gateway: &dyn BackendGateway, session: &SessionToken) -> bool {
        let Some(request) = self.begin_submit() else {
            return false;
        };
        let result = gateway.submit_files(session, &request.files).await;
        self.complete(result);
        true
    }

    pub fn phase(&self) -> UploadPhase {
        if self.gate.is_busy() {
            UploadPhase::Uploading
        } else if self.selected.is_empty() {
            UploadPhase::Idle
        } else {
            UploadPhase::Ready
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.gate.is_busy()
    }

    pub fn selected(&self) -> &[FileHandle] {
        &self.selected
    }

    pub fn selected_summary(&self) -> String {
        if self.selected.is_empty() {
            "No files selected".to_string()
        } else {
            format!("{} file(s) selected", self.selected.len())
        }
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Whether the current status line reports a failed upload
    pub fn status_is_error(&self) -> bool {
        self.status_is_error
    }

    pub fn last_outcome(&self) -> Option<UploadOutcome> {
        self.last_outcome
    }
}
