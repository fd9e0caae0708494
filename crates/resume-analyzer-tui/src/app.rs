use std::path::PathBuf;
use std::sync::Arc;

use resume_analyzer_core::{
    BackendGateway, ChatAnswer, ConversationController, GatewayError, SessionIdentity,
    SessionToken, UploadCoordinator, UploadOutcome,
};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::picker::FilePicker;
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Upload,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub focus: FocusPane,
    pub input_mode: InputMode,

    // Session
    pub session: SessionIdentity,
    pub session_token: SessionToken,
    pub confirm_reset: bool,

    // Panels
    pub upload: UploadCoordinator,
    pub conversation: ConversationController,
    pub picker: Option<FilePicker>,

    // Backend
    pub gateway: Arc<dyn BackendGateway>,
    pub backend_url: String,
    pub backend_healthy: Option<bool>,

    // Chat view state
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    seen_revision: u64,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Background requests
    events: UnboundedSender<AppEvent>,
    generation: u64,
    tasks: Vec<JoinHandle<()>>,
}

impl App {
    pub fn new(
        mut session: SessionIdentity,
        gateway: Arc<dyn BackendGateway>,
        backend_url: String,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        // Establish the session before anything else talks to the backend
        let session_token = session.get_session_id();
        tracing::info!(session = %session_token, backend = %backend_url, "Client started");

        let mut app = Self {
            should_quit: false,
            focus: FocusPane::Upload,
            input_mode: InputMode::Normal,

            session,
            session_token,
            confirm_reset: false,

            upload: UploadCoordinator::new(),
            conversation: ConversationController::new(),
            picker: None,

            gateway,
            backend_url,
            backend_healthy: None,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            seen_revision: 0,

            animation_frame: 0,

            events,
            generation: 0,
            tasks: Vec::new(),
        };
        app.check_health();
        app
    }

    fn spawn(&mut self, task: impl std::future::Future<Output = ()> + Send + 'static) {
        self.tasks.retain(|handle| !handle.is_finished());
        self.tasks.push(tokio::spawn(task));
    }

    pub fn check_health(&mut self) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.events.clone();
        let generation = self.generation;
        self.spawn(async move {
            let healthy = match gateway.health().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Backend health check failed: {e}");
                    false
                }
            };
            let _ = tx.send(AppEvent::HealthChecked { generation, healthy });
        });
    }

    /// Upload the current selection in the background
    pub fn start_upload(&mut self) {
        let Some(request) = self.upload.begin_submit() else {
            return;
        };
        let token = self.session.get_session_id();
        let gateway = Arc::clone(&self.gateway);
        let tx = self.events.clone();
        let generation = self.generation;

        self.spawn(async move {
            let result = gateway.submit_files(&token, &request.files).await;
            let _ = tx.send(AppEvent::UploadFinished { generation, result });
        });
    }

    /// Send the compose buffer as a chat message in the background
    pub fn send_message(&mut self) {
        let Some(message) = self.conversation.submit_compose() else {
            return;
        };
        let token = self.session.get_session_id();
        let gateway = Arc::clone(&self.gateway);
        let tx = self.events.clone();
        let generation = self.generation;

        self.follow_transcript();
        self.spawn(async move {
            let result = gateway.submit_chat(&token, &message).await;
            let _ = tx.send(AppEvent::ChatFinished { generation, result });
        });
    }

    pub fn on_upload_finished(&mut self, generation: u64, result: Result<UploadOutcome, GatewayError>) {
        if generation != self.generation {
            tracing::debug!("Dropping upload result from a reset session");
            return;
        }
        self.upload.complete(result);
    }

    pub fn on_chat_finished(&mut self, generation: u64, result: Result<ChatAnswer, GatewayError>) {
        if generation != self.generation {
            tracing::debug!("Dropping chat result from a reset session");
            return;
        }
        self.conversation.complete(result);
        self.follow_transcript();
    }

    pub fn on_health_checked(&mut self, generation: u64, healthy: bool) {
        if generation == self.generation {
            self.backend_healthy = Some(healthy);
        }
    }

    /// Throw away the session and rebuild every piece of view state, as if
    /// the application had just started with no stored session.
    pub fn reset_session(&mut self) {
        self.session.reset_session_id();

        for handle in self.tasks.drain(..) {
            handle.abort();
        }
        self.generation += 1;

        self.focus = FocusPane::Upload;
        self.input_mode = InputMode::Normal;
        self.confirm_reset = false;
        self.upload = UploadCoordinator::new();
        self.conversation = ConversationController::new();
        self.picker = None;
        self.backend_healthy = None;
        self.chat_scroll = 0;
        self.seen_revision = 0;
        self.animation_frame = 0;

        self.session_token = self.session.get_session_id();
        self.check_health();
    }

    pub fn abort_tasks(&mut self) {
        for handle in self.tasks.drain(..) {
            handle.abort();
        }
    }

    pub fn open_picker(&mut self) {
        let start = self
            .upload
            .selected()
            .first()
            .and_then(|f| f.path.parent().map(|p| p.to_path_buf()))
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        self.picker = Some(FilePicker::open(start));
    }

    /// Replace the selection with the picker's marked files.
    /// Confirming with nothing marked behaves like cancel.
    pub fn confirm_picker(&mut self) {
        if let Some(picker) = self.picker.take() {
            if !picker.marked().is_empty() {
                self.upload.select_files(picker.marked().to_vec());
            }
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation.is_busy() || self.upload.is_uploading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Scroll to the newest turn whenever the transcript has changed
    pub fn follow_transcript(&mut self) {
        let revision = self.conversation.revision();
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.scroll_chat_to_bottom();
        }
    }

    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: usize = 0;

        for turn in self.conversation.turns() {
            total_lines += 1; // Role line ("You:" or "AI:")
            let text = turn.text().unwrap_or("Thinking...");
            for line in text.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                total_lines += char_count / wrap_width + 1;
            }
            total_lines += 1; // Blank line after message
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height as usize
        } else {
            20
        };

        self.chat_scroll =
            u16::try_from(total_lines.saturating_sub(visible_height)).unwrap_or(u16::MAX);
    }

    pub fn scroll_chat_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_chat_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use resume_analyzer_core::TurnState;
    use std::fs;
    use tokio::sync::mpsc;

    /// Gateway that answers everything with fixed values
    pub(crate) struct CannedGateway {
        pub answer: Result<String, String>,
    }

    #[async_trait]
    impl BackendGateway for CannedGateway {
        async fn submit_files(
            &self,
            _session: &SessionToken,
            files: &[resume_analyzer_core::FileHandle],
        ) -> Result<UploadOutcome, GatewayError> {
            Ok(UploadOutcome {
                files_saved: files.len() as u64,
                chunks_indexed: 4 * files.len() as u64,
            })
        }

        async fn submit_chat(
            &self,
            _session: &SessionToken,
            _message: &str,
        ) -> Result<ChatAnswer, GatewayError> {
            match &self.answer {
                Ok(answer) => Ok(ChatAnswer { answer: answer.clone() }),
                Err(detail) => Err(GatewayError::Server {
                    status: 500,
                    detail: detail.clone(),
                }),
            }
        }

        async fn health(&self) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    pub(crate) fn test_app(answer: Result<String, String>) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(
            SessionIdentity::in_memory(),
            Arc::new(CannedGateway { answer }),
            "http://test".to_string(),
            tx,
        );
        (app, rx)
    }

    async fn next_result(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> AppEvent {
        loop {
            match rx.recv().await.unwrap() {
                AppEvent::HealthChecked { .. } => continue,
                other => return other,
            }
        }
    }

    #[tokio::test]
    async fn test_chat_round_trip_through_events() {
        let (mut app, mut rx) = test_app(Ok("3.8".to_string()));
        for c in "What is my GPA?".chars() {
            app.conversation.compose_mut().insert(c);
        }
        app.send_message();
        assert!(app.conversation.shows_thinking());

        // A second send while busy changes nothing
        app.conversation.compose_mut().insert('?');
        app.send_message();
        assert_eq!(app.conversation.turns().len(), 2);

        match next_result(&mut rx).await {
            AppEvent::ChatFinished { generation, result } => app.on_chat_finished(generation, result),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(app.conversation.turns()[1].state, TurnState::Resolved("3.8".to_string()));
        assert!(!app.conversation.is_busy());
    }

    #[tokio::test]
    async fn test_upload_round_trip_through_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.pdf");
        fs::write(&path, "resume").unwrap();

        let (mut app, mut rx) = test_app(Ok(String::new()));
        app.upload.select_files([path]);
        app.start_upload();
        assert!(app.upload.is_uploading());

        match next_result(&mut rx).await {
            AppEvent::UploadFinished { generation, result } => app.on_upload_finished(generation, result),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(app.upload.status(), Some("Uploaded 1 file(s), indexed 4 chunks."));
        assert!(app.upload.selected().is_empty());
    }

    #[tokio::test]
    async fn test_reset_discards_state_and_late_results() {
        let (mut app, _rx) = test_app(Ok("late".to_string()));
        let old_token = app.session_token.clone();
        let old_generation = app.generation;

        app.conversation.begin_submit("hello").unwrap();
        app.reset_session();

        assert_ne!(app.session_token, old_token);
        assert!(app.conversation.turns().is_empty());
        assert!(!app.conversation.is_busy());

        app.on_chat_finished(old_generation, Ok(ChatAnswer { answer: "late".to_string() }));
        assert!(app.conversation.turns().is_empty());
    }

    #[tokio::test]
    async fn test_picker_confirm_replaces_selection() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.pdf"), "a").unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();

        let (mut app, _rx) = test_app(Ok(String::new()));
        app.upload.select_files([dir.path().join("a.pdf")]);

        app.picker = Some(FilePicker::open(dir.path()));
        if let Some(picker) = app.picker.as_mut() {
            picker.nav_down();
            picker.toggle_selected();
        }
        app.confirm_picker();

        assert!(app.picker.is_none());
        assert_eq!(app.upload.selected().len(), 1);
        assert_eq!(app.upload.selected()[0].name, "b.txt");
    }

    #[tokio::test]
    async fn test_picker_confirm_without_marks_keeps_selection() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.pdf"), "a").unwrap();

        let (mut app, _rx) = test_app(Ok(String::new()));
        app.upload.select_files([dir.path().join("a.pdf")]);
        app.open_picker();
        app.confirm_picker();
        assert_eq!(app.upload.selected().len(), 1);
    }

    #[tokio::test]
    async fn test_scroll_follows_new_turns() {
        let (mut app, _rx) = test_app(Ok(String::new()));
        app.chat_height = 3;
        app.chat_width = 40;
        app.conversation.begin_submit("one").unwrap();
        app.follow_transcript();
        // "You:" + text + blank, "AI:" + thinking + blank = 6 lines
        assert_eq!(app.chat_scroll, 3);
    }

    #[tokio::test]
    async fn test_scroll_saturates_on_huge_answer() {
        let (mut app, _rx) = test_app(Ok(String::new()));
        app.chat_height = 10;
        app.chat_width = 40;
        app.conversation.begin_submit("dump everything").unwrap();
        app.conversation.complete(Ok(ChatAnswer {
            answer: "line\n".repeat(70_000),
        }));
        app.follow_transcript();
        assert_eq!(app.chat_scroll, u16::MAX);
    }

    #[tokio::test]
    async fn test_scroll_counts_wrapped_lines() {
        let (mut app, _rx) = test_app(Ok(String::new()));
        app.chat_height = 1;
        app.chat_width = 10;
        app.conversation.begin_submit(&"x".repeat(25)).unwrap();
        app.follow_transcript();
        // "You:" + 3 wrapped rows + blank, "AI:" + thinking + blank = 8 lines
        assert_eq!(app.chat_scroll, 7);
    }
}
