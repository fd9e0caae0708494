//! Conversation controller: transcript, compose buffer, and the
//! one-request-at-a-time chat lifecycle.

use crate::gate::SingleFlight;
use crate::gateway::{BackendGateway, GatewayError};
use crate::session::SessionToken;
use crate::state::{ChatAnswer, Turn, TurnState};

const CHAT_FAILED: &str = "Something went wrong.";

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Text being typed, with a cursor measured in characters
#[derive(Debug, Default, Clone)]
pub struct ComposeBuffer {
    text: String,
    cursor: usize,
}

impl ComposeBuffer {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn newline(&mut self) {
        self.insert('\n');
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

#[derive(Debug, Default)]
pub struct ConversationController {
    turns: Vec<Turn>,
    compose: ComposeBuffer,
    gate: SingleFlight,
    revision: u64,
}

impl ConversationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit `text` as the next question.
    ///
    /// On admission the user turn and a pending assistant turn are appended,
    /// the compose buffer is cleared, and the trimmed message to send is
    /// returned. Blank text or a request already in flight is rejected with
    /// no state change.
    pub fn begin_submit(&mut self, text: &str) -> Option<String> {
        let message = text.trim();
        if message.is_empty() || !self.gate.try_enter() {
            return None;
        }

        self.turns.push(Turn::user(message));
        self.compose.clear();
        self.turns.push(Turn::pending());
        self.revision += 1;

        Some(message.to_string())
    }

    /// `begin_submit` with the compose buffer's contents
    pub fn submit_compose(&mut self) -> Option<String> {
        let text = self.compose.text().to_string();
        self.begin_submit(&text)
    }

    /// Resolve the pending turn with the backend's result and release the gate.
    pub fn complete(&mut self, result: Result<ChatAnswer, GatewayError>) {
        if !self.gate.is_busy() {
            tracing::debug!("Ignoring chat result with no request in flight");
            return;
        }

        let state = match result {
            Ok(chat) => TurnState::Resolved(chat.answer),
            Err(e) => {
                tracing::warn!("Chat request failed: {e}");
                TurnState::Failed(e.user_message(CHAT_FAILED))
            }
        };

        match self.turns.last_mut() {
            Some(turn) if turn.is_pending() => turn.state = state,
            _ => tracing::warn!("No pending turn to resolve"),
        }
        self.revision += 1;

        self.gate.leave();
    }

    /// Admit, send, and resolve in one go. Returns `false` if rejected.
    pub async fn submit(
        &mut self,
        text: &str,
        gateway: &dyn BackendGateway,
        session: &SessionToken,
    ) -> bool {
        let Some(message) = self.begin_submit(text) else {
            return false;
        };
        let result = gateway.submit_chat(session, &message).await;
        self.complete(result);
        true
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// True while the newest turn is the unresolved placeholder
    pub fn shows_thinking(&self) -> bool {
        self.is_busy() && self.turns.last().is_some_and(Turn::is_pending)
    }

    pub fn compose(&self) -> &ComposeBuffer {
        &self.compose
    }

    pub fn compose_mut(&mut self) -> &mut ComposeBuffer {
        &mut self.compose
    }

    /// Bumped whenever the transcript changes; drives auto-scroll.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
