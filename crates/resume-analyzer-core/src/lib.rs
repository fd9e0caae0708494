pub mod config;
pub mod conversation;
pub mod gate;
pub mod gateway;
pub mod session;
pub mod state;
pub mod upload;

// Re-export main types for convenience
pub use config::Config;
pub use conversation::{ComposeBuffer, ConversationController};
pub use gate::SingleFlight;
pub use gateway::{BackendGateway, GatewayError, HttpGateway};
pub use session::{FileSessionStore, MemorySessionStore, SessionIdentity, SessionStore, SessionToken};
pub use state::{ChatAnswer, ChatRole, Turn, TurnState, UploadOutcome};
pub use upload::{FileHandle, UploadCoordinator, UploadPhase, UploadRequest, ACCEPTED_EXTENSIONS};
