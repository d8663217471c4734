//! Game Backend Trait
//!
//! Trait definition for the remote game server. This abstraction lets the
//! Director run against the real HTTP server, a recorded fixture, or a mock
//! in tests without changing core logic.
//!
//! # Design Philosophy
//!
//! The backend is a dumb pipe: it maps session lifecycle operations onto
//! requests and hands back parsed commands. It holds no session state and
//! performs no retries — recovery policy belongs to the Director.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::commands::{Command, TextStyle};

/// Token stream events from the game server's stream endpoint
#[derive(Clone, Debug)]
pub enum StreamingToken {
    /// A chunk of response text
    Token(String),
    /// Response completed successfully
    Complete {
        /// The complete message (may differ from concatenated tokens)
        message: String,
    },
    /// Error occurred during streaming
    Error(String),
}

/// Response to a successful session start
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StartResponse {
    /// Greeting message for the transcript
    pub message: String,
    /// Style hint for the greeting line (server may omit it)
    #[serde(default)]
    pub styles: Option<TextStyle>,
    /// Server-assigned session identifier
    pub game_id: String,
}

/// Game server backend
///
/// Implement this trait to drive the Director against a different transport
/// or a test double.
#[async_trait]
pub trait GameBackend: Send + Sync {
    /// Request a new session from the server
    ///
    /// Fails with [`crate::EngineError::StartFailed`] on a non-success status.
    async fn start(&self) -> anyhow::Result<StartResponse>;

    /// Attempt to resume a session
    ///
    /// Returns `Ok(None)` on a non-success status — that is the server's
    /// defined "no resumable session" signal, not an error. The caller falls
    /// back to [`GameBackend::start`].
    async fn load(&self, game_id: &str) -> anyhow::Result<Option<Vec<Command>>>;

    /// Submit one turn and receive the resulting command
    ///
    /// Fails with [`crate::EngineError::PlayFailed`] on a non-success status.
    async fn play(&self, game_id: &str, input: &str) -> anyhow::Result<Command>;

    /// Notify the server the session is over
    ///
    /// Best-effort: callers fire-and-forget and only log failures.
    async fn end(&self, game_id: &str) -> anyhow::Result<()>;

    /// Open the token stream for a streaming command
    ///
    /// Returns a channel receiver that yields tokens as they arrive. The
    /// channel closes when the response completes or errors.
    async fn open_stream(
        &self,
        game_id: &str,
        stream_id: &str,
    ) -> anyhow::Result<mpsc::Receiver<StreamingToken>>;
}
