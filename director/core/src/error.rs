//! Engine Error Taxonomy
//!
//! Every failure the engine can surface, in one place. The Director decides
//! recovery per variant: transport and stream failures become inline
//! transcript lines, an invalid choice never reaches the network, and an
//! unsupported command kind degrades to an inline line instead of killing
//! the session.

use thiserror::Error;

/// Errors produced by the conversation engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Network-level failure talking to the game server
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server refused to start a new session
    #[error("start request failed with status {status}")]
    StartFailed {
        /// HTTP status returned by the server
        status: reqwest::StatusCode,
    },

    /// The server rejected a turn submission
    #[error("play request failed with status {status}")]
    PlayFailed {
        /// HTTP status returned by the server
        status: reqwest::StatusCode,
    },

    /// The server emitted a command tag this engine does not know
    #[error("unsupported command kind: {kind:?}")]
    UnsupportedCommandKind {
        /// The unrecognized tag (empty when the tag field was missing)
        kind: String,
    },

    /// A known command failed to decode
    #[error("malformed command payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// User input did not match any offered option
    ///
    /// Handled locally by the Director; never escalated.
    #[error("input matches no offered option")]
    InvalidChoice,

    /// A token stream failed mid-response
    #[error("stream failure: {message}")]
    Stream {
        /// Description of the failure
        message: String,
    },

    /// The request serializer shut down while a task was queued
    #[error("request queue closed")]
    QueueClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = EngineError::UnsupportedCommandKind {
            kind: "TeleportCommand".to_string(),
        };
        assert!(err.to_string().contains("TeleportCommand"));

        let err = EngineError::Stream {
            message: "connection reset".to_string(),
        };
        assert!(err.to_string().contains("connection reset"));
    }
}
