//! Director Messages
//!
//! Messages sent from the Director to UI surfaces. These represent every way
//! the engine can tell a surface what to display.
//!
//! # Design Philosophy
//!
//! The Director is the "brain" that runs the story: it talks to the game
//! server, validates choices, and folds streamed text into the transcript.
//! UI surfaces are pure renderers that display what the Director tells them
//! to. This separation enables:
//!
//! - Hot-swappable UI surfaces (terminal today, something richer tomorrow)
//! - Headless operation for testing and automation
//! - Clean separation of concerns

use serde::{Deserialize, Serialize};

use crate::commands::TextStyle;

/// Messages from Director to UI Surface
///
/// These messages tell the UI what to display. The UI should not have any
/// game logic; it just renders what it's told.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum DirectorMessage {
    /// A new transcript line to display
    LineAppended {
        /// Transcript index of the new line
        index: usize,
        /// The line's text
        text: String,
        /// How the line should be presented
        style: TextStyle,
    },

    /// An existing transcript line changed in place
    ///
    /// Emitted while streamed tokens are folded into the latest line.
    LineAmended {
        /// Transcript index of the amended line
        index: usize,
        /// The line's complete text so far
        text: String,
    },

    /// The transcript was cleared (restart)
    TranscriptCleared,

    /// Director state change
    State {
        /// The new state
        state: DirectorState,
    },

    /// Session information after a start or resume
    SessionInfo {
        /// Server-assigned session identifier
        session_id: String,
        /// Whether an earlier session was resumed
        resumed: bool,
    },

    /// System notification
    Notify {
        /// Notification level
        level: NotifyLevel,
        /// Message content
        message: String,
    },

    /// Request surface to quit
    Quit,
}

/// Notification levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
}

/// Director operational states
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectorState {
    /// No session yet
    Idle,
    /// Starting or resuming a session
    Starting,
    /// Waiting for the player's next input
    AwaitingTurn,
    /// A turn is in flight at the server
    Submitting,
    /// Folding a token stream into the transcript
    Streaming,
    /// The story has ended
    GameOver,
}

impl DirectorState {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Not connected",
            Self::Starting => "Starting...",
            Self::AwaitingTurn => "Your move",
            Self::Submitting => "Thinking...",
            Self::Streaming => "Narrating...",
            Self::GameOver => "Game over",
        }
    }

    /// Whether the engine will accept player input in this state
    #[must_use]
    pub fn accepts_input(&self) -> bool {
        matches!(self, Self::AwaitingTurn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_description() {
        assert_eq!(DirectorState::AwaitingTurn.description(), "Your move");
        assert_eq!(DirectorState::Submitting.description(), "Thinking...");
    }

    #[test]
    fn test_only_awaiting_turn_accepts_input() {
        assert!(DirectorState::AwaitingTurn.accepts_input());
        assert!(!DirectorState::Idle.accepts_input());
        assert!(!DirectorState::Submitting.accepts_input());
        assert!(!DirectorState::Streaming.accepts_input());
        assert!(!DirectorState::GameOver.accepts_input());
    }
}
