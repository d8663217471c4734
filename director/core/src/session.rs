//! Session Transcript
//!
//! Tracks the state of one play-through: the rendered transcript, the
//! server-assigned session id, the most recent choice menu, and whether the
//! story has ended.
//!
//! # Design Philosophy
//!
//! The transcript is the single source of truth for what a surface should
//! display. Lines and their styles move in lockstep: every line has exactly
//! one style, appended together and cleared together. Surfaces receive
//! incremental notifications and never need to re-derive the transcript.

use serde::{Deserialize, Serialize};

use crate::commands::{SelectOptionBody, TextStyle};

/// State of one play-through
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// Server-assigned session identifier, once a session exists
    pub session_id: Option<String>,
    /// Rendered transcript lines, oldest first
    transcript: Vec<String>,
    /// Presentation style for each transcript line, index-aligned
    styles: Vec<TextStyle>,
    /// The most recent choice menu, if the story is waiting on one
    pub last_choice: Option<SelectOptionBody>,
    /// Whether the story has reached its end
    pub is_game_over: bool,
}

impl SessionState {
    /// Create an empty session with no server identity yet
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line with its style
    ///
    /// Returns the new line's index.
    pub fn push_line(&mut self, text: impl Into<String>, style: TextStyle) -> usize {
        self.transcript.push(text.into());
        self.styles.push(style);
        self.transcript.len() - 1
    }

    /// Append text to the last line in place
    ///
    /// Returns the amended line's index, or `None` if the transcript is
    /// empty. Used while folding streamed tokens into the transcript.
    pub fn append_to_last(&mut self, chunk: &str) -> Option<usize> {
        let line = self.transcript.last_mut()?;
        line.push_str(chunk);
        Some(self.transcript.len() - 1)
    }

    /// Replace the last line's text in place
    ///
    /// Returns the amended line's index, or `None` if the transcript is
    /// empty. Used when a completed stream supplies an authoritative text
    /// differing from the concatenated tokens.
    pub fn replace_last(&mut self, text: impl Into<String>) -> Option<usize> {
        let line = self.transcript.last_mut()?;
        *line = text.into();
        Some(self.transcript.len() - 1)
    }

    /// All transcript lines, oldest first
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.transcript
    }

    /// The style for a given line index
    #[must_use]
    pub fn style(&self, index: usize) -> Option<&TextStyle> {
        self.styles.get(index)
    }

    /// Number of transcript lines
    #[must_use]
    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    /// Whether the transcript is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    /// Reset to a fresh play-through
    ///
    /// Clears transcript, styles, choice menu, and the game-over flag. The
    /// session id is cleared too; the caller obtains a new one from the
    /// server.
    pub fn reset(&mut self) {
        self.session_id = None;
        self.transcript.clear();
        self.styles.clear();
        self.last_choice = None;
        self.is_game_over = false;
    }
}
