//! Server Commands
//!
//! The game server drives the conversation by emitting commands. Each turn
//! produces one command (or, for a resumed session, a replay of several); the
//! Director turns commands into transcript lines and style hints for whatever
//! surface is rendering them.
//!
//! # Design Philosophy
//!
//! Commands are a closed sum type. The server's tag vocabulary is small and
//! known; an unrecognized tag is a protocol error, not something to silently
//! skip. The one historical wrinkle is `SceneEndCommand`, which older server
//! builds emit as an alias for `MessageCommand` and which must keep parsing
//! as a plain message.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Phrase the server embeds in a final message body when a playthrough ends.
///
/// Secondary game-over signal alongside the structured `is_game_over` flag.
/// This is a known-fragile heuristic inherited from the server contract;
/// do not strengthen or remove it without confirming the server side.
const GAME_OVER_PHRASE: &str = "the game is over";

/// Whether free text contains the server's final-message phrase.
///
/// Used for streamed responses, which bypass the structured flag entirely.
pub(crate) fn text_signals_game_over(text: &str) -> bool {
    text.to_lowercase().contains(GAME_OVER_PHRASE)
}

/// Server default for typewriter character delay.
fn default_char_delay() -> u32 {
    30
}

fn default_sound_delay() -> u64 {
    1000
}

/// Rendering hints for one transcript line.
///
/// One style entry corresponds 1:1 with one transcript line. Surfaces that
/// animate text use `animate` and `char_delay_ms`; headless surfaces ignore
/// both.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    /// The text this style applies to (mirrors the transcript line)
    #[serde(default, alias = "message")]
    pub text: String,
    /// Whether the line should be typed out character by character
    #[serde(default, alias = "doTypeMessage", alias = "do_type_message")]
    pub animate: bool,
    /// Delay between characters when animating, in milliseconds
    #[serde(
        default = "default_char_delay",
        alias = "characterDelayMs",
        alias = "character_delay_ms"
    )]
    pub char_delay_ms: u32,
}

impl TextStyle {
    /// Create a style for a specific line of text
    pub fn new(text: impl Into<String>, animate: bool, char_delay_ms: u32) -> Self {
        Self {
            text: text.into(),
            animate,
            char_delay_ms,
        }
    }

    /// A style for the same hints but different text
    #[must_use]
    pub fn for_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            animate: self.animate,
            char_delay_ms: self.char_delay_ms,
        }
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            text: String::new(),
            animate: false,
            char_delay_ms: default_char_delay(),
        }
    }
}

/// Fields shared by every message-bearing command
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageBody {
    /// The message text
    pub message: String,
    /// Whether the surface should type the message out
    #[serde(default)]
    pub do_type_message: bool,
    /// Per-character delay when typing, in milliseconds
    #[serde(default = "default_char_delay")]
    pub character_delay_ms: u32,
    /// Whether the server is waiting for user input after this command
    #[serde(default)]
    pub expects_user_input: bool,
    /// Whether this command ends the playthrough
    #[serde(default)]
    pub is_game_over: bool,
}

/// A multiple-choice prompt
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectOptionBody {
    /// The prompt text shown above the options
    pub message: String,
    /// Whether the surface should type the message out
    #[serde(default)]
    pub do_type_message: bool,
    /// Per-character delay when typing, in milliseconds
    #[serde(default = "default_char_delay")]
    pub character_delay_ms: u32,
    /// Ordered `(value, label)` pairs; the user answers with a `value`
    #[serde(default)]
    pub options: Vec<(String, String)>,
    /// Whether the server is waiting for user input after this command
    #[serde(default)]
    pub expects_user_input: bool,
    /// Whether this command ends the playthrough
    #[serde(default)]
    pub is_game_over: bool,
}

impl SelectOptionBody {
    /// Whether `input` matches one of the option values
    #[must_use]
    pub fn accepts(&self, input: &str) -> bool {
        self.options
            .iter()
            .any(|(value, label)| value == input || label == input)
    }
}

/// A message followed by a pause before the next command
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageDelayBody {
    /// The message text
    pub message: String,
    /// Whether the surface should type the message out
    #[serde(default)]
    pub do_type_message: bool,
    /// Per-character delay when typing, in milliseconds
    #[serde(default = "default_char_delay")]
    pub character_delay_ms: u32,
    /// Pause after the message, in milliseconds
    #[serde(default = "default_sound_delay")]
    pub delay_ms: u64,
    /// Whether the server is waiting for user input after this command
    #[serde(default)]
    pub expects_user_input: bool,
    /// Whether this command ends the playthrough
    #[serde(default)]
    pub is_game_over: bool,
}

/// A sound cue
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SoundDelayBody {
    /// Sound asset name (surface-specific lookup)
    pub sound_name: String,
    /// Pause after the sound, in milliseconds
    #[serde(default = "default_sound_delay")]
    pub delay_ms: u64,
    /// Whether the server is waiting for user input after this command
    #[serde(default)]
    pub expects_user_input: bool,
    /// Whether this command ends the playthrough
    #[serde(default)]
    pub is_game_over: bool,
}

/// A response whose text arrives incrementally over the stream endpoint
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamingBody {
    /// Stream identifier to pass to the stream endpoint
    pub stream_id: String,
    /// Speaking character's name, used to prefix the streamed line
    pub agent_name: String,
    /// Whether the server is waiting for user input after this command
    #[serde(default)]
    pub expects_user_input: bool,
    /// Whether this command ends the playthrough
    #[serde(default)]
    pub is_game_over: bool,
}

/// A command emitted by the game server
///
/// The wire format is a JSON object tagged by a `type` field. `SceneEndCommand`
/// is a legacy alias that must keep parsing as [`Command::Message`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// A plain message
    #[serde(rename = "MessageCommand", alias = "SceneEndCommand")]
    Message(MessageBody),
    /// A multiple-choice prompt
    #[serde(rename = "SelectOptionCommand")]
    SelectOption(SelectOptionBody),
    /// A message with a trailing pause
    #[serde(rename = "MessageDelayCommand")]
    MessageDelay(MessageDelayBody),
    /// A sound cue
    #[serde(rename = "SoundDelayCommand")]
    SoundDelay(SoundDelayBody),
    /// A streamed response; text arrives as tokens, not in this command
    #[serde(rename = "StreamingMessageCommand")]
    StreamingMessage(StreamingBody),
}

/// Tags this engine understands, including the legacy alias.
const KNOWN_KINDS: &[&str] = &[
    "MessageCommand",
    "SceneEndCommand",
    "SelectOptionCommand",
    "MessageDelayCommand",
    "SoundDelayCommand",
    "StreamingMessageCommand",
];

impl Command {
    /// Parse a raw JSON value into a command
    ///
    /// Rejects unknown tags with [`EngineError::UnsupportedCommandKind`];
    /// a known tag with a malformed body is a decode error.
    pub fn parse(raw: &serde_json::Value) -> Result<Self, EngineError> {
        let kind = raw
            .get("type")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("");

        if !KNOWN_KINDS.contains(&kind) {
            return Err(EngineError::UnsupportedCommandKind {
                kind: kind.to_string(),
            });
        }

        Ok(serde_json::from_value(raw.clone())?)
    }

    /// The wire tag, after alias normalization
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => "MessageCommand",
            Self::SelectOption(_) => "SelectOptionCommand",
            Self::MessageDelay(_) => "MessageDelayCommand",
            Self::SoundDelay(_) => "SoundDelayCommand",
            Self::StreamingMessage(_) => "StreamingMessageCommand",
        }
    }

    /// Whether the server waits for user input after this command
    #[must_use]
    pub fn expects_user_input(&self) -> bool {
        match self {
            Self::Message(body) => body.expects_user_input,
            Self::SelectOption(body) => body.expects_user_input,
            Self::MessageDelay(body) => body.expects_user_input,
            Self::SoundDelay(body) => body.expects_user_input,
            Self::StreamingMessage(body) => body.expects_user_input,
        }
    }

    /// The structured game-over flag
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        match self {
            Self::Message(body) => body.is_game_over,
            Self::SelectOption(body) => body.is_game_over,
            Self::MessageDelay(body) => body.is_game_over,
            Self::SoundDelay(body) => body.is_game_over,
            Self::StreamingMessage(body) => body.is_game_over,
        }
    }

    /// Whether this command ends the playthrough
    ///
    /// True when the structured flag is set, or when the message body contains
    /// the server's final-message phrase (see [`GAME_OVER_PHRASE`]).
    #[must_use]
    pub fn signals_game_over(&self) -> bool {
        if self.is_game_over() {
            return true;
        }
        self.message_text()
            .map(text_signals_game_over)
            .unwrap_or(false)
    }

    /// The message text, for message-bearing variants
    #[must_use]
    pub fn message_text(&self) -> Option<&str> {
        match self {
            Self::Message(body) => Some(&body.message),
            Self::SelectOption(body) => Some(&body.message),
            Self::MessageDelay(body) => Some(&body.message),
            Self::SoundDelay(_) | Self::StreamingMessage(_) => None,
        }
    }

    /// Transcript lines this command contributes
    ///
    /// Message variants contribute their message; a choice prompt adds one
    /// `"value: label"` line per option; a sound cue becomes a placeholder
    /// line; a streaming command contributes nothing up front (its text
    /// arrives over the token stream).
    #[must_use]
    pub fn display_lines(&self) -> Vec<String> {
        match self {
            Self::Message(body) => vec![body.message.clone()],
            Self::MessageDelay(body) => vec![body.message.clone()],
            Self::SelectOption(body) => {
                let mut lines = Vec::with_capacity(1 + body.options.len());
                lines.push(body.message.clone());
                for (value, label) in &body.options {
                    lines.push(format!("{value}: {label}"));
                }
                lines
            }
            Self::SoundDelay(body) => {
                vec![format!("* {} *", body.sound_name)]
            }
            Self::StreamingMessage(_) => Vec::new(),
        }
    }

    /// The style hint for this command's lines
    ///
    /// Choice prompts never animate (options must be readable immediately);
    /// sound cues and streaming commands carry no text of their own and get
    /// the default style.
    #[must_use]
    pub fn style(&self) -> TextStyle {
        match self {
            Self::Message(body) => {
                TextStyle::new(&body.message, body.do_type_message, body.character_delay_ms)
            }
            Self::MessageDelay(body) => {
                TextStyle::new(&body.message, body.do_type_message, body.character_delay_ms)
            }
            Self::SelectOption(body) => TextStyle::new(&body.message, false, body.character_delay_ms),
            Self::SoundDelay(_) | Self::StreamingMessage(_) => TextStyle::default(),
        }
    }

    /// The choice payload, if this command is a multiple-choice prompt
    #[must_use]
    pub fn as_select_option(&self) -> Option<&SelectOptionBody> {
        match self {
            Self::SelectOption(body) => Some(body),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_message_command() {
        let raw = json!({
            "type": "MessageCommand",
            "message": "Welcome to Rattlesnake Ridge",
            "do_type_message": true,
            "character_delay_ms": 15,
            "expects_user_input": true,
            "is_game_over": false,
        });

        let cmd = Command::parse(&raw).unwrap();
        assert_eq!(cmd.kind(), "MessageCommand");
        assert!(cmd.expects_user_input());
        assert!(!cmd.is_game_over());
        assert_eq!(cmd.display_lines(), vec!["Welcome to Rattlesnake Ridge"]);

        let style = cmd.style();
        assert!(style.animate);
        assert_eq!(style.char_delay_ms, 15);
    }

    #[test]
    fn test_scene_end_parses_as_message() {
        let scene_end = json!({
            "type": "SceneEndCommand",
            "message": "The dust settles.",
            "do_type_message": false,
        });
        let message = json!({
            "type": "MessageCommand",
            "message": "The dust settles.",
            "do_type_message": false,
        });

        assert_eq!(
            Command::parse(&scene_end).unwrap(),
            Command::parse(&message).unwrap()
        );
    }

    #[test]
    fn test_select_option_lines() {
        let raw = json!({
            "type": "SelectOptionCommand",
            "message": "Which way?",
            "options": [["north", "Go North"], ["south", "Go South"]],
            "expects_user_input": true,
        });

        let cmd = Command::parse(&raw).unwrap();
        assert_eq!(
            cmd.display_lines(),
            vec!["Which way?", "north: Go North", "south: Go South"]
        );
        // Options are never animated
        assert!(!cmd.style().animate);
    }

    #[test]
    fn test_select_option_accepts() {
        let body = SelectOptionBody {
            message: "Which way?".to_string(),
            options: vec![
                ("north".to_string(), "Go North".to_string()),
                ("south".to_string(), "Go South".to_string()),
            ],
            ..Default::default()
        };

        assert!(body.accepts("north"));
        assert!(body.accepts("Go South"));
        assert!(!body.accepts("west"));
        assert!(!body.accepts(""));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let raw = json!({ "type": "TeleportCommand", "message": "zap" });
        let err = Command::parse(&raw).unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnsupportedCommandKind { ref kind } if kind == "TeleportCommand"
        ));

        // Missing tag is reported the same way
        let raw = json!({ "message": "no tag" });
        assert!(matches!(
            Command::parse(&raw),
            Err(EngineError::UnsupportedCommandKind { .. })
        ));
    }

    #[test]
    fn test_sound_delay_placeholder() {
        let raw = json!({
            "type": "SoundDelayCommand",
            "sound_name": "gunshot.mp3",
            "delay_ms": 1337,
        });

        let cmd = Command::parse(&raw).unwrap();
        assert_eq!(cmd.display_lines(), vec!["* gunshot.mp3 *"]);
        assert_eq!(cmd.style(), TextStyle::default());
    }

    #[test]
    fn test_streaming_command_fields() {
        let raw = json!({
            "type": "StreamingMessageCommand",
            "stream_id": "stream-7",
            "agent_name": "Sheriff",
        });

        let cmd = Command::parse(&raw).unwrap();
        assert!(cmd.display_lines().is_empty());
        match cmd {
            Command::StreamingMessage(ref body) => {
                assert_eq!(body.stream_id, "stream-7");
                assert_eq!(body.agent_name, "Sheriff");
            }
            _ => panic!("Expected StreamingMessage"),
        }
    }

    #[test]
    fn test_game_over_phrase_heuristic() {
        let flagged = json!({
            "type": "MessageCommand",
            "message": "You lose.",
            "is_game_over": true,
        });
        assert!(Command::parse(&flagged).unwrap().signals_game_over());

        let phrased = json!({
            "type": "MessageCommand",
            "message": "The Game Is Over. Thanks for playing!",
        });
        let cmd = Command::parse(&phrased).unwrap();
        assert!(!cmd.is_game_over());
        assert!(cmd.signals_game_over());

        let ordinary = json!({
            "type": "MessageCommand",
            "message": "The game continues...",
        });
        assert!(!Command::parse(&ordinary).unwrap().signals_game_over());
    }

    #[test]
    fn test_defaults_applied() {
        let raw = json!({ "type": "MessageCommand", "message": "hi" });
        let cmd = Command::parse(&raw).unwrap();
        assert!(!cmd.expects_user_input());
        assert!(!cmd.is_game_over());
        assert_eq!(cmd.style().char_delay_ms, 30);
    }
}
