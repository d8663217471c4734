//! Director - The Conversation Core
//!
//! The Director is the "brain" of teletale. It orchestrates:
//! - Game server communication (start, resume, play, end)
//! - Choice validation and the turn lifecycle
//! - Streamed responses folded into the transcript
//! - Communication with UI surfaces
//!
//! # Design Philosophy
//!
//! The Director is UI-agnostic. It doesn't know or care whether it's talking
//! to a terminal, a web page, or a test harness. It communicates through:
//! - `DirectorMessage`: Commands sent TO the UI surface
//! - `SurfaceEvent`: Events received FROM the UI surface
//!
//! Every turn funnels through a FIFO request queue, so the server never sees
//! two concurrent requests for one session. Auto-continued scenes (a chain
//! of commands that don't ask for input) are driven by a loop that enqueues
//! one fresh request per scene rather than recursing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::backend::{GameBackend, StreamingToken};
use crate::commands::{text_signals_game_over, Command, StreamingBody, TextStyle};
use crate::config::DirectorConfig;
use crate::error::EngineError;
use crate::events::SurfaceEvent;
use crate::messages::{DirectorMessage, DirectorState, NotifyLevel};
use crate::queue::RequestQueue;
use crate::session::SessionState;
use crate::store::SessionStore;

/// Line shown when input doesn't match any offered option.
const INVALID_OPTION_LINE: &str = "Invalid option. Please try again.";

/// What a completed turn asks the engine to do next
enum TurnOutcome {
    /// Wait for the player
    AwaitInput,
    /// Fetch the next scene without player input
    Continue {
        /// Pacing pause before the next request, in milliseconds
        delay_ms: u64,
    },
    /// A token stream is now open; `poll_streaming` takes over
    Streaming,
    /// The playthrough ended
    GameOver,
}

/// The Director - headless conversation core
pub struct Director<B: GameBackend> {
    /// Configuration
    config: DirectorConfig,
    /// Game server backend
    backend: Arc<B>,
    /// Session id persistence, if the embedder granted it
    store: Option<Arc<dyn SessionStore>>,
    /// Current play-through
    session: SessionState,
    /// Current operational state
    state: DirectorState,
    /// FIFO serializer for server requests
    queue: RequestQueue,
    /// Bumped on restart; in-flight results from an older epoch are dropped
    restart_epoch: u64,
    /// Channel to send messages to UI surface
    tx: mpsc::Sender<DirectorMessage>,
    /// Current token stream receiver
    streaming_rx: Option<mpsc::Receiver<StreamingToken>>,
    /// Speaker prefix of the line being streamed into
    streaming_prefix: String,
    /// Whether the story should advance once the stream completes
    stream_continues: bool,
    /// Whether the stream being folded in is the story's final message
    stream_game_over: bool,
}

impl<B: GameBackend + 'static> Director<B> {
    /// Create a new Director with the given backend
    ///
    /// Sessions are ephemeral unless a store is granted via
    /// [`Director::with_store`].
    pub fn new(backend: B, config: DirectorConfig, tx: mpsc::Sender<DirectorMessage>) -> Self {
        Self {
            config,
            backend: Arc::new(backend),
            store: None,
            session: SessionState::new(),
            state: DirectorState::Idle,
            queue: RequestQueue::new(),
            restart_epoch: 0,
            tx,
            streaming_rx: None,
            streaming_prefix: String::new(),
            stream_continues: false,
            stream_game_over: false,
        }
    }

    /// Grant the Director the ability to persist session ids across runs
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Get current state
    pub fn state(&self) -> DirectorState {
        self.state
    }

    /// Get the current play-through
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Whether a token stream is being folded in right now
    pub fn is_streaming(&self) -> bool {
        self.streaming_rx.is_some()
    }

    /// Start the Director: resume the stored session or begin fresh
    pub async fn start(&mut self) -> anyhow::Result<()> {
        self.set_state(DirectorState::Starting).await;

        if self.config.auto_resume {
            if let Some(stored) = self.store.as_ref().and_then(|s| s.get()) {
                match self.backend.load(&stored).await {
                    Ok(Some(commands)) => {
                        self.resume_session(stored, commands).await;
                        return Ok(());
                    }
                    Ok(None) => {
                        // Server no longer knows this session
                        if let Some(store) = &self.store {
                            store.clear();
                        }
                    }
                    Err(e) => {
                        tracing::warn!(session_id = %stored, error = %e, "Resume failed, starting fresh");
                        if let Some(store) = &self.store {
                            store.clear();
                        }
                    }
                }
            }
        }

        self.start_fresh().await
    }

    /// Replay a resumed session's command log into the transcript
    async fn resume_session(&mut self, session_id: String, commands: Vec<Command>) {
        self.session.reset();
        self.session.session_id = Some(session_id.clone());
        self.send(DirectorMessage::SessionInfo {
            session_id,
            resumed: true,
        })
        .await;

        // Replay renders text only; no sounds, pauses, or streams re-fire
        for command in &commands {
            let style = command.style();
            for line in command.display_lines() {
                let line_style = style.for_text(&line);
                self.append_line(line, line_style).await;
            }
        }

        let last = commands.last();
        self.session.last_choice = last.and_then(Command::as_select_option).cloned();

        if last.is_some_and(Command::signals_game_over) {
            self.finish_game().await;
        } else {
            self.set_state(DirectorState::AwaitingTurn).await;
        }
    }

    /// Begin a brand-new session
    ///
    /// A failed start is reported as an inline transcript line and leaves the
    /// Director idle; it never tears the surface down.
    async fn start_fresh(&mut self) -> anyhow::Result<()> {
        let started = match self.backend.start().await {
            Ok(started) => started,
            Err(e) => {
                self.report_start_error(e).await;
                return Ok(());
            }
        };

        self.session.reset();
        self.session.session_id = Some(started.game_id.clone());
        if let Some(store) = &self.store {
            store.set(&started.game_id);
        }
        self.send(DirectorMessage::SessionInfo {
            session_id: started.game_id,
            resumed: false,
        })
        .await;

        let style = match started.styles {
            Some(style) => style.for_text(&started.message),
            None => TextStyle::new(&started.message, true, 30),
        };
        self.append_line(started.message, style).await;

        // The opening scene comes from an empty first turn
        self.run_turn(String::new()).await;
        Ok(())
    }

    /// Handle an event from the UI surface
    pub async fn handle_event(&mut self, event: SurfaceEvent) -> anyhow::Result<()> {
        match event {
            SurfaceEvent::Connected => {
                self.send(DirectorMessage::State { state: self.state }).await;
                if self.state == DirectorState::Idle {
                    self.start().await?;
                }
            }

            SurfaceEvent::InputSubmitted { content } => {
                self.submit_turn(&content).await;
            }

            SurfaceEvent::RestartRequested => {
                self.restart().await?;
            }

            SurfaceEvent::QuitRequested => {
                self.shutdown().await;
            }
        }

        Ok(())
    }

    /// Submit one turn of player input
    ///
    /// Input is validated against the pending choice menu before anything
    /// touches the network; a rejected choice costs zero requests.
    pub async fn submit_turn(&mut self, input: &str) {
        if self.state != DirectorState::AwaitingTurn {
            self.notify(NotifyLevel::Warning, "Hold on - the story is still unfolding")
                .await;
            return;
        }

        let input = input.trim();

        // Empty input skips validation: it is the "continue" signal, not an
        // answer to the menu
        let rejected = !input.is_empty()
            && self
                .session
                .last_choice
                .as_ref()
                .is_some_and(|choice| !choice.accepts(input));
        if rejected {
            self.append_line(
                INVALID_OPTION_LINE,
                TextStyle::new(INVALID_OPTION_LINE, false, 30),
            )
            .await;
            return;
        }

        if !input.is_empty() {
            let echo = format!("You: {input}");
            self.append_line(echo.clone(), TextStyle::new(echo, false, 30))
                .await;
        }

        // The menu stays live until the server answers the turn; a failed
        // request keeps validating retries locally
        self.run_turn(input.to_string()).await;
    }

    /// Drive one player turn plus any auto-continued scenes after it
    ///
    /// Each hop enqueues a fresh request on the serializer, so a long scene
    /// chain never recurses and never holds more than one request in flight.
    async fn run_turn(&mut self, input: String) {
        self.set_state(DirectorState::Submitting).await;

        let mut next_input = input;
        let mut hops = 0usize;
        loop {
            let command = match self.dispatch_play(next_input).await {
                Ok(Some(command)) => command,
                Ok(None) => return, // superseded by a restart
                Err(e) => {
                    self.report_turn_error(e).await;
                    return;
                }
            };

            match self.apply_command(&command).await {
                TurnOutcome::AwaitInput => {
                    self.set_state(DirectorState::AwaitingTurn).await;
                    return;
                }
                TurnOutcome::GameOver | TurnOutcome::Streaming => return,
                TurnOutcome::Continue { delay_ms } => {
                    hops += 1;
                    if hops >= self.config.max_auto_continues {
                        tracing::warn!(hops, "Auto-continue limit reached, pausing for input");
                        self.set_state(DirectorState::AwaitingTurn).await;
                        return;
                    }
                    if self.config.honor_delays && delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                    next_input = String::new();
                }
            }
        }
    }

    /// Enqueue one play request and wait for it to settle
    ///
    /// Returns `Ok(None)` when a restart happened while the request was
    /// queued; the stale result is discarded.
    async fn dispatch_play(&mut self, input: String) -> anyhow::Result<Option<Command>> {
        let Some(game_id) = self.session.session_id.clone() else {
            anyhow::bail!("no active session");
        };

        let backend = Arc::clone(&self.backend);
        let epoch = self.restart_epoch;
        let handle = self
            .queue
            .enqueue(async move { backend.play(&game_id, &input).await });

        let result = handle.settled().await?;
        if epoch != self.restart_epoch {
            tracing::debug!("Dropping turn result from a superseded session");
            return Ok(None);
        }

        result.map(Some)
    }

    /// Fold one command into the transcript and decide what happens next
    async fn apply_command(&mut self, command: &Command) -> TurnOutcome {
        let style = command.style();
        for line in command.display_lines() {
            let line_style = style.for_text(&line);
            self.append_line(line, line_style).await;
        }

        self.session.last_choice = command.as_select_option().cloned();

        // A streaming command's game-over flag is honored when the stream
        // completes, after the final narration has been folded in
        if let Command::StreamingMessage(body) = command {
            return self.begin_streaming(body).await;
        }

        if command.signals_game_over() {
            self.finish_game().await;
            return TurnOutcome::GameOver;
        }

        if command.expects_user_input() {
            TurnOutcome::AwaitInput
        } else {
            let delay_ms = match command {
                Command::MessageDelay(body) => body.delay_ms,
                Command::SoundDelay(body) => body.delay_ms,
                _ => 0,
            };
            TurnOutcome::Continue { delay_ms }
        }
    }

    /// Open the token stream for a streaming command
    async fn begin_streaming(&mut self, body: &StreamingBody) -> TurnOutcome {
        let Some(game_id) = self.session.session_id.clone() else {
            return TurnOutcome::AwaitInput;
        };

        let prefix = if body.agent_name.is_empty() {
            String::new()
        } else {
            format!("{}: ", body.agent_name)
        };

        match self.backend.open_stream(&game_id, &body.stream_id).await {
            Ok(rx) => {
                self.append_line(prefix.clone(), TextStyle::default()).await;
                self.streaming_rx = Some(rx);
                self.streaming_prefix = prefix;
                self.stream_continues = !body.expects_user_input;
                self.stream_game_over = body.is_game_over;
                self.set_state(DirectorState::Streaming).await;
                TurnOutcome::Streaming
            }
            Err(e) => {
                self.notify(NotifyLevel::Error, &format!("Failed to open stream: {e}"))
                    .await;
                if body.is_game_over {
                    self.finish_game().await;
                    TurnOutcome::GameOver
                } else if body.expects_user_input {
                    TurnOutcome::AwaitInput
                } else {
                    TurnOutcome::Continue { delay_ms: 0 }
                }
            }
        }
    }

    /// Poll for streaming tokens
    ///
    /// Call this regularly while [`Director::is_streaming`]. Tokens append to
    /// the latest transcript line; completion may auto-continue the story.
    /// Returns true if there was activity.
    pub async fn poll_streaming(&mut self) -> bool {
        // Collect available tokens first to avoid borrow issues
        let tokens: Vec<StreamingToken> = {
            let rx = match self.streaming_rx.as_mut() {
                Some(rx) => rx,
                None => return false,
            };

            let mut collected = Vec::new();
            while let Ok(token) = rx.try_recv() {
                let is_terminal = matches!(
                    token,
                    StreamingToken::Complete { .. } | StreamingToken::Error(_)
                );
                collected.push(token);
                if is_terminal {
                    break;
                }
            }
            collected
        };

        if tokens.is_empty() {
            return false;
        }

        for token in tokens {
            match token {
                StreamingToken::Token(text) => {
                    if let Some(index) = self.session.append_to_last(&text) {
                        let text = self.session.lines()[index].clone();
                        self.send(DirectorMessage::LineAmended { index, text }).await;
                    }
                }

                StreamingToken::Complete { message } => {
                    // The completed message is authoritative; it may differ
                    // from the concatenated tokens
                    let full = format!("{}{}", self.streaming_prefix, message);
                    if let Some(index) = self.session.replace_last(full.clone()) {
                        self.send(DirectorMessage::LineAmended { index, text: full })
                            .await;
                    }
                    self.streaming_rx = None;

                    if self.stream_game_over || text_signals_game_over(&message) {
                        self.finish_game().await;
                    } else if self.stream_continues {
                        self.run_turn(String::new()).await;
                    } else {
                        self.set_state(DirectorState::AwaitingTurn).await;
                    }
                }

                StreamingToken::Error(error) => {
                    self.streaming_rx = None;
                    let line = format!("[stream error: {error}]");
                    self.append_line(line.clone(), TextStyle::new(line, false, 30))
                        .await;
                    self.notify(NotifyLevel::Error, &error).await;
                    self.set_state(DirectorState::AwaitingTurn).await;
                }
            }
        }

        true
    }

    /// Abandon the current play-through and begin a new one
    pub async fn restart(&mut self) -> anyhow::Result<()> {
        self.restart_epoch += 1;
        self.streaming_rx = None;
        self.stream_continues = false;
        self.stream_game_over = false;

        // Let the server discard the abandoned session
        if !self.session.is_game_over {
            if let Some(game_id) = self.session.session_id.clone() {
                let backend = Arc::clone(&self.backend);
                tokio::spawn(async move {
                    if let Err(e) = backend.end(&game_id).await {
                        tracing::warn!(error = %e, "Failed to end abandoned session");
                    }
                });
            }
        }
        if let Some(store) = &self.store {
            store.clear();
        }

        self.session.reset();
        self.send(DirectorMessage::TranscriptCleared).await;
        self.set_state(DirectorState::Starting).await;
        self.start_fresh().await
    }

    /// Shut down the Director
    pub async fn shutdown(&mut self) {
        if !self.session.is_game_over {
            if let Some(game_id) = self.session.session_id.clone() {
                let backend = Arc::clone(&self.backend);
                tokio::spawn(async move {
                    let _ = backend.end(&game_id).await;
                });
            }
        }
        self.send(DirectorMessage::Quit).await;
    }

    /// Mark the playthrough finished and notify the server
    ///
    /// The end call is fire-and-forget: the outcome is already decided and a
    /// failure changes nothing for the player.
    async fn finish_game(&mut self) {
        self.session.is_game_over = true;
        self.session.last_choice = None;

        if let Some(store) = &self.store {
            store.clear();
        }
        if let Some(game_id) = self.session.session_id.clone() {
            let backend = Arc::clone(&self.backend);
            tokio::spawn(async move {
                if let Err(e) = backend.end(&game_id).await {
                    tracing::warn!(error = %e, "Failed to notify server of game over");
                }
            });
        }

        self.set_state(DirectorState::GameOver).await;
    }

    /// Surface a failed turn without tearing the session down
    async fn report_turn_error(&mut self, error: anyhow::Error) {
        match error.downcast_ref::<EngineError>() {
            Some(EngineError::UnsupportedCommandKind { kind }) => {
                // The session survives; the player just sees a gap
                tracing::warn!(kind = %kind, "Server emitted an unsupported command");
                let line = format!("[unsupported command: {kind}]");
                self.append_line(line.clone(), TextStyle::new(line, false, 30))
                    .await;
            }
            _ => {
                let line = format!("[error: {error}]");
                self.append_line(line.clone(), TextStyle::new(line, false, 30))
                    .await;
                self.notify(NotifyLevel::Error, &error.to_string()).await;
            }
        }

        self.set_state(DirectorState::AwaitingTurn).await;
    }

    /// Surface a failed session start without tearing the surface down
    ///
    /// The Director drops back to `Idle` so a reconnect or restart can retry.
    async fn report_start_error(&mut self, error: anyhow::Error) {
        tracing::error!(error = %error, "Failed to start a session");
        let line = format!("[error: {error}]");
        self.append_line(line.clone(), TextStyle::new(line, false, 30))
            .await;
        self.notify(NotifyLevel::Error, &error.to_string()).await;
        self.set_state(DirectorState::Idle).await;
    }

    /// Append a transcript line and tell the surface about it
    async fn append_line(&mut self, text: impl Into<String>, style: TextStyle) {
        let text = text.into();
        let index = self.session.push_line(text.clone(), style.clone());
        self.send(DirectorMessage::LineAppended { index, text, style })
            .await;
    }

    /// Set state and notify UI
    async fn set_state(&mut self, state: DirectorState) {
        self.state = state;
        self.send(DirectorMessage::State { state }).await;
    }

    /// Send notification
    async fn notify(&self, level: NotifyLevel, message: &str) {
        self.send(DirectorMessage::Notify {
            level,
            message: message.to_string(),
        })
        .await;
    }

    /// Send a message to the UI surface
    async fn send(&self, msg: DirectorMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}
