//! HTTP Game Backend
//!
//! [`GameBackend`] implementation for the game server's REST + SSE API.
//!
//! # Server API
//!
//! - `GET  /start` — create a session, returns `{ message, styles?, game_id }`
//! - `POST /load/{id}` — replay a session's command log
//! - `POST /play/{id}` — submit one turn, returns `{ response: Command }`
//! - `POST /end/{id}` — discard server-side session state
//! - `GET  /stream/{id}/{sid}` — Server-Sent Events token stream
//!
//! All POST bodies are `{ "input": <string> }`; lifecycle calls send an empty
//! input. Responses are JSON except the stream endpoint, which emits
//! `data: {json}` events with `type` of `token`, `done`, or `error`.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;

use super::traits::{GameBackend, StartResponse, StreamingToken};
use crate::commands::Command;
use crate::error::EngineError;

/// Default request timeout, matching the server's slowest LLM-backed turns.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Wire shape of a `/play` reply
#[derive(serde::Deserialize)]
struct TurnReply {
    response: serde_json::Value,
}

/// Wire shape of a `/load` reply
#[derive(serde::Deserialize)]
struct ReplayReply {
    response: Vec<serde_json::Value>,
}

/// HTTP client for the game server
#[derive(Clone)]
pub struct HttpGameBackend {
    /// Server base address, e.g. `http://127.0.0.1:5000`
    base_url: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpGameBackend {
    /// Create a new backend for the given base address
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new backend with an explicit request timeout
    ///
    /// A request that exceeds the timeout surfaces as a transport failure.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Create from environment variables
    ///
    /// Reads `TELETALE_SERVER` (default `http://127.0.0.1:5000`) and
    /// `TELETALE_TIMEOUT_SECS`.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = std::env::var("TELETALE_SERVER")
            .unwrap_or_else(|_| "http://127.0.0.1:5000".to_string());
        let timeout = std::env::var("TELETALE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self::with_timeout(base_url, Duration::from_secs(timeout))
    }

    /// The configured base address
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn start_url(&self) -> String {
        format!("{}/start", self.base_url)
    }

    fn load_url(&self, game_id: &str) -> String {
        format!("{}/load/{game_id}", self.base_url)
    }

    fn play_url(&self, game_id: &str) -> String {
        format!("{}/play/{game_id}", self.base_url)
    }

    fn end_url(&self, game_id: &str) -> String {
        format!("{}/end/{game_id}", self.base_url)
    }

    fn stream_url(&self, game_id: &str, stream_id: &str) -> String {
        format!("{}/stream/{game_id}/{stream_id}", self.base_url)
    }

    /// POST `{ "input": <input> }` to a session endpoint
    async fn post_input(&self, url: &str, input: &str) -> Result<reqwest::Response, EngineError> {
        let body = serde_json::json!({ "input": input });
        Ok(self.http_client.post(url).json(&body).send().await?)
    }
}

impl Default for HttpGameBackend {
    fn default() -> Self {
        Self::new("http://127.0.0.1:5000")
    }
}

#[async_trait]
impl GameBackend for HttpGameBackend {
    async fn start(&self) -> anyhow::Result<StartResponse> {
        let response = self
            .http_client
            .get(self.start_url())
            .send()
            .await
            .map_err(EngineError::Transport)?;

        if !response.status().is_success() {
            return Err(EngineError::StartFailed {
                status: response.status(),
            }
            .into());
        }

        let started: StartResponse = response.json().await.map_err(EngineError::Transport)?;
        tracing::debug!(game_id = %started.game_id, "Session started");
        Ok(started)
    }

    async fn load(&self, game_id: &str) -> anyhow::Result<Option<Vec<Command>>> {
        let response = self.post_input(&self.load_url(game_id), "").await?;

        // Non-success is the defined "no resumable session" signal
        if !response.status().is_success() {
            tracing::debug!(
                game_id = %game_id,
                status = %response.status(),
                "No resumable session"
            );
            return Ok(None);
        }

        let data: ReplayReply = response.json().await.map_err(EngineError::Transport)?;

        let mut commands = Vec::with_capacity(data.response.len());
        for raw in &data.response {
            commands.push(Command::parse(raw)?);
        }

        tracing::debug!(game_id = %game_id, replayed = commands.len(), "Session loaded");
        Ok(Some(commands))
    }

    async fn play(&self, game_id: &str, input: &str) -> anyhow::Result<Command> {
        let response = self.post_input(&self.play_url(game_id), input).await?;

        if !response.status().is_success() {
            return Err(EngineError::PlayFailed {
                status: response.status(),
            }
            .into());
        }

        let data: TurnReply = response.json().await.map_err(EngineError::Transport)?;
        Ok(Command::parse(&data.response)?)
    }

    async fn end(&self, game_id: &str) -> anyhow::Result<()> {
        let response = self.post_input(&self.end_url(game_id), "").await?;
        // The reply body is ignored either way
        tracing::debug!(game_id = %game_id, status = %response.status(), "Session end notified");
        Ok(())
    }

    async fn open_stream(
        &self,
        game_id: &str,
        stream_id: &str,
    ) -> anyhow::Result<mpsc::Receiver<StreamingToken>> {
        let (tx, rx) = mpsc::channel(100);

        let response = self
            .http_client
            .get(self.stream_url(game_id, stream_id))
            .send()
            .await
            .map_err(EngineError::Transport)?;

        if !response.status().is_success() {
            return Err(EngineError::Stream {
                message: format!("stream endpoint returned {}", response.status()),
            }
            .into());
        }

        let mut stream = response.bytes_stream();

        // Parse SSE events off the wire and forward tokens
        tokio::spawn(async move {
            let mut buffer = String::new();
            let mut full_text = String::new();

            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));

                        // SSE events are newline-delimited `data: {json}` lines
                        while let Some(pos) = buffer.find('\n') {
                            let line = buffer[..pos].trim().to_string();
                            buffer = buffer[pos + 1..].to_string();

                            let Some(payload) = line.strip_prefix("data:") else {
                                continue;
                            };
                            let Ok(event) =
                                serde_json::from_str::<serde_json::Value>(payload.trim())
                            else {
                                continue;
                            };

                            match event.get("type").and_then(serde_json::Value::as_str) {
                                Some("token") => {
                                    let token = event
                                        .get("token")
                                        .and_then(serde_json::Value::as_str)
                                        .unwrap_or("");
                                    full_text.push_str(token);
                                    if tx
                                        .send(StreamingToken::Token(token.to_string()))
                                        .await
                                        .is_err()
                                    {
                                        // Receiver dropped, stop streaming
                                        return;
                                    }
                                }
                                Some("done") => {
                                    let message = event
                                        .get("full_text")
                                        .and_then(serde_json::Value::as_str)
                                        .map_or_else(|| full_text.clone(), String::from);
                                    let _ = tx.send(StreamingToken::Complete { message }).await;
                                    return;
                                }
                                Some("error") => {
                                    let message = event
                                        .get("message")
                                        .and_then(serde_json::Value::as_str)
                                        .unwrap_or("stream error")
                                        .to_string();
                                    let _ = tx.send(StreamingToken::Error(message)).await;
                                    return;
                                }
                                _ => {}
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(StreamingToken::Error(e.to_string())).await;
                        return;
                    }
                }
            }

            // Stream ended without a done event
            if !full_text.is_empty() {
                let _ = tx
                    .send(StreamingToken::Complete { message: full_text })
                    .await;
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_composition() {
        let backend = HttpGameBackend::new("http://localhost:5000");
        assert_eq!(backend.start_url(), "http://localhost:5000/start");
        assert_eq!(backend.load_url("g1"), "http://localhost:5000/load/g1");
        assert_eq!(backend.play_url("g1"), "http://localhost:5000/play/g1");
        assert_eq!(backend.end_url("g1"), "http://localhost:5000/end/g1");
        assert_eq!(
            backend.stream_url("g1", "s1"),
            "http://localhost:5000/stream/g1/s1"
        );
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let backend = HttpGameBackend::new("http://localhost:5000/");
        assert_eq!(backend.base_url(), "http://localhost:5000");
        assert_eq!(backend.start_url(), "http://localhost:5000/start");
    }
}
