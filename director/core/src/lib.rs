//! Director Core - Headless Story Engine for teletale
//!
//! This crate provides the core conversation logic for teletale, completely
//! independent of any UI framework. It can drive a terminal client, a web
//! page, or run headless for testing/automation.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       UI Surfaces                          │
//! │   ┌──────────┐   ┌──────────┐   ┌───────────────────────┐  │
//! │   │ Terminal │   │   Web    │   │  Headless / Testing   │  │
//! │   └─────┬────┘   └─────┬────┘   └───────────┬───────────┘  │
//! │         └──────────────┴────────────────────┘              │
//! │                        │                                   │
//! │                 SurfaceEvent (up)                          │
//! │               DirectorMessage (down)                       │
//! │                        │                                   │
//! └────────────────────────┼───────────────────────────────────┘
//!                          │
//! ┌────────────────────────┼───────────────────────────────────┐
//! │                   DIRECTOR CORE                            │
//! │  ┌─────────────────────┴────────────────────────────────┐  │
//! │  │                     Director                          │  │
//! │  │  ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌─────────┐  │  │
//! │  │  │ Session │  │ Request │  │ Session │  │ Backend │  │  │
//! │  │  │  State  │  │  Queue  │  │  Store  │  │ (HTTP)  │  │  │
//! │  │  └─────────┘  └─────────┘  └─────────┘  └─────────┘  │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! └────────────────────────┬───────────────────────────────────┘
//!                          │
//!                    Game server (REST + SSE)
//! ```
//!
//! # Key Types
//!
//! - [`Director`]: The main engine struct that manages everything
//! - [`DirectorMessage`]: Messages sent from Director to UI surfaces
//! - [`SurfaceEvent`]: Events sent from UI surfaces to Director
//! - [`Command`]: One instruction from the game server
//! - [`RequestQueue`]: FIFO serializer for server requests
//! - [`SessionStore`]: Session-id persistence capability
//!
//! # Quick Start
//!
//! ```ignore
//! use director_core::{Director, DirectorConfig, HttpGameBackend, SurfaceEvent};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (tx, mut rx) = mpsc::channel(100);
//!
//!     let backend = HttpGameBackend::from_env();
//!     let config = DirectorConfig::from_env();
//!     let mut director = Director::new(backend, config, tx);
//!
//!     director.handle_event(SurfaceEvent::Connected).await?;
//!
//!     loop {
//!         while let Ok(msg) = rx.try_recv() {
//!             // Render message to UI
//!         }
//!         director.poll_streaming().await;
//!         // Read player input, send as SurfaceEvent::InputSubmitted
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`backend`]: Game server abstraction (HTTP + SSE, mockable)
//! - [`commands`]: The server's command vocabulary and text styles
//! - [`config`]: Engine configuration
//! - [`director`]: Main Director struct and the turn state machine
//! - [`error`]: Error taxonomy
//! - [`events`]: Events from UI surfaces to Director
//! - [`messages`]: Messages from Director to UI surfaces
//! - [`queue`]: FIFO request serializer
//! - [`session`]: Transcript and play-through state
//! - [`store`]: Session-id persistence
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on any UI framework. It's pure
//! engine logic that can be used anywhere.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod commands;
pub mod config;
pub mod director;
pub mod error;
pub mod events;
pub mod messages;
pub mod queue;
pub mod session;
pub mod store;

// Re-exports for convenience
pub use backend::{GameBackend, HttpGameBackend, StartResponse, StreamingToken};
pub use commands::{
    Command, MessageBody, MessageDelayBody, SelectOptionBody, SoundDelayBody, StreamingBody,
    TextStyle,
};
pub use config::DirectorConfig;
pub use director::Director;
pub use error::EngineError;
pub use events::SurfaceEvent;
pub use messages::{DirectorMessage, DirectorState, NotifyLevel};
pub use queue::{QueueHandle, RequestQueue};
pub use session::SessionState;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
