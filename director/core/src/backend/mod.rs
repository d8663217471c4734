//! Game Server Backend
//!
//! This module provides abstracted access to the game server through a common
//! trait interface. The Director only talks to [`GameBackend`]; the concrete
//! HTTP implementation lives in [`HttpGameBackend`].
//!
//! # Usage
//!
//! ```ignore
//! use director_core::backend::{GameBackend, HttpGameBackend};
//!
//! let backend = HttpGameBackend::from_env();
//! let started = backend.start().await?;
//! let command = backend.play(&started.game_id, "look around").await?;
//! ```

mod http;
mod traits;

pub use http::HttpGameBackend;
pub use traits::{GameBackend, StartResponse, StreamingToken};
