//! Surface Events
//!
//! Events sent from UI surfaces to the Director. These represent everything
//! a surface can report about the player.
//!
//! # Design Philosophy
//!
//! UI surfaces are "dumb" renderers that forward player actions to the
//! Director. They don't interpret what actions mean; they just report what
//! happened. The Director decides how to respond.

use serde::{Deserialize, Serialize};

/// Events from UI Surface to Director
///
/// The Director responds with [`crate::DirectorMessage`]s.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SurfaceEvent {
    /// Surface connected and is ready to render
    Connected,

    /// Player submitted a line of input
    InputSubmitted {
        /// The raw input text
        content: String,
    },

    /// Player asked for a fresh play-through
    RestartRequested,

    /// Player asked to quit
    QuitRequested,
}
