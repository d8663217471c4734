//! Director Configuration

use serde::{Deserialize, Serialize};

/// Director configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectorConfig {
    /// Game server base address
    pub server_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Whether to try resuming a stored session before starting fresh
    pub auto_resume: bool,
    /// Whether to honor server-requested pacing delays between scenes
    ///
    /// Tests disable this so auto-continue chains run immediately.
    pub honor_delays: bool,
    /// Upper bound on consecutive auto-continued turns
    ///
    /// A misbehaving server that never asks for input would otherwise chain
    /// forever.
    pub max_auto_continues: usize,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".to_string(),
            timeout_secs: 120,
            auto_resume: true,
            honor_delays: true,
            max_auto_continues: 32,
        }
    }
}

impl DirectorConfig {
    /// Create configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_url: std::env::var("TELETALE_SERVER").unwrap_or(defaults.server_url),
            timeout_secs: std::env::var("TELETALE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            auto_resume: std::env::var("TELETALE_NO_RESUME")
                .map(|v| v != "1" && v.to_lowercase() != "true")
                .unwrap_or(true),
            honor_delays: defaults.honor_delays,
            max_auto_continues: defaults.max_auto_continues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DirectorConfig::default();
        assert_eq!(config.server_url, "http://127.0.0.1:5000");
        assert_eq!(config.timeout_secs, 120);
        assert!(config.auto_resume);
        assert!(config.honor_delays);
    }
}
