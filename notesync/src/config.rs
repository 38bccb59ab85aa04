//! Engine configuration
//!
//! All knobs come from the environment (with `.env` loading in the binary),
//! falling back to defaults that match the reference autosave behavior.

use std::time::Duration;

/// Configuration for the sync engine and its API server
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Quiet period before a buffered edit is written out
    pub debounce: Duration,

    /// Address the HTTP/WebSocket facade binds to
    pub bind_addr: String,

    /// Capacity of the render-event broadcast channel feeding WebSocket clients
    pub render_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(800),
            bind_addr: "127.0.0.1:4800".to_string(),
            render_buffer: 256,
        }
    }
}

impl SyncConfig {
    /// Build configuration from environment variables, using defaults for
    /// anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let debounce_ms = std::env::var("NOTESYNC_DEBOUNCE_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.debounce.as_millis() as u64);

        let bind_addr =
            std::env::var("NOTESYNC_BIND").unwrap_or_else(|_| defaults.bind_addr.clone());

        let render_buffer = std::env::var("NOTESYNC_RENDER_BUFFER")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.render_buffer);

        Self {
            debounce: Duration::from_millis(debounce_ms),
            bind_addr,
            render_buffer,
        }
    }

    /// Shorthand used by tests that need a fast debounce
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.debounce, Duration::from_millis(800));
        assert_eq!(config.render_buffer, 256);
    }

    #[test]
    fn test_with_debounce() {
        let config = SyncConfig::default().with_debounce(Duration::from_millis(50));
        assert_eq!(config.debounce, Duration::from_millis(50));
        assert_eq!(config.bind_addr, SyncConfig::default().bind_addr);
    }
}
