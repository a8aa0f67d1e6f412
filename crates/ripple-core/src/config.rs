use web_time::Duration;

/// Engine tuning knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long deferred writes are buffered before one flush delivers them.
    pub coalesce_window: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            coalesce_window: Duration::from_millis(1),
        }
    }
}

impl EngineConfig {
    pub fn with_coalesce_window(mut self, window: Duration) -> Self {
        self.coalesce_window = window;
        self
    }

    /// Deferred writes become due on the next `flush_due` call.
    pub fn immediate() -> Self {
        Self {
            coalesce_window: Duration::ZERO,
        }
    }

    pub fn relaxed() -> Self {
        Self {
            coalesce_window: Duration::from_millis(16),
        }
    }
}
