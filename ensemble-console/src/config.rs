use std::time::Duration;

use ensemble_core::DEFAULT_SETTLE_TIMEOUT;

pub const DEFAULT_PROMPT: &str = "ensemble> ";

/// How long `start_blocking` waits for in-flight blocking work after the
/// session ends. Pending stdin reads are abandoned after this.
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Bounded wait after each `enable`.
    pub settle_timeout: Duration,
    pub prompt: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            settle_timeout: DEFAULT_SETTLE_TIMEOUT,
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl ConsoleConfig {
    pub fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = timeout;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }
}
