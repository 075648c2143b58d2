//! Queue construction options.

/// Options fixed when a [`Queue`](crate::Queue) is created.
#[derive(Debug, Clone, Default)]
pub struct QueueConfig {
    /// Enable the counting wait-signal.
    pub wait_signal: bool,
    /// Label attached to the queue's log events.
    pub name: Option<String>,
}

impl QueueConfig {
    /// Create a config with no wait-signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the wait-signal.
    pub fn wait_signal(mut self, enabled: bool) -> Self {
        self.wait_signal = enabled;
        self
    }

    /// Set the label used in log events.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
