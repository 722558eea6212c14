use std::time::Duration;

/// Errors produced while waiting for admission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LimitError {
    /// The caller's cancellation token fired before the wait was admitted.
    ///
    /// No admission is recorded for a cancelled wait.
    #[error("Wait cancelled before admission")]
    Cancelled,

    /// The wait exceeded its deadline before admission.
    #[error("Wait timed out after {0:?} before admission")]
    Timeout(Duration),
}

/// Errors produced while loading a [`LimiterConfig`](crate::LimiterConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration text is not valid YAML for a limiter.
    #[error("Invalid limiter configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The window is not a valid human-readable duration.
    #[error("Invalid window duration: {0}")]
    Duration(#[from] humantime::DurationError),
}
