//! Configuration errors.

/// Errors from validating a [`GenConfig`](crate::config::GenConfig).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `seed` was set to zero.
    #[error("seed must be non-zero")]
    ZeroSeed,

    /// `steps_max` was zero, so nothing could ever be drawn.
    #[error("steps_max must be positive")]
    ZeroStepsMax,

    /// `timeout` was set to zero, so the run would end before it started.
    #[error("timeout must be positive when set")]
    ZeroTimeout,
}
