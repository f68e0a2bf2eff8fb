//! Seed errors.

/// Errors from reading or parsing a seed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedError {
    /// The seed is not a decimal `u64`.
    #[error("seed must be a valid u64, got {raw:?}")]
    Invalid {
        /// The rejected input, trimmed
        raw: String,
    },

    /// The seed is zero.
    #[error("seed must be non-zero")]
    Zero,
}
