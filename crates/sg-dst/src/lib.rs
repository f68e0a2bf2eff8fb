//! # sg-dst
//!
//! Deterministic randomness for generator pipelines.
//!
//! Every randomized combinator (`mix`, `choices`, `stagger`) draws from a
//! [`DeterministicRng`] threaded through the generator context, so a whole
//! run is reproducible from one seed.
//!
//! ## Usage
//!
//! ```rust
//! use sg_dst::DeterministicRng;
//!
//! let mut rng = DeterministicRng::new(12345);
//! let branch = rng.index(3);
//! assert!(branch < 3);
//! ```
//!
//! ## Reproducibility
//!
//! To replay a run with the same interleavings and branch choices:
//! ```bash
//! SG_SEED=12345 cargo test
//! ```

pub mod error;
pub mod random;

pub use error::SeedError;
pub use random::DeterministicRng;

/// Environment variable holding the seed for reproducible runs.
pub const SEED_ENV_VAR: &str = "SG_SEED";

/// Parse a seed string. Zero is rejected.
pub fn parse_seed(raw: &str) -> Result<u64, SeedError> {
    let trimmed = raw.trim();
    let seed: u64 = trimmed.parse().map_err(|_| SeedError::Invalid {
        raw: trimmed.to_string(),
    })?;
    if seed == 0 {
        return Err(SeedError::Zero);
    }
    Ok(seed)
}

/// Read the seed from `SG_SEED`, if set.
///
/// Returns `Ok(None)` when the variable is absent.
pub fn seed_from_env() -> Result<Option<u64>, SeedError> {
    match std::env::var(SEED_ENV_VAR) {
        Ok(raw) => parse_seed(&raw).map(Some),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(SeedError::Invalid {
            raw: "<non-unicode>".to_string(),
        }),
    }
}

/// Get the seed from the environment or generate a random one.
///
/// Logs the seed so a run can be reproduced with `SG_SEED=<seed>`. An
/// unparsable `SG_SEED` is reported and replaced by a fresh seed.
#[must_use]
pub fn get_or_generate_seed() -> u64 {
    match seed_from_env() {
        Ok(Some(seed)) => {
            tracing::info!(seed, "{}={} (from environment)", SEED_ENV_VAR, seed);
            seed
        }
        Ok(None) => {
            let seed = generate_seed();
            tracing::info!(seed, "{}={} (randomly generated)", SEED_ENV_VAR, seed);
            seed
        }
        Err(e) => {
            let seed = generate_seed();
            tracing::warn!(seed, "ignoring {}: {e}; using {}", SEED_ENV_VAR, seed);
            seed
        }
    }
}

fn generate_seed() -> u64 {
    rand::random::<u64>().max(1)
}
