//! Shared helpers for unit tests.

use sg_core::{Context, GenConfig, Generator, Payload, Value};

use crate::drive::{drain, drain_values};

/// Seed used by every unit test.
pub const TEST_SEED: u64 = 12345;

/// A live context with the fixed test seed.
///
/// Also installs a test-writer tracing subscriber (once per process) so
/// `RUST_LOG=sg_gen=trace` shows combinator events.
pub fn test_context() -> Context {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    Context::new(TEST_SEED)
}

/// Drain with a fresh test context, keeping `Pending` values.
pub async fn exhaust<T: Payload>(g: Option<Generator<T>>) -> Vec<Value<T>> {
    drain(&test_context(), g, &GenConfig::fast())
        .await
        .expect("generator should exhaust within the fast step budget")
}

/// Drain with a fresh test context, keeping payloads only.
pub async fn exhaust_items<T: Payload>(g: Option<Generator<T>>) -> Vec<T> {
    drain_values(&test_context(), g, &GenConfig::fast())
        .await
        .expect("generator should exhaust within the fast step budget")
}
