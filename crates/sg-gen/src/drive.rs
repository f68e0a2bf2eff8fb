//! Driving a generator to exhaustion.
//!
//! These loops sit on top of the contract: they call `next` until the
//! continuation is `None`. `StopIteration` values are dropped from the
//! output (they only mark a spent branch); `Pending` values are kept unless
//! the context is done, in which case the drive stops.

use futures::stream::{self, Stream};
use sg_core::{Context, GenConfig, Generator, Payload, Value};

/// Errors from a drive loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriveError {
    /// The generator was still live after `steps_max` steps.
    #[error("generator still live after {steps_max} steps")]
    StepLimitExceeded {
        /// The cap that was hit
        steps_max: u64,
    },

    /// The context finished before the generator did.
    #[error("context done after {steps} steps")]
    Cancelled {
        /// Steps taken, including the one that returned `Pending`
        steps: u64,
    },
}

/// Call `next` until exhaustion and collect every value except
/// `StopIteration`.
///
/// Only `config.steps_max` is read here; the timeout reaches generators
/// through the context (see [`Context::from_config`]).
pub async fn drain<T: Payload>(
    ctx: &Context,
    g: Option<Generator<T>>,
    config: &GenConfig,
) -> Result<Vec<Value<T>>, DriveError> {
    debug_assert!(config.steps_max > 0, "steps_max must be positive");

    let mut values = Vec::new();
    let mut current = g;
    let mut steps: u64 = 0;

    while let Some(generator) = current {
        if steps >= config.steps_max {
            tracing::warn!(steps_max = config.steps_max, "drain hit step limit");
            return Err(DriveError::StepLimitExceeded {
                steps_max: config.steps_max,
            });
        }
        steps += 1;

        let (value, rest) = generator.next(ctx).await;
        if value.is_pending() && ctx.is_done() {
            tracing::debug!(steps, "drain stopped by context");
            return Err(DriveError::Cancelled { steps });
        }
        if !value.is_stop_iteration() {
            values.push(value);
        }
        current = rest;
    }

    let draws = ctx.with_rng_mut(|rng| rng.draws_count());
    tracing::debug!(steps, values = values.len(), draws, "generator drained");
    Ok(values)
}

/// Like [`drain`], keeping only payloads.
pub async fn drain_values<T: Payload>(
    ctx: &Context,
    g: Option<Generator<T>>,
    config: &GenConfig,
) -> Result<Vec<T>, DriveError> {
    let values = drain(ctx, g, config).await?;
    Ok(values.into_iter().filter_map(Value::item).collect())
}

/// Expose a generator as a stream of values.
///
/// `StopIteration` values are skipped. The stream ends when the generator
/// exhausts or when a step returns `Pending` on a done context.
pub fn into_stream<T: Payload>(
    ctx: Context,
    g: Option<Generator<T>>,
) -> impl Stream<Item = Value<T>> + Send {
    stream::unfold((ctx, g), |(ctx, mut current)| async move {
        loop {
            let generator = current?;
            let (value, rest) = generator.next(&ctx).await;
            if value.is_pending() && ctx.is_done() {
                return None;
            }
            if value.is_stop_iteration() {
                current = rest;
                continue;
            }
            return Some((value, (ctx, rest)));
        }
    })
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use tokio::sync::mpsc;

    use super::*;
    use crate::testing::test_context;
    use crate::{from_channel, from_fn, limit, map, seq, some};

    #[tokio::test]
    async fn test_drain_collects_in_order() {
        let ctx = test_context();
        let g = seq([some(1), some(2), some(3)]);

        let values = drain(&ctx, g, &GenConfig::default()).await.unwrap();
        assert_eq!(values, vec![Value::Item(1), Value::Item(2), Value::Item(3)]);
    }

    #[tokio::test]
    async fn test_drain_nil_is_empty() {
        let ctx = test_context();
        let values = drain::<i32>(&ctx, None, &GenConfig::default()).await.unwrap();
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn test_drain_keeps_pending_payload_sentinels() {
        let ctx = test_context();
        let g = map(|_: Value<i32>| Value::<i32>::Pending, seq([some(1), some(2)]));

        let values = drain(&ctx, g, &GenConfig::default()).await.unwrap();
        assert_eq!(values, vec![Value::Pending, Value::Pending]);
    }

    #[tokio::test]
    async fn test_drain_step_limit() {
        let ctx = test_context();
        let config = GenConfig {
            steps_max: 10,
            ..GenConfig::default()
        };

        let err = drain(&ctx, from_fn(|| 1), &config).await.unwrap_err();
        assert_eq!(err, DriveError::StepLimitExceeded { steps_max: 10 });
    }

    #[tokio::test]
    async fn test_drain_stops_when_cancelled() {
        let (_tx, rx) = mpsc::channel::<i32>(1);
        let (ctx, cancel) = test_context().with_cancel();
        cancel.cancel();

        let err = drain(&ctx, from_channel(rx), &GenConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err, DriveError::Cancelled { steps: 1 });
    }

    #[tokio::test]
    async fn test_drain_values_drops_sentinels() {
        let ctx = test_context();
        let g = map(
            |v: Value<i32>| match v {
                Value::Item(2) => Value::Pending,
                other => other,
            },
            seq([some(1), some(2), some(3)]),
        );

        let values = drain_values(&ctx, g, &GenConfig::default()).await.unwrap();
        assert_eq!(values, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_into_stream() {
        let g = limit(4, from_fn(|| "x"));
        let values: Vec<_> = into_stream(test_context(), g).collect().await;
        assert_eq!(values, vec![Value::Item("x"); 4]);
    }

    #[tokio::test]
    async fn test_into_stream_skips_stop_iteration() {
        let (tx, rx) = mpsc::channel(2);
        tx.send(5).await.unwrap();
        drop(tx);

        let values: Vec<_> = into_stream(test_context(), seq([from_channel(rx), some(6)]))
            .collect()
            .await;
        assert_eq!(values, vec![Value::Item(5), Value::Item(6)]);
    }
}
