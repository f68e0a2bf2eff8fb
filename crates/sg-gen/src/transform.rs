//! Value transforms: [`map`], [`flat_map`], [`filter`].
//!
//! Transforms see every value, sentinels included. A `map` function that
//! only cares about payloads should pass `Pending` and `StopIteration`
//! through untouched (see [`Value::map_item`]).

use std::sync::Arc;

use async_trait::async_trait;
use sg_core::{Context, Generator, Node, Payload, Step, Value};

use crate::structural::cons;

type MapFn<T, U> = Arc<dyn Fn(Value<T>) -> Value<U> + Send + Sync>;
type FlatMapFn<T, U> = Arc<dyn Fn(Value<T>) -> Option<Generator<U>> + Send + Sync>;

struct Map<T: Payload, U: Payload> {
    inner: Generator<T>,
    f: MapFn<T, U>,
}

/// Apply `f` to every value of `g`.
///
/// # Example
///
/// ```rust
/// use sg_gen::{drain_values, map, seq, some, Context, GenConfig, Value};
///
/// let doubled = map(|v: Value<i32>| v.map_item(|x| x * 2), seq([some(1), some(2)]));
///
/// let runtime = tokio::runtime::Builder::new_current_thread().build()?;
/// let xs = runtime.block_on(drain_values(&Context::new(1), doubled, &GenConfig::default()))?;
/// assert_eq!(xs, vec![2, 4]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[must_use]
pub fn map<T: Payload, U: Payload>(
    f: impl Fn(Value<T>) -> Value<U> + Send + Sync + 'static,
    g: Option<Generator<T>>,
) -> Option<Generator<U>> {
    map_shared(Arc::new(f), g)
}

fn map_shared<T: Payload, U: Payload>(f: MapFn<T, U>, g: Option<Generator<T>>) -> Option<Generator<U>> {
    g.map(|inner| Generator::new(Map { inner, f }))
}

#[async_trait]
impl<T: Payload, U: Payload> Node<U> for Map<T, U> {
    fn update(&self, _this: &Generator<U>, ctx: &Context) -> Option<Generator<U>> {
        map_shared(Arc::clone(&self.f), self.inner.update(ctx))
    }

    async fn next(&self, _this: &Generator<U>, ctx: &Context) -> Step<U> {
        let (value, rest) = self.inner.next(ctx).await;
        ((self.f)(value), map_shared(Arc::clone(&self.f), rest))
    }

    fn name(&self) -> &'static str {
        "map"
    }
}

struct FlatMap<T: Payload, U: Payload> {
    inner: Generator<T>,
    f: FlatMapFn<T, U>,
}

/// Replace every value of `g` with the generator `f` returns for it.
///
/// Each step yields the first value of `f(x)` and continues with the rest
/// of `f(x)` followed by `flat_map(f, rest_of_g)`. Values for which `f`
/// returns `None` are skipped without yielding.
#[must_use]
pub fn flat_map<T: Payload, U: Payload>(
    f: impl Fn(Value<T>) -> Option<Generator<U>> + Send + Sync + 'static,
    g: Option<Generator<T>>,
) -> Option<Generator<U>> {
    flat_map_shared(Arc::new(f), g)
}

fn flat_map_shared<T: Payload, U: Payload>(
    f: FlatMapFn<T, U>,
    g: Option<Generator<T>>,
) -> Option<Generator<U>> {
    g.map(|inner| Generator::new(FlatMap { inner, f }))
}

#[async_trait]
impl<T: Payload, U: Payload> Node<U> for FlatMap<T, U> {
    fn update(&self, _this: &Generator<U>, ctx: &Context) -> Option<Generator<U>> {
        flat_map_shared(Arc::clone(&self.f), self.inner.update(ctx))
    }

    async fn next(&self, _this: &Generator<U>, ctx: &Context) -> Step<U> {
        let mut inner = self.inner.clone();
        let mut skipped_count: u64 = 0;

        loop {
            let (value, rest) = inner.next(ctx).await;
            let expanded = (self.f)(value);
            let continuation = flat_map_shared(Arc::clone(&self.f), rest.clone());

            if let Some(head) = expanded {
                let (value, head_rest) = head.next(ctx).await;
                return (value, cons(head_rest, continuation));
            }

            match rest {
                None => {
                    tracing::trace!(skipped_count, "flat_map source exhausted while skipping");
                    return (Value::StopIteration, None);
                }
                Some(_) if ctx.is_done() => return (Value::Pending, continuation),
                Some(rest) => {
                    skipped_count += 1;
                    inner = rest;
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "flat_map"
    }
}

/// Keep the payloads of `g` that match `pred`.
///
/// Sentinels never match.
#[must_use]
pub fn filter<T: Payload>(
    pred: impl Fn(&T) -> bool + Send + Sync + 'static,
    g: Option<Generator<T>>,
) -> Option<Generator<T>> {
    flat_map(
        move |value: Value<T>| match value {
            Value::Item(x) if pred(&x) => crate::some(x),
            _ => None,
        },
        g,
    )
}
