//! Bounding combinators: by count ([`limit`], [`once`]) and by wall-clock
//! time ([`time_limit`]).

use std::time::Duration;

use async_trait::async_trait;
use sg_core::{Context, Generator, Node, Payload, Step, Value};
use tokio::time::Instant;

struct Limit<T: Payload> {
    inner: Generator<T>,
    remaining: usize,
}

/// At most `n` values of `g`.
///
/// `n == 0` or a nil `g` yields `None`. A shorter `g` is not padded.
/// Every step counts against `n` except a `Pending` returned because the
/// context is done, so retrying after cancellation loses nothing.
#[must_use]
pub fn limit<T: Payload>(n: usize, g: Option<Generator<T>>) -> Option<Generator<T>> {
    match g {
        Some(inner) if n > 0 => Some(Generator::new(Limit {
            inner,
            remaining: n,
        })),
        _ => None,
    }
}

/// The first value of `g`.
#[must_use]
pub fn once<T: Payload>(g: Option<Generator<T>>) -> Option<Generator<T>> {
    limit(1, g)
}

#[async_trait]
impl<T: Payload> Node<T> for Limit<T> {
    fn update(&self, _this: &Generator<T>, ctx: &Context) -> Option<Generator<T>> {
        limit(self.remaining, self.inner.update(ctx))
    }

    async fn next(&self, _this: &Generator<T>, ctx: &Context) -> Step<T> {
        debug_assert!(self.remaining > 0, "Limit must have budget left");

        let (value, rest) = self.inner.next(ctx).await;
        let cancelled = value.is_pending() && ctx.is_done();
        let remaining = if cancelled {
            self.remaining
        } else {
            self.remaining - 1
        };
        (value, limit(remaining, rest))
    }

    fn name(&self) -> &'static str {
        "limit"
    }
}

struct TimeLimit<T: Payload> {
    inner: Generator<T>,
    deadline: Instant,
}

/// Values of `g` until `d` has elapsed.
///
/// The deadline is fixed when `time_limit` is called, not on the first
/// step. A zero `d` or a nil `g` yields `None`. The deadline is handed down
/// to `g` through the context, so a wait inside `g` ends when it passes.
#[must_use]
pub fn time_limit<T: Payload>(d: Duration, g: Option<Generator<T>>) -> Option<Generator<T>> {
    if d.is_zero() {
        return None;
    }
    let deadline = Instant::now() + d;
    g.map(|inner| Generator::new(TimeLimit { inner, deadline }))
}

impl<T: Payload> TimeLimit<T> {
    fn carry(&self, rest: Option<Generator<T>>) -> Option<Generator<T>> {
        rest.map(|inner| {
            Generator::new(TimeLimit {
                inner,
                deadline: self.deadline,
            })
        })
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

#[async_trait]
impl<T: Payload> Node<T> for TimeLimit<T> {
    fn update(&self, _this: &Generator<T>, ctx: &Context) -> Option<Generator<T>> {
        if self.is_expired() {
            return None;
        }
        self.carry(self.inner.update(ctx))
    }

    async fn next(&self, this: &Generator<T>, ctx: &Context) -> Step<T> {
        if ctx.is_done() {
            return (Value::Pending, Some(this.clone()));
        }
        if self.is_expired() {
            tracing::debug!("time limit expired");
            return (Value::StopIteration, None);
        }

        let (value, rest) = self.inner.next(&ctx.with_deadline(self.deadline)).await;
        if value.is_pending() && self.is_expired() && !ctx.is_done() {
            tracing::debug!("time limit expired while waiting");
            return (Value::StopIteration, None);
        }
        (value, self.carry(rest))
    }

    fn name(&self) -> &'static str {
        "time_limit"
    }
}
