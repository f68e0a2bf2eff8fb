//! Primitive constructors.
//!
//! | Constructor | Shape | Continuation |
//! |-------------|-------|--------------|
//! | [`none`] | nothing | - |
//! | [`some`] | literal value | `None` after one step |
//! | [`from_fn`] | `Fn() -> T` | itself, forever |
//! | [`from_fn_ctx`] | `Fn(&Context) -> T` | itself, forever |
//! | [`from_source`], [`from_channel`] | external source | itself until closed |
//!
//! The shape is fixed by which constructor is called; `next` dispatches on a
//! tagged variant and never inspects the payload.

use std::sync::Arc;

use async_trait::async_trait;
use sg_core::{ChannelSource, Context, Generator, Node, Payload, Polled, Source, Step, Value};
use tokio::sync::mpsc;

enum Primitive<T: Payload> {
    Literal(T),
    Thunk(Box<dyn Fn() -> T + Send + Sync>),
    WithContext(Box<dyn Fn(&Context) -> T + Send + Sync>),
    Source(Arc<dyn Source<T>>),
}

/// The exhausted generator.
#[must_use]
pub fn none<T: Payload>() -> Option<Generator<T>> {
    None
}

/// Single-shot literal: yields `value` once, then exhausts.
///
/// Any payload type is accepted, callables included; a literal is never
/// invoked.
#[must_use]
pub fn some<T: Payload>(value: T) -> Option<Generator<T>> {
    Some(Generator::new(Primitive::Literal(value)))
}

/// Infinite generator calling `f` once per step.
///
/// The continuation is the same handle every time, so unbounded
/// consumption allocates nothing per step.
#[must_use]
pub fn from_fn<T: Payload>(f: impl Fn() -> T + Send + Sync + 'static) -> Option<Generator<T>> {
    Some(Generator::new(Primitive::Thunk(Box::new(f))))
}

/// Like [`from_fn`], with the step's context passed to `f`.
#[must_use]
pub fn from_fn_ctx<T: Payload>(
    f: impl Fn(&Context) -> T + Send + Sync + 'static,
) -> Option<Generator<T>> {
    Some(Generator::new(Primitive::WithContext(Box::new(f))))
}

/// Generator reading an external source until it closes.
#[must_use]
pub fn from_source<T: Payload>(source: impl Source<T> + 'static) -> Option<Generator<T>> {
    Some(Generator::new(Primitive::Source(Arc::new(source))))
}

/// Generator reading a tokio mpsc channel until every sender is dropped.
#[must_use]
pub fn from_channel<T: Payload>(rx: mpsc::Receiver<T>) -> Option<Generator<T>> {
    from_source(ChannelSource::new(rx))
}

#[async_trait]
impl<T: Payload> Node<T> for Primitive<T> {
    fn update(&self, this: &Generator<T>, _ctx: &Context) -> Option<Generator<T>> {
        Some(this.clone())
    }

    async fn next(&self, this: &Generator<T>, ctx: &Context) -> Step<T> {
        match self {
            Primitive::Literal(x) => (Value::Item(x.clone()), None),
            Primitive::Thunk(f) => (Value::Item(f()), Some(this.clone())),
            Primitive::WithContext(f) => (Value::Item(f(ctx)), Some(this.clone())),
            Primitive::Source(source) => receive(source.as_ref(), this, ctx).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Primitive::Literal(_) => "some",
            Primitive::Thunk(_) => "fn",
            Primitive::WithContext(_) => "fn_ctx",
            Primitive::Source(_) => "source",
        }
    }
}

async fn receive<T: Payload>(source: &dyn Source<T>, this: &Generator<T>, ctx: &Context) -> Step<T> {
    if ctx.is_done() {
        return (Value::Pending, Some(this.clone()));
    }

    let received = match source.try_recv() {
        Polled::Ready(x) => Some(x),
        Polled::Closed => None,
        Polled::Empty => {
            tokio::select! {
                biased;
                () = ctx.done() => return (Value::Pending, Some(this.clone())),
                received = source.recv() => received,
            }
        }
    };

    match received {
        Some(x) => (Value::Item(x), Some(this.clone())),
        None => {
            tracing::debug!("source closed");
            (Value::StopIteration, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::testing::{exhaust_items, test_context};

    #[test]
    fn test_none() {
        assert!(none::<i32>().is_none());
    }

    #[tokio::test]
    async fn test_some_is_single_shot() {
        let ctx = test_context();
        let g = some(42).unwrap();

        let (x, rest) = g.next(&ctx).await;
        assert_eq!(x, Value::Item(42));
        assert!(rest.is_none());
    }

    #[tokio::test]
    async fn test_from_fn_is_fixed_point() {
        let ctx = test_context();
        let g = from_fn(|| 42).unwrap();

        let mut current = g.clone();
        for _ in 0..5 {
            let (x, rest) = current.next(&ctx).await;
            assert_eq!(x, Value::Item(42));
            let rest = rest.expect("from_fn never exhausts");
            assert!(rest.ptr_eq(&g));
            current = rest;
        }
    }

    #[tokio::test]
    async fn test_from_fn_calls_once_per_step() {
        let ctx = test_context();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let g = from_fn(move || counter.fetch_add(1, Ordering::SeqCst)).unwrap();

        let (a, _) = g.next(&ctx).await;
        let (b, _) = g.next(&ctx).await;
        assert_eq!((a, b), (Value::Item(0), Value::Item(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_from_fn_ctx_sees_context() {
        let ctx = test_context();
        let g = from_fn_ctx(|ctx: &Context| ctx.seed()).unwrap();

        let (x, rest) = g.next(&ctx).await;
        assert_eq!(x, Value::Item(ctx.seed()));
        assert!(rest.unwrap().ptr_eq(&g));
    }

    #[tokio::test]
    async fn test_callable_literal_is_never_invoked() {
        let ctx = test_context();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let add_one: Arc<dyn Fn(i32) -> i32 + Send + Sync> = Arc::new(move |x| {
            counter.fetch_add(1, Ordering::SeqCst);
            x + 1
        });

        let (x, rest) = some(add_one).unwrap().next(&ctx).await;
        assert!(rest.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let f = x.item().expect("the callable itself is the payload");
        assert_eq!(f(1), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_channel_drains_then_closes() {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            for i in 1..=3 {
                tx.send(i).await.unwrap();
            }
        });

        assert_eq!(exhaust_items(from_channel(rx)).await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_channel_cancelled_wait_is_pending() {
        let (tx, rx) = mpsc::channel(4);
        let g = from_channel(rx).unwrap();

        let (cancelled, cancel) = test_context().with_cancel();
        cancel.cancel();
        tx.send(7).await.unwrap();

        // Cancelled: no progress, nothing consumed, same handle back.
        let (x, rest) = g.next(&cancelled).await;
        assert!(x.is_pending());
        assert!(rest.unwrap().ptr_eq(&g));

        let (x, rest) = g.next(&test_context()).await;
        assert_eq!(x, Value::Item(7));
        assert!(rest.is_some());
    }

    #[tokio::test]
    async fn test_channel_cancel_while_waiting() {
        let (_tx, rx) = mpsc::channel::<i32>(4);
        let g = from_channel(rx).unwrap();
        let (ctx, cancel) = test_context().with_cancel();

        let waiter = tokio::spawn(async move { g.next(&ctx).await });
        tokio::task::yield_now().await;
        cancel.cancel();

        let (x, rest) = waiter.await.unwrap();
        assert!(x.is_pending());
        assert!(rest.is_some());
    }
}
