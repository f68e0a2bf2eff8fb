//! The context threaded through every `next`/`update` call.
//!
//! A [`Context`] carries three things from the calling environment:
//! - a cancellation signal (fired through a [`CancelHandle`]),
//! - an optional deadline, after which the context counts as done,
//! - the seeded randomness shared by every randomized combinator.
//!
//! Clones share the same randomness stream, so one seed reproduces a whole
//! generator tree no matter how many derived contexts it passes through.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};
use sg_dst::DeterministicRng;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::GenConfig;
use crate::error::ConfigError;

/// Cancellation, deadline, and randomness carrier.
#[derive(Debug, Clone)]
pub struct Context {
    cancels: Vec<watch::Receiver<bool>>,
    deadline: Option<Instant>,
    rng: Arc<Mutex<DeterministicRng>>,
}

/// Fires the cancellation signal of the context it was created with.
///
/// Dropping the handle without calling [`CancelHandle::cancel`] leaves the
/// context live forever.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Fire the signal. Idempotent.
    pub fn cancel(&self) {
        let was_cancelled = self.tx.send_replace(true);
        if !was_cancelled {
            tracing::debug!(receivers = self.tx.receiver_count(), "context cancelled");
        }
    }

    /// True once `cancel` has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Context {
    /// Create a live context with its own seeded randomness.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::from_rng(DeterministicRng::new(seed))
    }

    /// Create a live context around an existing RNG.
    #[must_use]
    pub fn from_rng(rng: DeterministicRng) -> Self {
        Self {
            cancels: Vec::new(),
            deadline: None,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// Create a live context seeded from `SG_SEED`, or randomly.
    #[must_use]
    pub fn background() -> Self {
        Self::new(sg_dst::get_or_generate_seed())
    }

    /// Create a context from configuration.
    ///
    /// Uses the configured seed if present, otherwise `SG_SEED` or a random
    /// seed, and applies the configured timeout as a deadline from now.
    pub fn from_config(config: &GenConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(sg_dst::get_or_generate_seed);
        let ctx = Self::new(seed);
        tracing::debug!(seed, timeout = ?config.timeout, "context created from config");
        Ok(match config.timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        })
    }

    /// Derive a cancellable child context.
    ///
    /// The child is done when either it or any ancestor is cancelled.
    #[must_use]
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let mut child = self.clone();
        child.cancels.push(rx);
        (child, CancelHandle { tx: Arc::new(tx) })
    }

    /// Derive a child context with a deadline.
    ///
    /// An existing earlier deadline wins.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut child = self.clone();
        child.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        child
    }

    /// Derive a child context whose deadline is `timeout` from now.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The effective deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True if any cancellation signal in the chain has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancels.iter().any(|rx| *rx.borrow())
    }

    /// True if cancelled or past the deadline. Never blocks.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolve once the context is done.
    ///
    /// Never resolves for a context with no cancellation chain and no
    /// deadline. Cancel-safe: dropping the future has no effect.
    pub async fn done(&self) {
        if self.is_done() {
            return;
        }

        let cancelled = self.cancelled();
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = cancelled => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => cancelled.await,
        }
    }

    fn cancelled(&self) -> BoxFuture<'static, ()> {
        if self.cancels.is_empty() {
            return future::pending().boxed();
        }

        let waits: Vec<BoxFuture<'static, ()>> = self
            .cancels
            .iter()
            .cloned()
            .map(|rx| wait_cancelled(rx).boxed())
            .collect();
        future::select_all(waits).map(|_| ()).boxed()
    }

    /// Run `f` with exclusive access to the shared RNG.
    ///
    /// The lock is held only for the duration of `f`.
    pub fn with_rng_mut<R>(&self, f: impl FnOnce(&mut DeterministicRng) -> R) -> R {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    /// Seed of the shared RNG.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.with_rng_mut(|rng| rng.seed())
    }
}

async fn wait_cancelled(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        let closed = rx.changed().await.is_err();
        if closed {
            // Handle dropped without cancelling: never fires.
            future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_context_is_live() {
        let ctx = Context::new(12345);
        assert!(!ctx.is_cancelled());
        assert!(!ctx.is_done());
        assert!(ctx.deadline().is_none());
        assert_eq!(ctx.seed(), 12345);
    }

    #[tokio::test]
    async fn test_cancel_marks_done() {
        let (ctx, cancel) = Context::new(12345).with_cancel();
        assert!(!ctx.is_done());

        cancel.cancel();
        assert!(cancel.is_cancelled());
        assert!(ctx.is_done());
        ctx.done().await;
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let (ctx, cancel) = Context::new(12345).with_cancel();
        let other = cancel.clone();

        cancel.cancel();
        other.cancel();
        cancel.cancel();
        assert!(other.is_cancelled());
        assert!(ctx.is_done());
        ctx.done().await;
    }

    #[tokio::test]
    async fn test_parent_cancel_reaches_child() {
        let (parent, cancel) = Context::new(12345).with_cancel();
        let (child, _child_cancel) = parent.with_cancel();

        let waiter = tokio::spawn(async move { child.done().await });
        cancel.cancel();
        waiter.await.unwrap();
        assert!(parent.is_done());
    }

    #[tokio::test]
    async fn test_child_cancel_does_not_reach_parent() {
        let (parent, _cancel) = Context::new(12345).with_cancel();
        let (child, child_cancel) = parent.with_cancel();

        child_cancel.cancel();
        assert!(child.is_done());
        assert!(!parent.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_marks_done() {
        let ctx = Context::new(12345).with_timeout(Duration::from_millis(10));
        assert!(!ctx.is_done());

        let started = Instant::now();
        ctx.done().await;
        assert!(ctx.is_done());
        assert!(started.elapsed() >= Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_earlier_deadline_wins() {
        let ctx = Context::new(12345).with_timeout(Duration::from_millis(5));
        let later = ctx.with_timeout(Duration::from_secs(60));
        assert_eq!(later.deadline(), ctx.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_never_fires() {
        let (ctx, cancel) = Context::new(12345).with_cancel();
        drop(cancel);

        let fired = tokio::time::timeout(Duration::from_secs(1), ctx.done()).await;
        assert!(fired.is_err(), "done() must stay pending");
        assert!(!ctx.is_done());
    }

    #[tokio::test]
    async fn test_clones_share_rng() {
        let a = Context::new(42);
        let (b, _cancel) = a.with_cancel();

        let mut reference = DeterministicRng::new(42);
        let first = reference.index(1000);
        let second = reference.index(1000);

        assert_eq!(a.with_rng_mut(|rng| rng.index(1000)), first);
        assert_eq!(b.with_rng_mut(|rng| rng.index(1000)), second);
    }

    #[tokio::test]
    async fn test_from_config() {
        let config = GenConfig {
            seed: Some(99),
            ..GenConfig::default()
        };
        let ctx = Context::from_config(&config).unwrap();
        assert_eq!(ctx.seed(), 99);
        assert!(ctx.deadline().is_none());

        let timed = GenConfig {
            seed: Some(99),
            timeout: Some(Duration::from_secs(1)),
            ..GenConfig::default()
        };
        assert!(Context::from_config(&timed).unwrap().deadline().is_some());

        let bad = GenConfig {
            seed: Some(0),
            ..GenConfig::default()
        };
        assert!(matches!(
            Context::from_config(&bad),
            Err(ConfigError::ZeroSeed)
        ));
    }
}
