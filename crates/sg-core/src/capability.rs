//! Adapters for external sources and timers.
//!
//! The algebra never owns channels or timers. It polls them through two
//! capability traits, each exposing a non-blocking poll plus an awaitable
//! wait that the caller races against cancellation:
//!
//! | Trait | Poll | Wait | Adapters |
//! |-------|------|------|----------|
//! | [`Source`] | `try_recv` | `recv` | [`ChannelSource`] |
//! | [`Timer`] | `try_fire` | `wait` | [`Delay`], [`Ticker`] |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::sync::Mutex;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::context::Context;

/// Outcome of a non-blocking poll of a [`Source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polled<T> {
    /// An item was available and has been taken.
    Ready(T),
    /// Nothing available right now.
    Empty,
    /// The source is closed and drained.
    Closed,
}

/// A channel-like stream of items owned by the environment.
#[async_trait]
pub trait Source<T>: Send + Sync {
    /// Take an item if one is available, without waiting.
    fn try_recv(&self) -> Polled<T>;

    /// Wait for the next item; `None` once the source is closed.
    ///
    /// Must be cancel-safe: dropping the future must not lose an item.
    async fn recv(&self) -> Option<T>;
}

/// [`Source`] over a tokio mpsc receiver.
///
/// The receiver sits behind an async mutex so the source can be shared by
/// every continuation of the generator reading it.
#[derive(Debug)]
pub struct ChannelSource<T> {
    rx: Mutex<mpsc::Receiver<T>>,
}

impl<T> ChannelSource<T> {
    /// Wrap a receiver.
    #[must_use]
    pub fn new(rx: mpsc::Receiver<T>) -> Self {
        Self { rx: Mutex::new(rx) }
    }
}

#[async_trait]
impl<T: Send + 'static> Source<T> for ChannelSource<T> {
    fn try_recv(&self) -> Polled<T> {
        let Ok(mut rx) = self.rx.try_lock() else {
            return Polled::Empty;
        };
        match rx.try_recv() {
            Ok(x) => Polled::Ready(x),
            Err(TryRecvError::Empty) => Polled::Empty,
            Err(TryRecvError::Disconnected) => Polled::Closed,
        }
    }

    async fn recv(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }
}

/// A timer gating one step of a paced generator.
#[async_trait]
pub trait Timer: Send + Sync {
    /// Non-blocking check. Returns true if the timer has fired; for
    /// repeating timers this consumes the tick.
    fn try_fire(&self) -> bool;

    /// Wait until the timer fires.
    ///
    /// Must be cancel-safe: waiting again after a dropped wait resumes the
    /// same timer.
    async fn wait(&self);
}

/// Creates the timer for the next paced step.
pub type TimerFactory = Arc<dyn Fn(&Context) -> Arc<dyn Timer> + Send + Sync>;

/// One-shot timer firing at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct Delay {
    at: Instant,
}

impl Delay {
    /// Fire at `at`.
    #[must_use]
    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    /// Fire `delay` from now.
    #[must_use]
    pub fn after(delay: Duration) -> Self {
        Self::at(Instant::now() + delay)
    }

    /// The firing instant.
    #[must_use]
    pub fn instant(&self) -> Instant {
        self.at
    }
}

#[async_trait]
impl Timer for Delay {
    fn try_fire(&self) -> bool {
        Instant::now() >= self.at
    }

    async fn wait(&self) {
        tokio::time::sleep_until(self.at).await;
    }
}

/// Repeating timer shared by every step that uses it.
///
/// Missed ticks are skipped rather than delivered in a burst.
#[derive(Debug)]
pub struct Ticker {
    interval: Mutex<Interval>,
}

impl Ticker {
    /// Tick every `period`, starting one period from now.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        debug_assert!(!period.is_zero(), "Ticker period must be positive");

        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval: Mutex::new(interval),
        }
    }

    /// Factory handing out this same ticker for every step.
    #[must_use]
    pub fn factory(self: Arc<Self>) -> TimerFactory {
        Arc::new(move |_ctx: &Context| -> Arc<dyn Timer> { Arc::clone(&self) as Arc<dyn Timer> })
    }
}

#[async_trait]
impl Timer for Ticker {
    fn try_fire(&self) -> bool {
        let Ok(mut interval) = self.interval.try_lock() else {
            return false;
        };
        interval.tick().now_or_never().is_some()
    }

    async fn wait(&self) {
        self.interval.lock().await.tick().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_source_polls() {
        let (tx, rx) = mpsc::channel(4);
        let source = ChannelSource::new(rx);

        assert_eq!(source.try_recv(), Polled::Empty);
        tx.send(7).await.unwrap();
        assert_eq!(source.try_recv(), Polled::Ready(7));

        drop(tx);
        assert_eq!(source.try_recv(), Polled::Closed);
        assert_eq!(source.recv().await, None);
    }

    #[tokio::test]
    async fn test_channel_source_recv_after_dropped_wait() {
        let (tx, rx) = mpsc::channel(4);
        let source = ChannelSource::new(rx);

        // A wait abandoned before anything arrives must not eat the item.
        assert!(source.recv().now_or_never().is_none());
        tx.send(1).await.unwrap();
        assert_eq!(source.recv().await, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_fires_at_instant() {
        let delay = Delay::after(Duration::from_millis(5));
        assert!(!delay.try_fire());

        delay.wait().await;
        assert!(delay.try_fire());
        assert!(Instant::now() >= delay.instant());

        // A fired delay stays fired.
        delay.wait().await;
        assert!(delay.try_fire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_ticks_each_period() {
        let ticker = Ticker::new(Duration::from_millis(2));
        let start = Instant::now();

        assert!(!ticker.try_fire());
        for _ in 0..5 {
            ticker.wait().await;
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(10) && elapsed < Duration::from_millis(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_factory_shares_one_ticker() {
        let ticker = Arc::new(Ticker::new(Duration::from_millis(1)));
        let factory = Arc::clone(&ticker).factory();
        let ctx = Context::new(12345);

        let a = factory(&ctx);
        let b = factory(&ctx);
        a.wait().await;
        // `b` is the same ticker, so its next tick is one period later.
        let before = Instant::now();
        b.wait().await;
        assert!(before.elapsed() >= Duration::from_millis(1));
    }
}
