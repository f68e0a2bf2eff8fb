//! Pacing: gate every step of a generator behind a timer.
//!
//! The timer for a step is created before the step starts waiting and
//! survives a cancelled wait, so retrying after `Pending` resumes the same
//! delay rather than starting a new one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sg_core::{Context, Delay, Generator, Node, Payload, Step, Timer, TimerFactory, Value};
use tokio::time::Instant;

/// Granularity of the runtime's timer wheel: a sleep wakes up to this much
/// after its deadline.
const TIMER_RESOLUTION: Duration = Duration::from_millis(1);

enum Pace {
    /// Caller-supplied timers.
    Timers(TimerFactory),
    /// Delays uniform in `[0, bound)`, chained from the previous deadline.
    Uniform { bound: Duration },
}

#[derive(Clone)]
struct Armed {
    timer: Arc<dyn Timer>,
    /// Firing instant, when the pace knows it
    target: Option<Instant>,
}

impl Pace {
    fn arm(&self, ctx: &Context, previous: Option<Instant>) -> Armed {
        match self {
            Pace::Timers(factory) => Armed {
                timer: factory(ctx),
                target: None,
            },
            Pace::Uniform { bound } => {
                let now = Instant::now();
                // Late wake-ups within the timer resolution do not push the
                // schedule back; a consumer slower than that restarts from now.
                let anchor = match previous {
                    Some(previous) => previous.max(now.checked_sub(TIMER_RESOLUTION).unwrap_or(now)),
                    None => now,
                };
                let target = anchor + ctx.with_rng_mut(|rng| rng.duration_below(*bound));
                Armed {
                    timer: Arc::new(Delay::at(target)),
                    target: Some(target),
                }
            }
        }
    }
}

struct Stagger<T: Payload> {
    inner: Generator<T>,
    armed: Option<Armed>,
    pace: Arc<Pace>,
}

fn paced<T: Payload>(pace: Pace, g: Option<Generator<T>>) -> Option<Generator<T>> {
    let pace = Arc::new(pace);
    g.map(|inner| {
        Generator::new(Stagger {
            inner,
            armed: None,
            pace,
        })
    })
}

/// Wait for a timer from `factory` before each step of `g`.
///
/// A nil `g` yields `None`; no factory leaves `g` unpaced.
#[must_use]
pub fn stagger_fn<T: Payload>(
    factory: Option<TimerFactory>,
    g: Option<Generator<T>>,
) -> Option<Generator<T>> {
    match factory {
        Some(factory) => paced(Pace::Timers(factory), g),
        None => g,
    }
}

/// Wait a random delay before each step of `g`.
///
/// Delays are uniform in `[0, 2d)`, drawn from the context's RNG, so the
/// mean rate is one step per `d`. Each delay runs from the previous
/// deadline, so timer rounding does not slow the rate. A zero `d` leaves
/// `g` unpaced.
#[must_use]
pub fn stagger<T: Payload>(d: Duration, g: Option<Generator<T>>) -> Option<Generator<T>> {
    if d.is_zero() {
        return g;
    }
    paced(
        Pace::Uniform {
            bound: d.saturating_mul(2),
        },
        g,
    )
}

impl<T: Payload> Stagger<T> {
    fn with_armed(&self, inner: Generator<T>, armed: Armed) -> Generator<T> {
        Generator::new(Stagger {
            inner,
            armed: Some(armed),
            pace: Arc::clone(&self.pace),
        })
    }
}

#[async_trait]
impl<T: Payload> Node<T> for Stagger<T> {
    fn update(&self, _this: &Generator<T>, ctx: &Context) -> Option<Generator<T>> {
        let inner = self.inner.update(ctx)?;
        Some(Generator::new(Stagger {
            inner,
            armed: self.armed.clone(),
            pace: Arc::clone(&self.pace),
        }))
    }

    async fn next(&self, this: &Generator<T>, ctx: &Context) -> Step<T> {
        if ctx.is_done() {
            return (Value::Pending, Some(this.clone()));
        }

        let armed = match &self.armed {
            Some(armed) => armed.clone(),
            None => self.pace.arm(ctx, None),
        };
        if !armed.timer.try_fire() {
            tokio::select! {
                biased;
                () = ctx.done() => {
                    return (Value::Pending, Some(self.with_armed(self.inner.clone(), armed)));
                }
                () = armed.timer.wait() => {}
            }
        }

        let (value, rest) = self.inner.next(ctx).await;
        let rest = rest.map(|inner| self.with_armed(inner, self.pace.arm(ctx, armed.target)));
        (value, rest)
    }

    fn name(&self) -> &'static str {
        "stagger"
    }
}
