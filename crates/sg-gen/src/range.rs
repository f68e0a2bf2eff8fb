//! Arithmetic progressions over `i64` and `f64`.
//!
//! Ranges are half-open: `start` is included, `stop` never is. A step of
//! zero repeats `start` forever. A step pointing away from `stop` yields
//! nothing. Overflow ends the range.

use async_trait::async_trait;
use sg_core::{Context, Generator, Node, Payload, Step, Value};

use crate::from_fn;

trait Numeric: Payload + Copy + PartialOrd {
    const ZERO: Self;

    /// `self + step`, or `None` if the sum is not representable.
    fn checked_step(self, step: Self) -> Option<Self>;

    fn is_valid(self) -> bool;
}

impl Numeric for i64 {
    const ZERO: Self = 0;

    fn checked_step(self, step: Self) -> Option<Self> {
        self.checked_add(step)
    }

    fn is_valid(self) -> bool {
        true
    }
}

impl Numeric for f64 {
    const ZERO: Self = 0.0;

    fn checked_step(self, step: Self) -> Option<Self> {
        let sum = self + step;
        (sum.is_finite() && sum != self).then_some(sum)
    }

    fn is_valid(self) -> bool {
        !self.is_nan()
    }
}

struct Range<N: Numeric> {
    current: N,
    stop: N,
    step: N,
}

fn in_range<N: Numeric>(current: N, stop: N, step: N) -> bool {
    if step > N::ZERO {
        current < stop
    } else {
        current > stop
    }
}

fn range<N: Numeric>(start: N, stop: N, step: N) -> Option<Generator<N>> {
    if !(start.is_valid() && stop.is_valid() && step.is_valid()) || start == stop {
        return None;
    }
    if step == N::ZERO {
        return from_fn(move || start);
    }
    in_range(start, stop, step).then(|| {
        Generator::new(Range {
            current: start,
            stop,
            step,
        })
    })
}

#[async_trait]
impl<N: Numeric> Node<N> for Range<N> {
    fn update(&self, this: &Generator<N>, _ctx: &Context) -> Option<Generator<N>> {
        Some(this.clone())
    }

    async fn next(&self, _this: &Generator<N>, _ctx: &Context) -> Step<N> {
        let rest = self
            .current
            .checked_step(self.step)
            .filter(|&next| in_range(next, self.stop, self.step))
            .map(|next| {
                Generator::new(Range {
                    current: next,
                    stop: self.stop,
                    step: self.step,
                })
            });
        (Value::Item(self.current), rest)
    }

    fn name(&self) -> &'static str {
        "range"
    }
}

/// `start, start + step, ...` while short of `stop`.
#[must_use]
pub fn range_i64(start: i64, stop: i64, step: i64) -> Option<Generator<i64>> {
    range(start, stop, step)
}

/// `start, start + 1, ...` up to `i64::MAX` (exclusive).
#[must_use]
pub fn range_from_i64(start: i64) -> Option<Generator<i64>> {
    range(start, i64::MAX, 1)
}

/// `start, start + step, ...` while short of `stop`.
///
/// Any NaN argument yields `None`.
#[must_use]
pub fn range_f64(start: f64, stop: f64, step: f64) -> Option<Generator<f64>> {
    range(start, stop, step)
}

/// `start, start + 1.0, ...` up to `f64::MAX` (exclusive).
#[must_use]
pub fn range_from_f64(start: f64) -> Option<Generator<f64>> {
    range(start, f64::MAX, 1.0)
}
