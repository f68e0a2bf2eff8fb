//! Weighted random choice between generators.
//!
//! Each step picks one eligible branch with probability proportional to its
//! weight, advances it, and keeps its continuation at the same weight.
//! Exhausted branches are removed for good.

use async_trait::async_trait;
use sg_core::{Context, Generator, Node, Payload, Step, Value};

/// A generator with a selection weight.
#[derive(Debug, Clone)]
pub struct Branch<T: Payload> {
    /// The branch's generator; `None` is never selected.
    pub generator: Option<Generator<T>>,
    /// Relative weight; only finite positive weights are ever selected.
    pub weight: f64,
}

impl<T: Payload> Branch<T> {
    /// Pair a generator with a weight.
    #[must_use]
    pub fn new(weight: f64, generator: Option<Generator<T>>) -> Self {
        Self { generator, weight }
    }

    /// True if this branch can be selected.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.generator.is_some() && self.weight.is_finite() && self.weight > 0.0
    }
}

struct Weighted<T: Payload> {
    generator: Generator<T>,
    weight: f64,
}

impl<T: Payload> Clone for Weighted<T> {
    fn clone(&self) -> Self {
        Self {
            generator: self.generator.clone(),
            weight: self.weight,
        }
    }
}

struct Choices<T: Payload> {
    branches: Vec<Weighted<T>>,
}

/// Weighted random choice over `branches`.
///
/// Ineligible branches (nil, zero, negative, or non-finite weight) are
/// dropped up front. The result is always a live generator: with no
/// eligible branch it is an empty choice whose first step yields
/// `(StopIteration, None)`, so callers can hold it like any other node.
/// Exhaustion mid-run returns `None` as usual.
#[must_use]
pub fn choices<T: Payload>(branches: impl IntoIterator<Item = Branch<T>>) -> Generator<T> {
    let branches = branches
        .into_iter()
        .filter(Branch::is_eligible)
        .filter_map(|b| {
            b.generator.map(|generator| Weighted {
                generator,
                weight: b.weight,
            })
        })
        .collect();
    Generator::new(Choices { branches })
}

impl<T: Payload> Choices<T> {
    fn build(branches: Vec<Weighted<T>>) -> Option<Generator<T>> {
        (!branches.is_empty()).then(|| Generator::new(Choices { branches }))
    }

    /// Total weight to draw below and the factor applied to every weight.
    ///
    /// Weights whose sum overflows are rescaled by the largest one.
    fn weight_sum(&self) -> (f64, f64) {
        let sum: f64 = self.branches.iter().map(|b| b.weight).sum();
        if sum.is_finite() {
            return (sum, 1.0);
        }
        let scale = 1.0 / self.branches.iter().map(|b| b.weight).fold(0.0, f64::max);
        let scaled_sum = self.branches.iter().map(|b| b.weight * scale).sum();
        (scaled_sum, scale)
    }

    /// Index of the branch whose cumulative scaled weight first exceeds `r`.
    fn select(&self, r: f64, scale: f64) -> usize {
        let mut remaining = r;
        for (index, branch) in self.branches.iter().enumerate() {
            remaining -= branch.weight * scale;
            if remaining < 0.0 {
                return index;
            }
        }
        // Float rounding can leave `remaining` at a hair above zero.
        self.branches.len() - 1
    }
}

#[async_trait]
impl<T: Payload> Node<T> for Choices<T> {
    fn update(&self, _this: &Generator<T>, ctx: &Context) -> Option<Generator<T>> {
        let branches = self
            .branches
            .iter()
            .filter_map(|b| {
                b.generator.update(ctx).map(|generator| Weighted {
                    generator,
                    weight: b.weight,
                })
            })
            .collect();
        Choices::build(branches)
    }

    async fn next(&self, _this: &Generator<T>, ctx: &Context) -> Step<T> {
        if self.branches.is_empty() {
            return (Value::StopIteration, None);
        }

        let (weight_sum, scale) = self.weight_sum();
        let r = ctx.with_rng_mut(|rng| rng.below_f64(weight_sum));
        let index = self.select(r, scale);

        let (value, rest) = self.branches[index].generator.next(ctx).await;

        let mut branches = self.branches.clone();
        match rest {
            Some(generator) => branches[index].generator = generator,
            None => {
                branches.remove(index);
                tracing::trace!(index, remaining = branches.len(), "choices branch exhausted");
            }
        }
        (value, Choices::build(branches))
    }

    fn name(&self) -> &'static str {
        "choices"
    }
}
