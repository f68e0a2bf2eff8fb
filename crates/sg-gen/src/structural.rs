//! Structural combinators: concatenation, interleaving, cycling.
//!
//! | Combinator | Order |
//! |------------|-------|
//! | [`cons`], [`seq`] | Deterministic, left to right |
//! | [`mix`] | Random across branches, preserved within each branch |
//! | [`repeat`] | The source's order, replayed forever |

use async_trait::async_trait;
use sg_core::{update_all, wrap_all_non_nil, Context, Generator, Node, Payload, Step};

struct Cons<T: Payload> {
    head: Generator<T>,
    tail: Generator<T>,
}

/// Drain `head`, then continue with `tail`.
///
/// A nil side collapses to the other, so `cons` is associative: any
/// bracketing of the same operands yields the same sequence.
#[must_use]
pub fn cons<T: Payload>(head: Option<Generator<T>>, tail: Option<Generator<T>>) -> Option<Generator<T>> {
    match (head, tail) {
        (None, tail) => tail,
        (head, None) => head,
        (Some(head), Some(tail)) => Some(Generator::new(Cons { head, tail })),
    }
}

#[async_trait]
impl<T: Payload> Node<T> for Cons<T> {
    fn update(&self, _this: &Generator<T>, ctx: &Context) -> Option<Generator<T>> {
        cons(self.head.update(ctx), self.tail.update(ctx))
    }

    async fn next(&self, _this: &Generator<T>, ctx: &Context) -> Step<T> {
        let (value, rest) = self.head.next(ctx).await;
        (value, cons(rest, Some(self.tail.clone())))
    }

    fn name(&self) -> &'static str {
        "cons"
    }
}

/// Concatenate operands left to right, skipping nil ones.
///
/// Empty or all-nil input yields `None`. An operand that is itself a `seq`
/// contributes its elements in place.
#[must_use]
pub fn seq<T: Payload>(operands: impl IntoIterator<Item = Option<Generator<T>>>) -> Option<Generator<T>> {
    wrap_all_non_nil(operands)
        .into_iter()
        .rev()
        .fold(None, |tail, head| cons(Some(head), tail))
}

struct Mix<T: Payload> {
    branches: Vec<Generator<T>>,
}

impl<T: Payload> Mix<T> {
    fn build(branches: Vec<Generator<T>>) -> Option<Generator<T>> {
        (!branches.is_empty()).then(|| Generator::new(Mix { branches }))
    }
}

/// Interleave operands randomly.
///
/// Each step picks one live branch uniformly, advances it, and adopts its
/// continuation (or drops the branch once exhausted). Empty or all-nil
/// input yields `None`.
#[must_use]
pub fn mix<T: Payload>(operands: impl IntoIterator<Item = Option<Generator<T>>>) -> Option<Generator<T>> {
    Mix::build(wrap_all_non_nil(operands))
}

#[async_trait]
impl<T: Payload> Node<T> for Mix<T> {
    fn update(&self, _this: &Generator<T>, ctx: &Context) -> Option<Generator<T>> {
        Mix::build(update_all(ctx, &self.branches))
    }

    async fn next(&self, _this: &Generator<T>, ctx: &Context) -> Step<T> {
        debug_assert!(!self.branches.is_empty(), "Mix must have a live branch");

        let index = ctx.with_rng_mut(|rng| rng.index(self.branches.len()));
        let (value, rest) = self.branches[index].next(ctx).await;

        let mut branches = self.branches.clone();
        match rest {
            Some(rest) => branches[index] = rest,
            None => {
                branches.remove(index);
                tracing::trace!(index, remaining = branches.len(), "mix branch exhausted");
            }
        }
        (value, Mix::build(branches))
    }

    fn name(&self) -> &'static str {
        "mix"
    }
}

struct Repeat<T: Payload> {
    original: Generator<T>,
    active: Generator<T>,
    /// Whether the current cycle has emitted anything but `StopIteration`
    productive: bool,
}

/// Replay `g` forever.
///
/// When the active pass exhausts, the next pass starts again from the
/// original handle. `repeat(None)` is `None`, and a pass that ends without
/// emitting anything but `StopIteration` ends the repetition too, so a
/// spent source is never spun on.
#[must_use]
pub fn repeat<T: Payload>(g: Option<Generator<T>>) -> Option<Generator<T>> {
    g.map(|original| {
        Generator::new(Repeat {
            active: original.clone(),
            original,
            productive: false,
        })
    })
}

#[async_trait]
impl<T: Payload> Node<T> for Repeat<T> {
    fn update(&self, _this: &Generator<T>, ctx: &Context) -> Option<Generator<T>> {
        let (active, productive) = match self.active.update(ctx) {
            Some(active) => (active, self.productive),
            None => {
                self.original.update(ctx)?;
                (self.original.clone(), false)
            }
        };
        Some(Generator::new(Repeat {
            original: self.original.clone(),
            active,
            productive,
        }))
    }

    async fn next(&self, _this: &Generator<T>, ctx: &Context) -> Step<T> {
        let (value, rest) = self.active.next(ctx).await;
        let productive = self.productive || !value.is_stop_iteration();

        let (active, productive) = match rest {
            Some(active) => (active, productive),
            None if productive => (self.original.clone(), false),
            None => {
                tracing::debug!("repeat pass produced nothing; stopping");
                return (value, None);
            }
        };
        let continuation = Generator::new(Repeat {
            original: self.original.clone(),
            active,
            productive,
        });
        (value, Some(continuation))
    }

    fn name(&self) -> &'static str {
        "repeat"
    }
}
