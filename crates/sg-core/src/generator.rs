//! The generator contract.
//!
//! A [`Generator`] is an immutable handle to "the rest of a sequence".
//! Advancing it never mutates it: [`Generator::next`] returns the produced
//! value together with a new handle for what remains, or `None` once the
//! sequence is permanently exhausted. `Option<Generator<T>>` is therefore
//! the full generator type; `None` is the nil generator.
//!
//! Handles are reference-counted, so cloning one is a pointer copy and a
//! node may return its own handle as its continuation (a fixed point).

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::value::Value;

/// Bounds every payload type must satisfy.
///
/// A literal may be yielded more than once (a replayed handle), and handles
/// move between tasks between calls.
pub trait Payload: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Payload for T {}

/// Result of one advance: the value and the continuation.
pub type Step<T> = (Value<T>, Option<Generator<T>>);

/// A node in a generator tree.
///
/// Implementations are immutable. `this` is the handle the node was reached
/// through; nodes that are their own continuation return a clone of it.
#[async_trait]
pub trait Node<T: Payload>: Send + Sync {
    /// Refresh and prune without advancing.
    ///
    /// Must never emit a value. Returns `None` if the node is known to be
    /// exhausted. Idempotent and safe to call at any cadence, including never.
    fn update(&self, this: &Generator<T>, ctx: &Context) -> Option<Generator<T>>;

    /// Advance once.
    ///
    /// May suspend subject to `ctx`: if cancellation fires before a value is
    /// ready, returns `(Value::Pending, Some(..))` without consuming anything.
    async fn next(&self, this: &Generator<T>, ctx: &Context) -> Step<T>;

    /// Short name for logs and `Debug` output.
    fn name(&self) -> &'static str;
}

/// Immutable, cheaply clonable handle to the remaining portion of a sequence.
pub struct Generator<T: Payload> {
    node: Arc<dyn Node<T>>,
}

impl<T: Payload> Generator<T> {
    /// Wrap a node into a handle.
    pub fn new<N: Node<T> + 'static>(node: N) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    /// Advance once. See [`Node::next`].
    pub async fn next(&self, ctx: &Context) -> Step<T> {
        self.node.next(self, ctx).await
    }

    /// Refresh and prune. See [`Node::update`].
    #[must_use]
    pub fn update(&self, ctx: &Context) -> Option<Self> {
        self.node.update(self, ctx)
    }

    /// Name of the outermost node.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.node.name()
    }

    /// True if both handles point at the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.node).cast::<()>(),
            Arc::as_ptr(&other.node).cast::<()>(),
        )
    }
}

impl<T: Payload> Clone for Generator<T> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
        }
    }
}

impl<T: Payload> fmt::Debug for Generator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Generator").field(&self.name()).finish()
    }
}

/// Drop nil operands, keeping order.
pub fn wrap_all_non_nil<T: Payload>(
    operands: impl IntoIterator<Item = Option<Generator<T>>>,
) -> Vec<Generator<T>> {
    operands.into_iter().flatten().collect()
}

/// Update every child, dropping the ones that prune to nil.
pub fn update_all<T: Payload>(ctx: &Context, children: &[Generator<T>]) -> Vec<Generator<T>> {
    children.iter().filter_map(|g| g.update(ctx)).collect()
}
