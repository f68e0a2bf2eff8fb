//! # sg-gen
//!
//! Constructors and combinators for lazy generator algebras.
//!
//! Generators describe potentially infinite, potentially blocking streams of
//! synthetic input (operations for a workload or fuzzer, say). They are
//! immutable: composing them builds a tree, and advancing it returns a new
//! tree for the remainder.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`primitive`] | [`none`], [`some`], [`from_fn`], [`from_fn_ctx`], [`from_source`], [`from_channel`] |
//! | [`structural`] | [`cons`], [`seq`], [`mix`], [`repeat`] |
//! | [`transform`] | [`map`], [`flat_map`], [`filter`] |
//! | [`bound`] | [`limit`], [`once`], [`time_limit`] |
//! | [`pacing`] | [`stagger`], [`stagger_fn`] |
//! | [`choices`](mod@choices) | [`choices()`], [`Branch`] |
//! | [`range`] | [`range_i64`], [`range_f64`], [`range_from_i64`], [`range_from_f64`] |
//! | [`drive`] | [`drain`], [`drain_values`], [`into_stream`] |
//!
//! # Example
//!
//! ```rust
//! use sg_gen::{drain_values, limit, mix, repeat, seq, some, Context, GenConfig};
//!
//! let workload = limit(6, mix([repeat(some("read")), repeat(seq([some("write"), some("cas")]))]));
//!
//! let runtime = tokio::runtime::Builder::new_current_thread()
//!     .enable_time()
//!     .build()?;
//! let ops = runtime.block_on(drain_values(&Context::new(42), workload, &GenConfig::default()))?;
//! assert_eq!(ops.len(), 6);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bound;
pub mod choices;
pub mod drive;
pub mod pacing;
pub mod primitive;
pub mod range;
pub mod structural;
pub mod transform;

#[cfg(test)]
mod testing;

pub use bound::{limit, once, time_limit};
pub use choices::{choices, Branch};
pub use drive::{drain, drain_values, into_stream, DriveError};
pub use pacing::{stagger, stagger_fn};
pub use primitive::{from_channel, from_fn, from_fn_ctx, from_source, none, some};
pub use range::{range_f64, range_from_f64, range_from_i64, range_i64};
pub use structural::{cons, mix, repeat, seq};
pub use transform::{filter, flat_map, map};

pub use sg_core::{
    CancelHandle, ChannelSource, Context, Delay, GenConfig, Generator, Node, Payload, Polled,
    Source, Step, Ticker, Timer, TimerFactory, Value,
};
