//! # sg-core
//!
//! The generator contract for lazy, potentially infinite input streams.
//!
//! | Item | Role |
//! |------|------|
//! | [`Generator`] | Immutable handle to the rest of a sequence |
//! | [`Value`] | A payload or one of the sentinels `Pending` / `StopIteration` |
//! | [`Context`] | Cancellation, deadline, and seeded randomness |
//! | [`Source`], [`Timer`] | Capabilities for external channels and timers |
//! | [`GenConfig`] | Seed, step cap, and timeout for a run |
//!
//! A nil generator is `None`: `Option<Generator<T>>` is the full type every
//! constructor returns and every combinator accepts.

pub mod capability;
pub mod config;
pub mod context;
pub mod error;
pub mod generator;
pub mod value;

pub use capability::{ChannelSource, Delay, Polled, Source, Ticker, Timer, TimerFactory};
pub use config::GenConfig;
pub use context::{CancelHandle, Context};
pub use error::ConfigError;
pub use generator::{update_all, wrap_all_non_nil, Generator, Node, Payload, Step};
pub use value::Value;
