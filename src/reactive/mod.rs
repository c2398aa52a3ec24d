//! Reactive shared state.
//!
//! # Data Flow
//! ```text
//! ScheduledReducer (one task per fact)
//!     → step(previous) every interval
//!     → Publisher::set (single writer)
//!     → ReactiveValue::read (any number of readers)
//! ```
//!
//! # Design Decisions
//! - Snapshot is an `ArcSwapOption`, so reads never block the writer
//! - Readers wait only for the first value; afterwards reads are immediate
//! - Once set, a value is only ever replaced, never cleared

pub mod reducer;
pub mod value;

pub use reducer::ScheduledReducer;
pub use value::{channel, with_initial, Publisher, ReactiveValue};
