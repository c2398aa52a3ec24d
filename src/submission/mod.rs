//! Transaction submission subsystem.
//!
//! # Data Flow
//! ```text
//! Caller call (to, value, data)
//!     → engine.rs (gate on paused / authorized monitors)
//!     → fees.rs (wait for fee at or below ceiling, pick mechanism)
//!     → attempt.rs (initial TransactionConfig from estimate + nonce)
//!     → sign, broadcast, wait for confirmations
//!     → diagnose.rs (replay reverted transactions)
//!     → classifier.rs (next TransactionConfig or terminal error)
//!     → backoff.rs (delay before the next attempt)
//! ```
//!
//! # Design Decisions
//! - The classifier is a pure function; the engine owns the only live config
//! - Fee and gas arithmetic is integer permille on wei, saturating
//! - A possibly-duplicated broadcast is never resubmitted

pub mod attempt;
pub mod backoff;
pub mod classifier;
pub mod diagnose;
pub mod engine;
pub mod error;
pub mod fees;

pub use attempt::TransactionConfig;
pub use classifier::{classify, Action, Failure};
pub use diagnose::{RevertDiagnoser, RevertReason};
pub use engine::{Outcome, SubmissionEngine};
pub use error::SubmitError;
pub use fees::{FeeMechanism, FeePolicy};
