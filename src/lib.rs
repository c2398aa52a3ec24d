//! Resilient transaction submission for EVM chains.

pub mod blockchain;
pub mod config;
pub mod events;
pub mod monitor;
pub mod observability;
pub mod reactive;
pub mod submission;

pub use config::schema::SubmitterConfig;
pub use events::{find_event, DecodedLog, EventError};
pub use monitor::{monitor_authorization, monitor_pause};
pub use reactive::ReactiveValue;
pub use submission::{Outcome, SubmissionEngine, SubmitError};
