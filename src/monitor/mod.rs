//! Network state monitors.
//!
//! # Data Flow
//! ```text
//! query.rs (NetworkStateQuery: registry contract via ChainClient::call)
//!     → ScheduledReducer (one task per monitor)
//!     → ReactiveValue<bool> (read by the submission gates)
//! ```
//!
//! # Design Decisions
//! - Pause starts `true` and authorization starts `false`, so nothing is
//!   submitted until the first successful query says otherwise
//! - Query failures keep the previous value and never reach consumers
//! - Monitors run for the lifetime of the runtime

pub mod query;

use alloy::primitives::Address;
use std::sync::Arc;
use std::time::Duration;

use crate::observability::metrics;
use crate::reactive::{ReactiveValue, ScheduledReducer};

pub use query::{ContractStateQuery, MonitorError, NetworkStateQuery};

/// Track the network pause flag.
pub fn monitor_pause(query: Arc<dyn NetworkStateQuery>, interval: Duration) -> ReactiveValue<bool> {
    let step = move |previous: bool| {
        let query = query.clone();
        async move {
            let paused = query.is_paused().await?;
            if paused != previous {
                tracing::info!(paused, "Network pause state changed");
            }
            metrics::record_monitor_value("pause", paused);
            Ok::<_, MonitorError>(paused)
        }
    };

    let (value, _task) = ScheduledReducer::new("pause", interval, true, step).spawn();
    value
}

/// Track whether `operator` may act for `principal`.
///
/// Acting for oneself needs no query and never changes.
pub fn monitor_authorization(
    query: Arc<dyn NetworkStateQuery>,
    operator: Address,
    principal: Address,
    interval: Duration,
) -> ReactiveValue<bool> {
    if operator == principal {
        metrics::record_monitor_value("authorization", true);
        return ReactiveValue::constant(true);
    }

    let step = move |previous: bool| {
        let query = query.clone();
        async move {
            let authorized = query.is_authorized(operator, principal).await?;
            if authorized != previous {
                tracing::info!(
                    operator = %operator,
                    principal = %principal,
                    authorized,
                    "Authorization changed"
                );
            }
            metrics::record_monitor_value("authorization", authorized);
            Ok::<_, MonitorError>(authorized)
        }
    };

    let (value, _task) =
        ScheduledReducer::new("authorization", interval, false, step).spawn();
    value
}
