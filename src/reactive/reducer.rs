//! Interval-driven fold into a [`ReactiveValue`].

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::reactive::value::{channel, Publisher, ReactiveValue};

/// Runs `step(previous)` on a fixed interval and publishes each result.
///
/// A failing step is logged and the previous value is republished, so
/// consumers see stale data rather than an error.
pub struct ScheduledReducer<T, F> {
    name: String,
    interval: Duration,
    initial: T,
    step: F,
}

impl<T, F, Fut, E> ScheduledReducer<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: FnMut(T) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    pub fn new(name: impl Into<String>, interval: Duration, initial: T, step: F) -> Self {
        Self {
            name: name.into(),
            interval,
            initial,
            step,
        }
    }

    /// Start the loop on the current runtime.
    ///
    /// The first step runs immediately. The task runs until the handle is
    /// aborted or the runtime shuts down.
    pub fn spawn(self) -> (ReactiveValue<T>, JoinHandle<()>) {
        let (publisher, value) = channel();
        let handle = tokio::spawn(self.run(publisher));
        (value, handle)
    }

    async fn run(mut self, publisher: Publisher<T>) {
        tracing::info!(
            reducer = %self.name,
            interval_secs = self.interval.as_secs_f64(),
            "Scheduled reducer starting"
        );

        let mut ticker = time::interval(self.interval);
        // Steps never overlap: a slow step pushes the schedule back.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut current = self.initial.clone();

        loop {
            ticker.tick().await;

            match (self.step)(current.clone()).await {
                Ok(next) => current = next,
                Err(e) => {
                    tracing::warn!(
                        reducer = %self.name,
                        error = %e,
                        "Reducer step failed, keeping previous value"
                    );
                }
            }
            publisher.set(current.clone());
        }
    }
}
