//! Fixed-interval poller
//!
//! One timer per mounted view. The first fetch fires immediately, later ones
//! on the interval. A slow fetch does not hold back the next tick; results
//! land in arrival order (last write wins).
//!
//! Every completion passes a liveness gate before reaching the sink. Once
//! [`PollHandle::stop`] returns (or the handle is dropped) the sink is never
//! called again, even for a fetch that was already in flight.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::LiveSource;

/// Owner of a running poll loop; dropping it unmounts the view
pub struct PollHandle {
    name: Arc<str>,
    cancel: CancellationToken,
    alive: Arc<RwLock<bool>>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Stop polling and close the gate
    ///
    /// Waits for a sink that is currently running to return, so it must not
    /// be called from inside the sink itself.
    pub fn stop(&mut self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        match self.alive.write() {
            Ok(mut alive) => *alive = false,
            Err(poisoned) => *poisoned.into_inner() = false,
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        debug!(poller = %self.name, "Poller stopped");
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct Poller;

impl Poller {
    /// Start polling `source` every `every`, feeding results to `sink`
    ///
    /// Failed fetches are logged and skipped; the loop keeps going.
    pub fn spawn<T, F>(
        name: &str,
        source: Arc<dyn LiveSource<Item = T>>,
        every: Duration,
        sink: F,
    ) -> PollHandle
    where
        T: Send + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let name: Arc<str> = Arc::from(name);
        let cancel = CancellationToken::new();
        let alive = Arc::new(RwLock::new(true));
        let sink = Arc::new(sink);

        debug!(poller = %name, interval_ms = every.as_millis() as u64, "Poller started");

        let task = {
            let name = Arc::clone(&name);
            let cancel = cancel.clone();
            let alive = Arc::clone(&alive);
            tokio::spawn(async move {
                let mut ticker = interval(every);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {}
                    }

                    let name = Arc::clone(&name);
                    let cancel = cancel.clone();
                    let alive = Arc::clone(&alive);
                    let source = Arc::clone(&source);
                    let sink = Arc::clone(&sink);
                    tokio::spawn(async move {
                        let result = tokio::select! {
                            _ = cancel.cancelled() => return,
                            result = source.fetch() => result,
                        };
                        match result {
                            Ok(value) => {
                                let gate = match alive.read() {
                                    Ok(gate) => gate,
                                    Err(poisoned) => poisoned.into_inner(),
                                };
                                if *gate {
                                    sink(value);
                                } else {
                                    debug!(poller = %name, "Discarding result for stopped view");
                                }
                            }
                            Err(e) => {
                                warn!(poller = %name, kind = e.kind(), "Poll failed, skipping tick: {}", e);
                            }
                        }
                    });
                }
            })
        };

        PollHandle {
            name,
            cancel,
            alive,
            task: Some(task),
        }
    }
}
