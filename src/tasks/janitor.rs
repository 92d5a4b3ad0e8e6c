//! Janitor Task
//!
//! Background task that periodically removes expired cache entries from the
//! store it is bound to.

use std::sync::Weak;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::error::{CacheError, Result};

// == Sweep Trait ==
/// Something a janitor can sweep.
pub trait Sweep: Send + Sync {
    /// Removes every expired entry and returns how many were removed.
    fn sweep(&self) -> usize;
}

// == Janitor State ==
/// Lifecycle of a janitor. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JanitorState {
    /// Built but not yet scheduled
    Created,
    /// Sweeping on its interval
    Running,
    /// Halted; a new janitor is required to sweep again
    Stopped,
}

// == Janitor ==
/// Cancellable scheduled sweeper bound to a single store.
///
/// The task only holds a weak reference to its target, so it also exits on
/// its own once the target is dropped.
#[derive(Debug)]
pub struct Janitor {
    interval: Duration,
    state: Mutex<JanitorState>,
    stop_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Janitor {
    // == Constructor ==
    /// Creates a janitor that will sweep every `interval` once started.
    pub fn new(interval: Duration) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            interval,
            state: Mutex::new(JanitorState::Created),
            stop_tx,
            handle: Mutex::new(None),
        }
    }

    // == Start ==
    /// Spawns the sweep loop on the current tokio runtime.
    ///
    /// Returns `Ok(false)` if the janitor was already started or stopped.
    ///
    /// # Errors
    /// `CacheError::NoRuntime` when called outside a tokio runtime.
    pub fn start(&self, target: Weak<dyn Sweep>) -> Result<bool> {
        let mut state = self.state.lock();
        if *state != JanitorState::Created {
            return Ok(false);
        }

        let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;
        let stop_rx = self.stop_tx.subscribe();
        let handle = runtime.spawn(run(target, self.interval, stop_rx));

        *self.handle.lock() = Some(handle);
        *state = JanitorState::Running;
        info!(
            "Starting janitor with interval of {} ms",
            self.interval.as_millis()
        );
        Ok(true)
    }

    // == Stop ==
    /// Halts future sweeps. Safe to call any number of times.
    ///
    /// A sweep already in progress runs to completion; the store lock is
    /// never held across the wait for the next tick.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        match *state {
            JanitorState::Running => {
                self.stop_tx.send_replace(true);
                *state = JanitorState::Stopped;
                info!("Janitor stopped");
            }
            JanitorState::Created => *state = JanitorState::Stopped,
            JanitorState::Stopped => {}
        }
    }

    // == Join ==
    /// Waits for the sweep loop to exit. Returns immediately if it never ran
    /// or was already joined.
    pub async fn join(&self) {
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> JanitorState {
        *self.state.lock()
    }

    /// Interval between sweeps.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for Janitor {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run(target: Weak<dyn Sweep>, period: Duration, mut stop_rx: watch::Receiver<bool>) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            // Also fires if the sender is gone
            _ = stop_rx.changed() => break,

            _ = ticker.tick() => {
                let Some(target) = target.upgrade() else {
                    debug!("Janitor target dropped");
                    break;
                };
                let removed = target.sweep();

                if removed > 0 {
                    info!("Janitor sweep: removed {} expired entries", removed);
                } else {
                    debug!("Janitor sweep: no expired entries found");
                }
            }
        }
    }

    debug!("Janitor loop exited");
}
