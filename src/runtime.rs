//! Periodic timers for the simulated location feed
//!
//! A [`TickScheduler`] hands out [`TimerId`]s; the host delivers each expiry
//! back with [`TrackingSession::on_tick`](crate::location::TrackingSession::on_tick).
//! [`ManualTicker`] leaves firing to the caller, which keeps tests
//! deterministic. With the `tokio-runtime` feature, [`TokioTicker`] drives
//! the timers from tokio tasks and reports expiries over a channel.

use std::{cell::RefCell, rc::Rc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::prelude::HashMap;

/// Identifies one running periodic timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(pub u64);

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Starts and cancels periodic timers
pub trait TickScheduler {
    fn start(&mut self, period: Duration) -> TimerId;

    /// Stops the timer. Cancelling an unknown or stopped timer does nothing.
    fn cancel(&mut self, timer: TimerId);
}

#[derive(Debug, Default)]
struct ManualState {
    next_id: u64,
    active: HashMap<TimerId, Duration>,
    cancelled: Vec<TimerId>,
}

/// Scheduler whose timers only fire when the caller says so.
///
/// Clones share state, so a test can keep one clone to inspect the timers
/// a session owns.
#[derive(Debug, Clone, Default)]
pub struct ManualTicker {
    state: Rc<RefCell<ManualState>>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, timer: TimerId) -> bool {
        self.state.borrow().active.contains_key(&timer)
    }

    pub fn active_timers(&self) -> Vec<TimerId> {
        let mut timers: Vec<_> = self.state.borrow().active.keys().copied().collect();
        timers.sort();
        timers
    }

    pub fn period(&self, timer: TimerId) -> Option<Duration> {
        self.state.borrow().active.get(&timer).copied()
    }

    /// Timers in the order they were cancelled
    pub fn cancelled(&self) -> Vec<TimerId> {
        self.state.borrow().cancelled.clone()
    }
}

impl TickScheduler for ManualTicker {
    fn start(&mut self, period: Duration) -> TimerId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let timer = TimerId(state.next_id);
        state.active.insert(timer, period);
        timer
    }

    fn cancel(&mut self, timer: TimerId) {
        let mut state = self.state.borrow_mut();
        if state.active.remove(&timer).is_some() {
            state.cancelled.push(timer);
        }
    }
}

#[cfg(feature = "tokio-runtime")]
pub use tokio_impl::TokioTicker;

#[cfg(feature = "tokio-runtime")]
mod tokio_impl {
    use super::*;
    use crossbeam_channel::{Receiver, Sender};
    use tokio::{runtime::Handle, task::JoinHandle};

    use crate::{MapError, Result};

    /// Handle to a spawned tick task
    struct TickTask {
        join: JoinHandle<()>,
    }

    impl TickTask {
        fn is_finished(&self) -> bool {
            self.join.is_finished()
        }

        fn cancel(&self) {
            self.join.abort();
        }
    }

    /// Runs each timer as a tokio task that sends its [`TimerId`] on every
    /// expiry. The first expiry comes one full period after `start`.
    pub struct TokioTicker {
        runtime: Handle,
        sender: Sender<TimerId>,
        tasks: HashMap<TimerId, TickTask>,
        next_id: u64,
    }

    impl TokioTicker {
        pub fn new(runtime: Handle) -> (Self, Receiver<TimerId>) {
            let (sender, receiver) = crossbeam_channel::unbounded();
            let ticker = Self {
                runtime,
                sender,
                tasks: HashMap::default(),
                next_id: 0,
            };
            (ticker, receiver)
        }

        /// Binds to the runtime the caller is running on
        pub fn current() -> Result<(Self, Receiver<TimerId>)> {
            let runtime = Handle::try_current()
                .map_err(|err| MapError::Config(format!("no tokio runtime: {}", err)))?;
            Ok(Self::new(runtime))
        }

        /// Timers whose task is still running
        pub fn running(&self) -> usize {
            self.tasks.values().filter(|task| !task.is_finished()).count()
        }
    }

    impl TickScheduler for TokioTicker {
        fn start(&mut self, period: Duration) -> TimerId {
            self.next_id += 1;
            let timer = TimerId(self.next_id);
            let sender = self.sender.clone();
            let period = period.max(Duration::from_millis(1));

            let join = self.runtime.spawn(async move {
                let mut interval = tokio::time::interval(period);
                // The first tick completes immediately.
                interval.tick().await;
                loop {
                    interval.tick().await;
                    if sender.send(timer).is_err() {
                        break;
                    }
                }
            });

            log::debug!("started {} every {:?}", timer, period);
            self.tasks.insert(timer, TickTask { join });
            timer
        }

        fn cancel(&mut self, timer: TimerId) {
            if let Some(task) = self.tasks.remove(&timer) {
                task.cancel();
                log::debug!("cancelled {}", timer);
            }
        }
    }

    impl Drop for TokioTicker {
        fn drop(&mut self) {
            for task in self.tasks.values() {
                task.cancel();
            }
        }
    }
}
