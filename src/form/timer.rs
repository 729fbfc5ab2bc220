use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::BoxFuture;
use futures_timer::Delay;

/// Source of delays for the simulated transport and the status auto-hide.
pub trait Timer: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Wall-clock timer backed by `futures-timer`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FuturesTimer;

impl Timer for FuturesTimer {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(Delay::new(duration))
    }
}

#[derive(Default)]
struct ManualTimerState {
    now: Duration,
    pending: Vec<(Duration, oneshot::Sender<()>)>,
}

/// Timer driven by explicit [`ManualTimer::advance`] calls, so callers can
/// step through delays deterministically.
#[derive(Clone, Default)]
pub struct ManualTimer {
    state: Arc<Mutex<ManualTimerState>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.lock().now
    }

    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Moves time forward and wakes every sleeper whose deadline has passed.
    pub fn advance(&self, by: Duration) {
        let due = {
            let mut state = self.lock();
            state.now += by;
            let now = state.now;
            let (due, waiting): (Vec<_>, Vec<_>) = state
                .pending
                .drain(..)
                .partition(|(deadline, _)| *deadline <= now);
            state.pending = waiting;
            due
        };
        for (_, sender) in due {
            let _ = sender.send(());
        }
    }

    fn lock(&self) -> MutexGuard<'_, ManualTimerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Timer for ManualTimer {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        let (sender, receiver) = oneshot::channel();
        if duration.is_zero() {
            let _ = sender.send(());
        } else {
            let mut state = self.lock();
            let deadline = state.now + duration;
            state.pending.push((deadline, sender));
        }
        Box::pin(async move {
            let _ = receiver.await;
        })
    }
}
