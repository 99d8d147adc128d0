//! Clock and timer ports shared across host contracts and adapters.

use std::{
    cell::{Cell, RefCell},
    future::Future,
    pin::Pin,
    rc::Rc,
    time::Duration,
};
#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};

use futures::channel::oneshot;

/// Returns the current unix timestamp in milliseconds.
pub fn unix_time_ms_now() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now().max(0.0) as u64
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Wall-clock source for timestamps and uptime.
pub trait Clock {
    /// Current unix time in milliseconds.
    fn now_ms(&self) -> u64;
}

/// Clock backed by [`unix_time_ms_now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        unix_time_ms_now()
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Rc<Cell<u64>>,
}

impl ManualClock {
    /// Creates a clock frozen at `now_ms`.
    pub fn at(now_ms: u64) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(now_ms)),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let by_ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.now_ms.set(self.now_ms.get().saturating_add(by_ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}

/// Boxed future returned by [`Sleeper::sleep`].
pub type SleepFuture = Pin<Box<dyn Future<Output = ()>>>;

/// Timer port used for provider timeouts and the display tick.
pub trait Sleeper {
    /// Resolves once `duration` has elapsed.
    fn sleep(&self, duration: Duration) -> SleepFuture;
}

/// Sleeper that never wakes; disables anything raced against it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingSleeper;

impl Sleeper for PendingSleeper {
    fn sleep(&self, _duration: Duration) -> SleepFuture {
        Box::pin(futures::future::pending())
    }
}

/// Native sleeper that parks a helper thread per timer.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

#[cfg(not(target_arch = "wasm32"))]
impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) -> SleepFuture {
        let (tx, rx) = oneshot::channel::<()>();
        std::thread::spawn(move || {
            std::thread::sleep(duration);
            let _ = tx.send(());
        });
        Box::pin(async move {
            let _ = rx.await;
        })
    }
}

struct PendingTimer {
    deadline: Duration,
    wake: oneshot::Sender<()>,
}

/// Hand-driven sleeper: timers fire only when [`ManualSleeper::advance`] passes their deadline.
#[derive(Clone, Default)]
pub struct ManualSleeper {
    elapsed: Rc<Cell<Duration>>,
    timers: Rc<RefCell<Vec<PendingTimer>>>,
}

impl ManualSleeper {
    /// Number of timers that have not fired yet.
    pub fn pending(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Moves virtual time forward and fires every matured timer.
    pub fn advance(&self, by: Duration) {
        let now = self.elapsed.get().saturating_add(by);
        self.elapsed.set(now);
        let matured = {
            let mut timers = self.timers.borrow_mut();
            let (matured, waiting): (Vec<_>, Vec<_>) =
                timers.drain(..).partition(|timer| timer.deadline <= now);
            *timers = waiting;
            matured
        };
        for timer in matured {
            let _ = timer.wake.send(());
        }
    }
}

impl Sleeper for ManualSleeper {
    fn sleep(&self, duration: Duration) -> SleepFuture {
        let (tx, rx) = oneshot::channel::<()>();
        self.timers.borrow_mut().push(PendingTimer {
            deadline: self.elapsed.get().saturating_add(duration),
            wake: tx,
        });
        Box::pin(async move {
            // A dropped sender means the sleeper went away; treat it as never waking.
            if rx.await.is_err() {
                futures::future::pending::<()>().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::at(1_000);
        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now_ms(), 3_000);
    }

    #[test]
    fn manual_sleeper_fires_at_deadline() {
        let sleeper = ManualSleeper::default();
        let mut short = sleeper.sleep(Duration::from_secs(1));
        let mut long = sleeper.sleep(Duration::from_secs(5));
        assert!((&mut short).now_or_never().is_none());

        sleeper.advance(Duration::from_secs(1));
        assert!((&mut short).now_or_never().is_some());
        assert!((&mut long).now_or_never().is_none());
        assert_eq!(sleeper.pending(), 1);

        sleeper.advance(Duration::from_secs(4));
        assert!((&mut long).now_or_never().is_some());
    }

    #[test]
    fn pending_sleeper_never_wakes() {
        let mut sleep = PendingSleeper.sleep(Duration::ZERO);
        assert!((&mut sleep).now_or_never().is_none());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn thread_sleeper_wakes() {
        futures::executor::block_on(ThreadSleeper.sleep(Duration::from_millis(5)));
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }
}
