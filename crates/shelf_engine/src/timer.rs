use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use shelf_logging::shelf_trace;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Spawns one-shot timers on a tokio runtime and tracks how many are still
/// pending.
#[derive(Debug, Clone)]
pub struct TimerRegistry {
    handle: Handle,
    outstanding: Arc<AtomicUsize>,
}

impl TimerRegistry {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Registry bound to the runtime of the calling task.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Timers that have neither fired nor been cancelled.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Run `on_fire` once after `delay` unless the returned token is cancelled
    /// or dropped first. A cancel that races a firing timer blocks until
    /// `on_fire` has returned, so `on_fire` must not cancel its own token.
    pub fn start<F>(&self, delay: Duration, on_fire: F) -> CancelToken
    where
        F: FnOnce() + Send + 'static,
    {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        let slot = Arc::new(TimerSlot {
            settled: AtomicBool::new(false),
            firing: Mutex::new(()),
            outstanding: self.outstanding.clone(),
        });
        let cancel = CancellationToken::new();

        let task_slot = slot.clone();
        let task_cancel = cancel.clone();
        self.handle.spawn(async move {
            tokio::select! {
                _ = task_cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => fire(&task_slot, delay, on_fire),
            }
        });

        CancelToken { cancel, slot }
    }
}

fn fire<F: FnOnce()>(slot: &TimerSlot, delay: Duration, on_fire: F) {
    let _firing = slot.firing.lock().unwrap_or_else(PoisonError::into_inner);
    if slot.settle() {
        shelf_trace!("timer fired after {:?}", delay);
        on_fire();
    }
}

#[derive(Debug)]
struct TimerSlot {
    settled: AtomicBool,
    /// Held for the whole of settle-and-fire.
    firing: Mutex<()>,
    outstanding: Arc<AtomicUsize>,
}

impl TimerSlot {
    /// Exactly one of fire/cancel wins; the winner releases the slot.
    fn settle(&self) -> bool {
        let won = self
            .settled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if won {
            self.outstanding.fetch_sub(1, Ordering::SeqCst);
        }
        won
    }
}

/// Handle to a pending timer. Dropping it cancels the timer.
#[derive(Debug)]
pub struct CancelToken {
    cancel: CancellationToken,
    slot: Arc<TimerSlot>,
}

impl CancelToken {
    /// Returns `true` when the timer was still pending, meaning its callback
    /// will never run. When the callback is already running this waits for it
    /// to return.
    pub fn cancel(&self) -> bool {
        self.cancel.cancel();
        let _firing = self
            .slot
            .firing
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.slot.settle()
    }

    pub fn is_pending(&self) -> bool {
        !self.slot.settled.load(Ordering::SeqCst)
    }
}

impl Drop for CancelToken {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn timer_fires_once_after_delay() {
        let timers = TimerRegistry::current();
        let fired = Arc::new(AtomicU32::new(0));
        let counter = fired.clone();
        let token = timers.start(Duration::from_millis(100), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(timers.outstanding(), 1);

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!token.is_pending());
        assert_eq!(timers.outstanding(), 0);
        assert!(!token.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let timers = TimerRegistry::current();
        let fired = Arc::new(AtomicU32::new(0));
        let counter = fired.clone();
        let token = timers.start(Duration::from_millis(50), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(token.cancel());
        assert_eq!(timers.outstanding(), 0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_token_cancels() {
        let timers = TimerRegistry::current();
        let fired = Arc::new(AtomicU32::new(0));
        let counter = fired.clone();
        drop(timers.start(Duration::from_millis(50), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(timers.outstanding(), 0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancel_waits_for_a_callback_already_running() {
        let timers = TimerRegistry::current();
        let (entered_tx, entered_rx) = mpsc::channel();
        let finished = Arc::new(AtomicBool::new(false));
        let done = finished.clone();
        let token = timers.start(Duration::from_millis(10), move || {
            entered_tx.send(()).unwrap();
            std::thread::sleep(Duration::from_millis(100));
            done.store(true, Ordering::SeqCst);
        });

        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(!token.cancel());
        assert!(finished.load(Ordering::SeqCst));
        assert_eq!(timers.outstanding(), 0);
    }
}
