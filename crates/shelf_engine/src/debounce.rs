use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::{CancelToken, TimerRegistry};

type SettleCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Value debouncer: the observed value follows the source value once the
/// source has been stable for `delay`.
///
/// The first observed value is the initial source value, with no delay. Each
/// `set` restarts the window so only the last value of a burst survives.
/// Dropping the debouncer cancels any pending timer, waiting for a settle
/// callback that is already running.
pub struct Debouncer<T> {
    timers: TimerRegistry,
    delay: Duration,
    source: T,
    pending: Option<CancelToken>,
    observed: Arc<watch::Sender<T>>,
    on_settle: Option<SettleCallback<T>>,
}

impl<T> Debouncer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(timers: TimerRegistry, initial: T, delay: Duration) -> Self {
        let (observed, _) = watch::channel(initial.clone());
        Self {
            timers,
            delay,
            source: initial,
            pending: None,
            observed: Arc::new(observed),
            on_settle: None,
        }
    }

    /// Called with each value as it becomes observed.
    pub fn on_settle(mut self, callback: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_settle = Some(Arc::new(callback));
        self
    }

    pub fn value(&self) -> T {
        self.observed.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.observed.subscribe()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(CancelToken::is_pending)
    }

    pub fn set(&mut self, value: T) {
        self.source = value;
        self.restart();
    }

    /// A new delay restarts the window for a pending value. With nothing
    /// pending it only applies to the next `set`.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
        if self.is_pending() {
            self.restart();
        }
    }

    /// Drop the pending value without observing it.
    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }

    fn restart(&mut self) {
        self.cancel();
        let observed = self.observed.clone();
        let on_settle = self.on_settle.clone();
        let value = self.source.clone();
        self.pending = Some(self.timers.start(self.delay, move || {
            observed.send_replace(value.clone());
            if let Some(callback) = on_settle {
                callback(&value);
            }
        }));
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}
