use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use translator_logging::translator_trace;

use crate::TimerId;

type Registry = HashMap<TimerId, CancellationToken>;

/// One-shot timers that can be cancelled by id.
///
/// A timer fires at most once, and never after `cancel` for its id has
/// returned: the firing task must still find its entry in the registry.
#[derive(Clone, Default)]
pub(crate) struct Timers {
    armed: Arc<Mutex<Registry>>,
    root: CancellationToken,
}

impl Timers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Arms `timer`; `on_fire` runs on the runtime after `after` elapses.
    /// Re-arming an id cancels its previous instance.
    pub fn start<F>(&self, runtime: &Handle, timer: TimerId, after: Duration, on_fire: F)
    where
        F: FnOnce(TimerId) + Send + 'static,
    {
        let token = self.root.child_token();
        if let Some(previous) = self.lock().insert(timer, token.clone()) {
            previous.cancel();
        }
        translator_trace!("timer {} armed for {:?}", timer, after);

        let armed = self.armed.clone();
        let watch = token.clone();
        runtime.spawn(async move {
            tokio::select! {
                _ = watch.cancelled() => {}
                _ = tokio::time::sleep(after) => {
                    let still_armed = {
                        let mut registry = armed.lock().unwrap_or_else(PoisonError::into_inner);
                        !token.is_cancelled() && registry.remove(&timer).is_some()
                    };
                    if still_armed {
                        on_fire(timer);
                    }
                }
            }
        });
    }

    /// Disarms `timer`. Returns whether it was still pending.
    pub fn cancel(&self, timer: TimerId) -> bool {
        match self.lock().remove(&timer) {
            Some(token) => {
                token.cancel();
                translator_trace!("timer {} cancelled", timer);
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        self.root.cancel();
        self.lock().clear();
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.armed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::Timers;
    use std::sync::mpsc;
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread")]
    async fn fires_once_after_delay() {
        let timers = Timers::new();
        let (tx, rx) = mpsc::channel();
        timers.start(&tokio::runtime::Handle::current(), 7, Duration::from_millis(20), move |id| {
            let _ = tx.send(id);
        });
        assert_eq!(timers.pending(), 1);
        let fired = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(2)))
            .await
            .unwrap();
        assert_eq!(fired, Ok(7));
        assert_eq!(timers.pending(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancelled_timer_never_fires() {
        let timers = Timers::new();
        let (tx, rx) = mpsc::channel();
        timers.start(&tokio::runtime::Handle::current(), 1, Duration::from_millis(30), move |id| {
            let _ = tx.send(id);
        });
        assert!(timers.cancel(1));
        assert!(!timers.cancel(1));
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(timers.pending(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancel_all_disarms_everything() {
        let timers = Timers::new();
        let (tx, rx) = mpsc::channel();
        for id in 1..=3 {
            let tx = tx.clone();
            timers.start(&tokio::runtime::Handle::current(), id, Duration::from_millis(30), move |id| {
                let _ = tx.send(id);
            });
        }
        timers.cancel_all();
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(rx.try_recv().is_err());
    }
}
