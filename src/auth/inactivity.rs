//! Inactivity timeout
//!
//! A single cancelable task per armed session. Input activity pushes the
//! deadline out; when the deadline passes the idle callback runs once.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

/// Input that counts as user activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityEvent {
    PointerMove,
    KeyPress,
    Click,
    Scroll,
}

/// Stream of input events supplied by the platform layer.
#[async_trait]
pub trait ActivitySource: Send + 'static {
    /// Next event, or `None` once the source is closed.
    async fn next_event(&mut self) -> Option<ActivityEvent>;
}

#[async_trait]
impl ActivitySource for mpsc::Receiver<ActivityEvent> {
    async fn next_event(&mut self) -> Option<ActivityEvent> {
        self.recv().await
    }
}

#[async_trait]
impl ActivitySource for mpsc::UnboundedReceiver<ActivityEvent> {
    async fn next_event(&mut self) -> Option<ActivityEvent> {
        self.recv().await
    }
}

struct Armed {
    task: JoinHandle<()>,
    reset: Arc<Notify>,
}

/// Single idle window that fires a callback once after `timeout` without a
/// [`reset`](Self::reset). At most one window is armed at a time.
pub struct InactivityTimer {
    timeout: Duration,
    armed: Mutex<Option<Armed>>,
}

impl InactivityTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            armed: Mutex::new(None),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Starts a fresh idle window, replacing any previous one.
    pub fn arm<F>(&self, on_idle: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let timeout = self.timeout;
        let reset = Arc::new(Notify::new());
        let signal = reset.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = signal.notified() => continue,
                    _ = tokio::time::sleep(timeout) => {
                        on_idle();
                        return;
                    }
                }
            }
        });

        if let Some(previous) = self.armed.lock().replace(Armed { task, reset }) {
            previous.task.abort();
        }
    }

    /// Pushes the deadline out by a full window. No-op when not armed.
    pub fn reset(&self) {
        if let Some(armed) = self.armed.lock().as_ref() {
            armed.reset.notify_one();
        }
    }

    /// Cancels the window without firing.
    pub fn disarm(&self) {
        if let Some(armed) = self.armed.lock().take() {
            armed.task.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
            .lock()
            .as_ref()
            .is_some_and(|armed| !armed.task.is_finished())
    }
}

impl Drop for InactivityTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}
