use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

/// A repeating scheduled task that fires once per interval until cancelled
pub struct Countdown;

impl Countdown {
    /// Spawn the task. `on_tick` runs on the timer thread; returning `false`
    /// stops the task (e.g. the receiving side went away).
    pub fn start<F>(interval: Duration, mut on_tick: F) -> CountdownHandle
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();

        let worker = thread::Builder::new()
            .name("countdown".into())
            .spawn(move || loop {
                match cancel_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if !on_tick() {
                            break;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            });

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!(error = %err, "failed to spawn countdown thread");
                None
            }
        };

        CountdownHandle {
            cancel: Some(cancel_tx),
            worker,
        }
    }
}

/// Disposer for a running [`Countdown`].
///
/// Cancelling (explicitly or by dropping) blocks until the timer thread has
/// exited, so no tick is delivered once this returns.
#[derive(Debug)]
pub struct CountdownHandle {
    cancel: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl CountdownHandle {
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("countdown thread panicked");
            }
            debug!("countdown cancelled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.worker
            .as_ref()
            .map(|w| !w.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
