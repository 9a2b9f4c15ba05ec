use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};
use tracing::warn;

use crate::leaderboard::LeaderboardPage;
use crate::reporter::SubmissionReply;

/// Unified event type consumed by the app
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// one countdown second elapsed for the session with this generation
    Tick(u64),
    Submitted(SubmissionReply),
    LeaderboardLoaded(Result<LeaderboardPage, String>),
}

/// Source of app events (keyboard, timer, background replies)
pub trait AppEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;

    /// Next event if one is already queued
    fn try_recv(&self) -> Option<AppEvent>;
}

/// Production event source: crossterm input plus anything posted through [`sender`](Self::sender)
pub struct CrosstermEventSource {
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let input_tx = tx.clone();

        let spawned = std::thread::Builder::new()
            .name("terminal-input".into())
            .spawn(move || loop {
                match event::read() {
                    Ok(CtEvent::Key(key)) => {
                        if input_tx.send(AppEvent::Key(key)).is_err() {
                            break;
                        }
                    }
                    Ok(CtEvent::Resize(_, _)) => {
                        if input_tx.send(AppEvent::Resize).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(error = %err, "terminal input reader stopped");
                        break;
                    }
                }
            });
        if let Err(err) = spawned {
            warn!(error = %err, "failed to spawn terminal input reader");
        }

        Self { tx, rx }
    }

    /// Handle for timers and background workers to post events
    pub fn sender(&self) -> Sender<AppEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AppEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn try_recv(&self) -> Option<AppEvent> {
        self.rx.try_recv().ok()
    }
}

/// Channel-backed event source for tests
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl AppEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn try_recv(&self) -> Option<AppEvent> {
        self.rx.try_recv().ok()
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Put countdown ticks ahead of everything else in a batch, keeping the
/// relative order otherwise. A word finished in the same instant the timer
/// ran out is then seen after the session is already over.
pub fn prioritize_ticks(batch: &mut [AppEvent]) {
    batch.sort_by_key(|ev| !matches!(ev, AppEvent::Tick(_)));
}

/// Pulls events off the source one batch at a time
pub struct Runner<E: AppEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: AppEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to one frame interval for the first event, then drains
    /// whatever else is already queued. Empty on timeout.
    pub fn step(&self) -> Vec<AppEvent> {
        let mut batch = match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => vec![ev],
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                return Vec::new()
            }
        };
        while let Some(ev) = self.event_source.try_recv() {
            batch.push(ev);
        }
        prioritize_ticks(&mut batch);
        batch
    }
}
