use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigStore};
use crate::engine::{Engine, KeyOutcome, TickOutcome};
use crate::history::{HistoryDb, SessionRecord};
use crate::leaderboard::{Leaderboard, LeaderboardPage};
use crate::profile::{Notice, UserProfile};
use crate::reporter::{reconcile, ScoreReporter};
use crate::runtime::AppEvent;
use crate::session::{SessionConfig, SessionResult};
use crate::timer::{Countdown, CountdownHandle};
use crate::Result;

/// One countdown second
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum AppState {
    Typing,
    Results,
    Leaderboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaderboardView {
    pub page: Option<LeaderboardPage>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct App {
    pub state: AppState,
    engine: Engine,
    profile: UserProfile,
    leaderboard: LeaderboardView,
    reporter: ScoreReporter,
    history: Option<HistoryDb>,
    config_store: Box<dyn ConfigStore>,
    config: Config,
    events: Sender<AppEvent>,
    countdown: Option<CountdownHandle>,
    tick_interval: Duration,
}

impl App {
    pub fn new(
        config: Config,
        config_store: Box<dyn ConfigStore>,
        client: Arc<dyn Leaderboard>,
        events: Sender<AppEvent>,
    ) -> Result<Self> {
        let engine = Engine::new(config.session())?;
        Ok(Self {
            state: AppState::Typing,
            engine,
            profile: UserProfile::new(config.username.clone()),
            leaderboard: LeaderboardView::default(),
            reporter: ScoreReporter::new(client),
            history: None,
            config_store,
            config,
            events,
            countdown: None,
            tick_interval: TICK_INTERVAL,
        })
    }

    /// Swap in a prepared engine, e.g. one with a fixed word stream
    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.config.set_session(engine.config());
        self.engine = engine;
        self
    }

    pub fn with_history(mut self, history: HistoryDb) -> Self {
        match history.best_wpm() {
            Ok(Some(best)) => self.profile.note_wpm(best),
            Ok(None) => {}
            Err(err) => warn!(error = %err, "could not read best wpm from history"),
        }
        self.history = Some(history);
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn leaderboard(&self) -> &LeaderboardView {
        &self.leaderboard
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &'static str {
        self.reporter.backend()
    }

    pub fn history(&self) -> Option<&HistoryDb> {
        self.history.as_ref()
    }

    pub fn countdown_active(&self) -> bool {
        self.countdown.as_ref().is_some_and(|c| c.is_active())
    }

    pub fn handle(&mut self, event: AppEvent) -> Control {
        match event {
            AppEvent::Key(key) => return self.on_key(key),
            AppEvent::Resize => {}
            AppEvent::Tick(generation) => self.on_tick(generation),
            AppEvent::Submitted(reply) => reconcile(&mut self.profile, &reply),
            AppEvent::LeaderboardLoaded(loaded) => {
                self.leaderboard.loading = false;
                match loaded {
                    Ok(page) => {
                        if let Some(rank) = page.current_user_rank {
                            self.profile.rank = Some(rank);
                        }
                        self.leaderboard.page = Some(page);
                        self.leaderboard.error = None;
                    }
                    Err(err) => {
                        warn!(error = %err, "leaderboard fetch failed");
                        self.leaderboard.error = Some(err);
                    }
                }
            }
        }
        Control::Continue
    }

    fn on_key(&mut self, key: KeyEvent) -> Control {
        if key.kind == KeyEventKind::Release {
            return Control::Continue;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return self.quit(),
            KeyCode::Char('c') if ctrl => return self.quit(),
            _ if ctrl => return Control::Continue,
            _ => {}
        }

        match self.state {
            AppState::Typing => match key.code {
                KeyCode::Char(c) => self.on_char(c),
                KeyCode::Backspace => {
                    self.engine.backspace();
                }
                KeyCode::Left => self.restart(),
                code => self.on_settings_key(code),
            },
            AppState::Results => match key.code {
                KeyCode::Char('r') | KeyCode::Enter | KeyCode::Left => self.restart(),
                KeyCode::Char('l') => self.open_leaderboard(),
                code => self.on_settings_key(code),
            },
            AppState::Leaderboard => match key.code {
                KeyCode::Char('b') | KeyCode::Backspace => {
                    self.state = if self.engine.has_finished() {
                        AppState::Results
                    } else {
                        AppState::Typing
                    };
                }
                KeyCode::Char('r') => self.refresh_leaderboard(),
                _ => {}
            },
        }
        Control::Continue
    }

    fn on_settings_key(&mut self, code: KeyCode) {
        let current = self.engine.config();
        let next = match code {
            KeyCode::Tab => current.with_language(current.language.next()),
            KeyCode::Up => current.next_duration(),
            KeyCode::Down => current.prev_duration(),
            _ => return,
        };
        self.change_settings(next);
    }

    fn on_char(&mut self, c: char) {
        match self.engine.write(c) {
            KeyOutcome::Started => self.arm_countdown(),
            KeyOutcome::Finished(result) => self.on_finished(result),
            KeyOutcome::Ignored | KeyOutcome::Typed | KeyOutcome::WordCompleted(_) => {}
        }
    }

    fn on_tick(&mut self, generation: u64) {
        if generation != self.engine.generation() {
            debug!(
                generation,
                current = self.engine.generation(),
                "dropping stale tick"
            );
            return;
        }
        if let TickOutcome::Finished(result) = self.engine.on_tick() {
            self.on_finished(result);
        }
    }

    fn arm_countdown(&mut self) {
        self.stop_countdown();
        let tx = self.events.clone();
        let generation = self.engine.generation();
        self.countdown = Some(Countdown::start(self.tick_interval, move || {
            tx.send(AppEvent::Tick(generation)).is_ok()
        }));
    }

    fn stop_countdown(&mut self) {
        if let Some(mut countdown) = self.countdown.take() {
            countdown.cancel();
        }
    }

    fn on_finished(&mut self, result: SessionResult) {
        self.stop_countdown();

        if let Some(history) = &self.history {
            let record = SessionRecord {
                played_at: Local::now(),
                language: self.engine.config().language,
                result,
            };
            if let Err(err) = history.record(&record) {
                warn!(error = %err, "failed to record session history");
            }
        }

        self.profile.note_wpm(result.wpm);
        self.profile.last_reward = None;
        self.profile.notice = Some(Notice::Submitting);

        let tx = self.events.clone();
        self.reporter
            .submit(self.engine.generation(), &result, move |reply| {
                let _ = tx.send(AppEvent::Submitted(reply));
            });

        self.state = AppState::Results;
    }

    fn restart(&mut self) {
        self.stop_countdown();
        self.engine.reset();
        self.profile.notice = None;
        self.state = AppState::Typing;
    }

    fn change_settings(&mut self, next: SessionConfig) {
        if let Err(err) = self.engine.reconfigure(next) {
            debug!(error = %err, "settings change refused");
            return;
        }
        info!(language = %next.language, duration_secs = next.duration_secs, "settings changed");
        self.config.set_session(next);
        if let Err(err) = self.config_store.save(&self.config) {
            warn!(error = %err, "failed to save config");
        }
        self.profile.notice = None;
        self.state = AppState::Typing;
    }

    fn open_leaderboard(&mut self) {
        self.state = AppState::Leaderboard;
        self.refresh_leaderboard();
    }

    fn refresh_leaderboard(&mut self) {
        if self.leaderboard.loading {
            return;
        }
        self.leaderboard.loading = true;
        self.leaderboard.error = None;
        let tx = self.events.clone();
        self.reporter.fetch_leaderboard(move |loaded| {
            let _ = tx.send(AppEvent::LeaderboardLoaded(loaded));
        });
    }

    fn quit(&mut self) -> Control {
        self.stop_countdown();
        info!("quitting");
        Control::Quit
    }
}
