use std::{
    error::Error,
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{info, warn};

use marstype::{
    app::{App, Control},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    history::HistoryDb,
    language::Language,
    leaderboard::{AuthSession, HttpLeaderboard, Leaderboard, LeaderboardPage, LocalLeaderboard},
    logging::init_tracing,
    runtime::{AppEventSource, CrosstermEventSource, FixedTicker, Runner, Ticker},
    session::SessionConfig,
};

const FRAME_INTERVAL_MS: u64 = 100;
const MAX_DURATION_SECS: i64 = SessionConfig::MAX_DURATION_SECS as i64;

/// timed typing trials for MarsSpace, right in your terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Timed typing trials with live per-character feedback. Finished sessions are scored, kept in a local history and reported to the MarsSpace daily challenge leaderboard."
)]
pub struct Cli {
    /// word list to draw from
    #[clap(short = 'l', long, value_enum)]
    language: Option<Language>,

    /// session length in seconds, at most an hour
    #[clap(short = 'd', long, value_parser = clap::value_parser!(u32).range(1..=MAX_DURATION_SECS))]
    duration: Option<u32>,

    /// MarsSpace API base url, e.g. https://api.marsspace.uz/api
    #[clap(long)]
    server: Option<String>,

    /// access token for the API (falls back to $MARSSPACE_TOKEN); never saved
    #[clap(long)]
    token: Option<String>,

    /// name shown on the local leaderboard
    #[clap(short = 'u', long)]
    username: Option<String>,

    /// keep scores on this machine even if a server is configured
    #[clap(long)]
    offline: bool,

    /// write the session history as CSV to PATH and exit
    #[clap(long, value_name = "PATH")]
    export_history: Option<PathBuf>,

    /// print today's leaderboard and exit
    #[clap(long)]
    leaderboard: bool,

    /// tracing filter, e.g. `debug` or `marstype=trace`
    #[clap(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Command line values win over the stored config
    fn apply(&self, config: &mut Config) {
        if let Some(language) = self.language {
            config.language = language;
        }
        if let Some(duration) = self.duration {
            config.duration_secs = duration;
        }
        if let Some(server) = &self.server {
            config.server_url = Some(server.clone());
        }
        if let Some(username) = &self.username {
            config.username = username.clone();
        }
        if self.offline {
            config.offline = true;
        }
    }

    fn is_interactive(&self) -> bool {
        self.export_history.is_none() && !self.leaderboard
    }
}

fn build_client(
    cli: &Cli,
    config: &Config,
    history_path: &Path,
) -> Result<Arc<dyn Leaderboard>, Box<dyn Error>> {
    match config.remote_server() {
        Some(url) => {
            let auth = AuthSession::resolve(cli.token.clone());
            info!(%url, authenticated = auth.is_authenticated(), "reporting to server");
            Ok(Arc::new(HttpLeaderboard::new(
                url,
                auth,
                config.request_timeout(),
            )?))
        }
        None => {
            info!(path = %history_path.display(), "reporting to local leaderboard");
            Ok(Arc::new(LocalLeaderboard::open(
                history_path,
                config.username.clone(),
            )?))
        }
    }
}

fn print_leaderboard(page: &LeaderboardPage) {
    if page.entries.is_empty() {
        println!("no attempts yet today");
        return;
    }
    println!(
        "{:<6}{:<20}{:>6}{:>8}{:>8}",
        "rank", "player", "games", "score", "reward"
    );
    for entry in &page.entries {
        let marker = if page.is_current_user(entry) { "*" } else { "" };
        println!(
            "{:<6}{:<20}{:>6}{:>8.0}{:>8}",
            format!("#{}{marker}", entry.rank),
            entry.username,
            entry.attempts_count,
            entry.total_score,
            entry.potential_reward
        );
    }
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply(&mut config);

    let log_dir = if cli.is_interactive() {
        AppDirs::log_dir()
    } else {
        None
    };
    let _log_guard = init_tracing(&cli.log_level, log_dir.as_deref());

    if let Err(err) = store.save(&config) {
        warn!(error = %err, "failed to save config");
    }

    let history_path = AppDirs::history_db_path().ok_or("could not resolve a state directory")?;

    if let Some(out) = &cli.export_history {
        let written = HistoryDb::open(&history_path)?.export_csv(out)?;
        println!("exported {written} sessions to {}", out.display());
        return Ok(());
    }

    let client = build_client(&cli, &config, &history_path)?;

    if cli.leaderboard {
        print_leaderboard(&client.fetch()?);
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let events = CrosstermEventSource::new();
    let mut app = App::new(config, Box::new(store), client, events.sender())?;
    match HistoryDb::open(&history_path) {
        Ok(history) => app = app.with_history(history),
        Err(err) => warn!(error = %err, "session history unavailable"),
    }
    let runner = Runner::new(
        events,
        FixedTicker::new(Duration::from_millis(FRAME_INTERVAL_MS)),
    );

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        default_hook(info);
    }));

    enable_raw_mode()?;
    let outcome = run_terminal(&mut app, &runner);
    restore_terminal()?;
    outcome
}

fn run_terminal<E: AppEventSource, T: Ticker>(
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let outcome = start_tui(&mut terminal, app, runner);
    terminal.show_cursor()?;
    outcome
}

fn start_tui<B: Backend, E: AppEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        for event in runner.step() {
            if app.handle(event) == Control::Quit {
                return Ok(());
            }
        }
    }
}
