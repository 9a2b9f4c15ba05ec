use std::path::Path;
use std::sync::Mutex;

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use super::{Leaderboard, LeaderboardPage, ScoreSubmission, SubmissionReceipt, LEADERBOARD_SIZE};
use crate::history::HistoryDb;
use crate::{Error, Result};

/// Seasons are daily challenges keyed by local date
pub fn season_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

fn current_season() -> String {
    season_key(Local::now().date_naive())
}

/// Offline stand-in for the backend, ranking attempts stored on this machine.
///
/// Rewards are paid out by the backend when a season closes, so a local
/// submission never credits coins.
#[derive(Debug)]
pub struct LocalLeaderboard {
    db: Mutex<HistoryDb>,
    username: String,
}

impl LocalLeaderboard {
    pub fn new(db: HistoryDb, username: impl Into<String>) -> Self {
        Self {
            db: Mutex::new(db),
            username: username.into(),
        }
    }

    pub fn open(path: &Path, username: impl Into<String>) -> Result<Self> {
        Ok(Self::new(HistoryDb::open(path)?, username))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn with_db<T>(&self, f: impl FnOnce(&HistoryDb) -> Result<T>) -> Result<T> {
        let db = self
            .db
            .lock()
            .map_err(|_| Error::InvalidResponse("local leaderboard lock poisoned".into()))?;
        f(&db)
    }

    pub fn submit_for_season(
        &self,
        season: &str,
        submission: &ScoreSubmission,
    ) -> Result<SubmissionReceipt> {
        self.with_db(|db| {
            db.record_attempt(&self.username, season, submission)?;
            let page = db.season_standings(season, usize::MAX, &self.username)?;
            let mine = page.entries.iter().find(|e| e.username == self.username);
            info!(
                season,
                score = submission.score,
                rank = ?page.current_user_rank,
                "attempt stored locally"
            );
            Ok(SubmissionReceipt {
                coins_reward: Some(0),
                best_wpm: mine.and_then(|e| e.best_wpm),
                rank: page.current_user_rank,
                coins: None,
            })
        })
    }

    pub fn fetch_season(&self, season: &str) -> Result<LeaderboardPage> {
        debug!(season, "reading local standings");
        self.with_db(|db| db.season_standings(season, LEADERBOARD_SIZE, &self.username))
    }
}

impl Leaderboard for LocalLeaderboard {
    fn submit(&self, submission: &ScoreSubmission) -> Result<SubmissionReceipt> {
        self.submit_for_season(&current_season(), submission)
    }

    fn fetch(&self) -> Result<LeaderboardPage> {
        self.fetch_season(&current_season())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
