//! The external scoring/leaderboard collaborator.
//!
//! Responses are decoded into loose `Raw*` shapes first and then validated
//! into the public types, so a missing optional field falls back to its
//! documented default and a nonsensical value (negative reward, NaN score)
//! is rejected at the boundary instead of leaking into the UI.

pub mod http;
pub mod local;

pub use http::{AuthSession, HttpLeaderboard};
pub use local::LocalLeaderboard;

use serde::{Deserialize, Serialize};

use crate::session::SessionResult;
use crate::{Error, Result};

/// Coins paid to the top three of a season, by rank
pub const SEASON_REWARDS: [(u32, u32); 3] = [(1, 50), (2, 30), (3, 20)];

pub const LEADERBOARD_SIZE: usize = 10;

pub fn season_reward(rank: u32) -> u32 {
    SEASON_REWARDS
        .iter()
        .find(|(r, _)| *r == rank)
        .map(|(_, coins)| *coins)
        .unwrap_or(0)
}

/// Body of a score submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreSubmission {
    pub wpm: u32,
    pub accuracy: u32,
    pub score: u32,
}

impl From<&SessionResult> for ScoreSubmission {
    fn from(r: &SessionResult) -> Self {
        Self {
            wpm: r.wpm,
            accuracy: r.accuracy.min(100),
            score: r.score,
        }
    }
}

/// What the collaborator acknowledged for a submission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// coins credited for this attempt; absent means none
    pub coins_reward: Option<u32>,
    pub best_wpm: Option<u32>,
    pub rank: Option<u32>,
    /// wallet balance after crediting, when the backend reports it
    pub coins: Option<u64>,
}

impl SubmissionReceipt {
    pub fn reward(&self) -> u32 {
        self.coins_reward.unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: Option<u64>,
    pub username: String,
    pub avatar_url: Option<String>,
    pub total_score: f64,
    pub attempts_count: u32,
    pub best_wpm: Option<u32>,
    pub potential_reward: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaderboardPage {
    pub entries: Vec<LeaderboardEntry>,
    pub current_user_rank: Option<u32>,
}

impl LeaderboardPage {
    pub fn is_current_user(&self, entry: &LeaderboardEntry) -> bool {
        self.current_user_rank == Some(entry.rank)
    }
}

/// The scoring service a finished session is reported to
pub trait Leaderboard: Send + Sync {
    fn submit(&self, submission: &ScoreSubmission) -> Result<SubmissionReceipt>;

    fn fetch(&self) -> Result<LeaderboardPage>;

    /// Short label for logs and the status line
    fn name(&self) -> &'static str;
}

#[derive(Debug, Default, Deserialize)]
struct RawReceipt {
    coins_reward: Option<f64>,
    best_wpm: Option<f64>,
    rank: Option<f64>,
    coins: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    rank: Option<f64>,
    user_id: Option<u64>,
    username: String,
    avatar_url: Option<String>,
    #[serde(default)]
    total_score: f64,
    #[serde(default)]
    attempts_count: f64,
    best_wpm: Option<f64>,
    potential_reward: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLeaderboard {
    Page {
        leaderboard: Vec<RawEntry>,
        #[serde(default)]
        current_user_rank: Option<f64>,
    },
    List(Vec<RawEntry>),
}

fn non_negative(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidResponse(format!(
            "`{field}` must be a non-negative number, got {value}"
        )))
    }
}

fn whole(field: &str, value: Option<f64>) -> Result<Option<u32>> {
    value
        .map(|v| non_negative(field, v).map(|v| v.round() as u32))
        .transpose()
}

/// Validate a submission reply body. An empty body is an acknowledgement without extras.
pub fn parse_receipt(body: &str) -> Result<SubmissionReceipt> {
    let raw: RawReceipt = if body.trim().is_empty() {
        RawReceipt::default()
    } else {
        serde_json::from_str(body)?
    };

    Ok(SubmissionReceipt {
        coins_reward: whole("coins_reward", raw.coins_reward)?,
        best_wpm: whole("best_wpm", raw.best_wpm)?,
        rank: whole("rank", raw.rank)?.filter(|r| *r > 0),
        coins: raw
            .coins
            .map(|c| non_negative("coins", c).map(|c| c.round() as u64))
            .transpose()?,
    })
}

/// Validate a leaderboard body: either `{leaderboard, current_user_rank}` or a bare list
pub fn parse_leaderboard(body: &str) -> Result<LeaderboardPage> {
    let (raw_entries, current_user_rank) = match serde_json::from_str::<RawLeaderboard>(body)? {
        RawLeaderboard::Page {
            leaderboard,
            current_user_rank,
        } => (leaderboard, current_user_rank),
        RawLeaderboard::List(entries) => (entries, None),
    };

    let entries = raw_entries
        .into_iter()
        .enumerate()
        .map(|(idx, raw)| {
            let rank = whole("rank", raw.rank)?.unwrap_or(idx as u32 + 1);
            Ok(LeaderboardEntry {
                rank,
                user_id: raw.user_id,
                avatar_url: raw.avatar_url.filter(|u| !u.is_empty()),
                total_score: non_negative("total_score", raw.total_score)?,
                attempts_count: whole("attempts_count", Some(raw.attempts_count))?.unwrap_or(0),
                best_wpm: whole("best_wpm", raw.best_wpm)?,
                potential_reward: whole("potential_reward", raw.potential_reward)?
                    .unwrap_or_else(|| season_reward(rank)),
                username: raw.username,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(LeaderboardPage {
        entries,
        current_user_rank: whole("current_user_rank", current_user_rank)?,
    })
}
