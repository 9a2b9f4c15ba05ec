use std::fmt;

use crate::leaderboard::SubmissionReceipt;

/// Non-blocking status shown under the results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Submitting,
    Rewarded { coins: u32 },
    Saved,
    SubmissionFailed,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Submitting => write!(f, "submitting score..."),
            Notice::Rewarded { coins } => write!(f, "+{coins} coins!"),
            Notice::Saved => write!(f, "score saved"),
            Notice::SubmissionFailed => {
                write!(f, "could not submit score, your result is kept locally")
            }
        }
    }
}

/// The player's state as displayed locally
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub username: String,
    pub coins: u64,
    pub best_wpm: Option<u32>,
    pub rank: Option<u32>,
    pub last_reward: Option<u32>,
    pub notice: Option<Notice>,
}

impl UserProfile {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    /// Merge an acknowledged submission
    pub fn apply_receipt(&mut self, receipt: &SubmissionReceipt) {
        let reward = receipt.reward();
        match receipt.coins {
            Some(balance) => self.coins = balance,
            None => self.coins = self.coins.saturating_add(reward as u64),
        }
        if let Some(best) = receipt.best_wpm {
            self.note_wpm(best);
        }
        if receipt.rank.is_some() {
            self.rank = receipt.rank;
        }
        self.last_reward = Some(reward);
        self.notice = Some(if reward > 0 {
            Notice::Rewarded { coins: reward }
        } else {
            Notice::Saved
        });
    }

    pub fn note_failure(&mut self) {
        self.last_reward = None;
        self.notice = Some(Notice::SubmissionFailed);
    }

    /// Best WPM never goes down locally
    pub fn note_wpm(&mut self, wpm: u32) {
        self.best_wpm = Some(self.best_wpm.map_or(wpm, |b| b.max(wpm)));
    }
}
