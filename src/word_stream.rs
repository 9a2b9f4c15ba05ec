use rand::{seq::SliceRandom, Rng};

use crate::language::Dictionary;
use crate::session::SessionConfig;

/// Streams never hold fewer words than this
pub const MIN_STREAM_WORDS: usize = 100;

/// Typing speed no player is expected to sustain; streams are sized for twice that
pub const PEAK_WPM: usize = 300;

/// Number of words to generate for a session of `duration_secs`, capped at
/// the longest session a config accepts
pub fn stream_len(duration_secs: u32) -> usize {
    let secs = duration_secs.min(SessionConfig::MAX_DURATION_SECS) as usize;
    let reachable = (secs * PEAK_WPM).div_ceil(60);
    (reachable * 2).max(MIN_STREAM_WORDS)
}

/// The ordered words a session asks the player to type.
///
/// Words are drawn independently and uniformly with replacement, so the same
/// word may appear several times, even back to back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WordStream {
    words: Vec<String>,
}

impl WordStream {
    pub fn generate<R: Rng + ?Sized>(dictionary: &Dictionary, len: usize, rng: &mut R) -> Self {
        let words = (0..len)
            .filter_map(|_| dictionary.words.choose(rng).cloned())
            .collect();
        Self { words }
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.words.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Up to `count` words starting at `start`, clamped to the stream
    pub fn window(&self, start: usize, count: usize) -> &[String] {
        let start = start.min(self.words.len());
        let end = start.saturating_add(count).min(self.words.len());
        &self.words[start..end]
    }
}
