use serde::{Deserialize, Serialize};

use crate::language::Language;
use crate::{Error, Result};

/// Settings for one timed trial. Changing them resets the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub language: Language,
    pub duration_secs: u32,
}

impl SessionConfig {
    pub const DURATION_PRESETS: [u32; 3] = [15, 30, 60];
    /// One hour; the word stream is sized from the duration
    pub const MAX_DURATION_SECS: u32 = 3600;

    pub fn new(language: Language, duration_secs: u32) -> Result<Self> {
        Self::check_duration(duration_secs)?;
        Ok(Self {
            language,
            duration_secs,
        })
    }

    pub fn check_duration(duration_secs: u32) -> Result<()> {
        if duration_secs == 0 {
            return Err(Error::Config("duration must be at least one second".into()));
        }
        if duration_secs > Self::MAX_DURATION_SECS {
            return Err(Error::Config(format!(
                "duration must be at most {} seconds",
                Self::MAX_DURATION_SECS
            )));
        }
        Ok(())
    }

    pub fn with_language(self, language: Language) -> Self {
        Self { language, ..self }
    }

    /// Next duration preset; a custom duration jumps to the first preset above it
    pub fn next_duration(self) -> Self {
        let duration_secs = Self::DURATION_PRESETS
            .iter()
            .copied()
            .find(|p| *p > self.duration_secs)
            .unwrap_or(Self::DURATION_PRESETS[0]);
        Self {
            duration_secs,
            ..self
        }
    }

    pub fn prev_duration(self) -> Self {
        let duration_secs = Self::DURATION_PRESETS
            .iter()
            .rev()
            .copied()
            .find(|p| *p < self.duration_secs)
            .unwrap_or(Self::DURATION_PRESETS[Self::DURATION_PRESETS.len() - 1]);
        Self {
            duration_secs,
            ..self
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            language: Language::English,
            duration_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    NotStarted,
    Running,
    Finished,
}

/// Mutable per-session state, owned by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub phase: Phase,
    pub current_word_index: usize,
    pub current_input: String,
    pub correct_word_count: u32,
    pub incorrect_word_count: u32,
    pub time_remaining_secs: u32,
}

impl SessionState {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            phase: Phase::NotStarted,
            current_word_index: 0,
            current_input: String::new(),
            correct_word_count: 0,
            incorrect_word_count: 0,
            time_remaining_secs: duration_secs,
        }
    }

    pub fn completed_words(&self) -> u32 {
        self.correct_word_count + self.incorrect_word_count
    }
}

/// Final metrics of a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionResult {
    pub wpm: u32,
    pub accuracy: u32,
    pub score: u32,
    pub correct_words: u32,
    pub incorrect_words: u32,
    pub duration_secs: u32,
}

impl SessionResult {
    pub fn compute(correct_words: u32, incorrect_words: u32, duration_secs: u32) -> Self {
        let wpm = if duration_secs == 0 {
            0
        } else {
            (correct_words as f64 / duration_secs as f64 * 60.0).round() as u32
        };

        let attempted = correct_words + incorrect_words;
        let accuracy = if attempted == 0 {
            100
        } else {
            (correct_words as f64 / attempted as f64 * 100.0).round() as u32
        };

        let score = (wpm as f64 * accuracy as f64 / 100.0).round() as u32;

        Self {
            wpm,
            accuracy,
            score,
            correct_words,
            incorrect_words,
            duration_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_reference_values() {
        let r = SessionResult::compute(45, 5, 30);

        assert_eq!(r.wpm, 90);
        assert_eq!(r.accuracy, 90);
        assert_eq!(r.score, 81);
    }

    #[test]
    fn test_result_no_words() {
        let r = SessionResult::compute(0, 0, 15);

        assert_eq!(r.wpm, 0);
        assert_eq!(r.accuracy, 100);
        assert_eq!(r.score, 0);
    }

    #[test]
    fn test_result_all_wrong() {
        let r = SessionResult::compute(0, 12, 30);

        assert_eq!(r.wpm, 0);
        assert_eq!(r.accuracy, 0);
        assert_eq!(r.score, 0);
    }

    #[test]
    fn test_result_rounding() {
        // 7 / 15 * 60 = 28, 7 / 9 * 100 = 77.78
        let r = SessionResult::compute(7, 2, 15);
        assert_eq!(r.wpm, 28);
        assert_eq!(r.accuracy, 78);
        // 28 * 78 / 100 = 21.84
        assert_eq!(r.score, 22);

        // 1 / 2 * 100 = 50, 2 / 3 * 100 = 66.67
        let r = SessionResult::compute(1, 1, 60);
        assert_eq!(r.wpm, 1);
        assert_eq!(r.accuracy, 50);
        assert_eq!(r.score, 1);
    }

    #[test]
    fn test_config_rejects_zero_duration() {
        assert!(matches!(
            SessionConfig::new(Language::Russian, 0),
            Err(Error::Config(_))
        ));
        let cfg = SessionConfig::new(Language::Russian, 45).unwrap();
        assert_eq!(cfg.duration_secs, 45);
    }

    #[test]
    fn test_config_rejects_oversized_duration() {
        let max = SessionConfig::MAX_DURATION_SECS;
        assert_eq!(
            SessionConfig::new(Language::English, max).unwrap().duration_secs,
            max
        );
        assert!(matches!(
            SessionConfig::new(Language::English, max + 1),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            SessionConfig::new(Language::English, u32::MAX),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_duration_presets_cycle() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.duration_secs, 30);
        assert_eq!(cfg.next_duration().duration_secs, 60);
        assert_eq!(cfg.next_duration().next_duration().duration_secs, 15);
        assert_eq!(cfg.prev_duration().duration_secs, 15);
        assert_eq!(cfg.prev_duration().prev_duration().duration_secs, 60);

        let custom = SessionConfig::new(Language::English, 20).unwrap();
        assert_eq!(custom.next_duration().duration_secs, 30);
        assert_eq!(custom.prev_duration().duration_secs, 15);
    }

    #[test]
    fn test_state_starts_clean() {
        let state = SessionState::new(15);

        assert_eq!(state.phase, Phase::NotStarted);
        assert_eq!(state.time_remaining_secs, 15);
        assert_eq!(state.completed_words(), 0);
        assert!(state.current_input.is_empty());
    }
}
