use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, warn};

use crate::language::Dictionary;
use crate::session::{Phase, SessionConfig, SessionResult, SessionState};
use crate::word_stream::{stream_len, WordStream};
use crate::{Error, Result};

/// Character that terminates the word being typed
pub const WORD_BOUNDARY: char = ' ';

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum CharStatus {
    Correct,
    Incorrect,
    Pending,
    /// typed past the end of the target word
    Extra,
}

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum WordVerdict {
    Correct,
    Incorrect,
}

/// What a keystroke did to the session
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    /// first keystroke; the countdown should be armed
    Started,
    Typed,
    WordCompleted(WordVerdict),
    /// the word stream ran out before the timer did
    Finished(SessionResult),
}

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Ignored,
    Counting(u32),
    Finished(SessionResult),
}

/// Per-position status of `input` typed against `target`.
///
/// One entry per target character, followed by one `Extra` entry for every
/// typed character beyond the target's length.
pub fn char_statuses(input: &str, target: &str) -> Vec<CharStatus> {
    let mut typed = input.chars();
    let mut statuses: Vec<CharStatus> = target
        .chars()
        .map(|expected| match typed.next() {
            Some(c) if c == expected => CharStatus::Correct,
            Some(_) => CharStatus::Incorrect,
            None => CharStatus::Pending,
        })
        .collect();
    statuses.extend(typed.map(|_| CharStatus::Extra));
    statuses
}

/// One timed typing trial
#[derive(Debug)]
pub struct Engine {
    config: SessionConfig,
    dictionary: Dictionary,
    words: WordStream,
    state: SessionState,
    verdicts: Vec<WordVerdict>,
    result: Option<SessionResult>,
    generation: u64,
    rng: StdRng,
}

impl Engine {
    pub fn new(config: SessionConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: SessionConfig, rng: StdRng) -> Result<Self> {
        let dictionary = config.language.dictionary()?;
        Ok(Self::with_dictionary(config, dictionary, rng))
    }

    pub fn with_dictionary(config: SessionConfig, dictionary: Dictionary, rng: StdRng) -> Self {
        let mut engine = Self {
            state: SessionState::new(config.duration_secs),
            config,
            dictionary,
            words: WordStream::default(),
            verdicts: Vec::new(),
            result: None,
            generation: 0,
            rng,
        };
        engine.words = engine.draw_words();
        engine
    }

    /// Replace the freshly drawn stream with a fixed one; only valid before the first keystroke
    pub fn with_stream(mut self, words: WordStream) -> Self {
        if self.state.phase == Phase::NotStarted {
            self.words = words;
        }
        self
    }

    fn draw_words(&mut self) -> WordStream {
        WordStream::generate(
            &self.dictionary,
            stream_len(self.config.duration_secs),
            &mut self.rng,
        )
    }

    pub fn write(&mut self, c: char) -> KeyOutcome {
        match self.state.phase {
            Phase::Finished => KeyOutcome::Ignored,
            Phase::NotStarted => {
                if c == WORD_BOUNDARY {
                    return KeyOutcome::Ignored;
                }
                self.state.phase = Phase::Running;
                self.state.current_input.push(c);
                info!(
                    language = %self.config.language,
                    duration_secs = self.config.duration_secs,
                    generation = self.generation,
                    "session started"
                );
                KeyOutcome::Started
            }
            Phase::Running => {
                if c != WORD_BOUNDARY {
                    self.state.current_input.push(c);
                    return KeyOutcome::Typed;
                }
                if self.state.current_input.trim().is_empty() {
                    return KeyOutcome::Ignored;
                }
                self.complete_word()
            }
        }
    }

    fn complete_word(&mut self) -> KeyOutcome {
        let typed = std::mem::take(&mut self.state.current_input);
        let idx = self.state.current_word_index;

        let verdict = match self.words.get(idx) {
            Some(target) if typed.trim() == target => WordVerdict::Correct,
            _ => WordVerdict::Incorrect,
        };

        match verdict {
            WordVerdict::Correct => self.state.correct_word_count += 1,
            WordVerdict::Incorrect => self.state.incorrect_word_count += 1,
        }
        self.verdicts.push(verdict);
        self.state.current_word_index += 1;
        debug!(index = idx, ?verdict, "word completed");

        if self.state.current_word_index >= self.words.len() {
            warn!(
                words = self.words.len(),
                "word stream exhausted before the timer, finishing early"
            );
            return KeyOutcome::Finished(self.finish());
        }

        KeyOutcome::WordCompleted(verdict)
    }

    pub fn backspace(&mut self) -> bool {
        if self.state.phase != Phase::Running {
            return false;
        }
        self.state.current_input.pop().is_some()
    }

    /// Advance the countdown by one second
    pub fn on_tick(&mut self) -> TickOutcome {
        if self.state.phase != Phase::Running {
            return TickOutcome::Ignored;
        }

        self.state.time_remaining_secs = self.state.time_remaining_secs.saturating_sub(1);

        if self.state.time_remaining_secs == 0 {
            TickOutcome::Finished(self.finish())
        } else {
            TickOutcome::Counting(self.state.time_remaining_secs)
        }
    }

    fn finish(&mut self) -> SessionResult {
        self.state.phase = Phase::Finished;
        let result = SessionResult::compute(
            self.state.correct_word_count,
            self.state.incorrect_word_count,
            self.config.duration_secs,
        );
        self.result = Some(result);
        info!(
            wpm = result.wpm,
            accuracy = result.accuracy,
            score = result.score,
            generation = self.generation,
            "session finished"
        );
        result
    }

    pub fn reset(&mut self) {
        self.words = self.draw_words();
        self.state = SessionState::new(self.config.duration_secs);
        self.verdicts.clear();
        self.result = None;
        self.generation += 1;
        debug!(generation = self.generation, "session reset");
    }

    /// Apply new settings; refused while a session is running
    pub fn reconfigure(&mut self, config: SessionConfig) -> Result<()> {
        if self.state.phase == Phase::Running {
            return Err(Error::SessionRunning);
        }
        SessionConfig::check_duration(config.duration_secs)?;
        if config.language != self.config.language {
            self.dictionary = config.language.dictionary()?;
        }
        self.config = config;
        self.reset();
        Ok(())
    }

    pub fn current_char_statuses(&self) -> Vec<CharStatus> {
        char_statuses(&self.state.current_input, self.current_word().unwrap_or(""))
    }

    pub fn current_word(&self) -> Option<&str> {
        self.words.get(self.state.current_word_index)
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn words(&self) -> &WordStream {
        &self.words
    }

    pub fn verdicts(&self) -> &[WordVerdict] {
        &self.verdicts
    }

    pub fn result(&self) -> Option<SessionResult> {
        self.result
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_started(&self) -> bool {
        self.state.phase != Phase::NotStarted
    }

    pub fn has_finished(&self) -> bool {
        self.state.phase == Phase::Finished
    }

    pub fn is_running(&self) -> bool {
        self.state.phase == Phase::Running
    }
}
