use assert_matches::assert_matches;
use rand::{rngs::StdRng, SeedableRng};

use marstype::engine::{char_statuses, CharStatus, Engine, KeyOutcome, TickOutcome, WordVerdict};
use marstype::language::{Dictionary, Language};
use marstype::session::{Phase, SessionConfig, SessionResult};
use marstype::word_stream::WordStream;

fn engine_with(words: &[&str], duration_secs: u32, seed: u64) -> Engine {
    let config = SessionConfig::new(Language::English, duration_secs).unwrap();
    Engine::with_rng(config, StdRng::seed_from_u64(seed))
        .unwrap()
        .with_stream(WordStream::from_words(words.iter().copied()))
}

fn assert_counters_consistent(engine: &Engine) {
    let s = engine.state();
    assert_eq!(
        (s.correct_word_count + s.incorrect_word_count) as usize,
        s.current_word_index
    );
}

#[test]
fn counters_track_index_through_a_session() {
    let mut engine = engine_with(&["the", "red", "planet", "dust", "storm"], 5, 1);

    for c in "the rad planet  dust ".chars() {
        engine.write(c);
        assert_counters_consistent(&engine);
        engine.write('x');
        engine.backspace();
        assert_counters_consistent(&engine);
    }

    assert_eq!(engine.state().correct_word_count, 3);
    assert_eq!(engine.state().incorrect_word_count, 1);
    assert_eq!(
        engine.verdicts(),
        &[
            WordVerdict::Correct,
            WordVerdict::Incorrect,
            WordVerdict::Correct,
            WordVerdict::Correct
        ]
    );
}

#[test]
fn timer_counts_down_to_zero_once() {
    let mut engine = engine_with(&["a", "b", "c"], 3, 2);
    assert_eq!(engine.on_tick(), TickOutcome::Ignored);

    engine.write('a');
    let mut last = engine.state().time_remaining_secs;
    let mut finishes = 0;
    for _ in 0..10 {
        match engine.on_tick() {
            TickOutcome::Counting(left) => {
                assert!(left < last);
                last = left;
            }
            TickOutcome::Finished(_) => finishes += 1,
            TickOutcome::Ignored => {}
        }
        assert!(engine.state().time_remaining_secs <= last);
    }

    assert_eq!(finishes, 1);
    assert_eq!(engine.state().time_remaining_secs, 0);
    assert_eq!(engine.phase(), Phase::Finished);
}

#[test]
fn reference_metrics() {
    assert_eq!(
        SessionResult::compute(45, 5, 30),
        SessionResult {
            wpm: 90,
            accuracy: 90,
            score: 81,
            correct_words: 45,
            incorrect_words: 5,
            duration_secs: 30,
        }
    );

    let empty = SessionResult::compute(0, 0, 30);
    assert_eq!((empty.wpm, empty.accuracy, empty.score), (0, 100, 0));
}

#[test]
fn idle_session_scores_zero() {
    let mut engine = engine_with(&["mars"], 1, 3);
    engine.write('m');
    let result = assert_matches!(engine.on_tick(), TickOutcome::Finished(r) => r);

    assert_eq!(result.wpm, 0);
    assert_eq!(result.accuracy, 100);
    assert_eq!(engine.result(), Some(result));
}

#[test]
fn word_boundary_classifies() {
    let mut engine = engine_with(&["Mars", "rover"], 30, 4);

    for c in "Mars".chars() {
        engine.write(c);
    }
    assert_eq!(
        engine.write(' '),
        KeyOutcome::WordCompleted(WordVerdict::Correct)
    );
    assert_eq!(engine.state().current_word_index, 1);
    assert_eq!(engine.state().current_input, "");

    for c in "Rover".chars() {
        engine.write(c);
    }
    // case sensitive; the last word exhausts the stream
    let result = assert_matches!(engine.write(' '), KeyOutcome::Finished(r) => r);
    assert_eq!(result.incorrect_words, 1);
}

#[test]
fn program_statuses() {
    use CharStatus::*;
    assert_eq!(
        char_statuses("pr0g", "program"),
        vec![Correct, Correct, Incorrect, Correct, Pending, Pending, Pending]
    );
}

#[test]
fn reset_after_finish_draws_a_fresh_stream() {
    let dictionary = Dictionary::from_words(
        "test",
        (0..50).map(|i| format!("w{i}")).collect(),
    )
    .unwrap();
    let config = SessionConfig::new(Language::English, 1).unwrap();
    let mut engine = Engine::with_dictionary(config, dictionary, StdRng::seed_from_u64(9));
    let first: Vec<String> = engine.words().words().to_vec();

    engine.write('x');
    engine.write(' ');
    assert_matches!(engine.on_tick(), TickOutcome::Finished(_));
    let generation = engine.generation();

    engine.reset();

    let s = engine.state();
    assert_eq!(s.phase, Phase::NotStarted);
    assert_eq!((s.correct_word_count, s.incorrect_word_count), (0, 0));
    assert_eq!(s.current_word_index, 0);
    assert_eq!(s.time_remaining_secs, 1);
    assert_eq!(engine.result(), None);
    assert_eq!(engine.generation(), generation + 1);
    assert_ne!(engine.words().words(), first.as_slice());
}

#[test]
fn keys_after_expiry_are_ignored() {
    let mut engine = engine_with(&["mars", "space"], 1, 5);
    for c in "mar".chars() {
        engine.write(c);
    }
    let result = assert_matches!(engine.on_tick(), TickOutcome::Finished(r) => r);

    assert_eq!(engine.write('s'), KeyOutcome::Ignored);
    assert_eq!(engine.write(' '), KeyOutcome::Ignored);
    assert!(!engine.backspace());
    assert_eq!(engine.result(), Some(result));
    assert_eq!(result.correct_words, 0);
}

#[test]
fn russian_session_runs() {
    let config = SessionConfig::new(Language::Russian, 15).unwrap();
    let mut engine = Engine::with_rng(config, StdRng::seed_from_u64(6)).unwrap();
    let first = engine.current_word().unwrap().to_string();

    for c in first.chars() {
        engine.write(c);
    }
    engine.write(' ');

    assert_eq!(engine.state().correct_word_count, 1);
    assert!(first.chars().all(|c| ('а'..='я').contains(&c) || c == 'ё'));
}
