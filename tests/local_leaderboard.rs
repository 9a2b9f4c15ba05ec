use chrono::{Local, TimeZone};
use tempfile::tempdir;

use marstype::history::{HistoryDb, SessionRecord};
use marstype::language::Language;
use marstype::leaderboard::{Leaderboard, LocalLeaderboard, ScoreSubmission};
use marstype::session::SessionResult;

#[test]
fn standings_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state").join("history.db");

    {
        let nova = LocalLeaderboard::open(&path, "nova").unwrap();
        nova.submit_for_season(
            "2026-10-19",
            &ScoreSubmission {
                wpm: 80,
                accuracy: 95,
                score: 76,
            },
        )
        .unwrap();
    }

    let kai = LocalLeaderboard::open(&path, "kai").unwrap();
    let receipt = kai
        .submit_for_season(
            "2026-10-19",
            &ScoreSubmission {
                wpm: 40,
                accuracy: 100,
                score: 40,
            },
        )
        .unwrap();
    assert_eq!(receipt.rank, Some(2));
    assert_eq!(receipt.reward(), 0);

    let page = kai.fetch_season("2026-10-19").unwrap();
    let names: Vec<&str> = page.entries.iter().map(|e| e.username.as_str()).collect();
    assert_eq!(names, ["nova", "kai"]);
    assert_eq!(page.entries[0].potential_reward, 50);
    assert_eq!(page.entries[1].potential_reward, 30);
    assert!(page.is_current_user(&page.entries[1]));
}

#[test]
fn history_and_attempts_share_a_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.db");

    let history = HistoryDb::open(&path).unwrap();
    history
        .record(&SessionRecord {
            played_at: Local.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap(),
            language: Language::Russian,
            result: SessionResult::compute(30, 0, 60),
        })
        .unwrap();

    let board = LocalLeaderboard::open(&path, "nova").unwrap();
    board
        .submit(&ScoreSubmission::from(&SessionResult::compute(30, 0, 60)))
        .unwrap();

    assert_eq!(history.session_count().unwrap(), 1);
    assert_eq!(board.fetch().unwrap().entries.len(), 1);

    let csv = dir.path().join("out.csv");
    assert_eq!(history.export_csv(&csv).unwrap(), 1);
    let text = std::fs::read_to_string(csv).unwrap();
    assert!(text.contains(",russian,60,30,0,30,100,30"));
}
