use std::path::Path;

use chrono::{DateTime, Local};
use clap::ValueEnum;
use rusqlite::{params, types::Type, Connection};
use serde::Serialize;
use tracing::debug;

use crate::language::Language;
use crate::leaderboard::{season_reward, LeaderboardEntry, LeaderboardPage, ScoreSubmission};
use crate::session::SessionResult;
use crate::Result;

/// A finished session as kept in the local history
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub played_at: DateTime<Local>,
    pub language: Language,
    pub result: SessionResult,
}

#[derive(Debug, Serialize)]
struct CsvRow {
    played_at: String,
    language: String,
    duration_secs: u32,
    correct_words: u32,
    incorrect_words: u32,
    wpm: u32,
    accuracy: u32,
    score: u32,
}

const CSV_HEADER: [&str; 8] = [
    "played_at",
    "language",
    "duration_secs",
    "correct_words",
    "incorrect_words",
    "wpm",
    "accuracy",
    "score",
];

/// Local SQLite store for finished sessions and offline season attempts
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                played_at TEXT NOT NULL,
                language TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                correct_words INTEGER NOT NULL,
                incorrect_words INTEGER NOT NULL,
                wpm INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                score INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_played_at ON sessions(played_at);

            CREATE TABLE IF NOT EXISTS attempts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                season TEXT NOT NULL,
                wpm INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                score INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_attempts_season ON attempts(season);
            "#,
        )?;
        Ok(Self { conn })
    }

    pub fn record(&self, record: &SessionRecord) -> Result<()> {
        let r = &record.result;
        self.conn.execute(
            r#"
            INSERT INTO sessions
            (played_at, language, duration_secs, correct_words, incorrect_words, wpm, accuracy, score)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.played_at.to_rfc3339(),
                record.language.to_string(),
                r.duration_secs,
                r.correct_words,
                r.incorrect_words,
                r.wpm,
                r.accuracy,
                r.score,
            ],
        )?;
        debug!(wpm = r.wpm, score = r.score, "session recorded");
        Ok(())
    }

    /// Most recent sessions first
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        self.select_sessions(i64::try_from(limit).unwrap_or(i64::MAX))
    }

    // a negative limit means no limit to SQLite
    fn select_sessions(&self, limit: i64) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT played_at, language, duration_secs, correct_words, incorrect_words, wpm, accuracy, score
            FROM sessions
            ORDER BY played_at DESC, id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit], |row| {
            let played_at: String = row.get(0)?;
            let played_at = DateTime::parse_from_rfc3339(&played_at)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
                })?
                .with_timezone(&Local);
            let language: String = row.get(1)?;
            let language = Language::from_str(&language, true)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, e.into()))?;

            Ok(SessionRecord {
                played_at,
                language,
                result: SessionResult {
                    duration_secs: row.get(2)?,
                    correct_words: row.get(3)?,
                    incorrect_words: row.get(4)?,
                    wpm: row.get(5)?,
                    accuracy: row.get(6)?,
                    score: row.get(7)?,
                },
            })
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    pub fn best_wpm(&self) -> Result<Option<u32>> {
        let best: Option<u32> =
            self.conn
                .query_row("SELECT MAX(wpm) FROM sessions", [], |row| row.get(0))?;
        Ok(best)
    }

    pub fn session_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Write every recorded session as CSV, oldest first. Returns the row count.
    pub fn export_csv(&self, path: &Path) -> Result<usize> {
        let mut records = self.select_sessions(-1)?;
        records.reverse();

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        wtr.write_record(CSV_HEADER)?;
        for record in &records {
            let r = &record.result;
            wtr.serialize(CsvRow {
                played_at: record.played_at.to_rfc3339(),
                language: record.language.to_string(),
                duration_secs: r.duration_secs,
                correct_words: r.correct_words,
                incorrect_words: r.incorrect_words,
                wpm: r.wpm,
                accuracy: r.accuracy,
                score: r.score,
            })?;
        }
        wtr.flush()?;
        Ok(records.len())
    }

    pub fn record_attempt(
        &self,
        username: &str,
        season: &str,
        submission: &ScoreSubmission,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO attempts (username, season, wpm, accuracy, score, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                username,
                season,
                submission.wpm,
                submission.accuracy,
                submission.score,
                Local::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Season table ranked by total score, highest first; ties go to the
    /// player with fewer attempts, then by name
    pub fn season_standings(
        &self,
        season: &str,
        limit: usize,
        current_user: &str,
    ) -> Result<LeaderboardPage> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT username, SUM(score) AS total, COUNT(*) AS games, MAX(wpm) AS best
            FROM attempts
            WHERE season = ?1
            GROUP BY username
            ORDER BY total DESC, games ASC, username ASC
            "#,
        )?;

        let rows = stmt.query_map([season], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, Option<u32>>(3)?,
            ))
        })?;

        let mut entries = Vec::new();
        for (idx, row) in rows.enumerate() {
            let (username, total, games, best) = row?;
            let rank = idx as u32 + 1;
            entries.push(LeaderboardEntry {
                rank,
                user_id: None,
                username,
                avatar_url: None,
                total_score: total as f64,
                attempts_count: games,
                best_wpm: best,
                potential_reward: season_reward(rank),
            });
        }

        let current_user_rank = entries
            .iter()
            .find(|e| e.username == current_user)
            .map(|e| e.rank);
        entries.truncate(limit);

        Ok(LeaderboardPage {
            entries,
            current_user_rank,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn record(minute: u32, correct: u32, incorrect: u32) -> SessionRecord {
        SessionRecord {
            played_at: Local.with_ymd_and_hms(2026, 3, 1, 10, minute, 0).unwrap(),
            language: Language::English,
            result: SessionResult::compute(correct, incorrect, 30),
        }
    }

    fn submission(score: u32, wpm: u32) -> ScoreSubmission {
        ScoreSubmission {
            wpm,
            accuracy: 100,
            score,
        }
    }

    #[test]
    fn record_and_read_back() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.record(&record(1, 20, 2)).unwrap();
        db.record(&record(2, 45, 5)).unwrap();

        let recent = db.recent(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].result.wpm, 90);
        assert_eq!(recent[1].result.correct_words, 20);
        assert_eq!(db.best_wpm().unwrap(), Some(90));
        assert_eq!(db.session_count().unwrap(), 2);
    }

    #[test]
    fn empty_history() {
        let db = HistoryDb::open_in_memory().unwrap();
        assert_eq!(db.best_wpm().unwrap(), None);
        assert!(db.recent(5).unwrap().is_empty());
    }

    #[test]
    fn unknown_language_is_an_error() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.record(&record(1, 20, 2)).unwrap();
        db.conn
            .execute("UPDATE sessions SET language = 'klingon'", [])
            .unwrap();

        let err = db.recent(5).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Database(rusqlite::Error::FromSqlConversionFailure(1, Type::Text, _))
        ));
    }

    #[test]
    fn stored_russian_reads_back() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.record(&SessionRecord {
            language: Language::Russian,
            ..record(1, 20, 2)
        })
        .unwrap();

        assert_eq!(db.recent(1).unwrap()[0].language, Language::Russian);
    }

    #[test]
    fn open_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");
        let db = HistoryDb::open(&path).unwrap();
        db.record(&record(0, 1, 0)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn export_csv_writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("history.csv");
        let db = HistoryDb::open_in_memory().unwrap();
        db.record(&record(2, 45, 5)).unwrap();
        db.record(&record(1, 10, 0)).unwrap();

        let written = db.export_csv(&out).unwrap();

        assert_eq!(written, 2);
        let text = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], CSV_HEADER.join(","));
        assert!(lines[1].ends_with(",english,30,10,0,20,100,20"));
        assert!(lines[2].ends_with(",english,30,45,5,90,90,81"));
    }

    #[test]
    fn season_standings_rank_by_total() {
        let db = HistoryDb::open_in_memory().unwrap();
        db.record_attempt("nova", "2026-03-01", &submission(40, 40)).unwrap();
        db.record_attempt("nova", "2026-03-01", &submission(50, 55)).unwrap();
        db.record_attempt("kai", "2026-03-01", &submission(70, 70)).unwrap();
        db.record_attempt("zed", "2026-03-01", &submission(10, 12)).unwrap();
        db.record_attempt("kai", "2026-02-28", &submission(500, 90)).unwrap();

        let page = db.season_standings("2026-03-01", 10, "kai").unwrap();

        let names: Vec<&str> = page.entries.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, vec!["nova", "kai", "zed"]);
        assert_eq!(page.entries[0].total_score, 90.0);
        assert_eq!(page.entries[0].attempts_count, 2);
        assert_eq!(page.entries[0].best_wpm, Some(55));
        assert_eq!(page.entries[0].potential_reward, 50);
        assert_eq!(page.entries[2].potential_reward, 20);
        assert_eq!(page.current_user_rank, Some(2));
    }

    #[test]
    fn season_standings_limit_keeps_user_rank() {
        let db = HistoryDb::open_in_memory().unwrap();
        for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
            db.record_attempt(name, "s", &submission(100 - i as u32, 50)).unwrap();
        }

        let page = db.season_standings("s", 2, "d").unwrap();

        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.current_user_rank, Some(4));
    }
}
