use std::io;
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{info, warn};

use crate::leaderboard::{Leaderboard, LeaderboardPage, ScoreSubmission, SubmissionReceipt};
use crate::profile::UserProfile;
use crate::session::SessionResult;

/// Outcome of a background submission, posted back to the event loop
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReply {
    pub generation: u64,
    pub submission: ScoreSubmission,
    pub outcome: Result<SubmissionReceipt, String>,
}

type Job = Box<dyn FnOnce() + Send>;
type Spawner = fn(&'static str, Job) -> io::Result<()>;

fn spawn_named(name: &'static str, job: Job) -> io::Result<()> {
    thread::Builder::new().name(name.into()).spawn(job).map(|_| ())
}

/// Sends each finished session's result to the leaderboard collaborator, once.
///
/// Calls run on a detached worker thread and are never retried or cancelled;
/// the reply comes back through the `deliver` callback. If the worker cannot
/// be started, `deliver` is called right away with an error.
pub struct ScoreReporter {
    client: Arc<dyn Leaderboard>,
    last_submitted: Option<u64>,
    spawner: Spawner,
}

impl ScoreReporter {
    pub fn new(client: Arc<dyn Leaderboard>) -> Self {
        Self {
            client,
            last_submitted: None,
            spawner: spawn_named,
        }
    }

    pub fn backend(&self) -> &'static str {
        self.client.name()
    }

    pub fn has_submitted(&self, generation: u64) -> bool {
        self.last_submitted == Some(generation)
    }

    /// Submit `result` for the session `generation`. Returns `false` without
    /// doing anything when that session was already submitted.
    pub fn submit<F>(&mut self, generation: u64, result: &SessionResult, deliver: F) -> bool
    where
        F: FnOnce(SubmissionReply) + Send + 'static,
    {
        if self.has_submitted(generation) {
            warn!(generation, "session already submitted, skipping");
            return false;
        }
        self.last_submitted = Some(generation);

        let submission = ScoreSubmission::from(result);
        let client = Arc::clone(&self.client);
        self.run_detached(
            "score-submit",
            move || SubmissionReply {
                generation,
                submission,
                outcome: client.submit(&submission).map_err(|e| e.to_string()),
            },
            deliver,
            move |err| SubmissionReply {
                generation,
                submission,
                outcome: Err(format!("could not start submission: {err}")),
            },
        );
        info!(
            generation,
            backend = self.client.name(),
            wpm = submission.wpm,
            score = submission.score,
            "score submitted"
        );
        true
    }

    /// Load the leaderboard in the background
    pub fn fetch_leaderboard<F>(&self, deliver: F)
    where
        F: FnOnce(Result<LeaderboardPage, String>) + Send + 'static,
    {
        let client = Arc::clone(&self.client);
        self.run_detached(
            "leaderboard-fetch",
            move || client.fetch().map_err(|e| e.to_string()),
            deliver,
            |err| Err(format!("could not start leaderboard request: {err}")),
        );
    }

    /// Run `job` on a named worker and hand its output to `deliver`; when no
    /// worker can be spawned, `deliver` gets `on_spawn_error`'s value instead.
    fn run_detached<T, J, D, E>(&self, name: &'static str, job: J, deliver: D, on_spawn_error: E)
    where
        T: 'static,
        J: FnOnce() -> T + Send + 'static,
        D: FnOnce(T) + Send + 'static,
        E: FnOnce(io::Error) -> T,
    {
        let slot = Arc::new(Mutex::new(Some(deliver)));
        let worker_slot = Arc::clone(&slot);
        let spawned = (self.spawner)(
            name,
            Box::new(move || {
                let output = job();
                if let Some(deliver) = take(&worker_slot) {
                    deliver(output);
                }
            }),
        );
        if let Err(err) = spawned {
            warn!(worker = name, error = %err, "failed to spawn worker");
            if let Some(deliver) = take(&slot) {
                deliver(on_spawn_error(err));
            }
        }
    }
}

fn take<D>(slot: &Mutex<Option<D>>) -> Option<D> {
    slot.lock().ok().and_then(|mut deliver| deliver.take())
}

/// Fold a submission reply into the displayed profile
pub fn reconcile(profile: &mut UserProfile, reply: &SubmissionReply) {
    match &reply.outcome {
        Ok(receipt) => {
            info!(
                generation = reply.generation,
                reward = receipt.reward(),
                rank = ?receipt.rank,
                "score acknowledged"
            );
            profile.apply_receipt(receipt);
        }
        Err(err) => {
            warn!(generation = reply.generation, error = %err, "score submission failed");
            profile.note_failure();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::LeaderboardEntry;
    use crate::{Error, Result};
    use std::sync::mpsc;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeBoard {
        fail: bool,
        seen: Mutex<Vec<ScoreSubmission>>,
    }

    impl Leaderboard for FakeBoard {
        fn submit(&self, submission: &ScoreSubmission) -> Result<SubmissionReceipt> {
            self.seen.lock().unwrap().push(*submission);
            if self.fail {
                return Err(Error::InvalidResponse("boom".into()));
            }
            Ok(SubmissionReceipt {
                coins_reward: Some(5),
                ..SubmissionReceipt::default()
            })
        }

        fn fetch(&self) -> Result<LeaderboardPage> {
            Ok(LeaderboardPage {
                entries: vec![LeaderboardEntry {
                    rank: 1,
                    user_id: Some(1),
                    username: "nova".into(),
                    avatar_url: None,
                    total_score: 10.0,
                    attempts_count: 1,
                    best_wpm: None,
                    potential_reward: 50,
                }],
                current_user_rank: None,
            })
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    #[test]
    fn submits_once_per_generation() {
        let board = Arc::new(FakeBoard::default());
        let mut reporter = ScoreReporter::new(board.clone());
        let result = SessionResult::compute(45, 5, 30);
        let (tx, rx) = mpsc::channel();

        let tx1 = tx.clone();
        assert!(reporter.submit(0, &result, move |r| tx1.send(r).unwrap()));
        let tx2 = tx.clone();
        assert!(!reporter.submit(0, &result, move |r| tx2.send(r).unwrap()));

        let reply = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(reply.generation, 0);
        assert_eq!(reply.submission.score, 81);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        assert_eq!(board.seen.lock().unwrap().len(), 1);

        assert!(reporter.submit(1, &result, move |r| tx.send(r).unwrap()));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap().generation, 1);
    }

    #[test]
    fn failure_is_reported_not_retried() {
        let board = Arc::new(FakeBoard {
            fail: true,
            ..FakeBoard::default()
        });
        let mut reporter = ScoreReporter::new(board.clone());
        let (tx, rx) = mpsc::channel();

        reporter.submit(3, &SessionResult::compute(10, 0, 15), move |r| {
            tx.send(r).unwrap()
        });
        let reply = rx.recv_timeout(Duration::from_secs(5)).unwrap();

        assert!(reply.outcome.is_err());
        assert_eq!(board.seen.lock().unwrap().len(), 1);

        let mut profile = UserProfile::new("nova");
        reconcile(&mut profile, &reply);
        assert_eq!(
            profile.notice,
            Some(crate::profile::Notice::SubmissionFailed)
        );
    }

    #[test]
    fn reconcile_success_credits_coins() {
        let mut profile = UserProfile::new("nova");
        let reply = SubmissionReply {
            generation: 0,
            submission: ScoreSubmission {
                wpm: 90,
                accuracy: 90,
                score: 81,
            },
            outcome: Ok(SubmissionReceipt {
                coins_reward: Some(7),
                ..SubmissionReceipt::default()
            }),
        };

        reconcile(&mut profile, &reply);

        assert_eq!(profile.coins, 7);
        assert_eq!(profile.last_reward, Some(7));
    }

    #[test]
    fn fetch_runs_in_background() {
        let reporter = ScoreReporter::new(Arc::new(FakeBoard::default()));
        let (tx, rx) = mpsc::channel();

        reporter.fetch_leaderboard(move |page| tx.send(page).unwrap());

        let page = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        assert_eq!(page.entries[0].username, "nova");
        assert_eq!(reporter.backend(), "fake");
    }

    fn no_threads(_: &'static str, _: Job) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::WouldBlock, "thread limit reached"))
    }

    #[test]
    fn fetch_spawn_failure_delivers_error() {
        let mut reporter = ScoreReporter::new(Arc::new(FakeBoard::default()));
        reporter.spawner = no_threads;
        let (tx, rx) = mpsc::channel();

        reporter.fetch_leaderboard(move |page| tx.send(page).unwrap());

        let err = rx.try_recv().unwrap().unwrap_err();
        assert!(err.contains("could not start leaderboard request"));
    }

    #[test]
    fn submit_spawn_failure_delivers_error() {
        let board = Arc::new(FakeBoard::default());
        let mut reporter = ScoreReporter::new(board.clone());
        reporter.spawner = no_threads;
        let (tx, rx) = mpsc::channel();

        assert!(reporter.submit(4, &SessionResult::compute(10, 0, 15), move |r| {
            tx.send(r).unwrap()
        }));

        let reply = rx.try_recv().unwrap();
        assert_eq!(reply.generation, 4);
        assert!(reply.outcome.is_err());
        assert!(board.seen.lock().unwrap().is_empty());
        assert!(reporter.has_submitted(4));
    }
}
