//! Clear-time leaderboard
//!
//! The simulation only emits a [`SessionResult`](crate::sim::SessionResult);
//! the presentation layer submits it. Submission is fire-and-forget: it runs
//! off the simulation thread and a failure only means "no rank available".

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum nickname length accepted by the ranking service
pub const MAX_NICKNAME_CHARS: usize = 12;

/// Why a submission did not produce a rank
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("nickname is empty")]
    InvalidNickname,
    #[error("leaderboard unavailable: {0}")]
    Unavailable(String),
}

/// A finished run, as sent to the ranking service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub nickname: String,
    pub clear_time_secs: u32,
    pub max_height: u32,
}

impl ScoreSubmission {
    /// Build a submission, truncating the nickname to the service limit
    pub fn new(nickname: &str, clear_time_secs: u32, max_height: u32) -> Self {
        Self {
            nickname: nickname.trim().chars().take(MAX_NICKNAME_CHARS).collect(),
            clear_time_secs,
            max_height,
        }
    }
}

/// Remote ranking service contract
pub trait LeaderboardService: Send + Sync {
    /// Store a score and return its 1-indexed rank
    fn submit_score(&self, submission: &ScoreSubmission) -> Result<u32, SubmitError>;
}

/// A stored leaderboard entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub nickname: String,
    pub clear_time_secs: u32,
    pub max_height: u32,
}

/// In-process ranking board, ordered by clear time (fastest first)
#[derive(Debug, Default)]
pub struct LocalLeaderboard {
    entries: Mutex<Vec<LeaderboardEntry>>,
}

impl LocalLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rank a clear time would receive: one plus the number of strictly faster runs
    pub fn rank_for(&self, clear_time_secs: u32) -> u32 {
        let entries = self.lock();
        let faster = entries
            .iter()
            .filter(|e| e.clear_time_secs < clear_time_secs)
            .count();
        faster as u32 + 1
    }

    /// Fastest `limit` entries
    pub fn top(&self, limit: usize) -> Vec<LeaderboardEntry> {
        self.lock().iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LeaderboardEntry>> {
        // A poisoned board still holds valid entries
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LeaderboardService for LocalLeaderboard {
    fn submit_score(&self, submission: &ScoreSubmission) -> Result<u32, SubmitError> {
        if submission.nickname.is_empty() {
            return Err(SubmitError::InvalidNickname);
        }
        let rank = self.rank_for(submission.clear_time_secs);

        let entry = LeaderboardEntry {
            nickname: submission.nickname.clone(),
            clear_time_secs: submission.clear_time_secs,
            max_height: submission.max_height,
        };
        let mut entries = self.lock();
        // Ties keep submission order
        let pos = entries
            .iter()
            .position(|e| submission.clear_time_secs < e.clear_time_secs)
            .unwrap_or(entries.len());
        entries.insert(pos, entry);

        log::info!(
            "Score stored: {} {}s -> rank {}",
            submission.nickname,
            submission.clear_time_secs,
            rank
        );
        Ok(rank)
    }
}

/// Handle to a submission running in the background
pub struct PendingRank {
    rx: Receiver<Option<u32>>,
    resolved: Option<Option<u32>>,
}

impl PendingRank {
    /// Poll for the rank without blocking.
    ///
    /// Returns `Some(rank)` once the service answered successfully; `None`
    /// while still pending or after a failure.
    pub fn try_rank(&mut self) -> Option<u32> {
        if self.resolved.is_none() {
            match self.rx.try_recv() {
                Ok(rank) => self.resolved = Some(rank),
                Err(TryRecvError::Disconnected) => self.resolved = Some(None),
                Err(TryRecvError::Empty) => {}
            }
        }
        self.resolved.flatten()
    }

    /// Whether the submission has finished (successfully or not)
    pub fn is_settled(&mut self) -> bool {
        self.try_rank();
        self.resolved.is_some()
    }
}

/// Submit on a worker thread; errors are logged and swallowed
pub fn submit_in_background(
    service: Arc<dyn LeaderboardService>,
    submission: ScoreSubmission,
) -> PendingRank {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let rank = match service.submit_score(&submission) {
            Ok(rank) => Some(rank),
            Err(e) => {
                log::warn!("Score submission failed: {}", e);
                None
            }
        };
        // Receiver may already be gone if the result screen was dismissed
        let _ = tx.send(rank);
    });
    PendingRank { rx, resolved: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    struct FailingService;

    impl LeaderboardService for FailingService {
        fn submit_score(&self, _: &ScoreSubmission) -> Result<u32, SubmitError> {
            Err(SubmitError::Unavailable("offline".into()))
        }
    }

    fn wait_settled(pending: &mut PendingRank) {
        let start = Instant::now();
        while !pending.is_settled() {
            assert!(start.elapsed() < Duration::from_secs(5), "submission never settled");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_nickname_truncated() {
        let s = ScoreSubmission::new("  averyveryverylongname ", 10, 5);
        assert_eq!(s.nickname.chars().count(), MAX_NICKNAME_CHARS);
        assert_eq!(s.nickname, "averyveryver");
    }

    #[test]
    fn test_rank_by_clear_time() {
        let board = LocalLeaderboard::new();
        assert_eq!(board.submit_score(&ScoreSubmission::new("a", 300, 490)), Ok(1));
        assert_eq!(board.submit_score(&ScoreSubmission::new("b", 120, 490)), Ok(1));
        assert_eq!(board.submit_score(&ScoreSubmission::new("c", 200, 490)), Ok(2));
        // Equal time shares the rank of the first holder
        assert_eq!(board.submit_score(&ScoreSubmission::new("d", 200, 490)), Ok(2));

        let top: Vec<_> = board.top(10).into_iter().map(|e| e.nickname).collect();
        assert_eq!(top, vec!["b", "c", "d", "a"]);
    }

    #[test]
    fn test_empty_nickname_rejected() {
        let board = LocalLeaderboard::new();
        let err = board.submit_score(&ScoreSubmission::new("   ", 1, 1));
        assert_eq!(err, Err(SubmitError::InvalidNickname));
        assert!(board.is_empty());
    }

    #[test]
    fn test_background_submission_delivers_rank() {
        let board: Arc<dyn LeaderboardService> = Arc::new(LocalLeaderboard::new());
        let mut pending = submit_in_background(board, ScoreSubmission::new("goat", 125, 490));
        wait_settled(&mut pending);
        assert_eq!(pending.try_rank(), Some(1));
    }

    #[test]
    fn test_background_failure_is_swallowed() {
        let mut pending =
            submit_in_background(Arc::new(FailingService), ScoreSubmission::new("goat", 1, 1));
        wait_settled(&mut pending);
        assert_eq!(pending.try_rank(), None);
    }
}
