//! Score submission
//!
//! Finished single-player rounds are reported to a [`ScoreSink`] when a user
//! is signed in. Failures are logged and dropped; they never reach the tick
//! loop.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("score service rejected the submission: {0}")]
    Rejected(String),
    #[error("score service unavailable: {0}")]
    Unavailable(String),
}

/// A signed-in player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
}

/// Who is playing. Passed explicitly to whatever needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub user: Option<UserProfile>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user: Some(UserProfile {
                id: id.into(),
                display_name: display_name.into(),
            }),
        }
    }
}

/// Destination for finished-round scores (leaderboard service)
pub trait ScoreSink: Send {
    fn submit(&mut self, user_id: &str, display_name: &str, score: u32) -> Result<(), SubmitError>;
}

/// Sink that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogScoreSink;

impl ScoreSink for LogScoreSink {
    fn submit(&mut self, user_id: &str, display_name: &str, score: u32) -> Result<(), SubmitError> {
        log::info!("Submitting score for {} ({}): {}", display_name, user_id, score);
        Ok(())
    }
}

/// Outcome of [`ScoreReporter::report`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Submitted,
    /// Not signed in, zero score, or this value was already sent
    Skipped,
    Failed(SubmitError),
}

/// Submits each distinct score value once
pub struct ScoreReporter {
    sink: Box<dyn ScoreSink>,
    last_submitted: Option<u32>,
}

impl ScoreReporter {
    pub fn new(sink: Box<dyn ScoreSink>) -> Self {
        Self {
            sink,
            last_submitted: None,
        }
    }

    pub fn last_submitted(&self) -> Option<u32> {
        self.last_submitted
    }

    /// Forget the last value so the next round's score is always sent
    pub fn reset(&mut self) {
        self.last_submitted = None;
    }

    pub fn report(&mut self, context: &SessionContext, score: u32) -> ReportOutcome {
        let Some(user) = &context.user else {
            return ReportOutcome::Skipped;
        };
        if score == 0 || self.last_submitted == Some(score) {
            return ReportOutcome::Skipped;
        }

        // Marked before the attempt: a failed submit is not retried
        self.last_submitted = Some(score);
        match self.sink.submit(&user.id, &user.display_name, score) {
            Ok(()) => ReportOutcome::Submitted,
            Err(e) => {
                log::warn!("Score submission failed: {}", e);
                ReportOutcome::Failed(e)
            }
        }
    }
}

impl std::fmt::Debug for ScoreReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreReporter")
            .field("last_submitted", &self.last_submitted)
            .finish_non_exhaustive()
    }
}
