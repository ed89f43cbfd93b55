//! Resolution session state.
//!
//! A session is the bounded-lifetime record of one attempt to locate an
//! upload's derived artifact. All mutation goes through the methods here
//! so the invariants hold no matter what the polling loop runs into:
//! `Found` always carries a resolved artifact, and `attempts_used` never
//! exceeds `max_attempts`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::descriptor::UploadDescriptor;

/// Errors from illegal session transitions.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("resolution is already polling")]
    AlreadyPolling,

    #[error("session already settled: {0:?}")]
    Settled(SessionState),
}

/// Why a session ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The caller tore the session down on purpose. Distinguished from a
    /// timeout so callers can skip user-facing error output.
    Cancelled,
}

/// State of a resolution session.
///
/// `Found` and `TimedOut` are settled for good; `Failed` can be restarted
/// by an explicit new `begin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SessionState {
    /// Created, not yet polling
    Idle,

    /// Poll rounds in progress
    Polling,

    /// Artifact resolved
    Found,

    /// Attempt budget exhausted without a match
    TimedOut,

    /// Torn down before settling
    Failed { reason: FailureReason },
}

impl SessionState {
    /// `Found` and `TimedOut` can never transition again; `Failed` only
    /// via an explicit restart.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Found | Self::TimedOut)
    }
}

/// The artifact reference a session resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedArtifact {
    /// Result object key
    pub key: String,

    /// Retrievable URL, when the existence check returned one
    pub download_url: Option<String>,
}

/// Bookkeeping for one resolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionSession {
    /// Identity of the upload being resolved (set by `begin`)
    pub descriptor: Option<UploadDescriptor>,

    /// Poll rounds consumed so far
    pub attempts_used: u32,

    /// Poll round budget
    pub max_attempts: u32,

    /// Current state
    pub state: SessionState,

    /// The resolved artifact, once `Found`
    pub resolved: Option<ResolvedArtifact>,

    /// Run counter, bumped by every successful `begin`
    pub generation: u64,
}

impl ResolutionSession {
    /// New idle session with the given attempt budget.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            descriptor: None,
            attempts_used: 0,
            max_attempts,
            state: SessionState::Idle,
            resolved: None,
            generation: 0,
        }
    }

    /// Begin polling for an upload. Legal from `Idle` and from `Failed`
    /// (the explicit-restart path); anything else is refused. Each new
    /// run gets its own `generation`.
    pub fn begin(&mut self, descriptor: UploadDescriptor) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle | SessionState::Failed { .. } => {
                self.descriptor = Some(descriptor);
                self.attempts_used = 0;
                self.resolved = None;
                self.generation += 1;
                self.state = SessionState::Polling;
                Ok(())
            }
            SessionState::Polling => Err(SessionError::AlreadyPolling),
            state => Err(SessionError::Settled(state)),
        }
    }

    /// Consume one poll attempt, returning the new count.
    pub fn note_attempt(&mut self) -> u32 {
        self.attempts_used += 1;
        self.attempts_used
    }

    /// True once the attempt budget is used up.
    pub fn exhausted(&self) -> bool {
        self.attempts_used >= self.max_attempts
    }

    /// Commit a resolved artifact. Returns false (and changes nothing)
    /// unless the session is still `Polling`; a round that finishes
    /// after cancellation gets its result discarded here.
    pub fn settle_found(&mut self, artifact: ResolvedArtifact) -> bool {
        if self.state != SessionState::Polling {
            return false;
        }
        self.resolved = Some(artifact);
        self.state = SessionState::Found;
        true
    }

    /// Commit exhaustion. Same discard rule as [`settle_found`](Self::settle_found).
    pub fn settle_timed_out(&mut self) -> bool {
        if self.state != SessionState::Polling {
            return false;
        }
        self.state = SessionState::TimedOut;
        true
    }

    /// Tear down: any non-settled state becomes `Failed { Cancelled }`.
    /// Safe to call from any state, including before `begin`; returns
    /// whether a transition happened.
    pub fn cancel(&mut self) -> bool {
        match self.state {
            SessionState::Idle | SessionState::Polling => {
                self.state = SessionState::Failed {
                    reason: FailureReason::Cancelled,
                };
                true
            }
            _ => false,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.state == SessionState::Polling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn descriptor() -> UploadDescriptor {
        UploadDescriptor::generate(
            "input-videos",
            "myvideo.mp4",
            Utc.with_ymd_and_hms(2025, 5, 17, 12, 0, 0).unwrap(),
            &[0xab, 0xcd, 0x12, 0x34],
        )
    }

    #[test]
    fn test_begin_from_idle() {
        let mut session = ResolutionSession::new(30);
        assert_eq!(session.state, SessionState::Idle);

        session.begin(descriptor()).unwrap();
        assert!(session.is_polling());
        assert_eq!(session.attempts_used, 0);
    }

    #[test]
    fn test_begin_rejected_while_polling_or_settled() {
        let mut session = ResolutionSession::new(30);
        session.begin(descriptor()).unwrap();
        assert!(matches!(
            session.begin(descriptor()),
            Err(SessionError::AlreadyPolling)
        ));

        session.settle_timed_out();
        assert!(matches!(
            session.begin(descriptor()),
            Err(SessionError::Settled(SessionState::TimedOut))
        ));
    }

    #[test]
    fn test_restart_after_cancel() {
        let mut session = ResolutionSession::new(30);
        session.begin(descriptor()).unwrap();
        session.note_attempt();
        assert!(session.cancel());

        session.begin(descriptor()).unwrap();
        assert!(session.is_polling());
        assert_eq!(session.attempts_used, 0, "restart resets the budget");
    }

    #[test]
    fn test_each_begin_is_a_new_generation() {
        let mut session = ResolutionSession::new(30);
        assert_eq!(session.generation, 0);

        session.begin(descriptor()).unwrap();
        assert_eq!(session.generation, 1);

        session.cancel();
        session.begin(descriptor()).unwrap();
        assert_eq!(session.generation, 2);
    }

    #[test]
    fn test_cancel_before_begin() {
        let mut session = ResolutionSession::new(30);
        assert!(session.cancel());
        assert_eq!(
            session.state,
            SessionState::Failed {
                reason: FailureReason::Cancelled
            }
        );
    }

    #[test]
    fn test_cancel_is_noop_on_settled_states() {
        let mut session = ResolutionSession::new(30);
        session.begin(descriptor()).unwrap();
        session.settle_found(ResolvedArtifact {
            key: "highlight-videos/x".into(),
            download_url: None,
        });

        assert!(!session.cancel());
        assert_eq!(session.state, SessionState::Found);
    }

    #[test]
    fn test_found_discarded_after_cancel() {
        let mut session = ResolutionSession::new(30);
        session.begin(descriptor()).unwrap();
        session.cancel();

        let committed = session.settle_found(ResolvedArtifact {
            key: "highlight-videos/x".into(),
            download_url: None,
        });
        assert!(!committed);
        assert!(session.resolved.is_none());
        assert_eq!(
            session.state,
            SessionState::Failed {
                reason: FailureReason::Cancelled
            }
        );
    }

    #[test]
    fn test_found_carries_artifact() {
        let mut session = ResolutionSession::new(30);
        session.begin(descriptor()).unwrap();
        session.note_attempt();
        assert!(session.settle_found(ResolvedArtifact {
            key: "highlight-videos/y".into(),
            download_url: Some("https://example.com/y".into()),
        }));

        assert_eq!(session.state, SessionState::Found);
        assert_eq!(session.resolved.as_ref().unwrap().key, "highlight-videos/y");
    }

    #[test]
    fn test_exhaustion_bookkeeping() {
        let mut session = ResolutionSession::new(2);
        session.begin(descriptor()).unwrap();

        assert_eq!(session.note_attempt(), 1);
        assert!(!session.exhausted());
        assert_eq!(session.note_attempt(), 2);
        assert!(session.exhausted());
    }
}
