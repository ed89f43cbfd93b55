//! Artifact resolution engine.
//!
//! One poll round is list, rank, probe. Every round consumes one
//! attempt from the session budget whether or not the listing
//! succeeded, so a flaky service cannot stretch the wait forever.
//! Rounds never overlap: a round arriving while the previous one is
//! still in flight is skipped outright and costs nothing. A round also
//! dies with the run that started it; a result landing after a cancel
//! or restart is discarded, never committed into the new run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::{debug, info, instrument, warn};

use crate::adapters::ResultStore;
use crate::domain::{
    ResolutionSession, ResolvedArtifact, SessionError, SessionState, UploadDescriptor,
};
use crate::ranking;

/// Tunables for one resolution.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Prefix the producer writes results under
    pub result_prefix: String,

    /// Suffix a conforming result key ends with
    pub result_suffix: String,

    /// Poll round budget
    pub max_attempts: u32,

    /// Listing page size per round
    pub page_size: u32,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            result_prefix: "highlight-videos".to_string(),
            result_suffix: "-highlights.mp4".to_string(),
            max_attempts: 30,
            page_size: 100,
        }
    }
}

/// What one poll round produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The session settled on this artifact
    Found(ResolvedArtifact),

    /// No artifact yet; budget remains
    Pending {
        attempts_used: u32,
        /// Listing failure for this round, if there was one
        round_error: Option<String>,
    },

    /// The attempt budget ran out; session settled
    TimedOut,

    /// Nothing happened: a round was already in flight, or the
    /// session was not polling
    Skipped,
}

/// Locates the artifact derived from one upload.
///
/// All methods take `&self`; the resolver is shared between the
/// scheduler task and whoever wants to cancel or inspect it.
pub struct ArtifactResolver<S> {
    store: S,
    descriptor: UploadDescriptor,
    settings: ResolverSettings,
    session: Mutex<ResolutionSession>,
    round_active: AtomicBool,
}

impl<S: ResultStore> ArtifactResolver<S> {
    /// Create a resolver for the upload identified by `descriptor`.
    pub fn new(store: S, descriptor: UploadDescriptor, settings: ResolverSettings) -> Self {
        let session = ResolutionSession::new(settings.max_attempts);
        Self {
            store,
            descriptor,
            settings,
            session: Mutex::new(session),
            round_active: AtomicBool::new(false),
        }
    }

    pub fn descriptor(&self) -> &UploadDescriptor {
        &self.descriptor
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Snapshot of the session for reporting.
    pub fn session(&self) -> ResolutionSession {
        self.session.lock().unwrap().clone()
    }

    pub fn state(&self) -> SessionState {
        self.session.lock().unwrap().state
    }

    /// Move the session into `Polling`. Starting a new run invalidates
    /// any round still in flight from the previous one.
    pub fn begin(&self) -> Result<(), SessionError> {
        self.session.lock().unwrap().begin(self.descriptor.clone())
    }

    /// Tear the session down. Returns `false` when it had already
    /// settled and there was nothing to cancel.
    pub fn cancel(&self) -> bool {
        let cancelled = self.session.lock().unwrap().cancel();
        if cancelled {
            info!(key = %self.descriptor.source_key, "resolution cancelled");
        }
        cancelled
    }

    /// Run one poll round.
    #[instrument(skip(self), fields(key = %self.descriptor.source_key))]
    pub async fn poll_once(&self) -> PollOutcome {
        // A slow round must not let the next tick stack attempts.
        if self
            .round_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("previous round still in flight, skipping");
            return PollOutcome::Skipped;
        }

        let outcome = self.run_round().await;
        self.round_active.store(false, Ordering::SeqCst);
        outcome
    }

    async fn run_round(&self) -> PollOutcome {
        // Consume the attempt up front and remember which run this
        // round belongs to. The lock is never held across an await.
        let (attempt, generation) = {
            let mut session = self.session.lock().unwrap();
            if !session.is_polling() {
                debug!(state = ?session.state, "session not polling, round has no effect");
                return PollOutcome::Skipped;
            }
            if session.exhausted() {
                session.settle_timed_out();
                return PollOutcome::TimedOut;
            }
            (session.note_attempt(), session.generation)
        };

        debug!(attempt, max_attempts = self.settings.max_attempts, "poll round");

        let mut round_error = None;
        let listing = self
            .store
            .list_candidates(&self.settings.result_prefix, self.settings.page_size)
            .await;

        match listing {
            Ok(candidates) => {
                let ranked =
                    ranking::rank(&self.descriptor, candidates, &self.settings.result_suffix);
                debug!(candidates = ranked.len(), "ranked candidates");

                for candidate in &ranked {
                    match self.store.probe(&candidate.key).await {
                        Ok(Some(artifact)) => {
                            let mut session = self.session.lock().unwrap();
                            // A cancel or restart that landed mid-round wins.
                            if session.generation == generation
                                && session.settle_found(artifact.clone())
                            {
                                info!(key = %artifact.key, attempt, "artifact resolved");
                                return PollOutcome::Found(artifact);
                            }
                            debug!("round outlived its run, discarding result");
                            return PollOutcome::Skipped;
                        }
                        Ok(None) => {
                            debug!(key = %candidate.key, "candidate not retrievable yet");
                        }
                        Err(err) => {
                            // Indistinguishable from not-yet-available;
                            // fall through to the next candidate.
                            warn!(key = %candidate.key, error = %err, "existence check failed");
                        }
                    }
                }
            }
            Err(err) => {
                // The attempt is spent either way.
                warn!(attempt, error = %err, "listing failed");
                round_error = Some(err.to_string());
            }
        }

        let mut session = self.session.lock().unwrap();
        if !session.is_polling() || session.generation != generation {
            return PollOutcome::Skipped;
        }
        if session.exhausted() {
            session.settle_timed_out();
            info!(attempts = session.attempts_used, "resolution timed out");
            return PollOutcome::TimedOut;
        }
        PollOutcome::Pending {
            attempts_used: session.attempts_used,
            round_error,
        }
    }
}
