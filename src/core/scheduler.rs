//! Polling cadence for artifact resolution.
//!
//! The driver owns the clock and nothing else: it ticks, asks the
//! resolver for one round, and forwards the outcome to whoever is
//! listening. The first round runs immediately so a fast producer is
//! caught without waiting out a full interval.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::adapters::ResultStore;
use crate::domain::{SessionError, SessionState};

use super::resolver::{ArtifactResolver, PollOutcome};

/// Spawns and paces poll rounds against a shared resolver.
pub struct ResolutionDriver {
    interval: Duration,
}

impl ResolutionDriver {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Begin the resolution and drive it until it settles.
    ///
    /// Returns a receiver of per-round outcomes and a handle that can
    /// stop the run early. The task ends on its own once the session
    /// settles; a terminal outcome is always the last message sent.
    pub fn start<S>(
        &self,
        resolver: Arc<ArtifactResolver<S>>,
    ) -> Result<(mpsc::Receiver<PollOutcome>, DriverHandle), SessionError>
    where
        S: ResultStore + 'static,
    {
        resolver.begin()?;

        let (update_tx, update_rx) = mpsc::channel::<PollOutcome>(16);
        let (stop_tx, stop_rx) = mpsc::channel::<()>(1);

        let interval = self.interval;
        let task = tokio::spawn(async move {
            run_driver(resolver, interval, update_tx, stop_rx).await;
        });

        Ok((update_rx, DriverHandle { stop_tx, task }))
    }
}

/// Handle to control a running resolution
pub struct DriverHandle {
    stop_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl DriverHandle {
    /// Cancel the resolution and wait for the driver to finish.
    pub async fn stop(self) -> Result<()> {
        let _ = self.stop_tx.send(()).await;
        self.task.await?;
        Ok(())
    }

    /// Wait for the driver to finish on its own.
    pub async fn join(self) -> Result<()> {
        self.task.await?;
        Ok(())
    }
}

/// Internal driver loop
async fn run_driver<S>(
    resolver: Arc<ArtifactResolver<S>>,
    interval: Duration,
    update_tx: mpsc::Sender<PollOutcome>,
    mut stop_rx: mpsc::Receiver<()>,
) where
    S: ResultStore + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    // A late round shifts the cadence instead of bursting to catch up.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval_secs = interval.as_secs(), "resolution polling started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = resolver.poll_once().await;
                let terminal = matches!(outcome, PollOutcome::Found(_) | PollOutcome::TimedOut);
                let _ = update_tx.send(outcome).await;

                if terminal {
                    break;
                }
                // An external cancel shows up as a non-polling session.
                if resolver.state() != SessionState::Polling {
                    debug!("session left polling state, driver stopping");
                    break;
                }
            }
            _ = stop_rx.recv() => {
                resolver.cancel();
                info!("resolution polling stopped");
                break;
            }
        }
    }
}
