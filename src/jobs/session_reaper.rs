//! Stale-Session Reaper Background Job
//!
//! Force-ends sessions whose heartbeat has been silent for longer than the
//! configured timeout, finalizing their earnings exactly once through the
//! same path as a client-driven end (so level bonuses still fire).
//!
//! The scan only produces candidates; eligibility is re-checked under the
//! session's exclusive lock, so a client update or end that lands between
//! scan and finalize wins the race and the reaper backs off until the next
//! period. Per-session failures are logged and retried next cycle; a cycle
//! never terminates the loop.

use std::sync::Arc;
use std::time::Instant;
use tokio::time::sleep;

use crate::clock::Clock;
use crate::config::ReaperConfig;
use crate::metrics::engine as metrics;
use crate::services::sessions::SessionManager;
use crate::store::SessionStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReapSummary {
    /// Candidates the scan produced.
    pub scanned: usize,
    /// Sessions actually transitioned to Stale.
    pub reaped: usize,
    /// Candidates that errored; they stay Active and are retried next cycle.
    pub failed: usize,
}

pub struct SessionReaper {
    manager: Arc<SessionManager>,
    sessions: Arc<SessionStore>,
    clock: Arc<dyn Clock>,
    config: ReaperConfig,
}

impl SessionReaper {
    pub fn new(
        manager: Arc<SessionManager>,
        sessions: Arc<SessionStore>,
        clock: Arc<dyn Clock>,
        config: ReaperConfig,
    ) -> Self {
        Self {
            manager,
            sessions,
            clock,
            config,
        }
    }

    /// Run the reaper loop forever. Spawn with `tokio::spawn` and abort the
    /// handle for shutdown.
    pub async fn run(self) {
        tracing::info!(
            period_secs = self.config.period_secs,
            heartbeat_timeout_secs = self.config.heartbeat_timeout_secs,
            "Starting stale-session reaper"
        );

        let period = std::time::Duration::from_secs(self.config.period_secs);
        loop {
            sleep(period).await;

            let cycle_start = Instant::now();
            let summary = self.run_cycle();
            let status = if summary.failed > 0 { "partial" } else { "success" };
            metrics::record_reaper_run(status);
            metrics::record_reaper_duration(cycle_start.elapsed());

            if summary.reaped > 0 || summary.failed > 0 {
                tracing::info!(
                    scanned = summary.scanned,
                    reaped = summary.reaped,
                    failed = summary.failed,
                    duration_ms = cycle_start.elapsed().as_millis(),
                    "Reaper cycle completed"
                );
            }
        }
    }

    /// One reaper pass over the session store.
    pub fn run_cycle(&self) -> ReapSummary {
        let cutoff =
            self.clock.now() - chrono::Duration::seconds(self.config.heartbeat_timeout_secs);
        let candidates = self.sessions.stale_candidates(cutoff);

        let mut summary = ReapSummary {
            scanned: candidates.len(),
            ..ReapSummary::default()
        };
        for session_id in candidates {
            match self.manager.reap_if_stale(session_id, cutoff) {
                Ok(Some(finalized)) => {
                    summary.reaped += 1;
                    tracing::info!(
                        session_id = %session_id,
                        watched_secs = finalized.watched_secs,
                        earned_credits = finalized.earned_credits,
                        "Reaped stale watch session"
                    );
                }
                // Lost the race to a live update or end; nothing to do.
                Ok(None) => {}
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(
                        session_id = %session_id,
                        error = %e,
                        "Failed to reap session, will retry next cycle"
                    );
                }
            }
        }
        summary
    }
}
