//! Session manager.
//!
//! Orchestrates the watch-session state machine:
//! `Active --update--> Active`, `Active --end--> Ended`,
//! `Active --reaper timeout--> Stale`; terminal states are immutable.
//! Earnings deltas come from the calculator and are committed to the session
//! record and the user's ledger as one unit: every fallible step runs before
//! the first mutation, and the session entry lock is held across the ledger
//! posting so session and ledger commits for a tick cannot reorder.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{EngineError, Result};
use crate::metrics::engine as metrics;
use crate::models::{ContentRewardPolicy, SessionStatus};
use crate::services::{earnings, leveling};
use crate::services::ledger::LedgerService;
use crate::store::{AccountStore, ContentCatalog, SessionStore, StartDisposition};

#[derive(Debug, Clone)]
pub struct StartedSession {
    pub session_id: Uuid,
    /// True when an active session already covered this start and was
    /// returned instead of a new one.
    pub resumed: bool,
    pub policy: ContentRewardPolicy,
}

#[derive(Debug, Clone, Copy)]
pub struct TickOutcome {
    pub session_id: Uuid,
    /// User credits earned by this tick alone.
    pub credited: u64,
    pub owner_revenue_millis: u64,
    pub balance: i64,
    pub watched_secs: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct FinalizedSession {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub watched_secs: u64,
    pub earned_credits: u64,
    pub owner_revenue_millis: u64,
    /// Set when this finalization raised the user's level.
    pub new_level: Option<u32>,
}

pub struct SessionManager {
    sessions: Arc<SessionStore>,
    accounts: Arc<AccountStore>,
    ledger: Arc<LedgerService>,
    catalog: Arc<dyn ContentCatalog>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(
        sessions: Arc<SessionStore>,
        accounts: Arc<AccountStore>,
        ledger: Arc<LedgerService>,
        catalog: Arc<dyn ContentCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            accounts,
            ledger,
            catalog,
            clock,
        }
    }

    /// Start a watch session, or resume the active one holding the scope key.
    pub async fn start(&self, user_id: Uuid, content_id: Uuid) -> Result<StartedSession> {
        if self.accounts.get(user_id).is_none() {
            return Err(EngineError::NotFound(format!("user {user_id}")));
        }
        let policy = self.catalog.reward_policy(content_id).await?;

        match self
            .sessions
            .create_or_resume(user_id, content_id, self.clock.now())
        {
            StartDisposition::Created(session_id) => {
                metrics::record_session_started();
                tracing::info!(
                    session_id = %session_id,
                    user_id = %user_id,
                    content_id = %content_id,
                    "Started watch session"
                );
                Ok(StartedSession {
                    session_id,
                    resumed: false,
                    policy,
                })
            }
            StartDisposition::Resumed(session_id) => {
                tracing::debug!(
                    session_id = %session_id,
                    user_id = %user_id,
                    content_id = %content_id,
                    "Duplicate active session, resuming"
                );
                Ok(StartedSession {
                    session_id,
                    resumed: true,
                    policy,
                })
            }
        }
    }

    /// Apply one client progress report.
    ///
    /// `tick_id` must be strictly greater than the last applied tick; a
    /// replayed or out-of-order tick is rejected with no mutation, which is
    /// what makes retried updates safe. `reported_secs` is cumulative.
    pub async fn update(
        &self,
        session_id: Uuid,
        caller_user_id: Uuid,
        reported_secs: u64,
        tick_id: u64,
    ) -> Result<TickOutcome> {
        // Catalog reads happen before the session entry is locked.
        let (owner, content_id) = self
            .sessions
            .get(session_id)
            .map(|s| (s.user_id, s.content_id))
            .ok_or_else(|| EngineError::NotFound(format!("session {session_id}")))?;
        if owner != caller_user_id {
            tracing::warn!(
                session_id = %session_id,
                caller_user_id = %caller_user_id,
                "Rejected update from non-owner"
            );
            return Err(EngineError::Forbidden(format!("session {session_id}")));
        }
        let level = self
            .accounts
            .get(caller_user_id)
            .ok_or_else(|| EngineError::NotFound(format!("user {caller_user_id}")))?
            .level;
        let policy = self.catalog.reward_policy(content_id).await?;
        let now = self.clock.now();

        let mut session = self
            .sessions
            .lock(session_id)
            .ok_or_else(|| EngineError::NotFound(format!("session {session_id}")))?;
        if session.user_id != caller_user_id {
            return Err(EngineError::Forbidden(format!("session {session_id}")));
        }
        if session.status != SessionStatus::Active {
            metrics::record_tick_rejected("terminal");
            return Err(EngineError::InvalidState(format!(
                "session {session_id} is {}",
                session.status.as_str()
            )));
        }
        if tick_id <= session.last_applied_tick {
            metrics::record_tick_rejected("stale_tick");
            return Err(EngineError::StaleTick {
                last_applied: session.last_applied_tick,
                got: tick_id,
            });
        }

        let delta = earnings::compute(&policy, session.watched_secs, reported_secs, level)
            .map_err(|e| {
                if matches!(e, EngineError::NonMonotonicDuration { .. }) {
                    metrics::record_tick_rejected("non_monotonic");
                }
                e
            })?;
        let watched_delta = reported_secs - session.watched_secs;

        // Commit point. The ledger posting is the last fallible step; the
        // session fields only change after it succeeds.
        let posted = self.ledger.post_earning(
            session.user_id,
            delta.user_credits,
            watched_delta,
            session_id,
        )?;
        session.watched_secs = reported_secs;
        session.earned_credits += delta.user_credits;
        session.owner_revenue_millis += delta.owner_revenue_millis;
        session.last_heartbeat = now;
        session.last_applied_tick = tick_id;

        metrics::record_tick_applied(delta.user_credits, delta.owner_revenue_millis);
        tracing::debug!(
            session_id = %session_id,
            tick_id,
            credited = delta.user_credits,
            watched_secs = reported_secs,
            "Applied session tick"
        );
        Ok(TickOutcome {
            session_id,
            credited: delta.user_credits,
            owner_revenue_millis: delta.owner_revenue_millis,
            balance: posted.new_balance,
            watched_secs: reported_secs,
        })
    }

    /// End a session. Ending an already-terminal session is a no-op success.
    pub fn end(&self, session_id: Uuid, caller_user_id: Uuid) -> Result<FinalizedSession> {
        match self.finalize(session_id, Some(caller_user_id), SessionStatus::Ended, None)? {
            Some(finalized) => Ok(finalized),
            None => {
                let session = self
                    .sessions
                    .get(session_id)
                    .ok_or_else(|| EngineError::NotFound(format!("session {session_id}")))?;
                Ok(FinalizedSession {
                    session_id,
                    status: session.status,
                    watched_secs: session.watched_secs,
                    earned_credits: session.earned_credits,
                    owner_revenue_millis: session.owner_revenue_millis,
                    new_level: None,
                })
            }
        }
    }

    /// Reaper entry point: force-end a session whose heartbeat predates
    /// `cutoff`. Returns `Ok(None)` when the session is no longer eligible:
    /// a racing update refreshed the heartbeat or a racing end won the
    /// status transition. Exactly one finalizer ever succeeds.
    pub fn reap_if_stale(
        &self,
        session_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<FinalizedSession>> {
        self.finalize(session_id, None, SessionStatus::Stale, Some(cutoff))
    }

    /// Shared finalization path for client ends and reaper timeouts.
    ///
    /// The status check under the exclusive session entry is the
    /// compare-and-swap that resolves the reaper/client race: whoever gets
    /// here first while the session is still Active wins; everyone else sees
    /// a terminal status and backs off with `None`.
    fn finalize(
        &self,
        session_id: Uuid,
        caller_user_id: Option<Uuid>,
        target: SessionStatus,
        only_if_heartbeat_before: Option<DateTime<Utc>>,
    ) -> Result<Option<FinalizedSession>> {
        let now = self.clock.now();
        let mut session = self
            .sessions
            .lock(session_id)
            .ok_or_else(|| EngineError::NotFound(format!("session {session_id}")))?;
        if let Some(caller) = caller_user_id {
            if session.user_id != caller {
                tracing::warn!(
                    session_id = %session_id,
                    caller_user_id = %caller,
                    "Rejected end from non-owner"
                );
                return Err(EngineError::Forbidden(format!("session {session_id}")));
            }
        }
        if session.status.is_terminal() {
            return Ok(None);
        }
        if let Some(cutoff) = only_if_heartbeat_before {
            if session.last_heartbeat >= cutoff {
                return Ok(None);
            }
        }

        session.status = target;
        session.ended_at = Some(now);
        self.sessions
            .clear_active(session.user_id, session.content_id, session_id);

        let level_up = self
            .accounts
            .with_record(session.user_id, |rec| {
                Ok(leveling::apply_level_up(rec, session_id, now))
            })?;
        if let Some(level_up) = level_up {
            metrics::record_bonus("level", level_up.bonus_paid.max(0) as u64);
            tracing::info!(
                user_id = %session.user_id,
                session_id = %session_id,
                new_level = level_up.new_level,
                bonus = level_up.bonus_paid,
                "User leveled up"
            );
        }

        metrics::record_session_finalized(target.as_str());
        tracing::info!(
            session_id = %session_id,
            status = target.as_str(),
            watched_secs = session.watched_secs,
            earned_credits = session.earned_credits,
            "Finalized watch session"
        );
        Ok(Some(FinalizedSession {
            session_id,
            status: target,
            watched_secs: session.watched_secs,
            earned_credits: session.earned_credits,
            owner_revenue_millis: session.owner_revenue_millis,
            new_level: level_up.map(|l| l.new_level),
        }))
    }
}
