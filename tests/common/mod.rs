//! Shared harness for engine integration tests: an in-memory engine wired to
//! a manually advanced clock so reaper timing is deterministic.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

use rewards_engine::clock::ManualClock;
use rewards_engine::config::Config;
use rewards_engine::jobs::SessionReaper;
use rewards_engine::models::ContentRewardPolicy;
use rewards_engine::services::{LedgerService, ReferralService, SessionManager};
use rewards_engine::store::{AccountStore, InMemoryCatalog, SessionStore};
use rewards_engine::SessionScope;

pub struct TestEngine {
    pub clock: Arc<ManualClock>,
    pub accounts: Arc<AccountStore>,
    pub sessions: Arc<SessionStore>,
    pub ledger: Arc<LedgerService>,
    pub catalog: Arc<InMemoryCatalog>,
    pub manager: Arc<SessionManager>,
    pub referral: ReferralService,
    pub reaper: SessionReaper,
}

pub fn engine() -> TestEngine {
    engine_with_scope(SessionScope::PerUserContent)
}

pub fn engine_with_scope(scope: SessionScope) -> TestEngine {
    let config = Config::default();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    ));
    let accounts = Arc::new(AccountStore::new());
    let sessions = Arc::new(SessionStore::new(scope));
    let ledger = Arc::new(LedgerService::new(
        accounts.clone(),
        clock.clone(),
        config.engine.min_withdrawal,
    ));
    let catalog = Arc::new(InMemoryCatalog::new());
    let manager = Arc::new(SessionManager::new(
        sessions.clone(),
        accounts.clone(),
        ledger.clone(),
        catalog.clone(),
        clock.clone(),
    ));
    let referral = ReferralService::new(accounts.clone(), clock.clone(), config.engine.referral_bonus);
    let reaper = SessionReaper::new(
        manager.clone(),
        sessions.clone(),
        clock.clone(),
        config.reaper.clone(),
    );

    TestEngine {
        clock,
        accounts,
        sessions,
        ledger,
        catalog,
        manager,
        referral,
        reaper,
    }
}

/// Register a reward policy and return its content id.
pub fn seed_policy(engine: &TestEngine, total_reward: u64, duration_secs: u64) -> Uuid {
    let content_id = Uuid::new_v4();
    engine.catalog.insert(ContentRewardPolicy {
        content_id,
        total_reward,
        duration_secs,
        min_watch_secs: 0,
        owner_rate_millis_per_sec: Some(1),
    });
    content_id
}

pub fn seed_user(engine: &TestEngine) -> Uuid {
    engine.accounts.create_user(clock_now(engine)).id
}

fn clock_now(engine: &TestEngine) -> chrono::DateTime<Utc> {
    use rewards_engine::clock::Clock;
    engine.clock.now()
}
