//! Collectors for session lifecycle, earnings accrual and the reaper.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::time::Duration;

static SESSIONS_STARTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "rewards_sessions_started_total",
        "Total number of watch sessions created"
    )
    .expect("failed to register rewards_sessions_started_total")
});

/// Sessions finalized, labeled by how they ended (ended/stale).
static SESSIONS_FINALIZED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "rewards_sessions_finalized_total",
        "Total number of watch sessions finalized",
        &["reason"]
    )
    .expect("failed to register rewards_sessions_finalized_total")
});

static ACTIVE_SESSIONS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "rewards_active_sessions",
        "Watch sessions currently in the active state"
    )
    .expect("failed to register rewards_active_sessions")
});

static TICKS_APPLIED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "rewards_ticks_applied_total",
        "Progress updates applied to a session"
    )
    .expect("failed to register rewards_ticks_applied_total")
});

static TICKS_REJECTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "rewards_ticks_rejected_total",
        "Progress updates rejected without mutation",
        &["reason"]
    )
    .expect("failed to register rewards_ticks_rejected_total")
});

static CREDITS_EARNED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "rewards_credits_earned_total",
        "User credits accrued from watch activity"
    )
    .expect("failed to register rewards_credits_earned_total")
});

static OWNER_REVENUE_MILLIS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "rewards_owner_revenue_millis_total",
        "Owner revenue accrued from watch activity, in milli-credits"
    )
    .expect("failed to register rewards_owner_revenue_millis_total")
});

static BONUS_CREDITS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "rewards_bonus_credits_total",
        "Bonus credits issued through the ledger",
        &["kind"]
    )
    .expect("failed to register rewards_bonus_credits_total")
});

static WITHDRAWALS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "rewards_withdrawals_total",
        "Accepted withdrawal debits"
    )
    .expect("failed to register rewards_withdrawals_total")
});

static REAPER_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "rewards_reaper_runs_total",
        "Reaper cycles, by outcome",
        &["status"]
    )
    .expect("failed to register rewards_reaper_runs_total")
});

static REAPER_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "rewards_reaper_duration_seconds",
        "Duration of reaper cycles",
        vec![0.0001, 0.001, 0.01, 0.1, 0.5, 1.0, 5.0]
    )
    .expect("failed to register rewards_reaper_duration_seconds")
});

pub fn record_session_started() {
    SESSIONS_STARTED_TOTAL.inc();
    ACTIVE_SESSIONS.inc();
}

pub fn record_session_finalized(reason: &str) {
    SESSIONS_FINALIZED_TOTAL.with_label_values(&[reason]).inc();
    ACTIVE_SESSIONS.dec();
}

pub fn record_tick_applied(user_credits: u64, owner_millis: u64) {
    TICKS_APPLIED_TOTAL.inc();
    CREDITS_EARNED_TOTAL.inc_by(user_credits);
    OWNER_REVENUE_MILLIS_TOTAL.inc_by(owner_millis);
}

pub fn record_tick_rejected(reason: &str) {
    TICKS_REJECTED_TOTAL.with_label_values(&[reason]).inc();
}

pub fn record_bonus(kind: &str, credits: u64) {
    BONUS_CREDITS_TOTAL
        .with_label_values(&[kind])
        .inc_by(credits);
}

pub fn record_withdrawal() {
    WITHDRAWALS_TOTAL.inc();
}

pub fn record_reaper_run(status: &str) {
    REAPER_RUNS_TOTAL.with_label_values(&[status]).inc();
}

pub fn record_reaper_duration(duration: Duration) {
    REAPER_DURATION_SECONDS.observe(duration.as_secs_f64());
}
