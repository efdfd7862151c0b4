//! Earnings calculator.
//!
//! Pure functions from (policy, prior accumulated duration, newly reported
//! duration, user level) to per-interval deltas. The calculator never mutates
//! accumulated totals; callers apply the deltas. Accrual is the difference of
//! a floor function of total watched time, so replays and re-computations can
//! never credit the same second twice.

use crate::error::{EngineError, Result};
use crate::models::ContentRewardPolicy;

/// User-side bonus percentage per level above 1.
pub const TIER_BONUS_PCT_PER_LEVEL: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarningsDelta {
    pub user_credits: u64,
    pub owner_revenue_millis: u64,
}

/// Compute the deltas for one reporting interval.
///
/// `reported_secs` is the client's cumulative watched time and must not go
/// backwards; a rewind is a malformed report and is rejected, not clamped.
pub fn compute(
    policy: &ContentRewardPolicy,
    prior_secs: u64,
    reported_secs: u64,
    level: u32,
) -> Result<EarningsDelta> {
    if reported_secs < prior_secs {
        return Err(EngineError::NonMonotonicDuration {
            prior: prior_secs,
            reported: reported_secs,
        });
    }

    let base = base_earned(policy, reported_secs) - base_earned(policy, prior_secs);
    let user_credits = apply_tier_bonus(base, level);

    // Owner revenue is a flat per-second rate, uncapped and never tier-scaled.
    let owner_revenue_millis = policy
        .owner_rate_millis_per_sec
        .unwrap_or(0)
        .saturating_mul(reported_secs - prior_secs);

    Ok(EarningsDelta {
        user_credits,
        owner_revenue_millis,
    })
}

/// Level-1 credits earned after watching `secs` of the content in total.
///
/// Monotonically non-decreasing in `secs`: zero below the minimum watch
/// threshold, then `total_reward * t / duration` floored, with `t` clamped to
/// the policy duration so accrual never exceeds the reward budget.
fn base_earned(policy: &ContentRewardPolicy, secs: u64) -> u64 {
    if policy.duration_secs == 0 {
        return 0;
    }
    let effective = secs.min(policy.duration_secs);
    if effective < policy.min_watch_secs {
        return 0;
    }
    ((u128::from(policy.total_reward) * u128::from(effective))
        / u128::from(policy.duration_secs)) as u64
}

/// Scale a user-side delta by the watcher's level: +10% per level above 1.
fn apply_tier_bonus(base: u64, level: u32) -> u64 {
    let level = u64::from(level.max(1));
    let pct = 100 + TIER_BONUS_PCT_PER_LEVEL * (level - 1);
    ((u128::from(base) * u128::from(pct)) / 100) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn policy(total_reward: u64, duration_secs: u64) -> ContentRewardPolicy {
        ContentRewardPolicy {
            content_id: Uuid::new_v4(),
            total_reward,
            duration_secs,
            min_watch_secs: 0,
            owner_rate_millis_per_sec: None,
        }
    }

    #[test]
    fn half_the_duration_earns_half_the_reward() {
        let p = policy(100, 600);
        let delta = compute(&p, 0, 300, 1).unwrap();
        assert_eq!(delta.user_credits, 50);
    }

    #[test]
    fn deltas_telescope_without_double_counting() {
        let p = policy(100, 600);
        let first = compute(&p, 0, 250, 1).unwrap();
        let second = compute(&p, 250, 600, 1).unwrap();
        assert_eq!(first.user_credits + second.user_credits, 100);
    }

    #[test]
    fn accrual_is_capped_by_the_reward_budget() {
        let p = policy(100, 600);
        let delta = compute(&p, 0, 4000, 1).unwrap();
        assert_eq!(delta.user_credits, 100);
        // Reporting past the cap accrues nothing further.
        let tail = compute(&p, 4000, 5000, 1).unwrap();
        assert_eq!(tail.user_credits, 0);
    }

    #[test]
    fn rewind_is_rejected_not_clamped() {
        let p = policy(100, 600);
        let err = compute(&p, 300, 200, 1).unwrap_err();
        assert!(matches!(
            err,
            EngineError::NonMonotonicDuration {
                prior: 300,
                reported: 200
            }
        ));
    }

    #[test]
    fn tier_bonus_scales_user_side_only() {
        let mut p = policy(100, 600);
        p.owner_rate_millis_per_sec = Some(2);
        let at_level_1 = compute(&p, 0, 300, 1).unwrap();
        let at_level_3 = compute(&p, 0, 300, 3).unwrap();
        assert_eq!(at_level_1.user_credits, 50);
        assert_eq!(at_level_3.user_credits, 60);
        assert_eq!(at_level_1.owner_revenue_millis, 600);
        assert_eq!(at_level_3.owner_revenue_millis, 600);
    }

    #[test]
    fn nothing_accrues_below_minimum_watch_time() {
        let mut p = policy(100, 600);
        p.min_watch_secs = 30;
        assert_eq!(compute(&p, 0, 29, 1).unwrap().user_credits, 0);
        // Crossing the threshold releases the full accrual to date.
        assert_eq!(compute(&p, 29, 60, 1).unwrap().user_credits, 10);
    }

    #[test]
    fn zero_duration_policy_accrues_nothing() {
        let p = policy(100, 0);
        assert_eq!(compute(&p, 0, 100, 1).unwrap().user_credits, 0);
    }

    #[test]
    fn identical_inputs_are_idempotent() {
        let p = policy(100, 600);
        let a = compute(&p, 120, 240, 2).unwrap();
        let b = compute(&p, 120, 240, 2).unwrap();
        assert_eq!(a, b);
    }
}
