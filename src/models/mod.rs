//! Data models for the rewards engine.
//!
//! This module defines structures for:
//! - WatchSession: one continuous viewing attempt and its accrued totals
//! - LedgerEntry: immutable record of a single balance-affecting event
//! - UserAccount: balance projection, watch time, level and referral state
//! - ContentRewardPolicy: read-only reward parameters from the content catalog
//! - PayoutMethod: closed set of withdrawal destinations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Ended,
    Stale,
}

impl SessionStatus {
    /// Terminal sessions are immutable; Ended and Stale are equivalent for
    /// accounting purposes.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Ended | SessionStatus::Stale)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Ended => "ended",
            SessionStatus::Stale => "stale",
        }
    }
}

/// One continuous watch attempt by a user against one content item.
///
/// Mutated only by the session manager (and the reaper through the same
/// finalization path); `watched_secs`, `earned_credits` and
/// `owner_revenue_millis` never decrease.
#[derive(Debug, Clone, Serialize)]
pub struct WatchSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content_id: Uuid,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Accumulated watch time in seconds, as last reported by the client.
    pub watched_secs: u64,
    /// User-side credits accrued over the session lifetime.
    pub earned_credits: u64,
    /// Owner-side revenue in milli-credits, tracked in parallel.
    pub owner_revenue_millis: u64,
    /// Highest tick id applied so far; replays at or below it are rejected.
    pub last_applied_tick: u64,
}

impl WatchSession {
    pub fn new(user_id: Uuid, content_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            content_id,
            status: SessionStatus::Active,
            started_at: now,
            last_heartbeat: now,
            ended_at: None,
            watched_secs: 0,
            earned_credits: 0,
            owner_revenue_millis: 0,
            last_applied_tick: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    Earning,
    ReferralBonus,
    LevelBonus,
    Withdrawal,
}

impl LedgerEntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LedgerEntryKind::Earning => "earning",
            LedgerEntryKind::ReferralBonus => "referral_bonus",
            LedgerEntryKind::LevelBonus => "level_bonus",
            LedgerEntryKind::Withdrawal => "withdrawal",
        }
    }
}

/// Append-only record of a balance-affecting event. A user's balance is the
/// running sum of their entries' amounts.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: LedgerEntryKind,
    /// Signed credits; negative only for withdrawals.
    pub amount: i64,
    pub related_session: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserAccount {
    pub id: Uuid,
    /// Cached projection of the ledger; must always equal the entry sum.
    pub balance: i64,
    pub total_watch_secs: u64,
    pub level: u32,
    pub referral_code: String,
    pub referred_by: Option<Uuid>,
    /// Credits this user earned by referring others.
    pub referral_earnings: i64,
    pub last_active_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(id: Uuid, referral_code: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            balance: 0,
            total_watch_secs: 0,
            level: 1,
            referral_code,
            referred_by: None,
            referral_earnings: 0,
            last_active_at: now,
            created_at: now,
        }
    }
}

/// Reward parameters for one content item, owned by the content catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRewardPolicy {
    pub content_id: Uuid,
    /// Credits paid out to a user who watches the full duration at level 1.
    pub total_reward: u64,
    pub duration_secs: u64,
    /// No user-side accrual below this watched time.
    #[serde(default)]
    pub min_watch_secs: u64,
    /// Flat owner-side rate in milli-credits per watched second.
    #[serde(default)]
    pub owner_rate_millis_per_sec: Option<u64>,
}

/// Withdrawal destination, validated before any ledger debit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PayoutMethod {
    Paypal { email: String },
    BankTransfer { account: String },
    MobileMoney { msisdn: String },
}

impl PayoutMethod {
    pub fn kind(&self) -> &'static str {
        match self {
            PayoutMethod::Paypal { .. } => "paypal",
            PayoutMethod::BankTransfer { .. } => "bank_transfer",
            PayoutMethod::MobileMoney { .. } => "mobile_money",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            PayoutMethod::Paypal { email } => {
                if email.len() < 3 || !email.contains('@') {
                    return Err(EngineError::InvalidPayoutMethod(
                        "paypal email is malformed".into(),
                    ));
                }
            }
            PayoutMethod::BankTransfer { account } => {
                if account.trim().is_empty() {
                    return Err(EngineError::InvalidPayoutMethod(
                        "bank account is empty".into(),
                    ));
                }
            }
            PayoutMethod::MobileMoney { msisdn } => {
                let digits = msisdn.strip_prefix('+').unwrap_or(msisdn);
                if digits.len() < 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return Err(EngineError::InvalidPayoutMethod(
                        "mobile money number is malformed".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!SessionStatus::Active.is_terminal());
        assert!(SessionStatus::Ended.is_terminal());
        assert!(SessionStatus::Stale.is_terminal());
    }

    #[test]
    fn payout_methods_serialize_with_a_method_tag() {
        let method = PayoutMethod::MobileMoney {
            msisdn: "+254700000001".into(),
        };
        let value = serde_json::to_value(&method).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"method": "mobile_money", "msisdn": "+254700000001"})
        );
        let parsed: PayoutMethod = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, method);
    }

    #[test]
    fn payout_method_validation() {
        assert!(PayoutMethod::Paypal {
            email: "user@example.com".into()
        }
        .validate()
        .is_ok());
        assert!(PayoutMethod::Paypal {
            email: "nope".into()
        }
        .validate()
        .is_err());
        assert!(PayoutMethod::BankTransfer {
            account: "  ".into()
        }
        .validate()
        .is_err());
        assert!(PayoutMethod::MobileMoney {
            msisdn: "+254700000001".into()
        }
        .validate()
        .is_ok());
        assert!(PayoutMethod::MobileMoney {
            msisdn: "12ab".into()
        }
        .validate()
        .is_err());
    }
}
