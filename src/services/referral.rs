//! Referral trigger.
//!
//! Invoked once by the registration collaborator when a new user supplies a
//! referral code: both sides receive the configured bonus. An unknown code is
//! a non-fatal error; registration proceeds without the bonus.

use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{EngineError, Result};
use crate::metrics::engine as metrics;
use crate::models::{LedgerEntry, LedgerEntryKind};
use crate::store::AccountStore;

#[derive(Debug, Clone, Copy)]
pub struct ReferralOutcome {
    pub referrer_id: Uuid,
    pub bonus_each: i64,
}

pub struct ReferralService {
    accounts: Arc<AccountStore>,
    clock: Arc<dyn Clock>,
    bonus: i64,
}

impl ReferralService {
    pub fn new(accounts: Arc<AccountStore>, clock: Arc<dyn Clock>, bonus: i64) -> Self {
        Self {
            accounts,
            clock,
            bonus,
        }
    }

    /// Apply the two-sided referral bonus for a freshly registered user.
    ///
    /// All validation happens before the first mutation; once the new user's
    /// record is updated, crediting the referrer cannot fail (accounts are
    /// never deleted), so both sides land or neither does.
    pub fn register(&self, new_user_id: Uuid, code: &str) -> Result<ReferralOutcome> {
        let referrer_id = self
            .accounts
            .resolve_referral_code(code)
            .ok_or_else(|| EngineError::UnknownReferralCode(code.to_string()))?;
        // A user cannot redeem their own code.
        if referrer_id == new_user_id {
            return Err(EngineError::UnknownReferralCode(code.to_string()));
        }
        if self.accounts.get(referrer_id).is_none() {
            return Err(EngineError::UnknownReferralCode(code.to_string()));
        }

        let now = self.clock.now();
        let bonus = self.bonus;

        self.accounts.with_record(new_user_id, |rec| {
            if rec.account.referred_by.is_some() {
                return Err(EngineError::AlreadyReferred(new_user_id));
            }
            rec.account.referred_by = Some(referrer_id);
            rec.post(LedgerEntry {
                id: Uuid::new_v4(),
                user_id: new_user_id,
                kind: LedgerEntryKind::ReferralBonus,
                amount: bonus,
                related_session: None,
                created_at: now,
            });
            Ok(())
        })?;

        self.accounts.with_record(referrer_id, |rec| {
            rec.post(LedgerEntry {
                id: Uuid::new_v4(),
                user_id: referrer_id,
                kind: LedgerEntryKind::ReferralBonus,
                amount: bonus,
                related_session: None,
                created_at: now,
            });
            rec.account.referral_earnings += bonus;
            Ok(())
        })?;

        metrics::record_bonus("referral", bonus.max(0) as u64 * 2);
        tracing::info!(
            new_user_id = %new_user_id,
            referrer_id = %referrer_id,
            bonus,
            "Applied referral bonus"
        );
        Ok(ReferralOutcome {
            referrer_id,
            bonus_each: bonus,
        })
    }
}
