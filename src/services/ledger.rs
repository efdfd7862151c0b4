//! Ledger service.
//!
//! Single point of truth for a user's spendable credits. Every mutation
//! appends an immutable entry and folds its amount into the cached balance
//! under one exclusive user-record lock, so the projection can never diverge
//! from the entry stream. `audited_balance` recomputes the sum for
//! verification.

use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{EngineError, Result};
use crate::metrics::engine as metrics;
use crate::models::{LedgerEntry, LedgerEntryKind, PayoutMethod};
use crate::store::AccountStore;

/// Result of posting an earning tick to a user's ledger.
#[derive(Debug, Clone)]
pub struct PostedEarning {
    /// The appended entry; absent when the tick carried zero credits (a pure
    /// heartbeat still refreshes watch time and activity).
    pub entry: Option<LedgerEntry>,
    pub new_balance: i64,
    pub total_watch_secs: u64,
}

pub struct LedgerService {
    accounts: Arc<AccountStore>,
    clock: Arc<dyn Clock>,
    min_withdrawal: i64,
}

impl LedgerService {
    pub fn new(accounts: Arc<AccountStore>, clock: Arc<dyn Clock>, min_withdrawal: i64) -> Self {
        Self {
            accounts,
            clock,
            min_withdrawal,
        }
    }

    /// Append a credit entry and raise the balance. Bonus and earning kinds
    /// only; withdrawals go through [`LedgerService::debit`].
    pub fn credit(
        &self,
        user_id: Uuid,
        amount: i64,
        kind: LedgerEntryKind,
        related_session: Option<Uuid>,
    ) -> Result<LedgerEntry> {
        if kind == LedgerEntryKind::Withdrawal {
            return Err(EngineError::InvalidAmount(
                "withdrawals must be posted as debits".into(),
            ));
        }
        if amount < 0 {
            return Err(EngineError::InvalidAmount(format!(
                "credit amount must be non-negative, got {amount}"
            )));
        }

        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            user_id,
            kind,
            amount,
            related_session,
            created_at: self.clock.now(),
        };
        self.accounts.with_record(user_id, |rec| {
            rec.post(entry.clone());
            Ok(())
        })?;
        tracing::debug!(
            user_id = %user_id,
            kind = kind.as_str(),
            amount,
            "Posted ledger credit"
        );
        Ok(entry)
    }

    /// Append a negative entry if the balance covers it.
    pub fn debit(&self, user_id: Uuid, amount: i64, kind: LedgerEntryKind) -> Result<LedgerEntry> {
        if amount <= 0 {
            return Err(EngineError::InvalidAmount(format!(
                "debit amount must be positive, got {amount}"
            )));
        }

        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            user_id,
            kind,
            amount: -amount,
            related_session: None,
            created_at: self.clock.now(),
        };
        self.accounts.with_record(user_id, |rec| {
            if rec.account.balance < amount {
                return Err(EngineError::InsufficientBalance {
                    balance: rec.account.balance,
                    requested: amount,
                });
            }
            rec.post(entry.clone());
            Ok(())
        })?;
        tracing::info!(user_id = %user_id, kind = kind.as_str(), amount, "Posted ledger debit");
        Ok(entry)
    }

    /// Withdrawal entry point for the payout collaborator: validates the
    /// payout destination and the configured minimum before debiting.
    pub fn withdraw(
        &self,
        user_id: Uuid,
        amount: i64,
        method: &PayoutMethod,
    ) -> Result<LedgerEntry> {
        method.validate()?;
        if amount < self.min_withdrawal {
            return Err(EngineError::InvalidAmount(format!(
                "minimum withdrawal is {} credits",
                self.min_withdrawal
            )));
        }
        let entry = self.debit(user_id, amount, LedgerEntryKind::Withdrawal)?;
        metrics::record_withdrawal();
        tracing::info!(
            user_id = %user_id,
            amount,
            method = method.kind(),
            "Withdrawal accepted"
        );
        Ok(entry)
    }

    pub fn balance(&self, user_id: Uuid) -> Result<i64> {
        self.accounts
            .get(user_id)
            .map(|a| a.balance)
            .ok_or_else(|| EngineError::NotFound(format!("user {user_id}")))
    }

    /// One page of the user's entries, newest first.
    pub fn entries_page(
        &self,
        user_id: Uuid,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<LedgerEntry>> {
        self.accounts.with_record(user_id, |rec| {
            Ok(rec
                .entries
                .iter()
                .rev()
                .skip(page.saturating_mul(per_page))
                .take(per_page)
                .cloned()
                .collect())
        })
    }

    /// Recompute the balance from the entry stream. Must always equal the
    /// cached projection.
    pub fn audited_balance(&self, user_id: Uuid) -> Result<i64> {
        self.accounts
            .with_record(user_id, |rec| Ok(rec.entries.iter().map(|e| e.amount).sum()))
    }

    /// Post one earning tick: entry append, balance raise, watch-time and
    /// last-activity refresh, all under the user-record lock. Zero-credit
    /// ticks skip the entry but still refresh watch time and activity.
    pub(crate) fn post_earning(
        &self,
        user_id: Uuid,
        credits: u64,
        watched_delta_secs: u64,
        session_id: Uuid,
    ) -> Result<PostedEarning> {
        let now = self.clock.now();
        self.accounts.with_record(user_id, |rec| {
            let entry = if credits > 0 {
                let entry = LedgerEntry {
                    id: Uuid::new_v4(),
                    user_id,
                    kind: LedgerEntryKind::Earning,
                    amount: credits as i64,
                    related_session: Some(session_id),
                    created_at: now,
                };
                rec.post(entry.clone());
                Some(entry)
            } else {
                None
            };
            rec.account.total_watch_secs += watched_delta_secs;
            rec.account.last_active_at = now;
            Ok(PostedEarning {
                entry,
                new_balance: rec.account.balance,
                total_watch_secs: rec.account.total_watch_secs,
            })
        })
    }
}
