//! In-memory account store.
//!
//! A user record bundles the account projection with its append-only ledger
//! entries behind one exclusive map entry, so a balance and the entry that
//! justifies it always mutate as a unit. [`UserRecord::post`] is the only
//! place an entry is appended.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::models::{LedgerEntry, UserAccount};

const REFERRAL_CODE_LEN: usize = 6;

pub struct UserRecord {
    pub account: UserAccount,
    pub entries: Vec<LedgerEntry>,
}

impl UserRecord {
    /// Append a ledger entry and fold its amount into the cached balance.
    pub(crate) fn post(&mut self, entry: LedgerEntry) {
        self.account.balance += entry.amount;
        self.entries.push(entry);
    }
}

#[derive(Default)]
pub struct AccountStore {
    users: DashMap<Uuid, UserRecord>,
    referral_codes: DashMap<String, Uuid>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account with a fresh referral code. Codes are 6-character
    /// uppercase alphanumerics, re-drawn on collision.
    pub fn create_user(&self, now: DateTime<Utc>) -> UserAccount {
        let id = Uuid::new_v4();
        let code = loop {
            let candidate = generate_referral_code();
            match self.referral_codes.entry(candidate.clone()) {
                Entry::Vacant(vacant) => {
                    vacant.insert(id);
                    break candidate;
                }
                Entry::Occupied(_) => continue,
            }
        };

        let account = UserAccount::new(id, code, now);
        self.users.insert(
            id,
            UserRecord {
                account: account.clone(),
                entries: Vec::new(),
            },
        );
        tracing::debug!(user_id = %id, referral_code = %account.referral_code, "Created user account");
        account
    }

    /// Snapshot of an account.
    pub fn get(&self, user_id: Uuid) -> Option<UserAccount> {
        self.users.get(&user_id).map(|r| r.account.clone())
    }

    /// Run `f` with exclusive access to the user's record.
    pub(crate) fn with_record<R>(
        &self,
        user_id: Uuid,
        f: impl FnOnce(&mut UserRecord) -> Result<R>,
    ) -> Result<R> {
        match self.users.get_mut(&user_id) {
            Some(mut record) => f(&mut record),
            None => Err(EngineError::NotFound(format!("user {user_id}"))),
        }
    }

    pub fn resolve_referral_code(&self, code: &str) -> Option<Uuid> {
        self.referral_codes.get(code).map(|e| *e.value())
    }

    /// Accounts ordered by total watch time, largest first.
    pub fn top_by_watch_time(&self, limit: usize) -> Vec<UserAccount> {
        let mut accounts: Vec<UserAccount> =
            self.users.iter().map(|r| r.account.clone()).collect();
        accounts.sort_by(|a, b| b.total_watch_secs.cmp(&a.total_watch_secs));
        accounts.truncate(limit);
        accounts
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

fn generate_referral_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFERRAL_CODE_LEN)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect()
}
