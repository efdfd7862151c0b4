//! Leveling trigger.
//!
//! Levels derive from lifetime watch time: one level per watched hour,
//! starting at 1. A level-up pays a one-time bonus of `new_level * 10`
//! credits, tagged with the session that caused the transition so a replayed
//! finalization can never pay it twice.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{LedgerEntry, LedgerEntryKind};
use crate::store::UserRecord;

pub const SECS_PER_LEVEL: u64 = 3600;
pub const LEVEL_BONUS_PER_LEVEL: i64 = 10;

pub fn level_for_watch_secs(total_watch_secs: u64) -> u32 {
    (total_watch_secs / SECS_PER_LEVEL) as u32 + 1
}

#[derive(Debug, Clone, Copy)]
pub struct LevelUp {
    pub new_level: u32,
    /// Zero when the bonus for this session was already on the ledger.
    pub bonus_paid: i64,
}

/// Recompute the level from the record's watch time and, if it increased,
/// apply it and pay the bonus. Runs under the caller's user-record lock.
pub(crate) fn apply_level_up(
    rec: &mut UserRecord,
    session_id: Uuid,
    now: DateTime<Utc>,
) -> Option<LevelUp> {
    let new_level = level_for_watch_secs(rec.account.total_watch_secs);
    if new_level <= rec.account.level {
        return None;
    }
    rec.account.level = new_level;

    let already_paid = rec.entries.iter().any(|e| {
        e.kind == LedgerEntryKind::LevelBonus && e.related_session == Some(session_id)
    });
    let bonus_paid = if already_paid {
        0
    } else {
        let bonus = i64::from(new_level) * LEVEL_BONUS_PER_LEVEL;
        rec.post(LedgerEntry {
            id: Uuid::new_v4(),
            user_id: rec.account.id,
            kind: LedgerEntryKind::LevelBonus,
            amount: bonus,
            related_session: Some(session_id),
            created_at: now,
        });
        bonus
    };
    Some(LevelUp {
        new_level,
        bonus_paid,
    })
}
