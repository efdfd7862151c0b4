pub mod earnings;
pub mod ledger;
pub mod leveling;
pub mod referral;
pub mod sessions;

pub use ledger::{LedgerService, PostedEarning};
pub use referral::{ReferralOutcome, ReferralService};
pub use sessions::{FinalizedSession, SessionManager, StartedSession, TickOutcome};
