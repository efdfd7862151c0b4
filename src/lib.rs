//! Rewards Engine Library
//!
//! Turns a stream of client-reported watch progress into monotonic,
//! non-duplicated, auditable balance changes: users accrue credits for
//! watching content while an owner-revenue stream is tracked from the same
//! activity. Abandoned sessions are finalized by a background reaper, and
//! session completion drives level-up and referral bonuses.
//!
//! # Modules
//!
//! - `models`: watch sessions, ledger entries, accounts, reward policies
//! - `store`: in-memory session/account stores and the content-catalog seam
//! - `services`: earnings calculator, session manager, ledger, bonus triggers
//! - `jobs`: stale-session reaper loop
//! - `clock`: injectable time source
//! - `error`: error types and handling
//! - `config`: configuration management
//! - `metrics`: observability and metrics collection
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use rewards_engine::clock::SystemClock;
//! use rewards_engine::jobs::SessionReaper;
//! use rewards_engine::services::{LedgerService, SessionManager};
//! use rewards_engine::store::{AccountStore, InMemoryCatalog, SessionStore};
//! use rewards_engine::Config;
//!
//! # fn main() -> rewards_engine::Result<()> {
//! let config = Config::from_env()?;
//! let clock = Arc::new(SystemClock);
//! let accounts = Arc::new(AccountStore::new());
//! let sessions = Arc::new(SessionStore::new(config.engine.session_scope));
//! let ledger = Arc::new(LedgerService::new(
//!     accounts.clone(),
//!     clock.clone(),
//!     config.engine.min_withdrawal,
//! ));
//! let catalog = Arc::new(InMemoryCatalog::new());
//! let manager = Arc::new(SessionManager::new(
//!     sessions.clone(),
//!     accounts.clone(),
//!     ledger.clone(),
//!     catalog,
//!     clock.clone(),
//! ));
//!
//! let reaper = SessionReaper::new(manager, sessions, clock, config.reaper);
//! tokio::spawn(reaper.run());
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod models;
pub mod services;
pub mod store;

pub use config::{Config, SessionScope};
pub use error::{EngineError, Result};
