use serde::Deserialize;
use std::env;

use crate::error::{EngineError, Result};

/// Scoping rule for the one-active-session invariant.
///
/// Deployment policy: `PerUserContent` allows a user to hold one active
/// session per content item; `PerUser` allows a single active session total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionScope {
    PerUserContent,
    PerUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub reaper: ReaperConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_session_scope")]
    pub session_scope: SessionScope,

    /// Credits granted to each side of a successful referral.
    #[serde(default = "default_referral_bonus")]
    pub referral_bonus: i64,

    /// Smallest withdrawal the ledger will accept.
    #[serde(default = "default_min_withdrawal")]
    pub min_withdrawal: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReaperConfig {
    #[serde(default = "default_reaper_period_secs")]
    pub period_secs: u64,

    /// Heartbeat silence after which an active session is force-ended.
    #[serde(default = "default_heartbeat_timeout_secs")]
    pub heartbeat_timeout_secs: i64,
}

// Default value functions
fn default_session_scope() -> SessionScope {
    SessionScope::PerUserContent
}

fn default_referral_bonus() -> i64 {
    50
}

fn default_min_withdrawal() -> i64 {
    1000
}

fn default_reaper_period_secs() -> u64 {
    5
}

fn default_heartbeat_timeout_secs() -> i64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                session_scope: default_session_scope(),
                referral_bonus: default_referral_bonus(),
                min_withdrawal: default_min_withdrawal(),
            },
            reaper: ReaperConfig {
                period_secs: default_reaper_period_secs(),
                heartbeat_timeout_secs: default_heartbeat_timeout_secs(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let session_scope = match env::var("REWARDS_SESSION_SCOPE") {
            Ok(raw) => match raw.as_str() {
                "per_user_content" => SessionScope::PerUserContent,
                "per_user" => SessionScope::PerUser,
                other => {
                    return Err(EngineError::Config(format!(
                        "REWARDS_SESSION_SCOPE must be per_user_content or per_user, got {other}"
                    )))
                }
            },
            Err(_) => default_session_scope(),
        };

        let engine = EngineConfig {
            session_scope,
            referral_bonus: env::var("REWARDS_REFERRAL_BONUS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_referral_bonus),
            min_withdrawal: env::var("REWARDS_MIN_WITHDRAWAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_min_withdrawal),
        };

        let reaper = ReaperConfig {
            period_secs: env::var("REWARDS_REAPER_PERIOD_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_reaper_period_secs),
            heartbeat_timeout_secs: env::var("REWARDS_HEARTBEAT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_heartbeat_timeout_secs),
        };

        Ok(Config { engine, reaper })
    }
}
