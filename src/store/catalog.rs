//! Content catalog seam.
//!
//! The catalog is an external collaborator: the engine only reads reward
//! policies from it, never writes. Reads are unsynchronized with respect to
//! session and account locks.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::models::ContentRewardPolicy;

#[async_trait]
pub trait ContentCatalog: Send + Sync {
    async fn reward_policy(&self, content_id: Uuid) -> Result<ContentRewardPolicy>;
}

/// Catalog backed by a local map, for tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryCatalog {
    policies: DashMap<Uuid, ContentRewardPolicy>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, policy: ContentRewardPolicy) {
        self.policies.insert(policy.content_id, policy);
    }
}

#[async_trait]
impl ContentCatalog for InMemoryCatalog {
    async fn reward_policy(&self, content_id: Uuid) -> Result<ContentRewardPolicy> {
        self.policies
            .get(&content_id)
            .map(|p| p.value().clone())
            .ok_or_else(|| EngineError::NotFound(format!("content {content_id}")))
    }
}
