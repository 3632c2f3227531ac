//! CSRF `state` bookkeeping for in-flight authorization requests.

use crate::error::{OAuth2Error, OAuth2Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// One pending authorization request, keyed by its `state` value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2State {
    pub state: String,
    pub redirect_uri: String,
    /// Scopes requested in the redirect this state belongs to
    pub scopes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OAuth2State {
    pub fn new(redirect_uri: String, scopes: Vec<String>, ttl_seconds: u64) -> Self {
        let created_at = Utc::now();
        let ttl = ttl_seconds.min(u64::from(u32::MAX)) as i64;

        Self {
            state: Uuid::new_v4().to_string(),
            redirect_uri,
            scopes,
            created_at,
            expires_at: created_at + Duration::seconds(ttl),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Storage for pending states. A state is consumed by the first `take`.
#[async_trait]
pub trait OAuth2StateStore: Send + Sync {
    async fn store(&self, state: OAuth2State) -> OAuth2Result<()>;

    /// Remove and return the state; expired states are reported as missing.
    async fn take(&self, state: &str) -> OAuth2Result<OAuth2State>;

    /// Drop expired states, returning how many were removed.
    async fn cleanup_expired(&self) -> OAuth2Result<usize>;
}

#[derive(Default)]
pub struct InMemoryStateStore {
    states: Arc<RwLock<HashMap<String, OAuth2State>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.states.read().await.is_empty()
    }
}

#[async_trait]
impl OAuth2StateStore for InMemoryStateStore {
    async fn store(&self, state: OAuth2State) -> OAuth2Result<()> {
        self.states.write().await.insert(state.state.clone(), state);
        Ok(())
    }

    async fn take(&self, state: &str) -> OAuth2Result<OAuth2State> {
        let pending = self
            .states
            .write()
            .await
            .remove(state)
            .ok_or(OAuth2Error::StateNotFound)?;

        if pending.is_expired() {
            return Err(OAuth2Error::StateNotFound);
        }

        Ok(pending)
    }

    async fn cleanup_expired(&self) -> OAuth2Result<usize> {
        let mut states = self.states.write().await;
        let before = states.len();
        let now = Utc::now();
        states.retain(|_, pending| pending.expires_at >= now);
        Ok(before - states.len())
    }
}
