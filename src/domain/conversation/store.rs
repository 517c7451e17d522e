//! Session storage port

use super::session::CallSession;
use crate::domain::shared::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Sessions keyed by call identity
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, call_id: &str) -> Result<Option<CallSession>>;

    async fn put(&self, session: CallSession) -> Result<()>;

    /// Returns whether a session was removed
    async fn delete(&self, call_id: &str) -> Result<bool>;

    async fn count(&self) -> Result<usize>;

    /// Remove every session not touched since `idle_since`; returns how many
    async fn purge_idle(&self, idle_since: DateTime<Utc>) -> Result<usize>;
}
