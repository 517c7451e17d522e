//! In-process session store backed by a sharded concurrent map

use crate::domain::conversation::{CallSession, SessionStore};
use crate::domain::shared::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Calls on different shards never wait for each other
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<DashMap<String, CallSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, call_id: &str) -> Result<Option<CallSession>> {
        Ok(self.sessions.get(call_id).map(|entry| entry.value().clone()))
    }

    async fn put(&self, session: CallSession) -> Result<()> {
        self.sessions.insert(session.call_id().to_string(), session);
        Ok(())
    }

    async fn delete(&self, call_id: &str) -> Result<bool> {
        let removed = self.sessions.remove(call_id).is_some();
        if removed {
            debug!("Session {} removed", call_id);
        }
        Ok(removed)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.sessions.len())
    }

    async fn purge_idle(&self, idle_since: DateTime<Utc>) -> Result<usize> {
        let before = self.sessions.len();
        self.sessions.retain(|call_id, session| {
            let keep = session.updated_at() >= idle_since;
            if !keep {
                debug!("Session {} idle since {}, removed", call_id, session.updated_at());
            }
            keep
        });
        Ok(before.saturating_sub(self.sessions.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::Step;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = InMemorySessionStore::new();
        assert!(store.get("CA1").await.unwrap().is_none());

        let mut session = CallSession::new("CA1", None, Utc::now());
        session.transition_to(Step::AskPeople).unwrap();
        store.put(session).await.unwrap();

        let loaded = store.get("CA1").await.unwrap().unwrap();
        assert_eq!(loaded.step(), Step::AskPeople);
        assert_eq!(store.count().await.unwrap(), 1);

        assert!(store.delete("CA1").await.unwrap());
        assert!(!store.delete("CA1").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_purge_idle_keeps_recent_sessions() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        store.put(CallSession::new("CA-old", None, now - Duration::minutes(30))).await.unwrap();
        store.put(CallSession::new("CA-new", None, now)).await.unwrap();

        assert_eq!(store.purge_idle(now - Duration::minutes(15)).await.unwrap(), 1);
        assert!(store.get("CA-old").await.unwrap().is_none());
        assert!(store.get("CA-new").await.unwrap().is_some());
        assert_eq!(store.purge_idle(now - Duration::minutes(15)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_calls() {
        let store = InMemorySessionStore::new();
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("CA{}", i);
                store.put(CallSession::new(id.clone(), None, Utc::now())).await.unwrap();
                store.get(&id).await.unwrap().is_some()
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(store.count().await.unwrap(), 32);
    }
}
