//! In-process session store.
//!
//! Expired entries are dropped when they are next touched, and swept on every
//! write so abandoned sessions do not accumulate. Suitable for development and tests; sessions do not survive a restart.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{SessionStore, SessionStoreError};

struct Entry {
    username: String,
    deadline: Instant,
}

#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries held, expired or not
    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }
}

fn poisoned<T>(_: T) -> SessionStoreError {
    SessionStoreError::Backend("lock poisoned".to_string())
}

fn deadline(now: Instant, ttl: Duration) -> Result<Instant, SessionStoreError> {
    now.checked_add(ttl)
        .ok_or_else(|| SessionStoreError::Backend(format!("session ttl {ttl:?} is out of range")))
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set(
        &self,
        token: &str,
        username: &str,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let now = Instant::now();
        let deadline = deadline(now, ttl)?;

        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.retain(|_, e| e.deadline > now);
        entries.insert(
            token.to_string(),
            Entry {
                username: username.to_string(),
                deadline,
            },
        );
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<String>, SessionStoreError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let now = Instant::now();
        match entries.get(token).map(|e| (e.deadline > now, e.username.clone())) {
            Some((true, username)) => Ok(Some(username)),
            Some((false, _)) => {
                entries.remove(token);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn expire(&self, token: &str, ttl: Duration) -> Result<bool, SessionStoreError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let now = Instant::now();
        match entries.get(token).map(|e| e.deadline > now) {
            Some(true) => {
                let deadline = deadline(now, ttl)?;
                if let Some(entry) = entries.get_mut(token) {
                    entry.deadline = deadline;
                }
                Ok(true)
            }
            Some(false) => {
                entries.remove(token);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn del(&self, token: &str) -> Result<(), SessionStoreError> {
        self.entries.write().map_err(poisoned)?.remove(token);
        Ok(())
    }
}
