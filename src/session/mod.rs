//! Session tokens and the key-value store that holds them.
//!
//! A session is a single entry `token -> username` whose lifetime is enforced
//! by the store's own TTL. [`SessionManager`] owns the lifecycle: it issues
//! tokens at login, slides the TTL forward on every authenticated request and
//! deletes the entry on logout.

mod manager;
mod memory_store;
mod redis_store;
pub mod token;

pub use manager::{Authenticated, Session, SessionError, SessionManager};
pub use memory_store::MemorySessionStore;
pub use redis_store::RedisSessionStore;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session_id";

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Session store error: {0}")]
    Backend(String),
}

/// Key-value commands the session subsystem needs: `SET .. EX`, `GET`,
/// `EXPIRE` and `DEL`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store `token -> username`, replacing any previous value, expiring after `ttl`.
    async fn set(
        &self,
        token: &str,
        username: &str,
        ttl: Duration,
    ) -> Result<(), SessionStoreError>;

    async fn get(&self, token: &str) -> Result<Option<String>, SessionStoreError>;

    /// Reset the TTL of an existing entry. Returns false if the key is gone.
    async fn expire(&self, token: &str, ttl: Duration) -> Result<bool, SessionStoreError>;

    async fn del(&self, token: &str) -> Result<(), SessionStoreError>;
}
