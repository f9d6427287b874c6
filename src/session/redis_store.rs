use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client};

use super::{SessionStore, SessionStoreError};

/// Session store backed by Redis, relying on native key expiry.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    pub async fn connect(redis_url: &str) -> Result<Self, SessionStoreError> {
        let config = ConnectionManagerConfig::new().set_number_of_retries(1);

        let client = Client::open(redis_url)?;
        let conn = client.get_connection_manager_with_config(config).await?;

        Ok(Self { conn })
    }
}

/// Redis expiry granularity is whole seconds; never round down to zero.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

/// `EXPIRE` takes a signed count; refuse values that would wrap negative.
fn expire_secs(ttl: Duration) -> Result<i64, SessionStoreError> {
    i64::try_from(ttl_secs(ttl))
        .map_err(|_| SessionStoreError::Backend(format!("session ttl {ttl:?} is out of range")))
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn set(
        &self,
        token: &str,
        username: &str,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(token, username, ttl_secs(ttl)).await?;
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<String>, SessionStoreError> {
        let mut conn = self.conn.clone();
        let username: Option<String> = conn.get(token).await?;
        Ok(username)
    }

    async fn expire(&self, token: &str, ttl: Duration) -> Result<bool, SessionStoreError> {
        let mut conn = self.conn.clone();
        let renewed: bool = conn.expire(token, expire_secs(ttl)?).await?;
        Ok(renewed)
    }

    async fn del(&self, token: &str) -> Result<(), SessionStoreError> {
        let mut conn = self.conn.clone();
        let _: u64 = conn.del(token).await?;
        Ok(())
    }
}
