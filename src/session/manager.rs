use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ring::rand::SystemRandom;
use thiserror::Error;

use super::token::{generate_token, is_well_formed};
use super::{SessionStore, SessionStoreError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session store unavailable: {0}")]
    StoreUnavailable(#[from] SessionStoreError),
    #[error("Failed to draw random bytes for a session token")]
    RandomSource,
}

/// A live session as handed to the cookie layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    /// Absolute expiry matching the store TTL at the time of issue or renewal
    pub expires_at: DateTime<Utc>,
}

/// Outcome of a successful validation: who the token belongs to and the
/// renewed session to send back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub username: String,
    pub session: Session,
}

/// Issues, validates, renews and destroys session tokens.
///
/// Expiry is entirely the store's job; there is no grace period and no local
/// bookkeeping of live sessions.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    lifetime: Duration,
    rng: SystemRandom,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, lifetime: Duration) -> Self {
        Self {
            store,
            lifetime,
            rng: SystemRandom::new(),
        }
    }

    /// Start a session for `username`. Nothing is stored if the write fails.
    pub async fn create(&self, username: &str) -> Result<Session, SessionError> {
        let token = generate_token(&self.rng).map_err(|_| SessionError::RandomSource)?;

        self.store.set(&token, username, self.lifetime).await?;
        tracing::debug!(username, "Created session");

        Ok(Session {
            expires_at: self.expiry_from_now(),
            token,
        })
    }

    /// Resolve a cookie token to its user and slide the TTL forward.
    ///
    /// A missing token, an unknown token and a failed lookup all yield
    /// `Ok(None)`. A failed renewal of a token that was found is an error.
    pub async fn validate_and_renew(
        &self,
        token: Option<&str>,
    ) -> Result<Option<Authenticated>, SessionError> {
        let Some(token) = token.filter(|t| is_well_formed(t)) else {
            return Ok(None);
        };

        let username = match self.store.get(token).await {
            Ok(Some(username)) => username,
            Ok(None) => return Ok(None),
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed, treating as signed out");
                return Ok(None);
            }
        };

        if !self.store.expire(token, self.lifetime).await? {
            // Expired between GET and EXPIRE
            return Ok(None);
        }

        Ok(Some(Authenticated {
            username,
            session: Session {
                token: token.to_string(),
                expires_at: self.expiry_from_now(),
            },
        }))
    }

    /// Delete a session. Failures are logged; the entry still lapses via TTL.
    pub async fn destroy(&self, token: &str) {
        if let Err(e) = self.store.del(token).await {
            tracing::warn!(error = %e, "Failed to delete session, leaving it to expire");
        }
    }

    fn expiry_from_now(&self) -> DateTime<Utc> {
        let lifetime = chrono::Duration::from_std(self.lifetime).unwrap_or(chrono::Duration::MAX);
        Utc::now()
            .checked_add_signed(lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
