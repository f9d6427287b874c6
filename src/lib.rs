//! filehub - a small multi-user file sharing site
//!
//! Users register, sign in and upload files into a fixed set of categories.
//! Every file can be rated by other users; votes move both the file's rating
//! and its owner's reputation. The crate provides:
//! - Cookie sessions kept in Redis (or in memory for development) with a
//!   sliding expiry renewed on every authenticated request
//! - redb embedded database for users, files and votes
//! - Swappable object storage for the uploaded contents
//! - Server-rendered HTML pages with paginated category listings

pub mod api;
pub mod auth;
pub mod config;
pub mod object_store;
pub mod pagination;
pub mod rating;
pub mod session;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use config::Config;
use object_store::ObjectStore;
use rating::RatingEngine;
use session::{SessionManager, SessionStore};
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub object_store: Arc<dyn ObjectStore>,
    pub ratings: RatingEngine,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Database,
        object_store: Arc<dyn ObjectStore>,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        let ratings = RatingEngine::new(Arc::new(db.clone()));
        let sessions = SessionManager::new(session_store, config.session.lifetime);
        Self {
            config,
            db,
            object_store,
            ratings,
            sessions,
        }
    }
}
