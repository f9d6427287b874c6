//! Shared test helpers for filehub unit tests.

use std::sync::Arc;

use crate::config::{Config, NodeConfig, SessionBackend, SessionConfig, StorageConfig};
use crate::object_store::LocalStore;
use crate::session::{MemorySessionStore, SessionStore};
use crate::storage::Database;
use crate::AppState;

/// Configuration pointing at directories inside `temp_dir`.
pub fn test_config(temp_dir: &tempfile::TempDir) -> Config {
    Config {
        node: NodeConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: temp_dir.path().join("data").to_string_lossy().to_string(),
        },
        session: SessionConfig {
            backend: SessionBackend::Memory,
            ..SessionConfig::default()
        },
        storage: StorageConfig {
            local_storage_path: temp_dir.path().join("files").to_string_lossy().to_string(),
        },
        page_size: 15,
        max_upload_size: 10 * 1024 * 1024, // 10MB for tests
    }
}

/// Create a test AppState backed by an in-memory session store, which is
/// returned alongside so tests can inspect it.
pub fn test_state(temp_dir: &tempfile::TempDir) -> (Arc<AppState>, Arc<MemorySessionStore>) {
    let sessions = Arc::new(MemorySessionStore::new());
    let state = test_state_with_sessions(temp_dir, Arc::clone(&sessions) as Arc<dyn SessionStore>);
    (state, sessions)
}

/// Create a test AppState around any session store.
pub fn test_state_with_sessions(
    temp_dir: &tempfile::TempDir,
    session_store: Arc<dyn SessionStore>,
) -> Arc<AppState> {
    let config = test_config(temp_dir);
    let db = Database::open(&config.node.data_dir).expect("Failed to open test database");
    let object_store = LocalStore::new(&config.storage.local_storage_path)
        .expect("Failed to create test object store");

    Arc::new(AppState::new(config, db, Arc::new(object_store), session_store))
}
