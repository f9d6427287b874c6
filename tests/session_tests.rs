use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use filehub::session::token::TOKEN_LENGTH;
use filehub::session::{
    MemorySessionStore, SessionError, SessionManager, SessionStore, SessionStoreError,
};

const LIFETIME: Duration = Duration::from_secs(1800);

/// Wraps the memory store, counting calls and optionally failing some of them
#[derive(Default)]
struct CountingStore {
    inner: MemorySessionStore,
    gets: AtomicUsize,
    expires: Mutex<Vec<Duration>>,
    fail_get: bool,
    fail_expire: bool,
    fail_del: bool,
}

fn unavailable() -> SessionStoreError {
    SessionStoreError::Backend("connection refused".to_string())
}

#[async_trait]
impl SessionStore for CountingStore {
    async fn set(&self, token: &str, username: &str, ttl: Duration) -> Result<(), SessionStoreError> {
        self.inner.set(token, username, ttl).await
    }

    async fn get(&self, token: &str) -> Result<Option<String>, SessionStoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get {
            return Err(unavailable());
        }
        self.inner.get(token).await
    }

    async fn expire(&self, token: &str, ttl: Duration) -> Result<bool, SessionStoreError> {
        self.expires.lock().unwrap().push(ttl);
        if self.fail_expire {
            return Err(unavailable());
        }
        self.inner.expire(token, ttl).await
    }

    async fn del(&self, token: &str) -> Result<(), SessionStoreError> {
        if self.fail_del {
            return Err(unavailable());
        }
        self.inner.del(token).await
    }
}

fn manager(store: &Arc<CountingStore>) -> SessionManager {
    SessionManager::new(Arc::clone(store) as Arc<dyn SessionStore>, LIFETIME)
}

#[tokio::test]
async fn test_create_issues_distinct_tokens() {
    let store = Arc::new(CountingStore::default());
    let sessions = manager(&store);

    let first = sessions.create("alice").await.unwrap();
    let second = sessions.create("alice").await.unwrap();

    assert_eq!(first.token.len(), TOKEN_LENGTH);
    assert!(first.token.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_ne!(first.token, second.token);

    // Both sessions are live at once
    assert_eq!(store.inner.get(&first.token).await.unwrap().as_deref(), Some("alice"));
    assert_eq!(store.inner.get(&second.token).await.unwrap().as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_expiry_matches_lifetime() {
    let store = Arc::new(CountingStore::default());
    let sessions = manager(&store);

    let before = chrono::Utc::now();
    let session = sessions.create("alice").await.unwrap();
    let remaining = session.expires_at - before;

    assert!(remaining >= chrono::Duration::seconds(1799));
    assert!(remaining <= chrono::Duration::seconds(1801));
}

#[tokio::test]
async fn test_validate_renews_with_full_lifetime() {
    let store = Arc::new(CountingStore::default());
    let sessions = manager(&store);
    let session = sessions.create("alice").await.unwrap();

    let authenticated = sessions
        .validate_and_renew(Some(&session.token))
        .await
        .unwrap()
        .expect("session should be valid");

    assert_eq!(authenticated.username, "alice");
    assert_eq!(authenticated.session.token, session.token);
    assert_eq!(*store.expires.lock().unwrap(), vec![LIFETIME]);
}

#[tokio::test]
async fn test_absent_and_malformed_tokens() {
    let store = Arc::new(CountingStore::default());
    let sessions = manager(&store);

    assert!(sessions.validate_and_renew(None).await.unwrap().is_none());
    assert!(sessions.validate_and_renew(Some("")).await.unwrap().is_none());
    assert!(sessions
        .validate_and_renew(Some("not-a-token"))
        .await
        .unwrap()
        .is_none());
    // Malformed values never reach the store
    assert_eq!(store.gets.load(Ordering::SeqCst), 0);

    let unknown = "A".repeat(TOKEN_LENGTH);
    assert!(sessions
        .validate_and_renew(Some(&unknown))
        .await
        .unwrap()
        .is_none());
    assert_eq!(store.gets.load(Ordering::SeqCst), 1);
    assert!(store.expires.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_lookup_is_signed_out() {
    let store = Arc::new(CountingStore {
        fail_get: true,
        ..CountingStore::default()
    });
    let sessions = manager(&store);
    let session = sessions.create("alice").await.unwrap();

    let result = sessions.validate_and_renew(Some(&session.token)).await;
    assert!(matches!(result, Ok(None)));
    assert!(store.expires.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_renewal_is_an_error() {
    let store = Arc::new(CountingStore {
        fail_expire: true,
        ..CountingStore::default()
    });
    let sessions = manager(&store);
    let session = sessions.create("alice").await.unwrap();

    let result = sessions.validate_and_renew(Some(&session.token)).await;
    assert!(matches!(result, Err(SessionError::StoreUnavailable(_))));
}

#[tokio::test]
async fn test_destroy_ends_session() {
    let store = Arc::new(CountingStore::default());
    let sessions = manager(&store);
    let session = sessions.create("alice").await.unwrap();

    sessions.destroy(&session.token).await;

    assert!(sessions
        .validate_and_renew(Some(&session.token))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_destroy_swallows_store_errors() {
    let store = Arc::new(CountingStore {
        fail_del: true,
        ..CountingStore::default()
    });
    let sessions = manager(&store);
    let session = sessions.create("alice").await.unwrap();

    sessions.destroy(&session.token).await;

    // Still there; left for the TTL to reap
    assert_eq!(
        store.inner.get(&session.token).await.unwrap().as_deref(),
        Some("alice")
    );
}

#[tokio::test]
async fn test_memory_store_expires_entries() {
    let store = MemorySessionStore::new();
    store
        .set("tok", "alice", Duration::from_millis(50))
        .await
        .unwrap();
    assert_eq!(store.get("tok").await.unwrap().as_deref(), Some("alice"));

    tokio::time::sleep(Duration::from_millis(120)).await;

    assert!(store.get("tok").await.unwrap().is_none());
    assert!(!store.expire("tok", LIFETIME).await.unwrap());
}
