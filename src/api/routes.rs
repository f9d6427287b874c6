use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::auth::require_session;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_size as usize;

    // Everything here requires a live session
    let protected = Router::new()
        .route("/", get(handlers::home))
        // Files
        .route("/upload", get(handlers::upload_form))
        .route(
            "/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/download", get(handlers::download_page))
        .route("/download", post(handlers::submit_rating))
        .route("/files/:id", get(handlers::raw_file))
        // Listings
        .route("/categories", get(handlers::categories_index))
        .route("/categories/:name", get(handlers::category_listing))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_session,
        ));

    Router::new()
        // Accounts
        .route("/login", get(handlers::login_form))
        .route("/login", post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route("/logout", post(handlers::logout))
        .route("/register", get(handlers::register_form))
        .route("/register", post(handlers::register))
        // Internal
        .route("/_internal/health", get(handlers::health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::api::response::INTERNAL_ERROR_BODY;
    use crate::session::{SessionStore, SessionStoreError};
    use crate::testutil::{test_state, test_state_with_sessions};

    use super::*;

    /// Finds every token but cannot renew it
    struct BrokenRenewals;

    #[async_trait]
    impl SessionStore for BrokenRenewals {
        async fn set(&self, _: &str, _: &str, _: Duration) -> Result<(), SessionStoreError> {
            Ok(())
        }

        async fn get(&self, _: &str) -> Result<Option<String>, SessionStoreError> {
            Ok(Some("alice".to_string()))
        }

        async fn expire(&self, _: &str, _: Duration) -> Result<bool, SessionStoreError> {
            Err(SessionStoreError::Backend("connection reset".to_string()))
        }

        async fn del(&self, _: &str) -> Result<(), SessionStoreError> {
            Ok(())
        }
    }

    async fn body_string(body: Body) -> String {
        let bytes = body.collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_protected_routes_redirect_without_cookie() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = test_state(&dir);

        for uri in ["/", "/upload", "/download?id=1", "/categories", "/categories/music", "/files/1"] {
            let app = create_router(Arc::clone(&state));
            let response = app
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::FOUND, "{uri}");
            assert_eq!(response.headers()[header::LOCATION], "/login");
            assert!(body_string(response.into_body()).await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_garbage_cookie_redirects() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = test_state(&dir);
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::COOKIE, format!("session_id={}", "x".repeat(60)))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_failed_renewal_is_a_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state_with_sessions(&dir, Arc::new(BrokenRenewals));
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/categories")
                    .header(header::COOKIE, format!("session_id={}", "a".repeat(60)))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(body_string(response.into_body()).await, INTERNAL_ERROR_BODY);
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = test_state(&dir);
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/_internal/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_str(&body_string(response.into_body()).await).unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["status"], "ok");
    }
}
