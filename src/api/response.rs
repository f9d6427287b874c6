use std::fmt::Display;

use axum::extract::FromRequestParts;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::render;

/// Body of every 500 response. Details go to the log, never to the client.
pub const INTERNAL_ERROR_BODY: &str = "Internal server error";

// ============================================================================
// JSend envelope (machine-readable endpoints)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JSendStatus {
    Error,
    Fail,
    Success,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JSend<T: Serialize> {
    pub data: T,
    pub status: JSendStatus,
}

impl<T: Serialize> JSend<T> {
    pub fn success(data: T) -> Json<JSend<T>> {
        Json(JSend {
            data,
            status: JSendStatus::Success,
        })
    }
}

// ============================================================================
// Plain responses
// ============================================================================

/// 302 Found with an empty body
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Fixed-text 500
pub fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response()
}

// ============================================================================
// Unified error type for page handlers
// ============================================================================

/// Failures that abort a page. User input problems are not errors: the page
/// is re-rendered with an inline message instead.
#[derive(Debug)]
pub enum PageError {
    BadRequest(String),
    NotFound(String),
    Internal,
}

impl PageError {
    pub fn not_found(what: impl Into<String>) -> Self {
        PageError::NotFound(what.into())
    }

    /// Log a store or backend failure with its context and turn it into a 500.
    pub fn internal(context: &str, error: impl Display) -> Self {
        tracing::error!(error = %error, "{context}");
        PageError::Internal
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Html(render::error_page("Bad request", &message)),
            )
                .into_response(),
            PageError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                Html(render::error_page("Not found", &what)),
            )
                .into_response(),
            PageError::Internal => internal_error(),
        }
    }
}

// ============================================================================
// Custom extractors
// ============================================================================

/// Drop-in replacement for `axum::extract::Query` that rejects with a page error.
pub struct AppQuery<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = PageError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, PageError> {
        let query = parts.uri.query().unwrap_or_default();
        serde_qs::from_str(query)
            .map(AppQuery)
            .map_err(|e| PageError::BadRequest(format!("Invalid query parameter: {e}")))
    }
}
