//! Request gate for pages that need a signed-in user.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cookie::time::{Duration as CookieDuration, OffsetDateTime};

use crate::api::response::{found, internal_error};
use crate::session::{Session, SESSION_COOKIE};
use crate::AppState;

/// Username of the signed-in user, inserted into request extensions by
/// [`require_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

/// Middleware wrapping every protected route.
///
/// No or unknown session: 302 to `/login`, handler not run.
/// Store failure while renewing: fixed 500, handler not run.
/// Otherwise the handler runs with [`CurrentUser`] set and the response
/// carries the same token with a fresh expiry.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());

    let authenticated = match state.sessions.validate_and_renew(token.as_deref()).await {
        Ok(Some(authenticated)) => authenticated,
        Ok(None) => return found("/login"),
        Err(e) => {
            tracing::error!(error = %e, path = %req.uri().path(), "Session renewal failed");
            return internal_error();
        }
    };

    let cookie = session_cookie(&authenticated.session, state.config.session.secure_cookies);
    req.extensions_mut().insert(CurrentUser(authenticated.username));

    let response = next.run(req).await;
    (jar.add(cookie), response).into_response()
}

/// The `session_id` cookie for a freshly issued or renewed session
pub fn session_cookie(session: &Session, secure: bool) -> Cookie<'static> {
    let builder = Cookie::build((SESSION_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax);

    match OffsetDateTime::from_unix_timestamp(session.expires_at.timestamp()) {
        Ok(expires) => builder.expires(expires).build(),
        Err(_) => builder.build(),
    }
}

/// Cookie that tells the browser to drop the session immediately
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(CookieDuration::seconds(-1))
        .build()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let session = Session {
            token: "a".repeat(60),
            expires_at: Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap(),
        };
        let rendered = session_cookie(&session, false).to_string();

        assert!(rendered.starts_with(&format!("session_id={}", "a".repeat(60))));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Expires=Wed, 02 Jan 2030 03:04:05 GMT"));
        assert!(!rendered.contains("Secure"));
    }

    #[test]
    fn test_removal_cookie_has_negative_max_age() {
        let rendered = removal_cookie().to_string();
        assert!(rendered.starts_with("session_id=;"));
        assert!(rendered.contains("Max-Age=-1"));
    }
}
