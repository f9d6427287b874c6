use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;

use crate::api::render;
use crate::api::response::{found, PageError};
use crate::auth::{
    hash_password, removal_cookie, session_cookie, verify_missing_account, verify_password,
};
use crate::session::SESSION_COOKIE;
use crate::storage::models::UserRecord;
use crate::storage::ErrorKind;
use crate::AppState;

pub const WRONG_CREDENTIALS: &str = "Wrong username or password";

const USERNAME_MAX_LEN: usize = 20;
const PASSWORD_MIN_LEN: usize = 6;
const PASSWORD_MAX_LEN: usize = 100;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    #[serde(default)]
    pub timezone: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn login_form(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());

    // Already signed in: skip the form
    if let Ok(Some(authenticated)) = state.sessions.validate_and_renew(token.as_deref()).await {
        let cookie = session_cookie(&authenticated.session, state.config.session.secure_cookies);
        return (jar.add(cookie), found("/")).into_response();
    }

    Html(render::login_page(None, "")).into_response()
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageError> {
    let stored_hash = state
        .db
        .get_password_hash(&form.username)
        .map_err(|e| PageError::internal("Failed to look up password hash", e))?;

    let valid = match stored_hash {
        Some(hash) => verify_password(&form.password, &hash)
            .map_err(|e| PageError::internal("Stored password hash is unreadable", e))?,
        None => verify_missing_account(&form.password),
    };

    if !valid {
        tracing::debug!(username = %form.username, "Rejected login");
        return Ok(Html(render::login_page(Some(WRONG_CREDENTIALS), &form.username)).into_response());
    }

    let session = state
        .sessions
        .create(&form.username)
        .await
        .map_err(|e| PageError::internal("Failed to create session", e))?;

    let cookie = session_cookie(&session, state.config.session.secure_cookies);
    Ok((jar.add(cookie), found("/")).into_response())
}

pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.destroy(cookie.value()).await;
    }

    (jar.add(removal_cookie()), found("/login")).into_response()
}

pub async fn register_form() -> Html<String> {
    Html(render::register_page(None, "", "UTC"))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, PageError> {
    let timezone = match form.timezone.trim() {
        "" => "UTC".to_string(),
        tz => tz.to_string(),
    };

    let rerender = |message: &str| {
        Html(render::register_page(Some(message), &form.username, &timezone)).into_response()
    };

    if let Err(message) = validate_registration(&form, &timezone) {
        return Ok(rerender(message));
    }

    let password_hash = hash_password(&form.password)
        .map_err(|e| PageError::internal("Failed to hash password", e))?;

    let user = UserRecord {
        username: form.username.clone(),
        password_hash,
        rating: 0,
        timezone: timezone.clone(),
        created_at: Utc::now(),
    };

    match state.db.insert_user(&user) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UniqueConstraintViolation => {
            return Ok(rerender("Username already taken"));
        }
        Err(e) => return Err(PageError::internal("Failed to create user", e)),
    }

    tracing::info!(username = %user.username, "Registered user");

    let session = state
        .sessions
        .create(&user.username)
        .await
        .map_err(|e| PageError::internal("Failed to create session", e))?;

    let cookie = session_cookie(&session, state.config.session.secure_cookies);
    Ok((jar.add(cookie), found("/")).into_response())
}

// ============================================================================
// Helpers
// ============================================================================

fn validate_registration(form: &RegisterForm, timezone: &str) -> Result<(), &'static str> {
    if form.username.is_empty() || form.username.len() > USERNAME_MAX_LEN {
        return Err("Username must be between 1 and 20 characters");
    }
    if !form
        .username
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    {
        return Err("Username may only contain lowercase letters and digits");
    }
    let password_len = form.password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&password_len) {
        return Err("Password must be between 6 and 100 characters");
    }
    if form.password != form.password_confirm {
        return Err("Passwords do not match");
    }
    if timezone.parse::<chrono_tz::Tz>().is_err() {
        return Err("Unknown timezone");
    }
    Ok(())
}
