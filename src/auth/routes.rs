//! Email/password sign-in for the admin dashboard
//!
//! Credentials are checked against the configured admin email and password
//! digest; a successful login sets an HMAC-signed session cookie.

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::post,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::session::{Session, create_session_token};
use crate::AppState;
use crate::error::AppError;

/// Create authentication router
///
/// Routes:
/// - POST /auth/login - Email/password sign-in
/// - POST /auth/logout - Clear the session
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// POST /auth/login
///
/// Verifies the supplied credentials against configuration and sets the
/// session cookie. Invalid credentials are indistinguishable in the
/// response (always `Unauthorized`).
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let auth = &state.config.auth;

    let email_matches = req.email.trim().eq_ignore_ascii_case(&auth.admin_email);
    let password_digest = format!("{:x}", Sha256::digest(req.password.as_bytes()));
    let password_matches = password_digest == auth.admin_password_sha256.to_ascii_lowercase();

    if !email_matches || !password_matches {
        tracing::warn!(email = %req.email, "Rejected admin login attempt");
        return Err(AppError::Unauthorized);
    }

    let now = Utc::now();
    let session = Session {
        email: auth.admin_email.clone(),
        created_at: now,
        expires_at: now + Duration::seconds(auth.session_max_age),
    };
    let token = create_session_token(&session, &auth.session_secret)?;

    // Expiry is enforced by the signed token; the cookie itself is a
    // session cookie.
    let cookie = Cookie::build(("session", token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.should_use_secure_cookies())
        .build();

    tracing::info!(email = %session.email, "Admin signed in");

    Ok((
        jar.add(cookie),
        Json(serde_json::json!({ "email": session.email })),
    ))
}

/// POST /auth/logout
///
/// Clears the session cookie, invalidating the session on this client.
/// The overwrite is unconditional: a removal is only emitted for cookies
/// the request carried, so an empty-token overwrite is set instead. An
/// empty token never verifies.
async fn logout(jar: CookieJar) -> impl IntoResponse {
    let cookie = Cookie::build(("session", ""))
        .path("/")
        .http_only(true)
        .build();

    (jar.add(cookie), Json(serde_json::json!({ "ok": true })))
}
