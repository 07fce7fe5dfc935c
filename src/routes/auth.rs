// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token login/logout routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{
    create_jwt, require_auth, AuthUser, AUTH_COOKIE, TOKEN_TTL_SECONDS,
};
use crate::routes::current_user;
use crate::services::password::verify_password_async;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/api/auth/token/logout/", post(logout))
        .route_layer(middleware::from_fn(require_auth));

    Router::new()
        .route("/api/auth/token/login/", post(login))
        .merge(protected)
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub auth_token: String,
}

fn is_secure(state: &AppState) -> bool {
    state.config.api_url.starts_with("https://")
}

/// Exchange email + password for a token.
///
/// The token is returned in the body and also set as an HttpOnly cookie.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let Json(payload) = payload?;
    let invalid =
        || AppError::BadRequest("Unable to log in with provided credentials.".to_string());

    let user = state
        .db
        .find_user_by_email(payload.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password_async(payload.password, user.password_hash.clone()).await? {
        tracing::info!(user_id = user.id, "Login failed: wrong password");
        return Err(invalid());
    }

    let token = create_jwt(user.id, user.token_version, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let cookie = Cookie::build((AUTH_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(is_secure(&state))
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(TOKEN_TTL_SECONDS as i64));

    tracing::info!(user_id = user.id, "User logged in");

    Ok((jar.add(cookie), Json(LoginResponse { auth_token: token })))
}

/// Remove the auth cookie with the attributes it was set with.
fn clear_session_cookie(jar: CookieJar, secure: bool) -> CookieJar {
    let removal = Cookie::build(AUTH_COOKIE)
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax);

    jar.remove(removal)
}

/// Logout. Revokes every token issued to the account so far, including the
/// one used for this request, and clears the cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(StatusCode, CookieJar)> {
    let user = current_user(&state, auth).await?;
    state.db.revoke_tokens(user.id).await?;
    tracing::info!(user_id = user.id, "User logged out");

    Ok((
        StatusCode::NO_CONTENT,
        clear_session_cookie(jar, is_secure(&state)),
    ))
}
