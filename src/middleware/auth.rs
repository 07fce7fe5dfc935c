// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.
//!
//! `attach_auth` runs on every request: when credentials are present it
//! validates them and inserts an [`AuthUser`] extension, rejecting bad
//! credentials with 401. Anonymous requests pass through untouched.
//! `require_auth` is layered on routes that need a logged-in user.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the cookie carrying the auth token.
pub const AUTH_COOKIE: &str = "foodgram_token";

/// Token lifetime.
pub const TOKEN_TTL_SECONDS: usize = 30 * 24 * 60 * 60; // 30 days

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Account token version at issue time
    #[serde(default)]
    pub ver: u64,
}

/// Authenticated user extracted from JWT.
///
/// Only the signature and expiry have been checked at this point; handlers
/// compare `token_version` against the stored account when they load it.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: u64,
    pub token_version: u64,
}

/// Pull a raw token from the cookie or the `Authorization` header.
///
/// Both `Token <jwt>` and `Bearer <jwt>` schemes are accepted.
fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(AUTH_COOKIE) {
        return Some(cookie.value().to_string());
    }

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    auth_header
        .strip_prefix("Token ")
        .or_else(|| auth_header.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

/// Validate a token and return the user it was issued to.
pub fn verify_jwt(token: &str, signing_key: &[u8]) -> Result<AuthUser, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data =
        decode::<Claims>(token, &key, &validation).map_err(|_| AppError::InvalidToken)?;

    let user_id: u64 = token_data
        .claims
        .sub
        .parse()
        .map_err(|_| AppError::InvalidToken)?;

    Ok(AuthUser {
        user_id,
        token_version: token_data.claims.ver,
    })
}

/// Middleware that authenticates the request when credentials are present.
pub async fn attach_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(token) = extract_token(&jar, request.headers()) {
        let auth_user = verify_jwt(&token, &state.config.jwt_signing_key).map_err(|e| {
            tracing::debug!(path = %request.uri().path(), "Rejected invalid auth token");
            e
        })?;
        request.extensions_mut().insert(auth_user);
    }

    Ok(next.run(request).await)
}

/// Middleware that requires an authenticated user.
pub async fn require_auth(request: Request, next: Next) -> Result<Response, AppError> {
    if request.extensions().get::<AuthUser>().is_none() {
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(request).await)
}

/// Create a JWT for a user session.
pub fn create_jwt(user_id: u64, token_version: u64, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + TOKEN_TTL_SECONDS,
        ver: token_version,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const KEY: &[u8] = b"unit_test_key_32_bytes_minimum!!";

    #[test]
    fn test_jwt_round_trip() {
        let token = create_jwt(42, 3, KEY).unwrap();
        let user = verify_jwt(&token, KEY).unwrap();
        assert_eq!(user.user_id, 42);
        assert_eq!(user.token_version, 3);
    }

    #[test]
    fn test_jwt_wrong_key_rejected() {
        let token = create_jwt(42, 0, KEY).unwrap();
        assert!(matches!(
            verify_jwt(&token, b"another_key_entirely_32_bytes!!!"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_extract_token_schemes() {
        let jar = CookieJar::new();

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(extract_token(&jar, &headers).as_deref(), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(extract_token(&jar, &headers).as_deref(), Some("xyz"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic foo"));
        assert_eq!(extract_token(&jar, &headers), None);
    }

    #[test]
    fn test_cookie_takes_precedence() {
        let jar = CookieJar::new().add(axum_extra::extract::cookie::Cookie::new(
            AUTH_COOKIE,
            "from-cookie",
        ));
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(extract_token(&jar, &headers).as_deref(), Some("from-cookie"));
    }
}
