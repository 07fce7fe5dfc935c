// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod auth;
pub mod catalog;
pub mod recipes;
pub mod responses;
pub mod users;

use crate::error::{AppError, Result};
use crate::middleware::auth::{attach_auth, AuthUser};
use crate::models::User;
use crate::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Request bodies carry base64 images, so allow more than axum's 2 MiB default.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Load the account behind an authenticated request.
///
/// A token for a deleted account, or one issued before the last logout or
/// password change, is treated as an invalid token.
pub(crate) async fn current_user(state: &AppState, auth: AuthUser) -> Result<User> {
    let user = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or(AppError::InvalidToken)?;

    if user.token_version != auth.token_version {
        tracing::debug!(user_id = user.id, "Rejected revoked token");
        return Err(AppError::InvalidToken);
    }
    Ok(user)
}

/// Like [`current_user`], for routes that also serve anonymous callers.
pub(crate) async fn optional_user(
    state: &AppState,
    auth: Option<AuthUser>,
) -> Result<Option<User>> {
    match auth {
        Some(auth) => Ok(Some(current_user(state, auth).await?)),
        None => Ok(None),
    }
}

/// Absolute URL of the current endpoint (without query string).
pub(crate) fn endpoint_url(state: &AppState, uri: &axum::http::Uri) -> String {
    format!("{}{}", state.config.api_url, uri.path())
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    let media = ServeDir::new(&state.config.media_root);

    Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes())
        .merge(users::routes())
        .merge(catalog::routes())
        .merge(recipes::routes())
        .nest_service("/media", media)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(state.clone(), attach_auth))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
