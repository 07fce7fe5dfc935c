// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User routes: signup, profiles, password management, account deletion and
//! subscriptions.

use crate::db::firestore::NewUser;
use crate::error::{AppError, Result};
use crate::middleware::auth::{require_auth, AuthUser};
use crate::models::User;
use crate::routes::responses::{
    RecipeShortResponse, SubscriptionResponse, UserResponse, ViewerContext,
};
use crate::routes::{current_user, endpoint_url, optional_user};
use crate::services::password::{hash_password_async, verify_password_async};
use crate::services::{paginate, Page, PageParams};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{StatusCode, Uri},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use validator::{Validate, ValidationError};

pub fn routes() -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/api/users/me/", get(get_me).delete(delete_me))
        .route("/api/users/set_password/", post(set_password))
        .route("/api/users/subscriptions/", get(list_subscriptions))
        .route(
            "/api/users/{id}/subscribe/",
            post(subscribe).delete(unsubscribe),
        )
        .route_layer(middleware::from_fn(require_auth));

    Router::new()
        .route("/api/users/", get(list_users).post(signup))
        .route("/api/users/{id}/", get(get_user))
        .merge(protected)
}

// ─── Signup ──────────────────────────────────────────────────

/// Usernames follow the usual unicode username rule: letters, digits and
/// `@ . + - _`.
fn validate_username(username: &str) -> std::result::Result<(), ValidationError> {
    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if !valid {
        return Err(ValidationError::new("username").with_message(Cow::Borrowed(
            "Enter a valid username. It may contain only letters, numbers, and @/./+/-/_ characters.",
        )));
    }
    // Would shadow the `/api/users/me/` route.
    if username == "me" {
        return Err(ValidationError::new("username")
            .with_message(Cow::Borrowed("This username is reserved.")));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Ensure this field has no more than 254 characters.")
    )]
    pub email: String,
    #[validate(
        length(
            min = 1,
            max = 150,
            message = "Username must be between 1 and 150 characters."
        ),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(length(
        min = 1,
        max = 150,
        message = "First name must be between 1 and 150 characters."
    ))]
    pub first_name: String,
    #[validate(length(
        min = 1,
        max = 150,
        message = "Last name must be between 1 and 150 characters."
    ))]
    pub last_name: String,
    #[validate(length(
        min = 1,
        max = 150,
        message = "Password must be between 1 and 150 characters."
    ))]
    pub password: String,
}

/// Signup response: the profile without `is_subscribed`.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub email: String,
    pub id: u64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

async fn signup(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    let Json(payload) = payload?;
    payload.validate()?;

    let password_hash = hash_password_async(payload.password).await?;
    let user = state
        .db
        .create_user(NewUser {
            email: payload.email.trim().to_string(),
            username: payload.username,
            first_name: payload.first_name,
            last_name: payload.last_name,
            password_hash,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }),
    ))
}

// ─── Profiles ────────────────────────────────────────────────

async fn list_users(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthUser>>,
    Query(page): Query<PageParams>,
    uri: Uri,
) -> Result<Json<Page<UserResponse>>> {
    let viewer = optional_user(&state, auth.map(|Extension(a)| a))
        .await?
        .map(|u| u.id);
    let (users, ctx) = tokio::try_join!(
        state.db.list_users(),
        ViewerContext::for_users(&state.db, viewer),
    )?;

    let users: Vec<UserResponse> = users.iter().map(|u| ctx.user(u)).collect();
    Ok(Json(paginate(
        users,
        page,
        &endpoint_url(&state, &uri),
        uri.query().unwrap_or(""),
    )))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<u64>,
) -> Result<Json<UserResponse>> {
    let viewer = optional_user(&state, auth.map(|Extension(a)| a)).await?;
    let user = state
        .db
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

    let is_subscribed = match viewer {
        Some(viewer) => state.db.follow_exists(viewer.id, id).await?,
        None => false,
    };
    Ok(Json(UserResponse::new(&user, is_subscribed)))
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let user = current_user(&state, auth).await?;
    Ok(Json(UserResponse::new(&user, false)))
}

// ─── Password and account ────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct SetPasswordRequest {
    #[validate(length(
        min = 1,
        max = 150,
        message = "Password must be between 1 and 150 characters."
    ))]
    pub new_password: String,
    pub current_password: String,
}

async fn check_current_password(user: &User, password: &str) -> Result<()> {
    if verify_password_async(password.to_string(), user.password_hash.clone()).await? {
        Ok(())
    } else {
        Err(AppError::field("current_password", "Invalid password."))
    }
}

async fn set_password(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    payload: std::result::Result<Json<SetPasswordRequest>, JsonRejection>,
) -> Result<StatusCode> {
    let Json(payload) = payload?;
    payload.validate()?;

    let user = current_user(&state, auth).await?;
    check_current_password(&user, &payload.current_password).await?;

    let password_hash = hash_password_async(payload.new_password).await?;
    state.db.set_password_hash(user.id, &password_hash).await?;
    tracing::info!(user_id = user.id, "Password changed");

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub current_password: String,
}

/// Delete the caller's account and all data it owns.
async fn delete_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    payload: std::result::Result<Json<DeleteAccountRequest>, JsonRejection>,
) -> Result<StatusCode> {
    let Json(payload) = payload?;
    let user = current_user(&state, auth).await?;
    check_current_password(&user, &payload.current_password).await?;

    let deleted = state.db.delete_user_data(&user).await?;
    tracing::info!(user_id = user.id, deleted, "Account deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ─── Subscriptions ───────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RecipesLimitQuery {
    /// Max recipes to embed per author; all when absent.
    pub recipes_limit: Option<usize>,
}

/// An author with a preview of their newest recipes.
async fn subscription_response(
    state: &AppState,
    author: &User,
    is_subscribed: bool,
    recipes_limit: Option<usize>,
) -> Result<SubscriptionResponse> {
    let recipes = state.db.list_recipes(Some(author.id), &[]).await?;
    let recipes_count = recipes.len();
    let media_url = state.config.media_url();

    Ok(SubscriptionResponse {
        user: UserResponse::new(author, is_subscribed),
        recipes: recipes
            .iter()
            .take(recipes_limit.unwrap_or(usize::MAX))
            .map(|r| RecipeShortResponse::new(r, &media_url))
            .collect(),
        recipes_count,
    })
}

/// Authors the caller follows, ordered by username.
async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(page): Query<PageParams>,
    Query(limit): Query<RecipesLimitQuery>,
    uri: Uri,
) -> Result<Json<Page<SubscriptionResponse>>> {
    let user = current_user(&state, auth).await?;
    let author_ids = state.db.get_followed_author_ids(user.id).await?;
    let mut authors = state.db.get_users_by_ids(&author_ids).await?;
    authors.sort_by(|a, b| a.username.cmp(&b.username));

    let page = paginate(
        authors,
        page,
        &endpoint_url(&state, &uri),
        uri.query().unwrap_or(""),
    );
    let results = try_join_all(
        page.results
            .iter()
            .map(|author| subscription_response(&state, author, true, limit.recipes_limit)),
    )
    .await?;

    Ok(Json(Page {
        count: page.count,
        next: page.next,
        previous: page.previous,
        results,
    }))
}

async fn subscribe(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(author_id): Path<u64>,
    Query(limit): Query<RecipesLimitQuery>,
) -> Result<(StatusCode, Json<SubscriptionResponse>)> {
    let user = current_user(&state, auth).await?;
    let author = state
        .db
        .get_user(author_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", author_id)))?;

    state.db.create_follow(user.id, author_id).await?;

    let response = subscription_response(&state, &author, true, limit.recipes_limit).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(author_id): Path<u64>,
) -> Result<StatusCode> {
    let user = current_user(&state, auth).await?;
    if state.db.get_user(author_id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", author_id)));
    }

    if !state.db.delete_follow(user.id, author_id).await? {
        return Err(AppError::BadRequest(
            "You are not subscribed to this user.".to_string(),
        ));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            username: username.to_string(),
            first_name: "Vasya".to_string(),
            last_name: "Pupkin".to_string(),
            password: "correct horse".to_string(),
        }
    }

    #[test]
    fn test_valid_signup() {
        assert!(request("vasya.pupkin", "vasya@example.com").validate().is_ok());
        assert!(request("user+tag@home-1_x", "a@b.co").validate().is_ok());
    }

    #[test]
    fn test_username_rejects_spaces() {
        let err: AppError = request("vasya pupkin", "vasya@example.com")
            .validate()
            .unwrap_err()
            .into();
        match err {
            AppError::Validation { field, .. } => assert_eq!(field, "username"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_username_me_reserved() {
        assert!(request("me", "me@example.com").validate().is_err());
    }

    #[test]
    fn test_invalid_email() {
        let err: AppError = request("vasya", "not-an-email").validate().unwrap_err().into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn test_long_first_name() {
        let mut req = request("vasya", "vasya@example.com");
        req.first_name = "x".repeat(151);
        assert!(req.validate().is_err());
    }

    #[tokio::test]
    async fn test_current_password_check() {
        let user = User {
            id: 1,
            email: "a@example.com".to_string(),
            username: "a".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            password_hash: crate::services::password::hash_password("secret").unwrap(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            token_version: 0,
        };
        assert!(check_current_password(&user, "secret").await.is_ok());
        assert!(check_current_password(&user, "wrong").await.is_err());
    }
}
