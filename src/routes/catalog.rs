// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-only catalog routes: ingredients and tags.

use crate::error::{AppError, Result};
use crate::routes::responses::{IngredientResponse, TagResponse};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

const MAX_NAME_FILTER_LEN: usize = 200;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/ingredients/", get(list_ingredients))
        .route("/api/ingredients/{id}/", get(get_ingredient))
        .route("/api/tags/", get(list_tags))
        .route("/api/tags/{id}/", get(get_tag))
}

#[derive(Deserialize)]
struct IngredientQuery {
    /// Case-insensitive name prefix
    name: Option<String>,
}

/// List ingredients, optionally by name prefix.
async fn list_ingredients(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IngredientQuery>,
) -> Result<Json<Vec<IngredientResponse>>> {
    if let Some(name) = &params.name {
        if name.chars().count() > MAX_NAME_FILTER_LEN {
            return Err(AppError::BadRequest(
                "Invalid 'name' parameter: too long".to_string(),
            ));
        }
    }

    let ingredients = state.db.list_ingredients(params.name.as_deref()).await?;
    tracing::debug!(
        prefix = ?params.name,
        count = ingredients.len(),
        "Listed ingredients"
    );

    Ok(Json(ingredients.into_iter().map(Into::into).collect()))
}

async fn get_ingredient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<IngredientResponse>> {
    let ingredient = state
        .db
        .get_ingredient(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ingredient {} not found", id)))?;
    Ok(Json(ingredient.into()))
}

async fn list_tags(State(state): State<Arc<AppState>>) -> Result<Json<Vec<TagResponse>>> {
    let tags = state.db.list_tags().await?;
    Ok(Json(tags.into_iter().map(Into::into).collect()))
}

async fn get_tag(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<TagResponse>> {
    let tag = state
        .db
        .get_tag(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tag {} not found", id)))?;
    Ok(Json(tag.into()))
}
