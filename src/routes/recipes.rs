// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recipe routes: CRUD, favorites, shopping cart and the shopping list
//! download.

use crate::error::{AppError, Result};
use crate::middleware::auth::{require_auth, AuthUser};
use crate::models::{Ingredient, MarkKind, Recipe, RecipeIngredient, Tag};
use crate::routes::responses::{
    build_recipe_responses, RecipeResponse, RecipeShortResponse, ViewerContext,
};
use crate::routes::{current_user, endpoint_url, optional_user};
use crate::services::image::{decode_data_uri, DecodedImage, ImageError};
use crate::services::recipe_validation::{resolve_references, ResolvedReferences};
use crate::services::shopping_list;
use crate::services::{paginate, Page, PageParams, RecipeFilter, RecipeWrite, ValidatedRecipe};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode, Uri},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route(
            "/api/recipes/download_shopping_cart/",
            get(download_shopping_cart),
        )
        .route(
            "/api/recipes/{id}/favorite/",
            post(add_favorite).delete(remove_favorite),
        )
        .route(
            "/api/recipes/{id}/shopping_cart/",
            post(add_to_shopping_cart).delete(remove_from_shopping_cart),
        )
        .route_layer(middleware::from_fn(require_auth));

    // Reads are public; writes on these paths check auth in the handler.
    Router::new()
        .route("/api/recipes/", get(list_recipes).post(create_recipe))
        .route(
            "/api/recipes/{id}/",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
        .merge(protected)
}

fn require_user(auth: Option<Extension<AuthUser>>) -> Result<AuthUser> {
    auth.map(|Extension(a)| a).ok_or(AppError::Unauthorized)
}

fn image_error(err: ImageError) -> AppError {
    match err {
        ImageError::Io(e) => AppError::Internal(anyhow::anyhow!("Failed to store image: {}", e)),
        other => AppError::field("image", other.to_string()),
    }
}

async fn load_recipe(state: &AppState, id: u64) -> Result<Recipe> {
    state
        .db
        .get_recipe(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {} not found", id)))
}

/// Full view of a single recipe for `viewer`.
async fn recipe_response(
    state: &AppState,
    viewer: Option<u64>,
    recipe: Recipe,
) -> Result<RecipeResponse> {
    let recipe_id = recipe.id;
    let ctx = ViewerContext::for_recipes(&state.db, viewer).await?;
    build_recipe_responses(state, &ctx, vec![recipe])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("Recipe {} not found", recipe_id)))
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RecipeListQuery {
    author: Option<u64>,
    /// Tag slugs; repeatable
    #[serde(default)]
    tags: Vec<String>,
    is_favorited: Option<u8>,
    is_in_shopping_cart: Option<u8>,
}

/// List recipes, newest first.
async fn list_recipes(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthUser>>,
    axum_extra::extract::Query(params): axum_extra::extract::Query<RecipeListQuery>,
    Query(page): Query<PageParams>,
    uri: Uri,
) -> Result<Json<Page<RecipeResponse>>> {
    let viewer = optional_user(&state, auth.map(|Extension(a)| a))
        .await?
        .map(|u| u.id);
    let filter = RecipeFilter::new(
        params.author,
        params.tags,
        params.is_favorited,
        params.is_in_shopping_cart,
        viewer,
    );

    let (recipes, ctx) = tokio::try_join!(
        state.db.list_recipes(filter.author, &filter.tags),
        ViewerContext::for_recipes(&state.db, viewer),
    )?;
    let recipes: Vec<Recipe> = recipes
        .into_iter()
        .filter(|r| filter.matches(r, &ctx.favorites, &ctx.shopping_cart))
        .collect();

    tracing::debug!(
        ?viewer,
        author = ?filter.author,
        tags = ?filter.tags,
        count = recipes.len(),
        "Listed recipes"
    );

    let page = paginate(
        recipes,
        page,
        &endpoint_url(&state, &uri),
        uri.query().unwrap_or(""),
    );
    let results = build_recipe_responses(&state, &ctx, page.results).await?;

    Ok(Json(Page {
        count: page.count,
        next: page.next,
        previous: page.previous,
        results,
    }))
}

async fn get_recipe(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<u64>,
) -> Result<Json<RecipeResponse>> {
    let viewer = optional_user(&state, auth.map(|Extension(a)| a))
        .await?
        .map(|u| u.id);
    let recipe = load_recipe(&state, id).await?;
    Ok(Json(recipe_response(&state, viewer, recipe).await?))
}

// ─── Writes ──────────────────────────────────────────────────

/// Look up everything a validated payload references.
async fn resolve(state: &AppState, recipe: &ValidatedRecipe) -> Result<ResolvedReferences> {
    let ingredient_ids: Vec<u64> = recipe.ingredients.iter().map(|(id, _)| *id).collect();
    let (ingredients, tags): (Vec<Ingredient>, Vec<Tag>) = tokio::try_join!(
        state.db.get_ingredients_by_ids(&ingredient_ids),
        state.db.get_tags_by_ids(&recipe.tag_ids),
    )?;
    resolve_references(recipe, ingredients, tags)
}

fn ingredient_rows(recipe_id: u64, resolved: &ResolvedReferences) -> Vec<RecipeIngredient> {
    resolved
        .ingredients
        .iter()
        .map(|(ingredient, amount)| RecipeIngredient {
            recipe_id,
            ingredient_id: ingredient.id,
            name: ingredient.name.clone(),
            measurement_unit: ingredient.measurement_unit.clone(),
            amount: *amount,
        })
        .collect()
}

async fn create_recipe(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthUser>>,
    payload: std::result::Result<Json<RecipeWrite>, JsonRejection>,
) -> Result<(StatusCode, Json<RecipeResponse>)> {
    let auth = require_user(auth)?;
    let Json(payload) = payload?;

    let recipe = payload.validate(true)?;
    let image: DecodedImage = match recipe.image.as_deref() {
        Some(uri) => decode_data_uri(uri).map_err(image_error)?,
        None => return Err(AppError::field("image", "This field is required.")),
    };

    let author = current_user(&state, auth).await?;
    let resolved = resolve(&state, &recipe).await?;
    let image_path = state.images.save(&image).await.map_err(image_error)?;

    let new_recipe = Recipe {
        id: 0,
        author_id: author.id,
        name: recipe.name,
        image: image_path,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        tag_ids: resolved.tags.iter().map(|t| t.id).collect(),
        tag_slugs: resolved.tags.iter().map(|t| t.slug.clone()).collect(),
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    let rows = ingredient_rows(0, &resolved);
    let created = state.db.create_recipe(new_recipe, rows).await?;

    let response = recipe_response(&state, Some(author.id), created).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Update a recipe. Only the author may do this; every field except the
/// image must be supplied and the ingredient list is replaced wholesale.
async fn update_recipe(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<u64>,
    payload: std::result::Result<Json<RecipeWrite>, JsonRejection>,
) -> Result<Json<RecipeResponse>> {
    let user = current_user(&state, require_user(auth)?).await?;
    let existing = load_recipe(&state, id).await?;
    if existing.author_id != user.id {
        return Err(AppError::Forbidden(
            "Only the author can change this recipe.".to_string(),
        ));
    }

    let Json(payload) = payload?;
    let recipe = payload.validate(false)?;
    let image = recipe
        .image
        .as_deref()
        .map(decode_data_uri)
        .transpose()
        .map_err(image_error)?;

    let resolved = resolve(&state, &recipe).await?;
    let image_path = match image {
        Some(image) => state.images.save(&image).await.map_err(image_error)?,
        None => existing.image.clone(),
    };

    let updated = Recipe {
        name: recipe.name,
        image: image_path,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        tag_ids: resolved.tags.iter().map(|t| t.id).collect(),
        tag_slugs: resolved.tags.iter().map(|t| t.slug.clone()).collect(),
        ..existing
    };
    let rows = ingredient_rows(updated.id, &resolved);
    state.db.update_recipe(&updated, &rows).await?;

    Ok(Json(
        recipe_response(&state, Some(user.id), updated).await?,
    ))
}

async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    let user = current_user(&state, require_user(auth)?).await?;
    let recipe = load_recipe(&state, id).await?;
    if recipe.author_id != user.id {
        return Err(AppError::Forbidden(
            "Only the author can delete this recipe.".to_string(),
        ));
    }

    state.db.delete_recipe(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Favorites / Shopping Cart ───────────────────────────────

/// Add a recipe to favorites or the cart.
///
/// A missing recipe is a bad request here rather than 404.
async fn add_mark(
    state: &AppState,
    auth: AuthUser,
    kind: MarkKind,
    recipe_id: u64,
) -> Result<(StatusCode, Json<RecipeShortResponse>)> {
    let user = current_user(state, auth).await?;
    let recipe = state
        .db
        .get_recipe(recipe_id)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("Recipe {} does not exist.", recipe_id)))?;

    state.db.add_mark(kind, user.id, recipe_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(RecipeShortResponse::new(&recipe, &state.config.media_url())),
    ))
}

async fn remove_mark(
    state: &AppState,
    auth: AuthUser,
    kind: MarkKind,
    recipe_id: u64,
) -> Result<StatusCode> {
    let user = current_user(state, auth).await?;
    load_recipe(state, recipe_id).await?;

    if !state.db.remove_mark(kind, user.id, recipe_id).await? {
        return Err(AppError::BadRequest(format!(
            "Recipe is not in {}.",
            kind.label()
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<u64>,
) -> Result<(StatusCode, Json<RecipeShortResponse>)> {
    add_mark(&state, auth, MarkKind::Favorite, id).await
}

async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    remove_mark(&state, auth, MarkKind::Favorite, id).await
}

async fn add_to_shopping_cart(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<u64>,
) -> Result<(StatusCode, Json<RecipeShortResponse>)> {
    add_mark(&state, auth, MarkKind::ShoppingCart, id).await
}

async fn remove_from_shopping_cart(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    remove_mark(&state, auth, MarkKind::ShoppingCart, id).await
}

/// Plain-text shopping list for every recipe in the caller's cart.
async fn download_shopping_cart(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let user = current_user(&state, auth).await?;
    let recipe_ids = state
        .db
        .get_marked_recipe_ids(MarkKind::ShoppingCart, user.id)
        .await?;
    let rows = if recipe_ids.is_empty() {
        Vec::new()
    } else {
        state.db.get_ingredients_for_recipes(&recipe_ids).await?
    };

    let items = shopping_list::aggregate(&rows);
    tracing::info!(
        user_id = user.id,
        recipes = recipe_ids.len(),
        lines = items.len(),
        "Shopping list generated"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_cart\"",
            ),
        ],
        shopping_list::render(&items),
    ))
}
