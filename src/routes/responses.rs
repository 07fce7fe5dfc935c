// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Response payloads and the code that assembles them from stored entities.

use crate::db::FirestoreDb;
use crate::error::Result;
use crate::models::{Ingredient, MarkKind, Recipe, RecipeIngredient, Tag, User};
use crate::services::image::image_url;
use crate::AppState;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

// ─── Users ───────────────────────────────────────────────────

/// Public view of a user.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub email: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Whether the caller follows this user
    pub is_subscribed: bool,
}

impl UserResponse {
    pub fn new(user: &User, is_subscribed: bool) -> Self {
        Self {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
        }
    }
}

/// A followed author with a preview of their recipes.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub recipes: Vec<RecipeShortResponse>,
    pub recipes_count: usize,
}

// ─── Catalog ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct IngredientResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub name: String,
    pub measurement_unit: String,
}

impl From<Ingredient> for IngredientResponse {
    fn from(ingredient: Ingredient) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TagResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            color: tag.color,
            slug: tag.slug,
        }
    }
}

// ─── Recipes ─────────────────────────────────────────────────

/// One ingredient line of a recipe.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecipeIngredientResponse {
    /// Ingredient ID
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: u32,
}

impl From<RecipeIngredient> for RecipeIngredientResponse {
    fn from(row: RecipeIngredient) -> Self {
        Self {
            id: row.ingredient_id,
            name: row.name,
            measurement_unit: row.measurement_unit,
            amount: row.amount,
        }
    }
}

/// Full recipe view.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecipeResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    /// Absolute image URL
    pub image: String,
    pub text: String,
    pub cooking_time: u32,
}

/// Short recipe view used in subscriptions and favorite/cart responses.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecipeShortResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub name: String,
    pub image: String,
    pub cooking_time: u32,
}

impl RecipeShortResponse {
    pub fn new(recipe: &Recipe, media_url: &str) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            image: image_url(media_url, &recipe.image),
            cooking_time: recipe.cooking_time,
        }
    }
}

// ─── Assembly ────────────────────────────────────────────────

/// What the caller's relations look like, for the per-entity booleans.
///
/// Anonymous callers get empty sets, so every flag renders `false`.
#[derive(Debug, Default)]
pub struct ViewerContext {
    pub following: HashSet<u64>,
    pub favorites: HashSet<u64>,
    pub shopping_cart: HashSet<u64>,
}

impl ViewerContext {
    /// Load the authors the caller follows.
    pub async fn for_users(db: &FirestoreDb, viewer: Option<u64>) -> Result<Self> {
        let Some(user_id) = viewer else {
            return Ok(Self::default());
        };
        Ok(Self {
            following: db
                .get_followed_author_ids(user_id)
                .await?
                .into_iter()
                .collect(),
            ..Self::default()
        })
    }

    /// Load follows, favorites and cart of the caller.
    pub async fn for_recipes(db: &FirestoreDb, viewer: Option<u64>) -> Result<Self> {
        let Some(user_id) = viewer else {
            return Ok(Self::default());
        };
        let (following, favorites, shopping_cart) = tokio::try_join!(
            db.get_followed_author_ids(user_id),
            db.get_marked_recipe_ids(MarkKind::Favorite, user_id),
            db.get_marked_recipe_ids(MarkKind::ShoppingCart, user_id),
        )?;
        Ok(Self {
            following: following.into_iter().collect(),
            favorites: favorites.into_iter().collect(),
            shopping_cart: shopping_cart.into_iter().collect(),
        })
    }

    pub fn user(&self, user: &User) -> UserResponse {
        UserResponse::new(user, self.following.contains(&user.id))
    }
}

/// Expand recipes into full views, keeping their order.
///
/// Recipes whose author no longer exists are skipped.
pub async fn build_recipe_responses(
    state: &AppState,
    ctx: &ViewerContext,
    recipes: Vec<Recipe>,
) -> Result<Vec<RecipeResponse>> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }

    let recipe_ids: Vec<u64> = recipes.iter().map(|r| r.id).collect();
    let author_ids: Vec<u64> = recipes.iter().map(|r| r.author_id).collect();

    let (authors, tags, rows) = tokio::try_join!(
        state.db.get_users_by_ids(&author_ids),
        state.db.list_tags(),
        state.db.get_ingredients_for_recipes(&recipe_ids),
    )?;

    let authors: HashMap<u64, User> = authors.into_iter().map(|u| (u.id, u)).collect();
    let tags: HashMap<u64, Tag> = tags.into_iter().map(|t| (t.id, t)).collect();
    let mut rows_by_recipe: HashMap<u64, Vec<RecipeIngredient>> = HashMap::new();
    for row in rows {
        rows_by_recipe.entry(row.recipe_id).or_default().push(row);
    }

    let media_url = state.config.media_url();
    let mut out = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let Some(author) = authors.get(&recipe.author_id) else {
            tracing::warn!(
                recipe_id = recipe.id,
                author_id = recipe.author_id,
                "Skipping recipe with missing author"
            );
            continue;
        };

        let mut ingredients = rows_by_recipe.remove(&recipe.id).unwrap_or_default();
        ingredients.sort_by(|a, b| a.name.cmp(&b.name));

        out.push(RecipeResponse {
            id: recipe.id,
            tags: recipe
                .tag_ids
                .iter()
                .filter_map(|id| tags.get(id).cloned().map(TagResponse::from))
                .collect(),
            author: ctx.user(author),
            ingredients: ingredients.into_iter().map(Into::into).collect(),
            is_favorited: ctx.favorites.contains(&recipe.id),
            is_in_shopping_cart: ctx.shopping_cart.contains(&recipe.id),
            image: image_url(&media_url, &recipe.image),
            name: recipe.name,
            text: recipe.text,
            cooking_time: recipe.cooking_time,
        });
    }
    Ok(out)
}
