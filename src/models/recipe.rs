// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Recipe model and its ingredient join records.

use serde::{Deserialize, Serialize};

/// Upper bound on cooking time, in minutes.
pub const MAX_COOKING_TIME: i64 = 32_000;

/// Stored recipe record in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Numeric recipe ID (also used as document ID)
    pub id: u64,
    /// User ID of the author (owner)
    pub author_id: u64,
    pub name: String,
    /// Image path relative to the media root (e.g. `recipes/<sha256>.png`)
    pub image: String,
    /// Free-form description
    pub text: String,
    /// Cooking time in minutes
    pub cooking_time: u32,
    /// Tag IDs, in the order supplied by the author
    pub tag_ids: Vec<u64>,
    /// Tag slugs, denormalized for `array-contains-any` filtering
    pub tag_slugs: Vec<String>,
    pub created_at: String,
}

/// Recipe-ingredient join record.
///
/// Ingredient name and unit are denormalized so the shopping list can be
/// built from this collection alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub recipe_id: u64,
    pub ingredient_id: u64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: u32,
}

impl RecipeIngredient {
    /// Document ID: one row per (recipe, ingredient) pair.
    pub fn doc_id(&self) -> String {
        format!("{}_{}", self.recipe_id, self.ingredient_id)
    }
}
