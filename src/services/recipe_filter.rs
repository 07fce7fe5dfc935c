// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recipe list filtering.

use crate::models::Recipe;
use std::collections::HashSet;

/// Filters accepted by the recipe list endpoint. All are optional and
/// combine with AND; multiple tag slugs combine with OR.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub author: Option<u64>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeFilter {
    /// Build a filter from raw query values.
    ///
    /// `is_favorited`/`is_in_shopping_cart` only apply when set to a non-zero
    /// value by an authenticated caller; otherwise they are ignored.
    pub fn new(
        author: Option<u64>,
        tags: Vec<String>,
        is_favorited: Option<u8>,
        is_in_shopping_cart: Option<u8>,
        viewer: Option<u64>,
    ) -> Self {
        let authenticated = viewer.is_some();
        let mut tags: Vec<String> = tags.into_iter().filter(|t| !t.is_empty()).collect();
        tags.sort();
        tags.dedup();

        Self {
            author,
            tags,
            is_favorited: authenticated && is_favorited.unwrap_or(0) != 0,
            is_in_shopping_cart: authenticated && is_in_shopping_cart.unwrap_or(0) != 0,
        }
    }

    /// Evaluate the filter against one recipe.
    ///
    /// `favorites` and `cart` are the caller's favorite and cart recipe ids.
    pub fn matches(&self, recipe: &Recipe, favorites: &HashSet<u64>, cart: &HashSet<u64>) -> bool {
        if let Some(author) = self.author {
            if recipe.author_id != author {
                return false;
            }
        }
        if !self.tags.is_empty() && !recipe.tag_slugs.iter().any(|s| self.tags.contains(s)) {
            return false;
        }
        if self.is_favorited && !favorites.contains(&recipe.id) {
            return false;
        }
        if self.is_in_shopping_cart && !cart.contains(&recipe.id) {
            return false;
        }
        true
    }
}
