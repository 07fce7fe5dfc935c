// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Existence-marker relations: follows, favorites, shopping cart entries.

use crate::db::collections;
use serde::{Deserialize, Serialize};

/// "user follows author".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    pub user_id: u64,
    pub author_id: u64,
    pub created_at: String,
}

impl Follow {
    pub fn doc_id(user_id: u64, author_id: u64) -> String {
        format!("{}_{}", user_id, author_id)
    }
}

/// The two user × recipe relations. Both are stored the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    Favorite,
    ShoppingCart,
}

impl MarkKind {
    pub fn collection(self) -> &'static str {
        match self {
            MarkKind::Favorite => collections::FAVORITES,
            MarkKind::ShoppingCart => collections::SHOPPING_CART,
        }
    }

    /// Human-readable name for error messages.
    pub fn label(self) -> &'static str {
        match self {
            MarkKind::Favorite => "favorites",
            MarkKind::ShoppingCart => "the shopping cart",
        }
    }
}

/// A favorite or shopping-cart entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeMark {
    pub user_id: u64,
    pub recipe_id: u64,
    pub created_at: String,
}

impl RecipeMark {
    pub fn doc_id(user_id: u64, recipe_id: u64) -> String {
        format!("{}_{}", user_id, recipe_id)
    }
}
