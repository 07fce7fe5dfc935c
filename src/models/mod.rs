// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod catalog;
pub mod membership;
pub mod recipe;
pub mod user;

pub use catalog::{Ingredient, Tag};
pub use membership::{Follow, MarkKind, RecipeMark};
pub use recipe::{Recipe, RecipeIngredient};
pub use user::User;
