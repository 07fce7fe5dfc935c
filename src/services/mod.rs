// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod catalog_import;
pub mod image;
pub mod pagination;
pub mod password;
pub mod recipe_filter;
pub mod recipe_validation;
pub mod shopping_list;

pub use image::ImageStore;
pub use pagination::{paginate, Page, PageParams};
pub use recipe_filter::RecipeFilter;
pub use recipe_validation::{RecipeWrite, ValidatedRecipe};
pub use shopping_list::ShoppingListItem;
