// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Foodgram: a recipe-sharing backend
//!
//! This crate provides the REST API for publishing recipes, following
//! authors, keeping favorites and building a shopping list from the
//! recipes in a user's cart.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::ImageStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub images: ImageStore,
}
