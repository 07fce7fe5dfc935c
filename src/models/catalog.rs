// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Reference data: ingredients and tags.

use serde::{Deserialize, Serialize};

/// Ingredient with its unit of measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: u64,
    pub name: String,
    pub measurement_unit: String,
    /// Lowercased name, indexed for prefix search
    #[serde(default)]
    pub name_lower: String,
}

impl Ingredient {
    pub fn new(id: u64, name: &str, measurement_unit: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            measurement_unit: measurement_unit.to_string(),
            name_lower: name.to_lowercase(),
        }
    }
}

/// Recipe tag (e.g. "Breakfast").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    /// Unique display name
    pub name: String,
    /// Hex color, `#RRGGBB`
    pub color: String,
    /// Unique URL slug, used by the recipe list filter
    pub slug: String,
}
