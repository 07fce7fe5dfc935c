// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recipe write payload validation.
//!
//! Validation happens in two passes. [`RecipeWrite::validate`] checks the
//! payload shape (required fields, bounds, duplicates) without touching the
//! database. [`resolve_references`] then checks that every referenced
//! ingredient and tag exists. Both passes stop at the first violation.

use crate::error::{AppError, Result};
use crate::models::recipe::MAX_COOKING_TIME;
use crate::models::{Ingredient, Tag};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

pub const NAME_MAX_LENGTH: usize = 200;
const MIN_COOKING_TIME: i64 = 1;
const MIN_AMOUNT: i64 = 1;
/// An update deletes up to this many old rows and writes up to this many
/// new ones plus the recipe, all inside one Firestore transaction (500 writes).
pub const MAX_INGREDIENTS: usize = 200;

/// `{id, amount}` entry of the ingredient list.
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientAmount {
    pub id: u64,
    pub amount: i64,
}

/// Recipe create/update payload as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeWrite {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
    /// Base64 data URI
    pub image: Option<String>,
    pub tags: Option<Vec<u64>>,
    pub ingredients: Option<Vec<IngredientAmount>>,
}

/// A payload that passed shape validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecipe {
    pub name: String,
    pub text: String,
    pub cooking_time: u32,
    pub image: Option<String>,
    pub tag_ids: Vec<u64>,
    /// (ingredient id, amount) in payload order
    pub ingredients: Vec<(u64, u32)>,
}

fn required() -> String {
    "This field is required.".to_string()
}

impl RecipeWrite {
    /// Check the payload shape. `require_image` is set on create; on update a
    /// missing image keeps the current one.
    pub fn validate(self, require_image: bool) -> Result<ValidatedRecipe> {
        let ingredients = validate_ingredients(self.ingredients)?;
        let tag_ids = validate_tags(self.tags)?;

        let cooking_time = self
            .cooking_time
            .ok_or_else(|| AppError::field("cooking_time", required()))?;
        if cooking_time < MIN_COOKING_TIME {
            return Err(AppError::field(
                "cooking_time",
                "Cooking time must be at least one minute.",
            ));
        }
        if cooking_time > MAX_COOKING_TIME {
            return Err(AppError::field(
                "cooking_time",
                format!("Cooking time must not exceed {} minutes.", MAX_COOKING_TIME),
            ));
        }

        let name = self
            .name
            .map(|n| n.trim().to_string())
            .ok_or_else(|| AppError::field("name", required()))?;
        if name.is_empty() {
            return Err(AppError::field("name", "This field may not be blank."));
        }
        if name.chars().count() > NAME_MAX_LENGTH {
            return Err(AppError::field(
                "name",
                format!("Ensure this field has no more than {} characters.", NAME_MAX_LENGTH),
            ));
        }

        let text = self.text.ok_or_else(|| AppError::field("text", required()))?;
        if text.trim().is_empty() {
            return Err(AppError::field("text", "This field may not be blank."));
        }

        let image = match self.image {
            Some(image) if image.trim().is_empty() => {
                return Err(AppError::field("image", "This field may not be blank."))
            }
            Some(image) => Some(image),
            None if require_image => return Err(AppError::field("image", required())),
            None => None,
        };

        Ok(ValidatedRecipe {
            name,
            text,
            cooking_time: cooking_time as u32,
            image,
            tag_ids,
            ingredients,
        })
    }
}

fn validate_ingredients(ingredients: Option<Vec<IngredientAmount>>) -> Result<Vec<(u64, u32)>> {
    let ingredients = ingredients.ok_or_else(|| AppError::field("ingredients", required()))?;
    if ingredients.is_empty() {
        return Err(AppError::field(
            "ingredients",
            "A recipe needs at least one ingredient.",
        ));
    }
    if ingredients.len() > MAX_INGREDIENTS {
        return Err(AppError::field(
            "ingredients",
            format!("A recipe can have at most {} ingredients.", MAX_INGREDIENTS),
        ));
    }

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(ingredients.len());
    for item in ingredients {
        if !seen.insert(item.id) {
            return Err(AppError::field(
                "ingredients",
                format!("Ingredient {} is listed more than once.", item.id),
            ));
        }
        if item.amount < MIN_AMOUNT {
            return Err(AppError::field(
                "ingredients",
                format!("Amount of ingredient {} must be at least 1.", item.id),
            ));
        }
        let amount = u32::try_from(item.amount).map_err(|_| {
            AppError::field(
                "ingredients",
                format!("Amount of ingredient {} is too large.", item.id),
            )
        })?;
        out.push((item.id, amount));
    }
    Ok(out)
}

fn validate_tags(tags: Option<Vec<u64>>) -> Result<Vec<u64>> {
    let tags = tags.ok_or_else(|| AppError::field("tags", required()))?;
    if tags.is_empty() {
        return Err(AppError::field("tags", "A recipe needs at least one tag."));
    }

    let mut seen = HashSet::new();
    for id in &tags {
        if !seen.insert(*id) {
            return Err(AppError::field(
                "tags",
                format!("Tag {} is listed more than once.", id),
            ));
        }
    }
    Ok(tags)
}

/// Ingredients and tags a validated recipe refers to, in payload order.
#[derive(Debug, Clone)]
pub struct ResolvedReferences {
    pub ingredients: Vec<(Ingredient, u32)>,
    pub tags: Vec<Tag>,
}

/// Match the payload's ids against what the catalog returned.
///
/// `ingredients` and `tags` are the catalog entries found for the requested
/// ids; any requested id absent from them is reported.
pub fn resolve_references(
    recipe: &ValidatedRecipe,
    ingredients: Vec<Ingredient>,
    tags: Vec<Tag>,
) -> Result<ResolvedReferences> {
    let mut ingredients_by_id: HashMap<u64, Ingredient> =
        ingredients.into_iter().map(|i| (i.id, i)).collect();
    let mut tags_by_id: HashMap<u64, Tag> = tags.into_iter().map(|t| (t.id, t)).collect();

    let mut resolved_ingredients = Vec::with_capacity(recipe.ingredients.len());
    for (id, amount) in &recipe.ingredients {
        let ingredient = ingredients_by_id.remove(id).ok_or_else(|| {
            AppError::field("ingredients", format!("Ingredient {} does not exist.", id))
        })?;
        resolved_ingredients.push((ingredient, *amount));
    }

    let mut resolved_tags = Vec::with_capacity(recipe.tag_ids.len());
    for id in &recipe.tag_ids {
        let tag = tags_by_id
            .remove(id)
            .ok_or_else(|| AppError::field("tags", format!("Tag {} does not exist.", id)))?;
        resolved_tags.push(tag);
    }

    Ok(ResolvedReferences {
        ingredients: resolved_ingredients,
        tags: resolved_tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> RecipeWrite {
        RecipeWrite {
            name: Some("Pancakes".to_string()),
            text: Some("Mix and fry.".to_string()),
            cooking_time: Some(20),
            image: Some("data:image/png;base64,iVBORw0KGgo=".to_string()),
            tags: Some(vec![1, 2]),
            ingredients: Some(vec![
                IngredientAmount { id: 10, amount: 200 },
                IngredientAmount { id: 11, amount: 2 },
            ]),
        }
    }

    fn field_of(err: AppError) -> String {
        match err {
            AppError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_payload_passes() {
        let recipe = valid_payload().validate(true).unwrap();
        assert_eq!(recipe.cooking_time, 20);
        assert_eq!(recipe.ingredients, vec![(10, 200), (11, 2)]);
        assert_eq!(recipe.tag_ids, vec![1, 2]);
    }

    #[test]
    fn test_duplicate_ingredient_rejected() {
        let mut payload = valid_payload();
        payload.ingredients = Some(vec![
            IngredientAmount { id: 10, amount: 1 },
            IngredientAmount { id: 10, amount: 5 },
        ]);
        let err = payload.validate(true).unwrap_err();
        assert!(err.to_string().contains("more than once"));
        assert_eq!(field_of(err), "ingredients");
    }

    #[test]
    fn test_empty_ingredients_rejected() {
        let mut payload = valid_payload();
        payload.ingredients = Some(vec![]);
        assert_eq!(field_of(payload.validate(true).unwrap_err()), "ingredients");
    }

    #[test]
    fn test_ingredient_count_limit() {
        let many = |n: usize| -> Vec<IngredientAmount> {
            (1..=n as u64)
                .map(|id| IngredientAmount { id, amount: 1 })
                .collect()
        };

        let mut payload = valid_payload();
        payload.ingredients = Some(many(MAX_INGREDIENTS));
        assert_eq!(
            payload.validate(true).unwrap().ingredients.len(),
            MAX_INGREDIENTS
        );

        let mut payload = valid_payload();
        payload.ingredients = Some(many(MAX_INGREDIENTS + 1));
        let err = payload.validate(true).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(field_of(err), "ingredients");
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut payload = valid_payload();
        payload.ingredients = Some(vec![IngredientAmount { id: 10, amount: 0 }]);
        assert_eq!(field_of(payload.validate(true).unwrap_err()), "ingredients");
    }

    #[test]
    fn test_duplicate_and_empty_tags_rejected() {
        let mut payload = valid_payload();
        payload.tags = Some(vec![3, 3]);
        assert_eq!(field_of(payload.validate(true).unwrap_err()), "tags");

        let mut payload = valid_payload();
        payload.tags = Some(vec![]);
        assert_eq!(field_of(payload.validate(true).unwrap_err()), "tags");
    }

    #[test]
    fn test_cooking_time_bounds() {
        let mut payload = valid_payload();
        payload.cooking_time = Some(0);
        assert_eq!(field_of(payload.validate(true).unwrap_err()), "cooking_time");

        let mut payload = valid_payload();
        payload.cooking_time = Some(MAX_COOKING_TIME + 1);
        assert_eq!(field_of(payload.validate(true).unwrap_err()), "cooking_time");

        let mut payload = valid_payload();
        payload.cooking_time = Some(MAX_COOKING_TIME);
        assert!(payload.validate(true).is_ok());
    }

    #[test]
    fn test_first_violation_wins() {
        let mut payload = valid_payload();
        payload.ingredients = Some(vec![]);
        payload.tags = Some(vec![]);
        payload.cooking_time = Some(0);
        assert_eq!(field_of(payload.validate(true).unwrap_err()), "ingredients");
    }

    #[test]
    fn test_image_required_only_on_create() {
        let mut payload = valid_payload();
        payload.image = None;
        assert_eq!(field_of(payload.clone().validate(true).unwrap_err()), "image");
        assert_eq!(payload.validate(false).unwrap().image, None);
    }

    #[test]
    fn test_missing_ingredient_reported() {
        let recipe = valid_payload().validate(true).unwrap();
        let tags = vec![
            Tag {
                id: 1,
                name: "Breakfast".into(),
                color: "#E26C2D".into(),
                slug: "breakfast".into(),
            },
            Tag {
                id: 2,
                name: "Lunch".into(),
                color: "#49B64E".into(),
                slug: "lunch".into(),
            },
        ];
        let err = resolve_references(&recipe, vec![Ingredient::new(10, "flour", "g")], tags)
            .unwrap_err();
        assert!(err.to_string().contains("Ingredient 11 does not exist"));
    }

    #[test]
    fn test_references_resolved_in_payload_order() {
        let recipe = valid_payload().validate(true).unwrap();
        let ingredients = vec![
            Ingredient::new(11, "egg", "pcs"),
            Ingredient::new(10, "flour", "g"),
        ];
        let tags = vec![
            Tag {
                id: 2,
                name: "Lunch".into(),
                color: "#49B64E".into(),
                slug: "lunch".into(),
            },
            Tag {
                id: 1,
                name: "Breakfast".into(),
                color: "#E26C2D".into(),
                slug: "breakfast".into(),
            },
        ];

        let resolved = resolve_references(&recipe, ingredients, tags).unwrap();
        assert_eq!(resolved.ingredients[0].0.name, "flour");
        assert_eq!(resolved.ingredients[1].1, 2);
        assert_eq!(resolved.tags[0].slug, "breakfast");
    }
}
