// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Integration tests for user deletion.
//!
//! These tests require the Firestore emulator to be running
//! (`FIRESTORE_EMULATOR_HOST`).

use foodgram::db::firestore::NewUser;
use foodgram::models::{Ingredient, MarkKind, Recipe, RecipeIngredient, Tag};

mod common;
use common::{test_db, unique_suffix};

#[tokio::test]
async fn test_delete_user_data_removes_all_records() {
    require_emulator!();
    let db = test_db().await;
    let suffix = unique_suffix();

    // 1. Two users
    let new_user = |label: &str| NewUser {
        email: format!("{label}{suffix}@example.com"),
        username: format!("{label}{suffix}"),
        first_name: "Delete".to_string(),
        last_name: "Me".to_string(),
        password_hash: "x".to_string(),
    };
    let user = db.create_user(new_user("doomed")).await.unwrap();
    let other = db.create_user(new_user("survivor")).await.unwrap();

    // 2. A recipe by the user, and one by someone else
    let tag = Tag {
        id: suffix,
        name: format!("Tag {suffix}"),
        color: "#49B64E".to_string(),
        slug: format!("tag-{suffix}"),
    };
    db.upsert_tag(&tag).await.unwrap();
    let flour = Ingredient::new(suffix, "flour", "g");
    db.upsert_ingredient(&flour).await.unwrap();

    let recipe_for = |author_id: u64| Recipe {
        id: 0,
        author_id,
        name: "Bread".to_string(),
        image: "recipes/bread.png".to_string(),
        text: "Bake.".to_string(),
        cooking_time: 60,
        tag_ids: vec![tag.id],
        tag_slugs: vec![tag.slug.clone()],
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    let row = RecipeIngredient {
        recipe_id: 0,
        ingredient_id: flour.id,
        name: flour.name.clone(),
        measurement_unit: flour.measurement_unit.clone(),
        amount: 500,
    };
    let own = db
        .create_recipe(recipe_for(user.id), vec![row.clone()])
        .await
        .unwrap();
    let foreign = db
        .create_recipe(recipe_for(other.id), vec![row])
        .await
        .unwrap();

    // 3. Relations in every direction
    db.create_follow(user.id, other.id).await.unwrap();
    db.create_follow(other.id, user.id).await.unwrap();
    db.add_mark(MarkKind::Favorite, user.id, foreign.id)
        .await
        .unwrap();
    db.add_mark(MarkKind::ShoppingCart, user.id, foreign.id)
        .await
        .unwrap();
    db.add_mark(MarkKind::Favorite, other.id, own.id)
        .await
        .unwrap();

    // 4. Delete
    let deleted = db.delete_user_data(&user).await.unwrap();
    assert!(deleted > 0);

    // 5. Verify
    assert!(db.get_user(user.id).await.unwrap().is_none());
    assert!(db
        .find_user_by_email(&user.email)
        .await
        .unwrap()
        .is_none());
    assert!(db.get_recipe(own.id).await.unwrap().is_none());
    assert!(db.get_recipe_ingredients(own.id).await.unwrap().is_empty());
    assert!(!db.follow_exists(user.id, other.id).await.unwrap());
    assert!(!db.follow_exists(other.id, user.id).await.unwrap());
    assert!(db
        .get_marked_recipe_ids(MarkKind::Favorite, user.id)
        .await
        .unwrap()
        .is_empty());
    assert!(db
        .get_marked_recipe_ids(MarkKind::ShoppingCart, user.id)
        .await
        .unwrap()
        .is_empty());
    assert!(
        db.get_marked_recipe_ids(MarkKind::Favorite, other.id)
            .await
            .unwrap()
            .is_empty(),
        "Favorites of the deleted user's recipes must go too"
    );

    // The other user's data is untouched
    assert!(db.get_user(other.id).await.unwrap().is_some());
    assert!(db.get_recipe(foreign.id).await.unwrap().is_some());
    assert_eq!(db.get_recipe_ingredients(foreign.id).await.unwrap().len(), 1);

    // The freed email and username can be registered again
    let again = db.create_user(new_user("doomed")).await.unwrap();
    assert_ne!(again.id, user.id);
}
