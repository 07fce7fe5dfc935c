// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (accounts, unique email/username claims)
//! - Follows (user → author subscriptions)
//! - Catalog (ingredients and tags)
//! - Recipes and their ingredient join records
//! - Favorites and shopping cart entries
//!
//! Integer ids come from per-collection counters in the `counters`
//! collection. Join documents use deterministic ids so that Firestore's
//! create-if-absent semantics enforce pair uniqueness.

use crate::db::collections;
use crate::error::AppError;
use crate::models::user::UniqueClaim;
use crate::models::{
    Follow, Ingredient, MarkKind, Recipe, RecipeIngredient, RecipeMark, Tag, User,
};
use firestore::errors::FirestoreError;
use firestore::FirestoreWritePrecondition;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;
// Firestore limits `in` / `array-contains-any` filters to 30 values.
const IN_QUERY_LIMIT: usize = 30;
// Transactions that allocate ids are retried when a concurrent writer wins.
const ID_ALLOCATION_ATTEMPTS: usize = 3;

/// Last id handed out for a collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Counter {
    last_id: u64,
}

/// Fields of a user that is about to be created.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

fn db_err(e: FirestoreError) -> AppError {
    AppError::Database(e.to_string())
}

fn is_conflict(e: &FirestoreError) -> bool {
    matches!(e, FirestoreError::DataConflictError(_))
}

fn email_claim_id(email: &str) -> String {
    urlencoding::encode(&email.to_lowercase()).into_owned()
}

fn username_claim_id(username: &str) -> String {
    urlencoding::encode(username).into_owned()
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator needs an unauthenticated connection.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Generic Helpers ─────────────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        for<'de> T: Deserialize<'de> + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(db_err)
    }

    async fn set_doc<T>(&self, collection: &str, id: &str, object: &T) -> Result<(), AppError>
    where
        T: Serialize + Sync + Send,
        for<'de> T: Deserialize<'de>,
    {
        let _: T = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(object)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Create a document that must not exist yet.
    ///
    /// Returns `Ok(false)` when the document already exists.
    async fn insert_doc<T>(&self, collection: &str, id: &str, object: &T) -> Result<bool, AppError>
    where
        T: Serialize + Sync + Send,
        for<'de> T: Deserialize<'de>,
    {
        let result: Result<T, FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collection)
            .document_id(id)
            .object(object)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_conflict(&e) => Ok(false),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Query documents whose numeric `field` is one of `values`.
    ///
    /// Splits the values into chunks to respect the `in` filter limit.
    async fn query_in<T>(
        &self,
        collection: &str,
        field: &'static str,
        values: &[u64],
    ) -> Result<Vec<T>, AppError>
    where
        for<'de> T: Deserialize<'de> + Send,
    {
        let client = self.get_client()?;
        let unique: Vec<u64> = values
            .iter()
            .copied()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let mut out = Vec::new();
        for chunk in unique.chunks(IN_QUERY_LIMIT) {
            let chunk = chunk.to_vec();
            let mut docs: Vec<T> = client
                .fluent()
                .select()
                .from(collection)
                .filter(move |q| q.for_all([q.field(field).is_in(chunk.clone())]))
                .obj()
                .query()
                .await
                .map_err(db_err)?;
            out.append(&mut docs);
        }
        Ok(out)
    }

    /// Query documents whose numeric `field` equals `value`.
    async fn query_eq<T>(
        &self,
        collection: &str,
        field: &'static str,
        value: u64,
    ) -> Result<Vec<T>, AppError>
    where
        for<'de> T: Deserialize<'de> + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| q.for_all([q.field(field).eq(value)]))
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    /// Read the last id handed out for `collection`.
    async fn read_counter(&self, collection: &str) -> Result<u64, AppError> {
        let counter: Option<Counter> = self.get_doc(collections::COUNTERS, collection).await?;
        Ok(counter.unwrap_or_default().last_id)
    }

    /// Raise the counter for `collection` so that future ids exceed `last_id`.
    ///
    /// Used when seeding documents with explicit ids.
    pub async fn bump_counter(&self, collection: &str, last_id: u64) -> Result<(), AppError> {
        let current = self.read_counter(collection).await?;
        if last_id > current {
            self.set_doc(collections::COUNTERS, collection, &Counter { last_id })
                .await?;
        }
        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by id.
    pub async fn get_user(&self, user_id: u64) -> Result<Option<User>, AppError> {
        self.get_doc(collections::USERS, &user_id.to_string()).await
    }

    /// Get several users; missing ids are skipped.
    pub async fn get_users_by_ids(&self, user_ids: &[u64]) -> Result<Vec<User>, AppError> {
        self.query_in(collections::USERS, "id", user_ids).await
    }

    /// Look up a user by email (case-insensitive).
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let claim: Option<UniqueClaim> = self
            .get_doc(collections::USER_EMAILS, &email_claim_id(email))
            .await?;
        match claim {
            Some(claim) => self.get_user(claim.user_id).await,
            None => Ok(None),
        }
    }

    /// All users, ordered by username.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([("username", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    async fn email_taken(&self, email: &str) -> Result<bool, AppError> {
        let claim: Option<UniqueClaim> = self
            .get_doc(collections::USER_EMAILS, &email_claim_id(email))
            .await?;
        Ok(claim.is_some())
    }

    async fn username_taken(&self, username: &str) -> Result<bool, AppError> {
        let claim: Option<UniqueClaim> = self
            .get_doc(collections::USERNAMES, &username_claim_id(username))
            .await?;
        Ok(claim.is_some())
    }

    /// Create a user, enforcing unique email and username.
    ///
    /// The user document and both uniqueness claims are written in one
    /// transaction with must-not-exist preconditions, so a concurrent signup
    /// with the same email or username cannot also succeed.
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        if self.email_taken(&new_user.email).await? {
            return Err(AppError::field(
                "email",
                "A user with that email already exists.",
            ));
        }
        if self.username_taken(&new_user.username).await? {
            return Err(AppError::field(
                "username",
                "A user with that username already exists.",
            ));
        }

        let client = self.get_client()?;
        let mut last_error = None;

        for attempt in 1..=ID_ALLOCATION_ATTEMPTS {
            let user_id = self.read_counter(collections::USERS).await? + 1;
            let user = User {
                id: user_id,
                email: new_user.email.to_lowercase(),
                username: new_user.username.clone(),
                first_name: new_user.first_name.clone(),
                last_name: new_user.last_name.clone(),
                password_hash: new_user.password_hash.clone(),
                created_at: chrono::Utc::now().to_rfc3339(),
                token_version: 0,
            };
            let claim = UniqueClaim { user_id };

            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            client
                .fluent()
                .update()
                .in_col(collections::COUNTERS)
                .document_id(collections::USERS)
                .object(&Counter { last_id: user_id })
                .add_to_transaction(&mut transaction)
                .map_err(db_err)?;

            for (collection, doc_id) in [
                (collections::USER_EMAILS, email_claim_id(&user.email)),
                (collections::USERNAMES, username_claim_id(&user.username)),
            ] {
                client
                    .fluent()
                    .update()
                    .in_col(collection)
                    .precondition(FirestoreWritePrecondition::Exists(false))
                    .document_id(&doc_id)
                    .object(&claim)
                    .add_to_transaction(&mut transaction)
                    .map_err(db_err)?;
            }

            client
                .fluent()
                .update()
                .in_col(collections::USERS)
                .precondition(FirestoreWritePrecondition::Exists(false))
                .document_id(user_id.to_string())
                .object(&user)
                .add_to_transaction(&mut transaction)
                .map_err(db_err)?;

            match transaction.commit().await {
                Ok(_) => {
                    tracing::info!(user_id, username = %user.username, "User created");
                    return Ok(user);
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "User creation transaction failed");
                    last_error = Some(e);
                }
            }

            // A claim may have been taken by a concurrent signup.
            if self.email_taken(&new_user.email).await? {
                return Err(AppError::field(
                    "email",
                    "A user with that email already exists.",
                ));
            }
            if self.username_taken(&new_user.username).await? {
                return Err(AppError::field(
                    "username",
                    "A user with that username already exists.",
                ));
            }
        }

        Err(AppError::Database(format!(
            "Failed to create user: {}",
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Replace a user's password hash. Tokens issued before the change stop
    /// working.
    pub async fn set_password_hash(&self, user_id: u64, password_hash: &str) -> Result<(), AppError> {
        // Fetch-modify-write to keep the other fields
        let mut user = self
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        user.password_hash = password_hash.to_string();
        user.token_version += 1;
        self.set_doc(collections::USERS, &user_id.to_string(), &user)
            .await
    }

    /// Invalidate every token issued to a user so far.
    pub async fn revoke_tokens(&self, user_id: u64) -> Result<u64, AppError> {
        let mut user = self
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        user.token_version += 1;
        self.set_doc(collections::USERS, &user_id.to_string(), &user)
            .await?;
        Ok(user.token_version)
    }

    // ─── Follow Operations ───────────────────────────────────────

    /// Whether `user_id` follows `author_id`.
    pub async fn follow_exists(&self, user_id: u64, author_id: u64) -> Result<bool, AppError> {
        let follow: Option<Follow> = self
            .get_doc(collections::FOLLOWS, &Follow::doc_id(user_id, author_id))
            .await?;
        Ok(follow.is_some())
    }

    /// Make `user_id` follow `author_id`.
    ///
    /// Rejects self-follows and duplicate follows.
    pub async fn create_follow(&self, user_id: u64, author_id: u64) -> Result<Follow, AppError> {
        if user_id == author_id {
            return Err(AppError::BadRequest(
                "You cannot subscribe to yourself.".to_string(),
            ));
        }
        if self.follow_exists(user_id, author_id).await? {
            return Err(AppError::Conflict(
                "You are already subscribed to this user.".to_string(),
            ));
        }

        let follow = Follow {
            user_id,
            author_id,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        let created = self
            .insert_doc(
                collections::FOLLOWS,
                &Follow::doc_id(user_id, author_id),
                &follow,
            )
            .await?;
        if !created {
            return Err(AppError::Conflict(
                "You are already subscribed to this user.".to_string(),
            ));
        }

        tracing::info!(user_id, author_id, "Follow created");
        Ok(follow)
    }

    /// Remove a follow. Returns `false` if it did not exist.
    pub async fn delete_follow(&self, user_id: u64, author_id: u64) -> Result<bool, AppError> {
        if !self.follow_exists(user_id, author_id).await? {
            return Ok(false);
        }
        self.delete_doc(collections::FOLLOWS, &Follow::doc_id(user_id, author_id))
            .await?;
        tracing::info!(user_id, author_id, "Follow deleted");
        Ok(true)
    }

    /// Ids of the authors `user_id` follows.
    pub async fn get_followed_author_ids(&self, user_id: u64) -> Result<Vec<u64>, AppError> {
        let follows: Vec<Follow> = self
            .query_eq(collections::FOLLOWS, "user_id", user_id)
            .await?;
        Ok(follows.into_iter().map(|f| f.author_id).collect())
    }

    // ─── Catalog Operations ──────────────────────────────────────

    /// Ingredients ordered by name, optionally restricted to a name prefix
    /// (case-insensitive).
    pub async fn list_ingredients(
        &self,
        name_prefix: Option<&str>,
    ) -> Result<Vec<Ingredient>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::INGREDIENTS);

        match name_prefix.map(str::to_lowercase).filter(|p| !p.is_empty()) {
            Some(prefix) => {
                let upper = format!("{}\u{f8ff}", prefix);
                query
                    .filter(move |q| {
                        q.for_all([
                            q.field("name_lower").greater_than_or_equal(prefix.clone()),
                            q.field("name_lower").less_than(upper.clone()),
                        ])
                    })
                    .order_by([("name_lower", firestore::FirestoreQueryDirection::Ascending)])
                    .obj()
                    .query()
                    .await
                    .map_err(db_err)
            }
            None => query
                .order_by([("name", firestore::FirestoreQueryDirection::Ascending)])
                .obj()
                .query()
                .await
                .map_err(db_err),
        }
    }

    pub async fn get_ingredient(&self, id: u64) -> Result<Option<Ingredient>, AppError> {
        self.get_doc(collections::INGREDIENTS, &id.to_string()).await
    }

    pub async fn get_ingredients_by_ids(&self, ids: &[u64]) -> Result<Vec<Ingredient>, AppError> {
        self.query_in(collections::INGREDIENTS, "id", ids).await
    }

    /// Store an ingredient under its id (catalog seeding).
    pub async fn upsert_ingredient(&self, ingredient: &Ingredient) -> Result<(), AppError> {
        self.set_doc(
            collections::INGREDIENTS,
            &ingredient.id.to_string(),
            ingredient,
        )
        .await
    }

    /// All tags ordered by name.
    pub async fn list_tags(&self) -> Result<Vec<Tag>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TAGS)
            .order_by([("name", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    pub async fn get_tag(&self, id: u64) -> Result<Option<Tag>, AppError> {
        self.get_doc(collections::TAGS, &id.to_string()).await
    }

    pub async fn get_tags_by_ids(&self, ids: &[u64]) -> Result<Vec<Tag>, AppError> {
        self.query_in(collections::TAGS, "id", ids).await
    }

    /// Store a tag under its id (catalog seeding).
    pub async fn upsert_tag(&self, tag: &Tag) -> Result<(), AppError> {
        self.set_doc(collections::TAGS, &tag.id.to_string(), tag)
            .await
    }

    // ─── Recipe Operations ───────────────────────────────────────

    pub async fn get_recipe(&self, recipe_id: u64) -> Result<Option<Recipe>, AppError> {
        self.get_doc(collections::RECIPES, &recipe_id.to_string())
            .await
    }

    /// Recipes, newest first, optionally restricted to an author and/or to
    /// recipes carrying any of `tag_slugs`.
    ///
    /// When more tag slugs are given than Firestore accepts in one filter,
    /// the tag restriction is left to the caller.
    pub async fn list_recipes(
        &self,
        author_id: Option<u64>,
        tag_slugs: &[String],
    ) -> Result<Vec<Recipe>, AppError> {
        let slugs: Vec<String> = if tag_slugs.len() <= IN_QUERY_LIMIT {
            tag_slugs.to_vec()
        } else {
            Vec::new()
        };

        self.get_client()?
            .fluent()
            .select()
            .from(collections::RECIPES)
            .filter(move |q| {
                q.for_all([
                    author_id.and_then(|a| q.field("author_id").eq(a)),
                    if slugs.is_empty() {
                        None
                    } else {
                        q.field("tag_slugs").array_contains_any(slugs.clone())
                    },
                ])
            })
            .order_by([("id", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    /// Ingredient rows of one recipe.
    pub async fn get_recipe_ingredients(
        &self,
        recipe_id: u64,
    ) -> Result<Vec<RecipeIngredient>, AppError> {
        self.query_eq(collections::RECIPE_INGREDIENTS, "recipe_id", recipe_id)
            .await
    }

    /// Ingredient rows of several recipes.
    pub async fn get_ingredients_for_recipes(
        &self,
        recipe_ids: &[u64],
    ) -> Result<Vec<RecipeIngredient>, AppError> {
        self.query_in(collections::RECIPE_INGREDIENTS, "recipe_id", recipe_ids)
            .await
    }

    /// Atomically create a recipe together with its ingredient rows.
    ///
    /// `recipe.id` and the rows' `recipe_id` are assigned here.
    pub async fn create_recipe(
        &self,
        mut recipe: Recipe,
        mut ingredients: Vec<RecipeIngredient>,
    ) -> Result<Recipe, AppError> {
        let client = self.get_client()?;
        let mut last_error = None;

        for attempt in 1..=ID_ALLOCATION_ATTEMPTS {
            let recipe_id = self.read_counter(collections::RECIPES).await? + 1;
            recipe.id = recipe_id;
            for row in ingredients.iter_mut() {
                row.recipe_id = recipe_id;
            }

            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            client
                .fluent()
                .update()
                .in_col(collections::COUNTERS)
                .document_id(collections::RECIPES)
                .object(&Counter { last_id: recipe_id })
                .add_to_transaction(&mut transaction)
                .map_err(db_err)?;

            client
                .fluent()
                .update()
                .in_col(collections::RECIPES)
                .precondition(FirestoreWritePrecondition::Exists(false))
                .document_id(recipe_id.to_string())
                .object(&recipe)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add recipe to transaction: {}", e))
                })?;

            for row in &ingredients {
                client
                    .fluent()
                    .update()
                    .in_col(collections::RECIPE_INGREDIENTS)
                    .document_id(row.doc_id())
                    .object(row)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add ingredient row to transaction: {}",
                            e
                        ))
                    })?;
            }

            match transaction.commit().await {
                Ok(_) => {
                    tracing::info!(
                        recipe_id,
                        author_id = recipe.author_id,
                        ingredients = ingredients.len(),
                        "Recipe created"
                    );
                    return Ok(recipe);
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Recipe creation transaction failed");
                    last_error = Some(e);
                }
            }
        }

        Err(AppError::Database(format!(
            "Failed to create recipe: {}",
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Atomically overwrite a recipe and replace its ingredient rows.
    ///
    /// Rows for ingredients no longer in the recipe are deleted and every new
    /// row is written, so the stored set equals `ingredients` afterwards.
    pub async fn update_recipe(
        &self,
        recipe: &Recipe,
        ingredients: &[RecipeIngredient],
    ) -> Result<(), AppError> {
        let client = self.get_client()?;
        let existing = self.get_recipe_ingredients(recipe.id).await?;
        let keep: HashSet<u64> = ingredients.iter().map(|r| r.ingredient_id).collect();

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for row in existing.iter().filter(|r| !keep.contains(&r.ingredient_id)) {
            client
                .fluent()
                .delete()
                .from(collections::RECIPE_INGREDIENTS)
                .document_id(row.doc_id())
                .add_to_transaction(&mut transaction)
                .map_err(db_err)?;
        }

        for row in ingredients {
            client
                .fluent()
                .update()
                .in_col(collections::RECIPE_INGREDIENTS)
                .document_id(row.doc_id())
                .object(row)
                .add_to_transaction(&mut transaction)
                .map_err(db_err)?;
        }

        client
            .fluent()
            .update()
            .in_col(collections::RECIPES)
            .document_id(recipe.id.to_string())
            .object(recipe)
            .add_to_transaction(&mut transaction)
            .map_err(db_err)?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            recipe_id = recipe.id,
            ingredients = ingredients.len(),
            "Recipe updated"
        );
        Ok(())
    }

    /// Delete a recipe and everything that references it.
    ///
    /// Returns the number of documents deleted.
    pub async fn delete_recipe(&self, recipe_id: u64) -> Result<usize, AppError> {
        let mut deleted_count = 0;

        let rows = self.get_recipe_ingredients(recipe_id).await?;
        self.batch_delete(&rows, collections::RECIPE_INGREDIENTS, |r: &RecipeIngredient| {
            r.doc_id()
        })
        .await?;
        deleted_count += rows.len();

        for kind in [MarkKind::Favorite, MarkKind::ShoppingCart] {
            let marks: Vec<RecipeMark> = self
                .query_eq(kind.collection(), "recipe_id", recipe_id)
                .await?;
            self.batch_delete(&marks, kind.collection(), |m: &RecipeMark| {
                RecipeMark::doc_id(m.user_id, m.recipe_id)
            })
            .await?;
            deleted_count += marks.len();
        }

        self.delete_doc(collections::RECIPES, &recipe_id.to_string())
            .await?;
        deleted_count += 1;

        tracing::info!(recipe_id, deleted_count, "Recipe deleted");
        Ok(deleted_count)
    }

    // ─── Favorite / Shopping Cart Operations ─────────────────────

    pub async fn mark_exists(
        &self,
        kind: MarkKind,
        user_id: u64,
        recipe_id: u64,
    ) -> Result<bool, AppError> {
        let mark: Option<RecipeMark> = self
            .get_doc(kind.collection(), &RecipeMark::doc_id(user_id, recipe_id))
            .await?;
        Ok(mark.is_some())
    }

    /// Add a recipe to a user's favorites or cart.
    ///
    /// Fails with `Conflict` if the pair already exists, including when a
    /// concurrent request created it between the check and the insert.
    pub async fn add_mark(
        &self,
        kind: MarkKind,
        user_id: u64,
        recipe_id: u64,
    ) -> Result<RecipeMark, AppError> {
        let conflict =
            || AppError::Conflict(format!("Recipe is already in {}.", kind.label()));

        if self.mark_exists(kind, user_id, recipe_id).await? {
            return Err(conflict());
        }

        let mark = RecipeMark {
            user_id,
            recipe_id,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        let created = self
            .insert_doc(
                kind.collection(),
                &RecipeMark::doc_id(user_id, recipe_id),
                &mark,
            )
            .await?;
        if !created {
            return Err(conflict());
        }

        tracing::info!(user_id, recipe_id, collection = kind.collection(), "Mark added");
        Ok(mark)
    }

    /// Remove a recipe from a user's favorites or cart. Returns `false` if it
    /// was not there.
    pub async fn remove_mark(
        &self,
        kind: MarkKind,
        user_id: u64,
        recipe_id: u64,
    ) -> Result<bool, AppError> {
        if !self.mark_exists(kind, user_id, recipe_id).await? {
            return Ok(false);
        }
        self.delete_doc(kind.collection(), &RecipeMark::doc_id(user_id, recipe_id))
            .await?;
        tracing::info!(user_id, recipe_id, collection = kind.collection(), "Mark removed");
        Ok(true)
    }

    /// Recipe ids in a user's favorites or cart.
    pub async fn get_marked_recipe_ids(
        &self,
        kind: MarkKind,
        user_id: u64,
    ) -> Result<Vec<u64>, AppError> {
        let marks: Vec<RecipeMark> = self
            .query_eq(kind.collection(), "user_id", user_id)
            .await?;
        Ok(marks.into_iter().map(|m| m.recipe_id).collect())
    }

    // ─── User Data Deletion ──────────────────────────────────────

    /// Delete a user and everything that belongs to them:
    /// authored recipes (with their rows and marks), the user's own
    /// favorites and cart entries, follows in both directions, uniqueness
    /// claims and the user document.
    ///
    /// Returns the number of documents deleted.
    pub async fn delete_user_data(&self, user: &User) -> Result<usize, AppError> {
        let user_id = user.id;
        let mut deleted_count = 0;

        // 1. Authored recipes (cascades their rows and marks)
        let recipes = self.list_recipes(Some(user_id), &[]).await?;
        for recipe in &recipes {
            deleted_count += self.delete_recipe(recipe.id).await?;
        }
        tracing::debug!(user_id, count = recipes.len(), "Deleted authored recipes");

        // 2. The user's own favorites and cart entries
        for kind in [MarkKind::Favorite, MarkKind::ShoppingCart] {
            let marks: Vec<RecipeMark> = self
                .query_eq(kind.collection(), "user_id", user_id)
                .await?;
            self.batch_delete(&marks, kind.collection(), |m: &RecipeMark| {
                RecipeMark::doc_id(m.user_id, m.recipe_id)
            })
            .await?;
            deleted_count += marks.len();
        }

        // 3. Follows in both directions
        for field in ["user_id", "author_id"] {
            let follows: Vec<Follow> = self.query_eq(collections::FOLLOWS, field, user_id).await?;
            self.batch_delete(&follows, collections::FOLLOWS, |f: &Follow| {
                Follow::doc_id(f.user_id, f.author_id)
            })
            .await?;
            deleted_count += follows.len();
        }

        // 4. Uniqueness claims and the user document
        self.delete_doc(collections::USER_EMAILS, &email_claim_id(&user.email))
            .await?;
        self.delete_doc(collections::USERNAMES, &username_claim_id(&user.username))
            .await?;
        self.delete_doc(collections::USERS, &user_id.to_string())
            .await?;
        deleted_count += 3;

        tracing::info!(user_id, deleted_count, "User data deletion complete");
        Ok(deleted_count)
    }
}
