//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Unique-email reservations (keyed by url-encoded lowercase email)
    pub const USER_EMAILS: &str = "user_emails";
    /// Unique-username reservations (keyed by url-encoded username)
    pub const USERNAMES: &str = "usernames";
    pub const FOLLOWS: &str = "follows";
    pub const INGREDIENTS: &str = "ingredients";
    pub const TAGS: &str = "tags";
    pub const RECIPES: &str = "recipes";
    pub const RECIPE_INGREDIENTS: &str = "recipe_ingredients";
    pub const FAVORITES: &str = "favorites";
    pub const SHOPPING_CART: &str = "shopping_cart";
    /// Per-collection id counters (keyed by collection name)
    pub const COUNTERS: &str = "counters";
}
