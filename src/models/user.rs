//! User model for storage.

use serde::{Deserialize, Serialize};

/// User account stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Numeric user ID (also used as document ID)
    pub id: u64,
    /// Email address, unique, used as the login name
    pub email: String,
    /// Display handle, unique
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// PBKDF2 hash in `pbkdf2_sha256$<iterations>$<salt>$<hash>` form
    pub password_hash: String,
    /// When the account was created (RFC 3339)
    pub created_at: String,
    /// Bumped on logout and password change; tokens carrying an older
    /// value are rejected.
    #[serde(default)]
    pub token_version: u64,
}

/// Marker document reserving a unique user field value (email or username).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniqueClaim {
    pub user_id: u64,
}
