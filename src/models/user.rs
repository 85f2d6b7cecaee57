//! User model for storage and API.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::models::Profile;

/// How the account authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProvider {
    Password,
    Google,
}

/// User document stored in Firestore at `users/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque user ID (also used as document ID)
    pub id: String,
    /// Login email, lowercased
    pub email: String,
    /// Display name
    pub name: String,
    /// Provider the account was created with
    pub auth_provider: AuthProvider,
    /// Google `sub` claim once the account has signed in with Google
    #[serde(default)]
    pub google_subject: Option<String>,
    /// Biometric profile; absent until the user completes setup
    #[serde(default)]
    pub profile: Option<Profile>,
    /// When the account was created
    pub created_at: String,
    /// Last authenticated request
    pub last_active: String,
}

/// Login credentials, stored at `credentials/{email}`.
///
/// Kept apart from the user document so the hash never travels with
/// profile reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub user_id: String,
    pub email: String,
    /// Argon2 PHC string; `None` for Google-only accounts
    #[serde(default)]
    pub password_hash: Option<String>,
    pub updated_at: String,
}

/// Generate a new random user ID (128 bits, hex).
pub fn new_user_id() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Normalize an email for use as a lookup key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
