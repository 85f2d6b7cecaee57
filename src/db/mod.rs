//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Login credentials keyed by lowercased email
    pub const CREDENTIALS: &str = "credentials";
    /// Subscriptions bought before the buyer registered, keyed by email
    pub const SUBSCRIPTIONS_BY_EMAIL: &str = "subscriptionsByEmail";

    // Subcollections of `users/{user_id}`
    pub const DIARY: &str = "diary";
    pub const WEIGHT_HISTORY: &str = "weightHistory";
    pub const FAVORITE_RECIPES: &str = "favoriteRecipes";
    pub const SUPPLEMENTS: &str = "supplements";
    pub const PREFERENCES: &str = "preferences";
    pub const SUBSCRIPTION: &str = "subscription";
}

/// Fixed document IDs inside user subcollections.
pub mod documents {
    pub const FOOD_PREFERENCES: &str = "food";
    pub const CURRENT_SUBSCRIPTION: &str = "current";
}
