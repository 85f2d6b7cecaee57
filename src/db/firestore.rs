// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users and login credentials
//! - Diary days (meals and daily summary)
//! - Weight history
//! - Favorite recipes, supplements and food preferences
//! - Subscriptions (per user, and pending by buyer email)

use crate::db::{collections, documents};
use crate::error::AppError;
use crate::models::{
    Credentials, DiaryDay, FavoriteRecipe, FoodPreferences, Meal, Profile, SubscriptionRecord,
    Supplement, User, WeightEntry,
};
use firestore::errors::FirestoreError;
use firestore::{FirestoreConsistencySelector, FirestoreQueryDirection, ParentPathBuilder};
use futures_util::{stream, StreamExt};
use std::future::Future;
use std::time::Duration;

const MAX_CONCURRENT_DB_OPS: usize = 8;

/// Attempts per read-modify-write transaction before giving up.
const MAX_TRANSACTION_ATTEMPTS: u32 = 5;
/// First retry delay; doubled on each further attempt.
const TRANSACTION_BACKOFF: Duration = Duration::from_millis(25);

/// Result of creating an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user: User,
    pub credentials: Credentials,
    pub subscription: SubscriptionRecord,
    /// Whether a subscription bought before registering was claimed
    pub claimed_pending: bool,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

fn db_error(e: impl std::fmt::Display) -> AppError {
    AppError::Database(e.to_string())
}

/// Failure of one transaction attempt.
enum TxError {
    /// Aborted by Firestore (lock contention, stale read); worth retrying
    Contended(FirestoreError),
    App(AppError),
}

impl From<AppError> for TxError {
    fn from(e: AppError) -> Self {
        TxError::App(e)
    }
}

fn is_retryable(e: &FirestoreError) -> bool {
    matches!(e, FirestoreError::DatabaseError(db) if db.retry_possible)
}

fn tx_error(step: &'static str) -> impl Fn(FirestoreError) -> TxError {
    move |e| {
        if is_retryable(&e) {
            TxError::Contended(e)
        } else {
            TxError::App(AppError::Database(format!("Transaction failed to {step}: {e}")))
        }
    }
}

/// Document ID for an email key. Emails may contain `/`, which Firestore
/// would treat as a path separator.
fn email_doc_id(email: &str) -> String {
    urlencoding::encode(email).into_owned()
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
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

    /// Path of `users/{user_id}`, parent of all per-user subcollections.
    fn user_path(&self, user_id: &str) -> Result<ParentPathBuilder, AppError> {
        self.get_client()?
            .parent_path(collections::USERS, user_id)
            .map_err(db_error)
    }

    /// A client view whose reads belong to `transaction`, so concurrent
    /// writers to the same documents make the commit fail instead of
    /// silently overwriting.
    fn transactional_reader(
        client: &firestore::FirestoreDb,
        transaction: &firestore::FirestoreTransaction<'_>,
    ) -> firestore::FirestoreDb {
        client.clone_with_consistency_selector(FirestoreConsistencySelector::Transaction(
            transaction.transaction_id().clone(),
        ))
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(db_error)
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(db_error)?;
        Ok(())
    }

    /// Find a user through the credentials stored under their email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        match self.get_credentials(email).await? {
            Some(credentials) => self.get_user(&credentials.user_id).await,
            None => Ok(None),
        }
    }

    // ─── Credential Operations ───────────────────────────────────

    pub async fn get_credentials(&self, email: &str) -> Result<Option<Credentials>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CREDENTIALS)
            .obj()
            .one(&email_doc_id(email))
            .await
            .map_err(db_error)
    }

    pub async fn set_credentials(&self, credentials: &Credentials) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CREDENTIALS)
            .document_id(email_doc_id(&credentials.email))
            .object(credentials)
            .execute()
            .await
            .map_err(db_error)?;
        Ok(())
    }

    /// Atomically create a user, its credentials and its subscription.
    ///
    /// Fails with `Conflict` when the email is already registered. A
    /// subscription bought with this email before registering replaces
    /// `default_subscription` and is removed from the pending collection.
    pub async fn create_account(
        &self,
        user: User,
        credentials: Credentials,
        default_subscription: SubscriptionRecord,
    ) -> Result<NewAccount, AppError> {
        let client = self.get_client()?;
        let email_id = email_doc_id(&credentials.email);
        let user_path = self.user_path(&user.id)?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
        let reader = Self::transactional_reader(client, &transaction);

        let existing: Option<Credentials> = reader
            .fluent()
            .select()
            .by_id_in(collections::CREDENTIALS)
            .obj()
            .one(&email_id)
            .await
            .map_err(db_error)?;

        if existing.is_some() {
            let _ = transaction.rollback().await;
            return Err(AppError::Conflict("email already registered".to_string()));
        }

        let pending: Option<SubscriptionRecord> = reader
            .fluent()
            .select()
            .by_id_in(collections::SUBSCRIPTIONS_BY_EMAIL)
            .obj()
            .one(&email_id)
            .await
            .map_err(db_error)?;

        let claimed_pending = pending.is_some();
        let subscription = pending.unwrap_or(default_subscription);

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(db_error)?;

        client
            .fluent()
            .update()
            .in_col(collections::CREDENTIALS)
            .document_id(&email_id)
            .object(&credentials)
            .add_to_transaction(&mut transaction)
            .map_err(db_error)?;

        client
            .fluent()
            .update()
            .in_col(collections::SUBSCRIPTION)
            .document_id(documents::CURRENT_SUBSCRIPTION)
            .parent(&user_path)
            .object(&subscription)
            .add_to_transaction(&mut transaction)
            .map_err(db_error)?;

        if claimed_pending {
            client
                .fluent()
                .delete()
                .from(collections::SUBSCRIPTIONS_BY_EMAIL)
                .document_id(&email_id)
                .add_to_transaction(&mut transaction)
                .map_err(db_error)?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            user_id = %user.id,
            claimed_pending,
            status = ?subscription.status,
            "Account created"
        );

        Ok(NewAccount {
            user,
            credentials,
            subscription,
            claimed_pending,
        })
    }

    // ─── Diary Operations ────────────────────────────────────────

    pub async fn get_diary_day(
        &self,
        user_id: &str,
        date: &str,
    ) -> Result<Option<DiaryDay>, AppError> {
        let user_path = self.user_path(user_id)?;
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::DIARY)
            .parent(&user_path)
            .obj()
            .one(date)
            .await
            .map_err(db_error)
    }

    /// Fetch several days concurrently; missing days come back empty.
    ///
    /// Output order matches `dates`.
    pub async fn get_diary_days(
        &self,
        user_id: &str,
        dates: &[String],
    ) -> Result<Vec<DiaryDay>, AppError> {
        stream::iter(dates.iter().cloned())
            .map(move |date| async move {
                let day = self.get_diary_day(user_id, &date).await?;
                Ok::<_, AppError>(day.unwrap_or_else(|| DiaryDay::empty(&date)))
            })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<DiaryDay, AppError>>>()
            .await
            .into_iter()
            .collect()
    }

    /// Run a read-modify-write transaction, starting over with fresh reads
    /// when Firestore aborts it because of a concurrent writer.
    async fn retry_transaction<T, F, Fut>(operation: &str, mut attempt_fn: F) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TxError>>,
    {
        let mut attempt = 1;
        loop {
            match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(TxError::App(e)) => return Err(e),
                Err(TxError::Contended(e)) if attempt < MAX_TRANSACTION_ATTEMPTS => {
                    tracing::debug!(operation, attempt, error = %e, "Transaction contended, retrying");
                    tokio::time::sleep(TRANSACTION_BACKOFF * 2u32.pow(attempt - 1)).await;
                    attempt += 1;
                }
                Err(TxError::Contended(e)) => {
                    tracing::warn!(operation, attempt, error = %e, "Transaction retries exhausted");
                    return Err(AppError::Database(format!(
                        "{operation} transaction kept conflicting: {e}"
                    )));
                }
            }
        }
    }

    /// Append a meal to a day inside a transaction, recomputing the summary.
    ///
    /// Returns the updated day and the ID the meal was stored under.
    pub async fn add_meal(
        &self,
        user_id: &str,
        date: &str,
        meal: Meal,
        now: &str,
    ) -> Result<(DiaryDay, String), AppError> {
        let (day, meal_id) = Self::retry_transaction("add_meal", move || {
            self.add_meal_attempt(user_id, date, meal.clone(), now)
        })
        .await?;

        tracing::info!(
            user_id,
            date,
            meal_id = %meal_id,
            meal_count = day.summary.meal_count,
            "Meal added"
        );

        Ok((day, meal_id))
    }

    async fn add_meal_attempt(
        &self,
        user_id: &str,
        date: &str,
        meal: Meal,
        now: &str,
    ) -> Result<(DiaryDay, String), TxError> {
        let client = self.get_client()?;
        let user_path = self.user_path(user_id)?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(tx_error("begin transaction"))?;
        let reader = Self::transactional_reader(client, &transaction);

        let current: Option<DiaryDay> = reader
            .fluent()
            .select()
            .by_id_in(collections::DIARY)
            .parent(&user_path)
            .obj()
            .one(date)
            .await
            .map_err(tx_error("read diary"))?;

        let mut day = current.unwrap_or_else(|| DiaryDay::empty(date));
        let meal_id = day.push_meal(meal, now);

        client
            .fluent()
            .update()
            .in_col(collections::DIARY)
            .document_id(date)
            .parent(&user_path)
            .object(&day)
            .add_to_transaction(&mut transaction)
            .map_err(tx_error("stage diary"))?;

        transaction.commit().await.map_err(tx_error("commit"))?;
        Ok((day, meal_id))
    }

    /// Remove a meal inside a transaction, recomputing the summary.
    ///
    /// `NotFound` when either the day or the meal does not exist.
    pub async fn delete_meal(
        &self,
        user_id: &str,
        date: &str,
        meal_id: &str,
        now: &str,
    ) -> Result<DiaryDay, AppError> {
        let day = Self::retry_transaction("delete_meal", move || {
            self.delete_meal_attempt(user_id, date, meal_id, now)
        })
        .await?;

        tracing::info!(user_id, date, meal_id, "Meal deleted");
        Ok(day)
    }

    async fn delete_meal_attempt(
        &self,
        user_id: &str,
        date: &str,
        meal_id: &str,
        now: &str,
    ) -> Result<DiaryDay, TxError> {
        let client = self.get_client()?;
        let user_path = self.user_path(user_id)?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(tx_error("begin transaction"))?;
        let reader = Self::transactional_reader(client, &transaction);

        let current: Option<DiaryDay> = reader
            .fluent()
            .select()
            .by_id_in(collections::DIARY)
            .parent(&user_path)
            .obj()
            .one(date)
            .await
            .map_err(tx_error("read diary"))?;

        let Some(mut day) = current else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("no diary for {date}")).into());
        };

        if day.remove_meal(meal_id, now).is_none() {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("meal {meal_id} not found")).into());
        }

        client
            .fluent()
            .update()
            .in_col(collections::DIARY)
            .document_id(date)
            .parent(&user_path)
            .object(&day)
            .add_to_transaction(&mut transaction)
            .map_err(tx_error("stage diary"))?;

        transaction.commit().await.map_err(tx_error("commit"))?;
        Ok(day)
    }

    // ─── Weight Operations ───────────────────────────────────────

    /// Record a weigh-in in a transaction.
    ///
    /// The profile weight and metrics follow the newest weigh-in only: a
    /// backfilled past date is stored in the history but leaves the profile
    /// alone. Returns the (possibly unchanged) profile, if any.
    pub async fn save_weight(
        &self,
        user_id: &str,
        entry: &WeightEntry,
    ) -> Result<Option<Profile>, AppError> {
        let (profile, profile_updated) = Self::retry_transaction("save_weight", move || {
            self.save_weight_attempt(user_id, entry)
        })
        .await?;

        tracing::info!(
            user_id,
            date = %entry.date,
            weight = entry.weight,
            profile_updated,
            "Weight saved"
        );
        Ok(profile)
    }

    async fn save_weight_attempt(
        &self,
        user_id: &str,
        entry: &WeightEntry,
    ) -> Result<(Option<Profile>, bool), TxError> {
        let client = self.get_client()?;
        let user_path = self.user_path(user_id)?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(tx_error("begin transaction"))?;
        let reader = Self::transactional_reader(client, &transaction);

        let user: Option<User> = reader
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(tx_error("read user"))?;

        let Some(mut user) = user else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound("user not found".to_string()).into());
        };

        let newest: Vec<WeightEntry> = reader
            .fluent()
            .select()
            .from(collections::WEIGHT_HISTORY)
            .parent(&user_path)
            .order_by([("date", FirestoreQueryDirection::Descending)])
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(tx_error("read latest weight"))?;
        let is_latest = newest
            .first()
            .is_none_or(|latest| entry.date >= latest.date);

        client
            .fluent()
            .update()
            .in_col(collections::WEIGHT_HISTORY)
            .document_id(&entry.date)
            .parent(&user_path)
            .object(entry)
            .add_to_transaction(&mut transaction)
            .map_err(tx_error("stage weight"))?;

        let mut profile_updated = false;
        if let Some(profile) = user.profile.as_mut().filter(|_| is_latest) {
            profile.weight = entry.weight;
            crate::services::metrics::recalculate(profile, &entry.recorded_at);
            profile_updated = true;

            client
                .fluent()
                .update()
                .in_col(collections::USERS)
                .document_id(user_id)
                .object(&user)
                .add_to_transaction(&mut transaction)
                .map_err(tx_error("stage user"))?;
        }

        transaction.commit().await.map_err(tx_error("commit"))?;
        Ok((user.profile, profile_updated))
    }

    /// Most recent weigh-ins, newest first.
    pub async fn weight_history(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<WeightEntry>, AppError> {
        let user_path = self.user_path(user_id)?;
        self.get_client()?
            .fluent()
            .select()
            .from(collections::WEIGHT_HISTORY)
            .parent(&user_path)
            .order_by([("date", FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(db_error)
    }

    // ─── Favorite Recipe Operations ──────────────────────────────

    /// Saved recipes, newest first.
    pub async fn list_favorites(&self, user_id: &str) -> Result<Vec<FavoriteRecipe>, AppError> {
        let user_path = self.user_path(user_id)?;
        self.get_client()?
            .fluent()
            .select()
            .from(collections::FAVORITE_RECIPES)
            .parent(&user_path)
            .order_by([("saved_at", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(db_error)
    }

    pub async fn set_favorite(
        &self,
        user_id: &str,
        favorite: &FavoriteRecipe,
    ) -> Result<(), AppError> {
        let user_path = self.user_path(user_id)?;
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::FAVORITE_RECIPES)
            .document_id(&favorite.id)
            .parent(&user_path)
            .object(favorite)
            .execute()
            .await
            .map_err(db_error)?;
        Ok(())
    }

    /// Delete a saved recipe. Returns `false` if it did not exist.
    pub async fn delete_favorite(&self, user_id: &str, id: &str) -> Result<bool, AppError> {
        let user_path = self.user_path(user_id)?;
        let client = self.get_client()?;

        let existing: Option<FavoriteRecipe> = client
            .fluent()
            .select()
            .by_id_in(collections::FAVORITE_RECIPES)
            .parent(&user_path)
            .obj()
            .one(id)
            .await
            .map_err(db_error)?;
        if existing.is_none() {
            return Ok(false);
        }

        client
            .fluent()
            .delete()
            .from(collections::FAVORITE_RECIPES)
            .document_id(id)
            .parent(&user_path)
            .execute()
            .await
            .map_err(db_error)?;
        Ok(true)
    }

    // ─── Supplement Operations ───────────────────────────────────

    pub async fn list_supplements(&self, user_id: &str) -> Result<Vec<Supplement>, AppError> {
        let user_path = self.user_path(user_id)?;
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SUPPLEMENTS)
            .parent(&user_path)
            .order_by([("created_at", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(db_error)
    }

    pub async fn get_supplement(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<Supplement>, AppError> {
        let user_path = self.user_path(user_id)?;
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SUPPLEMENTS)
            .parent(&user_path)
            .obj()
            .one(id)
            .await
            .map_err(db_error)
    }

    pub async fn set_supplement(
        &self,
        user_id: &str,
        supplement: &Supplement,
    ) -> Result<(), AppError> {
        let user_path = self.user_path(user_id)?;
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SUPPLEMENTS)
            .document_id(&supplement.id)
            .parent(&user_path)
            .object(supplement)
            .execute()
            .await
            .map_err(db_error)?;
        Ok(())
    }

    pub async fn delete_supplement(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        let user_path = self.user_path(user_id)?;
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::SUPPLEMENTS)
            .document_id(id)
            .parent(&user_path)
            .execute()
            .await
            .map_err(db_error)?;
        Ok(())
    }

    // ─── Preference Operations ───────────────────────────────────

    pub async fn get_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<FoodPreferences>, AppError> {
        let user_path = self.user_path(user_id)?;
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PREFERENCES)
            .parent(&user_path)
            .obj()
            .one(documents::FOOD_PREFERENCES)
            .await
            .map_err(db_error)
    }

    pub async fn set_preferences(
        &self,
        user_id: &str,
        preferences: &FoodPreferences,
    ) -> Result<(), AppError> {
        let user_path = self.user_path(user_id)?;
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PREFERENCES)
            .document_id(documents::FOOD_PREFERENCES)
            .parent(&user_path)
            .object(preferences)
            .execute()
            .await
            .map_err(db_error)?;
        Ok(())
    }

    // ─── Subscription Operations ─────────────────────────────────

    pub async fn get_subscription(
        &self,
        user_id: &str,
    ) -> Result<Option<SubscriptionRecord>, AppError> {
        let user_path = self.user_path(user_id)?;
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SUBSCRIPTION)
            .parent(&user_path)
            .obj()
            .one(documents::CURRENT_SUBSCRIPTION)
            .await
            .map_err(db_error)
    }

    pub async fn set_subscription(
        &self,
        user_id: &str,
        record: &SubscriptionRecord,
    ) -> Result<(), AppError> {
        let user_path = self.user_path(user_id)?;
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SUBSCRIPTION)
            .document_id(documents::CURRENT_SUBSCRIPTION)
            .parent(&user_path)
            .object(record)
            .execute()
            .await
            .map_err(db_error)?;
        Ok(())
    }

    /// Subscription recorded for a buyer email that has no account yet.
    pub async fn get_pending_subscription(
        &self,
        email: &str,
    ) -> Result<Option<SubscriptionRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SUBSCRIPTIONS_BY_EMAIL)
            .obj()
            .one(&email_doc_id(email))
            .await
            .map_err(db_error)
    }

    pub async fn set_pending_subscription(
        &self,
        email: &str,
        record: &SubscriptionRecord,
    ) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SUBSCRIPTIONS_BY_EMAIL)
            .document_id(email_doc_id(email))
            .object(record)
            .execute()
            .await
            .map_err(db_error)?;
        Ok(())
    }
}
