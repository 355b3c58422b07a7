// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (accounts and credential lookup)
//! - Exercise templates (per-user catalog)
//! - Workout logs (one document per user per day)
//! - Workout plans (generated plans)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{ExerciseLogEntry, ExerciseTemplate, User, WorkoutLog, WorkoutPlan};
use crate::time_utils::{day_key, start_of_utc_day};
use chrono::{DateTime, Utc};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Deterministic document ID for an exercise template.
///
/// Encoding the owner and the trimmed name into the ID makes
/// (owner, name) unique at the storage layer: a concurrent duplicate
/// create fails instead of silently duplicating.
pub fn template_doc_id(user_id: &str, name: &str) -> String {
    format!("{}_{}", user_id, urlencoding::encode(name))
}

/// Deterministic document ID for a daily workout log.
///
/// One document per user per UTC calendar day by construction.
pub fn log_doc_id(user_id: &str, date: DateTime<Utc>) -> String {
    format!("{}_{}", user_id, day_key(date))
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

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by email address.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_string();
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.field("email").eq(email.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    /// Create a new user document.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Exercise Template Operations ────────────────────────────

    /// Create a template, enforcing (owner, name) uniqueness.
    ///
    /// Uses Firestore create semantics on the deterministic document ID,
    /// so a concurrent duplicate insert fails with a conflict.
    pub async fn create_template(&self, template: &ExerciseTemplate) -> Result<(), AppError> {
        let doc_id = template_doc_id(&template.user_id, &template.name);

        let _: () = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::EXERCISE_TEMPLATES)
            .document_id(&doc_id)
            .object(template)
            .execute()
            .await
            .map_err(|e| match e {
                firestore::errors::FirestoreError::DataConflictError(_) => AppError::Conflict(
                    "Exercise template with this name already exists".to_string(),
                ),
                other => AppError::Database(other.to_string()),
            })?;
        Ok(())
    }

    /// Find a template by its owner and exact (trimmed) name.
    pub async fn find_template_by_name(
        &self,
        user_id: &str,
        name: &str,
    ) -> Result<Option<ExerciseTemplate>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::EXERCISE_TEMPLATES)
            .obj()
            .one(template_doc_id(user_id, name))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a template by its ID, scoped to the owner.
    pub async fn get_template(
        &self,
        user_id: &str,
        template_id: &str,
    ) -> Result<Option<ExerciseTemplate>, AppError> {
        let user_id = user_id.to_string();
        let template_id = template_id.to_string();
        let templates: Vec<ExerciseTemplate> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::EXERCISE_TEMPLATES)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("id").eq(template_id.clone()),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(templates.into_iter().next())
    }

    /// List a user's templates, newest first.
    pub async fn list_templates(&self, user_id: &str) -> Result<Vec<ExerciseTemplate>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::EXERCISE_TEMPLATES)
            .filter(move |q| q.field("user_id").eq(user_id.clone()))
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a template document. Ownership must be checked by the caller.
    pub async fn delete_template(&self, template: &ExerciseTemplate) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::EXERCISE_TEMPLATES)
            .document_id(template_doc_id(&template.user_id, &template.name))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Workout Log Operations ──────────────────────────────────

    /// Append a performance to the caller's log for `now`'s calendar day.
    ///
    /// Finds or creates the day's document and commits the appended entry
    /// through a Firestore transaction. The deterministic document ID
    /// keeps all of a day's entries in a single document; consistency of
    /// the read-modify-write is delegated to the store.
    pub async fn append_log_entry(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        entry: ExerciseLogEntry,
    ) -> Result<WorkoutLog, AppError> {
        let doc_id = log_doc_id(user_id, now);

        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // Plain read; it is not enrolled in the transaction, so the commit
        // does not conflict-check against concurrent same-day appends.
        let existing: Option<WorkoutLog> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::WORKOUT_LOGS)
            .obj()
            .one(&doc_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to read log in transaction: {}", e)))?;

        let mut log = existing.unwrap_or_else(|| WorkoutLog {
            id: doc_id.clone(),
            user_id: user_id.to_string(),
            date: start_of_utc_day(now),
            exercises: Vec::new(),
        });

        log.exercises.push(entry);

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::WORKOUT_LOGS)
            .document_id(&doc_id)
            .object(&log)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add log to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(log)
    }

    /// List a user's workout logs, newest first.
    pub async fn list_logs(&self, user_id: &str) -> Result<Vec<WorkoutLog>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::WORKOUT_LOGS)
            .filter(move |q| q.field("user_id").eq(user_id.clone()))
            .order_by([("date", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Workout Plan Operations ─────────────────────────────────

    /// Create a plan document.
    pub async fn create_plan(&self, plan: &WorkoutPlan) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::WORKOUT_PLANS)
            .document_id(&plan.id)
            .object(plan)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get a plan by ID, scoped to the owner.
    pub async fn get_plan(
        &self,
        user_id: &str,
        plan_id: &str,
    ) -> Result<Option<WorkoutPlan>, AppError> {
        let plan: Option<WorkoutPlan> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::WORKOUT_PLANS)
            .obj()
            .one(plan_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Owner scoping: a foreign plan is indistinguishable from a missing one
        Ok(plan.filter(|p| p.user_id == user_id))
    }

    /// List a user's plans with pagination, newest generated first.
    pub async fn list_plans(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<WorkoutPlan>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::WORKOUT_PLANS)
            .filter(move |q| q.field("user_id").eq(user_id.clone()))
            .order_by([(
                "generated_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(limit)
            .offset(offset)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all of a user's plans, newest generated first.
    ///
    /// The dashboard derives plan counts and the active plan from this
    /// single query instead of issuing separate ones.
    pub async fn list_all_plans(&self, user_id: &str) -> Result<Vec<WorkoutPlan>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::WORKOUT_PLANS)
            .filter(move |q| q.field("user_id").eq(user_id.clone()))
            .order_by([(
                "generated_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Overwrite a plan document (regeneration).
    pub async fn update_plan(&self, plan: &WorkoutPlan) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::WORKOUT_PLANS)
            .document_id(&plan.id)
            .object(plan)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a plan document. Ownership must be checked by the caller.
    pub async fn delete_plan(&self, plan_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::WORKOUT_PLANS)
            .document_id(plan_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_doc_id_encodes_owner_and_name() {
        let id = template_doc_id("user-1", "Push ups");
        assert_eq!(id, "user-1_Push%20ups");

        // Different owners never collide on the same name
        assert_ne!(id, template_doc_id("user-2", "Push ups"));
    }

    #[test]
    fn test_log_doc_id_is_per_day() {
        let morning = DateTime::parse_from_rfc3339("2024-03-05T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let evening = DateTime::parse_from_rfc3339("2024-03-05T21:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let next_day = DateTime::parse_from_rfc3339("2024-03-06T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(log_doc_id("u1", morning), log_doc_id("u1", evening));
        assert_ne!(log_doc_id("u1", morning), log_doc_id("u1", next_day));
    }
}
