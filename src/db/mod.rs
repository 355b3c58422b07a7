//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const EXERCISE_TEMPLATES: &str = "exercise_templates";
    pub const WORKOUT_LOGS: &str = "workout_logs";
    pub const WORKOUT_PLANS: &str = "workout_plans";
}
