//! Daily workout log model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One logged performance of an exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseLogEntry {
    /// Template the performance refers to (owned by the same user)
    pub exercise_template_id: String,
    /// Repetitions performed, for rep-based exercises
    pub reps: Option<u32>,
    /// Duration in seconds, for time-based exercises
    pub time: Option<u32>,
    /// When the exercise was logged
    pub performed_at: DateTime<Utc>,
}

/// Journal of exercises performed on one calendar day.
///
/// One document per user per UTC day; the first log of the day creates
/// the document, later logs that day append to `exercises`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutLog {
    /// Document ID (`{user_id}_{YYYY-MM-DD}`)
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Start of the UTC day this log covers
    pub date: DateTime<Utc>,
    /// Ordered performances, oldest first
    pub exercises: Vec<ExerciseLogEntry>,
}
