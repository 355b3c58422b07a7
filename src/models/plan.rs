//! Workout plan models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session difficulty rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

/// Day of the week a session is scheduled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// One exercise within a planned session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedExercise {
    /// Template the exercise refers to (owned by the plan's user)
    pub exercise_template_id: String,
    #[serde(default = "default_sets")]
    pub sets: u32,
    pub target_reps: Option<u32>,
    /// Target duration in seconds
    pub target_time: Option<u32>,
    /// Rest between sets in seconds
    pub rest_time: Option<u32>,
    pub notes: Option<String>,
}

fn default_sets() -> u32 {
    1
}

/// One workout session within a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub name: String,
    pub description: Option<String>,
    pub day_of_week: Option<DayOfWeek>,
    pub exercises: Vec<PlannedExercise>,
    /// Estimated duration in minutes
    pub estimated_duration: Option<u32>,
    #[serde(default)]
    pub difficulty: Difficulty,
}

/// User preferences embedded in a plan, forwarded on regeneration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanPreferences {
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub fitness_level: String,
    pub days_per_week: Option<u32>,
    /// Session duration in minutes
    pub session_duration: Option<u32>,
    #[serde(default)]
    pub preferred_exercise_types: Vec<String>,
    #[serde(default)]
    pub excluded_exercises: Vec<String>,
    #[serde(default)]
    pub injuries: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
}

/// A generated multi-week workout plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutPlan {
    /// Document ID (uuid)
    pub id: String,
    /// Owning user
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Plan duration in weeks
    pub duration_weeks: u32,
    pub days_per_week: u32,
    pub workouts: Vec<WorkoutSession>,
    pub preferences: PlanPreferences,
    pub is_active: bool,
    /// When the plan was (re)generated
    pub generated_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
