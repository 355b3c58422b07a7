//! Exercise template model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How an exercise is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseType {
    Reps,
    Time,
    Distance,
    Weight,
    Calories,
    Custom,
    Other,
}

/// A named exercise definition, unique per (owner, name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseTemplate {
    /// Template ID (uuid)
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Exercise name (trimmed)
    pub name: String,
    /// Measurement type
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    /// When the template was created
    pub created_at: DateTime<Utc>,
}

/// Lightweight template view embedded in populated API responses.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
}

impl From<&ExerciseTemplate> for TemplateSummary {
    fn from(template: &ExerciseTemplate) -> Self {
        Self {
            id: template.id.clone(),
            name: template.name.clone(),
            exercise_type: template.exercise_type,
        }
    }
}
