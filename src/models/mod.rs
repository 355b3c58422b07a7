// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod exercise;
pub mod plan;
pub mod user;
pub mod workout_log;

pub use exercise::{ExerciseTemplate, ExerciseType, TemplateSummary};
pub use plan::{PlanPreferences, PlannedExercise, WorkoutPlan, WorkoutSession};
pub use user::User;
pub use workout_log::{ExerciseLogEntry, WorkoutLog};
