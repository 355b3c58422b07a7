// SPDX-License-Identifier: MIT

//! Workout plan generation and regeneration.
//!
//! The generate flow ingests a caller-supplied plan structure that names
//! exercises by string; every distinct name is resolved to (or created as)
//! an exercise template owned by the caller before the plan is persisted.
//!
//! The regenerate flow forwards a plan's stored preferences plus the
//! caller's full template catalog to the external webhook and rewrites the
//! plan's workouts from the response.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::plan::{DayOfWeek, Difficulty};
use crate::models::{
    ExerciseTemplate, ExerciseType, PlanPreferences, PlannedExercise, WorkoutPlan, WorkoutSession,
};
use crate::services::webhook::{
    ExistingExercise, GeneratedPlan, GeneratedWorkout, NewTemplateSuggestion, RegenerationRequest,
    WebhookClient,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};

const DEFAULT_DURATION_WEEKS: u32 = 4;
const DEFAULT_DAYS_PER_WEEK: u32 = 3;

// ─── Request Types ───────────────────────────────────────────────

/// A preference field that may arrive as a list or a single
/// comma-delimited string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    List(Vec<String>),
    One(String),
}

impl StringOrList {
    /// Normalize to a list of trimmed, non-empty strings.
    pub fn into_list(self) -> Vec<String> {
        match self {
            StringOrList::List(items) => items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            StringOrList::One(s) => s
                .split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect(),
        }
    }
}

fn normalize(field: Option<StringOrList>) -> Vec<String> {
    field.map(StringOrList::into_list).unwrap_or_default()
}

/// Preference fields as supplied by the caller.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPreferences {
    pub goals: Option<StringOrList>,
    pub fitness_level: Option<String>,
    pub days_per_week: Option<u32>,
    pub session_duration: Option<u32>,
    pub preferred_exercise_types: Option<StringOrList>,
    pub excluded_exercises: Option<StringOrList>,
    pub injuries: Option<StringOrList>,
    pub equipment: Option<StringOrList>,
}

impl RawPreferences {
    /// Normalize delimited strings into lists.
    pub fn normalize(self) -> PlanPreferences {
        PlanPreferences {
            goals: normalize(self.goals),
            fitness_level: self.fitness_level.unwrap_or_default(),
            days_per_week: self.days_per_week,
            session_duration: self.session_duration,
            preferred_exercise_types: normalize(self.preferred_exercise_types),
            excluded_exercises: normalize(self.excluded_exercises),
            injuries: normalize(self.injuries),
            equipment: normalize(self.equipment),
        }
    }
}

/// Caller-supplied plan structure for the generate flow.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePlanRequest {
    pub name: String,
    pub description: Option<String>,
    /// Plan duration in weeks
    pub duration: Option<u32>,
    pub days_per_week: Option<u32>,
    #[serde(default)]
    pub workouts: Vec<RequestedWorkout>,
    pub preferences: Option<RawPreferences>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedWorkout {
    pub name: String,
    pub description: Option<String>,
    pub day_of_week: Option<DayOfWeek>,
    pub difficulty: Option<Difficulty>,
    /// Estimated duration in minutes
    pub estimated_duration: Option<u32>,
    #[serde(default)]
    pub exercises: Vec<RequestedExercise>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedExercise {
    pub exercise_name: String,
    pub sets: Option<u32>,
    pub target_reps: Option<u32>,
    pub target_time: Option<u32>,
    pub rest_time: Option<u32>,
    pub notes: Option<String>,
}

// ─── Generate Flow ───────────────────────────────────────────────

/// Distinct exercise names referenced by a generate request.
pub fn requested_exercise_names(request: &GeneratePlanRequest) -> BTreeSet<String> {
    request
        .workouts
        .iter()
        .flat_map(|workout| &workout.exercises)
        .map(|exercise| exercise.exercise_name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Resolve or create a template for every exercise name.
///
/// Returns a name-to-template-ID map. Creation defaults to rep-based
/// templates. There is no concurrency guard across requests; the
/// deterministic document ID is the only safety net, so a create that
/// loses the race falls back to the template the winner saved.
pub async fn resolve_templates(
    db: &FirestoreDb,
    user_id: &str,
    names: &BTreeSet<String>,
) -> Result<HashMap<String, String>, AppError> {
    let mut template_ids = HashMap::new();

    for name in names {
        if let Some(existing) = db.find_template_by_name(user_id, name).await? {
            template_ids.insert(name.clone(), existing.id);
            continue;
        }

        let template = ExerciseTemplate {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.clone(),
            exercise_type: ExerciseType::Reps,
            created_at: Utc::now(),
        };

        match db.create_template(&template).await {
            Ok(()) => {
                template_ids.insert(name.clone(), template.id);
            }
            Err(AppError::Conflict(_)) => {
                // Lost a creation race; use whichever template won
                let winner = db
                    .find_template_by_name(user_id, name)
                    .await?
                    .ok_or_else(|| {
                        AppError::Database(format!("Template '{}' vanished after conflict", name))
                    })?;
                template_ids.insert(name.clone(), winner.id);
            }
            Err(other) => return Err(other),
        }
    }

    Ok(template_ids)
}

/// Build a plan document from a request and resolved template IDs.
pub fn assemble_plan(
    user_id: &str,
    request: GeneratePlanRequest,
    template_ids: &HashMap<String, String>,
) -> WorkoutPlan {
    let now = Utc::now();

    let workouts = request
        .workouts
        .into_iter()
        .map(|workout| WorkoutSession {
            name: workout.name,
            description: workout.description,
            day_of_week: workout.day_of_week,
            difficulty: workout.difficulty.unwrap_or_default(),
            estimated_duration: workout.estimated_duration,
            exercises: workout
                .exercises
                .into_iter()
                .filter_map(|exercise| {
                    let name = exercise.exercise_name.trim();
                    let template_id = template_ids.get(name)?;
                    Some(PlannedExercise {
                        exercise_template_id: template_id.clone(),
                        sets: exercise.sets.unwrap_or(1),
                        target_reps: exercise.target_reps,
                        target_time: exercise.target_time,
                        rest_time: exercise.rest_time,
                        notes: exercise.notes,
                    })
                })
                .collect(),
        })
        .collect();

    WorkoutPlan {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        name: request.name,
        description: request.description,
        duration_weeks: request.duration.unwrap_or(DEFAULT_DURATION_WEEKS),
        days_per_week: request.days_per_week.unwrap_or(DEFAULT_DAYS_PER_WEEK),
        workouts,
        preferences: request
            .preferences
            .map(RawPreferences::normalize)
            .unwrap_or_default(),
        is_active: true,
        generated_at: now,
        updated_at: now,
    }
}

/// Full generate flow: resolve templates, then assemble the plan.
///
/// There is no transaction spanning template creation and the plan save;
/// a failure mid-sequence can leave newly created templates behind.
pub async fn build_plan(
    db: &FirestoreDb,
    user_id: &str,
    request: GeneratePlanRequest,
) -> Result<WorkoutPlan, AppError> {
    let names = requested_exercise_names(&request);
    let template_ids = resolve_templates(db, user_id, &names).await?;
    Ok(assemble_plan(user_id, request, &template_ids))
}

// ─── Regenerate Flow ─────────────────────────────────────────────

fn parse_suggested_type(raw: Option<&str>) -> ExerciseType {
    raw.and_then(|s| serde_json::from_value(serde_json::Value::String(s.to_string())).ok())
        .unwrap_or(ExerciseType::Other)
}

/// Save templates suggested by the webhook, tolerating partial failure.
///
/// Returns a name-to-ID map of every suggested template that is usable
/// (newly saved or already present) and the count of new saves. A save
/// failure is logged and skipped; the flow continues with what saved.
async fn save_suggested_templates(
    db: &FirestoreDb,
    user_id: &str,
    suggestions: &[NewTemplateSuggestion],
) -> (HashMap<String, String>, usize) {
    let mut available = HashMap::new();
    let mut created = 0;

    for suggestion in suggestions {
        let name = suggestion.name.trim();
        if name.is_empty() {
            continue;
        }

        let template = ExerciseTemplate {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            exercise_type: parse_suggested_type(suggestion.exercise_type.as_deref()),
            created_at: Utc::now(),
        };

        match db.create_template(&template).await {
            Ok(()) => {
                available.insert(name.to_string(), template.id);
                created += 1;
            }
            Err(AppError::Conflict(_)) => {
                // Already in the catalog; reuse it
                match db.find_template_by_name(user_id, name).await {
                    Ok(Some(existing)) => {
                        available.insert(name.to_string(), existing.id);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(name, error = %e, "Failed to look up existing template");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(name, error = %e, "Failed to save suggested template, continuing");
            }
        }
    }

    (available, created)
}

/// Rewrite generated workouts into plan sessions, substituting template
/// IDs for new-template names. Exercises that resolve to no template are
/// dropped with a warning.
pub fn merge_generated_workouts(
    generated: Vec<GeneratedWorkout>,
    new_ids_by_name: &HashMap<String, String>,
) -> Vec<WorkoutSession> {
    generated
        .into_iter()
        .map(|workout| WorkoutSession {
            name: workout.name,
            description: workout.description,
            day_of_week: workout.day_of_week,
            difficulty: workout.difficulty.unwrap_or_default(),
            estimated_duration: workout.estimated_duration,
            exercises: workout
                .exercises
                .into_iter()
                .filter_map(|exercise| {
                    let template_id = if exercise.is_new_template {
                        exercise
                            .template_name
                            .as_deref()
                            .and_then(|name| new_ids_by_name.get(name))
                            .cloned()
                    } else {
                        exercise.exercise_template.clone()
                    };

                    let Some(template_id) = template_id else {
                        tracing::warn!(
                            template_name = ?exercise.template_name,
                            "Generated exercise resolves to no template, dropping"
                        );
                        return None;
                    };

                    Some(PlannedExercise {
                        exercise_template_id: template_id,
                        sets: exercise.sets.unwrap_or(1),
                        target_reps: exercise.target_reps,
                        target_time: exercise.target_time,
                        rest_time: exercise.rest_time,
                        notes: exercise.notes,
                    })
                })
                .collect(),
        })
        .collect()
}

/// Rewrite a plan from a webhook response: workouts replaced, description
/// overwritten when provided, `generated_at` and `updated_at` set to `now`.
/// The plan's identity (`id`, owner) is untouched.
pub fn apply_generated_plan(
    plan: &mut WorkoutPlan,
    generated: GeneratedPlan,
    new_ids_by_name: &HashMap<String, String>,
    now: DateTime<Utc>,
) {
    plan.workouts = merge_generated_workouts(generated.workouts, new_ids_by_name);
    if let Some(description) = generated.description {
        plan.description = Some(description);
    }
    plan.generated_at = now;
    plan.updated_at = now;
}

/// Regenerate a plan in place via the external webhook.
///
/// Forwards the stored preferences and the caller's full catalog, merges
/// suggested templates into the catalog, replaces the plan's workouts and
/// bumps `generated_at`. The caller persists the updated plan. Returns
/// the number of new templates created.
pub async fn regenerate_plan(
    db: &FirestoreDb,
    webhook: &WebhookClient,
    plan: &mut WorkoutPlan,
) -> Result<usize, AppError> {
    let catalog = db.list_templates(&plan.user_id).await?;

    let request = RegenerationRequest {
        user_id: plan.user_id.clone(),
        preferences: plan.preferences.clone(),
        existing_exercises: catalog
            .iter()
            .map(|template| ExistingExercise {
                id: template.id.clone(),
                name: template.name.clone(),
                exercise_type: serde_json::to_value(template.exercise_type)
                    .ok()
                    .and_then(|v| v.as_str().map(String::from))
                    .unwrap_or_default(),
            })
            .collect(),
        should_create_new_exercises: true,
    };

    let generated = webhook.regenerate(&request).await?;

    let (new_ids_by_name, created) =
        save_suggested_templates(db, &plan.user_id, &generated.new_exercise_templates).await;

    apply_generated_plan(plan, generated, &new_ids_by_name, Utc::now());

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_or_list_normalization() {
        let from_string: StringOrList =
            serde_json::from_str("\"weight_loss, endurance , ,muscle_gain\"").unwrap();
        assert_eq!(
            from_string.into_list(),
            vec!["weight_loss", "endurance", "muscle_gain"]
        );

        let from_list: StringOrList = serde_json::from_str(r#"["a", " b "]"#).unwrap();
        assert_eq!(from_list.into_list(), vec!["a", "b"]);
    }

    #[test]
    fn test_raw_preferences_normalize() {
        let raw: RawPreferences = serde_json::from_str(
            r#"{"goals": "strength, mobility", "equipment": ["dumbbells"],
                "fitnessLevel": "beginner", "daysPerWeek": 4}"#,
        )
        .unwrap();

        let preferences = raw.normalize();
        assert_eq!(preferences.goals, vec!["strength", "mobility"]);
        assert_eq!(preferences.equipment, vec!["dumbbells"]);
        assert_eq!(preferences.fitness_level, "beginner");
        assert_eq!(preferences.days_per_week, Some(4));
        assert!(preferences.injuries.is_empty());
    }

    fn sample_request() -> GeneratePlanRequest {
        serde_json::from_str(
            r#"{
                "name": "Starter Plan",
                "workouts": [{
                    "name": "Full Body",
                    "dayOfWeek": "Monday",
                    "exercises": [
                        {"exerciseName": "Push-ups", "sets": 3, "targetReps": 15},
                        {"exerciseName": "Plank", "targetTime": 60}
                    ]
                }]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_requested_exercise_names_are_distinct_and_trimmed() {
        let mut request = sample_request();
        request.workouts[0].exercises.push(RequestedExercise {
            exercise_name: "  Push-ups ".to_string(),
            sets: None,
            target_reps: None,
            target_time: None,
            rest_time: None,
            notes: None,
        });

        let names = requested_exercise_names(&request);
        assert_eq!(names.len(), 2);
        assert!(names.contains("Push-ups"));
        assert!(names.contains("Plank"));
    }

    #[test]
    fn test_assemble_plan_substitutes_template_ids() {
        let request = sample_request();
        let template_ids: HashMap<String, String> = [
            ("Push-ups".to_string(), "t-push".to_string()),
            ("Plank".to_string(), "t-plank".to_string()),
        ]
        .into();

        let plan = assemble_plan("user-1", request, &template_ids);

        assert_eq!(plan.user_id, "user-1");
        assert_eq!(plan.duration_weeks, 4);
        assert_eq!(plan.days_per_week, 3);
        assert!(plan.is_active);

        let exercises = &plan.workouts[0].exercises;
        assert_eq!(exercises[0].exercise_template_id, "t-push");
        assert_eq!(exercises[0].sets, 3);
        assert_eq!(exercises[1].exercise_template_id, "t-plank");
        assert_eq!(exercises[1].sets, 1);
    }

    #[test]
    fn test_merge_generated_workouts_resolves_new_templates() {
        let generated: Vec<GeneratedWorkout> = serde_json::from_str(
            r#"[{
                "name": "Leg Day",
                "exercises": [
                    {"exerciseTemplate": "t-existing", "sets": 4},
                    {"templateName": "Goblet Squat", "isNewTemplate": true, "sets": 3},
                    {"templateName": "Unsaved Move", "isNewTemplate": true}
                ]
            }]"#,
        )
        .unwrap();

        let new_ids: HashMap<String, String> =
            [("Goblet Squat".to_string(), "t-new".to_string())].into();

        let sessions = merge_generated_workouts(generated, &new_ids);

        // The unresolvable exercise is dropped
        assert_eq!(sessions[0].exercises.len(), 2);
        assert_eq!(sessions[0].exercises[0].exercise_template_id, "t-existing");
        assert_eq!(sessions[0].exercises[1].exercise_template_id, "t-new");
    }

    #[test]
    fn test_apply_generated_plan_keeps_identity_and_bumps_timestamps() {
        let template_ids: HashMap<String, String> = [
            ("Push-ups".to_string(), "t-push".to_string()),
            ("Plank".to_string(), "t-plank".to_string()),
        ]
        .into();
        let mut plan = assemble_plan("user-1", sample_request(), &template_ids);
        let original_id = plan.id.clone();
        let before = plan.generated_at;

        let generated: GeneratedPlan = serde_json::from_str(
            r#"{
                "description": "Rebuilt plan",
                "workouts": [{
                    "name": "Upper Body",
                    "exercises": [{"exerciseTemplate": "t-push", "sets": 5}]
                }]
            }"#,
        )
        .unwrap();

        let now = before + chrono::Duration::hours(1);
        apply_generated_plan(&mut plan, generated, &HashMap::new(), now);

        // Identity preserved, content replaced
        assert_eq!(plan.id, original_id);
        assert_eq!(plan.user_id, "user-1");
        assert_eq!(plan.workouts.len(), 1);
        assert_eq!(plan.workouts[0].name, "Upper Body");
        assert_eq!(plan.workouts[0].exercises[0].sets, 5);
        assert_eq!(plan.description.as_deref(), Some("Rebuilt plan"));
        assert_eq!(plan.generated_at, now);
        assert_eq!(plan.updated_at, now);
        assert!(plan.generated_at > before);
    }

    #[test]
    fn test_apply_generated_plan_keeps_description_when_absent() {
        let mut plan = assemble_plan("user-1", sample_request(), &HashMap::new());
        plan.description = Some("Original notes".to_string());

        let generated: GeneratedPlan = serde_json::from_str(r#"{"workouts": []}"#).unwrap();
        apply_generated_plan(&mut plan, generated, &HashMap::new(), Utc::now());

        assert_eq!(plan.description.as_deref(), Some("Original notes"));
        assert!(plan.workouts.is_empty());
    }

    #[test]
    fn test_parse_suggested_type_defaults_to_other() {
        assert_eq!(parse_suggested_type(Some("time")), ExerciseType::Time);
        assert_eq!(parse_suggested_type(Some("strength")), ExerciseType::Other);
        assert_eq!(parse_suggested_type(None), ExerciseType::Other);
    }
}
