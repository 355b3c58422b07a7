// SPDX-License-Identifier: MIT

//! Exercise template catalog and workout log routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::CurrentUser;
use crate::models::{ExerciseLogEntry, ExerciseTemplate, ExerciseType, TemplateSummary};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/exercises/createTemplate", post(create_template))
        .route("/api/exercises/getTemplates", get(get_templates))
        .route("/api/exercises/deleteTemplate/{id}", delete(delete_template))
        .route("/api/exercises/logExercise/{id}", post(log_exercise))
        .route("/api/exercises/logs", get(get_logs))
}

// ─── Templates ───────────────────────────────────────────────

#[derive(Deserialize)]
struct CreateTemplateRequest {
    name: Option<String>,
    #[serde(rename = "type")]
    exercise_type: Option<ExerciseType>,
}

#[derive(Serialize)]
pub struct TemplateResponse {
    pub template: TemplateSummary,
}

/// Create an exercise template; (owner, name) must be unique.
async fn create_template(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<TemplateResponse>)> {
    let (name, exercise_type) = match (body.name, body.exercise_type) {
        (Some(name), Some(exercise_type)) if !name.trim().is_empty() => {
            (name.trim().to_string(), exercise_type)
        }
        _ => {
            return Err(AppError::BadRequest(
                "Name and type are required fields".to_string(),
            ))
        }
    };

    if state
        .db
        .find_template_by_name(&user.id, &name)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "Exercise template with this name already exists".to_string(),
        ));
    }

    let template = ExerciseTemplate {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        name,
        exercise_type,
        created_at: chrono::Utc::now(),
    };

    // A concurrent duplicate still fails here with a conflict
    state.db.create_template(&template).await?;

    tracing::info!(user_id = %user.id, template_id = %template.id, "Template created");

    Ok((
        StatusCode::CREATED,
        Json(TemplateResponse {
            template: TemplateSummary::from(&template),
        }),
    ))
}

#[derive(Serialize)]
pub struct TemplatesResponse {
    pub templates: Vec<TemplateSummary>,
}

/// List the caller's templates, newest first.
async fn get_templates(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<TemplatesResponse>> {
    let templates = state.db.list_templates(&user.id).await?;

    Ok(Json(TemplatesResponse {
        templates: templates.iter().map(TemplateSummary::from).collect(),
    }))
}

#[derive(Serialize)]
pub struct DeleteTemplateResponse {
    pub message: String,
}

/// Delete an owned template. Referencing logs/plans are left untouched.
async fn delete_template(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(template_id): Path<String>,
) -> Result<Json<DeleteTemplateResponse>> {
    let template = state
        .db
        .get_template(&user.id, &template_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Exercise template not found".to_string()))?;

    state.db.delete_template(&template).await?;

    tracing::info!(user_id = %user.id, template_id = %template_id, "Template deleted");

    Ok(Json(DeleteTemplateResponse {
        message: "Exercise template deleted".to_string(),
    }))
}

// ─── Workout Log ─────────────────────────────────────────────

#[derive(Default, Deserialize)]
struct LogExerciseRequest {
    reps: Option<u32>,
    time: Option<u32>,
}

/// A log entry with its template resolved inline.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedLogEntry {
    /// None when the referenced template was deleted (dangling reference)
    pub exercise_template: Option<TemplateSummary>,
    pub reps: Option<u32>,
    pub time: Option<u32>,
    pub performed_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedLog {
    pub id: String,
    pub date: String,
    pub exercises: Vec<PopulatedLogEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogExerciseResponse {
    pub message: String,
    pub workout_log: PopulatedLog,
}

/// Log a performance of an owned template against today's journal.
///
/// The first log of the day creates the day's document; later logs
/// append to it. Re-submitting appends again (not idempotent).
async fn log_exercise(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(template_id): Path<String>,
    body: Option<Json<LogExerciseRequest>>,
) -> Result<(StatusCode, Json<LogExerciseResponse>)> {
    let Json(body) = body.unwrap_or_default();

    let template = state
        .db
        .get_template(&user.id, &template_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Exercise template not found".to_string()))?;

    let now = chrono::Utc::now();
    let entry = ExerciseLogEntry {
        exercise_template_id: template.id.clone(),
        reps: body.reps,
        time: body.time,
        performed_at: now,
    };

    let log = state.db.append_log_entry(&user.id, now, entry).await?;

    tracing::debug!(
        user_id = %user.id,
        template_id = %template.id,
        entries = log.exercises.len(),
        "Exercise logged"
    );

    // Older entries in the same document may reference other templates,
    // so resolve against the full catalog
    let templates = state.db.list_templates(&user.id).await?;
    let template_map: HashMap<String, TemplateSummary> = templates
        .iter()
        .map(|t| (t.id.clone(), TemplateSummary::from(t)))
        .collect();

    Ok((
        StatusCode::CREATED,
        Json(LogExerciseResponse {
            message: "Exercise logged successfully".to_string(),
            workout_log: populate_log(&log, &template_map),
        }),
    ))
}

#[derive(Serialize)]
pub struct LogsResponse {
    pub logs: Vec<PopulatedLog>,
}

/// List the caller's workout logs, newest first, templates resolved.
async fn get_logs(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<LogsResponse>> {
    let logs = state.db.list_logs(&user.id).await?;
    let templates = state.db.list_templates(&user.id).await?;

    let template_map: HashMap<String, TemplateSummary> = templates
        .iter()
        .map(|t| (t.id.clone(), TemplateSummary::from(t)))
        .collect();

    Ok(Json(LogsResponse {
        logs: logs
            .iter()
            .map(|log| populate_log(log, &template_map))
            .collect(),
    }))
}

/// Resolve template references inside a log for the API response.
pub fn populate_log(
    log: &crate::models::WorkoutLog,
    templates: &HashMap<String, TemplateSummary>,
) -> PopulatedLog {
    PopulatedLog {
        id: log.id.clone(),
        date: format_utc_rfc3339(log.date),
        exercises: log
            .exercises
            .iter()
            .map(|entry| PopulatedLogEntry {
                exercise_template: templates.get(&entry.exercise_template_id).cloned(),
                reps: entry.reps,
                time: entry.time,
                performed_at: format_utc_rfc3339(entry.performed_at),
            })
            .collect(),
    }
}
