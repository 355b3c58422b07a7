// SPDX-License-Identifier: MIT

//! Workout plan routes: generation, webhook relay, and plan store access.

use crate::error::{AppError, Result};
use crate::middleware::auth::CurrentUser;
use crate::models::plan::{DayOfWeek, Difficulty};
use crate::models::{PlanPreferences, TemplateSummary, WorkoutPlan};
use crate::services::plan_generator::{self, GeneratePlanRequest};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

const MAX_PER_PAGE: u32 = 50;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/plan/generate", post(generate_plan))
        .route("/api/plan/send", post(send_data))
        .route("/api/plan", get(list_plans))
        .route("/api/plan/{planId}", get(get_plan))
        .route("/api/plan/{planId}", delete(delete_plan))
        .route("/api/plan/{planId}/regenerate", post(regenerate_plan))
}

// ─── Populated Plan Views ────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanExerciseView {
    /// None when the referenced template was deleted (dangling reference)
    pub exercise_template: Option<TemplateSummary>,
    pub sets: u32,
    pub target_reps: Option<u32>,
    pub target_time: Option<u32>,
    pub rest_time: Option<u32>,
    pub notes: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub name: String,
    pub description: Option<String>,
    pub day_of_week: Option<DayOfWeek>,
    pub difficulty: Difficulty,
    pub estimated_duration: Option<u32>,
    pub exercises: Vec<PlanExerciseView>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Plan duration in weeks
    pub duration: u32,
    pub days_per_week: u32,
    pub workouts: Vec<SessionView>,
    pub preferences: PlanPreferences,
    pub is_active: bool,
    pub generated_at: String,
    pub updated_at: String,
}

/// Resolve template references inside a plan for the API response.
pub fn populate_plan(
    plan: &WorkoutPlan,
    templates: &HashMap<String, TemplateSummary>,
) -> PlanView {
    PlanView {
        id: plan.id.clone(),
        name: plan.name.clone(),
        description: plan.description.clone(),
        duration: plan.duration_weeks,
        days_per_week: plan.days_per_week,
        workouts: plan
            .workouts
            .iter()
            .map(|session| SessionView {
                name: session.name.clone(),
                description: session.description.clone(),
                day_of_week: session.day_of_week,
                difficulty: session.difficulty,
                estimated_duration: session.estimated_duration,
                exercises: session
                    .exercises
                    .iter()
                    .map(|exercise| PlanExerciseView {
                        exercise_template: templates.get(&exercise.exercise_template_id).cloned(),
                        sets: exercise.sets,
                        target_reps: exercise.target_reps,
                        target_time: exercise.target_time,
                        rest_time: exercise.rest_time,
                        notes: exercise.notes.clone(),
                    })
                    .collect(),
            })
            .collect(),
        preferences: plan.preferences.clone(),
        is_active: plan.is_active,
        generated_at: format_utc_rfc3339(plan.generated_at),
        updated_at: format_utc_rfc3339(plan.updated_at),
    }
}

async fn template_map(
    state: &AppState,
    user_id: &str,
) -> Result<HashMap<String, TemplateSummary>> {
    let templates = state.db.list_templates(user_id).await?;
    Ok(templates
        .iter()
        .map(|t| (t.id.clone(), TemplateSummary::from(t)))
        .collect())
}

// ─── Generate ────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePlanResponse {
    pub message: String,
    pub workout_plan: PlanView,
}

/// Ingest a plan structure, creating any missing exercise templates.
async fn generate_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<GeneratePlanRequest>,
) -> Result<(StatusCode, Json<GeneratePlanResponse>)> {
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("Plan name is required".to_string()));
    }

    let plan = plan_generator::build_plan(&state.db, &user.id, body).await?;
    state.db.create_plan(&plan).await?;

    tracing::info!(
        user_id = %user.id,
        plan_id = %plan.id,
        workouts = plan.workouts.len(),
        "Workout plan generated"
    );

    let templates = template_map(&state, &user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(GeneratePlanResponse {
            message: "Workout plan created successfully".to_string(),
            workout_plan: populate_plan(&plan, &templates),
        }),
    ))
}

// ─── Send (preference relay) ─────────────────────────────────

#[derive(Serialize)]
pub struct SendDataResponse {
    pub message: String,
    pub response: serde_json::Value,
}

/// Relay a raw preference payload to the webhook; no persistence.
async fn send_data(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(mut payload): Json<serde_json::Value>,
) -> Result<Json<SendDataResponse>> {
    if let Some(object) = payload.as_object_mut() {
        object.insert(
            "userId".to_string(),
            serde_json::Value::String(user.id.clone()),
        );
    }

    let response = state.webhook.send(&payload).await?;

    Ok(Json(SendDataResponse {
        message: "Data sent to webhook successfully".to_string(),
        response,
    }))
}

// ─── Plan Store ──────────────────────────────────────────────

#[derive(Deserialize)]
struct ListPlansQuery {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_page() -> u32 {
    1
}
fn default_limit() -> u32 {
    10
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPlansResponse {
    pub workout_plans: Vec<PlanView>,
    pub pagination: PaginationInfo,
}

/// List the caller's plans, newest generated first.
async fn list_plans(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<ListPlansQuery>,
) -> Result<Json<ListPlansResponse>> {
    if params.page < 1 {
        return Err(AppError::BadRequest(
            "Page must be greater than 0".to_string(),
        ));
    }

    let limit = params.limit.clamp(1, MAX_PER_PAGE);
    let offset = (params.page - 1)
        .checked_mul(limit)
        .ok_or_else(|| AppError::BadRequest("Page number causes overflow".to_string()))?;

    // Fetch one extra item to determine if another page is available
    let mut plans = state.db.list_plans(&user.id, limit + 1, offset).await?;
    let has_more = plans.len() > limit as usize;
    if has_more {
        plans.truncate(limit as usize);
    }

    let templates = template_map(&state, &user.id).await?;

    Ok(Json(ListPlansResponse {
        workout_plans: plans.iter().map(|p| populate_plan(p, &templates)).collect(),
        pagination: PaginationInfo {
            page: params.page,
            limit,
            has_more,
        },
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub workout_plan: PlanView,
}

/// Get one of the caller's plans by ID.
async fn get_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(plan_id): Path<String>,
) -> Result<Json<PlanResponse>> {
    let plan = state
        .db
        .get_plan(&user.id, &plan_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Workout plan not found".to_string()))?;

    let templates = template_map(&state, &user.id).await?;

    Ok(Json(PlanResponse {
        workout_plan: populate_plan(&plan, &templates),
    }))
}

#[derive(Serialize)]
pub struct DeletePlanResponse {
    pub message: String,
}

/// Delete one of the caller's plans.
async fn delete_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(plan_id): Path<String>,
) -> Result<Json<DeletePlanResponse>> {
    let plan = state
        .db
        .get_plan(&user.id, &plan_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Workout plan not found".to_string()))?;

    state.db.delete_plan(&plan.id).await?;

    tracing::info!(user_id = %user.id, plan_id = %plan.id, "Workout plan deleted");

    Ok(Json(DeletePlanResponse {
        message: "Workout plan deleted successfully".to_string(),
    }))
}

// ─── Regenerate ──────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateResponse {
    pub message: String,
    pub workout_plan: PlanView,
    pub new_exercise_templates_created: usize,
}

/// Regenerate a plan in place via the external webhook.
async fn regenerate_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(plan_id): Path<String>,
) -> Result<Json<RegenerateResponse>> {
    let mut plan = state
        .db
        .get_plan(&user.id, &plan_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Workout plan not found".to_string()))?;

    let created =
        plan_generator::regenerate_plan(&state.db, &state.webhook, &mut plan).await?;

    state.db.update_plan(&plan).await?;

    tracing::info!(
        user_id = %user.id,
        plan_id = %plan.id,
        new_templates = created,
        "Workout plan regenerated"
    );

    let templates = template_map(&state, &user.id).await?;

    Ok(Json(RegenerateResponse {
        message: "Workout plan regenerated successfully".to_string(),
        workout_plan: populate_plan(&plan, &templates),
        new_exercise_templates_created: created,
    }))
}
