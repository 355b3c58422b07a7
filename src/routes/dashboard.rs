// SPDX-License-Identifier: MIT

//! Dashboard statistics route.

use crate::error::Result;
use crate::middleware::auth::CurrentUser;
use crate::models::TemplateSummary;
use crate::routes::exercises::{populate_log, PopulatedLog};
use crate::services::dashboard::{
    self, GoalProgress, StatsWindow, WeeklyTrendPoint,
};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

const RECENT_LOGS: usize = 5;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/dashboard/stats", get(get_stats))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsQuery {
    period: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicStats {
    pub total_workouts: usize,
    pub period_workouts: usize,
    pub total_exercises: usize,
    pub total_plans: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopExerciseView {
    pub template: TemplateSummary,
    pub count: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub stats: BasicStats,
    pub weekly_trend: Vec<WeeklyTrendPoint>,
    pub goal_progress: Option<GoalProgress>,
    pub recent_activity: Vec<PopulatedLog>,
    pub top_exercises: Vec<TopExerciseView>,
    pub period: String,
}

/// Compute dashboard rollups for the caller over the requested window.
///
/// Everything is recomputed per request from the caller's documents;
/// nothing is cached or incrementally maintained.
async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<DashboardResponse>> {
    let now = chrono::Utc::now();
    let (window, period) = dashboard::resolve_window(
        params.period.as_deref(),
        params.start_date.as_deref(),
        params.end_date.as_deref(),
        now,
    )?;

    let logs = state.db.list_logs(&user.id).await?;
    let templates = state.db.list_templates(&user.id).await?;
    let plans = state.db.list_all_plans(&user.id).await?;

    let template_map: HashMap<String, TemplateSummary> = templates
        .iter()
        .map(|t| (t.id.clone(), TemplateSummary::from(t)))
        .collect();

    let stats = BasicStats {
        total_workouts: logs.len(),
        period_workouts: logs.iter().filter(|log| window.contains(log.date)).count(),
        total_exercises: templates.len(),
        total_plans: plans.len(),
    };

    let active_plan = plans.iter().find(|plan| plan.is_active);
    let goal_progress = dashboard::goal_progress(active_plan, &logs, now);
    let weekly_trend = dashboard::weekly_trend(&logs, now);

    // Logs come back newest first, so the first in-window entries are
    // the most recent activity
    let recent_activity = logs
        .iter()
        .filter(|log| window.contains(log.date))
        .take(RECENT_LOGS)
        .map(|log| populate_log(log, &template_map))
        .collect();

    let top_exercises = top_exercise_views(&logs, &window, &template_map);

    tracing::debug!(
        user_id = %user.id,
        period = %period,
        total_workouts = stats.total_workouts,
        "Dashboard stats computed"
    );

    Ok(Json(DashboardResponse {
        stats,
        weekly_trend,
        goal_progress,
        recent_activity,
        top_exercises,
        period,
    }))
}

/// Join ranked template IDs with their summaries. Dangling references
/// (deleted templates) are dropped from the ranking.
fn top_exercise_views(
    logs: &[crate::models::WorkoutLog],
    window: &StatsWindow,
    templates: &HashMap<String, TemplateSummary>,
) -> Vec<TopExerciseView> {
    dashboard::top_exercises(logs, window)
        .into_iter()
        .filter_map(|(template_id, count)| {
            templates.get(&template_id).map(|template| TopExerciseView {
                template: template.clone(),
                count,
            })
        })
        .collect()
}
