// SPDX-License-Identifier: MIT

//! Dashboard statistics, recomputed from workout logs at request time.
//!
//! Nothing here is cached or incrementally maintained; every request
//! re-derives its rollups from the owner's documents.

use crate::error::AppError;
use crate::models::{WorkoutLog, WorkoutPlan};
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Trailing window for the weekly trend.
const TREND_DAYS: i64 = 28;
/// Trailing window for goal progress.
const GOAL_DAYS: i64 = 7;
/// Weekly goal fallback when the active plan carries none.
const DEFAULT_WEEKLY_GOAL: u32 = 3;
/// Number of top exercises reported.
const TOP_EXERCISES: usize = 5;

/// Date window the dashboard aggregates over.
#[derive(Debug, Clone, Copy)]
pub struct StatsWindow {
    pub start: DateTime<Utc>,
    /// Unbounded for preset periods
    pub end: Option<DateTime<Utc>>,
}

impl StatsWindow {
    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        date >= self.start && self.end.is_none_or(|end| date <= end)
    }
}

/// Resolve the requested window: explicit start/end, or a preset period.
///
/// Returns the window and the period label echoed in the response.
pub fn resolve_window(
    period: Option<&str>,
    start_date: Option<&str>,
    end_date: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(StatsWindow, String), AppError> {
    if let (Some(start), Some(end)) = (start_date, end_date) {
        let parse = |raw: &str| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| {
                    AppError::BadRequest(
                        "startDate and endDate must be RFC3339 datetimes".to_string(),
                    )
                })
        };
        return Ok((
            StatsWindow {
                start: parse(start)?,
                end: Some(parse(end)?),
            },
            "custom".to_string(),
        ));
    }

    // Unknown periods fall back to the 7-day default
    let days = match period {
        Some("30d") => 30,
        Some("90d") => 90,
        _ => 7,
    };

    Ok((
        StatsWindow {
            start: now - Duration::days(days),
            end: None,
        },
        period.unwrap_or("7d").to_string(),
    ))
}

/// One ISO-week bucket of the trend.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTrendPoint {
    pub year: i32,
    pub week: u32,
    pub workouts: u32,
    pub total_exercises: u32,
}

/// Workout and exercise counts grouped by ISO week over the trailing
/// 28 days, ascending by (year, week).
pub fn weekly_trend(logs: &[WorkoutLog], now: DateTime<Utc>) -> Vec<WeeklyTrendPoint> {
    let cutoff = now - Duration::days(TREND_DAYS);
    let mut buckets: std::collections::BTreeMap<(i32, u32), (u32, u32)> = Default::default();

    for log in logs.iter().filter(|log| log.date >= cutoff) {
        let iso = log.date.iso_week();
        let bucket = buckets.entry((iso.year(), iso.week())).or_default();
        bucket.0 += 1;
        bucket.1 += log.exercises.len() as u32;
    }

    buckets
        .into_iter()
        .map(|((year, week), (workouts, total_exercises))| WeeklyTrendPoint {
            year,
            week,
            workouts,
            total_exercises,
        })
        .collect()
}

/// Progress toward the active plan's weekly workout goal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub weekly_goal: u32,
    pub completed: u32,
    /// Rounded percentage, deliberately unclamped (may exceed 100)
    pub percentage: u32,
    pub plan_name: String,
}

/// Compute goal progress from the active plan, or None without one.
pub fn goal_progress(
    active_plan: Option<&WorkoutPlan>,
    logs: &[WorkoutLog],
    now: DateTime<Utc>,
) -> Option<GoalProgress> {
    let plan = active_plan?;

    let weekly_goal = if plan.days_per_week == 0 {
        DEFAULT_WEEKLY_GOAL
    } else {
        plan.days_per_week
    };

    let week_start = now - Duration::days(GOAL_DAYS);
    let completed = logs.iter().filter(|log| log.date >= week_start).count() as u32;

    Some(GoalProgress {
        weekly_goal,
        completed,
        percentage: (100.0 * f64::from(completed) / f64::from(weekly_goal)).round() as u32,
        plan_name: plan.name.clone(),
    })
}

/// The most-logged template IDs in the window, by occurrence count,
/// descending, at most five.
pub fn top_exercises(logs: &[WorkoutLog], window: &StatsWindow) -> Vec<(String, u32)> {
    let mut counts: HashMap<&str, u32> = HashMap::new();

    for log in logs.iter().filter(|log| window.contains(log.date)) {
        for entry in &log.exercises {
            *counts.entry(entry.exercise_template_id.as_str()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, u32)> = counts
        .into_iter()
        .map(|(id, count)| (id.to_string(), count))
        .collect();

    // Tie-break on ID for deterministic output
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(TOP_EXERCISES);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExerciseLogEntry, PlanPreferences};

    fn utc(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }

    fn make_log(user: &str, date: &str, entries: usize) -> WorkoutLog {
        let date = utc(date);
        WorkoutLog {
            id: format!("{}_{}", user, date.format("%Y-%m-%d")),
            user_id: user.to_string(),
            date,
            exercises: (0..entries)
                .map(|i| ExerciseLogEntry {
                    exercise_template_id: format!("t{}", i),
                    reps: Some(10),
                    time: None,
                    performed_at: date,
                })
                .collect(),
        }
    }

    fn make_plan(days_per_week: u32) -> WorkoutPlan {
        WorkoutPlan {
            id: "p1".to_string(),
            user_id: "u1".to_string(),
            name: "Strength Block".to_string(),
            description: None,
            duration_weeks: 4,
            days_per_week,
            workouts: vec![],
            preferences: PlanPreferences::default(),
            is_active: true,
            generated_at: utc("2024-01-01T00:00:00Z"),
            updated_at: utc("2024-01-01T00:00:00Z"),
        }
    }

    #[test]
    fn test_resolve_window_presets() {
        let now = utc("2024-06-15T12:00:00Z");

        let (window, label) = resolve_window(Some("30d"), None, None, now).unwrap();
        assert_eq!(window.start, now - Duration::days(30));
        assert!(window.end.is_none());
        assert_eq!(label, "30d");

        // Unknown period falls back to 7 days
        let (window, _) = resolve_window(Some("14d"), None, None, now).unwrap();
        assert_eq!(window.start, now - Duration::days(7));
    }

    #[test]
    fn test_resolve_window_explicit_range() {
        let now = utc("2024-06-15T12:00:00Z");
        let (window, label) = resolve_window(
            None,
            Some("2024-05-01T00:00:00Z"),
            Some("2024-05-31T23:59:59Z"),
            now,
        )
        .unwrap();

        assert_eq!(label, "custom");
        assert!(window.contains(utc("2024-05-10T08:00:00Z")));
        assert!(!window.contains(utc("2024-06-01T08:00:00Z")));

        let err = resolve_window(None, Some("yesterday"), Some("today"), now).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_weekly_trend_groups_by_iso_week() {
        let now = utc("2024-01-22T12:00:00Z");
        let logs = vec![
            make_log("u1", "2024-01-15T08:00:00Z", 2), // ISO week 3
            make_log("u1", "2024-01-17T08:00:00Z", 3), // ISO week 3
            make_log("u1", "2024-01-22T08:00:00Z", 1), // ISO week 4
            make_log("u1", "2023-12-01T08:00:00Z", 9), // outside trailing 28 days
        ];

        let trend = weekly_trend(&logs, now);

        assert_eq!(
            trend,
            vec![
                WeeklyTrendPoint {
                    year: 2024,
                    week: 3,
                    workouts: 2,
                    total_exercises: 5,
                },
                WeeklyTrendPoint {
                    year: 2024,
                    week: 4,
                    workouts: 1,
                    total_exercises: 1,
                },
            ]
        );
    }

    #[test]
    fn test_goal_progress_percentage_is_unclamped() {
        let now = utc("2024-06-15T12:00:00Z");
        let plan = make_plan(3);
        let logs: Vec<WorkoutLog> = (10..15)
            .map(|day| make_log("u1", &format!("2024-06-{}T08:00:00Z", day), 1))
            .collect();

        let progress = goal_progress(Some(&plan), &logs, now).unwrap();

        assert_eq!(progress.weekly_goal, 3);
        assert_eq!(progress.completed, 5);
        // round(100 * 5 / 3) = 167, not clamped to 100
        assert_eq!(progress.percentage, 167);
    }

    #[test]
    fn test_goal_progress_defaults_weekly_goal() {
        let now = utc("2024-06-15T12:00:00Z");
        let plan = make_plan(0);

        let progress = goal_progress(Some(&plan), &[], now).unwrap();
        assert_eq!(progress.weekly_goal, 3);
        assert_eq!(progress.percentage, 0);

        assert!(goal_progress(None, &[], now).is_none());
    }

    #[test]
    fn test_top_exercises_ranked_and_capped() {
        let now = utc("2024-06-15T12:00:00Z");
        let window = StatsWindow {
            start: now - Duration::days(7),
            end: None,
        };

        // Seven distinct templates; t0 appears in every log
        let logs: Vec<WorkoutLog> = (10..17)
            .map(|day| {
                let mut log = make_log("u1", &format!("2024-06-{}T08:00:00Z", day), 1);
                log.exercises.push(ExerciseLogEntry {
                    exercise_template_id: format!("t{}", day),
                    reps: None,
                    time: Some(30),
                    performed_at: log.date,
                });
                log
            })
            .collect();

        let ranked = top_exercises(&logs, &window);

        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0], ("t0".to_string(), 7));
    }
}
