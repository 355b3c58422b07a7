// SPDX-License-Identifier: MIT

//! Client for the external workout-generation webhook.
//!
//! Handles:
//! - Relaying preference payloads (send flow)
//! - Requesting plan regeneration with the user's current catalog
//! - Short-lived service-token signing for outbound requests
//!
//! Calls are bounded by fixed timeouts and never retried; a failed call
//! is terminal for the request that triggered it.

use crate::error::AppError;
use crate::models::plan::{DayOfWeek, Difficulty, PlanPreferences};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout for the preference relay (send) flow.
const SEND_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for plan regeneration, which does heavier work upstream.
const REGENERATE_TIMEOUT: Duration = Duration::from_secs(60);
/// Lifetime of the outbound service token.
const SERVICE_TOKEN_TTL_SECS: usize = 60 * 60;

/// Workout-generation webhook client.
#[derive(Clone)]
pub struct WebhookClient {
    http: reqwest::Client,
    url: Option<String>,
    signing_key: Vec<u8>,
}

/// Claims for the short-lived outbound service token.
#[derive(Serialize, Deserialize)]
struct ServiceClaims {
    iat: usize,
    exp: usize,
}

/// Template info forwarded to the webhook during regeneration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingExercise {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub exercise_type: String,
}

/// Regeneration request payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerationRequest {
    pub user_id: String,
    pub preferences: PlanPreferences,
    pub existing_exercises: Vec<ExistingExercise>,
    pub should_create_new_exercises: bool,
}

/// Plan structure returned by the webhook.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPlan {
    pub description: Option<String>,
    #[serde(default)]
    pub workouts: Vec<GeneratedWorkout>,
    #[serde(default)]
    pub new_exercise_templates: Vec<NewTemplateSuggestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedWorkout {
    pub name: String,
    pub description: Option<String>,
    pub day_of_week: Option<DayOfWeek>,
    pub difficulty: Option<Difficulty>,
    /// Estimated duration in minutes
    pub estimated_duration: Option<u32>,
    #[serde(default)]
    pub exercises: Vec<GeneratedExercise>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedExercise {
    /// ID of an existing template, when the webhook reused one
    pub exercise_template: Option<String>,
    /// Name of a suggested new template (paired with `is_new_template`)
    pub template_name: Option<String>,
    #[serde(default)]
    pub is_new_template: bool,
    pub sets: Option<u32>,
    pub target_reps: Option<u32>,
    pub target_time: Option<u32>,
    pub rest_time: Option<u32>,
    pub notes: Option<String>,
}

/// New template suggested by the webhook.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplateSuggestion {
    pub name: String,
    #[serde(rename = "type")]
    pub exercise_type: Option<String>,
}

impl WebhookClient {
    /// Create a new webhook client.
    ///
    /// `url` is optional: when unset, the send/regenerate flows fail with
    /// a configuration error while the rest of the service is unaffected.
    pub fn new(url: Option<String>, signing_key: Vec<u8>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
            signing_key,
        }
    }

    fn url(&self) -> Result<&str, AppError> {
        self.url
            .as_deref()
            .ok_or_else(|| AppError::Webhook("Webhook URL not configured".to_string()))
    }

    /// Create a short-lived bearer token for outbound webhook calls.
    fn service_token(&self) -> Result<String, AppError> {
        use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
        use std::time::{SystemTime, UNIX_EPOCH};

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
            .as_secs() as usize;

        let claims = ServiceClaims {
            iat: now,
            exp: now + SERVICE_TOKEN_TTL_SECS,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.signing_key),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Token signing failed: {}", e)))
    }

    /// Relay a raw preference payload and return the response verbatim.
    pub async fn send(&self, payload: &serde_json::Value) -> Result<serde_json::Value, AppError> {
        self.post_json(payload, SEND_TIMEOUT).await
    }

    /// Request a regenerated plan structure for an existing plan.
    pub async fn regenerate(
        &self,
        request: &RegenerationRequest,
    ) -> Result<GeneratedPlan, AppError> {
        self.post_json(request, REGENERATE_TIMEOUT).await
    }

    /// POST a JSON body with the service token and parse the JSON response.
    async fn post_json<B, T>(&self, body: &B, timeout: Duration) -> Result<T, AppError>
    where
        B: Serialize,
        T: for<'de> Deserialize<'de>,
    {
        let url = self.url()?;
        let token = self.service_token()?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Webhook(format!(
                        "Webhook request timed out after {}s",
                        timeout.as_secs()
                    ))
                } else {
                    AppError::Webhook(e.to_string())
                }
            })?;

        self.check_response_json(response).await
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Webhook(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Webhook(format!("Invalid webhook response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    #[test]
    fn test_service_token_is_signed_and_short_lived() {
        let key = b"test_jwt_key_32_bytes_minimum!!".to_vec();
        let client = WebhookClient::new(Some("http://example.invalid".to_string()), key.clone());

        let token = client.service_token().unwrap();
        let decoded = decode::<ServiceClaims>(
            &token,
            &DecodingKey::from_secret(&key),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();

        assert_eq!(
            decoded.claims.exp - decoded.claims.iat,
            SERVICE_TOKEN_TTL_SECS
        );
    }

    #[tokio::test]
    async fn test_unconfigured_url_fails_fast() {
        let client = WebhookClient::new(None, b"key".to_vec());
        let err = client.send(&serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, AppError::Webhook(_)));
    }

    #[test]
    fn test_generated_plan_parses_camel_case() {
        let plan: GeneratedPlan = serde_json::from_str(
            r#"{
                "description": "Updated plan",
                "workouts": [{
                    "name": "Leg Day",
                    "dayOfWeek": "Tuesday",
                    "exercises": [{
                        "templateName": "Goblet Squat",
                        "isNewTemplate": true,
                        "sets": 3,
                        "targetReps": 12
                    }]
                }],
                "newExerciseTemplates": [{"name": "Goblet Squat", "type": "reps"}]
            }"#,
        )
        .unwrap();

        assert_eq!(plan.workouts.len(), 1);
        assert_eq!(plan.new_exercise_templates.len(), 1);
        let exercise = &plan.workouts[0].exercises[0];
        assert!(exercise.is_new_template);
        assert_eq!(exercise.template_name.as_deref(), Some("Goblet Squat"));
    }
}
