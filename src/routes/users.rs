// SPDX-License-Identifier: MIT

//! User registration and sign-in routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::create_jwt;
use crate::models::User;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/user/create", post(create_user))
        .route("/api/user/signin", post(sign_in))
}

#[derive(Deserialize)]
struct CreateUserRequest {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize)]
struct SignInRequest {
    email: Option<String>,
    password: Option<String>,
}

/// User info returned to clients; never carries the password hash.
#[derive(Serialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserView,
}

/// Register a new account and return a session token.
async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let (username, email, password) = match (body.username, body.email, body.password) {
        (Some(u), Some(e), Some(p)) if !u.trim().is_empty() && !e.trim().is_empty() && !p.is_empty() => {
            (u.trim().to_string(), e.trim().to_string(), p)
        }
        _ => {
            return Err(AppError::BadRequest(
                "username, email and password are required".to_string(),
            ))
        }
    };

    if state.db.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?;

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username,
        email,
        password_hash,
        created_at: chrono::Utc::now(),
    };

    state.db.create_user(&user).await?;

    tracing::info!(user_id = %user.id, created_at = %format_utc_rfc3339(user.created_at), "User registered");

    let token = create_jwt(&user.id, &state.config.jwt_signing_key)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserView {
                id: user.id,
                username: user.username,
                email: user.email,
            },
        }),
    ))
}

/// Exchange email/password for a session token.
async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignInRequest>,
) -> Result<Json<AuthResponse>> {
    let (email, password) = match (body.email, body.password) {
        (Some(e), Some(p)) if !e.trim().is_empty() && !p.is_empty() => (e.trim().to_string(), p),
        _ => {
            return Err(AppError::BadRequest(
                "email and password are required".to_string(),
            ))
        }
    };

    let user = state
        .db
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let valid = bcrypt::verify(&password, &user.password_hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password verification failed: {}", e)))?;

    if !valid {
        return Err(AppError::BadRequest("Invalid credentials".to_string()));
    }

    let token = create_jwt(&user.id, &state.config.jwt_signing_key)?;

    tracing::info!(user_id = %user.id, "User signed in");

    Ok(Json(AuthResponse {
        token,
        user: UserView {
            id: user.id,
            username: user.username,
            email: user.email,
        },
    }))
}
