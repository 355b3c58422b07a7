// SPDX-License-Identifier: MIT

//! FitFlow: personal fitness tracking backend.
//!
//! This crate provides the REST API for exercise templates, daily
//! workout logs, AI-generated workout plans, and dashboard statistics.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::WebhookClient;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub webhook: WebhookClient,
}
