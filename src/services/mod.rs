// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod dashboard;
pub mod plan_generator;
pub mod webhook;

pub use webhook::WebhookClient;
