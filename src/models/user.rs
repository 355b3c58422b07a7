//! User model for storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User account stored in Firestore.
///
/// The password hash is part of the stored document only; API responses
/// use dedicated DTOs that never carry it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Document ID (uuid)
    pub id: String,
    /// Display name
    pub username: String,
    /// Email address (unique per account)
    pub email: String,
    /// Bcrypt hash of the password
    pub password_hash: String,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}
