//! User profile model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A signed-in team member. The provider account id is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub picture: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    /// Denormalized count of resources this user authored
    pub resources_added: i64,
    /// Sum of views over this user's resources
    pub total_views: i64,
    pub is_admin: bool,
    pub last_active: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Profile returned by an identity provider after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Stable account id at the provider
    pub provider_id: String,
    pub name: String,
    pub email: String,
    pub picture: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

/// Request body for toggling admin rights.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdminRequest {
    pub is_admin: bool,
}

/// Plain confirmation payload.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
