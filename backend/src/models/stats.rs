//! Admin dashboard models.

use serde::Serialize;

use super::{RecentResource, Resource};

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    /// Users with at least one resource
    pub active_users: i64,
    pub total_resources: i64,
    pub total_views: i64,
    pub recent_resources: Vec<Resource>,
}

/// A contributor card: aggregated activity joined with the author's profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub is_admin: bool,
    pub resources_added: usize,
    pub total_views: i64,
    /// Days since the most recent contribution
    pub last_active: i64,
    pub recent_resources: Vec<RecentResource>,
}
