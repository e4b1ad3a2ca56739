//! Admin API endpoints. Every handler requires an admin caller.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;

use super::resources::publish_change;
use super::{error, success, ApiResult};
use crate::auth::AdminUser;
use crate::errors::AppError;
use crate::models::{Contributor, DashboardStats, MessageResponse, UpdateAdminRequest, User};
use crate::query::aggregate_contributors;
use crate::AppState;

/// Resources shown in the dashboard's "recent" list.
const RECENT_RESOURCES: i64 = 5;
/// Resources shown per contributor card.
const RECENT_PER_CONTRIBUTOR: i64 = 3;

/// GET /api/admin/users - List all users.
pub async fn list_users(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Vec<User>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_users().await {
        Ok(users) => success(users, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/admin/users/:id/admin - Grant or revoke admin rights.
pub async fn set_user_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AdminUser(admin): AdminUser,
    Json(request): Json<UpdateAdminRequest>,
) -> ApiResult<User> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.set_admin(&id, request.is_admin).await {
        Ok(Some(user)) => {
            tracing::info!(user_id = %id, is_admin = request.is_admin, changed_by = %admin.id, "Admin flag changed");
            success(user, revision_id)
        }
        Ok(None) => error(
            AppError::NotFound(format!("User {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/admin/users/:id - Delete a user and all of their resources.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AdminUser(admin): AdminUser,
) -> ApiResult<MessageResponse> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_user(&id).await {
        Ok(resource_ids) => {
            tracing::info!(user_id = %id, resources = resource_ids.len(), deleted_by = %admin.id, "User deleted");
            if let Err(e) = state.search.remove_resources(&resource_ids).await {
                tracing::warn!("Failed to remove user's resources from index: {}", e);
            }
            publish_change(&state).await;

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(
                MessageResponse::new("User and their resources deleted successfully"),
                new_revision,
            )
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/admin/stats - Headline dashboard numbers.
pub async fn get_stats(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<DashboardStats> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match load_stats(&state).await {
        Ok(stats) => success(stats, revision_id),
        Err(e) => error(e, revision_id),
    }
}

async fn load_stats(state: &AppState) -> Result<DashboardStats, AppError> {
    Ok(DashboardStats {
        total_users: state.repo.count_users().await?,
        active_users: state.repo.count_active_users().await?,
        total_resources: state.repo.count_resources().await?,
        total_views: state.repo.total_views().await?,
        recent_resources: state.repo.recent_resources(RECENT_RESOURCES).await?,
    })
}

/// GET /api/admin/contributors - Per-author activity, most prolific first.
pub async fn list_contributors(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Vec<Contributor>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match load_contributors(&state).await {
        Ok(contributors) => success(contributors, revision_id),
        Err(e) => error(e, revision_id),
    }
}

async fn load_contributors(state: &AppState) -> Result<Vec<Contributor>, AppError> {
    let resources = state.repo.list_resources().await?;
    let stats = aggregate_contributors(&resources, Utc::now());

    let mut contributors = Vec::with_capacity(stats.len());
    for entry in stats {
        let profile = state.repo.get_user(&entry.author_id).await?;
        let recent_resources = state
            .repo
            .recent_resources_by_author(&entry.author_id, RECENT_PER_CONTRIBUTOR)
            .await?;

        contributors.push(Contributor {
            name: profile
                .as_ref()
                .map(|u| u.name.clone())
                .unwrap_or(entry.author_name),
            email: profile.as_ref().map(|u| u.email.clone()),
            picture: profile.as_ref().map(|u| u.picture.clone()),
            is_admin: profile.as_ref().is_some_and(|u| u.is_admin),
            id: entry.author_id,
            resources_added: entry.resources_added,
            total_views: entry.total_views,
            last_active: entry.last_active_days,
            recent_resources,
        });
    }
    Ok(contributors)
}
