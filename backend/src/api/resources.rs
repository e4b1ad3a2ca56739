//! Resource API endpoints.

use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream, StreamExt};

use super::{created, error, success, ApiResult};
use crate::auth::AuthUser;
use crate::errors::{AppError, AppErrorWithRevision};
use crate::models::{
    CreateResourceRequest, LikeResponse, ListResourcesQuery, MessageResponse, Resource,
    ResourcePage, ResourceSnapshot, RevisionInfo, UpdateResourceRequest,
};
use crate::query::{filter_resources, ResourceFilter, ALL_CATEGORIES};
use crate::AppState;

/// Maximum page size for resource listings.
const MAX_PAGE_SIZE: usize = 100;

/// GET /api/resources - List resources, filtered by category and search text.
pub async fn list_resources(
    State(state): State<AppState>,
    Query(params): Query<ListResourcesQuery>,
) -> ApiResult<ResourcePage> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let resources = match state.repo.list_resources().await {
        Ok(resources) => resources,
        Err(e) => return error(e, revision_id),
    };

    let filter = ResourceFilter::new(
        params.resource_type.as_deref().unwrap_or(ALL_CATEGORIES),
        params.search.as_deref().unwrap_or(""),
    );
    let matching = filter_resources(&resources, &filter);

    success(paginate(matching, params.page, params.limit), revision_id)
}

/// Slice one page out of `resources`. Pages are 1-based.
pub fn paginate(resources: Vec<Resource>, page: usize, limit: usize) -> ResourcePage {
    let limit = limit.clamp(1, MAX_PAGE_SIZE);
    let page = page.max(1);
    let total = resources.len();

    let resources = resources
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    ResourcePage {
        resources,
        total,
        total_pages: total.div_ceil(limit),
        current_page: page,
    }
}

/// GET /api/resources/revision - Current revision, for cheap change polling.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    match state.repo.get_revision_info().await {
        Ok(info) => {
            let revision_id = info.revision_id;
            success(info, revision_id)
        }
        Err(e) => error(e, 0),
    }
}

/// GET /api/resources/stream - Server-sent events carrying the full list after every change.
pub async fn stream_resources(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppErrorWithRevision> {
    // Subscribe before loading so no change between the two is missed.
    let rx = state.feed.subscribe();
    let initial = state
        .repo
        .resource_snapshot()
        .await
        .map_err(|e| e.with_revision(0))?;
    let last_sent = initial.revision_id;

    // The feed holds only the newest snapshot, so a slow client jumps straight to it.
    let updates = stream::unfold((rx, last_sent), |(mut rx, mut last_sent)| async move {
        loop {
            if rx.changed().await.is_err() {
                return None;
            }
            let latest = rx.borrow_and_update().clone();
            match latest {
                Some(snapshot) if snapshot.revision_id > last_sent => {
                    last_sent = snapshot.revision_id;
                    return Some((snapshot_event(&snapshot), (rx, last_sent)));
                }
                _ => continue,
            }
        }
    });

    let events = stream::once(async move { snapshot_event(&initial) }).chain(updates);

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn snapshot_event(snapshot: &ResourceSnapshot) -> Result<Event, Infallible> {
    let event = Event::default()
        .event("resources")
        .id(snapshot.revision_id.to_string());
    Ok(match event.json_data(snapshot) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!("Failed to encode snapshot: {}", e);
            Event::default().event("error").data("snapshot encoding failed")
        }
    })
}

/// GET /api/resources/:id - Get a single resource, counting the view.
pub async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Resource> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.view_resource(&id).await {
        Ok(Some(resource)) => success(resource, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Resource {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/resources - Create a new resource authored by the caller.
pub async fn create_resource(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateResourceRequest>,
) -> ApiResult<Resource> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let new_resource = match request.validate(&user.name) {
        Ok(new_resource) => new_resource,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.create_resource(&user, &new_resource).await {
        Ok(resource) => {
            tracing::info!(resource_id = %resource.id, author_id = %user.id, "Resource created");
            if let Err(e) = state.search.index_resource(&resource).await {
                tracing::warn!("Failed to index resource: {}", e);
            }
            publish_change(&state).await;

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            created(resource, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/resources/:id - Update a resource. Author only.
pub async fn update_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AuthUser(user): AuthUser,
    Json(request): Json<UpdateResourceRequest>,
) -> ApiResult<Resource> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let changes = match request.validate() {
        Ok(changes) => changes,
        Err(e) => return error(e, revision_id),
    };

    match state.repo.update_resource(&id, &user.id, &changes).await {
        Ok(resource) => {
            if let Err(e) = state.search.index_resource(&resource).await {
                tracing::warn!("Failed to re-index resource: {}", e);
            }
            publish_change(&state).await;

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(resource, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/resources/:id - Delete a resource. Author or admin.
pub async fn delete_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AuthUser(user): AuthUser,
) -> ApiResult<MessageResponse> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_resource(&id, &user).await {
        Ok(resource) => {
            tracing::info!(resource_id = %resource.id, deleted_by = %user.id, "Resource deleted");
            if let Err(e) = state.search.remove_resources(&[resource.id]).await {
                tracing::warn!("Failed to remove resource from index: {}", e);
            }
            publish_change(&state).await;

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(
                MessageResponse::new("Resource deleted successfully"),
                new_revision,
            )
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/resources/:id/like - Like or unlike a resource.
pub async fn toggle_like(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AuthUser(user): AuthUser,
) -> ApiResult<LikeResponse> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.toggle_like(&id, &user.id).await {
        Ok(outcome) => {
            publish_change(&state).await;

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(outcome, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// Push the new resource list to live subscribers.
pub(crate) async fn publish_change(state: &AppState) {
    if let Err(e) = state.feed.publish(&state.repo).await {
        tracing::warn!("Failed to publish resource snapshot: {}", e);
    }
}
