//! Full-text search endpoint.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::Resource;
use crate::search::SearchHits;
use crate::AppState;

/// Largest page a caller may request.
const MAX_SEARCH_LIMIT: usize = 100;
/// Deepest offset a caller may page to.
const MAX_SEARCH_OFFSET: usize = MAX_SEARCH_LIMIT * 100;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

impl SearchQuery {
    /// The page window to fetch, with `limit` capped and `offset` bounded.
    fn window(&self) -> Result<(usize, usize), AppError> {
        if self.offset > MAX_SEARCH_OFFSET {
            return Err(AppError::BadRequest(format!(
                "offset must be at most {}",
                MAX_SEARCH_OFFSET
            )));
        }
        Ok((self.limit.min(MAX_SEARCH_LIMIT), self.offset))
    }
}

/// Ranked hits for one page, plus the overall match count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    /// Matches across all pages
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub resource: Resource,
    pub score: f32,
}

/// GET /api/search - Ranked full-text search over resources.
pub async fn search_resources(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match run_search(&state, &params).await {
        Ok(response) => success(response, revision_id),
        Err(e) => error(e, revision_id),
    }
}

async fn run_search(state: &AppState, params: &SearchQuery) -> Result<SearchResponse, AppError> {
    let (limit, offset) = params.window()?;
    let SearchHits { total, hits } = state.search.search(&params.q, limit, offset)?;

    let mut results = Vec::with_capacity(hits.len());
    for hit in hits {
        // The index can briefly trail a delete.
        match state.repo.get_resource(&hit.resource_id).await? {
            Some(resource) => results.push(SearchResultItem {
                resource,
                score: hit.score,
            }),
            None => tracing::debug!(resource_id = %hit.resource_id, "Skipping stale search hit"),
        }
    }

    Ok(SearchResponse {
        results,
        total,
        limit,
        offset,
    })
}
