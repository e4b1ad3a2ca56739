//! Change-detection models.

use serde::{Deserialize, Serialize};

use super::Resource;

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}

/// The full resource list as of one revision, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshot {
    pub revision_id: i64,
    pub resources: Vec<Resource>,
}
