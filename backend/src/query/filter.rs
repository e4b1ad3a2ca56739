//! Category and free-text filtering.

use crate::models::Resource;

/// Category value that disables category filtering.
pub const ALL_CATEGORIES: &str = "all";

/// A category filter combined with a case-insensitive substring query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFilter {
    /// `None` matches every category
    category: Option<String>,
    /// Lowercased query; empty matches everything
    query: String,
}

impl ResourceFilter {
    /// Build a filter. An empty category or `"all"` disables category filtering.
    pub fn new(category: &str, query: &str) -> Self {
        let category = match category {
            "" | ALL_CATEGORIES => None,
            other => Some(other.to_string()),
        };
        Self {
            category,
            query: query.to_lowercase(),
        }
    }

    pub fn matches(&self, resource: &Resource) -> bool {
        self.matches_category(resource) && self.matches_query(resource)
    }

    fn matches_category(&self, resource: &Resource) -> bool {
        match &self.category {
            None => true,
            Some(category) => resource.resource_type.as_str() == category,
        }
    }

    fn matches_query(&self, resource: &Resource) -> bool {
        if self.query.is_empty() {
            return true;
        }
        let q = self.query.as_str();
        contains_ci(&resource.title, q)
            || contains_ci(&resource.description, q)
            || contains_ci(&resource.author, q)
            || resource.tags.iter().any(|tag| contains_ci(tag, q))
    }
}

fn contains_ci(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

/// Keep the resources matching `filter`, in their original order.
pub fn filter_resources(resources: &[Resource], filter: &ResourceFilter) -> Vec<Resource> {
    resources
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect()
}
