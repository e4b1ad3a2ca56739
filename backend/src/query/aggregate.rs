//! Per-author contribution statistics.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::Resource;

/// Activity of one author, derived from their resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributorStats {
    pub author_id: String,
    pub author_name: String,
    pub resources_added: usize,
    pub total_views: i64,
    /// Whole days since the author's most recent resource
    pub last_active_days: i64,
}

/// Whole days elapsed between `then` and `now`, clamped at zero.
pub fn days_since(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - then).num_days().max(0)
}

/// Group resources by author id.
///
/// Ordered by resource count (descending), then name, then id. Authors without
/// resources cannot appear.
pub fn aggregate_contributors(resources: &[Resource], now: DateTime<Utc>) -> Vec<ContributorStats> {
    let mut by_author: HashMap<&str, ContributorStats> = HashMap::new();

    for resource in resources {
        let days = days_since(resource.created_at, now);
        by_author
            .entry(resource.author_id.as_str())
            .and_modify(|stats| {
                stats.resources_added += 1;
                stats.total_views += resource.views;
                stats.last_active_days = stats.last_active_days.min(days);
            })
            .or_insert_with(|| ContributorStats {
                author_id: resource.author_id.clone(),
                author_name: resource.author.clone(),
                resources_added: 1,
                total_views: resource.views,
                last_active_days: days,
            });
    }

    let mut contributors: Vec<ContributorStats> = by_author.into_values().collect();
    contributors.sort_by(|a, b| {
        b.resources_added
            .cmp(&a.resources_added)
            .then_with(|| a.author_name.cmp(&b.author_name))
            .then_with(|| a.author_id.cmp(&b.author_id))
    });
    contributors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceType;
    use chrono::Duration;

    fn resource(author_id: &str, author: &str, views: i64, created_at: DateTime<Utc>) -> Resource {
        Resource {
            id: uuid::Uuid::new_v4().to_string(),
            resource_type: ResourceType::Article,
            title: "Title".to_string(),
            description: "Description".to_string(),
            tags: Vec::new(),
            url: None,
            author: author.to_string(),
            author_id: author_id.to_string(),
            views,
            likes: Vec::new(),
            likes_count: 0,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_same_author_is_merged() {
        let now = Utc::now();
        let list = vec![resource("x", "X", 5, now), resource("x", "X", 3, now)];
        let stats = aggregate_contributors(&list, now);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].author_name, "X");
        assert_eq!(stats[0].resources_added, 2);
        assert_eq!(stats[0].total_views, 8);
    }

    #[test]
    fn test_most_recent_activity_wins() {
        let now = Utc::now();
        let list = vec![
            resource("x", "X", 0, now - Duration::days(10)),
            resource("x", "X", 0, now - Duration::days(2) - Duration::hours(5)),
            resource("x", "X", 0, now - Duration::days(30)),
        ];
        let stats = aggregate_contributors(&list, now);
        assert_eq!(stats[0].last_active_days, 2);
    }

    #[test]
    fn test_ordering_and_empty_input() {
        let now = Utc::now();
        assert!(aggregate_contributors(&[], now).is_empty());

        let list = vec![
            resource("b", "Bea", 1, now),
            resource("a", "Ann", 1, now),
            resource("c", "Cal", 1, now),
            resource("c", "Cal", 1, now),
        ];
        let names: Vec<String> = aggregate_contributors(&list, now)
            .into_iter()
            .map(|s| s.author_name)
            .collect();
        assert_eq!(names, vec!["Cal", "Ann", "Bea"]);
    }

    #[test]
    fn test_days_since_is_never_negative() {
        let now = Utc::now();
        assert_eq!(days_since(now + Duration::days(3), now), 0);
        assert_eq!(days_since(now - Duration::hours(47), now), 1);
    }
}
