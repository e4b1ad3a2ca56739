//! Sample team and resources for demos and local development.

use super::Repository;
use crate::errors::AppError;
use crate::models::{NewResource, ProviderProfile, ResourceType};

struct SampleUser {
    provider_id: &'static str,
    given_name: &'static str,
    family_name: &'static str,
    email: &'static str,
    is_admin: bool,
}

struct SampleResource {
    /// Index into `SAMPLE_USERS`
    author: usize,
    resource_type: ResourceType,
    title: &'static str,
    description: &'static str,
    tags: &'static [&'static str],
    url: &'static str,
    views: i64,
}

const SAMPLE_USERS: [SampleUser; 2] = [
    SampleUser {
        provider_id: "sample-user-1",
        given_name: "Sarah",
        family_name: "Chen",
        email: "sarah.chen@company.com",
        is_admin: false,
    },
    SampleUser {
        provider_id: "sample-user-2",
        given_name: "Alex",
        family_name: "Johnson",
        email: "alex.johnson@company.com",
        is_admin: true,
    },
];

const SAMPLE_RESOURCES: [SampleResource; 4] = [
    SampleResource {
        author: 0,
        resource_type: ResourceType::UiFinding,
        title: "Micro-interactions in Mobile Apps",
        description: "A comprehensive study of micro-interactions that enhance user experience in mobile applications.",
        tags: &["mobile", "ux", "interactions"],
        url: "https://example.com/micro-interactions",
        views: 45,
    },
    SampleResource {
        author: 0,
        resource_type: ResourceType::Podcast,
        title: "Design Matters with Debbie Millman",
        description: "Weekly conversations with designers, artists, and creative professionals.",
        tags: &["design", "creativity", "interviews"],
        url: "https://example.com/design-matters",
        views: 32,
    },
    SampleResource {
        author: 1,
        resource_type: ResourceType::Book,
        title: "Atomic Design by Brad Frost",
        description: "A methodology for creating design systems that are both beautiful and functional.",
        tags: &["design-systems", "methodology", "frontend"],
        url: "https://example.com/atomic-design",
        views: 67,
    },
    SampleResource {
        author: 1,
        resource_type: ResourceType::Article,
        title: "The Future of Design Tools",
        description: "Exploring how AI and machine learning are reshaping the design industry.",
        tags: &["ai", "future", "tools"],
        url: "https://example.com/future-design-tools",
        views: 23,
    },
];

/// What a seeding run inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub resources: usize,
}

/// Load the sample team into an empty database.
///
/// Does nothing when any user or resource already exists.
pub async fn seed_sample_data(repo: &Repository) -> Result<SeedSummary, AppError> {
    if repo.count_users().await? > 0 || repo.count_resources().await? > 0 {
        tracing::info!("Database already has data, skipping sample seed");
        return Ok(SeedSummary::default());
    }

    let mut users = Vec::with_capacity(SAMPLE_USERS.len());
    for sample in &SAMPLE_USERS {
        let name = format!("{} {}", sample.given_name, sample.family_name);
        let profile = ProviderProfile {
            provider_id: sample.provider_id.to_string(),
            picture: format!(
                "https://ui-avatars.com/api/?name={}&background=333333&color=ffffff",
                urlencoding::encode(&name)
            ),
            name,
            email: sample.email.to_string(),
            given_name: Some(sample.given_name.to_string()),
            family_name: Some(sample.family_name.to_string()),
        };
        users.push(repo.upsert_provider_user(&profile, sample.is_admin).await?);
    }

    for sample in &SAMPLE_RESOURCES {
        let author = &users[sample.author];
        let resource = NewResource {
            resource_type: sample.resource_type,
            title: sample.title.to_string(),
            description: sample.description.to_string(),
            tags: sample.tags.iter().map(|t| t.to_string()).collect(),
            url: Some(sample.url.to_string()),
        };
        let created = repo.create_resource(author, &resource).await?;
        repo.set_views(&created.id, sample.views).await?;
    }

    let summary = SeedSummary {
        users: users.len(),
        resources: SAMPLE_RESOURCES.len(),
    };
    tracing::info!(
        users = summary.users,
        resources = summary.resources,
        "Seeded sample data"
    );
    Ok(summary)
}
