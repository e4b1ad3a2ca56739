//! Resource model matching the frontend resource card shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Category of a shared resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    UiFinding,
    Podcast,
    Book,
    Article,
    Video,
    Tool,
    Inspiration,
    QuickTip,
}

impl ResourceType {
    pub const ALL: [ResourceType; 8] = [
        ResourceType::UiFinding,
        ResourceType::Podcast,
        ResourceType::Book,
        ResourceType::Article,
        ResourceType::Video,
        ResourceType::Tool,
        ResourceType::Inspiration,
        ResourceType::QuickTip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::UiFinding => "ui-finding",
            ResourceType::Podcast => "podcast",
            ResourceType::Book => "book",
            ResourceType::Article => "article",
            ResourceType::Video => "video",
            ResourceType::Tool => "tool",
            ResourceType::Inspiration => "inspiration",
            ResourceType::QuickTip => "quick-tip",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// A shared link, article, or tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Display name of the author at creation time
    pub author: String,
    pub author_id: String,
    pub views: i64,
    /// Ids of users who liked this resource
    pub likes: Vec<String>,
    pub likes_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compact resource listing used on contributor cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentResource {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub created_at: DateTime<Utc>,
}

/// The fields a person fills in before a resource can be submitted.
#[derive(Debug, Clone, Copy)]
pub struct ResourceDraft<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub author: &'a str,
}

impl ResourceDraft<'_> {
    /// Submission is allowed only once title, description and author are all filled in.
    pub fn is_submittable(&self) -> bool {
        [self.title, self.description, self.author]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// Split comma-separated tag input into trimmed, non-empty tags.
pub fn parse_tag_input(input: &str) -> Vec<String> {
    clean_tags(input.split(','))
}

fn clean_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    tags.into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Tags as sent by a form: either a list or one comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagInput {
    List(Vec<String>),
    Text(String),
}

impl Default for TagInput {
    fn default() -> Self {
        TagInput::List(Vec::new())
    }
}

impl TagInput {
    /// Trimmed, non-empty tags in input order.
    pub fn into_tags(self) -> Vec<String> {
        match self {
            TagInput::List(tags) => clean_tags(tags.iter().map(String::as_str)),
            TagInput::Text(text) => parse_tag_input(&text),
        }
    }

    /// Tags for a partial update. Blank text means "leave the tags alone";
    /// an explicit list, even an empty one, replaces them.
    pub fn into_changed_tags(self) -> Option<Vec<String>> {
        match self {
            TagInput::Text(text) if text.trim().is_empty() => None,
            other => Some(other.into_tags()),
        }
    }
}

/// Request body for creating a new resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResourceRequest {
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: TagInput,
    #[serde(default)]
    pub url: Option<String>,
}

/// A validated resource ready to be stored.
#[derive(Debug, Clone)]
pub struct NewResource {
    pub resource_type: ResourceType,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub url: Option<String>,
}

impl CreateResourceRequest {
    /// Validate the request on behalf of `author`.
    pub fn validate(self, author: &str) -> Result<NewResource, AppError> {
        let resource_type = ResourceType::parse(&self.resource_type).ok_or_else(|| {
            AppError::Validation(format!("Unknown resource type '{}'", self.resource_type))
        })?;

        let draft = ResourceDraft {
            title: &self.title,
            description: &self.description,
            author,
        };
        if !draft.is_submittable() {
            return Err(AppError::Validation(
                "Title, description and author are required".to_string(),
            ));
        }

        Ok(NewResource {
            resource_type,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            tags: self.tags.into_tags(),
            url: non_blank(self.url),
        })
    }
}

/// Request body for updating an existing resource. Absent or blank fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceRequest {
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<TagInput>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Validated partial update.
#[derive(Debug, Clone, Default)]
pub struct ResourceChanges {
    pub resource_type: Option<ResourceType>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub url: Option<String>,
}

impl UpdateResourceRequest {
    pub fn validate(self) -> Result<ResourceChanges, AppError> {
        let resource_type = match non_blank(self.resource_type) {
            Some(raw) => Some(ResourceType::parse(&raw).ok_or_else(|| {
                AppError::Validation(format!("Unknown resource type '{}'", raw))
            })?),
            None => None,
        };

        Ok(ResourceChanges {
            resource_type,
            title: non_blank(self.title),
            description: non_blank(self.description),
            tags: self.tags.and_then(TagInput::into_changed_tags),
            url: non_blank(self.url),
        })
    }
}

/// Query parameters for listing resources.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResourcesQuery {
    /// Category, or "all"
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    10
}

/// One page of the filtered resource list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePage {
    pub resources: Vec<Resource>,
    pub total: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

/// Outcome of toggling a like.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub liked: bool,
    pub likes_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(resource_type: &str, title: &str, description: &str) -> CreateResourceRequest {
        CreateResourceRequest {
            resource_type: resource_type.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            tags: TagInput::List(vec![
                " figma ".to_string(),
                "".to_string(),
                "Color".to_string(),
            ]),
            url: Some("  ".to_string()),
        }
    }

    #[test]
    fn test_resource_type_round_trip_names() {
        for t in ResourceType::ALL {
            assert_eq!(ResourceType::parse(t.as_str()), Some(t));
            let json = serde_json::to_value(t).unwrap();
            assert_eq!(json, t.as_str());
        }
        assert_eq!(ResourceType::parse("ui-findings"), None);
        assert_eq!(ResourceType::parse("Podcast"), None);
    }

    #[test]
    fn test_draft_all_empty() {
        let draft = ResourceDraft {
            title: "",
            description: "",
            author: "",
        };
        assert!(!draft.is_submittable());
    }

    #[test]
    fn test_draft_partially_filled() {
        let cases = [
            ("Title", "", ""),
            ("Title", "Description", ""),
            ("", "Description", "Author"),
            ("Title", "", "Author"),
            ("Title", "   ", "Author"),
        ];
        for (title, description, author) in cases {
            let draft = ResourceDraft {
                title,
                description,
                author,
            };
            assert!(!draft.is_submittable(), "{:?}", draft);
        }
    }

    #[test]
    fn test_draft_fully_filled() {
        let draft = ResourceDraft {
            title: "Refactoring UI",
            description: "Practical design tips",
            author: "Design Team",
        };
        assert!(draft.is_submittable());
    }

    #[test]
    fn test_parse_tag_input() {
        assert_eq!(
            parse_tag_input("design, ux,, color ,"),
            vec!["design", "ux", "color"]
        );
        assert!(parse_tag_input("").is_empty());
        assert!(parse_tag_input(" , ").is_empty());
    }

    #[test]
    fn test_create_request_validation() {
        let new = create_request("book", "  Refactoring UI ", "Tips")
            .validate("Sarah Chen")
            .unwrap();
        assert_eq!(new.resource_type, ResourceType::Book);
        assert_eq!(new.title, "Refactoring UI");
        assert_eq!(new.tags, vec!["figma", "Color"]);
        assert!(new.url.is_none());
    }

    #[test]
    fn test_tags_accept_comma_separated_text() {
        let request: CreateResourceRequest = serde_json::from_value(serde_json::json!({
            "type": "tool",
            "title": "Figma",
            "description": "Design tool",
            "tags": "design, prototyping,"
        }))
        .unwrap();
        let new = request.validate("Alex").unwrap();
        assert_eq!(new.tags, vec!["design", "prototyping"]);
    }

    #[test]
    fn test_create_request_rejects_unknown_type() {
        let err = create_request("movie", "Title", "Desc")
            .validate("Sarah")
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_create_request_rejects_blank_fields() {
        let err = create_request("book", "Title", " ").validate("Sarah").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = create_request("book", "Title", "Desc").validate("").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_update_request_blank_fields_are_ignored() {
        let changes = UpdateResourceRequest {
            resource_type: Some("".to_string()),
            title: Some("  ".to_string()),
            description: Some("New description".to_string()),
            tags: Some(TagInput::Text("".to_string())),
            url: Some("".to_string()),
        }
        .validate()
        .unwrap();

        assert!(changes.resource_type.is_none());
        assert!(changes.title.is_none());
        assert_eq!(changes.description.as_deref(), Some("New description"));
        assert!(changes.tags.is_none());
        assert!(changes.url.is_none());
    }

    #[test]
    fn test_update_request_tag_forms() {
        let update = |tags: serde_json::Value| {
            serde_json::from_value::<UpdateResourceRequest>(serde_json::json!({ "tags": tags }))
                .unwrap()
                .validate()
                .unwrap()
                .tags
        };

        assert_eq!(update(serde_json::json!("")), None);
        assert_eq!(update(serde_json::json!("  ")), None);
        assert_eq!(
            update(serde_json::json!("ux, motion")),
            Some(vec!["ux".to_string(), "motion".to_string()])
        );
        assert_eq!(update(serde_json::json!([])), Some(Vec::new()));
        assert_eq!(update(serde_json::json!(["grid"])), Some(vec!["grid".to_string()]));
    }
}
