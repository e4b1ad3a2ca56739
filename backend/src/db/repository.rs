//! Database repository for CRUD operations.
//!
//! Uses prepared statements and transactions for data integrity.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    LikeResponse, NewResource, ProviderProfile, RecentResource, Resource, ResourceChanges,
    ResourceSnapshot, ResourceType, RevisionInfo, User,
};

const RESOURCE_COLUMNS: &str = "id, type, title, description, tags, url, author_id, author_name, views, created_at, updated_at";

const USER_COLUMNS: &str = "u.id, u.name, u.email, u.picture, u.given_name, u.family_name, u.resources_added, u.is_admin, u.last_active, u.created_at, \
     (SELECT COALESCE(SUM(r.views), 0) FROM resources r WHERE r.author_id = u.id) AS total_views";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID and return the new value.
    pub async fn increment_revision(&self) -> Result<i64, AppError> {
        let mut conn = self.pool.acquire().await?;
        bump_revision(&mut conn).await?;
        self.get_revision_id().await
    }

    // ==================== USER OPERATIONS ====================

    /// List all users, newest first.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let sql = format!(
            "SELECT {} FROM users u ORDER BY u.created_at DESC, u.rowid DESC",
            USER_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(user_from_row).collect())
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users u WHERE u.id = ?", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    /// Create or refresh the user behind a provider login.
    ///
    /// Profile fields are overwritten on every login. `promote` only ever grants admin.
    pub async fn upsert_provider_user(
        &self,
        profile: &ProviderProfile,
        promote: bool,
    ) -> Result<User, AppError> {
        let now = Utc::now();

        let existing = sqlx::query("SELECT id FROM users WHERE google_id = ?")
            .bind(&profile.provider_id)
            .fetch_optional(&self.pool)
            .await?;

        let id = match existing {
            Some(row) => {
                let id: String = row.get("id");
                sqlx::query(
                    "UPDATE users SET name = ?, email = ?, picture = ?, given_name = ?, family_name = ?, last_active = ?, \
                     is_admin = CASE WHEN ? = 1 THEN 1 ELSE is_admin END WHERE id = ?",
                )
                .bind(&profile.name)
                .bind(&profile.email)
                .bind(&profile.picture)
                .bind(&profile.given_name)
                .bind(&profile.family_name)
                .bind(now)
                .bind(promote as i32)
                .bind(&id)
                .execute(&self.pool)
                .await?;
                id
            }
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                sqlx::query(
                    "INSERT INTO users (id, google_id, name, email, picture, given_name, family_name, resources_added, is_admin, last_active, created_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?)",
                )
                .bind(&id)
                .bind(&profile.provider_id)
                .bind(&profile.name)
                .bind(&profile.email)
                .bind(&profile.picture)
                .bind(&profile.given_name)
                .bind(&profile.family_name)
                .bind(promote as i32)
                .bind(now)
                .bind(now)
                .execute(&self.pool)
                .await?;
                tracing::info!(user_id = %id, "Registered new user");
                id
            }
        };

        self.get_user(&id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("User {} vanished after upsert", id)))
    }

    /// Grant or revoke admin rights.
    pub async fn set_admin(&self, id: &str, is_admin: bool) -> Result<Option<User>, AppError> {
        let result = sqlx::query("UPDATE users SET is_admin = ? WHERE id = ?")
            .bind(is_admin as i32)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_user(id).await
    }

    /// Delete a user together with their resources and likes.
    ///
    /// Returns the ids of the removed resources.
    pub async fn delete_user(&self, id: &str) -> Result<Vec<String>, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        let resource_ids: Vec<String> = sqlx::query("SELECT id FROM resources WHERE author_id = ?")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(|row| row.get("id"))
            .collect();

        sqlx::query(
            "DELETE FROM resource_likes WHERE user_id = ? OR resource_id IN (SELECT id FROM resources WHERE author_id = ?)",
        )
        .bind(id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM resources WHERE author_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        bump_revision(&mut tx).await?;
        tx.commit().await?;

        Ok(resource_ids)
    }

    pub async fn count_users(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Users with at least one resource.
    pub async fn count_active_users(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users WHERE resources_added > 0")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    // ==================== RESOURCE OPERATIONS ====================

    /// List all resources, newest first.
    pub async fn list_resources(&self) -> Result<Vec<Resource>, AppError> {
        let mut conn = self.pool.acquire().await?;
        load_resources(&mut conn).await
    }

    /// The full resource list and the revision it belongs to, read in one transaction.
    pub async fn resource_snapshot(&self) -> Result<ResourceSnapshot, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&mut *tx)
            .await?;
        let revision_id: i64 = row.get("revision_id");
        let resources = load_resources(&mut tx).await?;

        tx.commit().await?;
        Ok(ResourceSnapshot {
            revision_id,
            resources,
        })
    }

    /// The `limit` newest resources.
    pub async fn recent_resources(&self, limit: i64) -> Result<Vec<Resource>, AppError> {
        let sql = format!(
            "SELECT {} FROM resources ORDER BY created_at DESC, rowid DESC LIMIT ?",
            RESOURCE_COLUMNS
        );
        let rows = sqlx::query(&sql).bind(limit).fetch_all(&self.pool).await?;

        let mut resources = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.get("id");
            let likes = self.likes_for(&id).await?;
            resources.push(resource_from_row(row, likes)?);
        }
        Ok(resources)
    }

    /// The `limit` newest resources of one author, in compact form.
    pub async fn recent_resources_by_author(
        &self,
        author_id: &str,
        limit: i64,
    ) -> Result<Vec<RecentResource>, AppError> {
        let rows = sqlx::query(
            "SELECT id, title, type, created_at FROM resources WHERE author_id = ? ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(author_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(RecentResource {
                    id: row.get("id"),
                    title: row.get("title"),
                    resource_type: parse_type(row.get("type"))?,
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }

    pub async fn count_resources(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM resources")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Sum of views over all resources.
    pub async fn total_views(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COALESCE(SUM(views), 0) AS n FROM resources")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Get a resource by ID.
    pub async fn get_resource(&self, id: &str) -> Result<Option<Resource>, AppError> {
        let sql = format!("SELECT {} FROM resources WHERE id = ?", RESOURCE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let likes = self.likes_for(id).await?;
                Ok(Some(resource_from_row(&row, likes)?))
            }
            None => Ok(None),
        }
    }

    /// Fetch a resource and count the view.
    pub async fn view_resource(&self, id: &str) -> Result<Option<Resource>, AppError> {
        let result = sqlx::query("UPDATE resources SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_resource(id).await
    }

    /// Overwrite a resource's view counter. Used when importing existing data.
    pub async fn set_views(&self, id: &str, views: i64) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE resources SET views = ? WHERE id = ?")
            .bind(views.max(0))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Resource {} not found", id)));
        }
        Ok(())
    }

    /// Store a new resource and bump the author's contribution count.
    pub async fn create_resource(
        &self,
        author: &User,
        resource: &NewResource,
    ) -> Result<Resource, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let tags_json = serde_json::to_string(&resource.tags)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO resources (id, type, title, description, tags, url, author_id, author_name, views, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(&id)
        .bind(resource.resource_type.as_str())
        .bind(&resource.title)
        .bind(&resource.description)
        .bind(&tags_json)
        .bind(&resource.url)
        .bind(&author.id)
        .bind(&author.name)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE users SET resources_added = resources_added + 1, last_active = ? WHERE id = ?",
        )
        .bind(now)
        .bind(&author.id)
        .execute(&mut *tx)
        .await?;

        bump_revision(&mut tx).await?;
        tx.commit().await?;

        Ok(Resource {
            id,
            resource_type: resource.resource_type,
            title: resource.title.clone(),
            description: resource.description.clone(),
            tags: resource.tags.clone(),
            url: resource.url.clone(),
            author: author.name.clone(),
            author_id: author.id.clone(),
            views: 0,
            likes: Vec::new(),
            likes_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update. Only the author may edit.
    pub async fn update_resource(
        &self,
        id: &str,
        editor_id: &str,
        changes: &ResourceChanges,
    ) -> Result<Resource, AppError> {
        let existing = self
            .get_resource(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Resource {} not found", id)))?;

        if existing.author_id != editor_id {
            return Err(AppError::Forbidden(
                "Not authorized to update this resource".to_string(),
            ));
        }

        let now = Utc::now();
        let updated = Resource {
            resource_type: changes.resource_type.unwrap_or(existing.resource_type),
            title: changes.title.clone().unwrap_or(existing.title.clone()),
            description: changes
                .description
                .clone()
                .unwrap_or(existing.description.clone()),
            tags: changes.tags.clone().unwrap_or(existing.tags.clone()),
            url: changes.url.clone().or(existing.url.clone()),
            updated_at: now,
            ..existing
        };
        let tags_json = serde_json::to_string(&updated.tags)?;

        sqlx::query(
            "UPDATE resources SET type = ?, title = ?, description = ?, tags = ?, url = ?, updated_at = ? WHERE id = ?",
        )
        .bind(updated.resource_type.as_str())
        .bind(&updated.title)
        .bind(&updated.description)
        .bind(&tags_json)
        .bind(&updated.url)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(updated)
    }

    /// Delete a resource. The author or an admin may delete.
    ///
    /// The author's contribution count drops by one, never below zero.
    pub async fn delete_resource(&self, id: &str, requester: &User) -> Result<Resource, AppError> {
        let existing = self
            .get_resource(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Resource {} not found", id)))?;

        if existing.author_id != requester.id && !requester.is_admin {
            return Err(AppError::Forbidden(
                "Not authorized to delete this resource".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM resource_likes WHERE resource_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Resource {} not found", id)));
        }

        sqlx::query(
            "UPDATE users SET resources_added = MAX(resources_added - 1, 0) WHERE id = ?",
        )
        .bind(&existing.author_id)
        .execute(&mut *tx)
        .await?;

        bump_revision(&mut tx).await?;
        tx.commit().await?;

        Ok(existing)
    }

    /// Record a like. Liking again is a no-op.
    pub async fn add_like(&self, resource_id: &str, user_id: &str) -> Result<LikeResponse, AppError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO resource_likes (resource_id, user_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(resource_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            self.increment_revision().await?;
        }

        Ok(LikeResponse {
            liked: true,
            likes_count: self.count_likes(resource_id).await?,
        })
    }

    /// Withdraw a like. Removing a missing like is a no-op.
    pub async fn remove_like(
        &self,
        resource_id: &str,
        user_id: &str,
    ) -> Result<LikeResponse, AppError> {
        let result = sqlx::query("DELETE FROM resource_likes WHERE resource_id = ? AND user_id = ?")
            .bind(resource_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            self.increment_revision().await?;
        }

        Ok(LikeResponse {
            liked: false,
            likes_count: self.count_likes(resource_id).await?,
        })
    }

    /// Like the resource if the user has not yet, otherwise withdraw the like.
    pub async fn toggle_like(
        &self,
        resource_id: &str,
        user_id: &str,
    ) -> Result<LikeResponse, AppError> {
        let exists = sqlx::query("SELECT 1 FROM resources WHERE id = ?")
            .bind(resource_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!(
                "Resource {} not found",
                resource_id
            )));
        }

        let liked = sqlx::query("SELECT 1 FROM resource_likes WHERE resource_id = ? AND user_id = ?")
            .bind(resource_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();

        if liked {
            self.remove_like(resource_id, user_id).await
        } else {
            self.add_like(resource_id, user_id).await
        }
    }

    async fn count_likes(&self, resource_id: &str) -> Result<usize, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM resource_likes WHERE resource_id = ?")
            .bind(resource_id)
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.get("n");
        Ok(n as usize)
    }

    async fn likes_for(&self, resource_id: &str) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query(
            "SELECT user_id FROM resource_likes WHERE resource_id = ? ORDER BY created_at, rowid",
        )
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|row| row.get("user_id")).collect())
    }
}

async fn load_resources(conn: &mut SqliteConnection) -> Result<Vec<Resource>, AppError> {
    let sql = format!(
        "SELECT {} FROM resources ORDER BY created_at DESC, rowid DESC",
        RESOURCE_COLUMNS
    );
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

    let like_rows =
        sqlx::query("SELECT resource_id, user_id FROM resource_likes ORDER BY created_at, rowid")
            .fetch_all(&mut *conn)
            .await?;
    let mut likes: HashMap<String, Vec<String>> = HashMap::new();
    for row in &like_rows {
        likes
            .entry(row.get("resource_id"))
            .or_default()
            .push(row.get("user_id"));
    }

    rows.iter()
        .map(|row| {
            let id: String = row.get("id");
            resource_from_row(row, likes.remove(&id).unwrap_or_default())
        })
        .collect()
}

async fn bump_revision(conn: &mut SqliteConnection) -> Result<(), AppError> {
    let now = Utc::now().to_rfc3339();
    sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
        .bind(&now)
        .execute(conn)
        .await?;
    Ok(())
}

// Helper functions for row conversion

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    let is_admin: i32 = row.get("is_admin");
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        picture: row.get("picture"),
        given_name: row.get("given_name"),
        family_name: row.get("family_name"),
        resources_added: row.get("resources_added"),
        total_views: row.get("total_views"),
        is_admin: is_admin != 0,
        last_active: row.get::<DateTime<Utc>, _>("last_active"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    }
}

fn resource_from_row(
    row: &sqlx::sqlite::SqliteRow,
    likes: Vec<String>,
) -> Result<Resource, AppError> {
    let tags: String = row.get("tags");
    Ok(Resource {
        id: row.get("id"),
        resource_type: parse_type(row.get("type"))?,
        title: row.get("title"),
        description: row.get("description"),
        tags: parse_json_array(&tags),
        url: row.get("url"),
        author: row.get("author_name"),
        author_id: row.get("author_id"),
        views: row.get("views"),
        likes_count: likes.len(),
        likes,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn parse_type(raw: String) -> Result<ResourceType, AppError> {
    ResourceType::parse(&raw)
        .ok_or_else(|| AppError::Internal(format!("Stored resource has unknown type '{}'", raw)))
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_else(|e| {
        tracing::warn!("Corrupt JSON array column {:?}, treating as empty: {}", s, e);
        Vec::new()
    })
}
