//! Tantivy-based search index module.
//!
//! Provides ranked full-text search over resources with field boosting.

use std::path::Path;
use std::sync::Arc;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, QueryParser};
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::Resource;

const BOOST_TITLE: f32 = 10.0;
const BOOST_TAGS: f32 = 6.0;
const BOOST_DESCRIPTION: f32 = 4.0;
const BOOST_AUTHOR: f32 = 2.0;

/// Search result with resource id and relevance score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub resource_id: String,
    pub score: f32,
}

/// One page of search hits.
#[derive(Debug, Clone, Default)]
pub struct SearchHits {
    /// Number of matching documents across all pages
    pub total: usize,
    pub hits: Vec<SearchResult>,
}

/// Search index schema fields.
struct SearchFields {
    resource_id: Field,
    title: Field,
    description: Field,
    tags: Field,
    author: Field,
}

/// Tantivy search index for resources.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let mut schema_builder = Schema::builder();
        let resource_id = schema_builder.add_text_field("resource_id", STRING | STORED);
        let title = schema_builder.add_text_field("title", TEXT);
        let description = schema_builder.add_text_field("description", TEXT);
        let tags = schema_builder.add_text_field("tags", TEXT);
        let author = schema_builder.add_text_field("author", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            resource_id,
            title,
            description,
            tags,
            author,
        };

        // Try to open existing index or create new one
        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Rebuild the entire index from resources.
    pub async fn rebuild(&self, resources: &[Resource]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_all_documents()?;
        for resource in resources {
            writer.add_document(self.create_document(resource))?;
        }
        writer.commit()?;

        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} resources", resources.len());
        Ok(())
    }

    /// Index a single resource, replacing any previous version.
    pub async fn index_resource(&self, resource: &Resource) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_term(self.id_term(&resource.id));
        writer.add_document(self.create_document(resource))?;
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Remove resources from the index.
    pub async fn remove_resources(&self, resource_ids: &[String]) -> Result<(), AppError> {
        if resource_ids.is_empty() {
            return Ok(());
        }
        let mut writer = self.writer.write().await;

        for id in resource_ids {
            writer.delete_term(self.id_term(id));
        }
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Search for resources matching the query, best match first.
    ///
    /// `total` counts every matching document, not just the returned page.
    pub fn search(
        &self,
        query_str: &str,
        limit: usize,
        offset: usize,
    ) -> Result<SearchHits, AppError> {
        if query_str.trim().is_empty() {
            return Ok(SearchHits::default());
        }

        let query = self.boosted_query(query_str)?;
        let searcher = self.reader.searcher();

        // TopDocs panics on a zero limit.
        let window = limit.saturating_add(offset).max(1);
        let (top_docs, total) = searcher
            .search(&query, &(TopDocs::with_limit(window), Count))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let hits = top_docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|(score, address)| {
                let doc: TantivyDocument = searcher.doc(address).ok()?;
                let resource_id = doc.get_first(self.fields.resource_id)?.as_str()?;
                Some(SearchResult {
                    resource_id: resource_id.to_string(),
                    score,
                })
            })
            .collect();

        Ok(SearchHits { total, hits })
    }

    /// One boosted clause per field, any of which may match.
    fn boosted_query(&self, query_str: &str) -> Result<BooleanQuery, AppError> {
        let boosts = [
            (self.fields.title, BOOST_TITLE),
            (self.fields.tags, BOOST_TAGS),
            (self.fields.description, BOOST_DESCRIPTION),
            (self.fields.author, BOOST_AUTHOR),
        ];

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::with_capacity(boosts.len());
        for (field, boost) in boosts {
            let parsed = QueryParser::for_index(&self.index, vec![field])
                .parse_query(query_str)
                .map_err(|e| AppError::BadRequest(format!("Invalid search query: {}", e)))?;
            clauses.push((Occur::Should, Box::new(BoostQuery::new(parsed, boost))));
        }
        Ok(BooleanQuery::new(clauses))
    }

    fn id_term(&self, resource_id: &str) -> Term {
        Term::from_field_text(self.fields.resource_id, resource_id)
    }

    fn create_document(&self, resource: &Resource) -> TantivyDocument {
        doc!(
            self.fields.resource_id => resource.id.clone(),
            self.fields.title => resource.title.clone(),
            self.fields.description => resource.description.clone(),
            self.fields.tags => resource.tags.join(" "),
            self.fields.author => resource.author.clone()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceType;
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_resource(id: &str, title: &str, description: &str, tags: &[&str]) -> Resource {
        let now = Utc::now();
        Resource {
            id: id.to_string(),
            resource_type: ResourceType::Article,
            title: title.to_string(),
            description: description.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            url: None,
            author: "Alex Johnson".to_string(),
            author_id: "user-1".to_string(),
            views: 0,
            likes: Vec::new(),
            likes_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_search_index_creation() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let resources = vec![
            create_test_resource("1", "Color Theory", "Picking palettes", &["color"]),
            create_test_resource("2", "Typography Basics", "Choosing fonts", &["type"]),
        ];

        index.rebuild(&resources).await.unwrap();

        let results = index.search("palettes", 10, 0).unwrap();
        assert_eq!(results.total, 1);
        assert_eq!(results.hits[0].resource_id, "1");
    }

    #[tokio::test]
    async fn test_title_outranks_description() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let resources = vec![
            create_test_resource("1", "Notes", "A short note on grids", &[]),
            create_test_resource("2", "Grids", "Layout systems", &[]),
        ];
        index.rebuild(&resources).await.unwrap();

        let results = index.search("grids", 10, 0).unwrap();
        assert_eq!(results.hits.len(), 2);
        assert_eq!(results.hits[0].resource_id, "2");
    }

    #[tokio::test]
    async fn test_reindex_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let mut resource = create_test_resource("1", "Motion Design", "Animations", &[]);
        index.index_resource(&resource).await.unwrap();
        assert_eq!(index.search("motion", 10, 0).unwrap().total, 1);

        resource.title = "Micro Interactions".to_string();
        index.index_resource(&resource).await.unwrap();
        assert_eq!(index.search("motion", 10, 0).unwrap().total, 0);
        assert_eq!(index.search("interactions", 10, 0).unwrap().total, 1);

        index.remove_resources(&["1".to_string()]).await.unwrap();
        assert!(index.search("interactions", 10, 0).unwrap().hits.is_empty());
    }

    #[tokio::test]
    async fn test_search_empty_query() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let results = index.search("", 10, 0).unwrap();
        assert!(results.hits.is_empty());
        assert_eq!(results.total, 0);
    }

    #[tokio::test]
    async fn test_total_counts_every_page() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let resources: Vec<Resource> = (0..5)
            .map(|i| create_test_resource(&i.to_string(), "Spacing", "Whitespace rules", &[]))
            .collect();
        index.rebuild(&resources).await.unwrap();

        let page = index.search("spacing", 2, 2).unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.hits.len(), 2);

        let past_end = index.search("spacing", 2, 10).unwrap();
        assert_eq!(past_end.total, 5);
        assert!(past_end.hits.is_empty());
    }

    #[tokio::test]
    async fn test_extreme_window_does_not_overflow() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();
        index
            .rebuild(&[create_test_resource("1", "Grids", "Layout", &[])])
            .await
            .unwrap();

        let results = index.search("grids", 0, 0).unwrap();
        assert_eq!(results.total, 1);
        assert!(results.hits.is_empty());
    }
}
