use std::{collections::BTreeSet, sync::Arc};

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::ApiError;

/// Which entity a search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTarget {
    Blogposts,
    Comments,
}

/// SearchIndex
///
/// The full-text search capability behind the `q` filter. Returns the ids of
/// matching entities as a set, so one entity matching on several fields is
/// reported once. Callers never pass an empty query.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn search(&self, target: SearchTarget, query: &str) -> Result<BTreeSet<i64>, ApiError>;
}

pub type SearchState = Arc<dyn SearchIndex>;

/// PostgresSearch
///
/// Delegates to Postgres text search over the generated `search_vector` columns.
/// `plainto_tsquery` treats the query as plain terms (no operators), all of
/// which must match.
pub struct PostgresSearch {
    pool: PgPool,
}

impl PostgresSearch {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SearchIndex for PostgresSearch {
    async fn search(&self, target: SearchTarget, query: &str) -> Result<BTreeSet<i64>, ApiError> {
        let sql = match target {
            SearchTarget::Blogposts => {
                "SELECT DISTINCT id FROM blogposts WHERE search_vector @@ plainto_tsquery('english', $1)"
            }
            SearchTarget::Comments => {
                "SELECT DISTINCT id FROM comments WHERE search_vector @@ plainto_tsquery('english', $1)"
            }
        };

        let ids: Vec<i64> = sqlx::query_scalar(sql)
            .bind(query)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(?target, query, hits = ids.len(), "full-text search");
        Ok(ids.into_iter().collect())
    }
}

/// Splits text into lowercase alphanumeric terms.
pub fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// True when every term of `query` occurs among the terms of `document`.
/// A query without terms matches nothing.
pub fn matches_all_terms(query: &str, document: &str) -> bool {
    let wanted = terms(query);
    if wanted.is_empty() {
        return false;
    }
    let present: BTreeSet<String> = terms(document).into_iter().collect();
    wanted.iter().all(|term| present.contains(term))
}
