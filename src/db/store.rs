use sqlx::SqlitePool;

use crate::{
    error::AppResult,
    models::{MovieRecord, RatingRecord, TagRecord},
};

const MOVIES_QUERY: &str = "SELECT CAST(movieId AS INTEGER) AS movie_id, \
     CAST(title AS TEXT) AS title, \
     CAST(genres AS TEXT) AS genres \
     FROM movies";

// Keys are read back as text so that the loader can reject values that are not integers.
const RATINGS_QUERY: &str = "SELECT CAST(userId AS TEXT) AS user_id, \
     CAST(movieId AS TEXT) AS movie_id, \
     CAST(rating AS REAL) AS rating, \
     CAST(timestamp AS INTEGER) AS timestamp \
     FROM ratings";

const TAGS_QUERY: &str = "SELECT CAST(userId AS INTEGER) AS user_id, \
     CAST(movieId AS INTEGER) AS movie_id, \
     CAST(tag AS TEXT) AS tag, \
     CAST(timestamp AS INTEGER) AS timestamp \
     FROM tags";

/// Trait for the relational store holding movies, ratings and tags
///
/// Only whole tables are ever read, so there is no filtering or pagination.
/// Implementations return rows exactly as stored; the loader normalizes them.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieStore: Send + Sync {
    /// Fetch every row of the `movies` table
    async fn fetch_movies(&self) -> AppResult<Vec<MovieRecord>>;

    /// Fetch every row of the `ratings` table
    async fn fetch_ratings(&self) -> AppResult<Vec<RatingRecord>>;

    /// Fetch every row of the `tags` table
    async fn fetch_tags(&self) -> AppResult<Vec<TagRecord>>;

    /// Store name for logging
    fn name(&self) -> &'static str;
}

/// `MovieStore` backed by a SQLite database
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MovieStore for SqliteStore {
    async fn fetch_movies(&self) -> AppResult<Vec<MovieRecord>> {
        let rows = sqlx::query_as::<_, MovieRecord>(MOVIES_QUERY)
            .fetch_all(&self.pool)
            .await?;
        tracing::debug!(rows = rows.len(), "Fetched movies table");
        Ok(rows)
    }

    async fn fetch_ratings(&self) -> AppResult<Vec<RatingRecord>> {
        let rows = sqlx::query_as::<_, RatingRecord>(RATINGS_QUERY)
            .fetch_all(&self.pool)
            .await?;
        tracing::debug!(rows = rows.len(), "Fetched ratings table");
        Ok(rows)
    }

    async fn fetch_tags(&self) -> AppResult<Vec<TagRecord>> {
        let rows = sqlx::query_as::<_, TagRecord>(TAGS_QUERY)
            .fetch_all(&self.pool)
            .await?;
        tracing::debug!(rows = rows.len(), "Fetched tags table");
        Ok(rows)
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
