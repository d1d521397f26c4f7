use serde::{Deserialize, Serialize};

/// Catalog identifier for a movie (the store's `movieId`)
pub type MovieId = i64;

/// Identifier for a rating author (the store's `userId`)
pub type UserId = i64;

// ============================================================================
// Store records (as read from the relational store)
// ============================================================================

/// Raw row of the `movies` table
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MovieRecord {
    pub movie_id: MovieId,
    pub title: Option<String>,
    pub genres: Option<String>,
}

/// Raw row of the `ratings` table
///
/// Keys are kept as the store's textual rendering; the loader owns coercion
/// to integers so that a malformed key is reported instead of silently dropped.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RatingRecord {
    pub user_id: Option<String>,
    pub movie_id: Option<String>,
    pub rating: Option<f64>,
    pub timestamp: Option<i64>,
}

/// Raw row of the `tags` table
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TagRecord {
    pub user_id: Option<i64>,
    pub movie_id: Option<i64>,
    pub tag: Option<String>,
    pub timestamp: Option<i64>,
}

// ============================================================================
// Normalized domain types
// ============================================================================

/// A catalog movie with its text profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    /// Canonical title, usually ending in a "(YYYY)" token
    pub title: String,
    /// Pipe- or space-delimited genre list, never null
    pub genres: String,
    /// Every tag authored for this movie joined by single spaces, never null
    pub tags: String,
}

/// A single user rating with integer keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f64,
    pub timestamp: i64,
}

/// Loader output: the catalog in store order plus every usable rating
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub movies: Vec<Movie>,
    pub ratings: Vec<Rating>,
}

/// A resolved catalog entry returned by title search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleMatch {
    pub id: MovieId,
    pub title: String,
}
