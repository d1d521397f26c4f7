use std::collections::HashMap;

use crate::{
    db::MovieStore,
    error::{AppError, AppResult},
    models::{Dataset, Movie, MovieId, MovieRecord, Rating, RatingRecord, TagRecord},
};

/// Loads and normalizes the catalog and ratings from the store
///
/// Fetches the three tables, coerces rating keys to integers (failing on any key
/// that is not one), replaces missing genre text with an empty string and folds
/// every tag into its movie's `tags` field. Ratings without a value carry no
/// signal and are skipped.
pub async fn load(store: &dyn MovieStore) -> AppResult<Dataset> {
    let store_name = store.name();
    tracing::info!(store = store_name, "Loading data from store");

    let (movie_rows, rating_rows, tag_rows) = tokio::try_join!(
        store.fetch_movies(),
        store.fetch_ratings(),
        store.fetch_tags()
    )?;

    tracing::info!(
        movies = movie_rows.len(),
        ratings = rating_rows.len(),
        tags = tag_rows.len(),
        "Loaded raw tables"
    );

    let ratings = normalize_ratings(rating_rows)?;
    let tags_by_movie = group_tags(&tag_rows);
    let movies = build_movies(movie_rows, &tags_by_movie);

    tracing::info!(
        movies = movies.len(),
        ratings = ratings.len(),
        tagged_movies = tags_by_movie.len(),
        "Data loading and preprocessing complete"
    );

    Ok(Dataset { movies, ratings })
}

fn normalize_ratings(rows: Vec<RatingRecord>) -> AppResult<Vec<Rating>> {
    let mut ratings = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;

    for row in rows {
        let user_id = coerce_key("userId", row.user_id.as_deref())?;
        let movie_id = coerce_key("movieId", row.movie_id.as_deref())?;

        let Some(rating) = row.rating.filter(|r| r.is_finite()) else {
            skipped += 1;
            continue;
        };

        ratings.push(Rating {
            user_id,
            movie_id,
            rating,
            timestamp: row.timestamp.unwrap_or_default(),
        });
    }

    if skipped > 0 {
        tracing::warn!(skipped, "Skipped ratings without a numeric value");
    }

    Ok(ratings)
}

/// Parses a rating key, accepting integral reals such as "31.0"
fn coerce_key(field: &str, raw: Option<&str>) -> AppResult<i64> {
    let raw = raw.ok_or_else(|| AppError::DataIntegrity(format!("ratings.{} is null", field)))?;
    let trimmed = raw.trim();

    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(value);
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 => {
            Ok(value as i64)
        }
        _ => Err(AppError::DataIntegrity(format!(
            "ratings.{} value {:?} is not an integer",
            field, raw
        ))),
    }
}

/// Groups tag text by movie, keeping store order within each movie
fn group_tags(rows: &[TagRecord]) -> HashMap<MovieId, Vec<&str>> {
    let mut grouped: HashMap<MovieId, Vec<&str>> = HashMap::new();

    for row in rows {
        let (Some(movie_id), Some(tag)) = (row.movie_id, row.tag.as_deref()) else {
            continue;
        };
        let tag = tag.trim();
        if !tag.is_empty() {
            grouped.entry(movie_id).or_default().push(tag);
        }
    }

    grouped
}

fn build_movies(rows: Vec<MovieRecord>, tags_by_movie: &HashMap<MovieId, Vec<&str>>) -> Vec<Movie> {
    rows.into_iter()
        .map(|row| Movie {
            id: row.movie_id,
            title: row.title.unwrap_or_default(),
            genres: row.genres.unwrap_or_default(),
            tags: tags_by_movie
                .get(&row.movie_id)
                .map(|tags| tags.join(" "))
                .unwrap_or_default(),
        })
        .collect()
}
