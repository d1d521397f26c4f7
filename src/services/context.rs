use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::OnceCell;

use crate::{
    db::MovieStore,
    error::{AppError, AppResult},
    models::{Dataset, Movie, MovieId},
};

use super::{
    latent::{LatentFactors, RatingMatrix},
    loader,
    stop_words::StopWords,
    text_features::{positions_by_id, TextFeatures},
    title_search::TitleIndex,
};

/// Knobs consumed by the model builders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSettings {
    pub latent_rank: usize,
    pub oversamples: usize,
    pub power_iterations: usize,
    pub seed: u64,
    pub stop_words: StopWords,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            latent_rank: 50,
            oversamples: 10,
            power_iterations: 5,
            seed: 42,
            stop_words: StopWords::English,
        }
    }
}

/// Summary of a built context, served by the stats endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ModelStats {
    pub movies: usize,
    pub users: usize,
    pub ratings: usize,
    pub latent_rank: usize,
    pub genre_vocabulary: usize,
    pub tag_vocabulary: usize,
    pub built_at: DateTime<Utc>,
}

/// Catalog plus the derived rating matrix, latent factors, text features and title index
///
/// Immutable once built and shared across requests behind an `Arc`.
#[derive(Debug)]
pub struct ModelContext {
    pub movies: Vec<Movie>,
    pub rating_matrix: RatingMatrix,
    pub latent: LatentFactors,
    pub text: TextFeatures,
    pub titles: TitleIndex,
    pub built_at: DateTime<Utc>,
    positions: HashMap<MovieId, usize>,
}

impl ModelContext {
    /// Builds every derived structure from a loaded dataset
    ///
    /// The latent factor and text feature builds are independent and run
    /// concurrently on the blocking pool.
    pub async fn build(dataset: Dataset, settings: ModelSettings) -> AppResult<Self> {
        let Dataset { movies, ratings } = dataset;
        let movies = Arc::new(movies);

        let latent_movies = Arc::clone(&movies);
        let latent_task = tokio::task::spawn_blocking(move || {
            let matrix = RatingMatrix::build(&ratings, &latent_movies);
            let factors = LatentFactors::fit(&matrix.standardized(), &settings);
            (matrix, factors)
        });

        let text_movies = Arc::clone(&movies);
        let text_task = tokio::task::spawn_blocking(move || {
            TextFeatures::build(&text_movies, settings.stop_words)
        });

        let (latent_result, text_result) = tokio::join!(latent_task, text_task);
        let (rating_matrix, latent) = latent_result
            .map_err(|e| AppError::Internal(format!("Latent factor build failed: {}", e)))?;
        let text = text_result
            .map_err(|e| AppError::Internal(format!("Text feature build failed: {}", e)))?;

        let movies = Arc::try_unwrap(movies).unwrap_or_else(|shared| shared.as_ref().clone());
        let titles = TitleIndex::build(&movies);
        let positions = positions_by_id(&movies);

        Ok(Self {
            movies,
            rating_matrix,
            latent,
            text,
            titles,
            built_at: Utc::now(),
            positions,
        })
    }

    /// Catalog position (and text feature row) of a movie
    pub fn position_of(&self, movie_id: MovieId) -> Option<usize> {
        self.positions.get(&movie_id).copied()
    }

    pub fn movie(&self, movie_id: MovieId) -> Option<&Movie> {
        self.position_of(movie_id).and_then(|p| self.movies.get(p))
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats {
            movies: self.movies.len(),
            users: self.rating_matrix.user_ids().len(),
            ratings: self.rating_matrix.rating_count(),
            latent_rank: self.latent.rank(),
            genre_vocabulary: self.text.genre_vocabulary(),
            tag_vocabulary: self.text.tag_vocabulary(),
            built_at: self.built_at,
        }
    }
}

/// Lazily built, process-wide [`ModelContext`], constructed at most once
pub struct ModelCache {
    store: Arc<dyn MovieStore>,
    settings: ModelSettings,
    cell: OnceCell<Arc<ModelContext>>,
}

impl ModelCache {
    pub fn new(store: Arc<dyn MovieStore>, settings: ModelSettings) -> Self {
        Self {
            store,
            settings,
            cell: OnceCell::new(),
        }
    }

    /// Returns the context, loading and building it on first use
    ///
    /// Concurrent first callers wait on a single build. A failed build is
    /// returned to every waiter and the next call tries again.
    pub async fn get(&self) -> AppResult<Arc<ModelContext>> {
        self.cell
            .get_or_try_init(|| async {
                tracing::info!(settings = ?self.settings, "Building recommendation models");
                let dataset = loader::load(self.store.as_ref()).await?;
                let context = ModelContext::build(dataset, self.settings).await?;
                tracing::info!(
                    movies = context.movies.len(),
                    latent_rank = context.latent.rank(),
                    "Recommendation models ready"
                );
                Ok(Arc::new(context))
            })
            .await
            .map(Arc::clone)
    }

    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }
}
