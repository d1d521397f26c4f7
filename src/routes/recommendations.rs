use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    services::get_movie_recommendations,
};

use super::AppState;

pub const NO_RECOMMENDATIONS_MESSAGE: &str =
    "No recommendations found. Try different movie titles.";

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub movies: Vec<String>,
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> AppResult<Json<RecommendationResponse>> {
    let Json(request) = payload?;
    let (movies, count) = validate(request, state.default_count, state.max_count)?;

    let context = state.models.get().await?;
    let recommendations = get_movie_recommendations(&context, &movies, count);

    let message = recommendations
        .is_empty()
        .then(|| NO_RECOMMENDATIONS_MESSAGE.to_string());

    Ok(Json(RecommendationResponse {
        recommendations,
        message,
    }))
}

/// Trims titles, drops blank ones and resolves the requested count
fn validate(
    request: RecommendationRequest,
    default_count: usize,
    max_count: usize,
) -> AppResult<(Vec<String>, usize)> {
    if request.movies.is_empty() {
        return Err(AppError::InvalidInput("No movies provided".to_string()));
    }

    let movies: Vec<String> = request
        .movies
        .iter()
        .map(|title| title.trim())
        .filter(|title| !title.is_empty())
        .map(str::to_string)
        .collect();
    if movies.is_empty() {
        return Err(AppError::InvalidInput(
            "Movie titles must not be blank".to_string(),
        ));
    }

    let count = request.count.unwrap_or(default_count);
    if count == 0 || count > max_count {
        return Err(AppError::InvalidInput(format!(
            "count must be between 1 and {}",
            max_count
        )));
    }

    Ok((movies, count))
}
