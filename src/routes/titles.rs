use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::TitleMatch,
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

/// Handler for title search endpoint
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<TitleMatch>>> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput(
            "Query parameter 'q' must not be blank".to_string(),
        ));
    }

    let context = state.models.get().await?;
    let matches = context.titles.resolve(query);
    tracing::debug!(query, matches = matches.len(), "Title search");
    Ok(Json(matches))
}
