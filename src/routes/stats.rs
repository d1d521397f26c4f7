use axum::{extract::State, Json};

use crate::{error::AppResult, services::ModelStats};

use super::AppState;

/// Sizes of the loaded catalog and the derived models
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<ModelStats>> {
    let context = state.models.get().await?;
    Ok(Json(context.stats()))
}
