use axum::extract::State;
use axum::Json;
use fichas_core::Stats;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/fichas/stats/summary: aggregate counts plus the priority
/// breakdown, both read from one snapshot.
pub async fn summary(State(app): State<AppState>) -> Result<Json<Stats>, AppError> {
    let aggregation = app.aggregation();
    let stats = tokio::task::spawn_blocking(move || aggregation.stats())
        .await
        .map_err(AppError::join)??;
    Ok(Json(stats))
}
