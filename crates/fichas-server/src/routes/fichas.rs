use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use fichas_core::{FichaState, NewFicha, Priority, TriageFilter};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// Query string accepted by the list endpoints. Values are free text and
/// normalized here so `?priority=Alta` works like `?priority=high`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

impl ListQuery {
    fn filter(&self) -> Result<TriageFilter, AppError> {
        let priority = match self.priority.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                Priority::normalize(raw)
                    .ok_or_else(|| AppError::bad_request(format!("unknown priority '{raw}'")))?,
            ),
        };
        Ok(TriageFilter {
            query: self.q.clone(),
            priority,
        })
    }

    fn state(&self) -> Result<FichaState, AppError> {
        match self.state.as_deref().map(str::trim) {
            None | Some("") => Ok(FichaState::Pending),
            Some(raw) => FichaState::normalize(raw)
                .ok_or_else(|| AppError::bad_request(format!("unknown state '{raw}'"))),
        }
    }
}

fn list_body(fichas: Vec<fichas_core::Ficha>) -> serde_json::Value {
    serde_json::json!({
        "count": fichas.len(),
        "data": fichas,
    })
}

/// GET /api/fichas/pending: pending fichas in triage order.
pub async fn list_pending(
    State(app): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let filter = query.filter()?;
    let triage = app.triage();
    let fichas = tokio::task::spawn_blocking(move || triage.rank_pending())
        .await
        .map_err(AppError::join)??;
    Ok(Json(list_body(filter.apply(fichas))))
}

/// GET /api/fichas?state=: fichas in one state, in triage order.
pub async fn list_fichas(
    State(app): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let filter = query.filter()?;
    let state = query.state()?;
    let triage = app.triage();
    let fichas = tokio::task::spawn_blocking(move || triage.list(state))
        .await
        .map_err(AppError::join)??;
    Ok(Json(list_body(filter.apply(fichas))))
}

/// GET /api/fichas/:id
pub async fn get_ficha(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let ficha = tokio::task::spawn_blocking(move || store.get(&id))
        .await
        .map_err(AppError::join)??;
    Ok(Json(serde_json::to_value(ficha)?))
}

/// POST /api/fichas: insert a discovered lead.
pub async fn create_ficha(
    State(app): State<AppState>,
    Json(body): Json<NewFicha>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let store = app.store.clone();
    let ficha = tokio::task::spawn_blocking(move || {
        fichas_core::ingest::ingest_one(store.as_ref(), body, chrono::Utc::now())
    })
    .await
    .map_err(AppError::join)??;
    Ok((StatusCode::CREATED, Json(serde_json::to_value(ficha)?)))
}

/// PATCH /api/fichas/:id/contact
pub async fn mark_contacted(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let lifecycle = app.lifecycle();
    let ficha = tokio::task::spawn_blocking(move || lifecycle.mark_contacted(&id))
        .await
        .map_err(AppError::join)??;
    Ok(Json(serde_json::to_value(ficha)?))
}

/// PATCH /api/fichas/:id/discard
pub async fn mark_discarded(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let lifecycle = app.lifecycle();
    let ficha = tokio::task::spawn_blocking(move || lifecycle.mark_discarded(&id))
        .await
        .map_err(AppError::join)??;
    Ok(Json(serde_json::to_value(ficha)?))
}

/// POST /api/fichas/bulk-discard-low
pub async fn bulk_discard_low(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let lifecycle = app.lifecycle();
    let outcome = tokio::task::spawn_blocking(move || lifecycle.bulk_discard_low_priority())
        .await
        .map_err(AppError::join)??;
    Ok(Json(serde_json::to_value(outcome)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fichas_core::MemoryFichaStore;
    use std::sync::Arc;

    fn app() -> AppState {
        AppState::new(Arc::new(MemoryFichaStore::new()))
    }

    #[test]
    fn query_normalizes_legacy_priority() {
        let q = ListQuery {
            priority: Some("Alta".into()),
            ..ListQuery::default()
        };
        assert_eq!(q.filter().unwrap().priority, Some(Priority::High));
    }

    #[test]
    fn query_rejects_unknown_state() {
        let q = ListQuery {
            state: Some("archived".into()),
            ..ListQuery::default()
        };
        assert!(q.state().is_err());
        assert_eq!(ListQuery::default().state().unwrap(), FichaState::Pending);
    }

    #[tokio::test]
    async fn get_missing_returns_error() {
        let result = get_ficha(State(app()), Path("missing".into())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn bulk_discard_on_empty_store_is_zero() {
        let Json(body) = bulk_discard_low(State(app())).await.unwrap();
        assert_eq!(body["succeeded"], 0);
        assert_eq!(body["failed"], 0);
    }
}
