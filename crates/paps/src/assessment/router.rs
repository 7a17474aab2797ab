use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::criteria::CriteriaTable;
use super::domain::{FitnessFactor, StudentProfile};
use super::lookup::LookupRequest;
use super::presentation::{RecordingChartSink, SingleQueryDisplay};
use crate::error::AppError;
use super::session::{replay, single_query, FactorEntry};

/// Router builder exposing the catalog, single-query, and evaluation endpoints.
pub fn assessment_router(table: Arc<CriteriaTable>) -> Router {
    Router::new()
        .route("/api/v1/factors", get(factors_handler))
        .route("/api/v1/lookup", post(lookup_handler))
        .route("/api/v1/evaluation", post(evaluation_handler))
        .with_state(table)
}

#[derive(Debug, Clone, Serialize)]
pub struct FactorCatalogEntry {
    pub factor: FitnessFactor,
    pub label: &'static str,
    pub items: Vec<ItemCatalogEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemCatalogEntry {
    pub key: &'static str,
    pub label: &'static str,
}

pub fn factor_catalog() -> Vec<FactorCatalogEntry> {
    FitnessFactor::ordered()
        .into_iter()
        .map(|factor| FactorCatalogEntry {
            factor,
            label: factor.label(),
            items: factor
                .items()
                .iter()
                .map(|item| ItemCatalogEntry {
                    key: item.key(),
                    label: item.label(),
                })
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationRequest {
    #[serde(flatten)]
    pub profile: StudentProfile,
    #[serde(default)]
    pub entries: Vec<FactorEntry>,
}

pub(crate) async fn factors_handler() -> Json<Vec<FactorCatalogEntry>> {
    Json(factor_catalog())
}

pub(crate) async fn lookup_handler(
    State(table): State<Arc<CriteriaTable>>,
    Json(request): Json<LookupRequest>,
) -> Result<Json<SingleQueryDisplay>, AppError> {
    let display = single_query(&table, &request)?;
    Ok(Json(display))
}

pub(crate) async fn evaluation_handler(
    State(table): State<Arc<CriteriaTable>>,
    Json(request): Json<EvaluationRequest>,
) -> Response {
    let session = replay(
        table,
        RecordingChartSink::default(),
        request.profile,
        &request.entries,
    );
    (StatusCode::OK, Json(session.dashboard())).into_response()
}
