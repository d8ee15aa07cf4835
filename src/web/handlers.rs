//! HTTP request handlers.

use super::AppState;
use crate::datasource::DataSourceApi;
use crate::models::{QueryTarget, ResultTable, TimeRange};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};

// ============================================================================
// API: Query
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub range: TimeRange,
    #[serde(default)]
    pub targets: Vec<QueryTarget>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub data: Vec<ResultTable>,
}

pub async fn handle_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> impl IntoResponse {
    match state.datasource.query(&req.range, &req.targets).await {
        Ok(data) => Json(QueryResponse { data }).into_response(),
        Err(e) => {
            tracing::error!("Query failed: {}", e);
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

// ============================================================================
// API: Health
// ============================================================================

pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.datasource.check_health().await)
}

// ============================================================================
// API: Discovery
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct NameQuery {
    #[serde(default)]
    pub query: String,
}

pub async fn handle_applications(
    State(state): State<AppState>,
    Query(params): Query<NameQuery>,
) -> impl IntoResponse {
    Json(state.datasource.list_application_names(&params.query).await)
}

pub async fn handle_hosts(
    State(state): State<AppState>,
    Query(params): Query<NameQuery>,
) -> impl IntoResponse {
    Json(state.datasource.list_hosts(&params.query))
}
