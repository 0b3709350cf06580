//! Analytics Routes
//!
//! - GET /api/analytics - Current aggregate analytics
//! - GET /api/plans - Plan catalogue

use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::analytics::{compute, Analytics};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::records::Plan;

/// GET /api/analytics
///
/// Same numbers the live feed broadcasts, computed on demand.
pub async fn get_analytics(State(state): State<Arc<AppState>>) -> ApiResult<Json<Analytics>> {
    let records = state.store.current_records().await;
    let snapshot = compute(&records, Utc::now(), 0)?;

    Ok(Json(snapshot.analytics))
}

/// GET /api/plans
pub async fn list_plans(State(state): State<Arc<AppState>>) -> Json<Vec<Plan>> {
    Json(state.plans.as_ref().clone())
}
