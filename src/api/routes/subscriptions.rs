//! Subscription Routes
//!
//! CRUD endpoints for subscription records.
//!
//! - GET /api/subscriptions - List subscriptions (paginated)
//! - POST /api/subscriptions - Create a subscription
//! - GET /api/subscriptions/:id - Get a specific subscription
//! - PUT /api/subscriptions/:id - Replace a subscription
//! - DELETE /api/subscriptions/:id - Delete a subscription

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{ListQuery, SubscriptionListResponse, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::records::Subscription;

/// GET /api/subscriptions
///
/// List subscriptions in insertion order, one page at a time.
pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<SubscriptionListResponse>> {
    let (page, limit) = validate_pagination(&query)?;

    let page = state.store.page(page, limit).await;

    Ok(Json(SubscriptionListResponse {
        subscriptions: page.records,
        total: page.total,
        page: page.page,
        limit: page.limit,
    }))
}

/// GET /api/subscriptions/:id
pub async fn get_subscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<Json<Subscription>> {
    state
        .store
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Subscription {} not found", id)))
}

/// POST /api/subscriptions
///
/// Create a subscription. Any id or timestamps in the body are replaced.
pub async fn create_subscription(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Subscription>,
) -> ApiResult<(StatusCode, Json<Subscription>)> {
    let created = state.store.create(req).await;

    tracing::info!(
        subscription_id = created.id,
        status = %created.status,
        "Created subscription"
    );

    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/subscriptions/:id
///
/// Replace a subscription, keeping its id and creation time.
pub async fn update_subscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(req): Json<Subscription>,
) -> ApiResult<Json<Subscription>> {
    let updated = state.store.update(id, req).await?;

    tracing::info!(subscription_id = id, status = %updated.status, "Updated subscription");

    Ok(Json(updated))
}

/// DELETE /api/subscriptions/:id
pub async fn delete_subscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<StatusCode> {
    state.store.delete(id).await?;

    tracing::info!(subscription_id = id, "Deleted subscription");

    Ok(StatusCode::NO_CONTENT)
}

/// Resolve page and limit, applying defaults
fn validate_pagination(query: &ListQuery) -> ApiResult<(usize, usize)> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

    if page < 1 {
        return Err(ApiError::Validation("page must be at least 1".to_string()));
    }

    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(ApiError::Validation(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_LIMIT
        )));
    }

    Ok((page as usize, limit as usize))
}
