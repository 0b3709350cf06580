//! Data Transfer Objects
//!
//! Request and response types for the API endpoints that are not plain
//! record types. Records and plans are serialized as-is.

use serde::{Deserialize, Serialize};

use crate::records::Subscription;

/// Default page size for subscription listing
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Largest page size a client may request
pub const MAX_PAGE_LIMIT: i64 = 100;

// ============================================
// SUBSCRIPTION DTOs
// ============================================

/// Query parameters for `GET /api/subscriptions`
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// 1-based page number
    #[serde(default)]
    pub page: Option<i64>,
    /// Records per page
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Paginated subscription list
#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionListResponse {
    pub subscriptions: Vec<Subscription>,
    /// Total number of records across all pages
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy"
    pub status: String,
    /// Connected dashboards
    pub subscribers: usize,
    /// Stored subscription records
    pub records: usize,
    pub uptime_seconds: u64,
    pub version: String,
}
