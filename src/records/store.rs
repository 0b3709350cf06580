//! Record Store
//!
//! In-memory, thread-safe list of subscriptions in insertion order.
//!
//! Writers replace the list copy-on-write, so readers holding an
//! `Arc<Vec<Subscription>>` from [`RecordStore::current_records`] always see
//! one consistent version, no matter what CRUD handlers do meanwhile.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use super::types::Subscription;

/// Thread-safe store of subscription records
pub struct RecordStore {
    inner: RwLock<StoreInner>,
}

struct StoreInner {
    records: Arc<Vec<Subscription>>,
    /// Next id to hand out; ids are never reused after a delete
    next_id: u64,
}

/// One page of records plus the information needed to render pagination
#[derive(Debug, Clone)]
pub struct Page {
    pub records: Vec<Subscription>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

impl RecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                records: Arc::new(Vec::new()),
                next_id: 1,
            }),
        }
    }

    /// Create a store pre-populated with records
    ///
    /// Records keep their ids; the id counter continues after the largest one.
    pub fn with_records(records: Vec<Subscription>) -> Self {
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        Self {
            inner: RwLock::new(StoreInner {
                records: Arc::new(records),
                next_id,
            }),
        }
    }

    /// Consistent read-only view of every record, in insertion order
    pub async fn current_records(&self) -> Arc<Vec<Subscription>> {
        Arc::clone(&self.inner.read().await.records)
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Get one page of records
    ///
    /// `page` is 1-based. Pages past the end are empty.
    pub async fn page(&self, page: usize, limit: usize) -> Page {
        let records = self.current_records().await;
        let total = records.len();

        let start = page.saturating_sub(1).saturating_mul(limit).min(total);
        let end = start.saturating_add(limit).min(total);

        Page {
            records: records[start..end].to_vec(),
            total,
            page,
            limit,
        }
    }

    /// Look up a record by id
    pub async fn get(&self, id: u64) -> Option<Subscription> {
        self.inner
            .read()
            .await
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Append a new record, assigning its id and timestamps
    pub async fn create(&self, mut record: Subscription) -> Subscription {
        let mut inner = self.inner.write().await;

        let now = Utc::now();
        record.id = inner.next_id;
        record.created_at = now;
        record.updated_at = now;
        inner.next_id += 1;

        Arc::make_mut(&mut inner.records).push(record.clone());

        tracing::debug!(subscription_id = record.id, "Created subscription");
        record
    }

    /// Replace a record in place
    ///
    /// The id and creation instant of the existing record are kept.
    pub async fn update(&self, id: u64, mut record: Subscription) -> Result<Subscription, StoreError> {
        let mut inner = self.inner.write().await;

        let index = inner
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;

        let records = Arc::make_mut(&mut inner.records);
        record.id = id;
        record.created_at = records[index].created_at;
        record.updated_at = Utc::now();
        records[index] = record.clone();

        tracing::debug!(subscription_id = id, status = %record.status, "Updated subscription");
        Ok(record)
    }

    /// Remove a record
    pub async fn delete(&self, id: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        let index = inner
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;

        Arc::make_mut(&mut inner.records).remove(index);

        tracing::debug!(subscription_id = id, "Deleted subscription");
        Ok(())
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from record store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Subscription {0} not found")]
    NotFound(u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::types::{BillingCycle, Plan, SubscriptionStatus};

    fn basic_plan() -> Plan {
        Plan::new(1, "Basic", "Perfect for individuals", 9.99, BillingCycle::Monthly)
    }

    async fn store_with(n: u64) -> RecordStore {
        let store = RecordStore::new();
        for i in 1..=n {
            store.create(Subscription::new(i, "John Doe", &basic_plan())).await;
        }
        store
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = store_with(3).await;
        let ids: Vec<u64> = store.current_records().await.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let store = store_with(3).await;
        store.delete(3).await.unwrap();

        let created = store.create(Subscription::new(9, "Eve Miller", &basic_plan())).await;
        assert_eq!(created.id, 4);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_with_records_continues_ids() {
        let mut a = Subscription::new(1, "A", &basic_plan());
        a.id = 41;
        let store = RecordStore::with_records(vec![a]);
        let created = store.create(Subscription::new(2, "B", &basic_plan())).await;
        assert_eq!(created.id, 42);
    }

    #[tokio::test]
    async fn test_pagination() {
        let store = store_with(25).await;

        let page = store.page(2, 10).await;
        let ids: Vec<u64> = page.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total, 25);

        let last = store.page(3, 10).await;
        assert_eq!(last.records.len(), 5);

        let beyond = store.page(9, 10).await;
        assert!(beyond.records.is_empty());
        assert_eq!(beyond.total, 25);
    }

    #[tokio::test]
    async fn test_update_keeps_identity() {
        let store = store_with(2).await;
        let original = store.get(2).await.unwrap();

        let replacement = Subscription::new(2, "Jane Smith", &basic_plan())
            .status(SubscriptionStatus::Cancelled);
        let updated = store.update(2, replacement).await.unwrap();

        assert_eq!(updated.id, 2);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(store.get(2).await.unwrap().status, SubscriptionStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_missing_record_errors() {
        let store = store_with(1).await;
        assert!(store.get(5).await.is_none());
        assert!(matches!(store.delete(5).await, Err(StoreError::NotFound(5))));
        let sub = Subscription::new(1, "X", &basic_plan());
        assert!(matches!(store.update(5, sub).await, Err(StoreError::NotFound(5))));
    }

    #[tokio::test]
    async fn test_current_records_is_stable_across_writes() {
        let store = store_with(2).await;
        let view = store.current_records().await;

        store.delete(1).await.unwrap();
        store.create(Subscription::new(5, "Frank Garcia", &basic_plan())).await;

        assert_eq!(view.len(), 2);
        assert_eq!(view[0].id, 1);
        assert_eq!(store.len().await, 2);
    }
}
