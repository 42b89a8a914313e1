// Dead Letter Queue storage trait and an in-memory implementation

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::DlqResult;
use super::types::{DlqItem, DlqItemStatus};

#[async_trait]
pub trait DlqStore: Send + Sync {
    async fn add(&self, item: DlqItem) -> DlqResult<()>;
    async fn update(&self, item: DlqItem) -> DlqResult<()>;
    async fn get(&self, id: Uuid) -> DlqResult<Option<DlqItem>>;
    async fn get_ready_for_retry(&self, limit: usize) -> DlqResult<Vec<DlqItem>>;
    async fn cleanup_expired(&self) -> DlqResult<usize>;
    async fn count(&self) -> DlqResult<usize>;
    async fn count_by_status(&self, status: DlqItemStatus) -> DlqResult<usize>;
}

/// Process-local DLQ store. Adequate for a single-instance deployment or
/// tests; a durable deployment would back this with the same `policies`
/// database via a `dead_letter_queue` table (spec §7 "persistence" and
/// §9 supplemental DLQ note).
#[derive(Default)]
pub struct InMemoryDlqStore {
    items: Arc<RwLock<HashMap<Uuid, DlqItem>>>,
}

impl InMemoryDlqStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DlqStore for InMemoryDlqStore {
    async fn add(&self, item: DlqItem) -> DlqResult<()> {
        self.items.write().await.insert(item.id, item);
        Ok(())
    }

    async fn update(&self, item: DlqItem) -> DlqResult<()> {
        self.items.write().await.insert(item.id, item);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DlqResult<Option<DlqItem>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn get_ready_for_retry(&self, limit: usize) -> DlqResult<Vec<DlqItem>> {
        let items = self.items.read().await;
        Ok(items
            .values()
            .filter(|i| i.is_ready_for_retry())
            .take(limit)
            .cloned()
            .collect())
    }

    async fn cleanup_expired(&self) -> DlqResult<usize> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|_, item| !item.is_expired());
        Ok(before - items.len())
    }

    async fn count(&self) -> DlqResult<usize> {
        Ok(self.items.read().await.len())
    }

    async fn count_by_status(&self, status: DlqItemStatus) -> DlqResult<usize> {
        Ok(self
            .items
            .read()
            .await
            .values()
            .filter(|i| i.status == status)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::types::FailureReason;

    #[tokio::test]
    async fn add_then_get_round_trips() {
        let store = InMemoryDlqStore::new();
        let item = DlqItem::new(
            "org-1".into(),
            "{}".into(),
            "payout_record".into(),
            FailureReason::DatabaseError,
            "write failed".into(),
            3,
        );
        let id = item.id;
        store.add(item).await.unwrap();
        assert!(store.get(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn cleanup_expired_removes_only_expired_items() {
        let store = InMemoryDlqStore::new();
        let fresh = DlqItem::new(
            "org-1".into(),
            "{}".into(),
            "payout_record".into(),
            FailureReason::DatabaseError,
            "err".into(),
            3,
        );
        let mut expired = fresh.clone();
        expired.id = Uuid::new_v4();
        expired.expires_at = Some(chrono::Utc::now() - chrono::Duration::hours(1));

        store.add(fresh).await.unwrap();
        store.add(expired).await.unwrap();

        let removed = store.cleanup_expired().await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
