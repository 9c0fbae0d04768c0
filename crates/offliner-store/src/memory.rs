//! An in-process fake of the Progress Store, used by tests in this crate
//! and by downstream crates (pipeline, axum) that want to exercise the
//! port contract without a real Redis instance.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use offliner_core::ports::ProgressStorePort;
use offliner_core::{CoreError, ProgressRecord, RequestId};

/// Same semantics as `RedisProgressStore`, minus the TTL eviction (tests
/// don't run long enough for it to matter) and minus cross-process
/// visibility.
#[derive(Default)]
pub struct InMemoryProgressStore {
    records: Mutex<HashMap<RequestId, ProgressRecord>>,
}

impl InMemoryProgressStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStorePort for InMemoryProgressStore {
    async fn create(
        &self,
        id: RequestId,
        total_items: u32,
        temp_dir: &str,
    ) -> Result<(), CoreError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&id) {
            return Err(CoreError::InputInvalid {
                message: format!("progress record already exists for {id}"),
            });
        }
        records.insert(id, ProgressRecord::new(total_items, temp_dir));
        Ok(())
    }

    async fn update(
        &self,
        id: RequestId,
        mutate: &mut (dyn FnMut(&mut ProgressRecord) + Send),
    ) -> Result<(), CoreError> {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.get_mut(&id) {
            mutate(record);
        }
        Ok(())
    }

    async fn get(&self, id: RequestId) -> ProgressRecord {
        self.records
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_else(ProgressRecord::not_found)
    }

    async fn request_cancel(&self, id: RequestId) -> Result<(), CoreError> {
        self.update(id, &mut |r| r.cancel_requested = true).await
    }

    async fn is_cancelled(&self, id: RequestId) -> Result<bool, CoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&id)
            .is_some_and(|r| r.cancel_requested))
    }

    async fn remove(&self, id: RequestId) -> Result<(), CoreError> {
        self.records.lock().unwrap().remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_duplicate_create_fails() {
        let store = InMemoryProgressStore::new();
        let id = RequestId::new();
        store.create(id, 3, "/tmp/sess").await.unwrap();
        assert!(store.create(id, 3, "/tmp/sess").await.is_err());
    }

    #[tokio::test]
    async fn update_merges_and_preserves_other_fields() {
        let store = InMemoryProgressStore::new();
        let id = RequestId::new();
        store.create(id, 5, "/tmp/sess").await.unwrap();
        store
            .update(id, &mut |r| {
                r.percent = 42;
                r.status = "Downloading...".to_string();
            })
            .await
            .unwrap();
        let record = store.get(id).await;
        assert_eq!(record.percent, 42);
        assert_eq!(record.total_items, 5);
    }

    #[tokio::test]
    async fn update_on_absent_key_is_a_no_op() {
        let store = InMemoryProgressStore::new();
        let id = RequestId::new();
        store.update(id, &mut |r| r.percent = 1).await.unwrap();
        let record = store.get(id).await;
        assert_eq!(record.error.as_deref(), Some("Session not found"));
    }

    #[tokio::test]
    async fn get_on_absent_key_returns_synthetic_record() {
        let store = InMemoryProgressStore::new();
        let record = store.get(RequestId::new()).await;
        assert!(record.complete);
        assert_eq!(record.error.as_deref(), Some("Session not found"));
    }

    #[tokio::test]
    async fn cancel_is_monotonic() {
        let store = InMemoryProgressStore::new();
        let id = RequestId::new();
        store.create(id, 1, "/tmp/sess").await.unwrap();
        assert!(!store.is_cancelled(id).await.unwrap());
        store.request_cancel(id).await.unwrap();
        assert!(store.is_cancelled(id).await.unwrap());
        // A later unrelated update must not clear the flag.
        store.update(id, &mut |r| r.percent = 10).await.unwrap();
        assert!(store.is_cancelled(id).await.unwrap());
    }

    #[tokio::test]
    async fn remove_deletes_key() {
        let store = InMemoryProgressStore::new();
        let id = RequestId::new();
        store.create(id, 1, "/tmp/sess").await.unwrap();
        store.remove(id).await.unwrap();
        let record = store.get(id).await;
        assert_eq!(record.error.as_deref(), Some("Session not found"));
    }
}
