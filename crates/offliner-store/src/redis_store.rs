//! Redis implementation of `ProgressStorePort`.
//!
//! Keys are namespaced `progress:{request_id}` (spec §4.1). Values are the
//! JSON-serialized `ProgressRecord`. Updates are coarse-grained
//! get/mutate/set round-trips rather than per-field Redis writes — spec
//! §4.1 explicitly accepts last-writer-wins races here because only one
//! worker ever writes for a given id, and `KEEPTTL` preserves the
//! remaining lease on every write.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use offliner_core::{CoreError, ProgressRecord, RequestId};
use offliner_core::ports::ProgressStorePort;

use crate::PROGRESS_TTL_SECS;

fn to_core_err(e: redis::RedisError) -> CoreError {
    CoreError::StoreUnavailable {
        message: e.to_string(),
    }
}

/// A `ProgressStorePort` backed by a Redis connection (spec §6 `REDIS_URL`).
#[derive(Clone)]
pub struct RedisProgressStore {
    conn: ConnectionManager,
}

impl RedisProgressStore {
    /// Connect to `redis_url`, reconnecting automatically on transient
    /// failures (the `ConnectionManager`'s job).
    pub async fn connect(redis_url: &str) -> Result<Self, CoreError> {
        let client = redis::Client::open(redis_url).map_err(to_core_err)?;
        let conn = client.get_connection_manager().await.map_err(to_core_err)?;
        Ok(Self { conn })
    }

    async fn get_raw(&self, id: RequestId) -> Result<Option<ProgressRecord>, CoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(id.store_key()).await.map_err(to_core_err)?;
        Ok(raw.and_then(|s| serde_json::from_str(&s).ok()))
    }

    async fn set_raw(&self, id: RequestId, record: &ProgressRecord, keep_ttl: bool) -> Result<(), CoreError> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(record).map_err(|e| CoreError::StoreUnavailable {
            message: e.to_string(),
        })?;
        if keep_ttl {
            redis::cmd("SET")
                .arg(id.store_key())
                .arg(json)
                .arg("KEEPTTL")
                .query_async::<()>(&mut conn)
                .await
                .map_err(to_core_err)?;
        } else {
            conn.set_ex::<_, _, ()>(id.store_key(), json, PROGRESS_TTL_SECS)
                .await
                .map_err(to_core_err)?;
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressStorePort for RedisProgressStore {
    async fn create(
        &self,
        id: RequestId,
        total_items: u32,
        temp_dir: &str,
    ) -> Result<(), CoreError> {
        let mut conn = self.conn.clone();
        let record = ProgressRecord::new(total_items, temp_dir);
        let json = serde_json::to_string(&record).map_err(|e| CoreError::StoreUnavailable {
            message: e.to_string(),
        })?;
        let created: bool = redis::cmd("SET")
            .arg(id.store_key())
            .arg(json)
            .arg("NX")
            .arg("EX")
            .arg(PROGRESS_TTL_SECS)
            .query_async::<Option<String>>(&mut conn)
            .await
            .map(|r| r.is_some())
            .map_err(to_core_err)?;
        if !created {
            return Err(CoreError::InputInvalid {
                message: format!("progress record already exists for {id}"),
            });
        }
        Ok(())
    }

    async fn update(
        &self,
        id: RequestId,
        mutate: &mut (dyn FnMut(&mut ProgressRecord) + Send),
    ) -> Result<(), CoreError> {
        let Some(mut record) = self.get_raw(id).await? else {
            return Ok(());
        };
        mutate(&mut record);
        self.set_raw(id, &record, true).await
    }

    async fn get(&self, id: RequestId) -> ProgressRecord {
        self.get_raw(id)
            .await
            .ok()
            .flatten()
            .unwrap_or_else(ProgressRecord::not_found)
    }

    async fn request_cancel(&self, id: RequestId) -> Result<(), CoreError> {
        self.update(id, &mut |r| r.cancel_requested = true).await
    }

    async fn is_cancelled(&self, id: RequestId) -> Result<bool, CoreError> {
        Ok(self.get_raw(id).await?.is_some_and(|r| r.cancel_requested))
    }

    async fn remove(&self, id: RequestId) -> Result<(), CoreError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(id.store_key()).await.map_err(to_core_err)
    }
}
