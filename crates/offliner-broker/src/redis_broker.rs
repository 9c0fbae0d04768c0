//! Redis implementation of `BrokerPort` using the classic "reliable queue"
//! pattern: `BRPOPLPUSH` moves a job atomically from the pending list into
//! an in-flight list, so a worker that crashes mid-job leaves its job
//! sitting in the in-flight list rather than losing it outright. A small
//! index hash remembers which raw payload belongs to which `request_id` so
//! `ack` can remove the right in-flight entry.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use offliner_core::domain::RequestId;
use offliner_core::ports::BrokerPort;
use offliner_core::{CoreError, Job};

const PENDING_KEY: &str = "offliner:jobs:pending";
const PROCESSING_KEY: &str = "offliner:jobs:processing";
const INDEX_KEY: &str = "offliner:jobs:processing_index";

fn to_core_err(e: redis::RedisError) -> CoreError {
    CoreError::BrokerUnavailable {
        message: e.to_string(),
    }
}

/// A `BrokerPort` backed by a Redis connection (spec §6 `REDIS_URL`).
#[derive(Clone)]
pub struct RedisBroker {
    conn: ConnectionManager,
}

impl RedisBroker {
    pub async fn connect(redis_url: &str) -> Result<Self, CoreError> {
        let client = redis::Client::open(redis_url).map_err(to_core_err)?;
        let conn = client.get_connection_manager().await.map_err(to_core_err)?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl BrokerPort for RedisBroker {
    async fn enqueue(&self, job: Job) -> Result<(), CoreError> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(&job).map_err(|e| CoreError::BrokerUnavailable {
            message: e.to_string(),
        })?;
        conn.rpush::<_, _, ()>(PENDING_KEY, json)
            .await
            .map_err(to_core_err)
    }

    async fn dequeue(&self, timeout: std::time::Duration) -> Result<Option<Job>, CoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("BRPOPLPUSH")
            .arg(PENDING_KEY)
            .arg(PROCESSING_KEY)
            .arg(timeout.as_secs_f64().max(0.01))
            .query_async(&mut conn)
            .await
            .map_err(to_core_err)?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        let job: Job = serde_json::from_str(&raw).map_err(|e| CoreError::BrokerUnavailable {
            message: format!("malformed job payload: {e}"),
        })?;
        conn.hset::<_, _, _, ()>(INDEX_KEY, job.request_id.to_string(), &raw)
            .await
            .map_err(to_core_err)?;
        Ok(Some(job))
    }

    async fn ack(&self, request_id: RequestId) -> Result<(), CoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .hget(INDEX_KEY, request_id.to_string())
            .await
            .map_err(to_core_err)?;
        if let Some(raw) = raw {
            conn.lrem::<_, _, ()>(PROCESSING_KEY, 1, raw)
                .await
                .map_err(to_core_err)?;
            conn.hdel::<_, _, ()>(INDEX_KEY, request_id.to_string())
                .await
                .map_err(to_core_err)?;
        }
        Ok(())
    }
}
