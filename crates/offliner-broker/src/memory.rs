//! An in-process fake `BrokerPort`, for tests that don't want a real Redis.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use offliner_core::domain::RequestId;
use offliner_core::ports::BrokerPort;
use offliner_core::{CoreError, Job};

#[derive(Default)]
struct State {
    pending: VecDeque<Job>,
    processing: HashMap<RequestId, Job>,
}

/// FIFO in-memory broker. `dequeue` waits on a `Notify` rather than
/// polling, woken by every `enqueue`.
#[derive(Default)]
pub struct InMemoryBroker {
    state: Mutex<State>,
    notify: Notify,
}

impl InMemoryBroker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BrokerPort for InMemoryBroker {
    async fn enqueue(&self, job: Job) -> Result<(), CoreError> {
        self.state.lock().unwrap().pending.push_back(job);
        self.notify.notify_one();
        Ok(())
    }

    async fn dequeue(&self, timeout: std::time::Duration) -> Result<Option<Job>, CoreError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(job) = self.state.lock().unwrap().pending.pop_front() {
                self.state
                    .lock()
                    .unwrap()
                    .processing
                    .insert(job.request_id, job.clone());
                return Ok(Some(job));
            }
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            tokio::select! {
                () = self.notify.notified() => {}
                () = tokio::time::sleep(remaining) => return Ok(None),
            }
        }
    }

    async fn ack(&self, request_id: RequestId) -> Result<(), CoreError> {
        self.state.lock().unwrap().processing.remove(&request_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offliner_core::domain::{ItemOverridesMap, UserConfig};

    fn sample_job() -> Job {
        Job {
            request_id: RequestId::new(),
            user_config: UserConfig::default(),
            raw_input: "never gonna give you up".to_string(),
            is_playlist_mode: false,
            selected_urls: Vec::new(),
            item_configs: ItemOverridesMap::new(),
            session_dir: "/tmp/sess".to_string(),
            broker_connection_string: "redis://127.0.0.1:6379/0".to_string(),
            client_identity: "client-1".to_string(),
        }
    }

    #[tokio::test]
    async fn fifo_order_is_preserved() {
        let broker = InMemoryBroker::new();
        let first = sample_job();
        let second = sample_job();
        broker.enqueue(first.clone()).await.unwrap();
        broker.enqueue(second.clone()).await.unwrap();

        let got_first = broker
            .dequeue(std::time::Duration::from_millis(50))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got_first.request_id, first.request_id);
    }

    #[tokio::test]
    async fn dequeue_times_out_on_empty_queue() {
        let broker = InMemoryBroker::new();
        let result = broker
            .dequeue(std::time::Duration::from_millis(20))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn ack_removes_from_in_flight_set() {
        let broker = InMemoryBroker::new();
        let job = sample_job();
        broker.enqueue(job.clone()).await.unwrap();
        broker
            .dequeue(std::time::Duration::from_millis(50))
            .await
            .unwrap();
        assert!(broker.state.lock().unwrap().processing.contains_key(&job.request_id));
        broker.ack(job.request_id).await.unwrap();
        assert!(!broker.state.lock().unwrap().processing.contains_key(&job.request_id));
    }
}
