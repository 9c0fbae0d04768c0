//! Job Pipeline (spec §4.5): the per-job orchestrator a worker process runs
//! against each dequeued `Job`. Session setup, resolution, a bounded
//! download fan-out, finalize, stage, and terminal-state publication.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex as AsyncMutex, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use offliner_core::domain::{
    ItemOverrides, ItemOverridesMap, Job, Mode, ProgressPhase, RequestId, Session, Target,
    UserConfig,
};
use offliner_core::error::CoreError;
use offliner_core::ports::{
    DownloadEnginePort, DownloadHooks, EngineRequest, ProgressStorePort, QuotaCheck,
    QuotaTrackerPort, ResolverPort, TransferUpdate,
};

use crate::accumulator::DownloadResult;
use crate::{finalize, session, stage};

/// How often the cancellation watcher re-checks the Progress Store's
/// `cancel_requested` flag for a running job.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(750);
/// One (target, mode) unit of work, already resolved and override-applied.
struct Task {
    target: Target,
    mode: Mode,
    overrides: Option<ItemOverrides>,
}

fn build_task_list(targets: &[Target], item_configs: &ItemOverridesMap, config: &UserConfig) -> Vec<Task> {
    let mut tasks = Vec::new();
    for target in targets {
        let overrides = item_configs.get(&target.url).cloned();
        for mode in config.effective_modes(overrides.as_ref()) {
            tasks.push(Task {
                target: target.clone(),
                mode,
                overrides: overrides.clone(),
            });
        }
    }
    tasks
}

enum RunOutcome {
    Completed(DownloadResult),
    Cancelled,
}

/// Orchestrates one dequeued job end to end.
pub struct JobPipeline {
    resolver: Arc<dyn ResolverPort>,
    engine: Arc<dyn DownloadEnginePort>,
    progress: Arc<dyn ProgressStorePort>,
    quota: Arc<dyn QuotaTrackerPort>,
    temp_root: PathBuf,
    output_root: PathBuf,
}

impl JobPipeline {
    #[must_use]
    pub fn new(
        resolver: Arc<dyn ResolverPort>,
        engine: Arc<dyn DownloadEnginePort>,
        progress: Arc<dyn ProgressStorePort>,
        quota: Arc<dyn QuotaTrackerPort>,
        temp_root: PathBuf,
        output_root: PathBuf,
    ) -> Self {
        Self {
            resolver,
            engine,
            progress,
            quota,
            temp_root,
            output_root,
        }
    }

    /// Run `job` to completion, publishing every state transition to the
    /// Progress Store along the way. Never returns an error: failures are
    /// terminal Progress Record states, not propagated to the caller, so a
    /// worker can always `ack` once this returns.
    pub async fn execute(&self, job: Job) {
        // This deployment's HTTP edge always enqueues jobs against a
        // pipeline-owned temp root, so `Session::external` (which exists in
        // the domain model for a hypothetical out-of-process caller) is
        // never constructed here.
        let session = Session::owned(job.request_id, &self.temp_root);

        if let Err(e) = session::prepare_directory(&session).await {
            warn!(request_id = %job.request_id, error = %e, "failed to prepare session directory");
            self.publish_error(job.request_id, &e.user_message()).await;
            return;
        }

        let credentials_path = match session::provision_credentials(&session.dir, &job.user_config).await {
            Ok(path) => path,
            Err(e) => {
                warn!(request_id = %job.request_id, error = %e, "failed to provision credentials");
                self.publish_error(job.request_id, &e.user_message()).await;
                session::teardown(&session).await;
                return;
            }
        };

        let cancel = CancellationToken::new();
        let watcher = self.spawn_cancel_watcher(job.request_id, cancel.clone());

        let outcome = self.run(&job, &session, credentials_path.as_deref(), &cancel).await;
        watcher.abort();

        match outcome {
            Ok(RunOutcome::Completed(result)) => self.finish(&job, &session, result).await,
            Ok(RunOutcome::Cancelled) => {
                if let Err(e) = self
                    .progress
                    .update(job.request_id, &mut |record| record.mark_cancelled())
                    .await
                {
                    warn!(error = %e, "failed to publish cancellation state");
                }
            }
            Err(e) => self.publish_error(job.request_id, &e.user_message()).await,
        }

        session::teardown(&session).await;
    }

    fn spawn_cancel_watcher(
        &self,
        request_id: RequestId,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let progress = Arc::clone(&self.progress);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(CANCEL_POLL_INTERVAL);
            loop {
                ticker.tick().await;
                match progress.is_cancelled(request_id).await {
                    Ok(true) => {
                        cancel.cancel();
                        break;
                    }
                    Ok(false) => {}
                    Err(e) => warn!(error = %e, "cancellation poll failed"),
                }
            }
        })
    }

    /// Re-check (and record) quota per resolved target, now that real
    /// durations are known (spec §4.6's single-item cap and projected
    /// hourly/daily checks can't be enforced against real content at
    /// enqueue time, before resolution has run). Each target's check and
    /// record happen sequentially so later targets in the same job see
    /// earlier targets' usage already counted.
    fn recheck_quota(&self, job: &Job, targets: &[Target]) -> Result<(), CoreError> {
        for target in targets {
            #[allow(clippy::cast_precision_loss)]
            let duration_minutes = target.duration_secs.map_or(0.0, |secs| secs as f64 / 60.0);
            match self.quota.check(&job.client_identity, duration_minutes) {
                QuotaCheck::Denied { reason, limit, observed } => {
                    return Err(CoreError::QuotaExceeded { reason, limit, observed });
                }
                QuotaCheck::Allowed => {
                    self.quota.record(&job.client_identity, duration_minutes, 1);
                }
            }
        }
        Ok(())
    }

    async fn run(
        &self,
        job: &Job,
        session: &Session,
        credentials_path: Option<&std::path::Path>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, CoreError> {
        let targets = self
            .resolver
            .resolve(
                &job.raw_input,
                job.is_playlist_mode,
                &job.selected_urls,
                &job.item_configs,
                job.user_config.prefer_alternate_source,
                job.user_config.want_audio,
            )
            .await?;

        if targets.is_empty() {
            return Err(CoreError::ResolutionFailed {
                message: "no results".to_string(),
            });
        }

        self.recheck_quota(job, &targets)?;

        let tasks = build_task_list(&targets, &job.item_configs, &job.user_config);
        #[allow(clippy::cast_possible_truncation)]
        let total_items = tasks.len() as u32;

        self.progress
            .update(job.request_id, &mut |record| {
                record.total_items = total_items;
                record.phase = ProgressPhase::Downloading;
                record.status = "Downloading...".to_string();
            })
            .await?;

        let result = Arc::new(AsyncMutex::new(DownloadResult::new(job.request_id, total_items)));
        let worker_count = (job.user_config.max_download_workers as usize)
            .min(tasks.len())
            .max(1);
        let semaphore = Arc::new(Semaphore::new(worker_count));
        let (tx, rx) = mpsc::unbounded_channel();
        let publisher = spawn_progress_publisher(
            Arc::clone(&self.progress),
            Arc::clone(&result),
            job.request_id,
            rx,
        );

        let mut joins = JoinSet::new();
        for task in tasks {
            if cancel.is_cancelled() {
                break;
            }
            let semaphore = Arc::clone(&semaphore);
            let engine = Arc::clone(&self.engine);
            let progress = Arc::clone(&self.progress);
            let result = Arc::clone(&result);
            let cancel = cancel.clone();
            let tx = tx.clone();
            let session_dir = session.dir.clone();
            let credentials_path = credentials_path.map(std::path::Path::to_path_buf);
            let request_id = job.request_id;
            let config = job.user_config.clone();

            joins.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                if cancel.is_cancelled() {
                    return;
                }

                let hooks: Arc<dyn DownloadHooks> = Arc::new(PipelineHooks::new(tx, cancel.clone()));
                let request = EngineRequest {
                    target: &task.target,
                    mode: task.mode,
                    overrides: task.overrides.as_ref(),
                    session_dir: &session_dir,
                    credentials_path: credentials_path.as_deref(),
                };

                let outcome = engine.download(request, &config, hooks).await;
                let (completed, total, pct) = {
                    let mut guard = result.lock().await;
                    match outcome {
                        Ok(path) => guard.record_success(task.mode, path),
                        Err(e) => {
                            if !matches!(e, CoreError::Cancelled) {
                                warn!(request_id = %request_id, mode = ?task.mode, error = %e, "download item failed");
                            }
                            guard.record_failure(task.mode);
                        }
                    }
                    (guard.completed_items, guard.total_items, guard.progress_pct())
                };

                let _ = progress
                    .update(request_id, &mut |record| {
                        record.completed_items = completed;
                        record.total_items = total;
                        record.percent = pct;
                    })
                    .await;
            });
        }
        drop(tx);

        while joins.join_next().await.is_some() {}
        publisher.abort();

        if cancel.is_cancelled() {
            return Ok(RunOutcome::Cancelled);
        }

        let result = result.lock().await.clone();
        Ok(RunOutcome::Completed(result))
    }

    async fn finish(&self, job: &Job, session: &Session, result: DownloadResult) {
        info!(
            request_id = %job.request_id,
            audio_ok = result.counters.audio_ok,
            audio_err = result.counters.audio_err,
            video_ok = result.counters.video_ok,
            video_err = result.counters.video_err,
            "job download phase finished"
        );

        if result.produced_files.is_empty() {
            self.publish_error(job.request_id, &CoreError::DownloadAllFailed.user_message())
                .await;
            return;
        }

        if let Err(e) = self
            .progress
            .update(job.request_id, &mut |record| {
                record.phase = ProgressPhase::Finalizing;
                record.status = "Finalizing...".to_string();
            })
            .await
        {
            warn!(error = %e, "failed to publish finalizing state");
        }

        let session_dir = session.dir.clone();
        let produced = result.produced_files.clone();
        let archive_hint = job.raw_input.clone();
        let packed = tokio::task::spawn_blocking(move || {
            finalize::pack(&session_dir, &produced, &archive_hint)
        })
        .await;

        let artifact = match packed {
            Ok(Ok(Some(path))) => path,
            Ok(Ok(None)) => {
                self.publish_error(job.request_id, "no artifact produced").await;
                return;
            }
            Ok(Err(e)) => {
                self.publish_error(job.request_id, &e.user_message()).await;
                return;
            }
            Err(e) => {
                self.publish_error(job.request_id, &format!("finalize task failed: {e}"))
                    .await;
                return;
            }
        };

        let final_path = if session.owns_directory() {
            match stage::stage(&artifact, &self.output_root).await {
                Ok(path) => path,
                Err(e) => {
                    self.publish_error(job.request_id, &e.user_message()).await;
                    return;
                }
            }
        } else {
            artifact
        };

        if let Err(e) = self
            .progress
            .update(job.request_id, &mut |record| {
                record.mark_done(final_path.to_string_lossy().into_owned());
            })
            .await
        {
            warn!(error = %e, "failed to publish terminal success state");
        }
        info!(request_id = %job.request_id, path = %final_path.display(), "job finished");
    }

    async fn publish_error(&self, request_id: RequestId, message: &str) {
        let message = message.to_string();
        if let Err(e) = self
            .progress
            .update(request_id, &mut |record| record.mark_error(message.clone()))
            .await
        {
            warn!(error = %e, "failed to publish terminal error state");
        }
    }
}

/// Events the synchronous `DownloadHooks` callbacks hand off to the
/// progress-publishing task, which alone talks to the (async)
/// `ProgressStorePort`.
enum HookEvent {
    Transfer {
        local_percent: u8,
        current_file: String,
        speed: Option<String>,
        eta: Option<String>,
    },
    PostprocessStarted {
        name: String,
    },
}

/// Rate-limiter for how often `on_transfer` forwards an update, so a fast
/// local download doesn't flood the Progress Store with writes.
struct ProgressThrottle {
    last_emit: Option<std::time::Instant>,
    min_interval: Duration,
}

impl ProgressThrottle {
    const fn new(min_interval: Duration) -> Self {
        Self {
            last_emit: None,
            min_interval,
        }
    }

    fn should_emit(&mut self) -> bool {
        let now = std::time::Instant::now();
        match self.last_emit {
            Some(last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                self.last_emit = Some(now);
                true
            }
        }
    }
}

struct PipelineHooks {
    tx: mpsc::UnboundedSender<HookEvent>,
    throttle: std::sync::Mutex<ProgressThrottle>,
    cancel: CancellationToken,
}

impl PipelineHooks {
    fn new(tx: mpsc::UnboundedSender<HookEvent>, cancel: CancellationToken) -> Self {
        Self {
            tx,
            throttle: std::sync::Mutex::new(ProgressThrottle::new(Duration::from_millis(250))),
            cancel,
        }
    }
}

impl DownloadHooks for PipelineHooks {
    fn on_transfer(&self, item_local_percent: u8, update: &TransferUpdate) -> Result<(), CoreError> {
        if self.cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        let mut throttle = self.throttle.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if throttle.should_emit() {
            let _ = self.tx.send(HookEvent::Transfer {
                local_percent: item_local_percent,
                current_file: update.current_file.clone(),
                speed: update.speed.clone(),
                eta: update.eta.clone(),
            });
        }
        Ok(())
    }

    fn on_postprocess_started(&self, name: &str) {
        let _ = self.tx.send(HookEvent::PostprocessStarted {
            name: name.to_string(),
        });
    }
}

fn spawn_progress_publisher(
    progress: Arc<dyn ProgressStorePort>,
    result: Arc<AsyncMutex<DownloadResult>>,
    request_id: RequestId,
    mut rx: mpsc::UnboundedReceiver<HookEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                HookEvent::Transfer {
                    local_percent,
                    current_file,
                    speed,
                    eta,
                } => {
                    let pct = result.lock().await.interpolated_pct(local_percent);
                    let _ = progress
                        .update(request_id, &mut |record| {
                            record.percent = pct;
                            record.phase = ProgressPhase::Downloading;
                            record.current_file = Some(current_file.clone());
                            record.speed = speed.clone();
                            record.eta = eta.clone();
                        })
                        .await;
                }
                HookEvent::PostprocessStarted { name } => {
                    let pct = result.lock().await.progress_pct();
                    let _ = progress
                        .update(request_id, &mut |record| {
                            record.percent = pct;
                            record.phase = ProgressPhase::Converting;
                            record.status = name.clone();
                        })
                        .await;
                }
            }
        }
    })
}
