//! Priority Scheduler
//!
//! Two FIFO lanes of jobs drained by one worker task. The interactive lane is
//! always served before the bulk lane, exactly one job runs at a time, every
//! job is bounded by a wall-clock timeout, and a fixed pacing delay separates
//! consecutive jobs.
//!
//! Submitters get a [`PendingArtifact`] back immediately. The worker writes
//! exactly one result to it; if the worker goes away first, the future
//! resolves with [`ApiError::SchedulerUnavailable`].

use crate::artifact::{Artifact, Language};
use crate::config::SchedulerConfig;
use crate::error::ApiError;
use crate::generation::JobExecutor;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{oneshot, Notify};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Priority class of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lane {
    /// User-triggered requests
    Interactive,
    /// Background batch requests
    Bulk,
}

impl Lane {
    pub fn as_str(self) -> &'static str {
        match self {
            Lane::Interactive => "interactive",
            Lane::Bulk => "bulk",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lane {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interactive" | "user" => Ok(Lane::Interactive),
            "bulk" | "batch" => Ok(Lane::Bulk),
            other => Err(format!("unknown lane '{}'", other)),
        }
    }
}

/// Job identifier, unique within the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(u64);

impl JobId {
    fn next() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        JobId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type JobResult = Result<Artifact, ApiError>;

/// One queued request. Consumed exactly once by the worker.
struct Job {
    id: JobId,
    requested_name: String,
    language: Language,
    lane: Lane,
    submitted_at: DateTime<Utc>,
    result_tx: oneshot::Sender<JobResult>,
}

impl Job {
    fn resolve(self, result: JobResult) {
        // A dropped PendingArtifact just means nobody is waiting.
        let _ = self.result_tx.send(result);
    }
}

/// Result handle returned by `submit_*`.
#[derive(Debug)]
pub struct PendingArtifact {
    job_id: JobId,
    rx: oneshot::Receiver<JobResult>,
}

impl PendingArtifact {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }
}

impl Future for PendingArtifact {
    type Output = JobResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(ApiError::SchedulerUnavailable(
                    "scheduler stopped before the job finished".to_string(),
                ))
            })
        })
    }
}

/// Monotonic counters, reset only on restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    pub interactive_completed: u64,
    pub bulk_completed: u64,
    pub failed: u64,
    /// Total run time of successful jobs
    pub cumulative_run_ms: u64,
}

/// The job currently executing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentJob {
    pub id: JobId,
    pub requested_name: String,
    pub language: Language,
    pub lane: Lane,
    pub submitted_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
}

/// Read-only snapshot returned by [`PriorityScheduler::status`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulerStatus {
    pub interactive_depth: usize,
    pub bulk_depth: usize,
    pub is_running: bool,
    pub current_job: Option<CurrentJob>,
    pub stats: SchedulerStats,
}

#[derive(Default)]
struct RunState {
    interactive: VecDeque<Job>,
    bulk: VecDeque<Job>,
    is_running: bool,
    current_job: Option<CurrentJob>,
    stats: SchedulerStats,
    shut_down: bool,
    /// Pipeline task of the running job
    pipeline: Option<AbortHandle>,
}

impl RunState {
    fn lane_mut(&mut self, lane: Lane) -> &mut VecDeque<Job> {
        match lane {
            Lane::Interactive => &mut self.interactive,
            Lane::Bulk => &mut self.bulk,
        }
    }

    /// Interactive head first, bulk head otherwise.
    fn next_job(&mut self) -> Option<Job> {
        if let Some(job) = self.interactive.pop_front() {
            return Some(job);
        }
        self.bulk.pop_front()
    }

    fn record(&mut self, lane: Lane, outcome: &JobResult, elapsed_ms: u64) {
        match (outcome, lane) {
            (Ok(_), Lane::Interactive) => self.stats.interactive_completed += 1,
            (Ok(_), Lane::Bulk) => self.stats.bulk_completed += 1,
            (Err(_), _) => self.stats.failed += 1,
        }
        if outcome.is_ok() {
            self.stats.cumulative_run_ms += elapsed_ms;
        }
    }
}

struct Shared {
    state: Mutex<RunState>,
    notify: Notify,
}

/// Two-lane, single-flight job scheduler.
pub struct PriorityScheduler {
    shared: Arc<Shared>,
    executor: Arc<dyn JobExecutor>,
    config: SchedulerConfig,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PriorityScheduler {
    /// Create a scheduler. Jobs submitted before [`start`](Self::start) wait in
    /// their lanes.
    pub fn new(executor: Arc<dyn JobExecutor>, config: SchedulerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(RunState::default()),
                notify: Notify::new(),
            }),
            executor,
            config,
            worker: Mutex::new(None),
        }
    }

    /// Create and start a scheduler.
    pub fn spawn(executor: Arc<dyn JobExecutor>, config: SchedulerConfig) -> Result<Self, ApiError> {
        let scheduler = Self::new(executor, config);
        scheduler.start()?;
        Ok(scheduler)
    }

    /// Start the worker task. Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), ApiError> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Ok(());
        }
        if self.shared.state.lock().shut_down {
            return Err(ApiError::SchedulerUnavailable(
                "scheduler has been shut down".to_string(),
            ));
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            ApiError::SchedulerUnavailable(format!("no async runtime to start worker: {}", e))
        })?;

        let shared = Arc::clone(&self.shared);
        let executor = Arc::clone(&self.executor);
        let config = self.config.clone();
        *worker = Some(runtime.spawn(Self::worker_loop(shared, executor, config)));

        info!(
            job_timeout_secs = self.config.job_timeout_secs,
            pacing_delay_ms = self.config.pacing_delay_ms,
            "Started scheduler worker"
        );
        Ok(())
    }

    pub fn submit_interactive(&self, requested_name: &str, language: Language) -> PendingArtifact {
        self.submit(requested_name, language, Lane::Interactive)
    }

    pub fn submit_bulk(&self, requested_name: &str, language: Language) -> PendingArtifact {
        self.submit(requested_name, language, Lane::Bulk)
    }

    /// Append a job to `lane` and wake the worker.
    pub fn submit(&self, requested_name: &str, language: Language, lane: Lane) -> PendingArtifact {
        let (result_tx, rx) = oneshot::channel();
        let job = Job {
            id: JobId::next(),
            requested_name: requested_name.to_string(),
            language,
            lane,
            submitted_at: Utc::now(),
            result_tx,
        };
        let job_id = job.id;

        let mut state = self.shared.state.lock();
        if state.shut_down {
            drop(state);
            job.resolve(Err(ApiError::SchedulerUnavailable(
                "scheduler has been shut down".to_string(),
            )));
            return PendingArtifact { job_id, rx };
        }

        state.lane_mut(lane).push_back(job);
        let (interactive_depth, bulk_depth) = (state.interactive.len(), state.bulk.len());
        drop(state);

        self.shared.notify.notify_one();

        info!(
            job_id = %job_id,
            requested_name,
            language = %language,
            lane = %lane,
            interactive_depth,
            bulk_depth,
            "Job enqueued"
        );
        PendingArtifact { job_id, rx }
    }

    /// Snapshot of lanes, run state and counters. Never blocks on a job.
    pub fn status(&self) -> SchedulerStatus {
        let state = self.shared.state.lock();
        SchedulerStatus {
            interactive_depth: state.interactive.len(),
            bulk_depth: state.bulk.len(),
            is_running: state.is_running,
            current_job: state.current_job.clone(),
            stats: state.stats.clone(),
        }
    }

    /// Drop every queued bulk job, rejecting each with `JobCancelled`. The
    /// running job and the interactive lane are untouched.
    pub fn clear_bulk_lane(&self) -> usize {
        let removed: Vec<Job> = self.shared.state.lock().bulk.drain(..).collect();
        let count = removed.len();

        for job in removed {
            let reason = format!("'{}' was removed from the bulk lane", job.requested_name);
            job.resolve(Err(ApiError::JobCancelled(reason)));
        }

        info!(removed = count, "Bulk lane cleared");
        count
    }

    /// Stop accepting work and stop the worker after the current job.
    /// Queued jobs and later submissions are rejected with `SchedulerUnavailable`.
    pub async fn shutdown(&self) {
        let stranded: Vec<Job> = {
            let mut state = self.shared.state.lock();
            if state.shut_down {
                return;
            }
            state.shut_down = true;
            let mut stranded: Vec<Job> = state.interactive.drain(..).collect();
            stranded.extend(state.bulk.drain(..));
            stranded
        };
        self.shared.notify.notify_one();

        let rejected = stranded.len();
        for job in stranded {
            job.resolve(Err(ApiError::SchedulerUnavailable(
                "scheduler shut down before the job started".to_string(),
            )));
        }

        let worker = self.worker.lock().take();
        if let Some(handle) = worker {
            if let Err(e) = handle.await {
                error!(error = %e, "Scheduler worker ended abnormally");
            }
        }

        info!(rejected, "Scheduler shut down");
    }

    async fn worker_loop(shared: Arc<Shared>, executor: Arc<dyn JobExecutor>, config: SchedulerConfig) {
        debug!("Scheduler worker started");

        loop {
            let next = {
                let mut state = shared.state.lock();
                if state.shut_down {
                    break;
                }
                let job = state.next_job();
                if let Some(job) = &job {
                    state.is_running = true;
                    state.current_job = Some(CurrentJob {
                        id: job.id,
                        requested_name: job.requested_name.clone(),
                        language: job.language,
                        lane: job.lane,
                        submitted_at: job.submitted_at,
                        started_at: Utc::now(),
                    });
                }
                job
            };

            let Some(job) = next else {
                shared.notify.notified().await;
                continue;
            };

            Self::run_job(&shared, &executor, &config, job).await;

            // Pacing is unconditional; jobs submitted meanwhile wait it out.
            tokio::time::sleep(config.pacing_delay()).await;
            shared.state.lock().is_running = false;
        }

        shared.state.lock().is_running = false;
        debug!("Scheduler worker stopped");
    }

    async fn run_job(
        shared: &Shared,
        executor: &Arc<dyn JobExecutor>,
        config: &SchedulerConfig,
        job: Job,
    ) {
        info!(
            job_id = %job.id,
            requested_name = %job.requested_name,
            language = %job.language,
            lane = %job.lane,
            "Job started"
        );

        let started = Instant::now();
        let mut pipeline = {
            let executor = Arc::clone(executor);
            let requested_name = job.requested_name.clone();
            let language = job.language;
            tokio::spawn(async move { executor.run(&requested_name, language).await })
        };
        shared.state.lock().pipeline = Some(pipeline.abort_handle());

        let outcome = match tokio::time::timeout(config.job_timeout(), &mut pipeline).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(ApiError::GenerationFailed(format!(
                "pipeline for '{}' aborted: {}",
                job.requested_name, join_error
            ))),
            Err(_) => {
                pipeline.abort();
                warn!(
                    job_id = %job.id,
                    requested_name = %job.requested_name,
                    timeout_secs = config.job_timeout_secs,
                    "Job timed out"
                );
                Err(ApiError::TimeoutError(format!(
                    "generation of '{}' exceeded {} seconds",
                    job.requested_name, config.job_timeout_secs
                )))
            }
        };
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        {
            let mut state = shared.state.lock();
            state.record(job.lane, &outcome, elapsed_ms);
            state.current_job = None;
            state.pipeline = None;
        }

        match &outcome {
            Ok(artifact) => info!(
                job_id = %job.id,
                artifact_id = %artifact.id,
                lane = %job.lane,
                elapsed_ms,
                "Job completed"
            ),
            Err(e) => error!(
                job_id = %job.id,
                requested_name = %job.requested_name,
                lane = %job.lane,
                elapsed_ms,
                error = %e,
                "Job failed"
            ),
        }

        job.resolve(outcome);
    }
}

/// Dropping the scheduler stops the worker and the running job's pipeline.
/// Waiters are released with `SchedulerUnavailable`.
impl Drop for PriorityScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.get_mut().take() {
            handle.abort();
        }
        if let Some(pipeline) = self.shared.state.lock().pipeline.take() {
            pipeline.abort();
        }
    }
}
