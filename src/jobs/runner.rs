//! Job runner - the single worker loop
//!
//! The runner takes job ids off the queue one at a time, crawls them and
//! records the outcome in the job store. A job can fail in any way without
//! stopping the loop; only the shutdown signal (or every producer going
//! away) ends it. The signal is observed between jobs, never during one.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::config::WorkerConfig;
use crate::crawler::CrawlController;
use crate::jobs::{Dequeued, JobReceiver, JobStatus};
use crate::storage::{JobStore, StorageError};
use crate::HarvestError;

/// Failure message recorded when a crawl produced no records
pub const NO_DATA_MESSAGE: &str = "No data extracted";

/// Single-consumer worker driving crawls for queued jobs
pub struct JobRunner<S: JobStore + 'static> {
    store: Arc<Mutex<S>>,
    controller: Arc<CrawlController>,
    receiver: JobReceiver,
    worker: WorkerConfig,
}

enum Step {
    Shutdown,
    Next(Dequeued),
}

impl<S: JobStore + 'static> JobRunner<S> {
    pub fn new(
        store: Arc<Mutex<S>>,
        controller: Arc<CrawlController>,
        receiver: JobReceiver,
        worker: WorkerConfig,
    ) -> Self {
        Self {
            store,
            controller,
            receiver,
            worker,
        }
    }

    /// Runs until `shutdown` turns true, its sender is dropped, or the queue
    /// closes
    ///
    /// # Returns
    ///
    /// The number of job ids taken off the queue
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> usize {
        tracing::info!("Job runner started");
        let mut processed = 0;

        loop {
            let step = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => Step::Shutdown,
                next = self.receiver.dequeue(self.worker.dequeue_timeout()) => Step::Next(next),
            };

            match step {
                Step::Shutdown => {
                    tracing::info!("Shutdown requested, stopping job runner");
                    break;
                }
                Step::Next(Dequeued::Job(job_id)) => {
                    self.process_job(&job_id).await;
                    processed += 1;
                }
                Step::Next(Dequeued::Empty) => {
                    let idle = tokio::time::sleep(self.worker.idle_delay());
                    tokio::select! {
                        biased;
                        _ = shutdown_requested(&mut shutdown) => {
                            tracing::info!("Shutdown requested, stopping job runner");
                            break;
                        }
                        _ = idle => {}
                    }
                }
                Step::Next(Dequeued::Closed) => {
                    tracing::info!("Job queue closed, stopping job runner");
                    break;
                }
            }
        }

        processed
    }

    /// Processes every job id already waiting, then returns
    ///
    /// # Returns
    ///
    /// The number of job ids taken off the queue
    pub async fn run_until_idle(&mut self) -> usize {
        let mut processed = 0;
        while let Some(job_id) = self.receiver.try_dequeue() {
            self.process_job(&job_id).await;
            processed += 1;
        }
        processed
    }

    /// Runs one job and records its outcome
    ///
    /// Never fails: every error, including a panic inside the crawl, ends up
    /// as a `failed` status with the error message.
    ///
    /// # Returns
    ///
    /// * `Some(status)` - The terminal status the job reached
    /// * `None` - The job was unknown or no longer queued, and was skipped
    pub async fn process_job(&self, job_id: &str) -> Option<JobStatus> {
        let store = Arc::clone(&self.store);
        let controller = Arc::clone(&self.controller);
        let id = job_id.to_string();

        let handle = tokio::spawn(async move { execute_job(store, controller, id).await });

        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(HarvestError::Worker(e.to_string())),
        };

        match result {
            Ok(status) => status,
            Err(e) => {
                tracing::error!("Job {} failed: {}", job_id, e);
                self.mark_failed(job_id, &e.to_string());
                Some(JobStatus::Failed)
            }
        }
    }

    fn mark_failed(&self, job_id: &str, message: &str) {
        let result = lock(&self.store)
            .and_then(|mut store| store.set_status(job_id, JobStatus::Failed, Some(message)));
        if let Err(e) = result {
            tracing::error!("Could not record failure of job {}: {}", job_id, e);
        }
    }
}

/// Resolves once shutdown is signalled or the signal's sender is gone
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

fn lock<S>(store: &Mutex<S>) -> Result<MutexGuard<'_, S>, StorageError> {
    store.lock().map_err(|_| StorageError::LockPoisoned)
}

async fn execute_job<S: JobStore>(
    store: Arc<Mutex<S>>,
    controller: Arc<CrawlController>,
    job_id: String,
) -> Result<Option<JobStatus>, HarvestError> {
    let job = lock(&store)?.get_job(&job_id)?;

    let Some(job) = job else {
        tracing::warn!("Job {} not found, skipping", job_id);
        return Ok(None);
    };

    if job.status != JobStatus::Queued {
        tracing::warn!("Job {} is {}, not queued; skipping", job_id, job.status);
        return Ok(None);
    }

    lock(&store)?.set_status(&job_id, JobStatus::Running, None)?;
    tracing::info!("Running job {} for {}", job_id, job.spec.url);

    let outcome = controller.crawl(&job.spec).await?;

    if outcome.records.is_empty() {
        tracing::info!("Job {} extracted no records", job_id);
        lock(&store)?.set_status(&job_id, JobStatus::Failed, Some(NO_DATA_MESSAGE))?;
        return Ok(Some(JobStatus::Failed));
    }

    {
        let mut store = lock(&store)?;
        store.save_results(&job_id, &outcome.records)?;
        store.set_status(&job_id, JobStatus::Completed, None)?;
    }

    tracing::info!(
        "Job {} completed: {} records from {} pages",
        job_id,
        outcome.records.len(),
        outcome.pages_fetched
    );
    Ok(Some(JobStatus::Completed))
}
