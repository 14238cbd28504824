//! In-process FIFO queue of job ids
//!
//! Any number of producers hold a cloned [`JobQueue`]; the single worker owns
//! the [`JobReceiver`].

use std::time::Duration;

use tokio::sync::mpsc;

/// Outcome of waiting on the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dequeued {
    /// The next job id
    Job(String),
    /// Nothing arrived before the timeout
    Empty,
    /// Every producer has been dropped and the queue is drained
    Closed,
}

/// Producer side of the job queue
#[derive(Debug, Clone)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<String>,
}

/// Consumer side of the job queue
#[derive(Debug)]
pub struct JobReceiver {
    receiver: mpsc::UnboundedReceiver<String>,
}

/// Creates a connected producer/consumer pair
pub fn job_queue() -> (JobQueue, JobReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (JobQueue { sender }, JobReceiver { receiver })
}

impl JobQueue {
    /// Appends a job id to the queue
    ///
    /// Returns false if the worker side has been dropped.
    pub fn enqueue(&self, job_id: impl Into<String>) -> bool {
        let job_id = job_id.into();
        match self.sender.send(job_id) {
            Ok(()) => true,
            Err(mpsc::error::SendError(job_id)) => {
                tracing::warn!("Job queue closed, dropping job {}", job_id);
                false
            }
        }
    }
}

impl JobReceiver {
    /// Waits up to `timeout` for the next job id
    pub async fn dequeue(&mut self, timeout: Duration) -> Dequeued {
        match tokio::time::timeout(timeout, self.receiver.recv()).await {
            Ok(Some(job_id)) => Dequeued::Job(job_id),
            Ok(None) => Dequeued::Closed,
            Err(_) => Dequeued::Empty,
        }
    }

    /// Takes the next job id if one is already waiting
    pub fn try_dequeue(&mut self) -> Option<String> {
        self.receiver.try_recv().ok()
    }
}
