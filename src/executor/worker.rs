// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Execution workers.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use super::job::{ExecutionResult, Job};
use crate::error::JobError;
use crate::ssh::{CommandOutput, RemoteShell};

/// Shared receiving end of the job queue.
pub(crate) type JobQueue = Arc<Mutex<mpsc::Receiver<Job>>>;

/// Worker loop: take jobs until the queue is closed and drained or the run is stopped.
///
/// Every job taken from the queue produces exactly one result. Returns the
/// number of jobs this worker handled.
pub(crate) async fn run_worker<S>(
    worker_id: usize,
    shell: Arc<S>,
    jobs: JobQueue,
    results: mpsc::Sender<ExecutionResult>,
    stop: CancellationToken,
    job_timeout: Option<Duration>,
) -> usize
where
    S: RemoteShell + ?Sized,
{
    let mut handled = 0;

    loop {
        // The queue lock is only held while waiting for the next job.
        let next = tokio::select! {
            biased;
            _ = stop.cancelled() => None,
            job = async { jobs.lock().await.recv().await } => job,
        };
        let Some(job) = next else {
            break;
        };

        tracing::debug!(worker_id, endpoint = %job.endpoint, "Received job from queue");
        let result = execute_job(shell.as_ref(), &job, job_timeout, &stop).await;
        handled += 1;

        if results.send(result).await.is_err() {
            tracing::warn!(worker_id, "Result channel closed, stopping worker");
            break;
        }
        tracing::debug!(worker_id, endpoint = %job.endpoint, "Submitted result for job");
    }

    tracing::debug!(worker_id, handled, "Worker finished");
    handled
}

/// Run one job under the per-job deadline and the run-wide stop signal.
///
/// Abandoning the remote call (deadline or stop) drops its connection.
pub(crate) async fn execute_job<S>(
    shell: &S,
    job: &Job,
    job_timeout: Option<Duration>,
    stop: &CancellationToken,
) -> ExecutionResult
where
    S: RemoteShell + ?Sized,
{
    tracing::debug!(endpoint = %job.endpoint, command = %job.command, "Running command");

    let outcome = tokio::select! {
        biased;
        _ = stop.cancelled() => Err(JobError::Cancelled),
        outcome = with_deadline(shell.run(&job.endpoint, &job.command), job_timeout) => outcome,
    };

    match &outcome {
        Ok(output) => tracing::debug!(endpoint = %job.endpoint, exit = ?output.exit, "Command finished"),
        Err(e) => tracing::info!(endpoint = %job.endpoint, "Job failed: {e}"),
    }

    ExecutionResult::from_outcome(job.endpoint.clone(), outcome)
}

async fn with_deadline<F>(run: F, limit: Option<Duration>) -> Result<CommandOutput, JobError>
where
    F: Future<Output = Result<CommandOutput, JobError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, run)
            .await
            .unwrap_or(Err(JobError::Timeout(limit))),
        None => run.await,
    }
}
