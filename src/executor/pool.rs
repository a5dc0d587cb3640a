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

//! Bounded worker pool fanning one command out to many endpoints.
//!
//! The dispatcher pushes one job per endpoint into a job queue of capacity C
//! (so submission stalls once C jobs are waiting), `min(C, N)` workers drain
//! it, and every result flows through a second bounded channel into the
//! aggregator task. The result channel closes only after all workers have
//! exited, which lets the aggregator finish and print.
//!
//! The run-wide stop token is cancelled by the global deadline or by the
//! caller (see [`Dispatcher::stop_token`]). Workers stop taking jobs and
//! abandon in-flight ones; anything left unstarted is reported as cancelled,
//! so a run always yields one result per endpoint. Submission also stops if
//! every worker has died, since nothing would drain the queue any more.

use anyhow::{Context, Result};
use futures::future::join_all;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::job::{ExecutionResult, Job};
use super::worker::{run_worker, JobQueue};
use crate::config::Config;
use crate::endpoint::Endpoint;
use crate::error::JobError;
use crate::report::{Aggregator, Report};
use crate::ssh::RemoteShell;

pub struct Dispatcher<S: ?Sized> {
    config: Config,
    shell: Arc<S>,
    stop: CancellationToken,
    colors: bool,
}

impl<S> Dispatcher<S>
where
    S: RemoteShell + ?Sized,
{
    pub fn new(config: Config, shell: Arc<S>) -> Self {
        Self {
            config,
            shell,
            stop: CancellationToken::new(),
            colors: false,
        }
    }

    /// Color OK/FAILED in the printed report.
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// Token that stops the run when cancelled.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Run `command` on every endpoint and print the report to `writer`.
    ///
    /// Returns once the report has been written. Per-endpoint failures are in
    /// the report; an `Err` means the report itself could not be produced.
    pub async fn run<W>(&self, endpoints: Vec<Endpoint>, command: &str, writer: W) -> Result<Report>
    where
        W: Write + Send + 'static,
    {
        let capacity = self.config.max_flight();
        let workers = self.config.worker_count(endpoints.len());
        let stop = self.stop.child_token();

        tracing::info!(
            endpoints = endpoints.len(),
            workers,
            "Dispatching command"
        );

        let (job_tx, job_rx) = mpsc::channel::<Job>(capacity);
        let (result_tx, result_rx) = mpsc::channel::<ExecutionResult>(capacity);

        let aggregator = tokio::spawn(
            Aggregator::new(self.config.grouping(), writer)
                .with_colors(self.colors)
                .run(result_rx),
        );
        let deadline = self
            .config
            .global_timeout()
            .map(|limit| spawn_deadline(limit, stop.clone()));

        let jobs: JobQueue = Arc::new(Mutex::new(job_rx));
        // Every worker holds a sender, so `recv` yields `None` once all of
        // them have exited, panicked ones included.
        let (alive_tx, mut alive_rx) = mpsc::channel::<()>(1);
        let handles: Vec<JoinHandle<usize>> = (0..workers)
            .map(|worker_id| {
                let alive = alive_tx.clone();
                let worker = run_worker(
                    worker_id,
                    Arc::clone(&self.shell),
                    Arc::clone(&jobs),
                    result_tx.clone(),
                    stop.clone(),
                    self.config.job_timeout(),
                );
                tokio::spawn(async move {
                    let _alive = alive;
                    worker.await
                })
            })
            .collect();
        drop(alive_tx);

        let command: Arc<str> = Arc::from(command);
        let mut unsubmitted = Vec::new();
        for endpoint in endpoints {
            if !unsubmitted.is_empty() {
                unsubmitted.push(endpoint);
                continue;
            }
            let permit = tokio::select! {
                biased;
                _ = stop.cancelled() => None,
                _ = alive_rx.recv() => {
                    tracing::error!("All workers exited, no more jobs will be started");
                    None
                }
                permit = job_tx.reserve() => permit.ok(),
            };
            match permit {
                Some(permit) => {
                    tracing::debug!(endpoint = %endpoint, "Creating job for host");
                    permit.send(Job::new(endpoint, Arc::clone(&command)));
                }
                None => unsubmitted.push(endpoint),
            }
        }
        // No more work: workers exit once the queue is drained.
        drop(job_tx);

        for (worker_id, handled) in join_all(handles).await.into_iter().enumerate() {
            match handled {
                Ok(handled) => tracing::debug!(worker_id, handled, "Worker joined"),
                Err(e) => tracing::error!(worker_id, "Worker task failed: {e}"),
            }
        }

        // Only a stopped run leaves jobs behind; report them as cancelled.
        let mut leftover = Vec::new();
        {
            let mut queue = jobs.lock().await;
            while let Ok(job) = queue.try_recv() {
                leftover.push(job.endpoint);
            }
        }
        leftover.extend(unsubmitted);
        if !leftover.is_empty() {
            tracing::warn!(jobs = leftover.len(), "Run stopped before all jobs started");
        }
        for endpoint in leftover {
            let result = ExecutionResult::failure(endpoint, JobError::Cancelled, Vec::new());
            if result_tx.send(result).await.is_err() {
                tracing::warn!("Aggregator exited before all results were delivered");
                break;
            }
        }

        drop(result_tx);
        if let Some(deadline) = deadline {
            deadline.abort();
        }

        let report = aggregator
            .await
            .context("Aggregator task failed")?
            .context("Failed to write report")?;

        tracing::info!(
            results = report.result_count(),
            failed = report.failure_count(),
            groups = report.groups().len(),
            "Run complete"
        );
        Ok(report)
    }
}

/// Cancel `stop` once `limit` has elapsed.
fn spawn_deadline(limit: Duration, stop: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = stop.cancelled() => {}
            _ = tokio::time::sleep(limit) => {
                tracing::warn!("Global timeout of {}s exceeded, stopping workers", limit.as_secs());
                stop.cancel();
            }
        }
    })
}
