// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Task Runner
 * Bounded worker pool executing TLS tasks against the protocol engine
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use super::TlsTask;
use crate::engine::{ConnectionGuard, ProtocolEngine, Trace};
use crate::errors::TransportError;
use crate::metrics::TaskMetrics;
use crate::retry::ConnectionTimeouts;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

/// Worker pool shared by every probe of a scan
///
/// At most `threads` tasks hold a connection at any time, no matter how
/// many probes submit work concurrently.
pub struct TaskRunner {
    engine: Arc<dyn ProtocolEngine>,
    semaphore: Arc<Semaphore>,
    threads: usize,
    base_timeouts: ConnectionTimeouts,
    metrics: TaskMetrics,
}

impl TaskRunner {
    pub fn new(engine: Arc<dyn ProtocolEngine>, threads: usize, base_timeouts: ConnectionTimeouts) -> Self {
        let threads = threads.max(1);
        Self {
            engine,
            semaphore: Arc::new(Semaphore::new(threads)),
            threads,
            base_timeouts,
            metrics: TaskMetrics::new(),
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn base_timeouts(&self) -> ConnectionTimeouts {
        self.base_timeouts
    }

    pub fn metrics(&self) -> &TaskMetrics {
        &self.metrics
    }

    /// Execute one task on the pool
    pub async fn execute(&self, mut task: TlsTask) -> TlsTask {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                task.mark_failed();
                return task;
            }
        };
        run_task(self.engine.as_ref(), task, self.base_timeouts, &self.metrics).await
    }

    /// Execute all tasks and return them in submission order
    ///
    /// Each returned task either carries a result or has `has_error` set.
    pub async fn bulk_execute(&self, tasks: Vec<TlsTask>) -> Vec<TlsTask> {
        let mut handles = Vec::with_capacity(tasks.len());

        for task in tasks {
            let fallback = task.clone();
            let semaphore = Arc::clone(&self.semaphore);
            let engine = Arc::clone(&self.engine);
            let metrics = self.metrics.clone();
            let base = self.base_timeouts;

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        let mut task = task;
                        task.mark_failed();
                        return task;
                    }
                };
                run_task(engine.as_ref(), task, base, &metrics).await
            });
            handles.push((handle, fallback));
        }

        let mut finished = Vec::with_capacity(handles.len());
        for (handle, fallback) in handles {
            match handle.await {
                Ok(task) => finished.push(task),
                Err(e) => {
                    error!(task = fallback.label(), error = %e, "Task join error");
                    let mut task = fallback;
                    task.mark_failed();
                    finished.push(task);
                }
            }
        }
        finished
    }
}

/// Retry loop around a single task
async fn run_task(
    engine: &dyn ProtocolEngine,
    mut task: TlsTask,
    base: ConnectionTimeouts,
    metrics: &TaskMetrics,
) -> TlsTask {
    let started = Instant::now();
    let max_attempts = task.policy().max_attempts();

    for attempt in 1..=max_attempts {
        let timeouts = task.policy().timeouts_for_attempt(base, attempt);
        task.record_attempt();

        match execute_once(engine, &task, timeouts, metrics).await {
            Ok(trace) => {
                if task.accept(trace) {
                    if attempt > 1 {
                        debug!(task = task.label(), attempt = attempt, "Task succeeded after retry");
                    }
                    metrics.record_task(task.label(), attempt, false, started.elapsed());
                    return task;
                }
                debug!(
                    task = task.label(),
                    attempt = attempt,
                    "Workflow not executed as planned"
                );
            }
            Err(err) => {
                metrics.record_transport_error(transport_error_kind(&err));
                warn!(
                    task = task.label(),
                    attempt = attempt,
                    max_attempts = max_attempts,
                    error = %err,
                    retryable = err.is_retryable(),
                    "Task attempt failed"
                );
                if !err.is_retryable() {
                    break;
                }
            }
        }

        if attempt < max_attempts {
            let backoff = task.policy().calculate_backoff(attempt);
            metrics.record_retry(attempt, backoff);
            if !backoff.is_zero() {
                tokio::time::sleep(backoff).await;
            }
        }
    }

    warn!(
        task = task.label(),
        attempts = task.attempts(),
        "Task exhausted its re-executions"
    );
    task.mark_failed();
    metrics.record_task(task.label(), task.attempts(), true, started.elapsed());
    task
}

async fn execute_once(
    engine: &dyn ProtocolEngine,
    task: &TlsTask,
    timeouts: ConnectionTimeouts,
    metrics: &TaskMetrics,
) -> Result<Trace, TransportError> {
    let connection = tokio::time::timeout(timeouts.tcp, engine.connect(timeouts))
        .await
        .map_err(|_| TransportError::ConnectionTimeout {
            peer: "target".to_string(),
            timeout: timeouts.tcp,
        })??;
    metrics.record_connection();

    let mut guard = ConnectionGuard::new(connection);
    let limit = hard_limit(timeouts, task.workflow().receive_count());
    let result = tokio::time::timeout(limit, guard.execute(task.workflow(), task.config(), timeouts))
        .await
        .map_err(|_| TransportError::ResponseTimeout { timeout: limit })?;
    result
}

/// Upper bound for a whole workflow: one response timeout per receive, plus slack
fn hard_limit(timeouts: ConnectionTimeouts, receives: usize) -> Duration {
    timeouts.response * (receives.max(1) as u32 + 1)
}

fn transport_error_kind(err: &TransportError) -> &'static str {
    match err {
        TransportError::ConnectionTimeout { .. } => "ConnectionTimeout",
        TransportError::ResponseTimeout { .. } => "ResponseTimeout",
        TransportError::ConnectionRefused { .. } => "ConnectionRefused",
        TransportError::ConnectionReset { .. } => "ConnectionReset",
        TransportError::Unreachable { .. } => "Unreachable",
        TransportError::Engine(_) => "Engine",
    }
}
