// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Task Metrics
 * Counters for TLS task execution with tracing integration
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Metrics collector shared by every task executed through a runner
#[derive(Debug, Clone, Default)]
pub struct TaskMetrics {
    tasks_total: Arc<AtomicU64>,
    tasks_failed: Arc<AtomicU64>,
    attempts_retried: Arc<AtomicU64>,
    transport_errors: Arc<AtomicU64>,
    connections_opened: Arc<AtomicU64>,
}

impl TaskMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished task
    pub fn record_task(&self, label: &str, attempts: u32, has_error: bool, duration: Duration) {
        self.tasks_total.fetch_add(1, Ordering::Relaxed);
        if has_error {
            self.tasks_failed.fetch_add(1, Ordering::Relaxed);
        }

        debug!(
            task = label,
            attempts = attempts,
            has_error = has_error,
            duration_ms = duration.as_millis(),
            "TLS task finished"
        );
    }

    /// Record a retry attempt
    pub fn record_retry(&self, attempt: u32, backoff: Duration) {
        self.attempts_retried.fetch_add(1, Ordering::Relaxed);

        debug!(
            attempt = attempt,
            backoff_ms = backoff.as_millis(),
            "Task retried"
        );
    }

    pub fn record_transport_error(&self, error_type: &str) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);

        debug!(error_type = error_type, "Transport error");
    }

    pub fn record_connection(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            tasks_total: self.tasks_total.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
            attempts_retried: self.attempts_retried.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSummary {
    pub tasks_total: u64,
    pub tasks_failed: u64,
    pub attempts_retried: u64,
    pub transport_errors: u64,
    pub connections_opened: u64,
}
