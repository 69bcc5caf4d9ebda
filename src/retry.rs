// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Task Retry Policy
 * Per-task re-execution budget with timeout escalation and jittered backoff
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use rand::Rng;
use std::time::Duration;

/// Response and transport timeouts handed to the protocol engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionTimeouts {
    /// Time allowed for each expected response
    pub response: Duration,

    /// Time allowed to establish the transport connection
    pub tcp: Duration,
}

impl ConnectionTimeouts {
    pub fn new(response: Duration, tcp: Duration) -> Self {
        Self { response, tcp }
    }

    /// Same value for response and transport timeouts
    pub fn uniform(timeout: Duration) -> Self {
        Self::new(timeout, timeout)
    }
}

/// Retry policy for a single TLS task
///
/// `reexecutions` is the total number of executions a task may consume
/// (never less than one). Every attempt runs with the base timeouts plus
/// `additional_timeout`; with `increasing_timeout` the increment is added
/// once more on each further attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of executions for the task
    pub reexecutions: u32,

    /// Added to the response timeout of every attempt
    pub additional_timeout: Duration,

    /// Grow the response timeout by `additional_timeout` on each retry
    pub increasing_timeout: bool,

    /// Added to the transport connect timeout of every attempt
    pub additional_tcp_timeout: Duration,

    /// Initial pause between attempts
    pub initial_backoff: Duration,

    /// Maximum pause between attempts
    pub max_backoff: Duration,

    /// Backoff multiplier (typically 2.0 for exponential)
    pub backoff_multiplier: f64,

    /// Enable jitter on the backoff
    pub enable_jitter: bool,

    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            reexecutions: 3,
            additional_timeout: Duration::ZERO,
            increasing_timeout: false,
            additional_tcp_timeout: Duration::ZERO,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            enable_jitter: true,
            jitter_factor: 0.3,
        }
    }
}

impl RetryPolicy {
    /// Single execution, no retries
    pub fn single_shot() -> Self {
        Self::default().with_reexecutions(1)
    }

    pub fn with_reexecutions(mut self, reexecutions: u32) -> Self {
        self.reexecutions = reexecutions.max(1);
        self
    }

    pub fn with_additional_timeout(mut self, additional: Duration) -> Self {
        self.additional_timeout = additional;
        self
    }

    pub fn with_increasing_timeout(mut self, increasing: bool) -> Self {
        self.increasing_timeout = increasing;
        self
    }

    pub fn with_additional_tcp_timeout(mut self, additional: Duration) -> Self {
        self.additional_tcp_timeout = additional;
        self
    }

    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// No pause between attempts
    pub fn without_backoff(mut self) -> Self {
        self.initial_backoff = Duration::ZERO;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.enable_jitter = false;
        self
    }

    /// Number of executions this policy permits
    pub fn max_attempts(&self) -> u32 {
        self.reexecutions.max(1)
    }

    /// Timeouts for a 1-based attempt number
    pub fn timeouts_for_attempt(&self, base: ConnectionTimeouts, attempt: u32) -> ConnectionTimeouts {
        let increments = if self.increasing_timeout {
            attempt.max(1)
        } else {
            1
        };

        ConnectionTimeouts {
            response: base.response + self.additional_timeout * increments,
            tcp: base.tcp + self.additional_tcp_timeout,
        }
    }

    /// Calculate backoff duration after a failed attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 || self.initial_backoff.is_zero() {
            return Duration::from_secs(0);
        }

        let base_backoff = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi((attempt - 1) as i32);

        let capped_backoff = base_backoff.min(self.max_backoff.as_millis() as f64);

        // an empty range would panic in the sampler
        let jitter_range = capped_backoff * self.jitter_factor;
        let backoff_with_jitter = if self.enable_jitter && jitter_range > 0.0 {
            let mut rng = rand::rng();
            let jitter = rng.random_range(-jitter_range..jitter_range);
            (capped_backoff + jitter).max(0.0)
        } else {
            capped_backoff
        };

        Duration::from_millis(backoff_with_jitter as u64)
    }
}
