// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - TLS Tasks
 * Unit of work handed to the task runner: one workflow, one connection,
 * bounded re-executions
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

pub mod runner;

pub use runner::TaskRunner;

use crate::engine::{TlsConfig, Trace, Workflow};
use crate::fingerprint::ResponseFingerprint;
use crate::retry::RetryPolicy;

/// What a finished task must produce to count as successful
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Any executed trace is enough
    Trace,
    /// Trace executed as planned, reduced to a response fingerprint
    Fingerprint,
}

#[derive(Debug, Clone)]
pub struct TlsTask {
    label: String,
    config: TlsConfig,
    workflow: Workflow,
    kind: TaskKind,
    policy: RetryPolicy,
    trace: Option<Trace>,
    fingerprint: Option<ResponseFingerprint>,
    has_error: bool,
    attempts: u32,
}

impl TlsTask {
    pub fn new(label: impl Into<String>, config: TlsConfig, workflow: Workflow, kind: TaskKind) -> Self {
        Self {
            label: label.into(),
            config,
            workflow,
            kind,
            policy: RetryPolicy::default(),
            trace: None,
            fingerprint: None,
            has_error: false,
            attempts: 0,
        }
    }

    pub fn trace_task(label: impl Into<String>, config: TlsConfig, workflow: Workflow) -> Self {
        Self::new(label, config, workflow, TaskKind::Trace)
    }

    pub fn fingerprint_task(label: impl Into<String>, config: TlsConfig, workflow: Workflow) -> Self {
        Self::new(label, config, workflow, TaskKind::Fingerprint)
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn config(&self) -> &TlsConfig {
        &self.config
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn trace(&self) -> Option<&Trace> {
        self.trace.as_ref()
    }

    pub fn into_trace(self) -> Option<Trace> {
        self.trace
    }

    pub fn fingerprint(&self) -> Option<&ResponseFingerprint> {
        self.fingerprint.as_ref()
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    /// Executions consumed, failed ones included
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Store the trace of an attempt; false when the attempt does not count
    pub(crate) fn accept(&mut self, trace: Trace) -> bool {
        match self.kind {
            TaskKind::Trace => {
                self.trace = Some(trace);
                true
            }
            TaskKind::Fingerprint => {
                if !trace.executed_as_planned {
                    return false;
                }
                self.fingerprint = Some(ResponseFingerprint::from_trace(&trace));
                self.trace = Some(trace);
                true
            }
        }
    }

    pub(crate) fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    pub(crate) fn mark_failed(&mut self) {
        self.has_error = true;
        self.fingerprint = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ProtocolVersion;
    use crate::engine::{ConfigSelector, DefaultConfigSelector, WorkflowTraceType};

    fn task(kind: TaskKind) -> TlsTask {
        let config = DefaultConfigSelector::default().base_config();
        let workflow = Workflow::for_type(WorkflowTraceType::Hello, ProtocolVersion::Tls12);
        TlsTask::new("hello", config, workflow, kind)
    }

    #[test]
    fn test_fingerprint_task_rejects_unplanned_trace() {
        let mut fingerprint = task(TaskKind::Fingerprint);
        assert!(!fingerprint.accept(Trace::default()));
        assert!(fingerprint.fingerprint().is_none());

        let planned = Trace {
            executed_as_planned: true,
            ..Trace::default()
        };
        assert!(fingerprint.accept(planned));
        assert!(fingerprint.fingerprint().is_some());
    }

    #[test]
    fn test_trace_task_accepts_any_trace() {
        let mut plain = task(TaskKind::Trace);
        assert!(plain.accept(Trace::default()));
        assert!(plain.trace().is_some());
        assert!(!plain.has_error());
    }
}
