// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Orchestrator
 * Runs every enabled probe against one target in dependency order,
 * merges outcomes into the report and applies the after-probes
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use crate::after_probe::{default_after_probes, AfterProbe};
use crate::config::{ConfigValidator, ScannerConfig};
use crate::engine::{ConfigSelector, DefaultConfigSelector, ProtocolEngine};
use crate::errors::{ProbeError, ScannerError, ScannerResult};
use crate::probes::{default_probes, Probe, ProbeContext};
use crate::report::{ProbeOutcome, ScanReport};
use crate::task::TaskRunner;
use crate::types::{ProbeState, ProbeType, TestResult};
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Stops a running scan from scheduling further probes
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

type ProbeRun = (ProbeType, Result<Result<ProbeOutcome, ProbeError>, Box<dyn Any + Send>>);

pub struct ScanOrchestrator {
    config: Arc<ScannerConfig>,
    runner: Arc<TaskRunner>,
    selector: Arc<dyn ConfigSelector>,
    probes: Vec<Box<dyn Probe>>,
    after_probes: Vec<Box<dyn AfterProbe>>,
    abort: AbortHandle,
}

impl ScanOrchestrator {
    /// Validate the config and wire the default probe set to `engine`
    pub fn new(config: ScannerConfig, engine: Arc<dyn ProtocolEngine>) -> ScannerResult<Self> {
        ConfigValidator::validate_scanner_config(&config)
            .map_err(|e| ScannerError::Configuration(format!("{:#}", e)))?;

        let runner = Arc::new(TaskRunner::new(engine, config.overall_threads, config.timeouts()));
        let selector: Arc<dyn ConfigSelector> = Arc::new(DefaultConfigSelector::new(config.effective_server_name()));

        Ok(Self {
            config: Arc::new(config),
            runner,
            selector,
            probes: default_probes(),
            after_probes: default_after_probes(),
            abort: AbortHandle::default(),
        })
    }

    /// Replace the probe set
    pub fn with_probes(mut self, probes: Vec<Box<dyn Probe>>) -> Self {
        self.probes = probes;
        self
    }

    pub fn with_after_probes(mut self, after_probes: Vec<Box<dyn AfterProbe>>) -> Self {
        self.after_probes = after_probes;
        self
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn runner(&self) -> Arc<TaskRunner> {
        Arc::clone(&self.runner)
    }

    /// Run the scan to its fixpoint and return the finished report
    pub async fn scan(self) -> ScanReport {
        let Self {
            config,
            runner,
            selector,
            probes,
            after_probes,
            abort,
        } = self;

        let mut report = ScanReport::new(config.host.clone(), config.port);
        let ctx = ProbeContext::new(Arc::clone(&runner), selector, Arc::clone(&config));
        let deadline = config.scan_timeout().map(|timeout| Instant::now() + timeout);
        let parallel = config.parallel_probes.max(1);

        info!(
            host = %config.host,
            port = config.port,
            probes = probes.len(),
            parallel_probes = parallel,
            threads = runner.threads(),
            "Starting TLS scan"
        );

        let mut pending: Vec<Box<dyn Probe>> = Vec::with_capacity(probes.len());
        for probe in probes {
            if config.is_probe_enabled(probe.probe_type()) {
                pending.push(probe);
            } else {
                debug!(probe = %probe.probe_type(), "Probe not in allow-list, skipping");
            }
        }

        // could-not-execute templates of running probes, for error paths
        let mut running: HashMap<ProbeType, ProbeOutcome> = HashMap::new();
        let mut join_set: JoinSet<ProbeRun> = JoinSet::new();
        let mut stopped = false;

        loop {
            if !stopped {
                if abort.is_aborted() {
                    warn!("Scan aborted, no further probes will start");
                    stopped = true;
                } else if deadline.is_some_and(|d| Instant::now() >= d) {
                    warn!("Scan timeout reached, no further probes will start");
                    stopped = true;
                }
            }

            if !stopped {
                let mut index = 0;
                while index < pending.len() && join_set.len() < parallel {
                    if !pending[index].can_be_executed(&report) {
                        index += 1;
                        continue;
                    }
                    let mut probe = pending.remove(index);
                    let probe_type = probe.probe_type();
                    probe.adjust_config(&report);
                    report.set_probe_state(probe_type, ProbeState::Executing);
                    running.insert(probe_type, probe.could_not_execute_result());
                    info!(probe = %probe_type, "Probe started");

                    let ctx = ctx.clone();
                    join_set.spawn(async move {
                        let result = AssertUnwindSafe(async { probe.execute_test(&ctx).await })
                            .catch_unwind()
                            .await;
                        (probe_type, result)
                    });
                }
            }

            // nothing running and nothing startable: fixpoint
            let Some(joined) = join_set.join_next().await else {
                break;
            };

            match joined {
                Ok((probe_type, result)) => {
                    let Some(template) = running.remove(&probe_type) else {
                        error!(probe = %probe_type, "Finished probe was not tracked as running");
                        continue;
                    };
                    Self::record(&mut report, probe_type, template, result);
                }
                Err(e) => error!(error = %e, "Probe task join error"),
            }
        }

        // probes lost to join errors
        for (probe_type, template) in running.drain() {
            Self::apply(&mut report, probe_type, template.with_all(TestResult::ErrorDuringTest), ProbeState::Error);
        }

        for probe in pending {
            let probe_type = probe.probe_type();
            debug!(probe = %probe_type, "Probe cannot be executed");
            Self::apply(&mut report, probe_type, probe.could_not_execute_result(), ProbeState::CannotBeExecuted);
        }

        for after in &after_probes {
            if let Err(e) = after.analyze(&mut report) {
                error!(after_probe = after.name(), error = %e, "After-probe failed");
            }
        }

        report.finished_at = Some(Utc::now());
        let metrics = runner.metrics().summary();
        info!(
            properties = report.properties.len(),
            tasks = metrics.tasks_total,
            failed_tasks = metrics.tasks_failed,
            retries = metrics.attempts_retried,
            "Scan finished"
        );
        report
    }

    fn record(
        report: &mut ScanReport,
        probe_type: ProbeType,
        template: ProbeOutcome,
        result: Result<Result<ProbeOutcome, ProbeError>, Box<dyn Any + Send>>,
    ) {
        match result {
            Ok(Ok(outcome)) if Self::covers_owned(&outcome, &template) => {
                info!(probe = %probe_type, properties = outcome.properties.len(), "Probe executed");
                Self::apply(report, probe_type, outcome, ProbeState::Executed);
            }
            Ok(Ok(_)) => {
                error!(probe = %probe_type, "Probe outcome does not cover its owned properties");
                Self::apply(report, probe_type, template.with_all(TestResult::ErrorDuringTest), ProbeState::Error);
            }
            Ok(Err(e)) if e.is_configuration_impossible() => {
                warn!(probe = %probe_type, error = %e, "Probe could not test");
                Self::apply(report, probe_type, template, ProbeState::Executed);
            }
            Ok(Err(e)) => {
                error!(probe = %probe_type, error = %e, "Probe failed");
                Self::apply(report, probe_type, template.with_all(TestResult::ErrorDuringTest), ProbeState::Error);
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(probe = %probe_type, panic = %message, "Probe panicked");
                Self::apply(report, probe_type, template.with_all(TestResult::ErrorDuringTest), ProbeState::Error);
            }
        }
    }

    /// Outcome writes exactly the owned properties, each once
    fn covers_owned(outcome: &ProbeOutcome, template: &ProbeOutcome) -> bool {
        let written: HashSet<_> = outcome.properties.iter().map(|(p, _)| *p).collect();
        let owned: HashSet<_> = template.properties.iter().map(|(p, _)| *p).collect();
        written.len() == outcome.properties.len() && written == owned
    }

    fn apply(report: &mut ScanReport, probe_type: ProbeType, outcome: ProbeOutcome, state: ProbeState) {
        let state = match report.merge(outcome) {
            Ok(()) => state,
            Err(e) => {
                error!(probe = %probe_type, error = %e, "Report merge rejected");
                ProbeState::Error
            }
        };
        if state == ProbeState::Executed {
            report.mark_probe_executed(probe_type);
        }
        report.set_probe_state(probe_type, state);
        debug!(probe = %probe_type, state = ?state, "Probe state changed");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{PeerProfile, SimulatedPeer};
    use crate::property::AnalyzedProperty;
    use async_trait::async_trait;

    const FAULTY_OWNED: &[AnalyzedProperty] = &[AnalyzedProperty::SupportsHttp2];

    enum Fault {
        Panic,
        Internal,
        Incomplete,
    }

    struct FaultyProbe(Fault);

    #[async_trait]
    impl Probe for FaultyProbe {
        fn probe_type(&self) -> ProbeType {
            ProbeType::Alpn
        }

        fn owned_properties(&self) -> &'static [AnalyzedProperty] {
            FAULTY_OWNED
        }

        fn can_be_executed(&self, _report: &ScanReport) -> bool {
            true
        }

        async fn execute_test(&mut self, _ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
            match self.0 {
                Fault::Panic => panic!("state machine out of sync"),
                Fault::Internal => Err(ProbeError::Internal("unexpected trace".to_string())),
                Fault::Incomplete => Ok(ProbeOutcome::new(ProbeType::Alpn)),
            }
        }
    }

    async fn run_faulty(fault: Fault) -> ScanReport {
        let engine = Arc::new(SimulatedPeer::new(PeerProfile::modern()));
        ScanOrchestrator::new(ScannerConfig::new("sim.test", 443), engine)
            .unwrap()
            .with_probes(vec![Box::new(FaultyProbe(fault))])
            .with_after_probes(Vec::new())
            .scan()
            .await
    }

    #[tokio::test]
    async fn test_panicking_probe_is_contained() {
        let report = run_faulty(Fault::Panic).await;
        assert_eq!(report.get_result(AnalyzedProperty::SupportsHttp2), TestResult::ErrorDuringTest);
        assert_eq!(report.probe_state(ProbeType::Alpn), ProbeState::Error);
        assert!(report.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_internal_error_marks_error_during_test() {
        let report = run_faulty(Fault::Internal).await;
        assert_eq!(report.get_result(AnalyzedProperty::SupportsHttp2), TestResult::ErrorDuringTest);
        assert!(!report.is_probe_already_executed(ProbeType::Alpn));
    }

    #[tokio::test]
    async fn test_incomplete_outcome_is_rejected() {
        let report = run_faulty(Fault::Incomplete).await;
        assert_eq!(report.get_result(AnalyzedProperty::SupportsHttp2), TestResult::ErrorDuringTest);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let engine = Arc::new(SimulatedPeer::new(PeerProfile::modern()));
        let config = ScannerConfig::new("https://sim.test", 443);
        let result = ScanOrchestrator::new(config, engine);
        assert!(matches!(result, Err(ScannerError::Configuration(_))));
    }

    #[test]
    fn test_abort_handle_is_shared() {
        let handle = AbortHandle::default();
        let clone = handle.clone();
        clone.abort();
        assert!(handle.is_aborted());
    }
}
