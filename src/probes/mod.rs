// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - TLS Probes
 * Probe contract, execution context and the built-in probe set
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

pub mod alpn;
pub mod cca_support;
pub mod cipher_suite;
pub mod cipher_suite_order;
pub mod compressions;
pub mod direct_raccoon;
pub mod dtls_reordering;
pub mod early_ccs;
pub mod ec_point_format;
pub mod extensions;
pub mod heartbleed;
pub mod hello_retry;
pub mod named_group_order;
pub mod named_groups;
pub mod padding_oracle;
pub mod protocol_version;
pub mod randomness;
pub mod selection;
pub mod signature_and_hash;

use crate::config::ScannerConfig;
use crate::engine::{ConfigSelector, TlsConfig, Trace, Workflow, WorkflowTraceType};
use crate::errors::ProbeError;
use crate::property::AnalyzedProperty;
use crate::report::{ProbeOutcome, ScanReport};
use crate::retry::RetryPolicy;
use crate::task::{TaskRunner, TlsTask};
use crate::types::{ProbeType, TestResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// A self-contained check that writes properties into the report
///
/// The orchestrator calls `can_be_executed` against the current report,
/// then `adjust_config` once, then `execute_test` once. Every property in
/// `owned_properties` must appear in the returned outcome.
#[async_trait]
pub trait Probe: Send + Sync {
    fn probe_type(&self) -> ProbeType;

    /// Properties this probe writes, each exactly once
    fn owned_properties(&self) -> &'static [AnalyzedProperty];

    /// Dependencies are satisfied by the current report
    fn can_be_executed(&self, report: &ScanReport) -> bool;

    /// Snapshot what the probe needs from earlier results
    fn adjust_config(&mut self, _report: &ScanReport) {}

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError>;

    /// Outcome used when the probe never ran
    fn could_not_execute_result(&self) -> ProbeOutcome {
        ProbeOutcome::uniform(
            self.probe_type(),
            self.owned_properties(),
            TestResult::CouldNotTest,
        )
    }
}

/// Shared handles every probe executes through
#[derive(Clone)]
pub struct ProbeContext {
    pub runner: Arc<TaskRunner>,
    pub selector: Arc<dyn ConfigSelector>,
    pub config: Arc<ScannerConfig>,
}

impl ProbeContext {
    pub fn new(runner: Arc<TaskRunner>, selector: Arc<dyn ConfigSelector>, config: Arc<ScannerConfig>) -> Self {
        Self {
            runner,
            selector,
            config,
        }
    }

    /// Retry policy for ordinary probe tasks
    pub fn task_policy(&self) -> RetryPolicy {
        self.config.retry_policy()
    }

    /// One Hello workflow with a repaired config; `None` when the task failed
    pub async fn execute_hello(&self, label: &str, mut tls: TlsConfig) -> Option<Trace> {
        self.selector.repair_config(&mut tls);
        let workflow = Workflow::for_type(WorkflowTraceType::Hello, tls.highest_version);
        self.execute_trace(label, tls, workflow).await
    }

    /// Run one workflow and return its trace; `None` when the task failed
    pub async fn execute_trace(&self, label: &str, tls: TlsConfig, workflow: Workflow) -> Option<Trace> {
        let task = TlsTask::trace_task(label, tls, workflow).with_policy(self.task_policy());
        let task = self.runner.execute(task).await;
        if task.has_error() {
            warn!(task = label, "Task failed, skipping");
            return None;
        }
        task.into_trace()
    }

    /// Pause between handshakes of a configuration search
    pub async fn cooldown(&self) {
        let cooldown = self.config.config_search_cooldown();
        if !cooldown.is_zero() {
            tokio::time::sleep(cooldown).await;
        }
    }
}

/// Every built-in probe, in registration order
pub fn default_probes() -> Vec<Box<dyn Probe>> {
    ProbeType::ALL.iter().map(|probe| create_probe(*probe)).collect()
}

pub fn create_probe(probe_type: ProbeType) -> Box<dyn Probe> {
    match probe_type {
        ProbeType::ProtocolVersion => Box::new(protocol_version::ProtocolVersionProbe::new()),
        ProbeType::CipherSuite => Box::new(cipher_suite::CipherSuiteProbe::new()),
        ProbeType::Extensions => Box::new(extensions::ExtensionsProbe::new()),
        ProbeType::NamedGroups => Box::new(named_groups::NamedGroupsProbe::new()),
        ProbeType::Compressions => Box::new(compressions::CompressionsProbe::new()),
        ProbeType::Alpn => Box::new(alpn::AlpnProbe::new()),
        ProbeType::EcPointFormat => Box::new(ec_point_format::EcPointFormatProbe::new()),
        ProbeType::SignatureAndHash => Box::new(signature_and_hash::SignatureAndHashProbe::new()),
        ProbeType::CipherSuiteOrder => Box::new(cipher_suite_order::CipherSuiteOrderProbe::new()),
        ProbeType::NamedGroupOrder => Box::new(named_group_order::NamedGroupOrderProbe::new()),
        ProbeType::HelloRetry => Box::new(hello_retry::HelloRetryProbe::new()),
        ProbeType::CcaSupport => Box::new(cca_support::CcaSupportProbe::new()),
        ProbeType::DtlsReordering => Box::new(dtls_reordering::DtlsReorderingProbe::new()),
        ProbeType::Heartbleed => Box::new(heartbleed::HeartbleedProbe::new()),
        ProbeType::EarlyCcs => Box::new(early_ccs::EarlyCcsProbe::new()),
        ProbeType::PaddingOracle => Box::new(padding_oracle::PaddingOracleProbe::new()),
        ProbeType::DirectRaccoon => Box::new(direct_raccoon::DirectRaccoonProbe::new()),
        ProbeType::Randomness => Box::new(randomness::RandomnessProbe::new()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_probes_cover_every_type() {
        let probes = default_probes();
        assert_eq!(probes.len(), ProbeType::ALL.len());
        for (probe, expected) in probes.iter().zip(ProbeType::ALL) {
            assert_eq!(probe.probe_type(), expected);
        }
    }

    #[test]
    fn test_could_not_execute_results_are_complete() {
        for probe in default_probes() {
            let outcome = probe.could_not_execute_result();
            testing::assert_complete(probe.as_ref(), &outcome);
            assert!(outcome
                .properties
                .iter()
                .all(|(_, r)| *r == TestResult::CouldNotTest));
        }
    }

    #[test]
    fn test_owned_properties_are_disjoint() {
        let mut seen = std::collections::HashSet::new();
        for probe in default_probes() {
            for property in probe.owned_properties() {
                assert!(seen.insert(*property), "{} owned twice", property);
            }
        }
    }
}
