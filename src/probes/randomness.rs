// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use super::{Probe, ProbeContext};
use crate::constants::{CipherSuite, ProtocolVersion};
use crate::engine::{Workflow, WorkflowTraceType};
use crate::errors::ProbeError;
use crate::property::AnalyzedProperty;
use crate::report::{Artifact, ProbeOutcome, ScanReport};
use crate::task::TlsTask;
use crate::types::{ProbeType, TestResult};
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{info, warn};

const OWNED: &[AnalyzedProperty] = &[AnalyzedProperty::UsesUniqueRandom];

/// Handshakes always collected, on top of the configured additional ones
pub const BASE_HANDSHAKES: usize = 10;

/// Collects ServerHello randoms for later analysis
pub struct RandomnessProbe {
    target: Option<(ProtocolVersion, Option<CipherSuite>)>,
}

impl RandomnessProbe {
    pub fn new() -> Self {
        Self { target: None }
    }
}

impl Default for RandomnessProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for RandomnessProbe {
    fn probe_type(&self) -> ProbeType {
        ProbeType::Randomness
    }

    fn owned_properties(&self) -> &'static [AnalyzedProperty] {
        OWNED
    }

    fn can_be_executed(&self, report: &ScanReport) -> bool {
        report.is_probe_already_executed(ProbeType::CipherSuite)
            && report.is_probe_already_executed(ProbeType::ProtocolVersion)
            && report.is_probe_already_executed(ProbeType::Extensions)
    }

    fn adjust_config(&mut self, report: &ScanReport) {
        self.target = report
            .highest_version()
            .map(|version| (version, report.cipher_suites_for(version).first().copied()));
    }

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
        let (version, suite) = self
            .target
            .ok_or_else(|| ProbeError::NoCommonConfiguration("no supported version".to_string()))?;

        let mut tls = ctx.selector.config_for(version);
        if let Some(suite) = suite {
            tls = tls.with_cipher_suites(vec![suite]);
        }
        ctx.selector.repair_config(&mut tls);

        let handshakes = BASE_HANDSHAKES + ctx.config.additional_randomness_handshakes;
        let tasks: Vec<TlsTask> = (0..handshakes)
            .map(|i| {
                let workflow = Workflow::for_type(WorkflowTraceType::Hello, version);
                TlsTask::trace_task(format!("randomness-{}", i), tls.clone(), workflow).with_policy(ctx.task_policy())
            })
            .collect();

        let finished = ctx.runner.bulk_execute(tasks).await;
        let randoms: Vec<Vec<u8>> = finished
            .iter()
            .filter_map(|task| task.trace())
            .filter_map(|trace| trace.server_random.clone())
            .collect();

        if randoms.is_empty() && finished.iter().all(|t| t.has_error()) {
            return Err(ProbeError::AllTasksFailed { tasks: finished.len() });
        }

        let result = if randoms.len() < 2 {
            TestResult::CouldNotTest
        } else {
            let distinct: HashSet<&Vec<u8>> = randoms.iter().collect();
            if distinct.len() < randoms.len() {
                warn!(
                    collected = randoms.len(),
                    distinct = distinct.len(),
                    "Server random repeated across handshakes"
                );
            }
            TestResult::from_bool(distinct.len() == randoms.len())
        };

        info!(collected = randoms.len(), result = %result, "Server randoms collected");
        Ok(ProbeOutcome::new(self.probe_type())
            .with_property(AnalyzedProperty::UsesUniqueRandom, result)
            .with_artifact(Artifact::ServerRandoms(randoms)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScannerConfig;
    use crate::engine::PeerProfile;
    use crate::probes::testing::{assert_complete, context_with, report_with};

    async fn run(profile: PeerProfile, additional: usize) -> ProbeOutcome {
        let mut config = ScannerConfig::new("sim.test", 443);
        config.additional_randomness_handshakes = additional;
        let (ctx, _peer) = context_with(profile, config);

        let mut probe = RandomnessProbe::new();
        probe.adjust_config(&report_with(
            &[ProtocolVersion::Tls12],
            vec![(ProtocolVersion::Tls12, vec![CipherSuite(0x002F)])],
            &[],
        ));
        let outcome = probe.execute_test(&ctx).await.unwrap();
        assert_complete(&probe, &outcome);
        outcome
    }

    fn randoms(outcome: &ProbeOutcome) -> usize {
        outcome
            .artifacts
            .iter()
            .find_map(|a| match a {
                Artifact::ServerRandoms(r) => Some(r.len()),
                _ => None,
            })
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_unique_randoms() {
        let outcome = run(PeerProfile::modern(), 5).await;
        assert_eq!(randoms(&outcome), 15);
        assert_eq!(outcome.result_of(AnalyzedProperty::UsesUniqueRandom), Some(TestResult::True));
    }

    #[tokio::test]
    async fn test_repeated_randoms() {
        let outcome = run(PeerProfile::legacy(), 0).await;
        assert_eq!(randoms(&outcome), BASE_HANDSHAKES);
        assert_eq!(outcome.result_of(AnalyzedProperty::UsesUniqueRandom), Some(TestResult::False));
    }
}
