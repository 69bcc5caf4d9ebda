// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Direct Raccoon Probe
 * DH key exchanges whose premaster secret does or does not start with a
 * zero byte; a peer reacting differently leaks timing-relevant state
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use super::{Probe, ProbeContext};
use crate::constants::{CipherSuite, MessageType, ProtocolVersion};
use crate::engine::{ProtocolAction, TlsConfig, Workflow, WorkflowTraceType};
use crate::errors::ProbeError;
use crate::leak::{collect_with_escalation, InformationLeakTest, SamplingPlan, TestInfo};
use crate::property::AnalyzedProperty;
use crate::report::{Artifact, ProbeOutcome, ScanReport, VersionSuitePair};
use crate::retry::RetryPolicy;
use crate::task::TlsTask;
use crate::types::{ProbeType, ScanDetail, TestResult};
use crate::vector::{Vector, VectorResponse};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, warn};

const OWNED: &[AnalyzedProperty] = &[AnalyzedProperty::VulnerableToDirectRaccoon];

const ELIGIBLE_VERSIONS: &[ProtocolVersion] = &[
    ProtocolVersion::Ssl3,
    ProtocolVersion::Tls10,
    ProtocolVersion::Tls11,
    ProtocolVersion::Tls12,
    ProtocolVersion::Dtls10,
    ProtocolVersion::Dtls12,
];

/// Discriminator: shared secret with or without a leading zero byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadingZero(pub bool);

impl Vector for LeadingZero {
    fn name(&self) -> String {
        if self.0 {
            "leading_zero".to_string()
        } else {
            "no_leading_zero".to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectRaccoonTestInfo {
    pub version: ProtocolVersion,
    pub cipher_suite: CipherSuite,
}

impl TestInfo for DirectRaccoonTestInfo {
    fn technical_name(&self) -> String {
        format!("direct_raccoon:{}:{}", self.version, self.cipher_suite)
    }
}

pub struct DirectRaccoonProbe {
    pairs: Vec<VersionSuitePair>,
}

impl DirectRaccoonProbe {
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// First DH suite per version, highest first; below `Detailed` only one
    fn targets(&self, detail: ScanDetail) -> Vec<DirectRaccoonTestInfo> {
        let mut pairs: Vec<&VersionSuitePair> = self
            .pairs
            .iter()
            .filter(|p| ELIGIBLE_VERSIONS.contains(&p.version))
            .collect();
        pairs.sort_by(|a, b| b.version.cmp(&a.version));

        let targets = pairs.into_iter().filter_map(|pair| {
            pair.cipher_suites
                .iter()
                .find(|s| s.uses_dh() && !s.is_tls13())
                .map(|suite| DirectRaccoonTestInfo {
                    version: pair.version,
                    cipher_suite: *suite,
                })
        });

        if detail.is_greater_equal_to(ScanDetail::Detailed) {
            targets.collect()
        } else {
            targets.take(1).collect()
        }
    }

    async fn run_test(ctx: &ProbeContext, info: DirectRaccoonTestInfo) -> InformationLeakTest<DirectRaccoonTestInfo, LeadingZero> {
        let mut tls = ctx
            .selector
            .config_for(info.version)
            .with_cipher_suites(vec![info.cipher_suite])
            .enforcing();
        ctx.selector.repair_config(&mut tls);
        let label = info.technical_name();
        let version = info.version;

        collect_with_escalation(info, SamplingPlan::default(), |per_value| {
            let (vectors, tasks) = raccoon_tasks(&label, &tls, version, per_value);
            async move {
                let finished = ctx.runner.bulk_execute(tasks).await;
                vectors
                    .into_iter()
                    .zip(finished)
                    .map(|(vector, task)| {
                        if task.has_error() {
                            warn!(task = task.label(), "Raccoon sample failed");
                        }
                        VectorResponse::new(vector, task.fingerprint().cloned())
                    })
                    .collect()
            }
        })
        .await
    }
}

impl Default for DirectRaccoonProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// `per_value` samples of each discriminator value in random order
fn raccoon_tasks(label: &str, tls: &TlsConfig, version: ProtocolVersion, per_value: usize) -> (Vec<LeadingZero>, Vec<TlsTask>) {
    let mut rng = rand::rng();
    let mut vectors: Vec<LeadingZero> = (0..per_value)
        .flat_map(|_| [LeadingZero(true), LeadingZero(false)])
        .collect();
    vectors.shuffle(&mut rng);

    let tasks = vectors
        .iter()
        .map(|vector| {
            let workflow = Workflow::for_type(WorkflowTraceType::Hello, version)
                .then(ProtocolAction::SendDhKeyExchange {
                    secret_seed: rng.random(),
                    leading_zero: vector.0,
                })
                .then(ProtocolAction::Send(vec![MessageType::ChangeCipherSpec, MessageType::Finished]))
                .then(ProtocolAction::Receive(Vec::new()));
            TlsTask::fingerprint_task(format!("{}:{}", label, vector.name()), tls.clone(), workflow)
                .with_policy(RetryPolicy::single_shot())
        })
        .collect();
    (vectors, tasks)
}

#[async_trait]
impl Probe for DirectRaccoonProbe {
    fn probe_type(&self) -> ProbeType {
        ProbeType::DirectRaccoon
    }

    fn owned_properties(&self) -> &'static [AnalyzedProperty] {
        OWNED
    }

    fn can_be_executed(&self, report: &ScanReport) -> bool {
        let legacy_version = [
            AnalyzedProperty::SupportsSsl3,
            AnalyzedProperty::SupportsTls10,
            AnalyzedProperty::SupportsTls11,
            AnalyzedProperty::SupportsTls12,
            AnalyzedProperty::SupportsDtls10,
            AnalyzedProperty::SupportsDtls12,
        ]
        .into_iter()
        .any(|p| report.is_true(p));

        report.is_probe_already_executed(ProbeType::CipherSuite)
            && report.is_probe_already_executed(ProbeType::CcaSupport)
            && report.is_false(AnalyzedProperty::RequiresCca)
            && report.is_false(AnalyzedProperty::SupportsOnlyPsk)
            && legacy_version
            && report.is_true(AnalyzedProperty::SupportsDhe)
    }

    fn adjust_config(&mut self, report: &ScanReport) {
        self.pairs = report.version_suite_pairs.clone().unwrap_or_default();
    }

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
        let targets = self.targets(ctx.config.scan_detail);
        if targets.is_empty() {
            return Err(ProbeError::NoCommonConfiguration("no DH suite below TLS 1.3".to_string()));
        }

        let mut summaries = Vec::new();
        let mut vulnerable = false;
        for info in targets {
            let test = Self::run_test(ctx, info).await;
            let summary = test.summary();
            if summary.significant {
                info!(test = %summary.test, p_value = ?summary.p_value, "Direct Raccoon oracle detected");
                vulnerable = true;
            }
            summaries.push(summary);
        }

        if summaries.iter().all(|s| s.samples == 0) {
            return Err(ProbeError::AllTasksFailed { tasks: summaries.len() });
        }

        Ok(ProbeOutcome::new(self.probe_type())
            .with_property(AnalyzedProperty::VulnerableToDirectRaccoon, TestResult::from_bool(vulnerable))
            .with_artifact(Artifact::DirectRaccoonTests(summaries)))
    }
}
