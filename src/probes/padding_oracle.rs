// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Padding Oracle Probe
 * Sends CBC records with malformed padding after a full handshake and
 * checks whether the peer's reaction depends on the padding kind
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use super::{Probe, ProbeContext};
use crate::constants::{CipherSuite, ProtocolVersion};
use crate::engine::{ProtocolAction, RecordPadding, TlsConfig, Workflow, WorkflowTraceType};
use crate::errors::ProbeError;
use crate::leak::{collect_with_escalation, InformationLeakTest, SamplingPlan, TestInfo};
use crate::property::AnalyzedProperty;
use crate::report::{Artifact, ProbeOutcome, ScanReport, VersionSuitePair};
use crate::task::TlsTask;
use crate::types::{ProbeType, ScanDetail, TestResult};
use crate::vector::{Vector, VectorResponse};
use async_trait::async_trait;
use tracing::{info, warn};

const OWNED: &[AnalyzedProperty] = &[AnalyzedProperty::VulnerableToPaddingOracle];

impl Vector for RecordPadding {
    fn name(&self) -> String {
        self.as_str().to_string()
    }
}

/// Version and suite one padding oracle test ran against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddingOracleTestInfo {
    pub version: ProtocolVersion,
    pub cipher_suite: CipherSuite,
}

impl TestInfo for PaddingOracleTestInfo {
    fn technical_name(&self) -> String {
        format!("padding_oracle:{}:{}", self.version, self.cipher_suite)
    }

    fn printable_name(&self) -> String {
        format!("Padding oracle {} {}", self.version, self.cipher_suite)
    }
}

pub struct PaddingOracleProbe {
    pairs: Vec<VersionSuitePair>,
    detail: ScanDetail,
}

impl PaddingOracleProbe {
    pub fn new() -> Self {
        Self {
            pairs: Vec::new(),
            detail: ScanDetail::default(),
        }
    }

    /// CBC suites to test, highest version first; below `Detailed` only the first
    fn targets(&self) -> Vec<PaddingOracleTestInfo> {
        let mut pairs: Vec<&VersionSuitePair> = self.pairs.iter().filter(|p| !p.version.is_tls13()).collect();
        pairs.sort_by(|a, b| b.version.cmp(&a.version));

        let mut targets = Vec::new();
        for pair in pairs {
            let mut families: Vec<&'static str> = Vec::new();
            for suite in pair.cipher_suites.iter().filter(|s| s.is_cbc()) {
                if families.contains(&suite.key_exchange_family()) {
                    continue;
                }
                families.push(suite.key_exchange_family());
                targets.push(PaddingOracleTestInfo {
                    version: pair.version,
                    cipher_suite: *suite,
                });
                if !self.detail.is_greater_equal_to(ScanDetail::Detailed) {
                    return targets;
                }
            }
        }
        targets
    }

    async fn run_test(ctx: &ProbeContext, info: PaddingOracleTestInfo) -> InformationLeakTest<PaddingOracleTestInfo, RecordPadding> {
        let mut tls = ctx
            .selector
            .config_for(info.version)
            .with_cipher_suites(vec![info.cipher_suite])
            .enforcing();
        ctx.selector.repair_config(&mut tls);
        let label = info.technical_name();
        let version = info.version;

        collect_with_escalation(info, SamplingPlan::default(), |per_value| {
            let (vectors, tasks) = padding_tasks(ctx, &label, &tls, version, per_value);
            async move {
                let finished = ctx.runner.bulk_execute(tasks).await;
                vectors
                    .into_iter()
                    .zip(finished)
                    .map(|(vector, task)| VectorResponse::new(vector, task.fingerprint().cloned()))
                    .collect()
            }
        })
        .await
    }
}

impl Default for PaddingOracleProbe {
    fn default() -> Self {
        Self::new()
    }
}

fn padding_tasks(
    ctx: &ProbeContext,
    label: &str,
    tls: &TlsConfig,
    version: ProtocolVersion,
    per_value: usize,
) -> (Vec<RecordPadding>, Vec<TlsTask>) {
    let mut vectors = Vec::with_capacity(per_value * RecordPadding::ALL.len());
    let mut tasks = Vec::with_capacity(per_value * RecordPadding::ALL.len());
    for _ in 0..per_value {
        for padding in RecordPadding::ALL {
            let workflow = Workflow::for_type(WorkflowTraceType::Handshake, version)
                .then(ProtocolAction::SendPaddedRecord(padding))
                .then(ProtocolAction::Receive(Vec::new()));
            vectors.push(padding);
            tasks.push(
                TlsTask::fingerprint_task(format!("{}:{}", label, padding.as_str()), tls.clone(), workflow)
                    .with_policy(ctx.task_policy()),
            );
        }
    }
    (vectors, tasks)
}

#[async_trait]
impl Probe for PaddingOracleProbe {
    fn probe_type(&self) -> ProbeType {
        ProbeType::PaddingOracle
    }

    fn owned_properties(&self) -> &'static [AnalyzedProperty] {
        OWNED
    }

    fn can_be_executed(&self, report: &ScanReport) -> bool {
        report.is_probe_already_executed(ProbeType::CipherSuite)
            && report.is_true(AnalyzedProperty::SupportsCbc)
            && report.is_probe_already_executed(ProbeType::CcaSupport)
            && report.is_false(AnalyzedProperty::RequiresCca)
    }

    fn adjust_config(&mut self, report: &ScanReport) {
        self.pairs = report.version_suite_pairs.clone().unwrap_or_default();
    }

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
        self.detail = ctx.config.scan_detail;
        let targets = self.targets();
        if targets.is_empty() {
            return Err(ProbeError::NoCommonConfiguration("no CBC suite below TLS 1.3".to_string()));
        }

        let mut summaries = Vec::new();
        let mut vulnerable = false;
        let mut sampled = false;

        for info in targets {
            let test = Self::run_test(ctx, info).await;
            if test.sample_count() == 0 {
                warn!(test = %test.info().technical_name(), "Every padding oracle sample failed");
            } else {
                sampled = true;
            }
            let summary = test.summary();
            if summary.significant {
                info!(
                    test = %summary.test,
                    p_value = ?summary.p_value,
                    fingerprints = summary.distinct_fingerprints.len(),
                    "Padding oracle detected"
                );
                vulnerable = true;
            }
            summaries.push(summary);
        }

        if !sampled {
            return Err(ProbeError::AllTasksFailed { tasks: summaries.len() });
        }

        Ok(ProbeOutcome::new(self.probe_type())
            .with_property(AnalyzedProperty::VulnerableToPaddingOracle, TestResult::from_bool(vulnerable))
            .with_artifact(Artifact::PaddingOracleTests(summaries)))
    }
}
