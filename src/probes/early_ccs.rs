// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Early ChangeCipherSpec Probe
 * CCS injection before the key exchange (CVE-2014-0224)
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use super::{Probe, ProbeContext};
use crate::constants::ProtocolVersion;
use crate::engine::{EarlyCcsTarget, ProtocolAction, Workflow, WorkflowTraceType};
use crate::errors::ProbeError;
use crate::property::AnalyzedProperty;
use crate::report::{ProbeOutcome, ScanReport};
use crate::types::{ProbeType, TestResult};
use async_trait::async_trait;
use tracing::debug;

const OWNED: &[AnalyzedProperty] = &[
    AnalyzedProperty::VulnerableToEarlyCcs,
    AnalyzedProperty::EarlyCcsExploitable,
];

pub struct EarlyCcsProbe;

impl EarlyCcsProbe {
    pub fn new() -> Self {
        Self
    }

    /// `None` when the handshake could not be run
    async fn check_target(ctx: &ProbeContext, target: EarlyCcsTarget) -> Option<bool> {
        let tls = ctx.selector.base_config();
        let workflow = Workflow::for_type(WorkflowTraceType::Hello, ProtocolVersion::Tls12)
            .then(ProtocolAction::SendEarlyChangeCipherSpec(target))
            .then_handshake_completion();

        let trace = ctx.execute_trace("early-ccs", tls, workflow).await?;
        if trace.received_alert() {
            debug!(target = ?target, "Not vulnerable, alert received");
            return Some(false);
        }
        let vulnerable = trace.received_finished();
        debug!(target = ?target, vulnerable, "Early CCS target checked");
        Some(vulnerable)
    }
}

impl Default for EarlyCcsProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for EarlyCcsProbe {
    fn probe_type(&self) -> ProbeType {
        ProbeType::EarlyCcs
    }

    fn owned_properties(&self) -> &'static [AnalyzedProperty] {
        OWNED
    }

    fn can_be_executed(&self, _report: &ScanReport) -> bool {
        true
    }

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
        let (vulnerable, exploitable) = match Self::check_target(ctx, EarlyCcsTarget::OpenSsl100).await {
            Some(true) => (TestResult::True, TestResult::False),
            first => match (first, Self::check_target(ctx, EarlyCcsTarget::OpenSsl101).await) {
                (_, Some(true)) => (TestResult::True, TestResult::True),
                (Some(false), Some(false)) => (TestResult::False, TestResult::False),
                _ => (TestResult::CouldNotTest, TestResult::CouldNotTest),
            },
        };

        Ok(ProbeOutcome::new(self.probe_type())
            .with_property(AnalyzedProperty::VulnerableToEarlyCcs, vulnerable)
            .with_property(AnalyzedProperty::EarlyCcsExploitable, exploitable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PeerProfile;
    use crate::probes::testing::{assert_complete, context_for};

    async fn run(profile: PeerProfile) -> ProbeOutcome {
        let (ctx, _peer) = context_for(profile);
        let mut probe = EarlyCcsProbe::new();
        let outcome = probe.execute_test(&ctx).await.unwrap();
        assert_complete(&probe, &outcome);
        outcome
    }

    #[tokio::test]
    async fn test_exploitable_peer() {
        let outcome = run(PeerProfile::legacy()).await;
        assert_eq!(outcome.result_of(AnalyzedProperty::VulnerableToEarlyCcs), Some(TestResult::True));
        assert_eq!(outcome.result_of(AnalyzedProperty::EarlyCcsExploitable), Some(TestResult::True));
    }

    #[tokio::test]
    async fn test_not_exploitable_peer() {
        let mut profile = PeerProfile::legacy();
        profile.early_ccs = Some(EarlyCcsTarget::OpenSsl100);
        let outcome = run(profile).await;
        assert_eq!(outcome.result_of(AnalyzedProperty::VulnerableToEarlyCcs), Some(TestResult::True));
        assert_eq!(outcome.result_of(AnalyzedProperty::EarlyCcsExploitable), Some(TestResult::False));
    }

    #[tokio::test]
    async fn test_patched_peer() {
        let outcome = run(PeerProfile::modern()).await;
        assert!(outcome.properties.iter().all(|(_, r)| *r == TestResult::False));
    }
}
