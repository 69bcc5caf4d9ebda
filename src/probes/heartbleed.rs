// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Heartbleed Probe
 * Heartbeat request declaring more payload than it carries (CVE-2014-0160)
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use super::{Probe, ProbeContext};
use crate::constants::{ExtensionType, MessageType, ProtocolVersion};
use crate::engine::{ProtocolAction, Workflow, WorkflowTraceType};
use crate::errors::ProbeError;
use crate::property::AnalyzedProperty;
use crate::report::{ProbeOutcome, ScanReport};
use crate::types::{ProbeType, TestResult};
use async_trait::async_trait;
use tracing::{debug, warn};

const OWNED: &[AnalyzedProperty] = &[AnalyzedProperty::VulnerableToHeartbleed];

const PAYLOAD: [u8; 2] = [1, 3];
const DECLARED_LENGTH: u16 = 10;

pub struct HeartbleedProbe {
    version: Option<ProtocolVersion>,
}

impl HeartbleedProbe {
    pub fn new() -> Self {
        Self { version: None }
    }
}

impl Default for HeartbleedProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for HeartbleedProbe {
    fn probe_type(&self) -> ProbeType {
        ProbeType::Heartbleed
    }

    fn owned_properties(&self) -> &'static [AnalyzedProperty] {
        OWNED
    }

    fn can_be_executed(&self, report: &ScanReport) -> bool {
        report.is_probe_already_executed(ProbeType::CipherSuite)
            && report.is_probe_already_executed(ProbeType::CcaSupport)
            && report.is_false(AnalyzedProperty::RequiresCca)
            && report.is_false(AnalyzedProperty::SupportsOnlyPsk)
            && report.is_probe_already_executed(ProbeType::Extensions)
            && report.supported_extensions.as_ref().is_some_and(|e| !e.is_empty())
    }

    fn adjust_config(&mut self, report: &ScanReport) {
        self.version = report.highest_legacy_version();
    }

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
        let version = self
            .version
            .ok_or_else(|| ProbeError::NoCommonConfiguration("heartbeat needs a version below TLS 1.3".to_string()))?;

        let mut tls = ctx.selector.config_for(version).with_extension(ExtensionType::Heartbeat);
        ctx.selector.repair_config(&mut tls);
        let workflow = Workflow::for_type(WorkflowTraceType::Handshake, version)
            .then(ProtocolAction::SendHeartbeat {
                payload: PAYLOAD.to_vec(),
                declared_length: DECLARED_LENGTH,
            })
            .then(ProtocolAction::Receive(vec![MessageType::Heartbeat]));

        let Some(trace) = ctx.execute_trace("heartbleed", tls, workflow).await else {
            warn!("Heartbleed handshake failed");
            return Ok(ProbeOutcome::uniform(self.probe_type(), OWNED, TestResult::CouldNotTest));
        };

        let result = if trace.did_receive(MessageType::Heartbeat) {
            TestResult::True
        } else if !trace.received_finished() {
            TestResult::Uncertain
        } else {
            TestResult::False
        };
        debug!(version = %version, result = %result, "Heartbleed test");
        Ok(ProbeOutcome::new(self.probe_type()).with_property(AnalyzedProperty::VulnerableToHeartbleed, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PeerProfile;
    use crate::probes::testing::{assert_complete, context_for, report_with};

    async fn run(profile: PeerProfile) -> TestResult {
        let (ctx, _peer) = context_for(profile);
        let mut probe = HeartbleedProbe::new();
        probe.adjust_config(&report_with(&[ProtocolVersion::Tls12], Vec::new(), &[]));
        let outcome = probe.execute_test(&ctx).await.unwrap();
        assert_complete(&probe, &outcome);
        outcome.result_of(AnalyzedProperty::VulnerableToHeartbleed).unwrap()
    }

    #[tokio::test]
    async fn test_vulnerable_peer() {
        assert_eq!(run(PeerProfile::legacy()).await, TestResult::True);
    }

    #[tokio::test]
    async fn test_heartbeat_without_leak() {
        let mut profile = PeerProfile::legacy();
        profile.heartbleed = false;
        assert_eq!(run(profile).await, TestResult::False);
    }

    #[tokio::test]
    async fn test_failed_handshake_is_uncertain() {
        let mut profile = PeerProfile::legacy();
        profile.requires_client_certificate = true;
        assert_eq!(run(profile).await, TestResult::Uncertain);
    }

    #[test]
    fn test_dependencies() {
        let mut report = report_with(
            &[ProtocolVersion::Tls12],
            Vec::new(),
            &[
                (AnalyzedProperty::SupportsOnlyPsk, TestResult::False),
                (AnalyzedProperty::RequiresCca, TestResult::False),
            ],
        );
        report.mark_probe_executed(ProbeType::CcaSupport);
        assert!(!HeartbleedProbe::new().can_be_executed(&report));

        report
            .merge(
                ProbeOutcome::new(ProbeType::Extensions)
                    .with_artifact(crate::report::Artifact::Extensions(vec![ExtensionType::Heartbeat])),
            )
            .unwrap();
        report.mark_probe_executed(ProbeType::Extensions);
        assert!(HeartbleedProbe::new().can_be_executed(&report));
    }
}
