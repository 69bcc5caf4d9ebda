// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use super::{Probe, ProbeContext};
use crate::constants::{MessageType, ProtocolVersion};
use crate::engine::{Workflow, WorkflowTraceType};
use crate::errors::ProbeError;
use crate::property::AnalyzedProperty;
use crate::report::{ProbeOutcome, ScanReport};
use crate::types::{ProbeType, TestResult};
use async_trait::async_trait;
use tracing::debug;

const OWNED: &[AnalyzedProperty] = &[AnalyzedProperty::SupportsCca, AnalyzedProperty::RequiresCca];

/// Full handshake without a client certificate
pub struct CcaSupportProbe {
    version: Option<ProtocolVersion>,
}

impl CcaSupportProbe {
    pub fn new() -> Self {
        Self { version: None }
    }
}

impl Default for CcaSupportProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for CcaSupportProbe {
    fn probe_type(&self) -> ProbeType {
        ProbeType::CcaSupport
    }

    fn owned_properties(&self) -> &'static [AnalyzedProperty] {
        OWNED
    }

    fn can_be_executed(&self, report: &ScanReport) -> bool {
        report.is_probe_already_executed(ProbeType::ProtocolVersion)
    }

    fn adjust_config(&mut self, report: &ScanReport) {
        self.version = report
            .highest_legacy_version()
            .or_else(|| report.highest_version())
            .or_else(|| report.highest_dtls_version());
    }

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
        let version = self
            .version
            .ok_or_else(|| ProbeError::NoCommonConfiguration("no supported version".to_string()))?;

        let mut tls = ctx.selector.config_for(version);
        tls.client_authentication = false;
        ctx.selector.repair_config(&mut tls);
        let workflow = Workflow::for_type(WorkflowTraceType::Handshake, version);

        let trace = ctx
            .execute_trace("cca-support", tls, workflow)
            .await
            .ok_or(ProbeError::AllTasksFailed { tasks: 1 })?;

        let requested = trace.did_receive(MessageType::CertificateRequest);
        let required = requested && (!trace.received_finished() || trace.received_alert());
        debug!(version = %version, requested, required, "Client authentication test");

        Ok(ProbeOutcome::new(self.probe_type())
            .with_property(AnalyzedProperty::SupportsCca, TestResult::from_bool(requested))
            .with_property(AnalyzedProperty::RequiresCca, TestResult::from_bool(required)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PeerProfile;
    use crate::probes::testing::{assert_complete, context_for, report_with};

    async fn run(profile: PeerProfile) -> ProbeOutcome {
        let (ctx, _peer) = context_for(profile);
        let mut probe = CcaSupportProbe::new();
        probe.adjust_config(&report_with(&[ProtocolVersion::Tls12], Vec::new(), &[]));
        let outcome = probe.execute_test(&ctx).await.unwrap();
        assert_complete(&probe, &outcome);
        outcome
    }

    #[tokio::test]
    async fn test_no_client_auth() {
        let outcome = run(PeerProfile::modern()).await;
        assert_eq!(outcome.result_of(AnalyzedProperty::SupportsCca), Some(TestResult::False));
        assert_eq!(outcome.result_of(AnalyzedProperty::RequiresCca), Some(TestResult::False));
    }

    #[tokio::test]
    async fn test_optional_client_auth() {
        let mut profile = PeerProfile::modern();
        profile.requests_client_certificate = true;
        let outcome = run(profile).await;
        assert_eq!(outcome.result_of(AnalyzedProperty::SupportsCca), Some(TestResult::True));
        assert_eq!(outcome.result_of(AnalyzedProperty::RequiresCca), Some(TestResult::False));
    }

    #[tokio::test]
    async fn test_required_client_auth() {
        let mut profile = PeerProfile::modern();
        profile.requests_client_certificate = true;
        profile.requires_client_certificate = true;
        let outcome = run(profile).await;
        assert_eq!(outcome.result_of(AnalyzedProperty::RequiresCca), Some(TestResult::True));
    }

    #[tokio::test]
    async fn test_dtls_only_peer() {
        let (ctx, _peer) = context_for(PeerProfile::dtls());
        let mut probe = CcaSupportProbe::new();
        probe.adjust_config(&report_with(&[ProtocolVersion::Dtls12], Vec::new(), &[]));
        let outcome = probe.execute_test(&ctx).await.unwrap();
        assert_eq!(outcome.result_of(AnalyzedProperty::SupportsCca), Some(TestResult::False));
    }

    #[tokio::test]
    async fn test_without_versions() {
        let (ctx, _peer) = context_for(PeerProfile::modern());
        let mut probe = CcaSupportProbe::new();
        probe.adjust_config(&report_with(&[], Vec::new(), &[]));
        let result = probe.execute_test(&ctx).await;
        assert!(matches!(result, Err(ProbeError::NoCommonConfiguration(_))));
    }
}
