// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use super::{Probe, ProbeContext};
use crate::constants::{CipherSuite, EcPointFormat, NamedGroup, ProtocolVersion};
use crate::engine::{TlsConfig, Workflow, WorkflowTraceType};
use crate::errors::ProbeError;
use crate::property::AnalyzedProperty;
use crate::report::{Artifact, ProbeOutcome, ScanReport};
use crate::types::{ProbeType, TestResult};
use async_trait::async_trait;
use tracing::{debug, info};

const OWNED: &[AnalyzedProperty] = &[
    AnalyzedProperty::SupportsUncompressedPoint,
    AnalyzedProperty::SupportsAnsiX962CompressedPrime,
    AnalyzedProperty::SupportsAnsiX962CompressedChar2,
    AnalyzedProperty::HandshakesWithUndefinedPointFormat,
    AnalyzedProperty::SupportsTls13SecpCompression,
];

/// Unassigned codes listed in place of real formats
const UNDEFINED_FORMATS: [EcPointFormat; 2] = [EcPointFormat(0xE4), EcPointFormat(0x04)];

/// Which EC point encodings the peer accepts for the client's key share
pub struct EcPointFormatProbe {
    legacy: Option<ProtocolVersion>,
    tls13: bool,
}

impl EcPointFormatProbe {
    pub fn new() -> Self {
        Self {
            legacy: None,
            tls13: false,
        }
    }

    fn groups_for(format: EcPointFormat) -> Vec<NamedGroup> {
        NamedGroup::all_ec().into_iter().filter(|g| g.has_point_formats() && format.fits(*g)).collect()
    }

    fn ecdh_suites() -> Vec<CipherSuite> {
        CipherSuite::all_pre_tls13().into_iter().filter(|s| s.uses_ecdh()).collect()
    }

    /// Full handshake encoding the client key in `format`; `None` when the task failed
    async fn completes_with(
        ctx: &ProbeContext,
        version: ProtocolVersion,
        format: EcPointFormat,
        listed: Vec<EcPointFormat>,
    ) -> Option<bool> {
        let mut tls = ctx
            .selector
            .config_for(version)
            .with_cipher_suites(Self::ecdh_suites())
            .with_named_groups(Self::groups_for(format))
            .with_point_formats(listed)
            .with_selected_point_format(format)
            .enforcing();
        ctx.selector.repair_config(&mut tls);
        Self::handshake(ctx, "ec-point-format", version, tls).await
    }

    async fn handshake(ctx: &ProbeContext, label: &str, version: ProtocolVersion, tls: TlsConfig) -> Option<bool> {
        ctx.cooldown().await;
        let workflow = Workflow::for_type(WorkflowTraceType::Handshake, version);
        let trace = ctx.execute_trace(label, tls, workflow).await?;
        Some(trace.received_finished())
    }
}

impl Default for EcPointFormatProbe {
    fn default() -> Self {
        Self::new()
    }
}

fn observed(result: Option<bool>) -> TestResult {
    result.map_or(TestResult::CouldNotTest, TestResult::from_bool)
}

#[async_trait]
impl Probe for EcPointFormatProbe {
    fn probe_type(&self) -> ProbeType {
        ProbeType::EcPointFormat
    }

    fn owned_properties(&self) -> &'static [AnalyzedProperty] {
        OWNED
    }

    fn can_be_executed(&self, report: &ScanReport) -> bool {
        report.is_probe_already_executed(ProbeType::ProtocolVersion)
            && report.is_probe_already_executed(ProbeType::CipherSuite)
            && (report.is_true(AnalyzedProperty::SupportsEcdhe) || report.is_true(AnalyzedProperty::SupportsTls13))
    }

    fn adjust_config(&mut self, report: &ScanReport) {
        self.legacy = report
            .is_true(AnalyzedProperty::SupportsEcdhe)
            .then(|| report.highest_legacy_version().or_else(|| report.highest_dtls_version()))
            .flatten();
        self.tls13 = report.is_true(AnalyzedProperty::SupportsTls13);
    }

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
        let mut outcome = ProbeOutcome::new(self.probe_type());
        let mut results: Vec<Option<bool>> = Vec::new();

        match self.legacy {
            Some(version) => {
                let mut supported = Vec::new();
                for (format, property) in [
                    (EcPointFormat::UNCOMPRESSED, AnalyzedProperty::SupportsUncompressedPoint),
                    (EcPointFormat::ANSIX962_COMPRESSED_PRIME, AnalyzedProperty::SupportsAnsiX962CompressedPrime),
                    (EcPointFormat::ANSIX962_COMPRESSED_CHAR2, AnalyzedProperty::SupportsAnsiX962CompressedChar2),
                ] {
                    let listed = vec![EcPointFormat::UNCOMPRESSED, format];
                    let result = Self::completes_with(ctx, version, format, listed).await;
                    debug!(version = %version, format = %format, accepted = ?result, "Point format tested");
                    if result == Some(true) {
                        supported.push(format);
                    }
                    outcome = outcome.with_property(property, observed(result));
                    results.push(result);
                }

                let undefined = Self::completes_with(
                    ctx,
                    version,
                    EcPointFormat::UNCOMPRESSED,
                    UNDEFINED_FORMATS.to_vec(),
                )
                .await;
                outcome = outcome
                    .with_property(AnalyzedProperty::HandshakesWithUndefinedPointFormat, observed(undefined))
                    .with_artifact(Artifact::PointFormats(supported));
                results.push(undefined);
            }
            None => {
                for property in &OWNED[..4] {
                    outcome = outcome.with_property(*property, TestResult::CouldNotTest);
                }
            }
        }

        if self.tls13 {
            // TLS 1.3 drops point format negotiation, key shares must be uncompressed
            let nist: Vec<NamedGroup> = NamedGroup::all_ec().into_iter().filter(NamedGroup::is_nist).collect();
            let mut tls = ctx
                .selector
                .tls13_base_config()
                .with_named_groups(nist.clone())
                .with_key_share_groups(nist)
                .with_point_formats(vec![EcPointFormat::ANSIX962_COMPRESSED_PRIME])
                .with_selected_point_format(EcPointFormat::ANSIX962_COMPRESSED_PRIME);
            ctx.selector.repair_config(&mut tls);
            let compressed = Self::handshake(ctx, "tls13-secp-compression", ProtocolVersion::Tls13, tls).await;
            outcome = outcome.with_property(AnalyzedProperty::SupportsTls13SecpCompression, observed(compressed));
            results.push(compressed);
        } else {
            outcome = outcome.with_property(AnalyzedProperty::SupportsTls13SecpCompression, TestResult::CouldNotTest);
        }

        if !results.is_empty() && results.iter().all(Option::is_none) {
            return Err(ProbeError::AllTasksFailed { tasks: results.len() });
        }

        info!(version = ?self.legacy, tls13 = self.tls13, "Point format tests finished");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PeerProfile;
    use crate::probes::testing::{assert_complete, context_for, report_with};

    async fn run(profile: PeerProfile, versions: &[ProtocolVersion], ecdhe: bool) -> ProbeOutcome {
        let (ctx, _peer) = context_for(profile);
        let mut probe = EcPointFormatProbe::new();
        let report = report_with(
            versions,
            Vec::new(),
            &[(AnalyzedProperty::SupportsEcdhe, TestResult::from_bool(ecdhe))],
        );
        assert!(probe.can_be_executed(&report));
        probe.adjust_config(&report);
        let outcome = probe.execute_test(&ctx).await.unwrap();
        assert_complete(&probe, &outcome);
        outcome
    }

    #[tokio::test]
    async fn test_legacy_accepts_compressed_prime() {
        let outcome = run(PeerProfile::legacy(), &[ProtocolVersion::Tls12], true).await;

        assert_eq!(outcome.result_of(AnalyzedProperty::SupportsUncompressedPoint), Some(TestResult::True));
        assert_eq!(
            outcome.result_of(AnalyzedProperty::SupportsAnsiX962CompressedPrime),
            Some(TestResult::True)
        );
        // no binary curve in common
        assert_eq!(
            outcome.result_of(AnalyzedProperty::SupportsAnsiX962CompressedChar2),
            Some(TestResult::False)
        );
        assert_eq!(
            outcome.result_of(AnalyzedProperty::HandshakesWithUndefinedPointFormat),
            Some(TestResult::True)
        );
        assert_eq!(
            outcome.result_of(AnalyzedProperty::SupportsTls13SecpCompression),
            Some(TestResult::CouldNotTest)
        );
        assert_eq!(
            outcome.artifacts,
            vec![Artifact::PointFormats(vec![
                EcPointFormat::UNCOMPRESSED,
                EcPointFormat::ANSIX962_COMPRESSED_PRIME
            ])]
        );
    }

    #[tokio::test]
    async fn test_modern_uncompressed_only() {
        let outcome = run(PeerProfile::modern(), &[ProtocolVersion::Tls12, ProtocolVersion::Tls13], true).await;

        assert_eq!(outcome.result_of(AnalyzedProperty::SupportsUncompressedPoint), Some(TestResult::True));
        assert_eq!(
            outcome.result_of(AnalyzedProperty::SupportsAnsiX962CompressedPrime),
            Some(TestResult::False)
        );
        assert_eq!(
            outcome.result_of(AnalyzedProperty::HandshakesWithUndefinedPointFormat),
            Some(TestResult::False)
        );
        assert_eq!(
            outcome.result_of(AnalyzedProperty::SupportsTls13SecpCompression),
            Some(TestResult::False)
        );
    }

    #[tokio::test]
    async fn test_binary_curves_and_lenient_tls13() {
        let mut profile = PeerProfile::modern();
        profile.named_groups.push(NamedGroup::Sect283r1);
        profile.point_formats.push(EcPointFormat::ANSIX962_COMPRESSED_CHAR2);
        profile.tls13_compressed_points = true;
        let outcome = run(profile, &[ProtocolVersion::Tls12, ProtocolVersion::Tls13], true).await;

        assert_eq!(
            outcome.result_of(AnalyzedProperty::SupportsAnsiX962CompressedChar2),
            Some(TestResult::True)
        );
        assert_eq!(
            outcome.result_of(AnalyzedProperty::SupportsTls13SecpCompression),
            Some(TestResult::True)
        );
    }

    #[tokio::test]
    async fn test_tls13_only_peer_skips_legacy_formats() {
        let outcome = run(PeerProfile::modern(), &[ProtocolVersion::Tls13], false).await;

        assert_eq!(
            outcome.result_of(AnalyzedProperty::SupportsUncompressedPoint),
            Some(TestResult::CouldNotTest)
        );
        assert_eq!(
            outcome.result_of(AnalyzedProperty::SupportsTls13SecpCompression),
            Some(TestResult::False)
        );
        assert!(outcome.artifacts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_peer_fails_all_tasks() {
        let mut profile = PeerProfile::modern();
        profile.transport_failures = usize::MAX;
        let (ctx, _peer) = context_for(profile);
        let mut probe = EcPointFormatProbe::new();
        probe.adjust_config(&report_with(
            &[ProtocolVersion::Tls12, ProtocolVersion::Tls13],
            Vec::new(),
            &[(AnalyzedProperty::SupportsEcdhe, TestResult::True)],
        ));

        let err = probe.execute_test(&ctx).await.unwrap_err();
        assert!(matches!(err, ProbeError::AllTasksFailed { tasks: 5 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lost_connection_is_not_a_rejection() {
        let mut profile = PeerProfile::legacy();
        profile.unreachable_after = Some(1);
        let outcome = run(profile, &[ProtocolVersion::Tls12], true).await;

        assert_eq!(outcome.result_of(AnalyzedProperty::SupportsUncompressedPoint), Some(TestResult::True));
        assert_eq!(
            outcome.result_of(AnalyzedProperty::SupportsAnsiX962CompressedPrime),
            Some(TestResult::CouldNotTest)
        );
        assert_eq!(
            outcome.result_of(AnalyzedProperty::HandshakesWithUndefinedPointFormat),
            Some(TestResult::CouldNotTest)
        );
    }
}
