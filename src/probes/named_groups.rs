// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use super::selection::{enumerate_by_elimination, settle, Offer};
use super::{Probe, ProbeContext};
use crate::constants::{CipherSuite, NamedGroup, ProtocolVersion};
use crate::errors::ProbeError;
use crate::property::AnalyzedProperty;
use crate::report::{Artifact, ProbeOutcome, ScanReport};
use crate::types::ProbeType;
use async_trait::async_trait;
use tracing::info;

const OWNED: &[AnalyzedProperty] = &[AnalyzedProperty::SupportsX25519, AnalyzedProperty::SupportsNistCurves];

/// Enumerates elliptic-curve groups, below TLS 1.3 through ECDHE suites
/// and in TLS 1.3 through key shares
pub struct NamedGroupsProbe {
    legacy: Option<(ProtocolVersion, Vec<CipherSuite>)>,
    tls13: bool,
}

impl NamedGroupsProbe {
    pub fn new() -> Self {
        Self {
            legacy: None,
            tls13: false,
        }
    }
}

impl Default for NamedGroupsProbe {
    fn default() -> Self {
        Self::new()
    }
}

async fn selected_group(ctx: &ProbeContext, label: &str, tls: crate::engine::TlsConfig) -> Offer<NamedGroup> {
    ctx.cooldown().await;
    let Some(trace) = ctx.execute_hello(label, tls).await else {
        return Offer::Failed;
    };
    if !trace.received_server_hello() || trace.hello_retry_request {
        return Offer::Declined;
    }
    trace.selected_group.into()
}

#[async_trait]
impl Probe for NamedGroupsProbe {
    fn probe_type(&self) -> ProbeType {
        ProbeType::NamedGroups
    }

    fn owned_properties(&self) -> &'static [AnalyzedProperty] {
        OWNED
    }

    fn can_be_executed(&self, report: &ScanReport) -> bool {
        report.is_probe_already_executed(ProbeType::CipherSuite)
            && (report.is_true(AnalyzedProperty::SupportsEcdhe) || report.is_true(AnalyzedProperty::SupportsTls13))
    }

    fn adjust_config(&mut self, report: &ScanReport) {
        self.legacy = report.highest_legacy_version().and_then(|version| {
            let suites: Vec<CipherSuite> = report
                .cipher_suites_for(version)
                .into_iter()
                .filter(|s| s.uses_ecdh())
                .collect();
            (!suites.is_empty()).then_some((version, suites))
        });
        self.tls13 = report.is_true(AnalyzedProperty::SupportsTls13);
    }

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
        if self.legacy.is_none() && !self.tls13 {
            return Err(ProbeError::NoCommonConfiguration(
                "no ECDHE suite and no TLS 1.3 support".to_string(),
            ));
        }

        let mut supported: Vec<NamedGroup> = Vec::new();
        let mut searches = 0;
        let mut interrupted = 0;

        if let Some((version, suites)) = &self.legacy {
            let found = enumerate_by_elimination("named_groups:legacy", NamedGroup::all_ec(), |offered| {
                let tls = ctx
                    .selector
                    .config_for(*version)
                    .with_cipher_suites(suites.clone())
                    .with_named_groups(offered)
                    .enforcing();
                async move { selected_group(ctx, "named-groups-legacy", tls).await }
            })
            .await;
            searches += 1;
            if found.interrupted {
                interrupted += 1;
            }
            supported.extend(found.supported);
        }

        if self.tls13 {
            let found = enumerate_by_elimination("named_groups:tls13", NamedGroup::all_ec(), |offered| {
                let tls = ctx
                    .selector
                    .tls13_base_config()
                    .with_named_groups(offered.clone())
                    .with_key_share_groups(offered)
                    .enforcing();
                async move { selected_group(ctx, "named-groups-tls13", tls).await }
            })
            .await;
            searches += 1;
            if found.interrupted {
                interrupted += 1;
            }
            for group in found.supported {
                if !supported.contains(&group) {
                    supported.push(group);
                }
            }
        }

        if supported.is_empty() && interrupted == searches {
            return Err(ProbeError::AllTasksFailed { tasks: interrupted });
        }

        let complete = interrupted == 0;
        info!(groups = ?supported, complete, "Named group enumeration finished");
        Ok(ProbeOutcome::new(self.probe_type())
            .with_property(
                AnalyzedProperty::SupportsX25519,
                settle(supported.contains(&NamedGroup::X25519), complete),
            )
            .with_property(
                AnalyzedProperty::SupportsNistCurves,
                settle(supported.iter().any(NamedGroup::is_nist), complete),
            )
            .with_artifact(Artifact::NamedGroups(supported)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TestResult;
    use crate::engine::PeerProfile;
    use crate::probes::testing::{assert_complete, context_for, report_with};

    fn groups(outcome: &ProbeOutcome) -> Vec<NamedGroup> {
        outcome
            .artifacts
            .iter()
            .find_map(|a| match a {
                Artifact::NamedGroups(g) => Some(g.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_modern_groups() {
        let (ctx, _peer) = context_for(PeerProfile::modern());
        let report = report_with(
            &[ProtocolVersion::Tls12, ProtocolVersion::Tls13],
            vec![(ProtocolVersion::Tls12, vec![CipherSuite(0xC02F)])],
            &[(AnalyzedProperty::SupportsEcdhe, TestResult::True)],
        );
        let mut probe = NamedGroupsProbe::new();
        assert!(probe.can_be_executed(&report));
        probe.adjust_config(&report);
        let outcome = probe.execute_test(&ctx).await.unwrap();

        assert_complete(&probe, &outcome);
        assert_eq!(
            groups(&outcome),
            vec![NamedGroup::X25519, NamedGroup::Secp256r1, NamedGroup::Secp384r1]
        );
        assert_eq!(outcome.result_of(AnalyzedProperty::SupportsX25519), Some(TestResult::True));
    }

    #[tokio::test]
    async fn test_legacy_groups_follow_client_order() {
        let (ctx, _peer) = context_for(PeerProfile::legacy());
        let report = report_with(
            &[ProtocolVersion::Tls12],
            vec![(ProtocolVersion::Tls12, vec![CipherSuite(0xC013), CipherSuite(0x002F)])],
            &[(AnalyzedProperty::SupportsEcdhe, TestResult::True)],
        );
        let mut probe = NamedGroupsProbe::new();
        probe.adjust_config(&report);
        let outcome = probe.execute_test(&ctx).await.unwrap();

        assert_eq!(groups(&outcome), vec![NamedGroup::Secp256r1, NamedGroup::Secp384r1]);
        assert_eq!(outcome.result_of(AnalyzedProperty::SupportsX25519), Some(TestResult::False));
        assert_eq!(outcome.result_of(AnalyzedProperty::SupportsNistCurves), Some(TestResult::True));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_peer_fails_all_tasks() {
        let mut profile = PeerProfile::modern();
        profile.transport_failures = usize::MAX;
        let (ctx, _peer) = context_for(profile);
        let report = report_with(&[ProtocolVersion::Tls13], Vec::new(), &[]);
        let mut probe = NamedGroupsProbe::new();
        probe.adjust_config(&report);

        let err = probe.execute_test(&ctx).await.unwrap_err();
        assert!(matches!(err, ProbeError::AllTasksFailed { tasks: 1 }));
    }

    #[tokio::test]
    async fn test_lost_search_keeps_negative_results_open() {
        // the legacy search finishes, the TLS 1.3 one never gets an answer
        let mut profile = PeerProfile::modern();
        profile.named_groups = vec![NamedGroup::Secp256r1];
        profile.unreachable_after = Some(2);
        let (ctx, _peer) = context_for(profile);
        let report = report_with(
            &[ProtocolVersion::Tls12, ProtocolVersion::Tls13],
            vec![(ProtocolVersion::Tls12, vec![CipherSuite(0xC02F)])],
            &[(AnalyzedProperty::SupportsEcdhe, TestResult::True)],
        );
        let mut probe = NamedGroupsProbe::new();
        probe.adjust_config(&report);
        let outcome = probe.execute_test(&ctx).await.unwrap();

        assert_complete(&probe, &outcome);
        assert_eq!(groups(&outcome), vec![NamedGroup::Secp256r1]);
        assert_eq!(outcome.result_of(AnalyzedProperty::SupportsNistCurves), Some(TestResult::True));
        assert_eq!(outcome.result_of(AnalyzedProperty::SupportsX25519), Some(TestResult::Uncertain));
    }

    #[test]
    fn test_requires_ecdhe_or_tls13() {
        let report = report_with(&[ProtocolVersion::Tls12], Vec::new(), &[]);
        assert!(!NamedGroupsProbe::new().can_be_executed(&report));
    }
}
