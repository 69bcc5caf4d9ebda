// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use super::selection::{enumerate_by_elimination, Offer};
use super::{Probe, ProbeContext};
use crate::constants::{ExtensionType, ProtocolVersion, ALPN_PROTOCOLS};
use crate::errors::ProbeError;
use crate::property::AnalyzedProperty;
use crate::report::{Artifact, ProbeOutcome, ScanReport};
use crate::types::ProbeType;
use async_trait::async_trait;
use tracing::info;

const OWNED: &[AnalyzedProperty] = &[AnalyzedProperty::SupportsHttp2];

/// Application protocols the peer negotiates through ALPN
pub struct AlpnProbe {
    version: ProtocolVersion,
}

impl AlpnProbe {
    pub fn new() -> Self {
        Self {
            version: ProtocolVersion::Tls12,
        }
    }
}

impl Default for AlpnProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for AlpnProbe {
    fn probe_type(&self) -> ProbeType {
        ProbeType::Alpn
    }

    fn owned_properties(&self) -> &'static [AnalyzedProperty] {
        OWNED
    }

    fn can_be_executed(&self, report: &ScanReport) -> bool {
        report.is_probe_already_executed(ProbeType::Extensions)
            && report
                .supported_extensions
                .as_ref()
                .is_some_and(|e| e.contains(&ExtensionType::Alpn))
    }

    fn adjust_config(&mut self, report: &ScanReport) {
        if let Some(version) = report.highest_version() {
            self.version = version;
        }
    }

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
        let version = self.version;
        let candidates: Vec<String> = ALPN_PROTOCOLS.iter().map(|p| p.to_string()).collect();

        let found = enumerate_by_elimination("alpn", candidates, |offered| {
            let tls = ctx.selector.config_for(version).with_alpn_protocols(offered);
            async move {
                ctx.cooldown().await;
                match ctx.execute_hello("alpn", tls).await {
                    Some(trace) => trace.selected_alpn.into(),
                    None => Offer::Failed,
                }
            }
        })
        .await;

        if found.interrupted && found.supported.is_empty() {
            return Err(ProbeError::AllTasksFailed { tasks: 1 });
        }

        info!(protocols = ?found.supported, complete = found.is_complete(), "ALPN enumeration finished");
        let http2 = found.verdict(found.supported.iter().any(|p| p == "h2"));
        Ok(ProbeOutcome::new(self.probe_type())
            .with_property(AnalyzedProperty::SupportsHttp2, http2)
            .with_artifact(Artifact::AlpnProtocols(found.supported)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TestResult;
    use crate::engine::PeerProfile;
    use crate::probes::testing::{assert_complete, context_for};

    #[tokio::test]
    async fn test_modern_alpn_in_server_order() {
        let (ctx, _peer) = context_for(PeerProfile::modern());
        let mut probe = AlpnProbe::new();
        let outcome = probe.execute_test(&ctx).await.unwrap();

        assert_complete(&probe, &outcome);
        assert_eq!(outcome.result_of(AnalyzedProperty::SupportsHttp2), Some(TestResult::True));
        assert_eq!(
            outcome.artifacts,
            vec![Artifact::AlpnProtocols(vec!["h2".to_string(), "http/1.1".to_string()])]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_peer_is_not_a_negative_result() {
        let mut profile = PeerProfile::modern();
        profile.transport_failures = usize::MAX;
        let (ctx, _peer) = context_for(profile);

        let err = AlpnProbe::new().execute_test(&ctx).await.unwrap_err();
        assert!(matches!(err, ProbeError::AllTasksFailed { .. }));
    }

    #[tokio::test]
    async fn test_peer_lost_mid_enumeration_is_uncertain() {
        let mut profile = PeerProfile::modern();
        profile.alpn_protocols = vec!["http/1.1".to_string(), "h2".to_string()];
        profile.unreachable_after = Some(1);
        let (ctx, _peer) = context_for(profile);
        let mut probe = AlpnProbe::new();
        let outcome = probe.execute_test(&ctx).await.unwrap();

        assert_complete(&probe, &outcome);
        assert_eq!(outcome.result_of(AnalyzedProperty::SupportsHttp2), Some(TestResult::Uncertain));
        assert_eq!(
            outcome.artifacts,
            vec![Artifact::AlpnProtocols(vec!["http/1.1".to_string()])]
        );
    }

    #[test]
    fn test_requires_alpn_extension() {
        let mut report = ScanReport::new("sim.test", 443);
        assert!(!AlpnProbe::new().can_be_executed(&report));

        report
            .merge(ProbeOutcome::new(ProbeType::Extensions).with_artifact(Artifact::Extensions(vec![ExtensionType::Heartbeat])))
            .unwrap();
        report.mark_probe_executed(ProbeType::Extensions);
        assert!(!AlpnProbe::new().can_be_executed(&report));
    }
}
