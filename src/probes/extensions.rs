// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use super::selection::settle;
use super::{Probe, ProbeContext};
use crate::constants::{ExtensionType, ALPN_PROTOCOLS};
use crate::engine::TlsConfig;
use crate::errors::ProbeError;
use crate::property::AnalyzedProperty;
use crate::report::{Artifact, ProbeOutcome, ScanReport};
use crate::types::{ProbeType, TestResult};
use async_trait::async_trait;
use tracing::{debug, info};

const OWNED: &[AnalyzedProperty] = &[
    AnalyzedProperty::SupportsHeartbeat,
    AnalyzedProperty::SupportsExtendedMasterSecret,
    AnalyzedProperty::SupportsEncryptThenMac,
    AnalyzedProperty::SupportsExtendedRandom,
    AnalyzedProperty::SupportsSessionTickets,
    AnalyzedProperty::SupportsSecureRenegotiation,
];

const EXTENSION_PROPERTIES: &[(ExtensionType, AnalyzedProperty)] = &[
    (ExtensionType::Heartbeat, AnalyzedProperty::SupportsHeartbeat),
    (ExtensionType::ExtendedMasterSecret, AnalyzedProperty::SupportsExtendedMasterSecret),
    (ExtensionType::EncryptThenMac, AnalyzedProperty::SupportsEncryptThenMac),
    (ExtensionType::ExtendedRandom, AnalyzedProperty::SupportsExtendedRandom),
    (ExtensionType::SessionTicket, AnalyzedProperty::SupportsSessionTickets),
    (ExtensionType::RenegotiationInfo, AnalyzedProperty::SupportsSecureRenegotiation),
];

/// Offers every known extension and records what the peer echoes
pub struct ExtensionsProbe;

impl ExtensionsProbe {
    pub fn new() -> Self {
        Self
    }

    fn offering_everything(tls: TlsConfig) -> TlsConfig {
        let mut tls = tls.with_alpn_protocols(ALPN_PROTOCOLS.iter().map(|p| p.to_string()).collect());
        for extension in ExtensionType::PROBED {
            tls.add_extension(extension);
        }
        tls.with_extension(ExtensionType::ExtendedRandom)
    }
}

impl Default for ExtensionsProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for ExtensionsProbe {
    fn probe_type(&self) -> ProbeType {
        ProbeType::Extensions
    }

    fn owned_properties(&self) -> &'static [AnalyzedProperty] {
        OWNED
    }

    fn can_be_executed(&self, _report: &ScanReport) -> bool {
        true
    }

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
        let configs = [
            ("extensions-legacy", ctx.selector.base_config()),
            ("extensions-tls13", ctx.selector.tls13_base_config()),
        ];

        let configs_len = configs.len();
        let mut handshakes = 0;
        let mut answered = false;
        let mut supported: Vec<ExtensionType> = Vec::new();

        for (label, tls) in configs {
            let Some(trace) = ctx.execute_hello(label, Self::offering_everything(tls)).await else {
                continue;
            };
            handshakes += 1;
            if !trace.received_server_hello() {
                continue;
            }
            answered = true;
            debug!(task = label, extensions = ?trace.server_extensions, "Extensions echoed");
            for extension in trace.server_extensions {
                if !supported.contains(&extension) {
                    supported.push(extension);
                }
            }
        }

        if handshakes == 0 {
            return Err(ProbeError::AllTasksFailed { tasks: configs_len });
        }
        let complete = handshakes == configs_len;

        let mut outcome = ProbeOutcome::new(self.probe_type());
        for (extension, property) in EXTENSION_PROPERTIES {
            let result = if answered {
                settle(supported.contains(extension), complete)
            } else {
                TestResult::CouldNotTest
            };
            outcome = outcome.with_property(*property, result);
        }

        info!(extensions = supported.len(), complete, "Extension enumeration finished");
        Ok(outcome.with_artifact(Artifact::Extensions(supported)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PeerProfile;
    use crate::probes::testing::{assert_complete, context_for};

    fn extensions(outcome: &ProbeOutcome) -> Vec<ExtensionType> {
        outcome
            .artifacts
            .iter()
            .find_map(|a| match a {
                Artifact::Extensions(e) => Some(e.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_modern_extensions() {
        let (ctx, _peer) = context_for(PeerProfile::modern());
        let mut probe = ExtensionsProbe::new();
        let outcome = probe.execute_test(&ctx).await.unwrap();

        assert_complete(&probe, &outcome);
        let supported = extensions(&outcome);
        assert!(supported.contains(&ExtensionType::Alpn));
        assert!(supported.contains(&ExtensionType::KeyShare));
        assert_eq!(outcome.result_of(AnalyzedProperty::SupportsHeartbeat), Some(TestResult::False));
        assert_eq!(
            outcome.result_of(AnalyzedProperty::SupportsExtendedMasterSecret),
            Some(TestResult::True)
        );
        assert_eq!(
            outcome.result_of(AnalyzedProperty::SupportsSecureRenegotiation),
            Some(TestResult::True)
        );
    }

    #[tokio::test]
    async fn test_legacy_heartbeat() {
        let (ctx, _peer) = context_for(PeerProfile::legacy());
        let mut probe = ExtensionsProbe::new();
        let outcome = probe.execute_test(&ctx).await.unwrap();

        assert!(!extensions(&outcome).contains(&ExtensionType::Alpn));
        assert_eq!(outcome.result_of(AnalyzedProperty::SupportsHeartbeat), Some(TestResult::True));
        assert_eq!(outcome.result_of(AnalyzedProperty::SupportsSessionTickets), Some(TestResult::True));
        assert_eq!(outcome.result_of(AnalyzedProperty::SupportsEncryptThenMac), Some(TestResult::False));
    }

    #[tokio::test]
    async fn test_lost_handshake_leaves_missing_extensions_uncertain() {
        let mut profile = PeerProfile::legacy();
        profile.unreachable_after = Some(1);
        let (ctx, _peer) = context_for(profile);
        let mut probe = ExtensionsProbe::new();
        let outcome = probe.execute_test(&ctx).await.unwrap();

        assert_complete(&probe, &outcome);
        assert_eq!(outcome.result_of(AnalyzedProperty::SupportsHeartbeat), Some(TestResult::True));
        assert_eq!(outcome.result_of(AnalyzedProperty::SupportsEncryptThenMac), Some(TestResult::Uncertain));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_peer_fails_all_tasks() {
        let mut profile = PeerProfile::modern();
        profile.transport_failures = usize::MAX;
        let (ctx, _peer) = context_for(profile);

        let err = ExtensionsProbe::new().execute_test(&ctx).await.unwrap_err();
        assert!(matches!(err, ProbeError::AllTasksFailed { tasks: 2 }));
    }
}
