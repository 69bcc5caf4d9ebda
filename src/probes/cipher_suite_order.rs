// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use super::{Probe, ProbeContext};
use crate::constants::{CipherSuite, ProtocolVersion};
use crate::errors::ProbeError;
use crate::property::AnalyzedProperty;
use crate::report::{ProbeOutcome, ScanReport};
use crate::types::{ProbeType, TestResult};
use async_trait::async_trait;
use tracing::debug;

const OWNED: &[AnalyzedProperty] = &[AnalyzedProperty::EnforcesCsOrdering];

/// Whether the server picks by its own preference: the same suite is
/// selected from the catalog and from the catalog reversed
pub struct CipherSuiteOrderProbe {
    version: Option<ProtocolVersion>,
}

impl CipherSuiteOrderProbe {
    pub fn new() -> Self {
        Self { version: None }
    }

    async fn selected(ctx: &ProbeContext, version: ProtocolVersion, suites: Vec<CipherSuite>) -> Option<CipherSuite> {
        let tls = ctx.selector.config_for(version).with_cipher_suites(suites);
        let trace = ctx.execute_hello("cipher-suite-order", tls).await?;
        if !trace.received_server_hello() {
            return None;
        }
        trace.selected_cipher_suite
    }
}

impl Default for CipherSuiteOrderProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for CipherSuiteOrderProbe {
    fn probe_type(&self) -> ProbeType {
        ProbeType::CipherSuiteOrder
    }

    fn owned_properties(&self) -> &'static [AnalyzedProperty] {
        OWNED
    }

    fn can_be_executed(&self, report: &ScanReport) -> bool {
        report.is_probe_already_executed(ProbeType::CipherSuite) && !report.cipher_suites().is_empty()
    }

    fn adjust_config(&mut self, report: &ScanReport) {
        self.version = report.highest_legacy_version().or_else(|| report.highest_version());
    }

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
        let version = self
            .version
            .ok_or_else(|| ProbeError::NoCommonConfiguration("no supported version".to_string()))?;

        let mut suites = if version.is_tls13() {
            CipherSuite::all_tls13()
        } else {
            CipherSuite::all_pre_tls13()
        };
        let first = Self::selected(ctx, version, suites.clone()).await;
        suites.reverse();
        let second = Self::selected(ctx, version, suites).await;

        debug!(first = ?first, reversed = ?second, "Cipher suite order selections");
        let result = match (first, second) {
            (Some(a), Some(b)) => TestResult::from_bool(a == b),
            _ => TestResult::CouldNotTest,
        };
        Ok(ProbeOutcome::new(self.probe_type()).with_property(AnalyzedProperty::EnforcesCsOrdering, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PeerProfile;
    use crate::probes::testing::{assert_complete, context_for, report_with};

    async fn run(profile: PeerProfile) -> TestResult {
        let (ctx, _peer) = context_for(profile);
        let mut probe = CipherSuiteOrderProbe::new();
        probe.adjust_config(&report_with(
            &[ProtocolVersion::Tls12],
            vec![(ProtocolVersion::Tls12, vec![CipherSuite(0x002F)])],
            &[],
        ));
        let outcome = probe.execute_test(&ctx).await.unwrap();
        assert_complete(&probe, &outcome);
        outcome.result_of(AnalyzedProperty::EnforcesCsOrdering).unwrap()
    }

    #[tokio::test]
    async fn test_server_order_is_enforced() {
        assert_eq!(run(PeerProfile::modern()).await, TestResult::True);
    }

    #[tokio::test]
    async fn test_client_order_is_followed() {
        assert_eq!(run(PeerProfile::legacy()).await, TestResult::False);
    }

    #[tokio::test]
    async fn test_no_selection_could_not_test() {
        let mut profile = PeerProfile::legacy();
        profile.cipher_suites = Vec::new();
        assert_eq!(run(profile).await, TestResult::CouldNotTest);
    }
}
