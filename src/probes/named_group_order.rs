// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use super::{Probe, ProbeContext};
use crate::constants::{CipherSuite, NamedGroup, ProtocolVersion};
use crate::errors::ProbeError;
use crate::property::AnalyzedProperty;
use crate::report::{ProbeOutcome, ScanReport};
use crate::types::{ProbeType, TestResult};
use async_trait::async_trait;
use tracing::debug;

const OWNED: &[AnalyzedProperty] = &[AnalyzedProperty::EnforcesNamedGroupOrdering];

/// Whether the selected group follows the order the client offered
pub struct NamedGroupOrderProbe {
    groups: Vec<NamedGroup>,
    version: ProtocolVersion,
}

impl NamedGroupOrderProbe {
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            version: ProtocolVersion::Tls12,
        }
    }

    async fn selected(&self, ctx: &ProbeContext, groups: Vec<NamedGroup>) -> Option<NamedGroup> {
        let ecdh: Vec<CipherSuite> = CipherSuite::all_pre_tls13()
            .into_iter()
            .filter(|s| s.uses_ecdh())
            .collect();
        let tls = ctx
            .selector
            .config_for(self.version)
            .with_cipher_suites(ecdh)
            .with_named_groups(groups)
            .enforcing();
        let trace = ctx.execute_hello("named-group-order", tls).await?;
        if !trace.received_server_hello() {
            return None;
        }
        trace.selected_group
    }
}

impl Default for NamedGroupOrderProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for NamedGroupOrderProbe {
    fn probe_type(&self) -> ProbeType {
        ProbeType::NamedGroupOrder
    }

    fn owned_properties(&self) -> &'static [AnalyzedProperty] {
        OWNED
    }

    fn can_be_executed(&self, report: &ScanReport) -> bool {
        report.is_probe_already_executed(ProbeType::NamedGroups)
            && report.named_groups.as_ref().is_some_and(|g| !g.is_empty())
            && report.is_probe_already_executed(ProbeType::CipherSuite)
            && report.cipher_suites().iter().any(|s| s.uses_ecdh())
    }

    fn adjust_config(&mut self, report: &ScanReport) {
        self.groups = report.named_groups.clone().unwrap_or_default();
        if let Some(version) = report
            .version_suite_pairs
            .iter()
            .flatten()
            .filter(|pair| pair.cipher_suites.iter().any(|s| s.uses_ecdh()))
            .map(|pair| pair.version)
            .max()
        {
            self.version = version;
        }
    }

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
        let mut groups = self.groups.clone();
        let first = self.selected(ctx, groups.clone()).await;
        groups.reverse();
        let second = self.selected(ctx, groups).await;

        debug!(first = ?first, reversed = ?second, "Named group order selections");
        let result = TestResult::from_bool(first != second || self.groups.len() == 1);
        Ok(ProbeOutcome::new(self.probe_type()).with_property(AnalyzedProperty::EnforcesNamedGroupOrdering, result))
    }
}
