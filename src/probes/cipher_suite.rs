// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Cipher Suite Probe
 * Enumerates supported suites per protocol version and derives the
 * suite-class properties from their union
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use super::selection::{enumerate_by_elimination, settle, Enumeration, Offer};
use super::{Probe, ProbeContext};
use crate::constants::{CipherSuite, ProtocolVersion};
use crate::errors::ProbeError;
use crate::property::AnalyzedProperty;
use crate::report::{Artifact, ProbeOutcome, ScanReport, VersionSuitePair};
use crate::types::{ProbeType, ScanDetail, TestResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

const OWNED: &[AnalyzedProperty] = &[
    AnalyzedProperty::SupportsNullCiphers,
    AnalyzedProperty::SupportsExportCiphers,
    AnalyzedProperty::SupportsRc4,
    AnalyzedProperty::SupportsCbc,
    AnalyzedProperty::SupportsAead,
    AnalyzedProperty::SupportsPfs,
    AnalyzedProperty::SupportsDhe,
    AnalyzedProperty::SupportsEcdhe,
    AnalyzedProperty::SupportsOnlyPsk,
];

pub struct CipherSuiteProbe {
    versions: Vec<ProtocolVersion>,
}

impl CipherSuiteProbe {
    pub fn new() -> Self {
        Self { versions: Vec::new() }
    }

    fn candidates_for(version: ProtocolVersion) -> Vec<CipherSuite> {
        match version {
            ProtocolVersion::Tls13 => CipherSuite::all_tls13(),
            ProtocolVersion::Ssl3 => CipherSuite::all_ssl3(),
            _ => CipherSuite::all_pre_tls13(),
        }
    }

    /// Offer `suites` pinned to `version` and report the peer's pick
    async fn selected_suite(
        ctx: &ProbeContext,
        version: ProtocolVersion,
        suites: Vec<CipherSuite>,
        failures: &AtomicUsize,
    ) -> Offer<CipherSuite> {
        ctx.cooldown().await;
        let tls = ctx.selector.config_for(version).with_cipher_suites(suites).enforcing();
        let label = format!("cipher-suites-{}", version);
        let Some(trace) = ctx.execute_hello(&label, tls).await else {
            failures.fetch_add(1, Ordering::SeqCst);
            return Offer::Failed;
        };

        if !trace.received_server_hello() {
            return Offer::Declined;
        }
        if trace.selected_version != Some(version) {
            debug!(
                version = %version,
                selected = ?trace.selected_version,
                "Peer answered with another version, stopping"
            );
            return Offer::Declined;
        }
        trace.selected_cipher_suite.into()
    }

    async fn enumerate_version(
        ctx: &ProbeContext,
        version: ProtocolVersion,
        failures: &AtomicUsize,
    ) -> Enumeration<CipherSuite> {
        let candidates = Self::candidates_for(version);
        let label = format!("cipher_suite:{}", version);

        let found = enumerate_by_elimination(&label, candidates.clone(), |offered| {
            Self::selected_suite(ctx, version, offered, failures)
        })
        .await;

        if !found.supported.is_empty()
            || found.interrupted
            || !ctx.config.scan_detail.is_greater_equal_to(ScanDetail::Detailed)
        {
            return found;
        }

        // Some stacks reject long lists outright, retry one suite at a time
        debug!(version = %version, "No suite found, testing suites individually");
        let mut individually = Enumeration {
            supported: Vec::new(),
            interrupted: false,
        };
        for suite in candidates {
            match Self::selected_suite(ctx, version, vec![suite], failures).await {
                Offer::Selected(selected) if selected == suite => individually.supported.push(suite),
                Offer::Failed => individually.interrupted = true,
                _ => {}
            }
        }
        individually
    }
}

impl Default for CipherSuiteProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// Suite-class properties over every supported suite
///
/// With `complete == false` some version lost suites to failed tasks, so a
/// class that was not seen is `UNCERTAIN` rather than `FALSE`.
pub(crate) fn suite_properties(suites: &[CipherSuite], complete: bool) -> Vec<(AnalyzedProperty, TestResult)> {
    let any = |predicate: fn(&CipherSuite) -> bool| settle(suites.iter().any(predicate), complete);
    let only_psk = if suites.iter().any(|s| !s.is_psk()) {
        TestResult::False
    } else if !complete {
        TestResult::Uncertain
    } else {
        TestResult::from_bool(!suites.is_empty())
    };
    vec![
        (AnalyzedProperty::SupportsNullCiphers, any(CipherSuite::is_null)),
        (AnalyzedProperty::SupportsExportCiphers, any(CipherSuite::is_export)),
        (AnalyzedProperty::SupportsRc4, any(CipherSuite::is_rc4)),
        (AnalyzedProperty::SupportsCbc, any(CipherSuite::is_cbc)),
        (AnalyzedProperty::SupportsAead, any(CipherSuite::is_aead)),
        (AnalyzedProperty::SupportsPfs, any(CipherSuite::is_ephemeral)),
        (AnalyzedProperty::SupportsDhe, any(CipherSuite::uses_dh)),
        (AnalyzedProperty::SupportsEcdhe, any(CipherSuite::uses_ecdh)),
        (AnalyzedProperty::SupportsOnlyPsk, only_psk),
    ]
}

#[async_trait]
impl Probe for CipherSuiteProbe {
    fn probe_type(&self) -> ProbeType {
        ProbeType::CipherSuite
    }

    fn owned_properties(&self) -> &'static [AnalyzedProperty] {
        OWNED
    }

    fn can_be_executed(&self, report: &ScanReport) -> bool {
        report.is_probe_already_executed(ProbeType::ProtocolVersion)
    }

    fn adjust_config(&mut self, report: &ScanReport) {
        self.versions = report.supported_versions();
    }

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
        let failures = AtomicUsize::new(0);
        let mut pairs = Vec::new();
        let mut incomplete = Vec::new();

        for version in &self.versions {
            let found = Self::enumerate_version(ctx, *version, &failures).await;
            debug!(
                version = %version,
                suites = found.supported.len(),
                complete = found.is_complete(),
                "Suites enumerated"
            );
            if found.interrupted {
                incomplete.push(*version);
            }
            let cipher_suites = found.supported;
            if !cipher_suites.is_empty() {
                pairs.push(VersionSuitePair {
                    version: *version,
                    cipher_suites,
                });
            }
        }

        if pairs.is_empty() && failures.load(Ordering::SeqCst) > 0 {
            return Err(ProbeError::AllTasksFailed {
                tasks: failures.load(Ordering::SeqCst),
            });
        }

        let mut union: Vec<CipherSuite> = Vec::new();
        for suite in pairs.iter().flat_map(|p| p.cipher_suites.iter()) {
            if !union.contains(suite) {
                union.push(*suite);
            }
        }
        if !incomplete.is_empty() {
            warn!(versions = ?incomplete, "Cipher suite enumeration incomplete for some versions");
        }
        info!(suites = union.len(), versions = pairs.len(), "Cipher suite enumeration finished");

        let outcome = suite_properties(&union, incomplete.is_empty())
            .into_iter()
            .fold(ProbeOutcome::new(self.probe_type()), |outcome, (property, result)| {
                outcome.with_property(property, result)
            });
        Ok(outcome.with_artifact(Artifact::VersionSuitePairs(pairs)))
    }
}
