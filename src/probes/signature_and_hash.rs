// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use super::selection::{enumerate_by_elimination, settle, Enumeration, Offer};
use super::{Probe, ProbeContext};
use crate::constants::{CipherSuite, ProtocolVersion, SignatureAndHashAlgorithm};
use crate::errors::ProbeError;
use crate::property::AnalyzedProperty;
use crate::report::{Artifact, ProbeOutcome, ScanReport};
use crate::types::ProbeType;
use async_trait::async_trait;
use tracing::{debug, info};

const OWNED: &[AnalyzedProperty] = &[AnalyzedProperty::SupportsWeakSignatureHash, AnalyzedProperty::SupportsRsaPss];

/// Enumerates the algorithms the peer signs ServerKeyExchange and TLS 1.3
/// CertificateVerify messages with
pub struct SignatureAndHashProbe {
    versions: Vec<ProtocolVersion>,
}

impl SignatureAndHashProbe {
    pub fn new() -> Self {
        Self { versions: Vec::new() }
    }

    async fn enumerate_version(ctx: &ProbeContext, version: ProtocolVersion) -> Enumeration<SignatureAndHashAlgorithm> {
        let (suites, candidates): (Vec<CipherSuite>, Vec<SignatureAndHashAlgorithm>) = if version.is_tls13() {
            (CipherSuite::all_tls13(), SignatureAndHashAlgorithm::all_tls13())
        } else {
            (
                CipherSuite::all_pre_tls13().into_iter().filter(|s| s.is_ephemeral()).collect(),
                SignatureAndHashAlgorithm::ALL.to_vec(),
            )
        };

        let label = format!("signature_and_hash:{}", version);
        enumerate_by_elimination(&label, candidates, |offered| {
            let tls = ctx
                .selector
                .config_for(version)
                .with_cipher_suites(suites.clone())
                .with_signature_algorithms(offered)
                .enforcing();
            async move {
                ctx.cooldown().await;
                let Some(trace) = ctx.execute_hello("signature-and-hash", tls).await else {
                    return Offer::Failed;
                };
                if !trace.received_server_hello() || trace.hello_retry_request {
                    return Offer::Declined;
                }
                trace.selected_signature_algorithm.into()
            }
        })
        .await
    }
}

impl Default for SignatureAndHashProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for SignatureAndHashProbe {
    fn probe_type(&self) -> ProbeType {
        ProbeType::SignatureAndHash
    }

    fn owned_properties(&self) -> &'static [AnalyzedProperty] {
        OWNED
    }

    fn can_be_executed(&self, report: &ScanReport) -> bool {
        report.is_probe_already_executed(ProbeType::ProtocolVersion)
            && report.is_probe_already_executed(ProbeType::CipherSuite)
            && report.supported_versions().iter().any(ProtocolVersion::signs_with_algorithms)
    }

    fn adjust_config(&mut self, report: &ScanReport) {
        self.versions = report
            .supported_versions()
            .into_iter()
            .filter(ProtocolVersion::signs_with_algorithms)
            .collect();
    }

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
        if self.versions.is_empty() {
            return Err(ProbeError::NoCommonConfiguration(
                "no version with signature algorithm negotiation".to_string(),
            ));
        }

        let mut ske: Vec<SignatureAndHashAlgorithm> = Vec::new();
        let mut tls13: Vec<SignatureAndHashAlgorithm> = Vec::new();
        let mut interrupted = 0;

        for version in &self.versions {
            let found = Self::enumerate_version(ctx, *version).await;
            debug!(
                version = %version,
                algorithms = ?found.supported,
                complete = found.is_complete(),
                "Signature algorithms enumerated"
            );
            if found.interrupted {
                interrupted += 1;
            }
            let target = if version.is_tls13() { &mut tls13 } else { &mut ske };
            for algorithm in found.supported {
                if !target.contains(&algorithm) {
                    target.push(algorithm);
                }
            }
        }

        if ske.is_empty() && tls13.is_empty() && interrupted == self.versions.len() {
            return Err(ProbeError::AllTasksFailed { tasks: interrupted });
        }

        let complete = interrupted == 0;
        info!(ske = ?ske, tls13 = ?tls13, complete, "Signature algorithm enumeration finished");

        let weak = settle(ske.iter().any(SignatureAndHashAlgorithm::uses_weak_hash), complete);
        let pss = settle(
            ske.iter().chain(tls13.iter()).any(SignatureAndHashAlgorithm::is_rsa_pss),
            complete,
        );
        Ok(ProbeOutcome::new(self.probe_type())
            .with_property(AnalyzedProperty::SupportsWeakSignatureHash, weak)
            .with_property(AnalyzedProperty::SupportsRsaPss, pss)
            .with_artifact(Artifact::SignatureAlgorithmsSke(ske))
            .with_artifact(Artifact::SignatureAlgorithmsTls13(tls13)))
    }
}
