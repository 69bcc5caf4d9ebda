// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Report
 * Write-once property store and probe outcomes merged into it
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use crate::constants::{
    CipherSuite, CompressionMethod, EcPointFormat, ExtensionType, NamedGroup, ProtocolVersion,
    SignatureAndHashAlgorithm,
};
use crate::errors::ReportError;
use crate::leak::LeakTestSummary;
use crate::property::AnalyzedProperty;
use crate::types::{ProbeState, ProbeType, TestResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Suites supported for one protocol version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSuitePair {
    pub version: ProtocolVersion,
    pub cipher_suites: Vec<CipherSuite>,
}

/// Structured data a probe contributes besides plain properties
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Versions(Vec<ProtocolVersion>),
    VersionSuitePairs(Vec<VersionSuitePair>),
    Extensions(Vec<ExtensionType>),
    NamedGroups(Vec<NamedGroup>),
    CompressionMethods(Vec<CompressionMethod>),
    AlpnProtocols(Vec<String>),
    PointFormats(Vec<EcPointFormat>),
    /// Algorithms seen in ServerKeyExchange signatures
    SignatureAlgorithmsSke(Vec<SignatureAndHashAlgorithm>),
    /// Algorithms seen in TLS 1.3 CertificateVerify signatures
    SignatureAlgorithmsTls13(Vec<SignatureAndHashAlgorithm>),
    ServerRandoms(Vec<Vec<u8>>),
    PaddingOracleTests(Vec<LeakTestSummary>),
    DirectRaccoonTests(Vec<LeakTestSummary>),
}

impl Artifact {
    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::Versions(_) => "versions",
            Artifact::VersionSuitePairs(_) => "version_suite_pairs",
            Artifact::Extensions(_) => "extensions",
            Artifact::NamedGroups(_) => "named_groups",
            Artifact::CompressionMethods(_) => "compression_methods",
            Artifact::AlpnProtocols(_) => "alpn_protocols",
            Artifact::PointFormats(_) => "point_formats",
            Artifact::SignatureAlgorithmsSke(_) => "signature_algorithms_ske",
            Artifact::SignatureAlgorithmsTls13(_) => "signature_algorithms_tls13",
            Artifact::ServerRandoms(_) => "server_randoms",
            Artifact::PaddingOracleTests(_) => "padding_oracle_tests",
            Artifact::DirectRaccoonTests(_) => "direct_raccoon_tests",
        }
    }
}

/// Everything one probe run produced
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub probe_type: ProbeType,
    pub properties: Vec<(AnalyzedProperty, TestResult)>,
    pub artifacts: Vec<Artifact>,
}

impl ProbeOutcome {
    pub fn new(probe_type: ProbeType) -> Self {
        Self {
            probe_type,
            properties: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    /// Same result for every listed property, no artifacts
    pub fn uniform(probe_type: ProbeType, properties: &[AnalyzedProperty], result: TestResult) -> Self {
        Self {
            probe_type,
            properties: properties.iter().map(|p| (*p, result)).collect(),
            artifacts: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: AnalyzedProperty, result: TestResult) -> Self {
        self.properties.push((property, result));
        self
    }

    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    pub fn result_of(&self, property: AnalyzedProperty) -> Option<TestResult> {
        self.properties
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, r)| *r)
    }

    /// Same properties, every value replaced, artifacts dropped
    pub fn with_all(&self, result: TestResult) -> Self {
        Self {
            probe_type: self.probe_type,
            properties: self.properties.iter().map(|(p, _)| (*p, result)).collect(),
            artifacts: Vec::new(),
        }
    }
}

/// Accumulated scan results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub host: String,
    pub port: u16,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    pub properties: BTreeMap<AnalyzedProperty, TestResult>,
    pub probe_states: BTreeMap<ProbeType, ProbeState>,
    executed_probes: BTreeSet<ProbeType>,

    pub versions: Option<Vec<ProtocolVersion>>,
    pub version_suite_pairs: Option<Vec<VersionSuitePair>>,
    pub supported_extensions: Option<Vec<ExtensionType>>,
    pub named_groups: Option<Vec<NamedGroup>>,
    pub compression_methods: Option<Vec<CompressionMethod>>,
    pub alpn_protocols: Option<Vec<String>>,
    pub point_formats: Option<Vec<EcPointFormat>>,
    pub signature_algorithms_ske: Option<Vec<SignatureAndHashAlgorithm>>,
    pub signature_algorithms_tls13: Option<Vec<SignatureAndHashAlgorithm>>,
    pub server_randoms: Option<Vec<Vec<u8>>>,
    pub padding_oracle_tests: Option<Vec<LeakTestSummary>>,
    pub direct_raccoon_tests: Option<Vec<LeakTestSummary>>,
}

impl ScanReport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            started_at: Utc::now(),
            finished_at: None,
            properties: BTreeMap::new(),
            probe_states: BTreeMap::new(),
            executed_probes: BTreeSet::new(),
            versions: None,
            version_suite_pairs: None,
            supported_extensions: None,
            named_groups: None,
            compression_methods: None,
            alpn_protocols: None,
            point_formats: None,
            signature_algorithms_ske: None,
            signature_algorithms_tls13: None,
            server_randoms: None,
            padding_oracle_tests: None,
            direct_raccoon_tests: None,
        }
    }

    /// Stored result, or `NotTestedYet`
    pub fn get_result(&self, property: AnalyzedProperty) -> TestResult {
        self.properties
            .get(&property)
            .copied()
            .unwrap_or(TestResult::NotTestedYet)
    }

    pub fn is_true(&self, property: AnalyzedProperty) -> bool {
        self.get_result(property).is_true()
    }

    pub fn is_false(&self, property: AnalyzedProperty) -> bool {
        self.get_result(property).is_false()
    }

    pub fn has_result(&self, property: AnalyzedProperty) -> bool {
        self.properties.contains_key(&property)
    }

    /// Write a property once; a second write is rejected
    pub fn put_result(&mut self, property: AnalyzedProperty, result: TestResult) -> Result<(), ReportError> {
        if self.properties.contains_key(&property) {
            return Err(ReportError::DuplicateProperty { property });
        }
        self.properties.insert(property, result);
        Ok(())
    }

    pub fn is_probe_already_executed(&self, probe_type: ProbeType) -> bool {
        self.executed_probes.contains(&probe_type)
    }

    pub fn mark_probe_executed(&mut self, probe_type: ProbeType) {
        self.executed_probes.insert(probe_type);
    }

    pub fn set_probe_state(&mut self, probe_type: ProbeType, state: ProbeState) {
        self.probe_states.insert(probe_type, state);
    }

    pub fn probe_state(&self, probe_type: ProbeType) -> ProbeState {
        self.probe_states
            .get(&probe_type)
            .copied()
            .unwrap_or(ProbeState::NotScheduled)
    }

    /// Apply an outcome atomically: nothing is written if any key is taken
    pub fn merge(&mut self, outcome: ProbeOutcome) -> Result<(), ReportError> {
        for (property, _) in &outcome.properties {
            if self.has_result(*property) {
                return Err(ReportError::DuplicateProperty { property: *property });
            }
        }
        for artifact in &outcome.artifacts {
            if self.has_artifact(artifact) {
                return Err(ReportError::DuplicateArtifact {
                    artifact: artifact.kind(),
                });
            }
        }

        debug!(
            probe = %outcome.probe_type,
            properties = outcome.properties.len(),
            artifacts = outcome.artifacts.len(),
            "Merging probe outcome"
        );

        for (property, result) in outcome.properties {
            self.properties.insert(property, result);
        }
        for artifact in outcome.artifacts {
            self.store_artifact(artifact);
        }
        Ok(())
    }

    fn has_artifact(&self, artifact: &Artifact) -> bool {
        match artifact {
            Artifact::Versions(_) => self.versions.is_some(),
            Artifact::VersionSuitePairs(_) => self.version_suite_pairs.is_some(),
            Artifact::Extensions(_) => self.supported_extensions.is_some(),
            Artifact::NamedGroups(_) => self.named_groups.is_some(),
            Artifact::CompressionMethods(_) => self.compression_methods.is_some(),
            Artifact::AlpnProtocols(_) => self.alpn_protocols.is_some(),
            Artifact::PointFormats(_) => self.point_formats.is_some(),
            Artifact::SignatureAlgorithmsSke(_) => self.signature_algorithms_ske.is_some(),
            Artifact::SignatureAlgorithmsTls13(_) => self.signature_algorithms_tls13.is_some(),
            Artifact::ServerRandoms(_) => self.server_randoms.is_some(),
            Artifact::PaddingOracleTests(_) => self.padding_oracle_tests.is_some(),
            Artifact::DirectRaccoonTests(_) => self.direct_raccoon_tests.is_some(),
        }
    }

    fn store_artifact(&mut self, artifact: Artifact) {
        match artifact {
            Artifact::Versions(v) => self.versions = Some(v),
            Artifact::VersionSuitePairs(v) => self.version_suite_pairs = Some(v),
            Artifact::Extensions(v) => self.supported_extensions = Some(v),
            Artifact::NamedGroups(v) => self.named_groups = Some(v),
            Artifact::CompressionMethods(v) => self.compression_methods = Some(v),
            Artifact::AlpnProtocols(v) => self.alpn_protocols = Some(v),
            Artifact::PointFormats(v) => self.point_formats = Some(v),
            Artifact::SignatureAlgorithmsSke(v) => self.signature_algorithms_ske = Some(v),
            Artifact::SignatureAlgorithmsTls13(v) => self.signature_algorithms_tls13 = Some(v),
            Artifact::ServerRandoms(v) => self.server_randoms = Some(v),
            Artifact::PaddingOracleTests(v) => self.padding_oracle_tests = Some(v),
            Artifact::DirectRaccoonTests(v) => self.direct_raccoon_tests = Some(v),
        }
    }

    /// Union of all supported suites over every version
    pub fn cipher_suites(&self) -> BTreeSet<CipherSuite> {
        self.version_suite_pairs
            .iter()
            .flatten()
            .flat_map(|pair| pair.cipher_suites.iter().copied())
            .collect()
    }

    /// Versions whose support property is TRUE
    pub fn supported_versions(&self) -> Vec<ProtocolVersion> {
        [
            (ProtocolVersion::Ssl3, AnalyzedProperty::SupportsSsl3),
            (ProtocolVersion::Tls10, AnalyzedProperty::SupportsTls10),
            (ProtocolVersion::Tls11, AnalyzedProperty::SupportsTls11),
            (ProtocolVersion::Tls12, AnalyzedProperty::SupportsTls12),
            (ProtocolVersion::Tls13, AnalyzedProperty::SupportsTls13),
            (ProtocolVersion::Dtls10, AnalyzedProperty::SupportsDtls10),
            (ProtocolVersion::Dtls12, AnalyzedProperty::SupportsDtls12),
        ]
        .into_iter()
        .filter(|(_, property)| self.is_true(*property))
        .map(|(version, _)| version)
        .collect()
    }

    pub fn highest_version(&self) -> Option<ProtocolVersion> {
        self.supported_versions().into_iter().filter(|v| !v.is_dtls()).max()
    }

    /// Highest supported TLS version below 1.3
    pub fn highest_legacy_version(&self) -> Option<ProtocolVersion> {
        self.supported_versions()
            .into_iter()
            .filter(|v| !v.is_dtls() && !v.is_tls13())
            .max()
    }

    pub fn highest_dtls_version(&self) -> Option<ProtocolVersion> {
        self.supported_versions().into_iter().filter(|v| v.is_dtls()).max()
    }

    /// Supported suites of one version, empty when unknown
    pub fn cipher_suites_for(&self, version: ProtocolVersion) -> Vec<CipherSuite> {
        self.version_suite_pairs
            .iter()
            .flatten()
            .find(|pair| pair.version == version)
            .map(|pair| pair.cipher_suites.clone())
            .unwrap_or_default()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
