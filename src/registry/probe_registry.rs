// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Probe Registry
 * Static metadata for every built-in probe: category, cost and the
 * report state each one waits on
 * © 2026 Bountyy Oy
 */

use crate::types::ProbeType;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Probe category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProbeCategory {
    Enumeration,
    ServerPreference,
    ClientAuthentication,
    Dtls,
    Attack,
    Randomness,
}

impl ProbeCategory {
    pub const ALL: [ProbeCategory; 6] = [
        ProbeCategory::Enumeration,
        ProbeCategory::ServerPreference,
        ProbeCategory::ClientAuthentication,
        ProbeCategory::Dtls,
        ProbeCategory::Attack,
        ProbeCategory::Randomness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeCategory::Enumeration => "Enumeration",
            ProbeCategory::ServerPreference => "Server preference",
            ProbeCategory::ClientAuthentication => "Client authentication",
            ProbeCategory::Dtls => "DTLS",
            ProbeCategory::Attack => "Attacks",
            ProbeCategory::Randomness => "Randomness",
        }
    }
}

/// Severity of what a probe can find
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

/// Probe metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeMetadata {
    pub probe_type: ProbeType,
    pub display_name: String,
    pub category: ProbeCategory,
    pub description: String,
    pub risk_level: RiskLevel,
    /// Runs many handshakes (statistical or bulk collection)
    pub slow_probe: bool,
    /// Probes whose results this one reads
    pub dependencies: Vec<ProbeType>,
    pub tags: Vec<String>,
}

pub struct ProbeRegistry {
    probes: HashMap<ProbeType, ProbeMetadata>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            probes: HashMap::new(),
        };
        registry.register_all_probes();
        registry
    }

    pub fn register(&mut self, metadata: ProbeMetadata) {
        self.probes.insert(metadata.probe_type, metadata);
    }

    pub fn get(&self, probe_type: ProbeType) -> Option<&ProbeMetadata> {
        self.probes.get(&probe_type)
    }

    /// All probes in registration order of [`ProbeType::ALL`]
    pub fn get_all(&self) -> Vec<&ProbeMetadata> {
        ProbeType::ALL.iter().filter_map(|p| self.probes.get(p)).collect()
    }

    pub fn get_by_category(&self, category: ProbeCategory) -> Vec<&ProbeMetadata> {
        self.get_all().into_iter().filter(|p| p.category == category).collect()
    }

    pub fn get_slow_probes(&self) -> Vec<&ProbeMetadata> {
        self.get_all().into_iter().filter(|p| p.slow_probe).collect()
    }

    /// Probes that list `probe_type` as a dependency
    pub fn dependents_of(&self, probe_type: ProbeType) -> Vec<ProbeType> {
        self.get_all()
            .into_iter()
            .filter(|p| p.dependencies.contains(&probe_type))
            .map(|p| p.probe_type)
            .collect()
    }

    pub fn count(&self) -> usize {
        self.probes.len()
    }

    fn register_all_probes(&mut self) {
        // Enumeration
        self.register(metadata(
            ProbeType::ProtocolVersion,
            "Protocol Versions",
            ProbeCategory::Enumeration,
            "Determines which SSL, TLS and DTLS versions the peer accepts",
            RiskLevel::Medium,
            &[],
        ));
        self.register(metadata(
            ProbeType::CipherSuite,
            "Cipher Suites",
            ProbeCategory::Enumeration,
            "Enumerates supported cipher suites per protocol version",
            RiskLevel::Medium,
            &[ProbeType::ProtocolVersion],
        ));
        self.register(metadata(
            ProbeType::Extensions,
            "Extensions",
            ProbeCategory::Enumeration,
            "Collects the extensions the peer echoes back",
            RiskLevel::Info,
            &[],
        ));
        self.register(metadata(
            ProbeType::NamedGroups,
            "Named Groups",
            ProbeCategory::Enumeration,
            "Enumerates supported key exchange groups",
            RiskLevel::Low,
            &[ProbeType::ProtocolVersion, ProbeType::CipherSuite],
        ));
        self.register(metadata(
            ProbeType::Compressions,
            "Compression Methods",
            ProbeCategory::Enumeration,
            "Enumerates record compression methods (CRIME)",
            RiskLevel::High,
            &[ProbeType::ProtocolVersion],
        ));
        self.register(metadata(
            ProbeType::Alpn,
            "ALPN",
            ProbeCategory::Enumeration,
            "Enumerates application protocols offered through ALPN",
            RiskLevel::Info,
            &[ProbeType::Extensions],
        ));
        self.register(metadata(
            ProbeType::EcPointFormat,
            "EC Point Formats",
            ProbeCategory::Enumeration,
            "Determines which EC point encodings the peer accepts for key shares",
            RiskLevel::Low,
            &[ProbeType::ProtocolVersion, ProbeType::CipherSuite],
        ));
        self.register(metadata(
            ProbeType::SignatureAndHash,
            "Signature Algorithms",
            ProbeCategory::Enumeration,
            "Enumerates ServerKeyExchange and TLS 1.3 signature algorithms",
            RiskLevel::Medium,
            &[ProbeType::ProtocolVersion, ProbeType::CipherSuite],
        ));

        // Server preference
        self.register(metadata(
            ProbeType::CipherSuiteOrder,
            "Cipher Suite Order",
            ProbeCategory::ServerPreference,
            "Checks whether the peer enforces its own cipher suite order",
            RiskLevel::Low,
            &[ProbeType::ProtocolVersion, ProbeType::CipherSuite],
        ));
        self.register(metadata(
            ProbeType::NamedGroupOrder,
            "Named Group Order",
            ProbeCategory::ServerPreference,
            "Checks whether the peer enforces its own group order",
            RiskLevel::Info,
            &[ProbeType::NamedGroups, ProbeType::CipherSuite],
        ));
        self.register(metadata(
            ProbeType::HelloRetry,
            "Hello Retry Request",
            ProbeCategory::ServerPreference,
            "Checks TLS 1.3 HelloRetryRequest and cookie behavior",
            RiskLevel::Info,
            &[ProbeType::ProtocolVersion],
        ));

        // Client authentication
        self.register(metadata(
            ProbeType::CcaSupport,
            "Client Certificate Authentication",
            ProbeCategory::ClientAuthentication,
            "Detects whether the peer requests or requires client certificates",
            RiskLevel::Info,
            &[ProbeType::ProtocolVersion],
        ));

        // DTLS
        self.register(metadata(
            ProbeType::DtlsReordering,
            "DTLS Cookie and Reordering",
            ProbeCategory::Dtls,
            "Checks the HelloVerifyRequest cookie exchange and buffering of out-of-order Finished messages",
            RiskLevel::Low,
            &[ProbeType::ProtocolVersion, ProbeType::CipherSuite, ProbeType::CcaSupport],
        ));

        // Attacks
        let mut heartbleed = metadata(
            ProbeType::Heartbleed,
            "Heartbleed",
            ProbeCategory::Attack,
            "Sends an oversized heartbeat request (CVE-2014-0160)",
            RiskLevel::Critical,
            &[ProbeType::CipherSuite, ProbeType::CcaSupport, ProbeType::Extensions],
        );
        heartbleed.tags.push("cve-2014-0160".to_string());
        self.register(heartbleed);

        let mut early_ccs = metadata(
            ProbeType::EarlyCcs,
            "Early ChangeCipherSpec",
            ProbeCategory::Attack,
            "Injects ChangeCipherSpec before the key exchange (CVE-2014-0224)",
            RiskLevel::High,
            &[],
        );
        early_ccs.tags.push("cve-2014-0224".to_string());
        self.register(early_ccs);

        let mut padding_oracle = metadata(
            ProbeType::PaddingOracle,
            "Padding Oracle",
            ProbeCategory::Attack,
            "Compares peer reactions to malformed CBC padding",
            RiskLevel::High,
            &[ProbeType::CipherSuite, ProbeType::CcaSupport],
        );
        padding_oracle.slow_probe = true;
        self.register(padding_oracle);

        let mut direct_raccoon = metadata(
            ProbeType::DirectRaccoon,
            "Direct Raccoon",
            ProbeCategory::Attack,
            "Compares peer reactions to DH secrets with and without a leading zero byte",
            RiskLevel::Medium,
            &[ProbeType::CipherSuite, ProbeType::CcaSupport],
        );
        direct_raccoon.slow_probe = true;
        self.register(direct_raccoon);

        // Randomness
        let mut randomness = metadata(
            ProbeType::Randomness,
            "Server Randomness",
            ProbeCategory::Randomness,
            "Collects ServerHello randoms from repeated handshakes",
            RiskLevel::Medium,
            &[ProbeType::ProtocolVersion, ProbeType::CipherSuite, ProbeType::Extensions],
        );
        randomness.slow_probe = true;
        self.register(randomness);
    }
}

fn metadata(
    probe_type: ProbeType,
    display_name: &str,
    category: ProbeCategory,
    description: &str,
    risk_level: RiskLevel,
    dependencies: &[ProbeType],
) -> ProbeMetadata {
    ProbeMetadata {
        probe_type,
        display_name: display_name.to_string(),
        category,
        description: description.to_string(),
        risk_level,
        slow_probe: false,
        dependencies: dependencies.to_vec(),
        tags: vec![probe_type.as_str().to_string()],
    }
}

impl Default for ProbeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global probe registry
pub static PROBE_REGISTRY: Lazy<ProbeRegistry> = Lazy::new(ProbeRegistry::new);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_probe_registered() {
        assert_eq!(PROBE_REGISTRY.count(), ProbeType::ALL.len());
        for probe in ProbeType::ALL {
            assert!(PROBE_REGISTRY.get(probe).is_some(), "{} not registered", probe);
        }
    }

    #[test]
    fn test_dependencies_point_backwards() {
        // a dependency must come earlier in the default order
        for meta in PROBE_REGISTRY.get_all() {
            let position = ProbeType::ALL.iter().position(|p| *p == meta.probe_type);
            for dependency in &meta.dependencies {
                let dep_position = ProbeType::ALL.iter().position(|p| p == dependency);
                assert!(dep_position < position, "{} depends on later {}", meta.probe_type, dependency);
            }
        }
    }

    #[test]
    fn test_dependents_of_cipher_suite() {
        let dependents = PROBE_REGISTRY.dependents_of(ProbeType::CipherSuite);
        assert!(dependents.contains(&ProbeType::PaddingOracle));
        assert!(!dependents.contains(&ProbeType::ProtocolVersion));
    }

    #[test]
    fn test_categories_partition_registry() {
        let total: usize = ProbeCategory::ALL
            .iter()
            .map(|c| PROBE_REGISTRY.get_by_category(*c).len())
            .sum();
        assert_eq!(total, PROBE_REGISTRY.count());

        let attacks: Vec<ProbeType> = PROBE_REGISTRY
            .get_by_category(ProbeCategory::Attack)
            .iter()
            .map(|p| p.probe_type)
            .collect();
        assert!(attacks.contains(&ProbeType::Heartbleed));
        assert!(!attacks.contains(&ProbeType::CipherSuite));

        let dtls: Vec<ProbeType> = PROBE_REGISTRY
            .get_by_category(ProbeCategory::Dtls)
            .iter()
            .map(|p| p.probe_type)
            .collect();
        assert_eq!(dtls, vec![ProbeType::DtlsReordering]);
    }

    #[test]
    fn test_slow_probes() {
        let slow: Vec<ProbeType> = PROBE_REGISTRY.get_slow_probes().iter().map(|p| p.probe_type).collect();
        assert_eq!(slow, vec![ProbeType::PaddingOracle, ProbeType::DirectRaccoon, ProbeType::Randomness]);
    }
}
