// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Protocol Engine Interface
 * Seam between the scanner and whatever speaks TLS on the wire
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

pub mod config;
pub mod simulated;
pub mod workflow;

pub use config::TlsConfig;
pub use simulated::{PeerProfile, SimulatedPeer};
pub use workflow::{
    EarlyCcsTarget, ProtocolAction, RecordPadding, SocketState, Trace, Workflow, WorkflowTraceType,
};

use crate::constants::{
    CipherSuite, CompressionMethod, EcPointFormat, ExtensionType, NamedGroup, ProtocolVersion,
    SignatureAndHashAlgorithm,
};
use crate::errors::TransportError;
use crate::retry::ConnectionTimeouts;
use async_trait::async_trait;

/// Opens connections to one target
#[async_trait]
pub trait ProtocolEngine: Send + Sync {
    async fn connect(&self, timeouts: ConnectionTimeouts) -> Result<Box<dyn Connection>, TransportError>;
}

/// One live connection able to run a workflow
#[async_trait]
pub trait Connection: Send {
    async fn execute(
        &mut self,
        workflow: &Workflow,
        config: &TlsConfig,
        timeouts: ConnectionTimeouts,
    ) -> Result<Trace, TransportError>;

    /// Release the underlying transport. Must be idempotent.
    fn close(&mut self);
}

/// Closes the wrapped connection when dropped, on every exit path
pub struct ConnectionGuard {
    inner: Box<dyn Connection>,
}

impl ConnectionGuard {
    pub fn new(inner: Box<dyn Connection>) -> Self {
        Self { inner }
    }

    pub async fn execute(
        &mut self,
        workflow: &Workflow,
        config: &TlsConfig,
        timeouts: ConnectionTimeouts,
    ) -> Result<Trace, TransportError> {
        self.inner.execute(workflow, config, timeouts).await
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.inner.close();
    }
}

/// Builds baseline configurations and fixes up hand-edited ones
pub trait ConfigSelector: Send + Sync {
    /// Pre-TLS 1.3 baseline
    fn base_config(&self) -> TlsConfig;

    /// TLS 1.3 baseline
    fn tls13_base_config(&self) -> TlsConfig;

    /// Make the config self-consistent after probe edits
    fn repair_config(&self, config: &mut TlsConfig);

    /// Baseline for a specific version
    fn config_for(&self, version: ProtocolVersion) -> TlsConfig {
        if version.is_tls13() {
            self.tls13_base_config()
        } else {
            self.base_config().with_version(version)
        }
    }
}

/// Selector offering the full catalog with consistent extensions
#[derive(Debug, Clone, Default)]
pub struct DefaultConfigSelector {
    server_name: Option<String>,
}

impl DefaultConfigSelector {
    pub fn new(server_name: Option<String>) -> Self {
        Self { server_name }
    }
}

impl ConfigSelector for DefaultConfigSelector {
    fn base_config(&self) -> TlsConfig {
        let mut config = TlsConfig {
            highest_version: ProtocolVersion::Tls12,
            cipher_suites: CipherSuite::all_pre_tls13(),
            named_groups: NamedGroup::all_ec(),
            key_share_groups: Vec::new(),
            compression_methods: vec![CompressionMethod::Null],
            point_formats: vec![EcPointFormat::UNCOMPRESSED],
            selected_point_format: EcPointFormat::UNCOMPRESSED,
            signature_algorithms: SignatureAndHashAlgorithm::ALL.to_vec(),
            alpn_protocols: Vec::new(),
            extensions: vec![ExtensionType::RenegotiationInfo],
            client_authentication: false,
            enforce_settings: false,
            server_name: self.server_name.clone(),
            echo_dtls_cookie: true,
        };
        self.repair_config(&mut config);
        config
    }

    fn tls13_base_config(&self) -> TlsConfig {
        let mut config = TlsConfig {
            highest_version: ProtocolVersion::Tls13,
            cipher_suites: CipherSuite::all_tls13(),
            named_groups: vec![NamedGroup::X25519, NamedGroup::Secp256r1, NamedGroup::Secp384r1],
            key_share_groups: vec![NamedGroup::X25519],
            compression_methods: vec![CompressionMethod::Null],
            point_formats: Vec::new(),
            selected_point_format: EcPointFormat::UNCOMPRESSED,
            signature_algorithms: SignatureAndHashAlgorithm::all_tls13(),
            alpn_protocols: Vec::new(),
            extensions: Vec::new(),
            client_authentication: false,
            enforce_settings: false,
            server_name: self.server_name.clone(),
            echo_dtls_cookie: true,
        };
        self.repair_config(&mut config);
        config
    }

    fn repair_config(&self, config: &mut TlsConfig) {
        if config.server_name.is_some() {
            config.add_extension(ExtensionType::ServerNameIndication);
        }

        let needs_groups = config.highest_version.is_tls13()
            || config.cipher_suites.iter().any(|s| s.uses_ecdh());
        if needs_groups {
            if config.named_groups.is_empty() {
                config.named_groups = NamedGroup::all_ec();
            }
            config.add_extension(ExtensionType::SupportedGroups);
            if !config.highest_version.is_tls13() {
                if config.point_formats.is_empty() {
                    config.point_formats.push(EcPointFormat::UNCOMPRESSED);
                }
                config.add_extension(ExtensionType::EcPointFormats);
            }
        }

        if config.highest_version.signs_with_algorithms() && !config.signature_algorithms.is_empty() {
            config.add_extension(ExtensionType::SignatureAlgorithms);
        }

        if config.highest_version.is_tls13() {
            config.add_extension(ExtensionType::SupportedVersions);
            config.add_extension(ExtensionType::KeyShare);
            config.key_share_groups.retain(|g| config.named_groups.contains(g));
        }

        if !config.alpn_protocols.is_empty() {
            config.add_extension(ExtensionType::Alpn);
        }

        if !config.compression_methods.contains(&CompressionMethod::Null) && !config.enforce_settings {
            config.compression_methods.push(CompressionMethod::Null);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_config_is_consistent() {
        let selector = DefaultConfigSelector::default();
        let config = selector.base_config();
        assert_eq!(config.highest_version, ProtocolVersion::Tls12);
        assert!(config.cipher_suites.iter().all(|s| !s.is_tls13()));
        assert!(config.offers_extension(ExtensionType::SupportedGroups));
        assert!(config.offers_extension(ExtensionType::EcPointFormats));
        assert!(config.offers_extension(ExtensionType::SignatureAlgorithms));
        assert_eq!(config.point_formats, vec![EcPointFormat::UNCOMPRESSED]);
    }

    #[test]
    fn test_signature_algorithms_only_from_tls12() {
        let selector = DefaultConfigSelector::default();
        for (version, expected) in [(ProtocolVersion::Tls11, false), (ProtocolVersion::Dtls12, true)] {
            let mut config = selector.base_config().with_version(version);
            config.extensions.clear();
            selector.repair_config(&mut config);
            assert_eq!(config.offers_extension(ExtensionType::SignatureAlgorithms), expected, "{}", version);
        }

        let config = selector.tls13_base_config();
        assert!(config.signature_algorithms.iter().all(|a| a.is_tls13()));
    }

    #[test]
    fn test_tls13_config_carries_key_share() {
        let selector = DefaultConfigSelector::new(Some("example.test".to_string()));
        let config = selector.tls13_base_config();
        assert!(config.offers_extension(ExtensionType::KeyShare));
        assert!(config.offers_extension(ExtensionType::SupportedVersions));
        assert!(config.offers_extension(ExtensionType::ServerNameIndication));
        assert_eq!(config.key_share_groups, vec![NamedGroup::X25519]);
    }

    #[test]
    fn test_repair_adds_alpn_extension() {
        let selector = DefaultConfigSelector::default();
        let mut config = selector
            .base_config()
            .with_alpn_protocols(vec!["h2".to_string()]);
        selector.repair_config(&mut config);
        assert!(config.offers_extension(ExtensionType::Alpn));
    }

    #[test]
    fn test_repair_keeps_enforced_compression_list() {
        let selector = DefaultConfigSelector::default();
        let mut config = selector
            .base_config()
            .with_compression_methods(vec![CompressionMethod::Deflate])
            .enforcing();
        selector.repair_config(&mut config);
        assert_eq!(config.compression_methods, vec![CompressionMethod::Deflate]);
    }
}
