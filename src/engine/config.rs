// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::constants::{
    CipherSuite, CompressionMethod, EcPointFormat, ExtensionType, NamedGroup, ProtocolVersion,
    SignatureAndHashAlgorithm,
};
use serde::{Deserialize, Serialize};

/// Handshake parameters offered to the peer for one connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Highest version advertised; with `enforce_settings` the only one
    pub highest_version: ProtocolVersion,

    /// Offered cipher suites in preference order
    pub cipher_suites: Vec<CipherSuite>,

    /// Offered named groups in preference order
    pub named_groups: Vec<NamedGroup>,

    /// Groups with a TLS 1.3 key share attached
    pub key_share_groups: Vec<NamedGroup>,

    pub compression_methods: Vec<CompressionMethod>,

    /// Formats listed in the ec_point_formats extension
    pub point_formats: Vec<EcPointFormat>,

    /// Encoding of the client's own EC public key
    pub selected_point_format: EcPointFormat,

    /// Offered signature algorithms in preference order
    pub signature_algorithms: Vec<SignatureAndHashAlgorithm>,

    /// Offered ALPN identifiers in preference order
    pub alpn_protocols: Vec<String>,

    pub extensions: Vec<ExtensionType>,

    /// Send a client certificate when requested
    pub client_authentication: bool,

    /// Offer exactly the configured values without fallback
    pub enforce_settings: bool,

    /// Server name for SNI
    pub server_name: Option<String>,

    /// Answer a DTLS HelloVerifyRequest with the cookie
    pub echo_dtls_cookie: bool,
}

impl TlsConfig {
    pub fn with_version(mut self, version: ProtocolVersion) -> Self {
        self.highest_version = version;
        self
    }

    pub fn with_cipher_suites(mut self, suites: Vec<CipherSuite>) -> Self {
        self.cipher_suites = suites;
        self
    }

    pub fn with_named_groups(mut self, groups: Vec<NamedGroup>) -> Self {
        self.named_groups = groups;
        self
    }

    pub fn with_key_share_groups(mut self, groups: Vec<NamedGroup>) -> Self {
        self.key_share_groups = groups;
        self
    }

    pub fn with_compression_methods(mut self, methods: Vec<CompressionMethod>) -> Self {
        self.compression_methods = methods;
        self
    }

    pub fn with_point_formats(mut self, formats: Vec<EcPointFormat>) -> Self {
        self.point_formats = formats;
        self
    }

    pub fn with_selected_point_format(mut self, format: EcPointFormat) -> Self {
        self.selected_point_format = format;
        self
    }

    pub fn with_signature_algorithms(mut self, algorithms: Vec<SignatureAndHashAlgorithm>) -> Self {
        self.signature_algorithms = algorithms;
        self
    }

    pub fn with_alpn_protocols(mut self, protocols: Vec<String>) -> Self {
        self.alpn_protocols = protocols;
        self
    }

    pub fn enforcing(mut self) -> Self {
        self.enforce_settings = true;
        self
    }

    /// Add an extension if not yet offered
    pub fn with_extension(mut self, extension: ExtensionType) -> Self {
        self.add_extension(extension);
        self
    }

    pub fn add_extension(&mut self, extension: ExtensionType) {
        if !self.extensions.contains(&extension) {
            self.extensions.push(extension);
        }
    }

    pub fn offers_extension(&self, extension: ExtensionType) -> bool {
        self.extensions.contains(&extension)
    }
}
