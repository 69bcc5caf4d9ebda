// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};

/// Every property a probe or after-probe can write into the report
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalyzedProperty {
    // Protocol versions
    SupportsSsl3,
    SupportsTls10,
    SupportsTls11,
    SupportsTls12,
    SupportsTls13,
    SupportsDtls10,
    SupportsDtls12,

    // Cipher suites
    SupportsNullCiphers,
    SupportsExportCiphers,
    SupportsRc4,
    SupportsCbc,
    SupportsAead,
    SupportsPfs,
    SupportsDhe,
    SupportsEcdhe,
    SupportsOnlyPsk,

    // Extensions
    SupportsHeartbeat,
    SupportsExtendedMasterSecret,
    SupportsEncryptThenMac,
    SupportsExtendedRandom,
    SupportsSessionTickets,
    SupportsSecureRenegotiation,

    // Named groups
    SupportsX25519,
    SupportsNistCurves,

    // Elliptic curve point formats
    SupportsUncompressedPoint,
    SupportsAnsiX962CompressedPrime,
    SupportsAnsiX962CompressedChar2,
    HandshakesWithUndefinedPointFormat,
    SupportsTls13SecpCompression,

    // Signatures
    SupportsWeakSignatureHash,
    SupportsRsaPss,

    // Compression
    SupportsTlsCompression,
    VulnerableToCrime,

    // ALPN
    SupportsHttp2,

    // Ordering
    EnforcesCsOrdering,
    EnforcesNamedGroupOrdering,

    // TLS 1.3 hello retry
    SendsHelloRetryRequest,
    IssuesCookieInHelloRetry,

    // Client authentication
    SupportsCca,
    RequiresCca,

    // Attacks
    VulnerableToHeartbleed,
    VulnerableToEarlyCcs,
    EarlyCcsExploitable,
    VulnerableToPaddingOracle,
    VulnerableToDirectRaccoon,

    // Randomness
    UsesUniqueRandom,

    // DTLS
    SupportsDtlsCookieExchange,
    HasCookieChecks,
    SupportsReordering,

    // Derived by after-probes
    VulnerableToLogjam,
    VulnerableToSweet32,
}

impl AnalyzedProperty {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyzedProperty::SupportsSsl3 => "SUPPORTS_SSL3",
            AnalyzedProperty::SupportsTls10 => "SUPPORTS_TLS10",
            AnalyzedProperty::SupportsTls11 => "SUPPORTS_TLS11",
            AnalyzedProperty::SupportsTls12 => "SUPPORTS_TLS12",
            AnalyzedProperty::SupportsTls13 => "SUPPORTS_TLS13",
            AnalyzedProperty::SupportsDtls10 => "SUPPORTS_DTLS10",
            AnalyzedProperty::SupportsDtls12 => "SUPPORTS_DTLS12",
            AnalyzedProperty::SupportsNullCiphers => "SUPPORTS_NULL_CIPHERS",
            AnalyzedProperty::SupportsExportCiphers => "SUPPORTS_EXPORT_CIPHERS",
            AnalyzedProperty::SupportsRc4 => "SUPPORTS_RC4",
            AnalyzedProperty::SupportsCbc => "SUPPORTS_CBC",
            AnalyzedProperty::SupportsAead => "SUPPORTS_AEAD",
            AnalyzedProperty::SupportsPfs => "SUPPORTS_PFS",
            AnalyzedProperty::SupportsDhe => "SUPPORTS_DHE",
            AnalyzedProperty::SupportsEcdhe => "SUPPORTS_ECDHE",
            AnalyzedProperty::SupportsOnlyPsk => "SUPPORTS_ONLY_PSK",
            AnalyzedProperty::SupportsHeartbeat => "SUPPORTS_HEARTBEAT",
            AnalyzedProperty::SupportsExtendedMasterSecret => "SUPPORTS_EXTENDED_MASTER_SECRET",
            AnalyzedProperty::SupportsEncryptThenMac => "SUPPORTS_ENCRYPT_THEN_MAC",
            AnalyzedProperty::SupportsExtendedRandom => "SUPPORTS_EXTENDED_RANDOM",
            AnalyzedProperty::SupportsSessionTickets => "SUPPORTS_SESSION_TICKETS",
            AnalyzedProperty::SupportsSecureRenegotiation => "SUPPORTS_SECURE_RENEGOTIATION",
            AnalyzedProperty::SupportsX25519 => "SUPPORTS_X25519",
            AnalyzedProperty::SupportsNistCurves => "SUPPORTS_NIST_CURVES",
            AnalyzedProperty::SupportsUncompressedPoint => "SUPPORTS_UNCOMPRESSED_POINT",
            AnalyzedProperty::SupportsAnsiX962CompressedPrime => "SUPPORTS_ANSI_X962_COMPRESSED_PRIME",
            AnalyzedProperty::SupportsAnsiX962CompressedChar2 => "SUPPORTS_ANSI_X962_COMPRESSED_CHAR2",
            AnalyzedProperty::HandshakesWithUndefinedPointFormat => "HANDSHAKES_WITH_UNDEFINED_POINT_FORMAT",
            AnalyzedProperty::SupportsTls13SecpCompression => "SUPPORTS_TLS13_SECP_COMPRESSION",
            AnalyzedProperty::SupportsWeakSignatureHash => "SUPPORTS_WEAK_SIGNATURE_HASH",
            AnalyzedProperty::SupportsRsaPss => "SUPPORTS_RSA_PSS",
            AnalyzedProperty::SupportsTlsCompression => "SUPPORTS_TLS_COMPRESSION",
            AnalyzedProperty::VulnerableToCrime => "VULNERABLE_TO_CRIME",
            AnalyzedProperty::SupportsHttp2 => "SUPPORTS_HTTP2",
            AnalyzedProperty::EnforcesCsOrdering => "ENFORCES_CS_ORDERING",
            AnalyzedProperty::EnforcesNamedGroupOrdering => "ENFORCES_NAMED_GROUP_ORDERING",
            AnalyzedProperty::SendsHelloRetryRequest => "SENDS_HELLO_RETRY_REQUEST",
            AnalyzedProperty::IssuesCookieInHelloRetry => "ISSUES_COOKIE_IN_HELLO_RETRY",
            AnalyzedProperty::SupportsCca => "SUPPORTS_CCA",
            AnalyzedProperty::RequiresCca => "REQUIRES_CCA",
            AnalyzedProperty::VulnerableToHeartbleed => "VULNERABLE_TO_HEARTBLEED",
            AnalyzedProperty::VulnerableToEarlyCcs => "VULNERABLE_TO_EARLY_CCS",
            AnalyzedProperty::EarlyCcsExploitable => "EARLY_CCS_EXPLOITABLE",
            AnalyzedProperty::VulnerableToPaddingOracle => "VULNERABLE_TO_PADDING_ORACLE",
            AnalyzedProperty::VulnerableToDirectRaccoon => "VULNERABLE_TO_DIRECT_RACCOON",
            AnalyzedProperty::UsesUniqueRandom => "USES_UNIQUE_RANDOM",
            AnalyzedProperty::SupportsDtlsCookieExchange => "SUPPORTS_DTLS_COOKIE_EXCHANGE",
            AnalyzedProperty::HasCookieChecks => "HAS_COOKIE_CHECKS",
            AnalyzedProperty::SupportsReordering => "SUPPORTS_REORDERING",
            AnalyzedProperty::VulnerableToLogjam => "VULNERABLE_TO_LOGJAM",
            AnalyzedProperty::VulnerableToSweet32 => "VULNERABLE_TO_SWEET32",
        }
    }
}

impl std::fmt::Display for AnalyzedProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
