// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - TLS Protocol Constants
 * Protocol versions, cipher suites, groups, extensions and message kinds
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtocolVersion {
    Ssl2,
    Ssl3,
    Tls10,
    Tls11,
    Tls12,
    Tls13,
    Dtls10,
    Dtls12,
}

impl ProtocolVersion {
    pub fn is_tls13(&self) -> bool {
        *self == ProtocolVersion::Tls13
    }

    pub fn is_dtls(&self) -> bool {
        matches!(self, ProtocolVersion::Dtls10 | ProtocolVersion::Dtls12)
    }

    pub fn is_ssl(&self) -> bool {
        matches!(self, ProtocolVersion::Ssl2 | ProtocolVersion::Ssl3)
    }

    /// Versions negotiating signature algorithms through the extension
    pub fn signs_with_algorithms(&self) -> bool {
        matches!(self, ProtocolVersion::Tls12 | ProtocolVersion::Tls13 | ProtocolVersion::Dtls12)
    }

    /// Versions where CBC records carry an explicit IV
    pub fn uses_explicit_iv(&self) -> bool {
        matches!(
            self,
            ProtocolVersion::Tls11 | ProtocolVersion::Tls12 | ProtocolVersion::Dtls10 | ProtocolVersion::Dtls12
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVersion::Ssl2 => "SSL2",
            ProtocolVersion::Ssl3 => "SSL3",
            ProtocolVersion::Tls10 => "TLS10",
            ProtocolVersion::Tls11 => "TLS11",
            ProtocolVersion::Tls12 => "TLS12",
            ProtocolVersion::Tls13 => "TLS13",
            ProtocolVersion::Dtls10 => "DTLS10",
            ProtocolVersion::Dtls12 => "DTLS12",
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// IANA cipher suite identifier
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(into = "String", try_from = "String")]
pub struct CipherSuite(pub u16);

const CIPHER_SUITE_CATALOG: &[(u16, &str)] = &[
    (0x0001, "TLS_RSA_WITH_NULL_MD5"),
    (0x0002, "TLS_RSA_WITH_NULL_SHA"),
    (0x0003, "TLS_RSA_EXPORT_WITH_RC4_40_MD5"),
    (0x0004, "TLS_RSA_WITH_RC4_128_MD5"),
    (0x0005, "TLS_RSA_WITH_RC4_128_SHA"),
    (0x0008, "TLS_RSA_EXPORT_WITH_DES40_CBC_SHA"),
    (0x000A, "TLS_RSA_WITH_3DES_EDE_CBC_SHA"),
    (0x0011, "TLS_DHE_DSS_EXPORT_WITH_DES40_CBC_SHA"),
    (0x0014, "TLS_DHE_RSA_EXPORT_WITH_DES40_CBC_SHA"),
    (0x0016, "TLS_DHE_RSA_WITH_3DES_EDE_CBC_SHA"),
    (0x002F, "TLS_RSA_WITH_AES_128_CBC_SHA"),
    (0x0033, "TLS_DHE_RSA_WITH_AES_128_CBC_SHA"),
    (0x0035, "TLS_RSA_WITH_AES_256_CBC_SHA"),
    (0x0039, "TLS_DHE_RSA_WITH_AES_256_CBC_SHA"),
    (0x003C, "TLS_RSA_WITH_AES_128_CBC_SHA256"),
    (0x0067, "TLS_DHE_RSA_WITH_AES_128_CBC_SHA256"),
    (0x008C, "TLS_PSK_WITH_AES_128_CBC_SHA"),
    (0x009C, "TLS_RSA_WITH_AES_128_GCM_SHA256"),
    (0x009D, "TLS_RSA_WITH_AES_256_GCM_SHA384"),
    (0x009E, "TLS_DHE_RSA_WITH_AES_128_GCM_SHA256"),
    (0x009F, "TLS_DHE_RSA_WITH_AES_256_GCM_SHA384"),
    (0x00A8, "TLS_PSK_WITH_AES_128_GCM_SHA256"),
    (0xC009, "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA"),
    (0xC013, "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA"),
    (0xC014, "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA"),
    (0xC027, "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256"),
    (0xC02B, "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256"),
    (0xC02C, "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384"),
    (0xC02F, "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256"),
    (0xC030, "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384"),
    (0xCCA8, "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256"),
    (0x1301, "TLS_AES_128_GCM_SHA256"),
    (0x1302, "TLS_AES_256_GCM_SHA384"),
    (0x1303, "TLS_CHACHA20_POLY1305_SHA256"),
    (0x00FF, "TLS_EMPTY_RENEGOTIATION_INFO_SCSV"),
    (0x5600, "TLS_FALLBACK_SCSV"),
];

static CIPHER_SUITE_NAMES: Lazy<HashMap<u16, &'static str>> =
    Lazy::new(|| CIPHER_SUITE_CATALOG.iter().copied().collect());

impl CipherSuite {
    pub const TLS_RSA_WITH_AES_128_CBC_SHA: CipherSuite = CipherSuite(0x002F);
    pub const TLS_DHE_RSA_WITH_AES_128_CBC_SHA: CipherSuite = CipherSuite(0x0033);
    pub const TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256: CipherSuite = CipherSuite(0xC02F);
    pub const TLS_AES_128_GCM_SHA256: CipherSuite = CipherSuite(0x1301);

    /// Every real suite in the catalog, signalling values excluded
    pub fn all() -> Vec<CipherSuite> {
        CIPHER_SUITE_CATALOG
            .iter()
            .map(|(id, _)| CipherSuite(*id))
            .filter(|suite| !suite.is_scsv())
            .collect()
    }

    /// Suites negotiable below TLS 1.3
    pub fn all_pre_tls13() -> Vec<CipherSuite> {
        Self::all().into_iter().filter(|s| !s.is_tls13()).collect()
    }

    pub fn all_tls13() -> Vec<CipherSuite> {
        Self::all().into_iter().filter(|s| s.is_tls13()).collect()
    }

    /// Suites an SSLv3 peer can negotiate
    pub fn all_ssl3() -> Vec<CipherSuite> {
        Self::all_pre_tls13()
            .into_iter()
            .filter(|s| !s.is_aead() && !s.name().ends_with("SHA256") && !s.is_psk() && !s.uses_ecdh())
            .collect()
    }

    pub fn from_name(name: &str) -> Option<CipherSuite> {
        CIPHER_SUITE_CATALOG
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(id, _)| CipherSuite(*id))
    }

    pub fn name(&self) -> &'static str {
        CIPHER_SUITE_NAMES.get(&self.0).copied().unwrap_or("UNKNOWN_CIPHER_SUITE")
    }

    pub fn is_scsv(&self) -> bool {
        self.name().ends_with("_SCSV")
    }

    pub fn is_tls13(&self) -> bool {
        (0x1301..=0x1305).contains(&self.0)
    }

    /// Finite-field Diffie-Hellman key exchange
    pub fn uses_dh(&self) -> bool {
        let name = self.name();
        name.starts_with("TLS_DHE_") || name.starts_with("TLS_DH_")
    }

    pub fn uses_ecdh(&self) -> bool {
        self.name().starts_with("TLS_ECDH")
    }

    pub fn is_export(&self) -> bool {
        self.name().contains("EXPORT")
    }

    pub fn is_cbc(&self) -> bool {
        self.name().contains("_CBC_")
    }

    pub fn is_aead(&self) -> bool {
        let name = self.name();
        name.contains("_GCM_") || name.contains("_CCM") || name.contains("CHACHA20_POLY1305")
    }

    pub fn is_null(&self) -> bool {
        self.name().contains("WITH_NULL")
    }

    pub fn is_rc4(&self) -> bool {
        self.name().contains("_RC4_")
    }

    pub fn is_psk(&self) -> bool {
        self.name().contains("PSK")
    }

    /// 64-bit block ciphers
    pub fn is_64bit_block(&self) -> bool {
        let name = self.name();
        name.contains("3DES") || name.contains("_DES") || name.contains("IDEA")
    }

    pub fn is_ephemeral(&self) -> bool {
        self.is_tls13() || self.name().starts_with("TLS_DHE_") || self.name().starts_with("TLS_ECDHE_")
    }

    /// Key type the server signs its key exchange with, `None` without a signature
    pub fn signature_key(&self) -> Option<SignatureKey> {
        if !self.is_ephemeral() || self.is_tls13() || self.is_psk() {
            return None;
        }
        let family = self.key_exchange_family();
        if family.contains("_ECDSA") {
            Some(SignatureKey::Ecdsa)
        } else if family.contains("_DSS") {
            Some(SignatureKey::Dsa)
        } else {
            Some(SignatureKey::Rsa)
        }
    }

    /// Key exchange and authentication part of the name, e.g. `DHE_RSA`
    pub fn key_exchange_family(&self) -> &'static str {
        let name = self.name();
        if self.is_tls13() {
            return "TLS13";
        }
        name.strip_prefix("TLS_")
            .and_then(|rest| rest.split("_WITH_").next())
            .unwrap_or(name)
    }
}

impl fmt::Debug for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<CipherSuite> for String {
    fn from(suite: CipherSuite) -> Self {
        suite.name().to_string()
    }
}

impl TryFrom<String> for CipherSuite {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CipherSuite::from_name(&value).ok_or_else(|| format!("unknown cipher suite '{}'", value))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NamedGroup {
    Secp256r1,
    Secp384r1,
    Secp521r1,
    X25519,
    X448,
    Sect283r1,
    Ffdhe2048,
    Ffdhe3072,
}

impl NamedGroup {
    pub const ALL: [NamedGroup; 8] = [
        NamedGroup::Secp256r1,
        NamedGroup::Secp384r1,
        NamedGroup::Secp521r1,
        NamedGroup::X25519,
        NamedGroup::X448,
        NamedGroup::Sect283r1,
        NamedGroup::Ffdhe2048,
        NamedGroup::Ffdhe3072,
    ];

    pub fn is_ec(&self) -> bool {
        !matches!(self, NamedGroup::Ffdhe2048 | NamedGroup::Ffdhe3072)
    }

    pub fn is_nist(&self) -> bool {
        matches!(self, NamedGroup::Secp256r1 | NamedGroup::Secp384r1 | NamedGroup::Secp521r1)
    }

    /// Curves over binary fields
    pub fn is_binary(&self) -> bool {
        *self == NamedGroup::Sect283r1
    }

    /// Groups whose points have an uncompressed and a compressed form
    pub fn has_point_formats(&self) -> bool {
        self.is_nist() || self.is_binary()
    }

    pub fn all_ec() -> Vec<NamedGroup> {
        Self::ALL.iter().copied().filter(|g| g.is_ec()).collect()
    }
}

/// EC point format code from the ec_point_formats extension
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct EcPointFormat(pub u8);

impl EcPointFormat {
    pub const UNCOMPRESSED: EcPointFormat = EcPointFormat(0);
    pub const ANSIX962_COMPRESSED_PRIME: EcPointFormat = EcPointFormat(1);
    pub const ANSIX962_COMPRESSED_CHAR2: EcPointFormat = EcPointFormat(2);

    /// Formats with an assigned code
    pub const DEFINED: [EcPointFormat; 3] = [
        EcPointFormat::UNCOMPRESSED,
        EcPointFormat::ANSIX962_COMPRESSED_PRIME,
        EcPointFormat::ANSIX962_COMPRESSED_CHAR2,
    ];

    pub fn is_defined(&self) -> bool {
        self.0 <= 2
    }

    /// Whether points of `group` can be encoded in this format
    pub fn fits(&self, group: NamedGroup) -> bool {
        match *self {
            EcPointFormat::UNCOMPRESSED => group.is_ec(),
            EcPointFormat::ANSIX962_COMPRESSED_PRIME => group.is_nist(),
            EcPointFormat::ANSIX962_COMPRESSED_CHAR2 => group.is_binary(),
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self.0 {
            0 => "uncompressed",
            1 => "ansiX962_compressed_prime",
            2 => "ansiX962_compressed_char2",
            _ => "undefined",
        }
    }
}

impl fmt::Debug for EcPointFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}

impl fmt::Display for EcPointFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Signature algorithm and hash pairs from the signature_algorithms extension
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignatureAndHashAlgorithm {
    RsaMd5,
    RsaSha1,
    RsaSha256,
    RsaSha384,
    RsaSha512,
    DsaSha1,
    DsaSha256,
    EcdsaSha1,
    EcdsaSha256,
    EcdsaSha384,
    RsaPssRsaeSha256,
    RsaPssRsaeSha384,
    RsaPssRsaeSha512,
    Ed25519,
}

/// Key type a signature is made with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureKey {
    Rsa,
    Dsa,
    Ecdsa,
    Ed25519,
}

impl SignatureAndHashAlgorithm {
    pub const ALL: [SignatureAndHashAlgorithm; 14] = [
        SignatureAndHashAlgorithm::RsaMd5,
        SignatureAndHashAlgorithm::RsaSha1,
        SignatureAndHashAlgorithm::RsaSha256,
        SignatureAndHashAlgorithm::RsaSha384,
        SignatureAndHashAlgorithm::RsaSha512,
        SignatureAndHashAlgorithm::DsaSha1,
        SignatureAndHashAlgorithm::DsaSha256,
        SignatureAndHashAlgorithm::EcdsaSha1,
        SignatureAndHashAlgorithm::EcdsaSha256,
        SignatureAndHashAlgorithm::EcdsaSha384,
        SignatureAndHashAlgorithm::RsaPssRsaeSha256,
        SignatureAndHashAlgorithm::RsaPssRsaeSha384,
        SignatureAndHashAlgorithm::RsaPssRsaeSha512,
        SignatureAndHashAlgorithm::Ed25519,
    ];

    /// Algorithms allowed in a TLS 1.3 CertificateVerify
    pub fn all_tls13() -> Vec<SignatureAndHashAlgorithm> {
        Self::ALL.iter().copied().filter(|a| a.is_tls13()).collect()
    }

    pub fn is_tls13(&self) -> bool {
        matches!(
            self,
            SignatureAndHashAlgorithm::EcdsaSha256
                | SignatureAndHashAlgorithm::EcdsaSha384
                | SignatureAndHashAlgorithm::RsaPssRsaeSha256
                | SignatureAndHashAlgorithm::RsaPssRsaeSha384
                | SignatureAndHashAlgorithm::RsaPssRsaeSha512
                | SignatureAndHashAlgorithm::Ed25519
        )
    }

    /// MD5 or SHA-1 digest
    pub fn uses_weak_hash(&self) -> bool {
        matches!(
            self,
            SignatureAndHashAlgorithm::RsaMd5
                | SignatureAndHashAlgorithm::RsaSha1
                | SignatureAndHashAlgorithm::DsaSha1
                | SignatureAndHashAlgorithm::EcdsaSha1
        )
    }

    pub fn is_rsa_pss(&self) -> bool {
        matches!(
            self,
            SignatureAndHashAlgorithm::RsaPssRsaeSha256
                | SignatureAndHashAlgorithm::RsaPssRsaeSha384
                | SignatureAndHashAlgorithm::RsaPssRsaeSha512
        )
    }

    pub fn key(&self) -> SignatureKey {
        match self {
            SignatureAndHashAlgorithm::DsaSha1 | SignatureAndHashAlgorithm::DsaSha256 => SignatureKey::Dsa,
            SignatureAndHashAlgorithm::EcdsaSha1
            | SignatureAndHashAlgorithm::EcdsaSha256
            | SignatureAndHashAlgorithm::EcdsaSha384 => SignatureKey::Ecdsa,
            SignatureAndHashAlgorithm::Ed25519 => SignatureKey::Ed25519,
            _ => SignatureKey::Rsa,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompressionMethod {
    Null,
    Deflate,
    Lzs,
}

impl CompressionMethod {
    pub const ALL: [CompressionMethod; 3] = [
        CompressionMethod::Null,
        CompressionMethod::Deflate,
        CompressionMethod::Lzs,
    ];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionType {
    ServerNameIndication,
    EcPointFormats,
    SupportedGroups,
    Heartbeat,
    Alpn,
    EncryptThenMac,
    ExtendedMasterSecret,
    SessionTicket,
    ExtendedRandom,
    SupportedVersions,
    Cookie,
    KeyShare,
    RenegotiationInfo,
    SignatureAlgorithms,
}

impl ExtensionType {
    /// Extensions offered when enumerating what the peer echoes back
    pub const PROBED: [ExtensionType; 9] = [
        ExtensionType::ServerNameIndication,
        ExtensionType::EcPointFormats,
        ExtensionType::SupportedGroups,
        ExtensionType::Heartbeat,
        ExtensionType::Alpn,
        ExtensionType::EncryptThenMac,
        ExtensionType::ExtendedMasterSecret,
        ExtensionType::SessionTicket,
        ExtensionType::RenegotiationInfo,
    ];
}

/// ALPN identifiers offered during enumeration
pub const ALPN_PROTOCOLS: &[&str] = &[
    "http/0.9",
    "http/1.0",
    "http/1.1",
    "spdy/1",
    "spdy/2",
    "spdy/3",
    "stun.turn",
    "stun.nat-discovery",
    "h2",
    "h2c",
    "webrtc",
    "c-webrtc",
    "ftp",
    "imap",
    "pop3",
    "managesieve",
    "coap",
    "xmpp-client",
    "xmpp-server",
    "acme-tls/1",
    "mqtt",
    "dot",
    "ntske/1",
    "sunrpc",
    "h3",
    "smb",
    "irc",
    "nntp",
    "nnsp",
    "doq",
];

/// Handshake and record message kinds as seen in a trace
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    ClientHello,
    HelloVerifyRequest,
    ServerHello,
    HelloRetryRequest,
    EncryptedExtensions,
    Certificate,
    ServerKeyExchange,
    CertificateRequest,
    ServerHelloDone,
    ClientKeyExchange,
    CertificateVerify,
    ChangeCipherSpec,
    Finished,
    Heartbeat,
    ApplicationData,
    Alert,
}

/// Alert description code
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct AlertDescription(pub u8);

impl AlertDescription {
    pub const CLOSE_NOTIFY: AlertDescription = AlertDescription(0);
    pub const UNEXPECTED_MESSAGE: AlertDescription = AlertDescription(10);
    pub const BAD_RECORD_MAC: AlertDescription = AlertDescription(20);
    pub const DECRYPTION_FAILED: AlertDescription = AlertDescription(21);
    pub const RECORD_OVERFLOW: AlertDescription = AlertDescription(22);
    pub const HANDSHAKE_FAILURE: AlertDescription = AlertDescription(40);
    pub const BAD_CERTIFICATE: AlertDescription = AlertDescription(42);
    pub const ILLEGAL_PARAMETER: AlertDescription = AlertDescription(47);
    pub const DECODE_ERROR: AlertDescription = AlertDescription(50);
    pub const DECRYPT_ERROR: AlertDescription = AlertDescription(51);
    pub const PROTOCOL_VERSION: AlertDescription = AlertDescription(70);
    pub const INTERNAL_ERROR: AlertDescription = AlertDescription(80);

    pub fn name(&self) -> &'static str {
        match self.0 {
            0 => "close_notify",
            10 => "unexpected_message",
            20 => "bad_record_mac",
            21 => "decryption_failed",
            22 => "record_overflow",
            40 => "handshake_failure",
            42 => "bad_certificate",
            47 => "illegal_parameter",
            50 => "decode_error",
            51 => "decrypt_error",
            70 => "protocol_version",
            80 => "internal_error",
            _ => "unknown_alert",
        }
    }
}

impl fmt::Debug for AlertDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}

impl fmt::Display for AlertDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cipher_suite_classification() {
        let dhe = CipherSuite::TLS_DHE_RSA_WITH_AES_128_CBC_SHA;
        assert!(dhe.uses_dh());
        assert!(dhe.is_cbc());
        assert!(!dhe.uses_ecdh());
        assert_eq!(dhe.key_exchange_family(), "DHE_RSA");

        let ecdhe = CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256;
        assert!(ecdhe.uses_ecdh());
        assert!(!ecdhe.uses_dh());
        assert!(ecdhe.is_aead());

        let tls13 = CipherSuite::TLS_AES_128_GCM_SHA256;
        assert!(tls13.is_tls13());
        assert_eq!(tls13.key_exchange_family(), "TLS13");
    }

    #[test]
    fn test_catalog_excludes_signalling_values() {
        assert!(CipherSuite::all().iter().all(|s| !s.is_scsv()));
        assert!(CipherSuite::all_pre_tls13().iter().all(|s| !s.is_tls13()));
        assert_eq!(CipherSuite::all_tls13().len(), 3);
        assert!(CipherSuite::all_ssl3().iter().all(|s| !s.is_aead()));
    }

    #[test]
    fn test_point_formats_match_curve_family() {
        assert!(EcPointFormat::UNCOMPRESSED.fits(NamedGroup::X25519));
        assert!(EcPointFormat::ANSIX962_COMPRESSED_PRIME.fits(NamedGroup::Secp384r1));
        assert!(!EcPointFormat::ANSIX962_COMPRESSED_PRIME.fits(NamedGroup::Sect283r1));
        assert!(EcPointFormat::ANSIX962_COMPRESSED_CHAR2.fits(NamedGroup::Sect283r1));
        assert!(!EcPointFormat(0xE4).is_defined());
        assert!(!EcPointFormat(0xE4).fits(NamedGroup::Secp256r1));
    }

    #[test]
    fn test_signature_keys() {
        assert_eq!(
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256.signature_key(),
            Some(SignatureKey::Rsa)
        );
        assert_eq!(CipherSuite(0xC02B).signature_key(), Some(SignatureKey::Ecdsa));
        assert_eq!(CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA.signature_key(), None);
        assert_eq!(CipherSuite::TLS_AES_128_GCM_SHA256.signature_key(), None);

        let tls13 = SignatureAndHashAlgorithm::all_tls13();
        assert!(tls13.iter().all(|a| !a.uses_weak_hash()));
        assert!(!tls13.contains(&SignatureAndHashAlgorithm::RsaSha256));
    }

    #[test]
    fn test_cipher_suite_serializes_by_name() {
        let json = serde_json::to_string(&CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA).unwrap();
        assert_eq!(json, "\"TLS_RSA_WITH_AES_128_CBC_SHA\"");
        let back: CipherSuite = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA);
    }
}
