// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Simulated TLS Peer
 * In-process protocol engine with configurable server behaviour,
 * used for offline scans, demos and the test suite
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use super::config::TlsConfig;
use super::workflow::{EarlyCcsTarget, ProtocolAction, RecordPadding, SocketState, Trace, Workflow};
use super::{Connection, ProtocolEngine};
use crate::constants::{
    AlertDescription, CipherSuite, CompressionMethod, EcPointFormat, ExtensionType, MessageType,
    NamedGroup, ProtocolVersion, SignatureAndHashAlgorithm,
};
use crate::errors::TransportError;
use crate::retry::ConnectionTimeouts;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// Behaviour of the simulated server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerProfile {
    pub name: String,
    pub versions: Vec<ProtocolVersion>,

    /// Supported suites in server preference order
    pub cipher_suites: Vec<CipherSuite>,
    pub enforce_cipher_suite_order: bool,

    /// Supported groups in server preference order
    pub named_groups: Vec<NamedGroup>,
    pub enforce_group_order: bool,

    pub compression_methods: Vec<CompressionMethod>,

    /// Point encodings accepted for the client's EC key
    pub point_formats: Vec<EcPointFormat>,

    /// Abort when the client lists an unassigned point format
    pub rejects_undefined_point_format: bool,

    /// Accept compressed NIST key shares in TLS 1.3
    pub tls13_compressed_points: bool,

    /// Signature algorithms in server preference order
    pub signature_algorithms: Vec<SignatureAndHashAlgorithm>,

    /// Supported ALPN identifiers in server preference order
    pub alpn_protocols: Vec<String>,

    /// Extensions the server echoes when offered
    pub extensions: Vec<ExtensionType>,

    pub requests_client_certificate: bool,
    pub requires_client_certificate: bool,
    pub sends_hello_retry: bool,
    pub hello_retry_cookie: bool,

    /// Answer DTLS hellos with a HelloVerifyRequest first
    pub dtls_cookie_exchange: bool,

    /// Only continue after the cookie was echoed
    pub dtls_cookie_checks: bool,

    /// Buffer a Finished that arrives before its ChangeCipherSpec
    pub dtls_reordering: bool,

    pub heartbleed: bool,
    pub early_ccs: Option<EarlyCcsTarget>,
    pub padding_oracle: bool,
    pub direct_raccoon: bool,
    pub repeats_server_random: bool,

    /// Select values the client never offered
    pub selects_unoffered_values: bool,

    /// Every n-th attack response is a connection reset
    pub noise_interval: Option<usize>,

    /// Number of initial connects that time out
    pub transport_failures: usize,

    /// Connect attempts past this count time out
    pub unreachable_after: Option<usize>,

    /// Delay before every response
    pub latency: Duration,
}

impl PeerProfile {
    /// Current best-practice server
    pub fn modern() -> Self {
        Self {
            name: "modern".to_string(),
            versions: vec![ProtocolVersion::Tls12, ProtocolVersion::Tls13],
            cipher_suites: vec![
                CipherSuite(0x1301),
                CipherSuite(0x1302),
                CipherSuite(0x1303),
                CipherSuite(0xC02F),
                CipherSuite(0xC030),
                CipherSuite(0xCCA8),
                CipherSuite(0x009E),
                CipherSuite(0xC013),
            ],
            enforce_cipher_suite_order: true,
            named_groups: vec![NamedGroup::X25519, NamedGroup::Secp256r1, NamedGroup::Secp384r1],
            enforce_group_order: true,
            compression_methods: vec![CompressionMethod::Null],
            point_formats: vec![EcPointFormat::UNCOMPRESSED],
            rejects_undefined_point_format: true,
            tls13_compressed_points: false,
            signature_algorithms: vec![
                SignatureAndHashAlgorithm::RsaPssRsaeSha256,
                SignatureAndHashAlgorithm::RsaPssRsaeSha384,
                SignatureAndHashAlgorithm::RsaSha256,
                SignatureAndHashAlgorithm::RsaSha384,
                SignatureAndHashAlgorithm::RsaSha512,
            ],
            alpn_protocols: vec!["h2".to_string(), "http/1.1".to_string()],
            extensions: vec![
                ExtensionType::ServerNameIndication,
                ExtensionType::EcPointFormats,
                ExtensionType::SupportedGroups,
                ExtensionType::Alpn,
                ExtensionType::ExtendedMasterSecret,
                ExtensionType::RenegotiationInfo,
                ExtensionType::SessionTicket,
                ExtensionType::SupportedVersions,
                ExtensionType::KeyShare,
                ExtensionType::Cookie,
            ],
            requests_client_certificate: false,
            requires_client_certificate: false,
            sends_hello_retry: true,
            hello_retry_cookie: false,
            dtls_cookie_exchange: false,
            dtls_cookie_checks: false,
            dtls_reordering: false,
            heartbleed: false,
            early_ccs: None,
            padding_oracle: false,
            direct_raccoon: false,
            repeats_server_random: false,
            selects_unoffered_values: false,
            noise_interval: None,
            transport_failures: 0,
            unreachable_after: None,
            latency: Duration::ZERO,
        }
    }

    /// Outdated server carrying the classic vulnerabilities
    pub fn legacy() -> Self {
        Self {
            name: "legacy".to_string(),
            versions: vec![
                ProtocolVersion::Ssl3,
                ProtocolVersion::Tls10,
                ProtocolVersion::Tls11,
                ProtocolVersion::Tls12,
            ],
            cipher_suites: vec![
                CipherSuite(0x002F),
                CipherSuite(0x0033),
                CipherSuite(0x0035),
                CipherSuite(0x0039),
                CipherSuite(0x000A),
                CipherSuite(0x0005),
                CipherSuite(0x0014),
                CipherSuite(0xC013),
            ],
            enforce_cipher_suite_order: false,
            named_groups: vec![NamedGroup::Secp256r1, NamedGroup::Secp384r1],
            enforce_group_order: false,
            compression_methods: vec![CompressionMethod::Null, CompressionMethod::Deflate],
            point_formats: vec![EcPointFormat::UNCOMPRESSED, EcPointFormat::ANSIX962_COMPRESSED_PRIME],
            rejects_undefined_point_format: false,
            tls13_compressed_points: false,
            signature_algorithms: vec![
                SignatureAndHashAlgorithm::RsaSha256,
                SignatureAndHashAlgorithm::RsaSha1,
                SignatureAndHashAlgorithm::RsaMd5,
            ],
            alpn_protocols: Vec::new(),
            extensions: vec![
                ExtensionType::EcPointFormats,
                ExtensionType::SupportedGroups,
                ExtensionType::Heartbeat,
                ExtensionType::SessionTicket,
            ],
            requests_client_certificate: false,
            requires_client_certificate: false,
            sends_hello_retry: false,
            hello_retry_cookie: false,
            dtls_cookie_exchange: false,
            dtls_cookie_checks: false,
            dtls_reordering: false,
            heartbleed: true,
            early_ccs: Some(EarlyCcsTarget::OpenSsl101),
            padding_oracle: true,
            direct_raccoon: true,
            repeats_server_random: true,
            selects_unoffered_values: false,
            noise_interval: None,
            transport_failures: 0,
            unreachable_after: None,
            latency: Duration::ZERO,
        }
    }
}

impl PeerProfile {
    /// DTLS-only server with a stateless cookie exchange
    pub fn dtls() -> Self {
        Self {
            name: "dtls".to_string(),
            versions: vec![ProtocolVersion::Dtls10, ProtocolVersion::Dtls12],
            cipher_suites: vec![
                CipherSuite(0xC02F),
                CipherSuite(0xC030),
                CipherSuite(0x009E),
                CipherSuite(0xC013),
                CipherSuite(0x002F),
            ],
            named_groups: vec![NamedGroup::Secp256r1, NamedGroup::X25519],
            alpn_protocols: Vec::new(),
            extensions: vec![
                ExtensionType::EcPointFormats,
                ExtensionType::SupportedGroups,
                ExtensionType::ExtendedMasterSecret,
                ExtensionType::RenegotiationInfo,
            ],
            signature_algorithms: vec![
                SignatureAndHashAlgorithm::RsaSha256,
                SignatureAndHashAlgorithm::RsaSha384,
            ],
            sends_hello_retry: false,
            dtls_cookie_exchange: true,
            dtls_cookie_checks: true,
            dtls_reordering: true,
            ..Self::modern()
        }
    }
}

impl Default for PeerProfile {
    fn default() -> Self {
        Self::modern()
    }
}

impl FromStr for PeerProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "modern" => Ok(PeerProfile::modern()),
            "legacy" => Ok(PeerProfile::legacy()),
            "dtls" => Ok(PeerProfile::dtls()),
            other => Err(format!("unknown peer profile '{}'", other)),
        }
    }
}

#[derive(Debug, Default)]
struct PeerState {
    connects: AtomicUsize,
    failures_left: AtomicUsize,
    open: AtomicUsize,
    attack_responses: AtomicUsize,
    randoms: AtomicU64,
}

/// Protocol engine answering from a [`PeerProfile`]
#[derive(Debug, Clone)]
pub struct SimulatedPeer {
    profile: Arc<PeerProfile>,
    state: Arc<PeerState>,
}

impl SimulatedPeer {
    pub fn new(profile: PeerProfile) -> Self {
        let state = PeerState {
            failures_left: AtomicUsize::new(profile.transport_failures),
            ..PeerState::default()
        };
        Self {
            profile: Arc::new(profile),
            state: Arc::new(state),
        }
    }

    pub fn profile(&self) -> &PeerProfile {
        &self.profile
    }

    /// Connections opened and not yet closed
    pub fn open_connections(&self) -> usize {
        self.state.open.load(Ordering::SeqCst)
    }

    /// Connect attempts seen so far, failed ones included
    pub fn connect_attempts(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    fn peer_name(&self) -> String {
        format!("simulated:{}", self.profile.name)
    }
}

#[async_trait]
impl ProtocolEngine for SimulatedPeer {
    async fn connect(&self, timeouts: ConnectionTimeouts) -> Result<Box<dyn Connection>, TransportError> {
        let attempt = self.state.connects.fetch_add(1, Ordering::SeqCst);

        let gone = self.profile.unreachable_after.is_some_and(|limit| attempt >= limit);
        let failed = gone
            || self
                .state
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
        if failed {
            return Err(TransportError::ConnectionTimeout {
                peer: self.peer_name(),
                timeout: timeouts.tcp,
            });
        }

        self.state.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SimulatedConnection {
            profile: Arc::clone(&self.profile),
            state: Arc::clone(&self.state),
            closed: false,
        }))
    }
}

struct SimulatedConnection {
    profile: Arc<PeerProfile>,
    state: Arc<PeerState>,
    closed: bool,
}

#[derive(Debug, Clone)]
struct Negotiated {
    version: ProtocolVersion,
    cipher_suite: CipherSuite,
    group: Option<NamedGroup>,
    compression: CompressionMethod,
    alpn: Option<String>,
    signature_algorithm: Option<SignatureAndHashAlgorithm>,
    extensions: Vec<ExtensionType>,
    hello_retry: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reply {
    Message(MessageType),
    Alert(AlertDescription),
    Close,
    Reset,
}

#[async_trait]
impl Connection for SimulatedConnection {
    async fn execute(
        &mut self,
        workflow: &Workflow,
        config: &TlsConfig,
        timeouts: ConnectionTimeouts,
    ) -> Result<Trace, TransportError> {
        let latency = self.profile.latency;
        if !latency.is_zero() {
            if latency > timeouts.response {
                tokio::time::sleep(timeouts.response).await;
                return Err(TransportError::ResponseTimeout {
                    timeout: timeouts.response,
                });
            }
            tokio::time::sleep(latency).await;
        }

        let started = Instant::now();
        let mut trace = self.run(workflow, config);
        trace.elapsed = started.elapsed() + latency;
        Ok(trace)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.state.open.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl SimulatedConnection {
    fn run(&self, workflow: &Workflow, config: &TlsConfig) -> Trace {
        let mut trace = Trace {
            executed_as_planned: true,
            ..Trace::default()
        };
        let mut outbox: Vec<Reply> = Vec::new();
        let mut negotiated: Option<Negotiated> = None;
        let mut established = false;
        let mut closed = false;

        for action in &workflow.actions {
            if closed {
                trace.executed_as_planned = false;
                break;
            }

            match action {
                ProtocolAction::Send(messages) => {
                    if messages.contains(&MessageType::ClientHello) {
                        match self.negotiate(config) {
                            Ok(n) => {
                                if self.passes_cookie_exchange(&mut trace, &mut outbox, config, &n) {
                                    self.record_selection(&mut trace, &n);
                                    outbox.extend(self.server_flight(&n));
                                    negotiated = Some(n);
                                }
                            }
                            Err(alert) => outbox.extend([Reply::Alert(alert), Reply::Close]),
                        }
                    }

                    let completes = messages.contains(&MessageType::ClientKeyExchange)
                        || (messages == &[MessageType::Finished]
                            && negotiated.as_ref().is_some_and(|n| n.version.is_tls13()));
                    if completes {
                        if let Some(n) = negotiated.as_ref().filter(|n| !n.hello_retry) {
                            established = self.finish_handshake(config, n, &mut outbox);
                        }
                    }
                }
                ProtocolAction::SendFinishedBeforeChangeCipherSpec => match negotiated.as_ref() {
                    Some(n) if !n.hello_retry && n.version.is_dtls() => {
                        // without buffering the early Finished is dropped as undecryptable
                        if self.profile.dtls_reordering {
                            established = self.finish_handshake(config, n, &mut outbox);
                        }
                    }
                    _ => outbox.extend([
                        Reply::Alert(AlertDescription::UNEXPECTED_MESSAGE),
                        Reply::Close,
                    ]),
                },
                ProtocolAction::Receive(expected) => {
                    let delivered = Self::deliver(&mut trace, &mut outbox, &mut closed);
                    if !expected.iter().all(|m| delivered.contains(m)) {
                        trace.executed_as_planned = false;
                    }
                }
                ProtocolAction::SendPaddedRecord(padding) => {
                    outbox.extend(self.padding_response(established, *padding));
                }
                ProtocolAction::SendDhKeyExchange { leading_zero, .. } => {
                    outbox.extend(self.raccoon_response(negotiated.as_ref(), *leading_zero));
                }
                ProtocolAction::SendHeartbeat { .. } => {
                    let negotiated_heartbeat = trace.server_extensions.contains(&ExtensionType::Heartbeat);
                    if !established || !negotiated_heartbeat {
                        outbox.extend([
                            Reply::Alert(AlertDescription::UNEXPECTED_MESSAGE),
                            Reply::Close,
                        ]);
                    } else if self.profile.heartbleed {
                        outbox.push(Reply::Message(MessageType::Heartbeat));
                    }
                }
                ProtocolAction::SendEarlyChangeCipherSpec(target) => {
                    if self.profile.early_ccs != Some(*target) {
                        outbox.extend([
                            Reply::Alert(AlertDescription::UNEXPECTED_MESSAGE),
                            Reply::Close,
                        ]);
                    }
                }
            }
        }

        if !closed {
            Self::deliver(&mut trace, &mut outbox, &mut closed);
        }
        trace
    }

    fn deliver(trace: &mut Trace, outbox: &mut Vec<Reply>, closed: &mut bool) -> Vec<MessageType> {
        let mut delivered = Vec::new();
        for reply in outbox.drain(..) {
            match reply {
                Reply::Message(message) => {
                    trace.received.push(message);
                    delivered.push(message);
                }
                Reply::Alert(alert) => {
                    trace.received.push(MessageType::Alert);
                    trace.alerts.push(alert);
                    delivered.push(MessageType::Alert);
                }
                Reply::Close => {
                    trace.socket_state = SocketState::Closed;
                    *closed = true;
                }
                Reply::Reset => {
                    trace.socket_state = SocketState::Reset;
                    *closed = true;
                }
            }
        }
        delivered
    }

    /// DTLS cookie round trip; `false` when the server stops before its ServerHello
    fn passes_cookie_exchange(
        &self,
        trace: &mut Trace,
        outbox: &mut Vec<Reply>,
        config: &TlsConfig,
        negotiated: &Negotiated,
    ) -> bool {
        if !negotiated.version.is_dtls() || !self.profile.dtls_cookie_exchange {
            return true;
        }
        trace.hello_verify_request = true;
        outbox.push(Reply::Message(MessageType::HelloVerifyRequest));
        if config.echo_dtls_cookie || !self.profile.dtls_cookie_checks {
            return true;
        }
        // the cookie-less retransmission gets another HelloVerifyRequest
        outbox.push(Reply::Message(MessageType::HelloVerifyRequest));
        false
    }

    /// Handle the client's key exchange and Finished; `true` once established
    fn finish_handshake(&self, config: &TlsConfig, negotiated: &Negotiated, outbox: &mut Vec<Reply>) -> bool {
        let tls13 = negotiated.version.is_tls13();
        let rejected = if self.profile.requires_client_certificate && !config.client_authentication {
            Some(AlertDescription::HANDSHAKE_FAILURE)
        } else if !tls13
            && negotiated.cipher_suite.uses_ecdh()
            && !self.accepts_point(config.selected_point_format, negotiated.group)
        {
            Some(AlertDescription::ILLEGAL_PARAMETER)
        } else {
            None
        };

        if let Some(alert) = rejected {
            outbox.extend([Reply::Alert(alert), Reply::Close]);
            return false;
        }
        if !tls13 {
            outbox.extend([
                Reply::Message(MessageType::ChangeCipherSpec),
                Reply::Message(MessageType::Finished),
            ]);
        }
        true
    }

    fn accepts_point(&self, format: EcPointFormat, group: Option<NamedGroup>) -> bool {
        group.is_some_and(|g| format.fits(g)) && self.profile.point_formats.contains(&format)
    }

    fn record_selection(&self, trace: &mut Trace, negotiated: &Negotiated) {
        trace.selected_version = Some(negotiated.version);
        trace.selected_cipher_suite = Some(negotiated.cipher_suite);
        trace.selected_group = negotiated.group;
        trace.selected_compression = Some(negotiated.compression);
        trace.selected_alpn = negotiated.alpn.clone();
        trace.selected_signature_algorithm = negotiated.signature_algorithm;
        trace.server_extensions = negotiated.extensions.clone();
        trace.hello_retry_request = negotiated.hello_retry;
        trace.cookie_issued = negotiated.hello_retry && self.profile.hello_retry_cookie;
        if !negotiated.hello_retry {
            trace.server_random = Some(self.next_server_random());
        }
    }

    fn server_flight(&self, negotiated: &Negotiated) -> Vec<Reply> {
        if negotiated.hello_retry {
            return vec![Reply::Message(MessageType::HelloRetryRequest)];
        }

        let mut flight = vec![Reply::Message(MessageType::ServerHello)];
        if negotiated.version.is_tls13() {
            flight.push(Reply::Message(MessageType::EncryptedExtensions));
            if self.profile.requests_client_certificate {
                flight.push(Reply::Message(MessageType::CertificateRequest));
            }
            flight.extend([
                Reply::Message(MessageType::Certificate),
                Reply::Message(MessageType::CertificateVerify),
                Reply::Message(MessageType::Finished),
            ]);
            return flight;
        }

        flight.push(Reply::Message(MessageType::Certificate));
        if negotiated.cipher_suite.is_ephemeral() {
            flight.push(Reply::Message(MessageType::ServerKeyExchange));
        }
        if self.profile.requests_client_certificate {
            flight.push(Reply::Message(MessageType::CertificateRequest));
        }
        flight.push(Reply::Message(MessageType::ServerHelloDone));
        flight
    }

    fn negotiate(&self, config: &TlsConfig) -> Result<Negotiated, AlertDescription> {
        let profile = &self.profile;
        let offered_version = config.highest_version;

        let version = profile
            .versions
            .iter()
            .copied()
            .filter(|v| v.is_dtls() == offered_version.is_dtls())
            .filter(|v| {
                if config.enforce_settings {
                    *v == offered_version
                } else {
                    *v <= offered_version
                }
            })
            .max()
            .ok_or(AlertDescription::PROTOCOL_VERSION)?;

        let common_groups: Vec<NamedGroup> = config
            .named_groups
            .iter()
            .copied()
            .filter(|g| profile.named_groups.contains(g))
            .collect();

        let usable = |suite: &CipherSuite| {
            let version_ok = if version.is_tls13() {
                suite.is_tls13()
            } else if version == ProtocolVersion::Ssl3 {
                CipherSuite::all_ssl3().contains(suite)
            } else if version.is_dtls() {
                !suite.is_tls13() && !suite.is_rc4()
            } else {
                !suite.is_tls13()
            };
            version_ok && (!suite.uses_ecdh() || !common_groups.is_empty())
        };

        let cipher_suite = select(
            &config.cipher_suites,
            &profile.cipher_suites,
            profile.enforce_cipher_suite_order,
            profile.selects_unoffered_values,
            usable,
        )
        .ok_or(AlertDescription::HANDSHAKE_FAILURE)?;

        let mut hello_retry = false;
        let group = if version.is_tls13() || cipher_suite.uses_ecdh() {
            let group = select(
                &config.named_groups,
                &profile.named_groups,
                profile.enforce_group_order,
                false,
                |_| true,
            )
            .ok_or(AlertDescription::HANDSHAKE_FAILURE)?;

            if version.is_tls13() && !config.key_share_groups.contains(&group) {
                if !profile.sends_hello_retry {
                    return Err(AlertDescription::HANDSHAKE_FAILURE);
                }
                hello_retry = true;
            }
            if version.is_tls13()
                && !hello_retry
                && group.has_point_formats()
                && config.selected_point_format != EcPointFormat::UNCOMPRESSED
                && !profile.tls13_compressed_points
            {
                return Err(AlertDescription::ILLEGAL_PARAMETER);
            }
            Some(group)
        } else {
            None
        };

        if !version.is_tls13()
            && cipher_suite.uses_ecdh()
            && profile.rejects_undefined_point_format
            && config.point_formats.iter().any(|f| !f.is_defined())
        {
            return Err(AlertDescription::ILLEGAL_PARAMETER);
        }

        let signature_algorithm = if version.is_tls13() {
            Some(
                select(
                    &config.signature_algorithms,
                    &profile.signature_algorithms,
                    true,
                    profile.selects_unoffered_values,
                    |a| a.is_tls13(),
                )
                .ok_or(AlertDescription::HANDSHAKE_FAILURE)?,
            )
        } else {
            match cipher_suite.signature_key() {
                Some(key) if version.signs_with_algorithms() => Some(
                    select(
                        &config.signature_algorithms,
                        &profile.signature_algorithms,
                        true,
                        profile.selects_unoffered_values,
                        |a| a.key() == key,
                    )
                    .ok_or(AlertDescription::HANDSHAKE_FAILURE)?,
                ),
                _ => None,
            }
        };

        let compression = if version.is_tls13() {
            if !config.compression_methods.contains(&CompressionMethod::Null) {
                return Err(AlertDescription::ILLEGAL_PARAMETER);
            }
            CompressionMethod::Null
        } else {
            select(
                &config.compression_methods,
                &profile.compression_methods,
                false,
                profile.selects_unoffered_values,
                |_| true,
            )
            .ok_or(AlertDescription::HANDSHAKE_FAILURE)?
        };

        let alpn = if config.offers_extension(ExtensionType::Alpn)
            && profile.extensions.contains(&ExtensionType::Alpn)
        {
            select(
                &config.alpn_protocols,
                &profile.alpn_protocols,
                true,
                profile.selects_unoffered_values,
                |_| true,
            )
        } else {
            None
        };

        let extensions = config
            .extensions
            .iter()
            .copied()
            .filter(|e| profile.extensions.contains(e))
            .filter(|e| *e != ExtensionType::Alpn || alpn.is_some())
            .collect();

        trace!(
            peer = %profile.name,
            version = %version,
            cipher_suite = %cipher_suite,
            "Simulated negotiation"
        );

        Ok(Negotiated {
            version,
            cipher_suite,
            group,
            compression,
            alpn,
            signature_algorithm,
            extensions,
            hello_retry,
        })
    }

    fn padding_response(&self, established: bool, padding: RecordPadding) -> Vec<Reply> {
        if !established {
            return vec![Reply::Alert(AlertDescription::UNEXPECTED_MESSAGE), Reply::Close];
        }
        if self.is_noise() {
            return vec![Reply::Reset];
        }
        if self.profile.padding_oracle {
            return match padding {
                RecordPadding::ValidPaddingInvalidMac => {
                    vec![Reply::Alert(AlertDescription::BAD_RECORD_MAC), Reply::Close]
                }
                RecordPadding::InvalidPadding | RecordPadding::PaddingLengthOverflow => {
                    vec![Reply::Alert(AlertDescription::DECRYPTION_FAILED), Reply::Close]
                }
                RecordPadding::MissingMac => vec![Reply::Reset],
            };
        }
        vec![Reply::Alert(AlertDescription::BAD_RECORD_MAC), Reply::Close]
    }

    fn raccoon_response(&self, negotiated: Option<&Negotiated>, leading_zero: bool) -> Vec<Reply> {
        let uses_dh = negotiated.is_some_and(|n| n.cipher_suite.uses_dh());
        if !uses_dh {
            return vec![Reply::Alert(AlertDescription::HANDSHAKE_FAILURE), Reply::Close];
        }
        if self.is_noise() {
            return vec![Reply::Reset];
        }
        if self.profile.direct_raccoon && leading_zero {
            return vec![Reply::Alert(AlertDescription::HANDSHAKE_FAILURE), Reply::Close];
        }
        vec![Reply::Alert(AlertDescription::BAD_RECORD_MAC), Reply::Close]
    }

    fn is_noise(&self) -> bool {
        let count = self.state.attack_responses.fetch_add(1, Ordering::SeqCst);
        match self.profile.noise_interval {
            Some(interval) if interval > 0 => count % interval == interval - 1,
            _ => false,
        }
    }

    fn next_server_random(&self) -> Vec<u8> {
        let counter = if self.profile.repeats_server_random {
            0
        } else {
            self.state.randoms.fetch_add(1, Ordering::SeqCst) + 1
        };

        let mut random = counter.to_be_bytes().to_vec();
        random.extend((0u64..24).map(|i| (i.wrapping_mul(31) ^ counter.wrapping_mul(7)) as u8));
        random
    }
}

/// Pick from `offered` the way a server would; `None` when nothing matches
fn select<T, F>(offered: &[T], supported: &[T], server_order: bool, bogus: bool, usable: F) -> Option<T>
where
    T: Clone + PartialEq,
    F: Fn(&T) -> bool,
{
    if bogus {
        if let Some(unoffered) = supported.iter().find(|s| !offered.contains(s) && usable(s)) {
            return Some(unoffered.clone());
        }
    }

    if server_order {
        supported
            .iter()
            .find(|s| offered.contains(s) && usable(s))
            .cloned()
    } else {
        offered
            .iter()
            .find(|o| supported.contains(o) && usable(o))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ConfigSelector, ConnectionGuard, DefaultConfigSelector, WorkflowTraceType};

    fn timeouts() -> ConnectionTimeouts {
        ConnectionTimeouts::uniform(Duration::from_millis(500))
    }

    async fn run(peer: &SimulatedPeer, workflow: &Workflow, config: &TlsConfig) -> Trace {
        let connection = peer.connect(timeouts()).await.unwrap();
        let mut guard = ConnectionGuard::new(connection);
        guard.execute(workflow, config, timeouts()).await.unwrap()
    }

    #[tokio::test]
    async fn test_hello_negotiates_highest_common_version() {
        let peer = SimulatedPeer::new(PeerProfile::legacy());
        let selector = DefaultConfigSelector::default();
        let config = selector.base_config();
        let workflow = Workflow::for_type(WorkflowTraceType::Hello, config.highest_version);

        let trace = run(&peer, &workflow, &config).await;
        assert!(trace.executed_as_planned);
        assert_eq!(trace.selected_version, Some(ProtocolVersion::Tls12));
        // client order: first catalog suite the legacy peer supports
        assert_eq!(trace.selected_cipher_suite, Some(CipherSuite(0x0005)));
        assert_eq!(peer.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_server_and_client_order() {
        let selector = DefaultConfigSelector::default();
        let a = CipherSuite(0x002F);
        let b = CipherSuite(0x0035);
        let config = selector.base_config().with_cipher_suites(vec![b, a]);
        let workflow = Workflow::for_type(WorkflowTraceType::Hello, ProtocolVersion::Tls12);

        let client_order = SimulatedPeer::new(PeerProfile::legacy());
        assert_eq!(run(&client_order, &workflow, &config).await.selected_cipher_suite, Some(b));

        let mut enforcing = PeerProfile::legacy();
        enforcing.enforce_cipher_suite_order = true;
        let server_order = SimulatedPeer::new(enforcing);
        assert_eq!(run(&server_order, &workflow, &config).await.selected_cipher_suite, Some(a));
    }

    #[tokio::test]
    async fn test_unsupported_version_gets_alert() {
        let peer = SimulatedPeer::new(PeerProfile::modern());
        let selector = DefaultConfigSelector::default();
        let config = selector.config_for(ProtocolVersion::Tls10).enforcing();
        let workflow = Workflow::for_type(WorkflowTraceType::Hello, ProtocolVersion::Tls10);

        let trace = run(&peer, &workflow, &config).await;
        assert!(!trace.received_server_hello());
        assert_eq!(trace.alerts, vec![AlertDescription::PROTOCOL_VERSION]);
        assert_eq!(trace.socket_state, SocketState::Closed);
        assert!(!trace.executed_as_planned);
    }

    #[tokio::test]
    async fn test_hello_retry_on_missing_key_share() {
        let mut profile = PeerProfile::modern();
        profile.hello_retry_cookie = true;
        let peer = SimulatedPeer::new(profile);
        let selector = DefaultConfigSelector::default();
        let config = selector.tls13_base_config().with_key_share_groups(Vec::new());
        let workflow = Workflow::for_type(WorkflowTraceType::Hello, ProtocolVersion::Tls13);

        let trace = run(&peer, &workflow, &config).await;
        assert!(trace.hello_retry_request);
        assert!(trace.cookie_issued);
        assert!(trace.did_receive(MessageType::HelloRetryRequest));
    }

    #[tokio::test]
    async fn test_transport_failures_then_success() {
        let mut profile = PeerProfile::modern();
        profile.transport_failures = 2;
        let peer = SimulatedPeer::new(profile);

        assert!(peer.connect(timeouts()).await.is_err());
        assert!(peer.connect(timeouts()).await.is_err());
        let connection = peer.connect(timeouts()).await;
        assert!(connection.is_ok());
        assert_eq!(peer.connect_attempts(), 3);
        assert_eq!(peer.open_connections(), 1);
        drop(connection.map(ConnectionGuard::new));
        assert_eq!(peer.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_peer_goes_away_after_limit() {
        let mut profile = PeerProfile::modern();
        profile.unreachable_after = Some(1);
        let peer = SimulatedPeer::new(profile);

        let first = peer.connect(timeouts()).await;
        assert!(first.is_ok());
        drop(first.map(ConnectionGuard::new));
        assert!(matches!(
            peer.connect(timeouts()).await,
            Err(TransportError::ConnectionTimeout { .. })
        ));
        assert_eq!(peer.connect_attempts(), 2);
    }

    #[tokio::test]
    async fn test_slow_peer_times_out() {
        let mut profile = PeerProfile::modern();
        profile.latency = Duration::from_millis(200);
        let peer = SimulatedPeer::new(profile);
        let selector = DefaultConfigSelector::default();
        let config = selector.base_config();
        let workflow = Workflow::for_type(WorkflowTraceType::Hello, ProtocolVersion::Tls12);

        let short = ConnectionTimeouts::uniform(Duration::from_millis(20));
        let mut guard = ConnectionGuard::new(peer.connect(short).await.unwrap());
        let result = guard.execute(&workflow, &config, short).await;
        assert!(matches!(result, Err(TransportError::ResponseTimeout { .. })));
    }

    #[tokio::test]
    async fn test_compressed_key_needs_listed_format() {
        let selector = DefaultConfigSelector::default();
        let ecdhe = vec![CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256, CipherSuite(0xC013)];
        let workflow = Workflow::for_type(WorkflowTraceType::Handshake, ProtocolVersion::Tls12);
        let config = selector
            .base_config()
            .with_cipher_suites(ecdhe)
            .with_named_groups(vec![NamedGroup::Secp256r1])
            .with_point_formats(EcPointFormat::DEFINED.to_vec())
            .with_selected_point_format(EcPointFormat::ANSIX962_COMPRESSED_PRIME);

        let trace = run(&SimulatedPeer::new(PeerProfile::legacy()), &workflow, &config).await;
        assert!(trace.received_finished());

        let trace = run(&SimulatedPeer::new(PeerProfile::modern()), &workflow, &config).await;
        assert!(!trace.received_finished());
        assert_eq!(trace.alerts, vec![AlertDescription::ILLEGAL_PARAMETER]);
    }

    #[tokio::test]
    async fn test_undefined_point_format_rejected_by_strict_peer() {
        let selector = DefaultConfigSelector::default();
        let workflow = Workflow::for_type(WorkflowTraceType::Hello, ProtocolVersion::Tls12);
        let config = selector
            .base_config()
            .with_cipher_suites(vec![CipherSuite(0xC013)])
            .with_point_formats(vec![EcPointFormat(0xE4), EcPointFormat(0x04)]);

        let trace = run(&SimulatedPeer::new(PeerProfile::modern()), &workflow, &config).await;
        assert_eq!(trace.alerts, vec![AlertDescription::ILLEGAL_PARAMETER]);

        let trace = run(&SimulatedPeer::new(PeerProfile::legacy()), &workflow, &config).await;
        assert!(trace.received_server_hello());
    }

    #[tokio::test]
    async fn test_signature_algorithm_follows_server_order() {
        let selector = DefaultConfigSelector::default();
        let peer = SimulatedPeer::new(PeerProfile::legacy());
        let workflow = Workflow::for_type(WorkflowTraceType::Hello, ProtocolVersion::Tls12);
        let dhe = vec![CipherSuite::TLS_DHE_RSA_WITH_AES_128_CBC_SHA];

        let config = selector.base_config().with_cipher_suites(dhe.clone());
        let trace = run(&peer, &workflow, &config).await;
        assert!(trace.did_receive(MessageType::ServerKeyExchange));
        assert_eq!(trace.selected_signature_algorithm, Some(SignatureAndHashAlgorithm::RsaSha256));

        let config = selector
            .base_config()
            .with_cipher_suites(dhe.clone())
            .with_signature_algorithms(vec![SignatureAndHashAlgorithm::EcdsaSha256]);
        let trace = run(&peer, &workflow, &config).await;
        assert_eq!(trace.alerts, vec![AlertDescription::HANDSHAKE_FAILURE]);

        // static RSA key exchange carries no signature
        let config = selector
            .base_config()
            .with_cipher_suites(vec![CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA]);
        let trace = run(&peer, &workflow, &config).await;
        assert_eq!(trace.selected_signature_algorithm, None);
    }

    #[tokio::test]
    async fn test_dtls_cookie_exchange() {
        let peer = SimulatedPeer::new(PeerProfile::dtls());
        let selector = DefaultConfigSelector::default();
        let workflow = Workflow::for_type(WorkflowTraceType::Hello, ProtocolVersion::Dtls12);

        let config = selector.config_for(ProtocolVersion::Dtls12);
        let trace = run(&peer, &workflow, &config).await;
        assert!(trace.hello_verify_request);
        assert!(trace.received_server_hello());
        assert_eq!(trace.selected_version, Some(ProtocolVersion::Dtls12));

        let mut config = selector.config_for(ProtocolVersion::Dtls12);
        config.echo_dtls_cookie = false;
        let trace = run(&peer, &workflow, &config).await;
        assert!(!trace.received_server_hello());
        assert_eq!(trace.received, vec![MessageType::HelloVerifyRequest, MessageType::HelloVerifyRequest]);
    }

    #[tokio::test]
    async fn test_reordered_finished() {
        let selector = DefaultConfigSelector::default();
        let config = selector.config_for(ProtocolVersion::Dtls12);
        let workflow = Workflow::reordered_finished(ProtocolVersion::Dtls12);

        let trace = run(&SimulatedPeer::new(PeerProfile::dtls()), &workflow, &config).await;
        assert!(trace.received_finished());
        assert!(trace.executed_as_planned);

        let mut strict = PeerProfile::dtls();
        strict.dtls_reordering = false;
        let trace = run(&SimulatedPeer::new(strict), &workflow, &config).await;
        assert!(!trace.received_finished());
        assert!(!trace.received_alert());
    }

    #[test]
    fn test_select_prefers_requested_order() {
        let offered = [1, 2, 3];
        let supported = [3, 2];
        assert_eq!(select(&offered, &supported, false, false, |_| true), Some(2));
        assert_eq!(select(&offered, &supported, true, false, |_| true), Some(3));
        assert_eq!(select(&[1], &supported, false, true, |_| true), Some(3));
        assert_eq!(select(&[1], &supported, false, false, |_| true), None);
    }
}
