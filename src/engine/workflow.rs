// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Workflows and Traces
 * Action sequences handed to the protocol engine and what came back
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use crate::constants::{
    AlertDescription, CipherSuite, CompressionMethod, ExtensionType, MessageType, NamedGroup,
    ProtocolVersion, SignatureAndHashAlgorithm,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shape of the canned workflows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowTraceType {
    /// ClientHello up to the server's first flight
    Hello,
    /// Complete handshake without application data
    Handshake,
}

/// How a crafted CBC record is malformed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordPadding {
    /// Correct padding, broken MAC
    ValidPaddingInvalidMac,
    /// First padding byte wrong
    InvalidPadding,
    /// Padding length larger than the record
    PaddingLengthOverflow,
    /// Record truncated so no MAC fits
    MissingMac,
}

impl RecordPadding {
    pub const ALL: [RecordPadding; 4] = [
        RecordPadding::ValidPaddingInvalidMac,
        RecordPadding::InvalidPadding,
        RecordPadding::PaddingLengthOverflow,
        RecordPadding::MissingMac,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordPadding::ValidPaddingInvalidMac => "valid_padding_invalid_mac",
            RecordPadding::InvalidPadding => "invalid_padding",
            RecordPadding::PaddingLengthOverflow => "padding_length_overflow",
            RecordPadding::MissingMac => "missing_mac",
        }
    }
}

/// Early ChangeCipherSpec injection targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EarlyCcsTarget {
    /// Key derivation bug of OpenSSL 1.0.0 (not exploitable)
    OpenSsl100,
    /// Key derivation bug of OpenSSL 1.0.1 (exploitable)
    OpenSsl101,
}

/// One step of a workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolAction {
    Send(Vec<MessageType>),
    Receive(Vec<MessageType>),
    /// Application record with crafted CBC padding
    SendPaddedRecord(RecordPadding),
    /// DH ClientKeyExchange whose shared secret does or does not start with a zero byte
    SendDhKeyExchange { secret_seed: u64, leading_zero: bool },
    /// Heartbeat request whose declared length exceeds the payload
    SendHeartbeat { payload: Vec<u8>, declared_length: u16 },
    /// ChangeCipherSpec before the key exchange
    SendEarlyChangeCipherSpec(EarlyCcsTarget),
    /// ClientKeyExchange, then Finished under the new epoch ahead of its ChangeCipherSpec
    SendFinishedBeforeChangeCipherSpec,
}

impl ProtocolAction {
    pub fn is_receive(&self) -> bool {
        matches!(self, ProtocolAction::Receive(_))
    }
}

/// Ordered list of protocol actions
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Workflow {
    pub actions: Vec<ProtocolAction>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canned workflow for the given shape and target version
    pub fn for_type(trace_type: WorkflowTraceType, version: ProtocolVersion) -> Self {
        let mut workflow = Self::new().then(ProtocolAction::Send(vec![MessageType::ClientHello]));

        if version.is_tls13() {
            workflow = workflow.then(ProtocolAction::Receive(vec![
                MessageType::ServerHello,
                MessageType::EncryptedExtensions,
                MessageType::Certificate,
                MessageType::CertificateVerify,
                MessageType::Finished,
            ]));
            if trace_type == WorkflowTraceType::Handshake {
                workflow = workflow.then(ProtocolAction::Send(vec![MessageType::Finished]));
            }
            return workflow;
        }

        workflow = workflow.then(ProtocolAction::Receive(vec![
            MessageType::ServerHello,
            MessageType::Certificate,
            MessageType::ServerHelloDone,
        ]));

        if trace_type == WorkflowTraceType::Handshake {
            workflow = workflow.then_handshake_completion();
        }
        workflow
    }

    pub fn then(mut self, action: ProtocolAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Client key exchange, CCS, Finished and the server's CCS and Finished
    pub fn then_handshake_completion(self) -> Self {
        self.then(ProtocolAction::Send(vec![
            MessageType::ClientKeyExchange,
            MessageType::ChangeCipherSpec,
            MessageType::Finished,
        ]))
        .then(ProtocolAction::Receive(vec![
            MessageType::ChangeCipherSpec,
            MessageType::Finished,
        ]))
    }

    /// Hello flight, then a client flight whose Finished overtakes the ChangeCipherSpec
    pub fn reordered_finished(version: ProtocolVersion) -> Self {
        Self::for_type(WorkflowTraceType::Hello, version)
            .then(ProtocolAction::SendFinishedBeforeChangeCipherSpec)
            .then(ProtocolAction::Receive(vec![
                MessageType::ChangeCipherSpec,
                MessageType::Finished,
            ]))
    }

    pub fn receive_count(&self) -> usize {
        self.actions.iter().filter(|a| a.is_receive()).count()
    }
}

/// Transport state observed after the last action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SocketState {
    Open,
    Closed,
    Reset,
    Timeout,
}

/// Everything observed while executing one workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    /// Messages received from the peer in arrival order
    pub received: Vec<MessageType>,
    pub alerts: Vec<AlertDescription>,
    pub socket_state: SocketState,

    /// All actions could be performed in order
    pub executed_as_planned: bool,

    pub selected_version: Option<ProtocolVersion>,
    pub selected_cipher_suite: Option<CipherSuite>,
    pub selected_group: Option<NamedGroup>,
    pub selected_compression: Option<CompressionMethod>,
    pub selected_alpn: Option<String>,

    /// Algorithm of the ServerKeyExchange or CertificateVerify signature
    pub selected_signature_algorithm: Option<SignatureAndHashAlgorithm>,
    pub server_extensions: Vec<ExtensionType>,
    pub server_random: Option<Vec<u8>>,
    pub hello_retry_request: bool,
    pub cookie_issued: bool,

    /// DTLS server asked for a cookie round trip
    pub hello_verify_request: bool,
    pub elapsed: Duration,
}

impl Default for Trace {
    fn default() -> Self {
        Self {
            received: Vec::new(),
            alerts: Vec::new(),
            socket_state: SocketState::Open,
            executed_as_planned: false,
            selected_version: None,
            selected_cipher_suite: None,
            selected_group: None,
            selected_compression: None,
            selected_alpn: None,
            selected_signature_algorithm: None,
            server_extensions: Vec::new(),
            server_random: None,
            hello_retry_request: false,
            cookie_issued: false,
            hello_verify_request: false,
            elapsed: Duration::ZERO,
        }
    }
}

impl Trace {
    pub fn did_receive(&self, message: MessageType) -> bool {
        self.received.contains(&message)
    }

    pub fn received_server_hello(&self) -> bool {
        self.did_receive(MessageType::ServerHello)
    }

    pub fn received_finished(&self) -> bool {
        self.did_receive(MessageType::Finished)
    }

    pub fn received_alert(&self) -> bool {
        !self.alerts.is_empty()
    }
}
