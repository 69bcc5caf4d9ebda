// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - TLS Scanner Error Types
 * Error taxonomy for transport, probe and report failures
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use crate::property::AnalyzedProperty;
use std::time::Duration;
use thiserror::Error;

/// Main scanner error type
#[derive(Error, Debug)]
pub enum ScannerError {
    /// Transport-level failures talking to the peer
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Faults raised inside a probe
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    /// Report merge failures
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Transport failures classified for the task retry loop
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection timeout after {timeout:?} to {peer}")]
    ConnectionTimeout { peer: String, timeout: Duration },

    #[error("No response within {timeout:?}")]
    ResponseTimeout { timeout: Duration },

    #[error("Connection refused by {peer}")]
    ConnectionRefused { peer: String },

    #[error("Connection reset by {peer}")]
    ConnectionReset { peer: String },

    #[error("Network unreachable for {peer}")]
    Unreachable { peer: String },

    #[error("Protocol engine failure: {0}")]
    Engine(String),
}

impl TransportError {
    /// Check if the failure is worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectionTimeout { .. }
                | TransportError::ResponseTimeout { .. }
                | TransportError::ConnectionRefused { .. }
                | TransportError::ConnectionReset { .. }
                | TransportError::Unreachable { .. }
        )
    }
}

/// Probe-level failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// No configuration can be built that the peer would accept
    #[error("No common configuration with the peer: {0}")]
    NoCommonConfiguration(String),

    /// Every task of a batch ended in error
    #[error("All {tasks} tasks failed")]
    AllTasksFailed { tasks: usize },

    /// Unexpected fault inside the probe logic
    #[error("Internal probe fault: {0}")]
    Internal(String),
}

impl ProbeError {
    /// Failures that mean "could not test" rather than "test broke"
    pub fn is_configuration_impossible(&self) -> bool {
        matches!(
            self,
            ProbeError::NoCommonConfiguration(_) | ProbeError::AllTasksFailed { .. }
        )
    }
}

/// Report merge failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("Property {property} already has a result")]
    DuplicateProperty { property: AnalyzedProperty },

    #[error("Artifact {artifact} was already recorded")]
    DuplicateArtifact { artifact: &'static str },
}

/// Result type for scanner operations
pub type ScannerResult<T> = Result<T, ScannerError>;
