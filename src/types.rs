// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Outcome of a single analyzed property
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestResult {
    True,
    False,
    Uncertain,
    CouldNotTest,
    CannotBeTested,
    ErrorDuringTest,
    NotTestedYet,
}

impl TestResult {
    pub fn from_bool(value: bool) -> Self {
        if value {
            TestResult::True
        } else {
            TestResult::False
        }
    }

    pub fn is_true(&self) -> bool {
        *self == TestResult::True
    }

    pub fn is_false(&self) -> bool {
        *self == TestResult::False
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TestResult::True => "TRUE",
            TestResult::False => "FALSE",
            TestResult::Uncertain => "UNCERTAIN",
            TestResult::CouldNotTest => "COULD_NOT_TEST",
            TestResult::CannotBeTested => "CANNOT_BE_TESTED",
            TestResult::ErrorDuringTest => "ERROR_DURING_TEST",
            TestResult::NotTestedYet => "NOT_TESTED_YET",
        }
    }
}

impl std::fmt::Display for TestResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scan detail level, ordered from cheapest to most thorough
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScanDetail {
    Quick,
    #[default]
    Normal,
    Detailed,
    All,
}

impl ScanDetail {
    pub fn is_greater_equal_to(&self, other: ScanDetail) -> bool {
        *self >= other
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanDetail::Quick => "quick",
            ScanDetail::Normal => "normal",
            ScanDetail::Detailed => "detailed",
            ScanDetail::All => "all",
        }
    }
}

impl std::fmt::Display for ScanDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScanDetail {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quick" => Ok(ScanDetail::Quick),
            "normal" => Ok(ScanDetail::Normal),
            "detailed" => Ok(ScanDetail::Detailed),
            "all" => Ok(ScanDetail::All),
            other => Err(format!("unknown scan detail '{}'", other)),
        }
    }
}

/// Identity of every probe the orchestrator knows about
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProbeType {
    ProtocolVersion,
    CipherSuite,
    Extensions,
    NamedGroups,
    Compressions,
    Alpn,
    EcPointFormat,
    SignatureAndHash,
    CipherSuiteOrder,
    NamedGroupOrder,
    HelloRetry,
    CcaSupport,
    DtlsReordering,
    Heartbleed,
    EarlyCcs,
    PaddingOracle,
    DirectRaccoon,
    Randomness,
}

impl ProbeType {
    pub const ALL: [ProbeType; 18] = [
        ProbeType::ProtocolVersion,
        ProbeType::CipherSuite,
        ProbeType::Extensions,
        ProbeType::NamedGroups,
        ProbeType::Compressions,
        ProbeType::Alpn,
        ProbeType::EcPointFormat,
        ProbeType::SignatureAndHash,
        ProbeType::CipherSuiteOrder,
        ProbeType::NamedGroupOrder,
        ProbeType::HelloRetry,
        ProbeType::CcaSupport,
        ProbeType::DtlsReordering,
        ProbeType::Heartbleed,
        ProbeType::EarlyCcs,
        ProbeType::PaddingOracle,
        ProbeType::DirectRaccoon,
        ProbeType::Randomness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeType::ProtocolVersion => "protocol_version",
            ProbeType::CipherSuite => "cipher_suite",
            ProbeType::Extensions => "extensions",
            ProbeType::NamedGroups => "named_groups",
            ProbeType::Compressions => "compressions",
            ProbeType::Alpn => "alpn",
            ProbeType::EcPointFormat => "ec_point_format",
            ProbeType::SignatureAndHash => "signature_and_hash",
            ProbeType::CipherSuiteOrder => "cipher_suite_order",
            ProbeType::NamedGroupOrder => "named_group_order",
            ProbeType::HelloRetry => "hello_retry",
            ProbeType::CcaSupport => "cca_support",
            ProbeType::DtlsReordering => "dtls_reordering",
            ProbeType::Heartbleed => "heartbleed",
            ProbeType::EarlyCcs => "early_ccs",
            ProbeType::PaddingOracle => "padding_oracle",
            ProbeType::DirectRaccoon => "direct_raccoon",
            ProbeType::Randomness => "randomness",
        }
    }
}

impl std::fmt::Display for ProbeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProbeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProbeType::ALL
            .iter()
            .copied()
            .find(|probe| probe.as_str() == s)
            .ok_or_else(|| format!("unknown probe '{}'", s))
    }
}

/// Lifecycle state of a probe inside one scan
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProbeState {
    NotScheduled,
    Executing,
    Executed,
    CannotBeExecuted,
    Error,
}
