// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - TLS Scanner Library
 * Probe orchestration and side-channel oracle detection for TLS/DTLS peers
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod config;
pub mod constants;
pub mod property;
pub mod types;

// Production error handling and resilience modules
pub mod errors;
pub mod metrics;
pub mod retry;

// Protocol engine seam and task execution
pub mod engine;
pub mod fingerprint;
pub mod task;

// Oracle detection
pub mod leak;
pub mod vector;

// Probes and scheduling
pub mod after_probe;
pub mod orchestrator;
pub mod probes;
pub mod registry;
pub mod report;

pub use config::ScannerConfig;
pub use errors::{ScannerError, ScannerResult};
pub use orchestrator::{AbortHandle, ScanOrchestrator};
pub use report::ScanReport;
pub use types::{ProbeType, ScanDetail, TestResult};
