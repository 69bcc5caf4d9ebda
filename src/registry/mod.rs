// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Registry Module
 * Probe registry and metadata
 * © 2026 Bountyy Oy
 */

pub mod probe_registry;

pub use probe_registry::{ProbeCategory, ProbeMetadata, ProbeRegistry, RiskLevel, PROBE_REGISTRY};
