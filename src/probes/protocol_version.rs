// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use super::{Probe, ProbeContext};
use crate::constants::ProtocolVersion;
use crate::engine::{Workflow, WorkflowTraceType};
use crate::errors::ProbeError;
use crate::property::AnalyzedProperty;
use crate::report::{Artifact, ProbeOutcome, ScanReport};
use crate::task::TlsTask;
use crate::types::{ProbeType, TestResult};
use async_trait::async_trait;
use tracing::{debug, info};

const OWNED: &[AnalyzedProperty] = &[
    AnalyzedProperty::SupportsSsl3,
    AnalyzedProperty::SupportsTls10,
    AnalyzedProperty::SupportsTls11,
    AnalyzedProperty::SupportsTls12,
    AnalyzedProperty::SupportsTls13,
    AnalyzedProperty::SupportsDtls10,
    AnalyzedProperty::SupportsDtls12,
];

const TLS_VERSIONS: &[ProtocolVersion] = &[
    ProtocolVersion::Ssl3,
    ProtocolVersion::Tls10,
    ProtocolVersion::Tls11,
    ProtocolVersion::Tls12,
    ProtocolVersion::Tls13,
];

const DTLS_VERSIONS: &[ProtocolVersion] = &[ProtocolVersion::Dtls10, ProtocolVersion::Dtls12];

/// Which protocol versions the peer negotiates
pub struct ProtocolVersionProbe;

impl ProtocolVersionProbe {
    pub fn new() -> Self {
        Self
    }

    fn property_for(version: ProtocolVersion) -> Option<AnalyzedProperty> {
        match version {
            ProtocolVersion::Ssl3 => Some(AnalyzedProperty::SupportsSsl3),
            ProtocolVersion::Tls10 => Some(AnalyzedProperty::SupportsTls10),
            ProtocolVersion::Tls11 => Some(AnalyzedProperty::SupportsTls11),
            ProtocolVersion::Tls12 => Some(AnalyzedProperty::SupportsTls12),
            ProtocolVersion::Tls13 => Some(AnalyzedProperty::SupportsTls13),
            ProtocolVersion::Dtls10 => Some(AnalyzedProperty::SupportsDtls10),
            ProtocolVersion::Dtls12 => Some(AnalyzedProperty::SupportsDtls12),
            ProtocolVersion::Ssl2 => None,
        }
    }
}

impl Default for ProtocolVersionProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for ProtocolVersionProbe {
    fn probe_type(&self) -> ProbeType {
        ProbeType::ProtocolVersion
    }

    fn owned_properties(&self) -> &'static [AnalyzedProperty] {
        OWNED
    }

    fn can_be_executed(&self, _report: &ScanReport) -> bool {
        true
    }

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
        let mut candidates: Vec<ProtocolVersion> = TLS_VERSIONS.to_vec();
        if ctx.config.dtls {
            candidates.extend_from_slice(DTLS_VERSIONS);
        }

        let tasks: Vec<TlsTask> = candidates
            .iter()
            .map(|version| {
                let mut tls = ctx.selector.config_for(*version).enforcing();
                ctx.selector.repair_config(&mut tls);
                let workflow = Workflow::for_type(WorkflowTraceType::Hello, *version);
                TlsTask::trace_task(format!("version-{}", version), tls, workflow)
                    .with_policy(ctx.task_policy())
            })
            .collect();

        let finished = ctx.runner.bulk_execute(tasks).await;
        if finished.iter().all(|t| t.has_error()) {
            return Err(ProbeError::AllTasksFailed { tasks: finished.len() });
        }

        let mut outcome = ProbeOutcome::new(self.probe_type());
        let mut supported = Vec::new();

        for (version, task) in candidates.iter().zip(finished.iter()) {
            let result = match task.trace() {
                None => TestResult::CouldNotTest,
                Some(trace) => {
                    let negotiated = trace.received_server_hello() && trace.selected_version == Some(*version);
                    debug!(version = %version, supported = negotiated, "Version tested");
                    TestResult::from_bool(negotiated)
                }
            };
            if result.is_true() {
                supported.push(*version);
            }
            if let Some(property) = Self::property_for(*version) {
                outcome = outcome.with_property(property, result);
            }
        }

        if !ctx.config.dtls {
            for version in DTLS_VERSIONS {
                if let Some(property) = Self::property_for(*version) {
                    outcome = outcome.with_property(property, TestResult::CouldNotTest);
                }
            }
        }

        info!(versions = ?supported, "Supported protocol versions");
        Ok(outcome.with_artifact(Artifact::Versions(supported)))
    }
}
