// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use super::selection::{enumerate_by_elimination, Offer};
use super::{Probe, ProbeContext};
use crate::constants::{CompressionMethod, ProtocolVersion};
use crate::errors::ProbeError;
use crate::property::AnalyzedProperty;
use crate::report::{Artifact, ProbeOutcome, ScanReport};
use crate::types::{ProbeType, TestResult};
use async_trait::async_trait;
use tracing::info;

const OWNED: &[AnalyzedProperty] = &[
    AnalyzedProperty::SupportsTlsCompression,
    AnalyzedProperty::VulnerableToCrime,
];

/// Record-layer compression support, which makes CRIME possible
pub struct CompressionsProbe {
    version: Option<ProtocolVersion>,
}

impl CompressionsProbe {
    pub fn new() -> Self {
        Self { version: None }
    }
}

impl Default for CompressionsProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for CompressionsProbe {
    fn probe_type(&self) -> ProbeType {
        ProbeType::Compressions
    }

    fn owned_properties(&self) -> &'static [AnalyzedProperty] {
        OWNED
    }

    fn can_be_executed(&self, report: &ScanReport) -> bool {
        report.is_probe_already_executed(ProbeType::ProtocolVersion)
    }

    fn adjust_config(&mut self, report: &ScanReport) {
        self.version = report.highest_legacy_version();
    }

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
        let Some(version) = self.version else {
            // TLS 1.3 removed compression
            return Ok(ProbeOutcome::uniform(self.probe_type(), OWNED, TestResult::False)
                .with_artifact(Artifact::CompressionMethods(vec![CompressionMethod::Null])));
        };

        let found = enumerate_by_elimination("compressions", CompressionMethod::ALL.to_vec(), |offered| {
            let tls = ctx
                .selector
                .config_for(version)
                .with_compression_methods(offered)
                .enforcing();
            async move {
                ctx.cooldown().await;
                let Some(trace) = ctx.execute_hello("compressions", tls).await else {
                    return Offer::Failed;
                };
                if !trace.received_server_hello() {
                    return Offer::Declined;
                }
                trace.selected_compression.into()
            }
        })
        .await;

        if found.interrupted && found.supported.is_empty() {
            return Err(ProbeError::AllTasksFailed { tasks: 1 });
        }

        let compresses = found.verdict(found.supported.iter().any(|m| *m != CompressionMethod::Null));
        info!(methods = ?found.supported, complete = found.is_complete(), "Compression enumeration finished");

        Ok(ProbeOutcome::new(self.probe_type())
            .with_property(AnalyzedProperty::SupportsTlsCompression, compresses)
            .with_property(AnalyzedProperty::VulnerableToCrime, compresses)
            .with_artifact(Artifact::CompressionMethods(found.supported)))
    }
}
