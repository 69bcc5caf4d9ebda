// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use super::{Probe, ProbeContext};
use crate::constants::ProtocolVersion;
use crate::engine::Workflow;
use crate::errors::ProbeError;
use crate::property::AnalyzedProperty;
use crate::report::{ProbeOutcome, ScanReport};
use crate::types::{ProbeType, TestResult};
use async_trait::async_trait;
use tracing::{debug, info};

const OWNED: &[AnalyzedProperty] = &[
    AnalyzedProperty::SupportsDtlsCookieExchange,
    AnalyzedProperty::HasCookieChecks,
    AnalyzedProperty::SupportsReordering,
];

/// DTLS cookie exchange and out-of-order Finished delivery
pub struct DtlsReorderingProbe {
    version: Option<ProtocolVersion>,
}

impl DtlsReorderingProbe {
    pub fn new() -> Self {
        Self { version: None }
    }

    /// `Some((cookie exchanged, handshake went on))`, `None` when the task failed
    async fn hello(ctx: &ProbeContext, version: ProtocolVersion, echo_cookie: bool) -> Option<(bool, bool)> {
        let mut tls = ctx.selector.config_for(version);
        tls.echo_dtls_cookie = echo_cookie;
        let trace = ctx.execute_hello("dtls-cookie", tls).await?;
        Some((trace.hello_verify_request, trace.received_server_hello()))
    }

    async fn reordered(ctx: &ProbeContext, version: ProtocolVersion) -> Option<bool> {
        let mut tls = ctx.selector.config_for(version);
        ctx.selector.repair_config(&mut tls);
        let trace = ctx
            .execute_trace("dtls-reordering", tls, Workflow::reordered_finished(version))
            .await?;
        Some(trace.received_finished())
    }
}

impl Default for DtlsReorderingProbe {
    fn default() -> Self {
        Self::new()
    }
}

fn observed(result: Option<bool>) -> TestResult {
    result.map_or(TestResult::CouldNotTest, TestResult::from_bool)
}

#[async_trait]
impl Probe for DtlsReorderingProbe {
    fn probe_type(&self) -> ProbeType {
        ProbeType::DtlsReordering
    }

    fn owned_properties(&self) -> &'static [AnalyzedProperty] {
        OWNED
    }

    fn can_be_executed(&self, report: &ScanReport) -> bool {
        report.is_probe_already_executed(ProbeType::CipherSuite)
            && report.is_probe_already_executed(ProbeType::CcaSupport)
            && !report.is_true(AnalyzedProperty::SupportsCca)
            && !report.is_true(AnalyzedProperty::SupportsOnlyPsk)
            && report.highest_dtls_version().is_some()
    }

    fn adjust_config(&mut self, report: &ScanReport) {
        self.version = report.highest_dtls_version();
    }

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
        let version = self
            .version
            .ok_or_else(|| ProbeError::NoCommonConfiguration("no supported DTLS version".to_string()))?;

        let first = Self::hello(ctx, version, true).await;
        let exchange = first.map(|(cookie, accepted)| cookie && accepted);

        let checks = match exchange {
            Some(true) => {
                ctx.cooldown().await;
                Self::hello(ctx, version, false).await.map(|(_, accepted)| !accepted)
            }
            Some(false) => Some(false),
            None => None,
        };

        ctx.cooldown().await;
        let reordering = Self::reordered(ctx, version).await;
        debug!(version = %version, ?exchange, ?checks, ?reordering, "DTLS handshake tests");

        if exchange.is_none() && checks.is_none() && reordering.is_none() {
            return Err(ProbeError::AllTasksFailed { tasks: 3 });
        }
        info!(version = %version, "DTLS cookie and reordering tests finished");

        Ok(ProbeOutcome::new(self.probe_type())
            .with_property(AnalyzedProperty::SupportsDtlsCookieExchange, observed(exchange))
            .with_property(AnalyzedProperty::HasCookieChecks, observed(checks))
            .with_property(AnalyzedProperty::SupportsReordering, observed(reordering)))
    }
}
