// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use super::{Probe, ProbeContext};
use crate::errors::ProbeError;
use crate::property::AnalyzedProperty;
use crate::report::{ProbeOutcome, ScanReport};
use crate::types::{ProbeType, TestResult};
use async_trait::async_trait;
use tracing::debug;

const OWNED: &[AnalyzedProperty] = &[
    AnalyzedProperty::SendsHelloRetryRequest,
    AnalyzedProperty::IssuesCookieInHelloRetry,
];

/// TLS 1.3 hello without key shares, forcing a HelloRetryRequest
pub struct HelloRetryProbe;

impl HelloRetryProbe {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HelloRetryProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for HelloRetryProbe {
    fn probe_type(&self) -> ProbeType {
        ProbeType::HelloRetry
    }

    fn owned_properties(&self) -> &'static [AnalyzedProperty] {
        OWNED
    }

    fn can_be_executed(&self, report: &ScanReport) -> bool {
        report.is_probe_already_executed(ProbeType::ProtocolVersion) && report.is_true(AnalyzedProperty::SupportsTls13)
    }

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
        let tls = ctx.selector.tls13_base_config().with_key_share_groups(Vec::new());
        let trace = ctx
            .execute_hello("hello-retry", tls)
            .await
            .ok_or(ProbeError::AllTasksFailed { tasks: 1 })?;

        debug!(
            hello_retry = trace.hello_retry_request,
            cookie = trace.cookie_issued,
            group = ?trace.selected_group,
            "Hello retry test"
        );
        Ok(ProbeOutcome::new(self.probe_type())
            .with_property(
                AnalyzedProperty::SendsHelloRetryRequest,
                TestResult::from_bool(trace.hello_retry_request),
            )
            .with_property(
                AnalyzedProperty::IssuesCookieInHelloRetry,
                TestResult::from_bool(trace.hello_retry_request && trace.cookie_issued),
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PeerProfile;
    use crate::probes::testing::{assert_complete, context_for};

    #[tokio::test]
    async fn test_hello_retry_with_cookie() {
        let mut profile = PeerProfile::modern();
        profile.hello_retry_cookie = true;
        let (ctx, _peer) = context_for(profile);

        let mut probe = HelloRetryProbe::new();
        let outcome = probe.execute_test(&ctx).await.unwrap();
        assert_complete(&probe, &outcome);
        assert_eq!(outcome.result_of(AnalyzedProperty::SendsHelloRetryRequest), Some(TestResult::True));
        assert_eq!(outcome.result_of(AnalyzedProperty::IssuesCookieInHelloRetry), Some(TestResult::True));
    }

    #[tokio::test]
    async fn test_no_hello_retry() {
        let mut profile = PeerProfile::modern();
        profile.sends_hello_retry = false;
        let (ctx, _peer) = context_for(profile);

        let mut probe = HelloRetryProbe::new();
        let outcome = probe.execute_test(&ctx).await.unwrap();
        assert_eq!(outcome.result_of(AnalyzedProperty::SendsHelloRetryRequest), Some(TestResult::False));
        assert_eq!(outcome.result_of(AnalyzedProperty::IssuesCookieInHelloRetry), Some(TestResult::False));
    }
}
