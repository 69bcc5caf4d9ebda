// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Full-scan integration tests against the simulated peer
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use async_trait::async_trait;
use lonkero_tls::config::ScannerConfig;
use lonkero_tls::engine::{PeerProfile, SimulatedPeer};
use lonkero_tls::errors::ProbeError;
use lonkero_tls::probes::{default_probes, Probe, ProbeContext};
use lonkero_tls::property::AnalyzedProperty;
use lonkero_tls::registry::PROBE_REGISTRY;
use lonkero_tls::report::{ProbeOutcome, ScanReport};
use lonkero_tls::types::{ProbeState, ProbeType, TestResult};
use lonkero_tls::ScanOrchestrator;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn config() -> ScannerConfig {
    let mut config = ScannerConfig::new("sim.test", 443);
    config.overall_threads = 4;
    config
}

async fn scan(profile: PeerProfile, config: ScannerConfig) -> (ScanReport, SimulatedPeer) {
    let peer = SimulatedPeer::new(profile);
    let report = ScanOrchestrator::new(config, Arc::new(peer.clone()))
        .unwrap()
        .scan()
        .await;
    (report, peer)
}

/// Every owned property of every probe has exactly one terminal result
fn assert_report_complete(report: &ScanReport) {
    for probe in default_probes() {
        assert_ne!(
            report.probe_state(probe.probe_type()),
            ProbeState::Executing,
            "{} left executing",
            probe.probe_type()
        );
        for property in probe.owned_properties() {
            assert_ne!(
                report.get_result(*property),
                TestResult::NotTestedYet,
                "{} missing",
                property
            );
        }
    }
    assert!(report.has_result(AnalyzedProperty::VulnerableToLogjam));
    assert!(report.has_result(AnalyzedProperty::VulnerableToSweet32));
    assert!(report.finished_at.is_some());
}

#[tokio::test]
async fn test_modern_peer_scan() {
    let (report, peer) = scan(PeerProfile::modern(), config()).await;
    assert_report_complete(&report);
    assert_eq!(peer.open_connections(), 0);

    assert!(report.is_true(AnalyzedProperty::SupportsTls12));
    assert!(report.is_true(AnalyzedProperty::SupportsTls13));
    assert!(report.is_false(AnalyzedProperty::SupportsSsl3));
    assert!(report.is_true(AnalyzedProperty::SupportsHttp2));
    assert!(report.is_true(AnalyzedProperty::EnforcesCsOrdering));
    assert!(report.is_true(AnalyzedProperty::SendsHelloRetryRequest));
    assert!(report.is_true(AnalyzedProperty::UsesUniqueRandom));
    assert!(report.is_false(AnalyzedProperty::SupportsTlsCompression));

    for attack in [
        AnalyzedProperty::VulnerableToHeartbleed,
        AnalyzedProperty::VulnerableToEarlyCcs,
        AnalyzedProperty::VulnerableToPaddingOracle,
        AnalyzedProperty::VulnerableToDirectRaccoon,
        AnalyzedProperty::VulnerableToLogjam,
        AnalyzedProperty::VulnerableToSweet32,
    ] {
        assert_ne!(report.get_result(attack), TestResult::True, "{} flagged", attack);
    }

    let json = report.to_json().unwrap();
    assert!(json.contains("\"SUPPORTS_TLS13\": \"TRUE\""));
}

#[tokio::test]
async fn test_legacy_peer_scan_finds_vulnerabilities() {
    let (report, peer) = scan(PeerProfile::legacy(), config()).await;
    assert_report_complete(&report);
    assert_eq!(peer.open_connections(), 0);

    assert!(report.is_true(AnalyzedProperty::SupportsSsl3));
    assert!(report.is_false(AnalyzedProperty::SupportsTls13));
    assert!(report.is_true(AnalyzedProperty::SupportsTlsCompression));
    assert!(report.is_true(AnalyzedProperty::VulnerableToCrime));
    assert!(report.is_false(AnalyzedProperty::EnforcesCsOrdering));
    assert!(report.is_true(AnalyzedProperty::VulnerableToHeartbleed));
    assert!(report.is_true(AnalyzedProperty::VulnerableToEarlyCcs));
    assert!(report.is_true(AnalyzedProperty::EarlyCcsExploitable));
    assert!(report.is_true(AnalyzedProperty::VulnerableToPaddingOracle));
    assert!(report.is_true(AnalyzedProperty::VulnerableToDirectRaccoon));
    assert!(report.is_false(AnalyzedProperty::UsesUniqueRandom));
    assert!(report.is_true(AnalyzedProperty::VulnerableToLogjam));
    assert!(report.is_true(AnalyzedProperty::VulnerableToSweet32));

    // TLS 1.3 only probe never became runnable
    assert_eq!(report.probe_state(ProbeType::HelloRetry), ProbeState::CannotBeExecuted);
    assert_eq!(
        report.get_result(AnalyzedProperty::SendsHelloRetryRequest),
        TestResult::CouldNotTest
    );

    let padding = report.padding_oracle_tests.as_ref().unwrap();
    assert!(padding.iter().any(|t| t.significant && t.samples >= 200));
}

#[tokio::test]
async fn test_parallel_probes_match_serial_scan() {
    let mut parallel = config();
    parallel.parallel_probes = 4;
    parallel.overall_threads = 8;

    let (serial_report, _) = scan(PeerProfile::legacy(), config()).await;
    let (parallel_report, _) = scan(PeerProfile::legacy(), parallel).await;

    assert_report_complete(&parallel_report);
    assert_eq!(serial_report.properties, parallel_report.properties);
}

#[tokio::test]
async fn test_allow_list_limits_probes() {
    let mut config = config();
    config.probes = Some(vec![ProbeType::ProtocolVersion, ProbeType::EarlyCcs]);
    let (report, _) = scan(PeerProfile::legacy(), config).await;

    assert!(report.is_true(AnalyzedProperty::SupportsTls12));
    assert!(report.is_true(AnalyzedProperty::VulnerableToEarlyCcs));
    assert_eq!(report.probe_state(ProbeType::CipherSuite), ProbeState::NotScheduled);
    assert!(!report.has_result(AnalyzedProperty::SupportsCbc));
    // cipher suites unknown
    assert_eq!(report.get_result(AnalyzedProperty::VulnerableToLogjam), TestResult::Uncertain);
}

#[tokio::test]
async fn test_dtls_scan_checks_cookie_and_reordering() {
    let mut config = config();
    config.dtls = true;
    config.probes = Some(vec![
        ProbeType::ProtocolVersion,
        ProbeType::CipherSuite,
        ProbeType::CcaSupport,
        ProbeType::DtlsReordering,
    ]);
    let (report, peer) = scan(PeerProfile::dtls(), config).await;
    assert_eq!(peer.open_connections(), 0);

    assert!(report.is_true(AnalyzedProperty::SupportsDtls12));
    assert!(report.is_false(AnalyzedProperty::SupportsCca));
    assert_eq!(report.probe_state(ProbeType::DtlsReordering), ProbeState::Executed);
    assert!(report.is_true(AnalyzedProperty::SupportsDtlsCookieExchange));
    assert!(report.is_true(AnalyzedProperty::HasCookieChecks));
    assert!(report.is_true(AnalyzedProperty::SupportsReordering));
}

#[tokio::test]
async fn test_retries_absorb_transport_failures() {
    let mut profile = PeerProfile::modern();
    profile.transport_failures = 2;
    let mut config = config();
    config.probes = Some(vec![ProbeType::ProtocolVersion]);

    let peer = SimulatedPeer::new(profile);
    let orchestrator = ScanOrchestrator::new(config, Arc::new(peer.clone())).unwrap();
    let runner = orchestrator.runner();
    let report = orchestrator.scan().await;

    assert!(report.is_true(AnalyzedProperty::SupportsTls12));
    assert!(report.is_true(AnalyzedProperty::SupportsTls13));
    assert!(runner.metrics().summary().attempts_retried >= 2);
    assert_eq!(runner.metrics().summary().tasks_failed, 0);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_peer_yields_complete_report() {
    let mut profile = PeerProfile::modern();
    profile.transport_failures = usize::MAX;
    let (report, _) = scan(profile, config()).await;

    assert_report_complete(&report);
    assert_eq!(report.get_result(AnalyzedProperty::SupportsTls12), TestResult::CouldNotTest);
    assert!(report.properties.values().all(|r| *r != TestResult::True));
}

#[tokio::test]
async fn test_unoffered_selection_does_not_hang() {
    let mut profile = PeerProfile::legacy();
    profile.selects_unoffered_values = true;
    let (report, _) = scan(profile, config()).await;
    assert_report_complete(&report);
}

#[tokio::test]
async fn test_abort_before_start() {
    let peer = SimulatedPeer::new(PeerProfile::modern());
    let orchestrator = ScanOrchestrator::new(config(), Arc::new(peer.clone())).unwrap();
    orchestrator.abort_handle().abort();
    let report = orchestrator.scan().await;

    assert_report_complete(&report);
    assert_eq!(peer.connect_attempts(), 0);
    for probe in ProbeType::ALL {
        assert_eq!(report.probe_state(probe), ProbeState::CannotBeExecuted);
    }
}

#[tokio::test(start_paused = true)]
async fn test_scan_timeout_stops_scheduling() {
    let mut profile = PeerProfile::modern();
    profile.latency = Duration::from_millis(600);
    let mut config = ScannerConfig::new("sim.test", 443);
    config.timeout_ms = 5000;
    config.scan_timeout_secs = Some(1);

    let (report, _) = scan(profile, config).await;

    // the first probe finishes, nothing else starts
    assert_eq!(report.probe_state(ProbeType::ProtocolVersion), ProbeState::Executed);
    assert!(report.is_true(AnalyzedProperty::SupportsTls12));
    assert_eq!(report.probe_state(ProbeType::CipherSuite), ProbeState::CannotBeExecuted);
    assert_eq!(report.get_result(AnalyzedProperty::VulnerableToEarlyCcs), TestResult::CouldNotTest);
    assert_report_complete(&report);
}

/// Records dependency violations seen when a probe is started
struct DependencyCheck {
    inner: Box<dyn Probe>,
    violations: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Probe for DependencyCheck {
    fn probe_type(&self) -> ProbeType {
        self.inner.probe_type()
    }

    fn owned_properties(&self) -> &'static [AnalyzedProperty] {
        self.inner.owned_properties()
    }

    fn can_be_executed(&self, report: &ScanReport) -> bool {
        self.inner.can_be_executed(report)
    }

    fn adjust_config(&mut self, report: &ScanReport) {
        let probe_type = self.inner.probe_type();
        if let Some(meta) = PROBE_REGISTRY.get(probe_type) {
            for dependency in &meta.dependencies {
                if !report.is_probe_already_executed(*dependency) {
                    self.violations
                        .lock()
                        .unwrap()
                        .push(format!("{} started before {}", probe_type, dependency));
                }
            }
        }
        self.inner.adjust_config(report);
    }

    async fn execute_test(&mut self, ctx: &ProbeContext) -> Result<ProbeOutcome, ProbeError> {
        self.inner.execute_test(ctx).await
    }
}

#[tokio::test]
async fn test_probes_start_after_their_dependencies() {
    let violations = Arc::new(Mutex::new(Vec::new()));
    let probes: Vec<Box<dyn Probe>> = default_probes()
        .into_iter()
        .rev()
        .map(|inner| {
            Box::new(DependencyCheck {
                inner,
                violations: Arc::clone(&violations),
            }) as Box<dyn Probe>
        })
        .collect();

    let mut config = config();
    config.parallel_probes = 4;
    let peer = SimulatedPeer::new(PeerProfile::legacy());
    let report = ScanOrchestrator::new(config, Arc::new(peer))
        .unwrap()
        .with_probes(probes)
        .scan()
        .await;

    assert_report_complete(&report);
    assert!(violations.lock().unwrap().is_empty(), "{:?}", violations.lock().unwrap());
}
