// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - After-Probes
 * Derived properties computed from the finished report without any
 * further handshakes
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use crate::constants::CipherSuite;
use crate::errors::ReportError;
use crate::property::AnalyzedProperty;
use crate::report::ScanReport;
use crate::types::{ProbeType, TestResult};
use tracing::debug;

/// Analyzer run once after every probe reached a terminal state
pub trait AfterProbe: Send + Sync {
    fn name(&self) -> &'static str;

    /// Write this analyzer's properties into the report
    fn analyze(&self, report: &mut ScanReport) -> Result<(), ReportError>;
}

/// Result over the supported suites, `Uncertain` when they are unknown
fn suite_verdict(report: &ScanReport, matches: impl Fn(&CipherSuite) -> bool) -> TestResult {
    if !report.is_probe_already_executed(ProbeType::CipherSuite) || report.version_suite_pairs.is_none() {
        return TestResult::Uncertain;
    }
    TestResult::from_bool(report.cipher_suites().iter().any(matches))
}

/// Export-grade finite-field DH suites
pub struct LogjamAfterProbe;

impl AfterProbe for LogjamAfterProbe {
    fn name(&self) -> &'static str {
        "logjam"
    }

    fn analyze(&self, report: &mut ScanReport) -> Result<(), ReportError> {
        let result = suite_verdict(report, |s| s.uses_dh() && s.is_export());
        debug!(after_probe = self.name(), result = %result, "After-probe finished");
        report.put_result(AnalyzedProperty::VulnerableToLogjam, result)
    }
}

/// 64-bit block ciphers
pub struct Sweet32AfterProbe;

impl AfterProbe for Sweet32AfterProbe {
    fn name(&self) -> &'static str {
        "sweet32"
    }

    fn analyze(&self, report: &mut ScanReport) -> Result<(), ReportError> {
        let result = suite_verdict(report, CipherSuite::is_64bit_block);
        debug!(after_probe = self.name(), result = %result, "After-probe finished");
        report.put_result(AnalyzedProperty::VulnerableToSweet32, result)
    }
}

pub fn default_after_probes() -> Vec<Box<dyn AfterProbe>> {
    vec![Box::new(LogjamAfterProbe), Box::new(Sweet32AfterProbe)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ProtocolVersion;
    use crate::probes::testing::report_with;

    fn report(suites: Vec<CipherSuite>) -> ScanReport {
        report_with(&[ProtocolVersion::Tls12], vec![(ProtocolVersion::Tls12, suites)], &[])
    }

    #[test]
    fn test_logjam_needs_dh_export() {
        let mut vulnerable = report(vec![CipherSuite(0x002F), CipherSuite(0x0014)]);
        LogjamAfterProbe.analyze(&mut vulnerable).unwrap();
        assert!(vulnerable.is_true(AnalyzedProperty::VulnerableToLogjam));

        // RSA export is not a DH weakness
        let mut rsa_export = report(vec![CipherSuite(0x0008)]);
        LogjamAfterProbe.analyze(&mut rsa_export).unwrap();
        assert!(rsa_export.is_false(AnalyzedProperty::VulnerableToLogjam));
    }

    #[test]
    fn test_sweet32() {
        let mut report = report(vec![CipherSuite(0x000A), CipherSuite(0xC02F)]);
        Sweet32AfterProbe.analyze(&mut report).unwrap();
        assert!(report.is_true(AnalyzedProperty::VulnerableToSweet32));
    }

    #[test]
    fn test_unknown_suites_are_uncertain() {
        let mut report = ScanReport::new("sim.test", 443);
        for after in default_after_probes() {
            after.analyze(&mut report).unwrap();
        }
        assert_eq!(report.get_result(AnalyzedProperty::VulnerableToLogjam), TestResult::Uncertain);
        assert_eq!(report.get_result(AnalyzedProperty::VulnerableToSweet32), TestResult::Uncertain);
    }

    #[test]
    fn test_second_run_is_rejected() {
        let mut report = report(vec![CipherSuite(0x002F)]);
        LogjamAfterProbe.analyze(&mut report).unwrap();
        assert!(LogjamAfterProbe.analyze(&mut report).is_err());
    }
}
