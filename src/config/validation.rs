// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use validator::Validate;

use super::core::ScannerConfig;

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate_scanner_config(config: &ScannerConfig) -> Result<()> {
        config.validate().context("Configuration validation failed")?;

        Self::validate_target(config)?;
        Self::validate_scheduling(config)?;

        Ok(())
    }

    fn validate_target(config: &ScannerConfig) -> Result<()> {
        if config.host.trim().is_empty() {
            return Err(anyhow::anyhow!("Target host cannot be empty"));
        }

        if config.host.contains("://") {
            return Err(anyhow::anyhow!(
                "Target host must be a host name or address, not a URL: {}",
                config.host
            ));
        }

        Ok(())
    }

    fn validate_scheduling(config: &ScannerConfig) -> Result<()> {
        if let Some(probes) = &config.probes {
            if probes.is_empty() {
                return Err(anyhow::anyhow!("Probe allow-list cannot be empty"));
            }
        }

        if config.scan_timeout_secs == Some(0) {
            return Err(anyhow::anyhow!("Scan timeout must be greater than 0"));
        }

        if config.parallel_probes > config.overall_threads * 8 {
            return Err(anyhow::anyhow!(
                "parallel_probes ({}) is far above overall_threads ({}); probes would only wait on the pool",
                config.parallel_probes,
                config.overall_threads
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProbeType;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ConfigValidator::validate_scanner_config(&ScannerConfig::default()).is_ok());
    }

    #[test]
    fn test_url_host_rejected() {
        let config = ScannerConfig::new("https://example.test", 443);
        assert!(ConfigValidator::validate_scanner_config(&config).is_err());
    }

    #[test]
    fn test_empty_allow_list_rejected() {
        let config = ScannerConfig {
            probes: Some(Vec::<ProbeType>::new()),
            ..ScannerConfig::default()
        };
        assert!(ConfigValidator::validate_scanner_config(&config).is_err());
    }

    #[test]
    fn test_zero_scan_timeout_rejected() {
        let config = ScannerConfig {
            scan_timeout_secs: Some(0),
            ..ScannerConfig::default()
        };
        assert!(ConfigValidator::validate_scanner_config(&config).is_err());
    }
}
