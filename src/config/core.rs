// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::retry::{ConnectionTimeouts, RetryPolicy};
use crate::types::{ProbeType, ScanDetail};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Scan-wide settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScannerConfig {
    #[validate(length(min = 1, max = 253))]
    pub host: String,

    #[validate(range(min = 1))]
    #[serde(default = "default_port")]
    pub port: u16,

    /// SNI value; defaults to the host when it is a name
    #[serde(default)]
    pub server_name: Option<String>,

    /// Probes allowed to run at the same time
    #[validate(range(min = 1, max = 64))]
    #[serde(default = "default_one")]
    pub parallel_probes: usize,

    /// Size of the shared connection pool
    #[validate(range(min = 1, max = 512))]
    #[serde(default = "default_one")]
    pub overall_threads: usize,

    /// Base response timeout per connection
    #[validate(range(min = 1, max = 600000))]
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Extra handshakes for randomness collection
    #[validate(range(max = 100000))]
    #[serde(default)]
    pub additional_randomness_handshakes: usize,

    #[serde(default)]
    pub scan_detail: ScanDetail,

    /// Executions per task before it is marked failed
    #[validate(range(min = 1, max = 10))]
    #[serde(default = "default_reexecutions")]
    pub reexecutions: u32,

    /// Allow-list of probes; all when absent
    #[serde(default)]
    pub probes: Option<Vec<ProbeType>>,

    /// Pause between successive configuration-search handshakes
    #[serde(default)]
    pub config_search_cooldown_ms: u64,

    /// Stop scheduling new probes after this many seconds
    #[serde(default)]
    pub scan_timeout_secs: Option<u64>,

    /// Also probe DTLS versions
    #[serde(default)]
    pub dtls: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: default_port(),
            server_name: None,
            parallel_probes: default_one(),
            overall_threads: default_one(),
            timeout_ms: default_timeout_ms(),
            additional_randomness_handshakes: 0,
            scan_detail: ScanDetail::default(),
            reexecutions: default_reexecutions(),
            probes: None,
            config_search_cooldown_ms: 0,
            scan_timeout_secs: None,
            dtls: false,
        }
    }
}

impl ScannerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn timeouts(&self) -> ConnectionTimeouts {
        ConnectionTimeouts::uniform(Duration::from_millis(self.timeout_ms))
    }

    /// Policy for ordinary tasks
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_reexecutions(self.reexecutions)
    }

    pub fn scan_timeout(&self) -> Option<Duration> {
        self.scan_timeout_secs.map(Duration::from_secs)
    }

    pub fn config_search_cooldown(&self) -> Duration {
        Duration::from_millis(self.config_search_cooldown_ms)
    }

    pub fn is_probe_enabled(&self, probe: ProbeType) -> bool {
        self.probes.as_ref().map_or(true, |allowed| allowed.contains(&probe))
    }

    /// SNI to send, if any
    pub fn effective_server_name(&self) -> Option<String> {
        if self.server_name.is_some() {
            return self.server_name.clone();
        }
        let is_address = self.host.parse::<std::net::IpAddr>().is_ok();
        (!is_address).then(|| self.host.clone())
    }
}

fn default_port() -> u16 {
    443
}

fn default_one() -> usize {
    1
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_reexecutions() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScannerConfig::default();
        assert_eq!(config.parallel_probes, 1);
        assert_eq!(config.overall_threads, 1);
        assert_eq!(config.timeout_ms, 1000);
        assert_eq!(config.additional_randomness_handshakes, 0);
        assert_eq!(config.scan_detail, ScanDetail::Normal);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_values_fail_validation() {
        let config = ScannerConfig {
            overall_threads: 0,
            ..ScannerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_probe_allow_list() {
        let config = ScannerConfig {
            probes: Some(vec![ProbeType::ProtocolVersion]),
            ..ScannerConfig::default()
        };
        assert!(config.is_probe_enabled(ProbeType::ProtocolVersion));
        assert!(!config.is_probe_enabled(ProbeType::Heartbleed));
    }

    #[test]
    fn test_server_name_not_sent_for_addresses() {
        assert_eq!(ScannerConfig::new("10.0.0.1", 443).effective_server_name(), None);
        assert_eq!(
            ScannerConfig::new("example.test", 443).effective_server_name(),
            Some("example.test".to_string())
        );
    }
}
