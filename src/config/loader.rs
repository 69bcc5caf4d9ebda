// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::core::ScannerConfig;
use super::validation::ConfigValidator;

/// Reads a [`ScannerConfig`] from disk and applies `LONKERO_TLS_*` overrides
pub struct ConfigLoader {
    config_path: PathBuf,
    format: ConfigFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigLoader {
    pub fn new<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref().to_path_buf();
        let format = Self::detect_format(&path)?;

        Ok(Self {
            config_path: path,
            format,
        })
    }

    pub fn with_format<P: AsRef<Path>>(config_path: P, format: ConfigFormat) -> Result<Self> {
        Ok(Self {
            config_path: config_path.as_ref().to_path_buf(),
            format,
        })
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| anyhow::anyhow!("Could not determine config file format"))?;

        match extension {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(anyhow::anyhow!("Unsupported config file format: {}", extension)),
        }
    }

    pub fn load_config(&self) -> Result<ScannerConfig> {
        let content = std::fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file: {:?}", self.config_path))?;

        let mut config = self.parse(&content)?;
        Self::apply_env_overrides(&mut config)?;
        ConfigValidator::validate_scanner_config(&config)?;

        Ok(config)
    }

    fn parse(&self, content: &str) -> Result<ScannerConfig> {
        let config = match self.format {
            ConfigFormat::Yaml => serde_yaml::from_str(content).context("Failed to parse YAML config")?,
            ConfigFormat::Toml => toml::from_str(content).context("Failed to parse TOML config")?,
            ConfigFormat::Json => serde_json::from_str(content).context("Failed to parse JSON config")?,
        };
        Ok(config)
    }

    pub fn apply_env_overrides(config: &mut ScannerConfig) -> Result<()> {
        if let Ok(host) = std::env::var("LONKERO_TLS_HOST") {
            config.host = host;
        }

        if let Ok(port) = std::env::var("LONKERO_TLS_PORT") {
            config.port = port.parse().context("Invalid LONKERO_TLS_PORT")?;
        }

        if let Ok(threads) = std::env::var("LONKERO_TLS_THREADS") {
            config.overall_threads = threads.parse().context("Invalid LONKERO_TLS_THREADS")?;
        }

        if let Ok(parallel) = std::env::var("LONKERO_TLS_PARALLEL_PROBES") {
            config.parallel_probes = parallel.parse().context("Invalid LONKERO_TLS_PARALLEL_PROBES")?;
        }

        if let Ok(timeout) = std::env::var("LONKERO_TLS_TIMEOUT_MS") {
            config.timeout_ms = timeout.parse().context("Invalid LONKERO_TLS_TIMEOUT_MS")?;
        }

        if let Ok(detail) = std::env::var("LONKERO_TLS_SCAN_DETAIL") {
            config.scan_detail = detail
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("Invalid LONKERO_TLS_SCAN_DETAIL")?;
        }

        Ok(())
    }

    pub fn save_config(&self, config: &ScannerConfig) -> Result<()> {
        let content = match self.format {
            ConfigFormat::Yaml => serde_yaml::to_string(config).context("Failed to serialize YAML config")?,
            ConfigFormat::Toml => toml::to_string_pretty(config).context("Failed to serialize TOML config")?,
            ConfigFormat::Json => {
                serde_json::to_string_pretty(config).context("Failed to serialize JSON config")?
            }
        };

        std::fs::write(&self.config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", self.config_path))?;

        Ok(())
    }
}
