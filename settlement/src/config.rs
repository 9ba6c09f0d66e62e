//! Configuration for settlement engine

use serde::{Deserialize, Serialize};

/// Settlement engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Flow loop limits
    pub flow: FlowConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "settlement-engine".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            flow: FlowConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Flow loop limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Hard cap on strand execution rounds per payment
    pub max_rounds: usize,

    /// Offers a book step may cross in one execution
    pub max_offers_per_step: usize,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            max_rounds: 2000,
            max_offers_per_step: 1000,
        }
    }
}

impl FlowConfig {
    /// Reject limits that would stop every payment before its first round
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_rounds == 0 {
            return Err(crate::Error::Config("max_rounds must be positive".to_string()));
        }
        if self.max_offers_per_step == 0 {
            return Err(crate::Error::Config(
                "max_offers_per_step must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Collect prometheus metrics
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.flow.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(rounds) = std::env::var("FLOW_MAX_ROUNDS") {
            config.flow.max_rounds = rounds
                .parse()
                .map_err(|e| crate::Error::Config(format!("FLOW_MAX_ROUNDS: {}", e)))?;
        }

        if let Ok(offers) = std::env::var("FLOW_MAX_OFFERS_PER_STEP") {
            config.flow.max_offers_per_step = offers
                .parse()
                .map_err(|e| crate::Error::Config(format!("FLOW_MAX_OFFERS_PER_STEP: {}", e)))?;
        }

        if let Ok(enabled) = std::env::var("SETTLEMENT_METRICS_ENABLED") {
            config.metrics.enabled = enabled.parse().map_err(|e| {
                crate::Error::Config(format!("SETTLEMENT_METRICS_ENABLED: {}", e))
            })?;
        }

        config.flow.validate()?;
        Ok(config)
    }
}
