//! Configuration for the ledger

use serde::{Deserialize, Serialize};

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Reserve requirements
    pub fees: Fees,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "ledger-core".to_string(),
            fees: Fees::default(),
        }
    }
}

/// Reserve requirements, in drops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fees {
    /// Reserve every account must hold
    pub reserve_base: i64,

    /// Additional reserve per owned object (offers, trust lines)
    pub reserve_increment: i64,
}

impl Default for Fees {
    fn default() -> Self {
        Self {
            reserve_base: 10_000_000,     // 10 XRP
            reserve_increment: 2_000_000, // 2 XRP
        }
    }
}

impl Fees {
    /// Reserve for an account owning `owner_count` objects
    pub fn reserve(&self, owner_count: u32) -> i64 {
        self.reserve_base
            .saturating_add(self.reserve_increment.saturating_mul(i64::from(owner_count)))
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(base) = std::env::var("LEDGER_RESERVE_BASE") {
            config.fees.reserve_base = base
                .parse()
                .map_err(|e| crate::Error::Config(format!("LEDGER_RESERVE_BASE: {}", e)))?;
        }

        if let Ok(increment) = std::env::var("LEDGER_RESERVE_INCREMENT") {
            config.fees.reserve_increment = increment
                .parse()
                .map_err(|e| crate::Error::Config(format!("LEDGER_RESERVE_INCREMENT: {}", e)))?;
        }

        Ok(config)
    }
}
