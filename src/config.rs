//! Runtime Configuration
//!
//! Engine bootstrap and mirror settings, loadable from JSON. Every field
//! has a default, so a partial file is enough.

use std::path::Path;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::rules::MODULE_NAME;
use crate::game::state::GameState;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("config read failed: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid JSON for this schema.
    #[error("config parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    /// Network hash is not 32 bytes of hex.
    #[error("invalid network hash: {0}")]
    InvalidNetworkHash(String),
}

/// Authoritative engine bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Loot batches placed at genesis (two loots each).
    pub genesis_loot_batches: u64,
    /// Genesis network hash, hex.
    pub network_hash: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            genesis_loot_batches: 5,
            network_hash: hex::encode([0u8; 32]),
        }
    }
}

impl EngineConfig {
    /// Decoded network hash.
    pub fn network_hash_bytes(&self) -> Result<[u8; 32], ConfigError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&self.network_hash, &mut bytes)
            .map_err(|e| ConfigError::InvalidNetworkHash(e.to_string()))?;
        Ok(bytes)
    }

    /// Genesis state described by this config.
    pub fn genesis_state(&self) -> Result<GameState, ConfigError> {
        Ok(GameState::genesis(&self.network_hash_bytes()?, self.genesis_loot_batches))
    }
}

/// Mirror settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Module name method ids are derived from.
    pub module_name: String,
    /// Most players a resync will walk before giving up.
    pub max_ring_walk: usize,
    /// Command queue depth for the async driver.
    pub channel_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            module_name: MODULE_NAME.to_string(),
            max_ring_walk: 10_000,
            channel_capacity: 64,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PiratesConfig {
    /// Engine section
    pub engine: EngineConfig,
    /// Mirror section
    pub sync: SyncConfig,
}

impl PiratesConfig {
    /// Parse from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.engine.network_hash_bytes()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PiratesConfig::default();
        assert_eq!(config.sync.module_name, "PiratesLogic");
        assert_eq!(config.engine.network_hash_bytes().unwrap(), [0u8; 32]);
        assert_eq!(config.engine.genesis_state().unwrap().loot_top(), 10);
    }

    #[test]
    fn test_partial_json() {
        let config = PiratesConfig::from_json_str(
            r#"{ "engine": { "genesis_loot_batches": 2 }, "sync": { "max_ring_walk": 5 } }"#,
        )
        .unwrap();
        assert_eq!(config.engine.genesis_loot_batches, 2);
        assert_eq!(config.sync.max_ring_walk, 5);
        assert_eq!(config.sync.channel_capacity, 64);
    }

    #[test]
    fn test_rejects_bad_hash() {
        let err = PiratesConfig::from_json_str(r#"{ "engine": { "network_hash": "abc" } }"#);
        assert!(matches!(err, Err(ConfigError::InvalidNetworkHash(_))));

        assert!(matches!(PiratesConfig::from_json_str("{"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            PiratesConfig::from_json_file("/nonexistent/pirates.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let config = PiratesConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert_eq!(PiratesConfig::from_json_str(&json).unwrap(), config);
    }
}
