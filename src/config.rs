//! Configuration management for GYDSchain

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ChainError, Result};
use crate::transaction::validation::validate_address;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub node: NodeConfig,
}

/// Static-after-init chain parameters. Wei-scale amounts are decimal strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_chain_id")]
    pub network_id: u64,
    #[serde(default = "default_chain_name")]
    pub chain_name: String,
    #[serde(default = "default_max_supply", rename = "maximumSupply")]
    pub max_supply: String,
    #[serde(default = "default_block_time")]
    pub block_time: u64,
    #[serde(default = "default_enabled")]
    pub pow_enabled: bool,
    #[serde(default = "default_enabled")]
    pub pos_enabled: bool,
    #[serde(default = "default_block_reward")]
    pub block_reward: String,
    #[serde(default = "default_stake_reward")]
    pub stake_reward: String,
    #[serde(default = "default_initial_difficulty")]
    pub initial_difficulty: u64,
    #[serde(default = "default_min_difficulty")]
    pub min_difficulty: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            network_id: default_chain_id(),
            chain_name: default_chain_name(),
            max_supply: default_max_supply(),
            block_time: default_block_time(),
            pow_enabled: default_enabled(),
            pos_enabled: default_enabled(),
            block_reward: default_block_reward(),
            stake_reward: default_stake_reward(),
            initial_difficulty: default_initial_difficulty(),
            min_difficulty: default_min_difficulty(),
        }
    }
}

/// Chain parameters with every decimal string parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainParams {
    pub max_supply: U256,
    pub block_reward: U256,
    pub stake_reward: U256,
}

impl ChainConfig {
    pub fn params(&self) -> Result<ChainParams> {
        Ok(ChainParams {
            max_supply: parse_wei("maximumSupply", &self.max_supply)?,
            block_reward: parse_wei("blockReward", &self.block_reward)?,
            stake_reward: parse_wei("stakeReward", &self.stake_reward)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        let params = self.params()?;
        if params.max_supply.is_zero() {
            return Err(ChainError::ConfigError(
                "maximumSupply must be greater than zero".to_string(),
            ));
        }
        if self.block_time == 0 {
            return Err(ChainError::ConfigError(
                "blockTime must be at least one second".to_string(),
            ));
        }
        if self.min_difficulty > self.initial_difficulty {
            return Err(ChainError::ConfigError(format!(
                "minDifficulty {} exceeds initialDifficulty {}",
                self.min_difficulty, self.initial_difficulty
            )));
        }
        if self.min_difficulty < self.initial_difficulty / 4 {
            return Err(ChainError::ConfigError(format!(
                "minDifficulty {} is below a quarter of initialDifficulty {}",
                self.min_difficulty, self.initial_difficulty
            )));
        }
        Ok(())
    }
}

fn parse_wei(field: &str, value: &str) -> Result<U256> {
    U256::from_dec_str(value)
        .map_err(|_| ChainError::ConfigError(format!("{} is not a decimal integer: {}", field, value)))
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Producer address; generated at startup when absent.
    #[serde(default)]
    pub address: Option<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            address: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.chain.validate()?;
        if let Some(address) = &self.node.address {
            validate_address(address)
                .map_err(|e| ChainError::ConfigError(format!("node.address: {}", e)))?;
        }
        Ok(())
    }
}

/// Load the node configuration. A missing file yields the default chain parameters;
/// the `PORT` environment variable overrides `node.api_port`.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    let mut config: Config = if path.exists() {
        let config_str = fs::read_to_string(path)?;
        toml::from_str(&config_str)?
    } else {
        Config::default()
    };

    apply_port_override(&mut config, std::env::var("PORT").ok().as_deref());

    config.validate()?;
    Ok(config)
}

/// A parseable `PORT` value replaces `node.api_port`; anything else is ignored.
fn apply_port_override(config: &mut Config, port: Option<&str>) {
    if let Some(port) = port.and_then(|p| p.parse::<u16>().ok()) {
        config.node.api_port = port;
    }
}

fn default_chain_id() -> u64 {
    9125
}

fn default_chain_name() -> String {
    "GYDSchain".to_string()
}

fn default_max_supply() -> String {
    "100000000000000000000000000".to_string()
}

fn default_block_time() -> u64 {
    120
}

fn default_enabled() -> bool {
    true
}

fn default_block_reward() -> String {
    "3000000000000000000".to_string()
}

fn default_stake_reward() -> String {
    "1000000000000000000".to_string()
}

fn default_initial_difficulty() -> u64 {
    0x20000
}

fn default_min_difficulty() -> u64 {
    0x10000
}

fn default_api_port() -> u16 {
    8545
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        let params = config.chain.params().unwrap();
        assert_eq!(params.block_reward, U256::exp10(18) * 3);
        assert_eq!(params.max_supply, U256::exp10(26));
    }

    #[test]
    fn test_floor_below_quarter_rejected() {
        let chain = ChainConfig {
            initial_difficulty: 0x20000,
            min_difficulty: 0x20000 / 4 - 1,
            ..ChainConfig::default()
        };
        assert!(matches!(chain.validate(), Err(ChainError::ConfigError(_))));
    }

    #[test]
    fn test_floor_above_initial_rejected() {
        let chain = ChainConfig {
            initial_difficulty: 4096,
            min_difficulty: 8192,
            ..ChainConfig::default()
        };
        assert!(chain.validate().is_err());
    }

    #[test]
    fn test_non_decimal_reward_rejected() {
        let chain = ChainConfig {
            block_reward: "3e18".to_string(),
            ..ChainConfig::default()
        };
        assert!(chain.params().is_err());
    }

    #[test]
    fn test_port_override() {
        let mut config = Config::default();
        apply_port_override(&mut config, None);
        assert_eq!(config.node.api_port, 8545);
        apply_port_override(&mut config, Some("not-a-port"));
        assert_eq!(config.node.api_port, 8545);
        apply_port_override(&mut config, Some("3000"));
        assert_eq!(config.node.api_port, 3000);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [chain]
            blockTime = 5
            posEnabled = false

            [node]
            api_port = 9000
            "#,
        )
        .unwrap();
        assert_eq!(config.chain.block_time, 5);
        assert!(!config.chain.pos_enabled);
        assert!(config.chain.pow_enabled);
        assert_eq!(config.chain.chain_id, 9125);
        assert_eq!(config.node.api_port, 9000);
    }
}
