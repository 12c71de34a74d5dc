//! Error types for GYDSchain

use thiserror::Error;

use crate::transaction::validation::ValidationError;

#[derive(Debug, Clone, Error)]
pub enum ChainError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Validator slots full (limit {limit})")]
    CapacityExceeded { limit: usize },
    #[error("Maximum supply reached")]
    SupplyExhausted,
    #[error("Candidate block no longer extends the chain tip")]
    StaleTip,
    #[error("Invalid block: {0}")]
    InvalidBlock(String),
    #[error("Wallet error: {0}")]
    WalletError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
