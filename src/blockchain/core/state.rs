use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ChainError;

/// Upper bound on registered validators.
pub const MAX_VALIDATORS: usize = 21;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorRecord {
    pub address: String,
    /// Wei-scale decimal string.
    pub stake: String,
    pub active: bool,
    pub joined_at: i64,
    pub blocks_minted: u64,
}

/// Staking participants keyed by address. Ordered so traversal is deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidatorRegistry {
    records: BTreeMap<String, ValidatorRecord>,
}

impl ValidatorRegistry {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, address: &str) -> Option<&ValidatorRecord> {
        self.records.get(address)
    }

    pub fn records(&self) -> &BTreeMap<String, ValidatorRecord> {
        &self.records
    }

    pub fn is_active(&self, address: &str) -> bool {
        self.records.get(address).is_some_and(|r| r.active)
    }

    /// Active validators in address order.
    pub fn active(&self) -> impl Iterator<Item = &ValidatorRecord> {
        self.records.values().filter(|r| r.active)
    }

    /// Inserts or overwrites `address` as an active validator with a fresh
    /// minted count. A full registry rejects even an overwrite.
    pub fn register(&mut self, address: &str, stake: &str, joined_at: i64) -> Result<(), ChainError> {
        if self.records.len() >= MAX_VALIDATORS {
            return Err(ChainError::CapacityExceeded { limit: MAX_VALIDATORS });
        }
        self.records.insert(
            address.to_string(),
            ValidatorRecord {
                address: address.to_string(),
                stake: stake.to_string(),
                active: true,
                joined_at,
                blocks_minted: 0,
            },
        );
        Ok(())
    }

    pub fn record_mint(&mut self, address: &str) {
        if let Some(record) = self.records.get_mut(address) {
            record.blocks_minted += 1;
        }
    }
}
