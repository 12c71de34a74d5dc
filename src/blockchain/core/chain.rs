use parking_lot::RwLock;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{ChainConfig, ChainParams};
use crate::crypto::hash_to_u256;
use crate::difficulty;
use crate::error::{ChainError, Result};
use crate::transaction::validation::{parse_decimal, validate_transaction};
use crate::transaction::Transaction;

use super::state::{ValidatorRecord, ValidatorRegistry};
use super::validation::validate_block;

pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const GENESIS_MINER: &str = "genesis";

/// Each `bits` step of the target is this many difficulty units.
pub const DIFFICULTY_UNITS_PER_BIT: u64 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BlockType {
    Genesis,
    Pow,
    Pos,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    pub timestamp: i64,
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    pub hash: String,
    pub nonce: u64,
    pub difficulty: u64,
    pub miner: String,
    pub validator: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    /// Wei-scale decimal string.
    pub reward: String,
}

impl Block {
    pub fn genesis(timestamp: i64, difficulty: u64) -> Self {
        let mut block = Block {
            index: 0,
            timestamp,
            transactions: Vec::new(),
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            hash: String::new(),
            nonce: 0,
            difficulty,
            miner: GENESIS_MINER.to_string(),
            validator: String::new(),
            block_type: BlockType::Genesis,
            reward: "0".to_string(),
        };
        block.hash = block.calculate_hash();
        block
    }

    /// Unsealed successor of `tip`; the caller fills in the producer and seals the hash.
    ///
    /// The timestamp is at least `tip.timestamp + 1`. Blocks produced in a burst
    /// therefore sit one second apart, ahead of the wall clock, and the next
    /// retarget sees them as fast blocks and raises difficulty.
    pub fn candidate(tip: &Block, timestamp: i64, block_type: BlockType, reward: U256) -> Self {
        Block {
            index: tip.index + 1,
            timestamp: timestamp.max(tip.timestamp + 1),
            transactions: Vec::new(),
            previous_hash: tip.hash.clone(),
            hash: String::new(),
            nonce: 0,
            difficulty: 0,
            miner: String::new(),
            validator: String::new(),
            block_type,
            reward: reward.to_string(),
        }
    }

    /// SHA-256 over index, timestamp, previous hash, nonce, miner, validator and
    /// difficulty. The transaction list is not part of the input.
    pub fn calculate_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.index.to_string().as_bytes());
        hasher.update(self.timestamp.to_string().as_bytes());
        hasher.update(self.previous_hash.as_bytes());
        hasher.update(self.nonce.to_string().as_bytes());
        hasher.update(self.miner.as_bytes());
        hasher.update(self.validator.as_bytes());
        hasher.update(self.difficulty.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn meets_difficulty(&self) -> bool {
        hash_meets_difficulty(&self.hash, self.difficulty)
    }

    pub fn reward_wei(&self) -> Option<U256> {
        parse_decimal(&self.reward)
    }
}

/// True when `hash` read as a 256-bit integer is below `2^(256 - difficulty / 4096)`.
pub fn hash_meets_difficulty(hash: &str, difficulty: u64) -> bool {
    let bits = difficulty / DIFFICULTY_UNITS_PER_BIT;
    if bits > 256 {
        return false;
    }
    match hash_to_u256(hash) {
        Ok(value) => u64::from(value.leading_zeros()) >= bits,
        Err(_) => false,
    }
}

/// Point-in-time aggregate served by `/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStats {
    pub block_height: u64,
    pub total_supply: String,
    pub max_supply: String,
    pub validators: usize,
    pub pending_txs: usize,
    pub difficulty: u64,
    #[serde(rename = "lastPOWBlock")]
    pub last_pow_block: u64,
    #[serde(rename = "lastPOSBlock")]
    pub last_pos_block: u64,
    pub node_address: String,
}

/// The whole ledger aggregate. Only reachable through a [`Ledger`] handle.
#[derive(Debug)]
pub struct LedgerState {
    blocks: Vec<Block>,
    pending: Vec<Transaction>,
    validators: ValidatorRegistry,
    total_supply: U256,
    difficulty: u64,
    last_pow_block: u64,
    last_pos_block: u64,
    config: ChainConfig,
    params: ChainParams,
}

impl LedgerState {
    pub fn new(config: ChainConfig) -> Result<Self> {
        config.validate()?;
        let params = config.params()?;
        let genesis = Block::genesis(chrono::Utc::now().timestamp(), config.initial_difficulty);

        Ok(LedgerState {
            blocks: vec![genesis],
            pending: Vec::new(),
            validators: ValidatorRegistry::default(),
            total_supply: U256::zero(),
            difficulty: config.initial_difficulty,
            last_pow_block: 0,
            last_pos_block: 0,
            config,
            params,
        })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn tip(&self) -> &Block {
        // genesis is pushed in `new` and blocks are never removed
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn validators(&self) -> &ValidatorRegistry {
        &self.validators
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    pub fn difficulty(&self) -> u64 {
        self.difficulty
    }

    pub fn last_pow_block(&self) -> u64 {
        self.last_pow_block
    }

    pub fn last_pos_block(&self) -> u64 {
        self.last_pos_block
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn supply_exhausted(&self) -> bool {
        self.total_supply >= self.params.max_supply
    }

    pub fn stats(&self, node_address: &str) -> ChainStats {
        ChainStats {
            block_height: self.tip().index,
            total_supply: self.total_supply.to_string(),
            max_supply: self.config.max_supply.clone(),
            validators: self.validators.len(),
            pending_txs: self.pending.len(),
            difficulty: self.difficulty,
            last_pow_block: self.last_pow_block,
            last_pos_block: self.last_pos_block,
            node_address: node_address.to_string(),
        }
    }

    /// Tail push. Clears the pending queue, moves the last-PoW/PoS marker and
    /// credits the reward. Inputs are validated by the producer beforehand.
    pub fn append_block(&mut self, block: Block) {
        match block.block_type {
            BlockType::Pow => self.last_pow_block = block.index,
            BlockType::Pos => self.last_pos_block = block.index,
            BlockType::Genesis => {}
        }
        let reward = block.reward_wei().unwrap_or_default();
        self.total_supply = self.total_supply.saturating_add(reward);
        self.blocks.push(block);
        self.pending.clear();
    }

    /// Appends in arrival order; no duplicate or per-sender nonce tracking.
    pub fn enqueue_transaction(&mut self, tx: Transaction) {
        self.pending.push(tx);
    }

    pub fn register_validator(&mut self, address: &str, stake: &str, joined_at: i64) -> Result<()> {
        self.validators.register(address, stake, joined_at)
    }

    /// Validated append used by both producers. The candidate must extend the
    /// current tip; it receives the entire pending queue.
    pub fn commit(&mut self, mut block: Block) -> Result<Block> {
        if self.supply_exhausted() {
            return Err(ChainError::SupplyExhausted);
        }
        if block.previous_hash != self.tip().hash {
            return Err(ChainError::StaleTip);
        }
        validate_block(&block, self.tip())?;

        if block.block_type == BlockType::Pow && block.difficulty != self.difficulty {
            return Err(ChainError::InvalidBlock(format!(
                "difficulty {} does not match current difficulty {}",
                block.difficulty, self.difficulty
            )));
        }
        if block.block_type == BlockType::Pos && !self.validators.is_active(&block.validator) {
            return Err(ChainError::InvalidBlock(format!(
                "validator {} is not an active registry member",
                block.validator
            )));
        }

        block.transactions = std::mem::take(&mut self.pending);
        self.append_block(block.clone());

        match block.block_type {
            BlockType::Pow if block.index % difficulty::RETARGET_INTERVAL == 0 => {
                self.difficulty = difficulty::retarget(
                    &self.blocks,
                    self.difficulty,
                    self.config.block_time,
                    self.config.min_difficulty,
                );
            }
            BlockType::Pos => self.validators.record_mint(&block.validator),
            _ => {}
        }

        Ok(block)
    }
}

/// Cloneable handle to the single reader/writer-locked [`LedgerState`].
#[derive(Clone)]
pub struct Ledger {
    state: Arc<RwLock<LedgerState>>,
}

impl Ledger {
    pub fn new(config: ChainConfig) -> Result<Self> {
        Ok(Ledger {
            state: Arc::new(RwLock::new(LedgerState::new(config)?)),
        })
    }

    /// Runs `f` under the shared lock.
    pub fn read<R>(&self, f: impl FnOnce(&LedgerState) -> R) -> R {
        f(&self.state.read())
    }

    /// Runs `f` under the exclusive lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut LedgerState) -> R) -> R {
        f(&mut self.state.write())
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.read(|s| s.blocks.clone())
    }

    pub fn block(&self, index: u64) -> Option<Block> {
        self.read(|s| s.blocks.get(usize::try_from(index).ok()?).cloned())
    }

    pub fn tip(&self) -> Block {
        self.read(|s| s.tip().clone())
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.read(|s| s.pending.clone())
    }

    pub fn validators(&self) -> BTreeMap<String, ValidatorRecord> {
        self.read(|s| s.validators.records().clone())
    }

    pub fn total_supply(&self) -> U256 {
        self.read(|s| s.total_supply)
    }

    pub fn difficulty(&self) -> u64 {
        self.read(|s| s.difficulty)
    }

    pub fn stats(&self, node_address: &str) -> ChainStats {
        self.read(|s| s.stats(node_address))
    }

    pub fn chain_config(&self) -> ChainConfig {
        self.read(|s| s.config.clone())
    }

    /// Transaction admission against the configured maximum supply.
    pub fn admit(&self, tx: &Transaction) -> Result<()> {
        let max_supply = self.read(|s| s.params.max_supply);
        validate_transaction(tx, max_supply)?;
        Ok(())
    }

    /// Stamps the admission time and queues the transaction.
    pub fn enqueue_transaction(&self, mut tx: Transaction) -> Transaction {
        tx.timestamp = chrono::Utc::now().timestamp();
        self.write(|s| s.enqueue_transaction(tx.clone()));
        tx
    }

    pub fn register_validator(&self, address: &str, stake: &str) -> Result<()> {
        let joined_at = chrono::Utc::now().timestamp();
        self.write(|s| s.register_validator(address, stake, joined_at))
    }

    pub fn commit(&self, block: Block) -> Result<Block> {
        self.write(|s| s.commit(block))
    }
}
