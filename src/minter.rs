//! Proof-of-stake block production

use primitive_types::U256;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::blockchain::{Block, BlockType, Ledger, LedgerState, ValidatorRegistry};
use crate::miner::{short, CycleOutcome};
use crate::transaction::validation::parse_decimal;

/// Stake-weighted pick among active validators, deterministic in
/// `(previous_hash, index)`. Validators are walked in address order and the
/// first whose cumulative stake exceeds `seed mod total_stake` wins.
pub fn select_validator(registry: &ValidatorRegistry, previous_hash: &str, index: u64) -> Option<String> {
    let weighted: Vec<(&str, U256)> = registry
        .active()
        .map(|r| (r.address.as_str(), parse_decimal(&r.stake).unwrap_or_default()))
        .filter(|(_, stake)| !stake.is_zero())
        .collect();

    let total = weighted
        .iter()
        .try_fold(U256::zero(), |acc, (_, stake)| acc.checked_add(*stake))?;
    if total.is_zero() {
        return None;
    }

    let mut hasher = Sha256::new();
    hasher.update(previous_hash.as_bytes());
    hasher.update(index.to_be_bytes());
    let target = U256::from_big_endian(&hasher.finalize()) % total;

    let mut cumulative = U256::zero();
    for (address, stake) in weighted {
        cumulative += stake;
        if cumulative > target {
            return Some(address.to_string());
        }
    }
    None
}

pub struct Minter {
    ledger: Ledger,
}

impl Minter {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    /// Selection, block construction and commit all happen under one write
    /// lock; there is no search to keep outside it.
    pub fn run_cycle(&self) -> CycleOutcome {
        let outcome = self.ledger.write(mint);
        match &outcome {
            CycleOutcome::Committed(block) => info!(
                index = block.index,
                txs = block.transactions.len(),
                "🗳️  PoS block minted by validator {}",
                short(&block.validator)
            ),
            CycleOutcome::SupplyExhausted => debug!("Supply cap reached; skipping PoS cycle"),
            CycleOutcome::NoValidator => debug!("No active validator; skipping PoS cycle"),
            CycleOutcome::Rejected(reason) => warn!("Minted block rejected: {}", reason),
            _ => {}
        }
        outcome
    }
}

fn mint(state: &mut LedgerState) -> CycleOutcome {
    if !state.config().pos_enabled {
        return CycleOutcome::Disabled;
    }
    if state.supply_exhausted() {
        return CycleOutcome::SupplyExhausted;
    }

    let tip = state.tip();
    let Some(validator) = select_validator(state.validators(), &tip.hash, tip.index + 1) else {
        return CycleOutcome::NoValidator;
    };

    let mut block = Block::candidate(
        tip,
        chrono::Utc::now().timestamp(),
        BlockType::Pos,
        state.params().stake_reward,
    );
    block.validator = validator;
    block.hash = block.calculate_hash();

    CycleOutcome::from_commit(state.commit(block))
}
