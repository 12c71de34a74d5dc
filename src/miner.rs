//! Proof-of-work block production

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::blockchain::{Block, BlockType, Ledger};
use crate::error::ChainError;

/// How many nonces are tried between checks of the stop flag.
const STOP_CHECK_INTERVAL: u64 = 4096;

/// Result of one production cycle. Only `Committed` changes the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Committed(Block),
    Disabled,
    SupplyExhausted,
    NoValidator,
    StaleTip,
    Cancelled,
    Rejected(String),
}

impl CycleOutcome {
    pub fn from_commit(result: Result<Block, ChainError>) -> Self {
        match result {
            Ok(block) => CycleOutcome::Committed(block),
            Err(ChainError::SupplyExhausted) => CycleOutcome::SupplyExhausted,
            Err(ChainError::StaleTip) => CycleOutcome::StaleTip,
            Err(e) => CycleOutcome::Rejected(e.to_string()),
        }
    }

    pub fn block(&self) -> Option<&Block> {
        match self {
            CycleOutcome::Committed(block) => Some(block),
            _ => None,
        }
    }
}

/// How a nonce search ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Search {
    Found(Block),
    /// The chain tip no longer matches the candidate's parent.
    TipMoved,
    Stopped,
}

/// Searches nonces from zero until the block hash meets its difficulty.
/// Every `STOP_CHECK_INTERVAL` nonces the stop flag and `tip_moved` are
/// consulted so a stale or cancelled search ends early.
pub fn mine_block(mut block: Block, stop: &AtomicBool, tip_moved: impl Fn(&Block) -> bool) -> Search {
    block.nonce = 0;
    loop {
        if block.nonce % STOP_CHECK_INTERVAL == 0 {
            if stop.load(Ordering::Relaxed) {
                return Search::Stopped;
            }
            if tip_moved(&block) {
                return Search::TipMoved;
            }
        }
        block.hash = block.calculate_hash();
        if block.meets_difficulty() {
            return Search::Found(block);
        }
        block.nonce = block.nonce.wrapping_add(1);
    }
}

pub struct Miner {
    ledger: Ledger,
    address: String,
    stop: Arc<AtomicBool>,
}

impl Miner {
    pub fn new(ledger: Ledger, address: String) -> Self {
        Self {
            ledger,
            address,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Flag that interrupts an in-flight nonce search once raised.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Snapshot of the tip and current difficulty, taken under the read lock.
    /// `None` once the supply cap is reached.
    pub fn assemble(&self) -> Option<Block> {
        self.ledger.read(|state| {
            if state.supply_exhausted() {
                return None;
            }
            let mut candidate = Block::candidate(
                state.tip(),
                chrono::Utc::now().timestamp(),
                BlockType::Pow,
                state.params().block_reward,
            );
            candidate.difficulty = state.difficulty();
            candidate.miner = self.address.clone();
            Some(candidate)
        })
    }

    fn tip_moved(&self, candidate: &Block) -> bool {
        self.ledger.read(|state| state.tip().hash != candidate.previous_hash)
    }

    /// Assemble, search outside any lock, then commit under the write lock.
    /// When the other producer extends the chain first, the candidate is
    /// rebuilt on the new tip and the search restarts, so a cycle only ends
    /// without a block on the supply cap or on shutdown.
    pub fn run_cycle(&self) -> CycleOutcome {
        if !self.ledger.read(|state| state.config().pow_enabled) {
            return CycleOutcome::Disabled;
        }

        loop {
            let Some(candidate) = self.assemble() else {
                debug!("Supply cap reached; skipping PoW cycle");
                return CycleOutcome::SupplyExhausted;
            };

            let index = candidate.index;
            let mined = match mine_block(candidate, &self.stop, |c| self.tip_moved(c)) {
                Search::Found(block) => block,
                Search::TipMoved => {
                    debug!(index, "Tip moved during nonce search; rebuilding candidate");
                    continue;
                }
                Search::Stopped => {
                    debug!(index, "Nonce search cancelled");
                    return CycleOutcome::Cancelled;
                }
            };

            let outcome = CycleOutcome::from_commit(self.ledger.commit(mined));
            match &outcome {
                CycleOutcome::Committed(block) => info!(
                    index = block.index,
                    nonce = block.nonce,
                    txs = block.transactions.len(),
                    "⛏️  PoW block mined by {}",
                    short(&self.address)
                ),
                CycleOutcome::StaleTip => {
                    debug!(index, "Tip moved before commit; rebuilding candidate");
                    continue;
                }
                CycleOutcome::Rejected(reason) => warn!(index, "Mined block rejected: {}", reason),
                _ => {}
            }
            return outcome;
        }
    }
}

pub(crate) fn short(address: &str) -> &str {
    address.get(..10).unwrap_or(address)
}
