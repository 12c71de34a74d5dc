use crate::error::ChainError;
use crate::transaction::validation::validate_address;

use super::chain::{Block, BlockType};

/// Structural checks of `block` as the successor of `previous`.
pub fn validate_block(block: &Block, previous: &Block) -> Result<(), ChainError> {
    if block.index != previous.index + 1 {
        return Err(ChainError::InvalidBlock(format!(
            "Invalid block index. Expected {}, but got {}.",
            previous.index + 1,
            block.index
        )));
    }

    if block.previous_hash != previous.hash {
        return Err(ChainError::InvalidBlock(format!(
            "Invalid previous hash. Expected {}, but got {}.",
            previous.hash, block.previous_hash
        )));
    }

    if block.timestamp <= previous.timestamp {
        return Err(ChainError::InvalidBlock(
            "Block timestamp must be after previous block".to_string(),
        ));
    }

    match block.block_type {
        BlockType::Genesis => {
            return Err(ChainError::InvalidBlock(
                "Genesis block can only start the chain".to_string(),
            ))
        }
        BlockType::Pow => {
            validate_address(&block.miner)
                .map_err(|e| ChainError::InvalidBlock(format!("invalid miner address: {}", e)))?;
        }
        BlockType::Pos => {
            validate_address(&block.validator)
                .map_err(|e| ChainError::InvalidBlock(format!("invalid validator address: {}", e)))?;
        }
    }

    if block.reward_wei().is_none() {
        return Err(ChainError::InvalidBlock(format!("Invalid reward {}", block.reward)));
    }

    if block.hash != block.calculate_hash() {
        return Err(ChainError::InvalidBlock("Block hash does not match contents".to_string()));
    }

    if block.block_type == BlockType::Pow && !block.meets_difficulty() {
        return Err(ChainError::InvalidBlock(
            "Invalid Proof-of-Work: Block hash does not meet difficulty target.".to_string(),
        ));
    }

    Ok(())
}

/// Linkage of a whole block sequence starting at genesis.
pub fn validate_chain(blocks: &[Block]) -> Result<(), ChainError> {
    let genesis = blocks
        .first()
        .ok_or_else(|| ChainError::InvalidBlock("Chain is empty".to_string()))?;
    if genesis.index != 0 || genesis.block_type != BlockType::Genesis {
        return Err(ChainError::InvalidBlock("Chain must start with a genesis block".to_string()));
    }
    for pair in blocks.windows(2) {
        validate_block(&pair[1], &pair[0])?;
    }
    Ok(())
}
