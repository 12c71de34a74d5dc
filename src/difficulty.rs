//! Two-sided PoW retarget, run every tenth PoW block.

use crate::blockchain::Block;

pub const RETARGET_INTERVAL: u64 = 10;

/// Compares the time spanned by the last ten blocks against `block_time * 10`.
/// Under half the expected time doubles `current`, over twice the expected time
/// halves it, anything in between keeps it. The result is clamped to `floor`.
/// With fewer than ten blocks `current` is returned unchanged.
pub fn retarget(blocks: &[Block], current: u64, block_time: u64, floor: u64) -> u64 {
    let window = RETARGET_INTERVAL as usize;
    if blocks.len() < window {
        return current;
    }

    let tip = &blocks[blocks.len() - 1];
    let first = &blocks[blocks.len() - window];
    let actual_time = tip.timestamp - first.timestamp;
    let expected_time = i64::try_from(block_time.saturating_mul(RETARGET_INTERVAL)).unwrap_or(i64::MAX);

    let next = if actual_time < expected_time / 2 {
        current.saturating_mul(2)
    } else if actual_time > expected_time.saturating_mul(2) {
        current / 2
    } else {
        current
    };

    next.max(floor)
}
