//! End-to-end ledger behaviour: production cycles, supply cap, linkage,
//! concurrent readers and config loading.

use primitive_types::U256;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use gydschain::blockchain::{validate_chain, BlockType, Ledger, GENESIS_PREVIOUS_HASH};
use gydschain::config::{load_config, ChainConfig};
use gydschain::miner::{CycleOutcome, Miner};
use gydschain::minter::Minter;
use gydschain::transaction::Transaction;

const MINER: &str = "0x00000000000000000000000000000000000000aa";

fn addr(i: usize) -> String {
    format!("0x{:040x}", i)
}

fn easy_config() -> ChainConfig {
    ChainConfig {
        initial_difficulty: 0,
        min_difficulty: 0,
        ..ChainConfig::default()
    }
}

fn transfer(nonce: i64) -> Transaction {
    let mut tx = Transaction::new(&addr(1), &addr(2), "1000", 21000, "1000000000", nonce);
    tx.hash = tx.compute_hash();
    tx
}

#[test]
fn test_first_pow_block_drains_queue() {
    let ledger = Ledger::new(ChainConfig {
        initial_difficulty: 4096,
        min_difficulty: 4096,
        ..ChainConfig::default()
    })
    .unwrap();
    let genesis = ledger.tip();
    assert_eq!(genesis.previous_hash, GENESIS_PREVIOUS_HASH);

    let tx = transfer(0);
    ledger.admit(&tx).unwrap();
    ledger.enqueue_transaction(tx);
    assert_eq!(ledger.pending_transactions().len(), 1);

    let miner = Miner::new(ledger.clone(), MINER.to_string());
    let block = miner.run_cycle().block().cloned().expect("block mined");

    assert_eq!(block.index, 1);
    assert_eq!(block.block_type, BlockType::Pow);
    assert_eq!(block.previous_hash, genesis.hash);
    assert_eq!(block.miner, MINER);
    assert_eq!(block.transactions.len(), 1);
    assert!(block.meets_difficulty());
    assert!(ledger.pending_transactions().is_empty());
    assert_eq!(ledger.total_supply(), U256::from_dec_str("3000000000000000000").unwrap());

    let stats = ledger.stats(MINER);
    assert_eq!(stats.block_height, 1);
    assert_eq!(stats.last_pow_block, 1);
}

#[test]
fn test_supply_cap_stops_production() {
    let ledger = Ledger::new(ChainConfig {
        max_supply: "6000000000000000000".to_string(),
        ..easy_config()
    })
    .unwrap();
    ledger.register_validator(&addr(9), "100").unwrap();
    let miner = Miner::new(ledger.clone(), MINER.to_string());
    let minter = Minter::new(ledger.clone());

    assert!(miner.run_cycle().block().is_some());
    assert!(miner.run_cycle().block().is_some());
    assert_eq!(ledger.total_supply(), U256::from_dec_str("6000000000000000000").unwrap());

    assert_eq!(miner.run_cycle(), CycleOutcome::SupplyExhausted);
    assert_eq!(minter.run_cycle(), CycleOutcome::SupplyExhausted);
    assert_eq!(ledger.blocks().len(), 3);
}

#[test]
fn test_mixed_production_keeps_chain_linked() {
    let ledger = Ledger::new(easy_config()).unwrap();
    for i in 1..=3 {
        ledger.register_validator(&addr(i), &(i * 1000).to_string()).unwrap();
    }
    let miner = Miner::new(ledger.clone(), MINER.to_string());
    let minter = Minter::new(ledger.clone());

    for round in 0..30 {
        if round % 5 == 0 {
            ledger.enqueue_transaction(transfer(round));
        }
        let outcome = if round % 2 == 0 { miner.run_cycle() } else { minter.run_cycle() };
        assert!(outcome.block().is_some(), "round {} produced {:?}", round, outcome);
    }

    let blocks = ledger.blocks();
    assert_eq!(blocks.len(), 31);
    validate_chain(&blocks).unwrap();

    for pair in blocks.windows(2) {
        assert_eq!(pair[1].previous_hash, pair[0].hash);
        assert!(pair[1].timestamp > pair[0].timestamp);
    }

    let included: usize = blocks.iter().map(|b| b.transactions.len()).sum();
    assert_eq!(included, 6);

    let minted: u64 = ledger.validators().values().map(|v| v.blocks_minted).sum();
    assert_eq!(minted, 15);

    let expected = U256::from_dec_str("3000000000000000000").unwrap() * 15
        + U256::from_dec_str("1000000000000000000").unwrap() * 15;
    assert_eq!(ledger.total_supply(), expected);
}

#[test]
fn test_readers_see_consistent_snapshots() {
    let ledger = Ledger::new(easy_config()).unwrap();
    ledger.register_validator(&addr(1), "500").unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let ledger = ledger.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut observed = 0usize;
                let mut last: Option<(u64, Vec<String>)> = None;
                while !done.load(Ordering::Relaxed) {
                    let snapshot = ledger.read(|state| {
                        let blocks = state.blocks();
                        let tip = state.tip();
                        assert_eq!(blocks.len() as u64 - 1, tip.index);
                        assert_eq!(tip.hash, blocks[blocks.len() - 1].hash);

                        let pending: Vec<String> = state.pending().iter().map(|tx| tx.hash.clone()).collect();
                        for tx in &tip.transactions {
                            assert!(!pending.contains(&tx.hash), "{} both pending and in the tip", tx.hash);
                        }

                        // every append drains the queue, so anything pending at the
                        // previous read is either still pending or inside a newer block
                        if let Some((previous_tip, previously_pending)) = &last {
                            let appended = &blocks[*previous_tip as usize + 1..];
                            for hash in previously_pending {
                                if appended.is_empty() {
                                    assert!(pending.contains(hash), "{} vanished without an append", hash);
                                } else {
                                    let included = appended
                                        .iter()
                                        .any(|b| b.transactions.iter().any(|tx| &tx.hash == hash));
                                    assert!(included, "{} drained without reaching a block", hash);
                                }
                            }
                        }
                        (tip.index, pending)
                    });
                    last = Some(snapshot);

                    let stats = ledger.stats("");
                    assert!(stats.last_pow_block <= stats.block_height);
                    assert!(stats.last_pos_block <= stats.block_height);
                    observed += 1;
                }
                observed
            })
        })
        .collect();

    let producers: Vec<_> = (0..2)
        .map(|worker| {
            let ledger = ledger.clone();
            thread::spawn(move || {
                let miner = Miner::new(ledger.clone(), MINER.to_string());
                let minter = Minter::new(ledger.clone());
                for round in 0..25 {
                    ledger.enqueue_transaction(transfer(worker * 100 + round));
                    let outcome = if worker == 0 { miner.run_cycle() } else { minter.run_cycle() };
                    assert!(outcome.block().is_some(), "worker {} round {}: {:?}", worker, round, outcome);
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }
    done.store(true, Ordering::Relaxed);
    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }

    let blocks = ledger.blocks();
    validate_chain(&blocks).unwrap();
    assert_eq!(blocks.len(), 51);
    let included: usize = blocks.iter().map(|b| b.transactions.len()).sum();
    assert_eq!(included + ledger.pending_transactions().len(), 50);
}

#[test]
fn test_load_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[chain]
chainId = 31337
networkId = 31337
chainName = "GYDS Devnet"
blockTime = 10
initialDifficulty = 8192
minDifficulty = 4096

[node]
address = "{}"
"#,
        MINER
    )
    .unwrap();

    let config = load_config(Some(file.path())).unwrap();
    assert_eq!(config.chain.chain_id, 31337);
    assert_eq!(config.chain.chain_name, "GYDS Devnet");
    assert_eq!(config.chain.block_time, 10);
    assert_eq!(config.chain.initial_difficulty, 8192);
    assert_eq!(config.chain.block_reward, "3000000000000000000");
    assert_eq!(config.node.address.as_deref(), Some(MINER));

    let ledger = Ledger::new(config.chain).unwrap();
    assert_eq!(ledger.difficulty(), 8192);
}

#[test]
fn test_load_config_rejects_bad_floor() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[chain]\ninitialDifficulty = 131072\nminDifficulty = 1024").unwrap();
    assert!(load_config(Some(file.path())).is_err());
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(config.chain.chain_id, 9125);
    assert_eq!(config.chain.initial_difficulty, 0x20000);
}
