//! GYDSchain - a single-node ledger that extends one chain through
//! alternating proof-of-work and proof-of-stake rounds
//!
//! # Architecture
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, ledger state, validator registry and block validation
//! - [`transaction`] - Transaction types and admission rules
//! - [`difficulty`] - Proof-of-work difficulty retarget
//!
//! ## Block Production
//! - [`miner`] - Proof-of-work nonce search
//! - [`minter`] - Stake-weighted proof-of-stake selection
//! - [`node`] - Producer scheduling and shutdown
//!
//! ## Cryptography
//! - [`crypto`] - Hashing and secp256k1 address derivation
//! - [`wallet`] - BIP-39 accounts and transaction stamping
//!
//! ## Integration
//! - [`api`] - HTTP/JSON and JSON-RPC surface
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod difficulty;
pub mod transaction;

// ============================================================================
// Block Production
// ============================================================================
pub mod miner;
pub mod minter;
pub mod node;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;
pub mod wallet;

// ============================================================================
// Integration
// ============================================================================
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
