//! Account creation, mnemonic recovery and transaction hash stamping.
//!
//! Signing only stamps `Transaction::hash`; nothing in the node verifies
//! signatures.

use bip39::Mnemonic;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::crypto::{address_from_public_key, public_key_for, secret_key_from_hex};
use crate::error::{ChainError, Result};
use crate::transaction::Transaction;

pub const MNEMONIC_WORDS: usize = 12;
const SEED_PASSPHRASE: &str = "gydschain";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub address: String,
    pub private_key: String,
    pub public_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
}

/// New account from 128 bits of OS entropy.
pub fn create_account() -> Result<Account> {
    let mut entropy = [0u8; 16];
    OsRng.fill_bytes(&mut entropy);
    let mnemonic = Mnemonic::from_entropy(&entropy)
        .map_err(|e| ChainError::WalletError(format!("Failed to build mnemonic: {}", e)))?;
    account_from_mnemonic(&mnemonic)
}

/// Re-derives the account behind a 12-word phrase.
pub fn recover_account(phrase: &str) -> Result<Account> {
    let mnemonic = validate_mnemonic(phrase)?;
    account_from_mnemonic(&mnemonic)
}

/// Exactly twelve words of at least three letters forming a valid BIP-39 phrase.
pub fn validate_mnemonic(phrase: &str) -> Result<Mnemonic> {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    if words.len() != MNEMONIC_WORDS {
        return Err(ChainError::WalletError(format!(
            "mnemonic must be exactly {} words",
            MNEMONIC_WORDS
        )));
    }
    if words.iter().any(|w| w.len() < 3) {
        return Err(ChainError::WalletError("invalid word in mnemonic".to_string()));
    }
    Mnemonic::parse_normalized(&words.join(" "))
        .map_err(|e| ChainError::WalletError(format!("invalid mnemonic: {}", e)))
}

fn account_from_mnemonic(mnemonic: &Mnemonic) -> Result<Account> {
    let seed = mnemonic.to_seed_normalized(SEED_PASSPHRASE);
    let private_key = hex::encode(&seed[..32]);
    let secret_key = secret_key_from_hex(&private_key)?;
    let public_key = public_key_for(&secret_key);

    Ok(Account {
        address: address_from_public_key(&public_key),
        private_key,
        public_key: hex::encode(public_key.serialize_uncompressed()),
        mnemonic: Some(mnemonic.to_string()),
    })
}

/// Checks that `private_key_hex` is a usable secp256k1 key and stamps `tx.hash`.
pub fn sign_transaction(tx: &mut Transaction, private_key_hex: &str) -> Result<()> {
    secret_key_from_hex(private_key_hex)?;
    tx.hash = tx.compute_hash();
    Ok(())
}
