//! Hashing and key primitives for GYDSchain

use once_cell::sync::Lazy;
use primitive_types::U256;
use secp256k1::{All, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};

use crate::error::ChainError;

/// A thread-safe, lazily initialized Secp256k1 context.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Hex-encoded SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Interprets a hex digest as a big-endian 256-bit integer.
pub fn hash_to_u256(hash_hex: &str) -> Result<U256, ChainError> {
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(hash_hex, &mut bytes)
        .map_err(|e| ChainError::InvalidBlock(format!("Invalid hash {}: {}", hash_hex, e)))?;
    Ok(U256::from_big_endian(&bytes))
}

/// Derives the public key belonging to `secret_key`.
pub fn public_key_for(secret_key: &SecretKey) -> PublicKey {
    PublicKey::from_secret_key(&SECP256K1_CONTEXT, secret_key)
}

/// `0x` followed by the first 20 bytes of SHA-256 over the uncompressed key (prefix byte dropped).
pub fn address_from_public_key(public_key: &PublicKey) -> String {
    let uncompressed = public_key.serialize_uncompressed();
    let digest = Sha256::digest(&uncompressed[1..]);
    format!("0x{}", hex::encode(&digest[..20]))
}

/// Parses a hex-encoded secp256k1 secret key.
pub fn secret_key_from_hex(private_key_hex: &str) -> Result<SecretKey, ChainError> {
    let trimmed = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
    let bytes = hex::decode(trimmed)
        .map_err(|e| ChainError::WalletError(format!("Invalid private key hex: {}", e)))?;
    SecretKey::from_slice(&bytes)
        .map_err(|e| ChainError::WalletError(format!("Invalid private key: {}", e)))
}

/// Address for a node that was not configured with one, derived from the current time.
pub fn generate_node_address() -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let digest = sha256_hex(nanos.to_string().as_bytes());
    format!("0x{}", &digest[..40])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::validation::validate_address;

    #[test]
    fn test_hash_to_u256_big_endian() {
        let mut hex_hash = "00".repeat(31);
        hex_hash.push_str("ff");
        assert_eq!(hash_to_u256(&hex_hash).unwrap(), U256::from(255u64));

        let top = format!("80{}", "00".repeat(31));
        assert_eq!(hash_to_u256(&top).unwrap().leading_zeros(), 0);
    }

    #[test]
    fn test_hash_to_u256_rejects_bad_hex() {
        assert!(hash_to_u256("zz").is_err());
        assert!(hash_to_u256("abcd").is_err());
    }

    #[test]
    fn test_generated_node_address_is_valid() {
        assert!(validate_address(&generate_node_address()).is_ok());
    }

    #[test]
    fn test_address_from_known_key() {
        let secret = secret_key_from_hex(&"01".repeat(32)).unwrap();
        let address = address_from_public_key(&public_key_for(&secret));
        assert!(validate_address(&address).is_ok());
        assert_eq!(address, address_from_public_key(&public_key_for(&secret)));
    }

    #[test]
    fn test_secret_key_errors() {
        assert!(matches!(secret_key_from_hex("not-hex"), Err(ChainError::WalletError(_))));
        assert!(secret_key_from_hex(&"00".repeat(32)).is_err());
        assert!(secret_key_from_hex("0x0101").is_err());
    }
}
