/// Transaction types for GYDSchain
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A value transfer waiting in, or included from, the pending queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub from: String,
    pub to: String,
    /// Wei-scale decimal string.
    pub value: String,
    pub gas: i64,
    /// Wei-scale decimal string.
    pub gas_price: String,
    pub nonce: i64,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub timestamp: i64,
}

impl Transaction {
    pub fn new(from: &str, to: &str, value: &str, gas: i64, gas_price: &str, nonce: i64) -> Self {
        Transaction {
            from: from.to_string(),
            to: to.to_string(),
            value: value.to_string(),
            gas,
            gas_price: gas_price.to_string(),
            nonce,
            hash: String::new(),
            timestamp: 0,
        }
    }

    /// Hex-encoded SHA-256 over the caller-supplied fields. The hash and
    /// admission timestamp are not part of the input.
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.from.as_bytes());
        hasher.update(self.to.as_bytes());
        hasher.update(self.value.as_bytes());
        hasher.update(self.gas.to_string().as_bytes());
        hasher.update(self.gas_price.as_bytes());
        hasher.update(self.nonce.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_matches_field_concatenation() {
        let tx = Transaction::new(
            "0x1111111111111111111111111111111111111111",
            "0x2222222222222222222222222222222222222222",
            "1000",
            21000,
            "1000000000",
            7,
        );
        let joined = format!("{}{}{}{}{}{}", tx.from, tx.to, tx.value, tx.gas, tx.gas_price, tx.nonce);
        assert_eq!(tx.compute_hash(), hex::encode(Sha256::digest(joined.as_bytes())));
    }

    #[test]
    fn test_hash_ignores_stamp_fields() {
        let mut tx = Transaction::new(
            "0x1111111111111111111111111111111111111111",
            "0x2222222222222222222222222222222222222222",
            "1",
            21000,
            "1000000000",
            0,
        );
        let before = tx.compute_hash();
        tx.timestamp = 1_700_000_000;
        tx.hash = before.clone();
        assert_eq!(tx.compute_hash(), before);
    }

    #[test]
    fn test_deserialize_without_hash_or_timestamp() {
        let tx: Transaction = serde_json::from_str(
            r#"{"from":"0x1111111111111111111111111111111111111111","to":"0x2222222222222222222222222222222222222222","value":"5","gas":21000,"gasPrice":"1000000000","nonce":1}"#,
        )
        .unwrap();
        assert!(tx.hash.is_empty());
        assert_eq!(tx.timestamp, 0);
        assert_eq!(tx.gas_price, "1000000000");
    }
}
