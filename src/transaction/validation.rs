/// Stateless admission rules a transaction must pass before entering the pending queue
use primitive_types::U256;
use thiserror::Error;

use crate::transaction::types::Transaction;

/// Minimum gas for a simple transfer
pub const MIN_GAS_LIMIT: i64 = 21_000;
/// Maximum gas per transaction
pub const MAX_GAS_LIMIT: i64 = 30_000_000;
/// 1 Gwei in wei
pub const MIN_GAS_PRICE: u64 = 1_000_000_000;
/// 1000 Gwei in wei
pub const MAX_GAS_PRICE: u64 = 1_000_000_000_000;
/// 0.0001 GYDS in wei
pub const BASE_FEE: u64 = 100_000_000_000_000;
/// 1 GYDS in wei
pub const MAX_TRANSACTION_FEE: u64 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must start with 0x")]
    MissingPrefix,
    #[error("address must be 42 characters (0x + 40 hex chars), got {0}")]
    BadLength(usize),
    #[error("address contains invalid characters")]
    InvalidCharacters,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} address: {reason}")]
    InvalidAddress {
        field: &'static str,
        #[source]
        reason: AddressError,
    },
    #[error("cannot send to same address")]
    SelfTransfer,
    #[error("invalid amount format: {0}")]
    InvalidAmount(String),
    #[error("amount must be greater than 0")]
    ZeroAmount,
    #[error("amount exceeds maximum allowed")]
    AmountTooLarge,
    #[error("gas limit {0} too low (min {})", MIN_GAS_LIMIT)]
    GasLimitTooLow(i64),
    #[error("gas limit {0} too high (max {})", MAX_GAS_LIMIT)]
    GasLimitTooHigh(i64),
    #[error("invalid gas price format: {0}")]
    InvalidGasPrice(String),
    #[error("gas price too low (min {})", MIN_GAS_PRICE)]
    GasPriceTooLow,
    #[error("gas price too high (max {})", MAX_GAS_PRICE)]
    GasPriceTooHigh,
    #[error("nonce cannot be negative")]
    NegativeNonce,
    #[error("transaction fee {0} exceeds maximum allowed")]
    FeeTooHigh(U256),
    #[error("total transaction cost exceeds maximum supply")]
    TotalCostTooHigh,
}

/// Checks `0x` followed by exactly 40 hex characters.
pub fn validate_address(address: &str) -> Result<(), AddressError> {
    if !address.starts_with("0x") {
        return Err(AddressError::MissingPrefix);
    }
    if address.len() != 42 {
        return Err(AddressError::BadLength(address.len()));
    }
    if !address[2..].bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(AddressError::InvalidCharacters);
    }
    Ok(())
}

/// Parses a wei amount; it must be positive and no larger than `max_supply`.
pub fn validate_amount(amount: &str, max_supply: U256) -> Result<U256, ValidationError> {
    let value = parse_decimal(amount).ok_or_else(|| ValidationError::InvalidAmount(amount.to_string()))?;
    if value.is_zero() {
        return Err(ValidationError::ZeroAmount);
    }
    if value > max_supply {
        return Err(ValidationError::AmountTooLarge);
    }
    Ok(value)
}

/// Checks the gas limit and gas price bounds, returning the parsed price.
pub fn validate_gas(gas: i64, gas_price: &str) -> Result<U256, ValidationError> {
    if gas < MIN_GAS_LIMIT {
        return Err(ValidationError::GasLimitTooLow(gas));
    }
    if gas > MAX_GAS_LIMIT {
        return Err(ValidationError::GasLimitTooHigh(gas));
    }

    let price = parse_gas_price(gas_price)?;
    if price < U256::from(MIN_GAS_PRICE) {
        return Err(ValidationError::GasPriceTooLow);
    }
    if price > U256::from(MAX_GAS_PRICE) {
        return Err(ValidationError::GasPriceTooHigh);
    }
    Ok(price)
}

/// `fee = gas * gasPrice + BASE_FEE`, rejected when above `MAX_TRANSACTION_FEE`.
pub fn calculate_fee(gas: i64, gas_price: &str) -> Result<U256, ValidationError> {
    if gas < 0 {
        return Err(ValidationError::GasLimitTooLow(gas));
    }
    let price = parse_gas_price(gas_price)?;

    // gas fits in 63 bits, so only an absurd price can overflow
    let fee = price
        .checked_mul(U256::from(gas as u64))
        .and_then(|f| f.checked_add(U256::from(BASE_FEE)))
        .ok_or(ValidationError::FeeTooHigh(U256::MAX))?;

    if fee > U256::from(MAX_TRANSACTION_FEE) {
        return Err(ValidationError::FeeTooHigh(fee));
    }
    Ok(fee)
}

/// Runs the full admission pipeline. Nothing is mutated; the first failing rule wins.
pub fn validate_transaction(tx: &Transaction, max_supply: U256) -> Result<(), ValidationError> {
    validate_address(&tx.from).map_err(|reason| ValidationError::InvalidAddress { field: "from", reason })?;
    validate_address(&tx.to).map_err(|reason| ValidationError::InvalidAddress { field: "to", reason })?;

    if tx.from == tx.to {
        return Err(ValidationError::SelfTransfer);
    }

    let amount = validate_amount(&tx.value, max_supply)?;
    validate_gas(tx.gas, &tx.gas_price)?;

    if tx.nonce < 0 {
        return Err(ValidationError::NegativeNonce);
    }

    let fee = calculate_fee(tx.gas, &tx.gas_price)?;

    match amount.checked_add(fee) {
        Some(total) if total <= max_supply => Ok(()),
        _ => Err(ValidationError::TotalCostTooHigh),
    }
}

fn parse_gas_price(gas_price: &str) -> Result<U256, ValidationError> {
    parse_decimal(gas_price).ok_or_else(|| ValidationError::InvalidGasPrice(gas_price.to_string()))
}

/// Strict base-10 parse: digits only, representable in 256 bits.
pub fn parse_decimal(value: &str) -> Option<U256> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_dec_str(value).ok()
}
