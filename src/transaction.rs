//! Transaction module split into types and admission validation

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::{calculate_fee, validate_transaction, ValidationError, BASE_FEE};
