// core.rs splits responsibilities into submodules: blocks and the ledger
// aggregate, the validator registry, and block validation.
pub mod chain;
pub mod state;
pub mod validation;

pub use chain::*;
pub use state::*;
pub use validation::*;
