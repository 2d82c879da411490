// Pure domain services
pub mod discrepancy;
pub mod ledger;
pub mod price_change;

pub use discrepancy::*;
pub use ledger::*;
pub use price_change::*;
