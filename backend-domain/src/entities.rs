// Domain entities
pub mod api;
pub mod audit;
pub mod config;
pub mod listing;
pub mod notification;
pub mod pricing;
pub mod stock;
pub mod transaction;

pub use api::*;
pub use audit::*;
pub use config::*;
pub use listing::*;
pub use notification::*;
pub use pricing::*;
pub use stock::*;
pub use transaction::*;
