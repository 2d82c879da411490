pub mod notification_handlers;
pub mod ops_handlers;
pub mod price_handlers;
pub mod stock_handlers;
pub mod transaction_handlers;

pub use notification_handlers::*;
pub use ops_handlers::*;
pub use price_handlers::*;
pub use stock_handlers::*;
pub use transaction_handlers::*;
