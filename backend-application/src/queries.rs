pub mod discrepancy_queries;
pub mod notification_queries;
pub mod price_queries;
pub mod stock_queries;
