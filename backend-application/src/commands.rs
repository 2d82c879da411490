pub mod notification_commands;
pub mod price_refresh_commands;
pub mod sale_commands;
pub mod stock_commands;
