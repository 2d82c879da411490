pub mod price_refresh_worker;
pub mod scryfall_fetcher;

pub use price_refresh_worker::*;
pub use scryfall_fetcher::*;
