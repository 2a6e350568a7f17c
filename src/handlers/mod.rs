pub mod health;
pub mod stocks;

pub use health::health_check;
pub use stocks::{rank_all_stocks, rank_stock, search_stocks, suggest_stocks};
