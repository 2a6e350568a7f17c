use serde::{Deserialize, Serialize};

/// Stock record as stored. `mention_count` and `is_active` never leave the
/// service; API responses use [`StockDto`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Stock {
    pub symbol: String,
    pub name: String,
    pub mention_count: i64,
    pub is_active: bool,
}

impl Stock {
    /// A stock as produced by the mention counter: no display name yet,
    /// visible in search once persisted.
    pub fn counted(symbol: impl Into<String>, mention_count: i64) -> Self {
        Stock {
            symbol: symbol.into(),
            name: String::new(),
            mention_count,
            is_active: true,
        }
    }
}

/// API-facing projection of a stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDto {
    pub name: String,
    pub symbol: String,
}

impl From<Stock> for StockDto {
    fn from(stock: Stock) -> Self {
        StockDto {
            name: stock.name,
            symbol: stock.symbol,
        }
    }
}
