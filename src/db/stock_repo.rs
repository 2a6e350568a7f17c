use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::models::Stock;

#[cfg(test)]
use mockall::automock;

/// Storage of stock records.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StockRepo: Send + Sync {
    /// Upserts a stock by symbol, refreshing its mention count.
    async fn save(&self, stock: &Stock) -> Result<()>;

    /// Case-insensitive prefix match against symbol or name, active stocks
    /// only, highest mention count first.
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Stock>>;

    /// Top `limit` active stocks by mention count, skipping `excluded`.
    async fn find_most_common(&self, excluded: &[String], limit: i64) -> Result<Vec<Stock>>;
}

/// Postgres implementation of [`StockRepo`].
pub struct PgStockRepo {
    pool: PgPool,
}

impl PgStockRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SAVE_STOCK_QUERY: &str = r#"
    INSERT INTO stocks (symbol, name, is_active, mention_count, updated_at)
    VALUES ($1, $2, TRUE, $3, $4)
    ON CONFLICT (symbol)
    DO UPDATE SET mention_count = EXCLUDED.mention_count, updated_at = EXCLUDED.updated_at
"#;

const SEARCH_STOCKS_QUERY: &str = r#"
    SELECT symbol, name, mention_count, is_active
    FROM stocks
    WHERE is_active = TRUE
      AND (LOWER(symbol) LIKE $1 || '%' OR LOWER(name) LIKE $1 || '%')
    ORDER BY mention_count DESC
    LIMIT $2
"#;

const FIND_MOST_COMMON_QUERY: &str = r#"
    SELECT symbol, name, mention_count, is_active
    FROM stocks
    WHERE is_active = TRUE
      AND symbol <> ALL($1)
    ORDER BY mention_count DESC
    LIMIT $2
"#;

#[async_trait]
impl StockRepo for PgStockRepo {
    async fn save(&self, stock: &Stock) -> Result<()> {
        let result = sqlx::query(SAVE_STOCK_QUERY)
            .bind(&stock.symbol)
            .bind(&stock.name)
            .bind(stock.mention_count)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() != 1 {
            return Err(AppError::Database(format!(
                "stock upsert for {} affected {} rows",
                stock.symbol,
                result.rows_affected()
            )));
        }

        Ok(())
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Stock>> {
        let stocks = sqlx::query_as::<_, Stock>(SEARCH_STOCKS_QUERY)
            .bind(query.to_lowercase())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(stocks)
    }

    async fn find_most_common(&self, excluded: &[String], limit: i64) -> Result<Vec<Stock>> {
        let stocks = sqlx::query_as::<_, Stock>(FIND_MOST_COMMON_QUERY)
            .bind(excluded)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(stocks)
    }
}
