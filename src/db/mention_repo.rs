use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::error::{AppError, Result};
use crate::models::Stock;

#[cfg(test)]
use mockall::automock;

/// Aggregation of mention events into per-symbol counts.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MentionCounter: Send + Sync {
    /// Current mention count for a single symbol. Fails with not-found when
    /// no mentions exist for it.
    async fn count_one(&self, symbol: &str) -> Result<Stock>;

    /// Mention counts grouped by symbol, for every symbol mentioned at
    /// least once.
    async fn count_all(&self) -> Result<Vec<Stock>>;
}

/// Postgres implementation of [`MentionCounter`] over the mention event table.
pub struct PgMentionRepo {
    pool: PgPool,
}

impl PgMentionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COUNT_ONE_QUERY: &str = r#"
    SELECT symbol, COUNT(*) AS mention_count
    FROM stock_mentions
    WHERE symbol = $1
    GROUP BY symbol
"#;

const COUNT_ALL_QUERY: &str = r#"
    SELECT symbol, COUNT(*) AS mention_count
    FROM stock_mentions
    GROUP BY symbol
"#;

#[async_trait]
impl MentionCounter for PgMentionRepo {
    async fn count_one(&self, symbol: &str) -> Result<Stock> {
        let row = sqlx::query(COUNT_ONE_QUERY)
            .bind(symbol)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Stock::counted(
                row.get::<String, _>("symbol"),
                row.get::<i64, _>("mention_count"),
            )),
            None => Err(AppError::NotFound(format!(
                "no mentions recorded for symbol {symbol}"
            ))),
        }
    }

    async fn count_all(&self) -> Result<Vec<Stock>> {
        let rows = sqlx::query(COUNT_ALL_QUERY).fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                Stock::counted(
                    row.get::<String, _>("symbol"),
                    row.get::<i64, _>("mention_count"),
                )
            })
            .collect())
    }
}
