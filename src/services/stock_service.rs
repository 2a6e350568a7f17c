use std::sync::Arc;

use tracing::{debug, info};

use crate::db::{MentionCounter, StockRepo};
use crate::error::Result;
use crate::models::StockDto;

/// Orchestrates search, suggestion, and ranking-refresh workflows over the
/// stock store and the mention counter. This is the only layer that knows
/// both how to count mentions and how to persist the result.
#[derive(Clone)]
pub struct StockService {
    stocks: Arc<dyn StockRepo>,
    mentions: Arc<dyn MentionCounter>,
}

impl StockService {
    pub fn new(stocks: Arc<dyn StockRepo>, mentions: Arc<dyn MentionCounter>) -> Self {
        Self { stocks, mentions }
    }

    /// Matches a query against the stored stocks. Case-folding is the
    /// store's responsibility; the query is passed through untouched.
    pub async fn search(&self, query: &str, limit: i64) -> Result<Vec<StockDto>> {
        let stocks = self.stocks.search(query, limit).await?;
        debug!(query, limit, results = stocks.len(), "stock search");

        Ok(stocks.into_iter().map(StockDto::from).collect())
    }

    /// Most mentioned active stocks, skipping symbols the caller already
    /// holds. Callers with no exclude list pass an empty slice.
    pub async fn suggestions(&self, excluded: &[String], limit: i64) -> Result<Vec<StockDto>> {
        let stocks = self.stocks.find_most_common(excluded, limit).await?;

        Ok(stocks.into_iter().map(StockDto::from).collect())
    }

    /// Counts mentions for a single symbol and persists the result. A symbol
    /// with zero mentions surfaces as not-found and the store is never
    /// touched; storage errors propagate unchanged.
    pub async fn rank_stock(&self, symbol: &str) -> Result<()> {
        let stock = self.mentions.count_one(symbol).await?;
        self.stocks.save(&stock).await
    }

    /// Counts mentions for every mentioned symbol and persists each one in
    /// sequence, aborting on the first failed save. Saves already committed
    /// stay committed; the refresh is idempotent per symbol, so retrying the
    /// whole operation is the recovery path.
    pub async fn rank_stocks(&self) -> Result<()> {
        let stocks = self.mentions.count_all().await?;
        info!(stocks = stocks.len(), "refreshing stock rankings");

        for stock in &stocks {
            self.stocks.save(stock).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mention_repo::MockMentionCounter;
    use crate::db::stock_repo::MockStockRepo;
    use crate::error::AppError;
    use crate::models::Stock;

    fn stock(symbol: &str, name: &str, count: i64) -> Stock {
        Stock {
            symbol: symbol.into(),
            name: name.into(),
            mention_count: count,
            is_active: true,
        }
    }

    fn service(stocks: MockStockRepo, mentions: MockMentionCounter) -> StockService {
        StockService::new(Arc::new(stocks), Arc::new(mentions))
    }

    #[tokio::test]
    async fn search_maps_stocks_to_dtos_preserving_order() {
        let mut stocks = MockStockRepo::new();
        stocks
            .expect_search()
            .withf(|query, limit| query == "app" && *limit == 10)
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    stock("AAPL", "Apple Inc.", 50),
                    stock("APP", "AppLovin", 20),
                ])
            });

        let svc = service(stocks, MockMentionCounter::new());
        let results = svc.search("app", 10).await.unwrap();

        assert_eq!(
            results,
            vec![
                StockDto {
                    name: "Apple Inc.".into(),
                    symbol: "AAPL".into()
                },
                StockDto {
                    name: "AppLovin".into(),
                    symbol: "APP".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn search_with_no_matches_is_empty_not_an_error() {
        let mut stocks = MockStockRepo::new();
        stocks
            .expect_search()
            .times(1)
            .returning(|_, _| Ok(Vec::new()));

        let svc = service(stocks, MockMentionCounter::new());
        let results = svc.search("zzz", 10).await.unwrap();

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn search_propagates_storage_errors() {
        let mut stocks = MockStockRepo::new();
        stocks
            .expect_search()
            .times(1)
            .returning(|_, _| Err(AppError::Database("connection reset".into())));

        let svc = service(stocks, MockMentionCounter::new());
        let err = svc.search("app", 10).await.unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn suggestions_pass_the_exclude_list_through() {
        let mut stocks = MockStockRepo::new();
        stocks
            .expect_find_most_common()
            .withf(|excluded, limit| *excluded == ["AAPL".to_string()] && *limit == 5)
            .times(1)
            .returning(|_, _| Ok(vec![stock("GOOG", "Alphabet", 30)]));

        let svc = service(stocks, MockMentionCounter::new());
        let results = svc.suggestions(&["AAPL".to_string()], 5).await.unwrap();

        assert_eq!(
            results,
            vec![StockDto {
                name: "Alphabet".into(),
                symbol: "GOOG".into()
            }]
        );
    }

    #[tokio::test]
    async fn rank_stock_without_mentions_is_not_found_and_never_saves() {
        let mut stocks = MockStockRepo::new();
        stocks.expect_save().times(0);

        let mut mentions = MockMentionCounter::new();
        mentions
            .expect_count_one()
            .withf(|symbol| symbol == "AAPL")
            .times(1)
            .returning(|symbol| Err(AppError::NotFound(format!("no mentions for {symbol}"))));

        let svc = service(stocks, mentions);
        let err = svc.rank_stock("AAPL").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn rank_stock_saves_the_counted_stock_exactly_once() {
        let mut stocks = MockStockRepo::new();
        stocks
            .expect_save()
            .withf(|s| s.symbol == "AAPL" && s.mention_count == 10)
            .times(1)
            .returning(|_| Ok(()));

        let mut mentions = MockMentionCounter::new();
        mentions
            .expect_count_one()
            .times(1)
            .returning(|_| Ok(Stock::counted("AAPL", 10)));

        let svc = service(stocks, mentions);
        svc.rank_stock("AAPL").await.unwrap();
    }

    #[tokio::test]
    async fn rank_stock_propagates_save_failures_unchanged() {
        let mut stocks = MockStockRepo::new();
        stocks
            .expect_save()
            .times(1)
            .returning(|_| Err(AppError::Database("write failed".into())));

        let mut mentions = MockMentionCounter::new();
        mentions
            .expect_count_one()
            .times(1)
            .returning(|_| Ok(Stock::counted("AAPL", 10)));

        let svc = service(stocks, mentions);
        let err = svc.rank_stock("AAPL").await.unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn rank_stocks_saves_every_counted_stock_unmodified() {
        let mut stocks = MockStockRepo::new();
        stocks
            .expect_save()
            .withf(|s| s.symbol == "AAPL" && s.mention_count == 10)
            .times(1)
            .returning(|_| Ok(()));
        stocks
            .expect_save()
            .withf(|s| s.symbol == "GOOG" && s.mention_count == 20)
            .times(1)
            .returning(|_| Ok(()));

        let mut mentions = MockMentionCounter::new();
        mentions
            .expect_count_all()
            .times(1)
            .returning(|| Ok(vec![Stock::counted("AAPL", 10), Stock::counted("GOOG", 20)]));

        let svc = service(stocks, mentions);
        svc.rank_stocks().await.unwrap();
    }

    #[tokio::test]
    async fn rank_stocks_aborts_on_the_first_failed_save() {
        let mut stocks = MockStockRepo::new();
        stocks
            .expect_save()
            .withf(|s| s.symbol == "AAPL")
            .times(1)
            .returning(|_| Ok(()));
        stocks
            .expect_save()
            .withf(|s| s.symbol == "GOOG")
            .times(1)
            .returning(|_| Err(AppError::Database("write failed".into())));
        stocks.expect_save().withf(|s| s.symbol == "TSLA").times(0);

        let mut mentions = MockMentionCounter::new();
        mentions.expect_count_all().times(1).returning(|| {
            Ok(vec![
                Stock::counted("AAPL", 10),
                Stock::counted("GOOG", 20),
                Stock::counted("TSLA", 5),
            ])
        });

        let svc = service(stocks, mentions);
        let err = svc.rank_stocks().await.unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn rank_stocks_propagates_counter_errors_without_saving() {
        let mut stocks = MockStockRepo::new();
        stocks.expect_save().times(0);

        let mut mentions = MockMentionCounter::new();
        mentions
            .expect_count_all()
            .times(1)
            .returning(|| Err(AppError::Database("aggregate failed".into())));

        let svc = service(stocks, mentions);
        let err = svc.rank_stocks().await.unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
    }
}
