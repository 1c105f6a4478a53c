//! Per-update orchestration: map a quote change to its triangles, evaluate
//! each, and publish the admitted plans.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::graph::GraphIndex;
use crate::market::{market_key, MarketRegistry};
use crate::metrics;
use crate::orderbook::TopOfBookStore;
use crate::publish::Publisher;

use super::evaluator::TobSimulator;
use super::plan::Plan;

/// Stateless per-update worker wiring the index, stores, evaluator, and
/// publisher together.
pub struct Detector {
    index: Arc<GraphIndex>,
    books: Arc<TopOfBookStore>,
    registry: Arc<MarketRegistry>,
    sim: TobSimulator,
    publisher: Arc<dyn Publisher>,
}

impl Detector {
    /// Wire a detector over shared component handles.
    pub fn new(
        index: Arc<GraphIndex>,
        books: Arc<TopOfBookStore>,
        registry: Arc<MarketRegistry>,
        sim: TobSimulator,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            index,
            books,
            registry,
            sim,
            publisher,
        }
    }

    /// Re-evaluate every triangle touching the updated market and publish
    /// the plans that clear the edge.
    ///
    /// Publisher failures are logged and do not stop the remaining
    /// triangles.
    #[instrument(skip(self), fields(exchange = %exchange, symbol = %symbol))]
    pub async fn on_market_change(&self, exchange: &str, symbol: &str, target_quote: f64) {
        let key = market_key(exchange, symbol);

        // Evaluate under the read lock, publish after releasing it.
        let plans: Vec<Plan> = {
            let state = self.index.read();
            let Some(mid) = state.market_id(&key) else {
                warn!(market = %key, "received update for unknown market");
                return;
            };
            let triangle_ids = state.triangles_for(mid);
            if triangle_ids.is_empty() {
                return;
            }

            triangle_ids
                .iter()
                .filter_map(|&ti| {
                    let triangle = state.triangle(ti)?;
                    let plan = self.sim.evaluate_tob(
                        triangle,
                        state.markets(),
                        |s| self.books.get(s),
                        |s| self.registry.fee(s),
                        target_quote,
                    );
                    if plan.is_none() {
                        debug!(triangle = ?triangle.market_ids, "cycle not profitable");
                    }
                    plan
                })
                .collect()
        };

        for plan in plans {
            info!(
                triangle = ?plan.legs.iter().map(|l| l.market.as_str()).collect::<Vec<_>>(),
                profit_quote = plan.expected_profit_quote,
                quote_currency = %plan.quote_currency,
                "found profitable arbitrage"
            );
            match self.publisher.publish(&plan).await {
                Ok(()) => metrics::inc_plans_published(),
                Err(e) => {
                    metrics::inc_publish_failures();
                    warn!(error = %e, "failed to publish plan");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PublishError;
    use crate::market::{Fee, Market, Side};
    use crate::orderbook::TopOfBook;
    use crate::publish::testing::MockPublisher;

    fn tob(bid: f64, ask: f64) -> TopOfBook {
        TopOfBook {
            bid_px: bid,
            bid_sz: 10.0,
            ask_px: ask,
            ask_sz: 10.0,
            seq: 1,
            ts_ns: 0,
        }
    }

    struct Fixture {
        index: Arc<GraphIndex>,
        books: Arc<TopOfBookStore>,
        registry: Arc<MarketRegistry>,
        publisher: Arc<MockPublisher>,
    }

    fn fixture() -> Fixture {
        let index = Arc::new(GraphIndex::new());
        let books = Arc::new(TopOfBookStore::new());
        let registry = Arc::new(MarketRegistry::new());
        for m in [
            Market::new("BINANCE", "BTCUSDT", "BTC", "USDT"),
            Market::new("BINANCE", "ETHUSDT", "ETH", "USDT"),
            Market::new("BINANCE", "ETHBTC", "ETH", "BTC"),
        ] {
            registry.upsert_market(m.clone());
            registry.set_fee(
                &m.symbol,
                Fee {
                    taker_bp: 1.0,
                    maker_bp: 0.5,
                },
            );
            index.add_market(m);
        }
        Fixture {
            index,
            books,
            registry,
            publisher: Arc::new(MockPublisher::new()),
        }
    }

    fn detector(f: &Fixture) -> Detector {
        Detector::new(
            f.index.clone(),
            f.books.clone(),
            f.registry.clone(),
            TobSimulator::new(1.0, 0.0),
            f.publisher.clone(),
        )
    }

    fn set_profitable_quotes(f: &Fixture) {
        f.books.set("BTCUSDT", tob(49_800.0, 49_900.0));
        f.books.set("ETHUSDT", tob(2_980.0, 2_990.0));
        f.books.set("ETHBTC", tob(0.0602, 0.0604));
    }

    #[tokio::test]
    async fn publishes_plan_for_profitable_cycle() {
        let f = fixture();
        set_profitable_quotes(&f);

        detector(&f)
            .on_market_change("BINANCE", "BTCUSDT", 1000.0)
            .await;

        let plans = f.publisher.published();
        assert_eq!(plans.len(), 1);
        let plan = &plans[0];
        assert_eq!(plan.exchange, "BINANCE");
        assert_eq!(plan.quote_currency, "USDT");
        assert!(plan.expected_profit_quote > 0.0);
        let sides: Vec<Side> = plan.legs.iter().map(|l| l.side).collect();
        assert_eq!(sides, vec![Side::Buy, Side::Sell, Side::Sell]);
    }

    #[tokio::test]
    async fn flat_book_publishes_nothing() {
        let f = fixture();
        f.books.set("BTCUSDT", tob(50_000.0, 50_000.0));
        f.books.set("ETHUSDT", tob(3_000.0, 3_000.0));
        f.books.set("ETHBTC", tob(0.06, 0.06));

        detector(&f)
            .on_market_change("BINANCE", "BTCUSDT", 1000.0)
            .await;

        assert!(f.publisher.published().is_empty());
    }

    #[tokio::test]
    async fn unknown_market_is_ignored() {
        let f = fixture();
        set_profitable_quotes(&f);

        detector(&f)
            .on_market_change("BINANCE", "DOGEUSDT", 1000.0)
            .await;

        assert!(f.publisher.published().is_empty());
    }

    #[tokio::test]
    async fn mixed_case_lookup_matches() {
        let f = fixture();
        set_profitable_quotes(&f);

        detector(&f)
            .on_market_change("binance", "btcusdt", 1000.0)
            .await;

        assert_eq!(f.publisher.published().len(), 1);
    }

    #[tokio::test]
    async fn publish_failure_is_swallowed() {
        let f = fixture();
        set_profitable_quotes(&f);
        f.publisher
            .fail_with(|| PublishError::Rejected("executor is draining".to_string()));

        detector(&f)
            .on_market_change("BINANCE", "BTCUSDT", 1000.0)
            .await;

        // The attempt is recorded even though the publisher errored.
        assert_eq!(f.publisher.published().len(), 1);
    }
}
