//! Ingress server: accepts framed delta streams and drives the detector.

use std::sync::Arc;
use std::time::Instant;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::arbitrage::Detector;
use crate::config::Config;
use crate::error::Result;
use crate::graph::GraphIndex;
use crate::market::{market_key, MarketRegistry};
use crate::metrics;
use crate::orderbook::{Level, OrderBookStore, TopOfBook, TopOfBookStore};

use super::wire::{read_frame, write_frame, Ack, OrderBookDelta};

/// Ingress endpoint: each connection is a client-stream of
/// [`OrderBookDelta`] frames answered with one [`Ack`] at end of stream.
pub struct IngressServer {
    config: Arc<Config>,
    index: Arc<GraphIndex>,
    registry: Arc<MarketRegistry>,
    tobs: Arc<TopOfBookStore>,
    books: Arc<OrderBookStore>,
    detector: Arc<Detector>,
}

impl IngressServer {
    /// Wire an ingress over shared component handles.
    pub fn new(
        config: Arc<Config>,
        index: Arc<GraphIndex>,
        registry: Arc<MarketRegistry>,
        tobs: Arc<TopOfBookStore>,
        books: Arc<OrderBookStore>,
        detector: Arc<Detector>,
    ) -> Self {
        Self {
            config,
            index,
            registry,
            tobs,
            books,
            detector,
        }
    }

    /// Accept connections until `shutdown` flips to true, then stop
    /// accepting and let in-flight streams drain.
    pub async fn serve(
        self: Arc<Self>,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "ingress listening");
        }
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = accepted?;
                    debug!(%peer, "feed connected");
                    let server = self.clone();
                    let conn_shutdown = shutdown.clone();
                    tokio::spawn(async move {
                        server.handle_stream(stream, conn_shutdown).await;
                    });
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("ingress shutting down");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Drain one delta stream and answer with a terminal ack.
    async fn handle_stream(&self, mut stream: TcpStream, mut shutdown: watch::Receiver<bool>) {
        let ok = loop {
            let next = tokio::select! {
                frame = read_frame::<_, OrderBookDelta>(&mut stream) => frame,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break true;
                    }
                    continue;
                }
            };
            match next {
                Ok(Some(delta)) => self.process_delta(delta).await,
                Ok(None) => break true,
                Err(e) => {
                    warn!(error = %e, "ingress stream error");
                    break false;
                }
            }
        };
        if let Err(e) = write_frame(&mut stream, &Ack { ok }).await {
            debug!(error = %e, "failed to send ack");
        }
    }

    /// Apply one delta: discover the market if unseen, refresh both stores,
    /// and notify the detector when the top of book is usable.
    async fn process_delta(&self, delta: OrderBookDelta) {
        let Some(market_ref) = delta.market else {
            warn!("delta without market identity, skipping");
            return;
        };
        let exchange = market_ref.exchange.to_uppercase();
        let symbol = market_ref.symbol.to_uppercase();

        let key = market_key(&exchange, &symbol);
        let known = self.index.read().market_id(&key).is_some();
        if !known {
            match self.config.parse_market(&exchange, &symbol) {
                Ok(market) => {
                    let (triangles, is_new) = self.index.add_market(market.clone());
                    if is_new {
                        self.registry.upsert_market(market.clone());
                        self.registry
                            .set_fee(&symbol, self.config.fee(&exchange, &market.quote));
                        metrics::inc_markets_discovered();
                        metrics::inc_triangles_discovered(triangles.len());
                        info!(
                            exchange = %exchange,
                            symbol = %symbol,
                            triangles = triangles.len(),
                            "discovered new market"
                        );
                    }
                }
                Err(e) => {
                    metrics::inc_symbol_parse_failures();
                    warn!(
                        exchange = %exchange,
                        symbol = %symbol,
                        error = %e,
                        "failed to parse new market, skipping delta"
                    );
                    return;
                }
            }
        }

        let bids: Vec<Level> = delta.bids.iter().map(Level::from).collect();
        let asks: Vec<Level> = delta.asks.iter().map(Level::from).collect();
        let ts_ns = delta.ts_ns as i64;
        self.books.upsert(
            &symbol,
            bids.clone(),
            asks.clone(),
            delta.sequence,
            ts_ns,
            self.config.strategy.orderbook_depth,
        );
        metrics::inc_deltas_processed();

        let (Some(best_bid), Some(best_ask)) = (bids.first(), asks.first()) else {
            return;
        };
        if best_bid.price <= 0.0 || best_ask.price <= 0.0 {
            return;
        }
        let tob = TopOfBook {
            bid_px: best_bid.price,
            bid_sz: best_bid.qty,
            ask_px: best_ask.price,
            ask_sz: best_ask.qty,
            seq: delta.sequence,
            ts_ns,
        };
        if tob.is_crossed() {
            debug!(symbol = %symbol, bid = tob.bid_px, ask = tob.ask_px, "storing crossed book");
        }
        self.tobs.set(&symbol, tob);

        let started = Instant::now();
        self.detector
            .on_market_change(&exchange, &symbol, self.config.trade_amount_for(&symbol))
            .await;
        metrics::record_detection_latency(started);
    }
}
