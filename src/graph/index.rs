//! Market graph index and incremental triangle enumeration.

use std::collections::HashMap;

use parking_lot::{RwLock, RwLockReadGuard};
use tracing::info;

use crate::market::Market;

/// Stable index into the append-only market vector.
pub type MarketId = usize;
/// Stable index into the append-only triangle vector.
pub type TriangleId = usize;

/// A directed three-leg cycle over markets of a single exchange.
///
/// Leg directions are fixed at `(+1, -1, -1)`: buy the first leg's base with
/// the starting quote, then sell twice back into it. The same three markets
/// started from a different quote currency form a distinct triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    /// The three member markets, in leg order.
    pub market_ids: [MarketId; 3],
    /// Per-leg direction: `+1` buy, `-1` sell.
    pub dirs: [i8; 3],
    /// Currency the cycle starts and closes in.
    pub quote_ccy: String,
}

impl Triangle {
    fn new(l1: MarketId, l2: MarketId, l3: MarketId, quote_ccy: String) -> Self {
        Self {
            market_ids: [l1, l2, l3],
            dirs: [1, -1, -1],
            quote_ccy,
        }
    }
}

/// Append-only index of markets and the triangles they participate in.
///
/// Writes go through [`GraphIndex::add_market`] under an exclusive lock;
/// readers take a consistent snapshot via [`GraphIndex::read`]. Markets and
/// triangles are never removed, so their ids stay valid for the process
/// lifetime.
#[derive(Debug, Default)]
pub struct GraphIndex {
    inner: RwLock<IndexState>,
}

/// The guarded state of the index, exposed read-only through accessors.
#[derive(Debug, Default)]
pub struct IndexState {
    markets: Vec<Market>,
    market_id_by_key: HashMap<String, MarketId>,
    markets_by_exchange: HashMap<String, HashMap<String, MarketId>>,
    triangles: Vec<Triangle>,
    triangles_by_market: HashMap<MarketId, Vec<TriangleId>>,
}

impl GraphIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to a consistent snapshot of the index.
    pub fn read(&self) -> RwLockReadGuard<'_, IndexState> {
        self.inner.read()
    }

    /// Number of registered markets.
    pub fn market_count(&self) -> usize {
        self.inner.read().markets.len()
    }

    /// Number of discovered triangles.
    pub fn triangle_count(&self) -> usize {
        self.inner.read().triangles.len()
    }

    /// Register a market and enumerate the triangles it completes.
    ///
    /// Idempotent by uppercase `(exchange, symbol)`: a repeated add returns
    /// `(vec![], false)` and leaves the index untouched. Newly found
    /// triangles are appended and returned.
    pub fn add_market(&self, market: Market) -> (Vec<Triangle>, bool) {
        let mut state = self.inner.write();

        let key = market.key();
        if state.market_id_by_key.contains_key(&key) {
            return (Vec::new(), false);
        }

        let mid = state.markets.len();
        let pair = market.pair();
        let exchange_key = market.exchange.to_uppercase();
        state.markets.push(market);
        state.market_id_by_key.insert(key, mid);
        state
            .markets_by_exchange
            .entry(exchange_key)
            .or_default()
            .insert(pair, mid);

        let found = state.find_new_triangles(mid);
        for triangle in &found {
            let ti = state.triangles.len();
            info!(
                market_ids = ?triangle.market_ids,
                quote_ccy = %triangle.quote_ccy,
                symbols = ?triangle
                    .market_ids
                    .iter()
                    .map(|&id| state.markets[id].symbol.as_str())
                    .collect::<Vec<_>>(),
                "found triangle"
            );
            state.triangles.push(triangle.clone());
            for &member in &triangle.market_ids {
                state
                    .triangles_by_market
                    .entry(member)
                    .or_default()
                    .push(ti);
            }
        }
        (found, true)
    }
}

impl IndexState {
    /// Id of the market registered under the given uppercase key.
    pub fn market_id(&self, key: &str) -> Option<MarketId> {
        self.market_id_by_key.get(key).copied()
    }

    /// Market by id.
    pub fn market(&self, mid: MarketId) -> Option<&Market> {
        self.markets.get(mid)
    }

    /// All registered markets; a triangle's `market_ids` index into this.
    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    /// Triangle by id.
    pub fn triangle(&self, ti: TriangleId) -> Option<&Triangle> {
        self.triangles.get(ti)
    }

    /// All discovered triangles.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Ids of the triangles a market participates in.
    pub fn triangles_for(&self, mid: MarketId) -> &[TriangleId] {
        self.triangles_by_market
            .get(&mid)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Enumerate the triangles completed by the market at `mid`, which must
    /// already be registered in the pair map.
    ///
    /// Three searches cover the three legs the new market can occupy in the
    /// canonical `(+1, -1, -1)` orientation. They are mutually exclusive on
    /// the new market's role, so one call never yields the same triangle
    /// twice, and the market was absent before this call, so nothing here
    /// can duplicate a previously discovered triangle.
    fn find_new_triangles(&self, mid: MarketId) -> Vec<Triangle> {
        let market = &self.markets[mid];
        let mut found = Vec::new();
        let Some(by_pair) = self.markets_by_exchange.get(&market.exchange.to_uppercase()) else {
            return found;
        };

        let base = market.base.to_uppercase();
        let quote = market.quote.to_uppercase();

        // New market is leg 1: a/c bought with c. Partner a/b sells the base
        // on, and b/c closes the cycle.
        for &m2 in by_pair.values() {
            let other = &self.markets[m2];
            if other.base.eq_ignore_ascii_case(&base)
                && !other.quote.eq_ignore_ascii_case(&quote)
            {
                let b = other.quote.to_uppercase();
                if let Some(&m3) = by_pair.get(&format!("{b}/{quote}")) {
                    found.push(Triangle::new(mid, m2, m3, quote.clone()));
                }
            }
        }

        // New market is leg 2: a/b sold for b. Partner a/c opens the cycle
        // from c, and b/c closes it.
        for &m1 in by_pair.values() {
            let first = &self.markets[m1];
            if first.base.eq_ignore_ascii_case(&base)
                && !first.quote.eq_ignore_ascii_case(&quote)
            {
                let c = first.quote.to_uppercase();
                if let Some(&m3) = by_pair.get(&format!("{quote}/{c}")) {
                    found.push(Triangle::new(m1, mid, m3, c));
                }
            }
        }

        // New market is leg 3: b/c sold back into the starting quote c.
        // Partner a/c opens the cycle and a/b bridges a to b.
        for &m1 in by_pair.values() {
            let first = &self.markets[m1];
            if first.quote.eq_ignore_ascii_case(&quote)
                && !first.base.eq_ignore_ascii_case(&base)
            {
                let a = first.base.to_uppercase();
                if let Some(&m2) = by_pair.get(&format!("{a}/{base}")) {
                    found.push(Triangle::new(m1, m2, mid, quote.clone()));
                }
            }
        }

        found
    }
}
