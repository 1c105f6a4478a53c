//! Process-wide registry of markets and their fee schedules.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::types::{Fee, Market};

/// Shared symbol → market and symbol → fee maps with reader-heavy access.
///
/// Entries live for the process lifetime; an upsert overwrites in place.
#[derive(Debug, Default)]
pub struct MarketRegistry {
    markets: RwLock<HashMap<String, Market>>,
    fees: RwLock<HashMap<String, Fee>>,
}

impl MarketRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a market by its symbol.
    pub fn upsert_market(&self, market: Market) {
        self.markets.write().insert(market.symbol.clone(), market);
    }

    /// Look up a market by symbol.
    pub fn market(&self, symbol: &str) -> Option<Market> {
        self.markets.read().get(symbol).cloned()
    }

    /// Set the fee schedule for a symbol.
    pub fn set_fee(&self, symbol: &str, fee: Fee) {
        self.fees.write().insert(symbol.to_string(), fee);
    }

    /// Look up the fee schedule for a symbol.
    pub fn fee(&self, symbol: &str) -> Option<Fee> {
        self.fees.read().get(symbol).copied()
    }

    /// Independent copies of both maps, safe to traverse without further
    /// synchronization.
    pub fn snapshot(&self) -> (HashMap<String, Market>, HashMap<String, Fee>) {
        let markets = self.markets.read().clone();
        let fees = self.fees.read().clone();
        (markets, fees)
    }

    /// Number of registered markets.
    pub fn market_count(&self) -> usize {
        self.markets.read().len()
    }
}
