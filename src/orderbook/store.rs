//! Concurrent per-symbol quote state: latest top-of-book and depth books.

use std::cmp::Ordering;
use std::collections::HashMap;

use parking_lot::RwLock;

use super::types::{Level, OrderBook, TopOfBook};

/// Inputs below this length are sorted by insertion; book deltas are small
/// and usually near-sorted, where insertion sort wins over a general sort.
const INSERTION_SORT_MAX: usize = 32;

fn insertion_sort(levels: &mut [Level], cmp: &impl Fn(&Level, &Level) -> Ordering) {
    for i in 1..levels.len() {
        let mut j = i;
        while j > 0 && cmp(&levels[j - 1], &levels[j]) == Ordering::Greater {
            levels.swap(j - 1, j);
            j -= 1;
        }
    }
}

fn sort_levels(levels: &mut [Level], cmp: impl Fn(&Level, &Level) -> Ordering) {
    if levels.len() <= INSERTION_SORT_MAX {
        insertion_sort(levels, &cmp);
    } else {
        levels.sort_unstable_by(cmp);
    }
}

/// Latest top-of-book per symbol. Single writer per symbol, many readers.
#[derive(Debug, Default)]
pub struct TopOfBookStore {
    data: RwLock<HashMap<String, TopOfBook>>,
}

impl TopOfBookStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the quote for a symbol.
    pub fn set(&self, symbol: &str, tob: TopOfBook) {
        self.data.write().insert(symbol.to_string(), tob);
    }

    /// Latest quote for a symbol.
    pub fn get(&self, symbol: &str) -> Option<TopOfBook> {
        self.data.read().get(symbol).copied()
    }

    /// Independent copy of the whole store.
    pub fn snapshot(&self) -> HashMap<String, TopOfBook> {
        self.data.read().clone()
    }
}

/// Latest depth book per symbol with canonical level ordering.
#[derive(Debug, Default)]
pub struct OrderBookStore {
    data: RwLock<HashMap<String, OrderBook>>,
}

impl OrderBookStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the book for a symbol with the given sides.
    ///
    /// Bids are sorted descending and asks ascending; each side is truncated
    /// to `depth` levels when `depth > 0`. Every upsert is treated as the
    /// current authoritative snapshot; sequence gaps are not detected here.
    pub fn upsert(
        &self,
        symbol: &str,
        mut bids: Vec<Level>,
        mut asks: Vec<Level>,
        seq: u64,
        ts_ns: i64,
        depth: usize,
    ) {
        sort_levels(&mut bids, |a, b| b.price.total_cmp(&a.price));
        sort_levels(&mut asks, |a, b| a.price.total_cmp(&b.price));
        if depth > 0 {
            bids.truncate(depth);
            asks.truncate(depth);
        }
        self.data.write().insert(
            symbol.to_string(),
            OrderBook {
                bids,
                asks,
                seq,
                ts_ns,
            },
        );
    }

    /// Latest book for a symbol.
    pub fn get(&self, symbol: &str) -> Option<OrderBook> {
        self.data.read().get(symbol).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(prices: &[f64]) -> Vec<Level> {
        prices.iter().map(|&p| Level::new(p, 1.0)).collect()
    }

    #[test]
    fn tob_store_set_get_overwrite() {
        let store = TopOfBookStore::new();
        assert!(store.get("BTCUSDT").is_none());

        let first = TopOfBook {
            bid_px: 100.0,
            bid_sz: 1.0,
            ask_px: 101.0,
            ask_sz: 1.0,
            seq: 1,
            ts_ns: 10,
        };
        store.set("BTCUSDT", first);
        assert_eq!(store.get("BTCUSDT"), Some(first));

        let second = TopOfBook { seq: 2, ..first };
        store.set("BTCUSDT", second);
        assert_eq!(store.get("BTCUSDT"), Some(second));
    }

    #[test]
    fn tob_snapshot_is_independent() {
        let store = TopOfBookStore::new();
        store.set("BTCUSDT", TopOfBook::default());

        let snap = store.snapshot();
        store.set("ETHUSDT", TopOfBook::default());

        assert_eq!(snap.len(), 1);
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn upsert_sorts_both_sides() {
        let store = OrderBookStore::new();
        store.upsert(
            "BTCUSDT",
            levels(&[99.0, 101.0, 100.0]),
            levels(&[103.0, 102.0, 104.0]),
            1,
            0,
            0,
        );

        let book = store.get("BTCUSDT").unwrap();
        let bid_prices: Vec<f64> = book.bids.iter().map(|l| l.price).collect();
        let ask_prices: Vec<f64> = book.asks.iter().map(|l| l.price).collect();
        assert_eq!(bid_prices, vec![101.0, 100.0, 99.0]);
        assert_eq!(ask_prices, vec![102.0, 103.0, 104.0]);
    }

    #[test]
    fn upsert_truncates_to_depth() {
        let store = OrderBookStore::new();
        store.upsert(
            "BTCUSDT",
            levels(&[96.0, 99.0, 97.0, 100.0, 98.0]),
            levels(&[105.0, 102.0, 104.0, 101.0, 103.0]),
            1,
            0,
            2,
        );

        let book = store.get("BTCUSDT").unwrap();
        assert_eq!(book.bids.len(), 2);
        assert_eq!(book.asks.len(), 2);
        assert_eq!(book.bids[0].price, 100.0);
        assert_eq!(book.bids[1].price, 99.0);
        assert_eq!(book.asks[0].price, 101.0);
        assert_eq!(book.asks[1].price, 102.0);
    }

    #[test]
    fn upsert_zero_depth_is_unbounded() {
        let store = OrderBookStore::new();
        let prices: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        store.upsert("BTCUSDT", levels(&prices), levels(&prices), 1, 0, 0);

        let book = store.get("BTCUSDT").unwrap();
        assert_eq!(book.bids.len(), 50);
        assert_eq!(book.asks.len(), 50);
        // Large inputs go through the general sort path.
        assert!(book.bids.windows(2).all(|w| w[0].price >= w[1].price));
        assert!(book.asks.windows(2).all(|w| w[0].price <= w[1].price));
    }

    #[test]
    fn upsert_keeps_seq_and_ts() {
        let store = OrderBookStore::new();
        store.upsert("BTCUSDT", levels(&[100.0]), levels(&[101.0]), 42, 1_700, 0);

        let book = store.get("BTCUSDT").unwrap();
        assert_eq!(book.seq, 42);
        assert_eq!(book.ts_ns, 1_700);
    }
}
