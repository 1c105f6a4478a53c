//! Incremental market graph: cycle discovery over registered markets.

pub mod index;

pub use index::{GraphIndex, IndexState, MarketId, Triangle, TriangleId};
